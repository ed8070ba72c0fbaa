//! autorefresh: per-tab auto-reload scheduling for a host browser.
//!
//! This library crate exposes all modules for use by the bridge binary and integration tests.

pub mod app;
pub mod clock;
pub mod database;
pub mod host;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod types;
