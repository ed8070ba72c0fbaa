// Shared type definitions
// Each submodule defines types used across the scheduler, stores, and host bridge.

pub mod command;
pub mod entity;
pub mod errors;
pub mod event;
pub mod history;
pub mod memory;
pub mod settings;
