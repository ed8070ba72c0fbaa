//! Database layer.
//!
//! Provides SQLite connection management, schema migrations, and the JSON
//! key/value store used for settings, URL memory, and upgrade snapshots.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use autorefresh::database::{Database, Storage};
//!
//! let db = Arc::new(Database::open("autorefresh.db").expect("failed to open database"));
//! let storage = Storage::new(db.clone());
//! storage.set_json("greeting", &"hello").expect("write failed");
//! ```

pub mod connection;
pub mod migrations;
pub mod storage;

pub use connection::Database;
pub use storage::Storage;
