// autorefresh platform paths for macOS
// Data: ~/Library/Application Support/autorefresh

use std::env;
use std::path::PathBuf;

/// `~/Library/Application Support/autorefresh`
pub fn get_data_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
        .join("Library")
        .join("Application Support")
        .join("autorefresh")
}
