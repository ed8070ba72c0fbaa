// autorefresh platform abstraction
// Provides the platform-specific data directory for Windows, macOS, and Linux.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "AUTOREFRESH_DATA_DIR";

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "autorefresh.db";

/// Returns the data directory, honouring `AUTOREFRESH_DATA_DIR`.
///
/// - **Linux**: `~/.local/share/autorefresh` (or `$XDG_DATA_HOME/autorefresh`)
/// - **macOS**: `~/Library/Application Support/autorefresh`
/// - **Windows**: `%APPDATA%/autorefresh`
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Full path of the database file.
pub fn database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE)
}
