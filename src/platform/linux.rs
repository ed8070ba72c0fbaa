// autorefresh platform paths for Linux
// Data: ~/.local/share/autorefresh

use std::env;
use std::path::PathBuf;

/// Uses `$XDG_DATA_HOME/autorefresh` if set, otherwise `~/.local/share/autorefresh`.
pub fn get_data_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("autorefresh")
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("autorefresh")
    }
}
