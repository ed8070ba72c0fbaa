use serde::{Deserialize, Serialize};

/// Configuration format version, shared by the settings record and upgrade snapshots.
pub const CONFIG_VERSION: u32 = 2;

/// Process-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub defaults: EntityDefaults,
    #[serde(default = "default_true")]
    pub pin_sets_remember: bool,
    #[serde(default)]
    pub never_confirm_post: bool,
    #[serde(default = "legacy_version")]
    pub version: u32,
}

fn default_true() -> bool {
    true
}

// Records written before the version tag existed.
fn legacy_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            defaults: EntityDefaults::default(),
            pin_sets_remember: true,
            never_confirm_post: false,
            version: CONFIG_VERSION,
        }
    }
}

/// Initial flag values for newly tracked entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityDefaults {
    #[serde(default)]
    pub randomize: bool,
    #[serde(default)]
    pub only_on_error: bool,
    #[serde(default = "default_true")]
    pub smart: bool,
    #[serde(default)]
    pub sticky_reload: bool,
    #[serde(default, alias = "nocache")]
    pub no_cache: bool,
}

impl Default for EntityDefaults {
    fn default() -> Self {
        Self {
            randomize: false,
            only_on_error: false,
            smart: true,
            sticky_reload: false,
            no_cache: false,
        }
    }
}
