use serde::{Deserialize, Serialize};

/// The user-facing part of an entity's state, as remembered per URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub period: i64,
    pub randomize: bool,
    pub smart: bool,
    pub only_on_error: bool,
    pub sticky_reload: bool,
    pub no_cache: bool,
    pub remember: bool,
}
