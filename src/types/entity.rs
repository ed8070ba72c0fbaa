use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::memory::UserSettings;
use super::settings::EntityDefaults;

/// Period sentinel: no recurring timer.
pub const PERIOD_DISABLED: i64 = -1;
/// Period sentinel: waiting for the user to enter a custom interval.
pub const PERIOD_CUSTOM: i64 = -2;

/// Submitted form fields of a top-level request, as reported by the host.
pub type FormData = BTreeMap<String, Vec<String>>;

/// Opaque identifier of a tracked entity (a browser tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key under which an entity's timer and storage slot are registered.
///
/// Always derived from an [`EntityId`]; [`TimerKey::entity_id`] inverts the mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerKey(String);

impl TimerKey {
    pub fn for_entity(id: EntityId) -> Self {
        Self(format!("tab-{}-alarm", id.0))
    }

    /// Recovers the owning entity id, or `None` if the key was not produced by `for_entity`.
    pub fn entity_id(&self) -> Option<EntityId> {
        self.0
            .strip_prefix("tab-")?
            .strip_suffix("-alarm")?
            .parse()
            .ok()
            .map(EntityId)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scroll position within a web page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

/// Everything the scheduler knows about one live entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityState {
    // Identity
    pub entity_id: EntityId,
    pub timer_key: TimerKey,

    // User settings
    pub period: i64,
    pub randomize: bool,
    pub smart: bool,
    pub only_on_error: bool,
    pub sticky_reload: bool,
    pub no_cache: bool,
    pub remember: bool,

    // Internal state
    pub load_error: bool,
    pub keep_refreshing: bool,
    /// Milliseconds since the UNIX epoch before which a smart reload must wait.
    pub freeze_until: i64,
    pub request_method: String,
    pub form_snapshot: Option<FormData>,
    pub resend_confirmed: bool,
    pub scroll: Option<ScrollPosition>,
    pub current_url: String,
    pub reload_initiated_by_system: bool,
}

impl EntityState {
    /// A fresh record for `id` with flags taken from the global defaults.
    pub fn new(id: EntityId, defaults: &EntityDefaults) -> Self {
        Self {
            entity_id: id,
            timer_key: TimerKey::for_entity(id),
            period: PERIOD_DISABLED,
            randomize: defaults.randomize,
            smart: defaults.smart,
            only_on_error: defaults.only_on_error,
            sticky_reload: defaults.sticky_reload,
            no_cache: defaults.no_cache,
            remember: false,
            load_error: false,
            keep_refreshing: false,
            freeze_until: 0,
            request_method: "GET".to_string(),
            form_snapshot: None,
            resend_confirmed: false,
            scroll: None,
            current_url: String::new(),
            reload_initiated_by_system: false,
        }
    }

    /// True when the last top-level request was not a plain retrieval.
    pub fn has_unsafe_request(&self) -> bool {
        !is_plain_retrieval(&self.request_method)
    }

    pub fn user_settings(&self) -> UserSettings {
        UserSettings {
            period: self.period,
            randomize: self.randomize,
            smart: self.smart,
            only_on_error: self.only_on_error,
            sticky_reload: self.sticky_reload,
            no_cache: self.no_cache,
            remember: self.remember,
        }
    }

    pub fn apply_user_settings(&mut self, settings: &UserSettings) {
        self.period = settings.period;
        self.randomize = settings.randomize;
        self.smart = settings.smart;
        self.only_on_error = settings.only_on_error;
        self.sticky_reload = settings.sticky_reload;
        self.no_cache = settings.no_cache;
        self.remember = settings.remember;
    }
}

/// Whether an HTTP method is a side-effect-free retrieval that may be replayed silently.
pub fn is_plain_retrieval(method: &str) -> bool {
    method.eq_ignore_ascii_case("GET")
}
