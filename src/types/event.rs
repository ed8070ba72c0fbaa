use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{EntityId, FormData};

/// Identifier of a host browser window.
pub type WindowId = i64;

/// Frame id of the top-level document.
pub const TOP_LEVEL_FRAME: u32 = 0;

/// How a navigation was initiated, as classified by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Link,
    Typed,
    AutoBookmark,
    AutoSubframe,
    ManualSubframe,
    Generated,
    StartPage,
    FormSubmit,
    Reload,
    Keyword,
    KeywordGenerated,
}

impl TransitionKind {
    /// Navigations that re-load the current document rather than leave it.
    pub fn is_reload(self) -> bool {
        matches!(self, TransitionKind::AutoSubframe | TransitionKind::Reload)
    }
}

/// Loading status reported with an entity update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Complete,
}

/// Lifecycle notifications delivered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum LifecycleEvent {
    EntityCreated {
        entity_id: EntityId,
        #[serde(default)]
        window_id: WindowId,
        #[serde(default)]
        url: String,
        #[serde(default)]
        incognito: bool,
        #[serde(default)]
        active: bool,
        /// State previously saved with the host for a restored entity.
        #[serde(default)]
        session_value: Option<Value>,
    },
    EntityRemoved {
        entity_id: EntityId,
    },
    EntityUpdated {
        entity_id: EntityId,
        #[serde(default)]
        status: Option<LoadStatus>,
        #[serde(default)]
        pinned: Option<bool>,
        #[serde(default)]
        url: Option<String>,
    },
    EntityActivated {
        entity_id: EntityId,
        window_id: WindowId,
    },
    WindowFocusChanged {
        window_id: WindowId,
    },
    NavigationCommitted {
        entity_id: EntityId,
        #[serde(default)]
        frame_id: u32,
        transition_kind: TransitionKind,
        url: String,
    },
    NavigationCompleted {
        entity_id: EntityId,
        #[serde(default)]
        frame_id: u32,
    },
    RequestStarted {
        entity_id: EntityId,
        method: String,
        #[serde(default)]
        form_data: Option<FormData>,
    },
    ResponseError {
        entity_id: EntityId,
    },
    ResponseCompleted {
        entity_id: EntityId,
        status_code: u16,
    },
    UpdateAvailable,
}

/// Messages sent by an entity's page agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PageMessage {
    /// User interaction inside the page.
    Activity,
    /// Interval chosen in the custom-interval prompt.
    SetInterval { period: i64 },
    /// Current scroll offset of the page.
    Scroll { x: f64, y: f64 },
    /// The user accepted resubmitting form data for this period.
    ConfirmResend { period: i64 },
}

/// Messages sent to an entity's page agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum AgentMessage {
    TimerEnabled,
    TimerDisabled,
    Reload { post_data: Option<FormData> },
    Scroll { x: f64, y: f64 },
    SetEntityId { entity_id: EntityId },
}

/// Out-of-band user input the core asks the host to collect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "prompt", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Prompt {
    ConfirmResend { entity_id: EntityId, period: i64 },
    CustomInterval { entity_id: EntityId },
}
