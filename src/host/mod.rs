//! Boundary to the host browser.
//!
//! The scheduler core never talks to browser APIs directly; everything it
//! needs from the outside world goes through [`BrowserHost`].

pub mod queued;

use serde::{Deserialize, Serialize};

use crate::types::entity::{EntityId, EntityState};
use crate::types::errors::HostError;
use crate::types::event::{AgentMessage, LifecycleEvent, Prompt, WindowId};

pub use queued::QueuedHost;

/// What the host knows about a live entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    pub id: EntityId,
    #[serde(default)]
    pub window_id: WindowId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub incognito: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
}

/// A history match returned by [`BrowserHost::search_history`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryVisit {
    pub url: String,
    pub last_visit_time: i64,
}

/// Side effects requested from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Effect {
    Reload { entity_id: EntityId, bypass_cache: bool },
    Message { entity_id: EntityId, message: AgentMessage },
    InjectAgent { entity_id: EntityId },
    Prompt { prompt: Prompt },
    SaveSessionValue { entity_id: EntityId, state: EntityState },
    DeleteHistoryRange { start: i64, end: i64 },
    Restart,
}

/// Trait defining the host browser interface.
pub trait BrowserHost {
    /// Sees every lifecycle event before the scheduler handles it.
    fn observe(&mut self, _event: &LifecycleEvent) {}

    /// Current descriptor of a live entity.
    fn entity(&self, id: EntityId) -> Result<EntityDescriptor, HostError>;
    /// Live entities, optionally restricted to one window.
    fn entities(&self, window: Option<WindowId>) -> Vec<EntityDescriptor>;
    fn active_entity(&self, window: WindowId) -> Option<EntityId>;
    fn focused_window(&self) -> Option<WindowId>;

    fn reload(&mut self, id: EntityId, bypass_cache: bool) -> Result<(), HostError>;
    fn send(&mut self, id: EntityId, message: AgentMessage) -> Result<(), HostError>;
    fn inject_agent(&mut self, id: EntityId) -> Result<(), HostError>;
    fn prompt(&mut self, prompt: Prompt) -> Result<(), HostError>;
    fn save_session_value(&mut self, id: EntityId, state: &EntityState) -> Result<(), HostError>;

    fn search_history(&self, text: &str, limit: usize) -> Result<Vec<HistoryVisit>, HostError>;
    fn delete_history_range(&mut self, start: i64, end: i64) -> Result<(), HostError>;

    fn request_restart(&mut self) -> Result<(), HostError>;
}
