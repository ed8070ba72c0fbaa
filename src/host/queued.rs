//! Host implementation for an out-of-process browser.
//!
//! Entity descriptors are mirrored from the lifecycle events the browser
//! reports, visits are mirrored into the history table, and every side effect
//! is queued as an [`Effect`] for the bridge to forward.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::database::connection::Database;
use crate::managers::history_manager::{HistoryManager, HistoryManagerTrait};
use crate::types::entity::{EntityId, EntityState};
use crate::types::errors::HostError;
use crate::types::event::{AgentMessage, LifecycleEvent, Prompt, WindowId, TOP_LEVEL_FRAME};

use super::{BrowserHost, Effect, EntityDescriptor, HistoryVisit};

pub struct QueuedHost {
    clock: Arc<dyn Clock>,
    entities: BTreeMap<EntityId, EntityDescriptor>,
    focused_window: Option<WindowId>,
    history: HistoryManager,
    effects: Vec<Effect>,
}

impl QueuedHost {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entities: BTreeMap::new(),
            focused_window: None,
            history: HistoryManager::new(db),
            effects: Vec::new(),
        }
    }

    /// Adds or replaces an entity the browser already had open.
    pub fn register(&mut self, descriptor: EntityDescriptor) {
        if descriptor.active {
            self.mark_active(descriptor.window_id, descriptor.id);
        }
        self.entities.insert(descriptor.id, descriptor);
    }

    pub fn set_focused_window(&mut self, window: Option<WindowId>) {
        self.focused_window = window;
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Hands over every queued effect, oldest first.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    fn mark_active(&mut self, window: WindowId, id: EntityId) {
        for desc in self.entities.values_mut() {
            if desc.window_id == window {
                desc.active = desc.id == id;
            }
        }
    }

    fn require(&self, id: EntityId) -> Result<&EntityDescriptor, HostError> {
        self.entities.get(&id).ok_or(HostError::EntityNotFound(id))
    }
}

impl BrowserHost for QueuedHost {
    fn observe(&mut self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::EntityCreated {
                entity_id,
                window_id,
                url,
                incognito,
                active,
                ..
            } => self.register(EntityDescriptor {
                id: *entity_id,
                window_id: *window_id,
                url: url.clone(),
                incognito: *incognito,
                active: *active,
                pinned: false,
            }),
            LifecycleEvent::EntityRemoved { entity_id } => {
                self.entities.remove(entity_id);
            }
            LifecycleEvent::EntityUpdated {
                entity_id, pinned, url, ..
            } => {
                if let Some(desc) = self.entities.get_mut(entity_id) {
                    if let Some(pinned) = pinned {
                        desc.pinned = *pinned;
                    }
                    if let Some(url) = url {
                        desc.url = url.clone();
                    }
                }
            }
            LifecycleEvent::EntityActivated {
                entity_id,
                window_id,
            } => self.mark_active(*window_id, *entity_id),
            LifecycleEvent::WindowFocusChanged { window_id } => {
                self.focused_window = Some(*window_id);
            }
            LifecycleEvent::NavigationCommitted {
                entity_id,
                frame_id,
                url,
                ..
            } if *frame_id == TOP_LEVEL_FRAME => {
                let Some(desc) = self.entities.get_mut(entity_id) else {
                    return;
                };
                desc.url = url.clone();
                if !desc.incognito {
                    let now = self.clock.now_ms();
                    if let Err(e) = self.history.record_visit(url, url, now) {
                        tracing::warn!(entity = %entity_id, error = %e, "failed to mirror visit");
                    }
                }
            }
            _ => {}
        }
    }

    fn entity(&self, id: EntityId) -> Result<EntityDescriptor, HostError> {
        self.require(id).cloned()
    }

    fn entities(&self, window: Option<WindowId>) -> Vec<EntityDescriptor> {
        self.entities
            .values()
            .filter(|d| window.map_or(true, |w| d.window_id == w))
            .cloned()
            .collect()
    }

    fn active_entity(&self, window: WindowId) -> Option<EntityId> {
        self.entities
            .values()
            .find(|d| d.window_id == window && d.active)
            .map(|d| d.id)
    }

    fn focused_window(&self) -> Option<WindowId> {
        self.focused_window
    }

    fn reload(&mut self, id: EntityId, bypass_cache: bool) -> Result<(), HostError> {
        self.require(id)?;
        self.effects.push(Effect::Reload {
            entity_id: id,
            bypass_cache,
        });
        Ok(())
    }

    fn send(&mut self, id: EntityId, message: AgentMessage) -> Result<(), HostError> {
        self.require(id)?;
        self.effects.push(Effect::Message {
            entity_id: id,
            message,
        });
        Ok(())
    }

    fn inject_agent(&mut self, id: EntityId) -> Result<(), HostError> {
        self.require(id)?;
        self.effects.push(Effect::InjectAgent { entity_id: id });
        Ok(())
    }

    fn prompt(&mut self, prompt: Prompt) -> Result<(), HostError> {
        self.effects.push(Effect::Prompt { prompt });
        Ok(())
    }

    fn save_session_value(&mut self, id: EntityId, state: &EntityState) -> Result<(), HostError> {
        self.require(id)?;
        self.effects.push(Effect::SaveSessionValue {
            entity_id: id,
            state: state.clone(),
        });
        Ok(())
    }

    fn search_history(&self, text: &str, limit: usize) -> Result<Vec<HistoryVisit>, HostError> {
        let entries = self
            .history
            .search_history(text, limit)
            .map_err(|e| HostError::Unavailable(e.to_string()))?;
        Ok(entries
            .into_iter()
            .map(|e| HistoryVisit {
                url: e.url,
                last_visit_time: e.last_visit_time,
            })
            .collect())
    }

    fn delete_history_range(&mut self, start: i64, end: i64) -> Result<(), HostError> {
        self.history
            .delete_range(start, end)
            .map_err(|e| HostError::Unavailable(e.to_string()))?;
        self.effects.push(Effect::DeleteHistoryRange { start, end });
        Ok(())
    }

    fn request_restart(&mut self) -> Result<(), HostError> {
        self.effects.push(Effect::Restart);
        Ok(())
    }
}
