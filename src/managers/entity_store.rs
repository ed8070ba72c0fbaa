use std::collections::BTreeMap;

use crate::types::entity::{EntityId, EntityState, TimerKey};
use crate::types::settings::EntityDefaults;

/// Trait defining the entity state store interface.
pub trait EntityStoreTrait {
    fn get(&self, id: EntityId) -> Option<&EntityState>;
    fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityState>;
    fn get_or_create(&mut self, id: EntityId, defaults: &EntityDefaults) -> &mut EntityState;
    fn insert(&mut self, state: EntityState) -> Option<EntityState>;
    fn remove(&mut self, id: EntityId) -> Option<EntityState>;
    fn by_timer_key(&self, key: &TimerKey) -> Option<&EntityState>;
    fn contains(&self, id: EntityId) -> bool;
    fn ids(&self) -> Vec<EntityId>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
}

/// Owns exactly one [`EntityState`] per live entity.
#[derive(Debug, Default)]
pub struct EntityStore {
    states: BTreeMap<EntityId, EntityState>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityState> {
        self.states.values()
    }
}

impl EntityStoreTrait for EntityStore {
    fn get(&self, id: EntityId) -> Option<&EntityState> {
        self.states.get(&id)
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityState> {
        self.states.get_mut(&id)
    }

    /// Returns the record for `id`, creating a default one on first use.
    fn get_or_create(&mut self, id: EntityId, defaults: &EntityDefaults) -> &mut EntityState {
        self.states
            .entry(id)
            .or_insert_with(|| EntityState::new(id, defaults))
    }

    /// Stores a whole record under its own id. Returns the record it replaced.
    fn insert(&mut self, state: EntityState) -> Option<EntityState> {
        self.states.insert(state.entity_id, state)
    }

    fn remove(&mut self, id: EntityId) -> Option<EntityState> {
        self.states.remove(&id)
    }

    fn by_timer_key(&self, key: &TimerKey) -> Option<&EntityState> {
        key.entity_id().and_then(|id| self.states.get(&id))
    }

    fn contains(&self, id: EntityId) -> bool {
        self.states.contains_key(&id)
    }

    fn ids(&self) -> Vec<EntityId> {
        self.states.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.states.len()
    }

    fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
