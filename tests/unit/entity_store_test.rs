//! Unit tests for the EntityStore.

use autorefresh::managers::entity_store::{EntityStore, EntityStoreTrait};
use autorefresh::types::entity::{EntityId, EntityState, TimerKey};
use autorefresh::types::settings::EntityDefaults;

#[test]
fn test_get_or_create_creates_once() {
    let mut store = EntityStore::new();
    let defaults = EntityDefaults::default();

    store.get_or_create(EntityId(1), &defaults).period = 10;
    let again = store.get_or_create(EntityId(1), &defaults);
    assert_eq!(again.period, 10);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_new_records_follow_current_defaults() {
    let mut store = EntityStore::new();
    let defaults = EntityDefaults {
        no_cache: true,
        sticky_reload: true,
        ..EntityDefaults::default()
    };
    let state = store.get_or_create(EntityId(2), &defaults);
    assert!(state.no_cache);
    assert!(state.sticky_reload);
    assert!(state.smart);
}

#[test]
fn test_lookup_by_timer_key() {
    let mut store = EntityStore::new();
    store.insert(EntityState::new(EntityId(3), &EntityDefaults::default()));

    let found = store.by_timer_key(&TimerKey::for_entity(EntityId(3))).unwrap();
    assert_eq!(found.entity_id, EntityId(3));
    assert!(store.by_timer_key(&TimerKey::for_entity(EntityId(4))).is_none());
}

#[test]
fn test_remove_and_ids() {
    let mut store = EntityStore::new();
    let defaults = EntityDefaults::default();
    store.get_or_create(EntityId(5), &defaults);
    store.get_or_create(EntityId(1), &defaults);

    assert_eq!(store.ids(), vec![EntityId(1), EntityId(5)]);
    assert!(store.remove(EntityId(5)).is_some());
    assert!(store.remove(EntityId(5)).is_none());
    assert!(!store.contains(EntityId(5)));
    assert!(!store.is_empty());
}
