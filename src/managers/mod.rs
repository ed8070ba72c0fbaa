// State managers
// Managers own stateful stores: entity records, URL memory, timers, and the history mirror.

pub mod entity_store;
pub mod history_manager;
pub mod timer_service;
pub mod url_memory;
