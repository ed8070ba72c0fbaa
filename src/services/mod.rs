// autorefresh services
// Services implement scheduling behaviour: settings, the reload scheduler and executor,
// navigation handling, the period gate, command dispatch, and upgrade migration.

pub mod command_dispatch;
pub mod migration_manager;
pub mod navigation_coordinator;
pub mod period_gate;
pub mod reload_executor;
pub mod scheduler;
pub mod settings_engine;
