//! App core for autorefresh.
//!
//! Central struct owning every store and service, plus the lifecycle handlers
//! that do not belong to a narrower service. Navigation handling, the period
//! gate and command dispatch are implemented on `App` in their own modules.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::clock::Clock;
use crate::database::connection::Database;
use crate::database::storage::{Storage, UPGRADE_KEY};
use crate::host::BrowserHost;
use crate::managers::entity_store::{EntityStore, EntityStoreTrait};
use crate::managers::url_memory::{normalize_url, UrlMemory, UrlMemoryTrait};
use crate::services::migration_manager::{self, UpgradeSnapshot, CURRENT_VERSION};
use crate::services::navigation_coordinator::NavigationCoordinatorTrait;
use crate::services::period_gate::{PeriodGateTrait, PeriodOutcome};
use crate::services::reload_executor::{ReloadExecutor, ReloadKind};
use crate::services::scheduler::{FireOutcome, Scheduler};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::entity::{EntityId, EntityState, ScrollPosition, TimerKey};
use crate::types::errors::{AppError, HostError};
use crate::types::event::{AgentMessage, LifecycleEvent, LoadStatus, PageMessage, WindowId};
use crate::types::settings::Settings;

/// Reload hold-off after user activity inside a page.
pub const ACTIVITY_FREEZE: Duration = Duration::from_secs(3);
/// Reload hold-off after an entity is brought to the front.
pub const ACTIVATION_FREEZE: Duration = Duration::from_secs(5);
/// Reload hold-off for the active entity of a window that gained focus.
pub const FOCUS_FREEZE: Duration = Duration::from_secs(3);

/// Summary of [`App::startup`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Entities restored from an upgrade snapshot, if one was applied.
    pub migrated: Option<usize>,
    pub remembered_urls: usize,
    pub entities: usize,
}

/// Central application struct holding all stores and services.
pub struct App<H: BrowserHost> {
    pub db: Arc<Database>,
    pub storage: Storage,
    pub settings_engine: SettingsEngine,
    pub url_memory: UrlMemory,
    pub entities: EntityStore,
    pub scheduler: Scheduler,
    pub host: H,
    clock: Arc<dyn Clock>,
    current_window: Option<WindowId>,
}

impl<H: BrowserHost> App<H> {
    pub fn new(db: Arc<Database>, host: H, clock: Arc<dyn Clock>) -> Self {
        let scheduler = Scheduler::new(clock.clone());
        Self::with_scheduler(db, host, clock, scheduler)
    }

    /// Like [`App::new`] but with reproducible timer jitter.
    pub fn with_seed(db: Arc<Database>, host: H, clock: Arc<dyn Clock>, seed: u64) -> Self {
        let scheduler = Scheduler::with_seed(clock.clone(), seed);
        Self::with_scheduler(db, host, clock, scheduler)
    }

    fn with_scheduler(db: Arc<Database>, host: H, clock: Arc<dyn Clock>, scheduler: Scheduler) -> Self {
        let storage = Storage::new(db.clone());
        Self {
            settings_engine: SettingsEngine::new(storage.clone()),
            url_memory: UrlMemory::new(storage.clone()),
            entities: EntityStore::new(),
            db,
            storage,
            scheduler,
            host,
            clock,
            current_window: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings_engine.get_settings()
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityState> {
        self.entities.get(id)
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn current_window(&self) -> Option<WindowId> {
        self.current_window
    }

    // ─── Startup & upgrade ───

    /// Startup sequence: load settings and URL memory, apply a pending upgrade
    /// snapshot, then attach to every entity the host already has open.
    pub fn startup(&mut self) -> Result<StartupReport, AppError> {
        self.settings_engine.load();

        // Migrated records write through to URL memory, so it must be loaded first.
        let remembered_urls = match self.url_memory.load() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "url memory unreadable, starting empty");
                0
            }
        };

        let migrated = self.run_migration()?;
        self.storage.remove(UPGRADE_KEY)?;

        self.current_window = self.host.focused_window();

        let open = self.host.entities(None);
        for desc in &open {
            let result = self.attach(desc.id, &desc.url, migrated.is_none());
            skip_vanished(result)?;
        }

        let report = StartupReport {
            migrated,
            remembered_urls,
            entities: open.len(),
        };
        tracing::info!(
            migrated = ?report.migrated,
            remembered_urls = report.remembered_urls,
            entities = report.entities,
            "startup complete"
        );
        Ok(report)
    }

    /// Injects the page agent into an entity that was open before startup.
    fn attach(&mut self, id: EntityId, url: &str, fresh_start: bool) -> Result<(), AppError> {
        self.host.inject_agent(id)?;
        self.notify_agent(id, AgentMessage::SetEntityId { entity_id: id })?;

        let entity = self.entity_state(id);
        entity.current_url = url.to_string();
        if fresh_start {
            // Request method of pages loaded before startup is unknown.
            entity.request_method = "GET".to_string();
            entity.resend_confirmed = true;
        }

        self.remember_get(id, url)?;
        Ok(())
    }

    /// Applies the `upgrade` snapshot, if one is present and readable.
    ///
    /// Returns how many records were restored, or `None` when no snapshot was
    /// applied. Deleting the snapshot is left to the caller.
    pub fn run_migration(&mut self) -> Result<Option<usize>, AppError> {
        let Some(raw) = self.storage.get_value(UPGRADE_KEY)? else {
            return Ok(None);
        };

        let snapshot = match UpgradeSnapshot::parse(raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable upgrade snapshot");
                return Ok(None);
            }
        };
        if !snapshot.is_supported() {
            tracing::warn!(
                version = snapshot.version,
                current = CURRENT_VERSION,
                "ignoring upgrade snapshot from a newer version"
            );
            return Ok(None);
        }

        let defaults = self.settings().defaults.clone();
        let mut migrated = 0;
        for (key, record) in snapshot.state {
            let state = match migration_manager::migrate_record(&key, record, snapshot.version, &defaults) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping saved record");
                    continue;
                }
            };

            let id = state.entity_id;
            let period = state.period;
            self.entities.insert(state);
            match self.set_period(id, period)? {
                PeriodOutcome::EntityGone => {
                    self.entities.remove(id);
                }
                _ => migrated += 1,
            }
        }

        tracing::info!(migrated, from = snapshot.version, "restored state from upgrade snapshot");
        Ok(Some(migrated))
    }

    /// Saves every entity's state for the next start, then asks the host to restart.
    pub fn prepare_upgrade(&mut self) -> Result<(), AppError> {
        let snapshot = UpgradeSnapshot::capture(self.entities.iter())?;
        self.storage.set_json(UPGRADE_KEY, &snapshot)?;
        tracing::info!(entities = snapshot.state.len(), "upgrade snapshot written, restarting");
        self.host.request_restart()?;
        Ok(())
    }

    // ─── Event entry points ───

    /// Handles one lifecycle event to completion.
    ///
    /// The host sees the event first. An entity that vanishes while the event
    /// is being handled ends the handling silently.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> Result<(), AppError> {
        self.host.observe(&event);

        let result = match event {
            LifecycleEvent::EntityCreated {
                entity_id,
                session_value,
                ..
            } => self.on_entity_created(entity_id, session_value),
            LifecycleEvent::EntityRemoved { entity_id } => {
                self.on_entity_removed(entity_id);
                Ok(())
            }
            LifecycleEvent::EntityUpdated {
                entity_id,
                status,
                pinned,
                ..
            } => self.on_entity_updated(entity_id, status, pinned),
            LifecycleEvent::EntityActivated { entity_id, .. } => self.freeze(entity_id, ACTIVATION_FREEZE),
            LifecycleEvent::WindowFocusChanged { window_id } => self.on_window_focus_changed(window_id),
            LifecycleEvent::NavigationCommitted {
                entity_id,
                frame_id,
                transition_kind,
                url,
            } => self
                .on_navigation_committed(entity_id, frame_id, transition_kind, &url)
                .map(|_| ()),
            LifecycleEvent::NavigationCompleted { entity_id, frame_id } => {
                self.on_navigation_completed(entity_id, frame_id)
            }
            LifecycleEvent::RequestStarted {
                entity_id,
                method,
                form_data,
            } => self.on_request_started(entity_id, &method, form_data),
            LifecycleEvent::ResponseError { entity_id } => self.on_response_error(entity_id),
            LifecycleEvent::ResponseCompleted {
                entity_id,
                status_code,
            } => self.on_response_completed(entity_id, status_code),
            LifecycleEvent::UpdateAvailable => self.prepare_upgrade(),
        };

        skip_vanished(result).map(|_| ())
    }

    /// Handles a message from an entity's page agent.
    pub fn handle_page_message(&mut self, id: EntityId, message: PageMessage) -> Result<(), AppError> {
        let result = match message {
            PageMessage::Activity => self.freeze(id, ACTIVITY_FREEZE),
            PageMessage::SetInterval { period } => self.set_period(id, period).map(|_| ()),
            PageMessage::Scroll { x, y } => self.live_state(id).map(|entity| {
                entity.scroll = Some(ScrollPosition { x, y });
            }),
            PageMessage::ConfirmResend { period } => self.confirm_resend(id, period).map(|_| ()),
        };
        skip_vanished(result).map(|_| ())
    }

    /// Consumes and handles every timer due now.
    ///
    /// Timers are handled independently. One whose reload fails is re-armed for
    /// another period and left out of the result.
    pub fn fire_due_timers(&mut self) -> Result<Vec<(TimerKey, FireOutcome)>, AppError> {
        let now = self.clock.now_ms();
        let due = self.scheduler.take_due(now);
        let mut outcomes = Vec::with_capacity(due.len());
        for key in due {
            match self.on_timer_fired(&key) {
                Ok(outcome) => outcomes.push((key, outcome)),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "reload failed, re-arming");
                    self.rearm_after_failure(&key);
                }
            }
        }
        Ok(outcomes)
    }

    fn rearm_after_failure(&mut self, key: &TimerKey) {
        let Some(id) = key.entity_id() else {
            return;
        };
        if !self.entities.contains(id) {
            return;
        }
        if let Err(e) = skip_vanished(self.restart_timer(id)) {
            tracing::warn!(entity = %id, error = %e, "could not re-arm timer");
        }
    }

    /// Handles the already-consumed timer registered under `key`.
    pub fn on_timer_fired(&mut self, key: &TimerKey) -> Result<FireOutcome, AppError> {
        let now = self.clock.now_ms();
        let entity = self.entities.by_timer_key(key);
        let outcome = self.scheduler.on_fire(key, entity, now);

        match outcome {
            FireOutcome::Reload => {
                let Some(id) = key.entity_id() else {
                    return Ok(FireOutcome::Vanished);
                };
                match self.reload_entity(id, false) {
                    // Nothing will load, so nothing else re-arms the timer.
                    Ok(ReloadKind::Undelivered) => {
                        self.restart_timer(id)?;
                        Ok(FireOutcome::Reload)
                    }
                    Ok(_) => Ok(FireOutcome::Reload),
                    Err(e) if e.is_entity_gone() => Ok(FireOutcome::Vanished),
                    Err(e) => Err(e),
                }
            }
            FireOutcome::Deferred(remaining) => {
                tracing::debug!(key = %key, ?remaining, "reload deferred by freeze window");
                Ok(outcome)
            }
            _ => Ok(outcome),
        }
    }

    // ─── Lifecycle handlers ───

    fn on_entity_created(&mut self, id: EntityId, session_value: Option<Value>) -> Result<(), AppError> {
        self.live_state(id)?;

        let Some(saved) = session_value else {
            return Ok(());
        };
        let fields = match migration_manager::upgrade_record(saved, CURRENT_VERSION) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::warn!(entity = %id, error = %e, "ignoring unreadable session value");
                return Ok(());
            }
        };

        // The restored entity may have a new id; identity always comes from the fresh record.
        let fresh = EntityState::new(id, &self.settings().defaults);
        let mut state = migration_manager::merge_by_name(fresh, &fields);
        state.keep_refreshing = true;
        self.entities.insert(state);
        tracing::debug!(entity = %id, "adopted restored session state");
        self.apply(id)
    }

    fn on_entity_removed(&mut self, id: EntityId) {
        self.scheduler.disarm(&TimerKey::for_entity(id));
        if self.entities.remove(id).is_some() {
            tracing::debug!(entity = %id, "entity state dropped");
        }
    }

    fn on_entity_updated(
        &mut self,
        id: EntityId,
        status: Option<LoadStatus>,
        pinned: Option<bool>,
    ) -> Result<(), AppError> {
        self.live_state(id)?;
        self.notify_agent(id, AgentMessage::SetEntityId { entity_id: id })?;

        match status {
            Some(LoadStatus::Complete) => self.on_load_completed(id)?,
            Some(LoadStatus::Loading) => self.on_load_started(id)?,
            None => {}
        }

        if let Some(pinned) = pinned {
            if self.settings().pin_sets_remember {
                self.entity_state(id).remember = pinned;
                self.remember_set(id)?;
            }
        }
        Ok(())
    }

    fn on_window_focus_changed(&mut self, window: WindowId) -> Result<(), AppError> {
        self.current_window = Some(window);
        match self.host.active_entity(window) {
            Some(id) => self.freeze(id, FOCUS_FREEZE),
            None => Ok(()),
        }
    }

    // ─── Shared operations ───

    /// Reloads `id` through the reload executor.
    pub fn reload_entity(&mut self, id: EntityId, force_no_cache: bool) -> Result<ReloadKind, AppError> {
        self.host.entity(id)?;
        let settings = self.settings_engine.get_settings();
        let entity = self.entities.get_or_create(id, &settings.defaults);
        let kind = ReloadExecutor::execute(entity, settings, &mut self.host, force_no_cache)?;
        Ok(kind)
    }

    /// Reloads every entity of the current window.
    pub fn reload_window(&mut self) -> Result<usize, AppError> {
        let window = self.current_window.or_else(|| self.host.focused_window());
        let mut reloaded = 0;
        for desc in self.host.entities(window) {
            if skip_vanished(self.reload_entity(desc.id, false))?.is_some() {
                reloaded += 1;
            }
        }
        Ok(reloaded)
    }

    /// The record for `id`, created from the current defaults on first use.
    pub(crate) fn entity_state(&mut self, id: EntityId) -> &mut EntityState {
        let defaults = &self.settings_engine.get_settings().defaults;
        self.entities.get_or_create(id, defaults)
    }

    /// Like [`App::entity_state`], but only for entities the host still has.
    pub(crate) fn live_state(&mut self, id: EntityId) -> Result<&mut EntityState, AppError> {
        self.host.entity(id)?;
        Ok(self.entity_state(id))
    }

    /// Re-arms the entity's timer from its current period and tells its page agent.
    ///
    /// Dropping to a negative period also withdraws any resend confirmation.
    pub(crate) fn restart_timer(&mut self, id: EntityId) -> Result<(), AppError> {
        let defaults = &self.settings_engine.get_settings().defaults;
        let entity = self.entities.get_or_create(id, defaults);
        let message = match self.scheduler.arm(entity) {
            Some(_) => AgentMessage::TimerEnabled,
            None => {
                entity.resend_confirmed = false;
                AgentMessage::TimerDisabled
            }
        };
        self.notify_agent(id, message)
    }

    /// Re-arms the timer, then saves the state as the entity's session value.
    pub(crate) fn apply(&mut self, id: EntityId) -> Result<(), AppError> {
        self.restart_timer(id)?;
        self.persist_session(id)
    }

    pub(crate) fn persist_session(&mut self, id: EntityId) -> Result<(), AppError> {
        self.host.entity(id)?;
        let Some(state) = self.entities.get(id) else {
            return Ok(());
        };
        self.host.save_session_value(id, state)?;
        Ok(())
    }

    /// Writes the entity's user settings through to URL memory, or deletes the
    /// entry when `remember` is off. Private entities are never written.
    pub(crate) fn remember_set(&mut self, id: EntityId) -> Result<(), AppError> {
        let desc = self.host.entity(id)?;
        if desc.incognito {
            return Ok(());
        }
        let Some(url) = normalize_url(&desc.url) else {
            tracing::debug!(entity = %id, url = %desc.url, "not remembering an unparseable url");
            return Ok(());
        };

        let entity = self.entity_state(id);
        if entity.remember {
            let snapshot = entity.user_settings();
            self.url_memory.store(url, snapshot);
        } else {
            self.url_memory.forget(&url);
        }
        self.url_memory.persist()?;
        Ok(())
    }

    /// Applies the settings remembered for `url`, if any. Returns whether a match was found.
    pub(crate) fn remember_get(&mut self, id: EntityId, url: &str) -> Result<bool, AppError> {
        let desc = self.host.entity(id)?;
        if desc.incognito {
            return Ok(false);
        }
        let Some(saved) = normalize_url(url).and_then(|key| self.url_memory.recall(&key).cloned()) else {
            return Ok(false);
        };

        self.entity_state(id).apply_user_settings(&saved);
        tracing::debug!(entity = %id, period = saved.period, "recalled remembered settings");
        self.apply(id)?;
        Ok(true)
    }

    /// Holds off a smart reload of `id` for `duration` from now.
    pub(crate) fn freeze(&mut self, id: EntityId, duration: Duration) -> Result<(), AppError> {
        let until = self.clock.now_ms() + duration.as_millis() as i64;
        let entity = self.live_state(id)?;
        entity.freeze_until = entity.freeze_until.max(until);
        Ok(())
    }

    /// Sends `message` to the page agent of `id`.
    ///
    /// Pages without a reachable agent are common (privileged pages, pages
    /// still loading), so channel failures are logged and ignored.
    pub(crate) fn notify_agent(&mut self, id: EntityId, message: AgentMessage) -> Result<(), AppError> {
        match self.host.send(id, message) {
            Ok(()) => Ok(()),
            Err(HostError::ChannelError(e)) => {
                tracing::debug!(entity = %id, error = %e, "page agent unreachable");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Turns an entity-vanished error into `Ok(None)`.
pub(crate) fn skip_vanished<T>(result: Result<T, AppError>) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_entity_gone() => {
            tracing::debug!(error = %e, "entity vanished mid-operation");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
