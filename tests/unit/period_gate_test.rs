//! Unit tests for period changes and the resend confirmation gate.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use serde_json::json;

use autorefresh::app::App;
use autorefresh::clock::{Clock, ManualClock};
use autorefresh::database::Database;
use autorefresh::host::{Effect, QueuedHost};
use autorefresh::managers::entity_store::EntityStoreTrait;
use autorefresh::managers::url_memory::UrlMemoryTrait;
use autorefresh::services::period_gate::{PeriodGateTrait, PeriodOutcome};
use autorefresh::services::settings_engine::SettingsEngineTrait;
use autorefresh::types::entity::{EntityId, TimerKey};
use autorefresh::types::event::{LifecycleEvent, PageMessage, Prompt};

const START: i64 = 1_700_000_000_000;

fn setup() -> App<QueuedHost> {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(START));
    let host = QueuedHost::new(db.clone(), clock.clone());
    let mut app = App::with_seed(db, host, clock, 7);
    app.startup().unwrap();
    app
}

fn open(app: &mut App<QueuedHost>, id: i64) -> EntityId {
    app.handle_event(LifecycleEvent::EntityCreated {
        entity_id: EntityId(id),
        window_id: 1,
        url: format!("https://example.com/{}", id),
        incognito: false,
        active: false,
        session_value: None,
    })
    .unwrap();
    EntityId(id)
}

/// Opens an entity whose last top-level request was an unconfirmed POST.
fn open_post(app: &mut App<QueuedHost>, id: i64) -> EntityId {
    let id = open(app, id);
    let mut form = BTreeMap::new();
    form.insert("comment".to_string(), vec!["hello".to_string()]);
    app.handle_event(LifecycleEvent::RequestStarted {
        entity_id: id,
        method: "POST".to_string(),
        form_data: Some(form),
    })
    .unwrap();
    app.host.drain_effects();
    id
}

fn prompts(app: &mut App<QueuedHost>) -> Vec<Prompt> {
    app.host
        .drain_effects()
        .into_iter()
        .filter_map(|e| match e {
            Effect::Prompt { prompt } => Some(prompt),
            _ => None,
        })
        .collect()
}

#[rstest]
#[case(5, 5)]
#[case(0, 0)]
#[case(-1, -1)]
#[case(-7, -1)]
fn test_period_is_stored_and_normalized(#[case] requested: i64, #[case] stored: i64) {
    let mut app = setup();
    let id = open(&mut app, 1);

    assert_eq!(app.set_period(id, requested).unwrap(), PeriodOutcome::Applied);
    assert_eq!(app.entity(id).unwrap().period, stored);
    assert_eq!(app.scheduler.is_armed(&TimerKey::for_entity(id)), stored >= 0);
}

#[test]
fn test_zero_period_fires_immediately() {
    let mut app = setup();
    let id = open(&mut app, 1);
    app.set_period(id, 0).unwrap();
    assert_eq!(app.scheduler.armed_delay(&TimerKey::for_entity(id)), Some(Duration::ZERO));
}

#[test]
fn test_custom_interval_prompts_without_change() {
    let mut app = setup();
    let id = open(&mut app, 1);
    app.set_period(id, 2).unwrap();
    app.host.drain_effects();

    assert_eq!(app.set_period(id, -2).unwrap(), PeriodOutcome::CustomIntervalRequested);
    assert_eq!(app.entity(id).unwrap().period, 2);
    assert_eq!(prompts(&mut app), vec![Prompt::CustomInterval { entity_id: id }]);

    app.handle_page_message(id, PageMessage::SetInterval { period: 17 }).unwrap();
    assert_eq!(app.entity(id).unwrap().period, 17);
    assert_eq!(
        app.scheduler.armed_delay(&TimerKey::for_entity(id)),
        Some(Duration::from_secs(17 * 60))
    );
}

#[test]
fn test_custom_on_unconfirmed_post_asks_for_confirmation_first() {
    let mut app = setup();
    let id = open_post(&mut app, 1);

    assert_eq!(app.set_period(id, -2).unwrap(), PeriodOutcome::ConfirmationRequired);
    assert_eq!(
        prompts(&mut app),
        vec![Prompt::ConfirmResend { entity_id: id, period: -2 }]
    );

    assert_eq!(app.confirm_resend(id, -2).unwrap(), PeriodOutcome::CustomIntervalRequested);
    assert_eq!(prompts(&mut app), vec![Prompt::CustomInterval { entity_id: id }]);
}

#[test]
fn test_disabling_a_post_page_needs_no_confirmation() {
    let mut app = setup();
    let id = open_post(&mut app, 1);

    assert_eq!(app.set_period(id, -1).unwrap(), PeriodOutcome::Applied);
    assert!(prompts(&mut app).is_empty());
}

#[test]
fn test_never_confirm_post_skips_the_gate() {
    let mut app = setup();
    app.settings_engine.set_value("neverConfirmPost", json!(true)).unwrap();
    let id = open_post(&mut app, 1);

    assert_eq!(app.set_period(id, 5).unwrap(), PeriodOutcome::Applied);
    assert!(!app.entity(id).unwrap().resend_confirmed);
    assert!(app.scheduler.is_armed(&TimerKey::for_entity(id)));
}

#[test]
fn test_disabling_withdraws_resend_confirmation() {
    let mut app = setup();
    let id = open_post(&mut app, 1);
    app.confirm_resend(id, 5).unwrap();
    assert!(app.entity(id).unwrap().resend_confirmed);

    app.set_period(id, -1).unwrap();
    assert!(!app.entity(id).unwrap().resend_confirmed);

    // The next enable asks again.
    assert_eq!(app.set_period(id, 5).unwrap(), PeriodOutcome::ConfirmationRequired);
}

#[test]
fn test_disable_is_idempotent() {
    let mut app = setup();
    let id = open(&mut app, 1);
    app.set_period(id, 5).unwrap();

    app.set_period(id, -1).unwrap();
    let first = app.entity(id).unwrap().clone();
    app.set_period(id, -1).unwrap();

    assert_eq!(app.entity(id).unwrap(), &first);
    assert_eq!(app.scheduler.armed_count(), 0);
}

#[test]
fn test_applied_period_is_saved_as_session_value() {
    let mut app = setup();
    let id = open(&mut app, 1);
    app.host.drain_effects();

    app.set_period(id, 3).unwrap();
    let saved: Vec<i64> = app
        .host
        .drain_effects()
        .into_iter()
        .filter_map(|e| match e {
            Effect::SaveSessionValue { entity_id, state } if entity_id == id => Some(state.period),
            _ => None,
        })
        .collect();
    assert_eq!(saved, vec![3]);
}

#[test]
fn test_remembered_entity_writes_through_to_url_memory() {
    let mut app = setup();
    let id = open(&mut app, 1);
    app.entities.get_mut(id).unwrap().remember = true;

    app.set_period(id, 4).unwrap();
    assert_eq!(app.url_memory.recall("example.com/1").unwrap().period, 4);

    app.set_period(id, 9).unwrap();
    assert_eq!(app.url_memory.recall("example.com/1").unwrap().period, 9);
}

#[test]
fn test_gone_entity_reports_without_side_effects() {
    let mut app = setup();
    let id = open(&mut app, 1);
    app.handle_event(LifecycleEvent::EntityRemoved { entity_id: id }).unwrap();
    app.host.drain_effects();

    assert_eq!(app.set_period(id, 5).unwrap(), PeriodOutcome::EntityGone);
    assert_eq!(app.confirm_resend(id, 5).unwrap(), PeriodOutcome::EntityGone);
    assert!(app.entity(id).is_none());
    assert!(app.host.effects().is_empty());
}
