//! Unit tests for menu command dispatch.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use autorefresh::app::App;
use autorefresh::clock::{Clock, ManualClock};
use autorefresh::database::Database;
use autorefresh::host::{Effect, QueuedHost};
use autorefresh::managers::url_memory::UrlMemoryTrait;
use autorefresh::services::command_dispatch::CommandDispatchTrait;
use autorefresh::services::period_gate::PeriodGateTrait;
use autorefresh::types::command::{Command, Flag, PeriodChoice};
use autorefresh::types::entity::{EntityId, EntityState, TimerKey};
use autorefresh::types::event::{LifecycleEvent, Prompt, WindowId};

const START: i64 = 1_700_000_000_000;

fn setup() -> (App<QueuedHost>, ManualClock) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let clock = ManualClock::new(START);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let host = QueuedHost::new(db.clone(), shared.clone());
    let mut app = App::with_seed(db, host, shared, 7);
    app.startup().unwrap();
    (app, clock)
}

fn open_in(app: &mut App<QueuedHost>, id: i64, window: WindowId) -> EntityId {
    app.handle_event(LifecycleEvent::EntityCreated {
        entity_id: EntityId(id),
        window_id: window,
        url: format!("https://example.com/{}", id),
        incognito: false,
        active: false,
        session_value: None,
    })
    .unwrap();
    EntityId(id)
}

fn state(app: &App<QueuedHost>, id: EntityId) -> &EntityState {
    app.entity(id).unwrap()
}

fn reloads(app: &mut App<QueuedHost>) -> Vec<(EntityId, bool)> {
    app.host
        .drain_effects()
        .into_iter()
        .filter_map(|e| match e {
            Effect::Reload { entity_id, bypass_cache } => Some((entity_id, bypass_cache)),
            _ => None,
        })
        .collect()
}

#[rstest]
#[case(PeriodChoice::Minutes(15), 15)]
#[case(PeriodChoice::Disable, -1)]
fn test_set_period_command(#[case] choice: PeriodChoice, #[case] expected: i64) {
    let (mut app, _clock) = setup();
    let id = open_in(&mut app, 1, 1);

    app.dispatch(id, Command::SetPeriod { period: choice }).unwrap();
    assert_eq!(state(&app, id).period, expected);
}

#[test]
fn test_custom_period_command_prompts() {
    let (mut app, _clock) = setup();
    let id = open_in(&mut app, 1, 1);
    app.host.drain_effects();

    app.dispatch(id, Command::SetPeriod { period: PeriodChoice::Custom }).unwrap();
    assert!(app
        .host
        .effects()
        .contains(&Effect::Prompt { prompt: Prompt::CustomInterval { entity_id: id } }));
}

#[rstest]
#[case(Flag::Randomize)]
#[case(Flag::Remember)]
#[case(Flag::NoCache)]
#[case(Flag::Sticky)]
#[case(Flag::OnlyOnError)]
fn test_toggle_sets_flag(#[case] flag: Flag) {
    let (mut app, _clock) = setup();
    let id = open_in(&mut app, 1, 1);

    app.dispatch(id, Command::Toggle { flag, enabled: true }).unwrap();
    let s = state(&app, id);
    let value = match flag {
        Flag::Randomize => s.randomize,
        Flag::Remember => s.remember,
        Flag::NoCache => s.no_cache,
        Flag::Smart => s.smart,
        Flag::Sticky => s.sticky_reload,
        Flag::OnlyOnError => s.only_on_error,
    };
    assert!(value);
}

#[test]
fn test_toggle_smart_off() {
    let (mut app, _clock) = setup();
    let id = open_in(&mut app, 1, 1);
    assert!(state(&app, id).smart);

    app.dispatch(id, Command::Toggle { flag: Flag::Smart, enabled: false }).unwrap();
    assert!(!state(&app, id).smart);
}

#[test]
fn test_toggle_remember_writes_and_clears_url_memory() {
    let (mut app, _clock) = setup();
    let id = open_in(&mut app, 1, 1);
    app.set_period(id, 10).unwrap();

    app.dispatch(id, Command::Toggle { flag: Flag::Remember, enabled: true }).unwrap();
    assert_eq!(app.url_memory.recall("example.com/1").unwrap().period, 10);

    app.dispatch(id, Command::Toggle { flag: Flag::Remember, enabled: false }).unwrap();
    assert!(app.url_memory.recall("example.com/1").is_none());
}

#[test]
fn test_toggle_only_on_error_rearms_timer() {
    let (mut app, clock) = setup();
    let id = open_in(&mut app, 1, 1);
    app.set_period(id, 5).unwrap();
    let key = TimerKey::for_entity(id);
    assert_eq!(app.scheduler.deadline(&key), Some(START + 300_000));

    clock.advance(Duration::from_secs(120));
    app.dispatch(id, Command::Toggle { flag: Flag::OnlyOnError, enabled: true }).unwrap();
    assert_eq!(app.scheduler.deadline(&key), Some(START + 420_000));
}

#[test]
fn test_other_toggles_leave_timer_alone() {
    let (mut app, clock) = setup();
    let id = open_in(&mut app, 1, 1);
    app.set_period(id, 5).unwrap();

    clock.advance(Duration::from_secs(120));
    app.dispatch(id, Command::Toggle { flag: Flag::NoCache, enabled: true }).unwrap();
    assert_eq!(app.scheduler.deadline(&TimerKey::for_entity(id)), Some(START + 300_000));
}

#[test]
fn test_reload_one_bypasses_cache() {
    let (mut app, _clock) = setup();
    let id = open_in(&mut app, 1, 1);
    app.host.drain_effects();

    app.dispatch(id, Command::ReloadOne).unwrap();
    assert_eq!(reloads(&mut app), vec![(id, true)]);
    assert!(state(&app, id).reload_initiated_by_system);
}

#[test]
fn test_reload_all_covers_current_window_only() {
    let (mut app, _clock) = setup();
    let a = open_in(&mut app, 1, 1);
    let b = open_in(&mut app, 2, 1);
    let other = open_in(&mut app, 3, 2);
    app.handle_event(LifecycleEvent::WindowFocusChanged { window_id: 1 }).unwrap();
    app.host.drain_effects();

    app.dispatch(a, Command::ReloadAll).unwrap();

    let reloaded = reloads(&mut app);
    assert_eq!(reloaded, vec![(a, false), (b, false)]);
    assert!(!reloaded.iter().any(|(id, _)| *id == other));
}

#[test]
fn test_enable_all_copies_settings_and_keeps_confirmation() {
    let (mut app, _clock) = setup();
    let template = open_in(&mut app, 1, 1);
    let confirmed = open_in(&mut app, 2, 1);
    let unconfirmed = open_in(&mut app, 3, 2);

    for id in [confirmed, unconfirmed] {
        app.handle_event(LifecycleEvent::RequestStarted {
            entity_id: id,
            method: "POST".to_string(),
            form_data: None,
        })
        .unwrap();
    }
    app.confirm_resend(confirmed, 1).unwrap();

    app.dispatch(template, Command::Toggle { flag: Flag::NoCache, enabled: true }).unwrap();
    app.dispatch(template, Command::SetPeriod { period: PeriodChoice::Minutes(5) }).unwrap();
    app.host.drain_effects();

    app.dispatch(template, Command::EnableAll).unwrap();

    let s = state(&app, confirmed);
    assert_eq!(s.period, 5);
    assert!(s.no_cache);
    assert!(s.resend_confirmed);
    assert!(app.scheduler.is_armed(&TimerKey::for_entity(confirmed)));

    // The unconfirmed form page only gets asked.
    let s = state(&app, unconfirmed);
    assert_eq!(s.period, -1);
    assert!(s.no_cache);
    assert!(!app.scheduler.is_armed(&TimerKey::for_entity(unconfirmed)));
    assert!(app.host.effects().contains(&Effect::Prompt {
        prompt: Prompt::ConfirmResend { entity_id: unconfirmed, period: 5 }
    }));
}

#[test]
fn test_disable_all_stops_every_timer() {
    let (mut app, _clock) = setup();
    let a = open_in(&mut app, 1, 1);
    let b = open_in(&mut app, 2, 2);
    app.set_period(a, 1).unwrap();
    app.set_period(b, 2).unwrap();

    app.dispatch(a, Command::DisableAll).unwrap();

    assert_eq!(state(&app, a).period, -1);
    assert_eq!(state(&app, b).period, -1);
    assert_eq!(app.scheduler.armed_count(), 0);
}

#[test]
fn test_command_persists_session_value() {
    let (mut app, _clock) = setup();
    let id = open_in(&mut app, 1, 1);
    app.host.drain_effects();

    app.dispatch(id, Command::Toggle { flag: Flag::Sticky, enabled: true }).unwrap();
    let last_saved = app
        .host
        .effects()
        .iter()
        .rev()
        .find_map(|e| match e {
            Effect::SaveSessionValue { state, .. } => Some(state.sticky_reload),
            _ => None,
        });
    assert_eq!(last_saved, Some(true));
}

#[test]
fn test_command_on_vanished_entity_is_ignored() {
    let (mut app, _clock) = setup();
    let ghost = EntityId(77);

    app.dispatch(ghost, Command::Toggle { flag: Flag::NoCache, enabled: true }).unwrap();
    app.dispatch(ghost, Command::ReloadOne).unwrap();
    app.dispatch(ghost, Command::EnableAll).unwrap();

    assert!(app.entity(ghost).is_none());
    assert!(app.host.effects().is_empty());
}
