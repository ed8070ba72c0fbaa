//! Unit tests for the Scheduler: delays, arming, and fire decisions.

use std::sync::Arc;
use std::time::Duration;

use autorefresh::clock::{Clock, ManualClock};
use autorefresh::services::scheduler::{FireOutcome, Scheduler};
use autorefresh::types::entity::{EntityId, EntityState};
use autorefresh::types::settings::EntityDefaults;
use rstest::rstest;

fn setup() -> (Scheduler, ManualClock) {
    let clock = ManualClock::new(1_000_000);
    (Scheduler::with_seed(Arc::new(clock.clone()), 42), clock)
}

fn entity(period: i64) -> EntityState {
    let mut e = EntityState::new(EntityId(1), &EntityDefaults::default());
    e.period = period;
    e
}

#[rstest]
#[case(0, 0)]
#[case(1, 60)]
#[case(5, 300)]
#[case(60, 3600)]
fn test_exact_delay_without_jitter(#[case] period: i64, #[case] secs: u64) {
    let (mut scheduler, _clock) = setup();
    assert_eq!(scheduler.arm(&entity(period)), Some(Duration::from_secs(secs)));
    assert!(scheduler.is_armed(&entity(period).timer_key));
}

#[rstest]
#[case(-1)]
#[case(-2)]
fn test_negative_period_disarms(#[case] period: i64) {
    let (mut scheduler, _clock) = setup();
    let mut e = entity(5);
    scheduler.arm(&e);
    e.period = period;
    assert_eq!(scheduler.arm(&e), None);
    assert!(!scheduler.is_armed(&e.timer_key));
    assert_eq!(scheduler.armed_count(), 0);
}

#[test]
fn test_rearm_replaces_previous_timer() {
    let (mut scheduler, clock) = setup();
    let mut e = entity(5);
    scheduler.arm(&e);
    clock.advance(Duration::from_secs(60));
    e.period = 10;
    scheduler.arm(&e);

    assert_eq!(scheduler.armed_count(), 1);
    assert_eq!(scheduler.deadline(&e.timer_key), Some(clock.now_ms() + 600_000));
}

#[test]
fn test_only_on_error_skips_successful_loads() {
    let (mut scheduler, clock) = setup();
    let mut e = entity(1);
    e.only_on_error = true;
    let key = e.timer_key.clone();

    assert_eq!(scheduler.on_fire(&key, Some(&e), clock.now_ms()), FireOutcome::Skipped);
    assert!(!scheduler.is_armed(&key));

    e.load_error = true;
    assert_eq!(scheduler.on_fire(&key, Some(&e), clock.now_ms()), FireOutcome::Reload);
}

#[test]
fn test_freeze_defers_for_exact_remainder() {
    let (mut scheduler, clock) = setup();
    let mut e = entity(1);
    e.randomize = true;
    e.freeze_until = clock.now_ms() + 2_500;
    let key = e.timer_key.clone();

    let outcome = scheduler.on_fire(&key, Some(&e), clock.now_ms());
    assert_eq!(outcome, FireOutcome::Deferred(Duration::from_millis(2_500)));
    assert_eq!(scheduler.deadline(&key), Some(e.freeze_until));
}

#[test]
fn test_freeze_ignored_without_smart() {
    let (mut scheduler, clock) = setup();
    let mut e = entity(1);
    e.smart = false;
    e.freeze_until = clock.now_ms() + 10_000;

    let outcome = scheduler.on_fire(&e.timer_key.clone(), Some(&e), clock.now_ms());
    assert_eq!(outcome, FireOutcome::Reload);
}

#[test]
fn test_fire_for_missing_entity_is_noop() {
    let (mut scheduler, clock) = setup();
    let key = entity(1).timer_key;
    assert_eq!(scheduler.on_fire(&key, None, clock.now_ms()), FireOutcome::Vanished);
    assert_eq!(scheduler.armed_count(), 0);
}

#[test]
fn test_take_due_consumes_timer() {
    let (mut scheduler, clock) = setup();
    let e = entity(2);
    scheduler.arm(&e);

    clock.advance(Duration::from_secs(119));
    assert!(scheduler.take_due(clock.now_ms()).is_empty());
    clock.advance(Duration::from_secs(1));
    assert_eq!(scheduler.take_due(clock.now_ms()), vec![e.timer_key.clone()]);
    assert!(!scheduler.is_armed(&e.timer_key));
    assert_eq!(scheduler.next_deadline(), None);
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_huge_period_saturates_instead_of_overflowing(#[case] randomize: bool) {
    let (mut scheduler, clock) = setup();
    let mut e = entity(i64::MAX / 2);
    e.randomize = randomize;

    let delay = scheduler.arm(&e).unwrap();
    assert!(delay >= Duration::from_secs(u64::MAX / 120));
    assert!(scheduler.take_due(clock.now_ms() + 365 * 24 * 3_600_000).is_empty());
    assert!(scheduler.is_armed(&e.timer_key));
}

#[test]
fn test_max_period_without_jitter_is_saturated() {
    let (mut scheduler, _clock) = setup();
    assert_eq!(
        scheduler.arm(&entity(i64::MAX)),
        Some(Duration::from_secs(u64::MAX))
    );
}
