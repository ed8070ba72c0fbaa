//! Reload scheduling.
//!
//! Computes timer delays (with optional jitter), arms and cancels the
//! per-entity timer, and decides what a due timer should do.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::Clock;
use crate::managers::timer_service::{TimerService, TimerWheel};
use crate::types::entity::{EntityState, TimerKey};

/// What a due timer turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// The owning entity is gone.
    Vanished,
    /// "Only if unsuccessful" is on and the last load succeeded.
    Skipped,
    /// A freeze window is active; the timer was re-armed for its remainder.
    Deferred(Duration),
    /// The entity should be reloaded now.
    Reload,
}

pub struct Scheduler {
    timers: TimerWheel,
    rng: StdRng,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            timers: TimerWheel::new(clock),
            rng: StdRng::from_entropy(),
        }
    }

    /// A scheduler whose jitter is reproducible.
    pub fn with_seed(clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self {
            timers: TimerWheel::new(clock),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The delay `entity` should be armed with, or `None` when it has no recurring timer.
    ///
    /// With `randomize` the delay is drawn uniformly from `[0.5, 1.5] × period`.
    /// Delays too large to represent saturate to [`Duration::MAX`].
    pub fn delay_for(&mut self, entity: &EntityState) -> Option<Duration> {
        if entity.period < 0 {
            return None;
        }
        if !entity.randomize || entity.period == 0 {
            let secs = (entity.period as u64).saturating_mul(60);
            return Some(Duration::from_secs(secs));
        }

        let period = entity.period as f64;
        let (min, max) = (period * 0.5, period * 1.5);
        let minutes = self.rng.gen_range(min..=max).clamp(min, max);
        // Periods beyond what a Duration can hold wait forever.
        Some(Duration::try_from_secs_f64(minutes * 60.0).unwrap_or(Duration::MAX))
    }

    /// Cancels any timer for `entity`, then arms a fresh one if its period allows.
    /// Returns the armed delay.
    pub fn arm(&mut self, entity: &EntityState) -> Option<Duration> {
        self.timers.clear(&entity.timer_key);
        let delay = self.delay_for(entity)?;
        self.timers.create(&entity.timer_key, delay);
        tracing::debug!(entity = %entity.entity_id, ?delay, "timer armed");
        Some(delay)
    }

    /// Cancels the timer under `key` unconditionally.
    pub fn disarm(&mut self, key: &TimerKey) -> bool {
        self.timers.clear(key)
    }

    /// Decides what the consumed timer under `key` does.
    ///
    /// A freeze window re-arms the timer for exactly the time left in it, without
    /// jitter. Each fire only looks at the current `freeze_until`, so activity
    /// during the deferred wait postpones the reload again only once that wait is
    /// over.
    pub fn on_fire(&mut self, key: &TimerKey, entity: Option<&EntityState>, now_ms: i64) -> FireOutcome {
        let Some(entity) = entity else {
            return FireOutcome::Vanished;
        };

        if entity.only_on_error && !entity.load_error {
            return FireOutcome::Skipped;
        }

        if entity.smart && now_ms < entity.freeze_until {
            let remaining = Duration::from_millis((entity.freeze_until - now_ms) as u64);
            self.timers.create(key, remaining);
            return FireOutcome::Deferred(remaining);
        }

        FireOutcome::Reload
    }

    /// Removes and returns the keys of every timer due at `now_ms`.
    pub fn take_due(&mut self, now_ms: i64) -> Vec<TimerKey> {
        self.timers.take_due(now_ms)
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.timers.next_deadline()
    }

    pub fn is_armed(&self, key: &TimerKey) -> bool {
        self.timers.is_armed(key)
    }

    pub fn armed_delay(&self, key: &TimerKey) -> Option<Duration> {
        self.timers.armed_delay(key)
    }

    pub fn deadline(&self, key: &TimerKey) -> Option<i64> {
        self.timers.deadline(key)
    }

    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }
}
