//! Logical one-shot timers keyed by [`TimerKey`].
//!
//! Timers never fire on their own: the owner polls [`TimerWheel::take_due`]
//! (or sleeps until [`TimerWheel::next_deadline`]) and handles each due key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::types::entity::TimerKey;

/// Trait defining the timer service interface.
pub trait TimerService {
    /// Arms a one-shot timer under `key`, replacing any timer already armed there.
    fn create(&mut self, key: &TimerKey, delay: Duration);
    /// Cancels the timer under `key`. Returns whether one was armed.
    fn clear(&mut self, key: &TimerKey) -> bool;
    fn is_armed(&self, key: &TimerKey) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    deadline_ms: i64,
    delay: Duration,
}

/// In-process timer table driven by a [`Clock`].
pub struct TimerWheel {
    clock: Arc<dyn Clock>,
    timers: HashMap<TimerKey, Timer>,
}

impl TimerWheel {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: HashMap::new(),
        }
    }

    /// The delay the timer under `key` was armed with.
    pub fn armed_delay(&self, key: &TimerKey) -> Option<Duration> {
        self.timers.get(key).map(|t| t.delay)
    }

    /// Absolute deadline (ms since epoch) of the timer under `key`.
    pub fn deadline(&self, key: &TimerKey) -> Option<i64> {
        self.timers.get(key).map(|t| t.deadline_ms)
    }

    /// Earliest deadline among all armed timers.
    pub fn next_deadline(&self) -> Option<i64> {
        self.timers.values().map(|t| t.deadline_ms).min()
    }

    /// Removes and returns every timer due at `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: i64) -> Vec<TimerKey> {
        let mut due: Vec<(i64, TimerKey)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline_ms <= now_ms)
            .map(|(k, t)| (t.deadline_ms, k.clone()))
            .collect();
        due.sort();

        for (_, key) in &due {
            self.timers.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl TimerService for TimerWheel {
    fn create(&mut self, key: &TimerKey, delay: Duration) {
        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        let deadline_ms = self.clock.now_ms().saturating_add(delay_ms);
        self.timers.insert(key.clone(), Timer { deadline_ms, delay });
    }

    fn clear(&mut self, key: &TimerKey) -> bool {
        self.timers.remove(key).is_some()
    }

    fn is_armed(&self, key: &TimerKey) -> bool {
        self.timers.contains_key(key)
    }
}
