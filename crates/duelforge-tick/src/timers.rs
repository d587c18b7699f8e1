//! Keyed one-shot and repeating timers owned by a room actor.
//!
//! A [`TimerSet`] holds deadlines, never sleeping tasks. The owning actor
//! awaits [`TimerSet::next_fired`] in its `select!` loop and reacts to the
//! key that fired. Scheduling a key that already exists replaces it, so a
//! key names at most one pending timer.
//!
//! Pausing a game freezes the set: every pending deadline is converted to
//! the time it still had left, and thawing re-anchors those remainders on
//! the current instant.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
enum Deadline {
    At(Instant),
    /// Time left when the set was frozen.
    Frozen(Duration),
}

#[derive(Debug, Clone)]
struct Entry {
    deadline: Deadline,
    /// `Some` for repeating timers.
    period: Option<Duration>,
    /// Insertion sequence, breaks ties between equal deadlines.
    seq: u64,
}

/// A set of keyed deadlines.
#[derive(Debug)]
pub struct TimerSet<K> {
    entries: HashMap<K, Entry>,
    next_seq: u64,
    frozen: bool,
}

impl<K> Default for TimerSet<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
            frozen: false,
        }
    }
}

impl<K: Copy + Eq + Hash + Debug> TimerSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires `key` once after `delay`.
    pub fn schedule_once(&mut self, key: K, delay: Duration) {
        self.insert(key, delay, None);
    }

    /// Fires `key` every `period`, first after one period.
    ///
    /// A zero period is raised to one millisecond so a repeating timer can
    /// never spin.
    pub fn schedule_repeating(&mut self, key: K, period: Duration) {
        let period = period.max(Duration::from_millis(1));
        self.insert(key, period, Some(period));
    }

    fn insert(&mut self, key: K, delay: Duration, period: Option<Duration>) {
        let deadline = if self.frozen {
            Deadline::Frozen(delay)
        } else {
            Deadline::At(Instant::now() + delay)
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        trace!(?key, delay_ms = delay.as_millis() as u64, repeating = period.is_some(), "timer scheduled");
        self.entries.insert(
            key,
            Entry {
                deadline,
                period,
                seq,
            },
        );
    }

    /// Cancels `key`. Returns `false` if nothing was scheduled under it.
    pub fn cancel(&mut self, key: K) -> bool {
        self.entries.remove(&key).is_some()
    }

    /// Cancels every timer.
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Cancels every timer matching `pred`.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) {
        self.entries.retain(|k, _| !pred(k));
    }

    pub fn is_scheduled(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// Time left until `key` fires.
    pub fn remaining(&self, key: K) -> Option<Duration> {
        self.entries.get(&key).map(|e| match e.deadline {
            Deadline::At(at) => at.saturating_duration_since(Instant::now()),
            Deadline::Frozen(left) => left,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Stops the clock for every pending timer. Idempotent.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        self.frozen = true;
        let now = Instant::now();
        for entry in self.entries.values_mut() {
            if let Deadline::At(at) = entry.deadline {
                entry.deadline = Deadline::Frozen(at.saturating_duration_since(now));
            }
        }
    }

    /// Restarts the clock; each timer keeps the time it had left. Idempotent.
    pub fn thaw(&mut self) {
        if !self.frozen {
            return;
        }
        self.frozen = false;
        let now = Instant::now();
        for entry in self.entries.values_mut() {
            if let Deadline::Frozen(left) = entry.deadline {
                entry.deadline = Deadline::At(now + left);
            }
        }
    }

    /// The earliest pending deadline, if the set is running.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.earliest().map(|(_, at)| at)
    }

    fn earliest(&self) -> Option<(K, Instant)> {
        if self.frozen {
            return None;
        }
        self.entries
            .iter()
            .filter_map(|(k, e)| match e.deadline {
                Deadline::At(at) => Some((*k, at, e.seq)),
                Deadline::Frozen(_) => None,
            })
            .min_by_key(|&(_, at, seq)| (at, seq))
            .map(|(k, at, _)| (k, at))
    }

    /// Waits for the earliest timer and returns its key.
    ///
    /// One-shot timers are removed as they fire; repeating timers are
    /// re-armed one period after their previous deadline. Pends forever
    /// while the set is empty or frozen. Cancel safe: the set is only
    /// touched after the sleep completes.
    pub async fn next_fired(&mut self) -> K {
        let Some((key, at)) = self.earliest() else {
            return std::future::pending().await;
        };
        time::sleep_until(at).await;

        if let Some(entry) = self.entries.get_mut(&key) {
            match entry.period {
                Some(period) => entry.deadline = Deadline::At(at + period),
                None => {
                    self.entries.remove(&key);
                }
            }
        }
        trace!(?key, "timer fired");
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        A,
        B,
    }

    #[test]
    fn test_reschedule_replaces_existing_key() {
        let mut set = TimerSet::new();
        set.schedule_once(Key::A, Duration::from_secs(1));
        set.schedule_once(Key::A, Duration::from_secs(2));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_cancel_reports_presence() {
        let mut set = TimerSet::new();
        set.schedule_once(Key::A, Duration::from_secs(1));
        assert!(set.cancel(Key::A));
        assert!(!set.cancel(Key::A));
        assert!(!set.cancel(Key::B));
    }

    #[test]
    fn test_frozen_set_has_no_next_deadline() {
        let mut set = TimerSet::new();
        set.schedule_once(Key::A, Duration::from_secs(1));
        assert!(set.next_deadline().is_some());
        set.freeze();
        assert!(set.next_deadline().is_none());
        set.thaw();
        assert!(set.next_deadline().is_some());
    }
}
