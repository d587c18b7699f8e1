//! Integration tests for keyed timers.

use std::time::Duration;

use duelforge_tick::TimerSet;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    Countdown,
    Duration,
    FlipBack,
}

#[tokio::test(start_paused = true)]
async fn test_earliest_timer_fires_first() {
    let mut timers = TimerSet::new();
    timers.schedule_once(Key::Duration, Duration::from_secs(300));
    timers.schedule_once(Key::FlipBack, Duration::from_secs(1));

    assert_eq!(timers.next_fired().await, Key::FlipBack);
    assert_eq!(timers.next_fired().await, Key::Duration);
    assert!(timers.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_equal_deadlines_fire_in_schedule_order() {
    let mut timers = TimerSet::new();
    timers.schedule_once(Key::FlipBack, Duration::from_secs(1));
    timers.schedule_once(Key::Countdown, Duration::from_secs(1));

    assert_eq!(timers.next_fired().await, Key::FlipBack);
    assert_eq!(timers.next_fired().await, Key::Countdown);
}

#[tokio::test(start_paused = true)]
async fn test_repeating_timer_keeps_cadence() {
    let start = Instant::now();
    let mut timers = TimerSet::new();
    timers.schedule_repeating(Key::Countdown, Duration::from_secs(1));

    for n in 1..=5u64 {
        assert_eq!(timers.next_fired().await, Key::Countdown);
        assert_eq!(start.elapsed().as_secs(), n);
    }
    assert!(timers.is_scheduled(Key::Countdown));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_timer_never_fires() {
    let mut timers = TimerSet::new();
    timers.schedule_once(Key::FlipBack, Duration::from_secs(1));
    assert!(timers.cancel(Key::FlipBack));

    let result = time::timeout(Duration::from_secs(10), timers.next_fired()).await;
    assert!(result.is_err(), "empty set must pend");
}

#[tokio::test(start_paused = true)]
async fn test_dropped_wait_does_not_consume_timer() {
    let mut timers = TimerSet::new();
    timers.schedule_once(Key::Duration, Duration::from_secs(5));

    // A select! branch losing the race drops the future mid-sleep.
    let lost = time::timeout(Duration::from_secs(1), timers.next_fired()).await;
    assert!(lost.is_err());
    assert!(timers.is_scheduled(Key::Duration));
    assert_eq!(timers.next_fired().await, Key::Duration);
}

#[tokio::test(start_paused = true)]
async fn test_freeze_preserves_remaining_time() {
    let mut timers = TimerSet::new();
    timers.schedule_once(Key::Duration, Duration::from_secs(10));
    time::advance(Duration::from_secs(4)).await;

    timers.freeze();
    assert_eq!(timers.remaining(Key::Duration), Some(Duration::from_secs(6)));

    // Time spent frozen does not count.
    let frozen = time::timeout(Duration::from_secs(60), timers.next_fired()).await;
    assert!(frozen.is_err());
    assert_eq!(timers.remaining(Key::Duration), Some(Duration::from_secs(6)));

    timers.thaw();
    let thawed_at = Instant::now();
    assert_eq!(timers.next_fired().await, Key::Duration);
    assert_eq!(thawed_at.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_schedule_while_frozen_waits_for_thaw() {
    let mut timers = TimerSet::new();
    timers.freeze();
    timers.schedule_once(Key::FlipBack, Duration::from_secs(1));
    assert!(timers.next_deadline().is_none());

    timers.thaw();
    assert_eq!(timers.next_fired().await, Key::FlipBack);
}

#[test]
fn test_cancel_where_filters_by_key() {
    let mut timers = TimerSet::new();
    timers.schedule_once(Key::Countdown, Duration::from_secs(1));
    timers.schedule_once(Key::Duration, Duration::from_secs(1));
    timers.schedule_once(Key::FlipBack, Duration::from_secs(1));

    timers.cancel_where(|k| *k != Key::Duration);
    assert_eq!(timers.len(), 1);
    assert!(timers.is_scheduled(Key::Duration));

    timers.cancel_all();
    assert!(timers.is_empty());
}
