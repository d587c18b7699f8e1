//! Fixed-interval simulation ticks for continuous games.
//!
//! Pong integrates its ball every 30 ms, Snake steps every 200 ms and
//! Tetris drops its pieces every 500 ms. Each of those rooms owns one
//! [`TickScheduler`] and awaits [`TickScheduler::wait_for_tick`] inside its
//! actor loop. Turn-based games never create one.

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

/// What to do when a tick fires late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Forget the missed ticks; the next one is a full interval from now.
    #[default]
    Skip,
    /// Fire up to `max_catchup` missed ticks back to back, then skip the rest.
    CatchUp { max_catchup: u32 },
    /// Stay on the original grid and fire every missed tick.
    KeepCadence,
}

impl TickPolicy {
    /// Next deadline after a tick scheduled for `due` woke at `now`, and
    /// how many ticks that deadline abandons.
    pub fn reschedule(self, due: TokioInstant, now: TokioInstant, dt: Duration) -> (TokioInstant, u64) {
        let late_by = now.saturating_duration_since(due);
        if !is_overrun(late_by, dt) {
            return (due + dt, 0);
        }
        let behind = whole_intervals(late_by, dt);
        match self {
            Self::Skip => (now + dt, behind),
            Self::CatchUp { max_catchup } if behind > u64::from(max_catchup) => {
                (now + dt, behind - u64::from(max_catchup))
            }
            Self::CatchUp { .. } | Self::KeepCadence => (due + dt, 0),
        }
    }
}

/// A tick counts as late once it wakes more than a tenth of an interval
/// after its deadline.
fn is_overrun(late_by: Duration, dt: Duration) -> bool {
    late_by > dt / 10
}

fn whole_intervals(span: Duration, dt: Duration) -> u64 {
    (span.as_nanos() / dt.as_nanos().max(1)) as u64
}

/// Settings of one scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct TickConfig {
    pub interval: Duration,
    pub policy: TickPolicy,
    /// Share of the interval a tick may spend before it is logged as slow.
    pub slow_tick_ratio: f64,
}

impl TickConfig {
    /// Shortest interval the scheduler accepts.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(5);

    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            policy: TickPolicy::default(),
            slow_tick_ratio: 0.8,
        }
    }

    pub fn with_policy(mut self, policy: TickPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_slow_tick_ratio(mut self, ratio: f64) -> Self {
        self.slow_tick_ratio = ratio;
        self
    }

    /// Raises the interval to [`Self::MIN_INTERVAL`] and keeps the slow
    /// tick ratio inside `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "tick interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self.slow_tick_ratio = self.slow_tick_ratio.clamp(0.0, 1.0);
        self
    }
}

/// One fired tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Fixed simulation step; always the configured interval.
    pub dt: Duration,
    /// How long after its deadline the tick woke.
    pub late_by: Duration,
    /// Ticks abandoned because of the delay.
    pub skipped: u64,
}

impl TickInfo {
    pub fn is_overrun(&self) -> bool {
        is_overrun(self.late_by, self.dt)
    }
}

/// Counters kept across the scheduler's life.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickStats {
    pub ticks: u64,
    pub overruns: u64,
    pub skipped: u64,
    pub slow_ticks: u64,
    /// Longest time the room spent handling one tick.
    pub slowest: Duration,
    /// Last tick's handling time as a share of the interval.
    pub last_load: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Paused,
    Stopped,
}

/// Fixed-interval tick scheduler. One per continuous-game room.
///
/// `stop` is terminal: a stopped scheduler pends forever and ignores
/// `resume`.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    phase: Phase,
    tick: u64,
    due: TokioInstant,
    /// Wall-clock start of the tick being handled, taken by `tick_done`.
    handling_since: Option<Instant>,
    stats: TickStats,
}

impl TickScheduler {
    /// The first tick fires one interval from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        debug!(
            interval_ms = config.interval.as_millis() as u64,
            policy = ?config.policy,
            "tick scheduler created"
        );
        Self {
            due: TokioInstant::now() + config.interval,
            config,
            phase: Phase::Running,
            tick: 0,
            handling_since: None,
            stats: TickStats::default(),
        }
    }

    pub fn every(interval: Duration) -> Self {
        Self::new(TickConfig::every(interval))
    }

    /// Waits for the next tick.
    ///
    /// Pends forever while paused or stopped, so it can sit in a
    /// `tokio::select!` next to the room's command channel. Cancel safe:
    /// nothing changes until the sleep completes.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.phase != Phase::Running {
            std::future::pending::<()>().await;
        }
        time::sleep_until(self.due).await;

        let now = TokioInstant::now();
        let dt = self.config.interval;
        let late_by = now.saturating_duration_since(self.due);
        let (next, skipped) = self.config.policy.reschedule(self.due, now, dt);
        self.due = next;
        self.tick += 1;
        self.handling_since = Some(Instant::now());

        let info = TickInfo {
            tick: self.tick,
            dt,
            late_by,
            skipped,
        };
        self.stats.ticks += 1;
        self.stats.skipped += skipped;
        if info.is_overrun() {
            self.stats.overruns += 1;
            warn!(
                tick = self.tick,
                late_ms = late_by.as_millis() as u64,
                skipped,
                policy = ?self.config.policy,
                "tick overrun"
            );
        } else {
            trace!(tick = self.tick, "tick");
        }
        info
    }

    /// Marks the current tick as handled and updates the load figures.
    /// No-op if no tick is being handled.
    pub fn tick_done(&mut self) {
        let Some(since) = self.handling_since.take() else {
            return;
        };
        let spent = since.elapsed();
        let load = spent.as_secs_f64() / self.config.interval.as_secs_f64();

        self.stats.last_load = load;
        self.stats.slowest = self.stats.slowest.max(spent);
        if load >= self.config.slow_tick_ratio {
            self.stats.slow_ticks += 1;
            warn!(
                tick = self.tick,
                spent_us = spent.as_micros() as u64,
                budget_ms = self.config.interval.as_millis() as u64,
                "slow tick"
            );
        }
    }

    /// Idempotent; ignored once stopped.
    pub fn pause(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
            debug!(tick = self.tick, "ticks paused");
        }
    }

    /// The next tick is one full interval from now.
    pub fn resume(&mut self) {
        if self.phase == Phase::Paused {
            self.phase = Phase::Running;
            self.due = TokioInstant::now() + self.config.interval;
            debug!(tick = self.tick, "ticks resumed");
        }
    }

    /// Returns `true` only for the call that actually stopped it.
    pub fn stop(&mut self) -> bool {
        if self.phase == Phase::Stopped {
            return false;
        }
        self.phase = Phase::Stopped;
        debug!(tick = self.tick, "ticks stopped");
        true
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == Phase::Stopped
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn policy(&self) -> TickPolicy {
        self.config.policy
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }
}
