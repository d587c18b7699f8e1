//! Clock and timer service for Duelforge rooms.
//!
//! Two primitives, both driven from a room actor's `tokio::select!` loop:
//!
//! - [`TimerSet`]: keyed one-shot and repeating deadlines (countdown,
//!   round duration, engine timers such as Memory's flip-back). Freezable
//!   for pause/resume.
//! - [`TickScheduler`]: fixed-interval simulation ticks for continuous
//!   games, with an overrun policy and slow-tick accounting.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* join, leave, action, ... */ }
//!         key = timers.next_fired() => session.on_timer(key),
//!         info = ticks.wait_for_tick() => {
//!             session.on_tick(info.dt);
//!             ticks.tick_done();
//!         }
//!     }
//! }
//! ```
//!
//! Both futures pend forever when there is nothing to wait for, so the
//! loop needs no special cases for turn-based games or paused rooms.

mod scheduler;
mod timers;

pub use scheduler::{TickConfig, TickInfo, TickPolicy, TickScheduler, TickStats};
pub use timers::TimerSet;
