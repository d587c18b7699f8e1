//! The `GameEngine` trait: the seam between the session lifecycle and the
//! rules of one game.
//!
//! The session owns the engine and calls it at well-defined points:
//!
//! ```text
//! start ──→ initialize
//! action ─→ process_action ──→ calculate_score (if valid)
//! tick ───→ tick            ──→ derived_scores
//! timer ──→ on_timer        ──→ derived_scores
//! leave ──→ on_player_left
//! ```
//!
//! Every call gets an [`EngineContext`] through which the engine can read
//! the roster and scores, draw random numbers, schedule its own timers,
//! emit room events and request the end of the game. A finish requested
//! through the context takes effect after the call returns, so the score
//! of a finishing action is credited first.

use std::time::Duration;

use rand::rngs::StdRng;
use serde_json::Value;

use duelforge_protocol::{ActionResult, EventName, PlayerId};
use duelforge_roster::Scoreboard;
use duelforge_tick::{TickPolicy, TimerSet};

use crate::{EngineError, PlayerLimits};

/// An engine-chosen timer id. The session namespaces it, so engines can
/// number their timers freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineTimer(pub u32);

/// Every timer a session may have pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionTimer {
    /// The 1 s countdown step while `starting`.
    Countdown,
    /// End of the active phase (`time_up`).
    Duration,
    /// A timer owned by the engine.
    Engine(EngineTimer),
}

/// The rules of one game.
///
/// Engines hold all of their state and must leave it unchanged when they
/// reject an action. Returning `Err` or panicking is treated as an engine
/// fault by the session: the action is reported as failed and the room
/// keeps running.
pub trait GameEngine: Send + 'static {
    /// The registration name (`"pong"`, `"tictactoe"`, ...).
    fn game_type(&self) -> &'static str;

    /// Seats the engine supports. Default: 2–4.
    fn player_limits(&self) -> PlayerLimits {
        PlayerLimits::range(2, 4)
    }

    /// Interval of the simulation tick, for continuous games.
    fn tick_interval(&self) -> Option<Duration> {
        None
    }

    /// How late ticks are handled.
    fn tick_policy(&self) -> TickPolicy {
        TickPolicy::Skip
    }

    /// Sets up the game for the players in `ctx.players()`.
    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), EngineError>;

    /// Applies one player action.
    fn process_action(
        &mut self,
        ctx: &mut EngineContext<'_>,
        player: PlayerId,
        action: &Value,
    ) -> Result<ActionResult, EngineError>;

    /// The player's new score after a valid action.
    fn calculate_score(&self, player: PlayerId, result: &ActionResult, current: i64) -> i64;

    /// Snapshot of the state every player may see.
    fn public_state(&self) -> Value;

    /// Advances the simulation by `dt`.
    fn tick(&mut self, _ctx: &mut EngineContext<'_>, _dt: Duration) -> Result<(), EngineError> {
        Ok(())
    }

    /// Handles a timer scheduled through [`EngineContext::schedule`].
    fn on_timer(&mut self, _ctx: &mut EngineContext<'_>, _timer: EngineTimer) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called when a player leaves while the game is active or paused.
    fn on_player_left(&mut self, _ctx: &mut EngineContext<'_>, _player: PlayerId, _temporary: bool) {}

    /// Scores derived from simulation state, re-applied after ticks and
    /// engine timers. Engines whose scores only change through actions
    /// return nothing.
    fn derived_scores(&self) -> Vec<(PlayerId, i64)> {
        Vec::new()
    }
}

/// What an engine can see and do during one call.
pub struct EngineContext<'a> {
    pub(crate) players: &'a [PlayerId],
    pub(crate) scores: &'a Scoreboard,
    pub(crate) rng: &'a mut StdRng,
    pub(crate) timers: &'a mut TimerSet<SessionTimer>,
    pub(crate) emitted: &'a mut Vec<(EventName, Value)>,
    pub(crate) finish: &'a mut Option<String>,
    pub(crate) round: &'a mut u32,
    pub(crate) elapsed: Duration,
}

impl<'a> EngineContext<'a> {
    /// Active players in join order.
    pub fn players(&self) -> &[PlayerId] {
        self.players
    }

    /// A player's current score (0 if unknown).
    pub fn score(&self, player: PlayerId) -> i64 {
        self.scores.get(player).unwrap_or(0)
    }

    /// All scores as a JSON object keyed by player id.
    pub fn scores_json(&self) -> Value {
        self.scores.to_json()
    }

    /// The session's RNG. Seeded from the session config when a seed is set.
    pub fn rng(&mut self) -> &mut StdRng {
        self.rng
    }

    /// Broadcasts an event to the room once the call returns.
    pub fn emit(&mut self, name: EventName, fields: Value) {
        self.emitted.push((name, fields));
    }

    /// Requests the end of the game. The first requested reason wins.
    pub fn finish(&mut self, reason: impl Into<String>) {
        if self.finish.is_none() {
            *self.finish = Some(reason.into());
        }
    }

    /// Whether a finish has been requested during this call.
    pub fn finish_requested(&self) -> bool {
        self.finish.is_some()
    }

    /// Schedules (or reschedules) an engine timer.
    pub fn schedule(&mut self, timer: EngineTimer, delay: Duration) {
        self.timers.schedule_once(SessionTimer::Engine(timer), delay);
    }

    /// Cancels an engine timer. Returns `false` if it was not pending.
    pub fn cancel(&mut self, timer: EngineTimer) -> bool {
        self.timers.cancel(SessionTimer::Engine(timer))
    }

    pub fn is_scheduled(&self, timer: EngineTimer) -> bool {
        self.timers.is_scheduled(SessionTimer::Engine(timer))
    }

    pub fn round(&self) -> u32 {
        *self.round
    }

    pub fn set_round(&mut self, round: u32) {
        *self.round = round;
    }

    /// Time spent in the active phase, pauses excluded.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
