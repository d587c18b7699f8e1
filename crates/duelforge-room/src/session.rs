//! The session state machine.
//!
//! A [`Session`] is the whole life of one game in one room: membership,
//! countdown, timing, action routing, scores and termination. It is plain
//! synchronous state. Timers and ticks are deadlines it owns; the room
//! actor awaits [`Session::next_wakeup`] and feeds the result back through
//! [`Session::on_wakeup`]. Every broadcast goes into an outbox that the
//! actor drains after each step, so the state machine can be driven and
//! inspected without a transport.
//!
//! ```text
//!  join ≥ min           countdown hits 0        pause
//! Waiting ──→ Starting ─────────────────→ Active ⇄ Paused
//!    │           │                          │        │
//!    └───────────┴──── finish(reason) ──────┴────────┴──→ Finished
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use duelforge_protocol::{ActionResult, EventName, PlayerId, RoomEvent, RoomId, Standing, now_millis};
use duelforge_roster::{JoinOutcome, JoinRequest, LeaveOutcome, Roster, RosterError, Scoreboard};
use duelforge_tick::{TickConfig, TickInfo, TickScheduler, TimerSet};

use crate::{EngineContext, EngineError, GameEngine, RoomError, SessionConfig, SessionState, SessionTimer};

/// Consecutive faulted ticks after which the game is ended.
pub const MAX_TICK_FAULTS: u32 = 3;

/// Finish reasons used by the lifecycle itself. Engines add their own.
pub mod reason {
    pub const TIME_UP: &str = "time_up";
    pub const INSUFFICIENT_PLAYERS: &str = "insufficient_players";
    pub const ENGINE_FAULT: &str = "engine_fault";
    pub const ROOM_CLOSED: &str = "room_closed";
}

const ACTION_FAILED: &str = "Error processing action";
const NOT_ACTIVE: &str = "Game is not active or player not in game";

/// Something the session was waiting for.
#[derive(Debug, Clone)]
pub enum Wakeup {
    Timer(SessionTimer),
    Tick(TickInfo),
}

/// Room metadata, as reported to lobbies and the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub game_id: String,
    pub room_id: RoomId,
    pub game_type: String,
    pub state: SessionState,
    pub player_count: usize,
    pub max_players: usize,
    /// Wall-clock start of the active phase (ms), shifted by pauses.
    pub start_time: Option<u64>,
    /// Configured duration in seconds.
    pub duration: u64,
    /// Seconds left in the active phase.
    pub remaining_time: f64,
}

/// One game in one room.
pub struct Session<E> {
    config: SessionConfig,
    min_players: usize,
    max_players: usize,
    state: SessionState,
    engine: E,
    roster: Roster,
    scores: Scoreboard,
    rng: StdRng,
    timers: TimerSet<SessionTimer>,
    ticks: Option<TickScheduler>,
    countdown: u32,
    round: u32,
    /// Monotonic start of the active phase, shifted forward by pauses.
    started_at: Option<Instant>,
    start_time_ms: Option<u64>,
    paused_at: Option<Instant>,
    paused_at_ms: Option<u64>,
    finish_reason: Option<String>,
    pending_finish: Option<String>,
    tick_faults: u32,
    outbox: Vec<RoomEvent>,
}

impl<E: GameEngine> Session<E> {
    /// Builds a waiting session. Player limits are fitted to the engine.
    pub fn new(config: SessionConfig, engine: E) -> Self {
        let (min_players, max_players) = engine
            .player_limits()
            .resolve(config.min_players, config.max_players);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let mut config = config;
        if config.game_id.is_empty() {
            config.game_id = format!("{}_{}", engine.game_type(), now_millis());
        }
        Self {
            min_players,
            max_players,
            state: SessionState::Waiting,
            engine,
            roster: Roster::new(max_players),
            scores: Scoreboard::new(),
            rng,
            timers: TimerSet::new(),
            ticks: None,
            countdown: 0,
            round: 0,
            started_at: None,
            start_time_ms: None,
            paused_at: None,
            paused_at_ms: None,
            finish_reason: None,
            pending_finish: None,
            tick_faults: 0,
            outbox: Vec::new(),
            config,
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn room_id(&self) -> RoomId {
        self.config.room_id
    }

    pub fn game_id(&self) -> &str {
        &self.config.game_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Why the session finished, once it has.
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Direct engine access, for setting up scenarios. Changes made here
    /// bypass the lifecycle and broadcast nothing.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn scores(&self) -> &Scoreboard {
        &self.scores
    }

    pub fn min_players(&self) -> usize {
        self.min_players
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Current countdown value while `starting`.
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Takes every event produced since the last call, in order.
    pub fn drain_events(&mut self) -> Vec<RoomEvent> {
        std::mem::take(&mut self.outbox)
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Adds, reconnects or refreshes a player.
    ///
    /// # Errors
    /// - [`RoomError::InvalidState`] once the session is finished.
    /// - [`RoomError::RoomFull`] when no seat is free.
    pub fn join(&mut self, player: PlayerId, request: JoinRequest) -> Result<JoinOutcome, RoomError> {
        if self.state.is_finished() {
            return Err(RoomError::InvalidState(format!(
                "cannot join session in state {}",
                self.state
            )));
        }

        let outcome = self
            .roster
            .join(player, request, now_millis())
            .map_err(|e| match e {
                RosterError::RoomFull { .. } => RoomError::RoomFull(self.config.room_id),
                other => RoomError::InvalidState(other.to_string()),
            })?;

        let reconnected = outcome == JoinOutcome::Reconnected;
        if outcome == JoinOutcome::Refreshed {
            debug!(room_id = %self.config.room_id, %player, "player refreshed");
            self.emit_player_joined(player, false);
            return Ok(outcome);
        }

        self.scores.register(player);
        info!(
            room_id = %self.config.room_id,
            %player,
            players = self.roster.len(),
            reconnected,
            "player joined"
        );
        self.emit_player_joined(player, reconnected);

        if self.state == SessionState::Waiting && self.roster.len() >= self.min_players {
            self.start_countdown();
        }
        Ok(outcome)
    }

    /// Removes a player. Unknown players are ignored (`false`).
    ///
    /// A temporary leave keeps the score; a permanent one deletes it.
    pub fn leave(&mut self, player: PlayerId, temporary: bool) -> bool {
        let Some(outcome) = self.roster.leave(player, temporary, now_millis()) else {
            debug!(room_id = %self.config.room_id, %player, "leave for unknown player ignored");
            return false;
        };
        if let LeaveOutcome::Removed(_) = outcome {
            self.scores.remove(player);
        }

        self.announce_departure(player, temporary);

        if self.state.is_underway() && self.roster.len() < self.min_players {
            self.finish(reason::INSUFFICIENT_PLAYERS);
        } else {
            self.apply_pending_finish();
        }
        true
    }

    /// Turns disconnected players past the grace period into permanent
    /// removals: their score goes, the engine hears of it and the room
    /// gets a `playerLeft` with `temporary: false`. Returns who was
    /// dropped.
    pub fn expire_disconnected(&mut self) -> Vec<PlayerId> {
        let expired = self.roster.expire_disconnected(self.config.reconnect_grace());
        for &player in &expired {
            debug!(room_id = %self.config.room_id, %player, "reconnect grace expired");
            self.scores.remove(player);
            self.announce_departure(player, false);
        }
        if !expired.is_empty() {
            self.apply_pending_finish();
        }
        expired
    }

    fn emit_player_joined(&mut self, player: PlayerId, reconnected: bool) {
        self.emit(
            EventName::PlayerJoined,
            json!({
                "playerId": player,
                "playerCount": self.roster.len(),
                "maxPlayers": self.max_players,
                "reconnected": reconnected,
            }),
        );
    }

    /// Tells the engine (while the game runs) and the room that a player
    /// is gone.
    fn announce_departure(&mut self, player: PlayerId, temporary: bool) {
        if matches!(self.state, SessionState::Active | SessionState::Paused) {
            if let Err(err) = self.call_engine("on_player_left", |engine, ctx| {
                engine.on_player_left(ctx, player, temporary);
                Ok(())
            }) {
                error!(room_id = %self.config.room_id, %player, %err, "engine fault on player leave");
            }
        }

        info!(
            room_id = %self.config.room_id,
            %player,
            temporary,
            players = self.roster.len(),
            "player left"
        );
        self.emit(
            EventName::PlayerLeft,
            json!({
                "playerId": player,
                "playerCount": self.roster.len(),
                "maxPlayers": self.max_players,
                "temporary": temporary,
            }),
        );
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// `waiting → starting`. Called automatically when enough players
    /// have joined.
    pub fn start_countdown(&mut self) {
        if self.state != SessionState::Waiting {
            return;
        }
        self.state = SessionState::Starting;
        self.countdown = self.config.countdown_secs;
        if self.countdown == 0 {
            let _ = self.start();
            return;
        }
        info!(room_id = %self.config.room_id, countdown = self.countdown, "countdown started");
        self.emit(EventName::GameStarting, json!({ "countdown": self.countdown }));
        self.timers
            .schedule_repeating(SessionTimer::Countdown, Duration::from_secs(1));
    }

    /// `waiting/starting → active`.
    ///
    /// If the engine fails to initialize, the session finishes with
    /// `engine_fault` instead.
    pub fn start(&mut self) -> Result<(), RoomError> {
        if !matches!(self.state, SessionState::Waiting | SessionState::Starting) {
            return Err(RoomError::InvalidState(format!(
                "cannot start session in state {}",
                self.state
            )));
        }
        self.timers.cancel(SessionTimer::Countdown);
        self.state = SessionState::Active;
        self.started_at = Some(Instant::now());
        let start_ms = now_millis();
        self.start_time_ms = Some(start_ms);
        self.round = 1;

        if let Err(err) = self.call_engine("initialize", |engine, ctx| engine.initialize(ctx)) {
            error!(room_id = %self.config.room_id, %err, "engine failed to initialize");
            self.pending_finish = None;
            self.finish(reason::ENGINE_FAULT);
            return Ok(());
        }
        self.sync_derived_scores();

        self.timers
            .schedule_once(SessionTimer::Duration, self.config.duration());
        if let Some(interval) = self.engine.tick_interval() {
            let config = TickConfig::every(interval).with_policy(self.engine.tick_policy());
            self.ticks = Some(TickScheduler::new(config));
        }

        info!(
            room_id = %self.config.room_id,
            game_type = self.engine.game_type(),
            players = self.roster.len(),
            "game started"
        );
        let initial_state = self.public_state();
        self.emit(
            EventName::GameStarted,
            json!({
                "startTime": start_ms,
                "duration": self.config.duration_secs,
                "initialState": initial_state,
            }),
        );
        self.apply_pending_finish();
        Ok(())
    }

    /// `active → paused`. Freezes the clock, the ticks and engine timers.
    pub fn pause(&mut self) -> Result<(), RoomError> {
        if self.state != SessionState::Active {
            return Err(RoomError::InvalidState(format!(
                "cannot pause session in state {}",
                self.state
            )));
        }
        self.state = SessionState::Paused;
        self.timers.cancel(SessionTimer::Duration);
        self.timers.freeze();
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.pause();
        }
        self.paused_at = Some(Instant::now());
        let paused_ms = now_millis();
        self.paused_at_ms = Some(paused_ms);

        info!(room_id = %self.config.room_id, "game paused");
        let game_state = self.public_state();
        self.emit(
            EventName::GamePaused,
            json!({ "pausedAt": paused_ms, "gameState": game_state }),
        );
        Ok(())
    }

    /// `paused → active`. The pause does not count against the duration.
    pub fn resume(&mut self) -> Result<(), RoomError> {
        if self.state != SessionState::Paused {
            return Err(RoomError::InvalidState(format!(
                "cannot resume session in state {}",
                self.state
            )));
        }
        let paused_for = self
            .paused_at
            .take()
            .map(|at| at.elapsed())
            .unwrap_or_default();
        self.paused_at_ms = None;
        self.started_at = self.started_at.map(|s| s + paused_for);
        self.start_time_ms = self
            .start_time_ms
            .map(|ms| ms + paused_for.as_millis() as u64);
        self.state = SessionState::Active;
        self.timers.thaw();
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.resume();
        }

        let remaining = self.remaining();
        if remaining.is_zero() {
            self.finish(reason::TIME_UP);
            return Ok(());
        }
        self.timers.schedule_once(SessionTimer::Duration, remaining);

        info!(
            room_id = %self.config.room_id,
            paused_ms = paused_for.as_millis() as u64,
            remaining_secs = remaining.as_secs_f64(),
            "game resumed"
        );
        let game_state = self.public_state();
        self.emit(EventName::GameResumed, json!({ "gameState": game_state }));
        Ok(())
    }

    /// Ends the game. Only the first call has any effect.
    ///
    /// Cancels every timer, broadcasts `gameEnded` with the standings,
    /// then clears the roster and scores. Returns `false` if the session
    /// had already finished.
    pub fn finish(&mut self, reason: &str) -> bool {
        if self.state.is_finished() {
            return false;
        }
        let was = self.state;
        self.state = SessionState::Finished;
        self.finish_reason = Some(reason.to_owned());
        self.pending_finish = None;
        self.timers.cancel_all();
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.stop();
        }

        let played = self.active_elapsed();
        let standings: Vec<Standing> = self.scores.standings(&self.roster);
        let final_state = self.public_state();

        info!(
            room_id = %self.config.room_id,
            reason,
            from = %was,
            played_secs = played.as_secs_f64(),
            "game finished"
        );
        self.emit(
            EventName::GameEnded,
            json!({
                "reason": reason,
                "duration": played.as_secs_f64(),
                "standings": standings,
                "finalState": final_state,
            }),
        );

        self.roster.clear();
        self.scores.clear();
        true
    }

    // -----------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------

    /// Routes one player action to the engine.
    ///
    /// Never fails: rule violations come back as `{valid: false, reason}`,
    /// lifecycle problems and engine faults as `{valid: false, error}`.
    pub fn handle_action(&mut self, player: PlayerId, action: Value) -> ActionResult {
        if self.state != SessionState::Active || !self.roster.contains(player) {
            debug!(room_id = %self.config.room_id, %player, state = %self.state, "action outside active play");
            return ActionResult::failed(NOT_ACTIVE);
        }

        let result = match self.call_engine("process_action", |engine, ctx| {
            engine.process_action(ctx, player, &action)
        }) {
            Ok(result) => result,
            Err(err) => {
                error!(room_id = %self.config.room_id, %player, %err, "engine fault while processing action");
                return ActionResult::failed(ACTION_FAILED);
            }
        };

        if !result.valid {
            debug!(
                room_id = %self.config.room_id,
                %player,
                reason = result.reason.as_deref().unwrap_or(""),
                "action rejected"
            );
            self.apply_pending_finish();
            return result;
        }

        let current = self.scores.get(player).unwrap_or(0);
        let engine = &self.engine;
        match panic::catch_unwind(AssertUnwindSafe(|| engine.calculate_score(player, &result, current))) {
            Ok(score) => self.scores.set(player, score),
            Err(payload) => {
                error!(
                    room_id = %self.config.room_id,
                    %player,
                    panic = %panic_message(payload.as_ref()),
                    "engine panicked while scoring"
                );
            }
        }

        let state = self.public_state();
        self.emit(
            EventName::GameStateUpdate,
            json!({
                "action": action,
                "result": result,
                "scores": self.scores.to_json(),
                "state": state,
            }),
        );
        self.apply_pending_finish();
        result
    }

    // -----------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------

    /// Waits for the next timer or tick. Cancel safe.
    ///
    /// Pends forever when nothing is scheduled.
    pub async fn next_wakeup(&mut self) -> Wakeup {
        let timers = &mut self.timers;
        let ticks = &mut self.ticks;
        tokio::select! {
            key = timers.next_fired() => Wakeup::Timer(key),
            info = async {
                match ticks.as_mut() {
                    Some(ticks) => ticks.wait_for_tick().await,
                    None => std::future::pending().await,
                }
            } => Wakeup::Tick(info),
        }
    }

    pub fn on_wakeup(&mut self, wakeup: Wakeup) {
        match wakeup {
            Wakeup::Timer(timer) => self.on_timer(timer),
            Wakeup::Tick(info) => {
                self.on_tick(info.dt);
                if let Some(ticks) = self.ticks.as_mut() {
                    ticks.tick_done();
                }
            }
        }
    }

    /// Reacts to a fired timer.
    pub fn on_timer(&mut self, timer: SessionTimer) {
        match timer {
            SessionTimer::Countdown => {
                if self.state != SessionState::Starting {
                    self.timers.cancel(SessionTimer::Countdown);
                    return;
                }
                self.countdown = self.countdown.saturating_sub(1);
                if self.countdown > 0 {
                    self.emit(EventName::GameStarting, json!({ "countdown": self.countdown }));
                } else if self.roster.len() < self.min_players {
                    // Someone dropped during the countdown and did not come back.
                    self.timers.cancel(SessionTimer::Countdown);
                    self.state = SessionState::Waiting;
                    info!(
                        room_id = %self.config.room_id,
                        players = self.roster.len(),
                        "countdown ended short of players, waiting again"
                    );
                } else {
                    self.timers.cancel(SessionTimer::Countdown);
                    let _ = self.start();
                }
            }
            SessionTimer::Duration => {
                if self.state == SessionState::Active {
                    self.finish(reason::TIME_UP);
                }
            }
            SessionTimer::Engine(engine_timer) => {
                if self.state != SessionState::Active {
                    return;
                }
                match self.call_engine("on_timer", |engine, ctx| engine.on_timer(ctx, engine_timer)) {
                    Ok(()) => {
                        self.sync_derived_scores();
                        if self.pending_finish.is_none() {
                            self.emit_state_update();
                        }
                        self.apply_pending_finish();
                    }
                    Err(err) => {
                        error!(room_id = %self.config.room_id, ?engine_timer, %err, "engine fault in timer");
                    }
                }
            }
        }
    }

    /// Advances the simulation by one tick.
    ///
    /// After [`MAX_TICK_FAULTS`] faulted ticks in a row the game ends with
    /// `engine_fault`.
    pub fn on_tick(&mut self, dt: Duration) {
        if self.state != SessionState::Active {
            return;
        }
        match self.call_engine("tick", |engine, ctx| engine.tick(ctx, dt)) {
            Ok(()) => {
                self.tick_faults = 0;
                self.sync_derived_scores();
                if self.pending_finish.is_none() {
                    self.emit_state_update();
                }
                self.apply_pending_finish();
            }
            Err(err) => {
                self.tick_faults += 1;
                error!(
                    room_id = %self.config.room_id,
                    %err,
                    consecutive = self.tick_faults,
                    "engine fault in tick"
                );
                if self.tick_faults >= MAX_TICK_FAULTS {
                    self.finish(reason::ENGINE_FAULT);
                }
            }
        }
    }

    /// Time left in the active phase.
    pub fn remaining(&self) -> Duration {
        let total = self.config.duration();
        match (self.started_at, self.paused_at) {
            (None, _) => total,
            (Some(start), Some(paused)) => total.saturating_sub(paused.saturating_duration_since(start)),
            (Some(start), None) => total.saturating_sub(start.elapsed()),
        }
    }

    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            game_id: self.config.game_id.clone(),
            room_id: self.config.room_id,
            game_type: self.engine.game_type().to_owned(),
            state: self.state,
            player_count: self.roster.len(),
            max_players: self.max_players,
            start_time: self.start_time_ms,
            duration: self.config.duration_secs,
            remaining_time: self.remaining().as_secs_f64(),
        }
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Runs one engine call with a fresh context.
    ///
    /// Panics become [`EngineError::Panicked`]. Events and finish requests
    /// made during a failed call are dropped.
    fn call_engine<R>(
        &mut self,
        what: &'static str,
        f: impl FnOnce(&mut E, &mut EngineContext<'_>) -> Result<R, EngineError>,
    ) -> Result<R, EngineError> {
        let players = self.roster.player_ids();
        let elapsed = self.active_elapsed();
        let mut emitted = Vec::new();
        let mut finish = self.pending_finish.take();
        let had_finish = finish.is_some();

        let outcome = {
            let mut ctx = EngineContext {
                players: &players,
                scores: &self.scores,
                rng: &mut self.rng,
                timers: &mut self.timers,
                emitted: &mut emitted,
                finish: &mut finish,
                round: &mut self.round,
                elapsed,
            };
            let engine = &mut self.engine;
            panic::catch_unwind(AssertUnwindSafe(|| f(engine, &mut ctx)))
        };

        let outcome = match outcome {
            Ok(result) => result,
            Err(payload) => Err(EngineError::Panicked(format!(
                "{what}: {}",
                panic_message(payload.as_ref())
            ))),
        };

        match outcome {
            Ok(value) => {
                self.pending_finish = finish;
                for (name, fields) in emitted {
                    self.emit(name, fields);
                }
                Ok(value)
            }
            Err(err) => {
                if had_finish {
                    self.pending_finish = finish;
                }
                Err(err)
            }
        }
    }

    fn apply_pending_finish(&mut self) {
        if let Some(reason) = self.pending_finish.take() {
            self.finish(&reason);
        }
    }

    fn sync_derived_scores(&mut self) {
        let engine = &self.engine;
        let derived = match panic::catch_unwind(AssertUnwindSafe(|| engine.derived_scores())) {
            Ok(derived) => derived,
            Err(payload) => {
                warn!(panic = %panic_message(payload.as_ref()), "engine panicked while deriving scores");
                return;
            }
        };
        for (player, score) in derived {
            if self.scores.contains(player) {
                self.scores.set(player, score);
            }
        }
    }

    fn emit_state_update(&mut self) {
        let state = self.public_state();
        self.emit(
            EventName::GameStateUpdate,
            json!({ "scores": self.scores.to_json(), "state": state }),
        );
    }

    fn public_state(&self) -> Value {
        let engine = &self.engine;
        match panic::catch_unwind(AssertUnwindSafe(|| engine.public_state())) {
            Ok(state) => state,
            Err(payload) => {
                warn!(panic = %panic_message(payload.as_ref()), "engine panicked while rendering state");
                Value::Null
            }
        }
    }

    fn active_elapsed(&self) -> Duration {
        match (self.started_at, self.paused_at) {
            (Some(start), Some(paused)) => paused.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    fn emit(&mut self, name: EventName, fields: Value) {
        self.outbox.push(RoomEvent::new(
            name,
            &self.config.game_id,
            self.config.room_id,
            now_millis(),
            fields,
        ));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
