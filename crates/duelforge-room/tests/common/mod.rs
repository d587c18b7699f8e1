//! A scripted engine shared by the room integration tests.

#![allow(dead_code)]

use std::time::Duration;

use duelforge_protocol::{decode_action, ActionResult, EventName, PlayerId, RoomEvent};
use duelforge_room::{
    EngineContext, EngineError, EngineTimer, GameEngine, PlayerLimits, Session, SessionConfig,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub const FLASH: EngineTimer = EngineTimer(1);

/// Counts increments and finishes when `target` is reached.
#[derive(Debug, Default)]
pub struct CounterEngine {
    pub target: u32,
    pub count: u32,
    pub ticks: u32,
    pub flashes: u32,
    pub tick_every: Option<Duration>,
    pub fail_ticks: bool,
    pub fail_init: bool,
    pub left: Vec<PlayerId>,
    /// Players the engine was told are gone for good.
    pub gone: Vec<PlayerId>,
}

impl CounterEngine {
    pub fn new(target: u32) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn ticking(mut self, every: Duration) -> Self {
        self.tick_every = Some(every);
        self
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum CounterAction {
    Increment,
    Flash,
    Panic,
    Fail,
}

impl GameEngine for CounterEngine {
    fn game_type(&self) -> &'static str {
        "counter"
    }

    fn player_limits(&self) -> PlayerLimits {
        PlayerLimits::range(1, 4)
    }

    fn tick_interval(&self) -> Option<Duration> {
        self.tick_every
    }

    fn initialize(&mut self, _ctx: &mut EngineContext<'_>) -> Result<(), EngineError> {
        if self.fail_init {
            return Err(EngineError::Fault("cannot initialize".into()));
        }
        self.count = 0;
        Ok(())
    }

    fn process_action(
        &mut self,
        ctx: &mut EngineContext<'_>,
        _player: PlayerId,
        action: &Value,
    ) -> Result<ActionResult, EngineError> {
        let Ok(action) = decode_action::<CounterAction>(action) else {
            return Ok(ActionResult::rejected("Unknown action"));
        };
        match action {
            CounterAction::Increment => {
                self.count += 1;
                if self.count >= self.target {
                    ctx.finish("target_reached");
                }
                Ok(ActionResult::accepted().with("count", self.count))
            }
            CounterAction::Flash => {
                ctx.schedule(FLASH, Duration::from_secs(2));
                Ok(ActionResult::accepted())
            }
            CounterAction::Panic => panic!("counter exploded"),
            CounterAction::Fail => Err(EngineError::Fault("nope".into())),
        }
    }

    fn calculate_score(&self, _player: PlayerId, result: &ActionResult, current: i64) -> i64 {
        if result.detail("count").is_some() {
            current + 1
        } else {
            current
        }
    }

    fn public_state(&self) -> Value {
        json!({ "count": self.count, "ticks": self.ticks, "flashes": self.flashes })
    }

    fn tick(&mut self, _ctx: &mut EngineContext<'_>, _dt: Duration) -> Result<(), EngineError> {
        if self.fail_ticks {
            return Err(EngineError::Fault("tick failed".into()));
        }
        self.ticks += 1;
        Ok(())
    }

    fn on_timer(&mut self, ctx: &mut EngineContext<'_>, timer: EngineTimer) -> Result<(), EngineError> {
        if timer == FLASH {
            self.flashes += 1;
            ctx.emit(EventName::RoundEnded, json!({ "flashes": self.flashes }));
        }
        Ok(())
    }

    fn on_player_left(&mut self, _ctx: &mut EngineContext<'_>, player: PlayerId, temporary: bool) {
        self.left.push(player);
        if !temporary {
            self.gone.push(player);
        }
    }
}

pub fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

pub fn increment() -> Value {
    json!({ "type": "increment" })
}

pub fn session(config: SessionConfig, engine: CounterEngine) -> Session<CounterEngine> {
    Session::new(config, engine)
}

/// Waits for the next timer or tick and applies it.
pub async fn step<E: GameEngine>(session: &mut Session<E>) {
    let wakeup = session.next_wakeup().await;
    session.on_wakeup(wakeup);
}

pub fn names(events: &[RoomEvent]) -> Vec<EventName> {
    events.iter().map(|e| e.name).collect()
}

pub fn count(events: &[RoomEvent], name: EventName) -> usize {
    events.iter().filter(|e| e.name == name).count()
}
