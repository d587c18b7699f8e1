//! One engine type for every built-in game.
//!
//! A registry holds a single engine type, so the built-in games are wrapped
//! in [`AnyEngine`] and selected by game type through the registration
//! table.

use std::time::Duration;

use serde_json::Value;

use duelforge_protocol::{ActionResult, PlayerId};
use duelforge_room::{
    EngineContext, EngineError, EngineTimer, GameEngine, PlayerLimits, SessionRegistry, TickPolicy,
};

use crate::guess_brand::{self, GuessBrand};
use crate::memory::{self, MemoryGame};
use crate::minesweeper::{self, Minesweeper};
use crate::pong::{self, Pong};
use crate::snake::{self, SnakeGame};
use crate::tetris::{self, Tetris};
use crate::tic_tac_toe::{self, TicTacToe};

#[derive(Debug)]
pub enum AnyEngine {
    GuessBrand(GuessBrand),
    Memory(MemoryGame),
    Minesweeper(Minesweeper),
    Pong(Pong),
    Snake(SnakeGame),
    Tetris(Tetris),
    TicTacToe(TicTacToe),
}

macro_rules! dispatch {
    ($self:expr, $engine:ident => $body:expr) => {
        match $self {
            AnyEngine::GuessBrand($engine) => $body,
            AnyEngine::Memory($engine) => $body,
            AnyEngine::Minesweeper($engine) => $body,
            AnyEngine::Pong($engine) => $body,
            AnyEngine::Snake($engine) => $body,
            AnyEngine::Tetris($engine) => $body,
            AnyEngine::TicTacToe($engine) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for AnyEngine {
                fn from(engine: $ty) -> Self {
                    AnyEngine::$variant(engine)
                }
            }
        )*
    };
}

impl_from!(
    GuessBrand(GuessBrand),
    Memory(MemoryGame),
    Minesweeper(Minesweeper),
    Pong(Pong),
    Snake(SnakeGame),
    Tetris(Tetris),
    TicTacToe(TicTacToe),
);

impl GameEngine for AnyEngine {
    fn game_type(&self) -> &'static str {
        dispatch!(self, e => e.game_type())
    }

    fn player_limits(&self) -> PlayerLimits {
        dispatch!(self, e => e.player_limits())
    }

    fn tick_interval(&self) -> Option<Duration> {
        dispatch!(self, e => e.tick_interval())
    }

    fn tick_policy(&self) -> TickPolicy {
        dispatch!(self, e => e.tick_policy())
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), EngineError> {
        dispatch!(self, e => e.initialize(ctx))
    }

    fn process_action(
        &mut self,
        ctx: &mut EngineContext<'_>,
        player: PlayerId,
        action: &Value,
    ) -> Result<ActionResult, EngineError> {
        dispatch!(self, e => e.process_action(ctx, player, action))
    }

    fn calculate_score(&self, player: PlayerId, result: &ActionResult, current: i64) -> i64 {
        dispatch!(self, e => e.calculate_score(player, result, current))
    }

    fn public_state(&self) -> Value {
        dispatch!(self, e => e.public_state())
    }

    fn tick(&mut self, ctx: &mut EngineContext<'_>, dt: Duration) -> Result<(), EngineError> {
        dispatch!(self, e => e.tick(ctx, dt))
    }

    fn on_timer(&mut self, ctx: &mut EngineContext<'_>, timer: EngineTimer) -> Result<(), EngineError> {
        dispatch!(self, e => e.on_timer(ctx, timer))
    }

    fn on_player_left(&mut self, ctx: &mut EngineContext<'_>, player: PlayerId, temporary: bool) {
        dispatch!(self, e => e.on_player_left(ctx, player, temporary))
    }

    fn derived_scores(&self) -> Vec<(PlayerId, i64)> {
        dispatch!(self, e => e.derived_scores())
    }
}

/// Every built-in game type, sorted.
pub const BUILTIN_GAME_TYPES: [&str; 7] = [
    guess_brand::GAME_TYPE,
    memory::GAME_TYPE,
    minesweeper::GAME_TYPE,
    pong::GAME_TYPE,
    snake::GAME_TYPE,
    tetris::GAME_TYPE,
    tic_tac_toe::GAME_TYPE,
];

/// Registers every built-in game under its game type.
pub fn register_builtin(registry: &mut SessionRegistry<AnyEngine>) -> &mut SessionRegistry<AnyEngine> {
    registry
        .register(guess_brand::GAME_TYPE, |c| GuessBrand::from_config(c).map(AnyEngine::from))
        .register(memory::GAME_TYPE, |c| MemoryGame::from_config(c).map(AnyEngine::from))
        .register(minesweeper::GAME_TYPE, |c| Minesweeper::from_config(c).map(AnyEngine::from))
        .register(pong::GAME_TYPE, |c| Pong::from_config(c).map(AnyEngine::from))
        .register(snake::GAME_TYPE, |c| SnakeGame::from_config(c).map(AnyEngine::from))
        .register(tetris::GAME_TYPE, |c| Tetris::from_config(c).map(AnyEngine::from))
        .register(tic_tac_toe::GAME_TYPE, |c| TicTacToe::from_config(c).map(AnyEngine::from))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use duelforge_room::{NullPort, SessionConfig};

    use super::*;

    #[test]
    fn test_builtin_types_registered() {
        let mut registry = SessionRegistry::new(Arc::new(NullPort));
        register_builtin(&mut registry);
        let types = registry.game_types();
        assert_eq!(types, BUILTIN_GAME_TYPES.map(String::from).to_vec());
    }

    #[test]
    fn test_variant_reports_its_game_type() {
        let config = SessionConfig::default();
        let engines: Vec<AnyEngine> = vec![
            GuessBrand::from_config(&config).unwrap().into(),
            MemoryGame::from_config(&config).unwrap().into(),
            Minesweeper::from_config(&config).unwrap().into(),
            Pong::from_config(&config).unwrap().into(),
            SnakeGame::from_config(&config).unwrap().into(),
            Tetris::from_config(&config).unwrap().into(),
            TicTacToe::from_config(&config).unwrap().into(),
        ];
        let types: Vec<&str> = engines.iter().map(GameEngine::game_type).collect();
        assert_eq!(types, BUILTIN_GAME_TYPES);
    }

    #[test]
    fn test_tick_interval_only_for_realtime_games() {
        let config = SessionConfig::default();
        let pong: AnyEngine = Pong::from_config(&config).unwrap().into();
        let ttt: AnyEngine = TicTacToe::new().into();
        assert_eq!(pong.tick_interval(), Some(Duration::from_millis(30)));
        assert_eq!(ttt.tick_interval(), None);
    }
}
