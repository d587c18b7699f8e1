//! The built-in Duelforge games.
//!
//! Every game implements [`GameEngine`](duelforge_room::GameEngine) and
//! reads its options from the session config. [`AnyEngine`] wraps them
//! all so one registry can host every game type:
//!
//! ```no_run
//! use std::sync::Arc;
//! use duelforge_games::{register_builtin, AnyEngine};
//! use duelforge_room::{RoomFanout, SessionRegistry};
//!
//! let mut registry = SessionRegistry::<AnyEngine>::new(Arc::new(RoomFanout::new()));
//! register_builtin(&mut registry);
//! ```
//!
//! Game types: `guessbrand`, `memory`, `minesweeper`, `pong`, `snake`,
//! `tetris`, `tictactoe`.

pub mod any_engine;
pub mod guess_brand;
pub mod memory;
pub mod minesweeper;
pub mod pong;
pub mod snake;
pub mod tetris;
pub mod tic_tac_toe;
pub mod util;

pub use any_engine::{register_builtin, AnyEngine, BUILTIN_GAME_TYPES};
pub use guess_brand::{GuessBrand, GuessBrandOptions};
pub use memory::{MemoryGame, MemoryOptions};
pub use minesweeper::{Minesweeper, MinesweeperOptions};
pub use pong::{Pong, PongOptions};
pub use snake::{SnakeGame, SnakeOptions};
pub use tetris::{Tetris, TetrisOptions};
pub use tic_tac_toe::TicTacToe;
