//! Scripted bot players.
//!
//! A bot knows nothing about the board. It sends a plausible random action
//! for its game every turn and lets the engine reject the bad ones.

use duelforge_games::{guess_brand, memory, minesweeper, pong, snake, tetris, tic_tac_toe};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::{json, Value};

/// Which actions a bot picks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    GuessBrand,
    Memory { cards: i64 },
    Minesweeper { rows: i64, cols: i64 },
    Pong,
    Snake,
    Tetris,
    TicTacToe,
}

impl Script {
    /// The script for a built-in game type with its default options.
    pub fn for_game(game_type: &str) -> Option<Self> {
        let script = match game_type {
            guess_brand::GAME_TYPE => Self::GuessBrand,
            memory::GAME_TYPE => Self::Memory {
                cards: memory::MemoryOptions::default().pairs as i64 * 2,
            },
            minesweeper::GAME_TYPE => {
                let options = minesweeper::MinesweeperOptions::default();
                Self::Minesweeper {
                    rows: options.rows as i64,
                    cols: options.cols as i64,
                }
            }
            pong::GAME_TYPE => Self::Pong,
            snake::GAME_TYPE => Self::Snake,
            tetris::GAME_TYPE => Self::Tetris,
            tic_tac_toe::GAME_TYPE => Self::TicTacToe,
            _ => return None,
        };
        Some(script)
    }

    /// One random action payload.
    pub fn next_action(&self, rng: &mut StdRng) -> Value {
        match *self {
            Self::GuessBrand => {
                let brand = guess_brand::BRANDS.choose(rng).copied().unwrap_or("Nike");
                json!({ "type": "guess", "guess": brand })
            }
            Self::Memory { cards } => json!({ "type": "flip", "index": rng.random_range(0..cards) }),
            Self::Minesweeper { rows, cols } => {
                let (row, col) = (rng.random_range(0..rows), rng.random_range(0..cols));
                // Mostly reveal, flag now and then.
                let kind = if rng.random_bool(0.1) { "toggleFlag" } else { "revealCell" };
                json!({ "type": kind, "row": row, "col": col })
            }
            Self::Pong => {
                let direction = ["up", "down", "stop"].choose(rng).copied().unwrap_or("stop");
                json!({ "type": "move", "direction": direction })
            }
            Self::Snake => {
                let direction = ["up", "down", "left", "right"].choose(rng).copied().unwrap_or("up");
                json!({ "type": "changeDirection", "direction": direction })
            }
            Self::Tetris => {
                let kind = ["moveLeft", "moveRight", "rotate", "drop", "drop", "hardDrop"]
                    .choose(rng)
                    .copied()
                    .unwrap_or("drop");
                json!({ "type": kind })
            }
            Self::TicTacToe => json!({
                "type": "move",
                "row": rng.random_range(0..3),
                "col": rng.random_range(0..3),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use duelforge_games::BUILTIN_GAME_TYPES;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_every_builtin_game_has_a_script() {
        for game_type in BUILTIN_GAME_TYPES {
            assert!(Script::for_game(game_type).is_some(), "{game_type}");
        }
        assert_eq!(Script::for_game("chess"), None);
    }

    #[test]
    fn test_actions_stay_on_the_board() {
        let mut rng = StdRng::seed_from_u64(3);
        let script = Script::for_game("minesweeper").unwrap();
        for _ in 0..100 {
            let action = script.next_action(&mut rng);
            let row = action["row"].as_i64().unwrap();
            let col = action["col"].as_i64().unwrap();
            assert!((0..9).contains(&row) && (0..9).contains(&col));
        }

        let memory = Script::for_game("memory").unwrap();
        assert_eq!(memory, Script::Memory { cards: 12 });
        for _ in 0..100 {
            let index = memory.next_action(&mut rng)["index"].as_i64().unwrap();
            assert!((0..12).contains(&index));
        }
    }

    #[test]
    fn test_action_type_is_tagged() {
        let mut rng = StdRng::seed_from_u64(9);
        let action = Script::TicTacToe.next_action(&mut rng);
        assert_eq!(action["type"], "move");
        let action = Script::Snake.next_action(&mut rng);
        assert_eq!(action["type"], "changeDirection");
    }
}
