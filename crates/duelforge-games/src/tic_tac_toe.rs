//! Tic-Tac-Toe: two players, X moves first.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use duelforge_protocol::{ActionResult, EventName, PlayerId};
use duelforge_room::{EngineContext, EngineError, GameEngine, PlayerLimits, SessionConfig};

use crate::util::parse_action;

pub const GAME_TYPE: &str = "tictactoe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

type Board = [[Option<Mark>; 3]; 3];

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum TicTacToeAction {
    Move { row: i64, col: i64 },
}

#[derive(Debug, Default)]
pub struct TicTacToe {
    board: Board,
    /// X first, in join order.
    players: Vec<PlayerId>,
    turn: usize,
    winner: Option<PlayerId>,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(_config: &SessionConfig) -> Result<Self, EngineError> {
        Ok(Self::new())
    }

    pub fn mark_of(&self, player: PlayerId) -> Option<Mark> {
        match self.players.iter().position(|p| *p == player)? {
            0 => Some(Mark::X),
            _ => Some(Mark::O),
        }
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        self.players.get(self.turn).copied()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }
}

impl GameEngine for TicTacToe {
    fn game_type(&self) -> &'static str {
        GAME_TYPE
    }

    fn player_limits(&self) -> PlayerLimits {
        PlayerLimits::exactly(2)
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), EngineError> {
        if ctx.players().len() != 2 {
            return Err(EngineError::Fault(format!(
                "tic-tac-toe needs 2 players, got {}",
                ctx.players().len()
            )));
        }
        self.board = Board::default();
        self.players = ctx.players().to_vec();
        self.turn = 0;
        self.winner = None;
        let state = self.public_state();
        ctx.emit(EventName::NewRound, json!({ "roundNumber": ctx.round(), "state": state }));
        Ok(())
    }

    fn process_action(
        &mut self,
        ctx: &mut EngineContext<'_>,
        player: PlayerId,
        action: &Value,
    ) -> Result<ActionResult, EngineError> {
        let TicTacToeAction::Move { row, col } = match parse_action(action) {
            Ok(action) => action,
            Err(rejected) => return Ok(rejected),
        };
        if self.current_player() != Some(player) {
            return Ok(ActionResult::rejected("Not your turn"));
        }
        if !(0..3).contains(&row) || !(0..3).contains(&col) {
            return Ok(ActionResult::rejected("Invalid move coordinates"));
        }
        let (row, col) = (row as usize, col as usize);
        if self.board[row][col].is_some() {
            return Ok(ActionResult::rejected("Cell already occupied"));
        }

        let mark = if self.turn == 0 { Mark::X } else { Mark::O };
        self.board[row][col] = Some(mark);

        if check_winner(&self.board, mark) {
            self.winner = Some(player);
            ctx.finish(format!("Player {} won with symbol {mark:?}", player.0));
        } else if board_full(&self.board) {
            ctx.finish("It's a draw!");
        } else {
            self.turn = 1 - self.turn;
        }
        Ok(ActionResult::accepted().with("mark", format!("{mark:?}")))
    }

    fn calculate_score(&self, player: PlayerId, _result: &ActionResult, current: i64) -> i64 {
        if self.winner == Some(player) { 1 } else { current }
    }

    fn public_state(&self) -> Value {
        let symbols: serde_json::Map<String, Value> = self
            .players
            .iter()
            .filter_map(|p| Some((p.0.to_string(), json!(self.mark_of(*p)?))))
            .collect();
        json!({
            "board": self.board,
            "currentTurnPlayer": self.current_player(),
            "symbols": symbols,
            "winner": self.winner,
        })
    }
}

fn check_winner(b: &Board, m: Mark) -> bool {
    let m = Some(m);
    (0..3).any(|i| (0..3).all(|j| b[i][j] == m))
        || (0..3).any(|j| (0..3).all(|i| b[i][j] == m))
        || (0..3).all(|i| b[i][i] == m)
        || (0..3).all(|i| b[i][2 - i] == m)
}

fn board_full(b: &Board) -> bool {
    b.iter().all(|row| row.iter().all(Option::is_some))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_detection_all_lines() {
        for row in 0..3 {
            let mut b = Board::default();
            for col in 0..3 {
                b[row][col] = Some(Mark::X);
            }
            assert!(check_winner(&b, Mark::X), "row {row}");
            assert!(!check_winner(&b, Mark::O));
        }
        for col in 0..3 {
            let mut b = Board::default();
            for row in 0..3 {
                b[row][col] = Some(Mark::O);
            }
            assert!(check_winner(&b, Mark::O), "col {col}");
        }
        let mut b = Board::default();
        for i in 0..3 {
            b[i][i] = Some(Mark::X);
        }
        assert!(check_winner(&b, Mark::X), "main diagonal");

        let mut b = Board::default();
        for i in 0..3 {
            b[i][2 - i] = Some(Mark::O);
        }
        assert!(check_winner(&b, Mark::O), "anti-diagonal");
    }

    #[test]
    fn test_board_full() {
        let mut b = [[Some(Mark::X); 3]; 3];
        assert!(board_full(&b));
        b[1][1] = None;
        assert!(!board_full(&b));
    }

    #[test]
    fn test_first_joined_plays_x() {
        let mut game = TicTacToe::new();
        game.players = vec![PlayerId(7), PlayerId(3)];
        assert_eq!(game.mark_of(PlayerId(7)), Some(Mark::X));
        assert_eq!(game.mark_of(PlayerId(3)), Some(Mark::O));
        assert_eq!(game.mark_of(PlayerId(1)), None);
        assert_eq!(game.current_player(), Some(PlayerId(7)));
    }
}
