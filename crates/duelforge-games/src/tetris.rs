//! Competitive Tetris: one board per player, garbage on multi-line clears.
//!
//! Pieces fall one row per tick. A piece that cannot move down locks into
//! the board, full rows clear, and clearing more than one row at once
//! pushes garbage rows onto the next opponent's board. The first player to
//! clear `linesToWin` rows wins; a player whose stack reaches the top ends
//! the game.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use duelforge_protocol::{ActionResult, EventName, PlayerId};
use duelforge_room::{EngineContext, EngineError, GameEngine, PlayerLimits, SessionConfig};

use crate::util::parse_action;

pub const GAME_TYPE: &str = "tetris";

/// Cell value used for garbage rows.
pub const GARBAGE: u8 = 8;

const POINTS_PER_LINE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TetrisOptions {
    pub width: usize,
    pub height: usize,
    pub tick_ms: u64,
    pub lines_to_win: u32,
}

impl Default for TetrisOptions {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
            tick_ms: 500,
            lines_to_win: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tetromino {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl Tetromino {
    pub const ALL: [Tetromino; 7] = [Self::I, Self::O, Self::T, Self::S, Self::Z, Self::J, Self::L];

    /// Block offsets `(x, y)` in spawn orientation, y pointing down.
    pub fn blocks(self) -> [(i32, i32); 4] {
        match self {
            Self::I => [(0, 0), (1, 0), (2, 0), (3, 0)],
            Self::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
            Self::T => [(0, 0), (1, 0), (2, 0), (1, 1)],
            Self::S => [(1, 0), (2, 0), (0, 1), (1, 1)],
            Self::Z => [(0, 0), (1, 0), (1, 1), (2, 1)],
            Self::J => [(0, 0), (0, 1), (1, 1), (2, 1)],
            Self::L => [(2, 0), (0, 1), (1, 1), (2, 1)],
        }
    }

    /// Non-zero cell value for locked blocks of this kind.
    pub fn cell(self) -> u8 {
        self as u8 + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Piece {
    pub kind: Tetromino,
    pub blocks: [(i32, i32); 4],
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn new(kind: Tetromino, x: i32, y: i32) -> Self {
        Self {
            kind,
            blocks: kind.blocks(),
            x,
            y,
        }
    }

    fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.blocks.iter().map(|(bx, by)| (self.x + bx, self.y + by))
    }

    /// Quarter turn clockwise, normalised back to the top-left corner.
    fn rotated(&self) -> Self {
        let turned = self.blocks.map(|(x, y)| (-y, x));
        let min_x = turned.iter().map(|b| b.0).min().unwrap_or(0);
        let min_y = turned.iter().map(|b| b.1).min().unwrap_or(0);
        Self {
            blocks: turned.map(|(x, y)| (x - min_x, y - min_y)),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerBoard {
    pub player: PlayerId,
    /// Row 0 is the top. 0 is empty.
    pub rows: Vec<Vec<u8>>,
    pub piece: Option<Piece>,
    pub lines: u32,
    pub score: u32,
    pub topped_out: bool,
}

impl PlayerBoard {
    fn new(player: PlayerId, width: usize, height: usize) -> Self {
        Self {
            player,
            rows: vec![vec![0; width]; height],
            piece: None,
            lines: 0,
            score: 0,
            topped_out: false,
        }
    }

    fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    fn fits(&self, piece: &Piece) -> bool {
        let (width, height) = (self.width() as i32, self.rows.len() as i32);
        piece.cells().all(|(x, y)| {
            (0..width).contains(&x)
                && (0..height).contains(&y)
                && self.rows[y as usize][x as usize] == 0
        })
    }

    /// Merges the piece and clears full rows. Returns the rows cleared.
    fn lock(&mut self, piece: &Piece) -> u32 {
        for (x, y) in piece.cells() {
            if let Some(cell) = self
                .rows
                .get_mut(y as usize)
                .and_then(|row| row.get_mut(x as usize))
            {
                *cell = piece.kind.cell();
            }
        }

        let width = self.width();
        let mut cleared = 0;
        let mut r = self.rows.len();
        while r > 0 {
            if self.rows[r - 1].iter().all(|c| *c != 0) {
                self.rows.remove(r - 1);
                self.rows.insert(0, vec![0; width]);
                cleared += 1;
                // The row shifted into r - 1 is checked on the next pass.
            } else {
                r -= 1;
            }
        }
        self.lines += cleared;
        self.score += cleared * POINTS_PER_LINE;
        cleared
    }

    /// Pushes garbage rows in from the bottom. Blocks shoved off the top
    /// top the board out.
    fn add_garbage(&mut self, count: usize, rng: &mut StdRng) {
        let width = self.width();
        for _ in 0..count {
            let top = self.rows.remove(0);
            if top.iter().any(|c| *c != 0) {
                self.topped_out = true;
            }
            let mut row = vec![GARBAGE; width];
            row[rng.random_range(0..width)] = 0;
            self.rows.push(row);
        }
        // The piece keeps its place unless the stack rose into it.
        if let Some(mut piece) = self.piece.take() {
            if !self.fits(&piece) {
                piece.y -= count as i32;
            }
            if self.fits(&piece) {
                self.piece = Some(piece);
            } else {
                self.topped_out = true;
            }
        }
    }
}

/// What a downward step did to one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fall {
    Moved,
    Locked { cleared: u32 },
    /// The board could not spawn its next piece.
    ToppedOut { cleared: u32 },
    /// The board has no piece in play.
    Idle,
}

impl Fall {
    fn cleared(self) -> u32 {
        match self {
            Self::Locked { cleared } | Self::ToppedOut { cleared } => cleared,
            Self::Moved | Self::Idle => 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum TetrisAction {
    MoveLeft,
    MoveRight,
    Rotate,
    Drop,
    HardDrop,
}

#[derive(Debug)]
pub struct Tetris {
    options: TetrisOptions,
    boards: Vec<PlayerBoard>,
}

impl Tetris {
    pub fn new(options: TetrisOptions) -> Self {
        Self {
            options,
            boards: Vec::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, EngineError> {
        let options: TetrisOptions = config.engine_options()?;
        if options.width < 4 || options.height < 4 {
            return Err(EngineError::InvalidOptions("tetris board must be at least 4x4".into()));
        }
        Ok(Self::new(options))
    }

    pub fn boards(&self) -> &[PlayerBoard] {
        &self.boards
    }

    pub fn board(&self, player: PlayerId) -> Option<&PlayerBoard> {
        self.boards.iter().find(|b| b.player == player)
    }

    pub fn board_mut(&mut self, player: PlayerId) -> Option<&mut PlayerBoard> {
        self.boards.iter_mut().find(|b| b.player == player)
    }

    /// Gives every player an empty board and a first piece.
    pub fn seat(&mut self, players: &[PlayerId], rng: &mut StdRng) {
        let (width, height) = (self.options.width, self.options.height);
        self.boards = players
            .iter()
            .map(|&p| PlayerBoard::new(p, width, height))
            .collect();
        for idx in 0..self.boards.len() {
            self.spawn(idx, rng);
        }
    }

    fn spawn(&mut self, idx: usize, rng: &mut StdRng) -> bool {
        let kind = Tetromino::ALL[rng.random_range(0..Tetromino::ALL.len())];
        let piece = Piece::new(kind, self.options.width as i32 / 2 - 1, 0);
        let board = &mut self.boards[idx];
        if board.fits(&piece) {
            board.piece = Some(piece);
            true
        } else {
            board.piece = None;
            board.topped_out = true;
            false
        }
    }

    fn index_of(&self, player: PlayerId) -> Option<usize> {
        self.boards.iter().position(|b| b.player == player)
    }

    /// Shifts the active piece if the target position is free.
    pub fn shift(&mut self, player: PlayerId, dx: i32) -> bool {
        self.try_move(player, |p| Piece { x: p.x + dx, ..p.clone() })
    }

    pub fn rotate(&mut self, player: PlayerId) -> bool {
        self.try_move(player, Piece::rotated)
    }

    fn try_move(&mut self, player: PlayerId, f: impl FnOnce(&Piece) -> Piece) -> bool {
        let Some(board) = self.board_mut(player) else {
            return false;
        };
        let Some(moved) = board.piece.as_ref().map(f) else {
            return false;
        };
        if board.fits(&moved) {
            board.piece = Some(moved);
            true
        } else {
            false
        }
    }

    /// Moves `player`'s piece one row down, locking it when blocked.
    pub fn soft_drop(&mut self, player: PlayerId, rng: &mut StdRng) -> Fall {
        let Some(idx) = self.index_of(player) else {
            return Fall::Idle;
        };
        let board = &mut self.boards[idx];
        if board.topped_out {
            return Fall::Idle;
        }
        let Some(piece) = board.piece.take() else {
            return Fall::Idle;
        };
        let lower = Piece { y: piece.y + 1, ..piece.clone() };
        if board.fits(&lower) {
            board.piece = Some(lower);
            return Fall::Moved;
        }

        let cleared = board.lock(&piece);
        if cleared > 1 {
            self.send_garbage(idx, cleared as usize - 1, rng);
        }
        if self.spawn(idx, rng) {
            Fall::Locked { cleared }
        } else {
            Fall::ToppedOut { cleared }
        }
    }

    pub fn hard_drop(&mut self, player: PlayerId, rng: &mut StdRng) -> Fall {
        loop {
            match self.soft_drop(player, rng) {
                Fall::Moved => continue,
                other => return other,
            }
        }
    }

    /// Garbage goes to the next board in seat order still in play.
    fn send_garbage(&mut self, from: usize, count: usize, rng: &mut StdRng) {
        let n = self.boards.len();
        let target = (1..n)
            .map(|k| (from + k) % n)
            .find(|&i| !self.boards[i].topped_out);
        if let Some(target) = target {
            self.boards[target].add_garbage(count, rng);
        }
    }

    /// Why the game is over, if it is.
    pub fn outcome(&self) -> Option<String> {
        if let Some(b) = self.boards.iter().find(|b| b.topped_out) {
            return Some(format!("Player {} topped out", b.player.0));
        }
        self.boards
            .iter()
            .find(|b| b.lines >= self.options.lines_to_win)
            .map(|b| format!("Player {} won by clearing {} lines", b.player.0, b.lines))
    }
}

impl GameEngine for Tetris {
    fn game_type(&self) -> &'static str {
        GAME_TYPE
    }

    fn player_limits(&self) -> PlayerLimits {
        PlayerLimits::range(1, 4)
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.options.tick_ms))
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), EngineError> {
        let players = ctx.players().to_vec();
        self.seat(&players, ctx.rng());
        ctx.set_round(1);
        let state = self.public_state();
        ctx.emit(
            EventName::NewRound,
            json!({ "roundNumber": ctx.round(), "initialState": state }),
        );
        if let Some(reason) = self.outcome() {
            ctx.finish(reason);
        }
        Ok(())
    }

    fn process_action(
        &mut self,
        ctx: &mut EngineContext<'_>,
        player: PlayerId,
        action: &Value,
    ) -> Result<ActionResult, EngineError> {
        let action: TetrisAction = match parse_action(action) {
            Ok(action) => action,
            Err(rejected) => return Ok(rejected),
        };
        match self.board(player) {
            None => return Ok(ActionResult::rejected("No board for this player")),
            Some(b) if b.topped_out || b.piece.is_none() => {
                return Ok(ActionResult::rejected("No active piece"));
            }
            Some(_) => {}
        }

        let result = match action {
            TetrisAction::MoveLeft => ActionResult::accepted().with("moved", self.shift(player, -1)),
            TetrisAction::MoveRight => ActionResult::accepted().with("moved", self.shift(player, 1)),
            TetrisAction::Rotate => ActionResult::accepted().with("moved", self.rotate(player)),
            TetrisAction::Drop => {
                let drop = self.soft_drop(player, ctx.rng());
                ActionResult::accepted().with("linesCleared", drop.cleared())
            }
            TetrisAction::HardDrop => {
                let drop = self.hard_drop(player, ctx.rng());
                ActionResult::accepted().with("linesCleared", drop.cleared())
            }
        };
        if let Some(reason) = self.outcome() {
            ctx.finish(reason);
        }
        Ok(result)
    }

    fn calculate_score(&self, player: PlayerId, _result: &ActionResult, current: i64) -> i64 {
        self.board(player).map_or(current, |b| i64::from(b.score))
    }

    fn public_state(&self) -> Value {
        let boards: serde_json::Map<String, Value> = self
            .boards
            .iter()
            .map(|b| {
                (
                    b.player.0.to_string(),
                    json!({
                        "board": b.rows,
                        "activePiece": b.piece,
                        "lines": b.lines,
                        "score": b.score,
                        "toppedOut": b.topped_out,
                    }),
                )
            })
            .collect();
        json!({
            "boards": boards,
            "width": self.options.width,
            "height": self.options.height,
            "linesToWin": self.options.lines_to_win,
        })
    }

    fn tick(&mut self, ctx: &mut EngineContext<'_>, _dt: Duration) -> Result<(), EngineError> {
        let players: Vec<PlayerId> = self.boards.iter().map(|b| b.player).collect();
        for player in players {
            self.soft_drop(player, ctx.rng());
            if let Some(reason) = self.outcome() {
                ctx.finish(reason);
                break;
            }
        }
        Ok(())
    }

    fn on_player_left(&mut self, _ctx: &mut EngineContext<'_>, player: PlayerId, temporary: bool) {
        if !temporary {
            self.boards.retain(|b| b.player != player);
        }
    }

    fn derived_scores(&self) -> Vec<(PlayerId, i64)> {
        self.boards
            .iter()
            .map(|b| (b.player, i64::from(b.score)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    const P1: PlayerId = PlayerId(1);
    const P2: PlayerId = PlayerId(2);

    fn seated(players: &[PlayerId]) -> (Tetris, StdRng) {
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = Tetris::new(TetrisOptions::default());
        game.seat(players, &mut rng);
        (game, rng)
    }

    /// Fills `row` except columns `gap`.
    fn fill_row(board: &mut PlayerBoard, row: usize, gap: std::ops::Range<usize>) {
        for (c, cell) in board.rows[row].iter_mut().enumerate() {
            *cell = if gap.contains(&c) { 0 } else { GARBAGE };
        }
    }

    #[test]
    fn test_spawn_position() {
        let (game, _) = seated(&[P1]);
        let piece = game.board(P1).unwrap().piece.as_ref().unwrap();
        assert_eq!((piece.x, piece.y), (4, 0));
    }

    #[test]
    fn test_bottom_row_clear() {
        let (mut game, mut rng) = seated(&[P1]);
        let board = game.board_mut(P1).unwrap();
        fill_row(board, 19, 2..6);
        board.piece = Some(Piece::new(Tetromino::I, 2, 19));

        assert_eq!(game.soft_drop(P1, &mut rng), Fall::Locked { cleared: 1 });
        let board = game.board(P1).unwrap();
        assert!(board.rows[0].iter().all(|c| *c == 0));
        assert!(board.rows[19].iter().all(|c| *c == 0));
        assert_eq!(board.rows.len(), 20);
        assert_eq!((board.lines, board.score), (1, 100));
    }

    #[test]
    fn test_adjacent_full_rows_both_clear() {
        let (mut game, mut rng) = seated(&[P1, P2]);
        let board = game.board_mut(P1).unwrap();
        fill_row(board, 18, 0..2);
        fill_row(board, 19, 0..2);
        board.rows[17][5] = GARBAGE;
        board.piece = Some(Piece::new(Tetromino::O, 0, 18));

        assert_eq!(game.soft_drop(P1, &mut rng), Fall::Locked { cleared: 2 });
        let board = game.board(P1).unwrap();
        assert_eq!(board.rows[19][5], GARBAGE);
        assert_eq!(board.rows[19].iter().filter(|c| **c != 0).count(), 1);
        assert_eq!(board.score, 200);

        // Two rows cleared sends one garbage row with a single gap.
        let opponent = game.board(P2).unwrap();
        assert_eq!(opponent.rows[19].iter().filter(|c| **c == GARBAGE).count(), 9);
        assert!(opponent.rows[18].iter().all(|c| *c == 0));
    }

    #[test]
    fn test_walls_block_shift() {
        let (mut game, _) = seated(&[P1]);
        game.board_mut(P1).unwrap().piece = Some(Piece::new(Tetromino::O, 0, 5));
        assert!(!game.shift(P1, -1));
        assert!(game.shift(P1, 1));
        assert_eq!(game.board(P1).unwrap().piece.as_ref().unwrap().x, 1);
    }

    #[test]
    fn test_rotation_turns_i_vertical() {
        let (mut game, _) = seated(&[P1]);
        game.board_mut(P1).unwrap().piece = Some(Piece::new(Tetromino::I, 3, 5));
        assert!(game.rotate(P1));
        let piece = game.board(P1).unwrap().piece.clone().unwrap();
        assert_eq!(piece.blocks, [(0, 0), (0, 1), (0, 2), (0, 3)]);
    }

    #[test]
    fn test_blocked_spawn_tops_out() {
        let (mut game, mut rng) = seated(&[P1]);
        let board = game.board_mut(P1).unwrap();
        for row in 0..2 {
            fill_row(board, row, 0..1);
        }
        board.piece = Some(Piece::new(Tetromino::O, 0, 18));

        assert_eq!(game.hard_drop(P1, &mut rng), Fall::ToppedOut { cleared: 0 });
        assert_eq!(game.outcome().as_deref(), Some("Player 1 topped out"));
    }

    #[test]
    fn test_lines_to_win() {
        let (mut game, _) = seated(&[P1, P2]);
        game.board_mut(P2).unwrap().lines = 5;
        assert_eq!(game.outcome().as_deref(), Some("Player 2 won by clearing 5 lines"));
    }
}
