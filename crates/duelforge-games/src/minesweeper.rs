//! Turn-based two-player Minesweeper.
//!
//! Players alternate revealing cells. A zero cell opens its whole zero
//! region plus the numbered border around it. Revealing a mine ends the
//! game at once and the other player wins; revealing the last safe cell
//! ends it too. A player's score is the number of safe cells they opened.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use duelforge_protocol::{ActionResult, EventName, PlayerId};
use duelforge_room::{EngineContext, EngineError, GameEngine, PlayerLimits, SessionConfig};

use crate::util::{flood_fill, neighbors8, parse_action, Flood, Grid};

pub const GAME_TYPE: &str = "minesweeper";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinesweeperOptions {
    pub rows: usize,
    pub cols: usize,
    pub mines: usize,
    /// Fixed `[row, col]` mine layout. Overrides `mines` when set.
    pub mine_positions: Option<Vec<[usize; 2]>>,
}

impl Default for MinesweeperOptions {
    fn default() -> Self {
        Self {
            rows: 9,
            cols: 9,
            mines: 10,
            mine_positions: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MineCell {
    pub mine: bool,
    pub adjacent: u8,
    pub revealed: bool,
    pub flagged: bool,
    pub revealed_by: Option<PlayerId>,
}

/// What a reveal did.
#[derive(Debug, Clone, PartialEq)]
pub enum Reveal {
    /// Safe cells opened, in order.
    Safe(Vec<(usize, usize)>),
    Mine,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum MinesweeperAction {
    RevealCell { row: i64, col: i64 },
    ToggleFlag { row: i64, col: i64 },
}

#[derive(Debug)]
pub struct Minesweeper {
    options: MinesweeperOptions,
    board: Grid<MineCell>,
    mine_count: usize,
    players: Vec<PlayerId>,
    turn: usize,
    /// Safe cells opened per player, in seat order.
    opened: Vec<(PlayerId, usize)>,
    exploded_by: Option<PlayerId>,
}

impl Minesweeper {
    pub fn new(options: MinesweeperOptions) -> Self {
        let board = Grid::new(options.rows, options.cols, MineCell::default());
        Self {
            options,
            board,
            mine_count: 0,
            players: Vec::new(),
            turn: 0,
            opened: Vec::new(),
            exploded_by: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, EngineError> {
        let options: MinesweeperOptions = config.engine_options()?;
        let cells = options.rows * options.cols;
        if cells == 0 {
            return Err(EngineError::InvalidOptions("minesweeper board is empty".into()));
        }
        match &options.mine_positions {
            Some(positions) => {
                if let Some([r, c]) = positions
                    .iter()
                    .find(|[r, c]| *r >= options.rows || *c >= options.cols)
                {
                    return Err(EngineError::InvalidOptions(format!(
                        "mine position ({r}, {c}) is off the board"
                    )));
                }
            }
            None if options.mines >= cells => {
                return Err(EngineError::InvalidOptions(format!(
                    "{} mines do not fit a {}x{} board with a safe cell left",
                    options.mines, options.rows, options.cols
                )));
            }
            None => {}
        }
        Ok(Self::new(options))
    }

    /// Lays the mines and computes the adjacency counts.
    pub fn generate(&mut self, rng: &mut StdRng) {
        let (rows, cols) = (self.options.rows, self.options.cols);
        let mut board = Grid::new(rows, cols, MineCell::default());

        let mines: Vec<(usize, usize)> = match &self.options.mine_positions {
            Some(positions) => positions.iter().map(|[r, c]| (*r, *c)).collect(),
            None => rand::seq::index::sample(rng, rows * cols, self.options.mines)
                .iter()
                .map(|i| (i / cols, i % cols))
                .collect(),
        };
        for &(r, c) in &mines {
            if let Some(cell) = board.get_mut(r, c) {
                cell.mine = true;
            }
        }
        for r in 0..rows {
            for c in 0..cols {
                let adjacent = neighbors8(rows, cols, r, c)
                    .filter(|&(nr, nc)| board.get(nr, nc).is_some_and(|n| n.mine))
                    .count() as u8;
                if let Some(cell) = board.get_mut(r, c) {
                    cell.adjacent = adjacent;
                }
            }
        }
        self.mine_count = board.iter().filter(|(_, cell)| cell.mine).count();
        self.board = board;
    }

    pub fn seat(&mut self, players: &[PlayerId]) {
        self.players = players.to_vec();
        self.opened = players.iter().map(|p| (*p, 0)).collect();
        self.turn = 0;
        self.exploded_by = None;
    }

    pub fn board(&self) -> &Grid<MineCell> {
        &self.board
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        self.players.get(self.turn).copied()
    }

    pub fn exploded_by(&self) -> Option<PlayerId> {
        self.exploded_by
    }

    pub fn opened_by(&self, player: PlayerId) -> usize {
        self.opened
            .iter()
            .find(|(p, _)| *p == player)
            .map_or(0, |(_, n)| *n)
    }

    pub fn safe_cells(&self) -> usize {
        self.board.len() - self.mine_count
    }

    pub fn all_safe_revealed(&self) -> bool {
        self.board
            .iter()
            .all(|(_, cell)| cell.mine || cell.revealed)
    }

    /// Opens `(row, col)` for `player`. The caller has already checked
    /// that the cell is on the board, hidden and unflagged.
    pub fn reveal(&mut self, player: PlayerId, row: usize, col: usize) -> Reveal {
        let (rows, cols) = (self.board.rows(), self.board.cols());
        if self.board.get(row, col).is_some_and(|c| c.mine) {
            if let Some(cell) = self.board.get_mut(row, col) {
                cell.revealed = true;
                cell.revealed_by = Some(player);
            }
            self.exploded_by = Some(player);
            if let Some(entry) = self.opened.iter_mut().find(|(p, _)| *p == player) {
                entry.1 = 0;
            }
            return Reveal::Mine;
        }

        let board = &self.board;
        let opened = flood_fill(rows, cols, (row, col), |r, c| match board.get(r, c) {
            Some(cell) if cell.mine || cell.revealed || cell.flagged => Flood::Skip,
            Some(cell) if cell.adjacent == 0 => Flood::Spread,
            Some(_) => Flood::Take,
            None => Flood::Skip,
        });
        for &(r, c) in &opened {
            if let Some(cell) = self.board.get_mut(r, c) {
                cell.revealed = true;
                cell.revealed_by = Some(player);
            }
        }
        match self.opened.iter_mut().find(|(p, _)| *p == player) {
            Some(entry) => entry.1 += opened.len(),
            None => self.opened.push((player, opened.len())),
        }
        Reveal::Safe(opened)
    }

    fn other_player(&self, player: PlayerId) -> Option<PlayerId> {
        self.players.iter().copied().find(|p| *p != player)
    }

    fn checked_cell(&self, row: i64, col: i64) -> Result<(usize, usize), ActionResult> {
        if self.board.contains(row, col) {
            Ok((row as usize, col as usize))
        } else {
            Err(ActionResult::rejected("Invalid cell"))
        }
    }
}

impl GameEngine for Minesweeper {
    fn game_type(&self) -> &'static str {
        GAME_TYPE
    }

    fn player_limits(&self) -> PlayerLimits {
        PlayerLimits::exactly(2)
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), EngineError> {
        let players = ctx.players().to_vec();
        self.seat(&players);
        self.generate(ctx.rng());
        let state = self.public_state();
        ctx.emit(
            EventName::NewRound,
            json!({
                "gridSize": { "rows": self.options.rows, "cols": self.options.cols },
                "minesCount": self.mine_count,
                "initialState": state,
            }),
        );
        Ok(())
    }

    fn process_action(
        &mut self,
        ctx: &mut EngineContext<'_>,
        player: PlayerId,
        action: &Value,
    ) -> Result<ActionResult, EngineError> {
        let action: MinesweeperAction = match parse_action(action) {
            Ok(action) => action,
            Err(rejected) => return Ok(rejected),
        };
        if self.current_player() != Some(player) {
            return Ok(ActionResult::rejected("Not your turn"));
        }

        match action {
            MinesweeperAction::ToggleFlag { row, col } => {
                let (row, col) = match self.checked_cell(row, col) {
                    Ok(at) => at,
                    Err(rejected) => return Ok(rejected),
                };
                let Some(cell) = self.board.get_mut(row, col) else {
                    return Ok(ActionResult::rejected("Invalid cell"));
                };
                if cell.revealed {
                    return Ok(ActionResult::rejected("Cannot flag a revealed cell"));
                }
                cell.flagged = !cell.flagged;
                Ok(ActionResult::accepted()
                    .with("flagged", cell.flagged)
                    .with("row", row)
                    .with("col", col))
            }
            MinesweeperAction::RevealCell { row, col } => {
                let (row, col) = match self.checked_cell(row, col) {
                    Ok(at) => at,
                    Err(rejected) => return Ok(rejected),
                };
                match self.board.get(row, col) {
                    Some(cell) if cell.revealed => {
                        return Ok(ActionResult::rejected("Cell already revealed"));
                    }
                    Some(cell) if cell.flagged => {
                        return Ok(ActionResult::rejected("Cell is flagged"));
                    }
                    _ => {}
                }

                match self.reveal(player, row, col) {
                    Reveal::Mine => {
                        let winner = self
                            .other_player(player)
                            .map_or_else(|| "Nobody".to_owned(), |p| p.0.to_string());
                        ctx.finish(format!("Player {} hit a mine! {winner} wins!", player.0));
                        Ok(ActionResult::accepted()
                            .with("exploded", true)
                            .with("row", row)
                            .with("col", col))
                    }
                    Reveal::Safe(opened) => {
                        if self.all_safe_revealed() {
                            ctx.finish("All safe cells revealed");
                        } else if !self.players.is_empty() {
                            self.turn = (self.turn + 1) % self.players.len();
                        }
                        let cells: Vec<Value> = opened
                            .iter()
                            .map(|&(r, c)| json!([r, c]))
                            .collect();
                        Ok(ActionResult::accepted()
                            .with("exploded", false)
                            .with("revealedCells", cells))
                    }
                }
            }
        }
    }

    fn calculate_score(&self, player: PlayerId, _result: &ActionResult, _current: i64) -> i64 {
        self.opened_by(player) as i64
    }

    fn public_state(&self) -> Value {
        let cells = self.board.map(|cell| {
            if cell.revealed {
                json!({
                    "mine": cell.mine,
                    "adjacentMines": cell.adjacent,
                    "revealedBy": cell.revealed_by,
                })
            } else if cell.flagged {
                json!({ "flagged": true })
            } else {
                Value::Null
            }
        });
        json!({
            "revealedCells": cells,
            "currentTurn": self.current_player(),
            "rows": self.options.rows,
            "cols": self.options.cols,
            "mines": self.mine_count,
            "explodedBy": self.exploded_by,
        })
    }

    fn derived_scores(&self) -> Vec<(PlayerId, i64)> {
        self.opened.iter().map(|(p, n)| (*p, *n as i64)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, VecDeque};

    use rand::SeedableRng;

    use super::*;

    fn fixed(rows: usize, cols: usize, mines: &[[usize; 2]]) -> Minesweeper {
        let mut game = Minesweeper::new(MinesweeperOptions {
            rows,
            cols,
            mines: mines.len(),
            mine_positions: Some(mines.to_vec()),
        });
        game.generate(&mut StdRng::seed_from_u64(0));
        game.seat(&[PlayerId(1), PlayerId(2)]);
        game
    }

    /// The zero region around `start` plus its numbered border, computed
    /// with a plain breadth-first search.
    fn expected_region(game: &Minesweeper, start: (usize, usize)) -> BTreeSet<(usize, usize)> {
        let board = game.board();
        let (rows, cols) = (board.rows(), board.cols());
        let mut out = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some((r, c)) = queue.pop_front() {
            if board.get(r, c).unwrap().adjacent != 0 {
                continue;
            }
            for n in neighbors8(rows, cols, r, c) {
                if !board.get(n.0, n.1).unwrap().mine && out.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        out
    }

    #[test]
    fn test_adjacency_counts() {
        let game = fixed(3, 3, &[[0, 0], [2, 2]]);
        let adj: Vec<Vec<u8>> = game.board().map(|c| c.adjacent).to_rows();
        assert_eq!(adj, vec![vec![0, 1, 0], vec![1, 2, 1], vec![0, 1, 0]]);
    }

    #[test]
    fn test_flood_fill_reveals_zero_region_and_border() {
        let mut game = fixed(9, 9, &[[0, 4], [1, 4], [4, 4], [4, 5], [8, 0], [6, 7]]);
        let start = (2, 1);
        assert_eq!(game.board().get(2, 1).unwrap().adjacent, 0);

        let Reveal::Safe(opened) = game.reveal(PlayerId(1), start.0, start.1) else {
            panic!("revealed a mine");
        };
        let opened: BTreeSet<_> = opened.into_iter().collect();
        assert_eq!(opened, expected_region(&game, start));
        assert!(opened.iter().all(|&(r, c)| !game.board().get(r, c).unwrap().mine));
        assert_eq!(game.opened_by(PlayerId(1)), opened.len());
    }

    #[test]
    fn test_numbered_cell_reveals_only_itself() {
        let mut game = fixed(3, 3, &[[0, 0]]);
        assert_eq!(game.reveal(PlayerId(1), 1, 1), Reveal::Safe(vec![(1, 1)]));
    }

    #[test]
    fn test_flood_skips_flagged_cells() {
        let mut game = fixed(3, 3, &[[2, 2]]);
        game.board.get_mut(0, 2).unwrap().flagged = true;
        let Reveal::Safe(opened) = game.reveal(PlayerId(1), 0, 0) else {
            panic!("revealed a mine");
        };
        assert!(!opened.contains(&(0, 2)));
        assert_eq!(opened.len(), 7);
    }

    #[test]
    fn test_mine_zeroes_revealer() {
        let mut game = fixed(3, 3, &[[2, 2]]);
        game.reveal(PlayerId(1), 1, 1);
        assert_eq!(game.opened_by(PlayerId(1)), 1);
        assert_eq!(game.reveal(PlayerId(1), 2, 2), Reveal::Mine);
        assert_eq!(game.opened_by(PlayerId(1)), 0);
        assert_eq!(game.exploded_by(), Some(PlayerId(1)));
    }

    #[test]
    fn test_random_layout_has_requested_mines() {
        let mut game = Minesweeper::new(MinesweeperOptions::default());
        game.generate(&mut StdRng::seed_from_u64(5));
        assert_eq!(game.board().iter().filter(|(_, c)| c.mine).count(), 10);
        assert_eq!(game.safe_cells(), 71);
    }

    #[test]
    fn test_options_validated() {
        let too_many = SessionConfig::default()
            .with_option("rows", 2)
            .with_option("cols", 2)
            .with_option("mines", 4);
        assert!(Minesweeper::from_config(&too_many).is_err());

        let off_board = SessionConfig::default().with_option("minePositions", json!([[9, 0]]));
        assert!(Minesweeper::from_config(&off_board).is_err());
    }
}
