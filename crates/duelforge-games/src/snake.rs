//! Snake duel on a wrapping grid.
//!
//! Each tick every head advances one cell in its heading, wrapping around
//! the edges. The first snake whose head lands on the fruit grows by one
//! segment and the fruit moves to a free cell. The first snake to eat
//! `target` fruits wins.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use duelforge_protocol::{ActionResult, EventName, PlayerId};
use duelforge_room::{EngineContext, EngineError, GameEngine, PlayerLimits, SessionConfig};

use crate::util::{parse_action, wrap};

pub const GAME_TYPE: &str = "snake";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnakeOptions {
    pub width: usize,
    pub height: usize,
    pub tick_ms: u64,
    /// Fruits needed to win.
    pub target: usize,
}

impl Default for SnakeOptions {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            tick_ms: 200,
            target: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    fn delta(self) -> (i64, i64) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snake {
    pub player: PlayerId,
    /// Head first.
    pub body: Vec<Cell>,
    pub direction: Direction,
}

impl Snake {
    pub fn head(&self) -> Cell {
        self.body[0]
    }

    /// Fruits eaten.
    pub fn points(&self) -> usize {
        self.body.len().saturating_sub(1)
    }

    fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum SnakeAction {
    ChangeDirection { direction: Direction },
}

#[derive(Debug)]
pub struct SnakeGame {
    options: SnakeOptions,
    snakes: Vec<Snake>,
    fruit: Option<Cell>,
}

impl SnakeGame {
    pub fn new(options: SnakeOptions) -> Self {
        Self {
            options,
            snakes: Vec::new(),
            fruit: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, EngineError> {
        let options: SnakeOptions = config.engine_options()?;
        if options.width < 2 || options.height < 2 {
            return Err(EngineError::InvalidOptions("snake grid must be at least 2x2".into()));
        }
        Ok(Self::new(options))
    }

    pub fn snakes(&self) -> &[Snake] {
        &self.snakes
    }

    pub fn snake_mut(&mut self, player: PlayerId) -> Option<&mut Snake> {
        self.snakes.iter_mut().find(|s| s.player == player)
    }

    pub fn fruit(&self) -> Option<Cell> {
        self.fruit
    }

    pub fn set_fruit(&mut self, fruit: Cell) {
        self.fruit = Some(fruit);
    }

    /// One-segment snakes heading up, spread evenly across the middle row.
    pub fn spawn(&mut self, players: &[PlayerId]) {
        let (width, height) = (self.options.width, self.options.height);
        let slots = players.len() + 1;
        self.snakes = players
            .iter()
            .enumerate()
            .map(|(i, &player)| Snake {
                player,
                body: vec![Cell {
                    x: width * (i + 1) / slots,
                    y: height / 2,
                }],
                direction: Direction::Up,
            })
            .collect();
    }

    /// Moves the fruit to a random cell no snake occupies. With no free
    /// cell left the fruit disappears.
    pub fn place_fruit(&mut self, rng: &mut StdRng) {
        let (width, height) = (self.options.width, self.options.height);
        let free: Vec<Cell> = (0..height)
            .flat_map(|y| (0..width).map(move |x| Cell { x, y }))
            .filter(|cell| !self.snakes.iter().any(|s| s.occupies(*cell)))
            .collect();
        self.fruit = free.choose(rng).copied();
    }

    /// Advances every snake one cell. Returns the first snake to reach
    /// the target.
    pub fn step(&mut self, rng: &mut StdRng) -> Option<PlayerId> {
        let (width, height) = (self.options.width, self.options.height);
        for snake in &mut self.snakes {
            let (dx, dy) = snake.direction.delta();
            let head = snake.head();
            let next = Cell {
                x: wrap(head.x as i64 + dx, width),
                y: wrap(head.y as i64 + dy, height),
            };
            snake.body.insert(0, next);
            snake.body.pop();
        }

        if let Some(fruit) = self.fruit {
            if let Some(eater) = self.snakes.iter_mut().find(|s| s.head() == fruit) {
                let tail = eater.body[eater.body.len() - 1];
                eater.body.push(tail);
                self.place_fruit(rng);
            }
        }

        let target = self.options.target;
        self.snakes
            .iter()
            .find(|s| s.points() >= target)
            .map(|s| s.player)
    }
}

impl GameEngine for SnakeGame {
    fn game_type(&self) -> &'static str {
        GAME_TYPE
    }

    fn player_limits(&self) -> PlayerLimits {
        PlayerLimits::exactly(2)
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.options.tick_ms))
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), EngineError> {
        let players = ctx.players().to_vec();
        self.spawn(&players);
        self.place_fruit(ctx.rng());
        let state = self.public_state();
        ctx.emit(EventName::NewRound, json!({ "initialState": state }));
        Ok(())
    }

    fn process_action(
        &mut self,
        _ctx: &mut EngineContext<'_>,
        player: PlayerId,
        action: &Value,
    ) -> Result<ActionResult, EngineError> {
        let Some(snake) = self.snake_mut(player) else {
            return Ok(ActionResult::rejected("No snake for this player"));
        };
        let SnakeAction::ChangeDirection { direction } = match parse_action(action) {
            Ok(action) => action,
            Err(rejected) => return Ok(rejected),
        };
        if direction == snake.direction.opposite() {
            return Ok(ActionResult::rejected("Cannot reverse direction"));
        }
        snake.direction = direction;
        Ok(ActionResult::accepted())
    }

    fn calculate_score(&self, player: PlayerId, _result: &ActionResult, current: i64) -> i64 {
        self.snakes
            .iter()
            .find(|s| s.player == player)
            .map_or(current, |s| s.points() as i64)
    }

    fn public_state(&self) -> Value {
        let snakes: serde_json::Map<String, Value> = self
            .snakes
            .iter()
            .map(|s| (s.player.0.to_string(), json!({ "body": s.body, "direction": s.direction })))
            .collect();
        json!({
            "snakes": snakes,
            "fruit": self.fruit,
            "gridWidth": self.options.width,
            "gridHeight": self.options.height,
        })
    }

    fn tick(&mut self, ctx: &mut EngineContext<'_>, _dt: Duration) -> Result<(), EngineError> {
        if let Some(winner) = self.step(ctx.rng()) {
            ctx.finish(format!(
                "Player {} wins by reaching {} points!",
                winner.0, self.options.target
            ));
        }
        Ok(())
    }

    fn derived_scores(&self) -> Vec<(PlayerId, i64)> {
        self.snakes
            .iter()
            .map(|s| (s.player, s.points() as i64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn game() -> (SnakeGame, StdRng) {
        let mut game = SnakeGame::new(SnakeOptions::default());
        game.spawn(&[PlayerId(1), PlayerId(2)]);
        (game, StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_spawn_spreads_snakes() {
        let (game, _) = game();
        let heads: Vec<_> = game.snakes().iter().map(Snake::head).collect();
        assert_eq!(heads, vec![Cell { x: 6, y: 10 }, Cell { x: 13, y: 10 }]);
    }

    #[test]
    fn test_head_wraps_around_edges() {
        let (mut game, mut rng) = game();
        game.set_fruit(Cell { x: 19, y: 19 });
        {
            let snake = game.snake_mut(PlayerId(1)).unwrap();
            snake.body = vec![Cell { x: 0, y: 0 }];
            snake.direction = Direction::Left;
        }
        game.snake_mut(PlayerId(2)).unwrap().body = vec![Cell { x: 5, y: 0 }];

        game.step(&mut rng);
        assert_eq!(game.snakes()[0].head(), Cell { x: 19, y: 0 });
        assert_eq!(game.snakes()[1].head(), Cell { x: 5, y: 19 });
    }

    #[test]
    fn test_eating_grows_by_tail_and_moves_fruit() {
        let (mut game, mut rng) = game();
        let head = game.snakes()[0].head();
        let fruit = Cell { x: head.x, y: head.y - 1 };
        game.set_fruit(fruit);

        game.step(&mut rng);
        let snake = &game.snakes()[0];
        assert_eq!(snake.body, vec![fruit, fruit]);
        assert_eq!(snake.points(), 1);
        let moved = game.fruit().unwrap();
        assert!(game.snakes().iter().all(|s| !s.body.contains(&moved)));
    }

    #[test]
    fn test_reaching_target_wins() {
        let (mut game, mut rng) = game();
        game.set_fruit(Cell { x: 0, y: 0 });
        let snake = game.snake_mut(PlayerId(2)).unwrap();
        snake.body = vec![Cell { x: 13, y: 10 }; 6];
        assert_eq!(game.step(&mut rng), Some(PlayerId(2)));
    }

    #[test]
    fn test_fruit_never_on_a_snake() {
        let (mut game, mut rng) = game();
        for _ in 0..50 {
            game.place_fruit(&mut rng);
            let fruit = game.fruit().unwrap();
            assert!(game.snakes().iter().all(|s| !s.body.contains(&fruit)));
        }
    }

    #[test]
    fn test_opposites() {
        for d in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            assert_ne!(d, d.opposite());
            assert_eq!(d, d.opposite().opposite());
        }
    }
}
