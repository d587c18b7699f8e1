//! Pong: two paddles, one ball, first to `winningScore`.
//!
//! The field uses logical units; clients scale it. Every tick moves the
//! paddles, integrates the ball, bounces it off the top and bottom walls
//! and the paddles, and scores when it leaves the field on either side.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use duelforge_protocol::{ActionResult, EventName, PlayerId};
use duelforge_room::{EngineContext, EngineError, GameEngine, PlayerLimits, SessionConfig, TickPolicy};

use crate::util::{parse_action, Aabb};

pub const GAME_TYPE: &str = "pong";

/// Field and pacing settings, read from the session options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PongOptions {
    pub width: f64,
    pub height: f64,
    pub ball_radius: f64,
    pub ball_speed_x: f64,
    pub ball_speed_y: f64,
    pub paddle_width: f64,
    pub paddle_height: f64,
    /// Distance from the side wall to the outer edge of a paddle.
    pub paddle_inset: f64,
    pub paddle_speed: f64,
    pub winning_score: u32,
    pub tick_ms: u64,
}

impl Default for PongOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            ball_radius: 8.0,
            ball_speed_x: 5.0,
            ball_speed_y: 3.0,
            paddle_width: 10.0,
            paddle_height: 80.0,
            paddle_inset: 20.0,
            paddle_speed: 5.0,
            winning_score: 5,
            tick_ms: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Ball {
    pub fn bounds(&self) -> Aabb {
        Aabb::around_circle(self.x, self.y, self.radius)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paddle {
    pub player: PlayerId,
    pub side: Side,
    pub rect: Aabb,
    pub velocity: f64,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Direction {
    Up,
    Down,
    Stop,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum PongAction {
    Move { direction: Direction },
}

#[derive(Debug)]
pub struct Pong {
    options: PongOptions,
    ball: Ball,
    /// Left paddle first.
    paddles: Vec<Paddle>,
}

impl Pong {
    pub fn new(options: PongOptions) -> Self {
        let ball = Ball {
            x: options.width / 2.0,
            y: options.height / 2.0,
            radius: options.ball_radius,
            vx: options.ball_speed_x,
            vy: options.ball_speed_y,
        };
        Self {
            options,
            ball,
            paddles: Vec::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, EngineError> {
        let options: PongOptions = config.engine_options()?;
        if options.width <= 0.0 || options.height <= options.paddle_height {
            return Err(EngineError::InvalidOptions(
                "pong field must be wider than zero and taller than a paddle".into(),
            ));
        }
        Ok(Self::new(options))
    }

    pub fn options(&self) -> &PongOptions {
        &self.options
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn ball_mut(&mut self) -> &mut Ball {
        &mut self.ball
    }

    pub fn paddles(&self) -> &[Paddle] {
        &self.paddles
    }

    pub fn paddle_mut(&mut self, player: PlayerId) -> Option<&mut Paddle> {
        self.paddles.iter_mut().find(|p| p.player == player)
    }

    /// Places a paddle for each player: the first joined on the left.
    pub fn seat(&mut self, players: &[PlayerId]) {
        let o = &self.options;
        let y = o.height / 2.0 - o.paddle_height / 2.0;
        self.paddles = players
            .iter()
            .take(2)
            .zip([Side::Left, Side::Right])
            .map(|(&player, side)| {
                let x = match side {
                    Side::Left => o.paddle_inset,
                    Side::Right => o.width - o.paddle_inset - o.paddle_width,
                };
                Paddle {
                    player,
                    side,
                    rect: Aabb::new(x, y, o.paddle_width, o.paddle_height),
                    velocity: 0.0,
                    score: 0,
                }
            })
            .collect();
    }

    /// Re-centres the ball with a random diagonal direction.
    pub fn reset_ball(&mut self, rng: &mut StdRng) {
        let sx = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let sy = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        self.ball.x = self.options.width / 2.0;
        self.ball.y = self.options.height / 2.0;
        self.ball.vx = self.options.ball_speed_x * sx;
        self.ball.vy = self.options.ball_speed_y * sy;
    }

    /// Advances the simulation by one tick. Returns the paddle that
    /// scored, if the ball left the field.
    pub fn step(&mut self) -> Option<Side> {
        let (width, height) = (self.options.width, self.options.height);
        for paddle in &mut self.paddles {
            paddle.rect.y += paddle.velocity;
            paddle.rect.clamp_vertical(height);
        }

        let ball = &mut self.ball;
        ball.x += ball.vx;
        ball.y += ball.vy;

        if ball.y - ball.radius < 0.0 {
            ball.y = ball.radius;
            ball.vy = -ball.vy;
        } else if ball.y + ball.radius > height {
            ball.y = height - ball.radius;
            ball.vy = -ball.vy;
        }

        for paddle in &self.paddles {
            if ball.bounds().intersects(&paddle.rect) {
                ball.vx = -ball.vx;
                if paddle.rect.center_x() < width / 2.0 {
                    ball.x = paddle.rect.right() + ball.radius;
                } else {
                    ball.x = paddle.rect.left() - ball.radius;
                }
            }
        }

        if ball.x - ball.radius < 0.0 {
            Some(Side::Right)
        } else if ball.x + ball.radius > width {
            Some(Side::Left)
        } else {
            None
        }
    }
}

impl GameEngine for Pong {
    fn game_type(&self) -> &'static str {
        GAME_TYPE
    }

    fn player_limits(&self) -> PlayerLimits {
        PlayerLimits::exactly(2)
    }

    fn tick_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.options.tick_ms))
    }

    // Ball speed is per tick, so late ticks are replayed.
    fn tick_policy(&self) -> TickPolicy {
        TickPolicy::CatchUp { max_catchup: 3 }
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), EngineError> {
        let players = ctx.players().to_vec();
        if players.len() != 2 {
            tracing::warn!(players = players.len(), "pong expects exactly 2 players");
        }
        self.seat(&players);
        self.reset_ball(ctx.rng());
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
        let speed = self.options.paddle_speed;
        let Some(paddle) = self.paddle_mut(player) else {
            return Ok(ActionResult::rejected("No paddle for this player"));
        };
        let PongAction::Move { direction } = match parse_action(action) {
            Ok(action) => action,
            Err(rejected) => return Ok(rejected),
        };
        paddle.velocity = match direction {
            Direction::Up => -speed,
            Direction::Down => speed,
            Direction::Stop => 0.0,
        };
        Ok(ActionResult::accepted())
    }

    fn calculate_score(&self, player: PlayerId, _result: &ActionResult, current: i64) -> i64 {
        self.paddles
            .iter()
            .find(|p| p.player == player)
            .map_or(current, |p| i64::from(p.score))
    }

    fn public_state(&self) -> Value {
        let paddles: serde_json::Map<String, Value> = self
            .paddles
            .iter()
            .map(|p| {
                (
                    p.player.0.to_string(),
                    json!({
                        "x": p.rect.x,
                        "y": p.rect.y,
                        "width": p.rect.width,
                        "height": p.rect.height,
                        "side": p.side,
                        "score": p.score,
                    }),
                )
            })
            .collect();
        json!({
            "ball": self.ball,
            "paddles": paddles,
            "field": { "width": self.options.width, "height": self.options.height },
        })
    }

    fn tick(&mut self, ctx: &mut EngineContext<'_>, _dt: Duration) -> Result<(), EngineError> {
        let Some(side) = self.step() else {
            return Ok(());
        };
        let winning = self.options.winning_score;
        if let Some(scorer) = self.paddles.iter_mut().find(|p| p.side == side) {
            scorer.score += 1;
            if scorer.score >= winning {
                ctx.finish(format!("Player {} won (score {winning})", scorer.player.0));
                return Ok(());
            }
        }
        self.reset_ball(ctx.rng());
        Ok(())
    }

    fn derived_scores(&self) -> Vec<(PlayerId, i64)> {
        self.paddles
            .iter()
            .map(|p| (p.player, i64::from(p.score)))
            .collect()
    }
}
