//! Guess the Brand: name the brand behind a partly masked name.
//!
//! Each round shows a brand with some letters replaced by `_`; later
//! rounds hide more. The first correct guess wins the round and scores a
//! time bonus. A round nobody solves times out, and the next one starts
//! after a short break.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use duelforge_protocol::{ActionResult, EventName, PlayerId};
use duelforge_room::{
    EngineContext, EngineError, EngineTimer, GameEngine, PlayerLimits, SessionConfig,
};

use crate::util::parse_action;

pub const GAME_TYPE: &str = "guessbrand";

pub const ROUND_TIMEOUT: EngineTimer = EngineTimer(1);
pub const NEXT_ROUND: EngineTimer = EngineTimer(2);

pub const BRANDS: [&str; 20] = [
    "Nike", "Adidas", "Coca Cola", "Pepsi", "Apple", "Microsoft", "Amazon", "Google",
    "Facebook", "Instagram", "Twitter", "Netflix", "Disney", "Samsung", "Sony",
    "McDonald's", "Burger King", "Starbucks", "Subway", "KFC",
];

const BASE_POINTS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuessBrandOptions {
    pub round_secs: u64,
    pub break_secs: u64,
    /// Correct guesses needed to win.
    pub winning_score: u32,
    pub brands: Vec<String>,
}

impl Default for GuessBrandOptions {
    fn default() -> Self {
        Self {
            round_secs: 10,
            break_secs: 3,
            winning_score: 3,
            brands: BRANDS.iter().map(|b| (*b).to_owned()).collect(),
        }
    }
}

/// Replaces `floor(len × fraction)` letters of `brand` with `_`, where the
/// fraction grows with the round: `min(0.7, 0.3 + 0.1 × round)`. Spaces
/// are never masked.
pub fn mask_brand(brand: &str, round: u32, rng: &mut StdRng) -> String {
    let fraction = (0.3 + 0.1 * f64::from(round)).min(0.7);
    let mut chars: Vec<char> = brand.chars().collect();
    let candidates: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| **c != ' ')
        .map(|(i, _)| i)
        .collect();
    let amount = ((chars.len() as f64 * fraction).floor() as usize).min(candidates.len());
    for pick in rand::seq::index::sample(rng, candidates.len(), amount) {
        chars[candidates[pick]] = '_';
    }
    chars.into_iter().collect()
}

/// Points for a correct guess after `elapsed` of a round lasting `round`.
pub fn guess_points(round: Duration, elapsed: Duration) -> i64 {
    let left = round.as_secs_f64() - elapsed.as_secs_f64();
    BASE_POINTS + ((left * 10.0).floor() as i64).max(0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Guess {
    Wrong,
    Correct { points: i64, total: u32 },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum GuessBrandAction {
    Guess { guess: String },
}

#[derive(Debug)]
pub struct GuessBrand {
    options: GuessBrandOptions,
    round: u32,
    brand: String,
    masked: String,
    /// Between rounds, guesses are refused.
    in_break: bool,
    /// Active time at which the current round began.
    round_started: Duration,
    correct_guesses: Vec<(PlayerId, u32)>,
}

impl GuessBrand {
    pub fn new(options: GuessBrandOptions) -> Self {
        Self {
            options,
            round: 0,
            brand: String::new(),
            masked: String::new(),
            in_break: true,
            round_started: Duration::ZERO,
            correct_guesses: Vec::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, EngineError> {
        let options: GuessBrandOptions = config.engine_options()?;
        if options.brands.is_empty() {
            return Err(EngineError::InvalidOptions("guessbrand needs at least one brand".into()));
        }
        if options.winning_score == 0 {
            return Err(EngineError::InvalidOptions("winningScore must be at least 1".into()));
        }
        Ok(Self::new(options))
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn masked(&self) -> &str {
        &self.masked
    }

    pub fn in_break(&self) -> bool {
        self.in_break
    }

    pub fn correct_guesses(&self, player: PlayerId) -> u32 {
        self.correct_guesses
            .iter()
            .find(|(p, _)| *p == player)
            .map_or(0, |(_, n)| *n)
    }

    /// Picks the next brand and masks it. `started` is the active time the
    /// round begins at.
    pub fn begin_round(&mut self, rng: &mut StdRng, started: Duration) {
        self.round += 1;
        self.brand = self
            .options
            .brands
            .choose(rng)
            .cloned()
            .unwrap_or_default();
        self.masked = mask_brand(&self.brand, self.round, rng);
        self.in_break = false;
        self.round_started = started;
    }

    /// Checks a guess made at active time `now`.
    pub fn guess(&mut self, player: PlayerId, text: &str, now: Duration) -> Guess {
        if !text.trim().eq_ignore_ascii_case(&self.brand) {
            return Guess::Wrong;
        }
        let elapsed = now.saturating_sub(self.round_started);
        let points = guess_points(Duration::from_secs(self.options.round_secs), elapsed);
        let total = match self.correct_guesses.iter_mut().find(|(p, _)| *p == player) {
            Some(entry) => {
                entry.1 += 1;
                entry.1
            }
            None => {
                self.correct_guesses.push((player, 1));
                1
            }
        };
        Guess::Correct { points, total }
    }

    fn correct_json(&self) -> Value {
        let map: serde_json::Map<String, Value> = self
            .correct_guesses
            .iter()
            .map(|(p, n)| (p.0.to_string(), json!(n)))
            .collect();
        Value::Object(map)
    }

    fn start_round(&mut self, ctx: &mut EngineContext<'_>) {
        let started = ctx.elapsed();
        self.begin_round(ctx.rng(), started);
        ctx.set_round(self.round);
        ctx.cancel(NEXT_ROUND);
        ctx.schedule(ROUND_TIMEOUT, Duration::from_secs(self.options.round_secs));
        tracing::debug!(round = self.round, masked = %self.masked, "guessbrand round started");
        let state = self.public_state();
        ctx.emit(
            EventName::NewRound,
            json!({ "initialState": state, "duration": self.options.round_secs }),
        );
    }
}

impl GameEngine for GuessBrand {
    fn game_type(&self) -> &'static str {
        GAME_TYPE
    }

    fn player_limits(&self) -> PlayerLimits {
        PlayerLimits::range(1, 8)
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), EngineError> {
        self.round = 0;
        self.correct_guesses.clear();
        self.start_round(ctx);
        Ok(())
    }

    fn process_action(
        &mut self,
        ctx: &mut EngineContext<'_>,
        player: PlayerId,
        action: &Value,
    ) -> Result<ActionResult, EngineError> {
        let GuessBrandAction::Guess { guess } = match parse_action(action) {
            Ok(action) => action,
            Err(rejected) => return Ok(rejected),
        };
        if self.in_break {
            return Ok(ActionResult::rejected("Round not in progress"));
        }

        match self.guess(player, &guess, ctx.elapsed()) {
            Guess::Wrong => Ok(ActionResult::accepted().with("correct", false)),
            Guess::Correct { points, total } => {
                let result = ActionResult::accepted()
                    .with("correct", true)
                    .with("points", points)
                    .with("actualBrand", self.brand.clone());
                if total >= self.options.winning_score {
                    ctx.cancel(ROUND_TIMEOUT);
                    ctx.finish("winner");
                    return Ok(result.with("gameWon", true));
                }
                self.start_round(ctx);
                Ok(result)
            }
        }
    }

    fn calculate_score(&self, _player: PlayerId, result: &ActionResult, current: i64) -> i64 {
        let points = result.detail("points").and_then(Value::as_i64).unwrap_or(0);
        current + points
    }

    fn public_state(&self) -> Value {
        json!({
            "roundNumber": self.round,
            "maskedBrand": self.masked,
            "correctGuesses": self.correct_json(),
            "inBreak": self.in_break,
        })
    }

    fn on_timer(&mut self, ctx: &mut EngineContext<'_>, timer: EngineTimer) -> Result<(), EngineError> {
        match timer {
            ROUND_TIMEOUT => {
                self.in_break = true;
                ctx.emit(
                    EventName::RoundEnded,
                    json!({
                        "reason": "time_up",
                        "correctBrand": self.brand,
                        "scores": ctx.scores_json(),
                        "correctGuesses": self.correct_json(),
                    }),
                );
                ctx.schedule(NEXT_ROUND, Duration::from_secs(self.options.break_secs));
            }
            NEXT_ROUND => self.start_round(ctx),
            other => tracing::warn!(timer = other.0, "guessbrand ignoring unknown timer"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_mask_fraction_grows_and_caps() {
        let mut rng = StdRng::seed_from_u64(1);
        let hidden = |s: &str| s.chars().filter(|c| *c == '_').count();

        // "Microsoft" has 9 letters.
        assert_eq!(hidden(&mask_brand("Microsoft", 1, &mut rng)), 3);
        assert_eq!(hidden(&mask_brand("Microsoft", 2, &mut rng)), 4);
        assert_eq!(hidden(&mask_brand("Microsoft", 4, &mut rng)), 6);
        assert_eq!(hidden(&mask_brand("Microsoft", 9, &mut rng)), 6);
    }

    #[test]
    fn test_mask_keeps_spaces_and_other_letters() {
        let mut rng = StdRng::seed_from_u64(2);
        let masked = mask_brand("Burger King", 3, &mut rng);
        assert_eq!(masked.chars().nth(6), Some(' '));
        for (m, b) in masked.chars().zip("Burger King".chars()) {
            assert!(m == '_' || m == b);
        }
    }

    #[test]
    fn test_points_decay_with_time() {
        let round = Duration::from_secs(10);
        assert_eq!(guess_points(round, Duration::ZERO), 200);
        assert_eq!(guess_points(round, Duration::from_millis(2500)), 175);
        assert_eq!(guess_points(round, Duration::from_secs(12)), 100);
    }

    #[test]
    fn test_guess_is_trimmed_and_case_insensitive() {
        let mut game = GuessBrand::new(GuessBrandOptions {
            brands: vec!["Coca Cola".into()],
            ..GuessBrandOptions::default()
        });
        game.begin_round(&mut StdRng::seed_from_u64(0), Duration::from_secs(5));
        let p = PlayerId(1);
        assert_eq!(game.guess(p, "pepsi", Duration::from_secs(6)), Guess::Wrong);
        assert_eq!(
            game.guess(p, "  coca COLA ", Duration::from_secs(6)),
            Guess::Correct { points: 190, total: 1 }
        );
        assert_eq!(game.correct_guesses(p), 1);
    }
}
