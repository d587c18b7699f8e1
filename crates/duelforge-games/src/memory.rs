//! Memory: find the pairs in a shuffled deck of face-down cards.
//!
//! Any player may flip a card. Every second flip resolves the pair: a
//! match stays face up and earns the flipper a point, a mismatch turns
//! back over after a short delay.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use duelforge_protocol::{ActionResult, EventName, PlayerId};
use duelforge_room::{
    EngineContext, EngineError, EngineTimer, GameEngine, PlayerLimits, SessionConfig,
};

use crate::util::parse_action;

pub const GAME_TYPE: &str = "memory";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryOptions {
    pub pairs: usize,
    /// How long a mismatched pair stays face up.
    pub flip_back_ms: u64,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            pairs: 6,
            flip_back_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub value: u32,
    pub flipped: bool,
    pub matched: bool,
}

/// Outcome of one flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flip {
    /// First card of a pair is face up.
    Opened,
    Matched,
    /// The two cards differ and will turn back.
    Mismatched([usize; 2]),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum MemoryAction {
    Flip { index: i64 },
}

#[derive(Debug)]
pub struct MemoryGame {
    options: MemoryOptions,
    cards: Vec<Card>,
    /// Face-up card waiting for its partner.
    pending: Option<usize>,
    /// Mismatched pairs waiting to turn back, by timer.
    flip_backs: Vec<(EngineTimer, [usize; 2])>,
    next_timer: u32,
    pairs_found: Vec<(PlayerId, usize)>,
}

impl MemoryGame {
    pub fn new(options: MemoryOptions) -> Self {
        Self {
            options,
            cards: Vec::new(),
            pending: None,
            flip_backs: Vec::new(),
            next_timer: 0,
            pairs_found: Vec::new(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, EngineError> {
        let options: MemoryOptions = config.engine_options()?;
        if options.pairs == 0 {
            return Err(EngineError::InvalidOptions("memory needs at least one pair".into()));
        }
        Ok(Self::new(options))
    }

    /// Lays out a fresh shuffled deck.
    pub fn deal(&mut self, rng: &mut StdRng) {
        let mut values: Vec<u32> = (1..=self.options.pairs as u32)
            .flat_map(|v| [v, v])
            .collect();
        values.shuffle(rng);
        self.cards = values
            .into_iter()
            .map(|value| Card {
                value,
                flipped: false,
                matched: false,
            })
            .collect();
        self.pending = None;
        self.flip_backs.clear();
        self.pairs_found.clear();
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn pairs_found(&self, player: PlayerId) -> usize {
        self.pairs_found
            .iter()
            .find(|(p, _)| *p == player)
            .map_or(0, |(_, n)| *n)
    }

    pub fn all_matched(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(|c| c.matched)
    }

    /// Turns `index` face up for `player` and resolves the pair when it is
    /// the second card.
    pub fn flip(&mut self, player: PlayerId, index: i64) -> Result<Flip, ActionResult> {
        let index = usize::try_from(index)
            .ok()
            .filter(|i| *i < self.cards.len())
            .ok_or_else(|| ActionResult::rejected("Invalid card index"))?;
        let card = &mut self.cards[index];
        if card.matched || card.flipped {
            return Err(ActionResult::rejected("Already flipped or matched"));
        }
        card.flipped = true;

        let Some(first) = self.pending.take() else {
            self.pending = Some(index);
            return Ok(Flip::Opened);
        };
        if self.cards[first].value == self.cards[index].value {
            self.cards[first].matched = true;
            self.cards[index].matched = true;
            match self.pairs_found.iter_mut().find(|(p, _)| *p == player) {
                Some(entry) => entry.1 += 1,
                None => self.pairs_found.push((player, 1)),
            }
            Ok(Flip::Matched)
        } else {
            Ok(Flip::Mismatched([first, index]))
        }
    }

    /// Turns a mismatched pair back over.
    pub fn flip_back(&mut self, pair: [usize; 2]) {
        for i in pair {
            if let Some(card) = self.cards.get_mut(i) {
                if !card.matched {
                    card.flipped = false;
                }
            }
        }
    }
}

impl GameEngine for MemoryGame {
    fn game_type(&self) -> &'static str {
        GAME_TYPE
    }

    fn player_limits(&self) -> PlayerLimits {
        PlayerLimits::range(1, 4)
    }

    fn initialize(&mut self, ctx: &mut EngineContext<'_>) -> Result<(), EngineError> {
        self.deal(ctx.rng());
        ctx.set_round(1);
        let state = self.public_state();
        ctx.emit(EventName::NewRound, json!({ "initialState": state }));
        Ok(())
    }

    fn process_action(
        &mut self,
        ctx: &mut EngineContext<'_>,
        player: PlayerId,
        action: &Value,
    ) -> Result<ActionResult, EngineError> {
        let MemoryAction::Flip { index } = match parse_action(action) {
            Ok(action) => action,
            Err(rejected) => return Ok(rejected),
        };
        match self.flip(player, index) {
            Err(rejected) => Ok(rejected),
            Ok(Flip::Opened) => Ok(ActionResult::accepted()),
            Ok(Flip::Matched) => {
                if self.all_matched() {
                    ctx.finish("All pairs matched!");
                }
                Ok(ActionResult::accepted().with("matched", true))
            }
            Ok(Flip::Mismatched(pair)) => {
                self.next_timer += 1;
                let timer = EngineTimer(self.next_timer);
                self.flip_backs.push((timer, pair));
                ctx.schedule(timer, Duration::from_millis(self.options.flip_back_ms));
                Ok(ActionResult::accepted().with("matched", false))
            }
        }
    }

    fn calculate_score(&self, player: PlayerId, _result: &ActionResult, _current: i64) -> i64 {
        self.pairs_found(player) as i64
    }

    fn public_state(&self) -> Value {
        // Face-down values stay hidden.
        let cards: Vec<Value> = self
            .cards
            .iter()
            .map(|c| {
                json!({
                    "value": (c.flipped || c.matched).then_some(c.value),
                    "flipped": c.flipped,
                    "matched": c.matched,
                })
            })
            .collect();
        json!({ "cards": cards })
    }

    fn on_timer(&mut self, _ctx: &mut EngineContext<'_>, timer: EngineTimer) -> Result<(), EngineError> {
        let Some(at) = self.flip_backs.iter().position(|(t, _)| *t == timer) else {
            return Ok(());
        };
        let (_, pair) = self.flip_backs.swap_remove(at);
        self.flip_back(pair);
        Ok(())
    }

    fn derived_scores(&self) -> Vec<(PlayerId, i64)> {
        self.pairs_found
            .iter()
            .map(|(p, n)| (*p, *n as i64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn dealt() -> MemoryGame {
        let mut game = MemoryGame::new(MemoryOptions::default());
        game.deal(&mut StdRng::seed_from_u64(3));
        game
    }

    fn partner_of(game: &MemoryGame, index: usize) -> usize {
        let value = game.cards()[index].value;
        (0..game.cards().len())
            .find(|&i| i != index && game.cards()[i].value == value)
            .unwrap()
    }

    fn stranger_of(game: &MemoryGame, index: usize) -> usize {
        let value = game.cards()[index].value;
        (0..game.cards().len())
            .find(|&i| game.cards()[i].value != value)
            .unwrap()
    }

    #[test]
    fn test_deck_holds_each_value_twice() {
        let game = dealt();
        assert_eq!(game.cards().len(), 12);
        for v in 1..=6 {
            assert_eq!(game.cards().iter().filter(|c| c.value == v).count(), 2);
        }
    }

    #[test]
    fn test_match_scores_flipper() {
        let mut game = dealt();
        let p = PlayerId(1);
        let other = partner_of(&game, 0);
        assert_eq!(game.flip(p, 0), Ok(Flip::Opened));
        assert_eq!(game.flip(p, other as i64), Ok(Flip::Matched));
        assert_eq!(game.pairs_found(p), 1);
        assert!(game.cards()[0].matched);
    }

    #[test]
    fn test_mismatch_flips_back() {
        let mut game = dealt();
        let other = stranger_of(&game, 0);
        game.flip(PlayerId(1), 0).unwrap();
        let flip = game.flip(PlayerId(2), other as i64).unwrap();
        assert_eq!(flip, Flip::Mismatched([0, other]));
        assert!(game.cards()[other].flipped);

        game.flip_back([0, other]);
        assert!(!game.cards()[0].flipped);
        assert!(!game.cards()[other].flipped);
        assert_eq!(game.pairs_found(PlayerId(2)), 0);
    }

    #[test]
    fn test_rejections() {
        let mut game = dealt();
        let p = PlayerId(1);
        assert_eq!(game.flip(p, 12).unwrap_err().reason.as_deref(), Some("Invalid card index"));
        assert_eq!(game.flip(p, -1).unwrap_err().reason.as_deref(), Some("Invalid card index"));
        game.flip(p, 0).unwrap();
        assert_eq!(
            game.flip(p, 0).unwrap_err().reason.as_deref(),
            Some("Already flipped or matched")
        );
    }

    #[test]
    fn test_all_matched() {
        let mut game = dealt();
        let p = PlayerId(1);
        while let Some(i) = game.cards().iter().position(|c| !c.matched) {
            let j = partner_of(&game, i);
            game.flip(p, i as i64).unwrap();
            game.flip(p, j as i64).unwrap();
        }
        assert!(game.all_matched());
        assert_eq!(game.pairs_found(p), 6);
    }
}
