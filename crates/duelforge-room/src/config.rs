//! Session configuration and the session state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use duelforge_protocol::RoomId;

use crate::EngineError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Settings for one session, supplied by whoever creates the room.
///
/// Every field has a default, so `SessionConfig::new(room_id)` is a valid
/// config. The player limits are clamped to what the engine supports when
/// the session is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub room_id: RoomId,
    /// Identifier of this particular game. Empty means
    /// `"{gameType}_{millis}"` is generated at creation.
    pub game_id: String,
    pub min_players: usize,
    pub max_players: usize,
    /// Length of the active phase in seconds.
    pub duration_secs: u64,
    /// Countdown before the game starts, in seconds. 0 starts at once.
    pub countdown_secs: u32,
    /// How long a temporarily disconnected player keeps their seat data.
    pub reconnect_grace_secs: u64,
    /// Seed for the session RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Engine-specific options, camelCase keys.
    pub options: Map<String, Value>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            room_id: RoomId(0),
            game_id: String::new(),
            min_players: 2,
            max_players: 4,
            duration_secs: 300,
            countdown_secs: 5,
            reconnect_grace_secs: 30,
            seed: None,
            options: Map::new(),
        }
    }
}

impl SessionConfig {
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            ..Self::default()
        }
    }

    pub fn with_players(mut self, min: usize, max: usize) -> Self {
        self.min_players = min;
        self.max_players = max;
        self
    }

    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_countdown_secs(mut self, secs: u32) -> Self {
        self.countdown_secs = secs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets one engine option.
    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_owned(), value.into());
        self
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn reconnect_grace(&self) -> Duration {
        Duration::from_secs(self.reconnect_grace_secs)
    }

    /// Deserializes the engine options into an engine's option struct.
    ///
    /// Missing keys take the struct's defaults (the struct is expected to
    /// use `#[serde(default)]`).
    pub fn engine_options<T: serde::de::DeserializeOwned>(&self) -> Result<T, EngineError> {
        T::deserialize(Value::Object(self.options.clone()))
            .map_err(|e| EngineError::InvalidOptions(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// PlayerLimits
// ---------------------------------------------------------------------------

/// How many players an engine can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerLimits {
    pub min: usize,
    pub max: usize,
}

impl PlayerLimits {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Fits a requested `(min, max)` into these limits.
    ///
    /// The result always satisfies `self.min <= min <= max <= self.max`
    /// and `min >= 1`.
    pub fn resolve(&self, min: usize, max: usize) -> (usize, usize) {
        let lo = self.min.max(1);
        let hi = self.max.max(lo);
        let min = min.clamp(lo, hi);
        let max = max.clamp(min, hi);
        (min, max)
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle of a session.
///
/// ```text
/// Waiting → Starting → Active ⇄ Paused
///    │          │         │        │
///    └──────────┴─────────┴────────┴──→ Finished
/// ```
///
/// Transitions only move forward, except Active ⇄ Paused. `Finished` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Waiting,
    Starting,
    Active,
    Paused,
    Finished,
}

impl SessionState {
    /// Whether the game itself is being played, running or paused.
    ///
    /// Dropping below the minimum player count in one of these states
    /// ends the game. A countdown is not yet a game.
    pub fn is_underway(&self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
