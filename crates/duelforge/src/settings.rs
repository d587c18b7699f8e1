//! Process settings, layered with the `config` crate.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults (`Settings::default()`)
//! 2. `config/duelforge.toml` (or any path given to [`Settings::load_from`]), optional
//! 3. `DUELFORGE__*` environment variables, `__` separating nested keys:
//!    `DUELFORGE__SESSION__COUNTDOWN_SECS=3`

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use duelforge_protocol::RoomId;
use duelforge_room::{SessionConfig, DEFAULT_CHANNEL_SIZE};

pub const DEFAULT_SETTINGS_PATH: &str = "config/duelforge";
pub const ENV_PREFIX: &str = "DUELFORGE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Command queue size of each room actor.
    pub room_channel_size: usize,
    /// Events buffered per fanout subscriber before it lags.
    pub fanout_capacity: usize,
    pub session: SessionDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".to_owned(),
            room_channel_size: DEFAULT_CHANNEL_SIZE,
            fanout_capacity: 4096,
            session: SessionDefaults::default(),
        }
    }
}

/// Session settings applied to rooms created on a join request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub min_players: usize,
    pub max_players: usize,
    pub duration_secs: u64,
    pub countdown_secs: u32,
    pub reconnect_grace_secs: u64,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        let base = SessionConfig::default();
        Self {
            min_players: base.min_players,
            max_players: base.max_players,
            duration_secs: base.duration_secs,
            countdown_secs: base.countdown_secs,
            reconnect_grace_secs: base.reconnect_grace_secs,
        }
    }
}

impl SessionDefaults {
    pub fn config_for(&self, room_id: RoomId) -> SessionConfig {
        SessionConfig {
            reconnect_grace_secs: self.reconnect_grace_secs,
            ..SessionConfig::new(room_id)
                .with_players(self.min_players, self.max_players)
                .with_duration_secs(self.duration_secs)
                .with_countdown_secs(self.countdown_secs)
        }
    }
}

impl Settings {
    /// Loads from `config/duelforge.*` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_SETTINGS_PATH)
    }

    /// Loads from the file at `path` (extension optional, the file may be
    /// missing) and the environment.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }
}
