//! # Duelforge
//!
//! Session lifecycle framework for short real-time multiplayer games.
//!
//! Each room runs one game session: players join, a countdown runs, the
//! game plays out under a pluggable [`GameEngine`](duelforge_room::GameEngine)
//! and ends exactly once with final standings. This crate wires the
//! pieces together behind [`GameServer`]: the registry of built-in games,
//! the event fanout, and a [`GameDirectory`] that maps rooms to games.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duelforge::prelude::*;
//! use serde_json::{json, Map};
//!
//! # async fn run() -> Result<(), DuelforgeError> {
//! let settings = Settings::load()?;
//! duelforge::telemetry::init_tracing(&settings.log_filter);
//!
//! let directory = StaticDirectory::new().with_room(RoomId(1), "tictactoe");
//! let server = GameServer::new(settings, directory);
//! let mut events = server.subscribe();
//!
//! server.on_player_join_request(RoomId(1), PlayerId(1), Map::new()).await?;
//! server.on_player_join_request(RoomId(1), PlayerId(2), Map::new()).await?;
//! server
//!     .on_action(RoomId(1), PlayerId(1), json!({ "type": "move", "row": 1, "col": 1 }))
//!     .await?;
//! while let Ok(event) = events.recv().await {
//!     println!("{} {}", event.room_id, event.name);
//! }
//! # Ok(())
//! # }
//! ```

mod directory;
mod error;
mod server;
pub mod settings;
pub mod telemetry;

pub use directory::{GameDirectory, StaticDirectory};
pub use error::DuelforgeError;
pub use server::GameServer;
pub use settings::{SessionDefaults, Settings};

/// Re-exports for users of the facade.
pub mod prelude {
    pub use crate::{DuelforgeError, GameDirectory, GameServer, SessionDefaults, Settings, StaticDirectory};

    pub use duelforge_games::{register_builtin, AnyEngine, BUILTIN_GAME_TYPES};
    pub use duelforge_protocol::{ActionResult, EventName, PlayerId, RoomEvent, RoomId, Standing};
    pub use duelforge_roster::{JoinOutcome, JoinRequest};
    pub use duelforge_room::{
        BroadcastPort, EngineContext, EngineError, EngineTimer, GameEngine, PlayerLimits, RoomError, RoomFanout,
        RoomHandle, Session, SessionConfig, SessionMetadata, SessionRegistry, SessionState,
    };
    pub use duelforge_tick::{TickConfig, TickPolicy};
}
