//! Session lifecycle and room management for Duelforge.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! [`Session`]: the state machine taking a game from `waiting` through the
//! countdown and active play to exactly one `finished`. The rules of the
//! game live behind the [`GameEngine`] trait.
//!
//! # Key types
//!
//! - [`GameEngine`] / [`EngineContext`]: the trait each game implements and
//!   the capabilities it gets during a call
//! - [`Session`]: the lifecycle state machine (sync, testable on its own)
//! - [`SessionRegistry`]: registration table of engines plus live rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`BroadcastPort`] / [`RoomFanout`]: where room events go
//! - [`SessionConfig`] / [`SessionState`]: settings and lifecycle states

mod config;
mod engine;
mod error;
mod port;
mod registry;
mod room;
mod session;

pub use config::{PlayerLimits, SessionConfig, SessionState};
pub use engine::{EngineContext, EngineTimer, GameEngine, SessionTimer};
pub use error::{EngineError, RoomError};
pub use port::{BroadcastPort, NullPort, RoomFanout, RoomSubscription};
pub use registry::{DEFAULT_CHANNEL_SIZE, EngineFactory, SessionRegistry};
pub use room::{RoomHandle, spawn_room};
pub use session::{MAX_TICK_FAULTS, Session, SessionMetadata, Wakeup, reason};

pub use duelforge_tick::TickPolicy;
