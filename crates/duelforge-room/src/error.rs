//! Error types for the room layer.

use duelforge_protocol::RoomId;

/// Errors returned by sessions, room handles and the registry.
///
/// Only [`RoomFull`](Self::RoomFull) and
/// [`UnknownGameType`](Self::UnknownGameType) are meant for the player;
/// the rest describe misuse or a room that went away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No live room has this id.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Every seat in the room is taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// No engine is registered under this game type.
    #[error("unknown game type: {0}")]
    UnknownGameType(String),

    /// A room with this id is already running.
    #[error("room {0} already exists")]
    AlreadyExists(RoomId),

    /// The session's state does not allow this operation.
    #[error("invalid session state: {0}")]
    InvalidState(String),

    /// The engine rejected the session configuration.
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    /// The room's actor has stopped or its channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

/// A failure inside a game engine.
///
/// Rule violations are not errors: engines answer those with a rejected
/// [`ActionResult`](duelforge_protocol::ActionResult). An `EngineError`
/// means the engine itself is broken or misconfigured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine detected an inconsistent internal state.
    #[error("engine fault: {0}")]
    Fault(String),

    /// The engine panicked; the panic was caught at the session boundary.
    #[error("engine panicked: {0}")]
    Panicked(String),

    /// Engine options could not be parsed or are out of range.
    #[error("invalid engine options: {0}")]
    InvalidOptions(String),
}
