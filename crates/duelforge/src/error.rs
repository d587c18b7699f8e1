//! Unified error type for the Duelforge facade.

use duelforge_protocol::ProtocolError;
use duelforge_room::{EngineError, RoomError};
use duelforge_roster::RosterError;

/// Top-level error wrapping every crate-specific error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum DuelforgeError {
    /// Payload encoding or decoding.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Membership bookkeeping.
    #[error(transparent)]
    Roster(#[from] RosterError),

    /// Room routing and lifecycle (full, not found, unknown game type).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game engine could not be built or failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Settings could not be loaded.
    #[error("settings: {0}")]
    Settings(#[from] config::ConfigError),
}

impl DuelforgeError {
    /// Whether the caller should surface this error to the player
    /// (capacity and unknown game types). Everything else is logged.
    pub fn is_player_facing(&self) -> bool {
        matches!(
            self,
            Self::Room(RoomError::RoomFull(_) | RoomError::UnknownGameType(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelforge_protocol::RoomId;

    #[test]
    fn test_from_room_error() {
        let err: DuelforgeError = RoomError::NotFound(RoomId(4)).into();
        assert!(matches!(err, DuelforgeError::Room(_)));
        assert!(err.to_string().contains("R-4"));
        assert!(!err.is_player_facing());
    }

    #[test]
    fn test_from_engine_error() {
        let err: DuelforgeError = EngineError::InvalidOptions("mines".into()).into();
        assert!(matches!(err, DuelforgeError::Engine(_)));
    }

    #[test]
    fn test_from_roster_error() {
        let err: DuelforgeError = RosterError::RoomFull { max_players: 2 }.into();
        assert!(err.to_string().contains("full"));
    }

    #[test]
    fn test_player_facing_errors() {
        assert!(DuelforgeError::from(RoomError::RoomFull(RoomId(1))).is_player_facing());
        assert!(DuelforgeError::from(RoomError::UnknownGameType("chess".into())).is_player_facing());
    }
}
