//! Error types for the roster layer.

use duelforge_protocol::PlayerId;

/// Errors raised while changing room membership.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RosterError {
    /// The roster already holds `max_players` active players.
    #[error("room is full ({max_players} players)")]
    RoomFull { max_players: usize },

    /// The player is neither active nor disconnected in this roster.
    #[error("player {0} is not in the roster")]
    NotInRoster(PlayerId),
}
