//! Room membership for Duelforge.
//!
//! This crate tracks who is in a room and how they are doing:
//!
//! 1. **Roster** ([`Roster`]): active players in join order, capped at the
//!    room's capacity, plus a side-table of players who dropped and may
//!    reconnect within a grace period.
//! 2. **Scores** ([`Scoreboard`]): one integer per player, ordered by first
//!    registration so that ties in the final standings are deterministic.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room layer (above)     ← the session owns one Roster and one Scoreboard
//!     ↕
//! Roster layer (this crate)
//!     ↕
//! Protocol layer (below) ← PlayerId, Standing
//! ```

mod entry;
mod error;
mod roster;
mod scoreboard;

pub use entry::{DisconnectedEntry, JoinRequest, PlayerEntry};
pub use error::RosterError;
pub use roster::{JoinOutcome, LeaveOutcome, Roster};
pub use scoreboard::Scoreboard;
