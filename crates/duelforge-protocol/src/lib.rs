//! Protocol types for Duelforge.
//!
//! This crate defines the data that crosses a room's boundary:
//!
//! - **Identities** ([`PlayerId`], [`RoomId`]).
//! - **Events** ([`EventName`], [`RoomEvent`], [`Standing`]): what a room
//!   broadcasts to its members.
//! - **Actions** ([`ActionResult`], [`decode_action`]): what players send
//!   and what they get back.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about sessions, timers or transports.
//!
//! ```text
//! Transport (external) → Protocol (RoomEvent / action JSON) → Room (Session)
//! ```

mod action;
mod error;
mod types;

pub use action::{decode_action, ActionResult};
pub use error::ProtocolError;
pub use types::{now_millis, EventName, PlayerId, RoomEvent, RoomId, Standing};
