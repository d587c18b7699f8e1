//! Roster entries: who is in the room and what we know about them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::time::Instant;

use duelforge_protocol::PlayerId;

/// What the transport hands us when a player asks to join.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Opaque handle of the player's connection, if the transport has one.
    #[serde(default)]
    pub socket_ref: Option<String>,
    /// Arbitrary player data (display name, avatar, ...).
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl JoinRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one attribute, builder style.
    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_owned(), value.into());
        self
    }

    pub fn socket(mut self, socket_ref: impl Into<String>) -> Self {
        self.socket_ref = Some(socket_ref.into());
        self
    }
}

/// An active member of the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    pub player_id: PlayerId,
    /// Wall-clock join time in ms since the Unix epoch. Kept across
    /// reconnects.
    pub joined_at: u64,
    pub socket_ref: Option<String>,
    pub attributes: Map<String, Value>,
}

impl PlayerEntry {
    /// Overlays `incoming` onto this entry. Incoming keys win.
    pub(crate) fn merge(&mut self, incoming: JoinRequest) {
        if incoming.socket_ref.is_some() {
            self.socket_ref = incoming.socket_ref;
        }
        self.attributes.extend(incoming.attributes);
    }
}

/// A player who dropped temporarily and may come back.
#[derive(Debug, Clone, PartialEq)]
pub struct DisconnectedEntry {
    pub entry: PlayerEntry,
    /// Wall-clock disconnect time in ms since the Unix epoch.
    pub disconnected_at: u64,
    /// Monotonic disconnect time, used for the reconnect grace period.
    pub since: Instant,
}
