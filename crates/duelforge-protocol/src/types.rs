//! Core protocol types: who is playing, where, and what the room says.
//!
//! Everything in this module crosses the room boundary. Inbound actions
//! arrive as JSON objects, outbound events leave as a [`RoomEvent`]
//! (a named event plus a JSON object payload). The transport that carries
//! them is an external collaborator, so these types are the contract.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player identifier, unique within one room.
///
/// Newtype wrapper around the account id handed to us by the outer
/// application. `#[serde(transparent)]` keeps it a plain number on the
/// wire: `PlayerId(42)` serializes as `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room identifier. One room hosts exactly one session at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EventName
// ---------------------------------------------------------------------------

/// Every event a room can emit over its lifetime.
///
/// Serialized in camelCase (`"gameStateUpdate"`) because that is what
/// browser clients subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventName {
    PlayerJoined,
    PlayerLeft,
    GameStarting,
    GameStarted,
    NewRound,
    RoundEnded,
    GameStateUpdate,
    GamePaused,
    GameResumed,
    GameEnded,
}

impl EventName {
    /// The wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayerJoined => "playerJoined",
            Self::PlayerLeft => "playerLeft",
            Self::GameStarting => "gameStarting",
            Self::GameStarted => "gameStarted",
            Self::NewRound => "newRound",
            Self::RoundEnded => "roundEnded",
            Self::GameStateUpdate => "gameStateUpdate",
            Self::GamePaused => "gamePaused",
            Self::GameResumed => "gameResumed",
            Self::GameEnded => "gameEnded",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RoomEvent
// ---------------------------------------------------------------------------

/// A named event addressed to every member of one room.
///
/// The payload always carries `gameId`, `roomId` and `timestamp`
/// (milliseconds since the Unix epoch), merged with the event-specific
/// fields. Event fields win on key collisions.
///
/// ```text
/// { "roomId": 7, "name": "playerJoined",
///   "payload": { "gameId": "pong_1700000000000", "roomId": 7,
///                "timestamp": 1700000000123, "playerId": 1,
///                "playerCount": 1, "maxPlayers": 2, "reconnected": false } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEvent {
    /// The room this event belongs to.
    pub room_id: RoomId,
    /// Which event this is.
    pub name: EventName,
    /// Envelope fields merged with the event fields.
    pub payload: Map<String, Value>,
}

impl RoomEvent {
    /// Builds an event, stamping the envelope fields.
    ///
    /// `fields` is normally a JSON object. Anything else that isn't
    /// `null` lands under a `"data"` key so nothing is silently dropped.
    pub fn new(
        name: EventName,
        game_id: &str,
        room_id: RoomId,
        timestamp: u64,
        fields: Value,
    ) -> Self {
        let mut payload = Map::new();
        payload.insert("gameId".into(), Value::from(game_id));
        payload.insert("roomId".into(), Value::from(room_id.0));
        payload.insert("timestamp".into(), Value::from(timestamp));
        match fields {
            Value::Object(extra) => payload.extend(extra),
            Value::Null => {}
            other => {
                payload.insert("data".into(), other);
            }
        }
        Self {
            room_id,
            name,
            payload,
        }
    }

    /// Looks up a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Encodes the event as JSON bytes for a transport.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(ProtocolError::Encode)
    }

    /// Decodes an event previously produced by [`encode`](Self::encode).
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Standing
// ---------------------------------------------------------------------------

/// One row of the final ranking broadcast with `gameEnded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub player_id: PlayerId,
    pub score: i64,
    /// The player's attributes at the time the game ended, if they were
    /// still known to the roster.
    pub player_data: Option<Map<String, Value>>,
}

/// Milliseconds since the Unix epoch, used for every wire timestamp.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&RoomId(9)).unwrap(), "9");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    #[test]
    fn test_event_name_wire_format_matches_as_str() {
        for name in [
            EventName::PlayerJoined,
            EventName::PlayerLeft,
            EventName::GameStarting,
            EventName::GameStarted,
            EventName::NewRound,
            EventName::RoundEnded,
            EventName::GameStateUpdate,
            EventName::GamePaused,
            EventName::GameResumed,
            EventName::GameEnded,
        ] {
            let json = serde_json::to_value(name).unwrap();
            assert_eq!(json, Value::from(name.as_str()));
        }
    }

    #[test]
    fn test_room_event_stamps_envelope_fields() {
        let ev = RoomEvent::new(
            EventName::PlayerJoined,
            "pong_1",
            RoomId(5),
            1234,
            json!({ "playerId": 1, "playerCount": 1 }),
        );
        assert_eq!(ev.get("gameId"), Some(&json!("pong_1")));
        assert_eq!(ev.get("roomId"), Some(&json!(5)));
        assert_eq!(ev.get("timestamp"), Some(&json!(1234)));
        assert_eq!(ev.get("playerCount"), Some(&json!(1)));
    }

    #[test]
    fn test_room_event_fields_override_envelope() {
        let ev = RoomEvent::new(
            EventName::GameStarted,
            "g",
            RoomId(1),
            10,
            json!({ "timestamp": 99 }),
        );
        assert_eq!(ev.get("timestamp"), Some(&json!(99)));
    }

    #[test]
    fn test_room_event_non_object_fields_go_under_data() {
        let ev = RoomEvent::new(EventName::NewRound, "g", RoomId(1), 0, json!([1, 2]));
        assert_eq!(ev.get("data"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_room_event_encode_decode() {
        let ev = RoomEvent::new(EventName::GameEnded, "g", RoomId(2), 0, json!({ "reason": "time_up" }));
        let bytes = ev.encode().unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["name"], "gameEnded");
        assert_eq!(json["roomId"], 2);
        assert_eq!(RoomEvent::decode(&bytes).unwrap(), ev);
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        assert!(RoomEvent::decode(b"not json").is_err());
    }
}
