//! Error types for the protocol layer.
//!
//! Each crate in Duelforge defines its own error enum. A `ProtocolError`
//! always means the problem is in the shape of data crossing the room
//! boundary (an action payload or an event), never in room state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into JSON).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning JSON into a Rust type).
    ///
    /// Common causes: a missing `"type"` tag, an unknown action type,
    /// or fields of the wrong kind (a string where a row index belongs).
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is invalid at the protocol level even though it
    /// parsed, e.g. an event payload that is not a JSON object.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
