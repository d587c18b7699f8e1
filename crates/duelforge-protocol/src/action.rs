//! Action payloads and the structured result every action produces.
//!
//! Players send actions as JSON objects tagged by `"type"`:
//!
//! ```text
//! { "type": "move", "direction": "up" }
//! { "type": "revealCell", "row": 3, "col": 4 }
//! ```
//!
//! Each engine declares its own action enum and decodes into it with
//! [`decode_action`]. A payload that fails to decode is a rejected action,
//! not an error that crosses the room boundary.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

/// The outcome of one player action.
///
/// Serializes as `{ "valid": true, ...details }` or
/// `{ "valid": false, "reason": "Not your turn" }`. `reason` explains a
/// rule rejection; `error` is reserved for failures of the room itself
/// (game not active, engine fault).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Engine-specific extras (`correct`, `gameWon`, `linesCleared`, ...).
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ActionResult {
    /// An accepted action with no extra details.
    pub fn accepted() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// A rule rejection. The engine did not change any state.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// A failure outside the game rules (inactive room, engine fault).
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Adds a detail field, builder style.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_owned(), value.into());
        self
    }

    /// Reads a detail field.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    /// Reads a boolean detail; missing or non-boolean means `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.details
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Decodes a raw action payload into an engine's action type.
pub fn decode_action<A: DeserializeOwned>(action: &Value) -> Result<A, ProtocolError> {
    A::deserialize(action).map_err(ProtocolError::Decode)
}
