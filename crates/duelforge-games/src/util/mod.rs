//! Helpers shared by several engines.

pub mod grid;
pub mod physics;

use duelforge_protocol::{decode_action, ActionResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use grid::{flood_fill, neighbors8, wrap, Flood, Grid};
pub use physics::Aabb;

/// Decodes an engine's action enum. A payload that does not decode comes
/// back as the rejection to return.
pub(crate) fn parse_action<A: DeserializeOwned>(action: &Value) -> Result<A, ActionResult> {
    decode_action(action).map_err(|_| ActionResult::rejected("Unknown action type"))
}
