//! Room-to-game lookups.
//!
//! Rooms are created on demand: the first join request for a room asks
//! the directory which game it hosts.

use std::collections::HashMap;

use serde_json::{Map, Value};

use duelforge_protocol::RoomId;

/// Tells the server which game a room hosts.
pub trait GameDirectory: Send + Sync + 'static {
    fn resolve_game_type(&self, room_id: RoomId) -> Option<String>;

    /// Engine options for a newly created room.
    fn room_options(&self, _room_id: RoomId) -> Map<String, Value> {
        Map::new()
    }
}

#[derive(Debug, Clone, Default)]
struct RoomEntry {
    game_type: String,
    options: Map<String, Value>,
}

/// A fixed, in-memory directory.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    rooms: HashMap<RoomId, RoomEntry>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room(mut self, room_id: RoomId, game_type: &str) -> Self {
        self.insert(room_id, game_type, Map::new());
        self
    }

    pub fn with_room_options(mut self, room_id: RoomId, game_type: &str, options: Map<String, Value>) -> Self {
        self.insert(room_id, game_type, options);
        self
    }

    pub fn insert(&mut self, room_id: RoomId, game_type: &str, options: Map<String, Value>) {
        self.rooms.insert(
            room_id,
            RoomEntry {
                game_type: game_type.to_owned(),
                options,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl GameDirectory for StaticDirectory {
    fn resolve_game_type(&self, room_id: RoomId) -> Option<String> {
        self.rooms.get(&room_id).map(|e| e.game_type.clone())
    }

    fn room_options(&self, room_id: RoomId) -> Map<String, Value> {
        self.rooms
            .get(&room_id)
            .map(|e| e.options.clone())
            .unwrap_or_default()
    }
}
