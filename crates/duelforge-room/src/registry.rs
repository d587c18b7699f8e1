//! Session registry: the registration table of engines and the map of
//! live rooms.
//!
//! The registry is built once at startup (`register` every game type),
//! then shared behind an `Arc`. Room actors hold the same map and remove
//! themselves once their session has finished; a generation number keeps
//! a stale actor from removing a newer room that reused its id.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::RwLock;

use duelforge_protocol::{ActionResult, PlayerId, RoomId};
use duelforge_roster::{JoinOutcome, JoinRequest};

use crate::room::{RoomMap, spawn_registered};
use crate::{BroadcastPort, EngineError, GameEngine, RoomError, RoomHandle, Session, SessionConfig, SessionMetadata};

/// Default command channel size for room actors.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Builds an engine for a new session.
pub type EngineFactory<E> = Arc<dyn Fn(&SessionConfig) -> Result<E, EngineError> + Send + Sync>;

/// Creates rooms by game type and routes players to them.
pub struct SessionRegistry<E: GameEngine> {
    factories: HashMap<String, EngineFactory<E>>,
    rooms: RoomMap,
    port: Arc<dyn BroadcastPort>,
    next_generation: AtomicU64,
    channel_size: usize,
}

impl<E: GameEngine> SessionRegistry<E> {
    /// An empty registry broadcasting through `port`.
    pub fn new(port: Arc<dyn BroadcastPort>) -> Self {
        Self {
            factories: HashMap::new(),
            rooms: Arc::new(RwLock::new(HashMap::new())),
            port,
            next_generation: AtomicU64::new(1),
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }

    pub fn with_channel_size(mut self, channel_size: usize) -> Self {
        self.channel_size = channel_size.max(1);
        self
    }

    /// Adds a game type to the registration table. A later registration
    /// under the same name replaces the earlier one.
    pub fn register<F>(&mut self, game_type: &str, factory: F) -> &mut Self
    where
        F: Fn(&SessionConfig) -> Result<E, EngineError> + Send + Sync + 'static,
    {
        self.factories.insert(game_type.to_owned(), Arc::new(factory));
        self
    }

    pub fn is_registered(&self, game_type: &str) -> bool {
        self.factories.contains_key(game_type)
    }

    /// Registered game types, sorted.
    pub fn game_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    // -----------------------------------------------------------------
    // Room lifecycle
    // -----------------------------------------------------------------

    /// Builds the engine, spawns the room actor and stores its handle
    /// under `config.room_id`.
    ///
    /// # Errors
    /// - [`RoomError::UnknownGameType`] for an unregistered game type.
    /// - [`RoomError::AlreadyExists`] if the room id is taken.
    /// - [`RoomError::InvalidConfig`] if the engine rejects the options.
    pub async fn create(&self, game_type: &str, config: SessionConfig) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&config.room_id) {
            return Err(RoomError::AlreadyExists(config.room_id));
        }
        self.spawn_locked(&mut rooms, game_type, config)
    }

    /// Returns the live room under `config.room_id`, or creates it.
    pub async fn get_or_create(&self, game_type: &str, config: SessionConfig) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.rooms.write().await;
        if let Some(handle) = rooms.get(&config.room_id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
        }
        self.spawn_locked(&mut rooms, game_type, config)
    }

    fn spawn_locked(
        &self,
        rooms: &mut HashMap<RoomId, RoomHandle>,
        game_type: &str,
        config: SessionConfig,
    ) -> Result<RoomHandle, RoomError> {
        let factory = self
            .factories
            .get(game_type)
            .ok_or_else(|| RoomError::UnknownGameType(game_type.to_owned()))?;
        let room_id = config.room_id;
        let engine = factory(&config).map_err(|e| RoomError::InvalidConfig(e.to_string()))?;

        let session = Session::new(config, engine);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let handle = spawn_registered(
            session,
            Arc::clone(&self.port),
            self.channel_size,
            Some(Arc::clone(&self.rooms)),
            generation,
        );
        rooms.insert(room_id, handle.clone());
        tracing::info!(%room_id, game_type, "room created");
        Ok(handle)
    }

    /// The live handle for a room.
    pub async fn get(&self, room_id: RoomId) -> Option<RoomHandle> {
        self.rooms.read().await.get(&room_id).cloned()
    }

    /// Unregisters a room and closes it. Returns `false` if it was unknown.
    pub async fn remove(&self, room_id: RoomId) -> bool {
        let handle = self.rooms.write().await.remove(&room_id);
        match handle {
            Some(handle) => {
                let _ = handle.close().await;
                tracing::info!(%room_id, "room removed");
                true
            }
            None => false,
        }
    }

    pub async fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = self.rooms.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Metadata of every live room, ordered by room id. Rooms that stop
    /// while being queried are skipped.
    pub async fn list(&self) -> Vec<SessionMetadata> {
        let mut handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();
        handles.sort_by_key(RoomHandle::room_id);
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(meta) = handle.metadata().await {
                out.push(meta);
            }
        }
        out
    }

    /// Closes every room.
    pub async fn shutdown(&self) {
        let handles: Vec<RoomHandle> = self.rooms.write().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.close().await;
        }
        tracing::info!("registry shut down");
    }

    // -----------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------

    async fn route(&self, room_id: RoomId, what: &'static str) -> Result<RoomHandle, RoomError> {
        match self.get(room_id).await {
            Some(handle) => Ok(handle),
            None => {
                tracing::warn!(%room_id, what, "no such room");
                Err(RoomError::NotFound(room_id))
            }
        }
    }

    pub async fn join(&self, room_id: RoomId, player: PlayerId, request: JoinRequest) -> Result<JoinOutcome, RoomError> {
        self.route(room_id, "join").await?.join(player, request).await
    }

    pub async fn leave(&self, room_id: RoomId, player: PlayerId, temporary: bool) -> Result<bool, RoomError> {
        self.route(room_id, "leave").await?.leave(player, temporary).await
    }

    pub async fn route_action(&self, room_id: RoomId, player: PlayerId, action: Value) -> Result<ActionResult, RoomError> {
        self.route(room_id, "action").await?.action(player, action).await
    }

    pub async fn pause(&self, room_id: RoomId) -> Result<(), RoomError> {
        self.route(room_id, "pause").await?.pause().await
    }

    pub async fn resume(&self, room_id: RoomId) -> Result<(), RoomError> {
        self.route(room_id, "resume").await?.resume().await
    }

    pub async fn metadata(&self, room_id: RoomId) -> Result<SessionMetadata, RoomError> {
        self.route(room_id, "metadata").await?.metadata().await
    }

    /// Finishes a room's game with `room_closed`. The actor unregisters
    /// itself afterwards.
    pub async fn close(&self, room_id: RoomId) -> Result<bool, RoomError> {
        self.route(room_id, "close").await?.close().await
    }
}
