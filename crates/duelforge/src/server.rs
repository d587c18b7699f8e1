//! `GameServer`: the inbound side of Duelforge.
//!
//! The transport (not part of this crate) forwards three kinds of player
//! events here: join requests, leaves and actions. The server creates
//! rooms on demand through the [`GameDirectory`], routes each event to
//! the room actor, and publishes every room event on one fanout the
//! transport subscribes to.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::broadcast;

use duelforge_games::{register_builtin, AnyEngine};
use duelforge_protocol::{ActionResult, PlayerId, RoomEvent, RoomId};
use duelforge_roster::{JoinOutcome, JoinRequest};
use duelforge_room::{
    RoomError, RoomFanout, RoomHandle, RoomSubscription, SessionConfig, SessionMetadata, SessionRegistry,
};

use crate::{DuelforgeError, GameDirectory, Settings};

pub struct GameServer {
    registry: SessionRegistry<AnyEngine>,
    fanout: RoomFanout,
    directory: Arc<dyn GameDirectory>,
    settings: Settings,
}

impl GameServer {
    /// A server hosting every built-in game.
    pub fn new(settings: Settings, directory: impl GameDirectory) -> Self {
        let fanout = RoomFanout::with_capacity(settings.fanout_capacity);
        let mut registry =
            SessionRegistry::new(Arc::new(fanout.clone())).with_channel_size(settings.room_channel_size);
        register_builtin(&mut registry);
        tracing::info!(game_types = ?registry.game_types(), "game server ready");
        Self {
            registry,
            fanout,
            directory: Arc::new(directory),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &SessionRegistry<AnyEngine> {
        &self.registry
    }

    /// Events of every room.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RoomEvent>> {
        self.fanout.subscribe()
    }

    pub fn subscribe_room(&self, room_id: RoomId) -> RoomSubscription {
        self.fanout.subscribe_room(room_id)
    }

    /// Creates a room explicitly, bypassing the directory.
    pub async fn create_room(&self, game_type: &str, config: SessionConfig) -> Result<RoomHandle, DuelforgeError> {
        Ok(self.registry.create(game_type, config).await?)
    }

    /// Seats a player, creating the room first if it does not exist.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if the directory does not know the room.
    /// - [`RoomError::RoomFull`] if the room is at capacity.
    /// - [`RoomError::UnknownGameType`] if the directory names a game
    ///   nobody registered.
    pub async fn on_player_join_request(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        attributes: Map<String, Value>,
    ) -> Result<JoinOutcome, DuelforgeError> {
        let handle = match self.registry.get(room_id).await {
            Some(handle) if !handle.is_closed() => handle,
            _ => self.open_room(room_id).await?,
        };
        let request = JoinRequest {
            attributes,
            ..JoinRequest::default()
        };
        let outcome = handle.join(player_id, request).await.inspect_err(|err| {
            tracing::debug!(%room_id, %player_id, %err, "join refused");
        })?;
        Ok(outcome)
    }

    async fn open_room(&self, room_id: RoomId) -> Result<RoomHandle, DuelforgeError> {
        let Some(game_type) = self.directory.resolve_game_type(room_id) else {
            tracing::warn!(%room_id, "join request for a room the directory does not know");
            return Err(RoomError::NotFound(room_id).into());
        };
        let mut config = self.settings.session.config_for(room_id);
        config.options = self.directory.room_options(room_id);
        Ok(self.registry.get_or_create(&game_type, config).await?)
    }

    /// Removes a player. `temporary` keeps their data for a reconnect.
    pub async fn on_player_leave(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        temporary: bool,
    ) -> Result<bool, DuelforgeError> {
        Ok(self.registry.leave(room_id, player_id, temporary).await?)
    }

    /// Routes one action. Rule violations come back as an invalid
    /// [`ActionResult`], not as an error.
    pub async fn on_action(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        action: Value,
    ) -> Result<ActionResult, DuelforgeError> {
        Ok(self.registry.route_action(room_id, player_id, action).await?)
    }

    pub async fn rooms(&self) -> Vec<SessionMetadata> {
        self.registry.list().await
    }

    /// Closes every room.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}
