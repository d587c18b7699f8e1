//! Room actor: an isolated Tokio task that owns one [`Session`].
//!
//! Each room runs in its own task and talks to the outside world through
//! a bounded mpsc channel. Commands, timer firings and ticks are all
//! handled inside one `select!` loop, so no two mutations of a room ever
//! interleave. After every step the session's outbox is flushed to the
//! broadcast port, which keeps the events of a room in order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::{self, MissedTickBehavior};

use duelforge_protocol::{ActionResult, PlayerId, RoomId};
use duelforge_roster::{JoinOutcome, JoinRequest};

use crate::session::reason;
use crate::{BroadcastPort, GameEngine, RoomError, Session, SessionMetadata};

/// Shared map of live rooms. Actors remove their own entry on exit.
pub(crate) type RoomMap = Arc<RwLock<HashMap<RoomId, RoomHandle>>>;

/// Commands sent to a room actor through its channel.
///
/// Variants with a `reply` are request/response; the caller awaits the
/// oneshot.
pub(crate) enum RoomCommand {
    Join {
        player: PlayerId,
        request: JoinRequest,
        reply: oneshot::Sender<Result<JoinOutcome, RoomError>>,
    },
    Leave {
        player: PlayerId,
        temporary: bool,
        reply: oneshot::Sender<bool>,
    },
    Action {
        player: PlayerId,
        action: Value,
        reply: oneshot::Sender<ActionResult>,
    },
    Pause {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Resume {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Metadata {
        reply: oneshot::Sender<SessionMetadata>,
    },
    Close {
        reply: oneshot::Sender<bool>,
    },
}

/// Handle to a running room actor.
///
/// Cheap to clone: an `mpsc::Sender` plus a few ids. The handle is not
/// generic over the engine, so transports can hold rooms of every game
/// type side by side.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    room_id: RoomId,
    game_type: &'static str,
    /// Distinguishes this room from a later room reusing the same id.
    generation: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn game_type(&self) -> &'static str {
        self.game_type
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Adds, reconnects or refreshes a player.
    pub async fn join(&self, player: PlayerId, request: JoinRequest) -> Result<JoinOutcome, RoomError> {
        self.request(|reply| RoomCommand::Join {
            player,
            request,
            reply,
        })
        .await?
    }

    /// Removes a player. `Ok(false)` if they were not in the room.
    pub async fn leave(&self, player: PlayerId, temporary: bool) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::Leave {
            player,
            temporary,
            reply,
        })
        .await
    }

    /// Routes a player action and returns the engine's verdict.
    pub async fn action(&self, player: PlayerId, action: Value) -> Result<ActionResult, RoomError> {
        self.request(|reply| RoomCommand::Action {
            player,
            action,
            reply,
        })
        .await
    }

    pub async fn pause(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Pause { reply }).await?
    }

    pub async fn resume(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Resume { reply }).await?
    }

    pub async fn metadata(&self) -> Result<SessionMetadata, RoomError> {
        self.request(|reply| RoomCommand::Metadata { reply }).await
    }

    /// Finishes the game with `room_closed` and stops the actor.
    ///
    /// `Ok(false)` if the game had already finished.
    pub async fn close(&self) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::Close { reply }).await
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<E> {
    session: Session<E>,
    receiver: mpsc::Receiver<RoomCommand>,
    port: Arc<dyn BroadcastPort>,
    rooms: Option<RoomMap>,
    generation: u64,
}

impl<E: GameEngine> RoomActor<E> {
    async fn run(mut self) {
        let room_id = self.session.room_id();
        tracing::info!(%room_id, game_id = self.session.game_id(), "room actor started");

        let grace = self.session.config().reconnect_grace();
        let sweep_every = (grace / 2).max(Duration::from_secs(1));
        let mut sweep = time::interval_at(time::Instant::now() + sweep_every, sweep_every);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.flush();
        while !self.session.is_finished() {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => {
                        tracing::info!(%room_id, "all handles dropped, closing room");
                        self.session.finish(reason::ROOM_CLOSED);
                    }
                },
                wakeup = self.session.next_wakeup() => self.session.on_wakeup(wakeup),
                _ = sweep.tick() => {
                    let expired = self.session.expire_disconnected();
                    if !expired.is_empty() {
                        tracing::debug!(%room_id, count = expired.len(), "expired disconnected players");
                    }
                }
            }
            self.flush();
        }

        if let Some(rooms) = self.rooms.take() {
            unregister(rooms, room_id, self.generation).await;
        }
        // Commands that raced the finish get a definite answer.
        self.receiver.close();
        while let Ok(cmd) = self.receiver.try_recv() {
            self.handle(cmd);
        }
        self.flush();
        tracing::info!(%room_id, reason = self.session.finish_reason().unwrap_or(""), "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player,
                request,
                reply,
            } => {
                let _ = reply.send(self.session.join(player, request));
            }
            RoomCommand::Leave {
                player,
                temporary,
                reply,
            } => {
                let _ = reply.send(self.session.leave(player, temporary));
            }
            RoomCommand::Action {
                player,
                action,
                reply,
            } => {
                let _ = reply.send(self.session.handle_action(player, action));
            }
            RoomCommand::Pause { reply } => {
                let _ = reply.send(self.session.pause());
            }
            RoomCommand::Resume { reply } => {
                let _ = reply.send(self.session.resume());
            }
            RoomCommand::Metadata { reply } => {
                let _ = reply.send(self.session.metadata());
            }
            RoomCommand::Close { reply } => {
                let _ = reply.send(self.session.finish(reason::ROOM_CLOSED));
            }
        }
    }

    fn flush(&mut self) {
        for event in self.session.drain_events() {
            self.port.broadcast(event);
        }
    }
}

/// Removes a room from the registry, unless the id already belongs to a
/// newer room.
async fn unregister(rooms: RoomMap, room_id: RoomId, generation: u64) {
    let mut map = rooms.write().await;
    if map.get(&room_id).map(RoomHandle::generation) == Some(generation) {
        map.remove(&room_id);
        tracing::debug!(%room_id, "room unregistered");
    }
}

/// Spawns a room actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_room<E: GameEngine>(
    session: Session<E>,
    port: Arc<dyn BroadcastPort>,
    channel_size: usize,
) -> RoomHandle {
    spawn_registered(session, port, channel_size, None, 0)
}

pub(crate) fn spawn_registered<E: GameEngine>(
    session: Session<E>,
    port: Arc<dyn BroadcastPort>,
    channel_size: usize,
    rooms: Option<RoomMap>,
    generation: u64,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let handle = RoomHandle {
        room_id: session.room_id(),
        game_type: session.engine().game_type(),
        generation,
        sender: tx,
    };
    let actor = RoomActor {
        session,
        receiver: rx,
        port,
        rooms,
        generation,
    };
    tokio::spawn(actor.run());
    handle
}
