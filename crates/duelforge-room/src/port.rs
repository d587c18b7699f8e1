//! The outbound side of a room: where its events go.
//!
//! Rooms never talk to sockets. Each room actor hands its events, in
//! order, to a [`BroadcastPort`]; the transport decides how to reach the
//! members of the room.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use duelforge_protocol::{RoomEvent, RoomId};

/// Delivers room events to the members of a room.
///
/// Implementations must be cheap and non-blocking: the room actor calls
/// `broadcast` inline, between two state transitions.
pub trait BroadcastPort: Send + Sync + 'static {
    fn broadcast(&self, event: RoomEvent);
}

impl<P: BroadcastPort + ?Sized> BroadcastPort for Arc<P> {
    fn broadcast(&self, event: RoomEvent) {
        (**self).broadcast(event);
    }
}

/// Unbounded channels never drop events, which makes them handy for tests
/// and single-consumer transports.
impl BroadcastPort for mpsc::UnboundedSender<RoomEvent> {
    fn broadcast(&self, event: RoomEvent) {
        // A closed receiver means nobody is listening anymore.
        let _ = self.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPort;

impl BroadcastPort for NullPort {
    fn broadcast(&self, _event: RoomEvent) {}
}

/// Capacity of the fanout channel. Receivers that fall further behind
/// skip events (`RecvError::Lagged`).
const FANOUT_CAPACITY: usize = 4096;

/// In-process fanout over a single `tokio::sync::broadcast` channel.
///
/// Every subscriber sees the events of every room and filters locally,
/// which is plenty for a handful of rooms per process.
#[derive(Debug, Clone)]
pub struct RoomFanout {
    sender: broadcast::Sender<Arc<RoomEvent>>,
}

impl Default for RoomFanout {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomFanout {
    pub fn new() -> Self {
        Self::with_capacity(FANOUT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receives events of every room.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RoomEvent>> {
        self.sender.subscribe()
    }

    /// Receives the events of one room only.
    pub fn subscribe_room(&self, room_id: RoomId) -> RoomSubscription {
        RoomSubscription {
            room_id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl BroadcastPort for RoomFanout {
    fn broadcast(&self, event: RoomEvent) {
        // send() only fails when there are no subscribers.
        let _ = self.sender.send(Arc::new(event));
    }
}

/// A fanout receiver filtered to one room.
#[derive(Debug)]
pub struct RoomSubscription {
    room_id: RoomId,
    receiver: broadcast::Receiver<Arc<RoomEvent>>,
}

impl RoomSubscription {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Next event of this room. `None` once the fanout is gone.
    ///
    /// Lagging is logged and skipped over.
    pub async fn recv(&mut self) -> Option<Arc<RoomEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.room_id == self.room_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(room_id = %self.room_id, skipped, "room subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
