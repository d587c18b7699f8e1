//! The roster: active players in join order plus a disconnected side-table.
//!
//! ```text
//!            join()                      leave(temporary)
//!  (absent) ───────→ [Active] ────────────────────────→ [Disconnected]
//!                      ↑  │                                   │
//!                      │  │ leave(permanent)                  │ join() merges
//!                      │  ▼                                   │ stored attributes
//!                      │ (absent) ←── expire_disconnected() ──┤
//!                      └──────────────────────────────────────┘
//! ```
//!
//! The roster is plain data owned by one session; it does no locking and
//! emits no events. The session decides what each outcome means.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use duelforge_protocol::PlayerId;

use crate::{DisconnectedEntry, JoinRequest, PlayerEntry, RosterError};

/// How a successful [`Roster::join`] was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A first-time member.
    New,
    /// A disconnected member came back; their stored attributes were merged.
    Reconnected,
    /// The player was already active; their entry was refreshed in place.
    Refreshed,
}

impl JoinOutcome {
    /// Whether the join changed the number of active players.
    pub fn added_player(self) -> bool {
        !matches!(self, Self::Refreshed)
    }
}

/// How a [`Roster::leave`] was resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    /// The player moved to the disconnected table.
    Disconnected,
    /// The player is gone for good.
    Removed(PlayerEntry),
}

/// Active players of one room, capped at `max_players`.
#[derive(Debug, Clone)]
pub struct Roster {
    /// Join order matters: engines assign seats (X/O, left/right paddle)
    /// by position.
    active: Vec<PlayerEntry>,
    disconnected: Vec<(PlayerId, DisconnectedEntry)>,
    max_players: usize,
}

impl Roster {
    pub fn new(max_players: usize) -> Self {
        Self {
            active: Vec::with_capacity(max_players),
            disconnected: Vec::new(),
            max_players,
        }
    }

    /// Adds or restores a player.
    ///
    /// An already-active player is refreshed without a capacity check.
    /// Everyone else needs a free seat.
    ///
    /// # Errors
    /// [`RosterError::RoomFull`] when every seat is taken.
    pub fn join(
        &mut self,
        player_id: PlayerId,
        request: JoinRequest,
        now_ms: u64,
    ) -> Result<JoinOutcome, RosterError> {
        if let Some(entry) = self.active.iter_mut().find(|e| e.player_id == player_id) {
            entry.merge(request);
            debug!(%player_id, "active player rejoined, entry refreshed");
            return Ok(JoinOutcome::Refreshed);
        }

        if self.active.len() >= self.max_players {
            return Err(RosterError::RoomFull {
                max_players: self.max_players,
            });
        }

        if let Some(pos) = self.disconnected.iter().position(|(id, _)| *id == player_id) {
            let (_, stored) = self.disconnected.remove(pos);
            let mut entry = stored.entry;
            entry.merge(request);
            self.active.push(entry);
            info!(%player_id, "player reconnected");
            return Ok(JoinOutcome::Reconnected);
        }

        self.active.push(PlayerEntry {
            player_id,
            joined_at: now_ms,
            socket_ref: request.socket_ref,
            attributes: request.attributes,
        });
        Ok(JoinOutcome::New)
    }

    /// Removes an active player, temporarily or for good.
    ///
    /// Returns `None` if the player is not active; nothing changes.
    pub fn leave(
        &mut self,
        player_id: PlayerId,
        temporary: bool,
        now_ms: u64,
    ) -> Option<LeaveOutcome> {
        let pos = self.active.iter().position(|e| e.player_id == player_id)?;
        let entry = self.active.remove(pos);
        if temporary {
            self.disconnected.push((
                player_id,
                DisconnectedEntry {
                    entry,
                    disconnected_at: now_ms,
                    since: Instant::now(),
                },
            ));
            Some(LeaveOutcome::Disconnected)
        } else {
            Some(LeaveOutcome::Removed(entry))
        }
    }

    /// Drops disconnected entries older than `grace` and returns their ids.
    pub fn expire_disconnected(&mut self, grace: Duration) -> Vec<PlayerId> {
        let mut expired = Vec::new();
        self.disconnected.retain(|(id, d)| {
            if d.since.elapsed() >= grace {
                expired.push(*id);
                false
            } else {
                true
            }
        });
        for player_id in &expired {
            info!(%player_id, "reconnect grace elapsed, player removed");
        }
        expired
    }

    /// Forgets a disconnected player without waiting for the grace period.
    pub fn forget_disconnected(&mut self, player_id: PlayerId) -> Result<DisconnectedEntry, RosterError> {
        let pos = self
            .disconnected
            .iter()
            .position(|(id, _)| *id == player_id)
            .ok_or(RosterError::NotInRoster(player_id))?;
        Ok(self.disconnected.remove(pos).1)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.active.iter().any(|e| e.player_id == player_id)
    }

    pub fn is_disconnected(&self, player_id: PlayerId) -> bool {
        self.disconnected.iter().any(|(id, _)| *id == player_id)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&PlayerEntry> {
        self.active.iter().find(|e| e.player_id == player_id)
    }

    pub fn disconnected(&self, player_id: PlayerId) -> Option<&DisconnectedEntry> {
        self.disconnected
            .iter()
            .find(|(id, _)| *id == player_id)
            .map(|(_, d)| d)
    }

    /// Active players in join order.
    pub fn entries(&self) -> &[PlayerEntry] {
        &self.active
    }

    /// Active player ids in join order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.active.iter().map(|e| e.player_id).collect()
    }

    /// Attributes of an active or disconnected player.
    pub fn attributes(&self, player_id: PlayerId) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.get(player_id)
            .or_else(|| self.disconnected(player_id).map(|d| &d.entry))
            .map(|e| &e.attributes)
    }

    /// Number of active players.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn disconnected_len(&self) -> usize {
        self.disconnected.len()
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub fn is_full(&self) -> bool {
        self.active.len() >= self.max_players
    }

    /// Empties both tables.
    pub fn clear(&mut self) {
        self.active.clear();
        self.disconnected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn named(name: &str) -> JoinRequest {
        JoinRequest::new().attr("name", name)
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[test]
    fn test_join_new_players_keep_join_order() {
        let mut roster = Roster::new(4);
        for id in [3, 1, 2] {
            assert_eq!(roster.join(pid(id), JoinRequest::new(), 0), Ok(JoinOutcome::New));
        }
        assert_eq!(roster.player_ids(), vec![pid(3), pid(1), pid(2)]);
    }

    #[test]
    fn test_join_full_roster_is_rejected() {
        let mut roster = Roster::new(2);
        roster.join(pid(1), JoinRequest::new(), 0).unwrap();
        roster.join(pid(2), JoinRequest::new(), 0).unwrap();

        let err = roster.join(pid(3), JoinRequest::new(), 0).unwrap_err();
        assert_eq!(err, RosterError::RoomFull { max_players: 2 });
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_join_active_player_refreshes_without_capacity_check() {
        let mut roster = Roster::new(2);
        roster.join(pid(1), named("ann"), 10).unwrap();
        roster.join(pid(2), JoinRequest::new(), 20).unwrap();

        let outcome = roster.join(pid(1), JoinRequest::new().attr("skin", "red"), 30);
        assert_eq!(outcome, Ok(JoinOutcome::Refreshed));
        assert!(!JoinOutcome::Refreshed.added_player());

        let entry = roster.get(pid(1)).unwrap();
        assert_eq!(entry.joined_at, 10);
        assert_eq!(entry.attributes.get("name"), Some(&json!("ann")));
        assert_eq!(entry.attributes.get("skin"), Some(&json!("red")));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_join_after_temporary_leave_merges_attributes() {
        let mut roster = Roster::new(2);
        roster
            .join(pid(1), named("ann").attr("level", 3).socket("s-1"), 10)
            .unwrap();
        roster.leave(pid(1), true, 50);

        let outcome = roster.join(pid(1), JoinRequest::new().attr("level", 4).socket("s-2"), 90);
        assert_eq!(outcome, Ok(JoinOutcome::Reconnected));

        let entry = roster.get(pid(1)).unwrap();
        assert_eq!(entry.joined_at, 10, "original join time survives a reconnect");
        assert_eq!(entry.socket_ref.as_deref(), Some("s-2"));
        assert_eq!(entry.attributes.get("name"), Some(&json!("ann")));
        assert_eq!(entry.attributes.get("level"), Some(&json!(4)));
        assert!(!roster.is_disconnected(pid(1)));
    }

    #[test]
    fn test_reconnect_still_needs_a_free_seat() {
        let mut roster = Roster::new(2);
        roster.join(pid(1), JoinRequest::new(), 0).unwrap();
        roster.join(pid(2), JoinRequest::new(), 0).unwrap();
        roster.leave(pid(1), true, 0);
        roster.join(pid(3), JoinRequest::new(), 0).unwrap();

        let err = roster.join(pid(1), JoinRequest::new(), 0).unwrap_err();
        assert!(matches!(err, RosterError::RoomFull { .. }));
        assert!(roster.is_disconnected(pid(1)));
    }

    // =====================================================================
    // leave()
    // =====================================================================

    #[test]
    fn test_leave_unknown_player_is_none() {
        let mut roster = Roster::new(2);
        assert_eq!(roster.leave(pid(9), false, 0), None);
        assert_eq!(roster.leave(pid(9), true, 0), None);
        assert_eq!(roster.disconnected_len(), 0);
    }

    #[test]
    fn test_leave_temporary_moves_to_disconnected() {
        let mut roster = Roster::new(2);
        roster.join(pid(1), named("ann"), 0).unwrap();

        assert_eq!(roster.leave(pid(1), true, 77), Some(LeaveOutcome::Disconnected));
        assert!(!roster.contains(pid(1)));
        let d = roster.disconnected(pid(1)).unwrap();
        assert_eq!(d.disconnected_at, 77);
        assert_eq!(roster.attributes(pid(1)).and_then(|a| a.get("name")), Some(&json!("ann")));
    }

    #[test]
    fn test_leave_permanent_returns_entry() {
        let mut roster = Roster::new(2);
        roster.join(pid(1), JoinRequest::new(), 5).unwrap();
        match roster.leave(pid(1), false, 0) {
            Some(LeaveOutcome::Removed(entry)) => assert_eq!(entry.joined_at, 5),
            other => panic!("expected Removed, got {other:?}"),
        }
        assert!(roster.attributes(pid(1)).is_none());
    }

    // =====================================================================
    // expire_disconnected()
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_expire_respects_grace_period() {
        let mut roster = Roster::new(4);
        roster.join(pid(1), JoinRequest::new(), 0).unwrap();
        roster.join(pid(2), JoinRequest::new(), 0).unwrap();
        roster.leave(pid(1), true, 0);
        tokio::time::advance(Duration::from_secs(20)).await;
        roster.leave(pid(2), true, 0);

        let grace = Duration::from_secs(30);
        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(roster.expire_disconnected(grace), vec![pid(1)]);
        assert!(roster.is_disconnected(pid(2)));

        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(roster.expire_disconnected(grace), vec![pid(2)]);
        assert_eq!(roster.disconnected_len(), 0);
    }

    #[test]
    fn test_forget_disconnected() {
        let mut roster = Roster::new(2);
        roster.join(pid(1), JoinRequest::new(), 0).unwrap();
        roster.leave(pid(1), true, 0);

        assert!(roster.forget_disconnected(pid(1)).is_ok());
        assert_eq!(
            roster.forget_disconnected(pid(1)).unwrap_err(),
            RosterError::NotInRoster(pid(1))
        );
    }

    #[test]
    fn test_clear_empties_both_tables() {
        let mut roster = Roster::new(2);
        roster.join(pid(1), JoinRequest::new(), 0).unwrap();
        roster.join(pid(2), JoinRequest::new(), 0).unwrap();
        roster.leave(pid(2), true, 0);

        roster.clear();
        assert!(roster.is_empty());
        assert_eq!(roster.disconnected_len(), 0);
    }
}
