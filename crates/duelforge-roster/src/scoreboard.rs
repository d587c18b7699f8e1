//! Per-room scores, ordered by first registration.

use serde_json::{Map, Value};

use duelforge_protocol::{PlayerId, Standing};

use crate::Roster;

/// Score per player, in the order players were first registered.
///
/// The order is the tie-break for standings, so it never changes for a
/// player that stays registered.
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    scores: Vec<(PlayerId, i64)>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a player at 0. Existing entries are left alone.
    pub fn register(&mut self, player_id: PlayerId) {
        if self.position(player_id).is_none() {
            self.scores.push((player_id, 0));
        }
    }

    /// Sets a score, registering the player if needed.
    pub fn set(&mut self, player_id: PlayerId, score: i64) {
        match self.position(player_id) {
            Some(pos) => self.scores[pos].1 = score,
            None => self.scores.push((player_id, score)),
        }
    }

    pub fn get(&self, player_id: PlayerId) -> Option<i64> {
        self.position(player_id).map(|pos| self.scores[pos].1)
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.position(player_id).is_some()
    }

    /// Deletes a player's score. Returns the removed value.
    pub fn remove(&mut self, player_id: PlayerId) -> Option<i64> {
        let pos = self.position(player_id)?;
        Some(self.scores.remove(pos).1)
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// `(player, score)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, i64)> + '_ {
        self.scores.iter().copied()
    }

    /// Scores as a JSON object keyed by player id, for broadcasts.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .scores
            .iter()
            .map(|(id, score)| (id.0.to_string(), Value::from(*score)))
            .collect();
        Value::Object(map)
    }

    /// Final ranking: score descending, ties in registration order.
    ///
    /// Player data comes from the roster (active or disconnected).
    pub fn standings(&self, roster: &Roster) -> Vec<Standing> {
        let mut ranked: Vec<(PlayerId, i64)> = self.scores.clone();
        // sort_by is stable, so equal scores keep registration order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .map(|(player_id, score)| Standing {
                player_id,
                score,
                player_data: roster.attributes(player_id).cloned(),
            })
            .collect()
    }

    fn position(&self, player_id: PlayerId) -> Option<usize> {
        self.scores.iter().position(|(id, _)| *id == player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JoinRequest;
    use serde_json::json;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut board = Scoreboard::new();
        board.register(pid(1));
        board.set(pid(1), 5);
        board.register(pid(1));
        assert_eq!(board.get(pid(1)), Some(5));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_standings_sort_descending_with_stable_ties() {
        let mut board = Scoreboard::new();
        for id in [4, 2, 7, 1] {
            board.register(pid(id));
        }
        board.set(pid(2), 10);
        board.set(pid(1), 10);
        board.set(pid(7), 30);

        let order: Vec<_> = board
            .standings(&Roster::new(4))
            .into_iter()
            .map(|s| (s.player_id, s.score))
            .collect();
        assert_eq!(
            order,
            vec![(pid(7), 30), (pid(2), 10), (pid(1), 10), (pid(4), 0)]
        );
    }

    #[test]
    fn test_standings_attach_player_data() {
        let mut roster = Roster::new(2);
        roster
            .join(pid(1), JoinRequest::new().attr("name", "ann"), 0)
            .unwrap();
        roster.join(pid(2), JoinRequest::new(), 0).unwrap();
        roster.leave(pid(2), true, 0);

        let mut board = Scoreboard::new();
        board.register(pid(1));
        board.register(pid(2));
        board.register(pid(3));

        let standings = board.standings(&roster);
        assert_eq!(
            standings[0].player_data.as_ref().and_then(|d| d.get("name")),
            Some(&json!("ann"))
        );
        assert!(standings[1].player_data.is_some(), "disconnected players keep their data");
        assert!(standings[2].player_data.is_none());
    }

    #[test]
    fn test_to_json_keys_by_player_id() {
        let mut board = Scoreboard::new();
        board.set(pid(1), 3);
        board.set(pid(2), -1);
        assert_eq!(board.to_json(), json!({ "1": 3, "2": -1 }));
    }

    #[test]
    fn test_remove_deletes_entry() {
        let mut board = Scoreboard::new();
        board.set(pid(1), 3);
        assert_eq!(board.remove(pid(1)), Some(3));
        assert_eq!(board.remove(pid(1)), None);
        assert!(board.is_empty());
    }
}
