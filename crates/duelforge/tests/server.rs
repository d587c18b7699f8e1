//! Integration tests for `GameServer`: on-demand rooms, routing and the
//! event fanout.

use std::sync::Arc;
use std::time::Duration;

use duelforge::prelude::*;
use serde_json::{json, Map, Value};
use tokio::sync::broadcast;

// =========================================================================
// Helpers
// =========================================================================

fn quick_settings() -> Settings {
    Settings {
        session: SessionDefaults {
            countdown_secs: 0,
            max_players: 2,
            ..SessionDefaults::default()
        },
        ..Settings::default()
    }
}

fn server() -> GameServer {
    let mut mines = Map::new();
    mines.insert("rows".into(), json!(3));
    mines.insert("cols".into(), json!(3));
    mines.insert("minePositions".into(), json!([[0, 0]]));

    let directory = StaticDirectory::new()
        .with_room(RoomId(1), "tictactoe")
        .with_room(RoomId(2), "pong")
        .with_room_options(RoomId(3), "minesweeper", mines)
        .with_room(RoomId(4), "chess");
    GameServer::new(quick_settings(), directory)
}

fn named(name: &str) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("name".into(), json!(name));
    attrs
}

async fn next_named(rx: &mut broadcast::Receiver<Arc<RoomEvent>>, name: EventName) -> Arc<RoomEvent> {
    loop {
        let event = rx.recv().await.unwrap();
        if event.name == name {
            return event;
        }
    }
}

// =========================================================================
// Join requests
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_join_creates_the_room() {
    let server = server();
    let mut events = server.subscribe();

    let outcome = server
        .on_player_join_request(RoomId(1), PlayerId(1), named("ada"))
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::New);
    assert_eq!(server.registry().room_count().await, 1);

    let joined = next_named(&mut events, EventName::PlayerJoined).await;
    assert_eq!(joined.room_id, RoomId(1));

    let rooms = server.rooms().await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].game_type, "tictactoe");
    assert_eq!(rooms[0].state, SessionState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_second_join_starts_the_game() {
    let server = server();
    let mut events = server.subscribe();
    server.on_player_join_request(RoomId(1), PlayerId(1), named("ada")).await.unwrap();
    server.on_player_join_request(RoomId(1), PlayerId(2), named("bo")).await.unwrap();

    let started = next_named(&mut events, EventName::GameStarted).await;
    assert_eq!(started.room_id, RoomId(1));
    assert_eq!(server.rooms().await[0].state, SessionState::Active);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_room_is_not_found() {
    let server = server();
    let err = server
        .on_player_join_request(RoomId(99), PlayerId(1), Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DuelforgeError::Room(RoomError::NotFound(RoomId(99)))));
    assert!(!err.is_player_facing());
}

#[tokio::test(start_paused = true)]
async fn test_unregistered_game_type_is_reported() {
    let server = server();
    let err = server
        .on_player_join_request(RoomId(4), PlayerId(1), Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DuelforgeError::Room(RoomError::UnknownGameType(_))));
    assert!(err.is_player_facing());
}

#[tokio::test(start_paused = true)]
async fn test_full_room_refuses_third_player() {
    let server = server();
    server.on_player_join_request(RoomId(2), PlayerId(1), Map::new()).await.unwrap();
    server.on_player_join_request(RoomId(2), PlayerId(2), Map::new()).await.unwrap();
    let err = server
        .on_player_join_request(RoomId(2), PlayerId(3), Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DuelforgeError::Room(RoomError::RoomFull(_))));
}

// =========================================================================
// Actions and leaves
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_directory_options_reach_the_engine() {
    let server = server();
    let mut events = server.subscribe();
    server.on_player_join_request(RoomId(3), PlayerId(1), Map::new()).await.unwrap();
    server.on_player_join_request(RoomId(3), PlayerId(2), Map::new()).await.unwrap();

    // One mine in a 3x3 corner: the far corner opens every safe cell.
    let result = server
        .on_action(RoomId(3), PlayerId(1), json!({ "type": "revealCell", "row": 2, "col": 2 }))
        .await
        .unwrap();
    assert!(result.valid);

    let ended = next_named(&mut events, EventName::GameEnded).await;
    assert_eq!(ended.get("reason"), Some(&json!("All safe cells revealed")));
}

#[tokio::test(start_paused = true)]
async fn test_rule_violation_is_an_invalid_result() {
    let server = server();
    server.on_player_join_request(RoomId(1), PlayerId(1), Map::new()).await.unwrap();
    server.on_player_join_request(RoomId(1), PlayerId(2), Map::new()).await.unwrap();

    let result = server
        .on_action(RoomId(1), PlayerId(2), json!({ "type": "move", "row": 0, "col": 0 }))
        .await
        .unwrap();
    assert!(!result.valid);
    assert_eq!(result.reason.as_deref(), Some("Not your turn"));
}

#[tokio::test(start_paused = true)]
async fn test_action_for_missing_room_is_not_found() {
    let server = server();
    let err = server
        .on_action(RoomId(1), PlayerId(1), json!({ "type": "move", "row": 0, "col": 0 }))
        .await
        .unwrap_err();
    assert!(matches!(err, DuelforgeError::Room(RoomError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_permanent_leave_ends_a_duel() {
    let server = server();
    let mut events = server.subscribe();
    server.on_player_join_request(RoomId(1), PlayerId(1), Map::new()).await.unwrap();
    server.on_player_join_request(RoomId(1), PlayerId(2), Map::new()).await.unwrap();

    assert!(server.on_player_leave(RoomId(1), PlayerId(2), false).await.unwrap());
    let ended = next_named(&mut events, EventName::GameEnded).await;
    assert_eq!(ended.get("reason"), Some(&json!("insufficient_players")));

    // The finished room unregisters itself; a new join opens a fresh one.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let outcome = server
        .on_player_join_request(RoomId(1), PlayerId(1), Map::new())
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::New);
}

#[tokio::test(start_paused = true)]
async fn test_temporary_leave_then_reconnect() {
    let server = server();
    server.on_player_join_request(RoomId(2), PlayerId(1), named("ada")).await.unwrap();
    assert!(server.on_player_leave(RoomId(2), PlayerId(1), true).await.unwrap());

    let outcome = server
        .on_player_join_request(RoomId(2), PlayerId(1), named("ada"))
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::Reconnected);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_rooms() {
    let server = server();
    let mut room = server.subscribe_room(RoomId(2));
    server.on_player_join_request(RoomId(2), PlayerId(1), Map::new()).await.unwrap();

    server.shutdown().await;
    loop {
        let event = room.recv().await.unwrap();
        if event.name == EventName::GameEnded {
            assert_eq!(event.get("reason"), Some(&json!("room_closed")));
            break;
        }
    }
    assert_eq!(server.registry().room_count().await, 0);
}
