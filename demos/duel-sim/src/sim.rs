//! Drives bot players through rooms and watches the fanout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use duelforge::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinSet;

use crate::bot::Script;

/// One simulation run.
#[derive(Debug, Clone)]
pub struct Plan {
    pub game_type: String,
    pub rooms: u64,
    pub players: u64,
    pub seed: Option<u64>,
    /// Bot turns per room before the room is closed.
    pub max_turns: u32,
    pub turn_interval: Duration,
}

/// How a room ended.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub reason: String,
    pub standings: Value,
}

/// Runs `plan` to completion and returns one summary per room, ordered
/// by room id.
pub async fn simulate(server: Arc<GameServer>, plan: Plan) -> Result<Vec<RoomSummary>, DuelforgeError> {
    let Some(script) = Script::for_game(&plan.game_type) else {
        return Err(RoomError::UnknownGameType(plan.game_type.clone()).into());
    };

    let logger = tokio::spawn(log_events(server.subscribe(), plan.rooms as usize));

    for room in 1..=plan.rooms {
        let room_id = RoomId(room);
        let mut config = server
            .settings()
            .session
            .config_for(room_id)
            .with_players(plan.players as usize, plan.players as usize);
        if let Some(seed) = plan.seed {
            config = config.with_seed(seed.wrapping_add(room));
        }
        server.create_room(&plan.game_type, config).await?;
    }

    let mut drivers = JoinSet::new();
    for room in 1..=plan.rooms {
        let server = Arc::clone(&server);
        let plan = plan.clone();
        drivers.spawn(async move { drive_room(server, RoomId(room), script, plan).await });
    }
    while let Some(joined) = drivers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(%err, "room driver stopped early"),
            Err(err) => tracing::error!(%err, "room driver panicked"),
        }
    }

    // Closes whatever is still open so every room reports an end.
    server.shutdown().await;

    let mut summaries = match logger.await {
        Ok(summaries) => summaries,
        Err(err) => {
            tracing::error!(%err, "event logger failed");
            Vec::new()
        }
    };
    summaries.sort_by_key(|s| s.room_id);
    Ok(summaries)
}

async fn drive_room(server: Arc<GameServer>, room_id: RoomId, script: Script, plan: Plan) -> Result<(), DuelforgeError> {
    let mut room = server.subscribe_room(room_id);
    let mut bots: Vec<(PlayerId, StdRng)> = (1..=plan.players)
        .map(|p| {
            let rng = match plan.seed {
                Some(seed) => StdRng::seed_from_u64(seed ^ (room_id.0 << 16) ^ p),
                None => StdRng::from_os_rng(),
            };
            (PlayerId(p), rng)
        })
        .collect();

    for (player, _) in &bots {
        let mut attributes = Map::new();
        attributes.insert("name".into(), Value::from(format!("bot-{}", player.0)));
        server.on_player_join_request(room_id, *player, attributes).await?;
    }

    let mut ticker = tokio::time::interval(plan.turn_interval);
    let mut turns = 0;
    loop {
        tokio::select! {
            event = room.recv() => match event {
                Some(event) if event.name == EventName::GameEnded => return Ok(()),
                Some(_) => {}
                None => return Ok(()),
            },
            _ = ticker.tick() => {
                if turns == plan.max_turns {
                    tracing::info!(%room_id, turns, "turn limit reached, closing room");
                    if let Some(handle) = server.registry().get(room_id).await {
                        handle.close().await?;
                    }
                    return Ok(());
                }
                turns += 1;
                for (player, rng) in &mut bots {
                    let action = script.next_action(rng);
                    match server.on_action(room_id, *player, action.clone()).await {
                        Ok(result) if result.valid => tracing::debug!(%room_id, %player, %action, "action accepted"),
                        Ok(result) => tracing::trace!(%room_id, %player, reason = ?result.reason, "action rejected"),
                        // The room finished and unregistered between ticks.
                        Err(DuelforgeError::Room(RoomError::NotFound(_) | RoomError::Unavailable(_))) => return Ok(()),
                        Err(err) => return Err(err),
                    }
                }
            }
        }
    }
}

/// Logs every broadcast until `rooms` games have ended.
async fn log_events(mut events: broadcast::Receiver<Arc<RoomEvent>>, rooms: usize) -> Vec<RoomSummary> {
    let mut ended: HashMap<RoomId, RoomSummary> = HashMap::new();
    while ended.len() < rooms {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        if event.name == EventName::GameStateUpdate {
            tracing::debug!(room_id = %event.room_id, event = %event.name, "broadcast");
        } else {
            let payload = Value::Object(event.payload.clone());
            tracing::info!(room_id = %event.room_id, event = %event.name, %payload, "broadcast");
        }
        if event.name == EventName::GameEnded {
            let reason = event
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let standings = event.get("standings").cloned().unwrap_or(Value::Null);
            ended.entry(event.room_id).or_insert(RoomSummary {
                room_id: event.room_id,
                reason,
                standings,
            });
        }
    }
    ended.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> Arc<GameServer> {
        let mut settings = Settings::default();
        settings.session.countdown_secs = 0;
        Arc::new(GameServer::new(settings, StaticDirectory::new()))
    }

    fn plan(game_type: &str, rooms: u64, max_turns: u32) -> Plan {
        Plan {
            game_type: game_type.to_owned(),
            rooms,
            players: 2,
            seed: Some(42),
            max_turns,
            turn_interval: Duration::from_millis(50),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_room_reports_an_end() {
        let summaries = simulate(server(), plan("tictactoe", 3, 100)).await.unwrap();
        assert_eq!(summaries.len(), 3);
        let ids: Vec<_> = summaries.iter().map(|s| s.room_id).collect();
        assert_eq!(ids, vec![RoomId(1), RoomId(2), RoomId(3)]);
        for summary in &summaries {
            assert!(!summary.reason.is_empty());
            assert!(summary.standings.is_array());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_limit_closes_the_room() {
        // Pong never finishes in one turn.
        let summaries = simulate(server(), plan("pong", 1, 1)).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].reason, "room_closed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_game_is_refused() {
        let err = simulate(server(), plan("chess", 1, 1)).await.unwrap_err();
        assert!(matches!(err, DuelforgeError::Room(RoomError::UnknownGameType(_))));
    }
}
