//! `duel-sim`: plays bot matches on an in-process Duelforge server.
//!
//! ```text
//! duel-sim --game minesweeper --rooms 4 --seed 7
//! RUST_LOG=debug duel-sim --game pong --turns 400 --interval-ms 20
//! ```

mod bot;
mod sim;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use duelforge::prelude::*;

use crate::sim::Plan;

#[derive(Debug, Parser)]
#[command(name = "duel-sim", version, about = "Runs scripted bot players through Duelforge rooms")]
struct Cli {
    /// Game type to host.
    #[arg(short, long, default_value = "tictactoe")]
    game: String,

    /// Number of rooms played side by side.
    #[arg(short, long, default_value_t = 1)]
    rooms: u64,

    /// Bots per room.
    #[arg(short, long, default_value_t = 2)]
    players: u64,

    /// Seeds both the rooms and the bots.
    #[arg(long)]
    seed: Option<u64>,

    /// Bot turns per room before the room is closed.
    #[arg(long = "turns", default_value_t = 200)]
    max_turns: u32,

    #[arg(long, default_value_t = 250)]
    interval_ms: u64,

    /// Overrides `session.countdown_secs`.
    #[arg(long)]
    countdown_secs: Option<u32>,

    /// Overrides `session.duration_secs`.
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Settings file, without extension.
    #[arg(long)]
    config: Option<String>,

    /// Print the built-in game types and exit.
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.list {
        for game_type in BUILTIN_GAME_TYPES {
            println!("{game_type}");
        }
        return Ok(());
    }

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(secs) = cli.countdown_secs {
        settings.session.countdown_secs = secs;
    }
    if let Some(secs) = cli.duration_secs {
        settings.session.duration_secs = secs;
    }
    duelforge::telemetry::init_tracing(&settings.log_filter);

    let plan = Plan {
        game_type: cli.game,
        rooms: cli.rooms,
        players: cli.players,
        seed: cli.seed,
        max_turns: cli.max_turns,
        turn_interval: Duration::from_millis(cli.interval_ms.max(1)),
    };
    tracing::info!(game = %plan.game_type, rooms = plan.rooms, players = plan.players, seed = ?plan.seed, "starting simulation");

    let server = Arc::new(GameServer::new(settings, StaticDirectory::new()));
    let summaries = tokio::select! {
        result = sim::simulate(Arc::clone(&server), plan) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, closing rooms");
            server.shutdown().await;
            return Ok(());
        }
    };

    for summary in summaries {
        println!("{} {} {}", summary.room_id, summary.reason, summary.standings);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["duel-sim"]);
        assert_eq!(cli.game, "tictactoe");
        assert_eq!(cli.rooms, 1);
        assert_eq!(cli.players, 2);
        assert_eq!(cli.max_turns, 200);
        assert!(cli.seed.is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "duel-sim", "-g", "pong", "-r", "3", "--seed", "7", "--turns", "10", "--countdown-secs", "0",
        ]);
        assert_eq!(cli.game, "pong");
        assert_eq!(cli.rooms, 3);
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.max_turns, 10);
        assert_eq!(cli.countdown_secs, Some(0));
    }
}
