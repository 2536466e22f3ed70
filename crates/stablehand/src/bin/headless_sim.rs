//! # Headless Simulation
//!
//! Plays the game with a scripted player and no window, for balance runs.
//! The player collects every pile, then buys the next stall and automation
//! whenever they can afford it.
//!
//! ## Usage
//!
//! ```bash
//! headless_sim --config data/schemas/economy/stalls.toml --saves ./saves --seconds 3600
//! ```
//!
//! `RUST_LOG` controls verbosity (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use stablehand::economy::{EconomyConfig, FileStore, GameContext, MemoryStore};
use stablehand::{dispatch, GameLoop, GameLoopConfig, PlayerIntent};
use tracing_subscriber::EnvFilter;

/// Simulated length of one frame.
const FRAME: Duration = Duration::from_millis(100);

struct Args {
    config: Option<PathBuf>,
    saves: Option<PathBuf>,
    seconds: u64,
}

fn parse_args() -> Option<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        config: None,
        saves: None,
        seconds: 600,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--config" | "-c" => {
                parsed.config = value.map(PathBuf::from);
                i += 1;
            }
            "--saves" | "-s" => {
                parsed.saves = value.map(PathBuf::from);
                i += 1;
            }
            "--seconds" | "-t" => {
                parsed.seconds = value.and_then(|v| v.parse().ok()).unwrap_or(600);
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: headless_sim [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <FILE>     Economy TOML (default: built-in)");
                println!("  -s, --saves <DIR>       Save directory (default: in memory)");
                println!("  -t, --seconds <SECS>    Simulated seconds (default: 600)");
                return None;
            }
            other => {
                eprintln!("Unknown argument: {other}");
                return None;
            }
        }
        i += 1;
    }
    Some(parsed)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(args) = parse_args() else {
        return ExitCode::FAILURE;
    };

    let config = match &args.config {
        Some(path) => match EconomyConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "could not load config");
                return ExitCode::FAILURE;
            }
        },
        None => EconomyConfig::default(),
    };

    let game = match &args.saves {
        Some(dir) => FileStore::open(dir).and_then(|store| GameContext::new(config, Arc::new(store))),
        None => GameContext::new(config, Arc::new(MemoryStore::new())),
    };
    let mut game = match game {
        Ok(game) => game,
        Err(e) => {
            tracing::error!(error = %e, "could not start game");
            return ExitCode::FAILURE;
        }
    };

    let mut game_loop = GameLoop::new(GameLoopConfig::default(), &game);
    let frames = args.seconds * 1000 / FRAME.as_millis().max(1) as u64;
    let mut manual_coins: u64 = 0;

    tracing::info!(seconds = args.seconds, frames, "simulation started");

    for _ in 0..frames {
        game_loop.frame(&mut game, FRAME);

        let piles: Vec<_> = game.piles().live_piles().map(|p| p.id).collect();
        for pile in piles {
            if let stablehand::IntentOutcome::Collected { reward, .. } =
                dispatch(&mut game, PlayerIntent::CollectPile(pile))
            {
                manual_coins += reward;
            }
        }

        if let Some(next) = game.stalls().next_locked_index() {
            if game.ledger().can_afford(game.stalls().unlock_cost(next)) {
                dispatch(&mut game, PlayerIntent::UnlockNextStall);
            }
        }

        let automatable = (0..game.stalls().total_stalls()).find(|&i| {
            game.stalls().is_unlocked(i) && !game.stalls().is_automated(i)
        });
        if let Some(index) = automatable {
            if game.ledger().can_afford(game.stalls().automation_cost(index)) {
                dispatch(&mut game, PlayerIntent::AutomateStall(index));
            }
        }
    }

    let record = game.snapshot();
    let totals = game_loop.totals();
    let automated = record.stall_automation_flags.iter().filter(|&&f| f).count();
    tracing::info!(
        balance = record.coin_balance,
        lifetime_earned = record.lifetime_coins_earned,
        piles_cleaned = record.lifetime_piles_cleaned,
        manual_coins,
        auto_coins = totals.auto_coins,
        unlocked = record.stalls_unlocked_count,
        automated,
        expired = totals.piles_expired,
        "simulation finished"
    );
    ExitCode::SUCCESS
}
