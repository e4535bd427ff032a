//! Halloween - headless field simulation runner.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Native Ogar Halloween v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration, optionally from the path given as first argument
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => server::Config::load_from(&path)?,
        None => server::Config::load()?,
    };
    info!("Loaded configuration");
    info!("  Name: {}", config.server.name);
    info!("  Border: {}x{}", config.border.width, config.border.height);
    info!("  Game mode: {}", config.server.gamemode);
    if let Some(seed) = config.server.seed {
        info!("  Seed: {}", seed);
    }

    let tick_interval = config.server.tick_interval_ms;
    let stats_every = Duration::from_millis(tick_interval * config.server.stats_interval_ticks.max(1));

    // Create shared game state
    let game_state = Arc::new(RwLock::new(server::GameState::new(config)));

    // Start the game loop
    let game_loop_state = Arc::clone(&game_state);
    let game_loop = tokio::spawn(async move {
        server::run_game_loop(game_loop_state, tick_interval).await;
    });

    // Periodic field statistics
    let stats_state = Arc::clone(&game_state);
    let stats = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(stats_every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let stats = stats_state.read().await.stats();
            info!(
                "[{}] tick {}: {} cells ({} food, {} viruses, {} mothers), food {}/{}, avg tick {:.2}ms",
                stats.gamemode,
                stats.tick,
                stats.counts.total,
                stats.counts.food,
                stats.counts.viruses,
                stats.counts.mothers,
                stats.food_budget.0,
                stats.food_budget.1,
                stats.tick_ms_avg
            );
        }
    });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutting down");
        }
        result = game_loop => {
            warn!("Game loop stopped: {:?}", result);
        }
    }
    stats.abort();

    let game = game_state.read().await;
    let counts = game.world.cell_counts();
    info!(
        "Final state after {} ticks: {} cells, {} mothers",
        game.tick_count, counts.total, counts.mothers
    );

    Ok(())
}
