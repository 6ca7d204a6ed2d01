//! gridrun game server.

use tracing::info;
use tracing_subscriber::EnvFilter;

mod arena;
mod collision;
mod config;
mod grid;
mod player;
mod round;
mod server;
mod spawn;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("gridrun server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Loaded configuration");
    info!("  Bind: {}:{}", config.server.bind, config.server.port);
    info!(
        "  Grid: {}x{} cells",
        config.game.grid_size, config.game.grid_size
    );
    info!("  Tick: {}ms", config.server.tick_interval_ms);
    info!("  Max players: {}", config.server.max_players);

    server::run(config).await?;

    Ok(())
}
