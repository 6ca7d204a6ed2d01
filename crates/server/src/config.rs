//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub round: RoundConfig,
}

impl Config {
    /// Load configuration from config.toml or use defaults
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Path::new("config.toml");

        if config_path.exists() {
            info!("Loading configuration from config.toml");
            let contents = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("No config.toml found, using default configuration");
            let config = Config::default();

            // Write default config for reference
            if let Ok(toml_str) = toml::to_string_pretty(&config) {
                let _ = std::fs::write(config_path, toml_str);
            }

            Ok(config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            game: GameConfig::default(),
            round: RoundConfig::default(),
        }
    }
}

/// Network and pacing settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum simultaneous players
    #[serde(default = "default_max_players")]
    pub max_players: usize,

    /// Game tick interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_players: default_max_players(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

/// Grid and trail settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    /// Side length of the square grid, in cells
    #[serde(default = "default_grid_size")]
    pub grid_size: i32,

    /// Trail length cap; the oldest segment is dropped beyond this
    #[serde(default = "default_max_trail_length")]
    pub max_trail_length: usize,

    /// Minimum distance from the border for spawn points
    #[serde(default = "default_spawn_margin")]
    pub spawn_margin: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            max_trail_length: default_max_trail_length(),
            spawn_margin: default_spawn_margin(),
        }
    }
}

/// Round flow settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoundConfig {
    /// Pause between rounds before everyone respawns, in seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_players() -> usize {
    16
}

fn default_tick_interval() -> u64 {
    40
}

fn default_grid_size() -> i32 {
    30
}

fn default_max_trail_length() -> usize {
    300
}

fn default_spawn_margin() -> i32 {
    2
}

fn default_cooldown_secs() -> u64 {
    3
}
