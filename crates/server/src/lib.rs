//! gridrun game server library.

pub mod arena;
pub mod collision;
pub mod config;
pub mod grid;
pub mod player;
pub mod round;
pub mod server;
pub mod spawn;

// Re-export commonly used types
pub use config::Config;
pub use server::{run, DeathNotice};
