//! Native Ogar field simulation: mother cells and the Halloween game mode.

pub mod behavior;
pub mod budget;
pub mod color;
pub mod config;
pub mod entity;
pub mod error;
pub mod game;
pub mod gamemodes;
pub mod spatial;
pub mod world;

// Re-export commonly used types
pub use color::Color;
pub use config::Config;
pub use error::ConfigError;
pub use game::{FieldStats, GameState, run_game_loop};
pub use world::{CellEntry, NodeAdded, NodeRemoved, World};
