//! Error types.

use thiserror::Error;

/// Errors found while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config file: {0}")]
    Parse(String),

    #[error("Border must have a positive size, got {width}x{height}")]
    EmptyBorder { width: f64, height: f64 },

    #[error("Food min size {min} is larger than max size {max}")]
    FoodSizeRange { min: f64, max: f64 },

    #[error("{0} must be at least 1 tick")]
    ZeroInterval(&'static str),

    #[error("Mother cell density must be positive, got {0}")]
    Density(f64),

    #[error("Mother cell shed chance must be within 0..=1, got {0}")]
    ShedChance(f64),
}
