//! Server configuration.

use crate::color::Color;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub border: BorderConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub virus: VirusConfig,
    #[serde(default)]
    pub eject: EjectConfig,
    #[serde(default)]
    pub mother: MotherConfig,
    #[serde(default)]
    pub halloween: HalloweenConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    /// Load configuration from `path`, writing the defaults there if it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml_str(&contents)?
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.border.width <= 0.0 || self.border.height <= 0.0 {
            return Err(ConfigError::EmptyBorder {
                width: self.border.width,
                height: self.border.height,
            });
        }
        if self.food.min_size > self.food.max_size {
            return Err(ConfigError::FoodSizeRange {
                min: self.food.min_size,
                max: self.food.max_size,
            });
        }
        if self.server.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("server.tick_interval_ms"));
        }
        if self.halloween.spawn_interval == 0 {
            return Err(ConfigError::ZeroInterval("halloween.spawn_interval"));
        }
        if self.halloween.update_interval == 0 {
            return Err(ConfigError::ZeroInterval("halloween.update_interval"));
        }
        if self.halloween.density <= 0.0 {
            return Err(ConfigError::Density(self.halloween.density));
        }
        if !(0.0..=1.0).contains(&self.mother.shed_chance) {
            return Err(ConfigError::ShedChance(self.mother.shed_chance));
        }
        Ok(())
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Game mode (0=FFA, 3=Halloween).
    #[serde(default = "default_gamemode")]
    pub gamemode: u32,
    /// Server name shown in logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Fixed RNG seed; a fresh OS seed is used when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Ticks between statistics log lines.
    #[serde(default = "default_stats_interval")]
    pub stats_interval_ticks: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            gamemode: default_gamemode(),
            name: default_name(),
            tick_interval_ms: default_tick_interval(),
            seed: None,
            stats_interval_ticks: default_stats_interval(),
        }
    }
}

fn default_gamemode() -> u32 {
    3
}
fn default_name() -> String {
    "Native Ogar Halloween".to_string()
}
fn default_tick_interval() -> u64 {
    40
}
fn default_stats_interval() -> u64 {
    250
}

/// World border configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BorderConfig {
    #[serde(default = "default_border_size")]
    pub width: f64,
    #[serde(default = "default_border_size")]
    pub height: f64,
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            width: default_border_size(),
            height: default_border_size(),
        }
    }
}

fn default_border_size() -> f64 {
    14142.0
}

/// Food configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    #[serde(default = "default_food_min_size")]
    pub min_size: f64,
    #[serde(default = "default_food_max_size")]
    pub max_size: f64,
    #[serde(default = "default_food_min_amount")]
    pub min_amount: usize,
    #[serde(default = "default_food_max_amount")]
    pub max_amount: usize,
    #[serde(default = "default_food_spawn_amount")]
    pub spawn_amount: usize,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            min_size: default_food_min_size(),
            max_size: default_food_max_size(),
            min_amount: default_food_min_amount(),
            max_amount: default_food_max_amount(),
            spawn_amount: default_food_spawn_amount(),
        }
    }
}

fn default_food_min_size() -> f64 {
    10.0
}
fn default_food_max_size() -> f64 {
    20.0
}
fn default_food_min_amount() -> usize {
    1000
}
fn default_food_max_amount() -> usize {
    2000
}
fn default_food_spawn_amount() -> usize {
    30
}

/// Virus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VirusConfig {
    #[serde(default = "default_virus_min_size")]
    pub min_size: f64,
    #[serde(default = "default_virus_max_size")]
    pub max_size: f64,
    #[serde(default = "default_virus_min_amount")]
    pub min_amount: usize,
    #[serde(default = "default_virus_max_amount")]
    pub max_amount: usize,
    /// Boost distance of a virus shot after growing to max size.
    #[serde(default = "default_virus_eject_speed")]
    pub eject_speed: f64,
    /// Base color for viruses and mother cells.
    #[serde(default = "default_virus_color")]
    pub color: Color,
    /// Moving viruses curve their heading each tick.
    #[serde(default)]
    pub spirals: bool,
    /// Viruses drift along their heading.
    #[serde(default)]
    pub moving: bool,
}

impl Default for VirusConfig {
    fn default() -> Self {
        Self {
            min_size: default_virus_min_size(),
            max_size: default_virus_max_size(),
            min_amount: default_virus_min_amount(),
            max_amount: default_virus_max_amount(),
            eject_speed: default_virus_eject_speed(),
            color: default_virus_color(),
            spirals: false,
            moving: false,
        }
    }
}

fn default_virus_min_size() -> f64 {
    100.0
}
fn default_virus_max_size() -> f64 {
    141.4
}
fn default_virus_min_amount() -> usize {
    50
}
fn default_virus_max_amount() -> usize {
    100
}
fn default_virus_eject_speed() -> f64 {
    780.0
}
fn default_virus_color() -> Color {
    Color::new(51, 255, 51)
}

/// Ejected mass configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EjectConfig {
    #[serde(default = "default_eject_size")]
    pub size: f64,
}

impl Default for EjectConfig {
    fn default() -> Self {
        Self {
            size: default_eject_size(),
        }
    }
}

fn default_eject_size() -> f64 {
    36.056
}

/// Mother cell configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotherConfig {
    /// Resting size; mother cells decay back to it and never shed below it.
    #[serde(default = "default_mother_min_size")]
    pub min_size: f64,
    /// Shedding rounds attempted per qualifying update.
    #[serde(default = "default_mother_spawn_amount")]
    pub spawn_amount: usize,
    /// Chance that an update at resting size sheds food at all.
    #[serde(default = "default_mother_shed_chance")]
    pub shed_chance: f64,
}

impl Default for MotherConfig {
    fn default() -> Self {
        Self {
            min_size: default_mother_min_size(),
            spawn_amount: default_mother_spawn_amount(),
            shed_chance: default_mother_shed_chance(),
        }
    }
}

fn default_mother_min_size() -> f64 {
    149.0
}
fn default_mother_spawn_amount() -> usize {
    2
}
fn default_mother_shed_chance() -> f64 {
    0.15
}

/// Halloween mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HalloweenConfig {
    /// Ticks between mother cell spawn attempts (25 ticks = 1 second).
    #[serde(default = "default_mother_spawn_interval")]
    pub spawn_interval: u64,
    /// Ticks between forced mother cell updates.
    #[serde(default = "default_mother_update_interval")]
    pub update_interval: u64,
    /// Map size divisor for the minimum mother cell count.
    #[serde(default = "default_mother_density")]
    pub density: f64,
    /// Radius that must be free around a spawn position.
    #[serde(default = "default_clearance_radius")]
    pub clearance_radius: f64,
    /// Boost a virus receives when it eats in this mode.
    #[serde(default = "default_push_distance")]
    pub push_distance: f64,
    /// Size of the marker placed at the map center.
    #[serde(default = "default_beacon_size")]
    pub beacon_size: f64,
    /// Virus color while the mode is active.
    #[serde(default = "default_theme_color")]
    pub theme_color: Color,
}

impl Default for HalloweenConfig {
    fn default() -> Self {
        Self {
            spawn_interval: default_mother_spawn_interval(),
            update_interval: default_mother_update_interval(),
            density: default_mother_density(),
            clearance_radius: default_clearance_radius(),
            push_distance: default_push_distance(),
            beacon_size: default_beacon_size(),
            theme_color: default_theme_color(),
        }
    }
}

fn default_mother_spawn_interval() -> u64 {
    25 * 5
}
fn default_mother_update_interval() -> u64 {
    5
}
fn default_mother_density() -> f64 {
    2000.0
}
fn default_clearance_radius() -> f64 {
    149.0
}
fn default_push_distance() -> f64 {
    16.0 * 20.0
}
fn default_beacon_size() -> f64 {
    300.0
}
fn default_theme_color() -> Color {
    Color::new(230, 60, 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.gamemode, 3);
        assert_eq!(config.mother.min_size, 149.0);
        assert_eq!(config.mother.spawn_amount, 2);
        assert_eq!(config.halloween.spawn_interval, 125);
        assert_eq!(config.halloween.update_interval, 5);
        assert_eq!(config.halloween.theme_color, Color::new(230, 60, 10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [virus]
            moving = true
            color = { r = 1, g = 2, b = 3 }

            [halloween]
            density = 500.0
            "#,
        )
        .unwrap();
        assert!(config.virus.moving);
        assert!(!config.virus.spirals);
        assert_eq!(config.virus.color, Color::new(1, 2, 3));
        assert_eq!(config.virus.min_size, 100.0);
        assert_eq!(config.halloween.density, 500.0);
        assert_eq!(config.halloween.clearance_radius, 149.0);
    }

    #[test]
    fn validate_rejects_inverted_food_sizes() {
        let mut config = Config::default();
        config.food.min_size = 30.0;
        config.food.max_size = 10.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FoodSizeRange { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_intervals_and_bad_chance() {
        let mut config = Config::default();
        config.halloween.update_interval = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroInterval("halloween.update_interval"))
        ));

        let mut config = Config::default();
        config.mother.shed_chance = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::ShedChance(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Config::from_toml_str("[server\ngamemode = 3"),
            Err(ConfigError::Parse(_))
        ));
    }
}
