//! Game entities (cells).
//!
//! This module defines all cell types in the game.

mod beacon;
mod cell;
mod ejected_mass;
mod food;
mod mother_cell;
mod player_cell;
mod virus;

pub use beacon::Beacon;
pub use cell::{BoostData, Cell, CellData, CellType, EatenReaction};
pub use ejected_mass::EjectedMass;
pub use food::Food;
pub use mother_cell::{FoodSizeRange, FoodSpawn, MotherCell, MotherUpdate, Shedding, MOTHER_MIN_SIZE};
pub use player_cell::PlayerCell;
pub use virus::{Virus, VIRUS_COLOR};
