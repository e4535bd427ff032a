//! Stationary map marker.

use super::cell::{Cell, CellData, CellType};
use crate::color::Color;
use glam::Vec2;

/// Marker placed once at the map center by modes that want a landmark.
/// Nothing eats it and it never moves.
#[derive(Debug, Clone)]
pub struct Beacon {
    data: CellData,
}

impl Beacon {
    pub fn new(node_id: u32, position: Vec2, size: f32, color: Color, tick: u64) -> Self {
        let mut data = CellData::new(node_id, CellType::Beacon, position, size, tick);
        data.color = color;
        Self { data }
    }
}

impl Cell for Beacon {
    fn data(&self) -> &CellData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut CellData {
        &mut self.data
    }
}
