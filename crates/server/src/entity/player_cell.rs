//! Player cell.

use super::cell::{Cell, CellData, CellType};
use glam::Vec2;

/// A cell controlled by a player.
#[derive(Debug, Clone)]
pub struct PlayerCell {
    pub cell_data: CellData,
}

impl PlayerCell {
    pub fn new(node_id: u32, owner_id: u32, position: Vec2, size: f32, tick: u64) -> Self {
        let mut data = CellData::new(node_id, CellType::Player, position, size, tick);
        data.owner_id = Some(owner_id);
        Self { cell_data: data }
    }
}

impl Cell for PlayerCell {
    fn data(&self) -> &CellData {
        &self.cell_data
    }

    fn data_mut(&mut self) -> &mut CellData {
        &mut self.cell_data
    }

    fn can_eat(&self, other: &CellData) -> bool {
        other.cell_type != CellType::Beacon
    }
}
