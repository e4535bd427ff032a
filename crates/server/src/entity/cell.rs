//! Base cell type and common functionality.

use crate::color::Color;
use glam::Vec2;

/// Cell type enum matching the client's cellType values.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellType {
    /// Player cell (cellType = 0)
    #[default]
    Player = 0,
    /// Food pellet (cellType = 1)
    Food = 1,
    /// Virus (cellType = 2)
    Virus = 2,
    /// Ejected mass (cellType = 3)
    EjectedMass = 3,
    /// Mother cell, drawn as a virus by clients
    MotherCell = 4,
    /// Stationary map marker
    Beacon = 5,
}

/// Common cell data shared by all cell types.
#[derive(Debug, Clone)]
pub struct CellData {
    /// Unique node ID.
    pub node_id: u32,
    /// Owner client ID (None for food, viruses, etc.)
    pub owner_id: Option<u32>,
    pub cell_type: CellType,
    /// Position in world coordinates.
    pub position: Vec2,
    /// Cell size (radius on screen).
    pub size: f32,
    pub color: Color,
    /// Tick when the cell was born.
    pub tick_of_birth: u64,
    /// Whether the cell has spikes (viruses, mother cells).
    pub spiked: bool,
    /// Boost movement data.
    pub boost: Option<BoostData>,
    /// ID of the cell that ate this cell.
    pub killed_by: Option<u32>,
}

impl CellData {
    pub fn new(node_id: u32, cell_type: CellType, position: Vec2, size: f32, tick: u64) -> Self {
        Self {
            node_id,
            owner_id: None,
            cell_type,
            position,
            size: size.max(0.0),
            color: Color::default(),
            tick_of_birth: tick,
            spiked: false,
            boost: None,
            killed_by: None,
        }
    }

    #[inline]
    pub fn set_size(&mut self, size: f32) {
        self.size = size.max(0.0);
    }

    /// `size^2`, the quantity that is conserved when cells merge.
    #[inline]
    pub fn size_squared(&self) -> f32 {
        self.size * self.size
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.boost.is_some()
    }

    /// Set boost for the cell (used for ejection and pushes).
    #[inline]
    pub fn set_boost(&mut self, distance: f32, angle: f32) {
        self.boost = Some(BoostData {
            distance,
            direction: Vec2::new(angle.sin(), angle.cos()),
            angle,
        });
    }

    /// Check and clamp position to border.
    #[inline]
    pub fn check_border(&mut self, border_min: Vec2, border_max: Vec2) {
        let half_size = self.size / 2.0;
        self.position.x = self
            .position
            .x
            .clamp(border_min.x + half_size, (border_max.x - half_size).max(border_min.x + half_size));
        self.position.y = self
            .position
            .y
            .clamp(border_min.y + half_size, (border_max.y - half_size).max(border_min.y + half_size));
    }

    /// Advance boost movement by one tick.
    /// Moves 1/10 of the remaining distance; returns false once the boost is spent.
    pub fn update_boost(&mut self, border_min: Vec2, border_max: Vec2) -> bool {
        let Some(boost) = self.boost.as_mut() else {
            return false;
        };
        if boost.distance < 1.0 {
            self.boost = None;
            return false;
        }

        let move_dist = boost.distance / 10.0;
        boost.distance -= move_dist;
        self.position += boost.direction * move_dist;
        self.check_border(border_min, border_max);
        true
    }
}

/// Boost movement data.
#[derive(Debug, Clone, Copy)]
pub struct BoostData {
    /// Remaining distance to travel.
    pub distance: f32,
    /// Direction vector (normalized).
    pub direction: Vec2,
    /// Launch angle (radians).
    pub angle: f32,
}

/// Trait for all cell types.
pub trait Cell: Send + Sync {
    fn data(&self) -> &CellData;

    fn data_mut(&mut self) -> &mut CellData;

    /// Whether this cell may consume `other`.
    fn can_eat(&self, _other: &CellData) -> bool {
        false
    }

    /// Called when this cell is eaten by another.
    fn on_eaten(&mut self, eater_id: u32) -> EatenReaction {
        self.data_mut().killed_by = Some(eater_id);
        EatenReaction::None
    }
}

/// What happens to the eater after a cell was eaten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EatenReaction {
    None,
    /// The eater is split apart (spiked cells).
    PopEater,
}
