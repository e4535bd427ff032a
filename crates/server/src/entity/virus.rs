//! Virus cell.

use super::cell::{Cell, CellData, CellType, EatenReaction};
use crate::behavior::VirusFeeding;
use crate::color::Color;
use glam::Vec2;

/// Default virus color (green).
pub const VIRUS_COLOR: Color = Color::new(51, 255, 51);

/// A virus that can pop player cells.
#[derive(Debug, Clone)]
pub struct Virus {
    data: CellData,
    /// Direction the virus faces when it is not being pushed (radians).
    pub heading: f32,
}

impl Virus {
    pub fn new(node_id: u32, position: Vec2, size: f32, tick: u64) -> Self {
        let mut data = CellData::new(node_id, CellType::Virus, position, size, tick);
        data.spiked = true;
        data.color = VIRUS_COLOR;
        Self { data, heading: 0.0 }
    }

    pub fn set_color(&mut self, color: Color) {
        self.data.color = color;
    }

    /// Current angle: the boost direction while moving, otherwise the heading.
    #[inline]
    pub fn angle(&self) -> f32 {
        self.data.boost.map(|b| b.angle).unwrap_or(self.heading)
    }

    /// React to eating `prey` according to `feeding`.
    ///
    /// Returns the angle to shoot a new virus at when a growing virus
    /// reached `max_size`.
    pub fn on_eat(&mut self, prey: &CellData, feeding: VirusFeeding, min_size: f32, max_size: f32) -> Option<f32> {
        let prey_angle = prey.boost.map(|b| b.angle);
        match feeding {
            VirusFeeding::Grow => {
                let size = (self.data.size_squared() + prey.size_squared()).sqrt();
                self.data.set_size(size);
                if size >= max_size {
                    self.data.set_size(min_size);
                    return Some(prey_angle.unwrap_or(self.heading));
                }
                None
            }
            VirusFeeding::Push { distance } => {
                let angle = prey_angle.unwrap_or_else(|| self.angle());
                self.heading = angle;
                self.data.set_boost(distance, angle);
                None
            }
        }
    }

    /// Drift along the heading, turning by `turn` radians first.
    pub fn drift(&mut self, speed: f32, turn: f32) {
        self.heading = (self.heading + turn) % std::f32::consts::TAU;
        self.data.position += Vec2::new(self.heading.sin(), self.heading.cos()) * speed;
    }

    /// Reaction shared by every spiked cell: whoever eats it pops.
    pub(crate) fn pop_eater(data: &mut CellData, eater_id: u32) -> EatenReaction {
        data.killed_by = Some(eater_id);
        EatenReaction::PopEater
    }
}

impl Cell for Virus {
    fn data(&self) -> &CellData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut CellData {
        &mut self.data
    }

    /// Viruses only feed on ejected mass.
    fn can_eat(&self, other: &CellData) -> bool {
        other.cell_type == CellType::EjectedMass
    }

    fn on_eaten(&mut self, eater_id: u32) -> EatenReaction {
        Self::pop_eater(&mut self.data, eater_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eject(size: f32, boost_angle: Option<f32>) -> CellData {
        let mut data = CellData::new(9, CellType::EjectedMass, Vec2::ZERO, size, 0);
        if let Some(angle) = boost_angle {
            data.set_boost(100.0, angle);
        }
        data
    }

    #[test]
    fn grow_absorbs_and_shoots_at_max() {
        let mut virus = Virus::new(1, Vec2::ZERO, 100.0, 0);
        let shot = virus.on_eat(&eject(30.0, Some(1.0)), VirusFeeding::Grow, 100.0, 141.4);
        assert!(shot.is_none());
        assert!((virus.data().size_squared() - (100.0f32 * 100.0 + 900.0)).abs() < 0.5);

        let shot = virus.on_eat(&eject(120.0, Some(1.0)), VirusFeeding::Grow, 100.0, 141.4);
        assert_eq!(shot, Some(1.0));
        assert_eq!(virus.data().size, 100.0);
    }

    #[test]
    fn push_follows_moving_prey() {
        let mut virus = Virus::new(1, Vec2::ZERO, 100.0, 0);
        virus.on_eat(&eject(30.0, Some(2.0)), VirusFeeding::Push { distance: 320.0 }, 100.0, 141.4);
        let boost = virus.data().boost.unwrap();
        assert_eq!(boost.angle, 2.0);
        assert_eq!(boost.distance, 320.0);
        // No growth in push mode.
        assert_eq!(virus.data().size, 100.0);
    }

    #[test]
    fn push_uses_own_heading_for_still_prey() {
        let mut virus = Virus::new(1, Vec2::ZERO, 100.0, 0);
        virus.heading = 0.5;
        virus.on_eat(&eject(30.0, None), VirusFeeding::Push { distance: 320.0 }, 100.0, 141.4);
        assert_eq!(virus.data().boost.unwrap().angle, 0.5);
    }

    #[test]
    fn only_ejected_mass_is_food_for_viruses() {
        let virus = Virus::new(1, Vec2::ZERO, 100.0, 0);
        assert!(virus.can_eat(&eject(30.0, None)));
        let food = CellData::new(2, CellType::Food, Vec2::ZERO, 10.0, 0);
        assert!(!virus.can_eat(&food));
    }

    #[test]
    fn eating_a_virus_pops_the_eater() {
        let mut virus = Virus::new(1, Vec2::ZERO, 100.0, 0);
        assert_eq!(virus.on_eaten(77), EatenReaction::PopEater);
        assert_eq!(virus.data().killed_by, Some(77));
    }
}
