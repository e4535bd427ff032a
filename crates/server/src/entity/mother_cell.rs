//! Mother cell: a spiked food dispenser.
//!
//! A mother cell grows by eating player cells and ejected mass, sprays part of
//! every meal back out as food, shrinks back to its resting size at a fixed
//! rate and, once at rest, occasionally sheds a few pellets.
//!
//! The cell never touches the field directly. Its hooks return the pellets to
//! spawn ([`FoodSpawn`]) and the field materialises them.

use super::cell::{Cell, CellData, CellType, EatenReaction};
use super::virus::Virus;
use crate::budget::FoodBudget;
use crate::color::Color;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// Resting size of a mother cell.
pub const MOTHER_MIN_SIZE: f32 = 149.0;

/// Shedding rounds attempted per qualifying update.
const MOTHER_SPAWN_AMOUNT: usize = 2;

/// Pellets sprayed out of a meal fly `62..124` units.
const MEAL_BOOST_MIN: f32 = 62.0;
/// Pellets shed at rest fly `32..64` units.
const SHED_BOOST_MIN: f32 = 32.0;

/// Inclusive food pellet size range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodSizeRange {
    pub min: f32,
    pub max: f32,
}

impl FoodSizeRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draw one pellet size.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.random_range(self.min..=self.max)
        } else {
            self.min
        }
    }
}

/// Field settings a mother cell needs for its update.
#[derive(Debug, Clone, Copy)]
pub struct Shedding {
    pub food: FoodSizeRange,
    /// Player eject size; an oversized mother loses `eject_size / 8` per update.
    pub eject_size: f32,
    /// Chance that an update at rest sheds at all.
    pub chance: f32,
}

/// A pellet the field should create.
#[derive(Debug, Clone, Copy)]
pub struct FoodSpawn {
    pub position: Vec2,
    pub size: f32,
    /// Direction of the outward push (radians).
    pub angle: f32,
    /// Push distance.
    pub boost: f32,
    pub color: Color,
}

/// Result of [`MotherCell::on_update`].
#[derive(Debug, Default)]
pub struct MotherUpdate {
    /// Pellets to spawn; each already holds a slot in the food budget.
    pub spawns: Vec<FoodSpawn>,
    /// The cell changed size and its spatial index entry must be refreshed.
    pub reindex: bool,
}

/// Mother cell that feeds the field.
#[derive(Debug, Clone)]
pub struct MotherCell {
    data: CellData,
    /// Resting size; the cell never sheds below it.
    pub min_size: f32,
    /// Shedding rounds attempted per qualifying update.
    pub spawn_amount: usize,
}

impl MotherCell {
    /// Create a mother cell; `size` defaults to the resting size.
    pub fn new(node_id: u32, position: Vec2, size: Option<f32>, tick: u64) -> Self {
        Self::with_limits(node_id, position, size, MOTHER_MIN_SIZE, MOTHER_SPAWN_AMOUNT, tick)
    }

    pub fn with_limits(
        node_id: u32,
        position: Vec2,
        size: Option<f32>,
        min_size: f32,
        spawn_amount: usize,
        tick: u64,
    ) -> Self {
        let size = size.filter(|s| *s > 0.0).unwrap_or(min_size);
        let mut data = CellData::new(node_id, CellType::MotherCell, position, size, tick);
        data.spiked = true;
        Self {
            data,
            min_size,
            spawn_amount,
        }
    }

    /// Absorb `prey` and spray pellets out of the meal.
    ///
    /// One pellet size is drawn for the whole meal; `floor(prey size / pellet size)`
    /// pellets are sprayed from the grown rim.
    pub fn on_eat<R: Rng + ?Sized>(&mut self, prey: &CellData, food: FoodSizeRange, rng: &mut R) -> Vec<FoodSpawn> {
        let size = (self.data.size_squared() + prey.size_squared()).sqrt();
        self.data.set_size(size);

        let unit = food.sample(rng);
        if unit <= 0.0 {
            return Vec::new();
        }
        let count = (prey.size / unit).floor() as usize;
        (0..count)
            .map(|_| {
                let boost = MEAL_BOOST_MIN + MEAL_BOOST_MIN * rng.random::<f32>();
                self.emit(unit, boost, rng)
            })
            .collect()
    }

    /// Periodic update.
    ///
    /// Below rest: nothing. Above rest: shrink by `eject_size / 8`, clamped to rest.
    /// At rest: with `chance`, shed up to `spawn_amount` pellets while the food
    /// budget has room.
    pub fn on_update<R: Rng + ?Sized>(&mut self, shedding: &Shedding, budget: &mut FoodBudget, rng: &mut R) -> MotherUpdate {
        let mut size = self.data.size;
        if size < self.min_size {
            return MotherUpdate::default();
        }
        if size > self.min_size {
            self.data.set_size((size - shedding.eject_size / 8.0).max(self.min_size));
            return MotherUpdate::default();
        }

        if rng.random::<f32>() > shedding.chance {
            return MotherUpdate::default();
        }
        if budget.is_saturated() {
            return MotherUpdate::default();
        }

        let mut update = MotherUpdate::default();
        for _ in 0..self.spawn_amount {
            if !budget.reserve() {
                break;
            }
            let unit = shedding.food.sample(rng);
            size = shed_size(size, unit, self.min_size);
            self.data.set_size(size);

            let boost = SHED_BOOST_MIN + SHED_BOOST_MIN * rng.random::<f32>();
            update.spawns.push(self.emit(unit, boost, rng));

            // At rest every round clamps to `min_size`; only the budget ends the batch early.
            if budget.is_saturated() {
                break;
            }
        }
        update.reindex = true;
        update
    }

    /// A pellet on the rim at a random angle, pushed outwards.
    fn emit<R: Rng + ?Sized>(&self, size: f32, boost: f32, rng: &mut R) -> FoodSpawn {
        let angle = rng.random::<f32>() * TAU;
        let r = self.data.size;
        FoodSpawn {
            position: self.data.position + Vec2::new(r * angle.sin(), r * angle.cos()),
            size,
            angle,
            boost,
            color: Color::random(rng),
        }
    }
}

/// Size left after moving a pellet of `unit` out of a cell of `size`,
/// never below `min_size`.
#[inline]
pub(crate) fn shed_size(size: f32, unit: f32, min_size: f32) -> f32 {
    (size * size - unit * unit).max(0.0).sqrt().max(min_size)
}

impl Cell for MotherCell {
    fn data(&self) -> &CellData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut CellData {
        &mut self.data
    }

    /// Mother cells eat player cells and ejected mass.
    fn can_eat(&self, other: &CellData) -> bool {
        matches!(other.cell_type, CellType::Player | CellType::EjectedMass)
    }

    /// Same as a virus: the eater pops.
    fn on_eaten(&mut self, eater_id: u32) -> EatenReaction {
        Virus::pop_eater(&mut self.data, eater_id)
    }
}
