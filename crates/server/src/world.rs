//! World state management.
//!
//! The world is the field every cell lives on. It owns the cells, the per-type
//! id lists, the spatial grid, the food budget and the behavior registry, and
//! it runs each type's add behavior when a cell enters.

use crate::behavior::BehaviorRegistry;
use crate::budget::FoodBudget;
use crate::color::Color;
use crate::config::Config;
use crate::entity::{
    Beacon, Cell, CellData, CellType, EatenReaction, EjectedMass, Food, FoodSizeRange, FoodSpawn, MotherCell,
    PlayerCell, Shedding, Virus,
};
use crate::spatial::{Bounds, GridItem, SpatialGrid};
use glam::Vec2;
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, error, trace};

/// Mother cells eat anything up to their own size.
const MOTHER_EAT_MULT: f32 = 1.0;
/// Prey must sink this deep: `distance < eater - prey / EAT_OVERLAP_DIV`.
const EAT_OVERLAP_DIV: f32 = 3.0;
/// Distance a free-moving virus drifts per tick.
const VIRUS_DRIFT_SPEED: f32 = 2.0;
/// Heading change per tick for spiralling viruses (radians).
const VIRUS_SPIRAL_TURN: f32 = 0.02;

/// Field-wide settings read by cells and behaviors.
#[derive(Debug, Clone, Copy)]
pub struct FieldSettings {
    pub food: FoodSizeRange,
    pub eject_size: f32,
    pub virus_color: Color,
    pub virus_min_size: f32,
    pub virus_max_size: f32,
    pub virus_max_amount: usize,
    pub virus_eject_speed: f32,
    pub virus_moving: bool,
    pub virus_spirals: bool,
    pub mother_shed_chance: f32,
}

impl FieldSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            food: FoodSizeRange::new(config.food.min_size as f32, config.food.max_size as f32),
            eject_size: config.eject.size as f32,
            virus_color: config.virus.color,
            virus_min_size: config.virus.min_size as f32,
            virus_max_size: config.virus.max_size as f32,
            virus_max_amount: config.virus.max_amount,
            virus_eject_speed: config.virus.eject_speed as f32,
            virus_moving: config.virus.moving,
            virus_spirals: config.virus.spirals,
            mother_shed_chance: config.mother.shed_chance as f32,
        }
    }

    fn shedding(&self) -> Shedding {
        Shedding {
            food: self.food,
            eject_size: self.eject_size,
            chance: self.mother_shed_chance,
        }
    }
}

/// Ordered id list with O(1) removal.
#[derive(Debug, Default)]
pub struct IdList {
    ids: Vec<u32>,
    pos: HashMap<u32, usize>,
}

impl IdList {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            pos: HashMap::with_capacity(capacity),
        }
    }

    /// Add an id; duplicates are ignored.
    pub fn insert(&mut self, id: u32) {
        if !self.pos.contains_key(&id) {
            self.pos.insert(id, self.ids.len());
            self.ids.push(id);
        }
    }

    /// Swap-remove an id. Returns false if it was not listed.
    pub fn remove(&mut self, id: u32) -> bool {
        let Some(pos) = self.pos.remove(&id) else {
            return false;
        };
        self.ids.swap_remove(pos);
        if let Some(&swapped) = self.ids.get(pos) {
            self.pos.insert(swapped, pos);
        }
        true
    }

    #[inline]
    pub fn contains(&self, id: u32) -> bool {
        self.pos.contains_key(&id)
    }

    #[inline]
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A cell entry in the world.
#[derive(Debug)]
pub enum CellEntry {
    Player(PlayerCell),
    Food(Food),
    Virus(Virus),
    Eject(EjectedMass),
    Mother(MotherCell),
    Beacon(Beacon),
}

impl CellEntry {
    pub fn data(&self) -> &CellData {
        match self {
            CellEntry::Player(c) => c.data(),
            CellEntry::Food(c) => c.data(),
            CellEntry::Virus(c) => c.data(),
            CellEntry::Eject(c) => c.data(),
            CellEntry::Mother(c) => c.data(),
            CellEntry::Beacon(c) => c.data(),
        }
    }

    pub fn data_mut(&mut self) -> &mut CellData {
        match self {
            CellEntry::Player(c) => c.data_mut(),
            CellEntry::Food(c) => c.data_mut(),
            CellEntry::Virus(c) => c.data_mut(),
            CellEntry::Eject(c) => c.data_mut(),
            CellEntry::Mother(c) => c.data_mut(),
            CellEntry::Beacon(c) => c.data_mut(),
        }
    }

    #[inline]
    pub fn cell_type(&self) -> CellType {
        self.data().cell_type
    }

    pub fn can_eat(&self, other: &CellData) -> bool {
        match self {
            CellEntry::Player(c) => c.can_eat(other),
            CellEntry::Food(c) => c.can_eat(other),
            CellEntry::Virus(c) => c.can_eat(other),
            CellEntry::Eject(c) => c.can_eat(other),
            CellEntry::Mother(c) => c.can_eat(other),
            CellEntry::Beacon(c) => c.can_eat(other),
        }
    }

    pub fn on_eaten(&mut self, eater_id: u32) -> EatenReaction {
        match self {
            CellEntry::Player(c) => c.on_eaten(eater_id),
            CellEntry::Food(c) => c.on_eaten(eater_id),
            CellEntry::Virus(c) => c.on_eaten(eater_id),
            CellEntry::Eject(c) => c.on_eaten(eater_id),
            CellEntry::Mother(c) => c.on_eaten(eater_id),
            CellEntry::Beacon(c) => c.on_eaten(eater_id),
        }
    }
}

/// Returned by [`World::add_node`]: the cell is registered under `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAdded {
    pub id: u32,
    pub cell_type: CellType,
}

/// Recorded by [`World::remove_node`] and drained by the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRemoved {
    pub id: u32,
    pub cell_type: CellType,
}

/// World border bounds.
#[derive(Debug, Clone, Copy)]
pub struct WorldBorder {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub width: f32,
    pub height: f32,
}

impl WorldBorder {
    pub fn new(width: f32, height: f32) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Self {
            min_x: -half_w,
            min_y: -half_h,
            max_x: half_w,
            max_y: half_h,
            width,
            height,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.min_x, self.min_y)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.max_x, self.max_y)
    }

    /// Larger of width and height.
    #[inline]
    pub fn map_size(&self) -> f32 {
        self.width.max(self.height)
    }

    /// Get a random position within the border.
    #[inline]
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            rng.random_range(self.min_x..self.max_x),
            rng.random_range(self.min_y..self.max_y),
        )
    }
}

/// The game world containing all cells.
#[derive(Debug)]
pub struct World {
    next_node_id: u32,
    /// Current simulation tick, stamped on new cells.
    pub tick: u64,

    /// All cells by ID.
    pub(crate) cells: HashMap<u32, CellEntry>,

    pub player_cells: IdList,
    pub food_cells: IdList,
    pub virus_cells: IdList,
    pub eject_cells: IdList,
    pub mother_cells: IdList,
    /// Cells that are currently moving (boosted).
    pub moving_cells: IdList,

    pub border: WorldBorder,
    pub grid: SpatialGrid,

    pub food_budget: FoodBudget,
    pub behaviors: BehaviorRegistry,
    pub settings: FieldSettings,

    removed: Vec<NodeRemoved>,
}

impl World {
    /// Create a new world with the given border size.
    pub fn new(width: f32, height: f32, settings: FieldSettings, food_max: usize) -> Self {
        let border = WorldBorder::new(width, height);
        Self {
            next_node_id: 1,
            tick: 0,
            cells: HashMap::with_capacity(2048),
            player_cells: IdList::with_capacity(256),
            food_cells: IdList::with_capacity(1024),
            virus_cells: IdList::with_capacity(64),
            eject_cells: IdList::with_capacity(256),
            mother_cells: IdList::with_capacity(16),
            moving_cells: IdList::with_capacity(256),
            grid: SpatialGrid::for_world(border.min_x, border.min_y, border.max_x, border.max_y),
            border,
            food_budget: FoodBudget::new(food_max),
            behaviors: BehaviorRegistry::default(),
            settings,
            removed: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.border.width as f32,
            config.border.height as f32,
            FieldSettings::from_config(config),
            config.food.max_amount,
        )
    }

    /// Re-read field settings and the food limit after a config change.
    pub fn apply_config(&mut self, config: &Config) {
        self.settings = FieldSettings::from_config(config);
        self.food_budget.set_limit(config.food.max_amount);
    }

    /// Get the next node ID.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next_node_id;
        self.next_node_id = self.next_node_id.wrapping_add(1);
        if self.next_node_id == 0 {
            self.next_node_id = 1; // Skip 0
        }
        id
    }

    #[inline]
    pub fn get_cell(&self, id: u32) -> Option<&CellEntry> {
        self.cells.get(&id)
    }

    #[inline]
    pub fn get_cell_mut(&mut self, id: u32) -> Option<&mut CellEntry> {
        self.cells.get_mut(&id)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn list_mut(&mut self, cell_type: CellType) -> Option<&mut IdList> {
        match cell_type {
            CellType::Player => Some(&mut self.player_cells),
            CellType::Food => Some(&mut self.food_cells),
            CellType::Virus => Some(&mut self.virus_cells),
            CellType::EjectedMass => Some(&mut self.eject_cells),
            CellType::MotherCell => Some(&mut self.mother_cells),
            CellType::Beacon => None,
        }
    }

    /// Register a cell on the field and run its type's add behavior.
    pub fn add_node<R: Rng + ?Sized>(&mut self, entry: CellEntry, rng: &mut R) -> NodeAdded {
        self.insert_node(entry, rng, false)
    }

    /// `reserved` food already holds its budget slot.
    fn insert_node<R: Rng + ?Sized>(&mut self, mut entry: CellEntry, rng: &mut R, reserved: bool) -> NodeAdded {
        let behaviors = self.behaviors.active();
        let base = self.settings.virus_color;
        match &mut entry {
            CellEntry::Food(food) => {
                let color = behaviors.food_tint.apply(food.data().color, base, rng);
                food.set_color(color);
                if !reserved {
                    self.food_budget.acquire();
                }
            }
            CellEntry::Mother(mother) => {
                let data = mother.data_mut();
                data.color = behaviors.mother_tint.apply(data.color, base, rng);
            }
            _ => {}
        }

        let (min, max) = (self.border.min(), self.border.max());
        let data = entry.data_mut();
        data.check_border(min, max);
        let id = data.node_id;
        let cell_type = data.cell_type;
        let moving = data.is_moving();
        self.grid.insert(GridItem::new(id, data.position.x, data.position.y, data.size));

        if let Some(list) = self.list_mut(cell_type) {
            list.insert(id);
        }
        if moving {
            self.moving_cells.insert(id);
        }
        self.cells.insert(id, entry);
        NodeAdded { id, cell_type }
    }

    /// Remove a cell from the field. The removal is recorded for [`World::take_removed`].
    pub fn remove_node(&mut self, id: u32) -> Option<CellEntry> {
        let entry = self.cells.remove(&id)?;
        let cell_type = entry.cell_type();
        self.grid.remove(id);
        if let Some(list) = self.list_mut(cell_type) {
            if !list.remove(id) {
                error!("World::remove_node: cell {} missing from the {:?} list", id, cell_type);
            }
        }
        self.moving_cells.remove(id);
        if cell_type == CellType::Food {
            self.food_budget.release();
        }
        self.removed.push(NodeRemoved { id, cell_type });
        Some(entry)
    }

    /// Drain removals recorded since the last call.
    pub fn take_removed(&mut self) -> Vec<NodeRemoved> {
        std::mem::take(&mut self.removed)
    }

    #[inline]
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        self.border.random_position(rng)
    }

    #[inline]
    pub fn random_color<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        Color::random(rng)
    }

    /// Whether a circle of `radius` at `pos` would overlap any non-food cell.
    pub fn will_collide(&self, pos: Vec2, radius: f32) -> bool {
        let area = Bounds::from_center(pos.x, pos.y, radius);
        self.grid.any(&area, |item| {
            self.cells
                .get(&item.id)
                .is_some_and(|cell| cell.cell_type() != CellType::Food)
        })
    }

    /// Refresh a cell's spatial grid entry after it moved or resized.
    #[inline]
    pub fn update_node_quad(&mut self, id: u32) {
        if let Some(cell) = self.cells.get(&id) {
            let data = cell.data();
            self.grid.update(id, data.position.x, data.position.y, data.size);
        }
    }

    /// Get the count of each cell type.
    pub fn cell_counts(&self) -> CellCounts {
        CellCounts {
            players: self.player_cells.len(),
            food: self.food_cells.len(),
            viruses: self.virus_cells.len(),
            ejected: self.eject_cells.len(),
            mothers: self.mother_cells.len(),
            total: self.cells.len(),
        }
    }

    /// Top food up towards `min_amount`, at most `spawn_amount` per call
    /// (twice that while below the minimum) and never past the budget.
    pub fn spawn_food<R: Rng + ?Sized>(&mut self, min_amount: usize, spawn_amount: usize, rng: &mut R) -> usize {
        if self.food_budget.is_saturated() {
            return 0;
        }
        let current = self.food_budget.current();
        let count = if current < min_amount {
            (min_amount - current).min(spawn_amount * 2)
        } else {
            spawn_amount
        }
        .min(self.food_budget.available());

        for _ in 0..count {
            let pos = self.border.random_position(rng);
            let size = self.settings.food.sample(rng);
            let id = self.next_id();
            let mut food = Food::new(id, pos, size, self.tick);
            food.set_color(self.random_color(rng));
            self.add_node(CellEntry::Food(food), rng);
        }
        count
    }

    /// Spawn viruses up to the minimum amount.
    pub fn spawn_viruses<R: Rng + ?Sized>(&mut self, min_amount: usize, max_amount: usize, rng: &mut R) -> usize {
        let mut spawned = 0;
        while self.virus_cells.len() < min_amount && self.virus_cells.len() < max_amount {
            let pos = self.border.random_position(rng);
            let id = self.next_id();
            let mut virus = Virus::new(id, pos, self.settings.virus_min_size, self.tick);
            virus.set_color(self.settings.virus_color);
            virus.heading = rng.random::<f32>() * std::f32::consts::TAU;
            self.add_node(CellEntry::Virus(virus), rng);
            spawned += 1;
        }
        spawned
    }

    /// Create pellets handed out by a mother cell.
    pub fn emit_food<R: Rng + ?Sized>(&mut self, spawns: Vec<FoodSpawn>, reserved: bool, rng: &mut R) {
        for spawn in spawns {
            let id = self.next_id();
            let mut food = Food::new(id, spawn.position, spawn.size, self.tick);
            food.set_color(spawn.color);
            food.data_mut().set_boost(spawn.boost, spawn.angle);
            self.insert_node(CellEntry::Food(food), rng, reserved);
        }
    }

    /// Run one mother cell update. Returns false if `id` is not a mother cell.
    pub fn update_mother<R: Rng + ?Sized>(&mut self, id: u32, rng: &mut R) -> bool {
        let shedding = self.settings.shedding();
        let update = match self.cells.get_mut(&id) {
            Some(CellEntry::Mother(mother)) => mother.on_update(&shedding, &mut self.food_budget, rng),
            _ => return false,
        };
        let reindex = update.reindex;
        self.emit_food(update.spawns, true, rng);
        if reindex {
            self.update_node_quad(id);
        }
        true
    }

    /// Let `eater_id` consume `prey_id`.
    ///
    /// Returns the prey's reaction, or `None` if the meal is not allowed.
    pub fn consume<R: Rng + ?Sized>(&mut self, eater_id: u32, prey_id: u32, rng: &mut R) -> Option<EatenReaction> {
        if eater_id == prey_id {
            return None;
        }
        let allowed = match (self.cells.get(&eater_id), self.cells.get(&prey_id)) {
            (Some(eater), Some(prey)) => eater.can_eat(prey.data()),
            _ => false,
        };
        if !allowed {
            return None;
        }
        let mut prey = self.remove_node(prey_id)?;
        let reaction = prey.on_eaten(eater_id);
        let prey = prey.data();

        let feeding = self.behaviors.active().virus_feeding;
        let settings = self.settings;
        let mut spawns = Vec::new();
        let mut shot = None;
        let mut moving = false;
        match self.cells.get_mut(&eater_id) {
            Some(CellEntry::Mother(mother)) => {
                spawns = mother.on_eat(prey, settings.food, rng);
            }
            Some(CellEntry::Virus(virus)) => {
                shot = virus.on_eat(prey, feeding, settings.virus_min_size, settings.virus_max_size);
                moving = virus.data().is_moving();
            }
            Some(CellEntry::Player(player)) => {
                let data = player.data_mut();
                let size = (data.size_squared() + prey.size_squared()).sqrt();
                data.set_size(size);
            }
            _ => {}
        }

        if moving {
            self.moving_cells.insert(eater_id);
        }
        self.update_node_quad(eater_id);
        self.emit_food(spawns, false, rng);
        if let Some(angle) = shot {
            self.shoot_virus(eater_id, angle, rng);
        }
        if reaction == EatenReaction::PopEater {
            debug!("Cell {} popped by eating {}", eater_id, prey_id);
        }
        Some(reaction)
    }

    /// Launch a fresh virus out of `parent_id`.
    fn shoot_virus<R: Rng + ?Sized>(&mut self, parent_id: u32, angle: f32, rng: &mut R) {
        let Some(parent) = self.cells.get(&parent_id) else {
            return;
        };
        let position = parent.data().position;
        let id = self.next_id();
        let mut virus = Virus::new(id, position, self.settings.virus_min_size, self.tick);
        virus.set_color(self.settings.virus_color);
        virus.heading = angle;
        virus.data_mut().set_boost(self.settings.virus_eject_speed, angle);
        self.add_node(CellEntry::Virus(virus), rng);
    }

    /// Cells `eater_id` overlaps deeply enough to eat, per `may_eat`.
    fn prey_for(&self, eater_id: u32, may_eat: impl Fn(&CellData, &CellData) -> bool) -> Vec<u32> {
        let Some(eater) = self.cells.get(&eater_id) else {
            return Vec::new();
        };
        let eater = eater.data();
        let nearby = self.grid.find_in_radius(eater.position.x, eater.position.y, eater.size);
        nearby
            .into_iter()
            .filter(|&id| id != eater_id)
            .filter(|id| {
                let Some(prey) = self.cells.get(id) else {
                    return false;
                };
                let prey = prey.data();
                let threshold = eater.size - prey.size / EAT_OVERLAP_DIV;
                may_eat(eater, prey) && eater.position.distance(prey.position) < threshold
            })
            .collect()
    }

    /// Resolve meals of mother cells and viruses.
    pub fn process_feeding<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mothers = self.mother_cells.ids().to_vec();
        for mother_id in mothers {
            let Some(CellEntry::Mother(mother)) = self.cells.get(&mother_id) else {
                continue;
            };
            let mother = mother.clone();
            let prey = self.prey_for(mother_id, |eater, prey| {
                mother.can_eat(prey) && eater.size >= MOTHER_EAT_MULT * prey.size
            });
            for prey_id in prey {
                trace!("Mother cell {} eats {}", mother_id, prey_id);
                self.consume(mother_id, prey_id, rng);
            }
        }

        let viruses = self.virus_cells.ids().to_vec();
        for virus_id in viruses {
            if self.virus_cells.len() >= self.settings.virus_max_amount {
                break;
            }
            let prey = self.prey_for(virus_id, |eater, prey| {
                prey.cell_type == CellType::EjectedMass && eater.size > prey.size
            });
            if let Some(&prey_id) = prey.first() {
                self.consume(virus_id, prey_id, rng);
            }
        }
    }

    /// Advance boosted cells and drop the ones that stopped.
    pub fn update_moving_cells(&mut self) {
        let (min, max) = (self.border.min(), self.border.max());
        let moving = self.moving_cells.ids().to_vec();
        for id in moving {
            let still_moving = match self.cells.get_mut(&id) {
                Some(cell) => cell.data_mut().update_boost(min, max),
                None => false,
            };
            self.update_node_quad(id);
            if !still_moving {
                self.moving_cells.remove(id);
            }
        }
    }

    /// Let free viruses drift when the field asks for moving viruses.
    pub fn update_viruses(&mut self) {
        if !self.settings.virus_moving {
            return;
        }
        let turn = if self.settings.virus_spirals { VIRUS_SPIRAL_TURN } else { 0.0 };
        let (min, max) = (self.border.min(), self.border.max());
        let viruses = self.virus_cells.ids().to_vec();
        for id in viruses {
            if self.moving_cells.contains(id) {
                continue;
            }
            if let Some(CellEntry::Virus(virus)) = self.cells.get_mut(&id) {
                virus.drift(VIRUS_DRIFT_SPEED, turn);
                let before = virus.data().position;
                virus.data_mut().check_border(min, max);
                if virus.data().position != before {
                    // Turn around at the wall.
                    virus.heading += std::f32::consts::PI;
                }
            }
            self.update_node_quad(id);
        }
    }

    /// Place a beacon at `position`.
    pub fn add_beacon<R: Rng + ?Sized>(&mut self, position: Vec2, size: f32, color: Color, rng: &mut R) -> NodeAdded {
        let id = self.next_id();
        self.add_node(CellEntry::Beacon(Beacon::new(id, position, size, color, self.tick)), rng)
    }

    /// Add a player cell (used by hosts and tests).
    pub fn add_player_cell<R: Rng + ?Sized>(&mut self, owner_id: u32, position: Vec2, size: f32, rng: &mut R) -> NodeAdded {
        let id = self.next_id();
        self.add_node(CellEntry::Player(PlayerCell::new(id, owner_id, position, size, self.tick)), rng)
    }

    /// Add ejected mass flying along `angle`.
    pub fn add_eject<R: Rng + ?Sized>(&mut self, position: Vec2, size: f32, boost: Option<(f32, f32)>, rng: &mut R) -> NodeAdded {
        let id = self.next_id();
        let mut eject = EjectedMass::new(id, position, size, self.tick);
        eject.set_color(self.random_color(rng));
        if let Some((distance, angle)) = boost {
            eject.data_mut().set_boost(distance, angle);
        }
        self.add_node(CellEntry::Eject(eject), rng)
    }
}

/// Cell count statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellCounts {
    pub players: usize,
    pub food: usize,
    pub viruses: usize,
    pub ejected: usize,
    pub mothers: usize,
    pub total: usize,
}
