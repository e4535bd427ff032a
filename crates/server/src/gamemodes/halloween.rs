//! Halloween: mother cells feed a themed field.
//!
//! While active the mode keeps a minimum population of mother cells alive,
//! forces their periodic update, lets viruses drift in spirals and get pushed
//! by what they eat, and paints food and mother cells in the theme color.

use super::{GameMode, Roster};
use crate::behavior::{BehaviorOverlay, Tint, VirusFeeding};
use crate::color::Color;
use crate::config::Config;
use crate::entity::{CellType, MotherCell};
use crate::game::GameState;
use crate::world::CellEntry;
use glam::Vec2;
use tracing::{debug, info, trace};

const HALLOWEEN_ID: u32 = 3;
const THEME_SPREAD: i16 = 20;

/// Config fields the mode overrides while it runs.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ConfigSnapshot {
    food_min_amount: usize,
    food_max_amount: usize,
    virus_min_amount: usize,
    virus_max_amount: usize,
    virus_spirals: bool,
    virus_moving: bool,
    virus_color: Color,
}

impl ConfigSnapshot {
    fn take(config: &Config) -> Self {
        Self {
            food_min_amount: config.food.min_amount,
            food_max_amount: config.food.max_amount,
            virus_min_amount: config.virus.min_amount,
            virus_max_amount: config.virus.max_amount,
            virus_spirals: config.virus.spirals,
            virus_moving: config.virus.moving,
            virus_color: config.virus.color,
        }
    }

    fn restore(&self, config: &mut Config) {
        config.food.min_amount = self.food_min_amount;
        config.food.max_amount = self.food_max_amount;
        config.virus.min_amount = self.virus_min_amount;
        config.virus.max_amount = self.virus_max_amount;
        config.virus.spirals = self.virus_spirals;
        config.virus.moving = self.virus_moving;
        config.virus.color = self.virus_color;
    }
}

pub struct Halloween {
    mothers: Roster,
    beacon: Option<u32>,
    mother_min_amount: usize,
    mother_max_amount: usize,
    spawn_interval: u64,
    update_interval: u64,
    tick_since_spawn: u64,
    tick_since_update: u64,
    snapshot: Option<ConfigSnapshot>,
}

impl Halloween {
    pub fn new() -> Self {
        Self {
            mothers: Roster::new(),
            beacon: None,
            mother_min_amount: 20,
            mother_max_amount: 30,
            spawn_interval: 25 * 5,
            update_interval: 5,
            tick_since_spawn: 0,
            tick_since_update: 0,
            snapshot: None,
        }
    }

    /// Mother cells currently owned by the mode.
    pub fn mothers(&self) -> &Roster {
        &self.mothers
    }

    /// Population band `(min, max)` derived from the map size.
    pub fn mother_targets(&self) -> (usize, usize) {
        (self.mother_min_amount, self.mother_max_amount)
    }

    fn overlay(push_distance: f32) -> BehaviorOverlay {
        BehaviorOverlay {
            virus_feeding: Some(VirusFeeding::Push { distance: push_distance }),
            food_tint: Some(Tint::Themed { spread: THEME_SPREAD }),
            mother_tint: Some(Tint::Themed { spread: THEME_SPREAD }),
        }
    }

    /// Try to place one mother cell at a random free position.
    ///
    /// Skipped while the minimum population is met; aborted silently when the
    /// position is occupied.
    pub fn try_spawn_mother(&mut self, state: &mut GameState) -> Option<u32> {
        if self.mothers.len() >= self.mother_min_amount {
            return None;
        }
        let pos = state.world.random_position(&mut state.rng);
        let clearance = state.config.halloween.clearance_radius as f32;
        if state.world.will_collide(pos, clearance) {
            trace!("Halloween: spawn position ({:.0}, {:.0}) occupied", pos.x, pos.y);
            return None;
        }

        let id = state.world.next_id();
        let mother = MotherCell::with_limits(
            id,
            pos,
            None,
            state.config.mother.min_size as f32,
            state.config.mother.spawn_amount,
            state.tick_count,
        );
        let added = state.world.add_node(CellEntry::Mother(mother), &mut state.rng);
        self.mothers.track(added.id);
        debug!(
            "Halloween: mother cell {} spawned at ({:.0}, {:.0}), {} alive",
            added.id,
            pos.x,
            pos.y,
            self.mothers.len()
        );
        Some(added.id)
    }

    fn update_mothers(&mut self, state: &mut GameState) {
        for &id in self.mothers.ids() {
            state.world.update_mother(id, &mut state.rng);
        }
    }
}

impl Default for Halloween {
    fn default() -> Self {
        Self::new()
    }
}

impl GameMode for Halloween {
    fn name(&self) -> &str {
        "Halloween"
    }

    fn id(&self) -> u32 {
        HALLOWEEN_ID
    }

    fn on_server_init(&mut self, state: &mut GameState) {
        let map_size = state.world.border.map_size() as f64;
        let settings = state.config.halloween.clone();

        // Re-activation keeps the snapshot of the config the mode first replaced.
        if self.snapshot.is_none() {
            self.snapshot = Some(ConfigSnapshot::take(&state.config));
        }
        let config = &mut state.config;
        config.virus.spirals = true;
        config.virus.moving = true;
        config.virus.color = settings.theme_color;
        config.food.min_amount = (map_size / 6.0).ceil() as usize;
        config.food.max_amount = (map_size / 4.0).ceil() as usize;
        config.virus.min_amount = (map_size / 850.0).ceil() as usize;
        config.virus.max_amount = (map_size / 350.0).ceil() as usize;
        state.sync_field_settings();

        self.mother_min_amount = (map_size / settings.density).ceil() as usize;
        self.mother_max_amount = (self.mother_min_amount as f64 * 1.5).ceil() as usize;
        self.spawn_interval = settings.spawn_interval;
        self.update_interval = settings.update_interval;
        self.tick_since_spawn = 0;
        self.tick_since_update = 0;

        let behaviors = &mut state.world.behaviors;
        behaviors.pop(HALLOWEEN_ID);
        behaviors.push(HALLOWEEN_ID, Self::overlay(settings.push_distance as f32));

        info!(
            "Halloween active: {}-{} mother cells, food {}-{}, viruses {}-{}",
            self.mother_min_amount,
            self.mother_max_amount,
            state.config.food.min_amount,
            state.config.food.max_amount,
            state.config.virus.min_amount,
            state.config.virus.max_amount
        );
    }

    fn on_change(&mut self, state: &mut GameState) {
        let mothers = self.mothers.clear();
        let removed = mothers
            .into_iter()
            .filter(|&id| state.world.remove_node(id).is_some())
            .count();
        if let Some(beacon) = self.beacon.take() {
            state.world.remove_node(beacon);
        }

        state.world.behaviors.pop(HALLOWEEN_ID);
        if let Some(snapshot) = self.snapshot.take() {
            snapshot.restore(&mut state.config);
            state.sync_field_settings();
        }
        info!("Halloween ended: removed {} mother cells", removed);
    }

    fn on_tick(&mut self, state: &mut GameState) {
        if self.beacon.is_none() {
            let size = state.config.halloween.beacon_size as f32;
            let color = state.config.virus.color;
            let added = state.world.add_beacon(Vec2::ZERO, size, color, &mut state.rng);
            self.beacon = Some(added.id);
        }

        if self.tick_since_spawn >= self.spawn_interval {
            self.tick_since_spawn = 0;
            self.try_spawn_mother(state);
        } else {
            self.tick_since_spawn += 1;
        }

        if self.tick_since_update >= self.update_interval {
            self.tick_since_update = 0;
            self.update_mothers(state);
        } else {
            self.tick_since_update += 1;
        }
    }

    fn on_node_removed(&mut self, id: u32, cell_type: CellType) {
        match cell_type {
            CellType::MotherCell => {
                self.mothers.untrack(id);
            }
            CellType::Beacon if self.beacon == Some(id) => self.beacon = None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::NodeRemoved;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn state(map: f64) -> GameState {
        let mut config = Config::default();
        config.border.width = map;
        config.border.height = map;
        config.server.seed = Some(2024);
        config.server.gamemode = 0;
        GameState::new(config)
    }

    #[test]
    fn activation_scales_field_to_map_size() {
        let mut state = state(14142.0);
        let mut mode = Halloween::new();
        mode.on_server_init(&mut state);

        assert_eq!(mode.mother_targets(), (8, 12));
        assert_eq!(state.config.food.min_amount, 2357);
        assert_eq!(state.config.food.max_amount, 3536);
        assert_eq!(state.config.virus.min_amount, 17);
        assert_eq!(state.config.virus.max_amount, 41);
        assert!(state.config.virus.spirals && state.config.virus.moving);
        assert_eq!(state.world.food_budget.max(), 3536);
        assert_eq!(state.world.settings.virus_color, Color::new(230, 60, 10));
        assert_eq!(
            state.world.behaviors.active().virus_feeding,
            VirusFeeding::Push { distance: 320.0 }
        );
    }

    #[test]
    fn deactivation_restores_config_and_behaviors() {
        let mut state = state(6000.0);
        let before_config = ConfigSnapshot::take(&state.config);
        let before_behaviors = state.world.behaviors.active();

        for _ in 0..3 {
            let mut mode = Halloween::new();
            mode.on_server_init(&mut state);
            mode.on_tick(&mut state);
            mode.try_spawn_mother(&mut state);
            mode.on_change(&mut state);

            assert_eq!(ConfigSnapshot::take(&state.config), before_config);
            assert_eq!(state.world.behaviors.active(), before_behaviors);
            assert_eq!(state.world.behaviors.depth(), 0);
            assert!(state.world.mother_cells.is_empty());
            assert!(mode.mothers().is_empty());
            assert_eq!(state.world.cell_count(), 0);
        }
    }

    #[test]
    fn repeated_activation_restores_first_config() {
        let mut state = state(6000.0);
        let before_config = ConfigSnapshot::take(&state.config);
        let before_behaviors = state.world.behaviors.active();

        let mut mode = Halloween::new();
        mode.on_server_init(&mut state);
        mode.on_server_init(&mut state);
        assert_eq!(state.world.behaviors.depth(), 1);

        mode.on_change(&mut state);
        assert_eq!(ConfigSnapshot::take(&state.config), before_config);
        assert_eq!(state.world.behaviors.active(), before_behaviors);
        assert_eq!(state.world.behaviors.depth(), 0);

        // A second teardown has nothing left to restore.
        mode.on_change(&mut state);
        assert_eq!(ConfigSnapshot::take(&state.config), before_config);
        assert_eq!(state.world.behaviors.depth(), 0);
    }

    #[test]
    fn spawn_attempts_follow_the_interval() {
        let mut state = state(14142.0);
        state.config.halloween.beacon_size = 1.0;
        let mut mode = Halloween::new();
        mode.on_server_init(&mut state);
        assert_eq!(mode.spawn_interval, 125);

        for _ in 0..125 {
            mode.on_tick(&mut state);
        }
        assert!(mode.mothers().is_empty());
        assert!(state.world.mother_cells.is_empty());
        assert_eq!(mode.tick_since_spawn, 125);

        mode.on_tick(&mut state);
        assert_eq!(mode.mothers().len(), 1);
        assert_eq!(state.world.mother_cells.len(), 1);
        assert_eq!(mode.tick_since_spawn, 0);

        for _ in 0..125 {
            mode.on_tick(&mut state);
        }
        assert_eq!(mode.mothers().len(), 1);

        mode.on_tick(&mut state);
        assert_eq!(mode.mothers().len(), 2);
    }

    #[test]
    fn spawning_stops_at_minimum_population() {
        let mut state = state(4000.0);
        let mut mode = Halloween::new();
        mode.on_server_init(&mut state);
        assert_eq!(mode.mother_targets(), (2, 3));

        for _ in 0..200 {
            mode.try_spawn_mother(&mut state);
        }
        assert_eq!(mode.mothers().len(), 2);
        assert_eq!(state.world.mother_cells.len(), 2);
        assert!(mode.try_spawn_mother(&mut state).is_none());
    }

    #[test]
    fn occupied_field_gets_no_mother() {
        let mut state = state(1000.0);
        let mut mode = Halloween::new();
        mode.on_server_init(&mut state);
        let mut rng = StdRng::seed_from_u64(1);
        state.world.add_player_cell(1, Vec2::ZERO, 1000.0, &mut rng);

        for _ in 0..20 {
            assert!(mode.try_spawn_mother(&mut state).is_none());
        }
        assert!(state.world.mother_cells.is_empty());
        assert!(mode.mothers().is_empty());
    }

    #[test]
    fn beacon_is_placed_once() {
        let mut state = state(4000.0);
        let mut mode = Halloween::new();
        mode.on_server_init(&mut state);
        for _ in 0..10 {
            mode.on_tick(&mut state);
        }
        let beacons = state
            .world
            .cells
            .values()
            .filter(|cell| cell.cell_type() == CellType::Beacon)
            .count();
        assert_eq!(beacons, 1);
    }

    #[test]
    fn update_interval_drives_themed_shedding() {
        let mut state = state(4000.0);
        state.config.mother.shed_chance = 1.0;
        let mut mode = Halloween::new();
        mode.on_server_init(&mut state);
        let id = mode.try_spawn_mother(&mut state).unwrap();

        for _ in 0..5 {
            mode.on_tick(&mut state);
        }
        assert!(state.world.food_cells.is_empty());

        mode.on_tick(&mut state);
        assert_eq!(state.world.food_cells.len(), 2);
        assert_eq!(state.world.food_budget.current(), 2);
        for &food in state.world.food_cells.ids() {
            assert_eq!(state.world.get_cell(food).unwrap().data().color.b, 0);
        }
        assert_eq!(state.world.get_cell(id).unwrap().data().size, 149.0);
    }

    #[test]
    fn removed_mothers_leave_the_roster() {
        let mut state = state(4000.0);
        let mut mode = Halloween::new();
        mode.on_server_init(&mut state);
        let id = mode.try_spawn_mother(&mut state).unwrap();

        state.world.remove_node(id);
        for NodeRemoved { id, cell_type } in state.world.take_removed() {
            mode.on_node_removed(id, cell_type);
        }
        assert!(mode.mothers().is_empty());

        // A stray removal is logged and ignored.
        mode.on_node_removed(id, CellType::MotherCell);
        assert!(mode.mothers().is_empty());
    }

    #[test]
    fn mother_color_follows_theme() {
        let mut state = state(4000.0);
        let mut mode = Halloween::new();
        mode.on_server_init(&mut state);
        let id = mode.try_spawn_mother(&mut state).unwrap();
        let color = state.world.get_cell(id).unwrap().data().color;
        assert_eq!(color.b, 0);
        assert!((210..=250).contains(&color.r));
    }
}
