//! Game state and main loop.

use crate::config::Config;
use crate::gamemodes::{GameMode, ffa::Ffa, get_gamemode};
use crate::world::{CellCounts, NodeRemoved, World};
use futures_util::FutureExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, trace, warn};

/// Snapshot of the field for periodic reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStats {
    pub tick: u64,
    pub gamemode: String,
    pub counts: CellCounts,
    pub food_budget: (usize, usize),
    pub tick_ms_avg: f64,
}

/// Main game state.
pub struct GameState {
    pub config: Config,
    pub world: World,
    pub tick_count: u64,
    pub gamemode: Box<dyn GameMode>,
    pub rng: StdRng,
    /// Smoothed tick duration in milliseconds.
    pub update_time_avg: f64,
}

impl GameState {
    pub fn new(config: Config) -> Self {
        let rng = match config.server.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let world = World::from_config(&config);
        let gamemode = get_gamemode(config.server.gamemode);
        Self {
            config,
            world,
            tick_count: 0,
            gamemode,
            rng,
            update_time_avg: 0.0,
        }
    }

    /// Activate the configured mode and fill the field for the first time.
    pub fn init(&mut self) {
        let mut gamemode = std::mem::replace(&mut self.gamemode, Box::new(Ffa::new()));
        gamemode.on_server_init(self);
        self.gamemode = gamemode;

        // Faster initial spawn
        let food_spawn = self.config.food.spawn_amount * 10;
        self.world
            .spawn_food(self.config.food.min_amount, food_spawn, &mut self.rng);
        self.world.spawn_viruses(
            self.config.virus.min_amount,
            self.config.virus.max_amount,
            &mut self.rng,
        );

        let counts = self.world.cell_counts();
        info!(
            "World initialized ({}): {} food, {} viruses",
            self.gamemode.name(),
            counts.food,
            counts.viruses
        );
    }

    /// Push config changes into the world.
    pub fn sync_field_settings(&mut self) {
        self.world.apply_config(&self.config);
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) {
        self.tick_count += 1;
        self.world.tick = self.tick_count;

        // Field maintenance
        let food = &self.config.food;
        self.world
            .spawn_food(food.min_amount, food.spawn_amount, &mut self.rng);
        let virus = &self.config.virus;
        self.world
            .spawn_viruses(virus.min_amount, virus.max_amount, &mut self.rng);

        self.world.update_moving_cells();
        self.world.update_viruses();
        self.world.process_feeding(&mut self.rng);
        self.dispatch_removals();

        let mut gamemode = std::mem::replace(&mut self.gamemode, Box::new(Ffa::new()));
        gamemode.on_tick(self);
        self.gamemode = gamemode;
        self.dispatch_removals();

        let interval = self.config.server.stats_interval_ticks;
        if interval > 0 && self.tick_count % interval == 0 {
            let counts = self.world.cell_counts();
            debug!(
                "Tick #{}: {} cells ({} food, {} viruses, {} mothers), food budget {}/{}",
                self.tick_count,
                counts.total,
                counts.food,
                counts.viruses,
                counts.mothers,
                self.world.food_budget.current(),
                self.world.food_budget.max()
            );
        }
    }

    /// Forward removals recorded by the world to the active mode.
    fn dispatch_removals(&mut self) {
        for NodeRemoved { id, cell_type } in self.world.take_removed() {
            self.gamemode.on_node_removed(id, cell_type);
        }
    }

    /// Deactivate the current mode and activate `id`.
    pub fn change_gamemode(&mut self, id: u32) {
        let mut old = std::mem::replace(&mut self.gamemode, Box::new(Ffa::new()));
        for NodeRemoved { id, cell_type } in self.world.take_removed() {
            old.on_node_removed(id, cell_type);
        }
        old.on_change(self);
        let discarded = self.world.take_removed().len();
        trace!("Discarded {} removals from the outgoing mode", discarded);

        let mut new = get_gamemode(id);
        self.config.server.gamemode = id;
        new.on_server_init(self);
        info!("Game mode changed: {} -> {}", old.name(), new.name());
        self.gamemode = new;
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats {
            tick: self.tick_count,
            gamemode: self.gamemode.name().to_string(),
            counts: self.world.cell_counts(),
            food_budget: (self.world.food_budget.current(), self.world.food_budget.max()),
            tick_ms_avg: self.update_time_avg,
        }
    }
}

/// Run the fixed-rate game loop.
pub async fn run_game_loop(state: Arc<RwLock<GameState>>, tick_interval_ms: u64) {
    let start = Instant::now() + Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    {
        let mut game = state.write().await;
        info!("Initial world spawn...");
        game.init();
    }

    loop {
        let scheduled = ticker.tick().await;

        // Drain any backlog so the simulation does not try to catch up in a burst.
        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} ticks to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        let mut game = state.write().await;
        let tick_start = std::time::Instant::now();
        game.tick();
        let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;
        game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;

        let tick_budget = tick_interval_ms as f64 * 0.9;
        if tick_ms > tick_budget {
            warn!(
                "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} cells total",
                game.tick_count,
                tick_ms,
                tick_budget,
                game.world.cell_count()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(gamemode: u32, map: f64) -> Config {
        let mut config = Config::default();
        config.server.gamemode = gamemode;
        config.server.seed = Some(99);
        config.border.width = map;
        config.border.height = map;
        config
    }

    #[test]
    fn init_activates_mode_and_fills_field() {
        let mut state = GameState::new(config(3, 4000.0));
        state.init();

        assert_eq!(state.gamemode.name(), "Halloween");
        assert_eq!(state.world.behaviors.depth(), 1);
        assert_eq!(state.world.food_cells.len(), 600);
        assert_eq!(state.world.virus_cells.len(), 5);
        assert_eq!(state.world.food_budget.max(), 1000);
    }

    #[test]
    fn ticks_keep_food_budget_in_step_with_field() {
        let mut state = GameState::new(config(3, 4000.0));
        state.config.mother.shed_chance = 1.0;
        state.init();
        for _ in 0..400 {
            state.tick();
            assert_eq!(state.world.food_budget.current(), state.world.food_cells.len());
            assert!(state.world.food_budget.current() <= state.world.food_budget.max());
            assert!(state.world.mother_cells.len() <= 3);
        }
        assert_eq!(state.tick_count, 400);
        assert_eq!(state.world.tick, 400);
        assert!(state.world.take_removed().is_empty());
    }

    #[test]
    fn ffa_field_stays_unthemed() {
        let mut state = GameState::new(config(0, 4000.0));
        state.init();
        for _ in 0..50 {
            state.tick();
        }
        assert_eq!(state.gamemode.name(), "FFA");
        assert_eq!(state.world.behaviors.depth(), 0);
        assert!(state.world.mother_cells.is_empty());
        assert_eq!(state.world.food_budget.max(), 2000);
        assert!(!state.world.settings.virus_moving);
    }

    #[test]
    fn changing_mode_tears_halloween_down() {
        let mut state = GameState::new(config(3, 4000.0));
        state.init();
        for _ in 0..300 {
            state.tick();
        }

        state.change_gamemode(0);
        assert_eq!(state.gamemode.name(), "FFA");
        assert_eq!(state.config.server.gamemode, 0);
        assert_eq!(state.config.food.max_amount, 2000);
        assert_eq!(state.config.virus.min_amount, 50);
        assert!(!state.config.virus.moving);
        assert_eq!(state.world.behaviors.depth(), 0);
        assert!(state.world.mother_cells.is_empty());
        assert_eq!(state.world.food_budget.max(), 2000);
        assert!(state.world.take_removed().is_empty());

        state.change_gamemode(3);
        assert_eq!(state.world.behaviors.depth(), 1);
        assert_eq!(state.config.food.max_amount, 1000);
    }

    #[test]
    fn stats_report_mode_and_budget() {
        let mut state = GameState::new(config(3, 4000.0));
        state.init();
        let stats = state.stats();
        assert_eq!(stats.tick, 0);
        assert_eq!(stats.gamemode, "Halloween");
        assert_eq!(stats.food_budget, (600, 1000));
        assert_eq!(stats.counts.food, 600);
    }
}
