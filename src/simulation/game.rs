use std::time::Duration;

use glam::Vec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::simulation::SimulationConfig;
use crate::simulation::fire::spread_fire;
use crate::simulation::scheduler::{TickHandle, TickScheduler};
use crate::simulation::statistics::{compute_statistics, TickStatistics};
use crate::world::generation::{generate_valid_grid, GenerationError};
use crate::world::{Grid, GridPos, TileId, TileType, Villager, VillagerId, VillagerStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for the next scheduled tick.
    Running,
    /// Terminal until `restart`.
    GameOver(GameOverReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    VillagesLost,
    VillagersLost,
}

/// How a tick resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Fire is still spreading; another tick is scheduled.
    Continue,
    /// Fire stopped spreading; the wave advanced and a new grid was generated.
    WaveComplete { wave: u32 },
    GameOver(GameOverReason),
}

/// Result of a player click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickResult {
    Selected(GridPos),
    Swapped(GridPos, GridPos),
    /// A pending selection was dropped without swapping.
    Cancelled,
    /// Nothing selectable was clicked and nothing was pending.
    Ignored,
}

/// Notifications for the presentation layer.
///
/// Events accumulate inside the game until `Game::drain_events` is called, so
/// a caller that consumes them must drain once per frame. `restart` discards
/// anything left undrained.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GridGenerated { seed: u64, wave: u32 },
    VillagersSpawned { count: usize },
    TileChanged { id: TileId, pos: GridPos, tile_type: TileType },
    TileSelected { pos: GridPos, selected: bool },
    TilesSwapped { a: GridPos, b: GridPos },
    VillagerDied { id: VillagerId, position: Vec2 },
    VillagersPurged { count: usize },
    WaveStarted { wave: u32 },
    GameOver { wave: u32, reason: GameOverReason },
}

/// One game session: the grid, the villagers, and the tick/wave state machine.
#[derive(Debug)]
pub struct Game {
    config: SimulationConfig,
    rng: ChaCha8Rng,
    grid: Grid,
    grid_seed: u64,
    villagers: Vec<Villager>,
    next_villager_id: u32,
    wave: u32,
    tick_count: u64,
    village_tiles: Vec<TileId>,
    grass_tiles: Vec<TileId>,
    prev_village_count: usize,
    prev_grass_count: usize,
    selected: Option<TileId>,
    phase: GamePhase,
    scheduler: TickScheduler,
    pending_tick: Option<TickHandle>,
    last_statistics: Option<TickStatistics>,
    events: Vec<GameEvent>,
}

impl Game {
    /// Start a new game. `seed` drives every random choice of the session.
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self, GenerationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let generated = generate_valid_grid(&mut rng, &config.generation)?;
        let mut game = Self::empty(config, rng, generated.grid, generated.seed);
        game.spawn_random_villagers();
        game.begin_wave();
        Ok(game)
    }

    /// Start a game on a prepared grid with villagers at the given cells.
    /// Later waves are generated from `seed`.
    pub fn from_grid(config: SimulationConfig, seed: u64, grid: Grid, spawns: &[GridPos]) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let mut game = Self::empty(config, rng, grid, seed);
        for &pos in spawns {
            let position = game.grid.layout().world_position(pos);
            game.place_villager(position);
        }
        game.events.push(GameEvent::VillagersSpawned {
            count: spawns.len(),
        });
        game.begin_wave();
        game
    }

    fn empty(config: SimulationConfig, rng: ChaCha8Rng, grid: Grid, grid_seed: u64) -> Self {
        let mut game = Self {
            config,
            rng,
            grid,
            grid_seed,
            villagers: Vec::new(),
            next_villager_id: 0,
            wave: 1,
            tick_count: 0,
            village_tiles: Vec::new(),
            grass_tiles: Vec::new(),
            prev_village_count: 0,
            prev_grass_count: 0,
            selected: None,
            phase: GamePhase::Running,
            scheduler: TickScheduler::new(),
            pending_tick: None,
            last_statistics: None,
            events: Vec::new(),
        };
        game.track_grid();
        game
    }

    /// Throw the current session away and start over from wave 1.
    ///
    /// If no valid grid can be generated the current session is left as it was.
    pub fn restart(&mut self) -> Result<(), GenerationError> {
        let generated = generate_valid_grid(&mut self.rng, &self.config.generation)?;
        self.cancel_pending_tick();
        self.events.clear();
        self.wave = 1;
        self.tick_count = 0;
        self.last_statistics = None;
        self.phase = GamePhase::Running;
        self.grid = generated.grid;
        self.grid_seed = generated.seed;
        self.track_grid();
        self.spawn_random_villagers();
        self.begin_wave();
        info!(seed = self.grid_seed, "Game restarted");
        Ok(())
    }

    /// Reset tile tracking to the current grid.
    fn track_grid(&mut self) {
        self.village_tiles = self.grid.ids_of(TileType::Village);
        self.grass_tiles = self.grid.ids_of(TileType::Grass);
        self.prev_village_count = self.village_tiles.len();
        self.prev_grass_count = self.grass_tiles.len();
        self.selected = None;
        self.events.push(GameEvent::GridGenerated {
            seed: self.grid_seed,
            wave: self.wave,
        });
    }

    fn begin_wave(&mut self) {
        info!(
            wave = self.wave,
            seed = self.grid_seed,
            villages = self.village_tiles.len(),
            villagers = self.villagers.len(),
            "Wave started"
        );
        self.events.push(GameEvent::WaveStarted { wave: self.wave });
        self.schedule_tick();
    }

    fn spawn_random_villagers(&mut self) {
        self.villagers.clear();
        let count = self.config.villager_count as usize;
        for _ in 0..count {
            let x = self.rng.gen_range(0..self.grid.width());
            let y = self.rng.gen_range(0..self.grid.height());
            let position = self.grid.layout().world_position(GridPos::new(x, y));
            self.place_villager(position);
        }
        self.events.push(GameEvent::VillagersSpawned { count });
    }

    /// Add a living villager at a world position.
    pub fn place_villager(&mut self, position: Vec2) -> VillagerId {
        let id = VillagerId::new(self.next_villager_id);
        self.next_villager_id += 1;
        self.villagers.push(Villager::new(
            id,
            position,
            self.config.villager_speed,
            self.config.water_speed,
        ));
        id
    }

    fn schedule_tick(&mut self) {
        self.cancel_pending_tick();
        self.pending_tick = Some(self.scheduler.schedule(self.config.tick_interval()));
    }

    fn cancel_pending_tick(&mut self) {
        if let Some(handle) = self.pending_tick.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Advance one frame: move villagers, then run the tick if it came due.
    pub fn update(&mut self, dt: Duration) -> Result<Option<TickOutcome>, GenerationError> {
        if self.is_game_over() {
            return Ok(None);
        }

        let seconds = dt.as_secs_f32();
        for villager in self.villagers.iter_mut() {
            if villager.update(&self.grid, &self.village_tiles, seconds) == VillagerStep::Died {
                debug!(villager = villager.id.get(), "Villager burned");
                self.events.push(GameEvent::VillagerDied {
                    id: villager.id,
                    position: villager.position,
                });
            }
        }

        match self.scheduler.advance(dt) {
            Some(handle) if Some(handle) == self.pending_tick => self.tick().map(Some),
            _ => Ok(None),
        }
    }

    /// Run one fire-spread tick and resolve the wave state machine.
    pub fn tick(&mut self) -> Result<TickOutcome, GenerationError> {
        if let GamePhase::GameOver(reason) = self.phase {
            return Ok(TickOutcome::GameOver(reason));
        }
        self.cancel_pending_tick();
        self.tick_count += 1;

        self.prev_village_count = self.village_tiles.len();
        self.prev_grass_count = self.grass_tiles.len();

        let spread = spread_fire(&mut self.grid);
        for id in &spread.burnt_villages {
            self.village_tiles.retain(|v| v != id);
        }
        for id in &spread.ignited {
            self.grass_tiles.retain(|g| g != id);
        }
        for id in spread.burnt_villages.iter().chain(&spread.ignited) {
            if let Some(tile) = self.grid.tile_by_id(*id) {
                self.events.push(GameEvent::TileChanged {
                    id: *id,
                    pos: tile.pos,
                    tile_type: tile.tile_type,
                });
            }
        }

        let spreading = self.fire_is_spreading();
        let stats = compute_statistics(
            self.tick_count,
            self.wave,
            &self.grid,
            &self.villagers,
            &spread,
            spreading,
        );
        debug!(
            tick = stats.tick,
            wave = stats.wave,
            ignited = stats.ignited,
            villages_burnt = stats.villages_burnt,
            villages_remaining = stats.villages_remaining,
            villagers_alive = stats.villagers_alive,
            "Tick"
        );
        self.last_statistics = Some(stats);

        if self.village_tiles.is_empty() {
            return Ok(self.game_over(GameOverReason::VillagesLost));
        }
        if self.alive_villagers() == 0 {
            return Ok(self.game_over(GameOverReason::VillagersLost));
        }
        if !spreading {
            if let Err(e) = self.next_wave() {
                // Stay on the current wave and try again next tick.
                self.schedule_tick();
                return Err(e);
            }
            return Ok(TickOutcome::WaveComplete { wave: self.wave });
        }
        self.schedule_tick();
        Ok(TickOutcome::Continue)
    }

    fn game_over(&mut self, reason: GameOverReason) -> TickOutcome {
        self.cancel_pending_tick();
        self.phase = GamePhase::GameOver(reason);
        info!(wave = self.wave, ?reason, "Game over");
        self.events.push(GameEvent::GameOver {
            wave: self.wave,
            reason,
        });
        TickOutcome::GameOver(reason)
    }

    fn next_wave(&mut self) -> Result<(), GenerationError> {
        let generated = generate_valid_grid(&mut self.rng, &self.config.generation)?;

        let before = self.villagers.len();
        self.villagers.retain(Villager::is_alive);
        let purged = before - self.villagers.len();
        if purged > 0 {
            self.events.push(GameEvent::VillagersPurged { count: purged });
        }

        self.wave += 1;
        self.grid = generated.grid;
        self.grid_seed = generated.seed;
        self.track_grid();
        self.begin_wave();
        Ok(())
    }

    /// Whether the last tick burned any grass or village.
    pub fn fire_is_spreading(&self) -> bool {
        self.prev_grass_count > self.grass_tiles.len()
            || self.prev_village_count > self.village_tiles.len()
    }

    /// Handle a click on a cell, or on empty space when `target` is `None`.
    ///
    /// The first click on a selectable tile selects it. The next click swaps
    /// it with the target if the target is selectable, and always clears the
    /// selection.
    pub fn click(&mut self, target: Option<GridPos>) -> ClickResult {
        if self.is_game_over() {
            return ClickResult::Ignored;
        }
        let target = target.filter(|pos| self.grid.get(*pos).is_some());

        let Some(first_id) = self.selected.take() else {
            let Some(pos) = target.filter(|pos| self.grid.tile(*pos).is_selectable()) else {
                return ClickResult::Ignored;
            };
            let tile = self.grid.tile_mut(pos);
            tile.selected = true;
            self.selected = Some(tile.id);
            self.events.push(GameEvent::TileSelected {
                pos,
                selected: true,
            });
            return ClickResult::Selected(pos);
        };

        let Some(first_pos) = self.grid.tile_by_id(first_id).map(|t| t.pos) else {
            return ClickResult::Cancelled;
        };

        let mut result = ClickResult::Cancelled;
        if let Some(pos) = target.filter(|pos| self.grid.tile(*pos).is_selectable()) {
            self.grid.swap(first_pos, pos);
            self.events.push(GameEvent::TilesSwapped {
                a: first_pos,
                b: pos,
            });
            debug!(%first_pos, %pos, "Tiles swapped");
            result = ClickResult::Swapped(first_pos, pos);
        }

        // The first tile may have moved; find it again by identity.
        if let Some(pos) = self.grid.tile_by_id(first_id).map(|t| t.pos) {
            self.grid.tile_mut(pos).selected = false;
            self.events.push(GameEvent::TileSelected {
                pos,
                selected: false,
            });
        }
        result
    }

    /// Click at a world-space point.
    pub fn click_at(&mut self, point: Vec2) -> ClickResult {
        let target = self.grid.hit_test(point);
        self.click(target)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_seed(&self) -> u64 {
        self.grid_seed
    }

    pub fn villagers(&self) -> &[Villager] {
        &self.villagers
    }

    pub fn alive_villagers(&self) -> usize {
        self.villagers.iter().filter(|v| v.is_alive()).count()
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver(_))
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        match self.phase {
            GamePhase::GameOver(reason) => Some(reason),
            GamePhase::Running => None,
        }
    }

    pub fn village_tiles(&self) -> &[TileId] {
        &self.village_tiles
    }

    pub fn grass_tiles(&self) -> &[TileId] {
        &self.grass_tiles
    }

    /// Grid position of the tile waiting for a second click.
    pub fn selected(&self) -> Option<GridPos> {
        self.selected
            .and_then(|id| self.grid.tile_by_id(id))
            .map(|t| t.pos)
    }

    pub fn time_until_tick(&self) -> Option<Duration> {
        self.scheduler.time_until_due()
    }

    pub fn last_statistics(&self) -> Option<&TickStatistics> {
        self.last_statistics.as_ref()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            tick_interval_ms: 1000,
            ..SimulationConfig::default()
        }
    }

    fn grid(text: &str) -> Grid {
        Grid::from_glyphs(text, 1.0).unwrap()
    }

    fn at(game: &Game, x: i64, y: i64) -> GridPos {
        game.grid().pos(x, y).unwrap()
    }

    #[test]
    fn new_game_starts_at_wave_one_with_valid_grid() {
        let game = Game::new(config(), 42).unwrap();
        assert_eq!(game.wave(), 1);
        assert_eq!(game.phase(), GamePhase::Running);
        assert!(game.grid().is_valid());
        assert_eq!(game.villagers().len(), 5);
        assert!(game.villagers().iter().all(Villager::is_alive));
        assert_eq!(
            game.village_tiles().len(),
            game.grid().count(TileType::Village)
        );
        assert_eq!(game.grass_tiles().len(), game.grid().count(TileType::Grass));
        assert_eq!(game.time_until_tick(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn same_seed_same_game() {
        let a = Game::new(config(), 7).unwrap();
        let b = Game::new(config(), 7).unwrap();
        assert_eq!(a.grid(), b.grid());
        assert_eq!(a.villagers(), b.villagers());
    }

    #[test]
    fn spreading_fire_schedules_another_tick() {
        let mut game = Game::from_grid(config(), 1, grid("^..~V"), &[GridPos::new(4, 0)]);
        assert_eq!(game.tick().unwrap(), TickOutcome::Continue);
        assert!(game.fire_is_spreading());
        assert_eq!(game.grid().to_glyphs(), "^^.~V\n");
        assert_eq!(game.grass_tiles().len(), 1);
        assert_eq!(game.village_tiles().len(), 1);
        assert_eq!(game.time_until_tick(), Some(Duration::from_millis(1000)));
        assert_eq!(game.wave(), 1);
    }

    #[test]
    fn tick_runs_once_per_interval() {
        let mut game = Game::from_grid(config(), 1, grid("^....~V"), &[GridPos::new(6, 0)]);
        let frame = Duration::from_millis(100);
        let mut ticks = 0;
        for _ in 0..25 {
            if let Some(outcome) = game.update(frame).unwrap() {
                assert_eq!(outcome, TickOutcome::Continue);
                ticks += 1;
            }
        }
        assert_eq!(ticks, 2);
        assert_eq!(game.tick_count(), 2);
        assert_eq!(game.grid().to_glyphs(), "^^^..~V\n");
    }

    #[test]
    fn burning_the_last_village_ends_the_game() {
        let mut game = Game::from_grid(config(), 1, grid("^V~."), &[GridPos::new(3, 0)]);
        let outcome = game.tick().unwrap();
        assert_eq!(outcome, TickOutcome::GameOver(GameOverReason::VillagesLost));
        assert!(game.is_game_over());
        assert!(game.village_tiles().is_empty());
        assert_eq!(game.time_until_tick(), None);
        assert!(game
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { wave: 1, .. })));

        // Nothing moves after the game ends.
        assert_eq!(game.update(Duration::from_secs(5)).unwrap(), None);
        assert_eq!(game.tick_count(), 1);
    }

    #[test]
    fn losing_every_villager_ends_the_game() {
        let mut game = Game::from_grid(config(), 1, grid("^~V"), &[GridPos::new(0, 0)]);
        game.update(Duration::from_millis(16)).unwrap();
        assert_eq!(game.alive_villagers(), 0);
        let outcome = game.tick().unwrap();
        assert_eq!(
            outcome,
            TickOutcome::GameOver(GameOverReason::VillagersLost)
        );
    }

    #[test]
    fn villager_on_fire_dies_within_one_update() {
        let mut game = Game::from_grid(
            config(),
            1,
            grid("^~V"),
            &[GridPos::new(0, 0), GridPos::new(2, 0)],
        );
        assert!(game.villagers()[0].is_alive());
        game.update(Duration::from_millis(16)).unwrap();
        assert!(!game.villagers()[0].is_alive());
        assert!(game.villagers()[1].is_alive());
        let events = game.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::VillagerDied { id, .. } if id.get() == 0)));

        for _ in 0..5 {
            game.update(Duration::from_millis(16)).unwrap();
            assert!(!game.villagers()[0].is_alive());
        }
    }

    #[test]
    fn calm_fire_advances_wave_and_purges_dead() {
        let mut game = Game::from_grid(
            config(),
            9,
            grid("^~V"),
            &[GridPos::new(0, 0), GridPos::new(2, 0), GridPos::new(2, 0)],
        );
        game.update(Duration::from_millis(16)).unwrap();
        assert_eq!(game.villagers().len(), 3);
        assert_eq!(game.alive_villagers(), 2);

        let outcome = game.tick().unwrap();
        assert_eq!(outcome, TickOutcome::WaveComplete { wave: 2 });
        assert_eq!(game.wave(), 2);
        assert_eq!(game.villagers().len(), 2);
        assert!(game.villagers().iter().all(Villager::is_alive));

        // A fresh, valid grid with tracking reset to it.
        assert!(game.grid().is_valid());
        assert_eq!(game.grid().width(), 12);
        assert_eq!(
            game.village_tiles().len(),
            game.grid().count(TileType::Village)
        );
        assert_eq!(game.time_until_tick(), Some(Duration::from_millis(1000)));
        assert!(game
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::VillagersPurged { count: 1 })));
    }

    #[test]
    fn select_then_swap() {
        let mut game = Game::from_grid(config(), 1, grid("^.~\nV..\n..."), &[]);
        let grass = at(&game, 1, 0);
        let water = at(&game, 2, 0);
        let grass_id = game.grid().tile(grass).id;

        assert_eq!(game.click(Some(grass)), ClickResult::Selected(grass));
        assert!(game.grid().tile(grass).selected);
        assert_eq!(game.selected(), Some(grass));

        assert_eq!(game.click(Some(water)), ClickResult::Swapped(grass, water));
        assert_eq!(game.grid().tile(grass).tile_type, TileType::Water);
        assert_eq!(game.grid().tile(water).tile_type, TileType::Grass);
        assert_eq!(game.grid().tile(water).id, grass_id);
        assert!(game.grid().tiles().iter().all(|t| !t.selected));
        assert_eq!(game.selected(), None);
    }

    #[test]
    fn unselectable_tiles_cannot_be_picked() {
        let mut game = Game::from_grid(config(), 1, grid("^V.\nx.."), &[]);
        assert_eq!(game.click(Some(at(&game, 0, 0))), ClickResult::Ignored);
        assert_eq!(game.click(Some(at(&game, 1, 0))), ClickResult::Ignored);
        assert_eq!(game.click(Some(at(&game, 0, 1))), ClickResult::Ignored);
        assert_eq!(game.click(None), ClickResult::Ignored);
        assert_eq!(game.selected(), None);
    }

    #[test]
    fn second_click_on_unselectable_cancels() {
        let mut game = Game::from_grid(config(), 1, grid("^V.\n..."), &[]);
        let before = game.grid().clone();
        let grass = at(&game, 2, 0);

        game.click(Some(grass));
        assert_eq!(game.click(Some(at(&game, 1, 0))), ClickResult::Cancelled);
        assert_eq!(game.selected(), None);
        assert_eq!(game.grid(), &before);

        game.click(Some(grass));
        assert_eq!(game.click(None), ClickResult::Cancelled);
        assert_eq!(game.grid(), &before);
    }

    #[test]
    fn swapping_twice_restores_the_board() {
        let mut game = Game::from_grid(config(), 1, grid("^.~\nV.."), &[]);
        let before = game.grid().clone();
        let a = at(&game, 1, 0);
        let b = at(&game, 2, 0);
        game.click(Some(a));
        game.click(Some(b));
        assert_ne!(game.grid(), &before);
        game.click(Some(a));
        game.click(Some(b));
        assert_eq!(game.grid(), &before);
    }

    #[test]
    fn swapped_water_shields_a_village() {
        // Moving the water between fire and village stops the spread.
        let mut game = Game::from_grid(config(), 3, grid("^.V~"), &[GridPos::new(2, 0)]);
        let grass = at(&game, 1, 0);
        let water = at(&game, 3, 0);
        game.click(Some(grass));
        game.click(Some(water));
        assert_eq!(game.grid().to_glyphs(), "^~V.\n");

        let outcome = game.tick().unwrap();
        assert_eq!(outcome, TickOutcome::WaveComplete { wave: 2 });
    }

    #[test]
    fn click_at_uses_hit_test() {
        let mut game = Game::from_grid(config(), 1, grid("^.\nV."), &[]);
        let pos = at(&game, 1, 1);
        let centre = game.grid().layout().world_position(pos);
        assert_eq!(game.click_at(centre), ClickResult::Selected(pos));
        assert_eq!(
            game.click_at(Vec2::new(500.0, 500.0)),
            ClickResult::Cancelled
        );
    }

    #[test]
    fn restart_cancels_pending_tick_and_resets_wave() {
        let mut game = Game::from_grid(config(), 5, grid("^~V"), &[GridPos::new(2, 0)]);
        game.tick().unwrap();
        assert_eq!(game.wave(), 2);
        game.update(Duration::from_millis(600)).unwrap();
        assert_eq!(game.time_until_tick(), Some(Duration::from_millis(400)));

        game.restart().unwrap();
        assert_eq!(game.wave(), 1);
        assert_eq!(game.tick_count(), 0);
        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.villagers().len(), 5);
        assert_eq!(game.time_until_tick(), Some(Duration::from_millis(1000)));

        // The stale 400 ms deadline does not fire.
        assert_eq!(game.update(Duration::from_millis(500)).unwrap(), None);
        assert_eq!(game.tick_count(), 0);
    }

    #[test]
    fn restart_after_game_over() {
        let mut game = Game::from_grid(config(), 5, grid("^V"), &[]);
        assert!(matches!(game.tick().unwrap(), TickOutcome::GameOver(_)));
        assert_eq!(game.click(Some(at(&game, 0, 0))), ClickResult::Ignored);
        game.restart().unwrap();
        assert!(!game.is_game_over());
        assert!(game.grid().is_valid());
    }

    fn unplayable_config() -> SimulationConfig {
        let mut config = config();
        config.generation.village_chance = 0.0;
        config.generation.max_generation_attempts = 3;
        config
    }

    #[test]
    fn failed_wave_generation_keeps_the_current_wave() {
        let mut game = Game::from_grid(
            unplayable_config(),
            1,
            grid("^~V"),
            &[GridPos::new(0, 0), GridPos::new(2, 0)],
        );
        game.update(Duration::from_millis(16)).unwrap();
        assert_eq!(game.alive_villagers(), 1);
        let before = game.grid().clone();

        let err = game.tick().unwrap_err();
        assert_eq!(err, GenerationError::NoValidGrid { attempts: 3 });
        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.wave(), 1);
        assert_eq!(game.grid(), &before);
        // Nothing was purged, and the wave is retried on the next tick.
        assert_eq!(game.villagers().len(), 2);
        assert_eq!(game.time_until_tick(), Some(Duration::from_millis(1000)));

        let mut retried = 0;
        for _ in 0..20 {
            if game.update(Duration::from_millis(100)).is_err() {
                retried += 1;
            }
        }
        assert_eq!(retried, 2);
        assert_eq!(game.wave(), 1);
    }

    #[test]
    fn failed_restart_leaves_the_session_untouched() {
        let mut game = Game::from_grid(unplayable_config(), 1, grid("^..~V"), &[GridPos::new(4, 0)]);
        game.tick().unwrap();
        let before = game.grid().clone();
        let pending = game.time_until_tick();
        assert!(pending.is_some());

        assert!(game.restart().is_err());
        assert_eq!(game.grid(), &before);
        assert_eq!(game.tick_count(), 1);
        assert_eq!(game.villagers().len(), 1);
        assert_eq!(game.time_until_tick(), pending);
        assert_eq!(game.update(Duration::from_millis(1000)).unwrap(), Some(TickOutcome::Continue));
    }

    #[test]
    fn game_over_reason_is_kept_in_the_phase() {
        let mut game = Game::from_grid(config(), 1, grid("^~V"), &[GridPos::new(0, 0)]);
        assert_eq!(game.game_over_reason(), None);
        game.update(Duration::from_millis(16)).unwrap();
        game.tick().unwrap();
        assert_eq!(
            game.phase(),
            GamePhase::GameOver(GameOverReason::VillagersLost)
        );
        assert_eq!(game.game_over_reason(), Some(GameOverReason::VillagersLost));
        // Later ticks report the same reason even though villages remain.
        assert_eq!(
            game.tick().unwrap(),
            TickOutcome::GameOver(GameOverReason::VillagersLost)
        );
    }

    #[test]
    fn restart_discards_undrained_events() {
        let mut game = Game::from_grid(config(), 5, grid("^V"), &[]);
        game.tick().unwrap();
        game.restart().unwrap();
        let events = game.drain_events();
        assert!(matches!(events.first(), Some(GameEvent::GridGenerated { wave: 1, .. })));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::TileChanged { .. })));
        assert!(game.drain_events().is_empty());
    }
}
