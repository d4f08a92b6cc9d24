use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::world::grid::Grid;
use crate::world::tile::{Rgb, TileId, TileType};

pub const DEFAULT_SPEED: f32 = 2.0;
pub const DEFAULT_WATER_SPEED: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VillagerId(u32);

impl VillagerId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// What happened to a villager during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VillagerStep {
    Moved,
    Holding,
    Died,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Villager {
    pub id: VillagerId,
    pub position: Vec2,
    pub speed: f32,
    pub water_speed: f32,
    alive: bool,
}

impl Villager {
    pub fn new(id: VillagerId, position: Vec2, speed: f32, water_speed: f32) -> Self {
        Self {
            id,
            position,
            speed,
            water_speed,
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn color(&self) -> Rgb {
        if self.alive {
            Rgb::WHITE
        } else {
            Rgb::BLACK
        }
    }

    /// Death is permanent.
    fn die(&mut self) {
        self.alive = false;
    }

    /// Advance one frame of `dt` seconds.
    ///
    /// A villager standing on fire dies on the spot. Otherwise it walks
    /// straight toward the nearest of `villages`, slowed down over water.
    pub fn update(&mut self, grid: &Grid, villages: &[TileId], dt: f32) -> VillagerStep {
        if !self.alive {
            return VillagerStep::Dead;
        }

        let under = grid
            .hit_test(self.position)
            .map(|pos| grid.tile(pos).tile_type);
        if under == Some(TileType::Fire) {
            self.die();
            return VillagerStep::Died;
        }

        let local_speed = if under == Some(TileType::Water) {
            self.water_speed
        } else {
            self.speed
        };

        match nearest_village(grid, villages, self.position) {
            Some(target) => {
                self.position = move_towards(self.position, target, local_speed * dt);
                VillagerStep::Moved
            }
            None => VillagerStep::Holding,
        }
    }
}

/// World position of the closest tracked village, by Euclidean distance.
pub fn nearest_village(grid: &Grid, villages: &[TileId], from: Vec2) -> Option<Vec2> {
    villages
        .iter()
        .filter_map(|id| grid.tile_by_id(*id))
        .map(|tile| tile.position)
        .min_by(|a, b| from.distance_squared(*a).total_cmp(&from.distance_squared(*b)))
}

/// Step from `from` toward `to` by at most `max_delta`, never overshooting.
fn move_towards(from: Vec2, to: Vec2, max_delta: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        to
    } else {
        from + delta / distance * max_delta
    }
}
