use std::collections::HashMap;

use crate::simulation::fire::FireSpread;
use crate::world::tile::TileType;
use crate::world::{Grid, Villager};

/// Per-tick aggregate counts, logged and shown between waves.
#[derive(Debug, Clone, PartialEq)]
pub struct TickStatistics {
    pub tick: u64,
    pub wave: u32,
    pub tile_counts: HashMap<TileType, u32>,
    pub ignited: u32,
    pub villages_burnt: u32,
    pub villages_remaining: u32,
    pub villagers_alive: u32,
    pub villagers_total: u32,
    pub fire_spreading: bool,
}

/// Compute statistics for the grid and roster right after a tick.
pub fn compute_statistics(
    tick: u64,
    wave: u32,
    grid: &Grid,
    villagers: &[Villager],
    spread: &FireSpread,
    fire_spreading: bool,
) -> TickStatistics {
    let mut tile_counts: HashMap<TileType, u32> = HashMap::new();
    for tile in grid.tiles() {
        *tile_counts.entry(tile.tile_type).or_insert(0) += 1;
    }

    TickStatistics {
        tick,
        wave,
        villages_remaining: tile_counts.get(&TileType::Village).copied().unwrap_or(0),
        tile_counts,
        ignited: spread.ignited.len() as u32,
        villages_burnt: spread.burnt_villages.len() as u32,
        villagers_alive: villagers.iter().filter(|v| v.is_alive()).count() as u32,
        villagers_total: villagers.len() as u32,
        fire_spreading,
    }
}

impl TickStatistics {
    pub fn count(&self, tile_type: TileType) -> u32 {
        self.tile_counts.get(&tile_type).copied().unwrap_or(0)
    }

    /// Share of the grid that is burning or burnt, in `[0, 1]`.
    pub fn burnt_fraction(&self) -> f32 {
        let total: u32 = self.tile_counts.values().sum();
        if total == 0 {
            return 0.0;
        }
        let burnt = self.count(TileType::Fire) + self.count(TileType::BurntVillage);
        burnt as f32 / total as f32
    }
}
