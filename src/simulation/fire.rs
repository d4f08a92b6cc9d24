use crate::world::grid::{Grid, TypeSnapshot};
use crate::world::tile::{GridPos, TileId, TileType};

/// Tiles that changed during one fire-spread step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FireSpread {
    /// Grass tiles that caught fire.
    pub ignited: Vec<TileId>,
    /// Villages that burned down.
    pub burnt_villages: Vec<TileId>,
}

impl FireSpread {
    pub fn is_empty(&self) -> bool {
        self.ignited.is_empty() && self.burnt_villages.is_empty()
    }
}

/// Run one synchronous fire-spread generation over the whole grid.
///
/// Every cell reads its neighbors from a snapshot taken before the step, so
/// fire advances exactly one cell per step in every direction regardless of
/// the order cells are visited in.
pub fn spread_fire(grid: &mut Grid) -> FireSpread {
    let snapshot = grid.snapshot();
    let order: Vec<GridPos> = grid.positions().collect();
    spread_fire_in_order(grid, &snapshot, &order)
}

fn spread_fire_in_order(
    grid: &mut Grid,
    snapshot: &TypeSnapshot,
    order: &[GridPos],
) -> FireSpread {
    let mut spread = FireSpread::default();
    for &pos in order {
        let Some(next) = next_type(snapshot.get(pos), snapshot.neighbors(pos)) else {
            continue;
        };
        let tile = grid.tile_mut(pos);
        match next {
            TileType::Fire => spread.ignited.push(tile.id),
            TileType::BurntVillage => spread.burnt_villages.push(tile.id),
            _ => {}
        }
        tile.tile_type = next;
    }
    spread
}

/// The type a cell takes after one step, or `None` if it does not change.
///
/// Flammable cells ignite when any 4-connected neighbor is burning.
pub fn next_type(current: TileType, neighbors: [TileType; 4]) -> Option<TileType> {
    if neighbors.contains(&TileType::Fire) {
        current.ignited()
    } else {
        None
    }
}
