pub mod generation;
pub mod grid;
pub mod tile;
pub mod villager;

pub use grid::{Grid, Layout, TypeSnapshot};
pub use tile::{GridPos, Rgb, Tile, TileId, TileType};
pub use villager::{Villager, VillagerId, VillagerStep};
