use glam::Vec2;
use serde::{Deserialize, Serialize};

// === Enums ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Water,
    Grass,
    Fire,
    Village,
    BurntVillage,
    /// Sentinel for neighbor lookups that fall outside the grid.
    /// Never stored in a real cell.
    Edge,
}

impl TileType {
    /// Grass and villages can catch fire; everything else is inert.
    pub fn is_flammable(self) -> bool {
        matches!(self, TileType::Grass | TileType::Village)
    }

    /// Whether the player may pick this tile up or drop another onto it.
    pub fn is_selectable(self) -> bool {
        !matches!(
            self,
            TileType::Village | TileType::BurntVillage | TileType::Fire
        )
    }

    /// The type this tile becomes when a neighbor is burning.
    /// Returns `None` for types that are fixed points of the fire rule.
    pub fn ignited(self) -> Option<TileType> {
        match self {
            TileType::Grass => Some(TileType::Fire),
            TileType::Village => Some(TileType::BurntVillage),
            TileType::Water | TileType::Fire | TileType::BurntVillage | TileType::Edge => None,
        }
    }

    /// Single-character glyph used by the terminal renderer.
    pub fn glyph(self) -> char {
        match self {
            TileType::Water => '~',
            TileType::Grass => '.',
            TileType::Fire => '^',
            TileType::Village => 'V',
            TileType::BurntVillage => 'x',
            TileType::Edge => '#',
        }
    }

    /// Display color for a tile of this type.
    pub fn color(self, selected: bool) -> Rgb {
        if selected {
            return Rgb::WHITE;
        }
        match self {
            TileType::Fire => Rgb::new(0.79, 0.29, 0.08),
            TileType::Water => Rgb::new(0.16, 0.62, 0.59),
            TileType::Grass => Rgb::new(0.0, 0.6, 0.2),
            TileType::Village => Rgb::new(0.4, 0.2, 0.0),
            TileType::BurntVillage | TileType::Edge => Rgb::BLACK,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TileType::Water => "Water",
            TileType::Grass => "Grass",
            TileType::Fire => "Fire",
            TileType::Village => "Village",
            TileType::BurntVillage => "Burnt Village",
            TileType::Edge => "Edge",
        }
    }

    /// Every type a generated cell can hold.
    pub fn cell_types() -> &'static [TileType] {
        &[
            TileType::Water,
            TileType::Grass,
            TileType::Fire,
            TileType::Village,
            TileType::BurntVillage,
        ]
    }
}

// === Color ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

// === Identity and position ===

/// Stable identity of a tile. Survives swaps; reassigned on regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    pub(crate) const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Cell coordinates inside a grid.
///
/// Only the grid hands these out (`Grid::pos`, `Grid::hit_test`), so a
/// `GridPos` is always within the bounds of the grid that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridPos {
    x: u32,
    y: u32,
}

impl GridPos {
    pub(crate) const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub const fn x(self) -> u32 {
        self.x
    }

    pub const fn y(self) -> u32 {
        self.y
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// === Tile ===

/// Serialized for output only; tiles are only ever built by a `Grid`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    pub id: TileId,
    pub pos: GridPos,
    pub tile_type: TileType,
    pub selected: bool,
    /// Rendered position of the tile centre in world units.
    pub position: Vec2,
}

impl Tile {
    pub fn new(id: TileId, pos: GridPos, tile_type: TileType, position: Vec2) -> Self {
        Self {
            id,
            pos,
            tile_type,
            selected: false,
            position,
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.tile_type.is_selectable()
    }

    pub fn color(&self) -> Rgb {
        self.tile_type.color(self.selected)
    }

    /// Move this tile to another slot, keeping its type and identity.
    pub(crate) fn set_pos(&mut self, pos: GridPos, position: Vec2) {
        self.pos = pos;
        self.position = position;
    }
}
