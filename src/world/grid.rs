use glam::Vec2;
use serde::Serialize;

use crate::world::tile::{GridPos, Tile, TileId, TileType};

/// World-space placement of the grid.
///
/// Tiles are squares of side `tile_size`, centred horizontally on the origin.
/// Row 0 sits at the top (`y = height * tile_size / 2`) and rows descend in y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Layout {
    width: u32,
    height: u32,
    tile_size: f32,
}

impl Layout {
    pub fn new(width: u32, height: u32, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
        }
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn left_edge(&self) -> f32 {
        -(self.tile_size * self.width as f32 / 2.0)
    }

    fn top_edge(&self) -> f32 {
        self.tile_size * self.height as f32 / 2.0 + self.tile_size / 2.0
    }

    /// Centre of the tile occupying `pos`.
    pub fn world_position(&self, pos: GridPos) -> Vec2 {
        let s = self.tile_size;
        Vec2::new(
            self.left_edge() + s / 2.0 + pos.x() as f32 * s,
            self.top_edge() - s / 2.0 - pos.y() as f32 * s,
        )
    }

    /// The cell whose square contains `point`, if any.
    pub fn cell_at(&self, point: Vec2) -> Option<GridPos> {
        if !point.is_finite() {
            return None;
        }
        let col = ((point.x - self.left_edge()) / self.tile_size).floor();
        let row = ((self.top_edge() - point.y) / self.tile_size).floor();
        if col < 0.0 || row < 0.0 || col >= self.width as f32 || row >= self.height as f32 {
            return None;
        }
        Some(GridPos::new(col as u32, row as u32))
    }
}

/// Fixed-size, row-major array of tiles. Every slot is always populated.
///
/// Serialized for output only: a grid is built through `from_fn` or
/// `from_glyphs` so tiles always match their slots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    width: u32,
    height: u32,
    layout: Layout,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Build a grid by asking `type_at` for the type of every cell, row by row.
    ///
    /// Tile ids are assigned in row-major order.
    ///
    /// # Panics
    /// Panics if either dimension is zero or `type_at` returns `TileType::Edge`.
    pub fn from_fn(
        width: u32,
        height: u32,
        tile_size: f32,
        mut type_at: impl FnMut(GridPos) -> TileType,
    ) -> Self {
        assert!(width > 0 && height > 0, "Grid dimensions must be non-zero");
        let layout = Layout::new(width, height, tile_size);
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let pos = GridPos::new(x, y);
                let tile_type = type_at(pos);
                assert!(
                    tile_type != TileType::Edge,
                    "Edge is reserved for out-of-bounds lookups, got it at {}",
                    pos
                );
                let id = TileId::new(y * width + x);
                tiles.push(Tile::new(id, pos, tile_type, layout.world_position(pos)));
            }
        }
        Self {
            width,
            height,
            layout,
            tiles,
        }
    }

    /// Parse a grid from rows of tile glyphs (`~ . ^ V x`), one row per line.
    /// Blank lines and surrounding whitespace are ignored.
    pub fn from_glyphs(text: &str, tile_size: f32) -> Result<Self, String> {
        let rows: Vec<Vec<TileType>> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| {
                        TileType::cell_types()
                            .iter()
                            .copied()
                            .find(|t| t.glyph() == c)
                            .ok_or_else(|| format!("Unknown tile glyph '{}'", c))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<_, _>>()?;

        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err("Grid must have at least one tile".to_string());
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(format!(
                "Row {} has {} tiles, expected {}",
                i,
                row.len(),
                width
            ));
        }

        Ok(Self::from_fn(width as u32, height as u32, tile_size, |pos| {
            rows[pos.y() as usize][pos.x() as usize]
        }))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Bounds-checked coordinate constructor.
    pub fn pos(&self, x: i64, y: i64) -> Option<GridPos> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(GridPos::new(x as u32, y as u32))
    }

    /// All in-bounds positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| GridPos::new(x, y)))
    }

    fn index(&self, pos: GridPos) -> usize {
        (pos.y() * self.width + pos.x()) as usize
    }

    pub fn get(&self, pos: GridPos) -> Option<&Tile> {
        if pos.x() >= self.width || pos.y() >= self.height {
            return None;
        }
        self.tiles.get(self.index(pos))
    }

    /// The tile occupying `pos`.
    ///
    /// # Panics
    /// Panics if `pos` was produced by a grid with different dimensions.
    pub fn tile(&self, pos: GridPos) -> &Tile {
        &self.tiles[self.index(pos)]
    }

    pub(crate) fn tile_mut(&mut self, pos: GridPos) -> &mut Tile {
        let idx = self.index(pos);
        &mut self.tiles[idx]
    }

    pub fn tile_by_id(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile under a world-space point.
    pub fn hit_test(&self, point: Vec2) -> Option<GridPos> {
        self.layout.cell_at(point)
    }

    pub fn count(&self, tile_type: TileType) -> usize {
        self.tiles.iter().filter(|t| t.tile_type == tile_type).count()
    }

    /// Ids of every tile currently of `tile_type`, in row-major order.
    pub fn ids_of(&self, tile_type: TileType) -> Vec<TileId> {
        self.tiles
            .iter()
            .filter(|t| t.tile_type == tile_type)
            .map(|t| t.id)
            .collect()
    }

    /// A playable grid has at least one village to defend and one fire to fight.
    pub fn is_valid(&self) -> bool {
        let mut village = false;
        let mut fire = false;
        for tile in &self.tiles {
            match tile.tile_type {
                TileType::Village => village = true,
                TileType::Fire => fire = true,
                _ => {}
            }
            if village && fire {
                return true;
            }
        }
        false
    }

    /// Copy of every cell's type, taken before a simulation step mutates the grid.
    pub fn snapshot(&self) -> TypeSnapshot {
        TypeSnapshot {
            width: self.width,
            height: self.height,
            types: self.tiles.iter().map(|t| t.tile_type).collect(),
        }
    }

    /// Exchange the tiles at `a` and `b`.
    ///
    /// The tile objects trade slots: each takes over the other's grid
    /// coordinates and world position, and keeps its own type and id.
    pub fn swap(&mut self, a: GridPos, b: GridPos) {
        if a == b {
            return;
        }
        let ia = self.index(a);
        let ib = self.index(b);
        let world_a = self.tiles[ia].position;
        let world_b = self.tiles[ib].position;
        self.tiles.swap(ia, ib);
        self.tiles[ia].set_pos(a, world_a);
        self.tiles[ib].set_pos(b, world_b);
    }

    /// Render the grid as rows of glyphs.
    pub fn to_glyphs(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for row in self.tiles.chunks(self.width as usize) {
            out.extend(row.iter().map(|t| t.tile_type.glyph()));
            out.push('\n');
        }
        out
    }
}

/// Immutable copy of tile types used for snapshot-isolated updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSnapshot {
    width: u32,
    height: u32,
    types: Vec<TileType>,
}

impl TypeSnapshot {
    /// Type at signed coordinates; anything outside the grid is `Edge`.
    pub fn type_at(&self, x: i64, y: i64) -> TileType {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return TileType::Edge;
        }
        self.types[(y as u32 * self.width + x as u32) as usize]
    }

    pub fn get(&self, pos: GridPos) -> TileType {
        self.type_at(pos.x() as i64, pos.y() as i64)
    }

    /// Left, right, up and down neighbor types of `pos`.
    pub fn neighbors(&self, pos: GridPos) -> [TileType; 4] {
        let x = pos.x() as i64;
        let y = pos.y() as i64;
        [
            self.type_at(x - 1, y),
            self.type_at(x + 1, y),
            self.type_at(x, y - 1),
            self.type_at(x, y + 1),
        ]
    }
}
