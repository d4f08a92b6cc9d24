use std::collections::HashMap;
use std::fmt::Write;

use noise::{NoiseFn, Perlin};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::config::generation::GenerationParams;
use crate::world::grid::Grid;
use crate::world::tile::TileType;

/// Largest value `noise2d` returns; keeps the range half-open.
const NOISE_MAX: f64 = 1.0 - f64::EPSILON;

/// Attempts after which a successful generation is still logged as slow.
const SLOW_GENERATION_ATTEMPTS: u32 = 100;

/// Errors that can occur while generating a playable grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationError {
    NoValidGrid { attempts: u32 },
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::NoValidGrid { attempts } => write!(
                f,
                "No grid with both a village and a fire after {} attempts. \
                 Check fire_threshold, village_band_min and village_chance.",
                attempts
            ),
        }
    }
}

impl std::error::Error for GenerationError {}

/// A valid grid together with the seed that produced it.
#[derive(Debug, Clone)]
pub struct GeneratedGrid {
    pub grid: Grid,
    pub seed: u64,
    pub attempts: u32,
}

/// Coherent 2D noise remapped into `[0, 1)`.
pub fn noise2d(perlin: &Perlin, x: f64, y: f64) -> f64 {
    let raw = perlin.get([x, y]);
    ((raw + 1.0) / 2.0).clamp(0.0, NOISE_MAX)
}

/// Generate a grid from a seed. The same seed and params always produce the
/// same grid; the result is not guaranteed to be playable.
pub fn generate_grid(seed: u64, params: &GenerationParams) -> Grid {
    let perlin = Perlin::new(seed as u32);
    let offset = (seed % 100) as f64;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    Grid::from_fn(params.width, params.height, params.tile_size, |pos| {
        let value = noise2d(
            &perlin,
            pos.x() as f64 * params.noise_scale + offset,
            pos.y() as f64 * params.noise_scale + offset,
        );
        classify(value, params, &mut rng)
    })
}

/// Keep drawing seeds from `rng` until the grid holds at least one village
/// and one fire.
pub fn generate_valid_grid<R: Rng + ?Sized>(
    rng: &mut R,
    params: &GenerationParams,
) -> Result<GeneratedGrid, GenerationError> {
    for attempt in 1..=params.max_generation_attempts {
        let seed = rng.next_u64();
        let grid = generate_grid(seed, params);
        if grid.is_valid() {
            if attempt > SLOW_GENERATION_ATTEMPTS {
                warn!(attempt, seed, "Valid grid took many attempts");
            }
            return Ok(GeneratedGrid {
                grid,
                seed,
                attempts: attempt,
            });
        }
        debug!(attempt, seed, "Rejected grid without village or fire");
    }
    Err(GenerationError::NoValidGrid {
        attempts: params.max_generation_attempts,
    })
}

fn classify(value: f64, params: &GenerationParams, rng: &mut ChaCha8Rng) -> TileType {
    if value < params.fire_threshold {
        TileType::Fire
    } else if value > params.water_threshold {
        TileType::Water
    } else if value >= params.village_band_min && rng.gen_bool(params.village_chance) {
        TileType::Village
    } else {
        TileType::Grass
    }
}

/// Text summary of a generated grid: its seed, the board and tile counts.
pub fn grid_summary(grid: &Grid, grid_seed: u64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Grid Summary ===");
    let _ = writeln!(out, "Grid seed: {}", grid_seed);
    let _ = writeln!(out, "Size: {}x{}", grid.width(), grid.height());
    out.push('\n');
    out.push_str(&grid.to_glyphs());

    let total = grid.tiles().len() as f32;
    let mut counts: HashMap<TileType, usize> = HashMap::new();
    for tile in grid.tiles() {
        *counts.entry(tile.tile_type).or_insert(0) += 1;
    }
    let _ = writeln!(out, "\nTiles:");
    for tile_type in TileType::cell_types() {
        let count = counts.get(tile_type).copied().unwrap_or(0);
        if count == 0 {
            continue;
        }
        let pct = count as f32 / total * 100.0;
        let _ = writeln!(out, "  {:<14} {:>4} ({:.1}%)", tile_type.name(), count, pct);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let params = GenerationParams::default();
        let a = generate_grid(1234, &params);
        let b = generate_grid(1234, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn generated_grid_has_configured_dimensions() {
        let params = GenerationParams {
            width: 7,
            height: 5,
            ..GenerationParams::default()
        };
        let grid = generate_grid(99, &params);
        assert_eq!(grid.width(), 7);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.tiles().len(), 35);
        assert_eq!(grid.count(TileType::Edge), 0);
        assert_eq!(grid.count(TileType::BurntVillage), 0);
    }

    #[test]
    fn noise_stays_in_unit_range() {
        let perlin = Perlin::new(7);
        for i in 0..200 {
            let v = noise2d(&perlin, i as f64 * 0.37 + 0.11, i as f64 * 0.19 + 42.0);
            assert!((0.0..1.0).contains(&v), "noise out of range: {}", v);
        }
    }

    #[test]
    fn classification_follows_thresholds() {
        let params = GenerationParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(classify(0.05, &params, &mut rng), TileType::Fire);
        assert_eq!(classify(0.149, &params, &mut rng), TileType::Fire);
        assert_eq!(classify(0.15, &params, &mut rng), TileType::Grass);
        assert_eq!(classify(0.61, &params, &mut rng), TileType::Water);
        assert_eq!(classify(0.3, &params, &mut rng), TileType::Grass);
    }

    #[test]
    fn village_band_respects_chance() {
        let always = GenerationParams {
            village_chance: 1.0,
            ..GenerationParams::default()
        };
        let never = GenerationParams {
            village_chance: 0.0,
            ..GenerationParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for v in [0.5, 0.55, 0.6] {
            assert_eq!(classify(v, &always, &mut rng), TileType::Village);
            assert_eq!(classify(v, &never, &mut rng), TileType::Grass);
        }
        assert_eq!(classify(0.49, &always, &mut rng), TileType::Grass);
    }

    #[test]
    fn valid_grids_contain_village_and_fire() {
        let params = GenerationParams::default();
        for game_seed in 0..25 {
            let mut rng = ChaCha8Rng::seed_from_u64(game_seed);
            let generated = generate_valid_grid(&mut rng, &params).unwrap();
            assert!(generated.grid.count(TileType::Village) >= 1);
            assert!(generated.grid.count(TileType::Fire) >= 1);
            assert!(generated.attempts >= 1);
            assert_eq!(generated.grid, generate_grid(generated.seed, &params));
        }
    }

    #[test]
    fn impossible_params_exhaust_attempts() {
        let params = GenerationParams {
            village_chance: 0.0,
            max_generation_attempts: 5,
            ..GenerationParams::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err = generate_valid_grid(&mut rng, &params).unwrap_err();
        assert_eq!(err, GenerationError::NoValidGrid { attempts: 5 });
        assert!(err.to_string().contains("5 attempts"));
    }

    #[test]
    fn summary_labels_the_grid_seed() {
        let grid = Grid::from_glyphs("^.\nV~", 1.0).unwrap();
        let summary = grid_summary(&grid, 77);
        assert!(summary.contains("Grid seed: 77"));
        assert!(summary.contains("^.\nV~\n"));
        assert!(summary.contains("Village"));
        assert!(!summary.contains("Burnt Village"));
    }
}
