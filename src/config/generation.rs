use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters used to procedurally generate a grid.
///
/// Noise values are in `[0, 1)`. Below `fire_threshold` a cell starts
/// burning, above `water_threshold` it is water, and inside
/// `[village_band_min, water_threshold]` it becomes a village with
/// probability `village_chance`. Everything else is grass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f64,
    #[serde(default = "default_fire_threshold")]
    pub fire_threshold: f64,
    #[serde(default = "default_water_threshold")]
    pub water_threshold: f64,
    #[serde(default = "default_village_band_min")]
    pub village_band_min: f64,
    #[serde(default = "default_village_chance")]
    pub village_chance: f64,
    #[serde(default = "default_max_generation_attempts")]
    pub max_generation_attempts: u32,
}

fn default_width() -> u32 {
    12
}
fn default_height() -> u32 {
    12
}
fn default_tile_size() -> f32 {
    0.64
}
fn default_noise_scale() -> f64 {
    0.25
}
fn default_fire_threshold() -> f64 {
    0.15
}
fn default_water_threshold() -> f64 {
    0.6
}
fn default_village_band_min() -> f64 {
    0.5
}
fn default_village_chance() -> f64 {
    0.05
}
fn default_max_generation_attempts() -> u32 {
    10_000
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            width: default_width(),
            height: default_height(),
            tile_size: default_tile_size(),
            noise_scale: default_noise_scale(),
            fire_threshold: default_fire_threshold(),
            water_threshold: default_water_threshold(),
            village_band_min: default_village_band_min(),
            village_chance: default_village_chance(),
            max_generation_attempts: default_max_generation_attempts(),
        }
    }
}

impl GenerationParams {
    /// Load generation parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let params: Self = toml::from_str(&content)
            .map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(2..=64).contains(&self.width) {
            return Err(format!("width must be 2-64, got {}", self.width));
        }
        if !(2..=64).contains(&self.height) {
            return Err(format!("height must be 2-64, got {}", self.height));
        }
        if !(self.tile_size > 0.0 && self.tile_size.is_finite()) {
            return Err(format!("tile_size must be > 0.0, got {}", self.tile_size));
        }
        if !(self.noise_scale > 0.0 && self.noise_scale.is_finite()) {
            return Err(format!(
                "noise_scale must be > 0.0, got {}",
                self.noise_scale
            ));
        }
        for (name, value) in [
            ("fire_threshold", self.fire_threshold),
            ("water_threshold", self.water_threshold),
            ("village_band_min", self.village_band_min),
            ("village_chance", self.village_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be 0.0-1.0, got {}", name, value));
            }
        }
        if self.fire_threshold > self.village_band_min {
            return Err(format!(
                "fire_threshold ({}) must not exceed village_band_min ({})",
                self.fire_threshold, self.village_band_min
            ));
        }
        if self.village_band_min > self.water_threshold {
            return Err(format!(
                "village_band_min ({}) must not exceed water_threshold ({})",
                self.village_band_min, self.water_threshold
            ));
        }
        if self.max_generation_attempts == 0 {
            return Err("max_generation_attempts must be > 0, got 0".to_string());
        }
        Ok(())
    }
}
