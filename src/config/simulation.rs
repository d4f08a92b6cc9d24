use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::config::generation::GenerationParams;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_frame_rate")]
    pub frame_rate_hz: f32,
    #[serde(default = "default_villager_count")]
    pub villager_count: u32,
    #[serde(default = "default_villager_speed")]
    pub villager_speed: f32,
    #[serde(default = "default_water_speed")]
    pub water_speed: f32,
    #[serde(default = "default_max_waves")]
    pub max_waves: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub generation: GenerationParams,
}

fn default_tick_interval_ms() -> u64 {
    1300
}
fn default_frame_rate() -> f32 {
    60.0
}
fn default_villager_count() -> u32 {
    5
}
fn default_villager_speed() -> f32 {
    2.0
}
fn default_water_speed() -> f32 {
    0.25
}
fn default_max_waves() -> u32 {
    0
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            tick_interval_ms: default_tick_interval_ms(),
            frame_rate_hz: default_frame_rate(),
            villager_count: default_villager_count(),
            villager_speed: default_villager_speed(),
            water_speed: default_water_speed(),
            max_waves: default_max_waves(),
            log_level: default_log_level(),
            generation: GenerationParams::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Delay between two fire-spread ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Simulated time covered by one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.frame_rate_hz)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.tick_interval_ms == 0 {
            errors.push(format!(
                "tick_interval_ms must be > 0, got {}. Example: tick_interval_ms = 1300",
                self.tick_interval_ms
            ));
        }

        if !(self.frame_rate_hz > 0.0 && self.frame_rate_hz <= 1000.0) {
            errors.push(format!(
                "frame_rate_hz must be in (0, 1000], got {}. Example: frame_rate_hz = 60.0",
                self.frame_rate_hz
            ));
        }

        if self.villager_count == 0 {
            errors.push(format!(
                "villager_count must be > 0, got {}. Example: villager_count = 5",
                self.villager_count
            ));
        }

        if !(self.villager_speed > 0.0 && self.villager_speed.is_finite()) {
            errors.push(format!(
                "villager_speed must be > 0.0, got {}. Example: villager_speed = 2.0",
                self.villager_speed
            ));
        }

        if !(self.water_speed >= 0.0 && self.water_speed.is_finite()) {
            errors.push(format!(
                "water_speed must be >= 0.0, got {}. Example: water_speed = 0.25",
                self.water_speed
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if let Err(e) = self.generation.validate() {
            errors.push(format!("generation.{}", e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
