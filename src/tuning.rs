//! Data-driven game balance
//!
//! Runtime knobs that the frame driver and spawner read. Everything has a
//! default matching the stock balance, so a partial JSON file only overrides
//! the fields it names.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{BOSS_INTERVAL, MAX_FRAME_DT};

/// Errors from loading or validating tuning
#[derive(thiserror::Error, Debug)]
pub enum TuningError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid tuning value for `{field}`: {value}")]
    OutOfRange { field: &'static str, value: f32 },
}

/// Logical viewport size; spawns ring the camera at this size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 540.0,
        }
    }
}

/// Enemy spawn pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Interval at t = 0 (seconds)
    pub base_interval: f32,
    /// Linear ramp bottoms out here
    pub min_interval: f32,
    /// Absolute floor after the per-minute speedup
    pub floor_interval: f32,
    /// Seconds for the linear ramp to shave off one second of interval
    pub ramp_seconds: f32,
    /// Spawn rate multiplier applied once per elapsed minute
    pub rate_growth_per_minute: f32,
    /// Chance of a third enemy per spawn burst
    pub extra_spawn_chance: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            base_interval: 0.55,
            min_interval: 0.14,
            floor_interval: 0.06,
            ramp_seconds: 180.0,
            rate_growth_per_minute: 1.5,
            extra_spawn_chance: 0.30,
        }
    }
}

impl SpawnTuning {
    /// Seconds between spawn bursts at `elapsed`
    pub fn interval_at(&self, elapsed: f32) -> f32 {
        let minute = (elapsed / 60.0).floor();
        let speed_mul = self.rate_growth_per_minute.powf(minute);
        let base = (self.base_interval - elapsed / self.ramp_seconds).max(self.min_interval);
        (base / speed_mul).max(self.floor_interval)
    }
}

/// Top-level tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub viewport: Viewport,
    /// Frame delta clamp (seconds)
    pub max_frame_dt: f32,
    /// Enemies seeded when a run starts
    pub initial_enemies: u32,
    /// Seconds between boss thresholds
    pub boss_interval: f32,
    pub spawn: SpawnTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            max_frame_dt: MAX_FRAME_DT,
            initial_enemies: 12,
            boss_interval: BOSS_INTERVAL,
            spawn: SpawnTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load tuning, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Reject values that would break the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("viewport.width", self.viewport.width),
            ("viewport.height", self.viewport.height),
            ("max_frame_dt", self.max_frame_dt),
            ("boss_interval", self.boss_interval),
            ("spawn.base_interval", self.spawn.base_interval),
            ("spawn.min_interval", self.spawn.min_interval),
            ("spawn.floor_interval", self.spawn.floor_interval),
            ("spawn.ramp_seconds", self.spawn.ramp_seconds),
            ("spawn.rate_growth_per_minute", self.spawn.rate_growth_per_minute),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TuningError::OutOfRange { field, value });
            }
        }
        let chance = self.spawn.extra_spawn_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(TuningError::OutOfRange {
                field: "spawn.extra_spawn_chance",
                value: chance,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "initial_enemies": 3, "viewport": { "width": 800, "height": 600 } }"#;
        let tuning = Tuning::from_json(json).expect("valid tuning");
        assert_eq!(tuning.initial_enemies, 3);
        assert_eq!(tuning.viewport.width, 800.0);
        assert_eq!(tuning.max_frame_dt, MAX_FRAME_DT);
        assert_eq!(tuning.spawn, SpawnTuning::default());
    }

    #[test]
    fn test_partial_viewport_keeps_other_axis() {
        let tuning =
            Tuning::from_json(r#"{ "viewport": { "width": 1280 } }"#).expect("valid tuning");
        assert_eq!(tuning.viewport.width, 1280.0);
        assert_eq!(tuning.viewport.height, 540.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = Tuning::from_json(r#"{ "max_frame_dt": 0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::OutOfRange { field: "max_frame_dt", .. }));

        let err = Tuning::from_json(r#"{ "spawn": { "extra_spawn_chance": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::OutOfRange { .. }));

        assert!(matches!(Tuning::from_json("not json"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_json_roundtrip_default() {
        let json = Tuning::default().to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), Tuning::default());
    }

    #[test]
    fn test_spawn_interval_ramps_down() {
        let spawn = SpawnTuning::default();
        assert!((spawn.interval_at(0.0) - 0.55).abs() < 1e-6);
        // Linear ramp, still minute 0
        assert!((spawn.interval_at(36.0) - 0.35).abs() < 1e-5);
        // Minute 1: ramp clamped to 0.14 then divided by 1.5
        assert!((spawn.interval_at(90.0) - 0.14 / 1.5).abs() < 1e-5);
        // Late game hits the floor
        assert_eq!(spawn.interval_at(600.0), 0.06);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let tuning = Tuning::load_or_default("/definitely/not/here.json");
        assert_eq!(tuning, Tuning::default());
    }
}
