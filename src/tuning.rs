//! Data-driven game balance
//!
//! Each variant ships a preset; an override can be supplied as JSON (and, in
//! the browser, kept in LocalStorage next to the leaderboard).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consts::*;
use crate::error::TuningError;

/// Which mini-game a session plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Side-scrolling runner with jump physics and a clear target
    #[default]
    Runner,
    /// Lane-based falling-object catcher, infinite survival
    Catcher,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Runner => "runner",
            Variant::Catcher => "catcher",
        }
    }

    /// Arena size (width, height) in pixels
    pub fn arena(&self) -> (f32, f32) {
        match self {
            Variant::Runner => (RUNNER_WIDTH, RUNNER_HEIGHT),
            Variant::Catcher => (CATCHER_WIDTH, CATCHER_HEIGHT),
        }
    }
}

impl FromStr for Variant {
    type Err = TuningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "runner" | "run" => Ok(Variant::Runner),
            "catcher" | "catch" | "lanes" => Ok(Variant::Catcher),
            _ => Err(TuningError::UnknownVariant(s.to_string())),
        }
    }
}

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub variant: Variant,

    // === Clock ===
    /// Nominal frame duration in ms (dt = 1 at this frame time)
    pub frame_budget_ms: f64,
    /// Clamp for dt after stalls
    pub max_dt: f64,

    // === Difficulty ===
    /// Simulated ms per difficulty level
    pub difficulty_step_ms: f64,
    /// Pixels per nominal frame at level 0
    pub base_speed: f32,
    /// Added per difficulty level
    pub speed_step: f32,
    /// Hard ceiling on speed
    pub speed_cap: f32,

    // === Spawning ===
    pub min_spawn_interval_ms: f64,
    pub max_spawn_interval_ms: f64,
    /// Interval reduction per difficulty level
    pub spawn_step_ms: f64,
    /// Countdown before the first spawn of a session
    pub first_spawn_delay_ms: f64,
    /// Probability of drawing a hazard (before anti-repetition)
    pub hazard_share: f64,
    /// Vertical placement jitter (runner collectibles)
    pub spawn_jitter: f32,
    pub collectible_size: (f32, f32),
    pub hazard_size: (f32, f32),

    // === Movement ===
    /// Collectible velocity relative to speed
    pub collectible_speed_factor: f32,
    /// Hazard velocity relative to speed
    pub hazard_speed_factor: f32,
    /// Runner gravity (px per frame²)
    pub gravity: f32,
    /// Runner jump impulse (px per frame, negative is up)
    pub jump_velocity: f32,
    /// Catcher lane count
    pub lanes: u8,

    // === Scoring ===
    /// Inward margin applied to both boxes before the overlap test
    pub hitbox_margin: f32,
    /// Score awarded per collectible
    pub collectible_value: u32,
    /// Score that clears the session (runner only)
    pub clear_score: Option<u32>,
    /// Scores that fire an achievement notification when crossed
    pub achievement_thresholds: Vec<u32>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::runner()
    }
}

impl Tuning {
    /// Runner preset
    pub fn runner() -> Self {
        Self {
            variant: Variant::Runner,

            frame_budget_ms: FRAME_BUDGET_MS,
            max_dt: MAX_DT,

            difficulty_step_ms: DIFFICULTY_STEP_MS,
            base_speed: 6.0,
            speed_step: 1.0,
            speed_cap: 14.0,

            min_spawn_interval_ms: 700.0,
            max_spawn_interval_ms: 1800.0,
            spawn_step_ms: 150.0,
            first_spawn_delay_ms: 1200.0,
            hazard_share: 0.5,
            spawn_jitter: 150.0,
            collectible_size: (50.0, 50.0),
            hazard_size: (60.0, 70.0),

            collectible_speed_factor: 1.0,
            hazard_speed_factor: 1.0,
            gravity: 0.8,
            jump_velocity: -16.0,
            lanes: 1,

            hitbox_margin: 20.0,
            collectible_value: 1,
            clear_score: Some(30),
            achievement_thresholds: vec![10, 20],
        }
    }

    /// Catcher preset
    pub fn catcher() -> Self {
        Self {
            variant: Variant::Catcher,

            base_speed: 4.0,
            speed_step: 0.6,
            speed_cap: 10.0,

            min_spawn_interval_ms: 450.0,
            max_spawn_interval_ms: 1200.0,
            spawn_step_ms: 100.0,
            first_spawn_delay_ms: 800.0,
            hazard_share: 0.4,
            spawn_jitter: 0.0,
            collectible_size: (56.0, 56.0),
            hazard_size: (56.0, 56.0),

            hazard_speed_factor: 1.15,
            gravity: 0.0,
            jump_velocity: 0.0,
            lanes: 3,

            hitbox_margin: 8.0,
            clear_score: None,
            achievement_thresholds: vec![10, 25, 50],
            ..Self::runner()
        }
    }

    /// Preset for a variant
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Runner => Self::runner(),
            Variant::Catcher => Self::catcher(),
        }
    }

    /// Parse and validate a JSON override
    ///
    /// Fields the override leaves out come from the preset of the variant it
    /// names (runner if it names none).
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let overrides: Value = serde_json::from_str(json)?;
        let Value::Object(fields) = overrides else {
            return Err(TuningError::NotAnObject);
        };
        let variant = match fields.get("variant") {
            Some(v) => Variant::deserialize(v)?,
            None => Variant::default(),
        };

        let mut merged = serde_json::to_value(Self::for_variant(variant))?;
        if let Value::Object(base) = &mut merged {
            base.extend(fields);
        }
        let tuning: Tuning = serde_json::from_value(merged)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would make the curve non-monotonic or the game unplayable
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("frame_budget_ms", self.frame_budget_ms),
            ("max_dt", self.max_dt),
            ("difficulty_step_ms", self.difficulty_step_ms),
            ("min_spawn_interval_ms", self.min_spawn_interval_ms),
            ("base_speed", f64::from(self.base_speed)),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(TuningError::NotPositive { field, value });
            }
        }
        if self.spawn_step_ms < 0.0 {
            return Err(TuningError::NotPositive {
                field: "spawn_step_ms",
                value: self.spawn_step_ms,
            });
        }
        if self.speed_step < 0.0 {
            return Err(TuningError::NotPositive {
                field: "speed_step",
                value: f64::from(self.speed_step),
            });
        }
        if self.min_spawn_interval_ms > self.max_spawn_interval_ms {
            return Err(TuningError::SpawnIntervalRange {
                min: self.min_spawn_interval_ms,
                max: self.max_spawn_interval_ms,
            });
        }
        if self.speed_cap < self.base_speed {
            return Err(TuningError::SpeedCapBelowBase {
                base: self.base_speed,
                cap: self.speed_cap,
            });
        }
        if !(0.0..=1.0).contains(&self.hazard_share) {
            return Err(TuningError::HazardShare(self.hazard_share));
        }
        if self.variant == Variant::Catcher && self.lanes == 0 {
            return Err(TuningError::NoLanes);
        }
        Ok(())
    }

    /// LocalStorage key for a variant override
    #[allow(dead_code)]
    fn storage_key(variant: Variant) -> String {
        format!("wedding_arcade_tuning_{}", variant.as_str())
    }

    /// Load the override for a variant from LocalStorage, falling back to the preset
    #[cfg(target_arch = "wasm32")]
    pub fn load(variant: Variant) -> Self {
        let Some(json) = crate::platform::web::storage_get(&Self::storage_key(variant)) else {
            return Self::for_variant(variant);
        };
        match Self::from_json(&json) {
            Ok(tuning) if tuning.variant == variant => {
                log::info!("Loaded {} tuning override", variant.as_str());
                tuning
            }
            Ok(_) => {
                log::warn!("Tuning override targets another variant, using preset");
                Self::for_variant(variant)
            }
            Err(e) => {
                log::warn!("Ignoring tuning override: {}", e);
                Self::for_variant(variant)
            }
        }
    }

    /// Native: presets only
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(variant: Variant) -> Self {
        Self::for_variant(variant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(Tuning::runner().validate().is_ok());
        assert!(Tuning::catcher().validate().is_ok());
        assert_eq!(Tuning::catcher().clear_score, None);
        assert!(Tuning::runner().clear_score.is_some());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let tuning = Tuning::from_json(r#"{ "speed_cap": 20.0, "hitbox_margin": 10.0 }"#).unwrap();
        assert_eq!(tuning.speed_cap, 20.0);
        assert_eq!(tuning.hitbox_margin, 10.0);
        assert_eq!(tuning.base_speed, Tuning::runner().base_speed);
    }

    #[test]
    fn test_rejects_inverted_interval() {
        let err = Tuning::from_json(
            r#"{ "min_spawn_interval_ms": 2000.0, "max_spawn_interval_ms": 1000.0 }"#,
        )
        .unwrap_err();
        assert!(matches!(err, TuningError::SpawnIntervalRange { .. }));
    }

    #[test]
    fn test_rejects_cap_below_base() {
        let mut tuning = Tuning::runner();
        tuning.speed_cap = 1.0;
        assert!(matches!(tuning.validate(), Err(TuningError::SpeedCapBelowBase { .. })));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(Tuning::from_json("not json"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!("Runner".parse::<Variant>().unwrap(), Variant::Runner);
        assert_eq!("lanes".parse::<Variant>().unwrap(), Variant::Catcher);
        assert!(matches!("pong".parse::<Variant>(), Err(TuningError::UnknownVariant(_))));
    }

    #[test]
    fn test_catcher_override_keeps_catcher_preset() {
        let tuning = Tuning::from_json(r#"{ "variant": "Catcher", "speed_cap": 12.0 }"#).unwrap();
        let preset = Tuning::catcher();
        assert_eq!(tuning.variant, Variant::Catcher);
        assert_eq!(tuning.speed_cap, 12.0);
        assert_eq!(tuning.lanes, preset.lanes);
        assert_eq!(tuning.clear_score, None);
        assert_eq!(tuning.hitbox_margin, preset.hitbox_margin);
        assert_eq!(tuning.base_speed, preset.base_speed);
    }

    #[test]
    fn test_preset_survives_json_round_trip() {
        let json = serde_json::to_string(&Tuning::catcher()).unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), Tuning::catcher());
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(Tuning::from_json("[1, 2]"), Err(TuningError::NotAnObject)));
    }
}
