//! Difficulty curve
//!
//! Pure functions of simulated run time. Level rises every
//! `difficulty_step_ms`; speed and spawn pacing follow the level and are capped.

use crate::tuning::Tuning;

/// Integer level for a simulated run time
#[inline]
pub fn difficulty_level(run_time_ms: f64, tuning: &Tuning) -> u32 {
    if run_time_ms <= 0.0 {
        return 0;
    }
    (run_time_ms / tuning.difficulty_step_ms).floor() as u32
}

/// Scroll/fall speed for a level, capped at `speed_cap`
#[inline]
pub fn speed_for_level(level: u32, tuning: &Tuning) -> f32 {
    (tuning.base_speed + level as f32 * tuning.speed_step).min(tuning.speed_cap)
}

/// Scroll/fall speed after `run_time_ms` of simulated play
#[inline]
pub fn speed(run_time_ms: f64, tuning: &Tuning) -> f32 {
    speed_for_level(difficulty_level(run_time_ms, tuning), tuning)
}

/// Spawn interval for a level, floored at `min_spawn_interval_ms`
#[inline]
pub fn spawn_interval_ms(level: u32, tuning: &Tuning) -> f64 {
    (tuning.max_spawn_interval_ms - f64::from(level) * tuning.spawn_step_ms)
        .max(tuning.min_spawn_interval_ms)
}
