//! Wedding Arcade - mini-game engine for the invitation site's game mode
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (clock, spawning, difficulty, collisions, game state)
//! - `engine`: Host-facing session owner (input, timers, reporting, snapshots)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Local leaderboard, doubles as a score reporter
//! - `platform`: Browser timers and storage

pub mod engine;
pub mod error;
pub mod highscores;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use engine::{Engine, Schedule, Snapshot};
pub use error::{ReportError, TuningError};
pub use highscores::HighScores;
pub use tuning::{Tuning, Variant};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Engine-wide constants
pub mod consts {
    /// Nominal frame duration (60 Hz display)
    pub const FRAME_BUDGET_MS: f64 = 1000.0 / 60.0;
    /// Largest dt accepted after a stall (backgrounded tab etc.)
    pub const MAX_DT: f64 = 2.0;
    /// Simulated time per difficulty level
    pub const DIFFICULTY_STEP_MS: f64 = 5000.0;
    /// Wall-clock HUD counter period
    pub const WALL_TICK_MS: u32 = 1000;

    /// Runner arena (800x500, ground line under the player)
    pub const RUNNER_WIDTH: f32 = 800.0;
    pub const RUNNER_HEIGHT: f32 = 500.0;
    pub const RUNNER_GROUND_Y: f32 = 440.0;
    pub const RUNNER_PLAYER_X: f32 = 80.0;
    pub const RUNNER_PLAYER_SIZE: f32 = 140.0;

    /// Catcher arena (portrait, lanes split the width evenly)
    pub const CATCHER_WIDTH: f32 = 360.0;
    pub const CATCHER_HEIGHT: f32 = 640.0;
    pub const CATCHER_PLAYER_SIZE: f32 = 80.0;
    pub const CATCHER_PLAYER_BOTTOM_MARGIN: f32 = 24.0;

    /// Celebration confetti
    pub const CELEBRATION_MS: f64 = 3000.0;
    pub const CELEBRATION_PARTICLES: usize = 96;
}

/// Axis-aligned box, origin at top-left (screen coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Build from a top-left corner and a size
    #[inline]
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Shrink inward by `margin` on every side (never below zero size)
    #[inline]
    pub fn shrink(&self, margin: f32) -> Self {
        let w = (self.w - 2.0 * margin).max(0.0);
        let h = (self.h - 2.0 * margin).max(0.0);
        Self::new(self.x + margin, self.y + margin, w, h)
    }

    /// True if the two boxes overlap on both axes (touching edges don't count)
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}
