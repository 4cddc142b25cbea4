//! Local high score leaderboard
//!
//! Keeps the top 10 finished sessions per variant. Persisted to LocalStorage
//! in the browser; plugs into the engine as its score reporter.

use serde::{Deserialize, Serialize};

use crate::engine::ScoreReporter;
use crate::error::ReportError;
use crate::sim::{Outcome, SessionReport};
use crate::tuning::Variant;

/// Maximum number of high scores to keep per variant
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u32,
    /// Wall-clock play time
    pub elapsed_ms: u64,
    pub cleared: bool,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Leaderboards for both mini-games
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub runner: Vec<HighScoreEntry>,
    pub catcher: Vec<HighScoreEntry>,
    /// Write to LocalStorage after every accepted score
    #[serde(skip)]
    pub autosave: bool,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "wedding_arcade_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, variant: Variant) -> &[HighScoreEntry] {
        match variant {
            Variant::Runner => &self.runner,
            Variant::Catcher => &self.catcher,
        }
    }

    fn entries_mut(&mut self, variant: Variant) -> &mut Vec<HighScoreEntry> {
        match variant {
            Variant::Runner => &mut self.runner,
            Variant::Catcher => &mut self.catcher,
        }
    }

    /// Check if a score makes the board
    pub fn qualifies(&self, variant: Variant, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        let entries = self.entries(variant);
        if entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Insert a finished session; returns the rank achieved (1-indexed)
    pub fn add_score(&mut self, variant: Variant, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(variant, entry.score) {
            return None;
        }
        let entries = self.entries_mut(variant);
        // Ties go below existing entries; faster time doesn't outrank
        let pos = entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                entries.insert(i, entry);
                i + 1
            }
            None => {
                entries.push(entry);
                entries.len()
            }
        };
        entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn top_score(&self, variant: Variant) -> Option<u32> {
        self.entries(variant).first().map(|e| e.score)
    }

    pub fn is_empty(&self) -> bool {
        self.runner.is_empty() && self.catcher.is_empty()
    }

    /// Load from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        if let Some(json) = crate::platform::web::storage_get(Self::STORAGE_KEY) {
            if let Ok(mut scores) = serde_json::from_str::<HighScores>(&json) {
                log::info!(
                    "Loaded high scores (runner {}, catcher {})",
                    scores.runner.len(),
                    scores.catcher.len()
                );
                scores.autosave = true;
                return scores;
            }
        }
        log::info!("No high scores found, starting fresh");
        Self {
            autosave: true,
            ..Self::new()
        }
    }

    /// Save to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), ReportError> {
        let json = serde_json::to_string(self)?;
        crate::platform::web::storage_set(Self::STORAGE_KEY, &json)?;
        log::info!("High scores saved");
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<(), ReportError> {
        Ok(())
    }
}

impl ScoreReporter for HighScores {
    fn report(&mut self, report: &SessionReport) -> Result<(), ReportError> {
        let entry = HighScoreEntry {
            score: report.final_score,
            elapsed_ms: report.elapsed_play_time_ms,
            cleared: report.outcome == Outcome::Cleared,
            timestamp: crate::platform::timestamp_ms(),
        };
        if let Some(rank) = self.add_score(report.variant, entry) {
            log::info!(
                "{} score {} ranked #{}",
                report.variant.as_str(),
                report.final_score,
                rank
            );
            if self.autosave {
                self.save()?;
            }
        }
        Ok(())
    }
}
