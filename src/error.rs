//! Error types
//!
//! Nothing in here is fatal to a session: tuning errors surface at load time,
//! report errors are logged and dropped by the engine.

use thiserror::Error;

/// Rejected tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("min spawn interval {min}ms exceeds max spawn interval {max}ms")]
    SpawnIntervalRange { min: f64, max: f64 },
    #[error("speed cap {cap} is below base speed {base}")]
    SpeedCapBelowBase { base: f32, cap: f32 },
    #[error("hazard share must be within 0..=1 (got {0})")]
    HazardShare(f64),
    #[error("catcher needs at least one lane")]
    NoLanes,
    #[error("tuning override must be a JSON object")]
    NotAnObject,
    #[error("unknown game variant {0:?}")]
    UnknownVariant(String),
}

/// Failure while handing a finished session to persistence
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("storage unavailable")]
    StorageUnavailable,
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("could not encode report: {0}")]
    Encode(#[from] serde_json::Error),
}
