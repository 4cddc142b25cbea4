//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (timestamps, session seeds)
//! - Scoped browser timers (animation frames, intervals)
//! - Storage (LocalStorage on web)

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Unix timestamp in milliseconds
#[cfg(target_arch = "wasm32")]
pub fn timestamp_ms() -> f64 {
    js_sys::Date::now()
}

/// Unix timestamp in milliseconds
#[cfg(not(target_arch = "wasm32"))]
pub fn timestamp_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Seed for a new engine, derived from the clock
pub fn session_seed() -> u64 {
    timestamp_ms() as u64
}
