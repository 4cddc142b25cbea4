//! Frame-driven simulation module
//!
//! All gameplay logic lives here:
//! - dt-scaled timing, clamped after stalls
//! - Seeded RNG only (per session stream)
//! - Stable iteration order (entities in creation order)
//! - No rendering, audio or platform dependencies

pub mod clock;
pub mod collision;
pub mod difficulty;
pub mod events;
pub mod machine;
pub mod spawn;
pub mod state;
pub mod tick;

pub use clock::{FrameClock, Generation, TimerLease};
pub use collision::{Resolution, overlaps, resolve_collisions};
pub use difficulty::{difficulty_level, spawn_interval_ms, speed, speed_for_level};
pub use events::{
    AchievementEvent, Action, AudioCue, EventBus, GameEvent, SessionReport, SubscriptionId,
};
pub use machine::{end_session, start_session};
pub use spawn::update_spawner;
pub use state::{
    Celebration, CollectibleLook, Entity, EntityKind, GamePhase, GameState, HazardLook, KindTag,
    Outcome, Particle, Player, SpawnState,
};
pub use tick::{TickReport, apply_action, tick, tick_celebration};
