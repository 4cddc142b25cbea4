//! Frame-driven simulation tick
//!
//! One tick per display frame while PLAYING, in a fixed order: difficulty,
//! spawning, movement (after sweeping last tick's dead entities), collisions,
//! terminal check.

use super::collision::resolve_collisions;
use super::difficulty::{difficulty_level, speed_for_level};
use super::events::{Action, GameEvent};
use super::machine::end_session;
use super::spawn::update_spawner;
use super::state::{GamePhase, GameState, Outcome};
use crate::tuning::Variant;

/// What a tick did, for hosts that care (HUD, bots, tests)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Simulated milliseconds added to `run_time_ms`
    pub advanced_ms: f64,
    pub spawned: Option<u32>,
    pub collected: u32,
    pub ended: Option<Outcome>,
}

/// Advance the session by `dt` nominal frames
pub fn tick(state: &mut GameState, dt: f64, events: &mut Vec<GameEvent>) -> TickReport {
    let mut report = TickReport::default();
    if state.phase != GamePhase::Playing {
        return report;
    }

    let dt_ms = dt * state.tuning.frame_budget_ms;
    state.run_time_ms += dt_ms;
    report.advanced_ms = dt_ms;

    // Difficulty
    state.difficulty_level = difficulty_level(state.run_time_ms, &state.tuning);
    state.speed = speed_for_level(state.difficulty_level, &state.tuning);

    // Spawning
    report.spawned = update_spawner(state, dt_ms);

    // Movement
    state.sweep_entities();
    let dt = dt as f32;
    let speed = state.speed;
    if state.variant() == Variant::Runner {
        state.player.apply_gravity(state.tuning.gravity, dt);
        let (width, _) = state.variant().arena();
        state.background_offset = (state.background_offset + speed * 0.5 * dt) % width;
    }
    for entity in state.entities.iter_mut() {
        entity.advance(speed, dt);
    }

    // Collisions
    let score_before = state.score;
    let resolution = resolve_collisions(state, events);
    report.collected = resolution.collected;
    for &threshold in &state.tuning.achievement_thresholds {
        if score_before < threshold && state.score >= threshold {
            events.push(GameEvent::ScoreThreshold { threshold });
        }
    }

    // Terminal conditions
    let outcome = if resolution.hazard.is_some() {
        Some(Outcome::GameOver)
    } else {
        match (state.variant(), state.tuning.clear_score) {
            (Variant::Runner, Some(target)) if state.score >= target => Some(Outcome::Cleared),
            _ => None,
        }
    };
    if let Some(outcome) = outcome {
        end_session(state, outcome, events);
        report.ended = Some(outcome);
    }

    report
}

/// Apply a player action immediately; false (and no change) if the action doesn't apply
pub fn apply_action(state: &mut GameState, action: Action, events: &mut Vec<GameEvent>) -> bool {
    if state.phase != GamePhase::Playing {
        log::debug!("{:?} ignored while {:?}", action, state.phase);
        return false;
    }

    let lanes = state.tuning.lanes;
    let applied = match (state.variant(), action) {
        (Variant::Runner, Action::Jump) => state.player.jump(state.tuning.jump_velocity),
        (Variant::Catcher, Action::MoveLeft) => state.player.shift_lane(-1, lanes),
        (Variant::Catcher, Action::MoveRight) => state.player.shift_lane(1, lanes),
        _ => false,
    };

    if applied {
        events.push(GameEvent::ActionPerformed(action));
    } else {
        log::debug!("{:?} ignored (not applicable)", action);
    }
    applied
}

/// Advance the cosmetic clear celebration; true while it is still running
pub fn tick_celebration(state: &mut GameState, dt: f64) -> bool {
    if state.phase != GamePhase::Clear {
        return false;
    }
    let dt_ms = dt * state.tuning.frame_budget_ms;
    let Some(celebration) = state.celebration.as_mut() else {
        return false;
    };

    celebration.remaining_ms -= dt_ms;
    let dt = dt as f32;
    let fade = dt / (crate::consts::CELEBRATION_MS as f32 / state.tuning.frame_budget_ms as f32);
    for particle in celebration.particles.iter_mut() {
        particle.pos += particle.vel * dt;
        particle.vel.y += 0.08 * dt;
        particle.vel.x *= 0.99;
        particle.life -= fade;
    }
    celebration.particles.retain(|p| p.life > 0.0);

    if celebration.is_active() {
        true
    } else {
        celebration.particles.clear();
        false
    }
}
