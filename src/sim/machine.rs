//! Session state machine
//!
//! START -> PLAYING on start input; PLAYING -> GAME_OVER on a hazard hit;
//! PLAYING -> CLEAR when the runner reaches its clear score; GAME_OVER/CLEAR ->
//! PLAYING on retry. Nothing else moves the phase.

use glam::Vec2;
use rand::Rng;

use super::events::{GameEvent, SessionReport};
use super::state::{Celebration, GamePhase, GameState, Outcome, Particle};
use crate::consts::*;

fn transition(state: &mut GameState, next: GamePhase) {
    debug_assert!(
        state.phase.can_transition_to(next),
        "illegal transition {:?} -> {:?}",
        state.phase,
        next
    );
    log::debug!("phase {:?} -> {:?}", state.phase, next);
    state.phase = next;
}

/// Begin (or retry) a session; false if a session is already running
pub fn start_session(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    if !state.phase.accepts_start() {
        log::debug!("start ignored while {:?}", state.phase);
        return false;
    }

    state.reset_session();
    transition(state, GamePhase::Playing);
    events.push(GameEvent::SessionStarted {
        session: state.sessions_started,
    });
    log::info!(
        "{} session {} started",
        state.variant().as_str(),
        state.sessions_started
    );
    true
}

/// Enter a terminal phase; false if not currently playing
pub fn end_session(state: &mut GameState, outcome: Outcome, events: &mut Vec<GameEvent>) -> bool {
    let next = match outcome {
        Outcome::GameOver => GamePhase::GameOver,
        Outcome::Cleared => GamePhase::Clear,
    };
    if !state.phase.can_transition_to(next) {
        return false;
    }
    transition(state, next);
    // No entity outlives its session
    state.entities.clear();

    if outcome == Outcome::Cleared {
        state.celebration = Some(launch_confetti(state));
    }

    let report = SessionReport {
        variant: state.variant(),
        session: state.sessions_started,
        final_score: state.score,
        elapsed_play_time_ms: state.elapsed_play_time_ms,
        outcome,
    };
    log::info!(
        "{} session {} ended ({:?}) score={} time={}ms",
        report.variant.as_str(),
        report.session,
        outcome,
        report.final_score,
        report.elapsed_play_time_ms
    );
    events.push(GameEvent::SessionEnded(report));
    true
}

/// Confetti burst across the top of the arena
fn launch_confetti(state: &mut GameState) -> Celebration {
    let (width, _) = state.variant().arena();
    let particles = (0..CELEBRATION_PARTICLES)
        .map(|i| {
            let x = state.rng.random::<f32>() * width;
            let angle = state.rng.random_range(-0.6f32..0.6);
            let speed = state.rng.random_range(2.0f32..6.0);
            Particle {
                pos: Vec2::new(x, -10.0),
                vel: Vec2::new(angle.sin(), angle.cos()) * speed,
                color: (i % 6) as u32,
                life: 1.0,
                size: state.rng.random_range(4.0f32..9.0),
            }
        })
        .collect();
    Celebration {
        remaining_ms: CELEBRATION_MS,
        particles,
    }
}
