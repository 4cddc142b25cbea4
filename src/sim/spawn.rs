//! Spawn scheduler
//!
//! Counts down simulated time and, when due, creates one entity at the spawn
//! edge. Pacing tightens with difficulty; a hazard is never followed directly
//! by another hazard.

use glam::Vec2;
use rand::Rng;

use super::difficulty::{difficulty_level, spawn_interval_ms};
use super::state::{
    CollectibleLook, Entity, EntityKind, GamePhase, GameState, HazardLook, KindTag, lane_center_x,
};
use crate::consts::*;
use crate::tuning::Variant;

/// Advance the spawn countdown by `dt_ms`; returns the new entity's id if one spawned
pub fn update_spawner(state: &mut GameState, dt_ms: f64) -> Option<u32> {
    if state.phase != GamePhase::Playing {
        return None;
    }

    state.spawn.time_until_next_spawn_ms -= dt_ms;
    if state.spawn.time_until_next_spawn_ms > 0.0 {
        return None;
    }

    let level = difficulty_level(state.run_time_ms, &state.tuning);
    let interval = spawn_interval_ms(level, &state.tuning);
    let tag = choose_kind(state);
    let entity = build_entity(state, tag);
    let id = entity.id;

    log::trace!(
        "spawn #{} {:?} at ({:.0}, {:.0}), next in {:.0}ms",
        id,
        tag,
        entity.pos.x,
        entity.pos.y,
        interval
    );

    state.entities.push(entity);
    state.spawn.time_until_next_spawn_ms = interval;
    state.spawn.interval_ms = interval;
    state.spawn.last_spawn_kind = Some(tag);
    state.spawn.spawned += 1;
    Some(id)
}

/// Uniform draw, except a hazard always follows up with a collectible
fn choose_kind(state: &mut GameState) -> KindTag {
    if state.spawn.last_spawn_kind == Some(KindTag::Hazard) {
        return KindTag::Collectible;
    }
    let roll: f64 = state.rng.random();
    if roll < state.tuning.hazard_share {
        KindTag::Hazard
    } else {
        KindTag::Collectible
    }
}

fn build_entity(state: &mut GameState, tag: KindTag) -> Entity {
    let tuning = &state.tuning;
    let (kind, size, speed_factor) = match tag {
        KindTag::Collectible => {
            let look = CollectibleLook::ALL[state.rng.random_range(0..CollectibleLook::ALL.len())];
            (
                EntityKind::Collectible {
                    value: tuning.collectible_value,
                    look,
                },
                Vec2::from(tuning.collectible_size),
                tuning.collectible_speed_factor,
            )
        }
        KindTag::Hazard => {
            let look = HazardLook::ALL[state.rng.random_range(0..HazardLook::ALL.len())];
            (
                EntityKind::Hazard { look },
                Vec2::from(tuning.hazard_size),
                tuning.hazard_speed_factor,
            )
        }
    };

    let (pos, vel, lane) = match tuning.variant {
        Variant::Runner => {
            // Hazards sit on the ground; collectibles float somewhere within jump reach
            let lift = match tag {
                KindTag::Collectible => state.rng.random::<f32>() * tuning.spawn_jitter,
                KindTag::Hazard => 0.0,
            };
            let pos = Vec2::new(RUNNER_WIDTH, RUNNER_GROUND_Y - size.y - lift);
            (pos, Vec2::NEG_X * speed_factor, None)
        }
        Variant::Catcher => {
            let lanes = tuning.lanes.max(1);
            let lane = state.rng.random_range(0..lanes);
            let pos = Vec2::new(lane_center_x(lane, lanes) - size.x / 2.0, -size.y);
            (pos, Vec2::Y * speed_factor, Some(lane))
        }
    };

    Entity {
        id: state.next_entity_id(),
        kind,
        pos,
        vel,
        size,
        lane,
        consumed: false,
    }
}
