//! Collision detection and resolution
//!
//! Boxes are shrunk by the hitbox margin before the overlap test so sprite
//! padding never causes a hit. Entities resolve in creation order; the first
//! hazard ends resolution for the tick.

use super::events::GameEvent;
use super::state::{EntityKind, GameState};
use crate::Rect;

/// Result of resolving one tick's contacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    /// Collectibles picked up this tick
    pub collected: u32,
    /// Score gained this tick
    pub gained: u32,
    /// Id of the hazard that ended the session, if any
    pub hazard: Option<u32>,
}

/// Overlap test with both boxes shrunk by `margin`
#[inline]
pub fn overlaps(a: &Rect, b: &Rect, margin: f32) -> bool {
    a.shrink(margin).intersects(&b.shrink(margin))
}

/// Test the player against every live entity and apply the effects
pub fn resolve_collisions(state: &mut GameState, events: &mut Vec<GameEvent>) -> Resolution {
    let player = state.player.bounds();
    let margin = state.tuning.hitbox_margin;
    let mut resolution = Resolution::default();

    for entity in state.entities.iter_mut() {
        if entity.consumed || !overlaps(&player, &entity.bounds(), margin) {
            continue;
        }
        entity.consumed = true;

        match entity.kind {
            EntityKind::Collectible { value, .. } => {
                state.score = state.score.saturating_add(value);
                resolution.collected += 1;
                resolution.gained += value;
                events.push(GameEvent::Collected {
                    id: entity.id,
                    value,
                    score: state.score,
                });
            }
            EntityKind::Hazard { .. } => {
                resolution.hazard = Some(entity.id);
                events.push(GameEvent::HazardHit { id: entity.id });
                break;
            }
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{CollectibleLook, Entity, GamePhase, HazardLook};
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn push(state: &mut GameState, kind: EntityKind, pos: Vec2, size: Vec2) -> u32 {
        let id = state.next_entity_id();
        state.entities.push(Entity {
            id,
            kind,
            pos,
            vel: Vec2::NEG_X,
            size,
            lane: None,
            consumed: false,
        });
        id
    }

    fn heart() -> EntityKind {
        EntityKind::Collectible {
            value: 1,
            look: CollectibleLook::Heart,
        }
    }

    fn stone() -> EntityKind {
        EntityKind::Hazard {
            look: HazardLook::Stone,
        }
    }

    fn session() -> GameState {
        let mut state = GameState::new(Tuning::runner(), 1);
        state.phase = GamePhase::Playing;
        state.player.pos = Vec2::new(80.0, 300.0);
        state.player.size = Vec2::splat(140.0);
        state
    }

    #[test]
    fn test_margin_overlap_reference_case() {
        let player = Rect::new(80.0, 300.0, 140.0, 140.0);
        let coin = Rect::new(80.0, 300.0, 50.0, 50.0);
        assert!(overlaps(&player, &coin, 20.0));
    }

    #[test]
    fn test_margin_forgives_sprite_padding() {
        let player = Rect::new(80.0, 300.0, 140.0, 140.0);
        // Raw boxes overlap by 30px, less than the two 20px margins combined
        let rock = Rect::new(190.0, 300.0, 60.0, 60.0);
        assert!(player.intersects(&rock));
        assert!(!overlaps(&player, &rock, 20.0));
    }

    #[test]
    fn test_collectible_scores_and_continues() {
        let mut state = session();
        let mut events = Vec::new();
        let id = push(&mut state, heart(), Vec2::new(80.0, 300.0), Vec2::splat(50.0));

        let res = resolve_collisions(&mut state, &mut events);
        assert_eq!(res.collected, 1);
        assert_eq!(res.hazard, None);
        assert_eq!(state.score, 1);
        assert!(state.entities[0].consumed);
        assert_eq!(events, vec![GameEvent::Collected { id, value: 1, score: 1 }]);

        // Consumed entities never score twice
        let res = resolve_collisions(&mut state, &mut events);
        assert_eq!(res, Resolution::default());
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_hazard_after_collectible_is_terminal_and_keeps_score() {
        let mut state = session();
        let mut events = Vec::new();
        push(&mut state, heart(), Vec2::new(100.0, 320.0), Vec2::splat(50.0));
        let rock = push(&mut state, stone(), Vec2::new(120.0, 340.0), Vec2::splat(60.0));
        let late = push(&mut state, heart(), Vec2::new(110.0, 330.0), Vec2::splat(50.0));

        let res = resolve_collisions(&mut state, &mut events);
        assert_eq!(res.collected, 1);
        assert_eq!(res.hazard, Some(rock));
        assert_eq!(state.score, 1);
        // Resolution stopped at the hazard
        let late = state.entities.iter().find(|e| e.id == late).unwrap();
        assert!(!late.consumed);
        assert_eq!(events.last(), Some(&GameEvent::HazardHit { id: rock }));
    }

    #[test]
    fn test_far_entities_untouched() {
        let mut state = session();
        let mut events = Vec::new();
        push(&mut state, stone(), Vec2::new(600.0, 370.0), Vec2::new(60.0, 70.0));
        let res = resolve_collisions(&mut state, &mut events);
        assert_eq!(res, Resolution::default());
        assert!(events.is_empty());
    }
}
