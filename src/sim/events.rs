//! Side-effect events and the session-owned event bus
//!
//! The tick never calls out directly. It pushes `GameEvent`s into an output
//! buffer; the engine drains the buffer after each tick and fans the events
//! out to the audio, achievement and reporting boundaries and to any
//! subscribers. Subscriptions live exactly as long as the bus (the engine).

use serde::{Deserialize, Serialize};

use super::state::Outcome;
use crate::tuning::Variant;

/// Player actions that produce feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Jump,
    MoveLeft,
    MoveRight,
}

/// Final result of a session, handed to the score reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub variant: Variant,
    /// 1-based session counter within this engine
    pub session: u32,
    pub final_score: u32,
    pub elapsed_play_time_ms: u64,
    pub outcome: Outcome,
}

/// Everything observable that happens inside the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted { session: u32 },
    ActionPerformed(Action),
    Collected { id: u32, value: u32, score: u32 },
    HazardHit { id: u32 },
    /// Score crossed one of the tuning's achievement thresholds
    ScoreThreshold { threshold: u32 },
    SessionEnded(SessionReport),
}

/// Audio boundary cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    ActionPerformed(Action),
    Collected,
    HazardHit,
    SessionCleared,
}

impl AudioCue {
    /// Cue for an event, if the event has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::ActionPerformed(action) => Some(AudioCue::ActionPerformed(*action)),
            GameEvent::Collected { .. } => Some(AudioCue::Collected),
            GameEvent::HazardHit { .. } => Some(AudioCue::HazardHit),
            GameEvent::SessionEnded(report) if report.outcome == Outcome::Cleared => {
                Some(AudioCue::SessionCleared)
            }
            _ => None,
        }
    }
}

/// Achievement notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AchievementEvent {
    SessionStarted,
    ScoreReached,
    SessionCleared,
}

impl AchievementEvent {
    /// Notification `(kind, value)` for an event, if any
    pub fn for_event(event: &GameEvent) -> Option<(Self, u32)> {
        match event {
            GameEvent::SessionStarted { session } => {
                Some((AchievementEvent::SessionStarted, *session))
            }
            GameEvent::ScoreThreshold { threshold } => {
                Some((AchievementEvent::ScoreReached, *threshold))
            }
            GameEvent::SessionEnded(report) if report.outcome == Outcome::Cleared => {
                Some((AchievementEvent::SessionCleared, report.final_score))
            }
            _ => None,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Publish/subscribe channel owned by the engine
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Deliver to listeners in subscription order
    pub fn publish(&mut self, event: &GameEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
