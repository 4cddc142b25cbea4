//! Session state and core simulation types
//!
//! `GameState` is the single authoritative copy of a session. Views read
//! snapshots of it, only the tick and the state machine write to it.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::Rect;
use crate::consts::*;
use crate::tuning::{Tuning, Variant};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Idle, waiting for the first start input
    Start,
    /// Simulation active
    Playing,
    /// Loss (hazard hit)
    GameOver,
    /// Win (clear score reached, runner only)
    Clear,
}

impl GamePhase {
    /// GameOver and Clear end the active simulation
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Clear)
    }

    /// Does a start/continue input apply in this phase
    pub fn accepts_start(&self) -> bool {
        !matches!(self, GamePhase::Playing)
    }

    /// Edges of the session graph
    pub fn can_transition_to(&self, next: GamePhase) -> bool {
        use GamePhase::*;
        matches!(
            (*self, next),
            (Start, Playing)
                | (GameOver, Playing)
                | (Clear, Playing)
                | (Playing, GameOver)
                | (Playing, Clear)
        )
    }
}

/// Collectible art (presentation only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectibleLook {
    Heart,
    Ring,
    Bouquet,
    Champagne,
}

impl CollectibleLook {
    pub const ALL: [CollectibleLook; 4] = [
        CollectibleLook::Heart,
        CollectibleLook::Ring,
        CollectibleLook::Bouquet,
        CollectibleLook::Champagne,
    ];
}

/// Hazard art (presentation only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardLook {
    Puddle,
    Stone,
    Pigeon,
}

impl HazardLook {
    pub const ALL: [HazardLook; 3] = [HazardLook::Puddle, HazardLook::Stone, HazardLook::Pigeon];
}

/// What an entity does on contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Collectible { value: u32, look: CollectibleLook },
    Hazard { look: HazardLook },
}

impl EntityKind {
    pub fn tag(&self) -> KindTag {
        match self {
            EntityKind::Collectible { .. } => KindTag::Collectible,
            EntityKind::Hazard { .. } => KindTag::Hazard,
        }
    }
}

/// Kind without payload, used by the spawner's memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindTag {
    Collectible,
    Hazard,
}

/// A spawned collectible or hazard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Creation order, also the collision resolution order
    pub id: u32,
    pub kind: EntityKind,
    /// Top-left corner
    pub pos: Vec2,
    /// Direction scaled by the kind's speed factor; multiplied by speed and dt each tick
    pub vel: Vec2,
    pub size: Vec2,
    /// Lane index (catcher only)
    pub lane: Option<u8>,
    pub consumed: bool,
}

impl Entity {
    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Move along the scroll axis
    pub fn advance(&mut self, speed: f32, dt: f32) {
        self.pos += self.vel * speed * dt;
    }

    /// Fully left the visible arena (left edge for runner, bottom edge for catcher)
    pub fn is_off_screen(&self, arena: (f32, f32)) -> bool {
        let b = self.bounds();
        b.right() < 0.0 || b.x > arena.0 || b.y > arena.1 || b.bottom() < -b.h * 2.0
    }

    pub fn is_hazard(&self) -> bool {
        matches!(self.kind, EntityKind::Hazard { .. })
    }
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Vertical velocity (runner)
    pub dy: f32,
    /// Current lane (catcher)
    pub lane: u8,
    /// Standing on the ground (runner) / able to act
    pub grounded: bool,
}

impl Player {
    /// Runner avatar standing on the ground line
    pub fn runner() -> Self {
        Self {
            pos: Vec2::new(RUNNER_PLAYER_X, RUNNER_GROUND_Y - RUNNER_PLAYER_SIZE),
            size: Vec2::splat(RUNNER_PLAYER_SIZE),
            dy: 0.0,
            lane: 0,
            grounded: true,
        }
    }

    /// Catcher avatar in the middle lane
    pub fn catcher(lanes: u8) -> Self {
        let lane = lanes / 2;
        let size = Vec2::splat(CATCHER_PLAYER_SIZE);
        Self {
            pos: Vec2::new(
                lane_center_x(lane, lanes) - size.x / 2.0,
                CATCHER_HEIGHT - size.y - CATCHER_PLAYER_BOTTOM_MARGIN,
            ),
            size,
            dy: 0.0,
            lane,
            grounded: true,
        }
    }

    pub fn for_tuning(tuning: &Tuning) -> Self {
        match tuning.variant {
            Variant::Runner => Self::runner(),
            Variant::Catcher => Self::catcher(tuning.lanes),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Start a jump; false if already airborne
    pub fn jump(&mut self, impulse: f32) -> bool {
        if !self.grounded {
            return false;
        }
        self.dy = impulse;
        self.grounded = false;
        true
    }

    /// Integrate vertical physics, landing on the ground line
    pub fn apply_gravity(&mut self, gravity: f32, dt: f32) {
        if self.grounded {
            return;
        }
        self.dy += gravity * dt;
        self.pos.y += self.dy * dt;

        let floor = RUNNER_GROUND_Y - self.size.y;
        if self.pos.y >= floor {
            self.pos.y = floor;
            self.dy = 0.0;
            self.grounded = true;
        }
    }

    /// Move one lane left (-1) or right (+1); false at the edge
    pub fn shift_lane(&mut self, delta: i8, lanes: u8) -> bool {
        let target = i16::from(self.lane) + i16::from(delta);
        if target < 0 || target >= i16::from(lanes) {
            return false;
        }
        self.lane = target as u8;
        self.pos.x = lane_center_x(self.lane, lanes) - self.size.x / 2.0;
        true
    }
}

/// Horizontal centre of a catcher lane
pub fn lane_center_x(lane: u8, lanes: u8) -> f32 {
    let lane_width = CATCHER_WIDTH / f32::from(lanes.max(1));
    lane_width * (f32::from(lane) + 0.5)
}

/// Spawner memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnState {
    /// Countdown to the next spawn
    pub time_until_next_spawn_ms: f64,
    /// Interval chosen at the last spawn
    pub interval_ms: f64,
    /// Kind of the most recent spawn (anti-repetition)
    pub last_spawn_kind: Option<KindTag>,
    /// Spawns this session
    pub spawned: u32,
}

impl SpawnState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            time_until_next_spawn_ms: tuning.first_spawn_delay_ms,
            interval_ms: tuning.max_spawn_interval_ms,
            last_spawn_kind: None,
            spawned: 0,
        }
    }
}

/// A confetti particle (cosmetic, never touches gameplay)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Palette index for the renderer
    pub color: u32,
    /// 0-1, decreases over time
    pub life: f32,
    pub size: f32,
}

/// Cosmetic sub-loop that keeps running after a clear
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Celebration {
    pub remaining_ms: f64,
    pub particles: Vec<Particle>,
}

impl Celebration {
    pub fn is_active(&self) -> bool {
        self.remaining_ms > 0.0
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    GameOver,
    Cleared,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Host-provided seed; each session derives its own stream from it
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub score: u32,
    /// Accumulated dt * frame budget; drives difficulty and spawning
    pub run_time_ms: f64,
    /// Wall-clock play time for HUD and reporting
    pub elapsed_play_time_ms: u64,
    /// Derived from the difficulty curve each tick
    pub speed: f32,
    pub difficulty_level: u32,
    /// Runner background scroll
    pub background_offset: f32,
    pub player: Player,
    /// Transient entities in creation order
    pub entities: Vec<Entity>,
    pub spawn: SpawnState,
    pub celebration: Option<Celebration>,
    /// Sessions begun since construction
    pub sessions_started: u32,
    next_id: u32,
}

impl GameState {
    /// Fresh state waiting in `Start`
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let speed = tuning.base_speed;
        Self {
            rng: Pcg32::seed_from_u64(seed),
            seed,
            phase: GamePhase::Start,
            score: 0,
            run_time_ms: 0.0,
            elapsed_play_time_ms: 0,
            speed,
            difficulty_level: 0,
            background_offset: 0.0,
            player: Player::for_tuning(&tuning),
            entities: Vec::new(),
            spawn: SpawnState::new(&tuning),
            celebration: None,
            sessions_started: 0,
            next_id: 1,
            tuning,
        }
    }

    pub fn variant(&self) -> Variant {
        self.tuning.variant
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Clear everything a session owns and reseed the spawn stream
    pub fn reset_session(&mut self) {
        self.sessions_started += 1;
        self.rng = Pcg32::seed_from_u64(self.seed.wrapping_add(u64::from(self.sessions_started)));
        self.score = 0;
        self.run_time_ms = 0.0;
        self.elapsed_play_time_ms = 0;
        self.speed = self.tuning.base_speed;
        self.difficulty_level = 0;
        self.background_offset = 0.0;
        self.player = Player::for_tuning(&self.tuning);
        self.entities.clear();
        self.spawn = SpawnState::new(&self.tuning);
        self.celebration = None;
        self.next_id = 1;
    }

    /// Drop consumed and off-screen entities
    pub fn sweep_entities(&mut self) {
        let arena = self.variant().arena();
        self.entities.retain(|e| !e.consumed && !e.is_off_screen(arena));
    }
}
