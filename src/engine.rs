//! Host-facing engine
//!
//! `Engine` owns the one authoritative `GameState` plus everything that lives
//! exactly as long as the game view: the frame clock, the timer lease, the
//! event bus and the external sinks. Hosts feed it frame timestamps, wall-clock
//! ticks and input, then ask [`Engine::schedule`] which timers should be
//! running. Dropping the engine (or calling [`Engine::close`]) ends everything.

use serde::Serialize;

use crate::consts::WALL_TICK_MS;
use crate::error::ReportError;
use crate::sim::{
    AchievementEvent, Action, AudioCue, Entity, EventBus, FrameClock, GameEvent, GamePhase,
    GameState, Generation, Particle, Player, SessionReport, SubscriptionId, TimerLease,
    apply_action, start_session, tick, tick_celebration,
};
use crate::tuning::{Tuning, Variant};

/// Discrete input from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Start, continue or retry
    Start,
    Jump,
    MoveLeft,
    MoveRight,
}

impl InputEvent {
    fn action(&self) -> Option<Action> {
        match self {
            InputEvent::Start => None,
            InputEvent::Jump => Some(Action::Jump),
            InputEvent::MoveLeft => Some(Action::MoveLeft),
            InputEvent::MoveRight => Some(Action::MoveRight),
        }
    }
}

/// Receives audio cues synchronously; never blocks the engine
pub trait AudioCues {
    fn cue(&mut self, cue: AudioCue);
}

/// Receives each finished session exactly once
pub trait ScoreReporter {
    fn report(&mut self, report: &SessionReport) -> Result<(), ReportError>;
}

/// Receives achievement notifications; whether anything unlocks is not our concern
pub trait AchievementSink {
    fn notify(&mut self, event: AchievementEvent, value: u32);
}

/// Draws a snapshot; nothing flows back
pub trait RenderSink {
    fn draw(&mut self, snapshot: &Snapshot<'_>);
}

impl<F: FnMut(AudioCue)> AudioCues for F {
    fn cue(&mut self, cue: AudioCue) {
        self(cue)
    }
}

impl<F: FnMut(&SessionReport) -> Result<(), ReportError>> ScoreReporter for F {
    fn report(&mut self, report: &SessionReport) -> Result<(), ReportError> {
        self(report)
    }
}

impl<F: FnMut(AchievementEvent, u32)> AchievementSink for F {
    fn notify(&mut self, event: AchievementEvent, value: u32) {
        self(event, value)
    }
}

/// Default sink for every boundary
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AudioCues for NullSink {
    fn cue(&mut self, _cue: AudioCue) {}
}

impl ScoreReporter for NullSink {
    fn report(&mut self, _report: &SessionReport) -> Result<(), ReportError> {
        Ok(())
    }
}

impl AchievementSink for NullSink {
    fn notify(&mut self, _event: AchievementEvent, _value: u32) {}
}

/// Timers the host should be running right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Schedule {
    /// Keep requesting animation frames
    pub frame_loop: bool,
    /// Keep a wall-clock interval tagged with this generation
    pub wall_clock: Option<Generation>,
}

/// Read-only view of one frame for renderers and HUDs
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub variant: Variant,
    pub phase: GamePhase,
    pub score: u32,
    pub speed: f32,
    pub difficulty_level: u32,
    pub run_time_ms: f64,
    pub elapsed_play_time_ms: u64,
    pub background_offset: f32,
    pub player: &'a Player,
    pub entities: &'a [Entity],
    pub particles: &'a [Particle],
}

/// One mini-game instance, alive as long as its view
pub struct Engine {
    state: GameState,
    clock: FrameClock,
    lease: TimerLease,
    /// Tick output, drained after every step
    pending: Vec<GameEvent>,
    bus: EventBus,
    audio: Box<dyn AudioCues>,
    reporter: Box<dyn ScoreReporter>,
    achievements: Box<dyn AchievementSink>,
    reports_sent: u32,
    report_failures: u32,
    closed: bool,
}

impl Engine {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let clock = FrameClock::new(tuning.frame_budget_ms, tuning.max_dt);
        Self {
            state: GameState::new(tuning, seed),
            clock,
            lease: TimerLease::new(),
            pending: Vec::new(),
            bus: EventBus::new(),
            audio: Box::new(NullSink),
            reporter: Box::new(NullSink),
            achievements: Box::new(NullSink),
            reports_sent: 0,
            report_failures: 0,
            closed: false,
        }
    }

    pub fn with_audio(mut self, audio: impl AudioCues + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    pub fn with_reporter(mut self, reporter: impl ScoreReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn with_achievements(mut self, achievements: impl AchievementSink + 'static) -> Self {
        self.achievements = Box::new(achievements);
        self
    }

    /// Listen to every event; the subscription ends with the engine
    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn reports_sent(&self) -> u32 {
        self.reports_sent
    }

    pub fn report_failures(&self) -> u32 {
        self.report_failures
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Apply host input; false if it was ignored
    pub fn handle_input(&mut self, input: InputEvent) -> bool {
        if self.closed {
            return false;
        }

        let accepted = match input.action() {
            None => {
                let started = start_session(&mut self.state, &mut self.pending);
                if started {
                    self.clock.rearm();
                    let generation = self.lease.acquire();
                    log::debug!("timer lease {} acquired", generation);
                }
                started
            }
            Some(action) => apply_action(&mut self.state, action, &mut self.pending),
        };

        self.dispatch();
        accepted
    }

    /// Frame callback: advance the simulation (or the celebration) and say what to keep running
    pub fn on_frame(&mut self, now_ms: f64) -> Schedule {
        if self.closed {
            return Schedule::default();
        }

        let dt = self.clock.sample(now_ms);
        match self.state.phase {
            GamePhase::Playing => {
                tick(&mut self.state, dt, &mut self.pending);
            }
            GamePhase::Clear => {
                tick_celebration(&mut self.state, dt);
            }
            GamePhase::Start | GamePhase::GameOver => {}
        }

        self.dispatch();
        self.schedule()
    }

    /// Wall-clock interval callback; stale generations are ignored
    pub fn on_wall_tick(&mut self, generation: Generation) -> bool {
        if self.closed
            || self.state.phase != GamePhase::Playing
            || !self.lease.is_live(generation)
        {
            log::trace!("stale wall tick {} ignored", generation);
            return false;
        }
        self.state.elapsed_play_time_ms += u64::from(WALL_TICK_MS);
        true
    }

    /// Timers the host should hold right now
    pub fn schedule(&self) -> Schedule {
        if self.closed {
            return Schedule::default();
        }
        let playing = self.state.phase == GamePhase::Playing;
        let celebrating = self.state.phase == GamePhase::Clear
            && self.state.celebration.as_ref().is_some_and(|c| c.is_active());
        Schedule {
            frame_loop: playing || celebrating,
            wall_clock: if playing { self.lease.current() } else { None },
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let state = &self.state;
        Snapshot {
            variant: state.variant(),
            phase: state.phase,
            score: state.score,
            speed: state.speed,
            difficulty_level: state.difficulty_level,
            run_time_ms: state.run_time_ms,
            elapsed_play_time_ms: state.elapsed_play_time_ms,
            background_offset: state.background_offset,
            player: &state.player,
            entities: &state.entities,
            particles: state
                .celebration
                .as_ref()
                .map(|c| c.particles.as_slice())
                .unwrap_or(&[]),
        }
    }

    pub fn render(&self, sink: &mut dyn RenderSink) {
        sink.draw(&self.snapshot());
    }

    /// Tear down: release timers and drop every subscription
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(generation) = self.lease.release() {
            log::debug!("timer lease {} released on close", generation);
        }
        self.bus.clear();
        log::info!("{} engine closed", self.state.variant().as_str());
    }

    /// Fan pending events out to the boundaries
    fn dispatch(&mut self) {
        for event in self.pending.drain(..) {
            if let Some(cue) = AudioCue::for_event(&event) {
                self.audio.cue(cue);
            }
            if let Some((kind, value)) = AchievementEvent::for_event(&event) {
                self.achievements.notify(kind, value);
            }
            if let GameEvent::SessionEnded(report) = &event {
                if let Some(generation) = self.lease.release() {
                    log::debug!("timer lease {} released", generation);
                }
                match self.reporter.report(report) {
                    Ok(()) => self.reports_sent += 1,
                    Err(e) => {
                        self.report_failures += 1;
                        log::warn!("session {} not recorded: {}", report.session, e);
                    }
                }
            }
            self.bus.publish(&event);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::{EntityKind, HazardLook, Outcome};
    use glam::Vec2;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quiet_runner() -> Tuning {
        Tuning {
            first_spawn_delay_ms: 1.0e12,
            ..Tuning::runner()
        }
    }

    fn recording_engine(tuning: Tuning) -> (Engine, Rc<RefCell<Vec<SessionReport>>>) {
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = reports.clone();
        let engine = Engine::new(tuning, 77).with_reporter(
            move |r: &SessionReport| -> Result<(), ReportError> {
                sink.borrow_mut().push(r.clone());
                Ok(())
            },
        );
        (engine, reports)
    }

    /// Drop a hazard onto the player
    fn plant_hazard(engine: &mut Engine) {
        let player = engine.state.player.bounds();
        let id = engine.state.next_entity_id();
        engine.state.entities.push(Entity {
            id,
            kind: EntityKind::Hazard {
                look: HazardLook::Puddle,
            },
            pos: Vec2::new(player.x + 20.0, player.y + 20.0),
            vel: Vec2::ZERO,
            size: Vec2::splat(60.0),
            lane: None,
            consumed: false,
        });
    }

    #[test]
    fn test_reporter_once_per_game_over() {
        let (mut engine, reports) = recording_engine(quiet_runner());
        let mut now = 1000.0;

        for round in 1..=2 {
            assert!(engine.handle_input(InputEvent::Start));
            engine.on_frame(now);
            now += FRAME_BUDGET_MS;
            plant_hazard(&mut engine);
            engine.on_frame(now);
            now += FRAME_BUDGET_MS;
            assert_eq!(engine.phase(), GamePhase::GameOver);
            // Extra frames after the loss never re-report
            engine.on_frame(now);
            now += FRAME_BUDGET_MS;
            assert_eq!(reports.borrow().len(), round);
        }

        let reports = reports.borrow();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.outcome == Outcome::GameOver));
        assert_eq!(reports[0].session, 1);
        assert_eq!(reports[1].session, 2);
        assert_eq!(engine.reports_sent(), 2);
    }

    #[test]
    fn test_schedule_follows_phase() {
        let mut engine = Engine::new(quiet_runner(), 1);
        assert_eq!(engine.schedule(), Schedule::default());

        engine.handle_input(InputEvent::Start);
        let playing = engine.schedule();
        assert!(playing.frame_loop);
        let first = playing.wall_clock.unwrap();

        plant_hazard(&mut engine);
        let after = engine.on_frame(0.0);
        assert_eq!(after, Schedule::default());

        // Retry mints a fresh generation
        engine.handle_input(InputEvent::Start);
        let second = engine.schedule().wall_clock.unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_stale_wall_ticks_never_double_count() {
        let mut engine = Engine::new(quiet_runner(), 1);
        engine.handle_input(InputEvent::Start);
        let old = engine.schedule().wall_clock.unwrap();
        assert!(engine.on_wall_tick(old));

        plant_hazard(&mut engine);
        engine.on_frame(0.0);
        engine.handle_input(InputEvent::Start);
        let new = engine.schedule().wall_clock.unwrap();

        // A leaked interval from the previous session keeps firing
        assert!(!engine.on_wall_tick(old));
        assert!(engine.on_wall_tick(new));
        assert_eq!(engine.state().elapsed_play_time_ms, u64::from(WALL_TICK_MS));
    }

    #[test]
    fn test_elapsed_time_reported() {
        let (mut engine, reports) = recording_engine(quiet_runner());
        engine.handle_input(InputEvent::Start);
        let generation = engine.schedule().wall_clock.unwrap();
        for _ in 0..3 {
            engine.on_wall_tick(generation);
        }
        plant_hazard(&mut engine);
        engine.on_frame(0.0);
        // Frozen after the session ends
        assert!(!engine.on_wall_tick(generation));
        assert_eq!(reports.borrow()[0].elapsed_play_time_ms, 3000);
    }

    #[test]
    fn test_stall_does_not_warp() {
        let mut engine = Engine::new(quiet_runner(), 1);
        engine.handle_input(InputEvent::Start);
        engine.on_frame(0.0);
        // Tab hidden for a minute
        engine.on_frame(60_000.0);
        let expected = MAX_DT * FRAME_BUDGET_MS;
        assert!((engine.state().run_time_ms - expected).abs() < 1e-6);
    }

    #[test]
    fn test_first_frame_after_start_is_zero_dt() {
        let mut engine = Engine::new(quiet_runner(), 1);
        engine.on_frame(5_000.0);
        engine.handle_input(InputEvent::Start);
        engine.on_frame(9_000.0);
        assert_eq!(engine.state().run_time_ms, 0.0);
    }

    #[test]
    fn test_invalid_input_is_noop() {
        let mut engine = Engine::new(quiet_runner(), 1);
        let seen = Rc::new(RefCell::new(0));
        let counter = seen.clone();
        engine.subscribe(move |_| *counter.borrow_mut() += 1);

        assert!(!engine.handle_input(InputEvent::Jump));
        assert_eq!(*seen.borrow(), 0);

        assert!(engine.handle_input(InputEvent::Start));
        let events_after_start = *seen.borrow();
        let before = engine.state().clone();
        assert!(!engine.handle_input(InputEvent::Start));
        assert_eq!(engine.state().sessions_started, before.sessions_started);
        assert_eq!(engine.schedule().wall_clock, Some(1));

        assert!(engine.handle_input(InputEvent::Jump));
        let airborne = engine.state().player.clone();
        assert!(!engine.handle_input(InputEvent::Jump));
        assert_eq!(engine.state().player.pos, airborne.pos);
        assert_eq!(engine.state().player.dy, airborne.dy);
        assert_eq!(*seen.borrow(), events_after_start + 1);
    }

    #[test]
    fn test_reporter_failure_is_not_fatal() {
        let mut engine = Engine::new(quiet_runner(), 1)
            .with_reporter(|_: &SessionReport| -> Result<(), ReportError> {
                Err(ReportError::StorageUnavailable)
            });
        engine.handle_input(InputEvent::Start);
        plant_hazard(&mut engine);
        engine.on_frame(0.0);
        assert_eq!(engine.report_failures(), 1);
        assert_eq!(engine.phase(), GamePhase::GameOver);
        // The next session starts normally
        assert!(engine.handle_input(InputEvent::Start));
        assert_eq!(engine.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_sinks_receive_cues_and_achievements() {
        let cues = Rc::new(RefCell::new(Vec::new()));
        let unlocked = Rc::new(RefCell::new(Vec::new()));
        let (c, u) = (cues.clone(), unlocked.clone());
        let mut engine = Engine::new(quiet_runner(), 1)
            .with_audio(move |cue: AudioCue| c.borrow_mut().push(cue))
            .with_achievements(move |kind: AchievementEvent, value: u32| {
                u.borrow_mut().push((kind, value))
            });

        engine.handle_input(InputEvent::Start);
        engine.handle_input(InputEvent::Jump);
        engine.state.score = engine.state.tuning.clear_score.unwrap();
        engine.on_frame(0.0);
        assert_eq!(engine.phase(), GamePhase::Clear);

        assert_eq!(
            *cues.borrow(),
            vec![AudioCue::ActionPerformed(Action::Jump), AudioCue::SessionCleared]
        );
        let unlocked = unlocked.borrow();
        assert_eq!(unlocked[0], (AchievementEvent::SessionStarted, 1));
        assert!(unlocked.contains(&(AchievementEvent::SessionCleared, 30)));
    }

    #[test]
    fn test_clear_keeps_cosmetic_loop_only() {
        let (mut engine, reports) = recording_engine(quiet_runner());
        engine.handle_input(InputEvent::Start);
        engine.on_frame(0.0);
        engine.state.score = engine.state.tuning.clear_score.unwrap();
        let schedule = engine.on_frame(FRAME_BUDGET_MS);
        assert_eq!(engine.phase(), GamePhase::Clear);
        assert!(schedule.frame_loop);
        assert_eq!(schedule.wall_clock, None);

        let run_time = engine.state().run_time_ms;
        let score = engine.state().score;
        let mut now = FRAME_BUDGET_MS;
        let mut frames = 0;
        loop {
            now += FRAME_BUDGET_MS;
            frames += 1;
            if !engine.on_frame(now).frame_loop {
                break;
            }
            assert!(!engine.snapshot().particles.is_empty() || frames > 100);
            assert!(frames < 1000);
        }
        assert_eq!(engine.state().run_time_ms, run_time);
        assert_eq!(engine.state().score, score);
        assert_eq!(reports.borrow().len(), 1);
    }

    #[test]
    fn test_close_cancels_everything() {
        let mut engine = Engine::new(quiet_runner(), 1);
        let seen = Rc::new(RefCell::new(0));
        let counter = seen.clone();
        engine.subscribe(move |_| *counter.borrow_mut() += 1);
        engine.handle_input(InputEvent::Start);
        let generation = engine.schedule().wall_clock.unwrap();
        let count = *seen.borrow();

        engine.close();
        assert!(engine.is_closed());
        assert_eq!(engine.schedule(), Schedule::default());
        assert_eq!(engine.on_frame(100.0), Schedule::default());
        assert!(!engine.on_wall_tick(generation));
        assert!(!engine.handle_input(InputEvent::Jump));
        assert_eq!(*seen.borrow(), count);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut engine = Engine::new(Tuning::catcher(), 3);
        engine.handle_input(InputEvent::Start);
        engine.handle_input(InputEvent::MoveLeft);
        let snap = engine.snapshot();
        assert_eq!(snap.variant, Variant::Catcher);
        assert_eq!(snap.phase, GamePhase::Playing);
        assert_eq!(snap.player.lane, 0);
        assert!(snap.particles.is_empty());
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"phase\":\"Playing\""));
    }

    #[derive(Debug, Clone)]
    enum Step {
        Input(InputEvent),
        Frame(f64),
        Hazard,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            Just(Step::Input(InputEvent::Start)),
            Just(Step::Input(InputEvent::Jump)),
            Just(Step::Input(InputEvent::MoveLeft)),
            Just(Step::Input(InputEvent::MoveRight)),
            (0.0f64..40.0).prop_map(Step::Frame),
            Just(Step::Hazard),
        ]
    }

    proptest! {
        #[test]
        fn prop_phase_graph_closed(
            seed in any::<u64>(),
            catcher in any::<bool>(),
            steps in prop::collection::vec(step(), 1..300),
        ) {
            let tuning = if catcher { Tuning::catcher() } else { Tuning::runner() };
            let (mut engine, reports) = recording_engine(tuning);
            engine.state.seed = seed;
            let mut now = 0.0;
            let mut terminal_entries = 0;
            let mut score = 0;

            for step in steps {
                let before = engine.phase();
                match step {
                    Step::Input(input) => { engine.handle_input(input); }
                    Step::Frame(ms) => { now += ms; engine.on_frame(now); }
                    Step::Hazard => {
                        if before == GamePhase::Playing {
                            plant_hazard(&mut engine);
                        }
                    }
                }
                let after = engine.phase();
                if before != after {
                    prop_assert!(before.can_transition_to(after), "{:?} -> {:?}", before, after);
                    if after.is_terminal() {
                        terminal_entries += 1;
                    }
                    if after == GamePhase::Playing {
                        score = 0;
                    }
                }
                if catcher {
                    prop_assert_ne!(after, GamePhase::Clear);
                }
                prop_assert!(engine.state().score >= score);
                score = engine.state().score;
                prop_assert_eq!(reports.borrow().len(), terminal_entries);
            }
        }
    }
}
