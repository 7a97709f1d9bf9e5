//! Game session: status machine, clocks and the boundary API
//!
//! A [`Session`] owns one game's configuration, the current run, its clocks
//! and the injected persistence adapter. Status moves
//! `Idle → Running → Over → Running (restart)`; nothing else is legal.
//! [`SharedSession`] wraps it for callback-driven drivers and drops a tick
//! that arrives while another is still being applied.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::Serialize;

use crate::consts::STEP_DT;
use crate::highscores::ScoreKeeper;
use crate::persistence::KeyValueStore;
use crate::platform::{InputQueue, InputSource};
use crate::settings::Settings;
use crate::sim::{
    Clock, Entity, GameConfig, GameEvent, GameKind, GameStatus, InputMapper, Intent, OverReason,
    RawInput, SimState, tick,
};

/// Called on every status transition
pub type StatusListener = Box<dyn FnMut(GameStatus, Option<OverReason>)>;

/// Read-only consumer invoked once per applied tick
pub type RenderSink = Box<dyn FnMut(&Snapshot)>;

/// Read-only view of a session for rendering and UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub game: GameKind,
    pub status: GameStatus,
    pub over_reason: Option<OverReason>,
    pub tick: u64,
    pub score: u64,
    pub best_score: u64,
    pub field: Vec2,
    pub player: Option<Entity>,
    /// Trailing body cells, newest first
    pub segments: Vec<Vec2>,
    /// Entities in id order
    pub entities: Vec<Entity>,
    /// Events from the most recent tick
    pub events: Vec<GameEvent>,
}

/// One game's status machine, clocks and current run.
///
/// After `Over` the last run's state is kept for snapshots only; it is read,
/// never ticked, and replaced on restart.
pub struct Session {
    config: GameConfig,
    settings: Settings,
    status: GameStatus,
    over_reason: Option<OverReason>,
    /// Current run; kept frozen after `Over` until restart
    state: Option<SimState>,
    mapper: InputMapper,
    queue: InputQueue,
    physics: Clock,
    spawner: Option<Clock>,
    /// Spawn clock pulses not yet consumed by a physics tick
    pending_pulses: u32,
    keeper: ScoreKeeper,
    store: Box<dyn KeyValueStore>,
    listeners: Vec<StatusListener>,
    render_sink: Option<RenderSink>,
    last_events: Vec<GameEvent>,
    runs: u64,
    suspended: bool,
}

impl Session {
    pub fn new(config: GameConfig, settings: Settings, store: Box<dyn KeyValueStore>) -> Self {
        let physics = Clock::new(settings.tick_period(&config)).with_max_steps(settings.max_substeps);
        let spawner = settings
            .spawn_period(&config)
            .map(|period| Clock::new(period).with_max_steps(settings.max_substeps));
        let keeper = ScoreKeeper::new(config.storage_key.clone(), config.score_direction);
        let mapper = InputMapper::new(&config);

        Self {
            config,
            settings,
            status: GameStatus::Idle,
            over_reason: None,
            state: None,
            mapper,
            queue: InputQueue::new(),
            physics,
            spawner,
            pending_pulses: 0,
            keeper,
            store,
            listeners: Vec::new(),
            render_sink: None,
            last_events: Vec::new(),
            runs: 0,
            suspended: false,
        }
    }

    /// Session for a bundled game with default settings
    pub fn for_game(kind: GameKind, store: Box<dyn KeyValueStore>) -> Self {
        Self::new(kind.config(), Settings::default(), store)
    }

    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn over_reason(&self) -> Option<OverReason> {
        self.over_reason
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> Option<&SimState> {
        self.state.as_ref()
    }

    /// Mutable access to the current run (tools and tests)
    pub fn state_mut(&mut self) -> Option<&mut SimState> {
        self.state.as_mut()
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn best_score(&self) -> u64 {
        self.keeper.best()
    }

    /// Number of runs started so far
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Queue fed by attached input sources
    pub fn input_queue(&self) -> InputQueue {
        self.queue.clone()
    }

    /// Idle → Running. Returns false if the session is not idle.
    pub fn start(&mut self) -> bool {
        if self.status != GameStatus::Idle {
            log::debug!("Ignoring start while {:?}", self.status);
            return false;
        }
        self.begin_run();
        true
    }

    /// Over → Running with a fresh run. Returns false unless the last run is over.
    pub fn restart(&mut self) -> bool {
        if self.status != GameStatus::Over {
            log::debug!("Ignoring restart while {:?}", self.status);
            return false;
        }
        self.begin_run();
        true
    }

    fn begin_run(&mut self) {
        let best = self.keeper.load(self.store.as_ref());
        let seed = match self.settings.seed {
            Some(seed) => seed.wrapping_add(self.runs),
            None => crate::platform::now_seed() ^ self.runs,
        };
        self.runs += 1;

        self.state = Some(SimState::new(&self.config, seed, best));
        self.mapper.clear();
        self.last_events.clear();
        self.pending_pulses = 0;
        self.physics.reset();
        if let Some(spawner) = self.spawner.as_mut() {
            spawner.reset();
        }
        if !self.suspended {
            self.start_clocks();
        }

        log::info!(
            "Started {} run {} (seed {}, best {})",
            self.config.kind.as_str(),
            self.runs,
            seed,
            best
        );
        self.set_status(GameStatus::Running, None);
        self.render();
    }

    fn finish(&mut self, reason: OverReason) {
        self.stop_clocks();
        self.pending_pulses = 0;

        let score = self.state.as_ref().map_or(0, |s| s.score);
        self.keeper.commit_if_high_score(score, self.store.as_mut());

        log::info!(
            "{} over after {} ticks: {:?}, score {}",
            self.config.kind.as_str(),
            self.state.as_ref().map_or(0, |s| s.tick),
            reason,
            score
        );
        self.set_status(GameStatus::Over, Some(reason));
    }

    fn set_status(&mut self, status: GameStatus, reason: Option<OverReason>) {
        self.status = status;
        self.over_reason = reason;
        for listener in self.listeners.iter_mut() {
            listener(status, reason);
        }
    }

    /// Register a status transition callback
    pub fn on_status_change(&mut self, callback: impl FnMut(GameStatus, Option<OverReason>) + 'static) {
        self.listeners.push(Box::new(callback));
    }

    /// Install the per-tick snapshot consumer
    pub fn set_render_sink(&mut self, sink: impl FnMut(&Snapshot) + 'static) {
        self.render_sink = Some(Box::new(sink));
    }

    pub fn clear_render_sink(&mut self) {
        self.render_sink = None;
    }

    /// Current view of the session
    pub fn get_snapshot(&self) -> Snapshot {
        let state = self.state.as_ref();
        Snapshot {
            game: self.config.kind,
            status: self.status,
            over_reason: self.over_reason,
            tick: state.map_or(0, |s| s.tick),
            score: state.map_or(0, |s| s.score),
            best_score: self.keeper.best(),
            field: self.config.field,
            player: state.map(|s| s.player.clone()),
            segments: state.map(|s| s.segments.iter().copied().collect()).unwrap_or_default(),
            entities: state.map(|s| s.entities.values().cloned().collect()).unwrap_or_default(),
            events: self.last_events.clone(),
        }
    }

    fn render(&mut self) {
        if self.render_sink.is_none() {
            return;
        }
        let snapshot = self.get_snapshot();
        if let Some(sink) = self.render_sink.as_mut() {
            sink(&snapshot);
        }
    }

    /// Apply one raw event now. Start/Restart take effect immediately.
    pub fn handle_input(&mut self, raw: RawInput) -> Option<Intent> {
        let heading = self.state.as_ref().map_or(Vec2::ZERO, |s| s.player.vel);
        let intent = self.mapper.push(raw, self.status, heading);

        match self.mapper.take_control() {
            Some(Intent::Start) => {
                self.start();
            }
            Some(Intent::Restart) => {
                self.restart();
            }
            _ => {}
        }
        intent
    }

    /// Subscribe this session's input queue to `source`
    pub fn attach_input(&self, source: &mut dyn InputSource) {
        source.subscribe(self.queue.handler());
    }

    pub fn detach_input(&self, source: &mut dyn InputSource) {
        source.unsubscribe();
    }

    fn pump_input(&mut self) {
        for raw in self.queue.drain() {
            self.handle_input(raw);
        }
    }

    /// Feed an elapsed wall-clock delta (seconds). Returns the number of ticks applied.
    ///
    /// Queued input is applied first. Nothing else happens unless the session is
    /// running and not suspended.
    pub fn advance(&mut self, delta: f32) -> u32 {
        self.pump_input();
        if self.status != GameStatus::Running || self.suspended {
            return 0;
        }

        if let Some(spawner) = self.spawner.as_mut() {
            self.pending_pulses += spawner.tick(delta);
        }

        let due = self.physics.tick(delta);
        let mut applied = 0;
        for _ in 0..due {
            applied += 1;
            if !self.apply_tick() {
                break;
            }
        }
        applied
    }

    /// Apply exactly one physics tick regardless of the clocks.
    ///
    /// Returns false if no tick was applied or the run ended on it.
    pub fn step(&mut self) -> bool {
        self.pump_input();
        if self.status != GameStatus::Running {
            return false;
        }
        self.apply_tick()
    }

    /// Run one tick of the pipeline. Returns false when the run ended.
    fn apply_tick(&mut self) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };

        let mut input = self.mapper.drain();
        if self.pending_pulses > 0 {
            self.pending_pulses -= 1;
            input.spawn_pulse = true;
        }

        let outcome = tick(state, &input, &self.config, STEP_DT);
        self.last_events = outcome.events;

        if let Some(reason) = outcome.over {
            self.finish(reason);
            self.render();
            return false;
        }
        self.render();
        true
    }

    /// Stop all clocks without changing status (tab hidden, focus lost)
    pub fn suspend(&mut self) {
        if self.suspended {
            return;
        }
        self.suspended = true;
        self.stop_clocks();
        log::info!("Suspended {}", self.config.kind.as_str());
    }

    pub fn resume(&mut self) {
        if !self.suspended {
            return;
        }
        self.suspended = false;
        if self.status == GameStatus::Running {
            self.start_clocks();
        }
        log::info!("Resumed {}", self.config.kind.as_str());
    }

    fn start_clocks(&mut self) {
        self.physics.start();
        if let Some(spawner) = self.spawner.as_mut() {
            spawner.start();
        }
    }

    fn stop_clocks(&mut self) {
        self.physics.stop();
        if let Some(spawner) = self.spawner.as_mut() {
            spawner.stop();
        }
    }
}

/// Session handle shared between driver callbacks
#[derive(Clone)]
pub struct SharedSession(Rc<RefCell<Session>>);

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self(Rc::new(RefCell::new(session)))
    }

    /// Advance unless a tick is already in flight, in which case the late tick is dropped
    pub fn try_advance(&self, delta: f32) -> Option<u32> {
        match self.0.try_borrow_mut() {
            Ok(mut session) => Some(session.advance(delta)),
            Err(_) => {
                log::debug!("Dropped re-entrant tick");
                None
            }
        }
    }

    /// Run `f` with the session unless it is busy
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.0.try_borrow_mut().ok().map(|mut session| f(&mut session))
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.0.try_borrow().ok().map(|session| session.get_snapshot())
    }
}
