//! Per-game policy objects
//!
//! The engine is generic; a [`GameConfig`] selects coordinate, bounds, spawn,
//! collision and scoring policies. [`GameKind::config`] builds the presets.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Outcome;
use super::state::{EntityKind, Extent, Motion};
use crate::highscores::ScoreDirection;

/// Bundled arcade games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameKind {
    Snake,
    Pacman,
    Flappy,
    CarRace,
    Platformer,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        GameKind::Snake,
        GameKind::Pacman,
        GameKind::Flappy,
        GameKind::CarRace,
        GameKind::Platformer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Snake => "snake",
            GameKind::Pacman => "pacman",
            GameKind::Flappy => "flappy",
            GameKind::CarRace => "car-race",
            GameKind::Platformer => "platformer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "snake" => Some(GameKind::Snake),
            "pacman" | "pac-man" => Some(GameKind::Pacman),
            "flappy" | "flappy-bird" => Some(GameKind::Flappy),
            "car-race" | "carrace" | "car" => Some(GameKind::CarRace),
            "platformer" => Some(GameKind::Platformer),
            _ => None,
        }
    }

    /// Preset configuration for this game
    pub fn config(&self) -> GameConfig {
        match self {
            GameKind::Snake => snake(),
            GameKind::Pacman => pacman(),
            GameKind::Flappy => flappy(),
            GameKind::CarRace => car_race(),
            GameKind::Platformer => platformer(),
        }
    }
}

/// Continuous pixels or whole grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordPolicy {
    Continuous,
    Grid,
}

/// What happens when the player reaches the field edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsPolicy {
    /// Leaving the field is lethal
    Lethal,
    /// Modulo arithmetic on each axis
    Wrap,
    /// Position is clamped inside the field
    Clamp,
    /// Only dropping below the bottom edge is lethal
    FallOut,
}

/// When a spawn rule fires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnCadence {
    /// Every `n` physics ticks
    EveryTicks(u32),
    /// On pulses from an independent spawn clock
    Clock { period_secs: f32 },
    /// Whenever fewer than `n` entities of the template's kind are alive
    MinLive(usize),
    /// Refill to `n` collectibles right after they are consumed
    Replenish(usize),
}

/// What a spawn rule creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpawnTemplate {
    /// A car entering from the top edge in a random lane
    LaneObstacle {
        lanes: u32,
        size: Vec2,
        speed: f32,
        colors: Vec<u32>,
    },
    /// Top and bottom pipe bodies with a scoring gate in the gap, entering from the right
    PipePair {
        width: f32,
        gap: f32,
        margin: f32,
        speed: f32,
    },
    /// A platform entering from the right edge
    Platform { size: Vec2, min_y: f32, speed: f32 },
    /// A static entity on a random free grid cell
    GridCell { kind: EntityKind },
}

impl SpawnTemplate {
    /// Kind counted by density and replenish cadences
    pub fn kind(&self) -> EntityKind {
        match self {
            SpawnTemplate::LaneObstacle { .. } => EntityKind::Obstacle,
            SpawnTemplate::PipePair { .. } => EntityKind::Pipe,
            SpawnTemplate::Platform { .. } => EntityKind::Platform,
            SpawnTemplate::GridCell { kind } => *kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRule {
    pub cadence: SpawnCadence,
    pub template: SpawnTemplate,
}

/// Collision class and points for one entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionRule {
    pub kind: EntityKind,
    pub outcome: Outcome,
    pub points: u64,
}

impl CollisionRule {
    pub const fn new(kind: EntityKind, outcome: Outcome, points: u64) -> Self {
        Self {
            kind,
            outcome,
            points,
        }
    }
}

/// Entity placed when a run starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialEntity {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub extent: Extent,
    pub motion: Motion,
    pub vel: Vec2,
    pub color: Option<u32>,
}

impl InitialEntity {
    fn fixed(kind: EntityKind, pos: Vec2, extent: Extent) -> Self {
        Self {
            kind,
            pos,
            extent,
            motion: Motion::Static,
            vel: Vec2::ZERO,
            color: None,
        }
    }

    fn moving(mut self, motion: Motion, vel: Vec2) -> Self {
        self.motion = motion;
        self.vel = vel;
        self
    }

    fn colored(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }
}

/// Player start and control parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTemplate {
    pub pos: Vec2,
    pub extent: Extent,
    pub motion: Motion,
    /// Initial velocity (grid games: heading in cells per tick)
    pub vel: Vec2,
    /// Vertical velocity set by a Jump intent
    pub jump_velocity: Option<f32>,
    /// Jump only while standing on a platform
    pub jump_requires_ground: bool,
    /// Horizontal nudge per Left/Right intent (continuous games without steering)
    pub lateral_step: Option<f32>,
    /// Player drags a body of trailing segments
    pub has_body: bool,
}

/// Complete policy description of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub kind: GameKind,
    /// Persistence key for the best score
    pub storage_key: String,
    pub score_direction: ScoreDirection,
    /// Field size in pixels or cells
    pub field: Vec2,
    pub coords: CoordPolicy,
    pub bounds: BoundsPolicy,
    /// Physics clock period (seconds)
    pub tick_secs: f32,
    /// Downward acceleration per tick, applied to the player before its position update
    pub gravity: f32,
    pub player: PlayerTemplate,
    /// Drop direction intents that reverse the current heading
    pub reversal_guard: bool,
    /// Player dies when its head enters its own body
    pub self_collision: bool,
    /// Segments gained per scoring pickup
    pub growth_per_pickup: u32,
    pub rules: Vec<CollisionRule>,
    pub spawns: Vec<SpawnRule>,
    pub initial: Vec<InitialEntity>,
    /// Fill every free grid cell with this kind at run start
    pub fill_grid: Option<EntityKind>,
    /// Points added every tick while running
    pub survival_points: u64,
    /// Run is won when no entity of this kind remains
    pub clear_kind: Option<EntityKind>,
}

impl GameConfig {
    /// Collision class and points for an entity kind
    pub fn rule_for(&self, kind: EntityKind) -> (Outcome, u64) {
        self.rules
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| (r.outcome, r.points))
            .unwrap_or((Outcome::None, 0))
    }

    #[inline]
    pub fn is_grid(&self) -> bool {
        self.coords == CoordPolicy::Grid
    }

    /// Period of the independent spawn clock, if any rule uses one
    pub fn spawn_clock_period(&self) -> Option<f32> {
        self.spawns.iter().find_map(|r| match r.cadence {
            SpawnCadence::Clock { period_secs } => Some(period_secs),
            _ => None,
        })
    }

    /// Grid dimensions in cells
    pub fn grid_size(&self) -> glam::IVec2 {
        self.field.as_ivec2()
    }
}

// Original game constants
const GRID: f32 = 20.0;

const CANVAS_W: f32 = 400.0;
const CANVAS_H: f32 = 600.0;

const BIRD_SIZE: f32 = 30.0;
const PIPE_WIDTH: f32 = 60.0;
const PIPE_GAP: f32 = 150.0;
const FLAPPY_GRAVITY: f32 = 0.5;
const FLAP_VELOCITY: f32 = -10.0;

const CAR_SIZE: Vec2 = Vec2::new(40.0, 60.0);
const OBSTACLE_SIZE: Vec2 = Vec2::new(60.0, 60.0);
const ROAD_SPEED: f32 = 5.0;
const CAR_COLORS: [u32; 4] = [0xe74c3c, 0x3498db, 0x2ecc71, 0xf1c40f];

const LEVEL_W: f32 = 800.0;
const LEVEL_H: f32 = 400.0;
const HERO_SIZE: f32 = 30.0;
const HERO_JUMP: f32 = -12.0;
const SCROLL_SPEED: f32 = 2.0;
const PLATFORM_SIZE: Vec2 = Vec2::new(100.0, 20.0);

fn snake() -> GameConfig {
    GameConfig {
        kind: GameKind::Snake,
        storage_key: "snakeHighScore".into(),
        score_direction: ScoreDirection::HigherIsBetter,
        field: Vec2::splat(GRID),
        coords: CoordPolicy::Grid,
        bounds: BoundsPolicy::Lethal,
        tick_secs: 0.150,
        gravity: 0.0,
        player: PlayerTemplate {
            pos: Vec2::new(10.0, 10.0),
            extent: Extent::CELL,
            motion: Motion::GridStep,
            vel: Vec2::X,
            jump_velocity: None,
            jump_requires_ground: false,
            lateral_step: None,
            has_body: true,
        },
        reversal_guard: true,
        self_collision: true,
        growth_per_pickup: 1,
        rules: vec![CollisionRule::new(EntityKind::Food, Outcome::Scoring, 1)],
        spawns: vec![SpawnRule {
            cadence: SpawnCadence::Replenish(1),
            template: SpawnTemplate::GridCell {
                kind: EntityKind::Food,
            },
        }],
        initial: vec![InitialEntity::fixed(
            EntityKind::Food,
            Vec2::new(15.0, 15.0),
            Extent::CELL,
        )],
        fill_grid: None,
        survival_points: 0,
        clear_kind: None,
    }
}

fn pacman() -> GameConfig {
    let ghost = |x: f32, y: f32, dir: Vec2, color: u32| {
        InitialEntity::fixed(EntityKind::Ghost, Vec2::new(x, y), Extent::CELL)
            .moving(Motion::GridWander, dir)
            .colored(color)
    };

    GameConfig {
        kind: GameKind::Pacman,
        storage_key: "pacmanHighScore".into(),
        score_direction: ScoreDirection::HigherIsBetter,
        field: Vec2::splat(GRID),
        coords: CoordPolicy::Grid,
        bounds: BoundsPolicy::Wrap,
        tick_secs: 0.200,
        gravity: 0.0,
        player: PlayerTemplate {
            pos: Vec2::new(1.0, 1.0),
            extent: Extent::CELL,
            motion: Motion::GridStep,
            vel: Vec2::X,
            jump_velocity: None,
            jump_requires_ground: false,
            lateral_step: None,
            has_body: false,
        },
        reversal_guard: false,
        self_collision: false,
        growth_per_pickup: 0,
        rules: vec![
            CollisionRule::new(EntityKind::Pellet, Outcome::Scoring, 10),
            CollisionRule::new(EntityKind::Ghost, Outcome::Lethal, 0),
        ],
        spawns: Vec::new(),
        initial: vec![
            ghost(18.0, 1.0, Vec2::NEG_X, 0xff0000),
            ghost(18.0, 18.0, Vec2::NEG_Y, 0xffb8ff),
            ghost(1.0, 18.0, Vec2::X, 0x00ffff),
            ghost(9.0, 9.0, Vec2::Y, 0xffb852),
        ],
        fill_grid: Some(EntityKind::Pellet),
        survival_points: 0,
        clear_kind: Some(EntityKind::Pellet),
    }
}

fn flappy() -> GameConfig {
    GameConfig {
        kind: GameKind::Flappy,
        storage_key: "flappyHighScore".into(),
        score_direction: ScoreDirection::HigherIsBetter,
        field: Vec2::new(CANVAS_W, CANVAS_H),
        coords: CoordPolicy::Continuous,
        bounds: BoundsPolicy::Lethal,
        tick_secs: 1.0 / crate::consts::PHYSICS_HZ,
        gravity: FLAPPY_GRAVITY,
        player: PlayerTemplate {
            pos: Vec2::new(CANVAS_W / 4.0, CANVAS_H / 2.0),
            extent: Extent::Box(Vec2::splat(BIRD_SIZE)),
            motion: Motion::Linear,
            vel: Vec2::ZERO,
            jump_velocity: Some(FLAP_VELOCITY),
            jump_requires_ground: false,
            lateral_step: None,
            has_body: false,
        },
        reversal_guard: false,
        self_collision: false,
        growth_per_pickup: 0,
        rules: vec![
            CollisionRule::new(EntityKind::Pipe, Outcome::Lethal, 0),
            CollisionRule::new(EntityKind::PipeGate, Outcome::Scoring, 1),
        ],
        spawns: vec![SpawnRule {
            cadence: SpawnCadence::Clock { period_secs: 2.0 },
            template: SpawnTemplate::PipePair {
                width: PIPE_WIDTH,
                gap: PIPE_GAP,
                margin: 50.0,
                speed: 2.0,
            },
        }],
        initial: Vec::new(),
        fill_grid: None,
        survival_points: 0,
        clear_kind: None,
    }
}

fn car_race() -> GameConfig {
    GameConfig {
        kind: GameKind::CarRace,
        storage_key: "carRaceHighScore".into(),
        score_direction: ScoreDirection::HigherIsBetter,
        field: Vec2::new(CANVAS_W, CANVAS_H),
        coords: CoordPolicy::Continuous,
        bounds: BoundsPolicy::Clamp,
        tick_secs: 1.0 / crate::consts::PHYSICS_HZ,
        gravity: 0.0,
        player: PlayerTemplate {
            pos: Vec2::new(
                CANVAS_W / 2.0 - CAR_SIZE.x / 2.0,
                CANVAS_H - CAR_SIZE.y - 20.0,
            ),
            extent: Extent::Box(CAR_SIZE),
            motion: Motion::Static,
            vel: Vec2::ZERO,
            jump_velocity: None,
            jump_requires_ground: false,
            lateral_step: Some(20.0),
            has_body: false,
        },
        reversal_guard: false,
        self_collision: false,
        growth_per_pickup: 0,
        rules: vec![CollisionRule::new(EntityKind::Obstacle, Outcome::Lethal, 0)],
        spawns: vec![SpawnRule {
            cadence: SpawnCadence::Clock { period_secs: 1.5 },
            template: SpawnTemplate::LaneObstacle {
                lanes: 3,
                size: OBSTACLE_SIZE,
                speed: ROAD_SPEED,
                colors: CAR_COLORS.to_vec(),
            },
        }],
        initial: Vec::new(),
        fill_grid: None,
        survival_points: 1,
        clear_kind: None,
    }
}

fn platformer() -> GameConfig {
    let scrolling = |x: f32, y: f32, size: Vec2| {
        InitialEntity::fixed(EntityKind::Platform, Vec2::new(x, y), Extent::Box(size))
            .moving(Motion::Linear, Vec2::new(-SCROLL_SPEED, 0.0))
    };

    GameConfig {
        kind: GameKind::Platformer,
        storage_key: "platformerHighScore".into(),
        score_direction: ScoreDirection::HigherIsBetter,
        field: Vec2::new(LEVEL_W, LEVEL_H),
        coords: CoordPolicy::Continuous,
        bounds: BoundsPolicy::FallOut,
        tick_secs: 1.0 / crate::consts::PHYSICS_HZ,
        gravity: 0.5,
        player: PlayerTemplate {
            pos: Vec2::new(50.0, LEVEL_H - HERO_SIZE - 10.0),
            extent: Extent::Box(Vec2::splat(HERO_SIZE)),
            motion: Motion::Linear,
            vel: Vec2::ZERO,
            jump_velocity: Some(HERO_JUMP),
            jump_requires_ground: true,
            lateral_step: None,
            has_body: false,
        },
        reversal_guard: false,
        self_collision: false,
        growth_per_pickup: 0,
        rules: vec![CollisionRule::new(
            EntityKind::Platform,
            Outcome::Supporting,
            0,
        )],
        spawns: vec![SpawnRule {
            cadence: SpawnCadence::MinLive(5),
            template: SpawnTemplate::Platform {
                size: PLATFORM_SIZE,
                min_y: 100.0,
                speed: SCROLL_SPEED,
            },
        }],
        initial: vec![
            scrolling(0.0, LEVEL_H - 10.0, Vec2::new(LEVEL_W, 10.0)),
            scrolling(200.0, 300.0, PLATFORM_SIZE),
            scrolling(400.0, 200.0, PLATFORM_SIZE),
            scrolling(600.0, 300.0, PLATFORM_SIZE),
        ],
        fill_grid: None,
        survival_points: 1,
        clear_kind: None,
    }
}
