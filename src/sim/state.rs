//! Simulation state and core entity types
//!
//! Everything a single run mutates lives in [`SimState`]. The best score is a
//! copy of the persisted value taken when the run started.

use std::collections::{BTreeMap, VecDeque};

use glam::{IVec2, Vec2};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::config::GameConfig;

/// Stable entity identifier, never reused within a run
pub type EntityId = u32;

/// Id reserved for the player entity
pub const PLAYER_ID: EntityId = 0;

/// Session status owned by the game state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for a Start intent
    #[default]
    Idle,
    /// Ticks are being applied
    Running,
    /// Run ended, state frozen until Restart
    Over,
}

/// Why a run transitioned to `Over`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverReason {
    /// Player overlapped a hazard or its own body
    LethalCollision,
    /// Player left the field (wall, fall)
    OutOfBounds,
    /// No free cell left to play into
    NoLegalMove,
    /// Every collectible was eaten
    AllCollectiblesConsumed,
}

/// Entity tags. Each game uses a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    /// Traffic car in a lane
    Obstacle,
    /// Top or bottom pipe body
    Pipe,
    /// Invisible scoring strip in a pipe gap
    PipeGate,
    Platform,
    Ghost,
    Pellet,
    Food,
}

/// Collision shape. Boxes are anchored at their top-left corner, circles at their center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Extent {
    Box(Vec2),
    Circle(f32),
}

impl Extent {
    /// Unit grid cell
    pub const CELL: Extent = Extent::Box(Vec2::ONE);

    /// Bounding size of the shape
    pub fn size(&self) -> Vec2 {
        match *self {
            Extent::Box(size) => size,
            Extent::Circle(r) => Vec2::splat(r * 2.0),
        }
    }
}

/// How an entity moves each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Motion {
    #[default]
    Static,
    /// `pos += vel * dt`
    Linear,
    /// One cell along `vel` per tick
    GridStep,
    /// One cell along `vel`; at the field edge stay put and pick a random direction
    GridWander,
}

/// Kind-specific payload, opaque to the simulation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Display color (0xRRGGBB)
    pub color: Option<u32>,
    /// Lane index for lane-based spawns
    pub lane: Option<u32>,
}

/// A simulated object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Position before the current tick's integration
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub extent: Extent,
    pub motion: Motion,
    #[serde(default)]
    pub meta: EntityMeta,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2, extent: Extent) -> Self {
        Self {
            id,
            kind,
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            extent,
            motion: Motion::Static,
            meta: EntityMeta::default(),
        }
    }

    pub fn with_motion(mut self, motion: Motion, vel: Vec2) -> Self {
        self.motion = motion;
        self.vel = vel;
        self
    }

    pub fn with_meta(mut self, meta: EntityMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Bounding box size
    #[inline]
    pub fn size(&self) -> Vec2 {
        self.extent.size()
    }

    /// Top-left corner of the bounding box
    pub fn min(&self) -> Vec2 {
        match self.extent {
            Extent::Box(_) => self.pos,
            Extent::Circle(r) => self.pos - Vec2::splat(r),
        }
    }

    /// Bottom-right corner of the bounding box
    pub fn max(&self) -> Vec2 {
        self.min() + self.size()
    }

    /// Bottom edge at the previous tick
    pub fn prev_bottom(&self) -> f32 {
        let anchor_offset = self.min().y - self.pos.y;
        self.prev_pos.y + anchor_offset + self.size().y
    }

    /// Grid cell occupied (grid games store whole-cell coordinates)
    #[inline]
    pub fn cell(&self) -> IVec2 {
        self.pos.round().as_ivec2()
    }

    /// Travel direction as a whole-cell vector
    #[inline]
    pub fn heading(&self) -> IVec2 {
        IVec2::new(unit_sign(self.vel.x), unit_sign(self.vel.y))
    }
}

fn unit_sign(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Things that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Spawned { id: EntityId, kind: EntityKind },
    Culled { id: EntityId },
    Collected { id: EntityId, kind: EntityKind, points: u64 },
    Landed { on: EntityId },
    Jumped,
    Lethal { cause: Option<EntityId> },
}

/// Complete mutable state of one run
#[derive(Debug, Clone)]
pub struct SimState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Spawn/wander randomness, seeded from `seed`
    pub rng: Pcg32,
    /// Ticks applied so far
    pub tick: u64,
    pub player: Entity,
    /// Trailing body cells, newest first (grid snake)
    pub segments: VecDeque<Vec2>,
    /// Cells still to grow
    pub pending_growth: u32,
    /// Player is standing on a platform
    pub grounded: bool,
    /// Non-player entities, iterated in id order
    pub entities: BTreeMap<EntityId, Entity>,
    pub score: u64,
    /// Persisted best at run start
    pub best_score: u64,
    /// Ticks since each spawn rule last fired (indexed like `GameConfig::spawns`)
    pub spawn_elapsed: Vec<u32>,
    next_id: EntityId,
}

impl SimState {
    /// Fresh state for a run, with the world populated
    pub fn new(config: &GameConfig, seed: u64, best_score: u64) -> Self {
        let template = &config.player;
        let player = Entity::new(PLAYER_ID, EntityKind::Player, template.pos, template.extent)
            .with_motion(template.motion, template.vel);

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tick: 0,
            player,
            segments: VecDeque::new(),
            pending_growth: 0,
            grounded: false,
            entities: BTreeMap::new(),
            score: 0,
            best_score,
            spawn_elapsed: vec![0; config.spawns.len()],
            next_id: PLAYER_ID + 1,
        };

        super::spawn::populate(&mut state, config);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Insert an entity, assigning it a fresh id
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let id = self.next_entity_id();
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    /// Live entities of one kind
    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|e| e.kind == kind).count()
    }

    /// Player length including trailing segments
    pub fn body_len(&self) -> usize {
        1 + self.segments.len()
    }
}
