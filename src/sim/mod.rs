//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, storage or platform dependencies

pub mod autopilot;
pub mod clock;
pub mod collision;
pub mod config;
pub mod input;
pub mod integrate;
pub mod spawn;
pub mod state;
pub mod tick;

pub use clock::Clock;
pub use collision::{Contact, Outcome, classify, overlaps};
pub use config::{
    BoundsPolicy, CollisionRule, CoordPolicy, GameConfig, GameKind, SpawnCadence, SpawnRule,
    SpawnTemplate,
};
pub use input::{Direction, InputMapper, Intent, KeyCode, RawInput, TickInput};
pub use state::{
    Entity, EntityId, EntityKind, EntityMeta, Extent, GameEvent, GameStatus, Motion, OverReason,
    PLAYER_ID, SimState,
};
pub use tick::{TickOutcome, tick};
