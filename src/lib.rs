//! Arcade Core - a real-time 2D arcade simulation engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, input, spawning, integration, collisions)
//! - `session`: Game state machine and the session boundary API
//! - `highscores`: Best-score keeping with persistence
//! - `persistence`: Key-value store adapters
//! - `platform`: Browser/native platform abstraction (input sources, run seeds, web logging)
//! - `settings`: Engine configuration
//! - `web_app`: Browser entry point (wasm only)

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web_app;

pub use highscores::{ScoreDirection, ScoreKeeper};
pub use persistence::{KeyValueStore, MemoryStore, StoreError};
pub use session::{Session, SharedSession, Snapshot};
pub use settings::{Settings, SpeedPreset};

/// Engine configuration constants
pub mod consts {
    /// Default physics tick rate for continuous games (Hz)
    pub const PHYSICS_HZ: f32 = 60.0;
    /// Maximum ticks processed per `advance` call to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest wall-clock delta accepted by a clock (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.25;

    /// Integration step in per-tick units
    pub const STEP_DT: f32 = 1.0;

    /// Attempts a spawner makes to avoid the player's box before skipping the tick
    pub const SPAWN_REROLLS: u32 = 8;
}

/// Wrap a coordinate into `[0, bound)`
#[inline]
pub fn wrap_coord(value: f32, bound: f32) -> f32 {
    if bound <= 0.0 {
        return 0.0;
    }
    let wrapped = value.rem_euclid(bound);
    // rem_euclid can round up to `bound` for tiny negative inputs
    if wrapped >= bound { 0.0 } else { wrapped }
}

/// Clamp a coordinate so that a span of `size` starting at it stays inside `[0, bound]`
#[inline]
pub fn clamp_coord(value: f32, size: f32, bound: f32) -> f32 {
    value.clamp(0.0, (bound - size).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_coord() {
        assert_eq!(wrap_coord(20.0, 20.0), 0.0);
        assert_eq!(wrap_coord(-1.0, 20.0), 19.0);
        assert_eq!(wrap_coord(5.5, 20.0), 5.5);
        assert!(wrap_coord(-1e-9, 20.0) < 20.0);
    }

    #[test]
    fn test_clamp_coord() {
        assert_eq!(clamp_coord(-5.0, 40.0, 400.0), 0.0);
        assert_eq!(clamp_coord(390.0, 40.0, 400.0), 360.0);
        assert_eq!(clamp_coord(100.0, 40.0, 400.0), 100.0);
    }
}
