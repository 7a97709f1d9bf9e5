//! Best score tracking
//!
//! Each game keeps one persisted best score under its own storage key. The
//! value is read once when a run starts and written only on strict
//! improvement.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, load_json, save_json};

/// Which way a score improves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoreDirection {
    /// Points: bigger is better
    #[default]
    HigherIsBetter,
    /// Times: smaller is better
    LowerIsBetter,
}

impl ScoreDirection {
    /// Best score before anything was recorded
    pub fn initial(&self) -> u64 {
        match self {
            ScoreDirection::HigherIsBetter => 0,
            ScoreDirection::LowerIsBetter => u64::MAX,
        }
    }

    /// Strictly better than `best`
    pub fn improves(&self, score: u64, best: u64) -> bool {
        match self {
            ScoreDirection::HigherIsBetter => score > best,
            ScoreDirection::LowerIsBetter => score < best,
        }
    }
}

/// Persisted best score for one game
#[derive(Debug, Clone)]
pub struct ScoreKeeper {
    key: String,
    direction: ScoreDirection,
    best: u64,
}

impl ScoreKeeper {
    pub fn new(key: impl Into<String>, direction: ScoreDirection) -> Self {
        Self {
            key: key.into(),
            direction,
            best: direction.initial(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn direction(&self) -> ScoreDirection {
        self.direction
    }

    /// Current best score
    #[inline]
    pub fn best(&self) -> u64 {
        self.best
    }

    /// Refresh the best score from storage. Missing or unreadable values reset to the initial best.
    pub fn load(&mut self, store: &dyn KeyValueStore) -> u64 {
        self.best = match load_json::<u64>(store, &self.key) {
            Ok(Some(best)) => {
                log::info!("Loaded best score {} for {}", best, self.key);
                best
            }
            Ok(None) => {
                log::info!("No best score for {}, starting fresh", self.key);
                self.direction.initial()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable best score for {}: {}", self.key, e);
                self.direction.initial()
            }
        };
        self.best
    }

    /// Record `score` if it strictly beats the best. Returns true when it did.
    ///
    /// A failed write keeps the new best in memory and is only logged.
    pub fn commit_if_high_score(&mut self, score: u64, store: &mut dyn KeyValueStore) -> bool {
        if !self.direction.improves(score, self.best) {
            return false;
        }

        self.best = score;
        match save_json(store, &self.key, &score) {
            Ok(()) => log::info!("New best score {} for {}", score, self.key),
            Err(e) => log::warn!("Failed to save best score for {}: {}", self.key, e),
        }
        true
    }
}
