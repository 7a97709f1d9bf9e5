//! Engine settings
//!
//! Persisted as JSON next to the best scores, under its own key.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_SUBSTEPS;
use crate::persistence::{KeyValueStore, load_json, save_json};
use crate::sim::GameConfig;

/// Game speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpeedPreset {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl SpeedPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedPreset::Slow => "Slow",
            SpeedPreset::Normal => "Normal",
            SpeedPreset::Fast => "Fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slow" => Some(SpeedPreset::Slow),
            "normal" | "default" => Some(SpeedPreset::Normal),
            "fast" => Some(SpeedPreset::Fast),
            _ => None,
        }
    }

    /// Tick rate multiplier (1.0 = game's own rate)
    pub fn multiplier(&self) -> f32 {
        match self {
            SpeedPreset::Slow => 0.75,
            SpeedPreset::Normal => 1.0,
            SpeedPreset::Fast => 1.25,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub speed: SpeedPreset,
    /// Cap on physics ticks per `advance` call
    pub max_substeps: u32,
    /// Fixed run seed (None = seed from the clock)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: SpeedPreset::Normal,
            max_substeps: MAX_SUBSTEPS,
            seed: None,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "arcade_settings";

    pub fn from_preset(speed: SpeedPreset) -> Self {
        Self {
            speed,
            ..Self::default()
        }
    }

    /// Physics clock period for a game at this speed (seconds)
    pub fn tick_period(&self, config: &GameConfig) -> f32 {
        config.tick_secs / self.speed.multiplier()
    }

    /// Spawn clock period at this speed, if the game has one
    pub fn spawn_period(&self, config: &GameConfig) -> Option<f32> {
        config
            .spawn_clock_period()
            .map(|period| period / self.speed.multiplier())
    }

    /// Load settings, falling back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<Settings>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::GameKind;

    #[test]
    fn test_preset_names() {
        for preset in [SpeedPreset::Slow, SpeedPreset::Normal, SpeedPreset::Fast] {
            assert_eq!(SpeedPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(SpeedPreset::from_str("ludicrous"), None);
    }

    #[test]
    fn test_tick_period_scales() {
        let config = GameKind::Snake.config();
        assert_eq!(Settings::default().tick_period(&config), 0.150);
        let fast = Settings::from_preset(SpeedPreset::Fast);
        assert!(fast.tick_period(&config) < 0.150);
        assert_eq!(fast.spawn_period(&config), None);

        let flappy = GameKind::Flappy.config();
        assert_eq!(Settings::default().spawn_period(&flappy), Some(2.0));
    }

    #[test]
    fn test_round_trip_through_store() {
        let mut store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());

        let settings = Settings {
            speed: SpeedPreset::Slow,
            max_substeps: 3,
            seed: Some(7),
        };
        settings.save(&mut store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_partial_and_corrupt_json() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, r#"{"speed":"Fast"}"#).unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.speed, SpeedPreset::Fast);
        assert_eq!(settings.max_substeps, MAX_SUBSTEPS);

        store.set(Settings::STORAGE_KEY, "nope").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }
}
