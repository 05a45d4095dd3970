//! Simulation settings
//!
//! Persisted separately from game saves as a small JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sim::entities::TRAIL_LENGTH;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 300,
            QualityPreset::High => 600,
        }
    }

    /// Bullet trail points kept per bullet
    pub fn trail_length(&self) -> usize {
        match self {
            QualityPreset::Low => 2,
            QualityPreset::Medium => 5,
            QualityPreset::High => TRAIL_LENGTH,
        }
    }
}

/// Simulation settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quality preset (particle cap, trail length)
    pub quality: QualityPreset,
    /// Particle effects (explosions, sparks, etc.)
    pub particles: bool,
    /// Bullet trails
    pub trails: bool,
    /// Whether the player can be hurt in sandbox mode
    pub sandbox_player_collision: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            trails: true,
            sandbox_player_collision: true,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Effective trail length
    pub fn trail_length(&self) -> usize {
        if !self.trails {
            0
        } else {
            self.quality.trail_length()
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from disk, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let Ok(json) = std::fs::read_to_string(path) else {
            log::info!("Using default settings");
            return Self::default();
        };
        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) {
        match self.to_json() {
            Ok(json) => match std::fs::write(path, json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Failed to write settings: {}", e),
            },
            Err(e) => log::warn!("Failed to serialize settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_caps() {
        assert_eq!(Settings::from_preset(QualityPreset::Low).max_particles(), 100);
        assert_eq!(Settings::from_preset(QualityPreset::Medium).max_particles(), 300);
        assert_eq!(Settings::from_preset(QualityPreset::High).max_particles(), 600);
        assert_eq!(QualityPreset::High.trail_length(), TRAIL_LENGTH);
    }

    #[test]
    fn test_toggles_disable_effects() {
        let s = Settings {
            particles: false,
            trails: false,
            ..Default::default()
        };
        assert_eq!(s.max_particles(), 0);
        assert_eq!(s.trail_length(), 0);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(QualityPreset::from_str("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = Settings::from_json(r#"{"quality":"High"}"#).unwrap();
        assert_eq!(s.quality, QualityPreset::High);
        assert!(s.particles);
        assert!(s.sandbox_player_collision);
        assert!(Settings::from_json("not json").is_err());
    }

    #[test]
    fn test_preset_change_survives_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("chroma-rush-settings-{}.json", std::process::id()));
        let mut s = Settings {
            trails: false,
            ..Default::default()
        };
        s.apply_preset(QualityPreset::Low);
        s.save(&path);
        let loaded = Settings::load(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, s);
        assert_eq!(loaded.max_particles(), 100);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let s = Settings::load(Path::new("/nonexistent/chroma-rush/settings.json"));
        assert_eq!(s, Settings::default());
    }
}
