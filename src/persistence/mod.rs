//! Save snapshot (de)serialization
//!
//! A save captures the run between waves: progression (score, upgrades,
//! boss threshold, banked upgrades) plus enough player state to resume.
//! Entities are not saved; loading restarts the saved wave.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::sim::color::Color;
use crate::sim::state::{GameMode, GameState};
use crate::sim::upgrades::{UpgradeEngine, UpgradeId};

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub score: u64,
    pub health: f32,
    pub upgrades: BTreeMap<UpgradeId, u32>,
    pub next_boss_wave: u32,
    pub color: Color,
    pub wave: u32,
    #[serde(default)]
    pub banked_upgrades: u32,
    #[serde(default)]
    pub mode: GameMode,
}

impl SaveData {
    pub fn capture(state: &GameState) -> Self {
        Self {
            version: SAVE_VERSION,
            score: state.score,
            health: state.player.health,
            upgrades: state.upgrades.levels().clone(),
            next_boss_wave: state.next_boss_wave,
            color: state.player.color,
            wave: state.wave,
            banked_upgrades: state.banked_upgrades,
            mode: state.mode,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let save: Self = serde_json::from_str(json)?;
        if save.version != SAVE_VERSION {
            log::warn!(
                "Save version {} differs from current {}",
                save.version,
                SAVE_VERSION
            );
        }
        Ok(save)
    }
}

impl GameState {
    /// Resume a saved run: modifiers are recomputed from the saved levels and
    /// the saved wave starts fresh
    pub fn from_save(save: &SaveData, seed: u64, settings: Settings) -> Self {
        let mut state = Self::blank(seed, save.mode, settings);

        state.upgrades = UpgradeEngine::from_levels(&save.upgrades);
        state.upgrades.recompute(&mut state.player);

        state.player.health = save.health.clamp(1.0, state.player.max_health);
        state.player.color = save.color;
        state.score = save.score;
        state.next_boss_wave = save.next_boss_wave.max(1);
        state.banked_upgrades = save.banked_upgrades;

        log::info!(
            "Restored save: wave {}, score {}, {} upgrade levels",
            save.wave,
            save.score,
            state.upgrades.total_levels()
        );
        state.start_wave(save.wave);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PLAYER_BASE_HEALTH;

    fn progressed() -> GameState {
        let mut s = GameState::new(77);
        s.upgrades.add(UpgradeId::MaxHealth, &mut s.player);
        s.upgrades.add(UpgradeId::MaxHealth, &mut s.player);
        s.upgrades.add(UpgradeId::Ignite, &mut s.player);
        s.player.health = 90.0;
        s.player.select_color(Color::Green);
        s.score = 4200;
        s.wave = 7;
        s.next_boss_wave = 10;
        s.banked_upgrades = 2;
        s
    }

    #[test]
    fn test_capture_and_restore() {
        let state = progressed();
        let save = SaveData::capture(&state);
        let json = save.to_json().unwrap();
        let restored = GameState::from_save(&SaveData::from_json(&json).unwrap(), 1, Settings::default());

        assert_eq!(restored.score, 4200);
        assert_eq!(restored.wave, 7);
        assert_eq!(restored.next_boss_wave, 10);
        assert_eq!(restored.banked_upgrades, 2);
        assert_eq!(restored.player.color, Color::Green);
        assert_eq!(restored.player.health, 90.0);
        assert_eq!(restored.upgrades.level(UpgradeId::MaxHealth), 2);
        assert_eq!(restored.player.max_health, state.player.max_health);
        assert_eq!(restored.player.mods.ignite_level, 1);
        assert!(!restored.director.boss_wave);
    }

    #[test]
    fn test_health_clamped_to_max() {
        let mut save = SaveData::capture(&GameState::new(1));
        save.health = 10_000.0;
        let restored = GameState::from_save(&save, 1, Settings::default());
        assert_eq!(restored.player.health, PLAYER_BASE_HEALTH);
    }

    #[test]
    fn test_levels_clamped_to_max() {
        let mut save = SaveData::capture(&GameState::new(1));
        save.upgrades.insert(UpgradeId::Damage, 99);
        let restored = GameState::from_save(&save, 1, Settings::default());
        assert_eq!(
            restored.upgrades.level(UpgradeId::Damage),
            UpgradeId::Damage.max_level()
        );
    }

    #[test]
    fn test_boss_threshold_restored() {
        let mut save = SaveData::capture(&GameState::new(1));
        save.wave = 10;
        save.next_boss_wave = 10;
        let restored = GameState::from_save(&save, 1, Settings::default());
        assert!(restored.director.boss_wave);
    }

    #[test]
    fn test_missing_optional_fields() {
        let json = r#"{"version":1,"score":5,"health":50.0,"upgrades":{},
            "next_boss_wave":5,"color":"red","wave":3}"#;
        let save = SaveData::from_json(json).unwrap();
        assert_eq!(save.banked_upgrades, 0);
        assert_eq!(save.mode, GameMode::Normal);
        assert!(SaveData::from_json("{}").is_err());
    }
}
