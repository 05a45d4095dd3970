//! Chroma Rush headless runner
//!
//! Seeds a run, drives the simulation with the built-in autopilot, and logs
//! wave progress. Usage: `chroma-rush [seed] [max_waves] [quality]`; a
//! quality preset given on the command line is remembered in the settings file.

use std::path::Path;

use chroma_rush::SaveData;
use chroma_rush::consts::FRAME_RATE;
use chroma_rush::settings::{QualityPreset, Settings};
use chroma_rush::sim::{GameEvent, GameMode, GameState, TickInput, tick};

const SETTINGS_PATH: &str = "chroma-rush-settings.json";
/// Hard stop so a stalled run cannot loop forever (30 minutes of game time)
const MAX_TICKS: u64 = 30 * 60 * FRAME_RATE as u64;

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    let max_waves: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(10);
    let quality = args.next();

    let path = Path::new(SETTINGS_PATH);
    let mut settings = Settings::load(path);
    if let Some(name) = quality {
        match QualityPreset::from_str(&name) {
            Some(preset) => {
                settings.apply_preset(preset);
                settings.save(path);
            }
            None => log::warn!(
                "Unknown quality preset {:?}, keeping {}",
                name,
                settings.quality.as_str()
            ),
        }
    }
    log::info!(
        "Chroma Rush (headless) starting: seed={}, max_waves={}, quality={}",
        seed,
        max_waves,
        settings.quality.as_str()
    );

    let mut state = GameState::with_options(seed, GameMode::Normal, settings);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    while state.time_ticks < MAX_TICKS {
        tick(&mut state, &input);

        for event in state.drain_events() {
            match event {
                GameEvent::WaveCleared(summary) => {
                    log::info!(
                        "t={}s wave {} cleared (boss={}), upgrades={}",
                        state.time_ticks / FRAME_RATE as u64,
                        summary.wave,
                        summary.boss_wave,
                        state.upgrades.total_levels()
                    );
                }
                GameEvent::BossDefeated { index } => log::info!("Boss {} down", index),
                GameEvent::UpgradeAcquired { id, level } => {
                    log::debug!("Acquired {} -> {}", id.as_str(), level)
                }
                _ => {}
            }
        }

        if state.is_game_over() || state.wave > max_waves {
            break;
        }
    }

    match serde_json::to_string_pretty(&state.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::warn!("Failed to serialize snapshot: {}", e),
    }
    if !state.is_game_over() {
        match SaveData::capture(&state).to_json() {
            Ok(json) => log::info!("Resume save: {}", json),
            Err(e) => log::warn!("Failed to serialize save: {}", e),
        }
    }
}
