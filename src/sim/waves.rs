//! Wave/spawn director
//!
//! Converts a wave number into a budget-constrained queue of timed spawn
//! groups, meters enemies out one at a time, and reports wave completion.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::enemy::EnemyKind;
use crate::consts::*;

/// Chance that a group rolls the large size range
const LARGE_GROUP_CHANCE: f64 = 0.15;
const GROUP_DELAY_MIN: u32 = 60;
const GROUP_DELAY_MAX: u32 = 150;
/// Intra-group spawn interval never drops below this
const MIN_SPAWN_INTERVAL: u32 = 8;

/// An enemy type the director can buy with its budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    pub color: Color,
    pub kind: EnemyKind,
    pub cost: u32,
    /// First wave this archetype may appear in
    pub unlock_wave: u32,
}

const fn archetype(color: Color, kind: EnemyKind, cost: u32, unlock_wave: u32) -> Archetype {
    Archetype {
        color,
        kind,
        cost,
        unlock_wave,
    }
}

pub const ARCHETYPES: [Archetype; 7] = [
    archetype(Color::Red, EnemyKind::Normal, 1, 1),
    archetype(Color::Blue, EnemyKind::Normal, 1, 1),
    archetype(Color::Yellow, EnemyKind::Normal, 1, 1),
    archetype(Color::Green, EnemyKind::Normal, 2, 2),
    archetype(Color::Purple, EnemyKind::Normal, 2, 3),
    archetype(Color::Orange, EnemyKind::Normal, 3, 4),
    archetype(Color::Red, EnemyKind::Sentinel, 5, 6),
];

/// Budget for wave `n`, nudged upward by acquired upgrade levels
pub fn wave_budget(wave: u32, upgrade_levels: u32) -> u32 {
    6 + 3 * wave + upgrade_levels / 2
}

/// Frames between enemies of the same group
pub fn spawn_interval(wave: u32) -> u32 {
    30u32.saturating_sub(wave).max(MIN_SPAWN_INTERVAL)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnKind {
    Group { archetype: Archetype, count: u32 },
    Boss,
}

/// One queued entry and the pause that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    pub kind: SpawnKind,
    pub delay_after: u32,
}

impl SpawnEntry {
    pub fn cost(&self) -> u32 {
        match self.kind {
            SpawnKind::Group { archetype, count } => archetype.cost * count,
            SpawnKind::Boss => 0,
        }
    }
}

/// What the caller should create this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRequest {
    Enemy { color: Color, kind: EnemyKind },
    Boss,
}

/// Live-entity counts the director needs to detect completion
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorStatus {
    pub alive_enemies: usize,
    pub fragments_remaining: usize,
    pub boss_alive: bool,
}

/// Published when a wave is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveSummary {
    pub wave: u32,
    pub fragments_collected: u32,
    pub boss_wave: bool,
}

#[derive(Debug, Clone, Default)]
pub struct WaveUpdate {
    pub spawns: Vec<SpawnRequest>,
    pub completed: Option<WaveSummary>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveGroup {
    archetype: Archetype,
    remaining: u32,
    clock: u32,
    delay_after: u32,
}

/// Procedural group generation: buy random affordable archetypes until the
/// budget can no longer afford anything unlocked
pub fn generate_groups(wave: u32, upgrade_levels: u32, rng: &mut impl Rng) -> Vec<SpawnEntry> {
    let mut budget = wave_budget(wave, upgrade_levels);
    let mut entries = Vec::new();
    loop {
        let affordable: Vec<Archetype> = ARCHETYPES
            .iter()
            .copied()
            .filter(|a| a.unlock_wave <= wave && a.cost <= budget)
            .collect();
        if affordable.is_empty() {
            break;
        }
        let archetype = affordable[rng.random_range(0..affordable.len())];
        let size = if rng.random_bool(LARGE_GROUP_CHANCE) {
            rng.random_range(4..=6)
        } else {
            rng.random_range(1..=3)
        };
        let count = size.min(budget / archetype.cost).max(1);
        budget -= archetype.cost * count;
        entries.push(SpawnEntry {
            kind: SpawnKind::Group { archetype, count },
            delay_after: rng.random_range(GROUP_DELAY_MIN..=GROUP_DELAY_MAX),
        });
    }
    entries
}

/// Random point just outside one of the four arena edges
pub fn edge_spawn_position(rng: &mut impl Rng) -> Vec2 {
    let x = rng.random_range(0.0..ARENA_WIDTH);
    let y = rng.random_range(0.0..ARENA_HEIGHT);
    match rng.random_range(0..4) {
        0 => Vec2::new(x, -SPAWN_MARGIN),
        1 => Vec2::new(ARENA_WIDTH + SPAWN_MARGIN, y),
        2 => Vec2::new(x, ARENA_HEIGHT + SPAWN_MARGIN),
        _ => Vec2::new(-SPAWN_MARGIN, y),
    }
}

#[derive(Debug, Clone, Default)]
pub struct WaveDirector {
    pub wave: u32,
    pub in_progress: bool,
    pub boss_wave: bool,
    pub fragments_collected: u32,
    queue: VecDeque<SpawnEntry>,
    active: Option<ActiveGroup>,
    delay_clock: u32,
    spawn_interval: u32,
    /// Procedural groups generated for the current wave
    group_count: usize,
}

impl WaveDirector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_wave(&mut self, wave: u32, boss: bool, upgrade_levels: u32, rng: &mut impl Rng) {
        self.wave = wave;
        self.in_progress = true;
        self.boss_wave = boss;
        self.fragments_collected = 0;
        self.active = None;
        self.delay_clock = 0;
        self.spawn_interval = spawn_interval(wave);

        if boss {
            self.queue = VecDeque::from([SpawnEntry {
                kind: SpawnKind::Boss,
                delay_after: 0,
            }]);
            self.group_count = 0;
            log::info!("Wave {}: boss wave", wave);
        } else {
            let groups = generate_groups(wave, upgrade_levels, rng);
            let spent: u32 = groups.iter().map(SpawnEntry::cost).sum();
            log::info!(
                "Wave {}: budget={}, spent={}, groups={}",
                wave,
                wave_budget(wave, upgrade_levels),
                spent,
                groups.len()
            );
            self.group_count = groups.len();
            self.queue = groups.into();
        }
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Entries not yet started
    pub fn queued(&self) -> impl Iterator<Item = &SpawnEntry> {
        self.queue.iter()
    }

    /// Nothing left to spawn this wave
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty() && self.active.is_none()
    }

    pub fn on_fragment_collected(&mut self) {
        self.fragments_collected += 1;
    }

    /// Advance the spawn clock one frame and check for completion
    pub fn update(&mut self, status: DirectorStatus) -> WaveUpdate {
        let mut out = WaveUpdate::default();
        if !self.in_progress {
            return out;
        }

        if self.active.is_none() {
            if self.delay_clock > 0 {
                self.delay_clock -= 1;
            } else if let Some(entry) = self.queue.pop_front() {
                match entry.kind {
                    SpawnKind::Boss => {
                        out.spawns.push(SpawnRequest::Boss);
                        self.delay_clock = entry.delay_after;
                    }
                    SpawnKind::Group { archetype, count } => {
                        self.active = Some(ActiveGroup {
                            archetype,
                            remaining: count,
                            clock: 0,
                            delay_after: entry.delay_after,
                        });
                    }
                }
            }
        }

        if let Some(group) = self.active.as_mut() {
            if group.clock > 0 {
                group.clock -= 1;
            }
            if group.clock == 0 {
                out.spawns.push(SpawnRequest::Enemy {
                    color: group.archetype.color,
                    kind: group.archetype.kind,
                });
                group.remaining -= 1;
                group.clock = self.spawn_interval;
                if group.remaining == 0 {
                    self.delay_clock = group.delay_after;
                    self.active = None;
                }
            }
        }

        if out.spawns.is_empty()
            && self.is_exhausted()
            && status.alive_enemies == 0
            && status.fragments_remaining == 0
            && !status.boss_alive
        {
            self.in_progress = false;
            out.completed = Some(WaveSummary {
                wave: self.wave,
                fragments_collected: self.fragments_collected,
                boss_wave: self.boss_wave,
            });
        }
        out
    }
}
