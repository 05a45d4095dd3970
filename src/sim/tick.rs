//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision;
use super::color::Color;
use super::effects;
use super::enemy::{EnemyKind, EnemySpawn};
use super::player::PlayerControls;
use super::state::{GameEvent, GameMode, GamePhase, GameState};
use super::upgrades::UpgradeId;
use super::waves::{DirectorStatus, SpawnRequest};
use crate::consts::*;

/// Homing bullets only lock onto enemies this close
pub const HOMING_RANGE: f32 = 400.0;

/// Autopilot backs off from anything nearer than this
const AUTOPILOT_KEEP_AWAY: f32 = 220.0;
const AUTOPILOT_DASH_MARGIN: f32 = 20.0;

/// Discrete commands from the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Leave the between-waves phase
    NextWave,
    /// Spend one banked upgrade
    SpendUpgrade(UpgradeId),
    SpawnEnemy { color: Color, sentinel: bool },
    SpawnBoss,
    ClearEnemies,
    ClearBullets,
    AddUpgrade(String),
    RemoveUpgrade(String),
    MaxUpgrade(String),
    TogglePlayerCollision,
}

impl Command {
    pub fn is_sandbox_only(&self) -> bool {
        !matches!(self, Command::NextWave | Command::SpendUpgrade(_))
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement vector (normalized by the player)
    pub movement: Vec2,
    /// Aim position in arena coordinates
    pub aim: Vec2,
    /// Fire held
    pub fire: bool,
    pub dash: bool,
    pub select_color: Option<Color>,
    /// +1/-1 to cycle colors, 0 for none
    pub cycle_color: i32,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - the autopilot plays the game
    pub autopilot: bool,
    pub commands: Vec<Command>,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing | GamePhase::BetweenWaves => {
                state.resume_phase = state.phase;
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = state.resume_phase,
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    match state.phase {
        GamePhase::Paused | GamePhase::GameOver => return,
        _ => {}
    }

    for command in &input.commands {
        apply_command(state, command);
    }

    if state.phase == GamePhase::BetweenWaves {
        if input.autopilot {
            autopilot_between_waves(state);
        }
        state.time_ticks += 1;
        return;
    }

    let mut controls = PlayerControls {
        movement: input.movement,
        aim: input.aim,
        fire: input.fire,
        dash: input.dash,
    };
    let mut select = input.select_color;
    if input.autopilot {
        let (auto_controls, auto_color) = autopilot(state);
        controls = auto_controls;
        select = auto_color;
    }

    if let Some(color) = select {
        state.player.select_color(color);
    }
    if input.cycle_color != 0 {
        state.player.cycle_color(input.cycle_color);
    }

    // Player
    let mut shots = Vec::new();
    state.player.update(&controls, &mut state.rng, &mut shots);
    for spec in &shots {
        if state.store.spawn_bullet(spec).is_some() {
            state.events.push(GameEvent::ShotFired { color: spec.color });
        }
    }

    effects::update_ambient(&mut state.store);

    // Enemies
    let player_pos = state.player.pos;
    let mut spawns = Vec::new();
    let mut kills = Vec::new();
    for (i, enemy) in state.store.enemies.iter_mut().enumerate() {
        if enemy.update(player_pos, &mut state.rng, &mut spawns).killed {
            kills.push(i);
        }
    }
    for spawn in spawns {
        match spawn {
            EnemySpawn::Shot(spec) => {
                state.store.spawn_bullet(&spec);
            }
            EnemySpawn::Hazard(hazard) => state.store.hazards.push(hazard),
        }
    }
    collision::process_kills(state, kills);

    // Boss
    let mut boss_shots = Vec::new();
    if let Some(boss) = state.store.boss.as_mut() {
        boss.update(&mut state.rng, &mut boss_shots);
    }
    for spec in &boss_shots {
        state.store.spawn_bullet(spec);
    }

    // Fragments
    let attract = state.player.attract_radius();
    for fragment in &mut state.store.fragments {
        fragment.update(player_pos, attract);
    }

    // Bullets
    let trail_len = state.store.trail_len;
    for h in state.store.bullets.active_handles() {
        let target = match state.store.bullets.get_ref(h) {
            Some(b) if b.alive && b.homing && !b.hostile => state
                .store
                .nearest_enemy(b.pos, HOMING_RANGE, &b.hit_enemies)
                .map(|i| state.store.enemies[i].pos),
            _ => None,
        };
        if let Some(b) = state.store.bullets.get_mut(h) {
            b.update(target, trail_len);
        }
    }

    // Collisions against this tick's positions
    state.store.rebuild_index();
    collision::resolve(state);
    state.store.cleanup();

    advance_director(state);

    if state.player.is_dead() {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver {
            score: state.score,
            wave: state.wave,
        });
        log::info!("Game over on wave {} with score {}", state.wave, state.score);
    }

    state.time_ticks += 1;
}

fn advance_director(state: &mut GameState) {
    let status = DirectorStatus {
        alive_enemies: state.store.alive_enemy_count(),
        fragments_remaining: state.store.fragments_remaining(),
        boss_alive: state.store.boss_alive(),
    };
    let update = state.director.update(status);
    for request in update.spawns {
        match request {
            SpawnRequest::Enemy { color, kind } => {
                state.spawn_enemy_at_edge(color, kind);
            }
            SpawnRequest::Boss => state.spawn_boss(),
        }
    }

    if let Some(summary) = update.completed {
        state.phase = GamePhase::BetweenWaves;
        state.between_waves = Some(summary);
        state.events.push(GameEvent::WaveCleared(summary));
        log::info!(
            "Wave {} cleared: {} fragments, score {}",
            summary.wave,
            summary.fragments_collected,
            state.score
        );
    }
}

fn apply_command(state: &mut GameState, command: &Command) {
    if command.is_sandbox_only() && state.mode != GameMode::Sandbox {
        log::warn!("Ignoring sandbox command outside sandbox: {:?}", command);
        return;
    }

    match command {
        Command::NextWave => {
            if state.phase == GamePhase::BetweenWaves {
                state.start_wave(state.wave + 1);
            } else {
                log::debug!("NextWave ignored in {:?}", state.phase);
            }
        }
        Command::SpendUpgrade(id) => {
            spend_upgrade(state, *id);
        }
        Command::SpawnEnemy { color, sentinel } => {
            let kind = if *sentinel {
                EnemyKind::Sentinel
            } else {
                EnemyKind::Normal
            };
            state.spawn_enemy_at_edge(*color, kind);
        }
        Command::SpawnBoss => state.spawn_boss(),
        Command::ClearEnemies => state.store.clear_enemies(),
        Command::ClearBullets => state.store.clear_bullets(),
        Command::AddUpgrade(name) | Command::RemoveUpgrade(name) | Command::MaxUpgrade(name) => {
            let Some(id) = UpgradeId::from_str(name) else {
                log::warn!("Unknown upgrade id: {}", name);
                return;
            };
            match command {
                Command::AddUpgrade(_) => {
                    state.upgrades.add(id, &mut state.player);
                }
                Command::RemoveUpgrade(_) => {
                    state.upgrades.remove(id, &mut state.player);
                }
                _ => state.upgrades.set_max(id, &mut state.player),
            }
        }
        Command::TogglePlayerCollision => {
            state.player_collision = !state.player_collision;
            state.settings.sandbox_player_collision = state.player_collision;
        }
    }
}

/// Acquire one level of `id` with a banked upgrade. Returns false (no-op) if
/// nothing is banked or the upgrade is maxed.
pub fn spend_upgrade(state: &mut GameState, id: UpgradeId) -> bool {
    if state.banked_upgrades == 0 {
        log::warn!("No banked upgrades to spend on {}", id.as_str());
        return false;
    }
    if !state.upgrades.add(id, &mut state.player) {
        log::debug!("Upgrade {} already at max level", id.as_str());
        return false;
    }
    state.banked_upgrades -= 1;
    state.events.push(GameEvent::UpgradeAcquired {
        id,
        level: state.upgrades.level(id),
    });
    true
}

/// Spend everything banked, then continue
fn autopilot_between_waves(state: &mut GameState) {
    let n = UpgradeId::ALL.len();
    let mut offset = state.wave as usize;
    while state.banked_upgrades > 0 {
        let next = (0..n)
            .map(|k| UpgradeId::ALL[(offset + k) % n])
            .find(|id| state.upgrades.level(*id) < id.max_level());
        let Some(id) = next else {
            break;
        };
        spend_upgrade(state, id);
        offset += 1;
    }
    apply_command(state, &Command::NextWave);
}

/// Demo player: shoot the nearest threat in a matching color, keep distance,
/// and sweep up fragments when nothing is close
fn autopilot(state: &GameState) -> (PlayerControls, Option<Color>) {
    let player = &state.player;
    let pos = player.pos;
    let reach = ARENA_WIDTH + ARENA_HEIGHT;

    let enemy = state
        .store
        .nearest_enemy(pos, reach, &[])
        .map(|i| &state.store.enemies[i])
        .map(|e| (e.pos, e.radius, e.color));
    let boss = state
        .store
        .boss
        .as_ref()
        .filter(|b| b.alive)
        .map(|b| (b.pos, b.radius, b.color));

    let target = match (enemy, boss) {
        (Some(e), Some(b)) => {
            if e.0.distance_squared(pos) <= b.0.distance_squared(pos) {
                Some((e, false))
            } else {
                Some((b, true))
            }
        }
        (Some(e), None) => Some((e, false)),
        (None, Some(b)) => Some((b, true)),
        (None, None) => None,
    };

    let mut controls = PlayerControls::default();
    let mut select = None;

    if let Some(((tpos, tradius, tcolor), is_boss)) = target {
        controls.aim = tpos;
        controls.fire = true;
        select = pick_color(player.color, tcolor, is_boss, |c| player.can_select(c));

        let dist = tpos.distance(pos);
        if dist < AUTOPILOT_KEEP_AWAY {
            controls.movement = (pos - tpos).normalize_or_zero();
        }
        controls.dash = dist < tradius + player.radius + AUTOPILOT_DASH_MARGIN;
    }

    if controls.movement == Vec2::ZERO {
        let fragment = state
            .store
            .fragments
            .iter()
            .filter(|f| !f.collected)
            .min_by(|a, b| a.pos.distance_squared(pos).total_cmp(&b.pos.distance_squared(pos)));
        let center = Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0);
        if let Some(f) = fragment {
            controls.movement = (f.pos - pos).normalize_or_zero();
        } else if pos.distance(center) > 100.0 {
            controls.movement = (center - pos).normalize_or_zero();
        }
    }

    // Oscillating sidestep so the demo does not sit still
    let t = state.time_ticks as f32 * 0.02;
    controls.movement += Vec2::new(-controls.movement.y, controls.movement.x) * t.sin() * 0.3;

    (controls, select)
}

/// Color that will damage `target`. Bosses need an exact match; when the
/// exact color is locked, switch to a secondary that unlocks it next tick.
fn pick_color(
    current: Color,
    target: Color,
    exact: bool,
    can_select: impl Fn(Color) -> bool,
) -> Option<Color> {
    let effective = if exact {
        current == target
    } else {
        Color::matches(current, target)
    };
    if effective {
        return None;
    }
    if can_select(target) {
        return Some(target);
    }
    Color::ALL
        .into_iter()
        .find(|c| !c.is_primary() && !c.contains(target) && can_select(*c))
}
