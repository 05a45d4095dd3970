//! Enemy entity and behavior engine
//!
//! One state machine (Chasing → Telegraphing → Attacking → Chasing) shared by
//! every enemy, parameterized by a per-color [`BehaviorProfile`]. Status
//! effects (ignite, freeze, slow, void) tick independently of the state
//! machine. Repeated wrong-color hits escalate into a [`Punishment`].

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::entities::{BulletSpec, Hazard};
use super::geometry::direction_or;
use crate::consts::HOSTILE_BULLET_SPEED;

/// Chasing lasts a random duration in this range (frames)
pub const CHASE_FRAMES_MIN: u32 = 120;
pub const CHASE_FRAMES_MAX: u32 = 240;
pub const TELEGRAPH_FRAMES: u32 = 40;
pub const ATTACK_FRAMES: u32 = 30;
/// Attack frame on which ranged enemies release their shot
pub const RANGED_RELEASE_FRAME: u32 = 15;
/// Dash attack speed relative to base speed
pub const DASH_ATTACK_MULT: f32 = 3.5;

pub const HAZARD_FUSE_FRAMES: u32 = 45;
pub const HAZARD_RADIUS: f32 = 60.0;

/// Ignite applies its damage once per interval, not every frame
pub const IGNITE_INTERVAL: u32 = 30;

/// Minimum frames between two body-contact self-damage ticks on one enemy
pub const CONTACT_COOLDOWN_FRAMES: u32 = 20;

/// Consecutive ineffective hits that trigger a punishment
pub const PUNISH_THRESHOLD: u32 = 3;
pub const PUNISHMENT_FRAMES: u32 = 300;
pub const PUNISH_SPEED_MULT: f32 = 1.6;
pub const PUNISH_DAMAGE_MULT: f32 = 1.5;
/// Splitting requires the enemy to be strictly larger than this
pub const SPLIT_MIN_RADIUS: f32 = 14.0;

pub const SENTINEL_ROTATE_FRAMES: u32 = 180;
pub const SENTINEL_IMMUNE_FRAMES: u32 = 30;

/// Purple enemies hover around this distance from the player
const ORBIT_DISTANCE: f32 = 180.0;
const STRAFE_FREQUENCY: f32 = 0.08;
const STRAFE_AMPLITUDE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Normal,
    /// Rotates its color on a timer, briefly immune after each rotation
    Sentinel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    Chasing,
    Telegraphing,
    Attacking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Punishment {
    SpeedBoost,
    DamageBoost,
    Reflect,
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementStyle {
    Direct,
    /// Sine offset perpendicular to the chase direction
    Strafe,
    /// Back away when too close, circle the player at range
    FleeOrbit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStyle {
    /// Charge through the snapshotted target
    Dash,
    Shot { slows_player: bool },
    /// Drop a delayed hazard zone on the target
    Zone,
}

/// Data-driven per-color tuning
#[derive(Debug, Clone, Copy)]
pub struct BehaviorProfile {
    pub movement: MovementStyle,
    pub attack: AttackStyle,
    pub speed: f32,
    pub health: f32,
    pub radius: f32,
    pub contact_damage: f32,
    pub points: u32,
}

pub fn profile(color: Color) -> BehaviorProfile {
    use AttackStyle::*;
    use MovementStyle::*;
    let (movement, attack, speed, health, radius, contact_damage, points) = match color {
        Color::Red => (Direct, Dash, 1.6, 30.0, 16.0, 12.0, 10),
        Color::Blue => (Direct, Shot { slows_player: false }, 1.3, 30.0, 16.0, 10.0, 10),
        Color::Yellow => (Strafe, Dash, 1.9, 24.0, 15.0, 10.0, 10),
        Color::Purple => (FleeOrbit, Shot { slows_player: false }, 1.5, 40.0, 17.0, 12.0, 20),
        Color::Green => (Strafe, Shot { slows_player: true }, 1.4, 40.0, 17.0, 12.0, 20),
        Color::Orange => (Direct, Zone, 1.2, 50.0, 18.0, 14.0, 25),
    };
    BehaviorProfile {
        movement,
        attack,
        speed,
        health,
        radius,
        contact_damage,
        points,
    }
}

/// Status-effect timers. Each runs independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    pub ignite_timer: u32,
    pub ignite_damage: f32,
    pub ignite_clock: u32,
    pub freeze_timer: u32,
    pub slow_factor: f32,
    pub slow_timer: u32,
    pub void_timer: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentinelState {
    pub rotate_timer: u32,
    pub immune_timer: u32,
}

/// Result of a damage application
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    /// The color rule accepted the hit
    pub hit: bool,
    pub killed: bool,
    pub damage_dealt: f32,
    /// Punishment triggered by this (ineffective) hit
    pub punished: Option<Punishment>,
}

impl DamageOutcome {
    pub fn miss() -> Self {
        Self::default()
    }
}

/// Something an enemy emits during its update
#[derive(Debug, Clone)]
pub enum EnemySpawn {
    Shot(BulletSpec),
    Hazard(Hazard),
}

/// Per-tick result of [`Enemy::update`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EnemyTick {
    pub ignite_damage: f32,
    /// Died to ignite this frame
    pub killed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    /// Monotonic, never reused. Only used for pair ordering and hit sets.
    pub id: u64,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: Color,
    pub speed: f32,
    pub base_speed: f32,
    pub damage: f32,
    pub base_damage: f32,
    pub points: u32,
    pub status: StatusEffects,
    pub state: BehaviorState,
    pub state_timer: u32,
    pub attack_target: Vec2,
    pub attack_dir: Vec2,
    pub punishment: Option<Punishment>,
    pub punishment_timer: u32,
    pub reflecting: bool,
    pub wrong_hits: u32,
    pub can_split: bool,
    pub sentinel: Option<SentinelState>,
    pub alive: bool,
    /// Score/fragment already awarded for this death
    pub rewarded: bool,
    /// Transient: already struck by the chain currently propagating
    #[serde(skip)]
    pub chained: bool,
    pub age: u32,
    pub strafe_phase: f32,
    pub orbit_dir: f32,
    pub hit_flash: u32,
    /// Frames until body contact with the player can hurt this enemy again
    #[serde(default)]
    pub contact_cooldown: u32,
}

impl Enemy {
    /// Create an enemy scaled for `wave` (1-based)
    pub fn new(id: u64, color: Color, kind: EnemyKind, pos: Vec2, wave: u32, rng: &mut impl Rng) -> Self {
        let p = profile(color);
        let w = wave.saturating_sub(1) as f32;
        let mut health = p.health * (1.0 + 0.08 * w);
        let speed = p.speed * (1.0 + 0.02 * w);
        let mut radius = p.radius;
        let mut points = p.points;
        let sentinel = match kind {
            EnemyKind::Normal => None,
            EnemyKind::Sentinel => {
                health *= 2.0;
                radius = 20.0;
                points *= 3;
                Some(SentinelState {
                    rotate_timer: SENTINEL_ROTATE_FRAMES,
                    immune_timer: 0,
                })
            }
        };

        Self {
            id,
            kind,
            pos,
            radius,
            health,
            max_health: health,
            color,
            speed,
            base_speed: speed,
            damage: p.contact_damage,
            base_damage: p.contact_damage,
            points,
            status: StatusEffects {
                slow_factor: 1.0,
                ..Default::default()
            },
            state: BehaviorState::Chasing,
            state_timer: rng.random_range(CHASE_FRAMES_MIN..=CHASE_FRAMES_MAX),
            attack_target: pos,
            attack_dir: Vec2::X,
            punishment: None,
            punishment_timer: 0,
            reflecting: false,
            wrong_hits: 0,
            can_split: true,
            sentinel,
            alive: true,
            rewarded: false,
            chained: false,
            age: 0,
            strafe_phase: rng.random_range(0.0..std::f32::consts::TAU),
            orbit_dir: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
            hit_flash: 0,
            contact_cooldown: 0,
        }
    }

    pub fn profile(&self) -> BehaviorProfile {
        profile(self.color)
    }

    /// Sentinel post-rotation window: every hit is a no-op miss
    pub fn is_immune(&self) -> bool {
        self.sentinel.is_some_and(|s| s.immune_timer > 0)
    }

    pub fn is_void(&self) -> bool {
        self.status.void_timer > 0
    }

    pub fn is_frozen(&self) -> bool {
        self.status.freeze_timer > 0
    }

    pub fn is_ignited(&self) -> bool {
        self.status.ignite_timer > 0
    }

    /// Effective movement speed after slow effects
    pub fn current_speed(&self) -> f32 {
        if self.status.slow_timer > 0 {
            self.speed * self.status.slow_factor
        } else {
            self.speed
        }
    }

    /// Apply a hit. `bypass_color_check` is used by area, dash, and chain damage.
    pub fn take_damage(
        &mut self,
        amount: f32,
        damage_color: Color,
        bypass_color_check: bool,
        rng: &mut impl Rng,
    ) -> DamageOutcome {
        if !self.alive || self.is_immune() {
            return DamageOutcome::miss();
        }

        let effective =
            bypass_color_check || self.is_void() || Color::matches(damage_color, self.color);

        if !effective {
            self.wrong_hits += 1;
            let punished = if self.wrong_hits >= PUNISH_THRESHOLD {
                self.wrong_hits = 0;
                self.trigger_punishment(rng)
            } else {
                None
            };
            return DamageOutcome {
                punished,
                ..DamageOutcome::miss()
            };
        }

        self.wrong_hits = 0;
        self.health -= amount;
        self.hit_flash = 6;
        let killed = self.health <= 0.0;
        if killed {
            self.alive = false;
        }
        DamageOutcome {
            hit: true,
            killed,
            damage_dealt: amount,
            punished: None,
        }
    }

    /// Pick one punishment from the currently eligible set and start it
    fn trigger_punishment(&mut self, rng: &mut impl Rng) -> Option<Punishment> {
        let mut eligible = vec![Punishment::SpeedBoost, Punishment::DamageBoost];
        if !self.reflecting {
            eligible.push(Punishment::Reflect);
        }
        if self.radius > SPLIT_MIN_RADIUS && self.can_split {
            eligible.push(Punishment::Split);
        }
        let chosen = eligible[rng.random_range(0..eligible.len())];

        // Only one punishment at a time
        if self.punishment.is_some() {
            self.end_punishment();
        }

        self.punishment = Some(chosen);
        self.punishment_timer = PUNISHMENT_FRAMES;
        match chosen {
            Punishment::SpeedBoost => self.speed = self.base_speed * PUNISH_SPEED_MULT,
            Punishment::DamageBoost => self.damage = self.base_damage * PUNISH_DAMAGE_MULT,
            Punishment::Reflect => self.reflecting = true,
            Punishment::Split => {
                // Irreversible: the caller replaces this enemy with its children
                self.punishment_timer = 0;
                self.alive = false;
            }
        }
        log::debug!("{} enemy {} punished: {:?}", self.color.as_str(), self.id, chosen);
        Some(chosen)
    }

    /// Revert any temporary stat change from the active punishment
    pub fn end_punishment(&mut self) {
        match self.punishment.take() {
            Some(Punishment::SpeedBoost) => self.speed = self.base_speed,
            Some(Punishment::DamageBoost) => self.damage = self.base_damage,
            Some(Punishment::Reflect) => self.reflecting = false,
            Some(Punishment::Split) | None => {}
        }
        self.punishment_timer = 0;
    }

    /// The two weaker enemies produced by a split punishment
    pub fn split_children(&self, ids: [u64; 2], rng: &mut impl Rng) -> [Enemy; 2] {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let offset = Vec2::new(angle.cos(), angle.sin()) * self.radius * 0.6;
        let chase_a = rng.random_range(CHASE_FRAMES_MIN..=CHASE_FRAMES_MAX);
        let chase_b = rng.random_range(CHASE_FRAMES_MIN..=CHASE_FRAMES_MAX);
        [
            self.split_child(ids[0], self.pos + offset, chase_a),
            self.split_child(ids[1], self.pos - offset, chase_b),
        ]
    }

    fn split_child(&self, id: u64, pos: Vec2, chase_frames: u32) -> Enemy {
        let mut child = self.clone();
        child.id = id;
        child.pos = pos;
        child.radius = self.radius * 0.7;
        child.max_health = self.max_health * 0.5;
        child.health = child.max_health;
        child.points = (self.points / 2).max(1);
        child.base_speed = self.base_speed * 1.15;
        child.speed = child.base_speed;
        child.damage = child.base_damage;
        child.punishment = None;
        child.punishment_timer = 0;
        child.reflecting = false;
        child.wrong_hits = 0;
        child.can_split = false;
        child.contact_cooldown = 0;
        child.alive = true;
        child.rewarded = false;
        child.chained = false;
        child.state = BehaviorState::Chasing;
        child.state_timer = chase_frames;
        child
    }

    /// Refreshing a live burn extends it without restarting the tick phase
    pub fn apply_ignite(&mut self, damage_per_interval: f32, duration: u32) {
        if self.status.ignite_timer == 0 {
            self.status.ignite_clock = 0;
        }
        self.status.ignite_damage = damage_per_interval;
        self.status.ignite_timer = self.status.ignite_timer.max(duration);
    }

    pub fn apply_freeze(&mut self, duration: u32) {
        self.status.freeze_timer = self.status.freeze_timer.max(duration);
    }

    /// Strongest slow wins; duration refreshes
    pub fn apply_slow(&mut self, factor: f32, duration: u32) {
        if self.status.slow_timer == 0 || factor < self.status.slow_factor {
            self.status.slow_factor = factor;
        }
        self.status.slow_timer = self.status.slow_timer.max(duration);
    }

    pub fn apply_void(&mut self, duration: u32) {
        self.status.void_timer = self.status.void_timer.max(duration);
    }

    /// Advance one frame: timers, ignite, then (unless frozen) the state machine
    pub fn update(&mut self, player_pos: Vec2, rng: &mut impl Rng, spawns: &mut Vec<EnemySpawn>) -> EnemyTick {
        let mut result = EnemyTick::default();
        if !self.alive {
            return result;
        }

        self.age += 1;
        self.hit_flash = self.hit_flash.saturating_sub(1);
        self.contact_cooldown = self.contact_cooldown.saturating_sub(1);

        self.update_sentinel(rng);

        if self.punishment_timer > 0 {
            self.punishment_timer -= 1;
            if self.punishment_timer == 0 {
                self.end_punishment();
            }
        }

        self.status.void_timer = self.status.void_timer.saturating_sub(1);
        if self.status.slow_timer > 0 {
            self.status.slow_timer -= 1;
            if self.status.slow_timer == 0 {
                self.status.slow_factor = 1.0;
            }
        }

        if self.status.ignite_timer > 0 {
            self.status.ignite_timer -= 1;
            self.status.ignite_clock += 1;
            if self.status.ignite_clock % IGNITE_INTERVAL == 0 {
                self.health -= self.status.ignite_damage;
                self.hit_flash = 4;
                result.ignite_damage = self.status.ignite_damage;
                if self.health <= 0.0 {
                    self.alive = false;
                    result.killed = true;
                    return result;
                }
            }
        }

        if self.status.freeze_timer > 0 {
            self.status.freeze_timer -= 1;
            return result;
        }

        self.advance_state(player_pos, rng, spawns);
        result
    }

    fn update_sentinel(&mut self, rng: &mut impl Rng) {
        let Some(mut s) = self.sentinel else {
            return;
        };
        s.immune_timer = s.immune_timer.saturating_sub(1);
        s.rotate_timer = s.rotate_timer.saturating_sub(1);
        if s.rotate_timer == 0 {
            let others: Vec<Color> = Color::ALL.iter().copied().filter(|c| *c != self.color).collect();
            self.color = others[rng.random_range(0..others.len())];
            s.rotate_timer = SENTINEL_ROTATE_FRAMES;
            s.immune_timer = SENTINEL_IMMUNE_FRAMES;
        }
        self.sentinel = Some(s);
    }

    fn advance_state(&mut self, player_pos: Vec2, rng: &mut impl Rng, spawns: &mut Vec<EnemySpawn>) {
        let p = self.profile();
        match self.state {
            BehaviorState::Chasing => {
                let dir = self.chase_direction(player_pos, p.movement);
                self.pos += dir * self.current_speed();
                self.state_timer = self.state_timer.saturating_sub(1);
                if self.state_timer == 0 {
                    self.state = BehaviorState::Telegraphing;
                    self.state_timer = TELEGRAPH_FRAMES;
                    self.attack_target = player_pos;
                    self.attack_dir = direction_or(self.pos, player_pos, Vec2::X);
                }
            }
            BehaviorState::Telegraphing => {
                self.state_timer = self.state_timer.saturating_sub(1);
                if self.state_timer == 0 {
                    self.state = BehaviorState::Attacking;
                    self.state_timer = ATTACK_FRAMES;
                    if p.attack == AttackStyle::Zone {
                        spawns.push(EnemySpawn::Hazard(Hazard {
                            pos: self.attack_target,
                            radius: HAZARD_RADIUS,
                            fuse: HAZARD_FUSE_FRAMES,
                            damage: self.damage * 1.5,
                            color: self.color,
                            spent: false,
                        }));
                    }
                }
            }
            BehaviorState::Attacking => {
                let elapsed = ATTACK_FRAMES - self.state_timer;
                match p.attack {
                    AttackStyle::Dash => {
                        self.pos += self.attack_dir * self.current_speed() * DASH_ATTACK_MULT;
                    }
                    AttackStyle::Shot { slows_player } if elapsed == RANGED_RELEASE_FRAME => {
                        let dir = direction_or(self.pos, self.attack_target, self.attack_dir);
                        let mut shot = BulletSpec::hostile(
                            self.pos + dir * self.radius,
                            dir * HOSTILE_BULLET_SPEED,
                            self.color,
                            self.damage * 0.8,
                        );
                        shot.slows_player = slows_player;
                        spawns.push(EnemySpawn::Shot(shot));
                    }
                    _ => {}
                }
                self.state_timer = self.state_timer.saturating_sub(1);
                if self.state_timer == 0 {
                    self.state = BehaviorState::Chasing;
                    self.state_timer = rng.random_range(CHASE_FRAMES_MIN..=CHASE_FRAMES_MAX);
                }
            }
        }
    }

    fn chase_direction(&self, player_pos: Vec2, movement: MovementStyle) -> Vec2 {
        let to_player = direction_or(self.pos, player_pos, Vec2::ZERO);
        let perp = Vec2::new(-to_player.y, to_player.x);
        match movement {
            MovementStyle::Direct => to_player,
            MovementStyle::Strafe => {
                let wobble = (self.age as f32 * STRAFE_FREQUENCY + self.strafe_phase).sin();
                (to_player + perp * wobble * STRAFE_AMPLITUDE).normalize_or_zero()
            }
            MovementStyle::FleeOrbit => {
                let dist = self.pos.distance(player_pos);
                if dist < ORBIT_DISTANCE * 0.8 {
                    -to_player
                } else if dist < ORBIT_DISTANCE * 1.2 {
                    // Circle with a slight pull back toward the orbit ring
                    let radial = (dist - ORBIT_DISTANCE) / ORBIT_DISTANCE;
                    (perp * self.orbit_dir + to_player * radial).normalize_or_zero()
                } else {
                    to_player
                }
            }
        }
    }
}
