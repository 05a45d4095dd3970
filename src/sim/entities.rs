//! Lightweight simulation entities: bullets, fragments, particles, and the
//! ambient area effects (hazard zones, slow fields, vortices)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::geometry::lerp_vec;
use super::pool::Poolable;
use crate::consts::*;
use crate::in_arena;

/// Maximum trail points stored per bullet (quality preset may render fewer)
pub const TRAIL_LENGTH: usize = 8;

/// Homing steering strength (fraction of velocity turned per frame)
const HOMING_TURN: f32 = 0.12;

/// Everything needed to launch a bullet from the pool
#[derive(Debug, Clone)]
pub struct BulletSpec {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Color,
    pub damage: f32,
    pub lifespan: u32,
    pub penetrations: u32,
    pub ricochets: u32,
    pub homing: bool,
    pub slowing: bool,
    pub fission: bool,
    pub void: bool,
    pub area_orb: bool,
    pub hostile: bool,
    pub slows_player: bool,
    /// Enemies this bullet must never hit (fission children skip their parent's target)
    pub ignore: Vec<u64>,
}

impl Default for BulletSpec {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BULLET_RADIUS,
            color: Color::Red,
            damage: BULLET_DAMAGE,
            lifespan: BULLET_LIFESPAN_FRAMES,
            penetrations: 0,
            ricochets: 0,
            homing: false,
            slowing: false,
            fission: false,
            void: false,
            area_orb: false,
            hostile: false,
            slows_player: false,
            ignore: Vec::new(),
        }
    }
}

impl BulletSpec {
    /// Projectile fired by an enemy or the boss
    pub fn hostile(pos: Vec2, vel: Vec2, color: Color, damage: f32) -> Self {
        Self {
            pos,
            vel,
            radius: HOSTILE_BULLET_RADIUS,
            color,
            damage,
            lifespan: 240,
            hostile: true,
            ..Default::default()
        }
    }
}

/// Snapshot of the bullet fields the hit pipeline needs after the bullet
/// itself is no longer borrowed
#[derive(Debug, Clone, Copy)]
pub struct ShotInfo {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Color,
    pub damage: f32,
    pub slowing: bool,
    pub fission: bool,
    pub void: bool,
    pub area_orb: bool,
}

/// A pooled projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    /// Slot is checked out of the pool
    #[serde(skip)]
    pub in_use: bool,
    /// Still flying; cleared on impact/expiry and released at end of tick
    pub alive: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub color: Color,
    pub damage: f32,
    pub life: u32,
    pub penetrations_left: u32,
    pub ricochets_left: u32,
    /// Counts against the ricochet cap for as long as it is alive
    pub counted_ricochet: bool,
    pub homing: bool,
    pub slowing: bool,
    pub fission: bool,
    pub void: bool,
    pub area_orb: bool,
    pub hostile: bool,
    pub slows_player: bool,
    /// Enemy identities already hit by this pass
    pub hit_enemies: Vec<u64>,
    #[serde(skip)]
    pub trail: Vec<Vec2>,
}

impl Default for Bullet {
    fn default() -> Self {
        Self {
            in_use: true,
            alive: true,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BULLET_RADIUS,
            color: Color::Red,
            damage: BULLET_DAMAGE,
            life: BULLET_LIFESPAN_FRAMES,
            penetrations_left: 0,
            ricochets_left: 0,
            counted_ricochet: false,
            homing: false,
            slowing: false,
            fission: false,
            void: false,
            area_orb: false,
            hostile: false,
            slows_player: false,
            hit_enemies: Vec::new(),
            trail: Vec::with_capacity(TRAIL_LENGTH),
        }
    }
}

impl Poolable for Bullet {
    fn reset(&mut self) {
        // Keep the allocations, drop the contents
        let mut hit_enemies = std::mem::take(&mut self.hit_enemies);
        let mut trail = std::mem::take(&mut self.trail);
        hit_enemies.clear();
        trail.clear();
        *self = Self {
            hit_enemies,
            trail,
            ..Self::default()
        };
    }

    fn is_active(&self) -> bool {
        self.in_use
    }

    fn deactivate(&mut self) {
        self.in_use = false;
        self.alive = false;
    }
}

impl Bullet {
    pub fn apply_spec(&mut self, spec: &BulletSpec) {
        self.pos = spec.pos;
        self.vel = spec.vel;
        self.radius = spec.radius;
        self.color = spec.color;
        self.damage = spec.damage;
        self.life = spec.lifespan;
        self.penetrations_left = spec.penetrations;
        self.ricochets_left = spec.ricochets;
        self.homing = spec.homing;
        self.slowing = spec.slowing;
        self.fission = spec.fission;
        self.void = spec.void;
        self.area_orb = spec.area_orb;
        self.hostile = spec.hostile;
        self.slows_player = spec.slows_player;
        self.hit_enemies.extend_from_slice(&spec.ignore);
    }

    pub fn shot_info(&self) -> ShotInfo {
        ShotInfo {
            pos: self.pos,
            vel: self.vel,
            color: self.color,
            damage: self.damage,
            slowing: self.slowing,
            fission: self.fission,
            void: self.void,
            area_orb: self.area_orb,
        }
    }

    /// Advance one frame. `homing_target` steers homing bullets.
    pub fn update(&mut self, homing_target: Option<Vec2>, trail_len: usize) {
        if !self.alive {
            return;
        }

        if trail_len > 0 {
            self.trail.insert(0, self.pos);
            self.trail.truncate(trail_len.min(TRAIL_LENGTH));
        }

        if self.homing {
            if let Some(target) = homing_target {
                let speed = self.vel.length();
                let desired = (target - self.pos).normalize_or_zero() * speed;
                self.vel = lerp_vec(self.vel, desired, HOMING_TURN)
                    .normalize_or_zero()
                    * speed;
            }
        }

        self.pos += self.vel;
        self.life = self.life.saturating_sub(1);

        if self.life == 0 || !in_arena(self.pos, CULL_MARGIN) {
            self.alive = false;
        }
    }
}

/// Pickup dropped when an enemy or boss dies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub pos: Vec2,
    /// `None` marks a special (boss) fragment
    pub color: Option<Color>,
    pub life: u32,
    pub age: u32,
    pub collected: bool,
}

impl Fragment {
    pub fn new(pos: Vec2, color: Option<Color>) -> Self {
        Self {
            pos,
            color,
            life: FRAGMENT_LIFESPAN_FRAMES,
            age: 0,
            collected: false,
        }
    }

    /// Age the fragment and pull it toward the player once the pickup delay
    /// has passed and the player is within `attract_radius`
    pub fn update(&mut self, player_pos: Vec2, attract_radius: f32) {
        self.age += 1;
        self.life = self.life.saturating_sub(1);
        if self.age >= FRAGMENT_ATTRACT_DELAY && self.pos.distance(player_pos) < attract_radius {
            self.pos = lerp_vec(self.pos, player_pos, FRAGMENT_ATTRACT_LERP);
        }
    }

    pub fn is_expired(&self) -> bool {
        self.life == 0
    }
}

/// A pooled visual particle (not gameplay-affecting)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    #[serde(skip)]
    pub in_use: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: Option<Color>,
    pub life: u32,
    pub max_life: u32,
    pub size: f32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            in_use: true,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            color: None,
            life: 0,
            max_life: 1,
            size: 2.0,
        }
    }
}

impl Poolable for Particle {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn is_active(&self) -> bool {
        self.in_use
    }

    fn deactivate(&mut self) {
        self.in_use = false;
    }
}

impl Particle {
    pub fn update(&mut self) {
        self.pos += self.vel;
        self.vel *= 0.94;
        self.life = self.life.saturating_sub(1);
        self.size *= 0.98;
    }

    pub fn is_dead(&self) -> bool {
        self.life == 0
    }

    /// Remaining life in 0..=1 (for fading)
    pub fn fade(&self) -> f32 {
        self.life as f32 / self.max_life.max(1) as f32
    }
}

/// Enemy-placed zone that detonates once its fuse runs out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub pos: Vec2,
    pub radius: f32,
    pub fuse: u32,
    pub damage: f32,
    pub color: Color,
    pub spent: bool,
}

impl Hazard {
    pub fn update(&mut self) {
        self.fuse = self.fuse.saturating_sub(1);
    }

    /// Ready to be resolved against the player this tick
    pub fn is_detonating(&self) -> bool {
        self.fuse == 0 && !self.spent
    }
}

/// Player-created field that slows enemies inside it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlowField {
    pub pos: Vec2,
    pub radius: f32,
    pub factor: f32,
    pub life: u32,
}

/// Damage-free attractor pulling enemies toward its center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vortex {
    pub pos: Vec2,
    pub radius: f32,
    pub strength: f32,
    pub life: u32,
}

impl Vortex {
    /// Per-frame pull applied to something at `pos` (zero outside the radius)
    pub fn pull(&self, pos: Vec2) -> Vec2 {
        let to_center = self.pos - pos;
        let dist = to_center.length();
        if dist >= self.radius || dist < 1e-3 {
            return Vec2::ZERO;
        }
        let falloff = 1.0 - dist / self.radius;
        // Never overshoot the center
        to_center.normalize() * (self.strength * falloff).min(dist)
    }
}
