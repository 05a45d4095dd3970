//! Player combat state: movement, dashing, firing, color selection, and the
//! derived modifier table written by the upgrade engine

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::entities::BulletSpec;
use crate::consts::*;
use crate::direction_from_angle;

/// Frames of holding fire needed to release a charged (orange) orb
pub const CHARGE_FRAMES: u32 = 40;
pub const ORB_RADIUS: f32 = 11.0;
pub const ORB_DAMAGE_MULT: f32 = 2.5;
/// Invulnerability after taking a hit
pub const HIT_INVULN_FRAMES: u32 = 20;
pub const HOSTILE_SLOW_FRAMES: u32 = 90;
pub const HOSTILE_SLOW_FACTOR: f32 = 0.5;
/// Adrenaline kicks in below this health fraction
pub const ADRENALINE_THRESHOLD: f32 = 0.35;
/// Kinetic shield recharge is this many frames divided by its level
pub const SHIELD_RECHARGE_FRAMES: u32 = 600;
/// Ineffective hits needed to fill the punishment-reversal meter
pub const PUNISHMENT_METER_MAX: u32 = 5;

/// Derived player modifiers. Never patched incrementally: the upgrade
/// engine resets this to `Default` and re-applies every acquired upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub speed_mult: f32,
    pub damage_mult: f32,
    /// Multiplies the fire cooldown (lower is faster)
    pub cooldown_mult: f32,
    /// Max random aim deviation (radians)
    pub spread: f32,
    pub bullet_speed_mult: f32,
    pub max_health_bonus: f32,
    /// Fraction of dealt damage returned as health
    pub lifesteal: f32,
    /// Flat reduction applied to every incoming hit
    pub damage_reduction: f32,
    pub magnet_mult: f32,
    pub dash_cooldown_mult: f32,
    pub chain_level: u32,
    pub ignite_level: u32,
    pub freeze_level: u32,
    pub penetration_level: u32,
    pub ricochet_level: u32,
    pub gravity_well_level: u32,
    pub slow_trail_level: u32,
    pub fission_level: u32,
    pub void_level: u32,
    pub dash_damage_level: u32,
    pub explosive_finish_chance: f32,
    pub fragment_duplication_chance: f32,
    pub adrenaline_level: u32,
    pub kinetic_shield_level: u32,
    pub punishment_reversal_level: u32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            speed_mult: 1.0,
            damage_mult: 1.0,
            cooldown_mult: 1.0,
            spread: 0.06,
            bullet_speed_mult: 1.0,
            max_health_bonus: 0.0,
            lifesteal: 0.0,
            damage_reduction: 0.0,
            magnet_mult: 1.0,
            dash_cooldown_mult: 1.0,
            chain_level: 0,
            ignite_level: 0,
            freeze_level: 0,
            penetration_level: 0,
            ricochet_level: 0,
            gravity_well_level: 0,
            slow_trail_level: 0,
            fission_level: 0,
            void_level: 0,
            dash_damage_level: 0,
            explosive_finish_chance: 0.0,
            fragment_duplication_chance: 0.0,
            adrenaline_level: 0,
            kinetic_shield_level: 0,
            punishment_reversal_level: 0,
        }
    }
}

/// Per-tick player controls (already resolved from raw input)
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerControls {
    pub movement: Vec2,
    pub aim: Vec2,
    pub fire: bool,
    pub dash: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: Color,
    pub mods: Modifiers,
    pub aim: Vec2,
    pub fire_cooldown: u32,
    pub dash_timer: u32,
    pub dash_cooldown: u32,
    pub dash_dir: Vec2,
    /// Enemies already struck during the current dash
    pub dash_hits: Vec<u64>,
    /// Orange charge progress (frames)
    pub charge: u32,
    pub knockback: Vec2,
    pub slow_timer: u32,
    pub invuln_timer: u32,
    /// Frames until the kinetic shield is ready (0 = ready)
    pub shield_cooldown: u32,
    pub punishment_meter: u32,
    pub pickup_flash: u32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT / 2.0),
            radius: PLAYER_RADIUS,
            health: PLAYER_BASE_HEALTH,
            max_health: PLAYER_BASE_HEALTH,
            color: Color::Red,
            mods: Modifiers::default(),
            aim: Vec2::new(ARENA_WIDTH / 2.0, 0.0),
            fire_cooldown: 0,
            dash_timer: 0,
            dash_cooldown: 0,
            dash_dir: Vec2::X,
            dash_hits: Vec::new(),
            charge: 0,
            knockback: Vec2::ZERO,
            slow_timer: 0,
            invuln_timer: 0,
            shield_cooldown: 0,
            punishment_meter: 0,
            pickup_flash: 0,
        }
    }

    pub fn is_dashing(&self) -> bool {
        self.dash_timer > 0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Colors the player may switch to right now. A selected secondary locks
    /// out its two primary components until another color is chosen.
    pub fn selectable_colors(&self) -> Vec<Color> {
        let locked = self.color.components();
        Color::ALL
            .iter()
            .copied()
            .filter(|c| locked.is_none_or(|(a, b)| *c != a && *c != b))
            .collect()
    }

    pub fn can_select(&self, color: Color) -> bool {
        self.selectable_colors().contains(&color)
    }

    /// Returns false (no-op) if the color is not currently selectable
    pub fn select_color(&mut self, color: Color) -> bool {
        if color == self.color || !self.can_select(color) {
            return false;
        }
        self.color = color;
        self.charge = 0;
        true
    }

    /// Step forward (`dir > 0`) or backward through the selectable colors
    pub fn cycle_color(&mut self, dir: i32) {
        let all = Color::ALL;
        let Some(start) = all.iter().position(|c| *c == self.color) else {
            return;
        };
        let n = all.len() as i32;
        let step = if dir >= 0 { 1 } else { -1 };
        for i in 1..n {
            let idx = (start as i32 + step * i).rem_euclid(n) as usize;
            if self.select_color(all[idx]) {
                return;
            }
        }
    }

    fn adrenaline_active(&self) -> bool {
        self.mods.adrenaline_level > 0 && self.health < self.max_health * ADRENALINE_THRESHOLD
    }

    fn adrenaline_bonus(&self) -> f32 {
        if self.adrenaline_active() {
            1.0 + 0.1 * self.mods.adrenaline_level as f32
        } else {
            1.0
        }
    }

    pub fn move_speed(&self) -> f32 {
        let mut speed = PLAYER_BASE_SPEED * self.mods.speed_mult * self.adrenaline_bonus();
        if self.slow_timer > 0 {
            speed *= HOSTILE_SLOW_FACTOR;
        }
        speed
    }

    pub fn fire_cooldown_frames(&self) -> u32 {
        let frames = FIRE_COOLDOWN_FRAMES as f32 * self.mods.cooldown_mult / self.adrenaline_bonus();
        frames.round().max(2.0) as u32
    }

    /// Pickup radius for fragments
    pub fn attract_radius(&self) -> f32 {
        FRAGMENT_ATTRACT_RADIUS * self.mods.magnet_mult
    }

    /// Advance movement, timers, dash, and firing. New bullets go to `shots`.
    pub fn update(&mut self, controls: &PlayerControls, rng: &mut impl Rng, shots: &mut Vec<BulletSpec>) {
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        self.dash_cooldown = self.dash_cooldown.saturating_sub(1);
        self.slow_timer = self.slow_timer.saturating_sub(1);
        self.invuln_timer = self.invuln_timer.saturating_sub(1);
        self.shield_cooldown = self.shield_cooldown.saturating_sub(1);
        self.pickup_flash = self.pickup_flash.saturating_sub(1);
        self.aim = controls.aim;

        let move_dir = controls.movement.normalize_or_zero();

        if controls.dash && self.dash_timer == 0 && self.dash_cooldown == 0 {
            let dir = if move_dir != Vec2::ZERO {
                move_dir
            } else {
                (self.aim - self.pos).normalize_or(Vec2::X)
            };
            self.dash_dir = dir;
            self.dash_timer = DASH_FRAMES;
            self.dash_cooldown =
                (DASH_COOLDOWN_FRAMES as f32 * self.mods.dash_cooldown_mult).round() as u32;
            self.dash_hits.clear();
        }

        if self.dash_timer > 0 {
            self.dash_timer -= 1;
            self.pos += self.dash_dir * DASH_SPEED;
        } else {
            self.pos += move_dir * self.move_speed();
        }

        self.pos += self.knockback;
        self.knockback *= KNOCKBACK_DECAY;
        if self.knockback.length_squared() < 0.01 {
            self.knockback = Vec2::ZERO;
        }

        self.pos.x = self.pos.x.clamp(self.radius, ARENA_WIDTH - self.radius);
        self.pos.y = self.pos.y.clamp(self.radius, ARENA_HEIGHT - self.radius);

        self.update_firing(controls.fire, rng, shots);
    }

    fn update_firing(&mut self, fire: bool, rng: &mut impl Rng, shots: &mut Vec<BulletSpec>) {
        if self.color == Color::Orange {
            if !fire {
                self.charge = 0;
                return;
            }
            self.charge += 1;
            if self.charge >= CHARGE_FRAMES {
                self.charge = 0;
                let mut spec = self.bullet_spec(rng);
                spec.radius = ORB_RADIUS;
                spec.damage *= ORB_DAMAGE_MULT;
                spec.area_orb = true;
                shots.push(spec);
            }
            return;
        }

        if fire && self.fire_cooldown == 0 {
            self.fire_cooldown = self.fire_cooldown_frames();
            shots.push(self.bullet_spec(rng));
        }
    }

    /// Bullet aimed at the cursor with spread, flagged from color and levels
    fn bullet_spec(&self, rng: &mut impl Rng) -> BulletSpec {
        let m = &self.mods;
        let base = (self.aim - self.pos).normalize_or(Vec2::X);
        let jitter = if m.spread > 0.0 {
            rng.random_range(-m.spread..=m.spread)
        } else {
            0.0
        };
        let dir = direction_from_angle(base.y.atan2(base.x) + jitter);
        let secondary = !self.color.is_primary();

        BulletSpec {
            pos: self.pos + dir * (self.radius + BULLET_RADIUS),
            vel: dir * BULLET_SPEED * m.bullet_speed_mult,
            color: self.color,
            damage: BULLET_DAMAGE * m.damage_mult,
            penetrations: m.penetration_level,
            ricochets: m.ricochet_level,
            void: self.color == Color::Purple && m.void_level > 0,
            slowing: self.color == Color::Green && m.slow_trail_level > 0,
            fission: secondary && m.fission_level > 0,
            ..Default::default()
        }
    }

    /// Apply incoming damage. Returns true if health was actually reduced.
    pub fn take_hit(&mut self, amount: f32) -> bool {
        if self.is_dashing() || self.invuln_timer > 0 {
            return false;
        }
        if self.mods.kinetic_shield_level > 0 && self.shield_cooldown == 0 {
            self.shield_cooldown = SHIELD_RECHARGE_FRAMES / self.mods.kinetic_shield_level;
            self.invuln_timer = HIT_INVULN_FRAMES;
            return false;
        }
        let dealt = (amount - self.mods.damage_reduction).max(1.0);
        self.health -= dealt;
        self.invuln_timer = HIT_INVULN_FRAMES;
        true
    }

    pub fn apply_knockback(&mut self, from: Vec2, impulse: f32) {
        let dir = (self.pos - from).normalize_or(Vec2::Y);
        self.knockback = dir * impulse;
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Count an ineffective hit toward the punishment-reversal meter
    pub fn add_punishment_charge(&mut self) {
        if self.mods.punishment_reversal_level > 0 {
            self.punishment_meter = (self.punishment_meter + 1).min(PUNISHMENT_METER_MAX);
        }
    }

    /// Consume a full meter. Returns the damage multiplier for this hit.
    pub fn consume_reversal(&mut self) -> Option<f32> {
        if self.mods.punishment_reversal_level == 0 || self.punishment_meter < PUNISHMENT_METER_MAX {
            return None;
        }
        self.punishment_meter = 0;
        Some(1.5 + 0.25 * self.mods.punishment_reversal_level as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(11)
    }

    #[test]
    fn test_secondary_locks_its_components() {
        let mut p = Player::new();
        assert!(p.select_color(Color::Purple));
        let sel = p.selectable_colors();
        assert!(!sel.contains(&Color::Red));
        assert!(!sel.contains(&Color::Blue));
        assert!(sel.contains(&Color::Yellow));
        assert!(!p.select_color(Color::Red));
        assert_eq!(p.color, Color::Purple);

        // Switching away unlocks them again
        assert!(p.select_color(Color::Yellow));
        assert!(p.select_color(Color::Red));
    }

    #[test]
    fn test_cycle_skips_locked_colors() {
        let mut p = Player::new();
        p.color = Color::Green;
        // Green locks Blue and Yellow; cycling forward wraps to Orange then Red
        p.cycle_color(1);
        assert_eq!(p.color, Color::Orange);
        p.color = Color::Green;
        p.cycle_color(-1);
        assert_eq!(p.color, Color::Purple);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut r = rng();
        let mut p = Player::new();
        let controls = PlayerControls {
            aim: Vec2::new(1000.0, 360.0),
            fire: true,
            ..Default::default()
        };
        let mut shots = Vec::new();
        p.update(&controls, &mut r, &mut shots);
        assert_eq!(shots.len(), 1);
        for _ in 0..FIRE_COOLDOWN_FRAMES - 1 {
            p.update(&controls, &mut r, &mut shots);
        }
        assert_eq!(shots.len(), 1);
        p.update(&controls, &mut r, &mut shots);
        assert_eq!(shots.len(), 2);
        assert!(shots[0].vel.x > 0.0);
        assert_eq!(shots[0].damage, BULLET_DAMAGE);
    }

    #[test]
    fn test_orange_charges_orb() {
        let mut r = rng();
        let mut p = Player::new();
        p.color = Color::Orange;
        let controls = PlayerControls {
            fire: true,
            ..Default::default()
        };
        let mut shots = Vec::new();
        for _ in 0..CHARGE_FRAMES - 1 {
            p.update(&controls, &mut r, &mut shots);
        }
        assert!(shots.is_empty());
        p.update(&controls, &mut r, &mut shots);
        assert_eq!(shots.len(), 1);
        assert!(shots[0].area_orb);
    }

    #[test]
    fn test_releasing_fire_resets_charge() {
        let mut r = rng();
        let mut p = Player::new();
        p.color = Color::Orange;
        let hold = PlayerControls {
            fire: true,
            ..Default::default()
        };
        for _ in 0..10 {
            p.update(&hold, &mut r, &mut Vec::new());
        }
        assert_eq!(p.charge, 10);
        p.update(&PlayerControls::default(), &mut r, &mut Vec::new());
        assert_eq!(p.charge, 0);
    }

    #[test]
    fn test_dash_grants_immunity_and_clears_hits() {
        let mut r = rng();
        let mut p = Player::new();
        p.dash_hits.push(99);
        let controls = PlayerControls {
            movement: Vec2::X,
            dash: true,
            ..Default::default()
        };
        let start = p.pos;
        p.update(&controls, &mut r, &mut Vec::new());
        assert!(p.is_dashing());
        assert!(p.dash_hits.is_empty());
        assert!((p.pos.x - start.x - DASH_SPEED).abs() < 1e-4);
        assert!(!p.take_hit(50.0));
        assert_eq!(p.health, PLAYER_BASE_HEALTH);
    }

    #[test]
    fn test_damage_reduction_floor() {
        let mut p = Player::new();
        p.mods.damage_reduction = 10.0;
        assert!(p.take_hit(4.0));
        assert_eq!(p.health, PLAYER_BASE_HEALTH - 1.0);
    }

    #[test]
    fn test_kinetic_shield_absorbs_one_hit() {
        let mut p = Player::new();
        p.mods.kinetic_shield_level = 2;
        assert!(!p.take_hit(30.0));
        assert_eq!(p.shield_cooldown, SHIELD_RECHARGE_FRAMES / 2);
        p.invuln_timer = 0;
        assert!(p.take_hit(30.0));
        assert_eq!(p.health, PLAYER_BASE_HEALTH - 30.0);
    }

    #[test]
    fn test_reversal_meter() {
        let mut p = Player::new();
        for _ in 0..PUNISHMENT_METER_MAX {
            p.add_punishment_charge();
        }
        // No level: meter never fills
        assert_eq!(p.consume_reversal(), None);

        p.mods.punishment_reversal_level = 1;
        for _ in 0..PUNISHMENT_METER_MAX {
            p.add_punishment_charge();
        }
        assert_eq!(p.consume_reversal(), Some(1.75));
        assert_eq!(p.punishment_meter, 0);
    }

    #[test]
    fn test_position_clamped_to_arena() {
        let mut r = rng();
        let mut p = Player::new();
        p.pos = Vec2::new(ARENA_WIDTH - 1.0, 5.0);
        p.update(
            &PlayerControls {
                movement: Vec2::new(1.0, -1.0),
                ..Default::default()
            },
            &mut r,
            &mut Vec::new(),
        );
        assert_eq!(p.pos, Vec2::new(ARENA_WIDTH - PLAYER_RADIUS, PLAYER_RADIUS));
    }
}
