//! Boss entity: reposition state machine plus two independent timers
//! (color rotation and radial burst attack)

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::enemy::DamageOutcome;
use super::entities::BulletSpec;
use super::geometry::lerp_vec;
use crate::consts::*;
use crate::direction_from_angle;

pub const BOSS_RADIUS: f32 = 56.0;
pub const BOSS_BASE_HEALTH: f32 = 400.0;
pub const BOSS_HEALTH_PER_INDEX: f32 = 150.0;
pub const BOSS_IDLE_FRAMES: u32 = 90;
pub const BOSS_TELEGRAPH_FRAMES: u32 = 45;
/// Fraction of the remaining distance covered per frame while moving
pub const BOSS_MOVE_LERP: f32 = 0.04;
pub const BOSS_ARRIVE_EPSILON: f32 = 2.0;
pub const BOSS_COLOR_FRAMES: u32 = 240;
pub const BOSS_ATTACK_FRAMES: u32 = 100;
pub const BOSS_BURST_COUNT: u32 = 16;
pub const BOSS_SHOT_SPEED: f32 = 3.5;
pub const BOSS_SHOT_DAMAGE: f32 = 10.0;
pub const BOSS_CONTACT_DAMAGE: f32 = 25.0;
/// Keep-out padding from the arena edges when picking a move target
pub const BOSS_PADDING: f32 = 100.0;
/// Move targets stay in the top part of the arena
pub const BOSS_REGION_HEIGHT: f32 = ARENA_HEIGHT * 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossState {
    Idle,
    TelegraphMove,
    Move,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: Color,
    pub state: BossState,
    pub state_timer: u32,
    pub target: Vec2,
    pub color_timer: u32,
    pub attack_timer: u32,
    /// 1 for the first boss, 2 for the second, ...
    pub index: u32,
    pub alive: bool,
    pub rewarded: bool,
    pub hit_flash: u32,
}

impl Boss {
    pub fn new(pos: Vec2, index: u32, rng: &mut impl Rng) -> Self {
        let health = BOSS_BASE_HEALTH + BOSS_HEALTH_PER_INDEX * index.saturating_sub(1) as f32;
        Self {
            pos,
            radius: BOSS_RADIUS,
            health,
            max_health: health,
            color: Color::PRIMARIES[rng.random_range(0..Color::PRIMARIES.len())],
            state: BossState::Idle,
            state_timer: BOSS_IDLE_FRAMES,
            target: pos,
            color_timer: BOSS_COLOR_FRAMES,
            attack_timer: BOSS_ATTACK_FRAMES,
            index,
            alive: true,
            rewarded: false,
            hit_flash: 0,
        }
    }

    /// Only the exact current color hurts the boss
    pub fn take_damage(&mut self, amount: f32, color: Color) -> DamageOutcome {
        if !self.alive || color != self.color {
            return DamageOutcome::miss();
        }
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

    /// Advance one frame; radial bursts are appended to `shots`
    pub fn update(&mut self, rng: &mut impl Rng, shots: &mut Vec<BulletSpec>) {
        if !self.alive {
            return;
        }
        self.hit_flash = self.hit_flash.saturating_sub(1);

        match self.state {
            BossState::Idle => {
                self.state_timer = self.state_timer.saturating_sub(1);
                if self.state_timer == 0 {
                    self.state = BossState::TelegraphMove;
                    self.state_timer = BOSS_TELEGRAPH_FRAMES;
                    self.target = Vec2::new(
                        rng.random_range(BOSS_PADDING..ARENA_WIDTH - BOSS_PADDING),
                        rng.random_range(BOSS_PADDING..BOSS_REGION_HEIGHT),
                    );
                }
            }
            BossState::TelegraphMove => {
                self.state_timer = self.state_timer.saturating_sub(1);
                if self.state_timer == 0 {
                    self.state = BossState::Move;
                }
            }
            BossState::Move => {
                self.pos = lerp_vec(self.pos, self.target, BOSS_MOVE_LERP);
                if self.pos.distance(self.target) < BOSS_ARRIVE_EPSILON {
                    self.pos = self.target;
                    self.state = BossState::Idle;
                    self.state_timer = BOSS_IDLE_FRAMES;
                }
            }
        }

        self.color_timer = self.color_timer.saturating_sub(1);
        if self.color_timer == 0 {
            let others: Vec<Color> = Color::PRIMARIES
                .iter()
                .copied()
                .filter(|c| *c != self.color)
                .collect();
            self.color = others[rng.random_range(0..others.len())];
            self.color_timer = BOSS_COLOR_FRAMES;
        }

        self.attack_timer = self.attack_timer.saturating_sub(1);
        if self.attack_timer == 0 {
            self.attack_timer = BOSS_ATTACK_FRAMES;
            let step = std::f32::consts::TAU / BOSS_BURST_COUNT as f32;
            for i in 0..BOSS_BURST_COUNT {
                let dir = direction_from_angle(step * i as f32);
                shots.push(BulletSpec::hostile(
                    self.pos + dir * self.radius,
                    dir * BOSS_SHOT_SPEED,
                    self.color,
                    BOSS_SHOT_DAMAGE,
                ));
            }
        }
    }
}
