//! Chroma Rush - color-matching wave survival simulation core
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (entities, AI, collisions, waves, upgrades)
//! - `persistence`: Save snapshot serialization
//! - `settings`: Quality preset and simulation settings

pub mod persistence;
pub mod settings;
pub mod sim;

pub use persistence::SaveData;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
///
/// Every timer in the simulation is a frame count; velocities are pixels/frame.
pub mod consts {
    /// Simulation frames per second
    pub const FRAME_RATE: u32 = 60;

    /// Arena dimensions (origin top-left, +y down)
    pub const ARENA_WIDTH: f32 = 1280.0;
    pub const ARENA_HEIGHT: f32 = 720.0;
    /// Distance outside the arena edge where enemies appear
    pub const SPAWN_MARGIN: f32 = 40.0;
    /// Bullets further than this outside the arena are culled
    pub const CULL_MARGIN: f32 = 80.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 14.0;
    pub const PLAYER_BASE_HEALTH: f32 = 100.0;
    pub const PLAYER_BASE_SPEED: f32 = 4.0;
    pub const FIRE_COOLDOWN_FRAMES: u32 = 10;
    pub const DASH_FRAMES: u32 = 14;
    pub const DASH_SPEED: f32 = 12.0;
    pub const DASH_COOLDOWN_FRAMES: u32 = 60;
    /// Knockback velocity decay per frame
    pub const KNOCKBACK_DECAY: f32 = 0.85;
    pub const KNOCKBACK_IMPULSE: f32 = 9.0;

    /// Bullet defaults
    pub const BULLET_RADIUS: f32 = 5.0;
    pub const BULLET_SPEED: f32 = 11.0;
    pub const BULLET_DAMAGE: f32 = 12.0;
    pub const BULLET_LIFESPAN_FRAMES: u32 = 90;
    pub const HOSTILE_BULLET_SPEED: f32 = 4.5;
    pub const HOSTILE_BULLET_RADIUS: f32 = 6.0;
    /// Concurrent ricochet bullets, enforced independently of pool size
    pub const MAX_RICOCHET_BULLETS: usize = 40;

    /// Fragment pickups
    pub const FRAGMENT_RADIUS: f32 = 7.0;
    pub const FRAGMENT_LIFESPAN_FRAMES: u32 = 600;
    pub const FRAGMENT_ATTRACT_DELAY: u32 = 30;
    pub const FRAGMENT_ATTRACT_RADIUS: f32 = 140.0;
    pub const FRAGMENT_ATTRACT_LERP: f32 = 0.12;
    /// Fragments needed to bank one upgrade
    pub const FRAGMENTS_PER_UPGRADE: u32 = 10;

    /// Every Nth wave is a boss wave
    pub const BOSS_WAVE_INTERVAL: u32 = 5;
}

/// Unit vector pointing along `angle` (radians)
#[inline]
pub fn direction_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Whether a point lies inside the arena expanded by `margin`
#[inline]
pub fn in_arena(pos: Vec2, margin: f32) -> bool {
    pos.x >= -margin
        && pos.y >= -margin
        && pos.x <= consts::ARENA_WIDTH + margin
        && pos.y <= consts::ARENA_HEIGHT + margin
}
