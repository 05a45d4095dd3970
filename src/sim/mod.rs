//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one tick per frame)
//! - Seeded RNG only
//! - Stable iteration order (arena order for enemies, ids for pair passes)
//! - No rendering, audio, or platform dependencies

pub mod boss;
pub mod collision;
pub mod color;
pub mod effects;
pub mod enemy;
pub mod entities;
pub mod geometry;
pub mod player;
pub mod pool;
pub mod quadtree;
pub mod state;
pub mod store;
pub mod tick;
pub mod upgrades;
pub mod waves;

pub use boss::{Boss, BossState};
pub use color::Color;
pub use enemy::{BehaviorState, DamageOutcome, Enemy, EnemyKind, Punishment};
pub use entities::{Bullet, BulletSpec, Fragment, Hazard, Particle, SlowField, Vortex};
pub use player::{Modifiers, Player, PlayerControls};
pub use pool::{Handle, Pool, Poolable};
pub use quadtree::Quadtree;
pub use state::{
    FragmentKind, GameEvent, GameMode, GamePhase, GameSnapshot, GameState, RenderSnapshot,
};
pub use store::EntityStore;
pub use tick::{Command, TickInput, tick};
pub use upgrades::{UpgradeEngine, UpgradeId};
pub use waves::{SpawnRequest, WaveDirector, WaveSummary};
