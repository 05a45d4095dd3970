//! Entity store: owns every live entity collection plus the bullet and
//! particle pools and the per-tick spatial index

use glam::Vec2;
use rand::Rng;

use super::boss::Boss;
use super::color::Color;
use super::enemy::{Enemy, EnemyKind};
use super::entities::{Bullet, BulletSpec, Fragment, Hazard, Particle, SlowField, Vortex};
use super::geometry::Aabb;
use super::pool::{Handle, Pool};
use super::quadtree::Quadtree;
use crate::consts::*;
use crate::direction_from_angle;

/// Initial pool sizes; pools still grow on demand
pub const BULLET_POOL_PREALLOC: usize = 256;
pub const PARTICLE_POOL_PREALLOC: usize = 256;

#[derive(Debug, Clone)]
pub struct EntityStore {
    pub bullets: Pool<Bullet>,
    pub particles: Pool<Particle>,
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    pub fragments: Vec<Fragment>,
    pub hazards: Vec<Hazard>,
    pub slow_fields: Vec<SlowField>,
    pub vortices: Vec<Vortex>,
    /// Broad phase over `enemies` (payload = index)
    pub index: Quadtree<usize>,
    /// Live bullets spawned with ricochet charges, counted until they die
    pub ricochet_count: usize,
    pub max_particles: usize,
    pub trail_len: usize,
    next_id: u64,
}

impl EntityStore {
    pub fn new(max_particles: usize, trail_len: usize) -> Self {
        Self {
            bullets: Pool::with_capacity(BULLET_POOL_PREALLOC),
            particles: Pool::with_capacity(PARTICLE_POOL_PREALLOC.min(max_particles)),
            enemies: Vec::new(),
            boss: None,
            fragments: Vec::new(),
            hazards: Vec::new(),
            slow_fields: Vec::new(),
            vortices: Vec::new(),
            index: Quadtree::new(Aabb::new(0.0, 0.0, ARENA_WIDTH, ARENA_HEIGHT)),
            ricochet_count: 0,
            max_particles,
            trail_len,
            next_id: 1,
        }
    }

    /// Allocate a new enemy identity (monotonic, never reused)
    pub fn next_entity_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Launch a bullet. Ricochet bullets beyond the cap are silently dropped.
    pub fn spawn_bullet(&mut self, spec: &BulletSpec) -> Option<Handle> {
        let ricochet = spec.ricochets > 0;
        if ricochet && self.ricochet_count >= MAX_RICOCHET_BULLETS {
            return None;
        }
        let handle = self.bullets.get();
        let bullet = self.bullets.get_mut(handle)?;
        bullet.apply_spec(spec);
        if ricochet {
            bullet.counted_ricochet = true;
            self.ricochet_count += 1;
        }
        Some(handle)
    }

    pub fn spawn_enemy(
        &mut self,
        color: Color,
        kind: EnemyKind,
        pos: Vec2,
        wave: u32,
        rng: &mut impl Rng,
    ) -> u64 {
        let id = self.next_entity_id();
        self.enemies.push(Enemy::new(id, color, kind, pos, wave, rng));
        id
    }

    /// Replace a split enemy with its two children
    pub fn split_enemy(&mut self, index: usize, rng: &mut impl Rng) {
        let ids = [self.next_entity_id(), self.next_entity_id()];
        let Some(parent) = self.enemies.get(index) else {
            return;
        };
        let children = parent.split_children(ids, rng);
        self.enemies.extend(children);
    }

    pub fn spawn_fragment(&mut self, pos: Vec2, color: Option<Color>) {
        self.fragments.push(Fragment::new(pos, color));
    }

    /// Burst of particles; anything past the particle cap is dropped
    pub fn spawn_particles(&mut self, pos: Vec2, color: Option<Color>, count: usize, rng: &mut impl Rng) {
        for _ in 0..count {
            if self.particles_full() {
                return;
            }
            let h = self.particles.get();
            let Some(p) = self.particles.get_mut(h) else {
                return;
            };
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let speed = rng.random_range(1.0..4.0);
            let life = rng.random_range(15..35);
            p.pos = pos;
            p.vel = direction_from_angle(angle) * speed;
            p.color = color;
            p.life = life;
            p.max_life = life;
            p.size = rng.random_range(1.5..3.5);
        }
    }

    fn particles_full(&self) -> bool {
        self.particles.active_count() >= self.max_particles
    }

    pub fn alive_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.alive).count()
    }

    pub fn boss_alive(&self) -> bool {
        self.boss.as_ref().is_some_and(|b| b.alive)
    }

    pub fn fragments_remaining(&self) -> usize {
        self.fragments.iter().filter(|f| !f.collected && !f.is_expired()).count()
    }

    /// Rebuild the spatial index from living enemies
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, e) in self.enemies.iter().enumerate() {
            if e.alive {
                self.index.insert(Aabb::around_circle(e.pos, e.radius), i);
            }
        }
    }

    /// Nearest living enemy to `pos`, optionally skipping some identities
    pub fn nearest_enemy(&self, pos: Vec2, max_dist: f32, skip: &[u64]) -> Option<usize> {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive && !skip.contains(&e.id))
            .map(|(i, e)| (i, e.pos.distance_squared(pos)))
            .filter(|(_, d2)| *d2 <= max_dist * max_dist)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Release spent pooled objects and drop dead entities
    pub fn cleanup(&mut self) {
        for h in self.bullets.active_handles() {
            let Some(b) = self.bullets.get_ref(h) else {
                continue;
            };
            if !b.alive {
                if b.counted_ricochet {
                    self.ricochet_count = self.ricochet_count.saturating_sub(1);
                }
                self.bullets.release(h);
            }
        }
        for h in self.particles.active_handles() {
            if self.particles.get_ref(h).is_some_and(Particle::is_dead) {
                self.particles.release(h);
            }
        }

        self.enemies.retain(|e| e.alive);
        if self.boss.as_ref().is_some_and(|b| !b.alive) {
            self.boss = None;
        }
        self.fragments.retain(|f| !f.collected && !f.is_expired());
        self.hazards.retain(|h| !h.spent);
        self.slow_fields.retain(|f| f.life > 0);
        self.vortices.retain(|v| v.life > 0);
    }

    /// Remove every entity (wave start / sandbox clear)
    pub fn clear(&mut self) {
        self.bullets.release_all();
        self.particles.release_all();
        self.ricochet_count = 0;
        self.enemies.clear();
        self.boss = None;
        self.fragments.clear();
        self.hazards.clear();
        self.slow_fields.clear();
        self.vortices.clear();
        self.index.clear();
    }

    pub fn clear_enemies(&mut self) {
        self.enemies.clear();
        self.boss = None;
        self.index.clear();
    }

    pub fn clear_bullets(&mut self) {
        self.bullets.release_all();
        self.ricochet_count = 0;
    }
}
