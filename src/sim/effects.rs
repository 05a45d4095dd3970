//! Ambient area effects and the on-hit special-effect pipeline
//!
//! Every function here works on the [`EntityStore`] arena and returns the
//! indices of enemies it killed; score, fragments, and other kill rewards
//! are handed out by the caller.

use glam::Vec2;
use rand::Rng;

use super::color::Color;
use super::entities::{BulletSpec, ShotInfo, SlowField, Vortex};
use super::geometry::circles_overlap;
use super::player::Modifiers;
use super::store::EntityStore;
use crate::direction_from_angle;

/// Slow fields refresh their slow on enemies inside every frame
const SLOW_REFRESH_FRAMES: u32 = 2;
const SLOW_FIELD_FACTOR: f32 = 0.5;
const VORTEX_LIFE_FRAMES: u32 = 150;
/// Fission children deal this fraction of the parent bullet's damage
const FISSION_DAMAGE_MULT: f32 = 0.5;

pub fn void_duration(level: u32) -> u32 {
    120 + 60 * level
}

pub fn ignite_damage(level: u32) -> f32 {
    3.0 + 2.0 * level as f32
}

pub fn ignite_duration(level: u32) -> u32 {
    120 + 30 * level
}

pub fn freeze_duration(level: u32) -> u32 {
    45 + 15 * level
}

pub fn chain_hops(level: u32) -> u32 {
    1 + level
}

pub fn chain_range(level: u32) -> f32 {
    140.0 + 20.0 * level as f32
}

pub fn chain_damage(level: u32) -> f32 {
    6.0 + 4.0 * level as f32
}

pub fn fission_chance(level: u32) -> f64 {
    (0.1 + 0.1 * level as f64).min(1.0)
}

pub fn slow_field(pos: Vec2, level: u32) -> SlowField {
    SlowField {
        pos,
        radius: 60.0 + 15.0 * level as f32,
        factor: SLOW_FIELD_FACTOR,
        life: 120 + 30 * level,
    }
}

pub fn vortex(pos: Vec2, level: u32) -> Vortex {
    Vortex {
        pos,
        radius: 100.0 + 20.0 * level as f32,
        strength: 1.2 + 0.4 * level as f32,
        life: VORTEX_LIFE_FRAMES,
    }
}

/// Advance slow fields, vortices, hazard fuses, and particles by one frame
pub fn update_ambient(store: &mut EntityStore) {
    for field in &mut store.slow_fields {
        field.life = field.life.saturating_sub(1);
        for e in store.enemies.iter_mut().filter(|e| e.alive) {
            if circles_overlap(e.pos, e.radius, field.pos, field.radius) {
                e.apply_slow(field.factor, SLOW_REFRESH_FRAMES);
            }
        }
    }

    for v in &mut store.vortices {
        v.life = v.life.saturating_sub(1);
        for e in store.enemies.iter_mut().filter(|e| e.alive) {
            e.pos += v.pull(e.pos);
        }
    }

    for h in &mut store.hazards {
        h.update();
    }

    for p in store.particles.iter_active_mut() {
        p.update();
    }
}

/// Apply every special effect an effective bullet hit on `target` carries.
/// Returns indices of enemies killed as a side effect (chain lightning).
pub fn apply_on_hit(
    store: &mut EntityStore,
    mods: &Modifiers,
    shot: &ShotInfo,
    target: usize,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut killed = Vec::new();
    let Some(enemy) = store.enemies.get_mut(target) else {
        return killed;
    };
    let pos = enemy.pos;
    let target_id = enemy.id;

    if shot.void {
        enemy.apply_void(void_duration(mods.void_level));
    }

    match shot.color {
        Color::Red if mods.ignite_level > 0 => {
            enemy.apply_ignite(ignite_damage(mods.ignite_level), ignite_duration(mods.ignite_level));
        }
        Color::Blue if mods.freeze_level > 0 => {
            enemy.apply_freeze(freeze_duration(mods.freeze_level));
        }
        Color::Yellow if mods.chain_level > 0 => {
            killed.extend(chain_lightning(
                store,
                target,
                chain_hops(mods.chain_level),
                chain_range(mods.chain_level),
                chain_damage(mods.chain_level),
                rng,
            ));
        }
        _ => {}
    }

    if shot.slowing {
        store.slow_fields.push(slow_field(pos, mods.slow_trail_level));
    }
    if shot.area_orb {
        store.vortices.push(vortex(pos, mods.gravity_well_level));
    }
    if shot.fission && rng.random_bool(fission_chance(mods.fission_level)) {
        spawn_fission(store, shot, pos, target_id, rng);
    }

    killed
}

/// Jump from `origin` to the nearest living, not-yet-chained enemy within
/// `range`, `hops` times. Each jump bypasses the color check.
pub fn chain_lightning(
    store: &mut EntityStore,
    origin: usize,
    hops: u32,
    range: f32,
    damage: f32,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut killed = Vec::new();
    for e in &mut store.enemies {
        e.chained = false;
    }
    let Some(first) = store.enemies.get_mut(origin) else {
        return killed;
    };
    first.chained = true;

    let mut from = first.pos;
    for _ in 0..hops {
        let next = store
            .enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive && !e.chained)
            .map(|(i, e)| (i, e.pos.distance_squared(from)))
            .filter(|(_, d2)| *d2 <= range * range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        let Some(next) = next else {
            break;
        };

        let e = &mut store.enemies[next];
        e.chained = true;
        let out = e.take_damage(damage, Color::Yellow, true, rng);
        if out.killed {
            killed.push(next);
        }
        let to = e.pos;
        spawn_arc_sparks(store, from, to, rng);
        from = to;
    }
    killed
}

/// Bypass-color damage to every living enemy overlapping the circle
pub fn area_damage(
    store: &mut EntityStore,
    center: Vec2,
    radius: f32,
    damage: f32,
    color: Color,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut killed = Vec::new();
    for (i, e) in store.enemies.iter_mut().enumerate() {
        if e.alive && circles_overlap(e.pos, e.radius, center, radius) {
            if e.take_damage(damage, color, true, rng).killed {
                killed.push(i);
            }
        }
    }
    store.spawn_particles(center, Some(color), 16, rng);
    killed
}

/// Two homing children, one per primary component of the bullet's color
fn spawn_fission(store: &mut EntityStore, shot: &ShotInfo, pos: Vec2, target_id: u64, rng: &mut impl Rng) {
    let Some((a, b)) = shot.color.components() else {
        return;
    };
    let speed = shot.vel.length();
    for color in [a, b] {
        let dir = direction_from_angle(rng.random_range(0.0..std::f32::consts::TAU));
        store.spawn_bullet(&BulletSpec {
            pos,
            vel: dir * speed,
            color,
            damage: shot.damage * FISSION_DAMAGE_MULT,
            homing: true,
            ignore: vec![target_id],
            ..Default::default()
        });
    }
}

fn spawn_arc_sparks(store: &mut EntityStore, from: Vec2, to: Vec2, rng: &mut impl Rng) {
    for t in [0.25, 0.5, 0.75] {
        store.spawn_particles(from.lerp(to, t), Some(Color::Yellow), 1, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup(positions: &[(Color, Vec2)]) -> (EntityStore, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(21);
        let mut store = EntityStore::new(100, 0);
        for (color, pos) in positions {
            store.spawn_enemy(*color, EnemyKind::Normal, *pos, 1, &mut rng);
        }
        (store, rng)
    }

    fn shot(color: Color) -> ShotInfo {
        ShotInfo {
            pos: Vec2::ZERO,
            vel: Vec2::new(10.0, 0.0),
            color,
            damage: 12.0,
            slowing: false,
            fission: false,
            void: false,
            area_orb: false,
        }
    }

    #[test]
    fn test_chain_visits_each_enemy_once() {
        let (mut store, mut rng) = setup(&[
            (Color::Red, Vec2::new(100.0, 100.0)),
            (Color::Blue, Vec2::new(150.0, 100.0)),
            (Color::Red, Vec2::new(200.0, 100.0)),
        ]);
        let before: Vec<f32> = store.enemies.iter().map(|e| e.health).collect();
        chain_lightning(&mut store, 0, 10, 100.0, 5.0, &mut rng);
        // Origin untouched by the chain itself, the others hit exactly once
        assert_eq!(store.enemies[0].health, before[0]);
        assert_eq!(store.enemies[1].health, before[1] - 5.0);
        assert_eq!(store.enemies[2].health, before[2] - 5.0);
    }

    #[test]
    fn test_chain_respects_range_and_hops() {
        let (mut store, mut rng) = setup(&[
            (Color::Red, Vec2::new(100.0, 100.0)),
            (Color::Red, Vec2::new(150.0, 100.0)),
            (Color::Red, Vec2::new(200.0, 100.0)),
            (Color::Red, Vec2::new(900.0, 100.0)),
        ]);
        let far = store.enemies[3].health;
        let third = store.enemies[2].health;
        chain_lightning(&mut store, 0, 1, 100.0, 5.0, &mut rng);
        assert_eq!(store.enemies[2].health, third);
        assert_eq!(store.enemies[3].health, far);
    }

    #[test]
    fn test_chain_flags_reset_per_propagation() {
        let (mut store, mut rng) = setup(&[
            (Color::Red, Vec2::new(100.0, 100.0)),
            (Color::Red, Vec2::new(150.0, 100.0)),
        ]);
        chain_lightning(&mut store, 0, 1, 100.0, 1.0, &mut rng);
        let h = store.enemies[1].health;
        chain_lightning(&mut store, 0, 1, 100.0, 1.0, &mut rng);
        assert_eq!(store.enemies[1].health, h - 1.0);
    }

    #[test]
    fn test_level_zero_primaries_do_nothing() {
        let (mut store, mut rng) = setup(&[(Color::Red, Vec2::new(100.0, 100.0))]);
        let mods = Modifiers::default();
        apply_on_hit(&mut store, &mods, &shot(Color::Red), 0, &mut rng);
        assert!(!store.enemies[0].is_ignited());
        apply_on_hit(&mut store, &mods, &shot(Color::Blue), 0, &mut rng);
        assert!(!store.enemies[0].is_frozen());
    }

    #[test]
    fn test_ignite_and_freeze_scale_with_level() {
        let (mut store, mut rng) = setup(&[(Color::Red, Vec2::new(100.0, 100.0))]);
        let mods = Modifiers {
            ignite_level: 2,
            freeze_level: 3,
            ..Default::default()
        };
        apply_on_hit(&mut store, &mods, &shot(Color::Red), 0, &mut rng);
        assert_eq!(store.enemies[0].status.ignite_damage, ignite_damage(2));
        assert_eq!(store.enemies[0].status.ignite_timer, ignite_duration(2));
        apply_on_hit(&mut store, &mods, &shot(Color::Blue), 0, &mut rng);
        assert_eq!(store.enemies[0].status.freeze_timer, freeze_duration(3));
    }

    #[test]
    fn test_flagged_bullets_spawn_fields() {
        let (mut store, mut rng) = setup(&[(Color::Blue, Vec2::new(300.0, 300.0))]);
        let mods = Modifiers {
            void_level: 1,
            ..Default::default()
        };
        let info = ShotInfo {
            slowing: true,
            area_orb: true,
            void: true,
            ..shot(Color::Purple)
        };
        apply_on_hit(&mut store, &mods, &info, 0, &mut rng);
        assert!(store.enemies[0].is_void());
        assert_eq!(store.slow_fields.len(), 1);
        assert_eq!(store.vortices.len(), 1);
        assert_eq!(store.vortices[0].pos, Vec2::new(300.0, 300.0));
    }

    #[test]
    fn test_fission_children_are_primaries() {
        let (mut store, mut rng) = setup(&[(Color::Blue, Vec2::new(300.0, 300.0))]);
        let mods = Modifiers {
            fission_level: 20,
            ..Default::default()
        };
        let info = ShotInfo {
            fission: true,
            ..shot(Color::Green)
        };
        apply_on_hit(&mut store, &mods, &info, 0, &mut rng);
        let mut colors: Vec<Color> = store.bullets.iter_active().map(|b| b.color).collect();
        colors.sort();
        assert_eq!(colors, vec![Color::Blue, Color::Yellow]);
        let id = store.enemies[0].id;
        assert!(store.bullets.iter_active().all(|b| b.homing && b.hit_enemies == vec![id]));
    }

    #[test]
    fn test_area_damage_bypasses_color() {
        let (mut store, mut rng) = setup(&[
            (Color::Red, Vec2::new(100.0, 100.0)),
            (Color::Green, Vec2::new(130.0, 100.0)),
            (Color::Blue, Vec2::new(600.0, 100.0)),
        ]);
        let healths: Vec<f32> = store.enemies.iter().map(|e| e.health).collect();
        let killed = area_damage(&mut store, Vec2::new(110.0, 100.0), 40.0, 10.0, Color::Yellow, &mut rng);
        assert!(killed.is_empty());
        assert_eq!(store.enemies[0].health, healths[0] - 10.0);
        assert_eq!(store.enemies[1].health, healths[1] - 10.0);
        assert_eq!(store.enemies[2].health, healths[2]);
    }

    #[test]
    fn test_vortex_pulls_enemies_inward() {
        let (mut store, _) = setup(&[(Color::Red, Vec2::new(150.0, 100.0))]);
        store.vortices.push(vortex(Vec2::new(100.0, 100.0), 0));
        update_ambient(&mut store);
        assert!(store.enemies[0].pos.x < 150.0);
        assert_eq!(store.vortices[0].life, VORTEX_LIFE_FRAMES - 1);
    }

    #[test]
    fn test_slow_field_slows_enemies_inside() {
        let (mut store, _) = setup(&[
            (Color::Red, Vec2::new(100.0, 100.0)),
            (Color::Red, Vec2::new(500.0, 100.0)),
        ]);
        store.slow_fields.push(slow_field(Vec2::new(100.0, 100.0), 1));
        update_ambient(&mut store);
        assert!(store.enemies[0].current_speed() < store.enemies[0].speed);
        assert_eq!(store.enemies[1].current_speed(), store.enemies[1].speed);
    }
}
