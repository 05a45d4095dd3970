//! Per-tick collision resolution
//!
//! Runs after every entity has moved, in a fixed pass order. Later passes see
//! the results of earlier ones:
//!
//! 1. hostile projectiles and detonating hazards vs player
//! 2. player bullets vs enemies (broad phase through the spatial index)
//! 3. player bullets vs boss
//! 4. dash-contact damage
//! 5. player vs enemy body contact
//! 6. player vs boss body contact
//! 7. player vs fragments
//! 8. enemy vs enemy separation

use glam::Vec2;
use rand::Rng;

use super::effects;
use super::entities::{BulletSpec, ShotInfo};
use super::enemy::{CONTACT_COOLDOWN_FRAMES, Punishment};
use super::geometry::{Aabb, circles_overlap, direction_or, overlap_depth};
use super::pool::Handle;
use super::state::{FragmentKind, GameEvent, GameState};
use super::store::EntityStore;
use super::upgrades::UpgradeId;
use crate::consts::*;

/// Hit-set marker used for the boss (enemy ids never reach it)
pub const BOSS_HIT_ID: u64 = u64::MAX;
/// How far a ricochet looks for its next target
pub const RICOCHET_RANGE: f32 = 300.0;
/// Reflected shots carry this fraction of the incoming damage
pub const REFLECT_DAMAGE_MULT: f32 = 0.5;
pub const DASH_DAMAGE_PER_LEVEL: f32 = 20.0;
pub const EXPLOSION_RADIUS: f32 = 90.0;
pub const EXPLOSION_DAMAGE_PER_LEVEL: f32 = 25.0;
pub const BOSS_POINTS: u64 = 1000;
const BOSS_KNOCKBACK_MULT: f32 = 1.5;
const PICKUP_FLASH_FRAMES: u32 = 12;

/// Run every pass for this tick
pub fn resolve(state: &mut GameState) {
    hostile_vs_player(state);

    let mut kills = Vec::new();
    bullets_vs_enemies(state, &mut kills);
    process_kills(state, kills);

    bullets_vs_boss(state);

    let kills = dash_contact(state);
    process_kills(state, kills);

    let kills = body_contact(state);
    process_kills(state, kills);

    boss_contact(state);
    collect_fragments(state);
    separate_enemies(&mut state.store);
}

fn hostile_vs_player(state: &mut GameState) {
    let GameState {
        store,
        player,
        rng,
        events,
        player_collision,
        ..
    } = state;

    for h in store.bullets.active_handles() {
        let Some(b) = store.bullets.get_mut(h) else {
            continue;
        };
        if !b.alive || !b.hostile || !circles_overlap(b.pos, b.radius, player.pos, player.radius) {
            continue;
        }
        b.alive = false;
        let (pos, color, damage, slows) = (b.pos, b.color, b.damage, b.slows_player);
        if *player_collision && player.take_hit(damage) {
            events.push(GameEvent::PlayerHit { damage });
            if slows {
                player.slow_timer = super::player::HOSTILE_SLOW_FRAMES;
            }
        }
        store.spawn_particles(pos, Some(color), 6, rng);
    }

    for i in 0..store.hazards.len() {
        let hazard = &mut store.hazards[i];
        if !hazard.is_detonating() {
            continue;
        }
        hazard.spent = true;
        let (pos, radius, damage, color) = (hazard.pos, hazard.radius, hazard.damage, hazard.color);
        if *player_collision
            && circles_overlap(player.pos, player.radius, pos, radius)
            && player.take_hit(damage)
        {
            events.push(GameEvent::PlayerHit { damage });
        }
        store.spawn_particles(pos, Some(color), 12, rng);
    }
}

fn bullets_vs_enemies(state: &mut GameState, kills: &mut Vec<usize>) {
    let mut candidates = Vec::new();
    for h in state.store.bullets.active_handles() {
        let Some(b) = state.store.bullets.get_ref(h) else {
            continue;
        };
        if !b.alive || b.hostile {
            continue;
        }
        state
            .store
            .index
            .query_into(&Aabb::around_circle(b.pos, b.radius), &mut candidates);
        // Index order depends on tree shape; resolve by arena order instead
        candidates.sort_unstable();

        for &i in &candidates {
            let Some(b) = state.store.bullets.get_mut(h) else {
                break;
            };
            if !b.alive {
                break;
            }
            let Some(enemy) = state.store.enemies.get(i) else {
                continue;
            };
            if !enemy.alive
                || b.hit_enemies.contains(&enemy.id)
                || !circles_overlap(b.pos, b.radius, enemy.pos, enemy.radius)
            {
                continue;
            }

            b.hit_enemies.push(enemy.id);
            let shot = b.shot_info();
            let ricochet = if b.penetrations_left > 0 {
                b.penetrations_left -= 1;
                false
            } else if b.ricochets_left > 0 {
                b.ricochets_left -= 1;
                true
            } else {
                b.alive = false;
                false
            };

            resolve_enemy_hit(state, i, &shot, kills);

            if ricochet {
                redirect_ricochet(&mut state.store, h);
                break;
            }
        }
    }
}

/// Damage rules, effects, and punishment follow-up for one bullet/enemy hit
fn resolve_enemy_hit(state: &mut GameState, i: usize, shot: &ShotInfo, kills: &mut Vec<usize>) {
    let Some(enemy) = state.store.enemies.get(i) else {
        return;
    };
    if enemy.is_immune() {
        state.store.spawn_particles(shot.pos, None, 2, &mut state.rng);
        return;
    }

    let (amount, bypass) = match state.player.consume_reversal() {
        Some(mult) => (shot.damage * mult, true),
        None => (shot.damage, false),
    };
    let enemy = &mut state.store.enemies[i];
    let out = enemy.take_damage(amount, shot.color, bypass, &mut state.rng);
    let (id, pos, radius, reflecting) = (enemy.id, enemy.pos, enemy.radius, enemy.reflecting);

    if out.hit {
        state.events.push(GameEvent::EnemyHit {
            id,
            damage: out.damage_dealt,
        });
        if out.killed {
            kills.push(i);
        }
        kills.extend(effects::apply_on_hit(
            &mut state.store,
            &state.player.mods,
            shot,
            i,
            &mut state.rng,
        ));
        let heal = out.damage_dealt * state.player.mods.lifesteal;
        if heal > 0.0 {
            state.player.heal(heal);
        }
        state.store.spawn_particles(pos, Some(shot.color), 3, &mut state.rng);
        return;
    }

    state.player.add_punishment_charge();
    state.events.push(GameEvent::EnemyMissed { id });

    if reflecting {
        let dir = direction_or(pos, state.player.pos, -shot.vel.normalize_or_zero());
        state.store.spawn_bullet(&BulletSpec::hostile(
            pos + dir * radius,
            dir * HOSTILE_BULLET_SPEED,
            shot.color,
            shot.damage * REFLECT_DAMAGE_MULT,
        ));
    }

    if let Some(punishment) = out.punished {
        state.events.push(GameEvent::Punished { id, punishment });
        if punishment == Punishment::Split {
            state.store.split_enemy(i, &mut state.rng);
        }
    }
}

/// Aim a ricocheting bullet at the nearest enemy it has not hit, or bounce it back
fn redirect_ricochet(store: &mut EntityStore, h: Handle) {
    let Some(b) = store.bullets.get_ref(h) else {
        return;
    };
    let (pos, vel) = (b.pos, b.vel);
    let target = store
        .nearest_enemy(pos, RICOCHET_RANGE, &b.hit_enemies)
        .map(|t| store.enemies[t].pos);
    let back = -vel.normalize_or_zero();
    let dir = target.map_or(back, |t| direction_or(pos, t, back));
    if let Some(b) = store.bullets.get_mut(h) {
        b.vel = dir * vel.length();
    }
}

fn bullets_vs_boss(state: &mut GameState) {
    for h in state.store.bullets.active_handles() {
        let Some(boss) = state.store.boss.as_mut().filter(|b| b.alive) else {
            return;
        };
        let Some(b) = state.store.bullets.get_mut(h) else {
            continue;
        };
        if !b.alive
            || b.hostile
            || b.hit_enemies.contains(&BOSS_HIT_ID)
            || !circles_overlap(b.pos, b.radius, boss.pos, boss.radius)
        {
            continue;
        }
        b.hit_enemies.push(BOSS_HIT_ID);
        if b.penetrations_left > 0 {
            b.penetrations_left -= 1;
        } else {
            b.alive = false;
        }

        let out = boss.take_damage(b.damage, b.color);
        if out.hit {
            state.events.push(GameEvent::BossHit {
                damage: out.damage_dealt,
            });
            let heal = out.damage_dealt * state.player.mods.lifesteal;
            if heal > 0.0 {
                state.player.heal(heal);
            }
        }
        if out.killed {
            on_boss_killed(state);
            return;
        }
    }
}

fn on_boss_killed(state: &mut GameState) {
    let Some(boss) = state.store.boss.as_mut() else {
        return;
    };
    if boss.rewarded {
        return;
    }
    boss.rewarded = true;
    let (index, pos, color) = (boss.index, boss.pos, boss.color);

    state.score += BOSS_POINTS * index as u64;
    state.store.spawn_fragment(pos, None);
    state.store.spawn_particles(pos, Some(color), 40, &mut state.rng);
    if state.director.boss_wave {
        state.next_boss_wave = state.wave + BOSS_WAVE_INTERVAL;
    }
    state.events.push(GameEvent::BossDefeated { index });
    log::info!("Boss {} defeated on wave {}", index, state.wave);
}

fn dash_contact(state: &mut GameState) -> Vec<usize> {
    let GameState {
        store,
        player,
        rng,
        events,
        ..
    } = state;
    let mut kills = Vec::new();
    if !player.is_dashing() || player.mods.dash_damage_level == 0 {
        return kills;
    }

    let damage = DASH_DAMAGE_PER_LEVEL * player.mods.dash_damage_level as f32;
    for (i, e) in store.enemies.iter_mut().enumerate() {
        if !e.alive
            || player.dash_hits.contains(&e.id)
            || !circles_overlap(player.pos, player.radius, e.pos, e.radius)
        {
            continue;
        }
        player.dash_hits.push(e.id);
        let out = e.take_damage(damage, player.color, true, rng);
        if out.hit {
            events.push(GameEvent::EnemyHit {
                id: e.id,
                damage: out.damage_dealt,
            });
        }
        if out.killed {
            kills.push(i);
        }
    }
    kills
}

/// Every overlapping enemy loses half its health, at most once per contact
/// cooldown (once per dash while dashing). Player damage is gated by the
/// player's own invulnerability.
fn body_contact(state: &mut GameState) -> Vec<usize> {
    let GameState {
        store,
        player,
        rng,
        events,
        player_collision,
        ..
    } = state;
    let mut kills = Vec::new();
    if !*player_collision {
        return kills;
    }

    for (i, e) in store.enemies.iter_mut().enumerate() {
        if !e.alive || !circles_overlap(player.pos, player.radius, e.pos, e.radius) {
            continue;
        }
        if player.is_dashing() {
            if player.dash_hits.contains(&e.id) {
                continue;
            }
            player.dash_hits.push(e.id);
        } else {
            if e.contact_cooldown > 0 {
                continue;
            }
            if player.take_hit(e.damage) {
                events.push(GameEvent::PlayerHit { damage: e.damage });
            }
            player.apply_knockback(e.pos, KNOCKBACK_IMPULSE);
        }
        e.contact_cooldown = CONTACT_COOLDOWN_FRAMES;

        let self_damage = e.health * 0.5;
        let color = e.color;
        if e.take_damage(self_damage, color, true, rng).killed {
            kills.push(i);
        }
    }
    kills
}

fn boss_contact(state: &mut GameState) {
    let player = &mut state.player;
    if !state.player_collision || player.is_dashing() || player.invuln_timer > 0 {
        return;
    }
    let Some(boss) = state.store.boss.as_ref().filter(|b| b.alive) else {
        return;
    };
    if !circles_overlap(player.pos, player.radius, boss.pos, boss.radius) {
        return;
    }
    if player.take_hit(super::boss::BOSS_CONTACT_DAMAGE) {
        state.events.push(GameEvent::PlayerHit {
            damage: super::boss::BOSS_CONTACT_DAMAGE,
        });
    }
    player.apply_knockback(boss.pos, KNOCKBACK_IMPULSE * BOSS_KNOCKBACK_MULT);
}

fn collect_fragments(state: &mut GameState) {
    let (pos, radius) = (state.player.pos, state.player.radius);
    let mut collected = Vec::new();
    for f in &mut state.store.fragments {
        if f.collected || f.is_expired() {
            continue;
        }
        if circles_overlap(pos, radius, f.pos, FRAGMENT_RADIUS) {
            f.collected = true;
            collected.push(FragmentKind::from_color(f.color));
        }
    }

    for kind in collected {
        state.events.push(GameEvent::FragmentCollected(kind));
        state.last_fragment = Some(kind);
        state.fragments_collected += 1;
        state.director.on_fragment_collected();
        state.player.pickup_flash = PICKUP_FLASH_FRAMES;
        state.bank_fragment(kind);
    }
}

/// Push overlapping enemies apart. Each unordered pair is resolved once,
/// from the side with the lower id. Queries use the positions the index was
/// built from, so earlier pushes in this pass cannot hide a pair.
pub fn separate_enemies(store: &mut EntityStore) {
    let indexed: Vec<Vec2> = store.enemies.iter().map(|e| e.pos).collect();
    let mut near = Vec::new();
    for i in 0..store.enemies.len() {
        let a = &store.enemies[i];
        if !a.alive {
            continue;
        }
        store
            .index
            .query_into(&Aabb::around_circle(indexed[i], a.radius), &mut near);

        for &j in &near {
            let (Some(a), Some(b)) = (store.enemies.get(i), store.enemies.get(j)) else {
                continue;
            };
            if i == j || !b.alive || a.id >= b.id {
                continue;
            }
            let depth = overlap_depth(a.pos, a.radius, b.pos, b.radius);
            if depth <= 0.0 {
                continue;
            }
            let push = (b.pos - a.pos).try_normalize().unwrap_or(Vec2::X) * depth * 0.5;
            store.enemies[i].pos -= push;
            store.enemies[j].pos += push;
        }
    }
}

/// Hand out rewards for dead, unrewarded enemies. Explosive finishes may
/// kill more enemies, which are appended to the worklist.
pub fn process_kills(state: &mut GameState, mut work: Vec<usize>) {
    let explosive_level = state.upgrades.level(UpgradeId::ExplosiveFinish);
    while let Some(i) = work.pop() {
        let Some(e) = state.store.enemies.get_mut(i) else {
            continue;
        };
        if e.alive || e.rewarded {
            continue;
        }
        e.rewarded = true;
        let (id, pos, color, points) = (e.id, e.pos, e.color, e.points);

        state.score += points as u64;
        state.events.push(GameEvent::EnemyKilled { id, color, points });
        state.store.spawn_fragment(pos, Some(color));

        let dup = state.player.mods.fragment_duplication_chance;
        if dup > 0.0 && state.rng.random_bool(dup.min(1.0) as f64) {
            state.store.spawn_fragment(pos + Vec2::new(10.0, 0.0), Some(color));
        }
        state.store.spawn_particles(pos, Some(color), 12, &mut state.rng);

        let chance = state.player.mods.explosive_finish_chance;
        if chance > 0.0 && state.rng.random_bool(chance.min(1.0) as f64) {
            let damage = EXPLOSION_DAMAGE_PER_LEVEL * explosive_level.max(1) as f32;
            work.extend(effects::area_damage(
                &mut state.store,
                pos,
                EXPLOSION_RADIUS,
                damage,
                color,
                &mut state.rng,
            ));
        }
    }
}
