//! End-to-end runs through the public tick API

use chroma_rush::SaveData;
use chroma_rush::consts::*;
use chroma_rush::settings::Settings;
use chroma_rush::sim::waves::{SpawnKind, WaveDirector};
use chroma_rush::sim::{
    BulletSpec, Color, EnemyKind, GameEvent, GameMode, GamePhase, GameState, TickInput, tick,
};
use glam::Vec2;

/// Normal run with an empty, idle arena
fn quiet_arena(seed: u64) -> GameState {
    let mut s = GameState::new(seed);
    s.store.clear();
    s.director = WaveDirector::new();
    s.drain_events();
    s
}

/// Frozen enemy 150 px to the right of the player; returns its id
fn target_enemy(s: &mut GameState, color: Color) -> u64 {
    let pos = s.player.pos + Vec2::new(150.0, 0.0);
    let id = s.store.spawn_enemy(color, EnemyKind::Normal, pos, 1, &mut s.rng);
    if let Some(e) = s.store.enemies.last_mut() {
        e.apply_freeze(10_000);
        e.can_split = false;
    }
    id
}

/// Fire one shot at the target and run until the bullet is gone
fn shoot(s: &mut GameState, color: Color) -> Vec<GameEvent> {
    s.player.select_color(color);
    let aim = s.player.pos + Vec2::new(150.0, 0.0);
    let fire = TickInput {
        aim,
        fire: true,
        ..Default::default()
    };
    let idle = TickInput {
        aim,
        ..Default::default()
    };
    tick(s, &fire);
    let mut events = s.drain_events();
    for _ in 0..40 {
        tick(s, &idle);
        events.extend(s.drain_events());
        if s.store.bullets.iter_active().all(|b| !b.alive || b.hostile) {
            break;
        }
    }
    // Let the fire cooldown expire
    for _ in 0..FIRE_COOLDOWN_FRAMES {
        tick(s, &idle);
        events.extend(s.drain_events());
    }
    events
}

fn enemy(s: &GameState, id: u64) -> Option<&chroma_rush::sim::Enemy> {
    s.store.enemies.iter().find(|e| e.id == id)
}

#[test]
fn scenario_a_matching_hit() {
    let mut s = quiet_arena(1);
    let id = target_enemy(&mut s, Color::Red);
    let events = shoot(&mut s, Color::Red);

    let e = enemy(&s, id).unwrap();
    assert_eq!(e.health, 18.0);
    assert!(e.alive);
    assert!(events.contains(&GameEvent::EnemyHit { id, damage: 12.0 }));
    assert!(!events.iter().any(|ev| matches!(ev, GameEvent::EnemyKilled { .. })));
}

#[test]
fn scenario_b_third_hit_kills_and_drops() {
    let mut s = quiet_arena(2);
    let id = target_enemy(&mut s, Color::Red);
    let last_pos = enemy(&s, id).unwrap().pos;

    shoot(&mut s, Color::Red);
    shoot(&mut s, Color::Red);
    assert_eq!(enemy(&s, id).unwrap().health, 6.0);
    let events = shoot(&mut s, Color::Red);

    assert!(enemy(&s, id).is_none());
    assert!(events.contains(&GameEvent::EnemyKilled {
        id,
        color: Color::Red,
        points: 10
    }));
    assert_eq!(s.store.fragments.len(), 1);
    assert_eq!(s.store.fragments[0].color, Some(Color::Red));
    // Out of attraction range, so it has not moved
    assert_eq!(s.store.fragments[0].pos, last_pos);
    assert_eq!(s.score, 10);
}

#[test]
fn scenario_c_three_wrong_hits_punish() {
    let mut s = quiet_arena(3);
    let id = target_enemy(&mut s, Color::Red);

    let mut events = Vec::new();
    for _ in 0..3 {
        events.extend(shoot(&mut s, Color::Blue));
    }

    let e = enemy(&s, id).unwrap();
    assert!(e.punishment.is_some());
    assert_eq!(e.wrong_hits, 0);
    assert_eq!(e.health, e.max_health);
    let punished = events
        .iter()
        .filter(|ev| matches!(ev, GameEvent::Punished { .. }))
        .count();
    assert_eq!(punished, 1);
}

#[test]
fn scenario_d_boss_wave() {
    let settings = Settings {
        sandbox_player_collision: false,
        ..Default::default()
    };
    let mut s = GameState::with_options(4, GameMode::Sandbox, settings);
    s.start_wave(5);

    assert_eq!(s.director.group_count(), 0);
    let queued: Vec<_> = s.director.queued().collect();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].kind, SpawnKind::Boss);

    let idle = TickInput::default();
    for _ in 0..300 {
        tick(&mut s, &idle);
    }
    assert!(s.store.boss_alive());
    assert_eq!(s.store.alive_enemy_count(), 0);
    assert_eq!(s.phase, GamePhase::Playing);

    // Finish the boss with its own color
    let (pos, color) = {
        let boss = s.store.boss.as_mut().unwrap();
        boss.health = 1.0;
        boss.color_timer = 1_000;
        (boss.pos, boss.color)
    };
    s.store.spawn_bullet(&BulletSpec {
        pos,
        color,
        ..Default::default()
    });
    tick(&mut s, &idle);
    assert!(!s.store.boss_alive());
    assert!(
        s.drain_events()
            .contains(&GameEvent::BossDefeated { index: 1 })
    );
    assert_eq!(s.next_boss_wave, 10);

    // The special drop still has to be collected
    tick(&mut s, &idle);
    assert_eq!(s.phase, GamePhase::Playing);
    s.player.pos = s.store.fragments[0].pos;
    tick(&mut s, &idle);
    tick(&mut s, &idle);
    assert_eq!(s.phase, GamePhase::BetweenWaves);
    assert_eq!(s.between_waves.map(|w| w.boss_wave), Some(true));
    assert_eq!(s.banked_upgrades, 1);
}

#[test]
fn restored_saves_replay_identically() {
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut s = GameState::new(5);
    for _ in 0..900 {
        tick(&mut s, &input);
    }
    let json = SaveData::capture(&s).to_json().unwrap();
    let save = SaveData::from_json(&json).unwrap();

    let mut a = GameState::from_save(&save, 11, Settings::default());
    let mut b = GameState::from_save(&save, 11, Settings::default());
    assert_eq!(a.wave, s.wave);
    assert_eq!(a.score, s.score);
    for _ in 0..600 {
        tick(&mut a, &input);
        tick(&mut b, &input);
    }
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn autopilot_long_run_keeps_invariants() {
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut s = GameState::new(2024);
    for _ in 0..6_000 {
        tick(&mut s, &input);
        assert!(s.store.ricochet_count <= MAX_RICOCHET_BULLETS);
        assert!(s.player.health <= s.player.max_health);
        assert!(s.store.enemies.iter().all(|e| e.alive));
        if s.is_game_over() {
            break;
        }
    }
    assert!(s.wave >= 1);
    assert!(s.time_ticks > 0);
}
