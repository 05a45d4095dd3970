//! Game state and read-only snapshots
//!
//! `GameState` owns every subsystem. External layers only read the
//! snapshots published here and talk back through `tick` commands.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::{BOSS_PADDING, Boss, BossState};
use super::color::Color;
use super::enemy::{BehaviorState, EnemyKind, Punishment};
use super::player::Player;
use super::store::EntityStore;
use super::upgrades::{UpgradeEngine, UpgradeId};
use super::waves::{WaveDirector, WaveSummary, edge_spawn_position};
use crate::consts::*;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Normal,
    /// Free-play: sandbox commands allowed, player collision toggleable
    Sandbox,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Wave cleared, waiting for the next-wave command
    BetweenWaves,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Colored(Color),
    /// Boss drop
    Special,
}

impl FragmentKind {
    pub fn from_color(color: Option<Color>) -> Self {
        color.map_or(FragmentKind::Special, FragmentKind::Colored)
    }
}

/// Fire-and-forget notifications for audio/UI, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotFired { color: Color },
    EnemyHit { id: u64, damage: f32 },
    EnemyMissed { id: u64 },
    EnemyKilled { id: u64, color: Color, points: u32 },
    Punished { id: u64, punishment: Punishment },
    BossHit { damage: f32 },
    PlayerHit { damage: f32 },
    FragmentCollected(FragmentKind),
    UpgradeBanked { banked: u32 },
    UpgradeAcquired { id: UpgradeId, level: u32 },
    WaveStarted { wave: u32, boss: bool },
    WaveCleared(WaveSummary),
    BossSpawned { index: u32 },
    BossDefeated { index: u32 },
    GameOver { score: u64, wave: u32 },
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub mode: GameMode,
    pub phase: GamePhase,
    /// Phase to return to when unpausing
    pub resume_phase: GamePhase,
    pub settings: Settings,
    pub player: Player,
    pub upgrades: UpgradeEngine,
    pub store: EntityStore,
    pub director: WaveDirector,
    pub score: u64,
    pub wave: u32,
    /// Wave at which the next boss appears; advances when a boss dies
    pub next_boss_wave: u32,
    pub banked_upgrades: u32,
    /// Progress toward the next banked upgrade
    pub fragment_progress: u32,
    /// Monotonic count of fragments collected this run
    pub fragments_collected: u64,
    pub last_fragment: Option<FragmentKind>,
    pub between_waves: Option<WaveSummary>,
    /// Player can be damaged (always true outside sandbox)
    pub player_collision: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// New normal-mode run, wave 1 already started
    pub fn new(seed: u64) -> Self {
        Self::with_options(seed, GameMode::Normal, Settings::default())
    }

    pub fn with_options(seed: u64, mode: GameMode, settings: Settings) -> Self {
        let mut state = Self::blank(seed, mode, settings);
        state.start_wave(1);
        state
    }

    /// Fully initialized but no wave started yet
    pub(crate) fn blank(seed: u64, mode: GameMode, settings: Settings) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            mode,
            phase: GamePhase::Playing,
            resume_phase: GamePhase::Playing,
            store: EntityStore::new(0, 0),
            settings: Settings::default(),
            player: Player::new(),
            upgrades: UpgradeEngine::new(),
            director: WaveDirector::new(),
            score: 0,
            wave: 0,
            next_boss_wave: BOSS_WAVE_INTERVAL,
            banked_upgrades: 0,
            fragment_progress: 0,
            fragments_collected: 0,
            last_fragment: None,
            between_waves: None,
            player_collision: true,
            time_ticks: 0,
            events: Vec::new(),
        };
        state.apply_settings(settings);
        state
    }

    /// Quality caps apply to effects spawned from now on. Normal runs always
    /// collide with the player.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.store.max_particles = settings.max_particles();
        self.store.trail_len = settings.trail_length();
        if self.mode == GameMode::Sandbox {
            self.player_collision = settings.sandbox_player_collision;
        }
        self.settings = settings;
    }

    /// Clear the arena and hand wave `n` to the director
    pub fn start_wave(&mut self, wave: u32) {
        let wave = wave.max(1);
        self.store.clear();
        self.wave = wave;
        let boss = wave >= self.next_boss_wave;
        self.director
            .start_wave(wave, boss, self.upgrades.total_levels(), &mut self.rng);
        self.phase = GamePhase::Playing;
        self.between_waves = None;
        self.events.push(GameEvent::WaveStarted { wave, boss });
    }

    /// 1 for the first boss, 2 for the second, ...
    pub fn boss_index(&self) -> u32 {
        (self.wave / BOSS_WAVE_INTERVAL).max(1)
    }

    pub fn spawn_boss(&mut self) {
        if self.store.boss_alive() {
            return;
        }
        let index = self.boss_index();
        let pos = Vec2::new(ARENA_WIDTH / 2.0, BOSS_PADDING);
        self.store.boss = Some(Boss::new(pos, index, &mut self.rng));
        self.events.push(GameEvent::BossSpawned { index });
        log::info!("Boss {} spawned on wave {}", index, self.wave);
    }

    pub fn spawn_enemy_at_edge(&mut self, color: Color, kind: EnemyKind) -> u64 {
        let pos = edge_spawn_position(&mut self.rng);
        self.store.spawn_enemy(color, kind, pos, self.wave, &mut self.rng)
    }

    /// Count a collected fragment toward banking
    pub fn bank_fragment(&mut self, kind: FragmentKind) {
        let before = self.banked_upgrades;
        match kind {
            FragmentKind::Special => self.banked_upgrades += 1,
            FragmentKind::Colored(_) => {
                self.fragment_progress += 1;
                if self.fragment_progress >= FRAGMENTS_PER_UPGRADE {
                    self.fragment_progress -= FRAGMENTS_PER_UPGRADE;
                    self.banked_upgrades += 1;
                }
            }
        }
        if self.banked_upgrades > before {
            self.events.push(GameEvent::UpgradeBanked {
                banked: self.banked_upgrades,
            });
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            score: self.score,
            health: self.player.health,
            max_health: self.player.max_health,
            wave: self.wave,
            phase: self.phase,
            game_over: self.is_game_over(),
            between_waves: self.between_waves,
            last_fragment: self.last_fragment,
            fragments_collected: self.fragments_collected,
            banked_upgrades: self.banked_upgrades,
            color: self.player.color,
            selectable_colors: self.player.selectable_colors(),
            alive_enemies: self.store.alive_enemy_count(),
            boss_health: self
                .store
                .boss
                .as_ref()
                .filter(|b| b.alive)
                .map(|b| (b.health, b.max_health)),
        }
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        let p = &self.player;
        RenderSnapshot {
            player: PlayerView {
                pos: p.pos,
                radius: p.radius,
                color: p.color,
                aim: p.aim,
                dashing: p.is_dashing(),
                invulnerable: p.invuln_timer > 0,
                charge: p.charge,
                pickup_flash: p.pickup_flash,
                shield_ready: p.mods.kinetic_shield_level > 0 && p.shield_cooldown == 0,
            },
            enemies: self
                .store
                .enemies
                .iter()
                .filter(|e| e.alive)
                .map(|e| EnemyView {
                    id: e.id,
                    pos: e.pos,
                    radius: e.radius,
                    color: e.color,
                    sentinel: e.kind == EnemyKind::Sentinel,
                    state: e.state,
                    attack_target: e.attack_target,
                    health_frac: (e.health / e.max_health).clamp(0.0, 1.0),
                    frozen: e.is_frozen(),
                    ignited: e.is_ignited(),
                    void: e.is_void(),
                    immune: e.is_immune(),
                    punishment: e.punishment,
                    hit_flash: e.hit_flash > 0,
                })
                .collect(),
            boss: self.store.boss.as_ref().filter(|b| b.alive).map(|b| BossView {
                pos: b.pos,
                radius: b.radius,
                color: b.color,
                state: b.state,
                target: b.target,
                health_frac: (b.health / b.max_health).clamp(0.0, 1.0),
                hit_flash: b.hit_flash > 0,
            }),
            bullets: self
                .store
                .bullets
                .iter_active()
                .filter(|b| b.alive)
                .map(|b| BulletView {
                    pos: b.pos,
                    radius: b.radius,
                    color: b.color,
                    hostile: b.hostile,
                    trail: b.trail.clone(),
                })
                .collect(),
            fragments: self
                .store
                .fragments
                .iter()
                .filter(|f| !f.collected)
                .map(|f| (f.pos, FragmentKind::from_color(f.color)))
                .collect(),
            particles: self
                .store
                .particles
                .iter_active()
                .map(|pt| ParticleView {
                    pos: pt.pos,
                    color: pt.color,
                    size: pt.size,
                    alpha: pt.fade(),
                })
                .collect(),
            hazards: self
                .store
                .hazards
                .iter()
                .map(|h| (h.pos, h.radius, h.fuse))
                .collect(),
            slow_fields: self.store.slow_fields.iter().map(|f| (f.pos, f.radius)).collect(),
            vortices: self.store.vortices.iter().map(|v| (v.pos, v.radius)).collect(),
        }
    }
}

/// HUD/audio-facing state, published once per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub score: u64,
    pub health: f32,
    pub max_health: f32,
    pub wave: u32,
    pub phase: GamePhase,
    pub game_over: bool,
    pub between_waves: Option<WaveSummary>,
    pub last_fragment: Option<FragmentKind>,
    pub fragments_collected: u64,
    pub banked_upgrades: u32,
    pub color: Color,
    pub selectable_colors: Vec<Color>,
    pub alive_enemies: usize,
    pub boss_health: Option<(f32, f32)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub radius: f32,
    pub color: Color,
    pub aim: Vec2,
    pub dashing: bool,
    pub invulnerable: bool,
    pub charge: u32,
    pub pickup_flash: u32,
    pub shield_ready: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub id: u64,
    pub pos: Vec2,
    pub radius: f32,
    pub color: Color,
    pub sentinel: bool,
    pub state: BehaviorState,
    pub attack_target: Vec2,
    pub health_frac: f32,
    pub frozen: bool,
    pub ignited: bool,
    pub void: bool,
    pub immune: bool,
    pub punishment: Option<Punishment>,
    pub hit_flash: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BossView {
    pub pos: Vec2,
    pub radius: f32,
    pub color: Color,
    pub state: BossState,
    pub target: Vec2,
    pub health_frac: f32,
    pub hit_flash: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulletView {
    pub pos: Vec2,
    pub radius: f32,
    pub color: Color,
    pub hostile: bool,
    pub trail: Vec<Vec2>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticleView {
    pub pos: Vec2,
    pub color: Option<Color>,
    pub size: f32,
    pub alpha: f32,
}

/// Per-entity pose/color/status for a renderer
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub boss: Option<BossView>,
    pub bullets: Vec<BulletView>,
    pub fragments: Vec<(Vec2, FragmentKind)>,
    pub particles: Vec<ParticleView>,
    /// (center, radius, fuse frames left)
    pub hazards: Vec<(Vec2, f32, u32)>,
    pub slow_fields: Vec<(Vec2, f32)>,
    pub vortices: Vec<(Vec2, f32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_wave_one() {
        let mut s = GameState::new(1);
        assert_eq!(s.wave, 1);
        assert_eq!(s.phase, GamePhase::Playing);
        assert!(s.director.in_progress);
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::WaveStarted { wave: 1, boss: false }]
        );
        assert!(s.events.is_empty());
    }

    #[test]
    fn test_start_wave_clears_entities() {
        let mut s = GameState::new(2);
        s.spawn_enemy_at_edge(Color::Red, EnemyKind::Normal);
        s.store.spawn_fragment(Vec2::ONE, None);
        s.start_wave(2);
        assert!(s.store.enemies.is_empty());
        assert!(s.store.fragments.is_empty());
    }

    #[test]
    fn test_boss_wave_follows_threshold() {
        let mut s = GameState::new(3);
        s.start_wave(5);
        assert!(s.director.boss_wave);
        s.next_boss_wave = 10;
        s.start_wave(6);
        assert!(!s.director.boss_wave);
    }

    #[test]
    fn test_settings_drive_caps_and_sandbox_collision() {
        let quiet = Settings {
            particles: false,
            sandbox_player_collision: false,
            ..Default::default()
        };
        let normal = GameState::with_options(5, GameMode::Normal, quiet.clone());
        assert!(normal.player_collision);
        assert_eq!(normal.store.max_particles, 0);

        let mut sandbox = GameState::with_options(5, GameMode::Sandbox, quiet);
        assert!(!sandbox.player_collision);
        sandbox.apply_settings(Settings::default());
        assert!(sandbox.player_collision);
        assert_eq!(sandbox.store.max_particles, 300);
    }

    #[test]
    fn test_fragment_banking() {
        let mut s = GameState::new(4);
        for _ in 0..FRAGMENTS_PER_UPGRADE - 1 {
            s.bank_fragment(FragmentKind::Colored(Color::Red));
        }
        assert_eq!(s.banked_upgrades, 0);
        s.bank_fragment(FragmentKind::Colored(Color::Blue));
        assert_eq!(s.banked_upgrades, 1);
        assert_eq!(s.fragment_progress, 0);
        s.bank_fragment(FragmentKind::Special);
        assert_eq!(s.banked_upgrades, 2);
    }

    #[test]
    fn test_sandbox_collision_follows_settings() {
        let settings = Settings {
            sandbox_player_collision: false,
            ..Default::default()
        };
        let s = GameState::with_options(5, GameMode::Sandbox, settings.clone());
        assert!(!s.player_collision);
        let s = GameState::with_options(5, GameMode::Normal, settings);
        assert!(s.player_collision);
    }

    #[test]
    fn test_snapshot_reports_boss() {
        let mut s = GameState::new(6);
        s.start_wave(5);
        s.spawn_boss();
        s.spawn_boss();
        let snap = s.snapshot();
        let (hp, max) = snap.boss_health.unwrap();
        assert_eq!(hp, max);
        assert_eq!(s.render_snapshot().boss.map(|b| b.radius), Some(s.store.boss.as_ref().unwrap().radius));
    }
}
