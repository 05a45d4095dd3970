//! Upgrade catalogue and the modifier recomputation engine
//!
//! The acquired set is an ordered `id → level` map. Any change to it
//! triggers a full recompute: modifiers reset to base, then every upgrade is
//! re-applied level by level. Order of acquisition can never matter.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::player::{Modifiers, Player};
use crate::consts::PLAYER_BASE_HEALTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    Damage,
    FireRate,
    MoveSpeed,
    Accuracy,
    BulletSpeed,
    MaxHealth,
    Lifesteal,
    Armor,
    Magnet,
    ChainLightning,
    Ignite,
    Freeze,
    Penetration,
    Ricochet,
    GravityWell,
    SlowTrail,
    Fission,
    Void,
    DashDamage,
    DashCooldown,
    ExplosiveFinish,
    FragmentDuplication,
    Adrenaline,
    KineticShield,
    PunishmentReversal,
}

impl UpgradeId {
    pub const ALL: [UpgradeId; 25] = [
        UpgradeId::Damage,
        UpgradeId::FireRate,
        UpgradeId::MoveSpeed,
        UpgradeId::Accuracy,
        UpgradeId::BulletSpeed,
        UpgradeId::MaxHealth,
        UpgradeId::Lifesteal,
        UpgradeId::Armor,
        UpgradeId::Magnet,
        UpgradeId::ChainLightning,
        UpgradeId::Ignite,
        UpgradeId::Freeze,
        UpgradeId::Penetration,
        UpgradeId::Ricochet,
        UpgradeId::GravityWell,
        UpgradeId::SlowTrail,
        UpgradeId::Fission,
        UpgradeId::Void,
        UpgradeId::DashDamage,
        UpgradeId::DashCooldown,
        UpgradeId::ExplosiveFinish,
        UpgradeId::FragmentDuplication,
        UpgradeId::Adrenaline,
        UpgradeId::KineticShield,
        UpgradeId::PunishmentReversal,
    ];

    pub fn max_level(&self) -> u32 {
        match self {
            UpgradeId::MaxHealth => 10,
            _ => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeId::Damage => "damage",
            UpgradeId::FireRate => "fire_rate",
            UpgradeId::MoveSpeed => "move_speed",
            UpgradeId::Accuracy => "accuracy",
            UpgradeId::BulletSpeed => "bullet_speed",
            UpgradeId::MaxHealth => "max_health",
            UpgradeId::Lifesteal => "lifesteal",
            UpgradeId::Armor => "armor",
            UpgradeId::Magnet => "magnet",
            UpgradeId::ChainLightning => "chain_lightning",
            UpgradeId::Ignite => "ignite",
            UpgradeId::Freeze => "freeze",
            UpgradeId::Penetration => "penetration",
            UpgradeId::Ricochet => "ricochet",
            UpgradeId::GravityWell => "gravity_well",
            UpgradeId::SlowTrail => "slow_trail",
            UpgradeId::Fission => "fission",
            UpgradeId::Void => "void",
            UpgradeId::DashDamage => "dash_damage",
            UpgradeId::DashCooldown => "dash_cooldown",
            UpgradeId::ExplosiveFinish => "explosive_finish",
            UpgradeId::FragmentDuplication => "fragment_duplication",
            UpgradeId::Adrenaline => "adrenaline",
            UpgradeId::KineticShield => "kinetic_shield",
            UpgradeId::PunishmentReversal => "punishment_reversal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL.iter().copied().find(|id| id.as_str() == s)
    }

    /// Apply the effect of reaching `level` (called once per level, 1..=n)
    pub fn apply(&self, m: &mut Modifiers, level: u32) {
        match self {
            UpgradeId::Damage => m.damage_mult *= 1.15,
            UpgradeId::FireRate => m.cooldown_mult *= 0.9,
            UpgradeId::MoveSpeed => m.speed_mult *= 1.08,
            UpgradeId::Accuracy => m.spread *= 0.8,
            UpgradeId::BulletSpeed => m.bullet_speed_mult *= 1.1,
            UpgradeId::MaxHealth => m.max_health_bonus += 20.0,
            UpgradeId::Lifesteal => m.lifesteal += 0.03,
            UpgradeId::Armor => m.damage_reduction += 1.0,
            UpgradeId::Magnet => m.magnet_mult += 0.25,
            UpgradeId::ChainLightning => m.chain_level = level,
            UpgradeId::Ignite => m.ignite_level = level,
            UpgradeId::Freeze => m.freeze_level = level,
            UpgradeId::Penetration => m.penetration_level = level,
            UpgradeId::Ricochet => m.ricochet_level = level,
            UpgradeId::GravityWell => m.gravity_well_level = level,
            UpgradeId::SlowTrail => m.slow_trail_level = level,
            UpgradeId::Fission => m.fission_level = level,
            UpgradeId::Void => m.void_level = level,
            UpgradeId::DashDamage => m.dash_damage_level = level,
            UpgradeId::DashCooldown => m.dash_cooldown_mult *= 0.85,
            UpgradeId::ExplosiveFinish => m.explosive_finish_chance += 0.05,
            UpgradeId::FragmentDuplication => m.fragment_duplication_chance += 0.08,
            UpgradeId::Adrenaline => m.adrenaline_level = level,
            UpgradeId::KineticShield => m.kinetic_shield_level = level,
            UpgradeId::PunishmentReversal => m.punishment_reversal_level = level,
        }
    }
}

/// Acquired upgrades and the recompute that derives player modifiers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeEngine {
    acquired: BTreeMap<UpgradeId, u32>,
}

impl UpgradeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_levels(levels: &BTreeMap<UpgradeId, u32>) -> Self {
        let acquired = levels
            .iter()
            .filter(|(_, lvl)| **lvl > 0)
            .map(|(id, lvl)| (*id, (*lvl).min(id.max_level())))
            .collect();
        Self { acquired }
    }

    pub fn levels(&self) -> &BTreeMap<UpgradeId, u32> {
        &self.acquired
    }

    pub fn level(&self, id: UpgradeId) -> u32 {
        self.acquired.get(&id).copied().unwrap_or(0)
    }

    /// Total levels acquired (used to modulate wave budgets)
    pub fn total_levels(&self) -> u32 {
        self.acquired.values().sum()
    }

    /// Add one level. Returns false if already at max.
    pub fn add(&mut self, id: UpgradeId, player: &mut Player) -> bool {
        let level = self.level(id);
        if level >= id.max_level() {
            return false;
        }
        self.acquired.insert(id, level + 1);
        self.recompute(player);
        true
    }

    /// Remove one level. Returns false if not acquired.
    pub fn remove(&mut self, id: UpgradeId, player: &mut Player) -> bool {
        match self.level(id) {
            0 => return false,
            1 => {
                self.acquired.remove(&id);
            }
            n => {
                self.acquired.insert(id, n - 1);
            }
        }
        self.recompute(player);
        true
    }

    pub fn set_max(&mut self, id: UpgradeId, player: &mut Player) {
        self.acquired.insert(id, id.max_level());
        self.recompute(player);
    }

    pub fn clear(&mut self, player: &mut Player) {
        self.acquired.clear();
        self.recompute(player);
    }

    /// Derive modifiers from scratch. Current health moves by exactly the
    /// max-health delta, then clamps to the new max. A living player never
    /// drops below 1 health from a recompute.
    pub fn recompute(&self, player: &mut Player) {
        let mut mods = Modifiers::default();
        for (id, level) in &self.acquired {
            for l in 1..=*level {
                id.apply(&mut mods, l);
            }
        }

        let old_max = player.max_health;
        let new_max = PLAYER_BASE_HEALTH + mods.max_health_bonus;
        let shifted = (player.health + (new_max - old_max)).min(new_max);
        player.health = if player.health > 0.0 { shifted.max(1.0) } else { shifted };
        player.max_health = new_max;
        player.mods = mods;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_str() {
        assert_eq!(UpgradeId::from_str("chain_lightning"), Some(UpgradeId::ChainLightning));
        assert_eq!(UpgradeId::from_str("Chain-Lightning"), Some(UpgradeId::ChainLightning));
        assert_eq!(UpgradeId::from_str("laser"), None);
        for id in UpgradeId::ALL {
            assert_eq!(UpgradeId::from_str(id.as_str()), Some(id));
        }
    }

    #[test]
    fn test_removing_max_health_never_kills() {
        let mut p = Player::new();
        let mut e = UpgradeEngine::new();
        e.add(UpgradeId::MaxHealth, &mut p);
        p.health = 5.0;
        assert!(e.remove(UpgradeId::MaxHealth, &mut p));
        assert_eq!(p.max_health, PLAYER_BASE_HEALTH);
        assert_eq!(p.health, 1.0);
    }

    #[test]
    fn test_add_respects_max_level() {
        let mut p = Player::new();
        let mut e = UpgradeEngine::new();
        for _ in 0..5 {
            assert!(e.add(UpgradeId::Ignite, &mut p));
        }
        assert!(!e.add(UpgradeId::Ignite, &mut p));
        assert_eq!(p.mods.ignite_level, 5);
    }

    #[test]
    fn test_max_health_delta_preserves_damage_taken() {
        let mut p = Player::new();
        let mut e = UpgradeEngine::new();
        p.health = 60.0;
        e.add(UpgradeId::MaxHealth, &mut p);
        assert_eq!(p.max_health, 120.0);
        assert_eq!(p.health, 80.0);

        e.remove(UpgradeId::MaxHealth, &mut p);
        assert_eq!(p.max_health, 100.0);
        assert_eq!(p.health, 60.0);
    }

    #[test]
    fn test_health_clamped_on_max_drop() {
        let mut p = Player::new();
        let mut e = UpgradeEngine::new();
        e.set_max(UpgradeId::MaxHealth, &mut p);
        assert_eq!(p.health, 300.0);
        p.health = 290.0;
        e.clear(&mut p);
        assert_eq!(p.max_health, 100.0);
        assert_eq!(p.health, 90.0);
    }

    #[test]
    fn test_remove_unacquired_is_noop() {
        let mut p = Player::new();
        let mut e = UpgradeEngine::new();
        assert!(!e.remove(UpgradeId::Void, &mut p));
        assert_eq!(p.mods, Modifiers::default());
    }

    fn any_upgrade() -> impl Strategy<Value = UpgradeId> {
        (0usize..UpgradeId::ALL.len()).prop_map(|i| UpgradeId::ALL[i])
    }

    proptest! {
        #[test]
        fn recompute_is_idempotent(ids in proptest::collection::vec(any_upgrade(), 0..40)) {
            let mut p = Player::new();
            let mut e = UpgradeEngine::new();
            for id in ids {
                e.add(id, &mut p);
            }
            let first = (p.mods.clone(), p.health, p.max_health);
            e.recompute(&mut p);
            e.recompute(&mut p);
            prop_assert_eq!(first, (p.mods.clone(), p.health, p.max_health));
        }

        #[test]
        fn acquisition_order_is_irrelevant(ids in proptest::collection::vec(any_upgrade(), 0..30)) {
            let mut p1 = Player::new();
            let mut e1 = UpgradeEngine::new();
            for id in &ids {
                e1.add(*id, &mut p1);
            }
            let mut p2 = Player::new();
            let mut e2 = UpgradeEngine::new();
            for id in ids.iter().rev() {
                e2.add(*id, &mut p2);
            }
            prop_assert_eq!(e1.levels(), e2.levels());
            prop_assert_eq!(p1.mods, p2.mods);
            prop_assert_eq!(p1.max_health, p2.max_health);
        }
    }
}
