//! Experience, level-ups, upgrade pools and the choice modals
//!
//! Level-ups and chest pickups only queue modals; [`open_next_modal`] opens
//! them one at a time while the run is in [`GameMode::Playing`]. Applying a
//! choice goes through [`SimulationState::choose`].

use std::fmt;

use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use super::state::{GameMode, SimEvent, SimulationState};
use super::weapon::{DRAGON_MAX_ZONES, DRAGON_UNLOCK_ZONES, Weapon, WeaponCategory, WeaponKey};
use crate::consts::CHOICES_PER_MODAL;

/// Cooldown multiplier of a rate upgrade
const RATE_MUL: f32 = 0.85;
/// Damage multiplier of a damage upgrade (rounded)
const DAMAGE_MUL: f32 = 1.25;
/// Dragon angular speed multipliers, in sequence order
const DRAGON_SPEED_MULS: [f32; 4] = [1.8, 1.6, 1.45, 1.35];

/// Refused choice input
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("No choice modal is open (mode {0:?})")]
    NotChoosing(GameMode),

    #[error("Choice {index} is out of range ({len} offered)")]
    OutOfRange { index: usize, len: usize },
}

/// XP gain multiplier at a player level
pub fn xp_multiplier(level: u32) -> f32 {
    if level < 5 { 1.0 } else { 0.5 }
}

/// XP required to clear `level`
pub fn xp_need_for(level: u32) -> f32 {
    let l = level as f32;
    if level < 5 {
        ((8.0 + l * 6.0) * 3.0).floor()
    } else {
        ((10.0 + l * 7.0 + l.powf(1.25)) * 1.25 * 3.0).floor()
    }
}

/// Level-up pool entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Upgrade {
    Unlock(WeaponKey),
    WandRate,
    WandDamage,
    WandProjectile,
    BowRate,
    BowDamage,
    HolyRate,
    HolyDamage,
    HolyPierce,
    BladesMore,
    BladesDamage,
    BladesSpeed,
    BladesMore2,
    LightningRate,
    LightningChain,
    LightningDamage,
    MeteorRate,
    MeteorRadius,
    MeteorBurn,
    MeteorTrail,
    FrostRate,
    FrostFreeze,
    FrostDamage,
    /// Dragon angular speed step (1..=4)
    DragonSpeed(u8),
    /// Dragon extra zone step (1..=4)
    DragonMore(u8),
    MaxHp,
    MaxHpPercent,
    Speed,
    Magnet,
}

/// Every level-up upgrade, before gating
pub const UPGRADE_POOL: [Upgrade; 41] = [
    Upgrade::HolyRate,
    Upgrade::HolyDamage,
    Upgrade::HolyPierce,
    Upgrade::Unlock(WeaponKey::Dragon),
    Upgrade::DragonSpeed(1),
    Upgrade::DragonMore(1),
    Upgrade::DragonSpeed(2),
    Upgrade::DragonMore(2),
    Upgrade::DragonSpeed(3),
    Upgrade::DragonMore(3),
    Upgrade::DragonSpeed(4),
    Upgrade::DragonMore(4),
    Upgrade::WandRate,
    Upgrade::WandDamage,
    Upgrade::WandProjectile,
    Upgrade::Unlock(WeaponKey::Bow),
    Upgrade::Unlock(WeaponKey::Holy),
    Upgrade::BowRate,
    Upgrade::BowDamage,
    Upgrade::Unlock(WeaponKey::Blades),
    Upgrade::Unlock(WeaponKey::Lightning),
    Upgrade::Unlock(WeaponKey::Meteor),
    Upgrade::Unlock(WeaponKey::Frost),
    Upgrade::BladesMore,
    Upgrade::BladesDamage,
    Upgrade::BladesSpeed,
    Upgrade::BladesMore2,
    Upgrade::LightningRate,
    Upgrade::LightningChain,
    Upgrade::LightningDamage,
    Upgrade::MeteorRate,
    Upgrade::MeteorRadius,
    Upgrade::MeteorBurn,
    Upgrade::MeteorTrail,
    Upgrade::FrostRate,
    Upgrade::FrostFreeze,
    Upgrade::FrostDamage,
    Upgrade::MaxHp,
    Upgrade::MaxHpPercent,
    Upgrade::Speed,
    Upgrade::Magnet,
];

impl Upgrade {
    /// Weapon namespace this upgrade belongs to
    pub fn weapon(self) -> Option<WeaponKey> {
        use Upgrade::*;
        match self {
            Unlock(k) => Some(k),
            WandRate | WandDamage | WandProjectile => Some(WeaponKey::Wand),
            BowRate | BowDamage => Some(WeaponKey::Bow),
            HolyRate | HolyDamage | HolyPierce => Some(WeaponKey::Holy),
            BladesMore | BladesDamage | BladesSpeed | BladesMore2 => Some(WeaponKey::Blades),
            LightningRate | LightningChain | LightningDamage => Some(WeaponKey::Lightning),
            MeteorRate | MeteorRadius | MeteorBurn | MeteorTrail => Some(WeaponKey::Meteor),
            FrostRate | FrostFreeze | FrostDamage => Some(WeaponKey::Frost),
            DragonSpeed(_) | DragonMore(_) => Some(WeaponKey::Dragon),
            MaxHp | MaxHpPercent | Speed | Magnet => None,
        }
    }

    pub fn is_unlock(self) -> bool {
        matches!(self, Upgrade::Unlock(_))
    }

    /// Belongs to the elemental magic sub-pool
    pub fn is_magic(self) -> bool {
        self.weapon()
            .is_some_and(|k| k.category() == WeaponCategory::Magic)
    }
}

impl fmt::Display for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Upgrade::*;
        let id = match self {
            Unlock(k) => return write!(f, "unlock_{k}"),
            DragonSpeed(n) => return write!(f, "dragon_speed_{n}"),
            DragonMore(n) => return write!(f, "dragon_more_{n}"),
            WandRate => "wand_rate",
            WandDamage => "wand_dmg",
            WandProjectile => "wand_proj",
            BowRate => "bow_rate",
            BowDamage => "bow_dmg",
            HolyRate => "holy_rate",
            HolyDamage => "holy_dmg",
            HolyPierce => "holy_pierce",
            BladesMore => "blades_more",
            BladesDamage => "blades_dmg",
            BladesSpeed => "blades_speed",
            BladesMore2 => "blades_more2",
            LightningRate => "lightning_rate",
            LightningChain => "lightning_chain",
            LightningDamage => "lightning_dmg",
            MeteorRate => "meteor_rate",
            MeteorRadius => "meteor_radius",
            MeteorBurn => "meteor_burn",
            MeteorTrail => "meteor_trail",
            FrostRate => "frost_rate",
            FrostFreeze => "frost_freeze",
            FrostDamage => "frost_dmg",
            MaxHp => "hp",
            MaxHpPercent => "hp_pct",
            Speed => "speed",
            Magnet => "magnet",
        };
        f.write_str(id)
    }
}

/// Chest pool entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChestReward {
    Heal,
    Xp,
    AllCooldowns,
    BladeOrbit,
    FrostRadius,
    MeteorRadius,
}

pub const CHEST_POOL: [ChestReward; 6] = [
    ChestReward::Heal,
    ChestReward::Xp,
    ChestReward::AllCooldowns,
    ChestReward::BladeOrbit,
    ChestReward::FrostRadius,
    ChestReward::MeteorRadius,
];

impl fmt::Display for ChestReward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChestReward::Heal => "chest_heal",
            ChestReward::Xp => "chest_xp",
            ChestReward::AllCooldowns => "chest_allcdr",
            ChestReward::BladeOrbit => "chest_blade_orbit",
            ChestReward::FrostRadius => "chest_frost_big",
            ChestReward::MeteorRadius => "chest_meteor_big",
        })
    }
}

/// One entry of an open modal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    Upgrade(Upgrade),
    Chest(ChestReward),
    /// Swap this equipped weapon for the pending unlock
    Replace { remove: WeaponKey },
    /// Decline the pending unlock
    SkipReplace,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Upgrade(u) => fmt::Display::fmt(u, f),
            Choice::Chest(c) => fmt::Display::fmt(c, f),
            Choice::Replace { remove } => write!(f, "replace_{remove}"),
            Choice::SkipReplace => f.write_str("replace_skip"),
        }
    }
}

/// Next entry of the fixed dragon sequence (`None` once fully upgraded)
pub fn next_dragon_upgrade(state: &SimulationState) -> Option<Upgrade> {
    let weapon = state.arsenal.get(WeaponKey::Dragon);
    if !weapon.enabled {
        return Some(Upgrade::Unlock(WeaponKey::Dragon));
    }
    let dragon = state.arsenal.dragon()?;
    if dragon.zones >= DRAGON_MAX_ZONES {
        return None;
    }
    let stage = dragon.stage;
    let step = if stage % 2 == 0 {
        Upgrade::DragonSpeed((stage / 2 + 1) as u8)
    } else {
        Upgrade::DragonMore(stage.div_ceil(2) as u8)
    };
    Some(step)
}

/// Whether an upgrade may be offered right now
pub fn is_offered(state: &SimulationState, upgrade: Upgrade) -> bool {
    let Some(key) = upgrade.weapon() else {
        return true;
    };
    let enabled = state.arsenal.get(key).enabled;
    if upgrade.is_unlock() {
        return !enabled;
    }
    if !enabled {
        return false;
    }
    key != WeaponKey::Dragon || next_dragon_upgrade(state) == Some(upgrade)
}

/// Gated level-up pool
pub fn available_upgrades(state: &SimulationState) -> Vec<Upgrade> {
    UPGRADE_POOL
        .iter()
        .copied()
        .filter(|&u| is_offered(state, u))
        .collect()
}

/// Apply all threshold crossings; each queues one level-up modal
pub fn check_level_up(state: &mut SimulationState) {
    let player = &mut state.player;
    while player.xp >= player.xp_need {
        player.xp -= player.xp_need;
        player.level += 1;
        player.xp_need = xp_need_for(player.level);
        state.pending_level_ups += 1;
    }
}

/// Open the next queued modal (level-ups before chests) if playing
pub fn open_next_modal(state: &mut SimulationState) {
    if state.mode != GameMode::Playing {
        return;
    }
    if state.pending_level_ups > 0 {
        state.pending_level_ups -= 1;
        open_level_up(state);
    } else if state.pending_chests > 0 {
        state.pending_chests -= 1;
        open_chest(state);
    }
}

fn choice_ids(choices: &[Choice]) -> Vec<String> {
    choices.iter().map(Choice::to_string).collect()
}

fn open_level_up(state: &mut SimulationState) {
    let mut pool = available_upgrades(state);
    let mut picks = Vec::with_capacity(CHOICES_PER_MODAL);

    // At least one elemental option when any exists
    let magic: Vec<Upgrade> = pool.iter().copied().filter(|u| u.is_magic()).collect();
    if let Some(&m) = magic.choose(&mut state.rng) {
        picks.push(m);
        pool.retain(|&u| u != m);
    }
    pool.shuffle(&mut state.rng);
    let fill = CHOICES_PER_MODAL.saturating_sub(picks.len());
    picks.extend(pool.into_iter().take(fill));

    if picks.is_empty() {
        log::debug!("Level-up with an empty pool; skipping modal");
        return;
    }
    state.choices = picks.into_iter().map(Choice::Upgrade).collect();
    state.mode = GameMode::LevelUp;
    let choices = choice_ids(&state.choices);
    log::info!("Level {} reached, offering {:?}", state.player.level, choices);
    state.events.push(SimEvent::LevelUpOpened {
        level: state.player.level,
        choices,
    });
}

fn open_chest(state: &mut SimulationState) {
    let mut pool = CHEST_POOL.to_vec();
    pool.shuffle(&mut state.rng);
    pool.truncate(CHOICES_PER_MODAL);
    state.choices = pool.into_iter().map(Choice::Chest).collect();
    state.mode = GameMode::Chest;
    let choices = choice_ids(&state.choices);
    log::info!("Chest opened, offering {:?}", choices);
    state.events.push(SimEvent::ChestOpened { choices });
}

/// Enable an equipped-category weapon if a slot is free; otherwise open the
/// replace modal and return false
pub fn try_enable(state: &mut SimulationState, key: WeaponKey) -> bool {
    if state.arsenal.get(key).enabled {
        return true;
    }
    if state.equipped_count() < state.player.weapon_slots {
        state.arsenal.get_mut(key).enable();
        log::info!("Unlocked {}", key.name());
        return true;
    }
    open_replace(state, key);
    false
}

fn open_replace(state: &mut SimulationState, key: WeaponKey) {
    let equipped = state.arsenal.equipped_keys();
    state.pending_unlock = Some(key);
    state.choices = equipped
        .iter()
        .map(|&remove| Choice::Replace { remove })
        .chain(std::iter::once(Choice::SkipReplace))
        .collect();
    state.mode = GameMode::Replace;
    log::info!(
        "Weapon slots full ({}/{}), asking to replace for {}",
        equipped.len(),
        state.player.weapon_slots,
        key.name()
    );
    state.events.push(SimEvent::WeaponReplaceNeeded {
        weapon: key,
        equipped,
    });
}

fn scale_cooldown(weapon: &mut Weapon, mul: f32) {
    if let Some(cd) = weapon.base_cooldown_mut() {
        *cd *= mul;
    }
}

fn scale_damage(weapon: &mut Weapon) {
    let damage = weapon.damage_mut();
    *damage = (*damage * DAMAGE_MUL).round();
}

fn apply_upgrade(state: &mut SimulationState, upgrade: Upgrade) {
    use Upgrade::*;
    let player = &mut state.player;
    match upgrade {
        MaxHp => {
            player.hp_max += 20.0;
            player.hp += 20.0;
            return;
        }
        MaxHpPercent => {
            let before = player.hp_max;
            player.hp_max = (player.hp_max * 1.1).ceil();
            player.hp += player.hp_max - before;
            return;
        }
        Speed => {
            player.speed *= 1.1;
            return;
        }
        Magnet => {
            player.magnet += 25.0;
            return;
        }
        Unlock(key) => {
            unlock(state, key);
            return;
        }
        _ => {}
    }

    let Some(key) = upgrade.weapon() else {
        return;
    };
    let arsenal = &mut state.arsenal;
    match upgrade {
        WandRate | BowRate | HolyRate | LightningRate | MeteorRate | FrostRate => {
            scale_cooldown(arsenal.get_mut(key), RATE_MUL);
        }
        WandDamage | BowDamage | HolyDamage | BladesDamage | LightningDamage | FrostDamage => {
            scale_damage(arsenal.get_mut(key));
        }
        WandProjectile => {
            if let Some(p) = arsenal.projectile_mut(key) {
                p.projectiles += 1;
            }
        }
        HolyPierce => {
            if let Some(p) = arsenal.projectile_mut(key) {
                p.pierce += 1;
            }
        }
        BladesMore | BladesMore2 => {
            if let Some(orbit) = arsenal.orbit_mut() {
                orbit.blades += if upgrade == BladesMore2 { 2 } else { 1 };
            }
        }
        BladesSpeed => {
            if let Some(orbit) = arsenal.orbit_mut() {
                orbit.angular_speed *= 1.25;
            }
        }
        LightningChain => {
            if let Some(chain) = arsenal.chain_mut() {
                chain.links += 1;
            }
        }
        MeteorRadius => {
            if let Some(m) = arsenal.meteor_mut() {
                m.impact_radius += 18.0;
                m.burn_radius += 12.0;
            }
        }
        MeteorBurn => {
            if let Some(m) = arsenal.meteor_mut() {
                m.burn_dps = (m.burn_dps * DAMAGE_MUL).round();
            }
        }
        MeteorTrail => {
            if let Some(m) = arsenal.meteor_mut() {
                m.follow_trail = true;
                m.trail_delay = 1.1;
            }
        }
        FrostFreeze => {
            if let Some(cone) = arsenal.cone_mut() {
                cone.freeze_secs += 0.5;
            }
        }
        DragonSpeed(n) => {
            if let Some(dragon) = arsenal.dragon_mut() {
                let idx = usize::from(n.clamp(1, 4) - 1);
                dragon.angular_speed *= DRAGON_SPEED_MULS[idx];
                dragon.stage += 1;
            }
        }
        DragonMore(_) => {
            if let Some(dragon) = arsenal.dragon_mut() {
                dragon.zones = (dragon.zones + 1).min(DRAGON_MAX_ZONES);
                dragon.stage += 1;
            }
        }
        MaxHp | MaxHpPercent | Speed | Magnet | Unlock(_) => return,
    }
    arsenal.get_mut(key).level += 1;
}

fn unlock(state: &mut SimulationState, key: WeaponKey) {
    match key.category() {
        WeaponCategory::Equipped => {
            try_enable(state, key);
        }
        WeaponCategory::Magic => {
            if key == WeaponKey::Dragon {
                if let Some(dragon) = state.arsenal.dragon_mut() {
                    dragon.stage = 0;
                    dragon.zones = DRAGON_UNLOCK_ZONES;
                    dragon.damage = 60.0;
                    dragon.radius = 120.0;
                    dragon.angular_speed = 1.1;
                    dragon.jitter = 0.45;
                }
            }
            state.arsenal.get_mut(key).enable();
            log::info!("Unlocked {}", key.name());
        }
    }
}

/// Weapons the cooldown rune speeds up (holy water is left out)
const CHEST_COOLDOWN_WEAPONS: [WeaponKey; 5] = [
    WeaponKey::Wand,
    WeaponKey::Bow,
    WeaponKey::Lightning,
    WeaponKey::Meteor,
    WeaponKey::Frost,
];

fn apply_chest(state: &mut SimulationState, reward: ChestReward) {
    match reward {
        ChestReward::Heal => {
            let p = &mut state.player;
            p.hp = (p.hp + 30.0).min(p.hp_max);
        }
        ChestReward::Xp => {
            state.player.xp += 40.0 * xp_multiplier(state.player.level);
            check_level_up(state);
        }
        ChestReward::AllCooldowns => {
            for key in CHEST_COOLDOWN_WEAPONS {
                scale_cooldown(state.arsenal.get_mut(key), 0.92);
            }
        }
        ChestReward::BladeOrbit => {
            if let Some(orbit) = state.arsenal.orbit_mut() {
                orbit.radius += 18.0;
            }
        }
        ChestReward::FrostRadius => {
            if let Some(cone) = state.arsenal.cone_mut() {
                cone.max_radius += 35.0;
            }
        }
        ChestReward::MeteorRadius => {
            if let Some(m) = state.arsenal.meteor_mut() {
                m.impact_radius += 28.0;
                m.burn_radius += 18.0;
            }
        }
    }
}

fn apply_replace(state: &mut SimulationState, remove: WeaponKey) {
    let Some(key) = state.pending_unlock.take() else {
        return;
    };
    state.arsenal.get_mut(remove).enabled = false;
    state.arsenal.get_mut(key).enable();
    log::info!("Replaced {} with {}", remove.name(), key.name());
}

impl SimulationState {
    /// Apply the `index`-th entry of the open modal
    ///
    /// Refused input leaves the state untouched and the modal open.
    pub fn choose(&mut self, index: usize) -> Result<Choice, ChoiceError> {
        if !self.mode.is_choice() {
            return Err(ChoiceError::NotChoosing(self.mode));
        }
        let Some(&choice) = self.choices.get(index) else {
            return Err(ChoiceError::OutOfRange {
                index,
                len: self.choices.len(),
            });
        };

        self.choices.clear();
        self.mode = GameMode::Playing;
        match choice {
            Choice::Upgrade(u) => apply_upgrade(self, u),
            Choice::Chest(c) => apply_chest(self, c),
            Choice::Replace { remove } => apply_replace(self, remove),
            Choice::SkipReplace => self.pending_unlock = None,
        }
        log::info!("Applied {choice}");
        self.events.push(SimEvent::ChoiceApplied {
            id: choice.to_string(),
        });

        // An unlock may have opened the replace modal
        open_next_modal(self);
        Ok(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn playing_state() -> SimulationState {
        let mut state = SimulationState::new(9, Tuning::default());
        state.mode = GameMode::Playing;
        state
    }

    #[test]
    fn test_xp_curve() {
        assert_eq!(xp_need_for(2), 60.0);
        assert_eq!(xp_need_for(4), 96.0);
        assert_eq!(xp_need_for(5), 196.0);
        assert_eq!(xp_multiplier(4), 1.0);
        assert_eq!(xp_multiplier(5), 0.5);
    }

    #[test]
    fn test_large_gain_levels_multiple_times() {
        let mut state = playing_state();
        state.player.xp = 100.0;
        check_level_up(&mut state);
        // 100 - 30 = 70, 70 - 60 = 10 < 78
        assert_eq!(state.player.level, 3);
        assert_eq!(state.player.xp, 10.0);
        assert_eq!(state.player.xp_need, 78.0);
        assert_eq!(state.pending_level_ups, 2);
    }

    #[test]
    fn test_queued_level_ups_open_one_at_a_time() {
        let mut state = playing_state();
        // Keep chest xp from queueing another level-up
        state.player.xp_need = 1000.0;
        state.pending_level_ups = 2;
        state.pending_chests = 1;
        open_next_modal(&mut state);
        assert_eq!(state.mode, GameMode::LevelUp);
        assert_eq!(state.choices.len(), 3);

        state.choose(0).unwrap();
        assert_eq!(state.mode, GameMode::LevelUp);
        state.choose(0).unwrap();
        assert_eq!(state.mode, GameMode::Chest);
        state.choose(0).unwrap();
        assert_eq!(state.mode, GameMode::Playing);
    }

    #[test]
    fn test_level_up_always_offers_magic_and_distinct_ids() {
        for seed in 0..50 {
            let mut state = SimulationState::new(seed, Tuning::default());
            state.mode = GameMode::Playing;
            state.pending_level_ups = 1;
            open_next_modal(&mut state);
            let ids = choice_ids(&state.choices);
            let mut dedup = ids.clone();
            dedup.sort();
            dedup.dedup();
            assert_eq!(dedup.len(), ids.len());
            assert!(matches!(state.choices[0], Choice::Upgrade(u) if u.is_magic()));
        }
    }

    #[test]
    fn test_gating_on_fresh_arsenal() {
        let state = playing_state();
        let pool = available_upgrades(&state);
        assert!(pool.contains(&Upgrade::Unlock(WeaponKey::Bow)));
        assert!(pool.contains(&Upgrade::WandRate));
        assert!(!pool.contains(&Upgrade::BowRate));
        assert!(!pool.contains(&Upgrade::Unlock(WeaponKey::Wand)));
        let dragon: Vec<_> = pool
            .iter()
            .filter(|u| u.weapon() == Some(WeaponKey::Dragon))
            .collect();
        assert_eq!(dragon, vec![&Upgrade::Unlock(WeaponKey::Dragon)]);
    }

    #[test]
    fn test_dragon_sequence_alternates_until_cap() {
        let mut state = playing_state();
        apply_upgrade(&mut state, Upgrade::Unlock(WeaponKey::Dragon));
        assert_eq!(state.arsenal.dragon().unwrap().zones, 4);

        let expected = [
            Upgrade::DragonSpeed(1),
            Upgrade::DragonMore(1),
            Upgrade::DragonSpeed(2),
            Upgrade::DragonMore(2),
        ];
        for step in expected {
            assert_eq!(next_dragon_upgrade(&state), Some(step));
            assert!(is_offered(&state, step));
            apply_upgrade(&mut state, step);
        }
        assert_eq!(state.arsenal.dragon().unwrap().zones, 6);
        assert_eq!(next_dragon_upgrade(&state), None);
        assert!((state.arsenal.dragon().unwrap().angular_speed - 1.1 * 1.8 * 1.6).abs() < 1e-4);
        assert_eq!(state.arsenal.get(WeaponKey::Dragon).level, 5);
    }

    #[test]
    fn test_replace_when_slots_full() {
        let mut state = playing_state();
        state.player.weapon_slots = 3;
        state.arsenal.get_mut(WeaponKey::Bow).enable();
        state.arsenal.get_mut(WeaponKey::Holy).enable();
        state.choices = vec![Choice::Upgrade(Upgrade::Unlock(WeaponKey::Blades))];
        state.mode = GameMode::LevelUp;

        state.choose(0).unwrap();
        assert_eq!(state.mode, GameMode::Replace);
        assert_eq!(state.pending_unlock, Some(WeaponKey::Blades));
        assert_eq!(
            state.choices,
            vec![
                Choice::Replace { remove: WeaponKey::Wand },
                Choice::Replace { remove: WeaponKey::Bow },
                Choice::Replace { remove: WeaponKey::Holy },
                Choice::SkipReplace,
            ]
        );

        state.choose(1).unwrap();
        assert_eq!(state.mode, GameMode::Playing);
        assert!(!state.arsenal.get(WeaponKey::Bow).enabled);
        assert!(state.arsenal.get(WeaponKey::Blades).enabled);
        assert_eq!(state.arsenal.get(WeaponKey::Blades).level, 1);
        assert_eq!(state.equipped_count(), 3);
    }

    #[test]
    fn test_skip_replace_keeps_loadout() {
        let mut state = playing_state();
        state.player.weapon_slots = 1;
        state.mode = GameMode::LevelUp;
        state.choices = vec![Choice::Upgrade(Upgrade::Unlock(WeaponKey::Bow))];
        state.choose(0).unwrap();
        assert_eq!(state.choices.last(), Some(&Choice::SkipReplace));
        state.choose(1).unwrap();
        assert_eq!(state.pending_unlock, None);
        assert!(!state.arsenal.get(WeaponKey::Bow).enabled);
        assert_eq!(state.equipped_count(), 1);
    }

    #[test]
    fn test_invalid_choice_is_refused_untouched() {
        let mut state = playing_state();
        assert_eq!(
            state.choose(0),
            Err(ChoiceError::NotChoosing(GameMode::Playing))
        );

        state.pending_chests = 1;
        open_next_modal(&mut state);
        let before = state.choices.clone();
        assert_eq!(
            state.choose(7),
            Err(ChoiceError::OutOfRange { index: 7, len: 3 })
        );
        assert_eq!(state.mode, GameMode::Chest);
        assert_eq!(state.choices, before);
    }

    #[test]
    fn test_magic_unlock_ignores_slots() {
        let mut state = playing_state();
        state.player.weapon_slots = 1;
        apply_upgrade(&mut state, Upgrade::Unlock(WeaponKey::Lightning));
        assert!(state.arsenal.get(WeaponKey::Lightning).enabled);
        assert_eq!(state.mode, GameMode::Playing);
    }

    #[test]
    fn test_upgrades_scale_stats_and_level() {
        let mut state = playing_state();
        apply_upgrade(&mut state, Upgrade::WandDamage);
        apply_upgrade(&mut state, Upgrade::WandProjectile);
        let wand = *state.arsenal.get(WeaponKey::Wand);
        assert_eq!(wand.hit_damage(), 15.0);
        assert_eq!(wand.level, 3);

        apply_upgrade(&mut state, Upgrade::MaxHpPercent);
        assert_eq!(state.player.hp_max, 110.0);
        assert_eq!(state.player.hp, 110.0);
    }

    #[test]
    fn test_chest_heal_caps_at_max_hp() {
        let mut state = playing_state();
        state.player.hp = 60.0;
        apply_chest(&mut state, ChestReward::Heal);
        assert_eq!(state.player.hp, 90.0);
        apply_chest(&mut state, ChestReward::Heal);
        assert_eq!(state.player.hp, 100.0);
        // Overheal from potions is trimmed back to max
        state.player.hp = 140.0;
        apply_chest(&mut state, ChestReward::Heal);
        assert_eq!(state.player.hp, 100.0);
    }

    #[test]
    fn test_chest_cooldown_rune_skips_holy_water() {
        let mut state = playing_state();
        let before: Vec<Option<f32>> = state
            .arsenal
            .iter_mut()
            .map(|w| w.base_cooldown_mut().map(|cd| *cd))
            .collect();
        apply_chest(&mut state, ChestReward::AllCooldowns);
        for (w, old) in state.arsenal.iter_mut().zip(before) {
            let key = w.key;
            let (Some(old), Some(new)) = (old, w.base_cooldown_mut().map(|cd| *cd)) else {
                continue;
            };
            if CHEST_COOLDOWN_WEAPONS.contains(&key) {
                assert!((new - old * 0.92).abs() < 1e-6, "{key:?}");
            } else {
                assert_eq!(new, old, "{key:?}");
            }
        }
        let holy = state.arsenal.get_mut(WeaponKey::Holy).base_cooldown_mut().map(|cd| *cd);
        assert_eq!(holy, Some(0.95));
    }

    #[test]
    fn test_display_ids() {
        assert_eq!(Upgrade::Unlock(WeaponKey::Frost).to_string(), "unlock_frost");
        assert_eq!(Upgrade::DragonMore(2).to_string(), "dragon_more_2");
        assert_eq!(Choice::Replace { remove: WeaponKey::Bow }.to_string(), "replace_bow");
        assert_eq!(Choice::Chest(ChestReward::AllCooldowns).to_string(), "chest_allcdr");
    }
}
