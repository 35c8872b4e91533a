//! Loot collection: vacuum gems, heals, slot orbs, chests and xp gems

use glam::Vec2;

use super::progression::check_level_up;
use super::state::{PickupEvent, SimEvent, SimulationState};
use crate::consts::{MAGNET_PULL_SPEED, OVERHEAL_CAP};
use crate::{direction, jitter};

#[inline]
fn touching(player_pos: Vec2, player_radius: f32, pos: Vec2, radius: f32) -> bool {
    player_pos.distance(pos) < player_radius + radius
}

/// Teleport every loot item next to the player
pub fn vacuum_loot(state: &mut SimulationState) {
    let center = state.player.pos;
    let rng = &mut state.rng;
    for g in &mut state.gems {
        g.pos = center + jitter(rng, 8.0);
    }
    for c in &mut state.chests {
        c.pos = center + jitter(rng, 18.0);
    }
    for s in &mut state.slot_orbs {
        s.pos = center + jitter(rng, 12.0);
    }
    for h in &mut state.heals {
        h.pos = center + jitter(rng, 12.0);
    }
}

fn collect_vacuum_gems(state: &mut SimulationState) {
    let (pos, r) = (state.player.pos, state.player.radius);
    let before = state.vacuum_gems.len();
    state.vacuum_gems.retain(|v| !touching(pos, r, v.pos, v.radius));
    for _ in state.vacuum_gems.len()..before {
        vacuum_loot(state);
        state.events.push(SimEvent::Pickup(PickupEvent::Vacuum));
    }
}

fn collect_heals(state: &mut SimulationState) {
    let (pos, r) = (state.player.pos, state.player.radius);
    let mut amounts = Vec::new();
    state.heals.retain(|h| {
        let hit = touching(pos, r, h.pos, h.radius);
        if hit {
            amounts.push(h.amount);
        }
        !hit
    });
    for amount in amounts {
        let p = &mut state.player;
        let before = p.hp;
        p.hp = (p.hp_max * OVERHEAL_CAP).min(p.hp + amount).max(before);
        let gained = p.hp - before;
        state.events.push(SimEvent::Pickup(PickupEvent::Heal { amount: gained }));
    }
}

fn collect_slot_orbs(state: &mut SimulationState) {
    let (pos, r) = (state.player.pos, state.player.radius);
    let before = state.slot_orbs.len();
    state.slot_orbs.retain(|s| !touching(pos, r, s.pos, s.radius));
    for _ in state.slot_orbs.len()..before {
        let p = &mut state.player;
        if p.weapon_slots < p.weapon_slots_max {
            p.weapon_slots += 1;
            log::info!("Weapon slots increased to {}", p.weapon_slots);
        }
        let slots = p.weapon_slots;
        state.events.push(SimEvent::Pickup(PickupEvent::SlotOrb { slots }));
    }
}

fn collect_chests(state: &mut SimulationState) {
    let (pos, r) = (state.player.pos, state.player.radius);
    let before = state.chests.len();
    state.chests.retain(|c| !touching(pos, r, c.pos, c.radius));
    for _ in state.chests.len()..before {
        state.pending_chests += 1;
        state.events.push(SimEvent::Pickup(PickupEvent::Chest));
    }
}

fn collect_gems(state: &mut SimulationState, dt: f32) {
    let (pos, r, magnet) = (state.player.pos, state.player.radius, state.player.magnet);
    let mut gained = 0.0;
    let mut picked = Vec::new();
    state.gems.retain_mut(|g| {
        let d = pos.distance(g.pos);
        if d < magnet {
            g.pos += direction(pos - g.pos) * MAGNET_PULL_SPEED * dt;
        }
        // Collection tests the distance from before the pull
        if d < r + g.radius {
            gained += g.xp;
            picked.push(g.xp);
            return false;
        }
        true
    });
    if picked.is_empty() {
        return;
    }
    state.player.xp += gained;
    for amount in picked {
        state.events.push(SimEvent::Pickup(PickupEvent::Xp { amount }));
    }
    check_level_up(state);
}

/// Resolve every pickup in proximity of the player
pub fn update_pickups(state: &mut SimulationState, dt: f32) {
    collect_vacuum_gems(state);
    collect_heals(state);
    collect_slot_orbs(state);
    collect_chests(state);
    collect_gems(state, dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::state::{Gem, HealPotion, Pickup};
    use crate::sim::GameMode;
    use crate::tuning::Tuning;

    fn playing_state() -> SimulationState {
        let mut state = SimulationState::new(13, Tuning::default());
        state.mode = GameMode::Playing;
        state.player.pos = Vec2::ZERO;
        state
    }

    fn gem(pos: Vec2, xp: f32) -> Gem {
        Gem {
            pos,
            radius: GEM_RADIUS,
            xp,
        }
    }

    #[test]
    fn test_magnet_pulls_then_collects() {
        let mut state = playing_state();
        state.gems.push(gem(Vec2::new(60.0, 0.0), 5.0));
        state.gems.push(gem(Vec2::new(200.0, 0.0), 5.0));
        update_pickups(&mut state, 0.05);
        assert!((state.gems[0].pos.x - 39.0).abs() < 1e-3);
        assert_eq!(state.gems[1].pos.x, 200.0);

        update_pickups(&mut state, 0.05);
        update_pickups(&mut state, 0.05);
        assert_eq!(state.gems.len(), 1);
        assert_eq!(state.player.xp, 5.0);
    }

    #[test]
    fn test_big_gem_queues_multiple_level_ups() {
        let mut state = playing_state();
        state.gems.push(gem(Vec2::ZERO, 100.0));
        update_pickups(&mut state, 0.016);
        assert_eq!(state.player.level, 3);
        assert_eq!(state.pending_level_ups, 2);
        // Pickups never open modals themselves
        assert_eq!(state.mode, GameMode::Playing);
    }

    #[test]
    fn test_heal_overheal_is_capped() {
        let mut state = playing_state();
        state.player.hp = 140.0;
        state.heals.push(HealPotion {
            pos: Vec2::ZERO,
            radius: HEAL_RADIUS,
            amount: HEAL_AMOUNT,
        });
        update_pickups(&mut state, 0.016);
        assert_eq!(state.player.hp, 150.0);
        assert!(state
            .events
            .contains(&SimEvent::Pickup(PickupEvent::Heal { amount: 10.0 })));
    }

    #[test]
    fn test_slot_orb_respects_max() {
        let mut state = playing_state();
        state.player.weapon_slots = WEAPON_SLOTS_MAX - 1;
        for _ in 0..2 {
            state.slot_orbs.push(Pickup {
                pos: Vec2::ZERO,
                radius: SLOT_ORB_RADIUS,
            });
        }
        update_pickups(&mut state, 0.016);
        assert_eq!(state.player.weapon_slots, WEAPON_SLOTS_MAX);
        assert!(state.slot_orbs.is_empty());
    }

    #[test]
    fn test_chest_queues_modal() {
        let mut state = playing_state();
        state.chests.push(Pickup {
            pos: Vec2::new(5.0, 0.0),
            radius: CHEST_RADIUS,
        });
        update_pickups(&mut state, 0.016);
        assert_eq!(state.pending_chests, 1);
        assert!(state.chests.is_empty());
    }

    #[test]
    fn test_vacuum_pulls_everything_in() {
        let mut state = playing_state();
        state.gems.push(gem(Vec2::new(2000.0, 0.0), 1.0));
        state.chests.push(Pickup {
            pos: Vec2::new(-900.0, 40.0),
            radius: CHEST_RADIUS,
        });
        state.vacuum_gems.push(Pickup {
            pos: Vec2::ZERO,
            radius: VACUUM_GEM_RADIUS,
        });
        update_pickups(&mut state, 0.016);
        assert!(state.vacuum_gems.is_empty());
        // Gems land within the collect radius and are taken the same frame
        assert!(state.gems.is_empty());
        assert_eq!(state.pending_chests, 1);
    }
}
