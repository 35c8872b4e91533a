//! Damage resolution: bullets, area effects, kill processing and loot
//!
//! Every damage source goes through [`damage_enemy`] and leaves dead enemies
//! in place; [`reap_kills`] then drops loot and compacts the enemy list. A dead
//! enemy is skipped by every later hit test in the same pass.

use glam::Vec2;
use rand::Rng;

use super::progression::xp_multiplier;
use super::state::{
    Effect, EffectKind, Enemy, EnemyKind, Gem, HealPotion, MeteorStage, Pickup, SimEvent,
    SimulationState,
};
use crate::consts::*;
use crate::{direction, jitter};

const METEOR_KNOCKBACK: f32 = 220.0;

/// Frost cone hits enemies within this distance of its current radius
const CONE_BAND: f32 = 14.0;
/// Minimum gap between two cone hits on the same enemy
const CONE_REHIT_SECS: f32 = 0.5;

/// Burn fields keep an enemy burning this long after it leaves
const BURN_LINGER: f32 = 0.15;

/// Boss slam ring
const SLAM_HIT_WINDOW: f32 = 0.08;
const SLAM_DAMAGE: f32 = 34.0;
const SLAM_PUSH: f32 = 34.0;
const SLAM_INVULN: f32 = 0.65;

/// Drop chances
const ELITE_SECOND_CHEST: f64 = 0.35;
const ELITE_SLOT_ORB: f32 = 0.22;
const ELITE_VACUUM: f32 = 0.32;
const ELITE_MAXED_VACUUM: f32 = 0.18;
const ELITE_MAXED_HEAL: f32 = 0.30;
const COMMON_HEAL: f64 = 0.03;

/// Apply damage; returns true when this hit killed the enemy
///
/// Dead enemies take no further damage.
pub fn damage_enemy(e: &mut Enemy, amount: f32) -> bool {
    if !e.is_alive() {
        return false;
    }
    e.hp -= amount;
    !e.is_alive()
}

/// Push `e` away from `from` by adding an impulse to its knockback velocity
pub fn apply_knockback(e: &mut Enemy, from: Vec2, force: f32) {
    e.vel += direction(e.pos - from) * force;
}

/// Remove dead enemies, emitting loot and kill events for each
pub fn reap_kills(state: &mut SimulationState) {
    if state.enemies.iter().all(Enemy::is_alive) {
        return;
    }
    let (dead, alive): (Vec<Enemy>, Vec<Enemy>) =
        std::mem::take(&mut state.enemies).into_iter().partition(|e| !e.is_alive());
    state.enemies = alive;
    for e in &dead {
        on_kill(state, e);
    }
}

/// Kill bookkeeping and loot for one enemy
fn on_kill(state: &mut SimulationState, e: &Enemy) {
    state.kills += 1;
    state.events.push(SimEvent::Kill {
        pos: e.pos,
        kind: e.kind,
        elite: e.elite,
    });

    let base_xp = (4.0 + (state.elapsed / 45.0).floor()) * xp_multiplier(state.player.level);
    let drops = if e.elite { 3 } else { 1 };
    for _ in 0..drops {
        let pos = e.pos + jitter(&mut state.rng, 10.0);
        state.gems.push(Gem {
            pos,
            radius: GEM_RADIUS,
            xp: base_xp,
        });
    }

    if e.kind == EnemyKind::Boss {
        let chests = if e.hard { 6 } else { 3 };
        for _ in 0..chests {
            let pos = e.pos + jitter(&mut state.rng, 22.0);
            state.chests.push(Pickup {
                pos,
                radius: CHEST_RADIUS,
            });
        }
        for _ in 0..10 {
            let pos = e.pos + jitter(&mut state.rng, 28.0);
            state.gems.push(Gem {
                pos,
                radius: GEM_RADIUS,
                xp: base_xp * 2.0,
            });
        }
        state.vacuum_gems.push(Pickup {
            pos: e.pos,
            radius: BOSS_VACUUM_GEM_RADIUS,
        });
        log::info!("Boss defeated at {:.1}s", state.elapsed);
    } else if e.elite {
        state.chests.push(Pickup {
            pos: e.pos,
            radius: CHEST_RADIUS,
        });
        if state.rng.random_bool(ELITE_SECOND_CHEST) {
            let pos = e.pos + jitter(&mut state.rng, 14.0);
            state.chests.push(Pickup {
                pos,
                radius: CHEST_RADIUS,
            });
        }

        // Slot orbs only while slots can still grow; otherwise the odds shift
        let roll: f32 = state.rng.random();
        let pos = e.pos + jitter(&mut state.rng, 10.0);
        if state.player.weapon_slots < state.player.weapon_slots_max {
            if roll < ELITE_SLOT_ORB {
                state.slot_orbs.push(Pickup {
                    pos,
                    radius: SLOT_ORB_RADIUS,
                });
            } else if roll < ELITE_VACUUM {
                state.vacuum_gems.push(Pickup {
                    pos,
                    radius: VACUUM_GEM_RADIUS,
                });
            }
        } else if roll < ELITE_MAXED_VACUUM {
            state.vacuum_gems.push(Pickup {
                pos,
                radius: VACUUM_GEM_RADIUS,
            });
        } else if roll < ELITE_MAXED_HEAL {
            state.heals.push(HealPotion {
                pos,
                radius: HEAL_RADIUS,
                amount: HEAL_AMOUNT,
            });
        }
    } else if state.rng.random_bool(COMMON_HEAL) {
        state.heals.push(HealPotion {
            pos: e.pos,
            radius: HEAL_RADIUS,
            amount: HEAL_AMOUNT,
        });
    }
}

/// Move bullets and expire them
pub fn update_bullets(state: &mut SimulationState, dt: f32) {
    for b in &mut state.bullets {
        b.pos += b.vel * dt;
        b.ttl -= dt;
    }
    state.bullets.retain(|b| b.ttl > 0.0);
}

/// One hit per bullet per frame; piercing bullets survive with one less pierce
pub fn collide_bullets(state: &mut SimulationState) {
    let enemies = &mut state.enemies;
    state.bullets.retain_mut(|b| {
        let Some(e) = enemies
            .iter_mut()
            .rev()
            .find(|e| e.is_alive() && e.pos.distance(b.pos) < e.radius + b.radius)
        else {
            return true;
        };
        damage_enemy(e, b.damage);
        if b.pierce > 0 {
            b.pierce -= 1;
            true
        } else {
            false
        }
    });
    reap_kills(state);
}

/// Instant meteor damage around `center`
fn meteor_impact(enemies: &mut [Enemy], center: Vec2, damage: f32, radius: f32) {
    for e in enemies.iter_mut() {
        if e.is_alive() && center.distance(e.pos) <= radius + e.radius {
            damage_enemy(e, damage);
            apply_knockback(e, center, METEOR_KNOCKBACK);
        }
    }
}

/// Keep enemies inside a burn field burning; overlapping fields take the max
pub fn apply_burn_field(enemies: &mut [Enemy], center: Vec2, radius: f32, dps: f32, now: f32) {
    for e in enemies.iter_mut() {
        if center.distance(e.pos) <= radius + e.radius {
            e.burn_until = e.burn_until.max(now + BURN_LINGER);
            e.burn_dps = e.burn_dps.max(dps);
        }
    }
}

/// Parameters of a frost cone at one instant
struct ConeFront {
    origin: Vec2,
    forward: Vec2,
    radius: f32,
    cos_half: f32,
    damage: f32,
    knockback: f32,
    freeze_secs: f32,
}

fn frost_cone_hits(enemies: &mut [Enemy], cone: &ConeFront, now: f32) {
    let forward = direction(cone.forward);
    for e in enemies.iter_mut() {
        if !e.is_alive() {
            continue;
        }
        let offset = e.pos - cone.origin;
        let d = offset.length();
        if d < 1.0 {
            continue;
        }
        if (offset / d).dot(forward) < cone.cos_half {
            continue;
        }
        if (d - cone.radius).abs() > CONE_BAND {
            continue;
        }
        if e.cone_hit_at.is_some_and(|t| now - t <= CONE_REHIT_SECS) {
            continue;
        }
        e.cone_hit_at = Some(now);
        damage_enemy(e, cone.damage);
        apply_knockback(e, cone.origin, cone.knockback);
        e.frozen_until = e.frozen_until.max(now + cone.freeze_secs);
    }
}

/// Slam ring damage to the player early in the ring's life
fn slam_player(state: &mut SimulationState, center: Vec2) -> bool {
    let p = &mut state.player;
    if p.invuln > 0.0 {
        return false;
    }
    p.hp -= SLAM_DAMAGE;
    p.invuln = SLAM_INVULN;
    p.pos += direction(p.pos - center) * SLAM_PUSH;
    state.events.push(SimEvent::PlayerHit {
        damage: SLAM_DAMAGE,
    });
    true
}

/// Age effects and run their mechanics (meteor impact, burn, frost, slam)
pub fn update_effects(state: &mut SimulationState, dt: f32) {
    let now = state.elapsed;
    let mut effects = std::mem::take(&mut state.effects);

    for fx in &mut effects {
        fx.age += dt;
        let (age, ttl) = (fx.age, fx.ttl);
        match &mut fx.kind {
            EffectKind::Meteor {
                target,
                delay,
                stage,
                ..
            } => {
                if *stage == MeteorStage::Fall && age >= *delay {
                    *stage = MeteorStage::Impact;
                    if let Some(m) = state.arsenal.meteor().copied() {
                        let (damage, radius) = (m.impact_damage, m.impact_radius);
                        meteor_impact(&mut state.enemies, *target, damage, radius);
                        state.effects.push(Effect::new(
                            EffectKind::BurnField {
                                center: *target,
                                radius: m.burn_radius,
                                dps: m.burn_dps,
                            },
                            m.burn_duration,
                        ));
                    }
                }
            }
            EffectKind::BurnField {
                center,
                radius,
                dps,
            } => apply_burn_field(&mut state.enemies, *center, *radius, *dps, now),
            EffectKind::FrostCone {
                origin,
                forward,
                max_radius,
                angle,
                damage,
                knockback,
                freeze_secs,
            } => {
                *origin = state.player.pos;
                let cone = ConeFront {
                    origin: *origin,
                    forward: *forward,
                    radius: *max_radius * (age / ttl).clamp(0.0, 1.0),
                    cos_half: (*angle / 2.0).cos(),
                    damage: *damage,
                    knockback: *knockback,
                    freeze_secs: *freeze_secs,
                };
                frost_cone_hits(&mut state.enemies, &cone, now);
            }
            EffectKind::Slam { center, radius } => {
                let reach = *radius + state.player.radius;
                if age < SLAM_HIT_WINDOW && center.distance(state.player.pos) <= reach {
                    slam_player(state, *center);
                }
            }
            EffectKind::ChainBolt { .. }
            | EffectKind::ChargeTelegraph { .. }
            | EffectKind::SlamWarning { .. } => {}
        }
    }

    effects.retain(|fx| fx.age < fx.ttl);
    effects.append(&mut state.effects);
    state.effects = effects;

    reap_kills(state);
    state.check_death();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Bullet;
    use crate::sim::weapon::WeaponKey;
    use crate::sim::GameMode;
    use crate::tuning::Tuning;

    fn playing_state() -> SimulationState {
        let mut state = SimulationState::new(11, Tuning::default());
        state.mode = GameMode::Playing;
        state
    }

    fn add_enemy(state: &mut SimulationState, pos: Vec2, hp: f32) {
        let id = state.next_entity_id();
        let mut e = Enemy::new(id, pos, EnemyKind::Melee);
        e.hp = hp;
        e.radius = 10.0;
        state.enemies.push(e);
    }

    fn bullet_at(pos: Vec2, damage: f32, pierce: u32) -> Bullet {
        Bullet {
            pos,
            vel: Vec2::ZERO,
            radius: BULLET_RADIUS,
            damage,
            pierce,
            ttl: BULLET_TTL,
            source: WeaponKey::Wand,
        }
    }

    #[test]
    fn test_dead_enemy_takes_no_damage() {
        let mut e = Enemy::new(1, Vec2::ZERO, EnemyKind::Melee);
        e.hp = 5.0;
        assert!(damage_enemy(&mut e, 6.0));
        assert!(!damage_enemy(&mut e, 6.0));
        assert_eq!(e.hp, -1.0);
    }

    #[test]
    fn test_bullet_kill_drops_gem() {
        let mut state = playing_state();
        add_enemy(&mut state, Vec2::new(200.0, 0.0), 10.0);
        state.bullets.push(bullet_at(Vec2::new(200.0, 0.0), 12.0, 0));
        collide_bullets(&mut state);
        assert!(state.enemies.is_empty());
        assert!(state.bullets.is_empty());
        assert_eq!(state.kills, 1);
        assert_eq!(state.gems.len(), 1);
        assert_eq!(state.gems[0].xp, 4.0);
        assert!(matches!(state.events[0], SimEvent::Kill { elite: false, .. }));
    }

    #[test]
    fn test_piercing_bullet_hits_once_per_frame() {
        let mut state = playing_state();
        add_enemy(&mut state, Vec2::new(200.0, 0.0), 100.0);
        add_enemy(&mut state, Vec2::new(202.0, 0.0), 100.0);
        state.bullets.push(bullet_at(Vec2::new(201.0, 0.0), 10.0, 1));
        collide_bullets(&mut state);
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.bullets[0].pierce, 0);
        let total: f32 = state.enemies.iter().map(|e| e.hp).sum();
        assert_eq!(total, 190.0);
    }

    #[test]
    fn test_bullets_expire() {
        let mut state = playing_state();
        let mut b = bullet_at(Vec2::ZERO, 1.0, 0);
        b.vel = Vec2::new(100.0, 0.0);
        state.bullets.push(b);
        update_bullets(&mut state, 1.0);
        assert_eq!(state.bullets[0].pos.x, 100.0);
        update_bullets(&mut state, 1.0);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_elite_kill_drops_chest_and_three_gems() {
        let mut state = playing_state();
        add_enemy(&mut state, Vec2::new(300.0, 0.0), 0.0);
        state.enemies[0].elite = true;
        reap_kills(&mut state);
        assert_eq!(state.gems.len(), 3);
        assert!(!state.chests.is_empty() && state.chests.len() <= 2);
        // Slots not maxed → never a heal from the bonus roll
        assert!(state.heals.is_empty());
    }

    fn kill_elites(state: &mut SimulationState, count: usize) {
        for _ in 0..count {
            add_enemy(state, Vec2::new(300.0, 0.0), 0.0);
            if let Some(e) = state.enemies.last_mut() {
                e.elite = true;
            }
            reap_kills(state);
        }
    }

    #[test]
    fn test_elite_bonus_loot_shifts_when_slots_are_maxed() {
        let mut state = playing_state();
        kill_elites(&mut state, 400);
        assert!(state.heals.is_empty());
        let (orbs, vacuum) = (state.slot_orbs.len(), state.vacuum_gems.len());
        assert!((50..=130).contains(&orbs), "orbs {orbs}");
        assert!((15..=70).contains(&vacuum), "vacuum {vacuum}");

        let mut state = playing_state();
        state.player.weapon_slots = state.player.weapon_slots_max;
        kill_elites(&mut state, 400);
        // No more orbs: 18% vacuum, then 12% heal
        assert!(state.slot_orbs.is_empty());
        let (vacuum, heals) = (state.vacuum_gems.len(), state.heals.len());
        assert!((40..=110).contains(&vacuum), "vacuum {vacuum}");
        assert!((20..=80).contains(&heals), "heals {heals}");
        assert!(state.heals.iter().all(|h| h.amount == HEAL_AMOUNT));
    }

    #[test]
    fn test_ordinary_kills_rarely_drop_heals() {
        let mut state = playing_state();
        for _ in 0..3000 {
            add_enemy(&mut state, Vec2::new(300.0, 0.0), 0.0);
            reap_kills(&mut state);
        }
        assert_eq!(state.kills, 3000);
        let heals = state.heals.len();
        assert!((50..=135).contains(&heals), "heals {heals}");
        assert!(state.chests.is_empty());
        assert!(state.slot_orbs.is_empty() && state.vacuum_gems.is_empty());
    }

    #[test]
    fn test_gem_xp_halves_from_level_five() {
        let mut state = playing_state();
        state.player.level = 4;
        add_enemy(&mut state, Vec2::new(300.0, 0.0), 0.0);
        reap_kills(&mut state);
        assert_eq!(state.gems[0].xp, 4.0);

        state.gems.clear();
        state.player.level = 5;
        add_enemy(&mut state, Vec2::new(300.0, 0.0), 0.0);
        reap_kills(&mut state);
        assert_eq!(state.gems[0].xp, 2.0);

        // Time bonus is halved too
        state.gems.clear();
        state.elapsed = 90.0;
        add_enemy(&mut state, Vec2::new(300.0, 0.0), 0.0);
        reap_kills(&mut state);
        assert_eq!(state.gems[0].xp, 3.0);
    }

    #[test]
    fn test_boss_loot_doubles_for_hard_variant() {
        let mut state = playing_state();
        add_enemy(&mut state, Vec2::new(300.0, 0.0), 0.0);
        state.enemies[0].kind = EnemyKind::Boss;
        state.enemies[0].elite = true;
        state.enemies[0].hard = true;
        reap_kills(&mut state);
        assert_eq!(state.chests.len(), 6);
        assert_eq!(state.gems.len(), 3 + 10);
        assert_eq!(state.vacuum_gems.len(), 1);
        assert_eq!(state.vacuum_gems[0].radius, BOSS_VACUUM_GEM_RADIUS);
    }

    #[test]
    fn test_burn_fields_take_max_not_sum() {
        let mut state = playing_state();
        add_enemy(&mut state, Vec2::new(100.0, 100.0), 500.0);
        let center = Vec2::new(100.0, 100.0);
        state.effects.push(Effect::new(
            EffectKind::BurnField { center, radius: 50.0, dps: 10.0 },
            3.0,
        ));
        state.effects.push(Effect::new(
            EffectKind::BurnField { center, radius: 50.0, dps: 16.0 },
            3.0,
        ));
        update_effects(&mut state, 0.016);
        let e = &state.enemies[0];
        assert_eq!(e.burn_dps, 16.0);
        assert!(e.burn_until > state.elapsed);
    }

    #[test]
    fn test_meteor_impacts_then_leaves_burn_field() {
        let mut state = playing_state();
        add_enemy(&mut state, Vec2::new(500.0, 500.0), 50.0);
        add_enemy(&mut state, Vec2::new(530.0, 500.0), 500.0);
        state.effects.push(Effect::new(
            EffectKind::Meteor {
                target: Vec2::new(500.0, 500.0),
                delay: 0.6,
                stage: MeteorStage::Fall,
                radius: 90.0,
            },
            0.78,
        ));
        update_effects(&mut state, 0.3);
        assert_eq!(state.enemies.len(), 2);
        update_effects(&mut state, 0.31);
        // First enemy died, second was hit and pushed outward
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].hp, 412.0);
        assert!(state.enemies[0].vel.x > 0.0);
        assert!(state
            .effects
            .iter()
            .any(|fx| matches!(fx.kind, EffectKind::BurnField { dps, .. } if dps == 32.0)));
    }

    #[test]
    fn test_meteor_uses_stats_current_at_impact() {
        let mut state = playing_state();
        add_enemy(&mut state, Vec2::new(620.0, 500.0), 500.0);
        state.effects.push(Effect::new(
            EffectKind::Meteor {
                target: Vec2::new(500.0, 500.0),
                delay: 0.6,
                stage: MeteorStage::Fall,
                radius: 90.0,
            },
            0.78,
        ));
        update_effects(&mut state, 0.3);

        // Upgraded while the meteor is still falling
        if let Some(m) = state.arsenal.meteor_mut() {
            m.impact_radius += 28.0;
            m.impact_damage = 100.0;
            m.burn_dps = 40.0;
        }
        update_effects(&mut state, 0.31);
        assert_eq!(state.enemies[0].hp, 400.0);
        assert!(state
            .effects
            .iter()
            .any(|fx| matches!(fx.kind, EffectKind::BurnField { dps, .. } if dps == 40.0)));
    }

    #[test]
    fn test_frost_cone_hits_once_and_freezes() {
        let mut state = playing_state();
        let origin = state.player.pos;
        add_enemy(&mut state, origin + Vec2::new(0.0, 115.0), 100.0);
        // Behind the player: never hit
        add_enemy(&mut state, origin + Vec2::new(0.0, -115.0), 100.0);
        state.effects.push(Effect::new(
            EffectKind::FrostCone {
                origin,
                forward: Vec2::Y,
                max_radius: 230.0,
                angle: std::f32::consts::PI / 3.0,
                damage: 18.0,
                knockback: 280.0,
                freeze_secs: 2.0,
            },
            230.0 / 520.0,
        ));
        // Radius reaches ~115 around the halfway point
        for _ in 0..30 {
            update_effects(&mut state, 0.01);
        }
        assert_eq!(state.enemies[0].hp, 82.0);
        assert!(state.enemies[0].frozen_until > 1.0);
        assert_eq!(state.enemies[1].hp, 100.0);
    }

    #[test]
    fn test_slam_hurts_only_early_and_respects_invuln() {
        let mut state = playing_state();
        let center = state.player.pos + Vec2::new(50.0, 0.0);
        state
            .effects
            .push(Effect::new(EffectKind::Slam { center, radius: 170.0 }, 0.45));
        update_effects(&mut state, 0.016);
        assert_eq!(state.player.hp, 100.0 - SLAM_DAMAGE);
        assert!(state.player.invuln > 0.0);

        // Late in the ring: no damage even without invulnerability
        state.player.invuln = 0.0;
        update_effects(&mut state, 0.1);
        assert_eq!(state.player.hp, 100.0 - SLAM_DAMAGE);
    }
}
