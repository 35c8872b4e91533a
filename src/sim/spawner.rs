//! Enemy spawning: spawn ring, difficulty tiers, boss waves and pacing

use glam::Vec2;
use rand::Rng;

use super::state::{Enemy, EnemyKind, SimEvent, SimulationState};
use crate::{jitter, rand_range};

/// Distance beyond the viewport edge for regular spawns
const SPAWN_MARGIN: f32 = 80.0;
const BOSS_SPAWN_MARGIN: f32 = 120.0;

const MAX_TIER: u32 = 6;
const TIER_SECONDS: f32 = 55.0;

const BIG_CHANCE: f64 = 0.14;
const HARD_BOSS_CHANCE: f64 = 0.35;

/// Non-elite hp cap relative to the weakest weapon before this level
const EARLY_LEVELS: u32 = 10;
const EARLY_HP_CAP: f32 = 1.25;
const LATE_HP_SCALE_MAX: f32 = 2.6;

/// Boss pack summons
const SUMMON_COUNT: usize = 6;
const SUMMON_SPREAD: f32 = 80.0;

/// Difficulty tier at `elapsed` seconds (1..=6)
pub fn tier_at(elapsed: f32) -> u32 {
    (1 + (elapsed / TIER_SECONDS).floor() as u32).min(MAX_TIER)
}

/// Chance that a spawn is ranged
pub fn ranged_chance(elapsed: f32) -> f64 {
    f64::from((0.12 + elapsed / 260.0 * 0.05).clamp(0.12, 0.22))
}

/// Chance that a spawn is elite
pub fn elite_chance(elapsed: f32) -> f64 {
    f64::from((0.02 + elapsed / 420.0 * 0.03).clamp(0.02, 0.08))
}

/// Random point just outside one of the four viewport edges around the player
pub fn spawn_point(state: &mut SimulationState, margin: f32) -> Vec2 {
    let half = Vec2::new(
        state.tuning.viewport.width / 2.0,
        state.tuning.viewport.height / 2.0,
    );
    let p = state.player.pos;
    let rng = &mut state.rng;
    match rng.random_range(0..4) {
        0 => Vec2::new(p.x + rand_range(rng, -half.x, half.x), p.y - half.y - margin),
        1 => Vec2::new(p.x + half.x + margin, p.y + rand_range(rng, -half.y, half.y)),
        2 => Vec2::new(p.x + rand_range(rng, -half.x, half.x), p.y + half.y + margin),
        _ => Vec2::new(p.x - half.x - margin, p.y + rand_range(rng, -half.y, half.y)),
    }
}

/// Spawn one regular enemy on the spawn ring
pub fn spawn_enemy(state: &mut SimulationState) {
    let pos = spawn_point(state, SPAWN_MARGIN);
    let t = state.elapsed;
    let tier = tier_at(t) as f32;
    let level = state.player.level;
    let weakest = state.arsenal.weakest_damage();

    let rng = &mut state.rng;
    let mut kind = if rng.random_bool(ranged_chance(t)) {
        EnemyKind::Ranged
    } else {
        EnemyKind::Melee
    };
    let elite = rng.random_bool(elite_chance(t));
    let big = !elite && rng.random_bool(BIG_CHANCE);

    let mut radius = 11.0 + tier * 1.5;
    let mut hp = 24.0 + tier * 10.0 + rand_range(rng, 0.0, 10.0);
    let mut speed = 72.0 + tier * 14.0 + rand_range(rng, -8.0, 10.0);

    if kind == EnemyKind::Ranged {
        radius += 1.0;
        hp *= 0.9;
        speed *= 0.95;
    }
    if big {
        radius *= 2.0;
        hp *= 2.0;
        kind = EnemyKind::Melee;
    }

    // Early game: every regular enemy dies to ~one hit of the weakest weapon
    if !elite {
        if level < EARLY_LEVELS {
            hp = hp.min(weakest * EARLY_HP_CAP);
        } else {
            hp *= LATE_HP_SCALE_MAX.min(1.0 + 0.16 * (level - EARLY_LEVELS) as f32);
        }
    }

    if elite {
        radius *= 5.0;
        hp *= 15.0;
        speed *= 0.7;
    }

    let anim = rand_range(rng, 0.0, 10.0);
    let charge_cd = if elite { rand_range(rng, 3.0, 5.0) } else { 0.0 };

    let id = state.next_entity_id();
    let mut e = Enemy::new(id, pos, kind);
    e.radius = radius;
    e.hp = hp;
    e.speed = speed;
    e.touch_damage = (10.0 + tier * 2.0) * if elite { 1.25 } else { 1.0 };
    e.elite = elite;
    e.big = big;
    e.anim = anim;
    e.skills.charge_cd = charge_cd;
    state.enemies.push(e);
}

/// Spawn a boss on the outer spawn ring
pub fn spawn_boss(state: &mut SimulationState) {
    let pos = spawn_point(state, BOSS_SPAWN_MARGIN);
    let hard = state.rng.random_bool(HARD_BOSS_CHANCE);
    let base_hp = (1200.0 + state.elapsed * 3.2) * 5.0;

    let id = state.next_entity_id();
    let mut boss = Enemy::new(id, pos, EnemyKind::Boss);
    boss.radius = 44.0;
    boss.hp = if hard { base_hp * 2.0 } else { base_hp };
    boss.speed = 95.0;
    boss.touch_damage = 28.0;
    boss.elite = true;
    boss.hard = hard;
    boss.skills.charge_cd = 3.0;
    boss.skills.slam_cd = 5.0;
    boss.skills.summon_cd = 7.5;

    log::info!(
        "Boss spawned at {:.1}s ({} hp{})",
        state.elapsed,
        boss.hp,
        if hard { ", hard" } else { "" }
    );
    state.enemies.push(boss);
    state.events.push(SimEvent::BossSpawned { hard });
}

/// Boss summon: a pack of weak melee adds around `center`
pub fn summon_adds(state: &mut SimulationState, center: Vec2) {
    let hp = 45.0 + state.elapsed / 2.0;
    for _ in 0..SUMMON_COUNT {
        let pos = center + jitter(&mut state.rng, SUMMON_SPREAD);
        let anim = rand_range(&mut state.rng, 0.0, 10.0);
        let id = state.next_entity_id();
        let mut e = Enemy::new(id, pos, EnemyKind::Melee);
        e.radius = 14.0;
        e.hp = hp;
        e.speed = 120.0;
        e.touch_damage = 12.0;
        e.anim = anim;
        state.enemies.push(e);
    }
}

/// Accumulator-driven spawns plus the periodic boss
pub fn update_spawner(state: &mut SimulationState, dt: f32) {
    state.spawn_acc += dt;
    let interval = state.tuning.spawn.interval_at(state.elapsed);
    let extra = f64::from(state.tuning.spawn.extra_spawn_chance);
    while state.spawn_acc > interval {
        state.spawn_acc -= interval;
        spawn_enemy(state);
        spawn_enemy(state);
        if state.rng.random_bool(extra) {
            spawn_enemy(state);
        }
    }

    if !state.boss_alive() && state.elapsed >= state.next_boss_at {
        spawn_boss(state);
        state.next_boss_at += state.tuning.boss_interval;
    }
}
