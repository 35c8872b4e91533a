//! Enemy behaviour: status effects, movement, elite and boss skills, touch damage

use glam::Vec2;
use rand_pcg::Pcg32;

use super::combat::{damage_enemy, reap_kills};
use super::spawner::summon_adds;
use super::state::{
    Effect, EffectKind, Enemy, EnemyKind, Facing, Player, SimEvent, SimulationState,
};
use crate::consts::KNOCKBACK_DAMPING;
use crate::{direction, rand_range};

/// Ranged enemies hold this distance band
const RANGED_MAX: f32 = 280.0;
const RANGED_MIN: f32 = 190.0;
const STRAFE_MUL: f32 = 0.25;

/// Elite charge
const ELITE_CHARGE_RANGE: f32 = 380.0;
const ELITE_CHARGE_WINDUP: f32 = 0.35;
const ELITE_CHARGE_SPEED: f32 = 440.0;
const ELITE_CHARGE_TIME: f32 = 0.35;

/// Boss skills
const BOSS_CHARGE_RANGE: f32 = 520.0;
const BOSS_CHARGE_WINDUP: f32 = 0.55;
const BOSS_CHARGE_SPEED: f32 = 520.0;
const BOSS_CHARGE_TIME: f32 = 0.55;
const BOSS_CHARGE_CD: f32 = 4.2;
const BOSS_SLAM_RANGE: f32 = 260.0;
const BOSS_SLAM_WINDUP: f32 = 0.55;
const BOSS_SLAM_RADIUS: f32 = 170.0;
const BOSS_SLAM_TTL: f32 = 0.45;
const BOSS_SLAM_CD: f32 = 6.5;
const BOSS_SUMMON_CD: f32 = 9.5;

/// Touch damage response
const TOUCH_INVULN: f32 = 0.55;
const BOSS_TOUCH_INVULN: f32 = 0.70;
const TOUCH_PUSH: f32 = 14.0;
const BOSS_TOUCH_PUSH: f32 = 26.0;

/// What a skill step asks of the caller
#[derive(Debug, Default)]
struct SkillOutcome {
    /// Skip regular movement this frame
    hold: bool,
    effect: Option<Effect>,
    summon: bool,
}

/// Per-frame context shared by every enemy
struct Frame {
    now: f32,
    dt: f32,
    target: Vec2,
}

fn chase(e: &mut Enemy, dir: Vec2, dt: f32) {
    e.pos += dir * e.speed * dt;
}

fn ranged_move(e: &mut Enemy, dir: Vec2, d: f32, dt: f32) {
    if d > RANGED_MAX {
        e.pos += dir * e.speed * dt;
    } else if d < RANGED_MIN {
        e.pos -= dir * e.speed * dt;
    } else {
        e.pos += dir.perp() * e.speed * STRAFE_MUL * dt;
    }
}

fn base_move(e: &mut Enemy, dir: Vec2, d: f32, dt: f32) {
    match e.kind {
        EnemyKind::Ranged => ranged_move(e, dir, d, dt),
        EnemyKind::Melee | EnemyKind::Boss => chase(e, dir, dt),
    }
}

/// Advance a running charge (telegraph, then dash); false when idle
fn continue_charge(e: &mut Enemy, dt: f32) -> bool {
    let s = &mut e.skills;
    if s.charge_windup > 0.0 {
        s.charge_windup -= dt;
        if s.charge_windup <= 0.0 {
            s.charge_windup = 0.0;
            s.charge_time = if e.kind == EnemyKind::Boss {
                BOSS_CHARGE_TIME
            } else {
                ELITE_CHARGE_TIME
            };
        }
        return true;
    }
    if s.charge_time > 0.0 {
        e.pos += s.charge_vel * dt;
        s.charge_time -= dt;
        return true;
    }
    false
}

/// Lock a dash toward `target` and return its telegraph
fn begin_charge(e: &mut Enemy, target: Vec2, windup: f32, speed: f32, boss: bool) -> Effect {
    let dir = direction(target - e.pos);
    e.skills.charge_vel = dir * speed;
    e.skills.charge_windup = windup;
    Effect::new(
        EffectKind::ChargeTelegraph {
            origin: e.pos,
            dir,
            boss,
        },
        windup,
    )
}

fn elite_step(e: &mut Enemy, f: &Frame, rng: &mut Pcg32) -> SkillOutcome {
    let s = &mut e.skills;
    s.charge_cd = (s.charge_cd - f.dt).max(0.0);
    if continue_charge(e, f.dt) {
        return SkillOutcome {
            hold: true,
            ..Default::default()
        };
    }
    if e.skills.charge_cd <= 0.0 && e.pos.distance(f.target) < ELITE_CHARGE_RANGE {
        e.skills.charge_cd = rand_range(rng, 3.5, 6.0);
        let tell = begin_charge(e, f.target, ELITE_CHARGE_WINDUP, ELITE_CHARGE_SPEED, false);
        return SkillOutcome {
            hold: true,
            effect: Some(tell),
            summon: false,
        };
    }
    SkillOutcome::default()
}

fn boss_step(e: &mut Enemy, f: &Frame) -> SkillOutcome {
    let s = &mut e.skills;
    s.charge_cd = (s.charge_cd - f.dt).max(0.0);
    s.slam_cd = (s.slam_cd - f.dt).max(0.0);
    s.summon_cd = (s.summon_cd - f.dt).max(0.0);

    if continue_charge(e, f.dt) {
        return SkillOutcome {
            hold: true,
            ..Default::default()
        };
    }

    let s = &mut e.skills;
    if s.slam_windup > 0.0 {
        s.slam_windup -= f.dt;
        let mut out = SkillOutcome {
            hold: true,
            ..Default::default()
        };
        if s.slam_windup <= 0.0 {
            s.slam_windup = 0.0;
            s.slam_cd = BOSS_SLAM_CD;
            out.effect = Some(Effect::new(
                EffectKind::Slam {
                    center: e.pos,
                    radius: BOSS_SLAM_RADIUS,
                },
                BOSS_SLAM_TTL,
            ));
        }
        return out;
    }

    let d = e.pos.distance(f.target);
    if e.skills.charge_cd <= 0.0 && d < BOSS_CHARGE_RANGE {
        e.skills.charge_cd = BOSS_CHARGE_CD;
        let tell = begin_charge(e, f.target, BOSS_CHARGE_WINDUP, BOSS_CHARGE_SPEED, true);
        return SkillOutcome {
            hold: true,
            effect: Some(tell),
            summon: false,
        };
    }
    if e.skills.slam_cd <= 0.0 && d < BOSS_SLAM_RANGE {
        e.skills.slam_windup = BOSS_SLAM_WINDUP;
        return SkillOutcome {
            hold: true,
            effect: Some(Effect::new(
                EffectKind::SlamWarning {
                    center: e.pos,
                    radius: BOSS_SLAM_RADIUS,
                },
                BOSS_SLAM_WINDUP,
            )),
            summon: false,
        };
    }
    if e.skills.summon_cd <= 0.0 {
        e.skills.summon_cd = BOSS_SUMMON_CD;
        return SkillOutcome {
            hold: true,
            effect: None,
            summon: true,
        };
    }
    SkillOutcome::default()
}

/// Contact damage; true when the player was hit
fn touch(e: &Enemy, player: &mut Player) -> bool {
    if player.invuln > 0.0 || e.pos.distance(player.pos) >= e.radius + player.radius {
        return false;
    }
    let boss = e.is_boss();
    player.hp -= e.touch_damage;
    player.invuln = if boss { BOSS_TOUCH_INVULN } else { TOUCH_INVULN };
    let push = if boss { BOSS_TOUCH_PUSH } else { TOUCH_PUSH };
    player.pos += direction(player.pos - e.pos) * push;
    true
}

/// Update every enemy once
pub fn update_enemies(state: &mut SimulationState, dt: f32) {
    let now = state.elapsed;
    let damping = KNOCKBACK_DAMPING.powf(dt);
    let mut summons = Vec::new();

    for i in 0..state.enemies.len() {
        let f = Frame {
            now,
            dt,
            target: state.player.pos,
        };
        let e = &mut state.enemies[i];

        if f.now < e.burn_until {
            let burn = e.burn_dps * f.dt;
            damage_enemy(e, burn);
        } else {
            e.burn_dps = 0.0;
        }
        if !e.is_alive() {
            continue;
        }

        if f.now >= e.frozen_until {
            let to_player = f.target - e.pos;
            let d = to_player.length();
            let dir = direction(to_player);

            let outcome = match (e.kind, e.elite) {
                (EnemyKind::Boss, _) => boss_step(e, &f),
                (_, true) => elite_step(e, &f, &mut state.rng),
                _ => SkillOutcome::default(),
            };
            if !outcome.hold {
                base_move(e, dir, d, f.dt);
            }
            if dir != Vec2::ZERO {
                e.facing = Facing::from_vec(dir);
            }
            e.anim += f.dt;
            if let Some(fx) = outcome.effect {
                state.effects.push(fx);
            }
            if outcome.summon {
                summons.push(state.enemies[i].pos);
            }
        }

        let e = &mut state.enemies[i];
        e.pos += e.vel * dt;
        e.vel *= damping;

        if touch(e, &mut state.player) {
            let damage = e.touch_damage;
            state.events.push(SimEvent::PlayerHit { damage });
        }
    }

    for center in summons {
        summon_adds(state, center);
    }
    reap_kills(state);
    state.check_death();
}
