//! Weapons: stats, the arsenal, and per-kind firing
//!
//! Every weapon key has exactly one [`Weapon`]. Its [`WeaponKind`] carries only
//! the parameters that targeting model needs; the update dispatches on it.

use std::f32::consts::{PI, TAU};
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::combat::{apply_knockback, damage_enemy, reap_kills};
use super::state::{Bullet, Effect, EffectKind, Enemy, MeteorStage, SimEvent, SimulationState};
use crate::consts::{BULLET_RADIUS, BULLET_TTL};
use crate::{direction, from_angle, jitter, rand_range};

/// Knockback impulses (units/s) per weapon
const BLADE_KNOCKBACK: f32 = 90.0;
const CHAIN_KNOCKBACK: f32 = 60.0;
const DRAGON_KNOCKBACK: f32 = 180.0;

/// Jitter is at most this fraction of the spread step
const SPREAD_JITTER: f32 = 0.35;
const CHAIN_BOLT_TTL: f32 = 0.16;
/// Meteor stays visible briefly after impact
const METEOR_LINGER: f32 = 0.18;

/// Frost cone: 60 degrees at level 1, +30 per level
const CONE_BASE_ANGLE: f32 = PI / 3.0;
const CONE_ANGLE_STEP: f32 = PI / 6.0;

/// Dragon zones never exceed this many
pub const DRAGON_MAX_ZONES: u32 = 6;
/// Zones granted on unlock
pub const DRAGON_UNLOCK_ZONES: u32 = 4;

/// Weapon identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKey {
    Wand,
    Bow,
    Holy,
    Blades,
    Lightning,
    Meteor,
    Frost,
    Dragon,
}

/// Slot category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponCategory {
    /// Counts against the player's weapon slots
    Equipped,
    /// Elemental magic, unbounded
    Magic,
}

impl WeaponKey {
    /// All keys, in update order
    pub const ALL: [WeaponKey; 8] = [
        WeaponKey::Wand,
        WeaponKey::Bow,
        WeaponKey::Holy,
        WeaponKey::Blades,
        WeaponKey::Lightning,
        WeaponKey::Meteor,
        WeaponKey::Frost,
        WeaponKey::Dragon,
    ];

    pub fn category(self) -> WeaponCategory {
        match self {
            WeaponKey::Wand | WeaponKey::Bow | WeaponKey::Holy | WeaponKey::Blades => {
                WeaponCategory::Equipped
            }
            _ => WeaponCategory::Magic,
        }
    }

    /// Stable id used to namespace upgrades
    pub fn as_str(self) -> &'static str {
        match self {
            WeaponKey::Wand => "wand",
            WeaponKey::Bow => "bow",
            WeaponKey::Holy => "holy",
            WeaponKey::Blades => "blades",
            WeaponKey::Lightning => "lightning",
            WeaponKey::Meteor => "meteor",
            WeaponKey::Frost => "frost",
            WeaponKey::Dragon => "dragon",
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            WeaponKey::Wand => "Arcane Wand",
            WeaponKey::Bow => "Dragon Bow",
            WeaponKey::Holy => "Holy Water",
            WeaponKey::Blades => "Whirling Blades",
            WeaponKey::Lightning => "Chain Lightning",
            WeaponKey::Meteor => "Meteor",
            WeaponKey::Frost => "Frost Shockwave",
            WeaponKey::Dragon => "Dragon Soul",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for WeaponKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bullet weapons (auto-aim, forward, cardinal)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileParams {
    pub base_cooldown: f32,
    pub damage: f32,
    pub projectiles: u32,
    /// Angle between adjacent projectiles (radians)
    pub spread: f32,
    pub speed: f32,
    pub pierce: u32,
}

/// Orbiting contact blades
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitParams {
    pub blades: u32,
    pub radius: f32,
    pub blade_radius: f32,
    pub damage: f32,
    /// Per-enemy re-hit interval
    pub tick: f32,
    pub angle: f32,
    pub angular_speed: f32,
}

/// Greedy nearest-unvisited chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainParams {
    pub base_cooldown: f32,
    pub damage: f32,
    /// Maximum chain length
    pub links: u32,
    /// Max hop distance from the previous link
    pub range: f32,
}

/// Delayed AoE with a burning field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeteorParams {
    pub base_cooldown: f32,
    pub impact_damage: f32,
    pub impact_radius: f32,
    pub burn_radius: f32,
    pub burn_dps: f32,
    pub burn_duration: f32,
    /// Fall time before impact
    pub delay: f32,
    /// Random targets land within this square around the player
    pub scatter: f32,
    pub follow_trail: bool,
    pub trail_delay: f32,
}

/// Expanding frost cone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConeParams {
    pub base_cooldown: f32,
    pub damage: f32,
    pub freeze_secs: f32,
    pub knockback: f32,
    pub max_radius: f32,
    pub expansion_speed: f32,
}

/// Figure-eight orbiting zones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragonParams {
    /// Position in the ordered upgrade sequence
    pub stage: u32,
    pub zones: u32,
    pub radius: f32,
    pub zone_size: f32,
    pub damage: f32,
    pub tick: f32,
    pub angle: f32,
    pub angular_speed: f32,
    /// Amplitude of the angular speed wobble
    pub jitter: f32,
}

/// Targeting model plus its parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeaponKind {
    AutoAim(ProjectileParams),
    Forward(ProjectileParams),
    Cardinal(ProjectileParams),
    Orbit(OrbitParams),
    Chain(ChainParams),
    Meteor(MeteorParams),
    FrostCone(ConeParams),
    Dragon(DragonParams),
}

/// One weapon instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub key: WeaponKey,
    pub enabled: bool,
    pub level: u32,
    /// Seconds until the next shot; never negative
    pub cooldown: f32,
    pub kind: WeaponKind,
}

impl Weapon {
    /// Stock stats at run start
    pub fn stock(key: WeaponKey) -> Self {
        let kind = match key {
            WeaponKey::Wand => WeaponKind::AutoAim(ProjectileParams {
                base_cooldown: 0.45,
                damage: 12.0,
                projectiles: 1,
                spread: 0.12,
                speed: 520.0,
                pierce: 0,
            }),
            WeaponKey::Bow => WeaponKind::Forward(ProjectileParams {
                base_cooldown: 0.8,
                damage: 18.0,
                projectiles: 1,
                spread: 0.03,
                speed: 620.0,
                pierce: 1,
            }),
            WeaponKey::Holy => WeaponKind::Cardinal(ProjectileParams {
                base_cooldown: 0.95,
                damage: 14.0,
                projectiles: 4,
                spread: 0.0,
                speed: 520.0,
                pierce: 1,
            }),
            WeaponKey::Blades => WeaponKind::Orbit(OrbitParams {
                blades: 1,
                radius: 46.0,
                blade_radius: 9.0,
                damage: 14.0,
                tick: 0.22,
                angle: 0.0,
                angular_speed: 3.4,
            }),
            WeaponKey::Lightning => WeaponKind::Chain(ChainParams {
                base_cooldown: 1.1,
                damage: 20.0,
                links: 6,
                range: 190.0,
            }),
            WeaponKey::Meteor => WeaponKind::Meteor(MeteorParams {
                base_cooldown: 2.4,
                impact_damage: 88.0,
                impact_radius: 90.0,
                burn_radius: 80.0,
                burn_dps: 32.0,
                burn_duration: 2.6,
                delay: 0.6,
                scatter: 320.0,
                follow_trail: false,
                trail_delay: 1.0,
            }),
            WeaponKey::Frost => WeaponKind::FrostCone(ConeParams {
                base_cooldown: 2.1,
                damage: 18.0,
                freeze_secs: 2.0,
                knockback: 280.0,
                max_radius: 230.0,
                expansion_speed: 520.0,
            }),
            WeaponKey::Dragon => WeaponKind::Dragon(DragonParams {
                stage: 0,
                zones: 2,
                radius: 120.0,
                zone_size: 42.0,
                damage: 60.0,
                tick: 0.18,
                angle: 0.0,
                angular_speed: 1.1,
                jitter: 0.45,
            }),
        };
        let enabled = key == WeaponKey::Wand;
        Self {
            key,
            enabled,
            level: u32::from(enabled),
            cooldown: 0.0,
            kind,
        }
    }

    /// Cooldown between casts, for weapons that have one
    pub fn base_cooldown_mut(&mut self) -> Option<&mut f32> {
        match &mut self.kind {
            WeaponKind::AutoAim(p) | WeaponKind::Forward(p) | WeaponKind::Cardinal(p) => {
                Some(&mut p.base_cooldown)
            }
            WeaponKind::Chain(p) => Some(&mut p.base_cooldown),
            WeaponKind::Meteor(p) => Some(&mut p.base_cooldown),
            WeaponKind::FrostCone(p) => Some(&mut p.base_cooldown),
            WeaponKind::Orbit(_) | WeaponKind::Dragon(_) => None,
        }
    }

    /// Damage of a single hit (meteor: impact damage)
    pub fn hit_damage(&self) -> f32 {
        match &self.kind {
            WeaponKind::AutoAim(p) | WeaponKind::Forward(p) | WeaponKind::Cardinal(p) => p.damage,
            WeaponKind::Orbit(p) => p.damage,
            WeaponKind::Chain(p) => p.damage,
            WeaponKind::Meteor(p) => p.impact_damage,
            WeaponKind::FrostCone(p) => p.damage,
            WeaponKind::Dragon(p) => p.damage,
        }
    }

    pub fn damage_mut(&mut self) -> &mut f32 {
        match &mut self.kind {
            WeaponKind::AutoAim(p) | WeaponKind::Forward(p) | WeaponKind::Cardinal(p) => {
                &mut p.damage
            }
            WeaponKind::Orbit(p) => &mut p.damage,
            WeaponKind::Chain(p) => &mut p.damage,
            WeaponKind::Meteor(p) => &mut p.impact_damage,
            WeaponKind::FrostCone(p) => &mut p.damage,
            WeaponKind::Dragon(p) => &mut p.damage,
        }
    }

    /// Enable the weapon, bumping a fresh weapon to level 1
    pub fn enable(&mut self) {
        self.enabled = true;
        self.level = self.level.max(1);
    }

    /// Advance the cooldown; true when ready to fire this frame
    fn tick_cooldown(&mut self, dt: f32) -> bool {
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.cooldown <= 0.0
    }
}

/// Frost cone full angle at a weapon level
pub fn cone_angle(level: u32) -> f32 {
    let steps = level.saturating_sub(1) as f32;
    (CONE_BASE_ANGLE + steps * CONE_ANGLE_STEP).clamp(CONE_BASE_ANGLE, TAU)
}

/// All weapons, indexed by key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arsenal {
    weapons: Vec<Weapon>,
}

impl Default for Arsenal {
    fn default() -> Self {
        Self::new()
    }
}

impl Arsenal {
    pub fn new() -> Self {
        Self {
            weapons: WeaponKey::ALL.iter().map(|&k| Weapon::stock(k)).collect(),
        }
    }

    pub fn get(&self, key: WeaponKey) -> &Weapon {
        &self.weapons[key.index()]
    }

    pub fn get_mut(&mut self, key: WeaponKey) -> &mut Weapon {
        &mut self.weapons[key.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Weapon> {
        self.weapons.iter_mut()
    }

    pub fn as_slice(&self) -> &[Weapon] {
        &self.weapons
    }

    /// Enabled weapons of the slot-limited category
    pub fn equipped_keys(&self) -> Vec<WeaponKey> {
        self.weapons
            .iter()
            .filter(|w| w.enabled && w.key.category() == WeaponCategory::Equipped)
            .map(|w| w.key)
            .collect()
    }

    pub fn equipped_count(&self) -> u32 {
        self.equipped_keys().len() as u32
    }

    /// Lowest single-hit damage among enabled weapons (wand stock damage if none)
    pub fn weakest_damage(&self) -> f32 {
        self.weapons
            .iter()
            .filter(|w| w.enabled)
            .map(Weapon::hit_damage)
            .reduce(f32::min)
            .unwrap_or_else(|| Weapon::stock(WeaponKey::Wand).hit_damage())
            .max(1.0)
    }

    pub fn projectile_mut(&mut self, key: WeaponKey) -> Option<&mut ProjectileParams> {
        match &mut self.get_mut(key).kind {
            WeaponKind::AutoAim(p) | WeaponKind::Forward(p) | WeaponKind::Cardinal(p) => Some(p),
            _ => None,
        }
    }

    pub fn orbit_mut(&mut self) -> Option<&mut OrbitParams> {
        match &mut self.get_mut(WeaponKey::Blades).kind {
            WeaponKind::Orbit(p) => Some(p),
            _ => None,
        }
    }

    pub fn chain_mut(&mut self) -> Option<&mut ChainParams> {
        match &mut self.get_mut(WeaponKey::Lightning).kind {
            WeaponKind::Chain(p) => Some(p),
            _ => None,
        }
    }

    pub fn meteor_mut(&mut self) -> Option<&mut MeteorParams> {
        match &mut self.get_mut(WeaponKey::Meteor).kind {
            WeaponKind::Meteor(p) => Some(p),
            _ => None,
        }
    }

    pub fn cone_mut(&mut self) -> Option<&mut ConeParams> {
        match &mut self.get_mut(WeaponKey::Frost).kind {
            WeaponKind::FrostCone(p) => Some(p),
            _ => None,
        }
    }

    pub fn meteor(&self) -> Option<&MeteorParams> {
        match &self.get(WeaponKey::Meteor).kind {
            WeaponKind::Meteor(p) => Some(p),
            _ => None,
        }
    }

    pub fn dragon(&self) -> Option<&DragonParams> {
        match &self.get(WeaponKey::Dragon).kind {
            WeaponKind::Dragon(p) => Some(p),
            _ => None,
        }
    }

    pub fn dragon_mut(&mut self) -> Option<&mut DragonParams> {
        match &mut self.get_mut(WeaponKey::Dragon).kind {
            WeaponKind::Dragon(p) => Some(p),
            _ => None,
        }
    }
}

/// Index of the nearest living enemy (first wins ties)
pub fn nearest_enemy(enemies: &[Enemy], from: Vec2) -> Option<usize> {
    let mut best = None;
    let mut best_d = f32::INFINITY;
    for (i, e) in enemies.iter().enumerate() {
        if !e.is_alive() {
            continue;
        }
        let d = e.pos.distance_squared(from);
        if d < best_d {
            best_d = d;
            best = Some(i);
        }
    }
    best
}

/// Greedy chain: nearest enemy to `origin`, then repeatedly the nearest
/// unvisited enemy within `range` of the last link
pub fn build_chain(enemies: &[Enemy], origin: Vec2, links: u32, range: f32) -> Vec<usize> {
    let Some(first) = nearest_enemy(enemies, origin) else {
        return Vec::new();
    };
    let mut chain = vec![first];
    while (chain.len() as u32) < links {
        let last = enemies[chain[chain.len() - 1]].pos;
        let mut best = None;
        let mut best_d = f32::INFINITY;
        for (i, e) in enemies.iter().enumerate() {
            if !e.is_alive() || chain.contains(&i) {
                continue;
            }
            let d = last.distance(e.pos);
            if d <= range && d < best_d {
                best = Some(i);
                best_d = d;
            }
        }
        match best {
            Some(i) => chain.push(i),
            None => break,
        }
    }
    chain
}

/// Update every enabled weapon once
pub fn update_weapons(state: &mut SimulationState, dt: f32) {
    for key in WeaponKey::ALL {
        let weapon = *state.arsenal.get(key);
        if !weapon.enabled {
            continue;
        }
        match weapon.kind {
            WeaponKind::AutoAim(p) => fire_auto_aim(state, key, p, dt),
            WeaponKind::Forward(p) => fire_forward(state, key, p, dt),
            WeaponKind::Cardinal(p) => fire_cardinal(state, key, p, dt),
            WeaponKind::Orbit(p) => update_orbit(state, p, dt),
            WeaponKind::Chain(p) => fire_chain(state, p, dt),
            WeaponKind::Meteor(p) => cast_meteor(state, p, dt),
            WeaponKind::FrostCone(p) => cast_frost(state, p, weapon.level, dt),
            WeaponKind::Dragon(p) => update_dragon(state, p, dt),
        }
    }
}

fn spawn_bullet(state: &mut SimulationState, key: WeaponKey, dir: Vec2, p: &ProjectileParams) {
    state.bullets.push(Bullet {
        pos: state.player.pos,
        vel: direction(dir) * p.speed,
        radius: BULLET_RADIUS,
        damage: p.damage,
        pierce: p.pierce,
        ttl: BULLET_TTL,
        source: key,
    });
}

/// Fan of `projectiles` bullets around `aim` with spread and jitter
fn fire_spread(state: &mut SimulationState, key: WeaponKey, p: &ProjectileParams, aim: Vec2) {
    let base = aim.y.atan2(aim.x);
    let n = p.projectiles.max(1);
    for i in 0..n {
        let offset = if n == 1 {
            0.0
        } else {
            (i as f32 - (n - 1) as f32 / 2.0) * p.spread
        };
        let wobble = rand_range(&mut state.rng, -p.spread, p.spread) * SPREAD_JITTER;
        spawn_bullet(state, key, from_angle(base + offset + wobble), p);
    }
}

fn fire_auto_aim(state: &mut SimulationState, key: WeaponKey, p: ProjectileParams, dt: f32) {
    if !state.arsenal.get_mut(key).tick_cooldown(dt) {
        return;
    }
    // No target: stay ready without firing
    let Some(target) = nearest_enemy(&state.enemies, state.player.pos) else {
        return;
    };
    let aim = state.enemies[target].pos - state.player.pos;
    fire_spread(state, key, &p, aim);
    state.arsenal.get_mut(key).cooldown = p.base_cooldown;
}

fn fire_forward(state: &mut SimulationState, key: WeaponKey, p: ProjectileParams, dt: f32) {
    if !state.arsenal.get_mut(key).tick_cooldown(dt) {
        return;
    }
    let aim = state.player.facing.forward();
    fire_spread(state, key, &p, aim);
    state.arsenal.get_mut(key).cooldown = p.base_cooldown;
}

fn fire_cardinal(state: &mut SimulationState, key: WeaponKey, p: ProjectileParams, dt: f32) {
    if !state.arsenal.get_mut(key).tick_cooldown(dt) {
        return;
    }
    for dir in [Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y] {
        spawn_bullet(state, key, dir, &p);
    }
    state.arsenal.get_mut(key).cooldown = p.base_cooldown;
}

/// Blade positions around `center` for the current orbit angle
pub fn blade_positions(center: Vec2, p: &OrbitParams) -> Vec<Vec2> {
    let n = p.blades.max(1);
    (0..n)
        .map(|i| center + from_angle(p.angle + i as f32 * TAU / n as f32) * p.radius)
        .collect()
}

fn update_orbit(state: &mut SimulationState, mut p: OrbitParams, dt: f32) {
    p.angle += p.angular_speed * dt;
    if let Some(orbit) = state.arsenal.orbit_mut() {
        orbit.angle = p.angle;
    }

    for e in &mut state.enemies {
        e.blade_hit_cd = (e.blade_hit_cd - dt).max(0.0);
    }

    let player_pos = state.player.pos;
    for blade in blade_positions(player_pos, &p) {
        for e in state.enemies.iter_mut().rev() {
            if !e.is_alive() || e.blade_hit_cd > 0.0 {
                continue;
            }
            if blade.distance(e.pos) < p.blade_radius + e.radius {
                damage_enemy(e, p.damage);
                e.blade_hit_cd = p.tick;
                apply_knockback(e, player_pos, BLADE_KNOCKBACK);
            }
        }
    }
    reap_kills(state);
}

fn fire_chain(state: &mut SimulationState, p: ChainParams, dt: f32) {
    if !state.arsenal.get_mut(WeaponKey::Lightning).tick_cooldown(dt) {
        return;
    }
    let player_pos = state.player.pos;
    let chain = build_chain(&state.enemies, player_pos, p.links, p.range);
    if chain.is_empty() {
        return;
    }

    let mut points = Vec::with_capacity(chain.len() + 1);
    points.push(player_pos);
    points.extend(chain.iter().map(|&i| state.enemies[i].pos));

    for &i in &chain {
        let e = &mut state.enemies[i];
        damage_enemy(e, p.damage);
        apply_knockback(e, player_pos, CHAIN_KNOCKBACK);
    }

    state
        .effects
        .push(Effect::new(EffectKind::ChainBolt { points }, CHAIN_BOLT_TTL));
    state.events.push(SimEvent::WeaponCast {
        weapon: WeaponKey::Lightning,
    });
    state.arsenal.get_mut(WeaponKey::Lightning).cooldown = p.base_cooldown;
    reap_kills(state);
}

/// Trail sample from roughly `delay` seconds ago (oldest if none is old enough)
pub fn trail_target(state: &SimulationState, delay: f32) -> Option<Vec2> {
    let target_t = state.elapsed - delay;
    let mut best = state.trail.first()?;
    for sample in &state.trail {
        if sample.t <= target_t {
            best = sample;
        } else {
            break;
        }
    }
    Some(best.pos)
}

fn cast_meteor(state: &mut SimulationState, p: MeteorParams, dt: f32) {
    if !state.arsenal.get_mut(WeaponKey::Meteor).tick_cooldown(dt) {
        return;
    }
    let trail = if p.follow_trail {
        trail_target(state, p.trail_delay)
    } else {
        None
    };
    let target = match trail {
        Some(pos) => pos,
        None => state.player.pos + jitter(&mut state.rng, p.scatter),
    };

    state.effects.push(Effect::new(
        EffectKind::Meteor {
            target,
            delay: p.delay,
            stage: MeteorStage::Fall,
            radius: p.impact_radius,
        },
        p.delay + METEOR_LINGER,
    ));
    state.events.push(SimEvent::WeaponCast {
        weapon: WeaponKey::Meteor,
    });
    state.arsenal.get_mut(WeaponKey::Meteor).cooldown = p.base_cooldown;
}

fn cast_frost(state: &mut SimulationState, p: ConeParams, level: u32, dt: f32) {
    if !state.arsenal.get_mut(WeaponKey::Frost).tick_cooldown(dt) {
        return;
    }
    state.effects.push(Effect::new(
        EffectKind::FrostCone {
            origin: state.player.pos,
            forward: state.player.facing.forward(),
            max_radius: p.max_radius,
            angle: cone_angle(level),
            damage: p.damage,
            knockback: p.knockback,
            freeze_secs: p.freeze_secs,
        },
        p.max_radius / p.expansion_speed,
    ));
    state.events.push(SimEvent::WeaponCast {
        weapon: WeaponKey::Frost,
    });
    state.arsenal.get_mut(WeaponKey::Frost).cooldown = p.base_cooldown;
}

/// Zone centers on a Gerono lemniscate around `center`
pub fn dragon_zone_positions(center: Vec2, p: &DragonParams, elapsed: f32) -> Vec<Vec2> {
    let n = p.zones.max(1);
    (0..n)
        .map(|i| {
            let u = p.angle + i as f32 * TAU / n as f32;
            let rad = p.radius + (elapsed * 2.3 + i as f32).sin() * 10.0;
            center + Vec2::new(u.sin() * rad, (2.0 * u).sin() * rad * 0.55)
        })
        .collect()
}

fn update_dragon(state: &mut SimulationState, mut p: DragonParams, dt: f32) {
    let elapsed = state.elapsed;
    p.angle += (p.angular_speed + (elapsed * 1.7).sin() * p.jitter) * dt;
    if let Some(dragon) = state.arsenal.dragon_mut() {
        dragon.angle = p.angle;
    }

    for e in &mut state.enemies {
        e.dragon_hit_cd = (e.dragon_hit_cd - dt).max(0.0);
    }

    let player_pos = state.player.pos;
    let hit_radius = p.zone_size * 0.9;
    for zone in dragon_zone_positions(player_pos, &p, elapsed) {
        for e in state.enemies.iter_mut().rev() {
            if !e.is_alive() || e.dragon_hit_cd > 0.0 {
                continue;
            }
            if zone.distance(e.pos) < hit_radius + e.radius {
                damage_enemy(e, p.damage);
                e.dragon_hit_cd = p.tick;
                apply_knockback(e, player_pos, DRAGON_KNOCKBACK);
            }
        }
    }
    reap_kills(state);
}
