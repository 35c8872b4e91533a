//! Per-frame simulation tick
//!
//! Gates on mode and pause, then runs the gameplay pipeline in a fixed order:
//! player, spawner, weapons, bullets, effects, enemies, pickups, modals.

use glam::Vec2;

use super::ai::update_enemies;
use super::combat::{collide_bullets, update_bullets, update_effects};
use super::pickup::update_pickups;
use super::progression::open_next_modal;
use super::spawner::update_spawner;
use super::state::{Facing, GameMode, SimulationState, TrailSample};
use super::weapon::update_weapons;
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Movement axes (keyboard plus joystick), each nominally in [-1, 1]
    pub movement: Vec2,
    /// Pause toggle
    pub pause: bool,
    /// Choice index picked in an open modal
    pub choice: Option<usize>,
}

/// Advance the simulation by `dt` seconds
pub fn tick(state: &mut SimulationState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause && (state.mode == GameMode::Playing || state.mode.is_choice()) {
        state.paused = !state.paused;
        log::debug!("Paused: {}", state.paused);
    }
    if state.paused {
        return;
    }

    match state.mode {
        GameMode::Playing => {}
        GameMode::LevelUp | GameMode::Chest | GameMode::Replace => {
            if let Some(index) = input.choice {
                if let Err(e) = state.choose(index) {
                    log::debug!("Ignored choice: {e}");
                }
            }
            return;
        }
        GameMode::Start | GameMode::Dead => return,
    }

    state.elapsed += dt;

    update_player(state, input.movement, dt);
    update_spawner(state, dt);
    update_weapons(state, dt);
    update_bullets(state, dt);
    collide_bullets(state);

    update_effects(state, dt);
    if state.mode == GameMode::Dead {
        return;
    }
    update_enemies(state, dt);
    if state.mode == GameMode::Dead {
        return;
    }

    update_pickups(state, dt);
    open_next_modal(state);
}

/// Movement, trail sampling, bounds and invulnerability decay
fn update_player(state: &mut SimulationState, movement: Vec2, dt: f32) {
    sample_trail(state, dt);

    let movement = if movement.is_finite() {
        movement
    } else {
        Vec2::ZERO
    };
    let p = &mut state.player;
    p.moving = movement != Vec2::ZERO;
    if p.moving {
        let dir = movement.normalize_or_zero();
        p.facing = Facing::from_vec(dir);
        p.anim += dt;
        p.pos += dir * p.speed * dt;
    } else {
        p.anim = 0.0;
    }

    if !p.pos.is_finite() {
        log::warn!("Non-finite player position {:?}; resetting", p.pos);
        p.pos = Vec2::new(PLAYER_START_X, PLAYER_START_Y);
        p.moving = false;
    }
    p.pos = p.pos.clamp(Vec2::splat(-WORLD_BOUND), Vec2::splat(WORLD_BOUND));

    p.invuln = (p.invuln - dt).max(0.0);
}

/// Record the player position every sample interval, keeping a fixed window
fn sample_trail(state: &mut SimulationState, dt: f32) {
    state.trail_acc += dt;
    if state.trail_acc < TRAIL_SAMPLE_INTERVAL {
        return;
    }
    state.trail_acc = 0.0;
    let now = state.elapsed;
    state.trail.push(TrailSample {
        pos: state.player.pos,
        t: now,
    });
    let stale = state
        .trail
        .iter()
        .take_while(|s| now - s.t > TRAIL_WINDOW)
        .count();
    state.trail.drain(..stale);
}
