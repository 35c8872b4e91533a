//! Dragon Fantasy - A top-down horde survival simulation
//!
//! Core modules:
//! - `sim`: Simulation core (weapons, combat, spawning, AI, progression)
//! - `tuning`: Data-driven game balance and runtime configuration
//!
//! Rendering, audio, localization and input capture live outside this crate.
//! They consume snapshots and events from [`sim::SimulationState`] and feed it
//! a normalized [`sim::TickInput`] each frame.

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

use glam::Vec2;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the driver will feed the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Player defaults
    pub const PLAYER_START_X: f32 = 16.0;
    pub const PLAYER_START_Y: f32 = 16.0;
    pub const PLAYER_RADIUS: f32 = 14.0;
    pub const PLAYER_HP: f32 = 100.0;
    pub const PLAYER_SPEED: f32 = 220.0;
    pub const PLAYER_MAGNET: f32 = 70.0;
    pub const PLAYER_XP_NEED: f32 = 30.0;
    pub const WEAPON_SLOTS: u32 = 4;
    pub const WEAPON_SLOTS_MAX: u32 = 6;
    /// Heal potions may push hp up to this multiple of max hp
    pub const OVERHEAL_CAP: f32 = 1.5;
    /// Keeps an endless map in sane float range
    pub const WORLD_BOUND: f32 = 10_000_000.0;

    /// Trail sampling for meteor trail-follow (~8 Hz, 6 s window)
    pub const TRAIL_SAMPLE_INTERVAL: f32 = 0.12;
    pub const TRAIL_WINDOW: f32 = 6.0;

    /// Bullets
    pub const BULLET_RADIUS: f32 = 4.0;
    pub const BULLET_TTL: f32 = 1.6;

    /// Knockback velocity decays as `v *= KNOCKBACK_DAMPING^dt`
    pub const KNOCKBACK_DAMPING: f32 = 0.02;

    /// Pickups
    pub const GEM_RADIUS: f32 = 6.0;
    pub const CHEST_RADIUS: f32 = 12.0;
    pub const SLOT_ORB_RADIUS: f32 = 10.0;
    pub const VACUUM_GEM_RADIUS: f32 = 12.0;
    pub const BOSS_VACUUM_GEM_RADIUS: f32 = 14.0;
    pub const HEAL_RADIUS: f32 = 12.0;
    pub const HEAL_AMOUNT: f32 = 25.0;
    pub const MAGNET_PULL_SPEED: f32 = 420.0;

    /// Level-up choices offered per modal
    pub const CHOICES_PER_MODAL: usize = 3;

    /// Boss waves
    pub const BOSS_INTERVAL: f32 = 300.0;
}

/// Unit vector toward `v`, or zero for a degenerate vector
#[inline]
pub fn direction(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Uniform float in `[lo, hi)`; tolerates `lo == hi`
#[inline]
pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    lo + rng.random::<f32>() * (hi - lo)
}

/// Random offset inside the axis-aligned square `[-spread, spread]²`
#[inline]
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, spread: f32) -> Vec2 {
    Vec2::new(
        rand_range(rng, -spread, spread),
        rand_range(rng, -spread, spread),
    )
}

/// Unit vector at angle `theta`
#[inline]
pub fn from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
