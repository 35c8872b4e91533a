//! Deterministic simulation module
//!
//! All gameplay logic lives here. For a given seed and input sequence a run
//! replays identically:
//! - Seeded RNG only (one `Pcg32` per session)
//! - Stable iteration order (insertion order of every collection)
//! - No rendering, audio or platform dependencies

pub mod ai;
pub mod combat;
pub mod driver;
pub mod pickup;
pub mod progression;
pub mod spawner;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod weapon;

pub use driver::FrameDriver;
pub use progression::{
    CHEST_POOL, ChestReward, Choice, ChoiceError, UPGRADE_POOL, Upgrade, xp_need_for,
};
pub use state::{
    Bullet, Effect, EffectKind, Enemy, EnemyKind, Facing, GameMode, Gem, HealPotion, Pickup,
    PickupEvent, Player, SimEvent, SimulationState, Snapshot,
};
pub use tick::{TickInput, tick};
pub use weapon::{Arsenal, Weapon, WeaponCategory, WeaponKey, WeaponKind};
