//! Simulation state and core entity types
//!
//! Everything a run mutates lives in [`SimulationState`]. Subsystems take it
//! by `&mut` and own their collections only for the duration of their pass.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::progression::Choice;
use super::spawner;
use super::terrain::{Decoration, decorations_in};
use super::weapon::{Arsenal, Weapon, WeaponKey};
use crate::consts::*;
use crate::tuning::Tuning;

/// Current mode of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Title screen, nothing simulated yet
    Start,
    /// Active gameplay
    Playing,
    /// Level-up choice modal open
    LevelUp,
    /// Chest reward modal open
    Chest,
    /// Slots are full; choose a weapon to swap out (or skip)
    Replace,
    /// Run ended
    Dead,
}

impl GameMode {
    /// True while a choice modal is waiting for input
    pub fn is_choice(self) -> bool {
        matches!(self, GameMode::LevelUp | GameMode::Chest | GameMode::Replace)
    }
}

/// Four-way facing used by forward-firing weapons and sprites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    #[default]
    Down,
    Left,
    Right,
    Up,
}

impl Facing {
    /// Dominant axis of `v` (ties go vertical)
    pub fn from_vec(v: Vec2) -> Self {
        if v.x.abs() > v.y.abs() {
            if v.x > 0.0 { Facing::Right } else { Facing::Left }
        } else if v.y > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        }
    }

    /// Unit vector (screen space, +y is down)
    pub fn forward(self) -> Vec2 {
        match self {
            Facing::Down => Vec2::Y,
            Facing::Left => Vec2::NEG_X,
            Facing::Right => Vec2::X,
            Facing::Up => Vec2::NEG_Y,
        }
    }
}

/// The controllable actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    /// May exceed `hp_max` (overheal buffer, capped at 1.5x)
    pub hp: f32,
    pub hp_max: f32,
    pub speed: f32,
    /// Seconds of remaining touch immunity
    pub invuln: f32,
    pub level: u32,
    pub xp: f32,
    pub xp_need: f32,
    /// Gems inside this radius are pulled toward the player
    pub magnet: f32,
    pub weapon_slots: u32,
    pub weapon_slots_max: u32,
    /// Last nonzero movement facing
    pub facing: Facing,
    pub moving: bool,
    pub anim: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_START_X, PLAYER_START_Y),
            radius: PLAYER_RADIUS,
            hp: PLAYER_HP,
            hp_max: PLAYER_HP,
            speed: PLAYER_SPEED,
            invuln: 0.0,
            level: 1,
            xp: 0.0,
            xp_need: PLAYER_XP_NEED,
            magnet: PLAYER_MAGNET,
            weapon_slots: WEAPON_SLOTS,
            weapon_slots_max: WEAPON_SLOTS_MAX,
            facing: Facing::Down,
            moving: false,
            anim: 0.0,
        }
    }
}

impl Player {
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }
}

/// Enemy archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Melee,
    Ranged,
    Boss,
}

/// Skill timers used by elites and bosses
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SkillTimers {
    pub charge_cd: f32,
    /// Telegraph time left before the dash starts
    pub charge_windup: f32,
    /// Dash time left
    pub charge_time: f32,
    /// Dash velocity, locked when the telegraph starts
    pub charge_vel: Vec2,
    pub slam_cd: f32,
    pub slam_windup: f32,
    pub summon_cd: f32,
}

impl SkillTimers {
    /// Mid-charge, either telegraphing or dashing
    pub fn is_charging(&self) -> bool {
        self.charge_windup > 0.0 || self.charge_time > 0.0
    }
}

/// A hostile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub speed: f32,
    pub touch_damage: f32,
    /// Knockback velocity, damped every frame
    pub vel: Vec2,
    pub kind: EnemyKind,
    pub elite: bool,
    /// Big brute variant (never elite)
    pub big: bool,
    /// Hard boss variant (double hp, double chests)
    pub hard: bool,
    pub frozen_until: f32,
    pub burn_until: f32,
    pub burn_dps: f32,
    pub blade_hit_cd: f32,
    pub dragon_hit_cd: f32,
    /// Last time the frost cone hit this enemy
    pub cone_hit_at: Option<f32>,
    pub facing: Facing,
    pub anim: f32,
    pub skills: SkillTimers,
}

impl Enemy {
    pub fn new(id: u32, pos: Vec2, kind: EnemyKind) -> Self {
        Self {
            id,
            pos,
            radius: 11.0,
            hp: 1.0,
            speed: 0.0,
            touch_damage: 0.0,
            vel: Vec2::ZERO,
            kind,
            elite: false,
            big: false,
            hard: false,
            frozen_until: 0.0,
            burn_until: 0.0,
            burn_dps: 0.0,
            blade_hit_cd: 0.0,
            dragon_hit_cd: 0.0,
            cone_hit_at: None,
            facing: Facing::Down,
            anim: 0.0,
            skills: SkillTimers::default(),
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    #[inline]
    pub fn is_boss(&self) -> bool {
        self.kind == EnemyKind::Boss
    }
}

/// A player projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    /// Extra enemies this bullet may pass through
    pub pierce: u32,
    pub ttl: f32,
    pub source: WeaponKey,
}

/// Experience gem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gem {
    pub pos: Vec2,
    pub radius: f32,
    pub xp: f32,
}

/// Payload-free pickup (chest, slot orb, vacuum gem)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub pos: Vec2,
    pub radius: f32,
}

/// Heal potion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealPotion {
    pub pos: Vec2,
    pub radius: f32,
    pub amount: f32,
}

/// Stage of a falling meteor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeteorStage {
    Fall,
    Impact,
}

/// Transient area/visual effect. Several carry gameplay behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EffectKind {
    /// Chain lightning polyline (player first)
    ChainBolt { points: Vec<Vec2> },
    /// Telegraphed meteor; detonates when `age >= delay` with the meteor
    /// stats current at that moment
    Meteor {
        target: Vec2,
        delay: f32,
        stage: MeteorStage,
        /// Impact radius at cast time, for the telegraph
        radius: f32,
    },
    /// Burning ground that keeps enemies inside on fire
    BurnField { center: Vec2, radius: f32, dps: f32 },
    /// Expanding frost cone, recentered on the player each frame
    FrostCone {
        origin: Vec2,
        forward: Vec2,
        max_radius: f32,
        /// Full cone angle (radians)
        angle: f32,
        damage: f32,
        knockback: f32,
        freeze_secs: f32,
    },
    /// Charge warning line for elites and bosses
    ChargeTelegraph { origin: Vec2, dir: Vec2, boss: bool },
    /// Boss slam warning ring
    SlamWarning { center: Vec2, radius: f32 },
    /// Boss slam shock ring; hurts the player early in its life
    Slam { center: Vec2, radius: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub age: f32,
    pub ttl: f32,
}

impl Effect {
    pub fn new(kind: EffectKind, ttl: f32) -> Self {
        Self { kind, age: 0.0, ttl }
    }
}

/// Sampled player position for meteor trail-follow
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrailSample {
    pub pos: Vec2,
    pub t: f32,
}

/// Pickup categories reported to UI/audio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupEvent {
    Xp { amount: f32 },
    Heal { amount: f32 },
    SlotOrb { slots: u32 },
    Chest,
    Vacuum,
}

/// Discrete events emitted during a frame (drained by the driver)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    RunStarted,
    Kill {
        pos: Vec2,
        kind: EnemyKind,
        elite: bool,
    },
    Pickup(PickupEvent),
    LevelUpOpened {
        level: u32,
        choices: Vec<String>,
    },
    ChestOpened {
        choices: Vec<String>,
    },
    WeaponReplaceNeeded {
        weapon: WeaponKey,
        equipped: Vec<WeaponKey>,
    },
    ChoiceApplied {
        id: String,
    },
    PlayerHit {
        damage: f32,
    },
    WeaponCast {
        weapon: WeaponKey,
    },
    BossSpawned {
        hard: bool,
    },
    Death {
        elapsed: f32,
        kills: u32,
        level: u32,
    },
}

/// Read-only view of the run for rendering collaborators
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub mode: GameMode,
    pub paused: bool,
    pub elapsed: f32,
    pub kills: u32,
    pub player: &'a Player,
    pub weapons: &'a [Weapon],
    pub enemies: &'a [Enemy],
    pub bullets: &'a [Bullet],
    pub gems: &'a [Gem],
    pub chests: &'a [Pickup],
    pub slot_orbs: &'a [Pickup],
    pub vacuum_gems: &'a [Pickup],
    pub heals: &'a [HealPotion],
    pub effects: &'a [Effect],
    pub choices: &'a [Choice],
    /// Decorations in the viewport centered on the player
    pub decorations: Vec<Decoration>,
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub tuning: Tuning,
    /// Session seed
    pub seed: u64,
    pub rng: Pcg32,
    pub mode: GameMode,
    pub paused: bool,
    /// Simulated seconds of play (frozen while paused or choosing)
    pub elapsed: f32,
    pub kills: u32,
    pub next_boss_at: f32,
    pub spawn_acc: f32,
    pub trail_acc: f32,
    pub player: Player,
    pub arsenal: Arsenal,
    pub bullets: Vec<Bullet>,
    pub enemies: Vec<Enemy>,
    pub gems: Vec<Gem>,
    pub chests: Vec<Pickup>,
    pub slot_orbs: Vec<Pickup>,
    pub vacuum_gems: Vec<Pickup>,
    pub heals: Vec<HealPotion>,
    pub effects: Vec<Effect>,
    pub trail: Vec<TrailSample>,
    /// Choices of the open modal
    pub choices: Vec<Choice>,
    /// Level-up modals still to show
    pub pending_level_ups: u32,
    /// Chest modals still to show
    pub pending_chests: u32,
    /// Weapon waiting on the replace modal
    pub pending_unlock: Option<WeaponKey>,
    pub events: Vec<SimEvent>,
    next_id: u32,
}

impl SimulationState {
    /// Create a session on the start screen
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            next_boss_at: tuning.boss_interval,
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            mode: GameMode::Start,
            paused: false,
            elapsed: 0.0,
            kills: 0,
            spawn_acc: 0.0,
            trail_acc: 0.0,
            player: Player::default(),
            arsenal: Arsenal::new(),
            bullets: Vec::new(),
            enemies: Vec::new(),
            gems: Vec::new(),
            chests: Vec::new(),
            slot_orbs: Vec::new(),
            vacuum_gems: Vec::new(),
            heals: Vec::new(),
            effects: Vec::new(),
            trail: Vec::new(),
            choices: Vec::new(),
            pending_level_ups: 0,
            pending_chests: 0,
            pending_unlock: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Begin a run from the start screen or after death
    ///
    /// Returns false (and does nothing) mid-run; use [`Self::reset`] there.
    pub fn start(&mut self) -> bool {
        if !matches!(self.mode, GameMode::Start | GameMode::Dead) {
            return false;
        }
        self.reset();
        true
    }

    /// Reset everything to initial values and seed the opening enemies
    pub fn reset(&mut self) {
        self.mode = GameMode::Playing;
        self.paused = false;
        self.elapsed = 0.0;
        self.kills = 0;
        self.next_boss_at = self.tuning.boss_interval;
        self.spawn_acc = 0.0;
        self.trail_acc = 0.0;
        self.player = Player::default();
        self.arsenal = Arsenal::new();
        self.bullets.clear();
        self.enemies.clear();
        self.gems.clear();
        self.chests.clear();
        self.slot_orbs.clear();
        self.vacuum_gems.clear();
        self.heals.clear();
        self.effects.clear();
        self.trail.clear();
        self.choices.clear();
        self.pending_level_ups = 0;
        self.pending_chests = 0;
        self.pending_unlock = None;
        self.events.clear();

        for _ in 0..self.tuning.initial_enemies {
            spawner::spawn_enemy(self);
        }
        self.events.push(SimEvent::RunStarted);
        log::info!(
            "Run started (seed {}, {} opening enemies)",
            self.seed,
            self.enemies.len()
        );
    }

    /// Take this frame's events
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Enabled weapons that occupy a slot
    pub fn equipped_count(&self) -> u32 {
        self.arsenal.equipped_count()
    }

    /// Whether an enemy of kind `Boss` is alive
    pub fn boss_alive(&self) -> bool {
        self.enemies.iter().any(|e| e.is_boss() && e.is_alive())
    }

    /// Mark the run over once the player has no hp left
    pub fn check_death(&mut self) {
        if self.mode == GameMode::Dead || self.player.is_alive() {
            return;
        }
        self.mode = GameMode::Dead;
        self.choices.clear();
        self.events.push(SimEvent::Death {
            elapsed: self.elapsed,
            kills: self.kills,
            level: self.player.level,
        });
        log::info!(
            "Player died at {:.1}s (level {}, {} kills)",
            self.elapsed,
            self.player.level,
            self.kills
        );
    }

    /// Borrowed view for renderers
    pub fn visible_decorations(&self) -> Vec<Decoration> {
        let view = self.tuning.viewport;
        let half = Vec2::new(view.width, view.height) / 2.0;
        decorations_in(self.player.pos - half, self.player.pos + half)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            mode: self.mode,
            paused: self.paused,
            elapsed: self.elapsed,
            kills: self.kills,
            player: &self.player,
            weapons: self.arsenal.as_slice(),
            enemies: &self.enemies,
            bullets: &self.bullets,
            gems: &self.gems,
            chests: &self.chests,
            slot_orbs: &self.slot_orbs,
            vacuum_gems: &self.vacuum_gems,
            heals: &self.heals,
            effects: &self.effects,
            choices: &self.choices,
            decorations: self.visible_decorations(),
        }
    }
}
