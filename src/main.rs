//! Dragon Fantasy headless runner
//!
//! Plays one session with a scripted autopilot and prints a JSON summary.
//!
//! Usage: `dragon-fantasy [--seed N] [--seconds S] [--tuning PATH]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use glam::Vec2;
    use serde_json::json;

    use dragon_fantasy::Tuning;
    use dragon_fantasy::sim::{FrameDriver, GameMode, SimEvent, SimulationState, TickInput};

    const FRAME_DT: f32 = 1.0 / 60.0;
    const DEFAULT_SEED: u64 = 0x5EED;
    const DEFAULT_SECONDS: f32 = 600.0;
    /// Enemies closer than this are worth running from
    const THREAT_RANGE: f32 = 260.0;

    struct Args {
        seed: u64,
        seconds: f32,
        tuning: Option<PathBuf>,
    }

    fn parse_args() -> Result<Args, String> {
        let mut args = Args {
            seed: DEFAULT_SEED,
            seconds: DEFAULT_SECONDS,
            tuning: None,
        };
        let mut it = std::env::args().skip(1);
        while let Some(flag) = it.next() {
            let value = it.next().ok_or_else(|| format!("missing value for {flag}"))?;
            match flag.as_str() {
                "--seed" => {
                    args.seed = value.parse().map_err(|e| format!("bad seed {value}: {e}"))?;
                }
                "--seconds" => {
                    args.seconds = value
                        .parse()
                        .map_err(|e| format!("bad seconds {value}: {e}"))?;
                }
                "--tuning" => args.tuning = Some(PathBuf::from(value)),
                other => return Err(format!("unknown argument {other}")),
            }
        }
        Ok(args)
    }

    /// Demo input: flee the nearest threat, otherwise drift in a slow circle,
    /// and always take the first offered choice
    fn autopilot(state: &SimulationState) -> TickInput {
        if state.mode.is_choice() {
            return TickInput {
                choice: Some(0),
                ..Default::default()
            };
        }

        let p = state.player.pos;
        let threat = state
            .enemies
            .iter()
            .filter(|e| e.is_alive())
            .map(|e| (e.pos, p.distance(e.pos) - e.radius))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let movement = match threat {
            Some((pos, d)) if d < THREAT_RANGE => (p - pos).normalize_or_zero(),
            _ => {
                let t = state.elapsed * 0.4;
                Vec2::new(t.cos(), t.sin())
            }
        };
        TickInput {
            movement,
            ..Default::default()
        }
    }

    pub fn run() {
        env_logger::init();

        let args = match parse_args() {
            Ok(args) => args,
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("usage: dragon-fantasy [--seed N] [--seconds S] [--tuning PATH]");
                std::process::exit(2);
            }
        };
        let tuning = match &args.tuning {
            Some(path) => Tuning::load_or_default(path),
            None => Tuning::default(),
        };

        log::info!(
            "Dragon Fantasy (headless) seed {} for {:.0}s",
            args.seed,
            args.seconds
        );

        let mut driver = FrameDriver::new(args.seed, tuning);
        driver.start();

        let mut bosses = 0u32;
        let mut level_ups = 0u32;
        let mut damage_taken = 0.0f32;
        while driver.state().elapsed < args.seconds && driver.state().mode != GameMode::Dead {
            let input = autopilot(driver.state());
            for event in driver.step(FRAME_DT, &input) {
                match event {
                    SimEvent::BossSpawned { .. } => bosses += 1,
                    SimEvent::LevelUpOpened { .. } => level_ups += 1,
                    SimEvent::PlayerHit { damage } => damage_taken += damage,
                    _ => {}
                }
            }
        }

        let state = driver.state();
        let weapons: Vec<_> = state
            .arsenal
            .iter()
            .filter(|w| w.enabled)
            .map(|w| json!({ "weapon": w.key, "level": w.level }))
            .collect();
        let summary = json!({
            "seed": state.seed,
            "frames": driver.frames(),
            "mode": state.mode,
            "elapsed": state.elapsed,
            "kills": state.kills,
            "level": state.player.level,
            "hp": state.player.hp,
            "weapon_slots": state.player.weapon_slots,
            "bosses": bosses,
            "level_ups": level_ups,
            "damage_taken": damage_taken,
            "weapons": weapons,
            "enemies_alive": state.enemies.len(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("Failed to encode summary: {e}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Embedders drive the library directly on the web
}
