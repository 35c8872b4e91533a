//! Frame driver: owns a session and turns wall-clock time into clamped ticks

use super::state::{SimEvent, SimulationState};
use super::tick::{TickInput, tick};
use crate::tuning::Tuning;

/// Top-level owner of one simulation session
#[derive(Debug, Clone)]
pub struct FrameDriver {
    state: SimulationState,
    /// Timestamp of the previous frame (seconds)
    last_time: Option<f64>,
    frames: u64,
}

impl FrameDriver {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self {
            state: SimulationState::new(seed, tuning),
            last_time: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Frames stepped so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Begin a run (start screen or dead screen only)
    pub fn start(&mut self) -> bool {
        self.state.start()
    }

    /// Throw the session away and start a fresh run with a new seed
    pub fn restart(&mut self, seed: u64) {
        let tuning = self.state.tuning.clone();
        self.state = SimulationState::new(seed, tuning);
        self.state.start();
        self.last_time = None;
        log::info!("Restarted with seed {seed}");
    }

    /// Clamp a raw frame delta: non-finite or negative becomes zero
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt < 0.0 {
            return 0.0;
        }
        dt.min(self.state.tuning.max_frame_dt)
    }

    /// Run one frame with an explicit delta and return its events
    pub fn step(&mut self, dt: f32, input: &TickInput) -> Vec<SimEvent> {
        let dt = self.clamp_dt(dt);
        tick(&mut self.state, input, dt);
        self.frames += 1;
        self.state.drain_events()
    }

    /// Run one frame at wall-clock time `now` (seconds)
    ///
    /// The first frame after construction or restart advances by zero.
    pub fn frame_at(&mut self, now: f64, input: &TickInput) -> Vec<SimEvent> {
        let dt = match self.last_time {
            Some(last) => (now - last) as f32,
            None => 0.0,
        };
        self.last_time = Some(now);
        self.step(dt, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameMode;

    #[test]
    fn test_clamp_dt() {
        let driver = FrameDriver::new(1, Tuning::default());
        assert_eq!(driver.clamp_dt(0.016), 0.016);
        assert_eq!(driver.clamp_dt(3.0), 0.05);
        assert_eq!(driver.clamp_dt(-1.0), 0.0);
        assert_eq!(driver.clamp_dt(f32::NAN), 0.0);
        assert_eq!(driver.clamp_dt(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_stall_advances_at_most_one_clamp() {
        let mut driver = FrameDriver::new(1, Tuning::default());
        driver.start();
        let input = TickInput::default();
        driver.frame_at(10.0, &input);
        assert_eq!(driver.state().elapsed, 0.0);
        // A ten second stall (tab in background)
        driver.frame_at(20.0, &input);
        assert!((driver.state().elapsed - 0.05).abs() < 1e-6);
        assert_eq!(driver.frames(), 2);
    }

    #[test]
    fn test_step_drains_events() {
        let mut driver = FrameDriver::new(2, Tuning::default());
        driver.start();
        let events = driver.step(0.016, &TickInput::default());
        assert!(events.contains(&SimEvent::RunStarted));
        assert!(driver.state().events.is_empty());
        let events = driver.step(0.016, &TickInput::default());
        assert!(!events.contains(&SimEvent::RunStarted));
    }

    #[test]
    fn test_restart_resets_session() {
        let mut driver = FrameDriver::new(3, Tuning::default());
        driver.start();
        for _ in 0..30 {
            driver.step(0.016, &TickInput::default());
        }
        driver.restart(99);
        assert_eq!(driver.state().seed, 99);
        assert_eq!(driver.state().mode, GameMode::Playing);
        assert_eq!(driver.state().elapsed, 0.0);
    }
}
