//! Fixed-period tick source
//!
//! An external driver (animation frame, interval timer) feeds wall-clock deltas
//! in; the clock answers how many whole periods have elapsed. A game may run
//! several clocks at different rates, e.g. a fast physics clock and a slow
//! spawn clock.

use crate::consts::{MAX_FRAME_DELTA, MAX_SUBSTEPS};

/// Relative slack when comparing the accumulator to a period; summed f32
/// frame deltas can land a hair short of a boundary
const PERIOD_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone)]
pub struct Clock {
    /// Seconds per tick
    period: f32,
    accumulator: f32,
    /// Ticks produced since the last reset
    ticks: u64,
    /// Cap on ticks produced by a single `tick` call
    max_steps: u32,
    running: bool,
}

impl Clock {
    /// Create a stopped clock with the given period in seconds
    pub fn new(period: f32) -> Self {
        Self {
            period: period.max(f32::EPSILON),
            accumulator: 0.0,
            ticks: 0,
            max_steps: MAX_SUBSTEPS,
            running: false,
        }
    }

    pub fn from_hz(hz: f32) -> Self {
        Self::new(1.0 / hz.max(f32::EPSILON))
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    #[inline]
    pub fn period(&self) -> f32 {
        self.period
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start (or resume) producing ticks
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop producing ticks and drop any partial period
    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
    }

    /// Stop and forget all progress
    pub fn reset(&mut self) {
        self.stop();
        self.ticks = 0;
    }

    /// Feed an elapsed wall-clock delta, returning the number of ticks now due
    pub fn tick(&mut self, delta_hint: f32) -> u32 {
        if !self.running {
            return 0;
        }

        // Tab switches and debugger pauses produce huge deltas
        let delta = delta_hint.clamp(0.0, MAX_FRAME_DELTA.max(self.period));
        self.accumulator += delta;

        let due = self.period * (1.0 - PERIOD_TOLERANCE);
        let mut steps = 0;
        while self.accumulator >= due && steps < self.max_steps {
            self.accumulator -= self.period;
            steps += 1;
        }

        // Anything still owed after hitting the cap is dropped
        if steps == self.max_steps {
            self.accumulator = self.accumulator.min(self.period);
        }

        self.ticks += steps as u64;
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_clock_produces_nothing() {
        let mut clock = Clock::from_hz(60.0);
        assert_eq!(clock.tick(1.0), 0);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn test_accumulates_partial_periods() {
        let mut clock = Clock::new(0.15);
        clock.start();
        assert_eq!(clock.tick(0.1), 0);
        assert_eq!(clock.tick(0.1), 1);
        assert_eq!(clock.tick(0.15), 1);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn test_substep_cap() {
        let mut clock = Clock::new(0.01).with_max_steps(4);
        clock.start();
        assert_eq!(clock.tick(0.2), 4);
        // Backlog beyond the cap was dropped
        assert!(clock.tick(0.0) <= 1);
    }

    #[test]
    fn test_slow_clock_accepts_long_deltas() {
        let mut clock = Clock::new(2.0).with_max_steps(1);
        clock.start();
        assert_eq!(clock.tick(2.0), 1);
    }

    #[test]
    fn test_frame_deltas_do_not_drift() {
        let mut clock = Clock::new(2.0).with_max_steps(1);
        clock.start();
        let mut fired_at = Vec::new();
        for frame in 1..=1200 {
            if clock.tick(1.0 / 60.0) > 0 {
                fired_at.push(frame);
            }
        }
        assert_eq!(fired_at, (1..=10).map(|n| n * 120).collect::<Vec<_>>());
    }

    #[test]
    fn test_stop_drops_partial_period() {
        let mut clock = Clock::new(1.0);
        clock.start();
        clock.tick(0.9);
        clock.stop();
        clock.start();
        assert_eq!(clock.tick(0.2), 0);
    }
}
