//! Time management for the fixed-step simulation loop.

use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised while configuring the simulation clock.
#[derive(Debug, Error, PartialEq)]
pub enum TimeError {
    /// Every per-tick division in the flight model needs a positive step.
    #[error("fixed timestep must be positive and finite, got {0} s")]
    InvalidTimestep(f64),
}

/// Manages frame timing and the fixed simulation tick.
#[derive(Debug)]
pub struct Time {
    /// Time of the last frame.
    last_frame: Instant,
    /// Fixed timestep for physics (default 50 Hz).
    fixed_timestep: Duration,
    /// Accumulated time for fixed updates.
    accumulator: Duration,
    /// Fixed ticks completed since start.
    tick_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager ticking at 50 Hz.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            fixed_timestep: Duration::from_millis(20),
            accumulator: Duration::ZERO,
            tick_count: 0,
        }
    }

    /// Create a time manager with the given fixed step in seconds.
    pub fn with_fixed_timestep(seconds: f64) -> Result<Self, TimeError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(TimeError::InvalidTimestep(seconds));
        }
        Ok(Self {
            fixed_timestep: Duration::from_secs_f64(seconds),
            ..Self::new()
        })
    }

    /// Create a time manager from a tick rate in Hz.
    pub fn with_fixed_rate(hz: f64) -> Result<Self, TimeError> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(TimeError::InvalidTimestep(1.0 / hz));
        }
        Self::with_fixed_timestep(1.0 / hz)
    }

    /// Bank the wall-clock time since the last call for fixed updates.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.accumulator += now - self.last_frame;
        self.last_frame = now;
    }

    /// Get the fixed timestep in seconds.
    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Number of fixed ticks that make up `interval_seconds`, rounded to nearest.
    pub fn ticks_for_interval(&self, interval_seconds: f32) -> u32 {
        (interval_seconds / self.fixed_timestep_seconds()).round().max(0.0) as u32
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Record one completed fixed tick.
    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
    }

    /// Fixed ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulated time covered by the completed ticks, in seconds.
    pub fn simulated_seconds(&self) -> f64 {
        self.tick_count as f64 * self.fixed_timestep.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_timestep() {
        assert_eq!(Time::with_fixed_timestep(0.0).unwrap_err(), TimeError::InvalidTimestep(0.0));
        assert!(Time::with_fixed_timestep(-0.02).is_err());
        assert!(Time::with_fixed_timestep(f64::NAN).is_err());
        assert!(Time::with_fixed_rate(0.0).is_err());
    }

    #[test]
    fn scan_interval_rounds_to_ticks() {
        let time = Time::with_fixed_timestep(0.02).unwrap();
        assert_eq!(time.ticks_for_interval(0.2), 10);
        let time = Time::with_fixed_rate(60.0).unwrap();
        assert_eq!(time.ticks_for_interval(0.2), 12);
    }

    #[test]
    fn simulated_time_tracks_ticks() {
        let mut time = Time::with_fixed_rate(50.0).unwrap();
        for _ in 0..50 {
            time.advance_tick();
        }
        assert_eq!(time.tick_count(), 50);
        assert!((time.simulated_seconds() - 1.0).abs() < 1e-9);
    }
}
