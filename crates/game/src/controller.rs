//! Bounded proportional controller shared by the forward motor and damping channels.

/// Output is `gain * (target - current)`, with its magnitude optionally
/// raised to a floor and capped at a ceiling. The sign always follows the error.
#[derive(Debug, Clone, PartialEq)]
pub struct ProportionalController {
    gain: f32,
    min_output: Option<f32>,
    max_output: Option<f32>,
}

impl ProportionalController {
    pub fn new(gain: f32) -> Self {
        Self {
            gain,
            min_output: None,
            max_output: None,
        }
    }

    pub fn set_min_output(&mut self, min: f32) {
        self.min_output = Some(min);
    }

    pub fn clear_min_output(&mut self) {
        self.min_output = None;
    }

    pub fn min_output(&self) -> Option<f32> {
        self.min_output
    }

    pub fn set_max_output(&mut self, max: f32) {
        self.max_output = Some(max);
    }

    pub fn clear_max_output(&mut self) {
        self.max_output = None;
    }

    pub fn max_output(&self) -> Option<f32> {
        self.max_output
    }

    /// Floor is applied before the ceiling, so a ceiling below the floor wins.
    pub fn output(&self, current: f32, target: f32) -> f32 {
        let raw = self.gain * (target - current);
        let mut magnitude = raw.abs();
        if let Some(min) = self.min_output {
            magnitude = magnitude.max(min.abs());
        }
        if let Some(max) = self.max_output {
            magnitude = magnitude.min(max.abs());
        }
        magnitude.copysign(raw)
    }
}
