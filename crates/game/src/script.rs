//! Scripted flight input for the headless driver.

use input::{AxisSource, FlightAxis};
use serde::{Deserialize, Serialize};

/// Constant control values held for a number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManeuverSegment {
    pub seconds: f32,
    #[serde(default)]
    pub thrust: f32,
    #[serde(default)]
    pub brake: f32,
    #[serde(default)]
    pub forward: f32,
    #[serde(default)]
    pub lateral: f32,
    /// Press the camera toggle on the first tick of this segment.
    #[serde(default)]
    pub toggle_camera: bool,
}

impl ManeuverSegment {
    /// All axes released.
    pub fn idle(seconds: f32) -> Self {
        Self {
            seconds,
            thrust: 0.0,
            brake: 0.0,
            forward: 0.0,
            lateral: 0.0,
            toggle_camera: false,
        }
    }
}

/// Plays a segment list back one tick at a time.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    segments: Vec<ManeuverSegment>,
    /// Each segment's length in ticks.
    ticks: Vec<u32>,
    current: usize,
    tick_in_segment: u32,
}

impl ScriptedInput {
    pub fn new(segments: Vec<ManeuverSegment>, dt: f32) -> Self {
        let ticks = segments
            .iter()
            .map(|s| (s.seconds.max(0.0) / dt).round() as u32)
            .collect();
        let mut script = Self {
            segments,
            ticks,
            current: 0,
            tick_in_segment: 0,
        };
        script.skip_empty();
        script
    }

    fn skip_empty(&mut self) {
        while self.current < self.segments.len() && self.ticks[self.current] == 0 {
            self.current += 1;
        }
    }

    /// Segment in effect this tick, if the script hasn't run out.
    pub fn segment(&self) -> Option<&ManeuverSegment> {
        self.segments.get(self.current)
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.segments.len()
    }

    /// Move to the next tick.
    pub fn advance(&mut self) {
        if self.is_finished() {
            return;
        }
        self.tick_in_segment += 1;
        if self.tick_in_segment >= self.ticks[self.current] {
            self.current += 1;
            self.tick_in_segment = 0;
            self.skip_empty();
            if let Some(next) = self.segment() {
                log::debug!("maneuver {}: {:?}", self.current, next);
            }
        }
    }
}

impl AxisSource for ScriptedInput {
    fn axis(&self, axis: FlightAxis) -> f32 {
        let Some(segment) = self.segment() else {
            return 0.0;
        };
        match axis {
            FlightAxis::Thrust => segment.thrust,
            FlightAxis::Brake => segment.brake,
            FlightAxis::Forward => segment.forward,
            FlightAxis::Lateral => segment.lateral,
        }
    }

    fn camera_toggle_pressed(&self) -> bool {
        self.tick_in_segment == 0 && self.segment().is_some_and(|s| s.toggle_camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input::FlightControls;

    const DT: f32 = 0.02;

    #[test]
    fn segments_advance_by_duration() {
        let mut script = ScriptedInput::new(
            vec![
                ManeuverSegment {
                    thrust: 1.0,
                    ..ManeuverSegment::idle(0.1)
                },
                ManeuverSegment {
                    lateral: -0.5,
                    ..ManeuverSegment::idle(0.04)
                },
            ],
            DT,
        );
        for _ in 0..5 {
            assert_eq!(script.axis(FlightAxis::Thrust), 1.0);
            script.advance();
        }
        assert_eq!(script.axis(FlightAxis::Thrust), 0.0);
        assert_eq!(script.axis(FlightAxis::Lateral), -0.5);
        script.advance();
        script.advance();
        assert!(script.is_finished());
    }

    #[test]
    fn finished_script_reads_zero() {
        let mut script = ScriptedInput::new(
            vec![ManeuverSegment {
                brake: 1.0,
                forward: 1.0,
                ..ManeuverSegment::idle(0.02)
            }],
            DT,
        );
        script.advance();
        script.advance();
        assert_eq!(FlightControls::sample(&script), FlightControls::default());
        assert!(!script.camera_toggle_pressed());
    }

    #[test]
    fn toggle_fires_on_first_tick_only() {
        let mut script = ScriptedInput::new(
            vec![ManeuverSegment {
                toggle_camera: true,
                ..ManeuverSegment::idle(0.06)
            }],
            DT,
        );
        let presses: Vec<bool> = (0..3)
            .map(|_| {
                let pressed = script.camera_toggle_pressed();
                script.advance();
                pressed
            })
            .collect();
        assert_eq!(presses, vec![true, false, false]);
    }

    #[test]
    fn zero_length_segments_are_skipped() {
        let script = ScriptedInput::new(
            vec![
                ManeuverSegment {
                    thrust: 1.0,
                    ..ManeuverSegment::idle(0.0)
                },
                ManeuverSegment {
                    brake: 1.0,
                    ..ManeuverSegment::idle(1.0)
                },
            ],
            DT,
        );
        assert_eq!(script.axis(FlightAxis::Thrust), 0.0);
        assert_eq!(script.axis(FlightAxis::Brake), 1.0);
    }
}
