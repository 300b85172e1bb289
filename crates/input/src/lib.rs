//! Input handling: keyboard state, named flight axes and the per-tick control sample.

use std::collections::HashSet;

/// Named input axes read by the flight model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightAxis {
    /// Engine throttle, 0..1.
    Thrust,
    /// Brake trigger, 0..1.
    Brake,
    /// Nose up/down, -1..1.
    Forward,
    /// Bank left/right, -1..1.
    Lateral,
}

impl FlightAxis {
    /// Valid range of the axis value.
    pub fn range(self) -> (f32, f32) {
        match self {
            FlightAxis::Thrust | FlightAxis::Brake => (0.0, 1.0),
            FlightAxis::Forward | FlightAxis::Lateral => (-1.0, 1.0),
        }
    }
}

/// Anything that can answer "what is this axis right now".
pub trait AxisSource {
    fn axis(&self, axis: FlightAxis) -> f32;

    /// True only on the tick the camera toggle was pressed.
    fn camera_toggle_pressed(&self) -> bool;
}

/// Control inputs sampled once per tick and shared by every force step of that tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlightControls {
    pub thrust: f32,
    pub brake: f32,
    pub forward: f32,
    pub lateral: f32,
}

impl FlightControls {
    /// Poll every axis once, clamped to its range.
    pub fn sample(source: &impl AxisSource) -> Self {
        let read = |axis: FlightAxis| {
            let (lo, hi) = axis.range();
            let value = source.axis(axis);
            if value.is_nan() {
                0.0
            } else {
                value.clamp(lo, hi)
            }
        };
        Self {
            thrust: read(FlightAxis::Thrust),
            brake: read(FlightAxis::Brake),
            forward: read(FlightAxis::Forward),
            lateral: read(FlightAxis::Lateral),
        }
    }
}

/// Keyboard bindings for the flight axes.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub thrust: KeyCode,
    pub brake: KeyCode,
    pub nose_up: KeyCode,
    pub nose_down: KeyCode,
    pub bank_left: KeyCode,
    pub bank_right: KeyCode,
    pub camera: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            thrust: KeyCode::Space,
            brake: KeyCode::ShiftLeft,
            nose_up: KeyCode::KeyS,
            nose_down: KeyCode::KeyW,
            bank_left: KeyCode::KeyA,
            bank_right: KeyCode::KeyD,
            camera: KeyCode::KeyC,
        }
    }
}

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,

    bindings: KeyBindings,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    fn key_axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_key_held(positive) {
            value += 1.0;
        }
        if self.is_key_held(negative) {
            value -= 1.0;
        }
        value
    }

    fn key_trigger(&self, key: KeyCode) -> f32 {
        if self.is_key_held(key) {
            1.0
        } else {
            0.0
        }
    }
}

impl AxisSource for InputState {
    fn axis(&self, axis: FlightAxis) -> f32 {
        let b = &self.bindings;
        match axis {
            FlightAxis::Thrust => self.key_trigger(b.thrust),
            FlightAxis::Brake => self.key_trigger(b.brake),
            FlightAxis::Forward => self.key_axis(b.nose_down, b.nose_up),
            FlightAxis::Lateral => self.key_axis(b.bank_left, b.bank_right),
        }
    }

    fn camera_toggle_pressed(&self) -> bool {
        self.is_key_pressed(self.bindings.camera)
    }
}

// Re-export for convenience
pub use winit::event::ElementState;
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f32);

    impl AxisSource for Fixed {
        fn axis(&self, _axis: FlightAxis) -> f32 {
            self.0
        }

        fn camera_toggle_pressed(&self) -> bool {
            false
        }
    }

    #[test]
    fn sample_clamps_each_axis_to_its_range() {
        let controls = FlightControls::sample(&Fixed(-3.0));
        assert_eq!(controls.thrust, 0.0);
        assert_eq!(controls.brake, 0.0);
        assert_eq!(controls.forward, -1.0);
        assert_eq!(controls.lateral, -1.0);

        let controls = FlightControls::sample(&Fixed(f32::NAN));
        assert_eq!(controls, FlightControls::default());
    }

    #[test]
    fn held_keys_drive_axes() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::Space, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        let controls = FlightControls::sample(&input);
        assert_eq!(controls.thrust, 1.0);
        assert_eq!(controls.brake, 0.0);
        assert_eq!(controls.lateral, 1.0);
        assert_eq!(controls.forward, -1.0);
    }

    #[test]
    fn camera_toggle_is_an_edge() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyC, ElementState::Pressed);
        assert!(input.camera_toggle_pressed());
        input.begin_frame();
        input.process_keyboard(KeyCode::KeyC, ElementState::Pressed);
        assert!(!input.camera_toggle_pressed());
        assert!(input.is_key_held(KeyCode::KeyC));
    }
}
