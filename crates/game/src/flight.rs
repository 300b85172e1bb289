//! Ship flight model: turns the control sample and the gravity snapshot into
//! one tick's force and torque on the ship body.
//!
//! Body axes: right = +X, up = +Y, forward = -Z. Three angular channels are controlled:
//! - turn: about the back axis, driven by lateral input
//! - steer: about the right axis, driven by forward input
//! - spin: about the up axis, always damped to zero

use engine_core::{AppliedForces, Axis, Quat, RigidBodyState, Vec3, WorldBounds};
use glam::EulerRot;
use input::FlightControls;
use physics::SpatialQuery;
use serde::{Deserialize, Serialize};

use crate::controller::ProportionalController;
use crate::gravity::{GravitySampler, GravitySource};
use crate::telemetry::TelemetrySink;

/// Below this target speed the motor is braking or holding still.
const IDLE_TARGET_SPEED: f32 = 0.1;
/// Up-vector misalignment (degrees) still counted as resting on a platform, either way up.
const LANDING_ALIGNMENT_DEGREES: f32 = 45.0;

pub const SPEED_UI_KEY: &str = "Speed";
pub const UP_SPEED_UI_KEY: &str = "UpSpeed";
pub const GRAVITY_UI_KEY: &str = "Grav";
pub const LANDED_UI_KEY: &str = "Landed";

/// Flight tuning. Per-mass coefficients are multiplied by the body mass each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightTuning {
    pub max_speed: f32,
    pub fwd_acc_ratio: f32,
    pub min_fwd_decel: f32,
    pub fwd_damping_ratio: f32,
    pub min_fwd_damping: f32,

    pub max_turn_rate: f32,
    pub turn_acc_ratio: f32,
    pub turn_decel_ratio: f32,
    /// Forward speed below which turning is scaled down linearly.
    pub turn_scale_down_speed: f32,

    pub max_steer_rate: f32,
    pub steer_acc_ratio: f32,
    /// Stronger steering while landed so the ship can lift off.
    pub steer_landed_acc_ratio: f32,
    pub steer_decel_ratio: f32,
    pub steer_scale_down_speed: f32,

    pub drag_per_mass: f32,
    pub ortho_diff_per_mass: f32,
    pub steer_diff_per_mass: f32,

    pub input_deadzone: f32,

    pub gravity_radius: f32,
    pub gravity_accel: f32,
    /// Seconds between gravity scans.
    pub scan_interval: f32,

    pub bounds_push_range: f32,
    pub bounds_push_accel: f32,

    pub platform_gravity_max_height: f32,
    pub platform_gravity_min_height: f32,
    /// Slack above platform top + ship half height still counted as landed.
    pub max_landed_offset: f32,
}

impl Default for FlightTuning {
    fn default() -> Self {
        let max_speed = 25.0;
        Self {
            max_speed,
            fwd_acc_ratio: 0.75,
            min_fwd_decel: 1.5,
            fwd_damping_ratio: 0.075,
            min_fwd_damping: 0.75,

            max_turn_rate: 2.5,
            turn_acc_ratio: 4.5,
            turn_decel_ratio: 9.0,
            turn_scale_down_speed: 0.2 * max_speed,

            max_steer_rate: 1.75,
            steer_acc_ratio: 3.5,
            steer_landed_acc_ratio: 14.0,
            steer_decel_ratio: 9.0,
            steer_scale_down_speed: 0.2 * max_speed,

            drag_per_mass: 0.5,
            ortho_diff_per_mass: 10.0,
            steer_diff_per_mass: 20.0,

            input_deadzone: 0.1,

            gravity_radius: 75.0,
            gravity_accel: 7.5,
            scan_interval: 0.2,

            bounds_push_range: 10.0,
            bounds_push_accel: 5.0,

            platform_gravity_max_height: 25.0,
            platform_gravity_min_height: -10.0,
            max_landed_offset: 0.5,
        }
    }
}

/// Result of one flight tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightOutput {
    pub forces: AppliedForces,
    pub landed: bool,
    /// Sources that applied gravity this tick.
    pub gravity_count: usize,
    pub forward_speed: f32,
    pub up_speed: f32,
}

/// Closed-loop flight controller for the player ship.
#[derive(Debug, Clone)]
pub struct FlightModel {
    tuning: FlightTuning,
    bounds: WorldBounds,
    dt: f32,
    ship_half_height: f32,
    fwd_motor: ProportionalController,
    fwd_damping: ProportionalController,
    gravity: GravitySampler,
    landed: bool,
}

impl FlightModel {
    /// `dt` is the fixed tick in seconds and must be positive.
    pub fn new(tuning: FlightTuning, bounds: WorldBounds, dt: f32, ship_half_height: f32) -> Self {
        debug_assert!(dt > 0.0, "flight model needs a positive tick, got {dt}");
        let fwd_motor = ProportionalController::new(tuning.fwd_acc_ratio);
        let mut fwd_damping = ProportionalController::new(tuning.fwd_damping_ratio);
        fwd_damping.set_min_output(tuning.min_fwd_damping);
        let frame_skip = (tuning.scan_interval / dt).round().max(0.0) as u32;
        let gravity = GravitySampler::new(tuning.gravity_radius, frame_skip);
        Self {
            tuning,
            bounds,
            dt,
            ship_half_height,
            fwd_motor,
            fwd_damping,
            gravity,
            landed: false,
        }
    }

    pub fn tuning(&self) -> &FlightTuning {
        &self.tuning
    }

    /// Landed flag from the last completed tick.
    pub fn is_landed(&self) -> bool {
        self.landed
    }

    /// Forget per-flight state after the ship is teleported.
    pub fn reset(&mut self) {
        self.landed = false;
    }

    pub fn gravity(&self) -> &GravitySampler {
        &self.gravity
    }

    pub fn gravity_mut(&mut self) -> &mut GravitySampler {
        &mut self.gravity
    }

    /// Run one fixed tick. The order of the steps matters: forward force reads
    /// last tick's landed flag, steering torque reads the one computed here.
    pub fn tick(
        &mut self,
        body: &RigidBodyState,
        controls: &FlightControls,
        query: &impl SpatialQuery,
        telemetry: &mut impl TelemetrySink,
    ) -> FlightOutput {
        let mut forces = AppliedForces::default();

        let forward_speed = self.apply_forward_force(body, controls, &mut forces);
        self.apply_ortho_force(body, &mut forces);
        let up_speed = self.apply_steering_force(body, &mut forces);

        self.gravity.tick(query, body.position());
        let gravity_count = self.apply_gravity(body, &mut forces);

        self.apply_turn(body, controls, &mut forces);
        self.apply_steering(body, controls, &mut forces);
        self.apply_spin_damping(body, &mut forces);
        self.apply_bounds_force(body, &mut forces);

        telemetry.report(SPEED_UI_KEY, format!("{forward_speed:.1}"));
        telemetry.report(UP_SPEED_UI_KEY, format!("{up_speed:.1}"));
        telemetry.report(GRAVITY_UI_KEY, gravity_count.to_string());
        telemetry.report(LANDED_UI_KEY, self.landed.to_string());

        FlightOutput {
            forces,
            landed: self.landed,
            gravity_count,
            forward_speed,
            up_speed,
        }
    }

    fn engine_on(&self, controls: &FlightControls) -> bool {
        controls.thrust > self.tuning.input_deadzone || controls.brake > self.tuning.input_deadzone
    }

    /// Brake wins over thrust; with neither, the engine is off and the target is rest.
    pub fn target_speed(&self, controls: &FlightControls) -> f32 {
        if controls.brake > self.tuning.input_deadzone {
            0.0
        } else if controls.thrust > self.tuning.input_deadzone {
            self.tuning.max_speed
        } else {
            0.0
        }
    }

    fn apply_forward_force(
        &mut self,
        body: &RigidBodyState,
        controls: &FlightControls,
        forces: &mut AppliedForces,
    ) -> f32 {
        let target_speed = self.target_speed(controls);
        let fwd = body.transform.forward();
        let fwd_speed = body.speed_along(fwd);

        let controller = if self.engine_on(controls) || self.landed {
            if target_speed < IDLE_TARGET_SPEED {
                self.fwd_motor.set_min_output(self.tuning.min_fwd_decel);
            } else {
                self.fwd_motor.clear_min_output();
            }
            &mut self.fwd_motor
        } else {
            &mut self.fwd_damping
        };

        // Never overshoot the target within one tick.
        controller.set_max_output((target_speed - fwd_speed) / self.dt);
        let fwd_acc = controller.output(fwd_speed, target_speed);
        forces.add_force(body.mass * fwd_acc * fwd);
        fwd_speed
    }

    /// Lateral drag plus a term coupled to the turn rate, capped at a full stop.
    fn apply_ortho_force(&self, body: &RigidBodyState, forces: &mut AppliedForces) {
        let right = body.transform.right();
        let ortho_speed = body.speed_along(right);
        let turn_rate = body.angular_speed_about(body.transform.back());
        let force = self.damping_force(
            body.mass,
            ortho_speed,
            turn_rate,
            self.tuning.ortho_diff_per_mass,
        );
        forces.add_force(force * right);
    }

    /// Same shape as the lateral damping, on the up axis and coupled to the steer rate.
    fn apply_steering_force(&self, body: &RigidBodyState, forces: &mut AppliedForces) -> f32 {
        let up = body.transform.up();
        let up_speed = body.speed_along(up);
        let steer_rate = body.angular_speed_about(body.transform.right());
        let force = self.damping_force(
            body.mass,
            up_speed,
            steer_rate,
            self.tuning.steer_diff_per_mass,
        );
        forces.add_force(force * up);
        up_speed
    }

    /// Signed force opposing `speed`.
    fn damping_force(&self, mass: f32, speed: f32, angular_rate: f32, diff_per_mass: f32) -> f32 {
        // F = m * dv/dt
        let max_force = mass * speed.abs() / self.dt;
        let drag = speed.abs() * self.tuning.drag_per_mass * mass;
        let diff = (diff_per_mass * mass * angular_rate).abs();
        let magnitude = (drag + diff).min(max_force);
        -sign(speed) * magnitude
    }

    /// Returns how many sources pulled on the ship.
    fn apply_gravity(&mut self, body: &RigidBodyState, forces: &mut AppliedForces) -> usize {
        self.landed = false;
        let snapshot = self.gravity.snapshot().clone();
        let pull = body.mass * self.tuning.gravity_accel;
        let position = body.position();

        for source in snapshot.spherical() {
            let to_source = (source.position - position).normalize_or_zero();
            forces.add_force(pull * to_source);
        }
        let mut count = snapshot.spherical().len();

        let ship_up = body.transform.up();
        for source in snapshot.directional() {
            // First source the ship is outside of ends directional gravity for this tick,
            // later sources included.
            if !self.in_platform_volume(source, position) {
                break;
            }
            let height = position.y - source.position.y;
            if height < self.tuning.platform_gravity_min_height {
                break;
            }

            if height > 0.0 && height < self.landing_height(source) {
                let angle = source.up().angle_between(ship_up).to_degrees();
                if angle < LANDING_ALIGNMENT_DEGREES || angle > 180.0 - LANDING_ALIGNMENT_DEGREES {
                    self.landed = true;
                }
            }

            count += 1;
            forces.add_force(pull * Vec3::NEG_Y);
        }
        count
    }

    /// Axis-aligned box around the platform, stretched vertically by the max gravity height.
    fn in_platform_volume(&self, source: &GravitySource, position: Vec3) -> bool {
        let area = Vec3::new(
            source.size.x,
            self.tuning.platform_gravity_max_height * 2.0,
            source.size.z,
        );
        let (yaw, _, _) = source.rotation.to_euler(EulerRot::YXZ);
        let rotated = Quat::from_rotation_y(yaw) * area;
        let half = Vec3::new(rotated.x.abs(), rotated.y, rotated.z.abs()) * 0.5;
        let d = (position - source.position).abs();
        d.x <= half.x && d.y <= half.y && d.z <= half.z
    }

    fn landing_height(&self, source: &GravitySource) -> f32 {
        source.size.y * 0.5 + self.ship_half_height + self.tuning.max_landed_offset
    }

    fn apply_turn(&self, body: &RigidBodyState, controls: &FlightControls, forces: &mut AppliedForces) {
        let t = &self.tuning;
        let fwd_speed_abs = body.speed_along(body.transform.forward()).abs();
        let (target_rate, ratio) = if controls.lateral.abs() > t.input_deadzone {
            // Slower turning at low linear speed
            let scale = (fwd_speed_abs / t.turn_scale_down_speed).min(1.0);
            (-sign(controls.lateral) * t.max_turn_rate * scale, t.turn_acc_ratio)
        } else {
            (0.0, t.turn_decel_ratio)
        };

        let turn_rate = body.angular_speed_about(body.transform.back());
        let ang_acc = (target_rate - turn_rate) * ratio;
        let torque = body.inertia.z * ang_acc;
        forces.add_relative_torque(body.rotation(), Vec3::new(0.0, 0.0, torque));
    }

    fn apply_steering(
        &self,
        body: &RigidBodyState,
        controls: &FlightControls,
        forces: &mut AppliedForces,
    ) {
        let t = &self.tuning;
        let fwd_speed_abs = body.speed_along(body.transform.forward()).abs();
        let (target_rate, ratio) = if controls.forward.abs() > t.input_deadzone {
            let scale = (fwd_speed_abs / t.steer_scale_down_speed).min(1.0);
            let ratio = if self.landed {
                t.steer_landed_acc_ratio
            } else {
                t.steer_acc_ratio
            };
            (sign(controls.forward) * t.max_steer_rate * scale, ratio)
        } else {
            (0.0, t.steer_decel_ratio)
        };

        let steer_rate = body.angular_speed_about(body.transform.right());
        let ang_acc = (target_rate - steer_rate) * ratio;
        let torque = body.inertia.x * ang_acc;
        forces.add_relative_torque(body.rotation(), Vec3::new(torque, 0.0, 0.0));
    }

    /// Cancel all spin about the up axis within one tick.
    fn apply_spin_damping(&self, body: &RigidBodyState, forces: &mut AppliedForces) {
        let spin_rate = body.angular_speed_about(body.transform.up());
        let ang_acc = -spin_rate / self.dt;
        let torque = body.inertia.y * ang_acc;
        forces.add_relative_torque(body.rotation(), Vec3::new(0.0, torque, 0.0));
    }

    /// Soft push back toward the center near each face, so the ship cannot park in a corner.
    fn apply_bounds_force(&self, body: &RigidBodyState, forces: &mut AppliedForces) {
        let position = body.position();
        for axis in Axis::ALL {
            let coord = axis.component(position);
            if self.bounds.distance_to_face(coord) < self.tuning.bounds_push_range {
                let sign = -WorldBounds::face_sign(coord);
                // F = m * a
                forces.add_force(axis.unit(sign) * self.tuning.bounds_push_accel * body.mass);
            }
        }
    }
}

/// Sign with zero counted as positive.
fn sign(v: f32) -> f32 {
    if v >= 0.0 {
        1.0
    } else {
        -1.0
    }
}
