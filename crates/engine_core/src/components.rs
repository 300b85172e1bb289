//! Rigid body state shared between the physics wrapper and the controllers.

use glam::{Quat, Vec3};

use crate::Transform;

/// Linear and angular velocity, both in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    pub fn with_angular(linear: Vec3, angular: Vec3) -> Self {
        Self { linear, angular }
    }
}

/// Snapshot of a dynamic body taken at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBodyState {
    pub transform: Transform,
    pub velocity: Velocity,
    pub mass: f32,
    /// Principal inertia along the body-local X, Y and Z axes.
    pub inertia: Vec3,
}

impl Default for RigidBodyState {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            velocity: Velocity::default(),
            mass: 1.0,
            inertia: Vec3::ONE,
        }
    }
}

impl RigidBodyState {
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn rotation(&self) -> Quat {
        self.transform.rotation
    }

    /// Linear speed along a world-space axis.
    pub fn speed_along(&self, axis: Vec3) -> f32 {
        axis.dot(self.velocity.linear)
    }

    /// Angular speed about a world-space axis.
    pub fn angular_speed_about(&self, axis: Vec3) -> f32 {
        axis.dot(self.velocity.angular)
    }
}

/// Force and torque accumulated over one tick, world space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AppliedForces {
    pub force: Vec3,
    pub torque: Vec3,
}

impl AppliedForces {
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Add a torque given in the body-local frame.
    pub fn add_relative_torque(&mut self, rotation: Quat, local_torque: Vec3) {
        self.torque += rotation * local_torque;
    }

    pub fn is_zero(&self) -> bool {
        self.force == Vec3::ZERO && self.torque == Vec3::ZERO
    }
}
