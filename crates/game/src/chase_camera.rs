//! Chase camera: follows the ship from behind, pulls in when the line of sight
//! is blocked and swaps above/below the ship when a large body is in the way.

use engine_core::{Quat, RigidBodyState, Transform, Vec3};
use physics::{ColliderTags, SpatialQuery};
use renderer::Camera;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Ship-local offset direction; behind and slightly above.
    pub offset_direction: [f32; 3],
    pub offset_distance: f32,
    /// Approximate seconds to reach the desired position.
    pub position_smoothing: f32,
    /// Up-vector blend per second (fraction of the gap, clamped to 1 per tick).
    pub up_smoothing_rate: f32,
    /// How far ahead of the ship the camera aims.
    pub look_ahead: f32,
    /// Degrees of camera pitch per rad/s of steer rate.
    pub pitch_rate_angle_ratio: f32,
    /// Extra upward pitch while landed, in degrees.
    pub landed_pitch_angle: f32,
    pub fov_degrees: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            offset_direction: [0.0, 0.05, 0.88],
            offset_distance: 11.41,
            position_smoothing: 0.4,
            up_smoothing_rate: 4.0,
            look_ahead: 4.0,
            pitch_rate_angle_ratio: 21.0,
            landed_pitch_angle: 25.0,
            fov_degrees: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    FirstPerson,
    ThirdPerson,
}

/// Outcome of the occlusion probes for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSolution {
    pub distance: f32,
    /// Camera sits on the mirrored (below the ship) offset.
    pub flipped: bool,
}

#[derive(Debug, Clone)]
pub struct ChaseCamera {
    tuning: CameraTuning,
    dt: f32,
    camera: Camera,
    mode: CameraMode,
    velocity: Vec3,
    flipped: bool,
}

impl ChaseCamera {
    pub fn new(tuning: CameraTuning, dt: f32) -> Self {
        let camera = Camera {
            fov_degrees: tuning.fov_degrees,
            ..Default::default()
        };
        Self {
            tuning,
            dt,
            camera,
            mode: CameraMode::ThirdPerson,
            velocity: Vec3::ZERO,
            flipped: false,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// The ship model is hidden in first person.
    pub fn ship_visible(&self) -> bool {
        self.mode == CameraMode::ThirdPerson
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    fn base_offset(&self) -> Vec3 {
        Vec3::from_array(self.tuning.offset_direction)
    }

    /// Snap to the desired pose without smoothing.
    pub fn reset(&mut self, ship: &Transform) {
        self.velocity = Vec3::ZERO;
        self.flipped = false;
        self.camera.up = ship.up();
        match self.mode {
            CameraMode::FirstPerson => self.snap_to_ship(ship),
            CameraMode::ThirdPerson => {
                let position = ship.position
                    + ship.rotation * (self.base_offset() * self.tuning.offset_distance);
                self.camera.look_at(position, ship.position, ship.up());
            }
        }
    }

    fn snap_to_ship(&mut self, ship: &Transform) {
        self.camera.transform = *ship;
        self.camera.up = ship.up();
    }

    /// Advance one tick using the post-step ship state.
    pub fn tick(
        &mut self,
        ship: &RigidBodyState,
        landed: bool,
        toggle_pressed: bool,
        query: &impl SpatialQuery,
    ) {
        if toggle_pressed {
            self.mode = match self.mode {
                CameraMode::FirstPerson => CameraMode::ThirdPerson,
                CameraMode::ThirdPerson => CameraMode::FirstPerson,
            };
            log::debug!("camera mode -> {:?}", self.mode);
        }

        let transform = &ship.transform;
        if self.mode == CameraMode::FirstPerson {
            self.snap_to_ship(transform);
            return;
        }

        let steer_rate = ship.angular_speed_about(transform.right());
        let offset = self.pitched_offset(steer_rate, landed);
        let solution = self.solve_distance(transform, offset, query);
        self.flipped = solution.flipped;

        let mut placed = offset;
        if solution.flipped {
            placed.y = -placed.y;
        }
        let desired = transform.position + transform.rotation * (placed * solution.distance);

        let position = smooth_damp(
            self.camera.transform.position,
            desired,
            &mut self.velocity,
            self.tuning.position_smoothing,
            self.dt,
        );

        let t = (self.tuning.up_smoothing_rate * self.dt).min(1.0);
        let up = self.camera.up.lerp(transform.up(), t);
        let target = transform.position + transform.rotation * Vec3::new(0.0, 0.0, -self.tuning.look_ahead);
        self.camera.look_at(position, target, up);
    }

    /// Tilt the offset with the steer rate, and higher still while landed.
    fn pitched_offset(&self, steer_rate: f32, landed: bool) -> Vec3 {
        let landed_angle = if landed {
            self.tuning.landed_pitch_angle
        } else {
            0.0
        };
        let angle = self.tuning.pitch_rate_angle_ratio * steer_rate - landed_angle;
        Quat::from_rotation_x(angle.to_radians()) * self.base_offset()
    }

    /// Probe along the offset and, if a large body blocks it, along the mirrored offset.
    pub fn solve_distance(
        &self,
        ship: &Transform,
        offset: Vec3,
        query: &impl SpatialQuery,
    ) -> CameraSolution {
        let max_distance = self.tuning.offset_distance;
        let primary_dir = (ship.rotation * offset).normalize_or_zero();
        let Some(primary) = query.probe(ship.position, primary_dir, max_distance) else {
            return CameraSolution {
                distance: max_distance,
                flipped: false,
            };
        };
        let blocked = CameraSolution {
            distance: primary.distance,
            flipped: false,
        };
        if !primary.tags.contains(ColliderTags::LARGE) {
            return blocked;
        }

        let mirrored = Vec3::new(offset.x, -offset.y, offset.z);
        let mirror_dir = (ship.rotation * mirrored).normalize_or_zero();
        match query.probe(ship.position, mirror_dir, max_distance) {
            None => CameraSolution {
                distance: max_distance,
                flipped: true,
            },
            Some(hit) if !hit.tags.contains(ColliderTags::LARGE) => CameraSolution {
                distance: hit.distance,
                flipped: true,
            },
            Some(_) => blocked,
        }
    }
}

/// Critically damped spring toward `target`. `velocity` carries state between calls.
pub fn smooth_damp(current: Vec3, target: Vec3, velocity: &mut Vec3, smooth_time: f32, dt: f32) -> Vec3 {
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Don't overshoot
    if (target - current).dot(output - target) > 0.0 {
        output = target;
        *velocity = Vec3::ZERO;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity::tests::FakeWorld;
    use engine_core::Velocity;
    use physics::ProbeHit;

    const DT: f32 = 0.02;

    fn offset() -> Vec3 {
        Vec3::new(0.0, 0.05, 0.88)
    }

    fn mirrored() -> Vec3 {
        Vec3::new(0.0, -0.05, 0.88)
    }

    fn probe_hit(distance: f32, tags: ColliderTags) -> Option<ProbeHit> {
        Some(ProbeHit { distance, tags })
    }

    fn solve(world: &FakeWorld) -> CameraSolution {
        let cam = ChaseCamera::new(CameraTuning::default(), DT);
        cam.solve_distance(&Transform::default(), offset(), world)
    }

    fn ship_at(position: Vec3) -> RigidBodyState {
        RigidBodyState {
            transform: Transform::from_position(position),
            velocity: Velocity::default(),
            mass: 1.0,
            inertia: Vec3::ONE,
        }
    }

    #[test]
    fn clear_line_of_sight_uses_default_distance() {
        let solution = solve(&FakeWorld::default());
        assert_eq!(solution, CameraSolution { distance: 11.41, flipped: false });
    }

    #[test]
    fn small_obstacle_shortens_without_flipping() {
        let world = FakeWorld::default();
        world.add_probe(offset(), probe_hit(5.0, ColliderTags::DIR_GRAVITY));
        world.add_probe(mirrored(), probe_hit(2.0, ColliderTags::NONE));
        let solution = solve(&world);
        assert_eq!(solution, CameraSolution { distance: 5.0, flipped: false });
    }

    #[test]
    fn large_obstacle_with_clear_mirror_flips() {
        let world = FakeWorld::default();
        world.add_probe(offset(), probe_hit(5.0, ColliderTags::LARGE));
        let solution = solve(&world);
        assert_eq!(solution, CameraSolution { distance: 11.41, flipped: true });
    }

    #[test]
    fn mirror_blocked_by_small_obstacle_flips_and_shortens() {
        let world = FakeWorld::default();
        world.add_probe(offset(), probe_hit(5.0, ColliderTags::LARGE));
        world.add_probe(mirrored(), probe_hit(3.0, ColliderTags::DIR_GRAVITY));
        let solution = solve(&world);
        assert_eq!(solution, CameraSolution { distance: 3.0, flipped: true });
    }

    #[test]
    fn both_sides_large_keeps_primary() {
        let world = FakeWorld::default();
        let large = ColliderTags::SPHERE_GRAVITY | ColliderTags::LARGE;
        world.add_probe(offset(), probe_hit(5.0, large));
        world.add_probe(mirrored(), probe_hit(7.0, large));
        let solution = solve(&world);
        assert_eq!(solution, CameraSolution { distance: 5.0, flipped: false });
    }

    #[test]
    fn third_person_settles_behind_the_ship() {
        let mut cam = ChaseCamera::new(CameraTuning::default(), DT);
        let ship = ship_at(Vec3::new(10.0, 0.0, 0.0));
        cam.reset(&Transform::default());
        let world = FakeWorld::default();
        for _ in 0..200 {
            cam.tick(&ship, false, false, &world);
        }
        let expected = ship.position() + offset() * 11.41;
        assert!((cam.camera().position() - expected).length() < 1e-2);
        assert!(cam.ship_visible());
        assert!(!cam.is_flipped());
        // Looking toward the point ahead of the ship.
        let aim = (ship.position() + Vec3::new(0.0, 0.0, -4.0) - cam.camera().position()).normalize();
        assert!(cam.camera().forward().dot(aim) > 0.999);
    }

    #[test]
    fn flipped_camera_sits_below_the_ship() {
        let mut cam = ChaseCamera::new(CameraTuning::default(), DT);
        let ship = ship_at(Vec3::ZERO);
        cam.reset(&ship.transform);
        let world = FakeWorld::default();
        world.add_probe(offset(), probe_hit(5.0, ColliderTags::LARGE));
        for _ in 0..200 {
            cam.tick(&ship, false, false, &world);
        }
        assert!(cam.is_flipped());
        assert!(cam.camera().position().y < 0.0);
    }

    #[test]
    fn landed_raises_the_camera() {
        let mut cam = ChaseCamera::new(CameraTuning::default(), DT);
        let ship = ship_at(Vec3::ZERO);
        let world = FakeWorld::default();
        cam.reset(&ship.transform);
        let start_y = cam.camera().position().y;
        for _ in 0..100 {
            cam.tick(&ship, true, false, &world);
        }
        assert!(cam.camera().position().y > start_y + 3.0);
    }

    #[test]
    fn toggle_switches_to_first_person_and_back() {
        let mut cam = ChaseCamera::new(CameraTuning::default(), DT);
        let mut ship = ship_at(Vec3::new(1.0, 2.0, 3.0));
        ship.transform.rotation = Quat::from_rotation_y(0.5);
        let world = FakeWorld::default();

        cam.tick(&ship, false, true, &world);
        assert_eq!(cam.mode(), CameraMode::FirstPerson);
        assert!(!cam.ship_visible());
        assert_eq!(cam.camera().transform, ship.transform);
        assert!((cam.camera().up - ship.transform.up()).length() < 1e-6);

        cam.tick(&ship, false, false, &world);
        assert_eq!(cam.mode(), CameraMode::FirstPerson);

        cam.tick(&ship, false, true, &world);
        assert_eq!(cam.mode(), CameraMode::ThirdPerson);
        assert!(cam.ship_visible());
    }

    #[test]
    fn smooth_damp_converges_without_overshoot() {
        let mut velocity = Vec3::ZERO;
        let mut p = Vec3::ZERO;
        let target = Vec3::new(10.0, 0.0, 0.0);
        for _ in 0..500 {
            p = smooth_damp(p, target, &mut velocity, 0.4, DT);
            assert!(p.x <= target.x + 1e-5);
        }
        assert!((p - target).length() < 1e-3);
    }
}
