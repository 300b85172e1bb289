//! Headless simulation driver: one ship, the static scene, scripted controls.

use anyhow::{Context, Result};
use engine_core::{RigidBodyState, Time, Transform, Vec3, WorldBounds};
use input::{AxisSource, FlightControls};
use physics::{PhysicsWorld, RigidBodyHandle, ShipBodyDesc};
use renderer::{BoundsOverlay, CameraUniform, LineBatch};

use crate::chase_camera::ChaseCamera;
use crate::config::GameConfig;
use crate::flight::{FlightModel, FlightOutput, GRAVITY_UI_KEY, LANDED_UI_KEY, SPEED_UI_KEY, UP_SPEED_UI_KEY};
use crate::scene::SceneArena;
use crate::script::ScriptedInput;
use crate::telemetry::DebugPanel;

pub struct Simulation {
    time: Time,
    realtime: bool,
    total_ticks: u64,
    telemetry_interval: u32,

    physics: PhysicsWorld,
    scene: SceneArena,
    bounds: WorldBounds,
    ship_body: RigidBodyHandle,
    spawn: Transform,

    flight: FlightModel,
    camera: ChaseCamera,
    script: ScriptedInput,
    panel: DebugPanel,

    overlay: BoundsOverlay,
    lines: LineBatch,
    camera_uniform: CameraUniform,
}

impl Simulation {
    pub fn new(config: &GameConfig) -> Result<Self> {
        let time = Time::with_fixed_rate(config.tick_rate_hz).context("invalid tick_rate_hz")?;
        let dt = time.fixed_timestep_seconds();

        let scale = config.world.bounds_reference_scale;
        if !scale.is_finite() || scale <= 0.0 {
            anyhow::bail!("bounds_reference_scale must be positive and finite, got {scale}");
        }
        let bounds = WorldBounds::from_reference_scale(config.world.bounds_reference_scale);
        let mut physics = PhysicsWorld::new(dt);
        let scene = SceneArena::build(&config.world, &bounds, &mut physics);

        let spawn = Transform::from_position(Vec3::from_array(config.ship.spawn));
        if !bounds.contains(spawn.position) {
            anyhow::bail!(
                "ship spawn {:?} is outside the world bounds (half extent {})",
                spawn.position,
                bounds.half_extent()
            );
        }
        let (ship_body, _) = physics.add_ship_body(&ShipBodyDesc {
            position: spawn.position,
            rotation: spawn.rotation,
            mass: config.ship.mass,
            inertia: Vec3::from_array(config.ship.inertia),
            half_length: config.ship.half_length,
            radius: config.ship.radius,
        });
        physics.update_query_pipeline();

        let mut flight = FlightModel::new(config.flight.clone(), bounds, dt, config.ship.radius);
        flight
            .gravity_mut()
            .force_scan(&physics.query_excluding(ship_body), spawn.position);

        let mut camera = ChaseCamera::new(config.camera.clone(), dt);
        camera.reset(&spawn);

        let mut panel = DebugPanel::new();
        for key in [SPEED_UI_KEY, UP_SPEED_UI_KEY, GRAVITY_UI_KEY, LANDED_UI_KEY] {
            panel.register_var(key);
        }

        let total_ticks = time.ticks_for_interval(config.sim_seconds) as u64;
        log::info!(
            "simulation ready: {} Hz, {} ticks, {} scene objects",
            config.tick_rate_hz,
            total_ticks,
            scene.len()
        );

        Ok(Self {
            time,
            realtime: config.realtime,
            total_ticks,
            telemetry_interval: config.telemetry_interval_ticks,
            physics,
            scene,
            bounds,
            ship_body,
            spawn,
            flight,
            camera,
            script: ScriptedInput::new(config.script.clone(), dt),
            panel,
            overlay: BoundsOverlay {
                show_debug_cube: config.show_debug_bounds,
                ..Default::default()
            },
            lines: LineBatch::new(),
            camera_uniform: CameraUniform::new(),
        })
    }

    /// Run the configured number of ticks.
    pub fn run(&mut self) {
        while self.time.tick_count() < self.total_ticks {
            if self.realtime {
                self.time.update();
                if !self.time.should_fixed_update() {
                    std::thread::sleep(std::time::Duration::from_millis(1));
                    continue;
                }
            }
            self.tick();
        }

        if let Some(state) = self.ship_state() {
            log::info!(
                "finished after {:.1}s among {} scene objects: ship at ({:.1}, {:.1}, {:.1}), {}",
                self.time.simulated_seconds(),
                self.scene.len(),
                state.position().x,
                state.position().y,
                state.position().z,
                self.panel.summary()
            );
        }
    }

    /// One fixed tick: controls, flight forces, solver step, camera, overlay.
    pub fn tick(&mut self) -> Option<FlightOutput> {
        let controls = FlightControls::sample(&self.script);
        let toggle = self.script.camera_toggle_pressed();

        let Some(state) = self.physics.body_state(self.ship_body) else {
            log::warn!("ship body missing, skipping tick {}", self.time.tick_count());
            return None;
        };

        let output = self.flight.tick(
            &state,
            &controls,
            &self.physics.query_excluding(self.ship_body),
            &mut self.panel,
        );
        if !self.physics.apply_forces(self.ship_body, &output.forces) {
            log::warn!("could not apply flight forces to the ship body");
        }
        self.physics.step();

        let Some(after) = self.physics.body_state(self.ship_body) else {
            log::warn!("ship body vanished during step");
            return None;
        };
        self.camera.tick(
            &after,
            output.landed,
            toggle,
            &self.physics.query_excluding(self.ship_body),
        );

        self.script.advance();
        self.time.advance_tick();

        let mut frame_state = after;
        if !self.bounds.contains(after.position()) {
            log::warn!("ship escaped the bounds at {:?}, respawning", after.position());
            self.respawn();
            if let Some(state) = self.physics.body_state(self.ship_body) {
                frame_state = state;
            }
        }

        self.build_frame(&frame_state);

        let tick = self.time.tick_count();
        if self.telemetry_interval > 0 && tick % self.telemetry_interval as u64 == 0 {
            log::info!("[{:>6.2}s] {}", self.time.simulated_seconds(), self.panel.summary());
        }
        Some(output)
    }

    /// Put the ship back at its spawn point at rest.
    pub fn respawn(&mut self) {
        self.physics
            .reset_body(self.ship_body, self.spawn.position, self.spawn.rotation);
        self.physics.update_query_pipeline();
        self.flight.reset();
        self.flight
            .gravity_mut()
            .force_scan(&self.physics.query_excluding(self.ship_body), self.spawn.position);
        self.camera.reset(&self.spawn);
    }

    /// Render-side data for the frame after this tick.
    fn build_frame(&mut self, ship: &RigidBodyState) {
        self.lines.clear();
        self.overlay
            .build(&self.bounds, ship.position(), &mut self.lines);
        self.camera_uniform.update(self.camera.camera());
        log::trace!(
            "frame: {} bounds lines, ship visible: {}",
            self.lines.line_count(),
            self.camera.ship_visible()
        );
    }

    pub fn ship_state(&self) -> Option<RigidBodyState> {
        self.physics.body_state(self.ship_body)
    }

    pub fn flight(&self) -> &FlightModel {
        &self.flight
    }

    pub fn camera(&self) -> &ChaseCamera {
        &self.camera
    }

    pub fn panel(&self) -> &DebugPanel {
        &self.panel
    }

    pub fn lines(&self) -> &LineBatch {
        &self.lines
    }

    pub fn camera_uniform(&self) -> &CameraUniform {
        &self.camera_uniform
    }

    pub fn tick_count(&self) -> u64 {
        self.time.tick_count()
    }

    /// Controls the script will feed on the next tick.
    pub fn next_controls(&self) -> FlightControls {
        FlightControls::sample(&self.script)
    }

    pub fn script_finished(&self) -> bool {
        self.script.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chase_camera::CameraMode;
    use crate::config::WorldConfig;
    use crate::script::ManeuverSegment;
    use engine_core::Quat;

    fn quiet_config(script: Vec<ManeuverSegment>) -> GameConfig {
        GameConfig {
            telemetry_interval_ticks: 0,
            world: WorldConfig {
                planet_count: 0,
                ..WorldConfig::default()
            },
            script,
            ..GameConfig::default()
        }
    }

    #[test]
    fn ship_settles_onto_spawn_platform() {
        let mut sim = Simulation::new(&quiet_config(vec![ManeuverSegment::idle(3.0)])).unwrap();
        for _ in 0..150 {
            sim.tick();
        }
        assert!(sim.flight().is_landed());
        let state = sim.ship_state().unwrap();
        // Platform top at 201, capsule radius 1.
        assert!(state.position().y > 201.5 && state.position().y < 202.6, "{:?}", state.position());
        assert_eq!(sim.panel().get(LANDED_UI_KEY), Some("true"));
        assert_eq!(sim.panel().get(GRAVITY_UI_KEY), Some("1"));
    }

    #[test]
    fn identical_configs_fly_identically() {
        let script = vec![
            ManeuverSegment {
                thrust: 1.0,
                forward: 1.0,
                ..ManeuverSegment::idle(1.0)
            },
            ManeuverSegment {
                thrust: 1.0,
                lateral: -1.0,
                ..ManeuverSegment::idle(1.0)
            },
        ];
        let config = GameConfig {
            telemetry_interval_ticks: 0,
            script,
            ..GameConfig::default()
        };
        let mut a = Simulation::new(&config).unwrap();
        let mut b = Simulation::new(&config).unwrap();
        for _ in 0..100 {
            let fa = a.tick().unwrap();
            let fb = b.tick().unwrap();
            assert_eq!(fa.forces.force.to_array(), fb.forces.force.to_array());
        }
        let pa = a.ship_state().unwrap().position();
        let pb = b.ship_state().unwrap().position();
        assert_eq!(pa.to_array(), pb.to_array());
    }

    #[test]
    fn thrust_moves_the_ship_forward() {
        let script = vec![ManeuverSegment {
            thrust: 1.0,
            ..ManeuverSegment::idle(2.0)
        }];
        let mut sim = Simulation::new(&quiet_config(script)).unwrap();
        for _ in 0..100 {
            sim.tick();
        }
        let state = sim.ship_state().unwrap();
        assert!(state.speed_along(state.transform.forward()) > 5.0);
        assert!(state.position().z < -5.0);
    }

    #[test]
    fn scripted_toggle_switches_camera() {
        let script = vec![ManeuverSegment {
            toggle_camera: true,
            ..ManeuverSegment::idle(0.1)
        }];
        let mut sim = Simulation::new(&quiet_config(script)).unwrap();
        assert_eq!(sim.camera().mode(), CameraMode::ThirdPerson);
        sim.tick();
        assert_eq!(sim.camera().mode(), CameraMode::FirstPerson);
        assert!(!sim.camera().ship_visible());
        sim.tick();
        assert_eq!(sim.camera().mode(), CameraMode::FirstPerson);
    }

    #[test]
    fn frame_data_is_built_each_tick() {
        let config = GameConfig {
            show_debug_bounds: true,
            ..quiet_config(vec![ManeuverSegment::idle(1.0)])
        };
        let mut sim = Simulation::new(&config).unwrap();
        sim.tick();
        assert_eq!(sim.lines().line_count(), 12);
        let camera_pos = sim.camera().camera().position();
        assert_eq!(
            sim.camera_uniform().position,
            [camera_pos.x, camera_pos.y, camera_pos.z, 1.0]
        );
    }

    #[test]
    fn invalid_setup_is_rejected() {
        let config = GameConfig {
            tick_rate_hz: 0.0,
            ..GameConfig::default()
        };
        assert!(Simulation::new(&config).is_err());

        let mut config = GameConfig::default();
        config.ship.spawn = [5000.0, 0.0, 0.0];
        assert!(Simulation::new(&config).is_err());

        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let mut config = GameConfig::default();
            config.world.bounds_reference_scale = scale;
            assert!(Simulation::new(&config).is_err(), "scale {scale} accepted");
        }
    }

    #[test]
    fn escaped_ship_is_respawned_before_the_frame_is_built() {
        let mut sim = Simulation::new(&quiet_config(vec![ManeuverSegment::idle(3.0)])).unwrap();
        for _ in 0..150 {
            sim.tick();
        }
        assert!(sim.flight().is_landed());

        let outside = Vec3::new(sim.bounds.half_extent() + 50.0, 0.0, 0.0);
        sim.physics.reset_body(sim.ship_body, outside, Quat::IDENTITY);
        sim.tick();

        let state = sim.ship_state().unwrap();
        assert_eq!(state.position(), sim.spawn.position);
        assert!(!sim.flight().is_landed());
        // The overlay was built around the spawn pose, far from every face.
        assert_eq!(sim.lines().line_count(), 0);
    }

    #[test]
    fn run_stops_after_sim_seconds() {
        let config = GameConfig {
            sim_seconds: 0.5,
            ..quiet_config(vec![ManeuverSegment::idle(0.2)])
        };
        let mut sim = Simulation::new(&config).unwrap();
        sim.run();
        assert_eq!(sim.tick_count(), 25);
        assert!(sim.script_finished());
        assert_eq!(sim.next_controls(), FlightControls::default());
    }
}
