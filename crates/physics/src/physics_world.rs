//! Physics world management with Rapier3D.

use crate::collision::{ColliderData, CollisionGroup};
use engine_core::{AppliedForces, Quat, RigidBodyState, Transform, Vec3, Velocity};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

/// Shape and mass of the player ship body.
#[derive(Debug, Clone, Copy)]
pub struct ShipBodyDesc {
    pub position: Vec3,
    pub rotation: Quat,
    pub mass: f32,
    /// Principal inertia in body-local axes.
    pub inertia: Vec3,
    /// Capsule half length along the body Z axis (excluding the caps).
    pub half_length: f32,
    pub radius: f32,
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

fn to_isometry(position: Vec3, rotation: Quat) -> Isometry<Real> {
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    Isometry::from_parts(Translation3::new(position.x, position.y, position.z), rotation)
}

fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn isometry_to_transform(iso: &Isometry<Real>) -> Transform {
    let pos = iso.translation.vector;
    let rot = iso.rotation;
    Transform::from_position_rotation(
        Vec3::new(pos.x, pos.y, pos.z),
        Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
    )
}

impl PhysicsWorld {
    /// Create a zero-gravity world stepping at `timestep` seconds.
    ///
    /// All gravity in the game comes from the flight model's gravity sources.
    pub fn new(timestep: f32) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: timestep,
            ..IntegrationParameters::default()
        };
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, 0.0, 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Step the physics simulation.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Update query pipeline for raycasting. Needed after adding colliders and before the first step.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Add the ship as a dynamic body with explicit mass properties and a capsule collider.
    pub fn add_ship_body(&mut self, desc: &ShipBodyDesc) -> (RigidBodyHandle, ColliderHandle) {
        let mass_properties = MassProperties::new(
            point![0.0, 0.0, 0.0],
            desc.mass,
            vector![desc.inertia.x, desc.inertia.y, desc.inertia.z],
        );
        let rigid_body = RigidBodyBuilder::dynamic()
            .position(to_isometry(desc.position, desc.rotation))
            .additional_mass_properties(mass_properties)
            .ccd_enabled(true)
            .build();
        let body_handle = self.rigid_body_set.insert(rigid_body);

        // Density 0 keeps the configured mass properties exact.
        let collider = ColliderBuilder::capsule_z(desc.half_length, desc.radius)
            .density(0.0)
            .collision_groups(CollisionGroup::ship())
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        if let Some(body) = self.rigid_body_set.get_mut(body_handle) {
            body.recompute_mass_properties_from_colliders(&self.collider_set);
        }
        log::debug!(
            "ship body at {:?}: mass {}, inertia {:?}",
            desc.position,
            desc.mass,
            desc.inertia
        );
        (body_handle, collider_handle)
    }

    /// Add a fixed sphere collider (planets). No parent body.
    pub fn add_static_sphere(
        &mut self,
        position: Vec3,
        rotation: Quat,
        radius: f32,
        data: ColliderData,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::ball(radius)
            .position(to_isometry(position, rotation))
            .collision_groups(CollisionGroup::environment())
            .user_data(data.pack())
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a fixed cuboid collider (platforms). No parent body.
    /// `half_extents`: half sizes in local X, Y, Z.
    pub fn add_static_cuboid(
        &mut self,
        position: Vec3,
        rotation: Quat,
        half_extents: Vec3,
        data: ColliderData,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .position(to_isometry(position, rotation))
            .collision_groups(CollisionGroup::environment())
            .user_data(data.pack())
            .build();
        self.collider_set.insert(collider)
    }

    /// Snapshot of a rigid body's pose, velocity and mass properties.
    pub fn body_state(&self, handle: RigidBodyHandle) -> Option<RigidBodyState> {
        self.rigid_body_set.get(handle).map(|body| {
            let inertia = body.mass_properties().local_mprops.principal_inertia();
            RigidBodyState {
                transform: isometry_to_transform(body.position()),
                velocity: Velocity::with_angular(to_vec3(body.linvel()), to_vec3(body.angvel())),
                mass: body.mass(),
                inertia: to_vec3(&inertia),
            }
        })
    }

    /// Replace the force and torque acting on a body for the next step.
    ///
    /// Rapier keeps user forces until reset, so last tick's accumulators are cleared first.
    pub fn apply_forces(&mut self, handle: RigidBodyHandle, forces: &AppliedForces) -> bool {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return false;
        };
        body.reset_forces(false);
        body.reset_torques(false);
        let wake = !forces.is_zero();
        body.add_force(vector![forces.force.x, forces.force.y, forces.force.z], wake);
        body.add_torque(vector![forces.torque.x, forces.torque.y, forces.torque.z], wake);
        true
    }

    /// Teleport a body and clear its velocity.
    pub fn reset_body(&mut self, handle: RigidBodyHandle, position: Vec3, rotation: Quat) {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            log::warn!("reset_body: no rigid body for {:?}", handle);
            return;
        };
        body.set_position(to_isometry(position, rotation), true);
        body.set_linvel(vector![0.0, 0.0, 0.0], true);
        body.set_angvel(vector![0.0, 0.0, 0.0], true);
        body.reset_forces(true);
        body.reset_torques(true);
    }
}
