//! Ray probes and overlap queries used by the gravity sampler and the chase camera.

use crate::collision::{ColliderData, ColliderTags};
use crate::physics_world::isometry_to_transform;
use crate::PhysicsWorld;
use engine_core::{Entity, Transform, Vec3};
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// A collider found by an overlap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapHit {
    pub tags: ColliderTags,
    pub owner: Option<Entity>,
    /// World pose of the collider.
    pub transform: Transform,
    /// Full bounding size of the collider shape in its local axes.
    pub size: Vec3,
}

/// Nearest obstruction along a probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    pub distance: f32,
    pub tags: ColliderTags,
}

/// The spatial questions the flight core asks of the world.
pub trait SpatialQuery {
    /// All colliders touching a sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<OverlapHit>;

    /// Nearest hit along `direction` (unit length) within `max_distance`.
    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<ProbeHit>;
}

impl PhysicsWorld {
    /// Cast a ray and return the first hit that passes `filter`.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(collider, intersection)| {
                let point = ray.point_at(intersection.time_of_impact);
                RaycastHit {
                    collider,
                    distance: intersection.time_of_impact,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                }
            })
    }

    /// Find all colliders within a sphere that pass `filter`.
    pub fn overlap_sphere_filtered(
        &self,
        center: Vec3,
        radius: f32,
        filter: QueryFilter,
    ) -> Vec<ColliderHandle> {
        let shape = Ball::new(radius);
        let shape_pos = Isometry::translation(center.x, center.y, center.z);

        let mut results = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &shape_pos,
            &shape,
            filter,
            |collider| {
                results.push(collider);
                true // Continue searching
            },
        );

        results
    }

    /// Tags and owner stored on a collider.
    pub fn collider_data(&self, handle: ColliderHandle) -> Option<ColliderData> {
        self.collider_set
            .get(handle)
            .map(|collider| ColliderData::unpack(collider.user_data))
    }

    /// Query view that ignores the given body, e.g. the ship probing from its own center.
    pub fn query_excluding(&self, body: RigidBodyHandle) -> WorldQuery<'_> {
        WorldQuery {
            world: self,
            exclude: Some(body),
        }
    }

    fn overlap_hit(&self, handle: ColliderHandle) -> Option<OverlapHit> {
        let collider = self.collider_set.get(handle)?;
        let data = ColliderData::unpack(collider.user_data);
        let shape = collider.shape();
        let size = if let Some(cuboid) = shape.as_cuboid() {
            let h = cuboid.half_extents;
            Vec3::new(h.x, h.y, h.z) * 2.0
        } else if let Some(ball) = shape.as_ball() {
            Vec3::splat(ball.radius * 2.0)
        } else {
            let aabb = shape.compute_local_aabb();
            let e = aabb.extents();
            Vec3::new(e.x, e.y, e.z)
        };
        Some(OverlapHit {
            tags: data.tags,
            owner: data.owner,
            transform: isometry_to_transform(collider.position()),
            size,
        })
    }
}

/// `SpatialQuery` over a `PhysicsWorld`, optionally skipping one rigid body.
pub struct WorldQuery<'a> {
    world: &'a PhysicsWorld,
    exclude: Option<RigidBodyHandle>,
}

impl WorldQuery<'_> {
    fn filter(&self) -> QueryFilter<'static> {
        match self.exclude {
            Some(body) => QueryFilter::default().exclude_rigid_body(body),
            None => QueryFilter::default(),
        }
    }
}

impl SpatialQuery for WorldQuery<'_> {
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<OverlapHit> {
        self.world
            .overlap_sphere_filtered(center, radius, self.filter())
            .into_iter()
            .filter_map(|handle| self.world.overlap_hit(handle))
            .collect()
    }

    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<ProbeHit> {
        self.world
            .raycast(origin, direction, max_distance, self.filter())
            .map(|hit| ProbeHit {
                distance: hit.distance,
                tags: self
                    .world
                    .collider_data(hit.collider)
                    .map_or(ColliderTags::NONE, |data| data.tags),
            })
    }
}

impl SpatialQuery for PhysicsWorld {
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<OverlapHit> {
        WorldQuery { world: self, exclude: None }.overlap_sphere(center, radius)
    }

    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<ProbeHit> {
        WorldQuery { world: self, exclude: None }.probe(origin, direction, max_distance)
    }
}
