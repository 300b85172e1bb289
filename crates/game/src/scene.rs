//! Static scene: rings of landing platforms and randomly placed planets.
//!
//! Everything is spawned once when the world is built and never despawned.
//! Each object gets an entity in the arena and a tagged static collider
//! pointing back at it.

use engine_core::{Quat, Transform, Vec3, WorldBounds};
use hecs::{Entity, World};
use physics::{ColliderData, ColliderTags, PhysicsBody, PhysicsWorld};
use rand::prelude::*;

use crate::config::WorldConfig;
use crate::gravity::GravityKind;

const PLATFORM_RINGS: u32 = 4;
const PLANET_RINGS: u32 = 6;
const PLANET_SCALE_MIN: f32 = 0.7;
const PLANET_SCALE_MAX: f32 = 1.5;
/// Planet position jitter as a fraction of the ring spacing.
const PLANET_JITTER_RATIO: f32 = 0.6;

/// Gravity role of a scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityBody {
    pub kind: GravityKind,
    /// Full bounding size.
    pub size: Vec3,
}

/// Owns the scene entities.
pub struct SceneArena {
    pub world: World,
    pub platforms: Vec<Entity>,
    pub planets: Vec<Entity>,
}

impl SceneArena {
    /// Spawn platforms and planets around the origin and register their colliders.
    pub fn build(config: &WorldConfig, bounds: &WorldBounds, physics: &mut PhysicsWorld) -> Self {
        let mut arena = Self {
            world: World::new(),
            platforms: Vec::new(),
            planets: Vec::new(),
        };
        let b = bounds.half_extent();

        // Upper rings, then lower; alternate rings are offset by half a slot.
        let platform_rings = [
            (b / 3.0, 0.0),
            (2.0 * b / 3.0, 0.5),
            (-b / 3.0, 0.0),
            (-2.0 * b / 3.0, 0.5),
        ];
        let per_ring = config.platform_count / PLATFORM_RINGS;
        for (height, phase) in platform_rings {
            arena.spawn_platform_ring(config, physics, b, per_ring, phase, height);
        }

        let spacing = b / 6.0;
        let jitter = spacing * PLANET_JITTER_RATIO;
        let per_ring = config.planet_count / PLANET_RINGS;
        let mut rng = StdRng::seed_from_u64(config.seed);
        for level in [1.0, 3.0, 5.0, -1.0, -3.0, -5.0] {
            arena.spawn_planet_ring(config, physics, &mut rng, b, per_ring, level * spacing, jitter);
        }

        physics.update_query_pipeline();
        log::info!(
            "scene built: {} platforms, {} planets, bounds half extent {}",
            arena.platforms.len(),
            arena.planets.len(),
            b
        );
        arena
    }

    fn spawn_platform_ring(
        &mut self,
        config: &WorldConfig,
        physics: &mut PhysicsWorld,
        b: f32,
        count: u32,
        phase: f32,
        height: f32,
    ) {
        let size = Vec3::from_array(config.platform_size);
        for i in 0..count {
            let angle = std::f32::consts::TAU / count as f32 * (i as f32 + phase);
            let position = ring_point(b / 2.0, angle, height);
            let transform = Transform::from_position(position);
            let body = GravityBody {
                kind: GravityKind::Directional,
                size,
            };
            let entity = self.world.spawn((transform, body));
            let collider = physics.add_static_cuboid(
                position,
                Quat::IDENTITY,
                size * 0.5,
                ColliderData::new(ColliderTags::DIR_GRAVITY, Some(entity)),
            );
            self.attach(entity, PhysicsBody::fixed(collider));
            self.platforms.push(entity);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_planet_ring(
        &mut self,
        config: &WorldConfig,
        physics: &mut PhysicsWorld,
        rng: &mut StdRng,
        b: f32,
        count: u32,
        height: f32,
        jitter: f32,
    ) {
        for i in 0..count {
            let angle_jitter: f32 = rng.gen_range(0.2..0.8);
            let angle = std::f32::consts::TAU / count as f32 * (i as f32 + angle_jitter);
            let offset = Vec3::new(
                rng.gen_range(-jitter * 4.0..jitter * 4.0),
                rng.gen_range(-jitter..jitter),
                rng.gen_range(-jitter * 4.0..jitter * 4.0),
            );
            let position = ring_point(b / 2.0, angle, height) + offset;
            let rotation = Quat::from_euler(
                glam::EulerRot::YXZ,
                rng.gen_range(0.0..360.0f32).to_radians(),
                rng.gen_range(0.0..360.0f32).to_radians(),
                rng.gen_range(0.0..360.0f32).to_radians(),
            );
            let scale: f32 = rng.gen_range(PLANET_SCALE_MIN..PLANET_SCALE_MAX);
            let radius = config.planet_radius * scale;

            let transform = Transform {
                position,
                rotation,
                scale: Vec3::splat(scale),
            };
            let body = GravityBody {
                kind: GravityKind::Spherical,
                size: Vec3::splat(radius * 2.0),
            };
            let entity = self.world.spawn((transform, body));
            let collider = physics.add_static_sphere(
                position,
                rotation,
                radius,
                ColliderData::new(ColliderTags::SPHERE_GRAVITY | ColliderTags::LARGE, Some(entity)),
            );
            self.attach(entity, PhysicsBody::fixed(collider));
            self.planets.push(entity);
        }
    }

    fn attach(&mut self, entity: Entity, body: PhysicsBody) {
        if let Err(e) = self.world.insert_one(entity, body) {
            log::warn!("scene entity vanished before its collider was attached: {e}");
        }
    }

    /// Number of entities with a gravity role.
    pub fn len(&self) -> usize {
        self.world.query::<&GravityBody>().iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Point on a horizontal ring. Angle 0 is +X.
fn ring_point(radius: f32, angle: f32, height: f32) -> Vec3 {
    Quat::from_rotation_y(angle) * Vec3::new(radius, 0.0, 0.0) + Vec3::new(0.0, height, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use physics::SpatialQuery;

    fn build(config: &WorldConfig) -> (SceneArena, PhysicsWorld) {
        let mut physics = PhysicsWorld::new(0.02);
        let bounds = WorldBounds::from_reference_scale(config.bounds_reference_scale);
        let arena = SceneArena::build(config, &bounds, &mut physics);
        (arena, physics)
    }

    #[test]
    fn default_layout_counts() {
        let (arena, physics) = build(&WorldConfig::default());
        assert_eq!(arena.platforms.len(), 16);
        // 16 planets over 6 rings: 2 per ring.
        assert_eq!(arena.planets.len(), 12);
        assert_eq!(arena.len(), 28);
        assert_eq!(physics.collider_set.len(), 28);
    }

    #[test]
    fn platforms_sit_on_their_rings() {
        let (arena, _) = build(&WorldConfig::default());
        let mut heights: Vec<i32> = arena
            .platforms
            .iter()
            .map(|&e| {
                let t = arena.world.get::<&Transform>(e).unwrap();
                let flat = Vec3::new(t.position.x, 0.0, t.position.z).length();
                assert!((flat - 300.0).abs() < 1e-3);
                t.position.y.round() as i32
            })
            .collect();
        heights.sort();
        heights.dedup();
        assert_eq!(heights, vec![-400, -200, 200, 400]);
    }

    #[test]
    fn first_platform_is_under_the_default_spawn() {
        let (arena, physics) = build(&WorldConfig::default());
        let hits = physics.overlap_sphere(Vec3::new(300.0, 204.0, 0.0), 75.0);
        let platform = hits
            .iter()
            .find(|h| h.tags.contains(ColliderTags::DIR_GRAVITY))
            .unwrap();
        assert_eq!(platform.owner, Some(arena.platforms[0]));
        assert!((platform.transform.position - Vec3::new(300.0, 200.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn planets_are_tagged_large_and_seeded() {
        let config = WorldConfig::default();
        let (a, _) = build(&config);
        let (b, _) = build(&config);
        for (&ea, &eb) in a.planets.iter().zip(&b.planets) {
            let ta = *a.world.get::<&Transform>(ea).unwrap();
            let tb = *b.world.get::<&Transform>(eb).unwrap();
            assert_eq!(ta, tb);
            let body = *a.world.get::<&GravityBody>(ea).unwrap();
            assert_eq!(body.kind, GravityKind::Spherical);
            let r = body.size.x / 2.0;
            assert!((28.0..60.0).contains(&r));
        }
    }

    #[test]
    fn empty_config_spawns_nothing() {
        let config = WorldConfig {
            platform_count: 0,
            planet_count: 0,
            ..WorldConfig::default()
        };
        let (arena, _) = build(&config);
        assert!(arena.is_empty());
    }
}
