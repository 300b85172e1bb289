//! Gravity field sampling: which planets and platforms currently pull on the ship.
//!
//! The overlap query is the expensive part, so it only runs every few ticks.
//! Each scan replaces the cached snapshot wholesale; between scans the ship
//! keeps using the previous one.

use std::sync::Arc;

use engine_core::{Entity, Quat, Vec3};
use physics::{ColliderTags, OverlapHit, SpatialQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityKind {
    /// Radial pull toward the source center (planets).
    Spherical,
    /// Constant world-down pull inside the source's volume (landing platforms).
    Directional,
}

/// One gravity-affecting collider found by a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravitySource {
    pub kind: GravityKind,
    pub position: Vec3,
    pub rotation: Quat,
    /// Full bounding size in the source's local axes.
    pub size: Vec3,
    pub owner: Option<Entity>,
}

impl GravitySource {
    fn from_hit(kind: GravityKind, hit: &OverlapHit) -> Self {
        Self {
            kind,
            position: hit.transform.position,
            rotation: hit.transform.rotation,
            size: hit.size,
            owner: hit.owner,
        }
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

/// Immutable result of one scan. Cloning is cheap and the view stays valid after the sampler rescans.
#[derive(Debug, Clone, Default)]
pub struct GravitySnapshot {
    version: u64,
    spherical: Arc<[GravitySource]>,
    directional: Arc<[GravitySource]>,
}

impl GravitySnapshot {
    /// Scans since startup. 0 means nothing has been scanned yet.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn spherical(&self) -> &[GravitySource] {
        &self.spherical
    }

    pub fn directional(&self) -> &[GravitySource] {
        &self.directional
    }
}

/// Throttled scanner owning the current snapshot.
#[derive(Debug, Clone)]
pub struct GravitySampler {
    radius: f32,
    frame_skip: u32,
    frame_counter: u32,
    snapshot: GravitySnapshot,
}

impl GravitySampler {
    /// `frame_skip` is the scan interval in ticks.
    pub fn new(radius: f32, frame_skip: u32) -> Self {
        Self {
            radius,
            frame_skip,
            frame_counter: 0,
            snapshot: GravitySnapshot::default(),
        }
    }

    pub fn frame_skip(&self) -> u32 {
        self.frame_skip
    }

    /// Count one tick and rescan when the interval is reached. Returns whether a scan ran.
    pub fn tick(&mut self, query: &impl SpatialQuery, center: Vec3) -> bool {
        self.frame_counter += 1;
        if self.frame_counter >= self.frame_skip {
            self.force_scan(query, center);
            self.frame_counter = 0;
            true
        } else {
            false
        }
    }

    /// Rescan immediately, e.g. right after spawning.
    ///
    /// Objects with several colliders show up once per collider.
    pub fn force_scan(&mut self, query: &impl SpatialQuery, center: Vec3) {
        let hits = query.overlap_sphere(center, self.radius);

        let spherical: Vec<_> = hits
            .iter()
            .filter(|hit| hit.tags.contains(ColliderTags::SPHERE_GRAVITY))
            .map(|hit| GravitySource::from_hit(GravityKind::Spherical, hit))
            .collect();
        let directional: Vec<_> = hits
            .iter()
            .filter(|hit| hit.tags.contains(ColliderTags::DIR_GRAVITY))
            .map(|hit| GravitySource::from_hit(GravityKind::Directional, hit))
            .collect();

        self.snapshot = GravitySnapshot {
            version: self.snapshot.version + 1,
            spherical: spherical.into(),
            directional: directional.into(),
        };
        log::debug!(
            "gravity scan v{}: {} spherical, {} directional",
            self.snapshot.version,
            self.snapshot.spherical.len(),
            self.snapshot.directional.len()
        );
    }

    pub fn snapshot(&self) -> &GravitySnapshot {
        &self.snapshot
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use engine_core::Transform;
    use physics::ProbeHit;
    use std::cell::{Cell, RefCell};

    /// Scripted world: fixed overlap results and probe answers keyed by direction.
    #[derive(Default)]
    pub(crate) struct FakeWorld {
        pub hits: Vec<OverlapHit>,
        pub probes: RefCell<Vec<(Vec3, Option<ProbeHit>)>>,
        pub overlap_calls: Cell<u32>,
    }

    impl FakeWorld {
        pub fn with_hits(hits: Vec<OverlapHit>) -> Self {
            Self {
                hits,
                ..Default::default()
            }
        }

        /// Answer probes whose direction is within 1e-3 of `direction`.
        pub fn add_probe(&self, direction: Vec3, hit: Option<ProbeHit>) {
            self.probes.borrow_mut().push((direction.normalize(), hit));
        }
    }

    impl SpatialQuery for FakeWorld {
        fn overlap_sphere(&self, _center: Vec3, _radius: f32) -> Vec<OverlapHit> {
            self.overlap_calls.set(self.overlap_calls.get() + 1);
            self.hits.clone()
        }

        fn probe(&self, _origin: Vec3, direction: Vec3, max_distance: f32) -> Option<ProbeHit> {
            self.probes
                .borrow()
                .iter()
                .find(|(d, _)| (*d - direction).length() < 1e-3)
                .and_then(|(_, hit)| *hit)
                .filter(|hit| hit.distance <= max_distance)
        }
    }

    pub(crate) fn hit(tags: ColliderTags, position: Vec3, size: Vec3) -> OverlapHit {
        OverlapHit {
            tags,
            owner: None,
            transform: Transform::from_position(position),
            size,
        }
    }

    #[test]
    fn scan_partitions_by_tag() {
        let world = FakeWorld::with_hits(vec![
            hit(ColliderTags::SPHERE_GRAVITY | ColliderTags::LARGE, Vec3::X, Vec3::ONE),
            hit(ColliderTags::DIR_GRAVITY, Vec3::Y, Vec3::ONE),
            hit(ColliderTags::LARGE, Vec3::Z, Vec3::ONE),
        ]);
        let mut sampler = GravitySampler::new(75.0, 10);
        sampler.force_scan(&world, Vec3::ZERO);
        let snapshot = sampler.snapshot();
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.spherical().len(), 1);
        assert_eq!(snapshot.spherical()[0].position, Vec3::X);
        assert_eq!(snapshot.directional().len(), 1);
        assert_eq!(snapshot.directional()[0].kind, GravityKind::Directional);
    }

    #[test]
    fn scans_run_every_frame_skip_ticks() {
        let world = FakeWorld::default();
        let mut sampler = GravitySampler::new(75.0, 10);
        let scans: Vec<bool> = (0..25).map(|_| sampler.tick(&world, Vec3::ZERO)).collect();
        let scan_ticks: Vec<usize> = scans
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i + 1))
            .collect();
        assert_eq!(scan_ticks, vec![10, 20]);
        assert_eq!(world.overlap_calls.get(), 2);
        assert_eq!(sampler.snapshot().version(), 2);
    }

    #[test]
    fn rescan_replaces_instead_of_merging() {
        let mut world = FakeWorld::with_hits(vec![hit(ColliderTags::SPHERE_GRAVITY, Vec3::X, Vec3::ONE)]);
        let mut sampler = GravitySampler::new(75.0, 1);
        sampler.force_scan(&world, Vec3::ZERO);
        let old = sampler.snapshot().clone();

        world.hits = vec![hit(ColliderTags::DIR_GRAVITY, Vec3::Y, Vec3::ONE)];
        sampler.force_scan(&world, Vec3::ZERO);
        assert!(sampler.snapshot().spherical().is_empty());
        assert_eq!(sampler.snapshot().directional().len(), 1);
        // Views taken before the rescan are untouched.
        assert_eq!(old.spherical().len(), 1);
        assert_eq!(old.version() + 1, sampler.snapshot().version());
    }

    #[test]
    fn duplicate_colliders_are_kept() {
        let world = FakeWorld::with_hits(vec![
            hit(ColliderTags::SPHERE_GRAVITY, Vec3::X, Vec3::ONE),
            hit(ColliderTags::SPHERE_GRAVITY, Vec3::X, Vec3::ONE),
        ]);
        let mut sampler = GravitySampler::new(75.0, 10);
        sampler.force_scan(&world, Vec3::ZERO);
        assert_eq!(sampler.snapshot().spherical().len(), 2);
    }
}
