//! The cubic play volume shared by flight containment, the bounds overlay and the scene spawner.

use glam::Vec3;

/// World axis selector used when walking the bounds one axis at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Map an axis index (0, 1, 2) to an axis.
    ///
    /// Any other index is a programming error and panics.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            _ => unreachable!("unhandled axis index {index}"),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along this axis, scaled by `sign`.
    pub fn unit(self, sign: f32) -> Vec3 {
        match self {
            Axis::X => Vec3::new(sign, 0.0, 0.0),
            Axis::Y => Vec3::new(0.0, sign, 0.0),
            Axis::Z => Vec3::new(0.0, 0.0, sign),
        }
    }

    /// The two remaining axes, in ascending order.
    pub fn others(self) -> (Axis, Axis) {
        let i = self.index();
        let (a, b) = ((i + 1) % 3, (i + 2) % 3);
        (Axis::from_index(a.min(b)), Axis::from_index(a.max(b)))
    }

    pub fn component(self, v: Vec3) -> f32 {
        v[self.index()]
    }
}

/// Axis-aligned cube centered on the origin. Fixed for the lifetime of the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    half_extent: f32,
}

impl WorldBounds {
    pub fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }

    /// Derive the bounds from the scale of the reference wall, which spans the whole cube.
    pub fn from_reference_scale(scale: f32) -> Self {
        Self::new(scale / 2.0)
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    /// Distance from `coord` to the nearest face perpendicular to its axis. Negative outside.
    pub fn distance_to_face(&self, coord: f32) -> f32 {
        self.half_extent - coord.abs()
    }

    /// Side of the cube a coordinate is closest to: +1 for non-negative, -1 otherwise.
    pub fn face_sign(coord: f32) -> f32 {
        if coord >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| self.distance_to_face(axis.component(p)) >= 0.0)
    }
}
