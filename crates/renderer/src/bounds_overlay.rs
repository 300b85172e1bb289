//! World bounds overlay: a debug cube plus fading squares on the faces the ship is approaching.

use engine_core::{Axis, Vec3, WorldBounds};

use crate::line::{LineBatch, YELLOW};

/// Distance from a face at which its squares start showing.
pub const BOUNDS_VISIBLE_RANGE: f32 = 80.0;
/// Fully opaque squares nearest the ship.
pub const BOUNDS_CORE_COUNT: u32 = 5;
/// Squares beyond the core ones, fading out.
pub const BOUNDS_FADE_COUNT: u32 = 7;

#[derive(Debug, Clone)]
pub struct BoundsOverlay {
    pub visible_range: f32,
    pub core_count: u32,
    pub fade_count: u32,
    /// Draw the full wireframe cube as well.
    pub show_debug_cube: bool,
}

impl Default for BoundsOverlay {
    fn default() -> Self {
        Self {
            visible_range: BOUNDS_VISIBLE_RANGE,
            core_count: BOUNDS_CORE_COUNT,
            fade_count: BOUNDS_FADE_COUNT,
            show_debug_cube: false,
        }
    }
}

impl BoundsOverlay {
    /// Append this frame's bounds lines for a ship at `ship_position`.
    pub fn build(&self, bounds: &WorldBounds, ship_position: Vec3, batch: &mut LineBatch) {
        if self.show_debug_cube {
            push_cube(bounds.half_extent(), batch);
        }

        for axis in Axis::ALL {
            let coord = axis.component(ship_position);
            if bounds.distance_to_face(coord) > self.visible_range {
                continue;
            }
            let face = WorldBounds::face_sign(coord) * bounds.half_extent();
            self.push_face_squares(bounds, axis, face, ship_position, batch);
        }
    }

    fn push_face_squares(
        &self,
        bounds: &WorldBounds,
        axis: Axis,
        face: f32,
        ship_position: Vec3,
        batch: &mut LineBatch,
    ) {
        for i in 1..=self.core_count {
            push_square(bounds, axis, face, ship_position, i as f32, YELLOW, batch);
        }

        let fade = self.fade_count as f32;
        for i in 1..=self.fade_count {
            let alpha = (fade - i as f32) / fade;
            let color = [YELLOW[0], YELLOW[1], YELLOW[2], alpha];
            let size = (self.core_count + i) as f32;
            push_square(bounds, axis, face, ship_position, size, color, batch);
        }
    }
}

/// Point on the face perpendicular to `axis`, with in-plane coordinates `(u, v)`.
fn face_point(axis: Axis, face: f32, u: f32, v: f32) -> Vec3 {
    let (u_axis, v_axis) = axis.others();
    let mut p = Vec3::ZERO;
    p[axis.index()] = face;
    p[u_axis.index()] = u;
    p[v_axis.index()] = v;
    p
}

/// Square of half-size `size` centered on the ship's projection, clamped to the face.
fn push_square(
    bounds: &WorldBounds,
    axis: Axis,
    face: f32,
    ship_position: Vec3,
    size: f32,
    color: [f32; 4],
    batch: &mut LineBatch,
) {
    let b = bounds.half_extent();
    let (u_axis, v_axis) = axis.others();
    let u = u_axis.component(ship_position);
    let v = v_axis.component(ship_position);

    let u_low = (u - size).max(-b);
    let v_low = (v - size).max(-b);
    let u_high = (u + size).min(b);
    let v_high = (v + size).min(b);

    let upper_right = face_point(axis, face, u_high, v_high);
    let bottom_right = face_point(axis, face, u_high, v_low);
    let upper_left = face_point(axis, face, u_low, v_high);
    let bottom_left = face_point(axis, face, u_low, v_low);

    batch.push_line(upper_right, bottom_right, color);
    batch.push_line(bottom_right, bottom_left, color);
    batch.push_line(bottom_left, upper_left, color);
    batch.push_line(upper_left, upper_right, color);
}

/// The 12 edges of the bounds cube.
fn push_cube(b: f32, batch: &mut LineBatch) {
    let corner = |x: f32, y: f32, z: f32| Vec3::new(x * b, y * b, z * b);
    for axis in Axis::ALL {
        let (u_axis, v_axis) = axis.others();
        for (su, sv) in [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)] {
            let mut start = [0.0f32; 3];
            start[axis.index()] = -1.0;
            start[u_axis.index()] = su;
            start[v_axis.index()] = sv;
            let mut end = start;
            end[axis.index()] = 1.0;
            batch.push_line(
                corner(start[0], start[1], start[2]),
                corner(end[0], end[1], end[2]),
                YELLOW,
            );
        }
    }
}
