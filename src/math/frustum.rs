//! View frustum for coarse node culling

use crate::core::types::{Mat4, Vec3, Vec4};
use super::aabb::Aabb;

/// A plane defined by normal and distance from origin
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Signed distance from point to plane (positive = in front)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    fn from_coefficients(v: Vec4) -> Self {
        let normal = Vec3::new(v.x, v.y, v.z);
        let len = normal.length();
        Self {
            normal: normal / len,
            distance: v.w / len,
        }
    }
}

/// View frustum with 6 planes (near, far, left, right, top, bottom)
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb/Hartmann extraction for zero-to-one depth as produced by glam's
    /// `perspective_rh`/`orthographic_rh`: the near plane is the matrix's z
    /// row by itself (clip z >= 0), every other plane is the w row plus or
    /// minus one of the first three rows.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();
        let row = |i: usize| Vec4::new(m[0][i], m[1][i], m[2][i], m[3][i]);
        let w = row(3);

        Self {
            planes: [
                Plane::from_coefficients(row(2)),     // near
                Plane::from_coefficients(w - row(2)), // far
                Plane::from_coefficients(w + row(0)), // left
                Plane::from_coefficients(w - row(0)), // right
                Plane::from_coefficients(w - row(1)), // top
                Plane::from_coefficients(w + row(1)), // bottom
            ],
        }
    }

    /// Check if point is inside frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance_to_point(point) >= 0.0)
    }

    /// Check if AABB intersects frustum (conservative test)
    ///
    /// Tests only the corner most aligned with each plane normal, so an AABB
    /// fully outside one plane is always rejected; some AABBs outside the
    /// frustum but not outside any single plane are accepted.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let p = Vec3::new(
                if plane.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }
        true
    }
}
