// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! View frustum of six inward-facing planes.

use crate::voxtree::geometry::bounds::Aabb;
use crate::voxtree::geometry::plane::{Plane, PlaneSide};
use crate::voxtree::geometry::point::{Point3, Vector3};
use crate::voxtree::voxstream::{invalid_input, VoxResult};
use serde::{Deserialize, Serialize};

/// Result of classifying a volume against a frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrustumClass {
    Inside,
    Intersecting,
    Outside,
}

/// Six planes with normals pointing into the frustum volume.
///
/// Plane order: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    pub const fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Builds a perspective frustum from camera parameters.
    ///
    /// ## Input
    /// - `eye`: camera position
    /// - `look`: point the camera faces (must differ from eye)
    /// - `up`: approximate up direction
    /// - `fov_y`: vertical field of view in radians, in (0, π)
    /// - `aspect`: width / height, positive
    /// - `near`, `far`: clip distances, 0 < near < far
    ///
    /// ## Error Conditions
    /// - Degenerate camera basis (look == eye, up parallel to view)
    /// - Parameters outside the ranges above
    pub fn perspective(
        eye: Point3,
        look: Point3,
        up: Vector3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> VoxResult<Self> {
        if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
            return Err(invalid_input(
                "fov_y",
                format!("{}", fov_y),
                "must lie in (0, pi)",
            ));
        }
        if !(aspect > 0.0 && aspect.is_finite()) {
            return Err(invalid_input(
                "aspect",
                format!("{}", aspect),
                "must be positive and finite",
            ));
        }
        if !(near > 0.0 && far > near) {
            return Err(invalid_input(
                "near/far",
                format!("{}/{}", near, far),
                "must satisfy 0 < near < far",
            ));
        }

        let forward = (look - eye).normalised()?;
        let right = forward.cross(&up.normalised()?).normalised()?;
        let true_up = right.cross(&forward);

        let half_h = (fov_y * 0.5).tan() * aspect;
        let half_v = (fov_y * 0.5).tan();

        // Edge directions along the four side faces.
        let left_dir = forward - right * half_h;
        let right_dir = forward + right * half_h;
        let bottom_dir = forward - true_up * half_v;
        let top_dir = forward + true_up * half_v;

        // Each side plane contains the eye and one edge direction; the
        // cross-product order keeps the normal on the interior side.
        let left = Plane::from_point_normal(eye, left_dir.cross(&true_up))?;
        let right_p = Plane::from_point_normal(eye, true_up.cross(&right_dir))?;
        let bottom = Plane::from_point_normal(eye, right.cross(&bottom_dir))?;
        let top = Plane::from_point_normal(eye, top_dir.cross(&right))?;

        let near_p = Plane::from_point_normal(eye + forward * near, forward)?;
        let far_p = Plane::from_point_normal(eye + forward * far, forward * -1.0)?;

        Ok(Self::new([left, right_p, bottom, top, near_p, far_p]))
    }

    /// Classifies a closed box against all six planes.
    ///
    /// `Outside` as soon as one plane rejects the whole box; `Inside`
    /// only when every plane accepts it fully.
    pub fn classify_aabb(&self, aabb: &Aabb) -> FrustumClass {
        let mut all_inside = true;
        for plane in &self.planes {
            match plane.classify_aabb(aabb) {
                PlaneSide::Negative => return FrustumClass::Outside,
                PlaneSide::Straddling => all_inside = false,
                PlaneSide::Positive => {}
            }
        }
        if all_inside {
            FrustumClass::Inside
        } else {
            FrustumClass::Intersecting
        }
    }

    /// True when the point lies on the inner side of every plane.
    pub fn contains_point(&self, p: &Point3) -> bool {
        self.planes.iter().all(|pl| pl.signed_distance(p) >= 0.0)
    }
}
