// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Oriented plane and halfspace classification.

use crate::voxtree::geometry::bounds::Aabb;
use crate::voxtree::geometry::point::{Point3, Vector3};
use crate::voxtree::voxstream::VoxResult;
use serde::{Deserialize, Serialize};

/// Side of a plane, as seen from its normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaneSide {
    Positive,
    Negative,
    Straddling,
}

/// A plane `normal · p + offset = 0` with unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3,
    pub offset: f32,
}

impl Plane {
    /// Builds a plane from a normal (normalised here) and a point on the
    /// plane.
    pub fn from_point_normal(point: Point3, normal: Vector3) -> VoxResult<Self> {
        let normal = normal.normalised()?;
        let offset = -(normal.x * point.x + normal.y * point.y + normal.z * point.z);
        Ok(Self { normal, offset })
    }

    /// Signed distance of a point; positive on the normal side.
    pub fn signed_distance(&self, p: &Point3) -> f32 {
        self.normal.x * p.x + self.normal.y * p.y + self.normal.z * p.z + self.offset
    }

    /// Classifies a closed box against the plane.
    ///
    /// Uses the projected box radius around its centre, so the interval
    /// of signed distances over the box is [d - r, d + r].
    pub fn classify_aabb(&self, aabb: &Aabb) -> PlaneSide {
        let center = aabb.center();
        let half_x = (aabb.max.x - aabb.min.x) * 0.5;
        let half_y = (aabb.max.y - aabb.min.y) * 0.5;
        let half_z = (aabb.max.z - aabb.min.z) * 0.5;
        let radius = half_x * self.normal.x.abs()
            + half_y * self.normal.y.abs()
            + half_z * self.normal.z.abs();
        let distance = self.signed_distance(&center);
        if distance > radius {
            PlaneSide::Positive
        } else if distance < -radius {
            PlaneSide::Negative
        } else {
            PlaneSide::Straddling
        }
    }

    /// Classifies a point with an exact sign test; points on the plane
    /// straddle.
    pub fn classify_point(&self, p: &Point3) -> PlaneSide {
        let d = self.signed_distance(p);
        if d > 0.0 {
            PlaneSide::Positive
        } else if d < 0.0 {
            PlaneSide::Negative
        } else {
            PlaneSide::Straddling
        }
    }
}
