// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Closed axis-aligned bounding boxes and spheres.
//!
//! Overlap predicates on the collision path are strict: boxes touching at
//! a face, edge or corner do not overlap.

use crate::voxtree::geometry::point::Point3;
use crate::voxtree::voxstream::{invalid_input, VoxResult};
use serde::{Deserialize, Serialize};

/// A closed axis-aligned bounding box (min ≤ max componentwise).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb {
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Degenerate box covering a single point.
    pub fn point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Validates componentwise ordering and domain membership of both
    /// corners.
    pub fn validate(&self) -> VoxResult<()> {
        self.min.validate()?;
        self.max.validate()?;
        if self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z {
            return Err(invalid_input(
                "bounds",
                format!("{:?}", self),
                "min must be componentwise <= max",
            ));
        }
        Ok(())
    }

    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Closed containment test.
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// True when `other` lies entirely inside this box (closed).
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    /// Closed intersection test: shared faces count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Strict overlap: positive-volume intersection required. Touching is
    /// not overlapping.
    pub fn overlaps_strictly(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(&other.min), self.max.max(&other.max))
    }

    /// Squared distance from a point to the box surface; zero inside.
    pub fn distance_sq_to_point(&self, p: &Point3) -> f32 {
        let dx = (self.min.x - p.x).max(0.0).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(0.0).max(p.y - self.max.y);
        let dz = (self.min.z - p.z).max(0.0).max(p.z - self.max.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Closed sphere intersection test.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.distance_sq_to_point(&sphere.center) <= sphere.radius * sphere.radius
    }
}

/// A query sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point3,
    pub radius: f32,
}

impl Sphere {
    pub const fn new(center: Point3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn validate(&self) -> VoxResult<()> {
        self.center.validate()?;
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(invalid_input(
                "radius",
                format!("{}", self.radius),
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }

    pub fn contains_point(&self, p: &Point3) -> bool {
        self.center.distance_sq(p) <= self.radius * self.radius
    }

    /// True when the box lies entirely inside the sphere.
    pub fn contains_aabb(&self, aabb: &Aabb) -> bool {
        // The farthest corner decides containment.
        let fx = if self.center.x - aabb.min.x > aabb.max.x - self.center.x {
            aabb.min.x
        } else {
            aabb.max.x
        };
        let fy = if self.center.y - aabb.min.y > aabb.max.y - self.center.y {
            aabb.min.y
        } else {
            aabb.max.y
        };
        let fz = if self.center.z - aabb.min.z > aabb.max.z - self.center.z {
            aabb.min.z
        } else {
            aabb.max.z
        };
        self.contains_point(&Point3::new(fx, fy, fz))
    }
}
