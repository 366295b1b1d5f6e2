// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Ray primitive and slab intersection.

use crate::voxtree::geometry::bounds::Aabb;
use crate::voxtree::geometry::point::{Point3, Vector3};
use crate::voxtree::voxstream::VoxResult;
use serde::{Deserialize, Serialize};

/// Absolute tolerance for treating a point entity as lying on a ray.
pub const RAY_POINT_TOLERANCE: f32 = 1e-3;

/// A ray with unit direction; `t` parameters are Euclidean distances from
/// the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray3 {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Ray3 {
    /// Builds a ray, normalising the direction.
    ///
    /// ## Error Conditions
    /// - Zero or non-finite direction
    /// - Origin outside the valid domain is allowed: queries advance to
    ///   the domain entry point before traversal.
    pub fn new(origin: Point3, direction: Vector3) -> VoxResult<Self> {
        Ok(Self {
            origin,
            direction: direction.normalised()?,
        })
    }

    pub fn point_at(&self, t: f32) -> Point3 {
        self.origin + self.direction * t
    }

    /// Slab test against a closed box.
    ///
    /// ## Output
    /// - `Some((t_entry, t_exit))` with `t_exit >= max(t_entry, 0)` when
    ///   the forward ray meets the box
    /// - `None` when the box is missed or behind the origin
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for (origin, dir, lo, hi) in [
            (self.origin.x, self.direction.x, aabb.min.x, aabb.max.x),
            (self.origin.y, self.direction.y, aabb.min.y, aabb.max.y),
            (self.origin.z, self.direction.z, aabb.min.z, aabb.max.z),
        ] {
            if dir.abs() < f32::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let (t0, t1) = if inv >= 0.0 {
                ((lo - origin) * inv, (hi - origin) * inv)
            } else {
                ((hi - origin) * inv, (lo - origin) * inv)
            };
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None;
        }
        Some((t_min.max(0.0), t_max))
    }

    /// Parameter of the closest approach to a point, clamped to the
    /// forward half-line.
    pub fn closest_t(&self, p: &Point3) -> f32 {
        let to_point = *p - self.origin;
        to_point.dot(&self.direction).max(0.0)
    }

    /// Returns `Some(t)` when the point lies on the forward ray within
    /// `RAY_POINT_TOLERANCE`.
    pub fn hit_point(&self, p: &Point3) -> Option<f32> {
        let t = self.closest_t(p);
        let nearest = self.point_at(t);
        if nearest.distance_sq(p) <= RAY_POINT_TOLERANCE * RAY_POINT_TOLERANCE {
            Some(t)
        } else {
            None
        }
    }
}
