// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Point and vector primitives over the positive octant.
//!
//! All indexed coordinates are non-negative; the origin is the single
//! anchor corner of the domain. Validation happens at the API boundary,
//! so interior code can assume finite, in-range components.

use crate::voxtree::key::MAX_COORDINATE;
use crate::voxtree::voxstream::{invalid_input, VoxResult};
use serde::{Deserialize, Serialize};

/// A position inside the indexed domain.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Validates that every component is finite, non-negative and below
    /// the domain edge length.
    ///
    /// ## Output
    /// - `Ok(())` when the point lies inside the domain
    /// - `VoxError::InvalidInput` naming the offending component
    ///
    /// ## Example Usage
    /// ```rust
    /// use voxtree::voxtree::geometry::Point3;
    ///
    /// assert!(Point3::new(1.0, 2.0, 3.0).validate().is_ok());
    /// assert!(Point3::new(-1.0, 2.0, 3.0).validate().is_err());
    /// ```
    pub fn validate(&self) -> VoxResult<()> {
        let limit = MAX_COORDINATE as f32;
        for (name, value) in [("x", self.x), ("y", self.y), ("z", self.z)] {
            if !value.is_finite() {
                return Err(invalid_input(name, format!("{}", value), "must be finite"));
            }
            if value < 0.0 {
                return Err(invalid_input(
                    name,
                    format!("{}", value),
                    "must be non-negative",
                ));
            }
            if value >= limit {
                return Err(invalid_input(
                    name,
                    format!("{}", value),
                    format!("must be below {}", limit),
                ));
            }
        }
        Ok(())
    }

    /// Squared Euclidean distance to another point.
    pub fn distance_sq(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point3) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Componentwise minimum.
    pub fn min(&self, other: &Point3) -> Point3 {
        Point3::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Componentwise maximum.
    pub fn max(&self, other: &Point3) -> Point3 {
        Point3::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

/// A direction or displacement; unlike `Point3` it may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length_sq(&self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn length(&self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Returns the unit-length vector, or an error for zero or non-finite
    /// input.
    pub fn normalised(&self) -> VoxResult<Vector3> {
        let len = self.length();
        if !len.is_finite() || len <= 0.0 {
            return Err(invalid_input(
                "direction",
                format!("({}, {}, {})", self.x, self.y, self.z),
                "must be non-zero and finite",
            ));
        }
        Ok(Vector3::new(self.x / len, self.y / len, self.z / len))
    }

    pub fn dot(&self, other: &Vector3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

impl std::ops::Sub for Point3 {
    type Output = Vector3;

    fn sub(self, other: Point3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Add<Vector3> for Point3 {
    type Output = Point3;

    fn add(self, v: Vector3) -> Point3 {
        Point3::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl std::ops::Mul<f32> for Vector3 {
    type Output = Vector3;

    fn mul(self, s: f32) -> Vector3 {
        Vector3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl std::ops::Add for Vector3 {
    type Output = Vector3;

    fn add(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, other: Vector3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}
