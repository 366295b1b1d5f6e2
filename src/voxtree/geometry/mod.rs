// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Geometric primitives of the indexed domain.
//!
//! - point: positions and directions over the positive octant
//! - bounds: closed boxes and spheres, strict-overlap collision predicates
//! - ray: slab tests and point-on-ray tolerance
//! - plane, frustum: halfspace and view-volume classification
//! - cell: the geometry capability queries are written against

pub mod bounds;
pub mod cell;
pub mod frustum;
pub mod plane;
pub mod point;
pub mod ray;

pub use bounds::{Aabb, Sphere};
pub use cell::{CellGeometry, CubeCell};
pub use frustum::{Frustum, FrustumClass};
pub use plane::{Plane, PlaneSide};
pub use point::{Point3, Vector3};
pub use ray::{Ray3, RAY_POINT_TOLERANCE};

#[cfg(test)]
mod bounds_test;
#[cfg(test)]
mod cell_test;
#[cfg(test)]
mod point_test;
