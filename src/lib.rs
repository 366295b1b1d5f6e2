// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! VoxTree - High-Performance In-Memory 3D Spatial Index
//!
//! Two interchangeable structures over one engine: a Morton-keyed cubic
//! octree and a tetrahedral tree on the tetrahedral-Morton curve.

pub mod voxtree;
