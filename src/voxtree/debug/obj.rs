// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Wavefront OBJ wireframe export.
//!
//! Cells export as 8-vertex wireframe cubes using `v` and `l` records
//! only; no materials, no faces. The output loads in any OBJ viewer.

use crate::voxtree::index::SpatialIndex;
use crate::voxtree::key::SpatialKey;
use crate::voxtree::voxstream::{EntityId, VoxResult};
use std::io::Write;

/// Corner pairs of a box differing in exactly one axis bit
/// (x = 1, y = 2, z = 4): the 12 cube edges.
const CUBE_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (0, 2),
    (0, 4),
    (1, 3),
    (1, 5),
    (2, 3),
    (2, 6),
    (3, 7),
    (4, 5),
    (4, 6),
    (5, 7),
    (6, 7),
];

/// Sink receiving vertex and line records. Vertex indices are 1-based,
/// as in the OBJ format.
pub trait ObjSink {
    /// Emits `v x y z`, returning the new vertex index.
    fn vertex(&mut self, x: f32, y: f32, z: f32) -> VoxResult<usize>;

    /// Emits `l a b`.
    fn line(&mut self, a: usize, b: usize) -> VoxResult<()>;
}

/// Plain-text OBJ writer.
pub struct ObjWriter<W: Write> {
    out: W,
    next_index: usize,
}

impl<W: Write> ObjWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, next_index: 1 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ObjSink for ObjWriter<W> {
    fn vertex(&mut self, x: f32, y: f32, z: f32) -> VoxResult<usize> {
        writeln!(self.out, "v {} {} {}", x, y, z)?;
        let index = self.next_index;
        self.next_index += 1;
        Ok(index)
    }

    fn line(&mut self, a: usize, b: usize) -> VoxResult<()> {
        writeln!(self.out, "l {} {}", a, b)?;
        Ok(())
    }
}

/// Exports every node's bounding cube as a wireframe.
pub fn export_wireframe<K, I, C, S>(
    index: &SpatialIndex<K, I, C>,
    sink: &mut S,
) -> VoxResult<()>
where
    K: SpatialKey,
    I: EntityId,
    C: Clone + Send + Sync + 'static,
    S: ObjSink,
{
    for node in index.nodes() {
        let aabb = node.aabb;
        let mut corners = [0usize; 8];
        for (bits, corner) in corners.iter_mut().enumerate() {
            let x = if bits & 1 != 0 { aabb.max.x } else { aabb.min.x };
            let y = if bits & 2 != 0 { aabb.max.y } else { aabb.min.y };
            let z = if bits & 4 != 0 { aabb.max.z } else { aabb.min.z };
            *corner = sink.vertex(x, y, z)?;
        }
        for (a, b) in CUBE_EDGES {
            sink.line(corners[a], corners[b])?;
        }
    }
    Ok(())
}
