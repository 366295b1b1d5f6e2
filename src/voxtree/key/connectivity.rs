// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Bey-refinement connectivity tables.
//!
//! The six tetrahedron types are the Kuhn simplices of the unit cube:
//! type b has edge axes (i, j) with i = b / 2 and j = (i + 2) % 3 for
//! even b, j = (i + 1) % 3 for odd b; vertices v0 = anchor,
//! v1 = v0 + h·e_i, v2 = v1 + h·e_j, v3 = anchor + (h, h, h). Bey's
//! 1 → 8 subdivision keeps the four corner tets similar to the parent and
//! splits the interior octahedron along the m02–m13 diagonal.
//!
//! The table values are fixed ground truth for the whole crate. They were
//! derived once from that construction and are locked in place by the
//! round-trip and reciprocity tests; do not edit them independently.

/// Child type by (parent type, child index in Bey order).
///
/// Children 0–3 are the corner tets and keep the parent type.
pub const PARENT_TYPE_TO_CHILD_TYPE: [[u8; 8]; 6] = [
    [0, 0, 0, 0, 4, 5, 2, 1],
    [1, 1, 1, 1, 3, 2, 5, 0],
    [2, 2, 2, 2, 0, 1, 4, 3],
    [3, 3, 3, 3, 5, 4, 1, 2],
    [4, 4, 4, 4, 2, 3, 0, 5],
    [5, 5, 5, 5, 1, 0, 3, 4],
];

/// Cube-id of each Bey child within the refined parent cell, by
/// (parent type, child index). Bit 0 = x, bit 1 = y, bit 2 = z.
pub const CHILD_CUBE_ID: [[u8; 8]; 6] = [
    [0, 1, 5, 7, 1, 1, 5, 5],
    [0, 1, 3, 7, 1, 1, 3, 3],
    [0, 2, 3, 7, 2, 2, 3, 3],
    [0, 2, 6, 7, 2, 2, 6, 6],
    [0, 4, 6, 7, 4, 4, 6, 6],
    [0, 4, 5, 7, 4, 4, 5, 5],
];

/// Parent type by (cube-id of the child, child type). The inverse of the
/// two tables above; every (cube-id, type) pair resolves uniquely.
pub const CUBE_ID_TYPE_TO_PARENT_TYPE: [[u8; 6]; 8] = [
    [0, 1, 2, 3, 4, 5],
    [0, 1, 1, 1, 0, 0],
    [2, 2, 2, 3, 3, 3],
    [1, 1, 2, 2, 2, 1],
    [5, 5, 4, 4, 4, 5],
    [0, 0, 0, 5, 5, 5],
    [4, 3, 3, 3, 4, 4],
    [0, 1, 2, 3, 4, 5],
];

/// Sentinel for child faces interior to the parent.
pub const NO_FACE: u8 = u8::MAX;

/// Vertex indices of each face, ascending. Face f is opposite vertex f;
/// under the canonical vertex ordering this is type-independent.
pub const FACE_CORNERS: [[u8; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// Bey child indices touching each parent face (three corner tets plus
/// one interior tet per face). Type-independent.
pub const CHILDREN_AT_FACE: [[u8; 4]; 4] = [
    [1, 2, 3, 7],
    [0, 2, 3, 6],
    [0, 1, 3, 4],
    [0, 1, 2, 5],
];

/// Parent face covered by each face of a Bey child, or `NO_FACE` when the
/// child face is interior. Type-independent.
pub const FACE_CHILD_FACE: [[u8; 4]; 8] = [
    [NO_FACE, 1, 2, 3],
    [0, NO_FACE, 2, 3],
    [0, 1, NO_FACE, 3],
    [0, 1, 2, NO_FACE],
    [NO_FACE, 2, NO_FACE, NO_FACE],
    [NO_FACE, NO_FACE, NO_FACE, 3],
    [NO_FACE, NO_FACE, 1, NO_FACE],
    [0, NO_FACE, NO_FACE, NO_FACE],
];

/// Family slots as seen from each Bey child: row i lists the eight child
/// indices starting at i and wrapping. The first entry is the child
/// itself.
pub const SIBLING_INDICES: [[u8; 8]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7],
    [1, 2, 3, 4, 5, 6, 7, 0],
    [2, 3, 4, 5, 6, 7, 0, 1],
    [3, 4, 5, 6, 7, 0, 1, 2],
    [4, 5, 6, 7, 0, 1, 2, 3],
    [5, 6, 7, 0, 1, 2, 3, 4],
    [6, 7, 0, 1, 2, 3, 4, 5],
    [7, 0, 1, 2, 3, 4, 5, 6],
];

/// Type assumed by the face neighbor, by (type, face).
pub const FACE_NEIGHBOR_TYPE: [[u8; 4]; 6] = [
    [4, 5, 1, 2],
    [3, 2, 0, 5],
    [0, 1, 3, 4],
    [5, 4, 2, 1],
    [2, 3, 5, 0],
    [1, 0, 4, 3],
];

/// Anchor shift of the face neighbor in units of the cell extent, by
/// (type, face). Faces 1 and 2 stay within the cell's cube.
pub const FACE_NEIGHBOR_OFFSET: [[(i8, i8, i8); 4]; 6] = [
    [(1, 0, 0), (0, 0, 0), (0, 0, 0), (0, -1, 0)],
    [(1, 0, 0), (0, 0, 0), (0, 0, 0), (0, 0, -1)],
    [(0, 1, 0), (0, 0, 0), (0, 0, 0), (0, 0, -1)],
    [(0, 1, 0), (0, 0, 0), (0, 0, 0), (-1, 0, 0)],
    [(0, 0, 1), (0, 0, 0), (0, 0, 0), (-1, 0, 0)],
    [(0, 0, 1), (0, 0, 0), (0, 0, 0), (0, -1, 0)],
];

/// Face of the neighbor shared with the crossed face. Type-independent.
pub const FACE_NEIGHBOR_FACE: [u8; 4] = [3, 1, 2, 0];

/// Bey child index for a child with the given cube-id and type under a
/// parent of `parent_type`, or `None` when no such child exists.
pub fn child_index_of(parent_type: u8, cube_id: u8, child_type: u8) -> Option<u8> {
    let types = &PARENT_TYPE_TO_CHILD_TYPE[parent_type as usize];
    let cids = &CHILD_CUBE_ID[parent_type as usize];
    (0..8).find(|&i| cids[i] == cube_id && types[i] == child_type).map(|i| i as u8)
}

/// Edge axes (i, j) of a tetrahedron type.
#[inline]
pub fn type_axes(kind: u8) -> (usize, usize) {
    let i = (kind / 2) as usize;
    let j = if kind % 2 == 0 { (i + 2) % 3 } else { (i + 1) % 3 };
    (i, j)
}

/// Tetrahedron type with edge axes (i, j).
#[inline]
pub fn axes_type(i: usize, j: usize) -> u8 {
    debug_assert!(i != j && i < 3 && j < 3);
    if j == (i + 2) % 3 {
        (2 * i) as u8
    } else {
        (2 * i + 1) as u8
    }
}
