// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Tetrahedral coordinate algebra.
//!
//! A `Tet` names one of the six Kuhn tetrahedra of a grid cube: anchor
//! coordinates (multiples of the cell extent), refinement level and type.
//! All structural operations are O(1) via the connectivity tables; only
//! TM-index materialisation walks the parent chain.

use crate::voxtree::geometry::cell::CellGeometry;
use crate::voxtree::geometry::{Aabb, Point3};
use crate::voxtree::key::connectivity::{
    child_index_of, type_axes, CHILD_CUBE_ID, CUBE_ID_TYPE_TO_PARENT_TYPE,
    FACE_NEIGHBOR_FACE, FACE_NEIGHBOR_OFFSET, FACE_NEIGHBOR_TYPE, PARENT_TYPE_TO_CHILD_TYPE,
};
use crate::voxtree::key::{cell_extent, cube_id_at, MAX_COORDINATE, MAX_REFINEMENT_LEVEL};
use crate::voxtree::voxstream::{overflow, VoxResult};
use serde::{Deserialize, Serialize};

/// One tetrahedral cell: anchor, level and type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tet {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub level: u8,
    pub kind: u8,
}

impl Tet {
    /// The level-0 root tetrahedron of type 0.
    pub const fn root() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            level: 0,
            kind: 0,
        }
    }

    pub fn new(x: u32, y: u32, z: u32, level: u8, kind: u8) -> Self {
        debug_assert!(level <= MAX_REFINEMENT_LEVEL);
        debug_assert!(kind < 6);
        Self { x, y, z, level, kind }
    }

    /// Edge length of the containing cube, in grid units.
    pub fn extent(&self) -> u32 {
        cell_extent(self.level)
    }

    /// Octant of this cell within its parent's cube.
    pub fn cube_id(&self) -> u8 {
        cube_id_at(self.x, self.y, self.z, self.level)
    }

    /// Parent tetrahedron; `None` at the root.
    ///
    /// The anchor clears the bit at position `MAX_REFINEMENT_LEVEL - level`
    /// in each coordinate; the type follows the cube-id transition table.
    pub fn parent(&self) -> Option<Tet> {
        if self.level == 0 {
            return None;
        }
        let h = self.extent();
        let kind = CUBE_ID_TYPE_TO_PARENT_TYPE[self.cube_id() as usize][self.kind as usize];
        Some(Tet::new(
            self.x & !h,
            self.y & !h,
            self.z & !h,
            self.level - 1,
            kind,
        ))
    }

    /// The i-th Bey child.
    ///
    /// Panics for i >= 8 or when already at the deepest level; callers
    /// guard both.
    pub fn child(&self, i: u8) -> Tet {
        assert!(i < 8, "child index {} out of range", i);
        assert!(
            self.level < MAX_REFINEMENT_LEVEL,
            "no children below level {}",
            MAX_REFINEMENT_LEVEL
        );
        let h = cell_extent(self.level + 1);
        let cid = CHILD_CUBE_ID[self.kind as usize][i as usize];
        let kind = PARENT_TYPE_TO_CHILD_TYPE[self.kind as usize][i as usize];
        Tet::new(
            self.x + u32::from(cid & 1) * h,
            self.y + u32::from((cid >> 1) & 1) * h,
            self.z + u32::from((cid >> 2) & 1) * h,
            self.level + 1,
            kind,
        )
    }

    /// All eight Bey children.
    pub fn children(&self) -> [Tet; 8] {
        std::array::from_fn(|i| self.child(i as u8))
    }

    /// Bey index of this cell among its parent's children; `None` at the
    /// root.
    pub fn child_index(&self) -> Option<u8> {
        let parent = self.parent()?;
        child_index_of(parent.kind, self.cube_id(), self.kind)
    }

    /// Face neighbor of the same level, with the shared face as seen from
    /// the neighbor. `None` when the shifted anchor leaves the domain.
    pub fn face_neighbor(&self, face: u8) -> Option<(Tet, u8)> {
        assert!(face < 4, "face index {} out of range", face);
        let h = self.extent() as i64;
        let (dx, dy, dz) = FACE_NEIGHBOR_OFFSET[self.kind as usize][face as usize];
        let nx = self.x as i64 + dx as i64 * h;
        let ny = self.y as i64 + dy as i64 * h;
        let nz = self.z as i64 + dz as i64 * h;
        let limit = MAX_COORDINATE as i64;
        if nx < 0 || ny < 0 || nz < 0 || nx >= limit || ny >= limit || nz >= limit {
            return None;
        }
        let kind = FACE_NEIGHBOR_TYPE[self.kind as usize][face as usize];
        Some((
            Tet::new(nx as u32, ny as u32, nz as u32, self.level, kind),
            FACE_NEIGHBOR_FACE[face as usize],
        ))
    }

    /// The four vertices in canonical order: anchor, anchor + h·e_i,
    /// anchor + h·(e_i + e_j), anchor + (h, h, h).
    pub fn vertices(&self) -> [Point3; 4] {
        let h = self.extent() as f32;
        let (i, j) = type_axes(self.kind);
        let anchor = [self.x as f32, self.y as f32, self.z as f32];
        let mut v1 = anchor;
        v1[i] += h;
        let mut v2 = v1;
        v2[j] += h;
        [
            Point3::new(anchor[0], anchor[1], anchor[2]),
            Point3::new(v1[0], v1[1], v1[2]),
            Point3::new(v2[0], v2[1], v2[2]),
            Point3::new(anchor[0] + h, anchor[1] + h, anchor[2] + h),
        ]
    }

    /// Mean of the four vertices.
    pub fn centroid(&self) -> Point3 {
        let v = self.vertices();
        Point3::new(
            (v[0].x + v[1].x + v[2].x + v[3].x) * 0.25,
            (v[0].y + v[1].y + v[2].y + v[3].y) * 0.25,
            (v[0].z + v[1].z + v[2].z + v[3].z) * 0.25,
        )
    }

    /// Closed containment: the Kuhn simplex of type (i, j, k) is
    /// { p : 0 <= p_k <= p_j <= p_i <= h } in local coordinates.
    pub fn contains_point(&self, p: &Point3) -> bool {
        let h = self.extent() as f32;
        let (i, j) = type_axes(self.kind);
        let k = 3 - i - j;
        let local = [
            p.x - self.x as f32,
            p.y - self.y as f32,
            p.z - self.z as f32,
        ];
        local[k] >= 0.0 && local[j] >= local[k] && local[i] >= local[j] && local[i] <= h
    }

    /// Bounding box: every Kuhn tet spans the full diagonal of its cube.
    pub fn aabb(&self) -> Aabb {
        let h = self.extent() as f32;
        let min = Point3::new(self.x as f32, self.y as f32, self.z as f32);
        Aabb::new(min, Point3::new(min.x + h, min.y + h, min.z + h))
    }

    /// Locates the tetrahedron containing `p` at `level`.
    ///
    /// ## Behaviour
    /// - Quantises to the containing grid cube, then picks the first type
    ///   whose closed simplex holds the fractional coordinates; points on
    ///   shared faces resolve to the lowest type deterministically.
    ///
    /// ## Error Conditions
    /// - `InvalidInput` for points outside the domain
    /// - `Overflow` for level > MAX_REFINEMENT_LEVEL
    pub fn locate(p: &Point3, level: u8) -> VoxResult<Tet> {
        if level > MAX_REFINEMENT_LEVEL {
            return Err(overflow(
                "tet::locate",
                MAX_REFINEMENT_LEVEL as u32,
                level as u32,
            ));
        }
        p.validate()?;
        let h = cell_extent(level);
        let mask = !(h - 1);
        let (gx, gy, gz) = crate::voxtree::key::grid_coords(p);
        let (ax, ay, az) = (gx & mask, gy & mask, gz & mask);
        let candidate = |kind: u8| Tet::new(ax, ay, az, level, kind);
        for kind in 0..6u8 {
            if candidate(kind).contains_point(p) {
                return Ok(candidate(kind));
            }
        }
        // Floating error on a cube boundary; the anchor cube still owns
        // the point, so fall back to type 0.
        Ok(candidate(0))
    }

    /// True when the eight tets form one complete Bey family: same level,
    /// same parent, and child indices covering 0..8.
    pub fn is_family(tets: &[Tet; 8]) -> bool {
        let level = tets[0].level;
        if level == 0 || tets.iter().any(|t| t.level != level) {
            return false;
        }
        let parent = match tets[0].parent() {
            Some(p) => p,
            None => return false,
        };
        let mut seen = [false; 8];
        for t in tets {
            if t.parent() != Some(parent) {
                return false;
            }
            match t.child_index() {
                Some(i) if !seen[i as usize] => seen[i as usize] = true,
                _ => return false,
            }
        }
        seen.iter().all(|&s| s)
    }
}

impl CellGeometry for Tet {
    fn aabb(&self) -> Aabb {
        Tet::aabb(self)
    }

    fn centroid(&self) -> Point3 {
        Tet::centroid(self)
    }

    fn contains_point(&self, p: &Point3) -> bool {
        Tet::contains_point(self, p)
    }

    fn child(&self, i: u8) -> Self {
        Tet::child(self, i)
    }
}
