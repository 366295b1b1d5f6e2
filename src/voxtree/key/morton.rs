// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Morton keys for the cubic octree.
//!
//! The code word is the MSB-first zyx interleave of the quantised
//! coordinates, truncated to 3·level bits with the root-most octant most
//! significant. Parent drops the lowest octant; children append one.

use crate::voxtree::geometry::cell::CubeCell;
use crate::voxtree::geometry::{Aabb, Point3};
use crate::voxtree::key::tetree::covered_cubes;
use crate::voxtree::key::{cell_extent, grid_coords, SpatialKey, MAX_REFINEMENT_LEVEL};
use crate::voxtree::voxstream::{overflow, VoxResult};
use serde::{Deserialize, Serialize};

// Bit-dilation masks spreading 21 coordinate bits over every third
// position of a 64-bit word.
const DILATE_MASK_32: u64 = 0x001f_0000_0000_ffff;
const DILATE_MASK_16: u64 = 0x001f_0000_ff00_00ff;
const DILATE_MASK_8: u64 = 0x100f_00f0_0f00_f00f;
const DILATE_MASK_4: u64 = 0x10c3_0c30_c30c_30c3;
const DILATE_MASK_2: u64 = 0x1249_2492_4924_9249;

/// Spreads the low 21 bits of `v` to positions 0, 3, 6, …
#[inline]
fn split_by_3(v: u32) -> u64 {
    let mut x = u64::from(v) & 0x1f_ffff;
    x = (x | (x << 32)) & DILATE_MASK_32;
    x = (x | (x << 16)) & DILATE_MASK_16;
    x = (x | (x << 8)) & DILATE_MASK_8;
    x = (x | (x << 4)) & DILATE_MASK_4;
    x = (x | (x << 2)) & DILATE_MASK_2;
    x
}

/// Inverse of `split_by_3`.
#[inline]
fn compact_by_3(v: u64) -> u32 {
    let mut x = v & DILATE_MASK_2;
    x = (x ^ (x >> 2)) & DILATE_MASK_4;
    x = (x ^ (x >> 4)) & DILATE_MASK_8;
    x = (x ^ (x >> 8)) & DILATE_MASK_16;
    x = (x ^ (x >> 16)) & DILATE_MASK_32;
    x = (x ^ (x >> 32)) & 0x1f_ffff;
    x as u32
}

/// Morton octree key.
///
/// Field order matters: the derived ordering compares `level` first, then
/// the code unsigned, which is the depth-first curve order within a
/// level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MortonKey {
    level: u8,
    code: u64,
}

impl MortonKey {
    /// The root key at level 0.
    pub const ROOT: MortonKey = MortonKey { level: 0, code: 0 };

    /// Key of the cell anchored at the given grid coordinates.
    ///
    /// The anchor is quantised to the cell grid of `level` by dropping
    /// sub-cell bits.
    pub fn from_grid(x: u32, y: u32, z: u32, level: u8) -> VoxResult<Self> {
        if level > MAX_REFINEMENT_LEVEL {
            return Err(overflow(
                "morton::from_grid",
                MAX_REFINEMENT_LEVEL as u32,
                level as u32,
            ));
        }
        let full = split_by_3(x) | (split_by_3(y) << 1) | (split_by_3(z) << 2);
        Ok(Self {
            level,
            code: full >> (3 * (MAX_REFINEMENT_LEVEL - level) as u32),
        })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    /// Grid anchor of the cell.
    pub fn anchor(&self) -> (u32, u32, u32) {
        let full = self.code << (3 * (MAX_REFINEMENT_LEVEL - self.level) as u32);
        (
            compact_by_3(full),
            compact_by_3(full >> 1),
            compact_by_3(full >> 2),
        )
    }
}

impl SpatialKey for MortonKey {
    type Cell = CubeCell;

    fn root() -> Self {
        Self::ROOT
    }

    fn level(&self) -> u8 {
        self.level
    }

    /// Drop the lowest octant and decrement the level.
    fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            return None;
        }
        Some(Self {
            level: self.level - 1,
            code: self.code >> 3,
        })
    }

    fn child(&self, i: u8) -> Self {
        assert!(i < 8, "child index {} out of range", i);
        assert!(
            self.level < MAX_REFINEMENT_LEVEL,
            "no children below level {}",
            MAX_REFINEMENT_LEVEL
        );
        Self {
            level: self.level + 1,
            code: (self.code << 3) | u64::from(i),
        }
    }

    fn child_index(&self) -> Option<u8> {
        if self.level == 0 {
            None
        } else {
            Some((self.code & 0x7) as u8)
        }
    }

    fn from_point(p: &Point3, level: u8) -> VoxResult<Self> {
        p.validate()?;
        let (x, y, z) = grid_coords(p);
        Self::from_grid(x, y, z, level)
    }

    fn contains_point(&self, p: &Point3) -> bool {
        match Self::from_point(p, self.level) {
            Ok(key) => key == *self,
            Err(_) => false,
        }
    }

    fn cell(&self) -> CubeCell {
        let (x, y, z) = self.anchor();
        CubeCell::new(x, y, z, self.level)
    }

    fn cover_aabb(bounds: &Aabb, level: u8) -> VoxResult<Vec<Self>> {
        let mut keys = Vec::new();
        for (x, y, z) in covered_cubes(bounds, level)? {
            keys.push(Self::from_grid(x, y, z, level)?);
        }
        Ok(keys)
    }

    /// The six face-adjacent cubes inside the domain.
    fn neighbors(&self) -> Vec<Self> {
        let (x, y, z) = self.anchor();
        let h = cell_extent(self.level) as i64;
        let mut keys = Vec::with_capacity(6);
        for (dx, dy, dz) in [
            (h, 0, 0),
            (-h, 0, 0),
            (0, h, 0),
            (0, -h, 0),
            (0, 0, h),
            (0, 0, -h),
        ] {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            let nz = z as i64 + dz;
            let limit = i64::from(crate::voxtree::key::MAX_COORDINATE);
            if nx < 0 || ny < 0 || nz < 0 || nx >= limit || ny >= limit || nz >= limit {
                continue;
            }
            if let Ok(key) = Self::from_grid(nx as u32, ny as u32, nz as u32, self.level) {
                keys.push(key);
            }
        }
        keys
    }

    fn kind_name() -> &'static str {
        "octree"
    }
}

#[cfg(test)]
pub(crate) fn dilation_round_trip(v: u32) -> u32 {
    compact_by_3(split_by_3(v))
}
