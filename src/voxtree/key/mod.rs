// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Space-filling-curve keys.
//!
//! Two realisations of the key capability:
//! - morton: cubic octree cells on the Morton curve
//! - tetree: tetrahedral cells on the tetrahedral-Morton curve over the
//!   Bey refinement (connectivity, tet, tm_index, tetree, tm_cache)
//!
//! Keys order level-first, then by key bits unsigned. The level must be
//! compared first: the (0, 0, 0) anchor exists at every level, so bit
//! patterns alone cannot disambiguate levels.

pub mod connectivity;
pub mod morton;
pub mod tet;
pub mod tetree;
pub mod tm_cache;
pub mod tm_index;

pub use morton::MortonKey;
pub use tet::Tet;
pub use tetree::{LazyTetKey, TetreeKey};

#[cfg(test)]
mod morton_test;
#[cfg(test)]
mod tet_test;

use crate::voxtree::geometry::cell::CellGeometry;
use crate::voxtree::geometry::{Aabb, Point3};
use crate::voxtree::voxstream::VoxResult;
use std::fmt::Debug;
use std::hash::Hash;

/// Deepest refinement level. 21 levels of 3 coordinate bits each.
pub const MAX_REFINEMENT_LEVEL: u8 = 21;

/// Exclusive upper bound of the integer coordinate grid.
pub const MAX_COORDINATE: u32 = 1 << MAX_REFINEMENT_LEVEL;

/// Children per cell; octants for cubes, Bey children for tetrahedra.
pub const FANOUT: u8 = 8;

/// Edge length of a cell at `level`, in grid units.
#[inline]
pub const fn cell_extent(level: u8) -> u32 {
    1 << (MAX_REFINEMENT_LEVEL - level)
}

/// Quantises a domain point onto the integer grid.
#[inline]
pub fn grid_coords(p: &Point3) -> (u32, u32, u32) {
    (p.x as u32, p.y as u32, p.z as u32)
}

/// Cube-id of grid coordinates at `level`: the zyx bit-triple taken from
/// bit position `MAX_REFINEMENT_LEVEL - level` of each coordinate,
/// MSB-first (z highest).
#[inline]
pub fn cube_id_at(x: u32, y: u32, z: u32, level: u8) -> u8 {
    debug_assert!(level >= 1 && level <= MAX_REFINEMENT_LEVEL);
    let bit = MAX_REFINEMENT_LEVEL - level;
    (((z >> bit) & 1) << 2 | ((y >> bit) & 1) << 1 | ((x >> bit) & 1)) as u8
}

/// Total-ordered, hierarchical cell identity with O(1) parent/child.
///
/// ## Ordering Contract
/// - `parent(k) < k` for every non-root key
/// - level-first comparison; within a level the bit order is the
///   depth-first SFC order
/// - keys sort so that every key's immediate-parent chain is strictly
///   decreasing
pub trait SpatialKey:
    Copy + Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static
{
    /// Geometric cell realisation walked in lockstep with the key.
    type Cell: CellGeometry;

    /// The constant root key at level 0.
    fn root() -> Self;

    fn level(&self) -> u8;

    /// Returns `None` only at the root.
    fn parent(&self) -> Option<Self>;

    /// The i-th child key. Panics for i >= 8 (programmer error) and for
    /// children below the deepest level.
    fn child(&self, i: u8) -> Self;

    /// Index of this key among its parent's children; `None` at the root.
    fn child_index(&self) -> Option<u8>;

    /// Child with the smallest key value; the low endpoint of the
    /// one-level descendant range.
    fn first_child(&self) -> Self {
        self.child(0)
    }

    /// Child with the largest key value; the high endpoint of the
    /// one-level descendant range.
    fn last_child(&self) -> Self {
        self.child(7)
    }

    /// Face-adjacent keys of the same level, absent at domain borders.
    fn neighbors(&self) -> Vec<Self>;

    /// Locates the cell containing `p` at `level`.
    ///
    /// ## Error Conditions
    /// - `InvalidInput` for out-of-domain points
    /// - `Overflow` for level > MAX_REFINEMENT_LEVEL
    fn from_point(p: &Point3, level: u8) -> VoxResult<Self>;

    /// Geometric containment test of the underlying cell.
    fn contains_point(&self, p: &Point3) -> bool;

    /// Materialises the cell geometry (O(level) for tetrahedral keys).
    fn cell(&self) -> Self::Cell;

    /// Every key at `level` whose cell intersects `bounds`. Conservative
    /// for tetrahedral cells (a Kuhn tet's box is its containing cube).
    fn cover_aabb(bounds: &Aabb, level: u8) -> VoxResult<Vec<Self>>;

    /// Short structure name for envelopes and logging.
    fn kind_name() -> &'static str;
}
