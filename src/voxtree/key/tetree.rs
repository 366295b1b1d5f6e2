// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Tetrahedral-Morton keys.
//!
//! A `TetreeKey` stores the packed TM-index plus an explicit level.
//! Levels up to 10 fit the low word alone (the compact form); deeper
//! levels use the full 128 bits, with the root-most group of a level-21
//! key landing at the top of the high word. `LazyTetKey` defers the
//! O(level) packing walk until the key enters an ordered container.

use crate::voxtree::geometry::{Aabb, Point3};
use crate::voxtree::key::connectivity::{
    child_index_of, CHILD_CUBE_ID, PARENT_TYPE_TO_CHILD_TYPE,
};
use crate::voxtree::key::tet::Tet;
use crate::voxtree::key::tm_cache::TM_CACHE;
use crate::voxtree::key::tm_index::{self, BITS_PER_LEVEL, MAX_COMPACT_LEVEL};
use crate::voxtree::key::{cell_extent, SpatialKey, MAX_COORDINATE, MAX_REFINEMENT_LEVEL};
use crate::voxtree::voxstream::VoxResult;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Packed tetrahedral-Morton key.
///
/// Field order matters: the derived ordering compares `level` first, then
/// the key bits unsigned — the anchor (0, 0, 0) exists at every level, so
/// the level disambiguates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TetreeKey {
    level: u8,
    bits: u128,
}

impl TetreeKey {
    /// The root key at level 0.
    pub const ROOT: TetreeKey = TetreeKey { level: 0, bits: 0 };

    /// Packs a tetrahedron, consulting the process-wide TM cache.
    pub fn from_tet(tet: &Tet) -> Self {
        Self {
            level: tet.level,
            bits: TM_CACHE.bits_for(tet),
        }
    }

    /// Builds a key from raw bits, validating the packed chain.
    ///
    /// ## Error Conditions
    /// - non-zero bits beyond 6·level
    /// - type nibbles >= 6 or inconsistent parent transitions
    pub fn from_bits(bits: u128, level: u8) -> VoxResult<Self> {
        tm_index::decode(bits, level)?;
        Ok(Self { level, bits })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn bits(&self) -> u128 {
        self.bits
    }

    /// True for levels representable in the low word alone.
    pub fn is_compact(&self) -> bool {
        self.level <= MAX_COMPACT_LEVEL
    }

    pub fn low_bits(&self) -> u64 {
        self.bits as u64
    }

    pub fn high_bits(&self) -> u64 {
        (self.bits >> 64) as u64
    }

    /// Type of the cell this key names.
    pub fn kind(&self) -> u8 {
        if self.level == 0 {
            0
        } else {
            (self.bits & 0x7) as u8
        }
    }

    /// Octant group of the leaf level.
    fn leaf_cube_id(&self) -> u8 {
        ((self.bits >> 3) & 0x7) as u8
    }

    fn parent_kind(&self) -> u8 {
        if self.level <= 1 {
            0
        } else {
            ((self.bits >> BITS_PER_LEVEL) & 0x7) as u8
        }
    }

    /// Unpacks the full tetrahedron (O(level)).
    pub fn tet(&self) -> Tet {
        tm_index::decode_valid(self.bits, self.level)
    }
}

impl SpatialKey for TetreeKey {
    type Cell = Tet;

    fn root() -> Self {
        Self::ROOT
    }

    fn level(&self) -> u8 {
        self.level
    }

    /// O(1): drop the leaf group.
    fn parent(&self) -> Option<Self> {
        if self.level == 0 {
            return None;
        }
        Some(Self {
            level: self.level - 1,
            bits: self.bits >> BITS_PER_LEVEL,
        })
    }

    /// O(1): append the Bey child's (cube-id, type) group.
    fn child(&self, i: u8) -> Self {
        assert!(i < 8, "child index {} out of range", i);
        assert!(
            self.level < MAX_REFINEMENT_LEVEL,
            "no children below level {}",
            MAX_REFINEMENT_LEVEL
        );
        let kind = self.kind() as usize;
        let cid = CHILD_CUBE_ID[kind][i as usize];
        let child_kind = PARENT_TYPE_TO_CHILD_TYPE[kind][i as usize];
        let group = (u128::from(cid) << 3) | u128::from(child_kind);
        Self {
            level: self.level + 1,
            bits: (self.bits << BITS_PER_LEVEL) | group,
        }
    }

    fn child_index(&self) -> Option<u8> {
        if self.level == 0 {
            return None;
        }
        child_index_of(self.parent_kind(), self.leaf_cube_id(), self.kind())
    }

    /// Bey child 3 is the only child in the far octant, so it carries the
    /// largest (cube-id, type) group.
    fn last_child(&self) -> Self {
        self.child(3)
    }

    /// The up-to-four face neighbors inside the domain (O(level) for the
    /// unpack, O(1) per face).
    fn neighbors(&self) -> Vec<Self> {
        let tet = self.tet();
        (0..4u8)
            .filter_map(|face| tet.face_neighbor(face))
            .map(|(neighbor, _)| Self::from_tet(&neighbor))
            .collect()
    }

    fn from_point(p: &Point3, level: u8) -> VoxResult<Self> {
        Ok(Self::from_tet(&Tet::locate(p, level)?))
    }

    fn contains_point(&self, p: &Point3) -> bool {
        self.tet().contains_point(p)
    }

    fn cell(&self) -> Tet {
        self.tet()
    }

    /// Conservative cover: every tetrahedron of every grid cube the box
    /// overlaps (a Kuhn tet's bounding box is its full cube).
    fn cover_aabb(bounds: &Aabb, level: u8) -> VoxResult<Vec<Self>> {
        let mut keys = Vec::new();
        for (x, y, z) in covered_cubes(bounds, level)? {
            for kind in 0..6u8 {
                keys.push(Self::from_tet(&Tet::new(x, y, z, level, kind)));
            }
        }
        Ok(keys)
    }

    fn kind_name() -> &'static str {
        "tetree"
    }
}

/// Grid anchors of all cubes at `level` overlapping `bounds` (closed).
pub(crate) fn covered_cubes(
    bounds: &Aabb,
    level: u8,
) -> VoxResult<Vec<(u32, u32, u32)>> {
    bounds.validate()?;
    let h = cell_extent(level);
    let clamp = |v: f32| -> u32 { (v.min((MAX_COORDINATE - 1) as f32)) as u32 };
    let (x0, y0, z0) = (
        clamp(bounds.min.x) / h * h,
        clamp(bounds.min.y) / h * h,
        clamp(bounds.min.z) / h * h,
    );
    let (x1, y1, z1) = (
        clamp(bounds.max.x) / h * h,
        clamp(bounds.max.y) / h * h,
        clamp(bounds.max.z) / h * h,
    );
    let mut anchors = Vec::new();
    let mut z = z0;
    while z <= z1 {
        let mut y = y0;
        while y <= y1 {
            let mut x = x0;
            while x <= x1 {
                anchors.push((x, y, z));
                x += h;
            }
            y += h;
        }
        z += h;
    }
    Ok(anchors)
}

/// Tet-resident key: coordinates and type now, packed bits on demand.
///
/// Materialisation happens at most once per key and only when the key
/// enters an ordered container or is compared against a packed key.
/// Hashing covers (level, anchor, type) and never materialises, so
/// `LazyTetKey` and `TetreeKey` hash differently by design.
#[derive(Debug, Clone)]
pub struct LazyTetKey {
    tet: Tet,
    packed: OnceCell<TetreeKey>,
}

impl LazyTetKey {
    pub fn new(tet: Tet) -> Self {
        Self {
            tet,
            packed: OnceCell::new(),
        }
    }

    pub fn from_point(p: &Point3, level: u8) -> VoxResult<Self> {
        Ok(Self::new(Tet::locate(p, level)?))
    }

    pub fn tet(&self) -> &Tet {
        &self.tet
    }

    pub fn level(&self) -> u8 {
        self.tet.level
    }

    pub fn is_materialised(&self) -> bool {
        self.packed.get().is_some()
    }

    /// Packs (and caches) the TM-index.
    pub fn materialise(&self) -> TetreeKey {
        *self.packed.get_or_init(|| TetreeKey::from_tet(&self.tet))
    }
}

impl PartialEq for LazyTetKey {
    /// Anchor/type equality; equivalent to packed equality at equal
    /// levels without forcing materialisation.
    fn eq(&self, other: &Self) -> bool {
        self.tet == other.tet
    }
}

impl Eq for LazyTetKey {}

impl PartialEq<TetreeKey> for LazyTetKey {
    /// Comparison against a packed key materialises on demand.
    fn eq(&self, other: &TetreeKey) -> bool {
        self.materialise() == *other
    }
}

impl PartialEq<LazyTetKey> for TetreeKey {
    fn eq(&self, other: &LazyTetKey) -> bool {
        other == self
    }
}

impl Hash for LazyTetKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tet.level.hash(state);
        self.tet.x.hash(state);
        self.tet.y.hash(state);
        self.tet.z.hash(state);
        self.tet.kind.hash(state);
    }
}
