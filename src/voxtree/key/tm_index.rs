// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! TM-index engine: packing a tetrahedron's ancestor chain into 6-bit
//! groups.
//!
//! Each level contributes one `(cube_id << 3) | type` group. The leaf
//! group sits at bit 0 and the root-most group is most significant, so
//! `parent` is a plain shift right by 6 and unsigned comparison of
//! same-level keys follows the depth-first curve order. Encoding and
//! decoding walk the parent chain once — O(level) by construction; the
//! cost is paid at insert, not at query.

use crate::voxtree::key::connectivity::CUBE_ID_TYPE_TO_PARENT_TYPE;
use crate::voxtree::key::tet::Tet;
use crate::voxtree::key::{cube_id_at, MAX_REFINEMENT_LEVEL};
use crate::voxtree::voxstream::{invalid_input, overflow, VoxResult};

/// Bits per ancestor-chain group.
pub const BITS_PER_LEVEL: u32 = 6;

/// Deepest level representable in a single low word (10 groups = 60 bits).
pub const MAX_COMPACT_LEVEL: u8 = 10;

/// Packs the ancestor chain of `tet` into TM-index bits.
///
/// ## Performance
/// - O(level): one table lookup and one shift per ancestor
pub fn encode(tet: &Tet) -> u128 {
    let mut bits = 0u128;
    let mut kind = tet.kind;
    let mut shift = 0u32;
    for level in (1..=tet.level).rev() {
        let cid = cube_id_at(tet.x, tet.y, tet.z, level);
        let group = (u128::from(cid) << 3) | u128::from(kind);
        bits |= group << shift;
        shift += BITS_PER_LEVEL;
        kind = CUBE_ID_TYPE_TO_PARENT_TYPE[cid as usize][kind as usize];
    }
    bits
}

/// Reverses `encode`, validating the chain.
///
/// ## Error Conditions
/// - level beyond `MAX_REFINEMENT_LEVEL` → `Overflow`
/// - non-zero bits beyond 6·level, a type nibble >= 6, or a group whose
///   parent-type transition contradicts the group above it →
///   `InvalidInput`
pub fn decode(bits: u128, level: u8) -> VoxResult<Tet> {
    if level > MAX_REFINEMENT_LEVEL {
        return Err(overflow(
            "tm_index::decode",
            MAX_REFINEMENT_LEVEL as u32,
            level as u32,
        ));
    }
    if bits >> (BITS_PER_LEVEL * level as u32) != 0 {
        return Err(invalid_input(
            "bits",
            format!("{:#x}", bits),
            format!("non-zero bits beyond level {}", level),
        ));
    }

    let (mut x, mut y, mut z) = (0u32, 0u32, 0u32);
    let mut parent_kind = 0u8;
    let mut kind = 0u8;
    for walk in 1..=level {
        let shift = BITS_PER_LEVEL * (level - walk) as u32;
        let group = ((bits >> shift) & 0x3f) as u8;
        let cid = group >> 3;
        kind = group & 0x7;
        if kind >= 6 {
            return Err(invalid_input(
                "bits",
                format!("{:#x}", bits),
                format!("type {} out of range at level {}", kind, walk),
            ));
        }
        if CUBE_ID_TYPE_TO_PARENT_TYPE[cid as usize][kind as usize] != parent_kind {
            return Err(invalid_input(
                "bits",
                format!("{:#x}", bits),
                format!("inconsistent parent-type transition at level {}", walk),
            ));
        }
        let bit = MAX_REFINEMENT_LEVEL - walk;
        x |= u32::from(cid & 1) << bit;
        y |= u32::from((cid >> 1) & 1) << bit;
        z |= u32::from((cid >> 2) & 1) << bit;
        parent_kind = kind;
    }
    Ok(Tet::new(x, y, z, level, kind))
}

/// Decode for bits already validated at construction time. Skips the
/// chain checks; debug builds still assert them.
pub(crate) fn decode_valid(bits: u128, level: u8) -> Tet {
    debug_assert!(level <= MAX_REFINEMENT_LEVEL);
    debug_assert!(bits >> (BITS_PER_LEVEL * level as u32) == 0);
    let (mut x, mut y, mut z) = (0u32, 0u32, 0u32);
    let mut kind = 0u8;
    for walk in 1..=level {
        let shift = BITS_PER_LEVEL * (level - walk) as u32;
        let group = ((bits >> shift) & 0x3f) as u8;
        let cid = group >> 3;
        kind = group & 0x7;
        debug_assert!(kind < 6);
        let bit = MAX_REFINEMENT_LEVEL - walk;
        x |= u32::from(cid & 1) << bit;
        y |= u32::from((cid >> 1) & 1) << bit;
        z |= u32::from((cid >> 2) & 1) << bit;
    }
    Tet::new(x, y, z, level, kind)
}

/// Smallest level whose key could carry these bits: highest-set-bit
/// position divided by the group width. Accelerates level plausibility
/// checks; zero bits give zero (the level is stored separately precisely
/// because all-zero chains exist at every level).
pub fn min_level_for_bits(bits: u128) -> u8 {
    if bits == 0 {
        0
    } else {
        let highest = 127 - bits.leading_zeros();
        (highest / BITS_PER_LEVEL + 1) as u8
    }
}
