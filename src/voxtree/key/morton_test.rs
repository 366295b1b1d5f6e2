// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::voxtree::geometry::cell::CellGeometry;
    use crate::voxtree::geometry::{Aabb, Point3};
    use crate::voxtree::key::morton::{dilation_round_trip, MortonKey};
    use crate::voxtree::key::{SpatialKey, MAX_REFINEMENT_LEVEL};

    #[test]
    fn test_dilation_round_trip() {
        for v in [0u32, 1, 2, 7, 0x155_555, 0x0f0_f0f, 0x1f_ffff, 1 << 20] {
            assert_eq!(dilation_round_trip(v), v);
        }
    }

    #[test]
    fn test_root_children_order_matches_index() {
        let root = MortonKey::ROOT;
        for i in 0..8u8 {
            for j in 0..8u8 {
                let ci = root.child(i);
                let cj = root.child(j);
                assert_eq!(ci.cmp(&cj), i.cmp(&j));
            }
        }
    }

    #[test]
    fn test_parent_child_round_trip() {
        let key = MortonKey::from_point(&Point3::new(1234.0, 5678.0, 91011.0), 12).unwrap();
        for i in 0..8u8 {
            let child = key.child(i);
            assert_eq!(child.parent(), Some(key));
            assert_eq!(child.child_index(), Some(i));
        }
        assert!(MortonKey::ROOT.parent().is_none());
    }

    #[test]
    fn test_level_first_ordering() {
        // The anchor cell exists at every level; deeper keys sort later.
        let keys: Vec<MortonKey> = (0..=MAX_REFINEMENT_LEVEL)
            .map(|level| MortonKey::from_point(&Point3::new(0.0, 0.0, 0.0), level).unwrap())
            .collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_parent_sorts_before_key() {
        let mut key = MortonKey::from_point(&Point3::new(99999.0, 12345.0, 67890.0), 21).unwrap();
        while let Some(parent) = key.parent() {
            assert!(parent < key);
            key = parent;
        }
    }

    #[test]
    fn test_from_point_anchor_quantisation() {
        let key = MortonKey::from_point(&Point3::new(100.0, 200.0, 300.0), 21).unwrap();
        assert_eq!(key.anchor(), (100, 200, 300));

        // Level 10 cells span 2048 units; the anchor drops sub-cell bits.
        let key = MortonKey::from_point(&Point3::new(5000.0, 100.0, 3000.0), 10).unwrap();
        assert_eq!(key.anchor(), (4096, 0, 2048));
    }

    #[test]
    fn test_contains_point() {
        let key = MortonKey::from_point(&Point3::new(5000.0, 100.0, 3000.0), 10).unwrap();
        assert!(key.contains_point(&Point3::new(5000.0, 100.0, 3000.0)));
        assert!(key.contains_point(&Point3::new(4096.0, 0.0, 2048.0)));
        assert!(!key.contains_point(&Point3::new(100.0, 100.0, 100.0)));
        assert!(!key.contains_point(&Point3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_cell_matches_anchor_and_extent() {
        let key = MortonKey::from_point(&Point3::new(5000.0, 100.0, 3000.0), 10).unwrap();
        let cell = key.cell();
        assert_eq!((cell.x, cell.y, cell.z), (4096, 0, 2048));
        assert_eq!(cell.extent(), 2048);
        // Key children and cell children stay in lockstep.
        for i in 0..8u8 {
            let child_cell = key.child(i).cell();
            let lockstep = cell.child(i);
            assert_eq!(
                (child_cell.x, child_cell.y, child_cell.z, child_cell.level),
                (lockstep.x, lockstep.y, lockstep.z, lockstep.level)
            );
        }
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(MortonKey::from_point(&Point3::new(-1.0, 0.0, 0.0), 5).is_err());
        assert!(MortonKey::from_point(&Point3::new(0.0, 0.0, 0.0), 22).is_err());
        assert!(MortonKey::from_point(&Point3::new(f32::NAN, 0.0, 0.0), 5).is_err());
    }

    #[test]
    fn test_cover_aabb() {
        // A box spanning two level-10 cells along x.
        let bounds = Aabb::new(
            Point3::new(2000.0, 100.0, 100.0),
            Point3::new(2100.0, 200.0, 200.0),
        );
        let keys = MortonKey::cover_aabb(&bounds, 10).unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.level() == 10));

        // Contained in a single cell.
        let bounds = Aabb::new(
            Point3::new(100.0, 100.0, 100.0),
            Point3::new(110.0, 110.0, 110.0),
        );
        assert_eq!(MortonKey::cover_aabb(&bounds, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_shuffled_sort_restores_hierarchy() {
        use rand::seq::SliceRandom;

        let mut keys = Vec::new();
        let mut key = MortonKey::from_point(&Point3::new(7777.0, 333.0, 151515.0), 21).unwrap();
        keys.push(key);
        while let Some(parent) = key.parent() {
            keys.push(parent);
            key = parent;
        }
        keys.shuffle(&mut rand::thread_rng());
        keys.sort();
        for pair in keys.windows(2) {
            assert_eq!(pair[1].parent(), Some(pair[0]));
        }
    }
}
