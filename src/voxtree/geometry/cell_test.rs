// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::voxtree::geometry::cell::{CellGeometry, CubeCell};
    use crate::voxtree::geometry::point::Point3;
    use crate::voxtree::key::MAX_REFINEMENT_LEVEL;

    #[test]
    fn test_root_cell_spans_domain() {
        let root = CubeCell::new(0, 0, 0, 0);
        let aabb = root.aabb();
        assert_eq!(aabb.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(aabb.max.x, 2097152.0);
    }

    #[test]
    fn test_child_offsets_follow_zyx_bits() {
        let root = CubeCell::new(0, 0, 0, 0);
        let half = root.extent() / 2;
        let c5 = root.child(5); // bits 101: z and x
        assert_eq!((c5.x, c5.y, c5.z), (half, 0, half));
        assert_eq!(c5.level, 1);
        let c2 = root.child(2); // bits 010: y
        assert_eq!((c2.x, c2.y, c2.z), (0, half, 0));
    }

    #[test]
    fn test_children_tile_parent() {
        let cell = CubeCell::new(0, 0, 0, 3);
        let parent_aabb = cell.aabb();
        for i in 0..8 {
            let child = cell.child(i);
            assert!(parent_aabb.contains_aabb(&child.aabb()));
        }
    }

    #[test]
    fn test_deepest_cell_extent_is_one() {
        let cell = CubeCell::new(0, 0, 0, MAX_REFINEMENT_LEVEL);
        assert_eq!(cell.extent(), 1);
    }

    #[test]
    fn test_distance_lower_bound() {
        let cell = CubeCell::new(0, 0, 0, MAX_REFINEMENT_LEVEL - 1);
        let p = Point3::new(10.0, 0.0, 0.0);
        assert_eq!(cell.distance_sq_to_point(&p), 64.0);
    }
}
