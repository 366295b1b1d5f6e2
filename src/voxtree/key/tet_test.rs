// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::voxtree::geometry::Point3;
    use crate::voxtree::key::connectivity::FACE_CORNERS;
    use crate::voxtree::key::tet::Tet;
    use crate::voxtree::key::{cell_extent, MAX_REFINEMENT_LEVEL};

    fn sample_parents() -> Vec<Tet> {
        let h = cell_extent(5);
        (0..6u8)
            .map(|kind| Tet::new(3 * h, h, 6 * h, 5, kind))
            .collect()
    }

    #[test]
    fn test_root_has_no_parent() {
        assert!(Tet::root().parent().is_none());
        assert!(Tet::root().child_index().is_none());
    }

    #[test]
    fn test_child_parent_round_trip() {
        for parent in sample_parents() {
            for i in 0..8u8 {
                let child = parent.child(i);
                assert_eq!(child.level, parent.level + 1);
                assert_eq!(child.parent(), Some(parent), "child {} of {:?}", i, parent);
                assert_eq!(child.child_index(), Some(i));
            }
        }
    }

    #[test]
    fn test_children_stay_inside_parent() {
        for parent in sample_parents() {
            for child in parent.children() {
                assert!(
                    parent.contains_point(&child.centroid()),
                    "centroid of {:?} escaped {:?}",
                    child,
                    parent
                );
            }
        }
    }

    #[test]
    fn test_is_family() {
        for parent in sample_parents() {
            let children = parent.children();
            assert!(Tet::is_family(&children));

            let mut broken = children;
            broken[3] = broken[2];
            assert!(!Tet::is_family(&broken));

            let mut wrong_level = children;
            wrong_level[0] = parent;
            assert!(!Tet::is_family(&wrong_level));
        }
    }

    #[test]
    fn test_locate_returns_containing_tet() {
        let points = [
            Point3::new(100.0, 10.0, 50.0),
            Point3::new(10.0, 100.0, 50.0),
            Point3::new(50.0, 10.0, 100.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(123.4, 567.8, 91.2),
            Point3::new(2_000_000.0, 1.0, 1_999_999.0),
        ];
        for level in [1u8, 5, 10, 21] {
            for p in &points {
                let tet = Tet::locate(p, level).unwrap();
                assert_eq!(tet.level, level);
                assert!(tet.contains_point(p), "{:?} misses {:?}", tet, p);
            }
        }
    }

    #[test]
    fn test_locate_rejects_invalid() {
        assert!(Tet::locate(&Point3::new(-1.0, 0.0, 0.0), 5).is_err());
        assert!(Tet::locate(&Point3::new(0.0, 0.0, 0.0), 22).is_err());
    }

    #[test]
    fn test_face_neighbor_reciprocity() {
        // An interior cell: neighbors exist on every face.
        let h = cell_extent(6);
        for kind in 0..6u8 {
            let tet = Tet::new(8 * h, 9 * h, 10 * h, 6, kind);
            for face in 0..4u8 {
                let (neighbor, dual) = tet.face_neighbor(face).unwrap();
                assert_eq!(neighbor.level, tet.level);
                let (back, back_face) = neighbor.face_neighbor(dual).unwrap();
                assert_eq!(back, tet);
                assert_eq!(back_face, face);
            }
        }
    }

    #[test]
    fn test_face_neighbors_share_face_vertices() {
        let h = cell_extent(6);
        for kind in 0..6u8 {
            let tet = Tet::new(8 * h, 9 * h, 10 * h, 6, kind);
            let verts = tet.vertices();
            for face in 0..4u8 {
                let (neighbor, dual) = tet.face_neighbor(face).unwrap();
                let neighbor_verts = neighbor.vertices();
                let mut mine: Vec<_> = FACE_CORNERS[face as usize]
                    .iter()
                    .map(|&c| format!("{:?}", verts[c as usize]))
                    .collect();
                let mut theirs: Vec<_> = FACE_CORNERS[dual as usize]
                    .iter()
                    .map(|&c| format!("{:?}", neighbor_verts[c as usize]))
                    .collect();
                mine.sort();
                theirs.sort();
                assert_eq!(mine, theirs, "type {} face {}", kind, face);
            }
        }
    }

    #[test]
    fn test_boundary_neighbors_absent() {
        let root = Tet::root();
        // Type 0 leaves the domain on +x (face 0) and -y (face 3).
        assert!(root.face_neighbor(0).is_none());
        assert!(root.face_neighbor(3).is_none());
    }

    #[test]
    fn test_vertices_span_cube_diagonal() {
        let tet = Tet::new(0, 0, 0, MAX_REFINEMENT_LEVEL, 2);
        let v = tet.vertices();
        assert_eq!(v[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(v[3], Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_six_types_tile_the_cube() {
        // Every sample point of a cube belongs to at least one type, and
        // interior points to exactly one.
        let level = MAX_REFINEMENT_LEVEL - 10; // extent 1024
        let strict_inside = Point3::new(700.0, 300.0, 500.0);
        let owners: Vec<u8> = (0..6u8)
            .filter(|&kind| Tet::new(0, 0, 0, level, kind).contains_point(&strict_inside))
            .collect();
        assert_eq!(owners.len(), 1, "interior point with owners {:?}", owners);
    }
}
