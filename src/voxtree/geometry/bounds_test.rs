// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::voxtree::geometry::bounds::{Aabb, Sphere};
    use crate::voxtree::geometry::point::Point3;

    fn aabb(min: (f32, f32, f32), max: (f32, f32, f32)) -> Aabb {
        Aabb::new(
            Point3::new(min.0, min.1, min.2),
            Point3::new(max.0, max.1, max.2),
        )
    }

    #[test]
    fn test_validate_ordering() {
        assert!(aabb((0.0, 0.0, 0.0), (1.0, 1.0, 1.0)).validate().is_ok());
        assert!(aabb((2.0, 0.0, 0.0), (1.0, 1.0, 1.0)).validate().is_err());
    }

    #[test]
    fn test_containment_is_closed() {
        let b = aabb((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        assert!(b.contains_point(&Point3::new(0.0, 0.0, 0.0)));
        assert!(b.contains_point(&Point3::new(10.0, 10.0, 10.0)));
        assert!(!b.contains_point(&Point3::new(10.1, 0.0, 0.0)));
    }

    #[test]
    fn test_intersects_counts_touching() {
        let a = aabb((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = aabb((10.0, 0.0, 0.0), (20.0, 10.0, 10.0));
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_strict_overlap_excludes_touching() {
        let a = aabb((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let touching = aabb((10.0, 0.0, 0.0), (20.0, 10.0, 10.0));
        let overlapping = aabb((9.0, 9.0, 9.0), (12.0, 12.0, 12.0));
        assert!(!a.overlaps_strictly(&touching));
        assert!(a.overlaps_strictly(&overlapping));
    }

    #[test]
    fn test_distance_sq_to_point() {
        let b = aabb((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        assert_eq!(b.distance_sq_to_point(&Point3::new(5.0, 5.0, 5.0)), 0.0);
        assert_eq!(b.distance_sq_to_point(&Point3::new(13.0, 0.0, 0.0)), 9.0);
        assert_eq!(b.distance_sq_to_point(&Point3::new(13.0, 14.0, 0.0)), 25.0);
    }

    #[test]
    fn test_sphere_intersection_and_containment() {
        let b = aabb((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let near = Sphere::new(Point3::new(12.0, 5.0, 5.0), 2.0);
        let far = Sphere::new(Point3::new(20.0, 5.0, 5.0), 2.0);
        assert!(b.intersects_sphere(&near));
        assert!(!b.intersects_sphere(&far));

        let big = Sphere::new(Point3::new(5.0, 5.0, 5.0), 20.0);
        assert!(big.contains_aabb(&b));
        let small = Sphere::new(Point3::new(5.0, 5.0, 5.0), 5.0);
        assert!(!small.contains_aabb(&b));
    }

    #[test]
    fn test_union() {
        let a = aabb((0.0, 0.0, 0.0), (1.0, 1.0, 1.0));
        let b = aabb((5.0, 5.0, 5.0), (6.0, 6.0, 6.0));
        let u = a.union(&b);
        assert_eq!(u.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(u.max, Point3::new(6.0, 6.0, 6.0));
    }
}
