// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::voxtree::geometry::{
        Aabb, Frustum, FrustumClass, Plane, PlaneSide, Point3, Ray3, Sphere, Vector3,
    };
    use crate::voxtree::index::{IndexConfig, Octree, Tetree};
    use crate::voxtree::search::RangeMode;
    use crate::voxtree::store::SpanningPolicy;
    use crate::voxtree::voxstream::{CancellationToken, QueryOptions, QueryStatus};

    fn p(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    fn options() -> QueryOptions {
        QueryOptions::default()
    }

    #[test]
    fn test_knn_single_entity_at_distance_zero() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        let id = index.insert(p(100.0, 200.0, 300.0), ()).unwrap();
        let response = index.knn(&p(100.0, 200.0, 300.0), 1, None, &options()).unwrap();
        assert_eq!(response.status, QueryStatus::Complete);
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].id, id);
        assert_eq!(response.data[0].distance, 0.0);
    }

    #[test]
    fn test_knn_tetree_at_distance_zero() {
        let index: Tetree<u64, ()> = Tetree::new(IndexConfig::default()).unwrap();
        let id = index.insert(p(100.0, 200.0, 300.0), ()).unwrap();
        let response = index.knn(&p(100.0, 200.0, 300.0), 1, None, &options()).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].id, id);
        assert_eq!(response.data[0].distance, 0.0);
    }

    #[test]
    fn test_knn_orders_by_distance_then_id() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        let far = index.insert(p(900.0, 100.0, 100.0), ()).unwrap();
        let right = index.insert(p(110.0, 100.0, 100.0), ()).unwrap();
        let left = index.insert(p(90.0, 100.0, 100.0), ()).unwrap();

        let response = index.knn(&p(100.0, 100.0, 100.0), 3, None, &options()).unwrap();
        let ids: Vec<u64> = response.data.iter().map(|hit| hit.id).collect();
        // Equidistant pair ties break by id; the far point comes last.
        assert_eq!(ids, vec![right.min(left), right.max(left), far]);
        assert!(response.data[0].distance <= response.data[1].distance);
        assert!(response.data[1].distance <= response.data[2].distance);
    }

    #[test]
    fn test_knn_respects_k_and_max_distance() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        for i in 0..10u32 {
            index.insert(p(100.0 + i as f32 * 100.0, 50.0, 50.0), ()).unwrap();
        }
        let response = index.knn(&p(0.0, 50.0, 50.0), 4, None, &options()).unwrap();
        assert_eq!(response.data.len(), 4);

        let capped = index
            .knn(&p(0.0, 50.0, 50.0), 10, Some(350.0), &options())
            .unwrap();
        assert_eq!(capped.data.len(), 3);
        assert!(capped.data.iter().all(|hit| hit.distance <= 350.0));
    }

    #[test]
    fn test_knn_uses_bounds_nearest_distance() {
        let config = IndexConfig::default().with_spanning(SpanningPolicy::SpanBounds);
        let index: Octree<u64, ()> = Octree::new(config).unwrap();
        let boxed = index
            .insert_bounded(
                p(600.0, 100.0, 100.0),
                Aabb::new(p(500.0, 50.0, 50.0), p(700.0, 150.0, 150.0)),
                (),
            )
            .unwrap();
        let point = index.insert(p(480.0, 100.0, 100.0), ()).unwrap();

        // The box surface (x = 500) is nearer to the query than the
        // point at x = 480.
        let response = index.knn(&p(520.0, 100.0, 100.0), 2, None, &options()).unwrap();
        assert_eq!(response.data[0].id, boxed);
        assert_eq!(response.data[0].distance, 0.0);
        assert_eq!(response.data[1].id, point);
    }

    #[test]
    fn test_knn_rejects_bad_arguments() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        assert!(index.knn(&p(1.0, 1.0, 1.0), 0, None, &options()).is_err());
        assert!(index
            .knn(&p(1.0, 1.0, 1.0), 1, Some(-2.0), &options())
            .is_err());
        assert!(index.knn(&p(-1.0, 1.0, 1.0), 1, None, &options()).is_err());
    }

    #[test]
    fn test_knn_early_termination() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        for i in 0..5u32 {
            index.insert(p(100.0 + i as f32 * 10.0, 50.0, 50.0), ()).unwrap();
        }
        let mut seen = 0usize;
        let response = index
            .knn_with(&p(100.0, 50.0, 50.0), 5, None, &options(), |_| {
                seen += 1;
                false
            })
            .unwrap();
        assert_eq!(response.status, QueryStatus::Stopped);
        assert_eq!(seen, 1);
        assert_eq!(response.data.len(), 1);
    }

    #[test]
    fn test_cancelled_token_returns_prefix() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        index.insert(p(100.0, 100.0, 100.0), ()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let response = index
            .knn(
                &p(100.0, 100.0, 100.0),
                1,
                None,
                &options().with_token(token),
            )
            .unwrap();
        assert_eq!(response.status, QueryStatus::Cancelled);
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_range_matches_naive_scan() {
        let index: Octree<u64, (u32, u32)> = Octree::new(IndexConfig::default()).unwrap();
        let mut all = Vec::new();
        for i in 0..10u32 {
            for j in 0..10u32 {
                let point = p(i as f32 * 500.0, j as f32 * 500.0, 1000.0);
                let id = index.insert(point, (i, j)).unwrap();
                all.push((id, point));
            }
        }
        let region = Aabb::new(p(1200.0, 1200.0, 0.0), p(3300.0, 3300.0, 2000.0));
        let response = index
            .range_aabb(&region, RangeMode::Intersecting, &options())
            .unwrap();
        let mut expected: Vec<u64> = all
            .iter()
            .filter(|(_, point)| region.contains_point(point))
            .map(|(id, _)| *id)
            .collect();
        expected.sort_unstable();
        let mut got = response.data.clone();
        got.sort_unstable();
        assert_eq!(got, expected);
        assert_eq!(expected.len(), 16);
    }

    #[test]
    fn test_range_contained_subset_of_intersecting() {
        let config = IndexConfig::default().with_spanning(SpanningPolicy::SpanBounds);
        let index: Octree<u64, ()> = Octree::new(config).unwrap();
        index
            .insert_bounded(
                p(1000.0, 1000.0, 1000.0),
                Aabb::new(p(900.0, 900.0, 900.0), p(1100.0, 1100.0, 1100.0)),
                (),
            )
            .unwrap();
        index
            .insert_bounded(
                p(1950.0, 1000.0, 1000.0),
                Aabb::new(p(1900.0, 900.0, 900.0), p(2600.0, 1100.0, 1100.0)),
                (),
            )
            .unwrap();

        let region = Aabb::new(p(800.0, 800.0, 800.0), p(2000.0, 1200.0, 1200.0));
        let contained = index
            .range_aabb(&region, RangeMode::Contained, &options())
            .unwrap();
        let intersecting = index
            .range_aabb(&region, RangeMode::Intersecting, &options())
            .unwrap();
        assert_eq!(contained.data.len(), 1);
        assert_eq!(intersecting.data.len(), 2);
        assert!(contained.data.iter().all(|id| intersecting.data.contains(id)));
    }

    #[test]
    fn test_range_sphere() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        let near = index.insert(p(1000.0, 1000.0, 1000.0), ()).unwrap();
        index.insert(p(5000.0, 5000.0, 5000.0), ()).unwrap();
        let sphere = Sphere::new(p(950.0, 1000.0, 1000.0), 100.0);
        let response = index
            .range_sphere(&sphere, RangeMode::Intersecting, &options())
            .unwrap();
        assert_eq!(response.data, vec![near]);
    }

    #[test]
    fn test_ray_through_two_cells() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        let first = index.insert(p(100.0, 100.0, 100.0), ()).unwrap();
        let second = index.insert(p(500.0, 100.0, 100.0), ()).unwrap();

        let ray = Ray3::new(p(0.0, 100.0, 100.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let response = index.ray_query(&ray, None, &options()).unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0].id, first);
        assert!((response.data[0].t - 100.0).abs() < 1e-2);
        assert_eq!(response.data[1].id, second);
        assert!((response.data[1].t - 500.0).abs() < 1e-2);
    }

    #[test]
    fn test_ray_tetree_through_two_cells() {
        let index: Tetree<u64, ()> = Tetree::new(IndexConfig::default()).unwrap();
        let first = index.insert(p(100.0, 100.0, 100.0), ()).unwrap();
        let second = index.insert(p(500.0, 100.0, 100.0), ()).unwrap();
        let ray = Ray3::new(p(0.0, 100.0, 100.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let response = index.ray_query(&ray, None, &options()).unwrap();
        let ids: Vec<u64> = response.data.iter().map(|hit| hit.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_ray_misses_off_axis_points() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        index.insert(p(100.0, 150.0, 100.0), ()).unwrap();
        let ray = Ray3::new(p(0.0, 100.0, 100.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let response = index.ray_query(&ray, None, &options()).unwrap();
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_ray_hits_bounded_entity_at_entry() {
        let config = IndexConfig::default().with_spanning(SpanningPolicy::SpanBounds);
        let index: Octree<u64, ()> = Octree::new(config).unwrap();
        let id = index
            .insert_bounded(
                p(1050.0, 100.0, 100.0),
                Aabb::new(p(1000.0, 90.0, 90.0), p(1100.0, 110.0, 110.0)),
                (),
            )
            .unwrap();
        let ray = Ray3::new(p(0.0, 100.0, 100.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let response = index.ray_query(&ray, None, &options()).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].id, id);
        assert!((response.data[0].t - 1000.0).abs() < 1e-2);

        // A shorter budget excludes it.
        let capped = index.ray_query(&ray, Some(900.0), &options()).unwrap();
        assert!(capped.data.is_empty());
    }

    #[test]
    fn test_ray_max_distance_and_ordering() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        let mut ids = Vec::new();
        for i in (1..=5u32).rev() {
            ids.push(index.insert(p(i as f32 * 200.0, 70.0, 70.0), ()).unwrap());
        }
        let ray = Ray3::new(p(0.0, 70.0, 70.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let response = index.ray_query(&ray, Some(650.0), &options()).unwrap();
        let ts: Vec<f32> = response.data.iter().map(|hit| hit.t).collect();
        assert_eq!(response.data.len(), 3);
        assert!(ts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_plane_query_sides() {
        let index: Octree<u64, ()> = Octree::new(
            IndexConfig::default().with_spanning(SpanningPolicy::SpanBounds),
        )
        .unwrap();
        let negative = index.insert(p(100.0, 500.0, 500.0), ()).unwrap();
        let positive = index.insert(p(900.0, 500.0, 500.0), ()).unwrap();
        let straddling = index
            .insert_bounded(
                p(500.0, 500.0, 500.0),
                Aabb::new(p(400.0, 450.0, 450.0), p(600.0, 550.0, 550.0)),
                (),
            )
            .unwrap();

        let plane = Plane::from_point_normal(p(500.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0))
            .unwrap();

        let pos = index.plane_query(&plane, PlaneSide::Positive, &options()).unwrap();
        assert_eq!(pos.data.len(), 1);
        assert_eq!(pos.data[0].id, positive);
        assert!(pos.data[0].distance > 0.0);

        let neg = index.plane_query(&plane, PlaneSide::Negative, &options()).unwrap();
        assert_eq!(neg.data.len(), 1);
        assert_eq!(neg.data[0].id, negative);

        let cut = index
            .plane_query(&plane, PlaneSide::Straddling, &options())
            .unwrap();
        assert_eq!(cut.data.len(), 1);
        assert_eq!(cut.data[0].id, straddling);
    }

    #[test]
    fn test_frustum_query_classes() {
        let index: Octree<u64, ()> = Octree::new(
            IndexConfig::default().with_spanning(SpanningPolicy::SpanBounds),
        )
        .unwrap();
        let inside = index.insert(p(500.0, 100.0, 100.0), ()).unwrap();
        index.insert(p(500.0, 5000.0, 5000.0), ()).unwrap();
        let crossing = index
            .insert_bounded(
                p(500.0, 600.0, 100.0),
                Aabb::new(p(400.0, 100.0, 50.0), p(600.0, 1200.0, 150.0)),
                (),
            )
            .unwrap();

        let frustum = Frustum::perspective(
            p(0.0, 100.0, 100.0),
            p(1000.0, 100.0, 100.0),
            Vector3::new(0.0, 0.0, 1.0),
            std::f32::consts::FRAC_PI_2,
            1.0,
            1.0,
            10_000.0,
        )
        .unwrap();

        let response = index.frustum_query(&frustum, &options()).unwrap();
        let ids: Vec<u64> = response.data.iter().map(|hit| hit.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&inside));
        assert!(ids.contains(&crossing));
        for hit in &response.data {
            if hit.id == inside {
                assert_eq!(hit.class, FrustumClass::Inside);
            }
            if hit.id == crossing {
                assert_eq!(hit.class, FrustumClass::Intersecting);
            }
        }
    }

    #[test]
    fn test_collisions_overlap_and_touching() {
        let config = IndexConfig::default().with_spanning(SpanningPolicy::SpanBounds);
        let index: Octree<u64, ()> = Octree::new(config).unwrap();
        let a = index
            .insert_bounded(
                p(150.0, 150.0, 150.0),
                Aabb::new(p(100.0, 100.0, 100.0), p(200.0, 200.0, 200.0)),
                (),
            )
            .unwrap();
        let b = index
            .insert_bounded(
                p(180.0, 150.0, 150.0),
                Aabb::new(p(150.0, 100.0, 100.0), p(250.0, 200.0, 200.0)),
                (),
            )
            .unwrap();
        // Touching A exactly at x = 200: zero penetration, no collision.
        index
            .insert_bounded(
                p(250.0, 150.0, 150.0),
                Aabb::new(p(200.0, 100.0, 100.0), p(300.0, 200.0, 200.0)),
                (),
            )
            .unwrap();

        let response = index.collisions(&options()).unwrap();
        let overlapping: Vec<(u64, u64)> = response
            .data
            .iter()
            .filter(|pair| pair.a == a || pair.b == a)
            .map(|pair| (pair.a, pair.b))
            .collect();
        assert_eq!(overlapping, vec![(a.min(b), a.max(b))]);

        let pair = &response.data[0];
        assert!(pair.contact.penetration > 0.0);
        assert!(pair.a < pair.b);
    }

    #[test]
    fn test_collisions_all_pairs_unique() {
        let config = IndexConfig::default().with_spanning(SpanningPolicy::SpanBounds);
        let index: Octree<u64, ()> = Octree::new(config).unwrap();
        // Three mutually overlapping boxes.
        for offset in [0.0f32, 30.0, 60.0] {
            index
                .insert_bounded(
                    p(150.0 + offset, 150.0, 150.0),
                    Aabb::new(
                        p(100.0 + offset, 100.0, 100.0),
                        p(200.0 + offset, 200.0, 200.0),
                    ),
                    (),
                )
                .unwrap();
        }
        let response = index.collisions(&options()).unwrap();
        assert_eq!(response.data.len(), 3);
        let mut pairs: Vec<(u64, u64)> =
            response.data.iter().map(|pair| (pair.a, pair.b)).collect();
        let before = pairs.len();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), before);
    }

    #[test]
    fn test_collisions_across_levels_without_spanning() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        let coarse = index
            .insert_bounded_at_level(
                p(150.0, 150.0, 150.0),
                Aabb::new(p(0.0, 0.0, 0.0), p(300.0, 300.0, 300.0)),
                (),
                8,
            )
            .unwrap();
        let fine = index
            .insert_bounded_at_level(
                p(150.0, 150.0, 150.0),
                Aabb::new(p(100.0, 100.0, 100.0), p(200.0, 200.0, 200.0)),
                (),
                12,
            )
            .unwrap();
        let response = index.collisions(&options()).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(
            (response.data[0].a, response.data[0].b),
            (coarse.min(fine), coarse.max(fine))
        );
    }

    #[test]
    fn test_collisions_with_custom_narrow_phase() {
        let config = IndexConfig::default().with_spanning(SpanningPolicy::SpanBounds);
        let index: Octree<u64, ()> = Octree::new(config).unwrap();
        for offset in [0.0f32, 30.0] {
            index
                .insert_bounded(
                    p(150.0 + offset, 150.0, 150.0),
                    Aabb::new(
                        p(100.0 + offset, 100.0, 100.0),
                        p(200.0 + offset, 200.0, 200.0),
                    ),
                    (),
                )
                .unwrap();
        }
        let response = index.collisions_with(&options(), |_, _| None).unwrap();
        assert!(response.data.is_empty());
    }
}
