// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::voxtree::geometry::{Aabb, Point3};
    use crate::voxtree::index::{IndexConfig, NodeSnapshot, Octree, SpatialIndex, Tetree};
    use crate::voxtree::key::SpatialKey;
    use crate::voxtree::search::RangeMode;
    use crate::voxtree::store::SpanningPolicy;
    use crate::voxtree::voxstream::{EntityId, QueryOptions, VoxError};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn p(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Structural and referential invariants over a snapshot.
    fn check_invariants<K: SpatialKey, I: EntityId, C: Clone + Send + Sync + 'static>(
        index: &SpatialIndex<K, I, C>,
    ) {
        let nodes = index.nodes();
        let entities = index.entities();
        let by_key: HashMap<K, &NodeSnapshot<K, I>> =
            nodes.iter().map(|n| (n.key, n)).collect();

        for node in &nodes {
            // No prunable nodes survive.
            assert!(
                !node.entity_ids.is_empty() || node.child_bitmap != 0,
                "prunable node {:?}",
                node.key
            );
            // Parent chain with matching child bits.
            if let Some(parent) = node.key.parent() {
                let bit = node.key.child_index().expect("non-root without index");
                let parent_node = by_key.get(&parent).expect("missing ancestor");
                assert!(
                    parent_node.child_bitmap & (1 << bit) != 0,
                    "parent of {:?} missing child bit",
                    node.key
                );
            }
            // Child bits point at existing nodes.
            for i in 0..8u8 {
                if node.child_bitmap & (1 << i) != 0 {
                    assert!(
                        by_key.contains_key(&node.key.child(i)),
                        "dangling child bit {} on {:?}",
                        i,
                        node.key
                    );
                }
            }
        }

        // Cover-sets and node entity sets agree in both directions.
        for entity in &entities {
            assert!(!entity.keys.is_empty());
            for key in &entity.keys {
                let node = by_key.get(key).expect("cover key without node");
                assert!(node.entity_ids.contains(&entity.id));
            }
        }
        let entity_keys: HashMap<&I, &Vec<K>> =
            entities.iter().map(|e| (&e.id, &e.keys)).collect();
        for node in &nodes {
            for id in &node.entity_ids {
                let keys = entity_keys.get(id).expect("orphan id in node");
                assert!(keys.contains(&node.key));
            }
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let index: Octree<u64, String> = Octree::new(IndexConfig::default()).unwrap();
        let id = index.insert(p(100.0, 200.0, 300.0), "payload".to_string()).unwrap();
        assert!(index.contains(&id));
        assert_eq!(index.len(), 1);

        let view = index.get(&id).unwrap();
        assert_eq!(view.position, p(100.0, 200.0, 300.0));
        assert_eq!(view.content, "payload");
        assert_eq!(view.level, 10);
        assert_eq!(view.keys.len(), 1);

        let content = index.remove(&id).unwrap();
        assert_eq!(content, "payload");
        assert!(index.is_empty());
        assert_eq!(index.node_count(), 0);
        check_invariants(&index);
    }

    #[test]
    fn test_duplicate_id_conflicts() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        index.insert_with_id(7, p(1.0, 2.0, 3.0), None, ()).unwrap();
        match index.insert_with_id(7, p(4.0, 5.0, 6.0), None, ()) {
            Err(VoxError::Conflict { .. }) => {}
            other => panic!("expected Conflict, got {:?}", other),
        }
        // The failed insert left no trace.
        assert_eq!(index.len(), 1);
        check_invariants(&index);
    }

    #[test]
    fn test_missing_id_not_found() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        match index.update(&9, p(1.0, 1.0, 1.0), None) {
            Err(VoxError::NotFound { .. }) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
        match index.remove(&9) {
            Err(VoxError::NotFound { .. }) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_invalid_input() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        assert!(index.insert(p(-1.0, 0.0, 0.0), ()).is_err());
        assert!(index.insert(p(f32::NAN, 0.0, 0.0), ()).is_err());
        assert!(index
            .insert_at_level(p(1.0, 1.0, 1.0), (), 22)
            .is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn test_subdivision_redistributes() {
        let config = IndexConfig::default()
            .with_default_level(5)
            .with_max_entities_per_node(2);
        let index: Octree<u64, u32> = Octree::new(config).unwrap();
        index.insert(p(100.0, 100.0, 100.0), 1).unwrap();
        index.insert(p(40_000.0, 100.0, 100.0), 2).unwrap();
        index.insert(p(60_000.0, 100.0, 100.0), 3).unwrap();
        index.insert(p(50_000.0, 100.0, 100.0), 4).unwrap();

        for node in index.nodes() {
            assert!(node.entity_ids.len() <= 2, "overfull node {:?}", node.key);
        }
        for entity in index.entities() {
            assert!(entity.keys.iter().all(|k| k.level() > 5));
        }
        assert!(index.metrics().node_splits > 0);
        check_invariants(&index);
    }

    #[test]
    fn test_oversize_node_at_max_depth_accepted() {
        let config = IndexConfig::default()
            .with_default_level(21)
            .with_max_entities_per_node(2);
        let index: Octree<u64, u32> = Octree::new(config).unwrap();
        // Identical positions cannot separate; the deepest node takes
        // them all.
        for i in 0..5 {
            index.insert(p(10.0, 10.0, 10.0), i).unwrap();
        }
        let deepest: Vec<_> = index
            .nodes()
            .into_iter()
            .filter(|n| n.level == 21)
            .collect();
        assert_eq!(deepest.len(), 1);
        assert_eq!(deepest[0].entity_ids.len(), 5);
        check_invariants(&index);
    }

    #[test]
    fn test_noop_update_keeps_cover() {
        let config = IndexConfig::default().with_spanning(SpanningPolicy::SpanBounds);
        let index: Octree<u64, ()> = Octree::new(config).unwrap();
        let bounds = Aabb::new(p(0.0, 0.0, 0.0), p(3000.0, 50.0, 50.0));
        let id = index.insert_bounded(p(1500.0, 25.0, 25.0), bounds, ()).unwrap();
        let before = index.get(&id).unwrap().keys;
        index.update(&id, p(1500.0, 25.0, 25.0), Some(bounds)).unwrap();
        let after = index.get(&id).unwrap().keys;
        assert_eq!(before, after);
        check_invariants(&index);
    }

    #[test]
    fn test_spanning_update_scenario() {
        let config = IndexConfig::default()
            .with_default_level(12)
            .with_spanning(SpanningPolicy::SpanBounds);
        let index: Octree<u64, ()> = Octree::new(config).unwrap();

        let wide = Aabb::new(p(0.0, 0.0, 0.0), p(800.0, 50.0, 50.0));
        let id = index.insert_bounded(p(400.0, 25.0, 25.0), wide, ()).unwrap();
        assert!(index.get(&id).unwrap().keys.len() > 1);

        let tight = Aabb::new(p(100.0, 100.0, 100.0), p(110.0, 110.0, 110.0));
        index.update(&id, p(100.0, 100.0, 100.0), Some(tight)).unwrap();
        assert_eq!(index.get(&id).unwrap().keys.len(), 1);

        let over_old = index
            .range_aabb(&wide, RangeMode::Intersecting, &QueryOptions::default())
            .unwrap();
        assert!(over_old.data.is_empty());
        check_invariants(&index);
    }

    #[test]
    fn test_iteration_order_is_insertion_independent() {
        let points = [
            p(10.0, 10.0, 10.0),
            p(10.0, 10.0, 20.0),
            p(10.0, 20.0, 10.0),
        ];
        let forward: Octree<u64, usize> =
            Octree::new(IndexConfig::default().with_default_level(21)).unwrap();
        let reverse: Octree<u64, usize> =
            Octree::new(IndexConfig::default().with_default_level(21)).unwrap();
        for (i, point) in points.iter().enumerate() {
            forward.insert(*point, i).unwrap();
        }
        for (i, point) in points.iter().enumerate().rev() {
            reverse.insert(*point, i).unwrap();
        }
        let forward_keys: Vec<_> = index_keys(&forward);
        let reverse_keys: Vec<_> = index_keys(&reverse);
        assert_eq!(forward_keys, reverse_keys);
        let mut sorted = forward_keys.clone();
        sorted.sort();
        assert_eq!(forward_keys, sorted);
    }

    fn index_keys<K: SpatialKey, I: EntityId, C: Clone + Send + Sync + 'static>(
        index: &SpatialIndex<K, I, C>,
    ) -> Vec<K> {
        index.nodes().into_iter().map(|n| n.key).collect()
    }

    #[test]
    fn test_tetree_insert_and_invariants() {
        let index: Tetree<u64, String> = Tetree::new(IndexConfig::default()).unwrap();
        let a = index.insert(p(100.0, 200.0, 300.0), "a".into()).unwrap();
        let b = index.insert(p(5000.0, 6000.0, 7000.0), "b".into()).unwrap();
        assert_eq!(index.len(), 2);
        assert_ne!(a, b);
        check_invariants(&index);
        index.remove(&a).unwrap();
        check_invariants(&index);
    }

    #[test]
    fn test_uuid_ids() {
        let index: Tetree<uuid::Uuid, ()> =
            Tetree::with_uuid_ids(IndexConfig::default()).unwrap();
        let a = index.insert(p(1.0, 2.0, 3.0), ()).unwrap();
        let b = index.insert(p(4.0, 5.0, 6.0), ()).unwrap();
        assert_ne!(a, b);
        assert!(index.contains(&a));
    }

    #[test]
    fn test_metrics_counters() {
        let index: Octree<u64, ()> = Octree::new(IndexConfig::default()).unwrap();
        let id = index.insert(p(1.0, 1.0, 1.0), ()).unwrap();
        index.update(&id, p(2.0, 2.0, 2.0), None).unwrap();
        index.remove(&id).unwrap();
        let snapshot = index.metrics();
        assert_eq!(snapshot.inserts, 1);
        assert_eq!(snapshot.updates, 1);
        assert_eq!(snapshot.removes, 1);
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let index: Arc<Octree<u64, u32>> =
            Arc::new(Octree::new(IndexConfig::default()).unwrap());

        let writers: Vec<_> = (0..4u32)
            .map(|worker| {
                let index = index.clone();
                std::thread::spawn(move || {
                    for i in 0..50u32 {
                        let x = 1000.0 + worker as f32 * 40_000.0 + i as f32 * 700.0;
                        index.insert(p(x, 500.0, 500.0), worker * 100 + i).unwrap();
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..2)
            .map(|_| {
                let index = index.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let response = index
                            .knn(&p(1000.0, 500.0, 500.0), 5, None, &QueryOptions::default())
                            .unwrap();
                        // A reader sees a consistent prefix, never a torn
                        // state.
                        assert!(response.data.len() <= 5);
                    }
                })
            })
            .collect();

        for handle in writers {
            handle.join().unwrap();
        }
        for handle in readers {
            handle.join().unwrap();
        }
        assert_eq!(index.len(), 200);
        check_invariants(&*index);
    }
}
