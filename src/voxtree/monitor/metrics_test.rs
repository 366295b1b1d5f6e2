// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::voxtree::monitor::metrics::IndexMetrics;

    #[test]
    fn test_counters_accumulate() {
        let metrics = IndexMetrics::new();
        metrics.record_insert();
        metrics.record_insert();
        metrics.record_update();
        metrics.record_remove();
        metrics.record_bulk(100);
        metrics.record_knn();
        metrics.record_split();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.inserts, 2);
        assert_eq!(snapshot.updates, 1);
        assert_eq!(snapshot.removes, 1);
        assert_eq!(snapshot.bulk_batches, 1);
        assert_eq!(snapshot.bulk_entities, 100);
        assert_eq!(snapshot.knn_queries, 1);
        assert_eq!(snapshot.node_splits, 1);
        assert_eq!(snapshot.node_merges, 0);
    }

    #[test]
    fn test_snapshot_serialises() {
        let metrics = IndexMetrics::new();
        metrics.record_range();
        let json = serde_json::to_string(&metrics.snapshot()).unwrap();
        assert!(json.contains("\"range_queries\":1"));
    }

    #[test]
    fn test_concurrent_recording() {
        let metrics = std::sync::Arc::new(IndexMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record_insert();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().inserts, 4000);
    }
}
