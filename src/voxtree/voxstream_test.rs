// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::voxtree::voxstream::*;

    #[test]
    fn test_result_envelope_defaults() {
        let response = VoxResponse::new(42u32, "test::module");
        assert_eq!(response.data, 42);
        assert_eq!(response.source, "test::module");
        assert_eq!(response.status, QueryStatus::Complete);
        assert!(response.metrics.is_none());
        assert!(response.timestamp > 0);
    }

    #[test]
    fn test_envelope_status_and_metrics() {
        let response = VoxResponse::new(Vec::<u64>::new(), "search::knn")
            .with_status(QueryStatus::Cancelled)
            .with_metrics(QueryMetrics {
                nodes_visited: 10,
                entities_tested: 4,
                processing_time_us: 120,
            });
        assert_eq!(response.status, QueryStatus::Cancelled);
        assert_eq!(response.metrics.as_ref().unwrap().nodes_visited, 10);
    }

    #[test]
    fn test_error_display() {
        let err = invalid_input("x", "-1", "must be non-negative");
        let text = format!("{}", err);
        assert!(text.contains("'x'"));
        assert!(text.contains("non-negative"));

        let err = overflow("tm_index", 21, 22);
        assert!(format!("{}", err).contains("limit 21"));
    }

    #[test]
    fn test_not_found_with_context() {
        let err = not_found("entity 7").with_context("update");
        match err {
            VoxError::NotFound { resource, context } => {
                assert_eq!(resource, "entity 7");
                assert_eq!(context.as_deref(), Some("update"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_serialisation_round_trip() {
        let err = conflict("entity 3", "duplicate id");
        let json = serde_json::to_string(&err).unwrap();
        let back: VoxError = serde_json::from_str(&json).unwrap();
        match back {
            VoxError::Conflict { resource, .. } => assert_eq!(resource, "entity 3"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_sequential_id_generator() {
        let generator = SequentialIdGenerator::starting_at(100);
        assert_eq!(generator.next_id(), 100);
        assert_eq!(generator.next_id(), 101);
        assert_eq!(generator.next_id(), 102);
    }

    #[test]
    fn test_uuid_id_generator_is_fresh() {
        let generator = UuidIdGenerator::new();
        let a = generator.next_id();
        let b = generator.next_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: VoxError = io.into();
        match err {
            VoxError::IoError { reason, .. } => assert!(reason.contains("gone")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
