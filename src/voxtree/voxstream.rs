// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! VoxStream — universal communication interface for all VoxTree modules.
//!
//! Foundation layer with no dependencies on other VoxTree modules. Every
//! public API returns `VoxResult<T>`; queries wrap their payload in a
//! `VoxResponse<T>` envelope carrying completion status and metrics.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Standard Result type for all VoxTree operations.
pub type VoxResult<T> = Result<T, VoxError>;

/// Standard Error types across all modules.
///
/// Validation errors surface at the API boundary; internal computation
/// inside a traversal records cancellation into the result envelope and
/// terminates cleanly instead of erroring.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum VoxError {
    /// Input validation failure (negative coordinate, NaN, level out of
    /// range, k = 0, negative distance).
    #[error("Invalid input in field '{field}': value '{value}' does not meet constraint '{constraint}'")]
    InvalidInput {
        field: String,
        value: String,
        constraint: String,
    },

    /// Duplicate entity id on insert.
    #[error("Conflict on {resource}: {reason}")]
    Conflict { resource: String, reason: String },

    /// Update or remove on a missing entity id.
    #[error("Resource not found: {resource}, context: {context:?}")]
    NotFound {
        resource: String,
        context: Option<String>,
    },

    /// Refinement or key computation beyond the deepest level.
    #[error("Overflow in '{operation}': requested {requested}, limit {limit}")]
    Overflow {
        operation: String,
        limit: u32,
        requested: u32,
    },

    /// Deadline expired or cancellation token fired during a mutation.
    /// Queries report cancellation through their envelope instead.
    #[error("Cancelled during '{operation}' after {completed} elements")]
    Cancelled { operation: String, completed: usize },

    /// Bulk operation aborted; no partial state was committed.
    #[error("Batch aborted at offset {offset}: {reason}")]
    BatchAborted { offset: usize, reason: String },

    /// Invariant violation. Aborts in debug builds, surfaces as an error
    /// in release builds.
    #[error("Internal error in component '{component}': {reason}")]
    Internal { component: String, reason: String },

    /// Export sink or log file I/O error.
    #[error("I/O error during operation '{operation}' on path '{path}': {reason}")]
    IoError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error in component '{component}': {reason}")]
    ConfigError { component: String, reason: String },
}

/// Completion status of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    /// Traversal visited every candidate.
    Complete,
    /// Deadline or cancellation token fired; data holds the accumulated
    /// prefix.
    Cancelled,
    /// A caller callback requested early termination.
    Stopped,
}

/// Performance metrics attached to query responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryMetrics {
    pub nodes_visited: u64,
    pub entities_tested: u64,
    pub processing_time_us: u64,
}

/// Standard response envelope for all query operations.
///
/// Results are owned records; they never borrow from the index.
///
/// ## Example Usage
/// ```rust
/// use voxtree::voxtree::voxstream::{QueryStatus, VoxResponse};
///
/// let response = VoxResponse::new(vec![1u64, 2, 3], "search::knn");
/// assert_eq!(response.status, QueryStatus::Complete);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoxResponse<T> {
    pub data: T,
    pub source: String,
    pub status: QueryStatus,
    pub timestamp: u64,
    pub metrics: Option<QueryMetrics>,
}

impl<T> VoxResponse<T> {
    /// Creates a new complete response with the current timestamp.
    pub fn new(data: T, source: &str) -> Self {
        Self {
            data,
            source: source.to_string(),
            status: QueryStatus::Complete,
            timestamp: current_timestamp(),
            metrics: None,
        }
    }

    /// Marks the response as a cancelled or stopped prefix.
    pub fn with_status(mut self, status: QueryStatus) -> Self {
        self.status = status;
        self
    }

    /// Attaches performance metrics to an existing response.
    pub fn with_metrics(mut self, metrics: QueryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Cooperative cancellation signal shared between a caller and a running
/// operation.
///
/// ## Behaviour
/// - Cloning shares the underlying flag.
/// - Workers check the token between chunks (1024 entities or one
///   node-visit granularity).
///
/// ## Example Usage
/// ```rust
/// use voxtree::voxtree::voxstream::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_copy = token.clone();
/// token.cancel();
/// assert!(worker_copy.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns true once any clone has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Per-query options: cancellation, deadline and result shaping.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub token: Option<CancellationToken>,
    pub deadline: Option<Duration>,
}

impl QueryOptions {
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Internal clock for deadline and token checks at node-visit granularity.
#[derive(Debug)]
pub(crate) struct QueryClock {
    started: Instant,
    deadline: Option<Duration>,
    token: Option<CancellationToken>,
}

impl QueryClock {
    pub(crate) fn new(options: &QueryOptions) -> Self {
        Self {
            started: Instant::now(),
            deadline: options.deadline,
            token: options.token.clone(),
        }
    }

    /// True once the deadline passed or the token fired.
    pub(crate) fn expired(&self) -> bool {
        if let Some(limit) = self.deadline {
            if self.started.elapsed() >= limit {
                return true;
            }
        }
        self.token
            .as_ref()
            .map(|t| t.is_cancelled())
            .unwrap_or(false)
    }

    pub(crate) fn elapsed_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }
}

/// Opaque, total-ordered entity identifier bound. Satisfied by integers,
/// UUIDs and any other value type with a total order.
pub trait EntityId:
    Clone + Eq + Ord + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
}

impl<T> EntityId for T where
    T: Clone + Eq + Ord + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
}

/// Capability producing fresh, totally-ordered entity identifiers.
///
/// The index is generic over the id type; implementations must be
/// thread-safe because bulk pipelines draw ids from worker threads.
pub trait IdGenerator<I>: Send + Sync {
    /// Returns the next fresh identifier.
    fn next_id(&self) -> I;
}

/// Sequential `u64` id generator.
///
/// ## Example Usage
/// ```rust
/// use voxtree::voxtree::voxstream::{IdGenerator, SequentialIdGenerator};
///
/// let generator = SequentialIdGenerator::new();
/// assert_eq!(generator.next_id(), 0);
/// assert_eq!(generator.next_id(), 1);
/// ```
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the sequence at a given value.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl IdGenerator<u64> for SequentialIdGenerator {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Random UUID v4 id generator.
#[derive(Debug, Default)]
pub struct UuidIdGenerator;

impl UuidIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator<uuid::Uuid> for UuidIdGenerator {
    fn next_id(&self) -> uuid::Uuid {
        uuid::Uuid::new_v4()
    }
}

// == HELPER FUNCTIONS ==

/// Returns current Unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time before UNIX epoch")
        .as_secs()
}

// == CONVENIENCE FUNCTIONS ==

/// Creates an InvalidInput error.
pub fn invalid_input(
    field: impl Into<String>,
    value: impl Into<String>,
    constraint: impl Into<String>,
) -> VoxError {
    VoxError::InvalidInput {
        field: field.into(),
        value: value.into(),
        constraint: constraint.into(),
    }
}

/// Creates a Conflict error.
pub fn conflict(resource: impl Into<String>, reason: impl Into<String>) -> VoxError {
    VoxError::Conflict {
        resource: resource.into(),
        reason: reason.into(),
    }
}

/// Creates a NotFound error.
pub fn not_found(resource: impl Into<String>) -> VoxError {
    VoxError::NotFound {
        resource: resource.into(),
        context: None,
    }
}

/// Creates an Overflow error.
pub fn overflow(operation: impl Into<String>, limit: u32, requested: u32) -> VoxError {
    VoxError::Overflow {
        operation: operation.into(),
        limit,
        requested,
    }
}

/// Creates a Cancelled error.
pub fn cancelled(operation: impl Into<String>, completed: usize) -> VoxError {
    VoxError::Cancelled {
        operation: operation.into(),
        completed,
    }
}

/// Creates an Internal error. Aborts in debug builds.
pub fn internal(component: impl Into<String>, reason: impl Into<String>) -> VoxError {
    let component = component.into();
    let reason = reason.into();
    debug_assert!(false, "internal error in {}: {}", component, reason);
    VoxError::Internal { component, reason }
}

/// Creates an IoError.
pub fn io_error(
    operation: impl Into<String>,
    path: impl Into<String>,
    reason: impl Into<String>,
) -> VoxError {
    VoxError::IoError {
        operation: operation.into(),
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates a ConfigError.
pub fn config_error(component: impl Into<String>, reason: impl Into<String>) -> VoxError {
    VoxError::ConfigError {
        component: component.into(),
        reason: reason.into(),
    }
}

// == ERROR TRAIT IMPLEMENTATIONS ==

impl VoxError {
    /// Adds context to NotFound errors.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        if let VoxError::NotFound {
            context: ref mut ctx,
            ..
        } = self
        {
            *ctx = Some(context.into());
        }
        self
    }
}

/// Automatic conversion from std::io::Error to VoxError.
impl From<std::io::Error> for VoxError {
    fn from(err: std::io::Error) -> Self {
        VoxError::IoError {
            operation: "io".to_string(),
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}
