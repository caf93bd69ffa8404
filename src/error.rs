//! Error types for index construction and queries.

use thiserror::Error;

/// Errors that can occur when building or querying an index.
///
/// Every variant is a call-time contract violation. The structures here are
/// deterministic and fully in-memory, so there are no partial failures or
/// retryable faults; numeric edge cases (e.g. a cosine ratio slightly above
/// 1 from floating-point error) are clamped by the distance functions rather
/// than surfaced as errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Build was called with zero items.
    #[error("cannot build an index over zero items")]
    EmptyIndex,

    /// A structural argument was out of range (cluster count, grid shape,
    /// bit position, duplicate cloud id).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A query was issued before the index was built.
    #[error("index not built: call build() before knn()")]
    NotBuilt,
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
