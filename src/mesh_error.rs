//! MeshDpError: Unified error type for mesh-dp public APIs
//!
//! Every phase of the partitioning pipeline reports failures through this
//! type. There are no retryable variants: configuration errors abort before
//! any region is allocated, consistency failures abort the whole run.

use thiserror::Error;

/// Unified error type for mesh-dp operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshDpError {
    /// At least one color (worker) is required.
    #[error("configuration error: number of colors must be non-zero")]
    ZeroColors,
    /// An index space was requested with a non-positive volume.
    #[error("configuration error: index space `{space}` requested with count {count}")]
    InvalidEntityCount { space: &'static str, count: usize },
    /// Fewer entities than colors; an equal split would leave a color empty.
    #[error("configuration error: index space `{space}` has {count} entities for {colors} colors")]
    TooFewEntities {
        space: &'static str,
        count: usize,
        colors: usize,
    },
    /// The number of per-color inputs (communicators, sub-regions, labels)
    /// does not match the number of colors.
    #[error("configuration error: expected {expected} colors, found {found}")]
    ColorCountMismatch { expected: usize, found: usize },
    /// Mesh dimension of zero, or a dimension the source does not provide.
    #[error("configuration error: invalid mesh dimension {0}")]
    InvalidDimension(usize),
    /// A partitioner produced a label outside `0..num_colors`.
    #[error("partitioner produced color {color} but only {num_colors} colors exist")]
    InvalidColor { color: usize, num_colors: usize },
    /// Malformed mesh input.
    #[error("mesh parse error: {0}")]
    MeshIoParse(String),
    /// Underlying I/O failure while reading a mesh.
    #[error("mesh I/O error: {0}")]
    Io(String),
    /// A connectivity query referenced an entity past the end of its space.
    #[error("entity {id} out of range for dimension {dim} (count {count})")]
    EntityOutOfRange { dim: usize, id: usize, count: usize },
    /// The external partitioner failed.
    #[error("partitioner error: {0}")]
    Partitioner(String),
    /// Two independently computed sizes disagree.
    #[error("consistency check failed: {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A classification invariant does not hold for a color.
    #[error("consistency check failed for color {color} ({space}): {detail}")]
    ConsistencyCheck {
        color: usize,
        space: &'static str,
        detail: String,
    },
    /// Message exchange with a neighbor failed.
    #[error("communication error with neighbor {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: CommFailure,
    },
    /// The task runtime could not be set up.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Detail attached to [`MeshDpError::CommError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommFailure {
    #[error("no message received")]
    Missing,
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<std::io::Error> for MeshDpError {
    fn from(e: std::io::Error) -> Self {
        MeshDpError::Io(e.to_string())
    }
}

impl MeshDpError {
    /// Shorthand for a classification failure on `color`.
    pub fn consistency(color: usize, space: &'static str, detail: impl Into<String>) -> Self {
        MeshDpError::ConsistencyCheck {
            color,
            space,
            detail: detail.into(),
        }
    }

    /// Returns true for the fatal consistency class of errors.
    pub fn is_consistency_failure(&self) -> bool {
        matches!(
            self,
            MeshDpError::SizeMismatch { .. } | MeshDpError::ConsistencyCheck { .. }
        )
    }
}

/// Fail with [`MeshDpError::SizeMismatch`] unless the two sizes agree.
pub(crate) fn check_size(
    what: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), MeshDpError> {
    if expected == actual {
        Ok(())
    } else {
        Err(MeshDpError::SizeMismatch {
            what,
            expected,
            actual,
        })
    }
}
