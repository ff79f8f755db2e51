//! Error types for acoustic index analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the noise engine, index computations, the result store,
/// and table persistence.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Invalid input parameters or data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Index name that is not in the registry.
    #[error("unsupported acoustic index: {0}")]
    UnsupportedIndex(String),

    /// More index names than a single run accepts.
    #[error("too many acoustic indices requested: {requested} (at most {max})")]
    TooManyIndices {
        /// Number of distinct names requested.
        requested: usize,
        /// Configured limit.
        max: usize,
    },

    /// The request named no indices at all.
    #[error("no acoustic indices requested")]
    NoIndices,

    /// A base computation failed for one segment.
    #[error("failed to compute {computation}: {reason}")]
    Computation {
        /// Name of the failing base computation.
        computation: String,
        /// Description of the failure.
        reason: String,
    },

    /// A worker panicked while analysing a segment.
    #[error("worker panicked: {0}")]
    WorkerPanic(String),

    /// Array shape does not match the shape the store was established with.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape fixed at first insertion.
        expected: (usize, usize),
        /// Shape of the rejected array.
        actual: (usize, usize),
    },

    /// Row-level insertion before the store shape is known.
    #[error("result store shape has not been established")]
    ShapeUnset,

    /// Segment row outside the store.
    #[error("segment {index} out of range (store has {rows} rows)")]
    RowOutOfRange {
        /// Requested row.
        index: usize,
        /// Rows in the store.
        rows: usize,
    },

    /// Row has the wrong number of frequency bins.
    #[error("row for '{index}' has {actual} values, expected {expected}")]
    RowWidth {
        /// Index name of the row.
        index: String,
        /// Store column count.
        expected: usize,
        /// Length of the rejected row.
        actual: usize,
    },

    /// Requested index is not in the store.
    #[error("{0} not available in the result store")]
    MissingIndex(String),

    /// Index table file does not have the expected layout.
    #[error("malformed index table '{path}': {reason}")]
    Format {
        /// Offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Index tables must use the `.csv` extension.
    #[error("unsupported file extension for '{0}' (expected .csv)")]
    Extension(PathBuf),

    /// Index table file does not exist.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// The audio source could not produce a segment.
    #[error("audio source error: {0}")]
    Source(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Create a computation error.
    pub fn computation(computation: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::Computation {
            computation: computation.into(),
            reason: reason.into(),
        }
    }

    /// Create a table format error.
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AnalysisError::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn shape_mismatch_reports_both_shapes() {
        let err = AnalysisError::ShapeMismatch {
            expected: (4, 256),
            actual: (3, 256),
        };
        let msg = err.to_string();
        assert!(msg.contains("(4, 256)"), "got: {msg}");
        assert!(msg.contains("(3, 256)"), "got: {msg}");
    }

    #[test]
    fn computation_factory_produces_correct_variant() {
        let err = AnalysisError::computation("AcousticComplexity", "no frames");
        assert_eq!(
            err.to_string(),
            "failed to compute AcousticComplexity: no frames"
        );
    }

    #[test]
    fn io_source_is_exposed() {
        let err = AnalysisError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "mock",
        ));
        assert!(err.source().is_some());
    }

    #[test]
    fn format_source_is_none() {
        let err = AnalysisError::format("a.csv", "bad header");
        assert!(err.source().is_none());
        assert!(err.to_string().contains("a.csv"));
    }
}
