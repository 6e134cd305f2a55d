//! Error handling logic

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Unique identifier for one simulated qubit.
///
/// Identifiers are allocated by the source compiler in register declaration
/// order, so the first declared qubit of an operation is `QubitId(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QubitId(pub u64);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q({})", self.0)
    }
}

/// Errors raised while loading, compiling or executing QEC operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QecError {
    /// The operation-definition source could not be located or read.
    #[error("could not load operation source {}: {source}", .path.display())]
    BackendInitialization {
        /// Path the backend tried to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The operation-definition source is malformed.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending token.
        line: usize,
        /// Parse error message
        message: String,
    },

    /// A VM program failed validation (undefined or duplicate labels).
    #[error("invalid program: {0}")]
    Program(String),

    /// No operation with the given qualified name was loaded.
    #[error("operation '{0}' is not defined")]
    OperationNotFound(String),

    /// Shot count must be at least one.
    #[error("invalid shot count {0}: at least one shot is required")]
    InvalidShots(usize),

    /// The backend returned no outcomes where at least one was requested.
    #[error("backend returned an empty result sequence")]
    EmptyResult,

    /// A shot outcome did not have the number of values the caller expected.
    #[error("expected a {expected}-tuple result, got {actual} values")]
    UnexpectedArity {
        /// Number of values the caller unpacks.
        expected: usize,
        /// Number of values the operation returned.
        actual: usize,
    },

    /// A qubit referenced by an operation is not part of the simulation.
    #[error("qubit {0} not found in simulation context")]
    UnknownQubit(QubitId),

    /// An operation is inconsistent with the current state or rules.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// General failure of the simulation process itself.
    #[error("simulation error: {0}")]
    Simulation(String),

    /// Writing the report failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate.
pub type QecResult<T> = Result<T, QecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_id_display() {
        assert_eq!(QubitId(3).to_string(), "Q(3)");
    }

    #[test]
    fn test_initialization_error_mentions_path() {
        let err = QecError::BackendInitialization {
            path: PathBuf::from("qec_codes.qec"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let message = err.to_string();
        assert!(message.contains("qec_codes.qec"), "got: {message}");
        assert!(message.contains("missing"), "got: {message}");
    }
}
