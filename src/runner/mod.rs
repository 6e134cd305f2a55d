// src/runner/mod.rs

//! The bit-flip demonstration runner.
//!
//! The runner knows nothing about simulation: it asks a [`Backend`] to execute
//! one fixed operation for one shot, unpacks the `(corrected_state,
//! syndrome_s1)` pair and writes a human-readable report.
//!
//! ```
//! use qecsim::runner::{self, Backend, ExecutionRequest, Verdict};
//! use qecsim::{ExecutionResult, QecResult, ShotOutcome};
//!
//! struct Fixed;
//!
//! impl Backend for Fixed {
//!     fn execute(&self, _request: &ExecutionRequest) -> QecResult<ExecutionResult> {
//!         Ok(ExecutionResult::new(vec![ShotOutcome::from((0, 1))]))
//!     }
//! }
//!
//! let mut out = Vec::new();
//! let verdict = runner::run(&Fixed, &mut out).unwrap();
//! assert_eq!(verdict, Verdict::Success);
//! ```

pub mod report;

use crate::core::{QecError, QecResult};
use crate::simulation::{ExecutionResult, ShotOutcome};
use std::fmt;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Qualified name of the bit-flip test operation.
pub const BIT_FLIP_TEST: &str = "QuantumErrorCorrection.TestBitFlipCode";

/// Shots requested per run.
pub const SHOTS: usize = 1;

/// Namespace-qualified name of an operation to invoke.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationRef(String);

impl OperationRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One invocation: which operation, how many shots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    operation: OperationRef,
    shots: usize,
}

impl ExecutionRequest {
    /// Fails with `QecError::InvalidShots` when `shots` is zero.
    pub fn new(operation: OperationRef, shots: usize) -> QecResult<Self> {
        if shots == 0 {
            return Err(QecError::InvalidShots(shots));
        }
        Ok(Self { operation, shots })
    }

    pub fn operation(&self) -> &OperationRef {
        &self.operation
    }

    pub fn shots(&self) -> usize {
        self.shots
    }
}

/// A simulation backend able to run named operations.
///
/// Implementations must return exactly `request.shots()` outcomes.
pub trait Backend {
    fn execute(&self, request: &ExecutionRequest) -> QecResult<ExecutionResult>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn execute(&self, request: &ExecutionRequest) -> QecResult<ExecutionResult> {
        (**self).execute(request)
    }
}

/// The pair returned by the bit-flip test operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFlipOutcome {
    /// Measurement of the decoded logical qubit.
    pub corrected_state: u64,
    /// First syndrome bit (parity of data qubits 0 and 1).
    pub syndrome_s1: u64,
}

impl BitFlipOutcome {
    /// Judges the run. Only `corrected_state` matters; the syndrome is informational.
    pub fn verdict(&self) -> Verdict {
        if self.corrected_state == 0 {
            Verdict::Success
        } else {
            Verdict::Failure { corrected_state: self.corrected_state }
        }
    }
}

impl TryFrom<&ShotOutcome> for BitFlipOutcome {
    type Error = QecError;

    fn try_from(outcome: &ShotOutcome) -> Result<Self, Self::Error> {
        match outcome.values() {
            [corrected_state, syndrome_s1] => Ok(Self {
                corrected_state: *corrected_state,
                syndrome_s1: *syndrome_s1,
            }),
            values => Err(QecError::UnexpectedArity { expected: 2, actual: values.len() }),
        }
    }
}

/// Outcome of the demonstration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure { corrected_state: u64 },
}

/// Runs the demonstration against an initialized backend and writes the report.
///
/// Execution errors (backend failure, empty or malformed result) are returned
/// as-is; nothing is retried or defaulted.
pub fn run<B: Backend, W: Write>(backend: &B, out: &mut W) -> QecResult<Verdict> {
    report::write_header(out)?;

    let request = ExecutionRequest::new(OperationRef::new(BIT_FLIP_TEST), SHOTS)?;
    debug!(operation = %request.operation(), shots = request.shots(), "requesting execution");
    let result = backend.execute(&request)?;

    let first = result.get(0).ok_or(QecError::EmptyResult)?;
    let outcome = BitFlipOutcome::try_from(first)?;
    debug!(?outcome, "unpacked result");

    report::write_results(out, &outcome)?;
    Ok(outcome.verdict())
}

/// Failure of the whole demonstration, split by phase.
#[derive(Debug, Error)]
pub enum DemoError {
    /// The backend could not be created; nothing was executed.
    #[error("backend initialization failed: {0}")]
    Initialization(#[source] QecError),

    /// The backend was created but the run failed.
    #[error("execution failed: {0}")]
    Execution(#[source] QecError),
}

impl DemoError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            DemoError::Initialization(_) => 1,
            DemoError::Execution(_) => 2,
        }
    }
}

/// Top-level entry: initialize, run once, report.
///
/// When `initialize` fails, a diagnostic is written to `out` and the backend
/// is never asked to execute anything.
pub fn run_demo<B, F, W>(initialize: F, out: &mut W) -> Result<Verdict, DemoError>
where
    B: Backend,
    F: FnOnce() -> QecResult<B>,
    W: Write,
{
    let backend = match initialize() {
        Ok(backend) => backend,
        Err(e) => {
            let message = match &e {
                QecError::BackendInitialization { path, .. } => report::missing_source_message(&display_name(path)),
                other => format!("Error: {}", other),
            };
            if let Err(write_err) = writeln!(out, "{}", message) {
                warn!(error = %write_err, "could not write initialization diagnostic");
            }
            return Err(DemoError::Initialization(e));
        }
    };

    run(&backend, out).map_err(DemoError::Execution)
}

/// Exit status for rejected command-line arguments.
///
/// Kept apart from the [`DemoError::exit_code`] statuses so a usage mistake
/// cannot be mistaken for a failed run.
pub const USAGE_EXIT_CODE: u8 = 64;

/// Maps the result of [`run_demo`] to a process exit status.
///
/// Execution failures are written to `err_out` as `Error: <cause>`.
/// Initialization failures were already reported by `run_demo` and only
/// contribute their status.
pub fn exit_status<W: Write>(outcome: &Result<Verdict, DemoError>, err_out: &mut W) -> u8 {
    match outcome {
        Ok(verdict) => {
            debug!(?verdict, "demonstration finished");
            0
        }
        Err(e) => {
            if let DemoError::Execution(cause) = e {
                if let Err(write_err) = writeln!(err_out, "Error: {}", cause) {
                    warn!(error = %write_err, "could not write execution error");
                }
            }
            debug!(error = %e, "demonstration aborted");
            e.exit_code()
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
