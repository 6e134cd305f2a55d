// src/simulation/mod.rs

//! Executes compiled operations on a dense state-vector engine.
//!
//! [`Simulator`] is the backend handle: it is created by loading an
//! operation-definition source and then runs named operations for a requested
//! number of shots. [`SimulationEngine`] holds and evolves the quantum state.

pub(crate) mod engine;
mod results;

pub use engine::{MAX_QUBITS, SimulationEngine};
pub use results::{ExecutionResult, ShotOutcome};

use crate::core::{QecError, QecResult};
use crate::runner::{Backend, ExecutionRequest};
use crate::source::OperationLibrary;
use crate::vm::Vm;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File the simulator loads when no source path is configured.
pub const DEFAULT_SOURCE_FILE: &str = "qec_codes.qec";

/// Settings for [`Simulator::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Operation-definition source to load.
    pub source_path: PathBuf,
    /// Seed for measurement sampling; OS entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_FILE),
            seed: None,
        }
    }
}

/// Backend handle over a loaded [`OperationLibrary`].
#[derive(Debug)]
pub struct Simulator {
    config: SimulatorConfig,
    library: OperationLibrary,
}

impl Simulator {
    /// Loads the configured source and returns a ready handle.
    ///
    /// # Errors
    /// `QecError::BackendInitialization` if the source cannot be read, or
    /// `QecError::Parse` if it is malformed.
    pub fn initialize(config: SimulatorConfig) -> QecResult<Self> {
        let library = OperationLibrary::load(&config.source_path)?;
        info!(
            source = %config.source_path.display(),
            operations = library.len(),
            "simulator initialized"
        );
        Ok(Self { config, library })
    }

    /// Re-reads the source file. On failure the previously loaded operations stay active.
    pub fn reload(&mut self) -> QecResult<()> {
        match OperationLibrary::load(&self.config.source_path) {
            Ok(library) => {
                info!(operations = library.len(), "operation source reloaded");
                self.library = library;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "reload failed, keeping previous operations");
                Err(e)
            }
        }
    }

    /// Operations currently loaded.
    pub fn library(&self) -> &OperationLibrary {
        &self.library
    }

    /// Path of the loaded source.
    pub fn source_path(&self) -> &Path {
        &self.config.source_path
    }

    /// Runs `operation` once per shot and collects the returned values.
    ///
    /// Every shot starts from a fresh `|0...0>` register. The result holds
    /// exactly `shots` outcomes.
    pub fn execute(&self, operation: &str, shots: usize) -> QecResult<ExecutionResult> {
        if shots == 0 {
            return Err(QecError::InvalidShots(shots));
        }
        let program = self
            .library
            .get(operation)
            .ok_or_else(|| QecError::OperationNotFound(operation.to_string()))?;

        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(operation, shots, qubits = program.num_qubits(), "executing");

        let mut vm = Vm::new(rng);
        let mut outcomes = Vec::with_capacity(shots);
        for shot in 0..shots {
            let outcome = vm.run(program)?;
            debug!(shot, %outcome, "shot complete");
            outcomes.push(outcome);
        }
        Ok(ExecutionResult::new(outcomes))
    }
}

impl Backend for Simulator {
    fn execute(&self, request: &ExecutionRequest) -> QecResult<ExecutionResult> {
        Simulator::execute(self, request.operation().as_str(), request.shots())
    }
}
