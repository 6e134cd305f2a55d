// src/lib.rs

//! `qecsim` - a bit-flip repetition code demonstration
//!
//! Operations are written in `.qec` source files, compiled into VM programs
//! and executed on a dense state-vector simulator. The [`runner`] module
//! drives the fixed bit-flip test and prints a pass/fail report.

pub mod core;
pub mod operations;
pub mod runner;
pub mod simulation;
pub mod source;
pub mod vm;

// Re-export the most common types for easier top-level use
pub use crate::core::{QecError, QecResult, QubitId, StateVector};
pub use operations::{Gate, Operation};
pub use runner::{Backend, BitFlipOutcome, DemoError, ExecutionRequest, OperationRef, Verdict};
pub use simulation::{ExecutionResult, ShotOutcome, SimulationEngine, Simulator, SimulatorConfig};
pub use source::OperationLibrary;
pub use vm::{Instruction, Program, ProgramBuilder, Vm};

/// Compiling and running an operation from source text.
/// ```
/// use qecsim::{OperationLibrary, Vm};
/// use rand::SeedableRng;
///
/// let library = OperationLibrary::parse_str(r#"
///     namespace Demo {
///         operation FlipAndMeasure() {
///             qubit q[1];
///             x q[0];
///             measure q[0] -> m;
///             return (m);
///         }
///     }
/// "#).unwrap();
///
/// let program = library.get("Demo.FlipAndMeasure").unwrap();
/// let mut vm = Vm::new(rand::rngs::StdRng::seed_from_u64(1));
/// assert_eq!(vm.run(program).unwrap().values(), &[1]);
/// ```
#[doc(hidden)]
const _: () = ();
