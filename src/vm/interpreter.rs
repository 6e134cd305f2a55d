// src/vm/interpreter.rs

//! The VM interpreter.

use super::program::{Instruction, Program};
use crate::core::{QecError, QecResult, QubitId};
use crate::simulation::SimulationEngine;
use crate::simulation::ShotOutcome;
use rand::Rng;
use std::collections::HashMap;
use tracing::trace;

/// Interprets [`Program`] instructions.
///
/// Quantum state lives in an internal [`SimulationEngine`]; classical state
/// is a map of named `u64` registers. Branches on measured registers allow
/// mid-circuit feedback such as syndrome-driven recovery.
///
/// # Examples
///
/// ```
/// # use qecsim::{Gate, Instruction, Operation, ProgramBuilder, QubitId, Vm};
/// # use rand::SeedableRng;
/// let program = ProgramBuilder::new()
///     .add(Instruction::QuantumOp(Operation::Gate { target: QubitId(0), gate: Gate::X }))
///     .add(Instruction::Measure { targets: vec![QubitId(0)] })
///     .add(Instruction::Record { qubit: QubitId(0), register: "m".to_string() })
///     .add(Instruction::Return(vec!["m".to_string()]))
///     .build()
///     .expect("valid program");
///
/// let mut vm = Vm::new(rand::rngs::StdRng::seed_from_u64(7));
/// let outcome = vm.run(&program).expect("run succeeds");
/// assert_eq!(outcome.values(), &[1]);
/// ```
#[derive(Debug)]
pub struct Vm<R> {
    rng: R,
    engine: Option<SimulationEngine>,
    classical_memory: HashMap<String, u64>,
    /// Outcomes of the most recent `Measure` instruction.
    last_measurement: HashMap<QubitId, u64>,
    program_counter: usize,
    is_halted: bool,
    step_limit: u64,
}

impl<R: Rng> Vm<R> {
    /// Executed-instruction budget for a single run.
    pub const DEFAULT_STEP_LIMIT: u64 = 10_000;

    /// Creates a VM that samples measurements from `rng`.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            engine: None,
            classical_memory: HashMap::new(),
            last_measurement: HashMap::new(),
            program_counter: 0,
            is_halted: false,
            step_limit: Self::DEFAULT_STEP_LIMIT,
        }
    }

    /// Overrides the executed-instruction budget.
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    fn reset(&mut self) {
        self.engine = None;
        self.classical_memory.clear();
        self.last_measurement.clear();
        self.program_counter = 0;
        self.is_halted = false;
    }

    /// Runs `program` until it returns, halts or fails.
    ///
    /// Returns the values named by the executed `Return` instruction, or an
    /// empty outcome if the program halted without one.
    pub fn run(&mut self, program: &Program) -> QecResult<ShotOutcome> {
        self.reset();

        if program.num_qubits() > 0 {
            self.engine = Some(SimulationEngine::init(program.num_qubits())?);
        }

        let mut outcome = ShotOutcome::default();
        let mut executed: u64 = 0;

        while !self.is_halted {
            if self.program_counter >= program.instruction_count() {
                self.is_halted = true;
                break;
            }
            if executed >= self.step_limit {
                return Err(QecError::Simulation(format!(
                    "execution exceeded the limit of {} instructions",
                    self.step_limit
                )));
            }
            executed += 1;

            let pc = self.program_counter;
            let instruction = program.get_instruction(pc).ok_or_else(|| {
                QecError::Simulation(format!(
                    "program counter {} out of bounds (0..{})",
                    pc,
                    program.instruction_count()
                ))
            })?;
            trace!(pc, ?instruction, "execute");

            // Advance before executing so jumps simply overwrite the PC.
            self.program_counter += 1;

            match instruction {
                Instruction::QuantumOp(op) => {
                    let engine = self.engine.as_mut().ok_or_else(no_engine)?;
                    engine.apply_operation(op, &mut self.rng)?;
                }
                Instruction::Measure { targets } => {
                    if targets.is_empty() {
                        continue;
                    }
                    let engine = self.engine.as_mut().ok_or_else(no_engine)?;
                    self.last_measurement = engine.measure(targets, &mut self.rng)?.into_iter().collect();
                }
                Instruction::Record { qubit, register } => {
                    let value = self.last_measurement.get(qubit).copied().ok_or_else(|| {
                        QecError::InvalidOperation(format!(
                            "cannot record {}: it was not part of the last measurement",
                            qubit
                        ))
                    })?;
                    self.classical_memory.insert(register.clone(), value);
                }
                Instruction::Label(_) | Instruction::NoOp => {}
                Instruction::Jump(label) => {
                    self.program_counter = Self::label_target(program, label)?;
                }
                Instruction::BranchIfZero { register, label } => {
                    if self.read(register) == 0 {
                        self.program_counter = Self::label_target(program, label)?;
                    }
                }
                Instruction::LoadImmediate { register, value } => {
                    self.classical_memory.insert(register.clone(), *value);
                }
                Instruction::Copy { source_reg, dest_reg } => {
                    let value = self.read(source_reg);
                    self.classical_memory.insert(dest_reg.clone(), value);
                }
                Instruction::And { r_dest, r_src1, r_src2 } => {
                    let value = self.read(r_src1) & self.read(r_src2);
                    self.classical_memory.insert(r_dest.clone(), value);
                }
                Instruction::Or { r_dest, r_src1, r_src2 } => {
                    let value = self.read(r_src1) | self.read(r_src2);
                    self.classical_memory.insert(r_dest.clone(), value);
                }
                Instruction::Xor { r_dest, r_src1, r_src2 } => {
                    let value = self.read(r_src1) ^ self.read(r_src2);
                    self.classical_memory.insert(r_dest.clone(), value);
                }
                Instruction::Not { r_dest, r_src } => {
                    let value = u64::from(self.read(r_src) == 0);
                    self.classical_memory.insert(r_dest.clone(), value);
                }
                Instruction::Return(registers) => {
                    outcome = ShotOutcome::new(registers.iter().map(|r| self.read(r)).collect());
                    self.is_halted = true;
                }
                Instruction::Halt => {
                    self.is_halted = true;
                }
            }
        }

        trace!(%outcome, executed, "halted");
        Ok(outcome)
    }

    fn label_target(program: &Program, label: &str) -> QecResult<usize> {
        program
            .get_label_pc(label)
            .ok_or_else(|| QecError::Simulation(format!("jump target label '{}' not found", label)))
    }

    fn read(&self, register: &str) -> u64 {
        self.classical_memory.get(register).copied().unwrap_or(0)
    }

    /// Value of a classical register after a run; unset registers read as 0.
    pub fn get_classical_register(&self, name: &str) -> u64 {
        self.read(name)
    }

    /// Snapshot of all classical registers.
    pub fn get_classical_memory(&self) -> HashMap<String, u64> {
        self.classical_memory.clone()
    }

    /// Final quantum state of the last run, if the program used any qubits.
    pub fn final_state(&self) -> Option<&crate::StateVector> {
        self.engine.as_ref().map(|e| e.state())
    }
}

fn no_engine() -> QecError {
    QecError::InvalidOperation("program declares no qubits".to_string())
}
