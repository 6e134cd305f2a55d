// src/vm/program.rs

use crate::core::{QecError, QecResult, QubitId};
use crate::operations::Operation;
use std::collections::HashMap;
use std::fmt;

// --- Instruction Set Definition ---

/// A single instruction executable by the [`Vm`](super::Vm).
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // --- Quantum Operations ---
    /// Apply a gate, controlled gate or reset.
    QuantumOp(Operation),

    // --- Measurement & Classical Recording ---
    /// Measure the target qubits. Outcomes are held until read by `Record`.
    Measure {
        /// Qubits to measure.
        targets: Vec<QubitId>,
    },
    /// Copy the outcome of `qubit` from the most recent `Measure` into `register`.
    ///
    /// # Errors
    /// Fails with `QecError::InvalidOperation` if `qubit` was not part of the
    /// most recent measurement.
    Record {
        /// Measured qubit to read.
        qubit: QubitId,
        /// Destination register.
        register: String,
    },

    // --- Control Flow ---
    /// Marks a jump target. Consumed by [`ProgramBuilder`], never executed.
    Label(String),
    /// Continue execution at `label`.
    Jump(String),
    /// Continue execution at `label` if `register` holds zero (unset registers
    /// read as zero).
    BranchIfZero {
        /// Register to test.
        register: String,
        /// Target label.
        label: String,
    },

    // --- Classical Operations ---
    /// Load an immediate value into a register.
    LoadImmediate {
        /// The destination register name.
        register: String,
        /// The `u64` value to load.
        value: u64,
    },
    /// Copy one register into another.
    Copy {
        /// The name of the register to read from.
        source_reg: String,
        /// The name of the register to write to.
        dest_reg: String,
    },
    /// Bitwise AND of two registers.
    And {
        /// The destination register name.
        r_dest: String,
        /// The first source register name.
        r_src1: String,
        /// The second source register name.
        r_src2: String,
    },
    /// Bitwise OR of two registers.
    Or {
        /// The destination register name.
        r_dest: String,
        /// The first source register name.
        r_src1: String,
        /// The second source register name.
        r_src2: String,
    },
    /// Bitwise XOR of two registers.
    Xor {
        /// The destination register name.
        r_dest: String,
        /// The first source register name.
        r_src1: String,
        /// The second source register name.
        r_src2: String,
    },
    /// Logical NOT: `r_dest = 1` if `r_src == 0`, else `0`.
    Not {
        /// The destination register name.
        r_dest: String,
        /// The source register name.
        r_src: String,
    },

    // --- Execution Control ---
    /// Halt and yield the listed registers, in order, as the shot outcome.
    Return(Vec<String>),
    /// Halt without a return value.
    Halt,
    /// No operation.
    NoOp,
}

// --- Program Structure ---

/// A complete VM program: instructions plus resolved label positions.
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) instructions: Vec<Instruction>,
    /// Label name to instruction index.
    pub(crate) label_map: HashMap<String, usize>,
    pub(crate) num_qubits: usize,
}

impl Program {
    pub(crate) fn get_instruction(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    pub(crate) fn get_label_pc(&self, label: &str) -> Option<usize> {
        self.label_map.get(label).copied()
    }

    /// Total number of executable instructions.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Number of qubits the program's register needs.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The executable instructions in order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "VM Program ({} instructions, {} qubits)",
            self.instruction_count(),
            self.num_qubits
        )?;
        let mut pc_to_labels: HashMap<usize, Vec<&String>> = HashMap::new();
        for (label, pc) in &self.label_map {
            pc_to_labels.entry(*pc).or_default().push(label);
        }

        for (pc, instruction) in self.instructions.iter().enumerate() {
            if let Some(labels) = pc_to_labels.get_mut(&pc) {
                labels.sort();
                for label in labels.iter() {
                    writeln!(f, "{}:", label)?;
                }
            }
            writeln!(f, "  {:04}: {:?}", pc, instruction)?;
        }
        Ok(())
    }
}

// --- Program Builder ---

/// Builds [`Program`] instances with a fluent API and resolves labels.
///
/// # Examples
/// ```
/// # use qecsim::vm::{Instruction, ProgramBuilder};
/// let program = ProgramBuilder::new()
///     .add(Instruction::LoadImmediate { register: "r0".to_string(), value: 0 })
///     .add(Instruction::BranchIfZero { register: "r0".to_string(), label: "end".to_string() })
///     .add(Instruction::LoadImmediate { register: "r0".to_string(), value: 7 })
///     .add(Instruction::Label("end".to_string()))
///     .add(Instruction::Halt)
///     .build()
///     .expect("labels resolve");
/// assert_eq!(program.instruction_count(), 4);
/// ```
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    label_map: HashMap<String, usize>,
    duplicate_labels: Vec<String>,
    declared_qubits: usize,
}

impl ProgramBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a register of at least `count` qubits, even if some are never touched.
    pub fn with_qubits(mut self, count: usize) -> Self {
        self.declared_qubits = self.declared_qubits.max(count);
        self
    }

    /// Appends an instruction. Labels are recorded at the current position and
    /// do not occupy an instruction slot.
    pub fn add(mut self, instruction: Instruction) -> Self {
        self.push(instruction);
        self
    }

    /// Appends multiple instructions from an iterator.
    pub fn add_many<I>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = Instruction>,
    {
        for instruction in instructions {
            self.push(instruction);
        }
        self
    }

    /// Non-consuming form of [`ProgramBuilder::add`], used by the source compiler.
    pub(crate) fn push(&mut self, instruction: Instruction) {
        if let Instruction::Label(name) = instruction {
            let pc = self.instructions.len();
            if self.label_map.insert(name.clone(), pc).is_some() && !self.duplicate_labels.contains(&name) {
                self.duplicate_labels.push(name);
            }
        } else {
            self.instructions.push(instruction);
        }
    }

    /// Builds the program.
    ///
    /// Fails with `QecError::Program` if a jump or branch names an undefined
    /// label, or if a label was defined more than once.
    pub fn build(self) -> QecResult<Program> {
        if !self.duplicate_labels.is_empty() {
            return Err(QecError::Program(format!(
                "duplicate labels: {:?}",
                self.duplicate_labels
            )));
        }

        let mut undefined_labels: Vec<String> = Vec::new();
        let mut max_qubit: Option<u64> = None;
        for instruction in &self.instructions {
            match instruction {
                Instruction::Jump(label) | Instruction::BranchIfZero { label, .. } => {
                    if !self.label_map.contains_key(label) && !undefined_labels.contains(label) {
                        undefined_labels.push(label.clone());
                    }
                }
                Instruction::QuantumOp(op) => {
                    for q in op.involved_qubits() {
                        max_qubit = max_qubit.max(Some(q.0));
                    }
                }
                Instruction::Measure { targets } => {
                    for q in targets {
                        max_qubit = max_qubit.max(Some(q.0));
                    }
                }
                Instruction::Record { qubit, .. } => {
                    max_qubit = max_qubit.max(Some(qubit.0));
                }
                _ => {}
            }
        }

        if !undefined_labels.is_empty() {
            return Err(QecError::Program(format!(
                "undefined labels: {:?}",
                undefined_labels
            )));
        }

        let used_qubits = max_qubit.map_or(0, |q| usize::try_from(q).unwrap_or(usize::MAX).saturating_add(1));
        Ok(Program {
            instructions: self.instructions,
            label_map: self.label_map,
            num_qubits: self.declared_qubits.max(used_qubits),
        })
    }
}
