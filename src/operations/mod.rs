// src/operations/mod.rs

//! Quantum operations understood by the simulation engine.
//!
//! Single-qubit gates are named by [`Gate`]; an [`Operation`] applies one to a
//! target, optionally conditioned on a control qubit, or measures/resets qubits.

use crate::core::QubitId;
use num_complex::Complex;
use num_traits::{One, Zero};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

/// 2x2 unitary acting on a single qubit.
pub type Matrix2 = [[Complex<f64>; 2]; 2];

/// Single-qubit gates available to operation sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Identity.
    I,
    /// Bit flip.
    X,
    /// Combined bit and phase flip.
    Y,
    /// Phase flip.
    Z,
    /// Hadamard.
    H,
    /// Phase (PI/2).
    S,
    /// Inverse phase (-PI/2).
    Sdg,
    /// Phase (PI/4).
    T,
    /// Inverse phase (-PI/4).
    Tdg,
}

impl Gate {
    /// Looks a gate up by its lowercase source mnemonic.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        match name {
            "i" | "id" => Some(Gate::I),
            "x" => Some(Gate::X),
            "y" => Some(Gate::Y),
            "z" => Some(Gate::Z),
            "h" => Some(Gate::H),
            "s" => Some(Gate::S),
            "sdg" => Some(Gate::Sdg),
            "t" => Some(Gate::T),
            "tdg" => Some(Gate::Tdg),
            _ => None,
        }
    }

    /// Lowercase source mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Gate::I => "i",
            Gate::X => "x",
            Gate::Y => "y",
            Gate::Z => "z",
            Gate::H => "h",
            Gate::S => "s",
            Gate::Sdg => "sdg",
            Gate::T => "t",
            Gate::Tdg => "tdg",
        }
    }

    /// The gate's unitary in the `{|0>, |1>}` basis.
    pub fn matrix(&self) -> Matrix2 {
        let one = Complex::one();
        let zero = Complex::zero();
        let i = Complex::i();
        let h = Complex::new(FRAC_1_SQRT_2, 0.0);
        match self {
            Gate::I => [[one, zero], [zero, one]],
            Gate::X => [[zero, one], [one, zero]],
            Gate::Y => [[zero, -i], [i, zero]],
            Gate::Z => [[one, zero], [zero, -one]],
            Gate::H => [[h, h], [h, -h]],
            Gate::S => [[one, zero], [zero, i]],
            Gate::Sdg => [[one, zero], [zero, -i]],
            Gate::T => [[one, zero], [zero, Complex::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2)]],
            Gate::Tdg => [[one, zero], [zero, Complex::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)]],
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// An operation on the quantum register.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Apply `gate` to `target`.
    Gate {
        /// Qubit the gate acts on.
        target: QubitId,
        /// Gate to apply.
        gate: Gate,
    },

    /// Apply `gate` to `target` when `control` is `|1>` (CNOT for `Gate::X`).
    Controlled {
        /// Qubit whose `|1>` component triggers the gate.
        control: QubitId,
        /// Qubit the gate acts on.
        target: QubitId,
        /// Gate to apply.
        gate: Gate,
    },

    /// Measure `targets` in the computational basis.
    Measure {
        /// Qubits to measure, in outcome order.
        targets: Vec<QubitId>,
    },

    /// Measure `target` and flip it back to `|0>` if needed.
    Reset {
        /// Qubit to return to `|0>`.
        target: QubitId,
    },
}

impl Operation {
    /// Returns every qubit mentioned in the operation's parameters.
    pub fn involved_qubits(&self) -> Vec<QubitId> {
        match self {
            Operation::Gate { target, .. } => vec![*target],
            Operation::Controlled { control, target, .. } => vec![*control, *target],
            Operation::Measure { targets } => targets.clone(),
            Operation::Reset { target } => vec![*target],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Gate { target, gate } => write!(f, "{} {}", gate, target),
            Operation::Controlled { control, target, gate } => {
                write!(f, "c{} {}, {}", gate, control, target)
            }
            Operation::Measure { targets } => {
                write!(f, "measure")?;
                for (i, t) in targets.iter().enumerate() {
                    write!(f, "{}{}", if i > 0 { ", " } else { " " }, t)?;
                }
                Ok(())
            }
            Operation::Reset { target } => write!(f, "reset {}", target),
        }
    }
}
