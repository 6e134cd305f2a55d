use crate::core::{QecError, QecResult, QubitId, StateVector};
use crate::operations::{Gate, Matrix2, Operation};
use num_complex::Complex;
use num_traits::Zero;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

/// Largest register the dense engine accepts (2^24 amplitudes).
pub const MAX_QUBITS: usize = 24;

/// Amplitudes below this squared magnitude are treated as zero.
const PROBABILITY_TOLERANCE: f64 = 1e-12;

/// Dense state-vector engine evolving an `n`-qubit register.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    /// Maps qubit ids to their position (0..n-1) in the register.
    qubit_indices: HashMap<QubitId, usize>,
    state: StateVector,
    num_qubits: usize,
}

impl SimulationEngine {
    /// Initializes `num_qubits` qubits, ids `0..num_qubits`, in `|0...0>`.
    pub fn init(num_qubits: usize) -> QecResult<Self> {
        check_register_size(num_qubits)?;
        let ids = (0..num_qubits as u64).map(QubitId);
        Self::init_with_ids(ids)
    }

    /// Initializes the engine for an explicit set of qubit ids.
    ///
    /// Ids are sorted so index assignment does not depend on iteration order.
    /// Collection stops as soon as more than [`MAX_QUBITS`] distinct ids are seen.
    pub fn init_with_ids<I>(ids: I) -> QecResult<Self>
    where
        I: IntoIterator<Item = QubitId>,
    {
        let mut distinct = BTreeSet::new();
        for id in ids {
            distinct.insert(id);
            if distinct.len() > MAX_QUBITS {
                return Err(QecError::Simulation(format!(
                    "register exceeds the engine limit of {} qubits",
                    MAX_QUBITS
                )));
            }
        }

        let num_qubits = distinct.len();
        check_register_size(num_qubits)?;

        let dim = 1usize << num_qubits;
        let mut amplitudes = vec![Complex::zero(); dim];
        amplitudes[0] = Complex::new(1.0, 0.0);

        let qubit_indices = distinct.into_iter().enumerate().map(|(i, id)| (id, i)).collect();

        Ok(Self {
            qubit_indices,
            state: StateVector::new(amplitudes),
            num_qubits,
        })
    }

    /// Current state of the register.
    pub fn state(&self) -> &StateVector {
        &self.state
    }

    /// Number of simulated qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    #[cfg(test)]
    pub(crate) fn set_state(&mut self, state: StateVector) -> QecResult<()> {
        if state.dim() != self.state.dim() {
            return Err(QecError::Simulation(format!(
                "cannot set state: dimension {} does not match engine dimension {}",
                state.dim(),
                self.state.dim()
            )));
        }
        self.state = state;
        Ok(())
    }

    /// Applies a unitary operation, or a reset, to the register.
    ///
    /// `Operation::Measure` must go through [`SimulationEngine::measure`] because
    /// it produces classical outcomes.
    pub fn apply_operation<R: Rng>(&mut self, op: &Operation, rng: &mut R) -> QecResult<()> {
        match op {
            Operation::Gate { target, gate } => {
                let bit = self.bit_of(target)?;
                self.apply_single_qubit_gate(bit, &gate.matrix());
            }
            Operation::Controlled { control, target, gate } => {
                if control == target {
                    return Err(QecError::InvalidOperation(format!(
                        "control and target are both {} in controlled {}",
                        control, gate
                    )));
                }
                let control_bit = self.bit_of(control)?;
                let target_bit = self.bit_of(target)?;
                self.apply_controlled_gate(control_bit, target_bit, &gate.matrix());
            }
            Operation::Reset { target } => {
                let outcome = self.measure(&[*target], rng)?;
                if outcome.first().is_some_and(|(_, bit)| *bit == 1) {
                    let bit = self.bit_of(target)?;
                    self.apply_single_qubit_gate(bit, &Gate::X.matrix());
                }
            }
            Operation::Measure { .. } => {
                return Err(QecError::InvalidOperation(
                    "measure must not be passed to apply_operation".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Measures each target in the computational basis.
    ///
    /// Targets are sampled one after another with the Born rule; the state is
    /// collapsed and renormalized after each outcome. Returns `(qubit, bit)`
    /// pairs in target order.
    pub fn measure<R: Rng>(&mut self, targets: &[QubitId], rng: &mut R) -> QecResult<Vec<(QubitId, u64)>> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let bit = self.bit_of(target)?;
            let mask = 1usize << bit;

            let p_one: f64 = self
                .state
                .vector()
                .iter()
                .enumerate()
                .filter(|(idx, _)| idx & mask != 0)
                .map(|(_, c)| c.norm_sqr())
                .sum();

            let outcome = if p_one <= PROBABILITY_TOLERANCE {
                0
            } else if p_one >= 1.0 - PROBABILITY_TOLERANCE {
                1
            } else if rng.r#gen::<f64>() < p_one {
                1
            } else {
                0
            };
            let p_outcome = if outcome == 1 { p_one } else { 1.0 - p_one };
            self.collapse(mask, outcome, p_outcome)?;

            trace!(qubit = %target, outcome, p_one, "measured");
            outcomes.push((*target, outcome));
        }
        Ok(outcomes)
    }

    /// Zeroes every amplitude inconsistent with `outcome` and renormalizes.
    fn collapse(&mut self, mask: usize, outcome: u64, p_outcome: f64) -> QecResult<()> {
        if p_outcome <= 0.0 || !p_outcome.is_finite() {
            return Err(QecError::Simulation(format!(
                "cannot collapse onto an outcome with probability {}",
                p_outcome
            )));
        }
        let scale = 1.0 / p_outcome.sqrt();
        for (idx, amp) in self.state.vector_mut().iter_mut().enumerate() {
            let bit_set = idx & mask != 0;
            if bit_set == (outcome == 1) {
                *amp *= scale;
            } else {
                *amp = Complex::zero();
            }
        }
        Ok(())
    }

    /// Bit position (from the right) of a qubit in the basis index.
    fn bit_of(&self, qubit: &QubitId) -> QecResult<usize> {
        self.qubit_indices
            .get(qubit)
            .map(|idx| self.num_qubits - 1 - idx)
            .ok_or(QecError::UnknownQubit(*qubit))
    }

    fn apply_single_qubit_gate(&mut self, bit: usize, matrix: &Matrix2) {
        let mask = 1usize << bit;
        let amplitudes = self.state.vector_mut();
        for i0 in 0..amplitudes.len() {
            if i0 & mask != 0 {
                continue;
            }
            let i1 = i0 | mask;
            let psi_0 = amplitudes[i0];
            let psi_1 = amplitudes[i1];
            amplitudes[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            amplitudes[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }
    }

    /// Applies `matrix` to the target bit on the subspace where the control bit is 1.
    fn apply_controlled_gate(&mut self, control_bit: usize, target_bit: usize, matrix: &Matrix2) {
        let control_mask = 1usize << control_bit;
        let target_mask = 1usize << target_bit;
        let amplitudes = self.state.vector_mut();
        for i0 in 0..amplitudes.len() {
            if i0 & control_mask == 0 || i0 & target_mask != 0 {
                continue;
            }
            let i1 = i0 | target_mask;
            let psi_0 = amplitudes[i0];
            let psi_1 = amplitudes[i1];
            amplitudes[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            amplitudes[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }
    }
}

fn check_register_size(num_qubits: usize) -> QecResult<()> {
    if num_qubits == 0 {
        return Err(QecError::InvalidOperation(
            "cannot initialize simulation engine with zero qubits".to_string(),
        ));
    }
    if num_qubits > MAX_QUBITS {
        return Err(QecError::Simulation(format!(
            "{} qubits exceed the engine limit of {}",
            num_qubits, MAX_QUBITS
        )));
    }
    Ok(())
}
