// src/simulation/engine.rs

//! Reference state-vector simulator.
//!
//! Amplitudes are stored little-endian: qubit `q` is bit `q` of the basis
//! index. Qubits are allocated on first reference, so allocating qubit `n`
//! only extends the vector with zero amplitudes for the new `|1>` half.

use super::Simulator;
use super::SeedableSimulator;
use crate::core::{EngineError, EngineResult, MAX_QUBITS};
use num_complex::Complex;
use num_traits::{One, Zero};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::FRAC_1_SQRT_2;
use tracing::trace;

type Matrix2 = [[Complex<f64>; 2]; 2];

/// Probabilities below this are treated as impossible outcomes.
const AMPLITUDE_TOLERANCE: f64 = 1e-12;

/// One parsed instruction of the simulator's line notation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Instruction {
    /// Single-qubit unitary applied to each target.
    Gate1 { name: String, targets: Vec<usize> },
    /// Two-qubit gate applied to consecutive target pairs.
    Gate2 { name: String, pairs: Vec<(usize, usize)> },
    /// Z-basis measurement.
    Measure(Vec<usize>),
    /// X-basis measurement.
    MeasureX(Vec<usize>),
    /// Z-basis measurement followed by reset to `|0>`.
    MeasureReset(Vec<usize>),
    /// Reset to `|0>` without recording an outcome.
    Reset(Vec<usize>),
    /// Layer separator; no effect on the state.
    Tick,
}

impl Instruction {
    fn max_target(&self) -> Option<usize> {
        match self {
            Instruction::Gate1 { targets, .. }
            | Instruction::Measure(targets)
            | Instruction::MeasureX(targets)
            | Instruction::MeasureReset(targets)
            | Instruction::Reset(targets) => targets.iter().copied().max(),
            Instruction::Gate2 { pairs, .. } => pairs.iter().map(|(a, b)| *a.max(b)).max(),
            Instruction::Tick => None,
        }
    }
}

/// Parses instruction text: one instruction per line or `;`-separated,
/// `#` starts a comment, gate names are case-insensitive.
fn parse_instructions(text: &str) -> EngineResult<Vec<Instruction>> {
    let mut parsed = Vec::new();
    for raw in text.split(['\n', ';']) {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let name = match tokens.next() {
            Some(name) => name.to_ascii_uppercase(),
            None => continue,
        };
        let targets = tokens
            .map(|token| {
                token.parse::<usize>().map_err(|_| {
                    EngineError::simulator(format!("invalid qubit target '{}' in '{}'", token, line))
                })
            })
            .collect::<EngineResult<Vec<usize>>>()?;
        if let Some(&qubit) = targets.iter().find(|&&q| q >= MAX_QUBITS) {
            return Err(EngineError::simulator(format!(
                "qubit {} exceeds simulator capacity of {} qubits",
                qubit, MAX_QUBITS
            )));
        }

        if name == "TICK" {
            parsed.push(Instruction::Tick);
            continue;
        }
        if targets.is_empty() {
            return Err(EngineError::simulator(format!("instruction '{}' has no targets", line)));
        }
        let instruction = match name.as_str() {
            "M" | "MZ" => Instruction::Measure(targets),
            "MX" => Instruction::MeasureX(targets),
            "MR" | "MRZ" => Instruction::MeasureReset(targets),
            "R" | "RZ" => Instruction::Reset(targets),
            "CX" | "CNOT" | "CY" | "CZ" | "SWAP" => {
                if targets.len() % 2 != 0 {
                    return Err(EngineError::simulator(format!(
                        "two-qubit gate '{}' needs an even number of targets, got {}",
                        name,
                        targets.len()
                    )));
                }
                let pairs: Vec<(usize, usize)> = targets.chunks(2).map(|p| (p[0], p[1])).collect();
                if let Some((a, _)) = pairs.iter().find(|(a, b)| a == b) {
                    return Err(EngineError::simulator(format!(
                        "two-qubit gate '{}' applied to qubit {} twice",
                        name, a
                    )));
                }
                Instruction::Gate2 { name, pairs }
            }
            _ => {
                // Validate now so a bad gate name fails before any qubit is touched.
                gate_matrix(&name)?;
                Instruction::Gate1 { name, targets }
            }
        };
        parsed.push(instruction);
    }
    Ok(parsed)
}

/// 2x2 matrix for a named single-qubit gate.
fn gate_matrix(name: &str) -> EngineResult<Matrix2> {
    let one = Complex::one();
    let zero = Complex::zero();
    let i = Complex::i();
    let h = Complex::new(FRAC_1_SQRT_2, 0.0);
    let half_p = Complex::new(0.5, 0.5);
    let half_m = Complex::new(0.5, -0.5);
    match name {
        "I" => Ok([[one, zero], [zero, one]]),
        "X" => Ok([[zero, one], [one, zero]]),
        "Y" => Ok([[zero, -i], [i, zero]]),
        "Z" => Ok([[one, zero], [zero, -one]]),
        "H" => Ok([[h, h], [h, -h]]),
        "S" | "SQRT_Z" => Ok([[one, zero], [zero, i]]),
        "S_DAG" | "SQRT_Z_DAG" => Ok([[one, zero], [zero, -i]]),
        "SQRT_X" => Ok([[half_p, half_m], [half_m, half_p]]),
        "SQRT_X_DAG" => Ok([[half_m, half_p], [half_p, half_m]]),
        _ => Err(EngineError::simulator(format!("gate '{}' is not supported", name))),
    }
}

/// Seeded state-vector simulator implementing the [`Simulator`] capability.
///
/// The quantum state persists across [`Simulator::apply`] calls for the
/// lifetime of the instance and is never implicitly reset.
#[derive(Debug, Clone)]
pub struct StateVectorSimulator {
    /// Amplitudes over `2^num_qubits` basis states.
    state: Vec<Complex<f64>>,
    /// Number of allocated qubits.
    num_qubits: usize,
    /// Source of measurement randomness.
    rng: StdRng,
}

impl StateVectorSimulator {
    /// Creates a simulator with no qubits allocated, in the empty `|>` = 1 state.
    pub fn new(seed: u64) -> Self {
        Self {
            state: vec![Complex::one()],
            num_qubits: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of qubits allocated so far.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Read-only view of the amplitudes.
    pub fn amplitudes(&self) -> &[Complex<f64>] {
        &self.state
    }

    /// Probability that measuring `qubit` in the Z basis yields `1`.
    pub fn probability_of_one(&self, qubit: usize) -> f64 {
        if qubit >= self.num_qubits {
            return 0.0;
        }
        let mask = 1usize << qubit;
        self.state
            .iter()
            .enumerate()
            .filter(|(k, _)| k & mask != 0)
            .map(|(_, amp)| amp.norm_sqr())
            .sum()
    }

    /// Grows the register so that `qubit` is addressable.
    fn ensure_qubit(&mut self, qubit: usize) -> EngineResult<()> {
        if qubit < self.num_qubits {
            return Ok(());
        }
        if qubit >= MAX_QUBITS {
            return Err(EngineError::simulator(format!(
                "qubit {} exceeds simulator capacity of {} qubits",
                qubit, MAX_QUBITS
            )));
        }
        let needed = qubit + 1;
        self.state.resize(1usize << needed, Complex::zero());
        trace!(from = self.num_qubits, to = needed, "allocated qubits");
        self.num_qubits = needed;
        Ok(())
    }

    fn apply_single_qubit_gate(&mut self, target: usize, matrix: &Matrix2) {
        let mask = 1usize << target;
        for i0 in 0..self.state.len() {
            if i0 & mask != 0 {
                continue;
            }
            let i1 = i0 | mask;
            let (psi_0, psi_1) = (self.state[i0], self.state[i1]);
            self.state[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            self.state[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }
    }

    /// Applies `matrix` to `target` on the subspace where `control` is `|1>`.
    fn apply_controlled_gate(&mut self, control: usize, target: usize, matrix: &Matrix2) {
        let c_mask = 1usize << control;
        let t_mask = 1usize << target;
        for i0 in 0..self.state.len() {
            if i0 & c_mask == 0 || i0 & t_mask != 0 {
                continue;
            }
            let i1 = i0 | t_mask;
            let (psi_0, psi_1) = (self.state[i0], self.state[i1]);
            self.state[i0] = matrix[0][0] * psi_0 + matrix[0][1] * psi_1;
            self.state[i1] = matrix[1][0] * psi_0 + matrix[1][1] * psi_1;
        }
    }

    fn apply_swap(&mut self, a: usize, b: usize) {
        let (a_mask, b_mask) = (1usize << a, 1usize << b);
        for k in 0..self.state.len() {
            // Visit each |..1_a..0_b..> once and swap it with |..0_a..1_b..>.
            if k & a_mask != 0 && k & b_mask == 0 {
                self.state.swap(k, (k & !a_mask) | b_mask);
            }
        }
    }

    /// Measures `qubit` in the Z basis, collapsing and renormalizing the state.
    fn measure(&mut self, qubit: usize) -> bool {
        let p1 = self.probability_of_one(qubit);
        let mut outcome = self.rng.random::<f64>() < p1;
        let mut p = if outcome { p1 } else { 1.0 - p1 };
        if p < AMPLITUDE_TOLERANCE {
            // Rounding picked an outcome with no support; take the other one.
            outcome = !outcome;
            p = 1.0 - p;
        }
        let mask = 1usize << qubit;
        let norm = 1.0 / p.sqrt();
        for (k, amp) in self.state.iter_mut().enumerate() {
            if (k & mask != 0) == outcome {
                *amp *= norm;
            } else {
                *amp = Complex::zero();
            }
        }
        outcome
    }

    fn reset(&mut self, qubit: usize) -> EngineResult<()> {
        if self.measure(qubit) {
            self.apply_single_qubit_gate(qubit, &gate_matrix("X")?);
        }
        Ok(())
    }

    fn execute(&mut self, instruction: &Instruction, outcomes: &mut Vec<bool>) -> EngineResult<()> {
        if let Some(max) = instruction.max_target() {
            self.ensure_qubit(max)?;
        }
        match instruction {
            Instruction::Gate1 { name, targets } => {
                let matrix = gate_matrix(name)?;
                for &t in targets {
                    self.apply_single_qubit_gate(t, &matrix);
                }
            }
            Instruction::Gate2 { name, pairs } => {
                for &(a, b) in pairs {
                    match name.as_str() {
                        "CX" | "CNOT" => self.apply_controlled_gate(a, b, &gate_matrix("X")?),
                        "CY" => self.apply_controlled_gate(a, b, &gate_matrix("Y")?),
                        "CZ" => self.apply_controlled_gate(a, b, &gate_matrix("Z")?),
                        "SWAP" => self.apply_swap(a, b),
                        _ => {
                            return Err(EngineError::simulator(format!(
                                "gate '{}' is not supported",
                                name
                            )));
                        }
                    }
                }
            }
            Instruction::Measure(targets) => {
                for &t in targets {
                    outcomes.push(self.measure(t));
                }
            }
            Instruction::MeasureX(targets) => {
                let h = gate_matrix("H")?;
                for &t in targets {
                    self.apply_single_qubit_gate(t, &h);
                    outcomes.push(self.measure(t));
                    self.apply_single_qubit_gate(t, &h);
                }
            }
            Instruction::MeasureReset(targets) => {
                let x = gate_matrix("X")?;
                for &t in targets {
                    let bit = self.measure(t);
                    if bit {
                        self.apply_single_qubit_gate(t, &x);
                    }
                    outcomes.push(bit);
                }
            }
            Instruction::Reset(targets) => {
                for &t in targets {
                    self.reset(t)?;
                }
            }
            Instruction::Tick => {}
        }
        Ok(())
    }
}

impl Simulator for StateVectorSimulator {
    fn apply(&mut self, instructions: &str) -> EngineResult<Vec<bool>> {
        let parsed = parse_instructions(instructions)?;
        let mut outcomes = Vec::new();
        for instruction in &parsed {
            self.execute(instruction, &mut outcomes)?;
        }
        Ok(outcomes)
    }
}

impl SeedableSimulator for StateVectorSimulator {
    fn from_seed(seed: u64) -> Self {
        Self::new(seed)
    }
}
