//! Execution limits shared by the interpreter and the reference simulator.

/// Iteration cap applied to a loop whose declared `max_iterations` is not positive.
pub const DEFAULT_MAX_ITERATIONS: u64 = 10_000;

/// Largest register the reference state-vector simulator will allocate.
pub const MAX_QUBITS: usize = 20;
