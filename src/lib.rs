// src/lib.rs

//! `dynq` - Dynamic quantum circuits with measurement-dependent control flow
//!
//! Circuits are trees of static instruction blocks and control nodes
//! (`If`, `While`, `DoWhile`) whose conditions read the outcomes measured
//! so far in the same shot. Every shot runs on its own seeded simulator, so
//! a batch is reproducible from one base seed.

pub mod core;
pub mod conditions;
pub mod circuits;
pub mod simulation;
pub mod vm;
pub mod sampler;
pub mod wire;

// Re-export the most common types for easier top-level use
pub use crate::core::{DEFAULT_MAX_ITERATIONS, EngineError, EngineResult, LoopKind, MeasurementLog};
pub use conditions::{Condition, Expr, Variables};
pub use circuits::{Circuit, CircuitBuilder, InstructionBlock, Node};
pub use simulation::{SeedableSimulator, Simulator, StateVectorSimulator};
pub use vm::ExecContext;
pub use sampler::{
    sample,
    DynamicSampler,
    FailurePolicy,
    Sample,
    SamplerConfig,
    ShotRecord,
    ShotResult,
};
pub use wire::{decode_circuit, encode_circuit, sample_from_serialized_circuit};

// Example 1: Repeat-until-success
// Prepares |+>, measures, and repeats while the outcome was 1. Every shot
// therefore ends with a 0, after one or more attempts.
/// ```
/// use dynq::{sample, Circuit, CircuitBuilder, Condition, EngineError};
///
/// let attempt = Circuit::from_block("H 0\nM 0");
/// let circuit = CircuitBuilder::new()
///     .do_while(Condition::LastMeasurement(0), attempt, 100)
///     .build();
///
/// let shots = sample(&circuit, 50, Some(2024))?;
/// for shot in &shots {
///     assert!(!shot.is_empty());
///     assert_eq!(shot.last(), Some(&false));
///     // every attempt before the last one measured 1
///     assert!(shot[..shot.len() - 1].iter().all(|&bit| bit));
/// }
/// // the same seed reproduces the batch
/// assert_eq!(shots, sample(&circuit, 50, Some(2024))?);
/// # Ok::<(), EngineError>(())
/// ```
#[doc(hidden)]
const _: () = ();

// Example 2: Feed-forward correction
// Measures a Bell pair's first qubit and flips the second only when that
// outcome was 1, so the second measurement always reads 0.
/// ```
/// use dynq::{Circuit, CircuitBuilder, Condition, DynamicSampler, SamplerConfig, EngineError};
///
/// let circuit = CircuitBuilder::new()
///     .block("H 0\nCX 0 1\nM 0")
///     .conditional(Condition::LastMeasurement(0), Circuit::from_block("X 1"))
///     .block("M 1")
///     .build();
///
/// let sampler: DynamicSampler = DynamicSampler::new(&circuit, SamplerConfig::default().with_seed(5));
/// for shot in sampler.sample(30)? {
///     assert_eq!(shot.len(), 2);
///     assert!(!shot[1]);
/// }
/// # Ok::<(), EngineError>(())
/// ```
#[doc(hidden)]
const _: () = ();
