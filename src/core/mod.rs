// src/core/mod.rs

//! Core data structures and types

pub mod constants;
pub mod error;
pub mod record;

// Re-export public types for convenient access via `dynq::core::TypeName`
pub use constants::{DEFAULT_MAX_ITERATIONS, MAX_QUBITS};
pub use error::{EngineError, EngineResult, LoopKind};
pub use record::MeasurementLog;
