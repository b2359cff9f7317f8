//! Error handling logic

use std::fmt;
use thiserror::Error;

/// Convenient `Result` alias used throughout the crate.
pub type EngineResult<T> = Result<T, EngineError>;

/// Which loop construct tripped its iteration limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    /// Condition checked before every iteration.
    While,
    /// Body runs once before the first condition check.
    DoWhile,
}

impl fmt::Display for LoopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopKind::While => write!(f, "While-loop"),
            LoopKind::DoWhile => write!(f, "Do-While loop"),
        }
    }
}

/// Failures raised while decoding or executing a dynamic circuit.
///
/// None of these are retried. Any error raised inside a shot unwinds that
/// shot's whole execution; other shots own independent contexts and are
/// unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A condition or expression referenced a measurement position that does
    /// not exist at evaluation time.
    #[error("Index Error: {message}")]
    Index {
        /// Index failure message
        message: String,
    },

    /// A loop ran more iterations than its effective limit allows.
    #[error("{kind} exceeded max_iter={limit}")]
    LoopLimitExceeded {
        /// The loop construct that overflowed.
        kind: LoopKind,
        /// The effective iteration limit that was exceeded.
        limit: u64,
    },

    /// The circuit contains a node or condition of unrecognized shape.
    #[error("Invalid Circuit: {message}")]
    InvalidCircuit {
        /// InvalidCircuit failure message
        message: String,
    },

    /// Input bytes do not decode to a circuit at all.
    #[error("Malformed Circuit: {message}")]
    MalformedCircuit {
        /// MalformedCircuit failure message
        message: String,
    },

    /// The simulator rejected an instruction block.
    #[error("Simulator Error: {message}")]
    Simulator {
        /// Simulator failure message
        message: String,
    },

    /// A classical expression read a variable never assigned in this shot.
    #[error("Undefined Variable: '{name}' has not been assigned in this shot")]
    UndefinedVariable {
        /// Name of the missing variable.
        name: String,
    },
}

impl EngineError {
    pub(crate) fn index(message: impl Into<String>) -> Self {
        EngineError::Index { message: message.into() }
    }

    pub(crate) fn simulator(message: impl Into<String>) -> Self {
        EngineError::Simulator { message: message.into() }
    }

    pub(crate) fn invalid_circuit(message: impl Into<String>) -> Self {
        EngineError::InvalidCircuit { message: message.into() }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        EngineError::MalformedCircuit { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_limit_message_names_the_limit() {
        let err = EngineError::LoopLimitExceeded { kind: LoopKind::While, limit: 5 };
        assert_eq!(err.to_string(), "While-loop exceeded max_iter=5");

        let err = EngineError::LoopLimitExceeded { kind: LoopKind::DoWhile, limit: 10_000 };
        assert_eq!(err.to_string(), "Do-While loop exceeded max_iter=10000");
    }

    #[test]
    fn helpers_build_matching_variants() {
        assert!(matches!(EngineError::index("x"), EngineError::Index { .. }));
        assert!(matches!(EngineError::malformed("x"), EngineError::MalformedCircuit { .. }));
        assert!(matches!(EngineError::invalid_circuit("x"), EngineError::InvalidCircuit { .. }));
        assert!(matches!(EngineError::simulator("x"), EngineError::Simulator { .. }));
    }
}
