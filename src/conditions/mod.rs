// src/conditions/mod.rs

//! Conditions steering `If`, `While` and `DoWhile` nodes, and the classical
//! expressions they can be built from.
//!
//! Everything here is evaluated against the shot's state *at the moment of
//! evaluation*: the measurement log as it stands and the variables assigned
//! so far. Evaluation never mutates that state.

use crate::core::record::resolve_index;
use crate::core::{EngineError, EngineResult, MeasurementLog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classical variables assigned by `Let` nodes during one shot.
pub type Variables = BTreeMap<String, bool>;

/// A measurement-dependent decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Outcome `index` of the most recent block executed with
    /// `capture_as_last = true`. Must be a non-negative offset into that block.
    LastMeasurement(i64),
    /// XOR of the referenced positions in the shot's whole record. Negative
    /// indices count back from the end (`-1` is the most recent outcome).
    MeasurementParity(Vec<i64>),
    /// An arbitrary classical expression.
    Expr(Expr),
}

impl Condition {
    /// Evaluates the condition against the current shot state.
    ///
    /// # Errors
    /// * `EngineError::Index` if a referenced position is out of range.
    /// * `EngineError::UndefinedVariable` if an expression reads an unset variable.
    pub fn evaluate(&self, log: &MeasurementLog, vars: &Variables) -> EngineResult<bool> {
        match self {
            Condition::LastMeasurement(index) => log.read_last(*index),
            Condition::MeasurementParity(indices) => measurement_parity(indices, log),
            Condition::Expr(expr) => expr.evaluate(log, vars),
        }
    }
}

fn measurement_parity(indices: &[i64], log: &MeasurementLog) -> EngineResult<bool> {
    let record = log.outcomes();
    let mut parity = false;
    for &i in indices {
        let actual = resolve_index(i, record.len()).ok_or_else(|| {
            EngineError::index(format!(
                "MeasParity index {} out of range for record of size {}",
                i,
                record.len()
            ))
        })?;
        parity ^= record[actual];
    }
    Ok(parity)
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::LastMeasurement(index) => write!(f, "LastMeas({})", index),
            Condition::MeasurementParity(indices) => write!(f, "MeasParity({:?})", indices),
            Condition::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

impl From<Expr> for Condition {
    fn from(expr: Expr) -> Self {
        Condition::Expr(expr)
    }
}

/// Lazily evaluated boolean expression over the shot's classical state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A literal bit.
    Const(bool),
    /// Position in the shot's whole record; negative indices count from the end.
    Rec(i64),
    /// Position in the last captured block.
    Last(i64),
    /// A variable assigned by an earlier `Let`.
    Var(String),
    /// Logical negation.
    Not(Box<Expr>),
    /// Logical AND.
    And(Box<Expr>, Box<Expr>),
    /// Logical OR.
    Or(Box<Expr>, Box<Expr>),
    /// Exclusive OR.
    Xor(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// `rec(index)` on the shot's whole record.
    pub fn rec(index: i64) -> Self {
        Expr::Rec(index)
    }

    /// Reads a named variable.
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    /// Negates `self`.
    pub fn negate(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// `self & other`.
    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    /// `self | other`.
    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    /// `self ^ other`.
    pub fn xor(self, other: Expr) -> Self {
        Expr::Xor(Box::new(self), Box::new(other))
    }

    /// Evaluates the expression. Both operands of binary nodes are always
    /// evaluated, so an out-of-range reference fails even when the other
    /// operand would decide the result.
    pub fn evaluate(&self, log: &MeasurementLog, vars: &Variables) -> EngineResult<bool> {
        match self {
            Expr::Const(bit) => Ok(*bit),
            Expr::Rec(index) => log.read(*index),
            Expr::Last(index) => log.read_last(*index),
            Expr::Var(name) => vars
                .get(name)
                .copied()
                .ok_or_else(|| EngineError::UndefinedVariable { name: name.clone() }),
            Expr::Not(inner) => Ok(!inner.evaluate(log, vars)?),
            Expr::And(lhs, rhs) => {
                let (l, r) = (lhs.evaluate(log, vars)?, rhs.evaluate(log, vars)?);
                Ok(l && r)
            }
            Expr::Or(lhs, rhs) => {
                let (l, r) = (lhs.evaluate(log, vars)?, rhs.evaluate(log, vars)?);
                Ok(l || r)
            }
            Expr::Xor(lhs, rhs) => Ok(lhs.evaluate(log, vars)? ^ rhs.evaluate(log, vars)?),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(bit) => write!(f, "{}", bit),
            Expr::Rec(index) => write!(f, "rec({})", index),
            Expr::Last(index) => write!(f, "last({})", index),
            Expr::Var(name) => write!(f, "vars[{:?}]", name),
            Expr::Not(inner) => write!(f, "~({})", inner),
            Expr::And(lhs, rhs) => write!(f, "({} & {})", lhs, rhs),
            Expr::Or(lhs, rhs) => write!(f, "({} | {})", lhs, rhs),
            Expr::Xor(lhs, rhs) => write!(f, "({} ^ {})", lhs, rhs),
        }
    }
}
