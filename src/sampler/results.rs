// src/sampler/results.rs

//! Per-shot output types.

use crate::conditions::Variables;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The measurement record of one shot, in production order.
pub type Sample = Vec<bool>;

/// Everything one shot produced: measurements plus classical outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotRecord {
    /// Measurement outcomes in production order.
    pub measurements: Vec<bool>,
    /// Bits appended by `Emit` nodes, in emission order.
    pub outputs: Vec<bool>,
    /// Names of the named `Emit` nodes, in emission order.
    pub output_names: Vec<String>,
    /// Final value of every variable assigned with `Let`.
    pub vars: Variables,
}

fn write_bits(f: &mut fmt::Formatter<'_>, bits: &[bool]) -> fmt::Result {
    for bit in bits {
        write!(f, "{}", u8::from(*bit))?;
    }
    Ok(())
}

impl fmt::Display for ShotRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Measurements: ")?;
        write_bits(f, &self.measurements)?;
        writeln!(f)?;
        if !self.outputs.is_empty() {
            write!(f, "Outputs: ")?;
            write_bits(f, &self.outputs)?;
            if !self.output_names.is_empty() {
                write!(f, " ({})", self.output_names.join(", "))?;
            }
            writeln!(f)?;
        }
        for (name, value) in &self.vars {
            writeln!(f, "  {} = {}", name, u8::from(*value))?;
        }
        Ok(())
    }
}
