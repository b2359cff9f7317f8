// src/vm/context.rs

//! Per-shot execution state.

use crate::conditions::Variables;
use crate::core::MeasurementLog;
use crate::sampler::ShotRecord;
use crate::simulation::Simulator;

/// Everything one shot mutates: the simulator, the measurement log and the
/// classical variables and outputs.
///
/// A context is created at shot start and consumed at shot end. Nothing in
/// it is shared with any other shot.
#[derive(Debug)]
pub struct ExecContext<S> {
    pub(crate) simulator: S,
    pub(crate) log: MeasurementLog,
    pub(crate) vars: Variables,
    pub(crate) outputs: Vec<bool>,
    pub(crate) output_names: Vec<String>,
}

impl<S: Simulator> ExecContext<S> {
    /// Wraps a fresh simulator with an empty log and no variables.
    pub fn new(simulator: S) -> Self {
        Self {
            simulator,
            log: MeasurementLog::new(),
            vars: Variables::new(),
            outputs: Vec::new(),
            output_names: Vec::new(),
        }
    }

    /// The simulator driven by this shot.
    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    /// Measurement history so far.
    pub fn log(&self) -> &MeasurementLog {
        &self.log
    }

    /// Classical variables assigned so far.
    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    /// Classical output bits emitted so far.
    pub fn outputs(&self) -> &[bool] {
        &self.outputs
    }

    /// Consumes the context, yielding the shot's measurement record.
    pub fn into_sample(self) -> Vec<bool> {
        self.log.into_outcomes()
    }

    /// Consumes the context, yielding measurements and classical state.
    pub fn into_shot_record(self) -> ShotRecord {
        ShotRecord {
            measurements: self.log.into_outcomes(),
            outputs: self.outputs,
            output_names: self.output_names,
            vars: self.vars,
        }
    }
}
