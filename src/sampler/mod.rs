// src/sampler/mod.rs

//! Shot-by-shot sampling of dynamic circuits.
//!
//! Every shot gets its own simulator and `ExecContext`; nothing mutable is
//! shared between shots. With a base seed, shot `s` is seeded with
//! `base + s` (wrapping), so a single shot can be reproduced on its own and
//! results are identical whether shots run sequentially or in parallel.

mod results;

pub use results::{Sample, ShotRecord};

use crate::circuits::Circuit;
use crate::core::{EngineError, EngineResult};
use crate::simulation::{SeedableSimulator, StateVectorSimulator};
use crate::vm::{ExecContext, execute};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Result of a single shot.
pub type ShotResult = EngineResult<Sample>;

/// What to do when a shot fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing shot and return its error.
    #[default]
    AbortAll,
    /// Run every shot and report each shot's result individually.
    ContinueOnError,
}

/// Sampling options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Base seed; `None` seeds every shot from OS entropy.
    pub seed: Option<u64>,
    /// Failure handling across shots.
    pub failure_policy: FailurePolicy,
    /// Run shots on the rayon thread pool.
    pub parallel: bool,
}

impl SamplerConfig {
    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enables or disables parallel shots.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Derives the seed for shot `shot` from a base seed.
pub fn shot_seed(base: u64, shot: usize) -> u64 {
    base.wrapping_add(shot as u64)
}

/// Samples a circuit shot by shot, using simulator type `S`.
///
/// # Examples
///
/// ```
/// use dynq::{Circuit, DynamicSampler, SamplerConfig, EngineError};
///
/// let circuit = Circuit::from_block("H 0\nM 0");
/// let sampler: DynamicSampler = DynamicSampler::new(&circuit, SamplerConfig::default().with_seed(7));
/// let first = sampler.sample(20)?;
/// let second = sampler.sample(20)?;
/// assert_eq!(first, second);
/// assert!(first.iter().all(|shot| shot.len() == 1));
/// # Ok::<(), EngineError>(())
/// ```
#[derive(Debug)]
pub struct DynamicSampler<'c, S = StateVectorSimulator> {
    circuit: &'c Circuit,
    config: SamplerConfig,
    _simulator: PhantomData<fn() -> S>,
}

impl<'c, S: SeedableSimulator> DynamicSampler<'c, S> {
    /// Creates a sampler for `circuit`.
    pub fn new(circuit: &'c Circuit, config: SamplerConfig) -> Self {
        Self { circuit, config, _simulator: PhantomData }
    }

    /// The sampler's configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Samples `shots` measurement records in shot order.
    ///
    /// # Errors
    /// Returns the error of the lowest-indexed failing shot. Under
    /// `FailurePolicy::AbortAll` later shots are not run (sequential mode).
    pub fn sample(&self, shots: usize) -> EngineResult<Vec<Sample>> {
        self.collect_shots(shots, ExecContext::into_sample).into_iter().collect()
    }

    /// Samples `shots` records honoring the configured failure policy.
    ///
    /// Under `AbortAll` the first failure is returned as `Err`; under
    /// `ContinueOnError` every shot's result is returned in shot order.
    pub fn sample_outcomes(&self, shots: usize) -> EngineResult<Vec<ShotResult>> {
        let results = self.collect_shots(shots, ExecContext::into_sample);
        match self.config.failure_policy {
            FailurePolicy::AbortAll => results.into_iter().map(|r| r.map(Ok)).collect(),
            FailurePolicy::ContinueOnError => Ok(results),
        }
    }

    /// Samples `shots` records including classical variables and outputs.
    pub fn sample_with_classical(&self, shots: usize) -> EngineResult<Vec<ShotRecord>> {
        self.collect_shots(shots, ExecContext::into_shot_record).into_iter().collect()
    }

    /// Runs only shot `shot`, exactly as it would run inside a larger batch.
    pub fn sample_shot(&self, shot: usize) -> ShotResult {
        self.run_shot(shot, &ExecContext::into_sample)
    }

    fn run_shot<T, F>(&self, shot: usize, finish: &F) -> EngineResult<T>
    where
        F: Fn(ExecContext<S>) -> T,
    {
        let seed = match self.config.seed {
            Some(base) => shot_seed(base, shot),
            None => rand::random::<u64>(),
        };
        debug!(shot, seed, "running shot");
        let mut ctx = ExecContext::new(S::from_seed(seed));
        execute(self.circuit, &mut ctx)?;
        Ok(finish(ctx))
    }

    fn collect_shots<T, F>(&self, shots: usize, finish: F) -> Vec<EngineResult<T>>
    where
        T: Send,
        F: Fn(ExecContext<S>) -> T + Sync,
    {
        let results: Vec<EngineResult<T>> = if self.config.parallel {
            (0..shots).into_par_iter().map(|shot| self.run_shot(shot, &finish)).collect()
        } else {
            let mut results = Vec::with_capacity(shots);
            for shot in 0..shots {
                let result = self.run_shot(shot, &finish);
                let failed = result.is_err();
                results.push(result);
                if failed && self.config.failure_policy == FailurePolicy::AbortAll {
                    break;
                }
            }
            results
        };
        for (shot, result) in results.iter().enumerate() {
            if let Err(err) = result {
                log_failure(shot, err, self.config.failure_policy);
            }
        }
        results
    }
}

fn log_failure(shot: usize, err: &EngineError, policy: FailurePolicy) {
    match policy {
        FailurePolicy::AbortAll => debug!(shot, %err, "shot failed, aborting"),
        FailurePolicy::ContinueOnError => warn!(shot, %err, "shot failed, continuing"),
    }
}

/// Samples `circuit` with the reference simulator.
///
/// Shot `s` is seeded with `seed + s` when a seed is given.
pub fn sample(circuit: &Circuit, shots: usize, seed: Option<u64>) -> EngineResult<Vec<Sample>> {
    let config = SamplerConfig { seed, ..SamplerConfig::default() };
    DynamicSampler::<StateVectorSimulator>::new(circuit, config).sample(shots)
}
