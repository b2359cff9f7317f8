// src/simulation/mod.rs

//! The simulator capability that dynamic circuits drive.
//!
//! The interpreter only ever talks to a [`Simulator`]: it hands over one
//! block of static instruction text at a time and receives exactly the
//! measurement outcomes that block produced, in production order. The
//! simulator owns the quantum state and keeps it across calls.
//!
//! [`StateVectorSimulator`] is the implementation shipped with the crate.

pub(crate) mod engine;

pub use engine::StateVectorSimulator;

use crate::core::EngineResult;

/// A persistent, stateful circuit simulator.
pub trait Simulator {
    /// Applies a static batch of instructions to the persistent state and
    /// returns the outcomes newly produced by this call, in order.
    ///
    /// # Errors
    /// Returns `EngineError::Simulator` if the instructions cannot be applied.
    fn apply(&mut self, instructions: &str) -> EngineResult<Vec<bool>>;
}

/// A simulator that can be constructed from a seed for reproducible shots.
pub trait SeedableSimulator: Simulator + Sized {
    /// Builds a fresh simulator whose randomness is fully determined by `seed`.
    fn from_seed(seed: u64) -> Self;
}

impl<S: Simulator + ?Sized> Simulator for &mut S {
    fn apply(&mut self, instructions: &str) -> EngineResult<Vec<bool>> {
        (**self).apply(instructions)
    }
}

impl<S: Simulator + ?Sized> Simulator for Box<S> {
    fn apply(&mut self, instructions: &str) -> EngineResult<Vec<bool>> {
        (**self).apply(instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_objects_and_references_forward_calls() -> EngineResult<()> {
        let mut boxed: Box<dyn Simulator> = Box::new(StateVectorSimulator::from_seed(4));
        assert_eq!(boxed.apply("X 0\nM 0")?, vec![true]);

        let mut sim = StateVectorSimulator::from_seed(4);
        {
            let mut borrowed = &mut sim;
            Simulator::apply(&mut borrowed, "X 1")?;
        }
        assert_eq!(sim.apply("M 1")?, vec![true]);
        Ok(())
    }
}
