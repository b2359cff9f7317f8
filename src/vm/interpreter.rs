// src/vm/interpreter.rs

//! Recursive execution of a `Circuit` against one shot's `ExecContext`.

use super::context::ExecContext;
use crate::circuits::{Circuit, InstructionBlock, Node, effective_max_iterations};
use crate::conditions::Condition;
use crate::core::{EngineError, EngineResult, LoopKind};
use crate::simulation::Simulator;
use tracing::{debug, trace};

/// Executes every node of `circuit` in order, recursing into bodies.
///
/// Recursion depth equals the circuit's nesting depth. Any error unwinds the
/// whole call; the context is left as it was at the failure point, with no
/// partial block appended.
///
/// # Examples
///
/// ```
/// use dynq::{CircuitBuilder, Condition, ExecContext, StateVectorSimulator, EngineError};
/// use dynq::vm::execute;
///
/// // Measure |1>, then flip qubit 1 only if that outcome was 1.
/// let circuit = CircuitBuilder::new()
///     .block("X 0\nM 0")
///     .conditional(Condition::LastMeasurement(0), dynq::Circuit::from_block("X 1"))
///     .block("M 1")
///     .build();
///
/// let mut ctx = ExecContext::new(StateVectorSimulator::new(0));
/// execute(&circuit, &mut ctx)?;
/// assert_eq!(ctx.log().outcomes(), &[true, true]);
/// # Ok::<(), EngineError>(())
/// ```
pub fn execute<S: Simulator>(circuit: &Circuit, ctx: &mut ExecContext<S>) -> EngineResult<()> {
    for node in circuit.nodes() {
        execute_node(node, ctx)?;
    }
    Ok(())
}

fn execute_node<S: Simulator>(node: &Node, ctx: &mut ExecContext<S>) -> EngineResult<()> {
    match node {
        Node::Block(block) => execute_block(block, ctx),
        Node::If { condition, body } => {
            let taken = evaluate(condition, ctx)?;
            trace!(%condition, taken, "if");
            if taken {
                execute(body, ctx)?;
            }
            Ok(())
        }
        Node::While { condition, body, max_iterations } => {
            let limit = effective_max_iterations(*max_iterations);
            let mut iterations: u64 = 0;
            while evaluate(condition, ctx)? {
                iterations += 1;
                check_limit(LoopKind::While, iterations, limit)?;
                execute(body, ctx)?;
            }
            trace!(%condition, iterations, "while finished");
            Ok(())
        }
        Node::DoWhile { condition, body, max_iterations } => {
            let limit = effective_max_iterations(*max_iterations);
            let mut iterations: u64 = 0;
            loop {
                iterations += 1;
                check_limit(LoopKind::DoWhile, iterations, limit)?;
                execute(body, ctx)?;
                if !evaluate(condition, ctx)? {
                    break;
                }
            }
            trace!(%condition, iterations, "do-while finished");
            Ok(())
        }
        Node::Let { name, expr } => {
            let value = expr.evaluate(&ctx.log, &ctx.vars)?;
            trace!(name = name.as_str(), value, "let");
            ctx.vars.insert(name.clone(), value);
            Ok(())
        }
        Node::Emit { name, expr } => {
            let bit = expr.evaluate(&ctx.log, &ctx.vars)?;
            trace!(name = name.as_deref(), bit, "emit");
            ctx.outputs.push(bit);
            if let Some(name) = name {
                ctx.output_names.push(name.clone());
            }
            Ok(())
        }
    }
}

fn execute_block<S: Simulator>(block: &InstructionBlock, ctx: &mut ExecContext<S>) -> EngineResult<()> {
    let before_len = ctx.log.len();
    let outcomes = ctx.simulator.apply(&block.instructions)?;
    ctx.log.append(&outcomes);
    trace!(
        before_len,
        produced = outcomes.len(),
        capture_as_last = block.capture_as_last,
        "block"
    );
    if block.capture_as_last {
        ctx.log.set_last_block(outcomes);
    }
    Ok(())
}

fn evaluate<S>(condition: &Condition, ctx: &ExecContext<S>) -> EngineResult<bool> {
    condition.evaluate(&ctx.log, &ctx.vars)
}

/// Fails once `iterations` passes `limit`, before the body runs again.
fn check_limit(kind: LoopKind, iterations: u64, limit: u64) -> EngineResult<()> {
    if iterations > limit {
        debug!(%kind, limit, "loop limit exceeded");
        return Err(EngineError::LoopLimitExceeded { kind, limit });
    }
    Ok(())
}
