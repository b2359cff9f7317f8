// src/circuits/mod.rs

//! Defines the abstract syntax tree of a dynamic circuit and a builder for it.
//!
//! A `Circuit` is an ordered sequence of `Node`s. Leaf nodes hand static
//! instruction text to the simulator verbatim; control nodes (`If`, `While`,
//! `DoWhile`) decide at run time, from measurement outcomes, whether their
//! body executes. The tree is immutable once built: loops are expressed by
//! loop nodes, never by cyclic structure.

use crate::conditions::{Condition, Expr};
use crate::core::{DEFAULT_MAX_ITERATIONS, EngineError, EngineResult};
use std::fmt;

/// A static batch of primitive instructions, passed to the simulator as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionBlock {
    /// Instruction text in the simulator's notation.
    pub instructions: String,
    /// Whether this block's outcomes replace the last-captured-block record.
    pub capture_as_last: bool,
}

impl InstructionBlock {
    /// A block whose outcomes are captured for `LastMeasurement` conditions.
    pub fn new(instructions: impl Into<String>) -> Self {
        Self { instructions: instructions.into(), capture_as_last: true }
    }

    /// A block whose outcomes only go to the global record.
    pub fn uncaptured(instructions: impl Into<String>) -> Self {
        Self { instructions: instructions.into(), capture_as_last: false }
    }
}

/// One node of the dynamic-circuit tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Static instructions for the simulator.
    Block(InstructionBlock),
    /// Executes `body` once if `condition` holds.
    If {
        /// Branch decision.
        condition: Condition,
        /// Nodes run when the condition is true.
        body: Circuit,
    },
    /// Re-checks `condition` before every execution of `body`.
    While {
        /// Loop continues while this is true.
        condition: Condition,
        /// Loop body.
        body: Circuit,
        /// Iteration cap; non-positive means `DEFAULT_MAX_ITERATIONS`.
        max_iterations: i64,
    },
    /// Executes `body` once, then repeats while `condition` holds.
    DoWhile {
        /// Loop continues while this is true.
        condition: Condition,
        /// Loop body.
        body: Circuit,
        /// Iteration cap; non-positive means `DEFAULT_MAX_ITERATIONS`.
        max_iterations: i64,
    },
    /// Assigns a classical variable for the rest of the shot.
    Let {
        /// Variable name.
        name: String,
        /// Value to store.
        expr: Expr,
    },
    /// Appends a classical output bit to the shot's outputs.
    Emit {
        /// Optional label recorded alongside the bit.
        name: Option<String>,
        /// Value to emit.
        expr: Expr,
    },
}

/// Resolves a declared loop limit to the cap actually enforced.
pub fn effective_max_iterations(declared: i64) -> u64 {
    if declared > 0 {
        declared as u64
    } else {
        DEFAULT_MAX_ITERATIONS
    }
}

/// An ordered sequence of nodes. Executed strictly left to right, with
/// nested bodies executed depth-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Circuit {
    nodes: Vec<Node>,
}

impl Circuit {
    /// Creates a new, empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// A circuit holding a single captured instruction block.
    pub fn from_block(instructions: impl Into<String>) -> Self {
        Self { nodes: vec![Node::Block(InstructionBlock::new(instructions))] }
    }

    /// Appends a node.
    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// The nodes in execution order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the circuit contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A circuit wrapping static instruction text as its only block.
    pub fn from_static(instructions: impl Into<String>) -> Self {
        Self::from_block(instructions)
    }

    /// Returns `true` if every node is an instruction block.
    pub fn is_static(&self) -> bool {
        self.nodes.iter().all(|node| matches!(node, Node::Block(_)))
    }

    /// Concatenates the blocks of a static circuit into one instruction text.
    ///
    /// # Errors
    /// `EngineError::InvalidCircuit` if the circuit holds any control,
    /// `Let` or `Emit` node.
    pub fn to_static(&self) -> EngineResult<String> {
        let mut text = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            match node {
                Node::Block(block) => {
                    let instructions = block.instructions.trim_end();
                    if !instructions.is_empty() {
                        text.push(instructions);
                    }
                }
                _ => {
                    return Err(EngineError::invalid_circuit(
                        "to_static only supports static circuits",
                    ));
                }
            }
        }
        Ok(text.join("\n"))
    }

    /// Deepest nesting of control nodes; a flat circuit has depth 0.
    pub fn depth(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| match node {
                Node::If { body, .. } | Node::While { body, .. } | Node::DoWhile { body, .. } => {
                    1 + body.depth()
                }
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        for node in &self.nodes {
            match node {
                Node::Block(block) => {
                    writeln!(f, "{}Block:", prefix)?;
                    for line in instruction_lines(&block.instructions) {
                        writeln!(f, "{}  {}", prefix, line)?;
                    }
                }
                Node::If { condition, body } => {
                    writeln!(f, "{}If {}:", prefix, condition)?;
                    body.fmt_indented(f, indent + 1)?;
                }
                Node::While { condition, body, .. } => {
                    writeln!(f, "{}While {}:", prefix, condition)?;
                    body.fmt_indented(f, indent + 1)?;
                }
                Node::DoWhile { condition, body, .. } => {
                    writeln!(f, "{}Do:", prefix)?;
                    body.fmt_indented(f, indent + 1)?;
                    writeln!(f, "{}While {}", prefix, condition)?;
                }
                Node::Let { name, expr } => writeln!(f, "{}Let {} = {}", prefix, name, expr)?,
                Node::Emit { name: Some(name), expr } => {
                    writeln!(f, "{}Emit {} as {}", prefix, expr, name)?
                }
                Node::Emit { name: None, expr } => writeln!(f, "{}Emit {}", prefix, expr)?,
            }
        }
        Ok(())
    }
}

/// Splits block text into its non-empty instruction lines.
fn instruction_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\n', ';']).map(str::trim).filter(|line| !line.is_empty())
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl FromIterator<Node> for Circuit {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self { nodes: iter.into_iter().collect() }
    }
}

//-------------------------------------------------------------------------
// Circuit Builder
//-------------------------------------------------------------------------

/// Fluent construction of `Circuit` trees.
///
/// ```
/// use dynq::{CircuitBuilder, Condition};
///
/// let body = CircuitBuilder::new().block("H 0\nM 0").build();
/// let circuit = CircuitBuilder::new()
///     .block("H 0\nM 0")
///     .while_loop(Condition::LastMeasurement(0), body, 100)
///     .build();
/// assert_eq!(circuit.len(), 2);
/// assert_eq!(circuit.depth(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    circuit: Circuit,
}

impl CircuitBuilder {
    /// Creates a new, empty CircuitBuilder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an arbitrary node.
    pub fn node(mut self, node: Node) -> Self {
        self.circuit.push(node);
        self
    }

    /// Appends a block whose outcomes are captured as the last block.
    pub fn block(self, instructions: impl Into<String>) -> Self {
        self.node(Node::Block(InstructionBlock::new(instructions)))
    }

    /// Appends a block that leaves the last-captured-block record untouched.
    pub fn uncaptured_block(self, instructions: impl Into<String>) -> Self {
        self.node(Node::Block(InstructionBlock::uncaptured(instructions)))
    }

    /// Appends an `If` node.
    pub fn conditional(self, condition: impl Into<Condition>, body: Circuit) -> Self {
        self.node(Node::If { condition: condition.into(), body })
    }

    /// Appends a `While` node.
    pub fn while_loop(self, condition: impl Into<Condition>, body: Circuit, max_iterations: i64) -> Self {
        self.node(Node::While { condition: condition.into(), body, max_iterations })
    }

    /// Appends a `DoWhile` node, the usual shape of repeat-until-success.
    pub fn do_while(self, condition: impl Into<Condition>, body: Circuit, max_iterations: i64) -> Self {
        self.node(Node::DoWhile { condition: condition.into(), body, max_iterations })
    }

    /// Appends a `Let` node.
    pub fn let_var(self, name: impl Into<String>, expr: Expr) -> Self {
        self.node(Node::Let { name: name.into(), expr })
    }

    /// Appends a named `Emit` node.
    pub fn emit(self, name: impl Into<String>, expr: Expr) -> Self {
        self.node(Node::Emit { name: Some(name.into()), expr })
    }

    /// Appends an unnamed `Emit` node.
    pub fn emit_unnamed(self, expr: Expr) -> Self {
        self.node(Node::Emit { name: None, expr })
    }

    /// Finalizes the construction process and returns the built `Circuit`.
    pub fn build(self) -> Circuit {
        self.circuit
    }
}
