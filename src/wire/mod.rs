// src/wire/mod.rs

//! JSON wire format for circuits and the serialized-circuit entry point.
//!
//! Nodes and conditions are encoded like a tagged "oneof": an object with
//! one optional field per kind. Bytes that are not JSON of this shape are
//! rejected as `MalformedCircuit`; a node or condition that parses but sets
//! zero or several kinds (for example, only a field this version does not
//! know) is rejected as `InvalidCircuit`. Both happen before any shot runs.
//!
//! ```json
//! {"nodes": [
//!   {"block": {"instructions": "H 0\nM 0"}},
//!   {"while_node": {"condition": {"last_meas": {"index": 0}},
//!                   "body": {"nodes": [{"block": {"instructions": "H 0\nM 0"}}]},
//!                   "max_iter": 100}}
//! ]}
//! ```

use crate::circuits::{Circuit, InstructionBlock, Node};
use crate::conditions::{Condition, Expr};
use crate::core::{EngineError, EngineResult};
use crate::sampler::{self, Sample};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireCircuit {
    #[serde(default)]
    nodes: Vec<WireNode>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block: Option<WireBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    if_node: Option<WireIf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    while_node: Option<WireLoop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    do_while_node: Option<WireLoop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    let_node: Option<WireLet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    emit_node: Option<WireEmit>,
}

fn default_capture() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct WireBlock {
    instructions: String,
    #[serde(default = "default_capture")]
    capture_as_last: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireIf {
    #[serde(default)]
    condition: WireCondition,
    #[serde(default)]
    body: WireCircuit,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireLoop {
    #[serde(default)]
    condition: WireCondition,
    #[serde(default)]
    body: WireCircuit,
    #[serde(default)]
    max_iter: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireLet {
    name: String,
    expr: Expr,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEmit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    expr: Expr,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_meas: Option<WireLastMeas>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meas_parity: Option<WireParity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expr: Option<Expr>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireLastMeas {
    index: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireParity {
    #[serde(default)]
    indices: Vec<i64>,
}

impl WireCircuit {
    fn into_circuit(self) -> EngineResult<Circuit> {
        self.nodes
            .into_iter()
            .enumerate()
            .map(|(position, node)| node.into_node(position))
            .collect()
    }

    fn from_circuit(circuit: &Circuit) -> Self {
        Self { nodes: circuit.nodes().iter().map(WireNode::from_node).collect() }
    }
}

impl WireNode {
    fn kinds_set(&self) -> usize {
        [
            self.block.is_some(),
            self.if_node.is_some(),
            self.while_node.is_some(),
            self.do_while_node.is_some(),
            self.let_node.is_some(),
            self.emit_node.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    fn into_node(self, position: usize) -> EngineResult<Node> {
        let kinds = self.kinds_set();
        if kinds != 1 {
            return Err(EngineError::invalid_circuit(format!(
                "node {} sets {} node kinds, expected exactly one",
                position, kinds
            )));
        }
        let node = match self {
            WireNode { block: Some(b), .. } => Node::Block(InstructionBlock {
                instructions: b.instructions,
                capture_as_last: b.capture_as_last,
            }),
            WireNode { if_node: Some(n), .. } => Node::If {
                condition: n.condition.into_condition(position)?,
                body: n.body.into_circuit()?,
            },
            WireNode { while_node: Some(n), .. } => Node::While {
                condition: n.condition.into_condition(position)?,
                body: n.body.into_circuit()?,
                max_iterations: n.max_iter,
            },
            WireNode { do_while_node: Some(n), .. } => Node::DoWhile {
                condition: n.condition.into_condition(position)?,
                body: n.body.into_circuit()?,
                max_iterations: n.max_iter,
            },
            WireNode { let_node: Some(n), .. } => Node::Let { name: n.name, expr: n.expr },
            WireNode { emit_node: Some(n), .. } => Node::Emit { name: n.name, expr: n.expr },
            _ => {
                return Err(EngineError::invalid_circuit(format!(
                    "node {} has no recognized kind",
                    position
                )));
            }
        };
        Ok(node)
    }

    fn from_node(node: &Node) -> Self {
        match node {
            Node::Block(b) => WireNode {
                block: Some(WireBlock {
                    instructions: b.instructions.clone(),
                    capture_as_last: b.capture_as_last,
                }),
                ..WireNode::default()
            },
            Node::If { condition, body } => WireNode {
                if_node: Some(WireIf {
                    condition: WireCondition::from_condition(condition),
                    body: WireCircuit::from_circuit(body),
                }),
                ..WireNode::default()
            },
            Node::While { condition, body, max_iterations } => WireNode {
                while_node: Some(WireLoop::new(condition, body, *max_iterations)),
                ..WireNode::default()
            },
            Node::DoWhile { condition, body, max_iterations } => WireNode {
                do_while_node: Some(WireLoop::new(condition, body, *max_iterations)),
                ..WireNode::default()
            },
            Node::Let { name, expr } => WireNode {
                let_node: Some(WireLet { name: name.clone(), expr: expr.clone() }),
                ..WireNode::default()
            },
            Node::Emit { name, expr } => WireNode {
                emit_node: Some(WireEmit { name: name.clone(), expr: expr.clone() }),
                ..WireNode::default()
            },
        }
    }
}

impl WireLoop {
    fn new(condition: &Condition, body: &Circuit, max_iter: i64) -> Self {
        Self {
            condition: WireCondition::from_condition(condition),
            body: WireCircuit::from_circuit(body),
            max_iter,
        }
    }
}

impl WireCondition {
    fn into_condition(self, position: usize) -> EngineResult<Condition> {
        match self {
            WireCondition { last_meas: Some(m), meas_parity: None, expr: None } => {
                Ok(Condition::LastMeasurement(m.index))
            }
            WireCondition { last_meas: None, meas_parity: Some(p), expr: None } => {
                Ok(Condition::MeasurementParity(p.indices))
            }
            WireCondition { last_meas: None, meas_parity: None, expr: Some(e) } => Ok(Condition::Expr(e)),
            _ => Err(EngineError::invalid_circuit(format!(
                "condition of node {} must set exactly one of last_meas, meas_parity, expr",
                position
            ))),
        }
    }

    fn from_condition(condition: &Condition) -> Self {
        match condition {
            Condition::LastMeasurement(index) => WireCondition {
                last_meas: Some(WireLastMeas { index: *index }),
                ..WireCondition::default()
            },
            Condition::MeasurementParity(indices) => WireCondition {
                meas_parity: Some(WireParity { indices: indices.clone() }),
                ..WireCondition::default()
            },
            Condition::Expr(expr) => WireCondition {
                expr: Some(expr.clone()),
                ..WireCondition::default()
            },
        }
    }
}

/// Decodes a circuit from its JSON wire form.
///
/// # Errors
/// * `EngineError::MalformedCircuit` if the bytes are not JSON of the wire shape.
/// * `EngineError::InvalidCircuit` if a node or condition sets no kind or several.
pub fn decode_circuit(bytes: &[u8]) -> EngineResult<Circuit> {
    let wire: WireCircuit = serde_json::from_slice(bytes)
        .map_err(|e| EngineError::malformed(format!("failed to parse circuit: {}", e)))?;
    wire.into_circuit()
}

/// Encodes a circuit into its JSON wire form.
pub fn encode_circuit(circuit: &Circuit) -> EngineResult<Vec<u8>> {
    serde_json::to_vec(&WireCircuit::from_circuit(circuit))
        .map_err(|e| EngineError::invalid_circuit(format!("failed to encode circuit: {}", e)))
}

/// Decodes `bytes` and samples the circuit with the reference simulator.
///
/// Decoding completes before the first shot begins, so a bad payload never
/// produces partial results.
pub fn sample_from_serialized_circuit(
    bytes: &[u8],
    shots: usize,
    seed: Option<u64>,
) -> EngineResult<Vec<Sample>> {
    let circuit = decode_circuit(bytes)?;
    debug!(nodes = circuit.len(), shots, ?seed, "decoded serialized circuit");
    sampler::sample(&circuit, shots, seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_capture_defaults_to_true() -> EngineResult<()> {
        let circuit = decode_circuit(br#"{"nodes": [{"block": {"instructions": "M 0"}}]}"#)?;
        assert_eq!(circuit.nodes(), &[Node::Block(InstructionBlock::new("M 0"))]);
        Ok(())
    }

    #[test]
    fn loop_limit_defaults_to_zero() -> EngineResult<()> {
        let circuit = decode_circuit(
            br#"{"nodes": [{"do_while_node": {"condition": {"meas_parity": {"indices": [-1]}},
                             "body": {"nodes": []}}}]}"#,
        )?;
        match &circuit.nodes()[0] {
            Node::DoWhile { max_iterations, condition, .. } => {
                assert_eq!(*max_iterations, 0);
                assert_eq!(condition, &Condition::MeasurementParity(vec![-1]));
            }
            other => panic!("unexpected node {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn empty_node_is_invalid() {
        let err = decode_circuit(br#"{"nodes": [{}]}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCircuit { .. }));
    }

    #[test]
    fn unknown_node_kind_is_invalid() {
        let err = decode_circuit(br#"{"nodes": [{"teleport_node": {"q": 1}}]}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCircuit { .. }));
    }

    #[test]
    fn node_with_two_kinds_is_invalid() {
        let err = decode_circuit(
            br#"{"nodes": [{"block": {"instructions": "M 0"},
                            "let_node": {"name": "a", "expr": {"const": true}}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidCircuit { .. }));
    }

    #[test]
    fn missing_condition_is_invalid() {
        let err = decode_circuit(br#"{"nodes": [{"if_node": {"body": {"nodes": []}}}]}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCircuit { .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        for text in ["not json", r#"{"nodes": 3}"#, "", r#"{"nodes": [{"block": {}}]}"#] {
            let err = decode_circuit(text.as_bytes()).unwrap_err();
            assert!(matches!(err, EngineError::MalformedCircuit { .. }), "{:?}", text);
        }
    }

    #[test]
    fn expressions_use_snake_case_tags() -> EngineResult<()> {
        let circuit = decode_circuit(
            br#"{"nodes": [{"let_node": {"name": "p", "expr": {"xor": [{"rec": -1}, {"rec": -2}]}}},
                           {"emit_node": {"expr": {"not": {"var": "p"}}}}]}"#,
        )?;
        assert_eq!(
            circuit.nodes()[0],
            Node::Let { name: "p".to_string(), expr: Expr::rec(-1).xor(Expr::rec(-2)) }
        );
        assert_eq!(circuit.nodes()[1], Node::Emit { name: None, expr: Expr::var("p").negate() });
        Ok(())
    }
}
