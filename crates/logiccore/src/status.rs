use crate::{FlowError, FlowNode, NodeId, Value};
use std::fmt::Write as _;

/// Runtime state of one node within one execution context.
///
/// Never persisted. Outputs become readable by other nodes only once
/// `executed` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStatus {
    pub(crate) node_id: NodeId,
    pub(crate) node_type: String,
    pub(crate) name: String,
    pub(crate) inputs: Vec<Value>,
    pub(crate) outputs: Vec<Value>,
    pub(crate) executed: bool,
    pub(crate) branch: Option<usize>,
    pub(crate) next: Option<NodeId>,
}

impl NodeStatus {
    /// Fresh, not-yet-executed status for `node`
    pub fn new(node: &FlowNode) -> Self {
        Self {
            node_id: node.id(),
            node_type: node.node_type().to_string(),
            name: node.name().to_string(),
            inputs: Vec::new(),
            outputs: vec![Value::Null; node.metadata().output_count()],
            executed: false,
            branch: None,
            next: None,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executed(&self) -> bool {
        self.executed
    }

    /// Resolved inputs, empty until the node runs
    pub fn inputs(&self) -> &[Value] {
        &self.inputs
    }

    /// Raw output slots, regardless of whether the node has run
    pub fn outputs(&self) -> &[Value] {
        &self.outputs
    }

    /// Branch index chosen by the node
    pub fn branch(&self) -> Option<usize> {
        self.branch
    }

    /// Successor actually taken
    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    /// Output readable by data references; fails before the node has run
    pub fn output(&self, index: usize) -> Result<&Value, FlowError> {
        if !self.executed {
            return Err(FlowError::NotExecuted { node: self.node_id });
        }
        self.outputs.get(index).ok_or(FlowError::OutputOutOfRange {
            node: self.node_id,
            index,
        })
    }

    /// Fill output slots before the run starts; used for event payloads.
    /// Returns how many values did not fit.
    pub(crate) fn seed_outputs(&mut self, values: Vec<Value>) -> usize {
        let capacity = self.outputs.len();
        let overflow = values.len().saturating_sub(capacity);
        for (slot, value) in self.outputs.iter_mut().zip(values) {
            *slot = value;
        }
        overflow
    }

    /// Per-run trace of this node
    pub fn render_trace(&self) -> String {
        let mut out = format!("#{} \"{}\" [{}]", self.node_id, self.name, self.node_type);
        if !self.executed {
            out.push_str(" not executed");
            return out;
        }
        out.push_str(" executed");
        if !self.inputs.is_empty() {
            let _ = write!(out, "\n  inputs: {}", join(&self.inputs));
        }
        if !self.outputs.is_empty() {
            let _ = write!(out, "\n  outputs: {}", join(&self.outputs));
        }
        match (self.branch, self.next) {
            (Some(branch), Some(next)) => {
                let _ = write!(out, "\n  branch {} -> #{}", branch, next);
            }
            (Some(branch), None) => {
                let _ = write!(out, "\n  branch {} -> end", branch);
            }
            _ => {}
        }
        out
    }
}

fn join(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
