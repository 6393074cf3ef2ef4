use crate::{
    events::{EventBus, EventEmitter},
    DataReference, ExecutionContext, FlowError, LogicFlow, NodeError, NodeRegistry, RegistryError,
    Value,
};
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

pub type NodeId = u64;

static NULL: Value = Value::Null;

/// Category shared by every event (start) node type
pub const EVENT_CATEGORY: &str = "event";

/// Behavior of one node type.
///
/// Implementations are stateless; everything a run produces lives in the
/// `NodeContext` handed to `execute`.
pub trait Node: Send + Sync {
    /// Unique type identifier (e.g., "math.add", "event.chat")
    fn node_type(&self) -> &str;

    /// Run the type-specific computation and return the index of the
    /// branch to follow.
    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError>;
}

/// One named port of a node type
#[derive(Debug, Clone, PartialEq)]
pub struct PortDefinition {
    pub name: String,
    pub description: String,
}

impl PortDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Immutable shape of a node type: its input, output and branch ports
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMetadata {
    pub description: String,
    pub category: String,
    pub inputs: Vec<PortDefinition>,
    pub outputs: Vec<PortDefinition>,
    pub branches: Vec<PortDefinition>,
}

impl NodeMetadata {
    pub fn new(category: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            branches: Vec::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.inputs.push(PortDefinition::new(name, description));
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.outputs.push(PortDefinition::new(name, description));
        self
    }

    pub fn with_branch(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.branches.push(PortDefinition::new(name, description));
        self
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    pub fn is_event(&self) -> bool {
        self.category == EVENT_CATEGORY
    }
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self::new("general", "")
    }
}

/// View of one node's slice of an execution, handed to `Node::execute`
pub struct NodeContext<'a> {
    /// Id of the executing node
    pub node_id: NodeId,

    inputs: &'a [Value],
    outputs: &'a mut [Value],
    variables: &'a mut HashMap<String, Value>,
    events: EventEmitter,
}

impl<'a> NodeContext<'a> {
    pub fn new(
        node_id: NodeId,
        inputs: &'a [Value],
        outputs: &'a mut [Value],
        variables: &'a mut HashMap<String, Value>,
        events: EventEmitter,
    ) -> Self {
        Self {
            node_id,
            inputs,
            outputs,
            variables,
            events,
        }
    }

    /// Resolved input, `Null` when the index has no port
    pub fn input(&self, index: usize) -> &Value {
        self.inputs.get(index).unwrap_or(&NULL)
    }

    pub fn inputs(&self) -> &[Value] {
        self.inputs
    }

    /// Get a non-null input or return error
    pub fn require_input(&self, index: usize, name: &str) -> Result<&Value, NodeError> {
        match self.inputs.get(index) {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(NodeError::MissingInput {
                index,
                name: name.to_string(),
            }),
        }
    }

    pub fn require_number(&self, index: usize, name: &str) -> Result<f64, NodeError> {
        let value = self.require_input(index, name)?;
        value.as_f64().ok_or_else(|| invalid_type(name, "number", value))
    }

    pub fn require_bool(&self, index: usize, name: &str) -> Result<bool, NodeError> {
        let value = self.require_input(index, name)?;
        value.as_bool().ok_or_else(|| invalid_type(name, "bool", value))
    }

    pub fn require_text(&self, index: usize, name: &str) -> Result<&str, NodeError> {
        let value = self.require_input(index, name)?;
        value.as_str().ok_or_else(|| invalid_type(name, "text", value))
    }

    pub fn set_output(&mut self, index: usize, value: impl Into<Value>) -> Result<(), NodeError> {
        let slot = self
            .outputs
            .get_mut(index)
            .ok_or(NodeError::OutputOutOfRange { index })?;
        *slot = value.into();
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }
}

fn invalid_type(field: &str, expected: &str, actual: &Value) -> NodeError {
    NodeError::InvalidInputType {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

/// A node placed in a `LogicFlow`.
///
/// The port counts come from the type's metadata and never change; only the
/// name, the input references and the successor ids are editable.
pub struct FlowNode {
    id: NodeId,
    node_type: String,
    name: String,
    inputs: Vec<DataReference>,
    next_nodes: Vec<Option<NodeId>>,
    metadata: Arc<NodeMetadata>,
    behavior: Arc<dyn Node>,
}

impl FlowNode {
    pub(crate) fn new(
        id: NodeId,
        node_type: impl Into<String>,
        name: impl Into<String>,
        metadata: Arc<NodeMetadata>,
        behavior: Arc<dyn Node>,
    ) -> Self {
        Self {
            id,
            node_type: node_type.into(),
            name: name.into(),
            inputs: vec![DataReference::null(); metadata.input_count()],
            next_nodes: vec![None; metadata.branch_count()],
            metadata,
            behavior,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    pub fn is_event(&self) -> bool {
        self.metadata.is_event()
    }

    pub fn inputs(&self) -> &[DataReference] {
        &self.inputs
    }

    pub fn input(&self, index: usize) -> Option<&DataReference> {
        self.inputs.get(index)
    }

    /// Replace an input reference; returns false if the port does not exist
    pub fn set_input(&mut self, index: usize, reference: DataReference) -> bool {
        match self.inputs.get_mut(index) {
            Some(slot) => {
                *slot = reference;
                true
            }
            None => false,
        }
    }

    pub fn next_nodes(&self) -> &[Option<NodeId>] {
        &self.next_nodes
    }

    pub fn next_node(&self, index: usize) -> Option<NodeId> {
        self.next_nodes.get(index).copied().flatten()
    }

    /// Point a branch at a successor (or clear it); returns false if the
    /// branch does not exist
    pub fn set_next(&mut self, index: usize, target: Option<NodeId>) -> bool {
        match self.next_nodes.get_mut(index) {
            Some(slot) => {
                *slot = target;
                true
            }
            None => false,
        }
    }

    /// Structurally identical node re-created through the registry
    pub fn copy(&self, registry: &NodeRegistry) -> Result<FlowNode, RegistryError> {
        let mut copy = registry.create(&self.node_type, self.id, self.name.clone())?;
        copy.inputs = self.inputs.clone();
        copy.next_nodes = self.next_nodes.clone();
        Ok(copy)
    }

    /// Execute this node inside `ctx` and return the successor to run next.
    pub fn execute<'f>(
        &self,
        flow: &'f LogicFlow,
        ctx: &mut ExecutionContext,
        bus: &EventBus,
    ) -> Result<Option<&'f FlowNode>, FlowError> {
        let mut resolved = Vec::with_capacity(self.inputs.len());
        for reference in &self.inputs {
            resolved.push(reference.resolve(flow, ctx)?);
        }

        let emitter = bus.create_emitter(ctx.id(), self.id);
        let (status, variables) = ctx.scope_mut(self);
        status.inputs = resolved;

        let branch = {
            let mut node_ctx = NodeContext::new(
                self.id,
                &status.inputs,
                &mut status.outputs,
                variables,
                emitter,
            );
            self.behavior
                .execute(&mut node_ctx)
                .map_err(|source| self.failure(source))?
        };
        status.executed = true;

        let next = if self.next_nodes.is_empty() {
            None
        } else {
            match self.next_nodes.get(branch) {
                Some(slot) => *slot,
                None => {
                    return Err(self.failure(NodeError::BranchOutOfRange {
                        index: branch,
                        count: self.next_nodes.len(),
                    }))
                }
            }
        };
        status.branch = Some(branch);
        status.next = next;

        match next {
            Some(target) => flow
                .node(target)
                .map(Some)
                .ok_or(FlowError::MissingSuccessor {
                    node: self.id,
                    target,
                }),
            None => Ok(None),
        }
    }

    fn failure(&self, source: NodeError) -> FlowError {
        FlowError::Node {
            node: self.id,
            name: self.name.clone(),
            source,
        }
    }

    /// Static description of this node's wiring
    pub fn describe(&self, flow: &LogicFlow) -> String {
        let mut out = format!("#{} \"{}\" [{}]\n", self.id, self.name, self.node_type);
        for (index, reference) in self.inputs.iter().enumerate() {
            let port = port_name(&self.metadata.inputs, index);
            let _ = write!(out, "  in {} {} <- {}", index, port, reference);
            if let DataReference::NodeOutput { node, index: output } = reference {
                match flow.node(*node) {
                    Some(source) => {
                        let _ = write!(
                            out,
                            " ({}.{})",
                            source.name,
                            port_name(&source.metadata.outputs, *output)
                        );
                    }
                    None => out.push_str(" (dangling)"),
                }
            }
            out.push('\n');
        }
        for (index, next) in self.next_nodes.iter().enumerate() {
            let port = port_name(&self.metadata.branches, index);
            let target = match next.and_then(|id| flow.node(id)) {
                Some(node) => format!("#{} \"{}\"", node.id, node.name),
                None => "none".to_string(),
            };
            let _ = writeln!(out, "  next {} {} -> {}", index, port, target);
        }
        out
    }
}

fn port_name(ports: &[PortDefinition], index: usize) -> &str {
    ports.get(index).map(|p| p.name.as_str()).unwrap_or("?")
}

impl PartialEq for FlowNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.node_type == other.node_type
            && self.name == other.name
            && self.inputs == other.inputs
            && self.next_nodes == other.next_nodes
    }
}

impl fmt::Debug for FlowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowNode")
            .field("id", &self.id)
            .field("node_type", &self.node_type)
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("next_nodes", &self.next_nodes)
            .finish_non_exhaustive()
    }
}
