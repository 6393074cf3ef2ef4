use crate::NodeId;
use thiserror::Error;

/// Flow-level failure that aborts an execution context.
///
/// The `Display` output is the human-facing message; the wrapped
/// `NodeError`, when present, is exposed through `Error::source`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Dangling reference: node {node} does not exist in this flow")]
    DanglingReference { node: NodeId },

    #[error("Node {node} has not been executed yet in this run")]
    NotExecuted { node: NodeId },

    #[error("Node {node} has no output {index}")]
    OutputOutOfRange { node: NodeId, index: usize },

    #[error("Dead loop: more than {ceiling} nodes executed in one run")]
    DeadLoop { ceiling: usize },

    #[error("Flow has no start node")]
    MissingStart,

    #[error("Successor {target} of node {node} does not exist")]
    MissingSuccessor { node: NodeId, target: NodeId },

    #[error("Node {node} ({name}) failed: {source}")]
    Node {
        node: NodeId,
        name: String,
        #[source]
        source: NodeError,
    },
}

impl FlowError {
    /// Id of the node the failure is attributed to, if any
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            FlowError::DanglingReference { node }
            | FlowError::NotExecuted { node }
            | FlowError::OutputOutOfRange { node, .. }
            | FlowError::MissingSuccessor { node, .. }
            | FlowError::Node { node, .. } => Some(*node),
            FlowError::DeadLoop { .. } | FlowError::MissingStart => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Missing required input {index} ({name})")]
    MissingInput { index: usize, name: String },

    #[error("Invalid input type for '{field}': expected {expected}, got {actual}")]
    InvalidInputType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Output index {index} is out of range")]
    OutputOutOfRange { index: usize },

    #[error("Branch {index} is out of range ({count} branches)")]
    BranchOutOfRange { index: usize, count: usize },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Node type {0} is not an event type")]
    NotAnEventType(String),
}
