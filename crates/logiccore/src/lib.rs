//! Core abstractions for the logic flow engine
//!
//! This crate provides the data model every other component depends on:
//! values and data references, the node contract and registry, the
//! persistent `LogicFlow` graph and the per-run `ExecutionContext`.

mod context;
mod error;
pub mod events;
mod flow;
mod node;
mod reference;
mod registry;
mod status;
#[cfg(test)]
mod testing;
mod value;

pub use context::{ExecutionContext, Trigger};
pub use error::{FlowError, NodeError, RegistryError};
pub use events::*;
pub use flow::{BranchLink, Detached, LogicFlow};
pub use node::{FlowNode, Node, NodeContext, NodeId, NodeMetadata, PortDefinition, EVENT_CATEGORY};
pub use reference::DataReference;
pub use registry::{NodeFactory, NodeRegistry};
pub use status::NodeStatus;
pub use value::Value;

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
