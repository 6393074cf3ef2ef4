use crate::{FlowNode, Node, NodeId, NodeMetadata, RegistryError};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating node behaviors
pub trait NodeFactory: Send + Sync {
    /// Create the behavior shared by every node of this type
    fn create(&self) -> Arc<dyn Node>;

    /// Get node type identifier
    fn node_type(&self) -> &str;

    /// Port shapes and description of this node type
    fn metadata(&self) -> NodeMetadata;
}

struct RegisteredType {
    factory: Arc<dyn NodeFactory>,
    metadata: Arc<NodeMetadata>,
}

/// Registry of available node types.
///
/// Every `FlowNode` is built here, so the serializer and the editor can
/// re-create concrete node types from their type tag alone.
pub struct NodeRegistry {
    factories: HashMap<String, RegisteredType>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a node factory
    pub fn register(&mut self, factory: Arc<dyn NodeFactory>) {
        let node_type = factory.node_type().to_string();
        tracing::info!("Registering node type: {}", node_type);
        let metadata = Arc::new(factory.metadata());
        self.factories
            .insert(node_type, RegisteredType { factory, metadata });
    }

    /// Create a node of the given type with default (unconnected) ports
    pub fn create(
        &self,
        node_type: &str,
        id: NodeId,
        name: impl Into<String>,
    ) -> Result<FlowNode, RegistryError> {
        let entry = self
            .factories
            .get(node_type)
            .ok_or_else(|| RegistryError::UnknownNodeType(node_type.to_string()))?;

        Ok(FlowNode::new(
            id,
            node_type,
            name,
            Arc::clone(&entry.metadata),
            entry.factory.create(),
        ))
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.factories.contains_key(node_type)
    }

    /// Get all registered node types, sorted
    pub fn list_node_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Get metadata for a node type
    pub fn get_metadata(&self, node_type: &str) -> Option<Arc<NodeMetadata>> {
        self.factories
            .get(node_type)
            .map(|entry| Arc::clone(&entry.metadata))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
