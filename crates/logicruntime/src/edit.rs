use logiccore::{BranchLink, DataReference, FlowNode, LogicFlow, NodeId, NodeRegistry, RegistryError};

/// One structural mutation of a flow.
///
/// Edits address nodes by id and are re-resolved against whichever flow they
/// are applied to, so applying the same edit twice leaves the flow unchanged.
#[derive(Debug)]
pub(crate) enum Edit {
    /// Insert a copy of `node` and point `links` at it
    Insert { node: FlowNode, links: Vec<BranchLink> },
    Remove { id: NodeId },
    Rename { id: NodeId, name: String },
    /// Swap in a copy of `node` as the start and point `links` at it
    ReplaceStart { node: FlowNode, links: Vec<BranchLink> },
    /// Drop the start node; the inverse of giving an empty flow its start
    ClearStart,
    SetInput {
        id: NodeId,
        index: usize,
        reference: DataReference,
    },
    SetNext {
        id: NodeId,
        index: usize,
        target: Option<NodeId>,
    },
}

impl Edit {
    pub(crate) fn apply(
        &self,
        flow: &mut LogicFlow,
        registry: &NodeRegistry,
    ) -> Result<(), RegistryError> {
        match self {
            Edit::Insert { node, links } => {
                flow.insert_node(node.copy(registry)?);
                flow.attach(node.id(), links);
            }
            Edit::Remove { id } => {
                flow.remove_node(*id);
            }
            Edit::Rename { id, name } => {
                if let Some(node) = flow.node_mut(*id) {
                    node.set_name(name.clone());
                }
            }
            Edit::ReplaceStart { node, links } => {
                if flow.replace_start(node.copy(registry)?).is_ok() {
                    flow.attach(node.id(), links);
                }
            }
            Edit::ClearStart => {
                flow.clear_start();
            }
            Edit::SetInput {
                id,
                index,
                reference,
            } => {
                if let Some(node) = flow.node_mut(*id) {
                    node.set_input(*index, reference.clone());
                }
            }
            Edit::SetNext { id, index, target } => {
                if let Some(node) = flow.node_mut(*id) {
                    node.set_next(*index, *target);
                }
            }
        }
        Ok(())
    }
}

/// A reversible edit: the forward mutation paired with its inverse
#[derive(Debug)]
pub struct EditPath {
    label: String,
    forward: Edit,
    inverse: Edit,
}

impl EditPath {
    pub(crate) fn new(label: impl Into<String>, forward: Edit, inverse: Edit) -> Self {
        Self {
            label: label.into(),
            forward,
            inverse,
        }
    }

    /// Short human-readable description, e.g. `rename #3`
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn apply(
        &self,
        flow: &mut LogicFlow,
        registry: &NodeRegistry,
    ) -> Result<(), RegistryError> {
        self.forward.apply(flow, registry)
    }

    pub(crate) fn revert(
        &self,
        flow: &mut LogicFlow,
        registry: &NodeRegistry,
    ) -> Result<(), RegistryError> {
        self.inverse.apply(flow, registry)
    }
}
