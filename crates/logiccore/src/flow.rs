use crate::{FlowNode, NodeId};
use std::collections::HashMap;

/// A successor slot of one node: branch `slot` of node `from`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchLink {
    pub from: NodeId,
    pub slot: usize,
}

/// A node taken out of a flow, with the successor slots that pointed at it
#[derive(Debug)]
pub struct Detached {
    pub node: FlowNode,
    pub links: Vec<BranchLink>,
}

/// The persistent node graph.
///
/// Nodes live in an id-keyed arena; every relationship between them (input
/// references, successor slots, the start pointer) is an id lookup.
#[derive(Debug)]
pub struct LogicFlow {
    name: String,
    start_node_id: Option<NodeId>,
    nodes: HashMap<NodeId, FlowNode>,
    next_id: NodeId,
}

impl LogicFlow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_node_id: None,
            nodes: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn start_node_id(&self) -> Option<NodeId> {
        self.start_node_id
    }

    pub fn start_node(&self) -> Option<&FlowNode> {
        self.start_node_id.and_then(|id| self.nodes.get(&id))
    }

    pub fn node(&self, id: NodeId) -> Option<&FlowNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut FlowNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes, ordered by id
    pub fn nodes(&self) -> Vec<&FlowNode> {
        let mut nodes: Vec<&FlowNode> = self.nodes.values().collect();
        nodes.sort_by_key(|n| n.id());
        nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Id of the node with the given display name (lowest id on ties)
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.name() == name)
            .map(|n| n.id())
            .min()
    }

    /// Reserve a fresh node id
    pub fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Insert (or overwrite) a node under its own id
    pub fn insert_node(&mut self, node: FlowNode) -> Option<FlowNode> {
        if node.id() >= self.next_id {
            self.next_id = node.id() + 1;
        }
        self.nodes.insert(node.id(), node)
    }

    /// Designate an existing event node as the start; false otherwise
    pub fn set_start(&mut self, id: NodeId) -> bool {
        match self.nodes.get(&id) {
            Some(node) if node.is_event() => {
                self.start_node_id = Some(id);
                true
            }
            _ => false,
        }
    }

    /// Successor slots of other nodes that point at `id`
    pub fn links_to(&self, id: NodeId) -> Vec<BranchLink> {
        let mut links: Vec<BranchLink> = self
            .nodes
            .values()
            .filter(|n| n.id() != id)
            .flat_map(|n| {
                n.next_nodes()
                    .iter()
                    .enumerate()
                    .filter(move |(_, next)| **next == Some(id))
                    .map(move |(slot, _)| BranchLink { from: n.id(), slot })
            })
            .collect();
        links.sort_by_key(|l| (l.from, l.slot));
        links
    }

    /// Point each of `links` at `target`, skipping nodes that are gone
    pub fn attach(&mut self, target: NodeId, links: &[BranchLink]) {
        for link in links {
            if let Some(node) = self.nodes.get_mut(&link.from) {
                node.set_next(link.slot, Some(target));
            }
        }
    }

    fn detach(&mut self, links: &[BranchLink]) {
        for link in links {
            if let Some(node) = self.nodes.get_mut(&link.from) {
                node.set_next(link.slot, None);
            }
        }
    }

    /// Remove a node and clear every successor slot pointing at it.
    ///
    /// The start node cannot be removed, only replaced.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Detached> {
        if self.start_node_id == Some(id) {
            return None;
        }
        let node = self.nodes.remove(&id)?;
        let links = self.links_to(id);
        self.detach(&links);
        Some(Detached { node, links })
    }

    /// Empty the flow again by removing its only node, the start.
    ///
    /// This undoes giving an empty flow its first start node. While other
    /// nodes exist the start stays and `None` is returned; use
    /// `replace_start` to swap it instead.
    pub fn clear_start(&mut self) -> Option<Detached> {
        if self.nodes.len() > 1 {
            return None;
        }
        self.take_start()
    }

    fn take_start(&mut self) -> Option<Detached> {
        let old = self.start_node_id.take()?;
        let links = self.links_to(old);
        self.detach(&links);
        self.nodes.remove(&old).map(|node| Detached { node, links })
    }

    /// Swap the start node for a new event node.
    ///
    /// The old start (if any) is removed with its incoming successor slots
    /// cleared; the caller decides whether to re-attach them. A node that is
    /// not an event node is handed back unchanged.
    pub fn replace_start(&mut self, node: FlowNode) -> Result<Option<Detached>, FlowNode> {
        if !node.is_event() {
            return Err(node);
        }
        let previous = self.take_start();
        self.start_node_id = Some(node.id());
        self.insert_node(node);
        Ok(previous)
    }

    /// Static description of the whole flow
    pub fn describe(&self) -> String {
        let mut out = format!("Flow \"{}\"", self.name);
        match self.start_node() {
            Some(start) => out.push_str(&format!(" (start: #{} \"{}\")\n", start.id(), start.name())),
            None => out.push_str(" (empty)\n"),
        }
        for node in self.nodes() {
            out.push_str(&node.describe(self));
        }
        out
    }
}

impl PartialEq for LogicFlow {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.start_node_id == other.start_node_id
            && self.nodes == other.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pair_flow, registry};

    #[test]
    fn start_is_only_cleared_from_a_lone_start() {
        let registry = registry();
        let mut flow = pair_flow(&registry);

        assert!(flow.remove_node(1).is_none());
        assert!(flow.clear_start().is_none());
        assert_eq!(flow.start_node_id(), Some(1));
        assert_eq!(flow.len(), 2);

        let detached = flow.remove_node(2).unwrap();
        assert_eq!(detached.links, vec![BranchLink { from: 1, slot: 0 }]);
        assert_eq!(flow.node(1).unwrap().next_node(0), None);

        let cleared = flow.clear_start().unwrap();
        assert_eq!(cleared.node.id(), 1);
        assert!(flow.is_empty());
        assert!(flow.start_node().is_none());
    }

    #[test]
    fn replacing_start_detaches_old_one() {
        let registry = registry();
        let mut flow = pair_flow(&registry);
        let id = flow.allocate_id();
        let replacement = registry.create("test.event", id, "E2").unwrap();

        let previous = flow.replace_start(replacement).unwrap().unwrap();
        assert_eq!(previous.node.id(), 1);
        assert_eq!(flow.start_node_id(), Some(id));
        assert!(!flow.contains(1));

        let not_event = registry.create("test.pair", flow.allocate_id(), "X").unwrap();
        assert!(flow.replace_start(not_event).is_err());
        assert_eq!(flow.start_node_id(), Some(id));
    }
}
