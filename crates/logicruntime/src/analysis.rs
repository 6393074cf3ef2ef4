use logiccore::{LogicFlow, NodeId};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};

/// Input whose reference points at a node missing from the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DanglingInput {
    pub node: NodeId,
    pub index: usize,
    pub target: NodeId,
}

/// Static report on a flow's successor graph.
///
/// Cycles are legal (runs are bounded by the step ceiling), so `cyclic` is
/// informational. Unreachable nodes never run; references to their outputs
/// always fail at run time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowAnalysis {
    pub reachable: Vec<NodeId>,
    pub unreachable: Vec<NodeId>,
    pub cyclic: bool,
    pub dangling_inputs: Vec<DanglingInput>,
}

impl FlowAnalysis {
    pub fn of(flow: &LogicFlow) -> Self {
        let (graph, node_to_index) = build_graph(flow);

        let mut reachable = Vec::new();
        if let Some(start) = flow.start_node_id().and_then(|id| node_to_index.get(&id)) {
            let mut dfs = Dfs::new(&graph, *start);
            while let Some(idx) = dfs.next(&graph) {
                reachable.push(graph[idx]);
            }
        }
        reachable.sort_unstable();

        let seen: HashSet<NodeId> = reachable.iter().copied().collect();
        let unreachable = flow
            .nodes()
            .into_iter()
            .map(|n| n.id())
            .filter(|id| !seen.contains(id))
            .collect();

        let mut dangling_inputs = Vec::new();
        for node in flow.nodes() {
            for (index, input) in node.inputs().iter().enumerate() {
                if let Some(target) = input.target() {
                    if !flow.contains(target) {
                        dangling_inputs.push(DanglingInput {
                            node: node.id(),
                            index,
                            target,
                        });
                    }
                }
            }
        }

        Self {
            reachable,
            unreachable,
            cyclic: is_cyclic_directed(&graph),
            dangling_inputs,
        }
    }

    /// True when every node can run and no input dangles
    pub fn is_clean(&self) -> bool {
        self.unreachable.is_empty() && self.dangling_inputs.is_empty()
    }
}

/// Successor graph of the flow; edge weights are branch slots
fn build_graph(flow: &LogicFlow) -> (DiGraph<NodeId, usize>, HashMap<NodeId, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut node_to_index = HashMap::new();

    for node in flow.nodes() {
        let idx = graph.add_node(node.id());
        node_to_index.insert(node.id(), idx);
    }

    for node in flow.nodes() {
        let from = node_to_index[&node.id()];
        for (slot, next) in node.next_nodes().iter().enumerate() {
            if let Some(to) = next.and_then(|id| node_to_index.get(&id)) {
                graph.add_edge(from, *to, slot);
            }
        }
    }

    (graph, node_to_index)
}
