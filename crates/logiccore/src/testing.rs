//! Small node types for unit tests

use crate::{
    LogicFlow, Node, NodeContext, NodeError, NodeFactory, NodeMetadata, NodeRegistry,
    EVENT_CATEGORY,
};
use std::sync::Arc;

type Behavior = fn(&mut NodeContext<'_>) -> Result<usize, NodeError>;

struct FnNode {
    node_type: String,
    behavior: Behavior,
}

impl Node for FnNode {
    fn node_type(&self) -> &str {
        &self.node_type
    }

    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        (self.behavior)(ctx)
    }
}

struct FnFactory {
    node_type: String,
    metadata: NodeMetadata,
    behavior: Behavior,
}

impl NodeFactory for FnFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(FnNode {
            node_type: self.node_type.clone(),
            behavior: self.behavior,
        })
    }

    fn node_type(&self) -> &str {
        &self.node_type
    }

    fn metadata(&self) -> NodeMetadata {
        self.metadata.clone()
    }
}

fn add(ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
    let sum = ctx.require_number(0, "a")? + ctx.require_number(1, "b")?;
    ctx.set_output(0, sum)?;
    Ok(0)
}

/// Registry with `test.event` (one output) and `test.pair` (a + b)
pub(crate) fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(Arc::new(FnFactory {
        node_type: "test.event".to_string(),
        metadata: NodeMetadata::new(EVENT_CATEGORY, "Test event")
            .with_output("value", "Payload")
            .with_branch("next", "First node"),
        behavior: |_| Ok(0),
    }));
    registry.register(Arc::new(FnFactory {
        node_type: "test.pair".to_string(),
        metadata: NodeMetadata::new("math", "Adds two numbers")
            .with_input("a", "First operand")
            .with_input("b", "Second operand")
            .with_output("sum", "a + b")
            .with_branch("next", "Next node"),
        behavior: add,
    }));
    registry
}

/// `E` (#1, test.event) followed by `P` (#2, test.pair = E.value + 1)
pub(crate) fn pair_flow(registry: &NodeRegistry) -> LogicFlow {
    let mut flow = LogicFlow::new("wiring");
    let mut start = registry
        .create("test.event", flow.allocate_id(), "E")
        .unwrap();
    let mut pair = registry
        .create("test.pair", flow.allocate_id(), "P")
        .unwrap();
    start.set_next(0, Some(pair.id()));
    pair.set_input(0, crate::DataReference::output(start.id(), 0));
    pair.set_input(1, crate::DataReference::constant(1.0));
    flow.replace_start(start).unwrap();
    flow.insert_node(pair);
    flow
}
