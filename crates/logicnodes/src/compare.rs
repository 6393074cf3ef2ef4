use logiccore::{Node, NodeContext, NodeError, NodeFactory, NodeMetadata};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Greater,
    Less,
    Equal,
}

impl CompareOp {
    pub const ALL: [CompareOp; 3] = [CompareOp::Greater, CompareOp::Less, CompareOp::Equal];

    pub fn node_type(&self) -> &'static str {
        match self {
            CompareOp::Greater => "compare.greater",
            CompareOp::Less => "compare.less",
            CompareOp::Equal => "compare.equal",
        }
    }
}

/// Compares two inputs and outputs a boolean
pub struct CompareNode {
    op: CompareOp,
}

impl CompareNode {
    pub fn new(op: CompareOp) -> Self {
        Self { op }
    }
}

impl Node for CompareNode {
    fn node_type(&self) -> &str {
        self.op.node_type()
    }

    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        let result = match self.op {
            CompareOp::Greater => ctx.require_number(0, "a")? > ctx.require_number(1, "b")?,
            CompareOp::Less => ctx.require_number(0, "a")? < ctx.require_number(1, "b")?,
            // null equals null
            CompareOp::Equal => ctx.input(0) == ctx.input(1),
        };
        ctx.set_output(0, result)?;
        Ok(0)
    }
}

pub struct CompareNodeFactory(pub CompareOp);

impl NodeFactory for CompareNodeFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(CompareNode::new(self.0))
    }

    fn node_type(&self) -> &str {
        self.0.node_type()
    }

    fn metadata(&self) -> NodeMetadata {
        let description = match self.0 {
            CompareOp::Greater => "True when a > b",
            CompareOp::Less => "True when a < b",
            CompareOp::Equal => "True when a equals b",
        };
        NodeMetadata::new("compare", description)
            .with_input("a", "Left operand")
            .with_input("b", "Right operand")
            .with_output("result", "Comparison result")
            .with_branch("next", "Next node")
    }
}
