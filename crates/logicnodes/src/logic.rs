use logiccore::{Node, NodeContext, NodeError, NodeFactory, NodeMetadata};
use std::sync::Arc;

/// Follows branch 0 when the condition holds, branch 1 otherwise
pub struct IfNode;

impl Node for IfNode {
    fn node_type(&self) -> &str {
        "logic.if"
    }

    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        let condition = ctx.require_bool(0, "condition")?;
        Ok(if condition { 0 } else { 1 })
    }
}

pub struct IfNodeFactory;

impl NodeFactory for IfNodeFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(IfNode)
    }

    fn node_type(&self) -> &str {
        "logic.if"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("logic", "Branches on a boolean condition")
            .with_input("condition", "Boolean to test")
            .with_branch("true", "Taken when the condition holds")
            .with_branch("false", "Taken otherwise")
    }
}

/// Three-way branch on the sign of a number
pub struct SignNode;

impl Node for SignNode {
    fn node_type(&self) -> &str {
        "logic.sign"
    }

    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        let value = ctx.require_number(0, "value")?;
        if value.is_nan() {
            return Err(NodeError::ExecutionFailed("value is NaN".to_string()));
        }
        Ok(if value < 0.0 {
            0
        } else if value == 0.0 {
            1
        } else {
            2
        })
    }
}

pub struct SignNodeFactory;

impl NodeFactory for SignNodeFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(SignNode)
    }

    fn node_type(&self) -> &str {
        "logic.sign"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("logic", "Branches on the sign of a number")
            .with_input("value", "Number to test")
            .with_branch("negative", "Taken when value < 0")
            .with_branch("zero", "Taken when value == 0")
            .with_branch("positive", "Taken when value > 0")
    }
}
