use logiccore::{Node, NodeContext, NodeError, NodeFactory, NodeMetadata, Value};
use std::sync::Arc;

/// Concatenates the string forms of two values
pub struct ConcatNode;

impl Node for ConcatNode {
    fn node_type(&self) -> &str {
        "text.concat"
    }

    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        let joined = format!(
            "{}{}",
            ctx.require_input(0, "a")?,
            ctx.require_input(1, "b")?
        );
        ctx.set_output(0, Value::Text(joined))?;
        Ok(0)
    }
}

pub struct ConcatNodeFactory;

impl NodeFactory for ConcatNodeFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(ConcatNode)
    }

    fn node_type(&self) -> &str {
        "text.concat"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("text", "Joins two values as text")
            .with_input("a", "First part")
            .with_input("b", "Second part")
            .with_output("result", "a followed by b")
            .with_branch("next", "Next node")
    }
}
