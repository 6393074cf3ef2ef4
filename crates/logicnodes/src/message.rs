use logiccore::{Node, NodeContext, NodeError, NodeFactory, NodeMetadata};
use std::sync::Arc;

/// Emits its input as a user-facing message on the event bus
pub struct SendMessageNode;

impl Node for SendMessageNode {
    fn node_type(&self) -> &str {
        "message.send"
    }

    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        let text = ctx.require_input(0, "text")?.to_string();
        tracing::info!("Node {} says: {}", ctx.node_id, text);
        ctx.events().message(text);
        Ok(0)
    }
}

pub struct SendMessageNodeFactory;

impl NodeFactory for SendMessageNodeFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(SendMessageNode)
    }

    fn node_type(&self) -> &str {
        "message.send"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("message", "Sends a message")
            .with_input("text", "Message; non-text values are rendered")
            .with_branch("next", "Next node")
    }
}
