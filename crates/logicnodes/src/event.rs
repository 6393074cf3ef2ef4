use logiccore::{Node, NodeContext, NodeError, NodeFactory, NodeMetadata, EVENT_CATEGORY};
use std::sync::Arc;

/// Start node of a flow.
///
/// Has no behavior of its own: its outputs are written by whoever raises
/// the event before the run starts.
pub struct EventNode {
    node_type: String,
}

impl Node for EventNode {
    fn node_type(&self) -> &str {
        &self.node_type
    }

    fn execute(&self, _ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        Ok(0)
    }
}

/// Factory for one event type and the shape of its payload
pub struct EventNodeFactory {
    node_type: String,
    description: String,
    payload: Vec<(String, String)>,
}

impl EventNodeFactory {
    pub fn new(node_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            description: description.into(),
            payload: Vec::new(),
        }
    }

    /// Add one payload value, exposed as an output of the event node
    pub fn with_payload(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.payload.push((name.into(), description.into()));
        self
    }

    /// Event types shipped with the engine
    pub fn standard() -> Vec<EventNodeFactory> {
        vec![
            EventNodeFactory::new("event.manual", "Triggered by hand"),
            EventNodeFactory::new("event.value", "Triggered with a single value")
                .with_payload("value", "Value supplied by the trigger"),
            EventNodeFactory::new("event.chat", "Triggered by a chat message")
                .with_payload("sender", "Name of the sender")
                .with_payload("message", "Message text"),
            EventNodeFactory::new("event.tick", "Triggered once per scheduler tick")
                .with_payload("tick", "Tick counter"),
        ]
    }
}

impl NodeFactory for EventNodeFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(EventNode {
            node_type: self.node_type.clone(),
        })
    }

    fn node_type(&self) -> &str {
        &self.node_type
    }

    fn metadata(&self) -> NodeMetadata {
        let metadata = NodeMetadata::new(EVENT_CATEGORY, self.description.clone())
            .with_branch("next", "First node to run");
        self.payload
            .iter()
            .fold(metadata, |m, (name, description)| m.with_output(name.clone(), description.clone()))
    }
}
