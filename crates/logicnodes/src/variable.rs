use logiccore::{Node, NodeContext, NodeError, NodeFactory, NodeMetadata, Value};
use std::sync::Arc;

/// Reads a run variable; unset variables read as null
pub struct GetVariableNode;

impl Node for GetVariableNode {
    fn node_type(&self) -> &str {
        "variable.get"
    }

    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        let name = ctx.require_text(0, "name")?;
        let value = ctx.variable(name).cloned().unwrap_or(Value::Null);
        ctx.set_output(0, value)?;
        Ok(0)
    }
}

pub struct GetVariableNodeFactory;

impl NodeFactory for GetVariableNodeFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(GetVariableNode)
    }

    fn node_type(&self) -> &str {
        "variable.get"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("variable", "Reads a variable of the current run")
            .with_input("name", "Variable name")
            .with_output("value", "Current value, null if unset")
            .with_branch("next", "Next node")
    }
}

/// Writes a run variable
pub struct SetVariableNode;

impl Node for SetVariableNode {
    fn node_type(&self) -> &str {
        "variable.set"
    }

    fn execute(&self, ctx: &mut NodeContext<'_>) -> Result<usize, NodeError> {
        let name = ctx.require_text(0, "name")?.to_string();
        let value = ctx.input(1).clone();
        ctx.set_variable(name, value);
        Ok(0)
    }
}

pub struct SetVariableNodeFactory;

impl NodeFactory for SetVariableNodeFactory {
    fn create(&self) -> Arc<dyn Node> {
        Arc::new(SetVariableNode)
    }

    fn node_type(&self) -> &str {
        "variable.set"
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::new("variable", "Writes a variable of the current run")
            .with_input("name", "Variable name")
            .with_input("value", "Value to store")
            .with_branch("next", "Next node")
    }
}
