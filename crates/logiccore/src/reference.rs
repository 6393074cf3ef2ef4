use crate::{ExecutionContext, FlowError, LogicFlow, NodeId, Value};
use std::fmt;
use std::sync::Arc;

/// Source of a node input: a constant or another node's output slot.
///
/// Cloning a constant shares the underlying value instead of copying it,
/// so a published constant must be treated as immutable.
#[derive(Debug, Clone, PartialEq)]
pub enum DataReference {
    Constant(Arc<Value>),
    NodeOutput { node: NodeId, index: usize },
}

impl DataReference {
    pub fn constant(value: impl Into<Value>) -> Self {
        DataReference::Constant(Arc::new(value.into()))
    }

    pub fn output(node: NodeId, index: usize) -> Self {
        DataReference::NodeOutput { node, index }
    }

    /// Constant `null`, the value of an unconnected input
    pub fn null() -> Self {
        DataReference::Constant(Arc::new(Value::Null))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, DataReference::Constant(_))
    }

    /// Node this reference points at, if it is not a constant
    pub fn target(&self) -> Option<NodeId> {
        match self {
            DataReference::Constant(_) => None,
            DataReference::NodeOutput { node, .. } => Some(*node),
        }
    }

    /// Resolve the reference against one run of `flow`.
    ///
    /// A node output is only readable once its node has executed in the
    /// same context; earlier reads fail instead of yielding a default.
    pub fn resolve(&self, flow: &LogicFlow, ctx: &ExecutionContext) -> Result<Value, FlowError> {
        match self {
            DataReference::Constant(value) => Ok(Value::clone(value)),
            DataReference::NodeOutput { node, index } => {
                if flow.node(*node).is_none() {
                    return Err(FlowError::DanglingReference { node: *node });
                }
                ctx.output(*node, *index).cloned()
            }
        }
    }
}

impl Default for DataReference {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for DataReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataReference::Constant(value) => match value.as_ref() {
                Value::Text(s) => write!(f, "\"{}\"", s),
                other => write!(f, "{}", other),
            },
            DataReference::NodeOutput { node, index } => write!(f, "#{}[{}]", node, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_constant() {
        let original = DataReference::constant(2.5);
        let copy = original.clone();
        match (&original, &copy) {
            (DataReference::Constant(a), DataReference::Constant(b)) => {
                assert!(Arc::ptr_eq(a, b));
            }
            _ => panic!("expected constants"),
        }
    }

    #[test]
    fn display_forms() {
        assert_eq!(DataReference::output(4, 1).to_string(), "#4[1]");
        assert_eq!(DataReference::constant("hi").to_string(), "\"hi\"");
        assert_eq!(DataReference::null().to_string(), "null");
    }
}
