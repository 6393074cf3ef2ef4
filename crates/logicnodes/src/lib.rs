//! Standard node library
//!
//! Collection of built-in node types: events, arithmetic, comparisons,
//! branching, variables and messaging.

mod compare;
mod event;
mod logic;
mod math;
mod message;
mod text;
mod variable;

pub use compare::{CompareNode, CompareNodeFactory, CompareOp};
pub use event::{EventNode, EventNodeFactory};
pub use logic::{IfNode, IfNodeFactory, SignNode, SignNodeFactory};
pub use math::{ArithmeticNode, ArithmeticNodeFactory, ArithmeticOp};
pub use message::{SendMessageNode, SendMessageNodeFactory};
pub use text::{ConcatNode, ConcatNodeFactory};
pub use variable::{GetVariableNode, GetVariableNodeFactory, SetVariableNode, SetVariableNodeFactory};

use logiccore::NodeRegistry;
use std::sync::Arc;

/// Register all standard nodes with a registry
pub fn register_all(registry: &mut NodeRegistry) {
    for factory in EventNodeFactory::standard() {
        registry.register(Arc::new(factory));
    }
    for op in ArithmeticOp::ALL {
        registry.register(Arc::new(ArithmeticNodeFactory(op)));
    }
    for op in CompareOp::ALL {
        registry.register(Arc::new(CompareNodeFactory(op)));
    }
    registry.register(Arc::new(IfNodeFactory));
    registry.register(Arc::new(SignNodeFactory));
    registry.register(Arc::new(GetVariableNodeFactory));
    registry.register(Arc::new(SetVariableNodeFactory));
    registry.register(Arc::new(SendMessageNodeFactory));
    registry.register(Arc::new(ConcatNodeFactory));
}

/// Registry holding every standard node type
pub fn standard_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_all(&mut registry);
    registry
}
