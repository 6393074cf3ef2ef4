// crates/logicruntime/tests/analysis_test.rs

use logiccore::DataReference;
use logicruntime::{DanglingInput, FlowAnalysis, FlowManager, RuntimeConfig};
use std::sync::Arc;

fn manager() -> FlowManager {
    let registry = Arc::new(logicnodes::standard_registry());
    let mut manager =
        FlowManager::create("analysis", "event.value", registry, RuntimeConfig::default()).unwrap();
    manager.create_node("math.add", "A").unwrap().unwrap();
    assert!(manager.set_reference_input("A", 0, "start", 0));
    assert!(manager.set_constant_input("A", 1, 1.0));
    assert!(manager.set_next_node("start", 0, "A"));
    manager
}

#[test]
fn test_linear_flow_is_clean() {
    let analysis = FlowAnalysis::of(manager().flow());
    assert_eq!(analysis.reachable, vec![1, 2]);
    assert!(analysis.unreachable.is_empty());
    assert!(!analysis.cyclic);
    assert!(analysis.is_clean());
}

#[test]
fn test_detects_unreachable_nodes_and_cycles() {
    let mut manager = manager();
    manager.create_node("message.send", "Orphan").unwrap().unwrap();
    assert!(manager.set_next_node("A", 0, "start"));

    let analysis = FlowAnalysis::of(manager.flow());
    assert_eq!(analysis.unreachable, vec![3]);
    assert!(analysis.cyclic);
    assert!(!analysis.is_clean());
}

#[test]
fn test_detects_dangling_inputs() {
    let mut manager = manager();
    assert!(manager.replace_start("event.manual").unwrap());

    let analysis = FlowAnalysis::of(manager.flow());
    assert_eq!(
        analysis.dangling_inputs,
        vec![DanglingInput {
            node: 2,
            index: 0,
            target: 1
        }]
    );
    assert_eq!(
        manager.flow().node(2).unwrap().input(0),
        Some(&DataReference::output(1, 0))
    );
}

#[test]
fn test_empty_flow_has_nothing_reachable() {
    let flow = logiccore::LogicFlow::new("empty");
    let analysis = FlowAnalysis::of(&flow);
    assert!(analysis.reachable.is_empty());
    assert!(analysis.is_clean());
}
