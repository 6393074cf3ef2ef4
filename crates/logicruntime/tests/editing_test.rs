// crates/logicruntime/tests/editing_test.rs

use logiccore::{DataReference, LogicFlow, RegistryError, Trigger, Value};
use logicruntime::{FlowDocument, FlowManager, FlowSerializer, RuntimeConfig};
use std::sync::Arc;

fn scenario() -> FlowManager {
    let registry = Arc::new(logicnodes::standard_registry());
    let mut manager =
        FlowManager::create("scenario", "event.value", registry, RuntimeConfig::default()).unwrap();
    assert!(manager.rename_node("start", "E"));
    manager.create_node("math.add", "A").unwrap().unwrap();
    assert!(manager.set_reference_input("A", 0, "E", 0));
    assert!(manager.set_constant_input("A", 1, 1.0));
    assert!(manager.set_next_node("E", 0, "A"));
    manager
}

fn snapshot(manager: &FlowManager) -> FlowDocument {
    FlowSerializer::new(manager.registry().clone()).to_document(manager.flow())
}

/// Apply `edit`, then check that undo restores and redo re-applies it
fn assert_reversible(manager: &mut FlowManager, edit: impl FnOnce(&mut FlowManager) -> bool) {
    let before = snapshot(manager);
    assert!(edit(manager), "edit was a no-op");
    let after = snapshot(manager);
    assert_ne!(before, after);

    assert!(manager.undo().unwrap());
    assert_eq!(snapshot(manager), before);

    assert!(manager.redo().unwrap());
    assert_eq!(snapshot(manager), after);
}

#[test]
fn test_every_edit_is_reversible() {
    let mut manager = scenario();

    assert_reversible(&mut manager, |m| m.create_node("compare.greater", "C").unwrap().is_some());
    assert_reversible(&mut manager, |m| m.set_reference_input("C", 0, "A", 0));
    assert_reversible(&mut manager, |m| m.set_constant_input("C", 1, 3.0));
    assert_reversible(&mut manager, |m| m.set_next_node("A", 0, "C"));
    assert_reversible(&mut manager, |m| m.rename_node("C", "Check"));
    assert_reversible(&mut manager, |m| m.disconnect_input("A", 1));
    assert_reversible(&mut manager, |m| m.disconnect_next_node("E", 0));
    assert_reversible(&mut manager, |m| m.remove_node("Check").unwrap());
    assert_reversible(&mut manager, |m| m.replace_start("event.chat").unwrap());
}

#[test]
fn test_undo_restores_removed_node_links() {
    let mut manager = scenario();
    assert!(manager.remove_node("A").unwrap());
    assert!(manager.flow().find_by_name("A").is_none());
    assert_eq!(manager.flow().start_node().unwrap().next_node(0), None);

    assert!(manager.undo().unwrap());
    let a = manager.flow().find_by_name("A").unwrap();
    assert_eq!(manager.flow().start_node().unwrap().next_node(0), Some(a));
    assert_eq!(manager.execute(Trigger::new().with_output(5.0)), None);
    assert_eq!(manager.last_run().unwrap().output(a, 0).unwrap(), &Value::Number(6.0));
}

#[test]
fn test_new_edit_clears_redo() {
    let mut manager = scenario();
    assert!(manager.rename_node("A", "B"));
    assert!(manager.undo().unwrap());
    assert!(manager.can_redo());

    assert!(manager.set_constant_input("A", 1, 2.0));
    assert!(!manager.can_redo());
    assert!(!manager.redo().unwrap());
}

#[test]
fn test_undo_and_redo_on_empty_stacks() {
    let registry = Arc::new(logicnodes::standard_registry());
    let mut manager =
        FlowManager::create("empty", "event.manual", registry, RuntimeConfig::default()).unwrap();
    assert!(!manager.can_undo());
    assert!(!manager.undo().unwrap());
    assert!(!manager.redo().unwrap());
}

#[test]
fn test_edits_disable_dispatch() {
    let mut manager = scenario();

    manager.set_enabled(true);
    assert!(manager.set_constant_input("A", 1, 2.0));
    assert!(!manager.is_enabled());

    manager.set_enabled(true);
    assert!(manager.undo().unwrap());
    assert!(!manager.is_enabled());

    manager.set_enabled(true);
    assert!(manager.redo().unwrap());
    assert!(!manager.is_enabled());
}

#[test]
fn test_reference_to_missing_node_is_a_no_op() {
    let mut manager = scenario();
    let a = manager.flow().find_by_name("A").unwrap();
    let depth = manager.undo_labels().len();

    assert!(!manager.set_reference_input("A", 0, "Ghost", 0));
    assert!(!manager.set_reference_input("A", 0, "E", 7));
    assert!(!manager.set_reference_input("A", 9, "E", 0));

    assert_eq!(
        manager.flow().node(a).unwrap().input(0),
        Some(&DataReference::output(1, 0))
    );
    assert_eq!(manager.undo_labels().len(), depth);
}

#[test]
fn test_unchanged_value_records_nothing() {
    let mut manager = scenario();
    let depth = manager.undo_labels().len();

    assert!(!manager.set_constant_input("A", 1, 1.0));
    assert!(!manager.set_next_node("E", 0, "A"));
    assert!(!manager.rename_node("A", "A"));
    assert_eq!(manager.undo_labels().len(), depth);
}

#[test]
fn test_start_node_cannot_be_removed() {
    let mut manager = scenario();
    assert!(!manager.remove_node("E").unwrap());
    assert!(manager.flow().start_node().is_some());
    assert!(!manager.remove_node("Nobody").unwrap());
}

#[test]
fn test_names_are_unique() {
    let mut manager = scenario();
    assert_eq!(manager.create_node("math.subtract", "A").unwrap(), None);
    assert!(manager.create_node("math.subtract", "S").unwrap().is_some());
    assert!(!manager.rename_node("S", "A"));
}

#[test]
fn test_unknown_type_is_an_error() {
    let mut manager = scenario();
    let depth = manager.undo_labels().len();
    assert_eq!(
        manager.create_node("math.power", "P"),
        Err(RegistryError::UnknownNodeType("math.power".to_string()))
    );
    assert_eq!(
        manager.replace_start("math.add"),
        Err(RegistryError::NotAnEventType("math.add".to_string()))
    );
    assert_eq!(manager.undo_labels().len(), depth);
}

#[test]
fn test_replace_start_keeps_wiring() {
    let mut manager = scenario();
    let old_start = manager.flow().start_node_id().unwrap();
    let a = manager.flow().find_by_name("A").unwrap();

    assert!(manager.replace_start("event.tick").unwrap());

    let start = manager.flow().start_node().unwrap();
    assert_ne!(start.id(), old_start);
    assert_eq!(start.node_type(), "event.tick");
    assert_eq!(start.name(), "E");
    assert_eq!(start.next_node(0), Some(a));
    assert!(!manager.flow().contains(old_start));

    // A still reads the old id, so the run fails with a dangling reference
    assert_eq!(
        manager.flow().node(a).unwrap().input(0),
        Some(&DataReference::output(old_start, 0))
    );
    assert!(manager.execute(Trigger::new().with_output(1.0)).is_some());

    assert!(manager.undo().unwrap());
    assert_eq!(manager.flow().start_node_id(), Some(old_start));
    assert_eq!(manager.execute(Trigger::new().with_output(1.0)), None);
}

#[test]
fn test_replace_start_follows_loops_to_start() {
    let mut manager = scenario();
    assert!(manager.set_next_node("A", 0, "E"));

    assert!(manager.replace_start("event.manual").unwrap());
    let start = manager.flow().start_node_id().unwrap();
    let a = manager.flow().find_by_name("A").unwrap();
    assert_eq!(manager.flow().node(a).unwrap().next_node(0), Some(start));
}

#[test]
fn test_empty_flow_needs_start_before_nodes() {
    let registry = Arc::new(logicnodes::standard_registry());
    let serializer = FlowSerializer::new(registry.clone());
    let mut manager = FlowManager::new(LogicFlow::new("blank"), registry, RuntimeConfig::default());

    assert_eq!(manager.create_node("math.add", "A").unwrap(), None);
    assert!(manager.flow().is_empty());
    assert!(!manager.can_undo());

    assert!(manager.replace_start("event.manual").unwrap());
    assert_eq!(manager.flow().start_node().unwrap().name(), "start");
    assert!(manager.create_node("math.add", "A").unwrap().is_some());

    let loaded = serializer
        .from_json(&serializer.to_json(manager.flow()).unwrap())
        .unwrap();
    assert_eq!(&loaded, manager.flow());

    assert!(manager.undo().unwrap());
    assert!(manager.undo().unwrap());
    assert!(manager.flow().is_empty());
    assert!(manager.flow().start_node_id().is_none());

    assert!(manager.redo().unwrap());
    assert_eq!(manager.flow().start_node().unwrap().name(), "start");
}

#[test]
fn test_startless_flow_with_nodes_gets_no_start() {
    let registry = Arc::new(logicnodes::standard_registry());
    let mut flow = LogicFlow::new("headless");
    let id = flow.allocate_id();
    flow.insert_node(registry.create("math.add", id, "start").unwrap());
    let mut manager = FlowManager::new(flow, registry, RuntimeConfig::default());

    assert!(!manager.replace_start("event.manual").unwrap());
    assert!(manager.flow().start_node_id().is_none());
    assert_eq!(manager.flow().len(), 1);
    let starts = manager
        .flow()
        .nodes()
        .into_iter()
        .filter(|node| node.name() == "start")
        .count();
    assert_eq!(starts, 1);
    assert!(!manager.can_undo());
}
