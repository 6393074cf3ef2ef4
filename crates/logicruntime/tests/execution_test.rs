// crates/logicruntime/tests/execution_test.rs

use logiccore::{ExecutionEvent, FlowError, NodeEvent, Trigger, Value};
use logicruntime::{Dispatch, FlowManager, RuntimeConfig};
use std::sync::Arc;

fn manager_with(config: RuntimeConfig) -> FlowManager {
    let registry = Arc::new(logicnodes::standard_registry());
    let mut manager = FlowManager::create("scenario", "event.value", registry, config).unwrap();
    assert!(manager.rename_node("start", "E"));
    manager.create_node("math.add", "A").unwrap().unwrap();
    assert!(manager.set_reference_input("A", 0, "E", 0));
    assert!(manager.set_constant_input("A", 1, 1.0));
    assert!(manager.set_next_node("E", 0, "A"));
    manager
}

fn scenario() -> FlowManager {
    manager_with(RuntimeConfig::default())
}

#[test]
fn test_scenario_adds_one_to_event_value() {
    let mut manager = scenario();

    assert_eq!(manager.execute(Trigger::new().with_output(5.0)), None);

    let run = manager.last_run().unwrap();
    let a = manager.flow().find_by_name("A").unwrap();
    assert_eq!(run.output(a, 0).unwrap(), &Value::Number(6.0));
    assert_eq!(run.steps(), 2);
    assert!(run.succeeded());
    assert_eq!(run.status(1).unwrap().next(), Some(a));
}

#[test]
fn test_dead_loop_is_bounded() {
    let mut manager = scenario();
    // A = 1 + 1, then A again
    assert!(manager.set_constant_input("A", 0, 1.0));
    assert!(manager.set_next_node("A", 0, "A"));

    let failure = manager.execute_with_ceiling(Trigger::new().with_output(0.0), 3);

    assert_eq!(failure, Some(FlowError::DeadLoop { ceiling: 3 }));
    assert_eq!(manager.last_run().unwrap().steps(), 4);
}

#[test]
fn test_configured_ceiling_applies() {
    let mut manager = manager_with(RuntimeConfig {
        step_ceiling: 10,
        ..RuntimeConfig::default()
    });
    assert!(manager.set_next_node("A", 0, "A"));
    assert!(manager.set_constant_input("A", 0, 1.0));

    let failure = manager.execute(Trigger::new());
    assert_eq!(failure, Some(FlowError::DeadLoop { ceiling: 10 }));
    assert_eq!(manager.last_run().unwrap().steps(), 11);
}

#[test]
fn test_missing_payload_fails_in_node() {
    let mut manager = scenario();

    match manager.execute(Trigger::new()) {
        Some(FlowError::Node { name, .. }) => assert_eq!(name, "A"),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(!manager.last_run().unwrap().succeeded());
}

#[test]
fn test_history_is_capped() {
    let mut manager = manager_with(RuntimeConfig {
        history_limit: 2,
        ..RuntimeConfig::default()
    });

    for seed in [1.0, 2.0, 3.0] {
        manager.execute(Trigger::new().with_output(seed));
    }

    let a = manager.flow().find_by_name("A").unwrap();
    let outputs: Vec<Value> = manager
        .history()
        .map(|run| run.output(a, 0).unwrap().clone())
        .collect();
    assert_eq!(outputs, vec![Value::Number(3.0), Value::Number(4.0)]);

    manager.clear_history();
    assert!(manager.last_run().is_none());
}

#[test]
fn test_dispatch_requires_enabled_flow() {
    let mut manager = scenario();
    assert!(!manager.is_enabled());
    assert_eq!(
        manager.dispatch(Trigger::new().with_output(1.0)),
        Dispatch::Skipped
    );
    assert_eq!(manager.history().count(), 0);

    manager.set_enabled(true);
    assert_eq!(
        manager.dispatch(Trigger::new().with_output(1.0)),
        Dispatch::Ran(None)
    );
    assert!(manager.last_run().unwrap().succeeded());

    // any edit turns automatic dispatch off again
    assert!(manager.rename_node("A", "Adder"));
    assert!(!manager.is_enabled());
    assert_eq!(
        manager.dispatch(Trigger::new().with_output(1.0)),
        Dispatch::Skipped
    );
    assert_eq!(manager.history().count(), 1);
}

#[test]
fn test_dispatch_reports_runs_without_history() {
    let mut manager = manager_with(RuntimeConfig {
        history_limit: 0,
        ..RuntimeConfig::default()
    });
    manager.set_enabled(true);

    assert_eq!(
        manager.dispatch(Trigger::new().with_output(1.0)),
        Dispatch::Ran(None)
    );
    match manager.dispatch(Trigger::new()) {
        Dispatch::Ran(Some(FlowError::Node { name, .. })) => assert_eq!(name, "A"),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(manager.last_run().is_none());
}

#[test]
fn test_runs_emit_events() {
    let mut manager = scenario();
    manager.create_node("message.send", "Say").unwrap().unwrap();
    assert!(manager.set_reference_input("Say", 0, "A", 0));
    assert!(manager.set_next_node("A", 0, "Say"));

    let mut rx = manager.subscribe_events();
    assert_eq!(manager.execute(Trigger::new().with_output(41.0)), None);

    let mut executed = 0;
    let mut messages = Vec::new();
    let mut completed = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            ExecutionEvent::NodeExecuted { .. } => executed += 1,
            ExecutionEvent::NodeEvent {
                event: NodeEvent::Message { text },
                ..
            } => messages.push(text),
            ExecutionEvent::RunCompleted { success, steps, .. } => completed = Some((success, steps)),
            _ => {}
        }
    }

    assert_eq!(executed, 3);
    assert_eq!(messages, vec!["42".to_string()]);
    assert_eq!(completed, Some((true, 3)));
}

#[test]
fn test_concurrent_runs_share_one_flow() {
    let manager = scenario();
    let flow = manager.flow();
    let bus = manager.event_bus();
    let a = flow.find_by_name("A").unwrap();

    let results: Vec<Value> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                scope.spawn(move || {
                    let mut ctx = logiccore::ExecutionContext::new(100);
                    ctx.run(flow, Trigger::new().with_output(i as f64 * 10.0), bus);
                    ctx.output(a, 0).unwrap().clone()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(
        results,
        vec![
            Value::Number(1.0),
            Value::Number(11.0),
            Value::Number(21.0),
            Value::Number(31.0)
        ]
    );
}
