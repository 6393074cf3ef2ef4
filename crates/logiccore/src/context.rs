use crate::{
    events::{EventBus, ExecutionEvent, ExecutionId},
    DataReference, FlowError, FlowNode, LogicFlow, NodeId, NodeStatus, Value,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Caller-supplied seed for one run: the event payload written into the
/// start node's outputs and the initial variable table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trigger {
    pub outputs: Vec<Value>,
    pub variables: HashMap<String, Value>,
}

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, value: impl Into<Value>) -> Self {
        self.outputs.push(value.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}

/// One independent run of a `LogicFlow`.
///
/// Holds a private `NodeStatus` per node, so any number of contexts can walk
/// the same flow at once. After `run` returns the context is a read-only
/// record of what happened.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    id: ExecutionId,
    flow_name: String,
    ceiling: usize,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    statuses: HashMap<NodeId, NodeStatus>,
    variables: HashMap<String, Value>,
    steps: usize,
    failure: Option<FlowError>,
}

impl ExecutionContext {
    /// New context that aborts once more than `ceiling` nodes have run
    pub fn new(ceiling: usize) -> Self {
        Self {
            id: ExecutionId::new_v4(),
            flow_name: String::new(),
            ceiling,
            started_at: None,
            finished_at: None,
            statuses: HashMap::new(),
            variables: HashMap::new(),
            steps: 0,
            failure: None,
        }
    }

    /// Walk `flow` from its start node until a node has no successor, a node
    /// fails, or the step ceiling is exceeded. Returns the terminal failure.
    pub fn run(&mut self, flow: &LogicFlow, trigger: Trigger, bus: &EventBus) -> Option<&FlowError> {
        self.reset(flow);
        self.variables = trigger.variables;
        self.started_at = Some(Utc::now());

        bus.emit(ExecutionEvent::RunStarted {
            execution_id: self.id,
            flow_name: self.flow_name.clone(),
            timestamp: Utc::now(),
        });
        tracing::debug!("Starting run {} of flow '{}'", self.id, self.flow_name);

        let result = match flow.start_node() {
            Some(start) => {
                if let Some(status) = self.statuses.get_mut(&start.id()) {
                    let overflow = status.seed_outputs(trigger.outputs);
                    if overflow > 0 {
                        tracing::warn!(
                            "Ignoring {} event value(s) beyond the outputs of start node {}",
                            overflow,
                            start.id()
                        );
                    }
                }
                self.walk(flow, start, bus)
            }
            None => Err(FlowError::MissingStart),
        };

        if let Err(error) = result {
            tracing::warn!("Run {} of flow '{}' failed: {}", self.id, self.flow_name, error);
            if let Some(node_id) = error.node_id() {
                bus.emit(ExecutionEvent::NodeFailed {
                    execution_id: self.id,
                    node_id,
                    error: error.to_string(),
                    timestamp: Utc::now(),
                });
            }
            self.failure = Some(error);
        }

        let finished_at = Utc::now();
        self.finished_at = Some(finished_at);
        bus.emit(ExecutionEvent::RunCompleted {
            execution_id: self.id,
            success: self.failure.is_none(),
            steps: self.steps,
            duration_ms: self.duration_ms(),
            timestamp: finished_at,
        });
        tracing::debug!("Run {} finished after {} step(s)", self.id, self.steps);

        self.failure.as_ref()
    }

    fn reset(&mut self, flow: &LogicFlow) {
        self.flow_name = flow.name().to_string();
        self.statuses = flow
            .nodes()
            .into_iter()
            .map(|node| (node.id(), NodeStatus::new(node)))
            .collect();
        self.variables.clear();
        self.steps = 0;
        self.failure = None;
        self.finished_at = None;
    }

    fn walk(&mut self, flow: &LogicFlow, start: &FlowNode, bus: &EventBus) -> Result<(), FlowError> {
        let mut current = Some(start);
        while let Some(node) = current {
            // cycles are legal; the ceiling is the only loop protection
            if self.steps > self.ceiling {
                return Err(FlowError::DeadLoop {
                    ceiling: self.ceiling,
                });
            }
            let next = node.execute(flow, self, bus);
            self.steps += 1;
            let next = next?;

            bus.emit(ExecutionEvent::NodeExecuted {
                execution_id: self.id,
                node_id: node.id(),
                node_type: node.node_type().to_string(),
                next: next.map(|n| n.id()),
                timestamp: Utc::now(),
            });
            current = next;
        }
        Ok(())
    }

    /// Status and variable table for the node about to execute
    pub(crate) fn scope_mut(
        &mut self,
        node: &FlowNode,
    ) -> (&mut NodeStatus, &mut HashMap<String, Value>) {
        let status = self
            .statuses
            .entry(node.id())
            .or_insert_with(|| NodeStatus::new(node));
        (status, &mut self.variables)
    }

    /// Output of a node that has executed in this context
    pub fn output(&self, node: NodeId, index: usize) -> Result<&Value, FlowError> {
        self.statuses
            .get(&node)
            .ok_or(FlowError::NotExecuted { node })?
            .output(index)
    }

    /// Resolve any reference against this context
    pub fn resolve(&self, flow: &LogicFlow, reference: &DataReference) -> Result<Value, FlowError> {
        reference.resolve(flow, self)
    }

    pub fn id(&self) -> ExecutionId {
        self.id
    }

    pub fn flow_name(&self) -> &str {
        &self.flow_name
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Number of node executions performed
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn status(&self, node: NodeId) -> Option<&NodeStatus> {
        self.statuses.get(&node)
    }

    /// All statuses, ordered by node id
    pub fn statuses(&self) -> Vec<&NodeStatus> {
        let mut statuses: Vec<&NodeStatus> = self.statuses.values().collect();
        statuses.sort_by_key(|s| s.node_id());
        statuses
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn failure(&self) -> Option<&FlowError> {
        self.failure.as_ref()
    }

    pub fn succeeded(&self) -> bool {
        self.finished_at.is_some() && self.failure.is_none()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn duration_ms(&self) -> u64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds().max(0) as u64,
            _ => 0,
        }
    }

    /// Per-run trace: every node's resolved values and the chosen branch,
    /// followed by the variables and the terminal failure, if any.
    pub fn render_trace(&self) -> String {
        let mut out = format!(
            "Run {} of \"{}\": {} step(s), ceiling {}\n",
            self.id, self.flow_name, self.steps, self.ceiling
        );
        for status in self.statuses() {
            out.push_str(&status.render_trace());
            out.push('\n');
        }
        if !self.variables.is_empty() {
            let mut names: Vec<&String> = self.variables.keys().collect();
            names.sort();
            out.push_str("variables:\n");
            for name in names {
                let _ = writeln!(out, "  {} = {}", name, self.variables[name]);
            }
        }
        match &self.failure {
            Some(error) => {
                let _ = writeln!(out, "failed: {}", error);
                if let Some(cause) = std::error::Error::source(error) {
                    let _ = writeln!(out, "  caused by: {}", cause);
                }
            }
            None => out.push_str("completed\n"),
        }
        out
    }
}
