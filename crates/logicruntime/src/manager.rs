use crate::{
    edit::{Edit, EditPath},
    RuntimeConfig,
};
use logiccore::{
    DataReference, EventBus, ExecutionContext, ExecutionEvent, FlowError, LogicFlow, NodeId,
    NodeRegistry, RegistryError, Trigger, Value,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Outcome of `FlowManager::dispatch`
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Automatic dispatch is disabled; nothing ran
    Skipped,
    /// The flow ran; carries the terminal failure, if any
    Ran(Option<FlowError>),
}

/// Editing façade and run entry point for one flow.
///
/// Every structural edit is recorded as an `EditPath` on the undo stack,
/// clears the redo stack and disables automatic dispatch until the caller
/// re-enables it. Nodes and ports are addressed by display name; edits that
/// name a missing node or port are no-ops and record nothing.
///
/// A manager is not meant to be shared between threads for mutation: route
/// edits and run starts through its single owner.
pub struct FlowManager {
    flow: LogicFlow,
    registry: Arc<NodeRegistry>,
    config: RuntimeConfig,
    event_bus: Arc<EventBus>,
    enabled: bool,
    undo_stack: Vec<EditPath>,
    redo_stack: Vec<EditPath>,
    history: VecDeque<ExecutionContext>,
}

impl FlowManager {
    /// Manage an existing flow. Automatic dispatch starts disabled.
    pub fn new(flow: LogicFlow, registry: Arc<NodeRegistry>, config: RuntimeConfig) -> Self {
        if flow.start_node_id().is_none() && !flow.is_empty() {
            tracing::warn!("Managing flow '{}' with nodes but no start node", flow.name());
        }
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        Self {
            flow,
            registry,
            config,
            event_bus,
            enabled: false,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            history: VecDeque::new(),
        }
    }

    /// New flow whose start node is an event node of `start_type`
    pub fn create(
        name: impl Into<String>,
        start_type: &str,
        registry: Arc<NodeRegistry>,
        config: RuntimeConfig,
    ) -> Result<Self, RegistryError> {
        let mut flow = LogicFlow::new(name);
        let start = registry.create(start_type, flow.allocate_id(), "start")?;
        flow.replace_start(start)
            .map_err(|_| RegistryError::NotAnEventType(start_type.to_string()))?;
        Ok(Self::new(flow, registry, config))
    }

    pub fn flow(&self) -> &LogicFlow {
        &self.flow
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Subscribe to execution events of every run started here
    pub fn subscribe_events(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        tracing::debug!("Automatic dispatch for '{}' set to {}", self.flow.name(), enabled);
        self.enabled = enabled;
    }

    /// Swap in a different flow (e.g. one just loaded from disk). Both edit
    /// stacks are cleared and automatic dispatch is disabled.
    pub fn replace_flow(&mut self, flow: LogicFlow) {
        tracing::info!("Replacing flow '{}' with '{}'", self.flow.name(), flow.name());
        self.flow = flow;
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.enabled = false;
    }

    fn commit(&mut self, path: EditPath) -> Result<(), RegistryError> {
        path.apply(&mut self.flow, &self.registry)?;
        tracing::debug!("Applied edit: {}", path.label());
        self.undo_stack.push(path);
        self.redo_stack.clear();
        self.enabled = false;
        Ok(())
    }

    fn commit_plain(&mut self, path: EditPath) -> bool {
        match self.commit(path) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Edit failed: {}", e);
                false
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<NodeId> {
        let id = self.flow.find_by_name(name);
        if id.is_none() {
            tracing::debug!("No node named '{}' in flow '{}'", name, self.flow.name());
        }
        id
    }

    /// Create a node of `node_type`. Returns `None` if `name` is taken or
    /// the flow has no start node yet; `replace_start` must come first.
    pub fn create_node(
        &mut self,
        node_type: &str,
        name: &str,
    ) -> Result<Option<NodeId>, RegistryError> {
        if self.flow.start_node_id().is_none() {
            tracing::debug!("Flow '{}' needs a start node before '{}'", self.flow.name(), name);
            return Ok(None);
        }
        if self.flow.find_by_name(name).is_some() {
            tracing::debug!("Node name '{}' is already taken", name);
            return Ok(None);
        }
        let id = self.flow.allocate_id();
        let node = self.registry.create(node_type, id, name)?;
        self.commit(EditPath::new(
            format!("create #{} ({})", id, node_type),
            Edit::Insert {
                node,
                links: Vec::new(),
            },
            Edit::Remove { id },
        ))?;
        Ok(Some(id))
    }

    /// Remove a node; successor slots pointing at it are cleared.
    /// The start node cannot be removed.
    pub fn remove_node(&mut self, name: &str) -> Result<bool, RegistryError> {
        let Some(id) = self.lookup(name) else {
            return Ok(false);
        };
        if self.flow.start_node_id() == Some(id) {
            tracing::debug!("Refusing to remove start node '{}'", name);
            return Ok(false);
        }
        let Some(node) = self.flow.node(id) else {
            return Ok(false);
        };
        let snapshot = node.copy(&self.registry)?;
        let links = self.flow.links_to(id);
        self.commit(EditPath::new(
            format!("remove #{}", id),
            Edit::Remove { id },
            Edit::Insert {
                node: snapshot,
                links,
            },
        ))?;
        Ok(true)
    }

    /// Rename a node; no-op if the new name is taken or unchanged
    pub fn rename_node(&mut self, name: &str, new_name: &str) -> bool {
        let Some(id) = self.lookup(name) else {
            return false;
        };
        if name == new_name || self.flow.find_by_name(new_name).is_some() {
            return false;
        }
        self.commit_plain(EditPath::new(
            format!("rename #{}", id),
            Edit::Rename {
                id,
                name: new_name.to_string(),
            },
            Edit::Rename {
                id,
                name: name.to_string(),
            },
        ))
    }

    /// Replace the start node with a fresh event node of `node_type`.
    ///
    /// The new node gets a new id, keeps the old start's name and successor
    /// slots, and takes over every successor slot that pointed at the old
    /// start. Input references to the old start are left untouched.
    ///
    /// A flow without a start must be empty; its first start is named
    /// `start`. Returns false for a startless flow that already has nodes.
    pub fn replace_start(&mut self, node_type: &str) -> Result<bool, RegistryError> {
        let metadata = self
            .registry
            .get_metadata(node_type)
            .ok_or_else(|| RegistryError::UnknownNodeType(node_type.to_string()))?;
        if !metadata.is_event() {
            return Err(RegistryError::NotAnEventType(node_type.to_string()));
        }

        let previous = match self.flow.start_node() {
            Some(old) => Some((
                old.id(),
                old.name().to_string(),
                old.next_nodes().to_vec(),
                old.copy(&self.registry)?,
                self.flow.links_to(old.id()),
            )),
            None if !self.flow.is_empty() => {
                tracing::warn!(
                    "Flow '{}' has nodes but no start node; refusing to add one",
                    self.flow.name()
                );
                return Ok(false);
            }
            None => None,
        };

        let new_id = self.flow.allocate_id();
        let path = match previous {
            Some((old_id, old_name, old_next, snapshot, links)) => {
                let mut node = self.registry.create(node_type, new_id, old_name)?;
                for (slot, next) in old_next.into_iter().enumerate() {
                    node.set_next(slot, next.map(|t| if t == old_id { new_id } else { t }));
                }
                EditPath::new(
                    format!("replace start #{} with #{}", old_id, new_id),
                    Edit::ReplaceStart {
                        node,
                        links: links.clone(),
                    },
                    Edit::ReplaceStart {
                        node: snapshot,
                        links,
                    },
                )
            }
            None => EditPath::new(
                format!("set start #{}", new_id),
                Edit::ReplaceStart {
                    node: self.registry.create(node_type, new_id, "start")?,
                    links: Vec::new(),
                },
                Edit::ClearStart,
            ),
        };
        self.commit(path)?;
        Ok(true)
    }

    fn set_input(&mut self, id: NodeId, index: usize, reference: DataReference) -> bool {
        let Some(current) = self.flow.node(id).and_then(|n| n.input(index)).cloned() else {
            tracing::debug!("Node #{} has no input {}", id, index);
            return false;
        };
        if current == reference {
            return false;
        }
        self.commit_plain(EditPath::new(
            format!("set input {} of #{}", index, id),
            Edit::SetInput {
                id,
                index,
                reference,
            },
            Edit::SetInput {
                id,
                index,
                reference: current,
            },
        ))
    }

    /// Set input `index` of `node` to a constant
    pub fn set_constant_input(&mut self, node: &str, index: usize, value: impl Into<Value>) -> bool {
        match self.lookup(node) {
            Some(id) => self.set_input(id, index, DataReference::constant(value)),
            None => false,
        }
    }

    /// Wire input `index` of `node` to output `output` of `source`
    pub fn set_reference_input(
        &mut self,
        node: &str,
        index: usize,
        source: &str,
        output: usize,
    ) -> bool {
        let (Some(id), Some(source_id)) = (self.lookup(node), self.lookup(source)) else {
            return false;
        };
        let has_output = self
            .flow
            .node(source_id)
            .map(|s| output < s.metadata().output_count())
            .unwrap_or(false);
        if !has_output {
            tracing::debug!("Node '{}' has no output {}", source, output);
            return false;
        }
        self.set_input(id, index, DataReference::output(source_id, output))
    }

    /// Reset input `index` of `node` to a null constant
    pub fn disconnect_input(&mut self, node: &str, index: usize) -> bool {
        match self.lookup(node) {
            Some(id) => self.set_input(id, index, DataReference::null()),
            None => false,
        }
    }

    fn set_next(&mut self, id: NodeId, slot: usize, target: Option<NodeId>) -> bool {
        let Some(current) = self.flow.node(id).and_then(|n| n.next_nodes().get(slot).copied())
        else {
            tracing::debug!("Node #{} has no branch {}", id, slot);
            return false;
        };
        if current == target {
            return false;
        }
        self.commit_plain(EditPath::new(
            format!("set branch {} of #{}", slot, id),
            Edit::SetNext {
                id,
                index: slot,
                target,
            },
            Edit::SetNext {
                id,
                index: slot,
                target: current,
            },
        ))
    }

    /// Point branch `slot` of `node` at `target`
    pub fn set_next_node(&mut self, node: &str, slot: usize, target: &str) -> bool {
        match (self.lookup(node), self.lookup(target)) {
            (Some(id), Some(target_id)) => self.set_next(id, slot, Some(target_id)),
            _ => false,
        }
    }

    /// Clear branch `slot` of `node`
    pub fn disconnect_next_node(&mut self, node: &str, slot: usize) -> bool {
        match self.lookup(node) {
            Some(id) => self.set_next(id, slot, None),
            None => false,
        }
    }

    /// Revert the most recent edit; false if there is nothing to undo
    pub fn undo(&mut self) -> Result<bool, RegistryError> {
        let Some(path) = self.undo_stack.pop() else {
            return Ok(false);
        };
        if let Err(e) = path.revert(&mut self.flow, &self.registry) {
            self.undo_stack.push(path);
            return Err(e);
        }
        tracing::debug!("Undid edit: {}", path.label());
        self.redo_stack.push(path);
        self.enabled = false;
        Ok(true)
    }

    /// Re-apply the most recently undone edit; false if there is none
    pub fn redo(&mut self) -> Result<bool, RegistryError> {
        let Some(path) = self.redo_stack.pop() else {
            return Ok(false);
        };
        if let Err(e) = path.apply(&mut self.flow, &self.registry) {
            self.redo_stack.push(path);
            return Err(e);
        }
        tracing::debug!("Redid edit: {}", path.label());
        self.undo_stack.push(path);
        self.enabled = false;
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Labels of the undo stack, most recent last
    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo_stack.iter().map(|p| p.label()).collect()
    }

    /// Labels of the redo stack, next to redo last
    pub fn redo_labels(&self) -> Vec<&str> {
        self.redo_stack.iter().map(|p| p.label()).collect()
    }

    /// Run the flow with the configured step ceiling
    pub fn execute(&mut self, trigger: Trigger) -> Option<FlowError> {
        self.execute_with_ceiling(trigger, self.config.step_ceiling)
    }

    /// Run the flow once, record the run in the history and return its
    /// terminal failure, if any.
    pub fn execute_with_ceiling(&mut self, trigger: Trigger, ceiling: usize) -> Option<FlowError> {
        let mut ctx = ExecutionContext::new(ceiling);
        let failure = ctx.run(&self.flow, trigger, &self.event_bus).cloned();
        tracing::info!(
            "Executed flow '{}' in {} step(s): {}",
            self.flow.name(),
            ctx.steps(),
            match &failure {
                Some(e) => e.to_string(),
                None => "ok".to_string(),
            }
        );
        self.record(ctx);
        failure
    }

    /// Automatic (event-driven) run: skipped while dispatch is disabled
    pub fn dispatch(&mut self, trigger: Trigger) -> Dispatch {
        if !self.enabled {
            tracing::trace!("Dispatch to disabled flow '{}' skipped", self.flow.name());
            return Dispatch::Skipped;
        }
        Dispatch::Ran(self.execute(trigger))
    }

    fn record(&mut self, ctx: ExecutionContext) {
        self.history.push_back(ctx);
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
    }

    /// Retained runs, oldest first
    pub fn history(&self) -> impl Iterator<Item = &ExecutionContext> {
        self.history.iter()
    }

    pub fn last_run(&self) -> Option<&ExecutionContext> {
        self.history.back()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
