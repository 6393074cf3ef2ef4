use logiccore::{DataReference, LogicFlow, NodeId, NodeRegistry, RegistryError, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Version of the document layout written by this crate
pub const FORMAT_VERSION: u32 = 1;

/// Marker for "no successor" / "no start node" in documents
const NONE_ID: i64 = -1;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("File already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Invalid flow document: {0}")]
    Invalid(String),

    #[error("Unsupported format version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// How `FlowSerializer::save` treats an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail instead of overwriting
    CreateNew,
    /// Write a sibling temp file, then rename it over the target
    AtomicReplace,
}

/// Root of the on-disk flow format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDocument {
    pub name: String,
    pub format_version: u32,
    #[serde(default)]
    pub engine_version: String,
    pub start_node_id: i64,
    pub nodes: Vec<NodeDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    pub inputs: Vec<InputDocument>,
    pub next_nodes: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputDocument {
    /// Stringified constant; `null` for an absent value
    #[serde(rename = "const")]
    Const {
        #[serde(default)]
        value: Option<String>,
    },
    #[serde(rename = "reference")]
    Reference { id: NodeId, index: usize },
}

impl From<&DataReference> for InputDocument {
    fn from(reference: &DataReference) -> Self {
        match reference {
            DataReference::Constant(value) => InputDocument::Const {
                value: match value.as_ref() {
                    Value::Null => None,
                    other => Some(other.to_string()),
                },
            },
            DataReference::NodeOutput { node, index } => InputDocument::Reference {
                id: *node,
                index: *index,
            },
        }
    }
}

impl From<&InputDocument> for DataReference {
    fn from(input: &InputDocument) -> Self {
        match input {
            InputDocument::Const { value: None } => DataReference::null(),
            InputDocument::Const { value: Some(raw) } => DataReference::constant(Value::sniff(raw)),
            InputDocument::Reference { id, index } => DataReference::output(*id, *index),
        }
    }
}

/// Converts flows to and from the document format and durable storage.
///
/// Concrete node types are re-created through the registry, so the
/// serializer never needs to know about them.
pub struct FlowSerializer {
    registry: Arc<NodeRegistry>,
}

impl FlowSerializer {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self { registry }
    }

    pub fn to_document(&self, flow: &LogicFlow) -> FlowDocument {
        FlowDocument {
            name: flow.name().to_string(),
            format_version: FORMAT_VERSION,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            start_node_id: flow.start_node_id().map(|id| id as i64).unwrap_or(NONE_ID),
            nodes: flow
                .nodes()
                .into_iter()
                .map(|node| NodeDocument {
                    id: node.id(),
                    node_type: node.node_type().to_string(),
                    name: node.name().to_string(),
                    inputs: node.inputs().iter().map(InputDocument::from).collect(),
                    next_nodes: node
                        .next_nodes()
                        .iter()
                        .map(|next| next.map(|id| id as i64).unwrap_or(NONE_ID))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Rebuild a flow; any structural inconsistency rejects the whole document
    pub fn from_document(&self, doc: &FlowDocument) -> Result<LogicFlow, PersistError> {
        if doc.format_version > FORMAT_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: doc.format_version,
                supported: FORMAT_VERSION,
            });
        }

        let ids: HashSet<NodeId> = doc.nodes.iter().map(|n| n.id).collect();
        if ids.len() != doc.nodes.len() {
            return Err(PersistError::Invalid("duplicate node ids".to_string()));
        }

        let mut flow = LogicFlow::new(doc.name.clone());
        for entry in &doc.nodes {
            let mut node = self.registry.create(&entry.node_type, entry.id, entry.name.clone())?;

            let metadata = node.metadata();
            if entry.inputs.len() != metadata.input_count() {
                return Err(PersistError::Invalid(format!(
                    "node {} has {} inputs, type {} expects {}",
                    entry.id,
                    entry.inputs.len(),
                    entry.node_type,
                    metadata.input_count()
                )));
            }
            if entry.next_nodes.len() != metadata.branch_count() {
                return Err(PersistError::Invalid(format!(
                    "node {} has {} next nodes, type {} expects {}",
                    entry.id,
                    entry.next_nodes.len(),
                    entry.node_type,
                    metadata.branch_count()
                )));
            }

            for (index, input) in entry.inputs.iter().enumerate() {
                node.set_input(index, DataReference::from(input));
            }
            for (slot, raw) in entry.next_nodes.iter().enumerate() {
                let next = resolve_id(*raw, &ids).map_err(|raw| {
                    PersistError::Invalid(format!(
                        "node {} branch {} points at unknown node {}",
                        entry.id, slot, raw
                    ))
                })?;
                node.set_next(slot, next);
            }
            flow.insert_node(node);
        }

        match resolve_id(doc.start_node_id, &ids) {
            Ok(Some(start)) => {
                if !flow.set_start(start) {
                    return Err(PersistError::Invalid(format!(
                        "start node {} is not an event node",
                        start
                    )));
                }
            }
            Ok(None) if doc.nodes.is_empty() => {}
            Ok(None) => {
                return Err(PersistError::Invalid("flow has nodes but no start node".to_string()))
            }
            Err(raw) => {
                return Err(PersistError::Invalid(format!(
                    "start node {} does not exist",
                    raw
                )))
            }
        }

        Ok(flow)
    }

    pub fn to_json(&self, flow: &LogicFlow) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(&self.to_document(flow))?)
    }

    pub fn from_json(&self, json: &str) -> Result<LogicFlow, PersistError> {
        let doc: FlowDocument = serde_json::from_str(json)?;
        self.from_document(&doc)
    }

    /// Write `flow` to `path`
    pub fn save(&self, flow: &LogicFlow, path: &Path, mode: WriteMode) -> Result<(), PersistError> {
        let json = self.to_json(flow)?;
        let result = match mode {
            WriteMode::CreateNew => write_new(path, json.as_bytes()),
            WriteMode::AtomicReplace => write_atomic(path, json.as_bytes()),
        };
        match &result {
            Ok(()) => tracing::info!("Saved flow '{}' to {}", flow.name(), path.display()),
            Err(e) => tracing::error!("Failed to save flow '{}' to {}: {}", flow.name(), path.display(), e),
        }
        result
    }

    /// Read a flow from `path`; a malformed file never yields a partial flow
    pub fn load(&self, path: &Path) -> Result<LogicFlow, PersistError> {
        let result = fs::read_to_string(path)
            .map_err(PersistError::from)
            .and_then(|json| self.from_json(&json));
        match &result {
            Ok(flow) => tracing::info!("Loaded flow '{}' from {}", flow.name(), path.display()),
            Err(e) => tracing::error!("Failed to load flow from {}: {}", path.display(), e),
        }
        result
    }
}

/// Map a document id to a node id: `-1` is none, anything else must exist.
fn resolve_id(raw: i64, ids: &HashSet<NodeId>) -> Result<Option<NodeId>, i64> {
    if raw == NONE_ID {
        return Ok(None);
    }
    match NodeId::try_from(raw) {
        Ok(id) if ids.contains(&id) => Ok(Some(id)),
        _ => Err(raw),
    }
}

fn write_new(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(PersistError::AlreadyExists(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

/// Sibling temp file used by atomic writes
pub(crate) fn temp_path(path: &Path) -> Result<PathBuf, PersistError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| PersistError::Invalid(format!("not a file path: {}", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let temp = temp_path(path)?;
    let written = (|| -> io::Result<()> {
        // truncates a stale temp file left by an interrupted write
        let mut file = File::create(&temp)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, path)
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}
