//! Logic flow runtime
//!
//! This crate provides the editing façade with undo/redo and run history,
//! the on-disk flow format, and static analysis of flow graphs.

mod analysis;
mod config;
mod edit;
mod manager;
mod serializer;

pub use analysis::{DanglingInput, FlowAnalysis};
pub use config::RuntimeConfig;
pub use edit::EditPath;
pub use manager::{Dispatch, FlowManager};
pub use serializer::{
    FlowDocument, FlowSerializer, InputDocument, NodeDocument, PersistError, WriteMode,
    FORMAT_VERSION,
};
