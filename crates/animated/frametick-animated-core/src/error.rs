use thiserror::Error;

use crate::nodes::NodeKind;
use crate::types::NodeId;

/// Configuration errors. Each one aborts only the call that raised it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnimatedError {
    #[error("animated node {0} does not exist")]
    NodeNotFound(NodeId),
    #[error("animated node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("unsupported {found} node {id} used as {role}")]
    UnsupportedNodeType {
        id: NodeId,
        found: NodeKind,
        role: &'static str,
    },
    #[error("static '{key}' has an unsupported element at index {index}: {found}")]
    UnsupportedArrayElement {
        key: String,
        index: usize,
        found: String,
    },
    #[error("invalid node config: {0}")]
    InvalidConfig(String),
}
