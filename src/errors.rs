use std::fmt;

use crate::node::NodeId;

// Hand-written Display/Error/From impls instead of `#[derive(thiserror::Error)]`:
// thiserror treats any field named `source` as the error source, but
// `Loop::source` is a NodeId (String), which does not implement Error.
#[derive(Debug)]
pub enum TreeError {
    NodeNotFound(NodeId),

    DuplicatedNodeId(NodeId),

    MultipleRoot,

    Loop {
        source: NodeId,
        destination: NodeId,
    },

    Structure(String),

    Serialize(serde_json::Error),

    Io(std::io::Error),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::NodeNotFound(id) => write!(f, "Node '{id}' is not in the tree"),
            TreeError::DuplicatedNodeId(id) => {
                write!(f, "Node with identifier '{id}' already exists in the tree")
            }
            TreeError::MultipleRoot => write!(f, "A tree takes one root merely"),
            TreeError::Loop {
                source,
                destination,
            } => write!(
                f,
                "Moving '{source}' under '{destination}' would create a cycle"
            ),
            TreeError::Structure(msg) => write!(f, "Structural invariant violated: {msg}"),
            TreeError::Serialize(err) => write!(f, "Failed to serialize payload: {err}"),
            TreeError::Io(err) => write!(f, "Failed to write export: {err}"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeError::Serialize(err) => Some(err),
            TreeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TreeError {
    fn from(err: serde_json::Error) -> Self {
        TreeError::Serialize(err)
    }
}

impl From<std::io::Error> for TreeError {
    fn from(err: std::io::Error) -> Self {
        TreeError::Io(err)
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
