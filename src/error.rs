//! Host-level errors.
//!
//! The dialog controller itself never returns these to its callers: a bad
//! portal selector or a node that vanished is logged and treated as a
//! no-op. They surface only from the engine functions hosts call directly.

use thiserror::Error;

use crate::types::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        selector: String,
        reason: &'static str,
    },

    #[error("{0} is not a live node")]
    UnknownNode(NodeId),

    #[error("cannot insert {child} into {parent}: would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}

pub type Result<T> = std::result::Result<T, Error>;
