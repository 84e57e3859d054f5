//! Host Engine - The node tree controllers bind to.
//!
//! The engine is a small in-memory document:
//! - Registry: node allocation, tree structure, attributes, id lookup
//! - Query: simple selector matching
//! - Attributes: projecting declarative attribute sets onto nodes
//!
//! # Architecture
//!
//! Nodes are NOT objects. They are handles into a thread-local slot table:
//!
//! ```text
//! node#0: body
//! node#1: button  (parent=0, aria-haspopup=dialog)
//! node#2: div     (parent=0, role=dialog, hidden)
//! ```
//!
//! The dialog controller never creates nodes itself. Hosts create them,
//! then hand them to element activations.

mod attributes;
mod query;
mod registry;

pub use attributes::*;
pub use query::*;
pub use registry::*;
