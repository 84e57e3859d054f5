//! Portal: relocate a node under a destination and put it back later.

use crate::engine::{
    ancestors, append_child, body, has_attribute, insert_before, is_alive, next_sibling,
    parent_of, query_selector, remove_node,
};
use crate::error::Result;
use crate::types::{Cleanup, NodeId, PortalTarget};

/// Marks a portalled node. Descendants with an inherited target stay put.
pub const PORTAL_ATTRIBUTE: &str = "data-portal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalConfig {
    pub destination: NodeId,
}

/// Resolve where `node` should be portalled.
///
/// `Ok(None)` means no relocation: portalling is disabled, the node sits
/// inside another portalled node, or nothing matches the target.
pub fn resolve_portal_destination(node: NodeId, target: &PortalTarget) -> Result<Option<NodeId>> {
    match target {
        PortalTarget::Disabled => Ok(None),
        PortalTarget::Inherit => {
            let nested = ancestors(node)
                .into_iter()
                .any(|ancestor| has_attribute(ancestor, PORTAL_ATTRIBUTE));
            Ok((!nested).then(body))
        }
        PortalTarget::Selector(selector) => query_selector(selector),
        PortalTarget::Node(destination) => Ok(is_alive(*destination).then_some(*destination)),
    }
}

/// Move `node` under the destination. Fails, leaving the node where it
/// was, when the destination is gone or lies inside `node`.
pub(super) fn engage(node: NodeId, config: PortalConfig) -> Result<Cleanup> {
    let original_parent = parent_of(node);
    let original_next = next_sibling(node);

    append_child(config.destination, node)?;

    Ok(Box::new(move || {
        if !is_alive(node) {
            return;
        }
        match original_parent.filter(|&parent| is_alive(parent)) {
            Some(parent) => {
                let reference = original_next.filter(|&next| parent_of(next) == Some(parent));
                if let Err(error) = insert_before(parent, node, reference) {
                    tracing::warn!(%error, %node, "portal restore failed");
                }
            }
            None => remove_node(node),
        }
    }))
}
