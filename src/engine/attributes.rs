//! Attribute projection onto nodes.

use crate::error::{Error, Result};
use crate::types::{Attributes, NodeId};

use super::registry::{is_alive, remove_attribute, set_attribute};

/// Project an attribute set onto a node.
///
/// Present values are written, absent ones removed. Attributes the set
/// does not mention are left alone.
pub fn apply_attributes(node: NodeId, attributes: &Attributes) -> Result<()> {
    if !is_alive(node) {
        return Err(Error::UnknownNode(node));
    }
    for (name, value) in attributes.iter() {
        match value {
            Some(value) => set_attribute(node, name, value),
            None => remove_attribute(node, name),
        }
    }
    Ok(())
}

/// Serialize inline style declarations, e.g. `display: none;`.
pub fn style_to_string(declarations: &[(&str, &str)]) -> String {
    declarations
        .iter()
        .map(|(property, value)| format!("{property}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}
