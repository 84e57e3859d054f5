//! Node Registry - The host document the dialog binds to.
//!
//! Manages the lifecycle of nodes:
//! - Slot allocation (handles are never reused)
//! - Parent/children tree rooted at `body`
//! - Attributes, with an id → node map for `get_element_by_id`
//! - Destroy callbacks run when a node is released

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::types::NodeId;

// =============================================================================
// Registry State
// =============================================================================

struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }
}

const BODY: NodeId = NodeId(0);

thread_local! {
    /// Node slots. A released node leaves `None` behind.
    static NODES: RefCell<Vec<Option<NodeData>>> = RefCell::new(vec![Some(NodeData::new("body"))]);

    /// Map `id` attribute to node.
    static ID_TO_NODE: RefCell<HashMap<String, NodeId>> = RefCell::new(HashMap::new());

    /// Destroy callbacks registered per node.
    static DESTROY_CALLBACKS: RefCell<HashMap<NodeId, Vec<Box<dyn FnOnce()>>>> = RefCell::new(HashMap::new());
}

fn with_node<R>(node: NodeId, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
    NODES.with(|nodes| nodes.borrow().get(node.0).and_then(|slot| slot.as_ref()).map(f))
}

fn with_node_mut<R>(node: NodeId, f: impl FnOnce(&mut NodeData) -> R) -> Option<R> {
    NODES.with(|nodes| {
        nodes
            .borrow_mut()
            .get_mut(node.0)
            .and_then(|slot| slot.as_mut())
            .map(f)
    })
}

// =============================================================================
// Allocation
// =============================================================================

/// The document root.
pub fn body() -> NodeId {
    BODY
}

/// Allocate a new, detached element.
pub fn create_element(tag: &str) -> NodeId {
    NODES.with(|nodes| {
        let mut nodes = nodes.borrow_mut();
        let node = NodeId(nodes.len());
        nodes.push(Some(NodeData::new(tag)));
        node
    })
}

/// Release a node and its whole subtree.
///
/// Destroy callbacks run children first. The body cannot be released.
pub fn release_node(node: NodeId) {
    if node == BODY || !is_alive(node) {
        return;
    }

    for child in children_of(node) {
        release_node(child);
    }

    run_destroy_callbacks(node);
    remove_node(node);

    if let Some(id) = get_attribute(node, "id") {
        unregister_id(&id, node);
    }

    NODES.with(|nodes| {
        if let Some(slot) = nodes.borrow_mut().get_mut(node.0) {
            *slot = None;
        }
    });
}

/// Whether the handle still refers to a live node.
pub fn is_alive(node: NodeId) -> bool {
    with_node(node, |_| ()).is_some()
}

/// Count of live nodes, including the body.
pub fn node_count() -> usize {
    NODES.with(|nodes| nodes.borrow().iter().filter(|slot| slot.is_some()).count())
}

// =============================================================================
// Tree
// =============================================================================

pub fn tag_name(node: NodeId) -> Option<String> {
    with_node(node, |data| data.tag.clone())
}

pub fn parent_of(node: NodeId) -> Option<NodeId> {
    with_node(node, |data| data.parent).flatten()
}

pub fn children_of(node: NodeId) -> Vec<NodeId> {
    with_node(node, |data| data.children.clone()).unwrap_or_default()
}

pub fn next_sibling(node: NodeId) -> Option<NodeId> {
    let parent = parent_of(node)?;
    let siblings = children_of(parent);
    let position = siblings.iter().position(|&c| c == node)?;
    siblings.get(position + 1).copied()
}

/// Ancestors of `node`, nearest first. Does not include `node`.
pub fn ancestors(node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut current = parent_of(node);
    while let Some(parent) = current {
        result.push(parent);
        current = parent_of(parent);
    }
    result
}

/// Descendants of `node` in document order. Does not include `node`.
pub fn descendants(node: NodeId) -> Vec<NodeId> {
    let mut result = Vec::new();
    let mut stack: Vec<NodeId> = children_of(node).into_iter().rev().collect();
    while let Some(next) = stack.pop() {
        result.push(next);
        stack.extend(children_of(next).into_iter().rev());
    }
    result
}

/// Inclusive containment: a node contains itself.
pub fn contains(ancestor: NodeId, node: NodeId) -> bool {
    if !is_alive(ancestor) || !is_alive(node) {
        return false;
    }
    node == ancestor || ancestors(node).contains(&ancestor)
}

/// Whether the node is attached under the body.
pub fn is_connected(node: NodeId) -> bool {
    contains(BODY, node)
}

/// Append `child` as the last child of `parent`, detaching it first.
pub fn append_child(parent: NodeId, child: NodeId) -> Result<()> {
    insert_before(parent, child, None)
}

/// Insert `child` before `reference` under `parent`.
///
/// A missing reference, or one that is no longer a child of `parent`,
/// appends instead.
pub fn insert_before(parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
    if !is_alive(parent) {
        return Err(Error::UnknownNode(parent));
    }
    if !is_alive(child) {
        return Err(Error::UnknownNode(child));
    }
    if contains(child, parent) {
        return Err(Error::HierarchyRequest { parent, child });
    }

    remove_node(child);

    with_node_mut(parent, |data| {
        let position = reference.and_then(|r| data.children.iter().position(|&c| c == r));
        match position {
            Some(position) => data.children.insert(position, child),
            None => data.children.push(child),
        }
    });
    with_node_mut(child, |data| data.parent = Some(parent));
    Ok(())
}

/// Detach a node from its parent. The node stays alive.
pub fn remove_node(node: NodeId) {
    let Some(parent) = parent_of(node) else { return };
    with_node_mut(parent, |data| data.children.retain(|&c| c != node));
    with_node_mut(node, |data| data.parent = None);
}

// =============================================================================
// Attributes
// =============================================================================

pub fn get_attribute(node: NodeId, name: &str) -> Option<String> {
    with_node(node, |data| data.attributes.get(name).cloned()).flatten()
}

pub fn has_attribute(node: NodeId, name: &str) -> bool {
    with_node(node, |data| data.attributes.contains_key(name)).unwrap_or(false)
}

pub fn set_attribute(node: NodeId, name: &str, value: &str) {
    let previous = with_node_mut(node, |data| data.attributes.insert(name.to_string(), value.to_string()));
    let Some(previous) = previous else { return };

    if name == "id" {
        if let Some(old) = previous {
            unregister_id(&old, node);
        }
        ID_TO_NODE.with(|map| {
            map.borrow_mut().insert(value.to_string(), node);
        });
    }
}

pub fn remove_attribute(node: NodeId, name: &str) {
    let previous = with_node_mut(node, |data| data.attributes.remove(name)).flatten();
    if name == "id" {
        if let Some(old) = previous {
            unregister_id(&old, node);
        }
    }
}

fn unregister_id(id: &str, node: NodeId) {
    ID_TO_NODE.with(|map| {
        let mut map = map.borrow_mut();
        if map.get(id) == Some(&node) {
            map.remove(id);
        }
    });
}

/// Find a connected node by its `id` attribute.
pub fn get_element_by_id(id: &str) -> Option<NodeId> {
    let node = ID_TO_NODE.with(|map| map.borrow().get(id).copied())?;
    is_connected(node).then_some(node)
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when `node` is released.
pub fn on_destroy(node: NodeId, callback: impl FnOnce() + 'static) {
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(node)
            .or_default()
            .push(Box::new(callback));
    });
}

fn run_destroy_callbacks(node: NodeId) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&node));
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset the document to a lone body.
pub fn reset_document() {
    NODES.with(|nodes| {
        let mut nodes = nodes.borrow_mut();
        nodes.clear();
        nodes.push(Some(NodeData::new("body")));
    });
    ID_TO_NODE.with(|map| map.borrow_mut().clear());
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
}
