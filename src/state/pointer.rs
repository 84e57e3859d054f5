//! Pointer Module - Pointer events and listener registry
//!
//! Node listeners see events bubbling from the target upward. Document
//! listeners run first, in the capture phase, so outside-interaction
//! detection sees every pointer event even if a node stops propagation.
//!
//! # API
//!
//! - `on_click(node, fn)` - Click listener on a node
//! - `on_pointer(node, action, fn)` - Any pointer action on a node
//! - `on_document_pointer(action, fn)` - Document-level (capture) listener
//! - `dispatch_pointer(&event)` - Deliver an event
//! - `click(node)` - Deliver pointerdown, pointerup, click

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::engine::{ancestors, is_alive};
use crate::types::NodeId;

use super::keyboard::Modifiers;

// =============================================================================
// TYPES
// =============================================================================

/// Pointer action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerAction {
    Down,
    Up,
    Click,
}

/// Pointer event
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    /// Node under the pointer
    pub target: NodeId,
    /// Modifier keys state
    pub modifiers: Modifiers,
    current_target: Cell<Option<NodeId>>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl PointerEvent {
    pub fn new(action: PointerAction, target: NodeId) -> Self {
        Self {
            action,
            target,
            modifiers: Modifiers::empty(),
            current_target: Cell::new(None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn down(target: NodeId) -> Self {
        Self::new(PointerAction::Down, target)
    }

    pub fn up(target: NodeId) -> Self {
        Self::new(PointerAction::Up, target)
    }

    pub fn click(target: NodeId) -> Self {
        Self::new(PointerAction::Click, target)
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

/// Handler for pointer events.
pub type PointerHandler = Rc<dyn Fn(&PointerEvent)>;

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

struct HandlerRegistry {
    node_handlers: HashMap<(NodeId, PointerAction), Vec<(usize, PointerHandler)>>,
    document_handlers: HashMap<PointerAction, Vec<(usize, PointerHandler)>>,
    next_id: usize,
}

impl HandlerRegistry {
    fn new() -> Self {
        Self {
            node_handlers: HashMap::new(),
            document_handlers: HashMap::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn list(&self, node: Option<NodeId>, action: PointerAction) -> Option<&Vec<(usize, PointerHandler)>> {
        match node {
            Some(node) => self.node_handlers.get(&(node, action)),
            None => self.document_handlers.get(&action),
        }
    }
}

thread_local! {
    static REGISTRY: RefCell<HandlerRegistry> = RefCell::new(HandlerRegistry::new());
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

fn deliver(node: Option<NodeId>, event: &PointerEvent) {
    event.current_target.set(node);
    let handlers = REGISTRY.with(|reg| reg.borrow().list(node, event.action).cloned().unwrap_or_default());
    for (id, handler) in handlers {
        let registered = REGISTRY.with(|reg| {
            reg.borrow()
                .list(node, event.action)
                .is_some_and(|list| list.iter().any(|(handler_id, _)| *handler_id == id))
        });
        if registered {
            handler(event);
        }
    }
}

/// Dispatch a pointer event: document (capture), then target and ancestors.
///
/// Returns true if a listener prevented the default action.
pub fn dispatch_pointer(event: &PointerEvent) -> bool {
    if !is_alive(event.target) {
        return false;
    }

    deliver(None, event);
    if !event.is_propagation_stopped() {
        let mut path = vec![event.target];
        path.extend(ancestors(event.target));
        for node in path {
            deliver(Some(node), event);
            if event.is_propagation_stopped() {
                break;
            }
        }
    }

    event.current_target.set(None);
    event.is_default_prevented()
}

/// Simulate a full click on `node`: pointerdown, pointerup, click.
pub fn click(node: NodeId) {
    dispatch_pointer(&PointerEvent::down(node));
    dispatch_pointer(&PointerEvent::up(node));
    dispatch_pointer(&PointerEvent::click(node));
}

// =============================================================================
// PUBLIC API - REGISTRATION
// =============================================================================

/// Listen for a pointer action on a node. Returns cleanup function.
pub fn on_pointer<F>(node: NodeId, action: PointerAction, handler: F) -> impl FnOnce()
where
    F: Fn(&PointerEvent) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.node_handlers
            .entry((node, action))
            .or_default()
            .push((id, Rc::new(handler)));
        id
    });
    tracing::trace!(%node, ?action, id, "pointer listener added");

    move || {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            if let Some(handlers) = reg.node_handlers.get_mut(&(node, action)) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
                if handlers.is_empty() {
                    reg.node_handlers.remove(&(node, action));
                }
            }
        });
    }
}

/// Listen for clicks on a node. Returns cleanup function.
pub fn on_click<F>(node: NodeId, handler: F) -> impl FnOnce()
where
    F: Fn(&PointerEvent) + 'static,
{
    on_pointer(node, PointerAction::Click, handler)
}

/// Listen for a pointer action anywhere in the document (capture phase).
/// Returns cleanup function.
pub fn on_document_pointer<F>(action: PointerAction, handler: F) -> impl FnOnce()
where
    F: Fn(&PointerEvent) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.document_handlers
            .entry(action)
            .or_default()
            .push((id, Rc::new(handler)));
        id
    });

    move || {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            if let Some(handlers) = reg.document_handlers.get_mut(&action) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        });
    }
}

pub fn on_document_pointerdown<F>(handler: F) -> impl FnOnce()
where
    F: Fn(&PointerEvent) + 'static,
{
    on_document_pointer(PointerAction::Down, handler)
}

pub fn on_document_pointerup<F>(handler: F) -> impl FnOnce()
where
    F: Fn(&PointerEvent) + 'static,
{
    on_document_pointer(PointerAction::Up, handler)
}

/// Number of listeners on a node, across all actions.
pub fn listener_count(node: NodeId) -> usize {
    REGISTRY.with(|reg| {
        reg.borrow()
            .node_handlers
            .iter()
            .filter(|((n, _), _)| *n == node)
            .map(|(_, list)| list.len())
            .sum()
    })
}

/// Number of document-level listeners, across all actions.
pub fn document_listener_count() -> usize {
    REGISTRY.with(|reg| reg.borrow().document_handlers.values().map(Vec::len).sum())
}

/// Reset pointer state (for testing)
pub fn reset_pointer_state() {
    REGISTRY.with(|reg| *reg.borrow_mut() = HandlerRegistry::new());
}

// =============================================================================
// TESTS
// =============================================================================
