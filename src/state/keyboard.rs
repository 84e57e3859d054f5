//! Keyboard Module - Keydown events and listener registry
//!
//! Listeners attach to a node or to the document. Dispatch walks from the
//! target up through its ancestors (bubbling), then reaches document
//! listeners, unless a listener stops propagation.
//!
//! # API
//!
//! - `on_keydown(node, fn)` - Listen on a node
//! - `on_document_keydown(fn)` - Listen on the document
//! - `dispatch_keydown(&event)` - Deliver an event
//! - `press(key)` - Deliver a key press to the focused node
//!
//! # Example
//!
//! ```ignore
//! use spark_dialog::state::keyboard::{self, kbd, KeyboardEvent};
//!
//! let cleanup = keyboard::on_keydown(button, |event| {
//!     if event.key == kbd::ENTER {
//!         event.prevent_default();
//!     }
//! });
//!
//! keyboard::dispatch_keydown(&KeyboardEvent::new(kbd::ENTER).on(button));
//! cleanup();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use bitflags::bitflags;

use crate::engine::{ancestors, is_alive};
use crate::types::NodeId;

use super::focus::active_element;

// =============================================================================
// TYPES
// =============================================================================

/// Key names as reported in `KeyboardEvent::key`.
pub mod kbd {
    pub const ENTER: &str = "Enter";
    pub const SPACE: &str = " ";
    pub const ESCAPE: &str = "Escape";
    pub const TAB: &str = "Tab";
}

bitflags! {
    /// Keyboard modifier state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const CTRL = 1 << 0;
        const ALT = 1 << 1;
        const SHIFT = 1 << 2;
        const META = 1 << 3;
    }
}

/// Keydown event
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardEvent {
    /// The key that was pressed (e.g., "a", "Enter", " ")
    pub key: String,
    /// Modifier keys state
    pub modifiers: Modifiers,
    /// Node the event is aimed at. `None` means the focused node.
    pub target: Option<NodeId>,
    current_target: Cell<Option<NodeId>>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl KeyboardEvent {
    /// Create a key press aimed at the focused node
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_modifiers(key, Modifiers::empty())
    }

    /// Create a key press with modifiers
    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            target: None,
            current_target: Cell::new(None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// Aim the event at a specific node
    pub fn on(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// The node whose listener is currently running (`None` for document listeners)
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

/// Handler for keydown events.
pub type KeyHandler = Rc<dyn Fn(&KeyboardEvent)>;

// =============================================================================
// HANDLER REGISTRY
// =============================================================================

struct HandlerRegistry {
    node_handlers: HashMap<NodeId, Vec<(usize, KeyHandler)>>,
    document_handlers: Vec<(usize, KeyHandler)>,
    next_id: usize,
}

impl HandlerRegistry {
    fn new() -> Self {
        Self {
            node_handlers: HashMap::new(),
            document_handlers: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn is_registered(&self, node: Option<NodeId>, id: usize) -> bool {
        let list = match node {
            Some(node) => match self.node_handlers.get(&node) {
                Some(list) => list,
                None => return false,
            },
            None => &self.document_handlers,
        };
        list.iter().any(|(handler_id, _)| *handler_id == id)
    }
}

thread_local! {
    static REGISTRY: RefCell<HandlerRegistry> = RefCell::new(HandlerRegistry::new());
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

fn snapshot(node: Option<NodeId>) -> Vec<(usize, KeyHandler)> {
    REGISTRY.with(|reg| {
        let reg = reg.borrow();
        match node {
            Some(node) => reg.node_handlers.get(&node).cloned().unwrap_or_default(),
            None => reg.document_handlers.clone(),
        }
    })
}

fn deliver(node: Option<NodeId>, event: &KeyboardEvent) {
    event.current_target.set(node);
    // Snapshot so listeners may (un)register while running; a listener
    // removed by an earlier one is skipped.
    for (id, handler) in snapshot(node) {
        let registered = REGISTRY.with(|reg| reg.borrow().is_registered(node, id));
        if registered {
            handler(event);
        }
    }
}

/// Dispatch a keydown event.
///
/// Returns true if a listener prevented the default action.
pub fn dispatch_keydown(event: &KeyboardEvent) -> bool {
    let target = event.target.or_else(active_element).filter(|&node| is_alive(node));

    if let Some(target) = target {
        let mut path = vec![target];
        path.extend(ancestors(target));
        for node in path {
            deliver(Some(node), event);
            if event.is_propagation_stopped() {
                event.current_target.set(None);
                return event.is_default_prevented();
            }
        }
    }

    deliver(None, event);
    event.current_target.set(None);
    event.is_default_prevented()
}

/// Press a key on the focused node.
pub fn press(key: &str) -> bool {
    dispatch_keydown(&KeyboardEvent::new(key))
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Listen for keydown on a node.
/// Returns cleanup function.
pub fn on_keydown<F>(node: NodeId, handler: F) -> impl FnOnce()
where
    F: Fn(&KeyboardEvent) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.node_handlers
            .entry(node)
            .or_default()
            .push((id, Rc::new(handler)));
        id
    });
    tracing::trace!(%node, id, "keydown listener added");

    move || {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            if let Some(handlers) = reg.node_handlers.get_mut(&node) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
                if handlers.is_empty() {
                    reg.node_handlers.remove(&node);
                }
            }
        });
    }
}

/// Listen for keydown anywhere in the document.
/// Returns cleanup function.
pub fn on_document_keydown<F>(handler: F) -> impl FnOnce()
where
    F: Fn(&KeyboardEvent) + 'static,
{
    let id = REGISTRY.with(|reg| {
        let mut reg = reg.borrow_mut();
        let id = reg.next_id();
        reg.document_handlers.push((id, Rc::new(handler)));
        id
    });

    move || {
        REGISTRY.with(|reg| {
            reg.borrow_mut()
                .document_handlers
                .retain(|(handler_id, _)| *handler_id != id);
        });
    }
}

/// Number of listeners on a node.
pub fn listener_count(node: NodeId) -> usize {
    REGISTRY.with(|reg| reg.borrow().node_handlers.get(&node).map_or(0, Vec::len))
}

/// Number of document-level listeners.
pub fn document_listener_count() -> usize {
    REGISTRY.with(|reg| reg.borrow().document_handlers.len())
}

/// Reset keyboard state (for testing)
pub fn reset_keyboard_state() {
    REGISTRY.with(|reg| *reg.borrow_mut() = HandlerRegistry::new());
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{append_child, body, create_element, reset_document};

    fn setup() {
        reset_document();
        reset_keyboard_state();
        super::super::focus::reset_focus_state();
    }

    #[test]
    fn test_node_listener_and_cleanup() {
        setup();
        let button = create_element("button");
        append_child(body(), button).unwrap();

        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let cleanup = on_keydown(button, move |_| counter.set(counter.get() + 1));

        dispatch_keydown(&KeyboardEvent::new("a").on(button));
        assert_eq!(count.get(), 1);

        cleanup();
        dispatch_keydown(&KeyboardEvent::new("a").on(button));
        assert_eq!(count.get(), 1);
        assert_eq!(listener_count(button), 0);
    }

    #[test]
    fn test_bubbles_to_ancestors_then_document() {
        setup();
        let outer = create_element("div");
        let inner = create_element("button");
        append_child(body(), outer).unwrap();
        append_child(outer, inner).unwrap();

        let order = Rc::new(RefCell::new(Vec::new()));
        let sink = order.clone();
        let _a = on_keydown(outer, move |e| sink.borrow_mut().push(("outer", e.current_target())));
        let sink = order.clone();
        let _b = on_keydown(inner, move |e| sink.borrow_mut().push(("inner", e.current_target())));
        let sink = order.clone();
        let _c = on_document_keydown(move |e| sink.borrow_mut().push(("document", e.current_target())));

        dispatch_keydown(&KeyboardEvent::new("x").on(inner));
        assert_eq!(
            *order.borrow(),
            vec![("inner", Some(inner)), ("outer", Some(outer)), ("document", None)]
        );
    }

    #[test]
    fn test_stop_propagation_and_prevent_default() {
        setup();
        let button = create_element("button");
        append_child(body(), button).unwrap();

        let reached = Rc::new(Cell::new(false));
        let _a = on_keydown(button, |e| {
            e.prevent_default();
            e.stop_propagation();
        });
        let flag = reached.clone();
        let _b = on_document_keydown(move |_| flag.set(true));

        assert!(dispatch_keydown(&KeyboardEvent::new(kbd::ENTER).on(button)));
        assert!(!reached.get());
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        setup();
        let button = create_element("button");
        append_child(body(), button).unwrap();

        let second_ran = Rc::new(Cell::new(false));
        let remover: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(None));

        let slot = remover.clone();
        let _first = on_keydown(button, move |_| {
            if let Some(remove) = slot.borrow_mut().take() {
                remove();
            }
        });
        let flag = second_ran.clone();
        *remover.borrow_mut() = Some(Box::new(on_keydown(button, move |_| flag.set(true))));

        dispatch_keydown(&KeyboardEvent::new("a").on(button));
        assert!(!second_ran.get());
    }

    #[test]
    fn test_modifiers() {
        let event = KeyboardEvent::with_modifiers(kbd::TAB, Modifiers::SHIFT | Modifiers::CTRL);
        assert!(event.modifiers.contains(Modifiers::SHIFT));
        assert!(!event.modifiers.contains(Modifiers::ALT));
    }
}
