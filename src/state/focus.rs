//! Focus System - Focused node, focus traps, deferred focus moves
//!
//! Manages focus state and navigation:
//! - The focused node (`active_element`)
//! - Focusability rules (native controls, `tabindex`, `hidden`, `disabled`)
//! - Focus trap stack for modal containers
//! - `handle_focus` for focus moves deferred to the next microtask
//!
//! # Example
//!
//! ```ignore
//! use spark_dialog::state::focus;
//!
//! focus::focus(button);
//! let trap = focus::push_focus_trap(dialog);
//! focus::handle_focus(None, Some(close_button));
//! spark_dialog::reactive::flush_microtasks();
//! focus::remove_focus_trap(trap);
//! ```

use std::cell::{Cell, RefCell};

use crate::engine::{
    ancestors, contains, descendants, get_attribute, has_attribute, is_alive, is_connected,
    query_selector, tag_name,
};
use crate::reactive::queue_microtask;
use crate::types::{FocusProp, NodeId};

/// Tags that can take focus without a `tabindex`.
const NATIVELY_FOCUSABLE: &[&str] = &["button", "input", "select", "textarea", "a"];

// =============================================================================
// FOCUSED NODE
// =============================================================================

thread_local! {
    static FOCUSED: Cell<Option<NodeId>> = const { Cell::new(None) };
}

/// The focused node, if it is still in the document.
pub fn active_element() -> Option<NodeId> {
    FOCUSED
        .with(Cell::get)
        .filter(|&node| is_alive(node) && is_connected(node))
}

/// Check if specific node is focused
pub fn is_focused(node: NodeId) -> bool {
    active_element() == Some(node)
}

/// Whether focus is on `container` or inside it.
pub fn has_focus_within(container: NodeId) -> bool {
    active_element().is_some_and(|focused| contains(container, focused))
}

// =============================================================================
// FOCUSABLE QUERIES
// =============================================================================

fn is_hidden(node: NodeId) -> bool {
    has_attribute(node, "hidden") || ancestors(node).into_iter().any(|a| has_attribute(a, "hidden"))
}

fn is_native(node: NodeId) -> bool {
    tag_name(node).is_some_and(|tag| NATIVELY_FOCUSABLE.contains(&tag.as_str()))
}

/// Effective tab index: the `tabindex` attribute, else 0 for native
/// controls, else `None` (not focusable).
pub fn tab_index(node: NodeId) -> Option<i32> {
    match get_attribute(node, "tabindex") {
        Some(value) => value.trim().parse().ok(),
        None => is_native(node).then_some(0),
    }
}

/// Can this node receive focus at all (programmatically)?
pub fn is_focusable(node: NodeId) -> bool {
    is_alive(node)
        && is_connected(node)
        && tab_index(node).is_some()
        && !has_attribute(node, "disabled")
        && !is_hidden(node)
}

/// Is this node reachable with Tab?
pub fn is_tabbable(node: NodeId) -> bool {
    is_focusable(node) && tab_index(node).is_some_and(|index| index >= 0)
}

/// Tabbable descendants of `container`, in tab order.
///
/// Positive tab indices come first in ascending order, then the rest in
/// document order.
pub fn tabbables(container: NodeId) -> Vec<NodeId> {
    let mut result: Vec<(i32, usize, NodeId)> = descendants(container)
        .into_iter()
        .enumerate()
        .filter(|&(_, node)| is_tabbable(node))
        .map(|(position, node)| (tab_index(node).unwrap_or(0), position, node))
        .collect();

    result.sort_by_key(|&(index, position, _)| (index == 0, index, position));
    result.into_iter().map(|(_, _, node)| node).collect()
}

// =============================================================================
// FOCUS TRAP (for modals/dialogs)
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct TrapEntry {
    id: usize,
    container: NodeId,
}

thread_local! {
    static FOCUS_TRAP_STACK: RefCell<Vec<TrapEntry>> = const { RefCell::new(Vec::new()) };
    static NEXT_TRAP_ID: Cell<usize> = const { Cell::new(0) };
}

/// Push a focus trap. Focus will be contained within `container`.
/// Returns the trap id used to remove it.
pub fn push_focus_trap(container: NodeId) -> usize {
    let id = NEXT_TRAP_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    FOCUS_TRAP_STACK.with(|stack| stack.borrow_mut().push(TrapEntry { id, container }));
    id
}

/// Remove a trap wherever it sits in the stack.
pub fn remove_focus_trap(id: usize) -> bool {
    FOCUS_TRAP_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let before = stack.len();
        stack.retain(|entry| entry.id != id);
        stack.len() != before
    })
}

/// Check if focus is currently trapped
pub fn is_focus_trapped() -> bool {
    active_focus_trap().is_some()
}

/// Container of the topmost trap whose container is still alive.
pub fn active_focus_trap() -> Option<NodeId> {
    FOCUS_TRAP_STACK.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .map(|entry| entry.container)
            .find(|&container| is_alive(container))
    })
}

/// Whether trap `id` is the topmost one.
pub fn is_top_focus_trap(id: usize) -> bool {
    FOCUS_TRAP_STACK.with(|stack| stack.borrow().last().is_some_and(|entry| entry.id == id))
}

pub fn focus_trap_depth() -> usize {
    FOCUS_TRAP_STACK.with(|stack| stack.borrow().len())
}

// =============================================================================
// FOCUS MOVES
// =============================================================================

/// Focus a node. Fails if it is not focusable or lies outside the active trap.
pub fn focus(node: NodeId) -> bool {
    if !is_focusable(node) {
        return false;
    }
    if let Some(container) = active_focus_trap() {
        if !contains(container, node) {
            tracing::debug!(%node, %container, "focus rejected by active trap");
            return false;
        }
    }
    FOCUSED.with(|focused| focused.set(Some(node)));
    true
}

/// Clear focus (no node focused)
pub fn blur() {
    FOCUSED.with(|focused| focused.set(None));
}

/// Resolve a focus prop against a default target.
///
/// No prop means the default. A selector that fails to parse logs a
/// warning and resolves to nothing.
pub fn resolve_focus_target(prop: Option<&FocusProp>, default: Option<NodeId>) -> Option<NodeId> {
    match prop {
        None => default,
        Some(FocusProp::Node(node)) => Some(*node),
        Some(FocusProp::Selector(selector)) => match query_selector(selector) {
            Ok(found) => found,
            Err(error) => {
                tracing::warn!(%error, "focus selector is invalid");
                None
            }
        },
        Some(FocusProp::Resolve(resolver)) => resolver(default),
    }
}

/// Move focus on the next microtask.
///
/// The target is resolved when the task runs, so content mounted in the
/// same tick is found. A missing or detached target is a silent no-op.
pub fn handle_focus(prop: Option<FocusProp>, default: Option<NodeId>) {
    queue_microtask(move || {
        match resolve_focus_target(prop.as_ref(), default) {
            Some(target) if is_alive(target) && is_connected(target) => {
                if !focus(target) {
                    tracing::trace!(%target, "deferred focus target refused focus");
                }
            }
            _ => tracing::trace!("deferred focus target missing"),
        }
    });
}

// =============================================================================
// RESET (for testing)
// =============================================================================

/// Reset all focus state (for testing)
pub fn reset_focus_state() {
    FOCUSED.with(|focused| focused.set(None));
    FOCUS_TRAP_STACK.with(|stack| stack.borrow_mut().clear());
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::engine::{append_child, body, create_element, release_node, reset_document, set_attribute};
    use crate::reactive::{flush_microtasks, reset_scheduler};

    fn setup() {
        reset_document();
        reset_focus_state();
        reset_scheduler();
    }

    fn attach(tag: &str, parent: NodeId) -> NodeId {
        let node = create_element(tag);
        append_child(parent, node).unwrap();
        node
    }

    #[test]
    fn test_focusability_rules() {
        setup();
        let button = attach("button", body());
        let div = attach("div", body());
        let panel = attach("div", body());
        set_attribute(panel, "tabindex", "-1");
        let disabled = attach("button", body());
        set_attribute(disabled, "disabled", "");
        let wrapper = attach("div", body());
        set_attribute(wrapper, "hidden", "");
        let hidden_button = attach("button", wrapper);
        let detached = create_element("button");

        assert!(is_tabbable(button));
        assert!(!is_focusable(div));
        assert!(is_focusable(panel));
        assert!(!is_tabbable(panel));
        assert!(!is_focusable(disabled));
        assert!(!is_focusable(hidden_button));
        assert!(!is_focusable(detached));
    }

    #[test]
    fn test_tabbables_order() {
        setup();
        let container = attach("div", body());
        let a = attach("button", container);
        let b = attach("input", container);
        set_attribute(b, "tabindex", "2");
        let c = attach("div", container);
        set_attribute(c, "tabindex", "1");
        let d = attach("a", container);

        assert_eq!(tabbables(container), vec![c, b, a, d]);
    }

    #[test]
    fn test_focus_and_blur() {
        setup();
        let button = attach("button", body());
        assert!(focus(button));
        assert_eq!(active_element(), Some(button));
        assert!(is_focused(button));

        blur();
        assert_eq!(active_element(), None);
    }

    #[test]
    fn test_released_node_is_not_active() {
        setup();
        let button = attach("button", body());
        focus(button);
        release_node(button);
        assert_eq!(active_element(), None);
    }

    #[test]
    fn test_trap_confines_focus() {
        setup();
        let outside = attach("button", body());
        let dialog = attach("div", body());
        let inside = attach("button", dialog);

        let trap = push_focus_trap(dialog);
        assert!(is_top_focus_trap(trap));
        assert!(!focus(outside));
        assert!(focus(inside));

        assert!(remove_focus_trap(trap));
        assert!(!remove_focus_trap(trap));
        assert!(focus(outside));
        assert!(!is_focus_trapped());
    }

    #[test]
    fn test_nested_traps_remove_out_of_order() {
        setup();
        let first = attach("div", body());
        let second = attach("div", body());

        let a = push_focus_trap(first);
        let b = push_focus_trap(second);
        assert_eq!(active_focus_trap(), Some(second));

        remove_focus_trap(a);
        assert_eq!(active_focus_trap(), Some(second));
        assert_eq!(focus_trap_depth(), 1);
        remove_focus_trap(b);
        assert_eq!(active_focus_trap(), None);
    }

    #[test]
    fn test_handle_focus_is_deferred() {
        setup();
        let button = attach("button", body());

        handle_focus(None, Some(button));
        assert_eq!(active_element(), None);

        flush_microtasks();
        assert_eq!(active_element(), Some(button));
    }

    #[test]
    fn test_handle_focus_resolves_selector_late() {
        setup();
        handle_focus(Some(FocusProp::from("#late")), None);

        let button = attach("button", body());
        set_attribute(button, "id", "late");

        flush_microtasks();
        assert_eq!(active_element(), Some(button));
    }

    #[test]
    fn test_handle_focus_resolver_receives_default() {
        setup();
        let default = attach("button", body());
        let other = attach("button", body());

        let seen = Rc::new(Cell::new(None));
        let sink = seen.clone();
        let prop = FocusProp::resolve(move |d| {
            sink.set(d);
            Some(other)
        });

        handle_focus(Some(prop), Some(default));
        flush_microtasks();
        assert_eq!(seen.get(), Some(default));
        assert_eq!(active_element(), Some(other));
    }

    #[test]
    fn test_handle_focus_missing_target_is_noop() {
        setup();
        let button = attach("button", body());
        focus(button);

        handle_focus(Some(FocusProp::from("#nowhere")), None);
        handle_focus(None, None);
        flush_microtasks();
        assert_eq!(active_element(), Some(button));
    }
}
