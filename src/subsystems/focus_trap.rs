//! Focus trap: keeps focus inside a container while topmost.

use crate::state::focus::{
    active_element, focus, has_focus_within, is_top_focus_trap, push_focus_trap, remove_focus_trap,
    tabbables,
};
use crate::state::keyboard::{kbd, on_document_keydown, Modifiers};
use crate::types::{Cleanup, NodeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusTrapConfig {
    /// Focused when the container has no tabbable descendants.
    pub fallback_focus: Option<NodeId>,
}

fn focus_first(container: NodeId, fallback: Option<NodeId>) {
    let target = tabbables(container).first().copied().or(fallback);
    match target {
        Some(target) if focus(target) => {}
        _ => tracing::trace!(%container, "focus trap found nothing to focus"),
    }
}

pub(super) fn engage(container: NodeId, config: FocusTrapConfig) -> Cleanup {
    let trap = push_focus_trap(container);
    let fallback = config.fallback_focus;

    if !has_focus_within(container) {
        focus_first(container, fallback);
    }

    let remove_listener = on_document_keydown(move |event| {
        if event.key != kbd::TAB || !is_top_focus_trap(trap) {
            return;
        }
        event.prevent_default();

        let items = tabbables(container);
        if items.is_empty() {
            focus_first(container, fallback);
            return;
        }

        let len = items.len();
        let backwards = event.modifiers.contains(Modifiers::SHIFT);
        let current = active_element().and_then(|node| items.iter().position(|&item| item == node));
        let next = match (current, backwards) {
            (None, false) => 0,
            (None, true) => len - 1,
            (Some(position), false) => (position + 1) % len,
            (Some(position), true) => (position + len - 1) % len,
        };
        focus(items[next]);
    });

    Box::new(move || {
        remove_listener();
        remove_focus_trap(trap);
    })
}
