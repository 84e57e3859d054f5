//! Modal barrier: closes the topmost modal on interaction outside it.
//!
//! An interaction counts as outside only if it starts (pointerdown) and
//! ends (pointerup) outside the modal node. Lower layers ignore pointer
//! traffic entirely.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::engine::contains;
use crate::state::pointer::{on_document_pointerdown, on_document_pointerup, PointerEvent};
use crate::types::{Cleanup, NodeId};

/// Called to close the modal.
pub type CloseHandler = Rc<dyn Fn()>;

/// Asked before closing on outside interaction; `false` vetoes.
pub type ShouldCloseFn = Rc<dyn Fn(&PointerEvent) -> bool>;

#[derive(Clone)]
pub struct ModalConfig {
    pub close_on_interact_outside: bool,
    pub on_close: Option<CloseHandler>,
    pub should_close_on_interact_outside: Option<ShouldCloseFn>,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            close_on_interact_outside: true,
            on_close: None,
            should_close_on_interact_outside: None,
        }
    }
}

impl fmt::Debug for ModalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalConfig")
            .field("close_on_interact_outside", &self.close_on_interact_outside)
            .field("on_close", &self.on_close.is_some())
            .field("should_close_on_interact_outside", &self.should_close_on_interact_outside.is_some())
            .finish()
    }
}

// =============================================================================
// LAYER STACK
// =============================================================================

thread_local! {
    static MODAL_LAYERS: RefCell<Vec<(usize, NodeId)>> = const { RefCell::new(Vec::new()) };
    static NEXT_LAYER_ID: Cell<usize> = const { Cell::new(0) };
}

fn push_layer(node: NodeId) -> usize {
    let id = NEXT_LAYER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    MODAL_LAYERS.with(|layers| layers.borrow_mut().push((id, node)));
    id
}

fn remove_layer(id: usize) {
    MODAL_LAYERS.with(|layers| layers.borrow_mut().retain(|(layer, _)| *layer != id));
}

fn is_top_layer(id: usize) -> bool {
    MODAL_LAYERS.with(|layers| layers.borrow().last().is_some_and(|(layer, _)| *layer == id))
}

/// Whether `node` is the topmost modal.
pub fn is_top_modal(node: NodeId) -> bool {
    MODAL_LAYERS.with(|layers| layers.borrow().last().is_some_and(|(_, top)| *top == node))
}

pub fn modal_layer_count() -> usize {
    MODAL_LAYERS.with(|layers| layers.borrow().len())
}

pub(super) fn reset_modal_layers() {
    MODAL_LAYERS.with(|layers| layers.borrow_mut().clear());
}

// =============================================================================
// ENGAGE
// =============================================================================

pub(super) fn engage(node: NodeId, config: ModalConfig) -> Cleanup {
    let layer = push_layer(node);
    let started_outside = Rc::new(Cell::new(false));

    let flag = started_outside.clone();
    let remove_down = on_document_pointerdown(move |event| {
        flag.set(is_top_layer(layer) && !contains(node, event.target));
    });

    let remove_up = on_document_pointerup(move |event| {
        if !started_outside.replace(false) || !is_top_layer(layer) || contains(node, event.target) {
            return;
        }
        if !config.close_on_interact_outside {
            return;
        }
        let allowed = config
            .should_close_on_interact_outside
            .as_ref()
            .is_none_or(|should_close| should_close(event));
        if !allowed {
            tracing::debug!(%node, "outside interaction vetoed");
            return;
        }
        if let Some(on_close) = &config.on_close {
            on_close();
        }
    });

    Box::new(move || {
        remove_down();
        remove_up();
        remove_layer(layer);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{append_child, body, create_element, reset_document};
    use crate::state::pointer::{click, dispatch_pointer, reset_pointer_state};

    fn setup() {
        reset_document();
        reset_pointer_state();
        reset_modal_layers();
    }

    fn attach(parent: NodeId) -> NodeId {
        let node = create_element("div");
        append_child(parent, node).unwrap();
        node
    }

    fn counting_config(closes: &Rc<Cell<usize>>) -> ModalConfig {
        let counter = closes.clone();
        ModalConfig {
            on_close: Some(Rc::new(move || counter.set(counter.get() + 1))),
            ..ModalConfig::default()
        }
    }

    #[test]
    fn test_outside_click_closes() {
        setup();
        let modal = attach(body());
        let inside = attach(modal);
        let outside = attach(body());
        let closes = Rc::new(Cell::new(0));

        let cleanup = engage(modal, counting_config(&closes));
        click(inside);
        assert_eq!(closes.get(), 0);
        click(outside);
        assert_eq!(closes.get(), 1);

        cleanup();
        click(outside);
        assert_eq!(closes.get(), 1);
        assert_eq!(modal_layer_count(), 0);
    }

    #[test]
    fn test_drag_from_inside_does_not_close() {
        setup();
        let modal = attach(body());
        let outside = attach(body());
        let closes = Rc::new(Cell::new(0));

        let _cleanup = engage(modal, counting_config(&closes));
        dispatch_pointer(&PointerEvent::down(modal));
        dispatch_pointer(&PointerEvent::up(outside));
        assert_eq!(closes.get(), 0);
    }

    #[test]
    fn test_disabled_and_vetoed() {
        setup();
        let modal = attach(body());
        let outside = attach(body());
        let closes = Rc::new(Cell::new(0));

        let disabled = engage(modal, ModalConfig {
            close_on_interact_outside: false,
            ..counting_config(&closes)
        });
        click(outside);
        assert_eq!(closes.get(), 0);
        disabled();

        let vetoed = engage(modal, ModalConfig {
            should_close_on_interact_outside: Some(Rc::new(|_: &PointerEvent| false)),
            ..counting_config(&closes)
        });
        click(outside);
        assert_eq!(closes.get(), 0);
        vetoed();
    }

    #[test]
    fn test_only_top_layer_closes() {
        setup();
        let lower = attach(body());
        let upper = attach(body());
        let outside = attach(body());
        let lower_closes = Rc::new(Cell::new(0));
        let upper_closes = Rc::new(Cell::new(0));

        let _lower = engage(lower, counting_config(&lower_closes));
        let remove_upper = engage(upper, counting_config(&upper_closes));
        assert!(is_top_modal(upper));

        click(outside);
        assert_eq!((lower_closes.get(), upper_closes.get()), (0, 1));

        remove_upper();
        click(outside);
        assert_eq!((lower_closes.get(), upper_closes.get()), (1, 1));
    }
}
