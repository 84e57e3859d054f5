//! Escape keydown: layered dismissal.
//!
//! Every engaged node is a layer. The responsible layer is the topmost one
//! whose behavior is `Close` or `Ignore`; when none claims responsibility
//! the bottom layer is responsible. Only the responsible layer acts.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::reactive::Signal;
use crate::state::keyboard::{kbd, on_document_keydown, KeyboardEvent};
use crate::types::{Cleanup, EscapeBehavior, NodeId};

/// Called when escape dismisses the layer.
pub type EscapeHandler = Rc<dyn Fn(&KeyboardEvent)>;

#[derive(Clone)]
pub struct EscapeConfig {
    pub handler: Option<EscapeHandler>,
    /// Read on every key press, so changes apply without re-engaging.
    pub behavior: Signal<EscapeBehavior>,
}

impl EscapeConfig {
    pub fn new(behavior: Signal<EscapeBehavior>) -> Self {
        Self { handler: None, behavior }
    }

    pub fn with_handler(mut self, handler: impl Fn(&KeyboardEvent) + 'static) -> Self {
        self.handler = Some(Rc::new(handler));
        self
    }
}

impl fmt::Debug for EscapeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EscapeConfig")
            .field("handler", &self.handler.is_some())
            .field("behavior", &self.behavior.get())
            .finish()
    }
}

// =============================================================================
// LAYER STACK
// =============================================================================

#[derive(Clone)]
struct EscapeLayer {
    id: usize,
    behavior: Signal<EscapeBehavior>,
}

thread_local! {
    static ESCAPE_LAYERS: RefCell<Vec<EscapeLayer>> = const { RefCell::new(Vec::new()) };
    static NEXT_LAYER_ID: Cell<usize> = const { Cell::new(0) };
}

fn responsible_layer() -> Option<usize> {
    let layers = ESCAPE_LAYERS.with(|layers| layers.borrow().clone());
    layers
        .iter()
        .rev()
        .find(|layer| layer.behavior.get().claims_responsibility())
        .or_else(|| layers.first())
        .map(|layer| layer.id)
}

pub fn escape_layer_count() -> usize {
    ESCAPE_LAYERS.with(|layers| layers.borrow().len())
}

pub(super) fn reset_escape_layers() {
    ESCAPE_LAYERS.with(|layers| layers.borrow_mut().clear());
}

// =============================================================================
// ENGAGE
// =============================================================================

pub(super) fn engage(node: NodeId, config: EscapeConfig) -> Cleanup {
    let id = NEXT_LAYER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    ESCAPE_LAYERS.with(|layers| {
        layers.borrow_mut().push(EscapeLayer {
            id,
            behavior: config.behavior.clone(),
        });
    });

    let remove_listener = on_document_keydown(move |event| {
        // A layer above may have closed during this dispatch.
        if event.key != kbd::ESCAPE || event.is_default_prevented() || responsible_layer() != Some(id) {
            return;
        }
        let behavior = config.behavior.get();
        if !behavior.closes() {
            tracing::trace!(%node, behavior = behavior.as_str(), "escape ignored");
            return;
        }
        event.prevent_default();
        if let Some(handler) = &config.handler {
            handler(event);
        }
    });

    Box::new(move || {
        remove_listener();
        ESCAPE_LAYERS.with(|layers| layers.borrow_mut().retain(|layer| layer.id != id));
    })
}
