//! # spark-dialog
//!
//! Reactive, headless, accessible dialog controller.
//!
//! The controller owns open/closed state, derives visibility, and engages
//! focus trapping, a modal barrier, escape dismissal, and portal
//! relocation exactly while they are needed. A host view layer binds each
//! dialog element to one of its own nodes.
//!
//! ## Architecture
//!
//! ```text
//! Signal/Overridable → Derived (is_visible) → effects → subsystem engagements
//! ```
//!
//! Everything is single-threaded. Registries are thread-local and every
//! registration returns a cleanup closure.
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, Attributes, EscapeBehavior, PortalTarget, etc.)
//! - [`reactive`] - spark-signals adapter: effects, change hooks, microtasks
//! - [`engine`] - Host node tree, attributes, selectors
//! - [`state`] - Keyboard and pointer events, focus, scroll lock
//! - [`subsystems`] - Focus trap, modal, escape keydown, portal
//! - [`dialog`] - The dialog controller

pub mod dialog;
pub mod engine;
pub mod error;
pub mod reactive;
pub mod state;
pub mod subsystems;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Error, Result};

pub use dialog::{
    create_dialog, Dialog, DialogElements, DialogIds, DialogOptions, DialogProps, DialogStates,
    Element, IdOverrides,
};

pub use engine::{
    append_child, body, create_element, get_attribute, get_element_by_id, has_attribute,
    release_node, reset_document,
};

pub use reactive::{
    batch, derived, effect, flush_microtasks, signal, Change, ChangeFn, Derived, EffectHandle,
    EffectOptions, Observable, Overridable, PropValue, Signal,
};

pub use state::{
    active_element, click, dispatch_keydown, dispatch_pointer, kbd, KeyboardEvent, Modifiers,
    PointerEvent,
};

pub use subsystems::{live_engagements, total_live_engagements, CapabilityKind};

/// Reset all thread-local state (for testing).
pub fn reset_all() {
    engine::reset_document();
    reactive::reset_scheduler();
    state::reset_focus_state();
    state::reset_keyboard_state();
    state::reset_pointer_state();
    state::reset_scroll_state();
    subsystems::reset_subsystems();
}
