//! State Module - Document-wide interaction state
//!
//! - **Focus** - Focused node, focusability, trap stack, deferred focus
//! - **Keyboard** - Keydown events, bubbling dispatch, listener registry
//! - **Pointer** - Pointer events, capture-phase document listeners
//! - **Scroll** - Reference-counted body scroll lock

pub mod focus;
pub mod keyboard;
pub mod pointer;
pub mod scroll;

pub use focus::{active_element, blur, focus, handle_focus, reset_focus_state};
pub use keyboard::{
    dispatch_keydown, kbd, on_document_keydown, on_keydown, press, reset_keyboard_state,
    KeyboardEvent, Modifiers,
};
pub use pointer::{
    click, dispatch_pointer, on_click, on_document_pointer, on_document_pointerdown,
    on_document_pointerup, on_pointer, reset_pointer_state, PointerAction, PointerEvent,
};
pub use scroll::{acquire_scroll_lock, is_scroll_locked, reset_scroll_state, scroll_lock_count};
