//! Dialog Module - Accessible dialog controller
//!
//! `create_dialog` returns a [`Dialog`] whose elements a host binds to
//! its own nodes. The controller never creates nodes.
//!
//! - **Trigger** - opens on click or Enter/Space, records itself as the trigger
//! - **Overlay** - backdrop attributes only
//! - **Content** - engages modal, escape, and focus trap while visible
//! - **Portalled** - relocates its node per the `portal` option
//! - **Title / Description** - ids for ARIA linkage
//! - **Close** - closes on click or Enter/Space
//!
//! # Example
//!
//! ```ignore
//! use spark_dialog::dialog::{create_dialog, DialogProps};
//!
//! let dialog = create_dialog(DialogProps::default());
//! let cleanups = vec![
//!     dialog.elements.trigger.mount(button),
//!     dialog.elements.portalled.mount(wrapper),
//!     dialog.elements.overlay.mount(backdrop),
//!     dialog.elements.content.mount(panel),
//!     dialog.elements.close.mount(close_button),
//! ];
//! ```

mod controller;
mod coordinator;
mod element;
mod props;

pub use controller::{create_dialog, Dialog, DialogElements, DialogIds, DialogStates};
pub use element::Element;
pub use props::{DialogOptions, DialogProps, IdOverrides};
