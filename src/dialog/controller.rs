//! Dialog controller: state, ids, and the public handle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::reactive::{batch, derived, signal, Derived, EffectHandle, Overridable, Signal};
use crate::engine::is_alive;
use crate::types::{Cleanup, DialogPart, NodeId};

use super::coordinator;
use super::element::Element;
use super::props::{DialogOptions, DialogProps, IdOverrides};

// =============================================================================
// IDS
// =============================================================================

thread_local! {
    static NEXT_DIALOG: Cell<u64> = const { Cell::new(0) };
}

/// Element ids linking content, title, and description. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogIds {
    pub content: String,
    pub title: String,
    pub description: String,
}

impl DialogIds {
    fn generate(overrides: IdOverrides) -> Self {
        let n = NEXT_DIALOG.with(|next| {
            let n = next.get();
            next.set(n + 1);
            n
        });
        Self {
            content: overrides.content.unwrap_or_else(|| format!("dialog-content-{n}")),
            title: overrides.title.unwrap_or_else(|| format!("dialog-title-{n}")),
            description: overrides
                .description
                .unwrap_or_else(|| format!("dialog-description-{n}")),
        }
    }
}

// =============================================================================
// SHARED CONTEXT
// =============================================================================

/// State shared by the dialog handle, its elements, and its effects.
pub(crate) struct DialogContext {
    pub(crate) open: Overridable<bool>,
    pub(crate) active_trigger: Signal<Option<NodeId>>,
    pub(crate) is_visible: Derived<bool>,
    pub(crate) ids: DialogIds,
    pub(crate) options: DialogOptions,
    /// Effects mirroring getter props into `options`.
    mirrors: Vec<EffectHandle>,
    /// Release for the held scroll lock, if any.
    scroll: RefCell<Option<Cleanup>>,
}

impl DialogContext {
    fn new(mut props: DialogProps) -> Self {
        let open = props.open.take().unwrap_or_else(|| signal(props.default_open));
        let open = Overridable::new(open, props.on_open_change.take());
        let ids = DialogIds::generate(std::mem::take(&mut props.ids));
        let (options, mirrors) = DialogOptions::from_props(props);

        let (o, f) = (open.clone(), options.force_visible.clone());
        let is_visible = derived(move || o.get() || f.get());

        Self {
            open,
            active_trigger: signal(None),
            is_visible,
            ids,
            options,
            mirrors,
            scroll: RefCell::new(None),
        }
    }

    /// Open from a trigger. Ignored if the trigger no longer exists.
    pub(crate) fn handle_open(&self, trigger: NodeId) {
        if !is_alive(trigger) {
            return;
        }
        tracing::debug!(content = %self.ids.content, %trigger, "dialog open requested");
        batch(|| {
            self.open.set(true);
            self.active_trigger.set(Some(trigger));
        });
    }

    pub(crate) fn handle_close(&self) {
        tracing::debug!(content = %self.ids.content, "dialog close requested");
        batch(|| self.open.set(false));
    }

    pub(crate) fn holds_scroll_lock(&self) -> bool {
        self.scroll.borrow().is_some()
    }

    pub(crate) fn hold_scroll_lock(&self, release: Cleanup) {
        let previous = self.scroll.borrow_mut().replace(release);
        if let Some(previous) = previous {
            previous();
        }
    }

    pub(crate) fn release_scroll_lock(&self) {
        let release = self.scroll.borrow_mut().take();
        if let Some(release) = release {
            release();
        }
    }
}

impl Drop for DialogContext {
    fn drop(&mut self) {
        for mirror in self.mirrors.drain(..) {
            mirror.stop();
        }
        if let Some(release) = self.scroll.get_mut().take() {
            release();
        }
    }
}

// =============================================================================
// DIALOG
// =============================================================================

/// The elements a host binds to its nodes.
#[derive(Clone)]
pub struct DialogElements {
    pub trigger: Element,
    pub overlay: Element,
    pub content: Element,
    pub title: Element,
    pub description: Element,
    pub close: Element,
    pub portalled: Element,
}

impl DialogElements {
    fn new(ctx: &Rc<DialogContext>) -> Self {
        let element = |part| Element::new(part, ctx.clone());
        Self {
            trigger: element(DialogPart::Trigger),
            overlay: element(DialogPart::Overlay),
            content: element(DialogPart::Content),
            title: element(DialogPart::Title),
            description: element(DialogPart::Description),
            close: element(DialogPart::Close),
            portalled: element(DialogPart::Portalled),
        }
    }

    pub fn get(&self, part: DialogPart) -> &Element {
        match part {
            DialogPart::Trigger => &self.trigger,
            DialogPart::Overlay => &self.overlay,
            DialogPart::Content => &self.content,
            DialogPart::Title => &self.title,
            DialogPart::Description => &self.description,
            DialogPart::Close => &self.close,
            DialogPart::Portalled => &self.portalled,
        }
    }
}

/// Reactive state exposed to the host.
#[derive(Clone)]
pub struct DialogStates {
    /// Open state. Writes go through `on_open_change`.
    pub open: Overridable<bool>,
}

/// A dialog controller.
///
/// Dropping it stops the focus and scroll effects. Mounted elements stay
/// live until their own cleanups run.
pub struct Dialog {
    pub ids: DialogIds,
    pub elements: DialogElements,
    pub states: DialogStates,
    pub options: DialogOptions,
    ctx: Rc<DialogContext>,
    effects: Vec<EffectHandle>,
}

/// Create a dialog controller.
///
/// # Example
///
/// ```ignore
/// let dialog = create_dialog(DialogProps::default());
///
/// let unmount_trigger = dialog.elements.trigger.mount(button);
/// let unmount_content = dialog.elements.content.mount(panel);
///
/// keyboard::dispatch_keydown(&KeyboardEvent::new(kbd::ENTER).on(button));
/// assert!(dialog.is_open());
/// ```
pub fn create_dialog(props: DialogProps) -> Dialog {
    let ctx = Rc::new(DialogContext::new(props));
    let effects = coordinator::install(&ctx);
    tracing::debug!(content = %ctx.ids.content, "dialog created");

    Dialog {
        ids: ctx.ids.clone(),
        elements: DialogElements::new(&ctx),
        states: DialogStates {
            open: ctx.open.clone(),
        },
        options: ctx.options.clone(),
        ctx,
        effects,
    }
}

impl Dialog {
    /// Request an open state change. The change hook may veto or adjust it.
    pub fn set_open(&self, open: bool) {
        tracing::debug!(content = %self.ids.content, open, "dialog open set");
        batch(|| self.ctx.open.set(open));
    }

    pub fn is_open(&self) -> bool {
        self.ctx.open.get()
    }

    /// `open || force_visible`
    pub fn is_visible(&self) -> bool {
        self.ctx.is_visible.get()
    }

    /// Tracked `open || force_visible`, for host effects.
    pub fn visibility(&self) -> Derived<bool> {
        self.ctx.is_visible.clone()
    }

    /// The trigger that most recently opened the dialog.
    pub fn active_trigger(&self) -> Option<NodeId> {
        self.ctx.active_trigger.get()
    }

    /// Whether this dialog currently holds a scroll lock.
    pub fn holds_scroll_lock(&self) -> bool {
        self.ctx.holds_scroll_lock()
    }
}

impl Drop for Dialog {
    fn drop(&mut self) {
        for effect in self.effects.drain(..) {
            effect.stop();
        }
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialog")
            .field("ids", &self.ids)
            .field("open", &self.is_open())
            .field("visible", &self.is_visible())
            .field("active_trigger", &self.active_trigger())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{effect, Change, EffectOptions, PropValue};
    use crate::types::noop;

    #[test]
    fn test_ids_generated_and_overridden() {
        let a = create_dialog(DialogProps::default());
        let b = create_dialog(DialogProps::default());
        assert_ne!(a.ids.content, b.ids.content);
        assert!(a.ids.title.starts_with("dialog-title-"));

        let custom = create_dialog(DialogProps {
            ids: IdOverrides {
                content: Some("settings".into()),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(custom.ids.content, "settings");
        assert!(custom.ids.description.starts_with("dialog-description-"));
    }

    #[test]
    fn test_visibility_follows_open_and_force() {
        let dialog = create_dialog(DialogProps {
            prevent_scroll: PropValue::Static(false),
            ..Default::default()
        });
        assert!(!dialog.is_visible());

        dialog.set_open(true);
        assert!(dialog.is_visible());

        dialog.options.force_visible.set(true);
        dialog.set_open(false);
        assert!(dialog.is_visible());

        dialog.options.force_visible.set(false);
        assert!(!dialog.is_visible());
    }

    #[test]
    fn test_caller_signal_is_authoritative() {
        let open = signal(true);
        let dialog = create_dialog(DialogProps {
            open: Some(open.clone()),
            default_open: false,
            prevent_scroll: PropValue::Static(false),
            ..Default::default()
        });
        assert!(dialog.is_open());

        open.set(false);
        assert!(!dialog.is_visible());
    }

    #[test]
    fn test_change_hook_vetoes() {
        let dialog = create_dialog(
            DialogProps {
                prevent_scroll: PropValue::Static(false),
                ..Default::default()
            }
            .with_on_open_change(|change: Change<bool>| (!change.next).then_some(false)),
        );

        dialog.set_open(true);
        assert!(!dialog.is_open());
        assert!(!dialog.states.open.get());
    }

    #[test]
    fn test_handle_open_ignores_dead_trigger() {
        crate::engine::reset_document();
        let dialog = create_dialog(DialogProps {
            prevent_scroll: PropValue::Static(false),
            ..Default::default()
        });
        let trigger = crate::engine::create_element("button");
        crate::engine::release_node(trigger);

        dialog.ctx.handle_open(trigger);
        assert!(!dialog.is_open());
        assert_eq!(dialog.active_trigger(), None);
    }

    fn count_runs(dialog: &Dialog) -> (EffectHandle, Rc<Cell<usize>>) {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let handle = effect(
            &[&dialog.visibility(), &dialog.states.open],
            EffectOptions::default(),
            move || {
                counter.set(counter.get() + 1);
                noop()
            },
        );
        (handle, runs)
    }

    #[test]
    fn test_set_open_wakes_dependents_once() {
        let dialog = create_dialog(DialogProps {
            prevent_scroll: PropValue::Static(false),
            ..Default::default()
        });
        let (handle, runs) = count_runs(&dialog);
        assert_eq!(runs.get(), 1);

        dialog.set_open(true);
        assert_eq!(runs.get(), 2);
        dialog.set_open(false);
        assert_eq!(runs.get(), 3);
        dialog.set_open(false);
        assert_eq!(runs.get(), 3);

        dialog.ctx.handle_close();
        assert_eq!(runs.get(), 3);
        handle.stop();
    }

    #[test]
    fn test_open_while_forced_visible_wakes_dependents_once() {
        let dialog = create_dialog(DialogProps {
            prevent_scroll: PropValue::Static(false),
            force_visible: PropValue::Static(true),
            ..Default::default()
        });
        let (_handle, runs) = count_runs(&dialog);

        dialog.set_open(true);
        dialog.set_open(false);
        assert_eq!(runs.get(), 3);
    }
}
