//! Dialog configuration.

use std::fmt;
use std::rc::Rc;

use crate::reactive::{
    effect, reactive_prop, signal, untrack, Change, ChangeFn, EffectHandle, EffectOptions,
    PropValue, Signal,
};
use crate::types::{noop, EscapeBehavior, FocusProp, OutsideClickHandler, PortalTarget};

// =============================================================================
// Prop values
// =============================================================================

/// Debug view of a prop: the current value and where it comes from.
struct PropDebug<'a, T: Clone + PartialEq + 'static>(&'a PropValue<T>);

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for PropDebug<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0 {
            PropValue::Static(_) => "Static",
            PropValue::Signal(_) => "Signal",
            PropValue::Getter(_) => "Getter",
        };
        f.debug_tuple(kind).field(&self.0.peek()).finish()
    }
}

/// The signal a dialog reads one option from.
///
/// Static values get a signal of their own. Caller signals are shared, so
/// writing to them reconfigures the dialog. Getters are mirrored into a
/// fresh signal by an effect pushed onto `mirrors`; a direct write to that
/// signal holds until the getter's value next changes.
fn option_signal<T: Clone + PartialEq + 'static>(
    prop: PropValue<T>,
    mirrors: &mut Vec<EffectHandle>,
) -> Signal<T> {
    match prop {
        PropValue::Static(value) => signal(value),
        PropValue::Signal(shared) => shared,
        getter @ PropValue::Getter(_) => {
            let source = reactive_prop(getter);
            let target = signal(untrack(|| source.get()));
            let (from, to) = (source.clone(), target.clone());
            mirrors.push(effect(
                &[&source],
                EffectOptions { skip_first_run: true },
                move || {
                    to.set(from.get());
                    noop()
                },
            ));
            target
        }
    }
}

// =============================================================================
// Ids
// =============================================================================

/// Caller-chosen element ids. Unset ids are generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdOverrides {
    pub content: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

// =============================================================================
// Dialog Props
// =============================================================================

/// Properties for a dialog.
///
/// # Example
///
/// ```ignore
/// let props = DialogProps {
///     escape_behavior: PropValue::Static(EscapeBehavior::Ignore),
///     portal: PropValue::from_signal(&portal),
///     role: PropValue::getter(move || (if alert.get() { "alertdialog" } else { "dialog" }).into()),
///     ..Default::default()
/// };
/// let dialog = create_dialog(props);
/// ```
pub struct DialogProps {
    /// Lock body scrolling while open (default: true).
    pub prevent_scroll: PropValue<bool>,

    /// Escape key policy (default: close).
    pub escape_behavior: PropValue<EscapeBehavior>,

    /// Close on pointer interaction outside the content (default: true).
    pub close_on_outside_click: PropValue<bool>,

    /// ARIA role of the content (default: "dialog").
    pub role: PropValue<String>,

    /// Initial open state when no `open` signal is supplied (default: false).
    pub default_open: bool,

    /// Caller-owned open state. Takes precedence over `default_open`.
    pub open: Option<Signal<bool>>,

    /// Intercepts every open/close write; `None` from the hook vetoes it.
    pub on_open_change: Option<ChangeFn<bool>>,

    /// Where the portalled part is relocated (default: "body").
    pub portal: PropValue<PortalTarget>,

    /// Keep the dialog visible regardless of `open` (default: false).
    pub force_visible: PropValue<bool>,

    /// Focus target on open (default: the content).
    pub open_focus: PropValue<Option<FocusProp>>,

    /// Focus target on close (default: the trigger that opened it).
    pub close_focus: PropValue<Option<FocusProp>>,

    /// Sees outside interactions first; `prevent_default()` keeps the dialog open.
    pub on_outside_click: PropValue<Option<OutsideClickHandler>>,

    pub ids: IdOverrides,
}

impl Default for DialogProps {
    fn default() -> Self {
        Self {
            prevent_scroll: PropValue::Static(true),
            escape_behavior: PropValue::Static(EscapeBehavior::Close),
            close_on_outside_click: PropValue::Static(true),
            role: PropValue::Static("dialog".to_string()),
            default_open: false,
            open: None,
            on_open_change: None,
            portal: PropValue::Static(PortalTarget::body()),
            force_visible: PropValue::Static(false),
            open_focus: PropValue::Static(None),
            close_focus: PropValue::Static(None),
            on_outside_click: PropValue::Static(None),
            ids: IdOverrides::default(),
        }
    }
}

impl DialogProps {
    /// Set the change hook from a closure.
    pub fn with_on_open_change(mut self, hook: impl Fn(Change<bool>) -> Option<bool> + 'static) -> Self {
        self.on_open_change = Some(Rc::new(hook));
        self
    }
}

impl fmt::Debug for DialogProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogProps")
            .field("prevent_scroll", &PropDebug(&self.prevent_scroll))
            .field("escape_behavior", &PropDebug(&self.escape_behavior))
            .field("close_on_outside_click", &PropDebug(&self.close_on_outside_click))
            .field("role", &PropDebug(&self.role))
            .field("default_open", &self.default_open)
            .field("open", &self.open)
            .field("on_open_change", &self.on_open_change.is_some())
            .field("portal", &PropDebug(&self.portal))
            .field("force_visible", &PropDebug(&self.force_visible))
            .field("open_focus", &PropDebug(&self.open_focus))
            .field("close_focus", &PropDebug(&self.close_focus))
            .field("on_outside_click", &PropDebug(&self.on_outside_click))
            .field("ids", &self.ids)
            .finish()
    }
}

// =============================================================================
// Echoed options
// =============================================================================

/// The signals a dialog reads its configuration from.
///
/// Writing to any of them reconfigures the live dialog.
#[derive(Clone, Debug)]
pub struct DialogOptions {
    pub prevent_scroll: Signal<bool>,
    pub escape_behavior: Signal<EscapeBehavior>,
    pub close_on_outside_click: Signal<bool>,
    pub role: Signal<String>,
    pub portal: Signal<PortalTarget>,
    pub force_visible: Signal<bool>,
    pub open_focus: Signal<Option<FocusProp>>,
    pub close_focus: Signal<Option<FocusProp>>,
    pub on_outside_click: Signal<Option<OutsideClickHandler>>,
}

impl DialogOptions {
    /// Consumes the option props. Returns the effects mirroring getter
    /// props; they must be stopped with the dialog.
    pub(crate) fn from_props(props: DialogProps) -> (Self, Vec<EffectHandle>) {
        let mut mirrors = Vec::new();
        let options = Self {
            prevent_scroll: option_signal(props.prevent_scroll, &mut mirrors),
            escape_behavior: option_signal(props.escape_behavior, &mut mirrors),
            close_on_outside_click: option_signal(props.close_on_outside_click, &mut mirrors),
            role: option_signal(props.role, &mut mirrors),
            portal: option_signal(props.portal, &mut mirrors),
            force_visible: option_signal(props.force_visible, &mut mirrors),
            open_focus: option_signal(props.open_focus, &mut mirrors),
            close_focus: option_signal(props.close_focus, &mut mirrors),
            on_outside_click: option_signal(props.on_outside_click, &mut mirrors),
        };
        (options, mirrors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let props = DialogProps::default();
        assert!(props.prevent_scroll.peek());
        assert_eq!(props.escape_behavior.peek(), EscapeBehavior::Close);
        assert!(props.close_on_outside_click.peek());
        assert_eq!(props.role.peek(), "dialog");
        assert!(!props.default_open);
        assert_eq!(props.portal.peek(), PortalTarget::Selector("body".into()));
        assert!(!props.force_visible.peek());
        assert_eq!(props.open_focus.peek(), None);
    }

    #[test]
    fn test_signal_prop_is_shared() {
        let force = signal(false);
        let props = DialogProps {
            force_visible: PropValue::from_signal(&force),
            ..Default::default()
        };
        let (options, mirrors) = DialogOptions::from_props(props);
        assert!(mirrors.is_empty());

        force.set(true);
        assert!(options.force_visible.get());
    }

    #[test]
    fn test_static_prop_gets_own_signal() {
        let (first, _) = DialogOptions::from_props(DialogProps::default());
        let (second, _) = DialogOptions::from_props(DialogProps::default());

        first.prevent_scroll.set(false);
        assert!(second.prevent_scroll.get());
    }

    #[test]
    fn test_getter_prop_is_mirrored() {
        let alert = signal(false);
        let source = alert.clone();
        let props = DialogProps {
            role: PropValue::getter(move || {
                let role = if source.get() { "alertdialog" } else { "dialog" };
                role.to_string()
            }),
            ..Default::default()
        };
        let (options, mirrors) = DialogOptions::from_props(props);
        assert_eq!(mirrors.len(), 1);
        assert_eq!(options.role.get(), "dialog");

        alert.set(true);
        assert_eq!(options.role.get(), "alertdialog");

        options.role.set("custom".to_string());
        alert.set(false);
        assert_eq!(options.role.get(), "dialog");

        for mirror in &mirrors {
            mirror.stop();
        }
        alert.set(true);
        assert_eq!(options.role.get(), "dialog");
    }

    #[test]
    fn test_debug_names_prop_source() {
        let props = DialogProps {
            force_visible: PropValue::from_signal(&signal(true)),
            ..Default::default()
        };
        let rendered = format!("{props:?}");
        assert!(rendered.contains("prevent_scroll: Static(true)"));
        assert!(rendered.contains("force_visible: Signal(true)"));
    }
}
