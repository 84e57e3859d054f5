//! Dialog elements: attribute derivation and activation per part.
//!
//! Each element exposes:
//! - `attributes()` - pure function of the dialog's current state
//! - `action(node)` - binds listeners and subsystems, returns the teardown
//! - `mount(node)` - keeps attributes projected onto the node, then activates

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::engine::{apply_attributes, style_to_string};
use crate::reactive::{effect, EffectOptions, Observable};
use crate::state::keyboard::{kbd, on_keydown, KeyboardEvent};
use crate::state::pointer::{on_click, PointerEvent};
use crate::subsystems::{
    resolve_portal_destination, Capability, EngagementSet, EscapeConfig, FocusTrapConfig,
    ModalConfig, PortalConfig, PORTAL_ATTRIBUTE,
};
use crate::types::{
    execute_callbacks, noop, Attributes, Cleanup, DialogPart, NodeId, PortalTarget,
};

use super::controller::DialogContext;

fn data_state(open: bool) -> &'static str {
    if open { "open" } else { "closed" }
}

fn is_activation_key(event: &KeyboardEvent) -> bool {
    event.key == kbd::ENTER || event.key == kbd::SPACE
}

/// One part of a dialog, ready to bind to a host node.
#[derive(Clone)]
pub struct Element {
    part: DialogPart,
    ctx: Rc<DialogContext>,
}

impl Element {
    pub(crate) fn new(part: DialogPart, ctx: Rc<DialogContext>) -> Self {
        Self { part, ctx }
    }

    pub fn part(&self) -> DialogPart {
        self.part
    }

    /// Element name, e.g. `dialog-trigger`.
    pub fn name(&self) -> String {
        format!("dialog-{}", self.part.as_str())
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Attributes for the current state.
    pub fn attributes(&self) -> Attributes {
        let ctx = &self.ctx;
        let base = Attributes::new().set(self.part.marker_attribute(), "");

        match self.part {
            DialogPart::Trigger => base
                .set("aria-haspopup", "dialog")
                .set("aria-expanded", ctx.open.get().to_string())
                .set("type", "button"),

            DialogPart::Overlay => {
                let visible = ctx.is_visible.get();
                hidden_unless_visible(base, visible)
                    .set("tabindex", "-1")
                    .set("aria-hidden", "true")
                    .set("data-state", data_state(ctx.open.get()))
            }

            DialogPart::Content => {
                let visible = ctx.is_visible.get();
                let base = base
                    .set("id", ctx.ids.content.clone())
                    .set("role", ctx.options.role.get())
                    .set("aria-describedby", ctx.ids.description.clone())
                    .set("aria-labelledby", ctx.ids.title.clone())
                    .set_opt("aria-modal", visible.then(|| "true".to_string()))
                    .set("data-state", data_state(ctx.open.get()))
                    .set("tabindex", "-1");
                hidden_unless_visible(base, visible)
            }

            DialogPart::Title => base.set("id", ctx.ids.title.clone()),

            DialogPart::Description => base.set("id", ctx.ids.description.clone()),

            DialogPart::Close => base.set("type", "button"),

            DialogPart::Portalled => {
                let value = match ctx.options.portal.get() {
                    PortalTarget::Disabled => None,
                    PortalTarget::Selector(selector) => Some(selector),
                    PortalTarget::Inherit | PortalTarget::Node(_) => Some(String::new()),
                };
                base.set_opt(PORTAL_ATTRIBUTE, value)
            }
        }
    }

    fn attribute_dependencies(&self) -> Vec<&dyn Observable> {
        let ctx = &self.ctx;
        match self.part {
            DialogPart::Trigger => vec![&ctx.open as &dyn Observable],
            DialogPart::Overlay => vec![&ctx.is_visible as &dyn Observable, &ctx.open],
            DialogPart::Content => vec![&ctx.is_visible as &dyn Observable, &ctx.open, &ctx.options.role],
            DialogPart::Portalled => vec![&ctx.options.portal as &dyn Observable],
            DialogPart::Title | DialogPart::Description | DialogPart::Close => Vec::new(),
        }
    }

    // =========================================================================
    // Activation
    // =========================================================================

    /// Activate on `node`. Returns the deactivation.
    pub fn action(&self, node: NodeId) -> Cleanup {
        match self.part {
            DialogPart::Trigger => trigger_action(&self.ctx, node),
            DialogPart::Close => close_action(&self.ctx, node),
            DialogPart::Content => content_action(&self.ctx, node),
            DialogPart::Portalled => portalled_action(&self.ctx, node),
            DialogPart::Overlay | DialogPart::Title | DialogPart::Description => noop(),
        }
    }

    /// Project attributes onto `node` reactively, then activate.
    pub fn mount(&self, node: NodeId) -> Cleanup {
        let element = self.clone();
        let attributes = effect(&self.attribute_dependencies(), EffectOptions::default(), move || {
            if let Err(error) = apply_attributes(node, &element.attributes()) {
                tracing::warn!(%error, part = element.part.as_str(), "attribute projection failed");
            }
            noop()
        });
        let deactivate = self.action(node);
        tracing::trace!(part = self.part.as_str(), %node, "element mounted");

        Box::new(move || {
            deactivate();
            attributes.stop();
        })
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("part", &self.part).finish()
    }
}

fn hidden_unless_visible(attributes: Attributes, visible: bool) -> Attributes {
    if visible {
        attributes.unset("hidden").unset("style")
    } else {
        attributes
            .set("hidden", "")
            .set("style", style_to_string(&[("display", "none")]))
    }
}

// =============================================================================
// Trigger / Close
// =============================================================================

fn trigger_action(ctx: &Rc<DialogContext>, node: NodeId) -> Cleanup {
    let weak = Rc::downgrade(ctx);
    let on_click_open = {
        let weak = weak.clone();
        on_click(node, move |_| {
            if let Some(ctx) = weak.upgrade() {
                ctx.handle_open(node);
            }
        })
    };
    let on_key_open = on_keydown(node, move |event| {
        if !is_activation_key(event) {
            return;
        }
        event.prevent_default();
        if let Some(ctx) = weak.upgrade() {
            ctx.handle_open(node);
        }
    });

    execute_callbacks(vec![Box::new(on_click_open) as Cleanup, Box::new(on_key_open)])
}

fn close_action(ctx: &Rc<DialogContext>, node: NodeId) -> Cleanup {
    let weak = Rc::downgrade(ctx);
    let on_click_close = {
        let weak = weak.clone();
        on_click(node, move |_| {
            if let Some(ctx) = weak.upgrade() {
                ctx.handle_close();
            }
        })
    };
    let on_key_close = on_keydown(node, move |event| {
        if !is_activation_key(event) {
            return;
        }
        event.prevent_default();
        if let Some(ctx) = weak.upgrade() {
            ctx.handle_close();
        }
    });

    execute_callbacks(vec![Box::new(on_click_close) as Cleanup, Box::new(on_key_close)])
}

// =============================================================================
// Content
// =============================================================================

/// Modal, escape, and focus trap, in engagement order.
fn content_capabilities(ctx: &Rc<DialogContext>, node: NodeId) -> Vec<Capability> {
    let close = {
        let weak: Weak<DialogContext> = Rc::downgrade(ctx);
        move || {
            if let Some(ctx) = weak.upgrade() {
                ctx.handle_close();
            }
        }
    };

    let outside_click = ctx.options.on_outside_click.clone();
    let modal = ModalConfig {
        close_on_interact_outside: ctx.options.close_on_outside_click.get(),
        on_close: Some(Rc::new(close.clone())),
        should_close_on_interact_outside: Some(Rc::new(move |event: &PointerEvent| {
            if let Some(handler) = outside_click.get() {
                handler.call(event);
            }
            !event.is_default_prevented()
        })),
    };

    let escape = EscapeConfig::new(ctx.options.escape_behavior.clone()).with_handler(move |_| close());

    vec![
        Capability::Modal(modal),
        Capability::EscapeKeydown(escape),
        Capability::FocusTrap(FocusTrapConfig {
            fallback_focus: Some(node),
        }),
    ]
}

fn content_action(ctx: &Rc<DialogContext>, node: NodeId) -> Cleanup {
    let engaged = Rc::new(RefCell::new(EngagementSet::new()));

    let (c, set) = (ctx.clone(), engaged.clone());
    let handle = effect(
        &[&ctx.is_visible, &ctx.options.close_on_outside_click],
        EffectOptions::default(),
        move || -> Cleanup {
            set.borrow_mut().disengage_all();
            if !c.is_visible.get() {
                return noop();
            }

            for capability in content_capabilities(&c, node) {
                let kind = capability.kind();
                if let Err(error) = set.borrow_mut().engage(capability, node) {
                    tracing::warn!(%error, %kind, %node, "content capability failed to engage");
                }
            }

            let set = set.clone();
            Box::new(move || set.borrow_mut().disengage_all())
        },
    );

    let ctx = ctx.clone();
    Box::new(move || {
        ctx.release_scroll_lock();
        handle.stop();
        engaged.borrow_mut().disengage_all();
    })
}

// =============================================================================
// Portalled
// =============================================================================

fn portalled_action(ctx: &Rc<DialogContext>, node: NodeId) -> Cleanup {
    let portal = ctx.options.portal.clone();
    let handle = effect(&[&ctx.options.portal], EffectOptions::default(), move || -> Cleanup {
        let target = portal.get();
        if target.is_disabled() {
            return noop();
        }
        match resolve_portal_destination(node, &target) {
            Ok(Some(destination)) => match Capability::Portal(PortalConfig { destination }).engage(node) {
                Ok(mount) => Box::new(move || mount.disengage()),
                Err(error) => {
                    tracing::warn!(%error, %node, %destination, "portal mount failed");
                    noop()
                }
            },
            Ok(None) => {
                tracing::debug!(%node, ?target, "no portal destination");
                noop()
            }
            Err(error) => {
                tracing::warn!(%error, %node, "portal destination is invalid");
                noop()
            }
        }
    });

    handle.into_cleanup()
}
