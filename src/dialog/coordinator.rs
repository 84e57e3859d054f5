//! Focus and scroll coordination around open/close transitions.
//!
//! Two effects:
//!
//! 1. Over `[open, prevent_scroll]`: on open, hold a scroll lock (when
//!    enabled) and move focus into the dialog. The cleanup releases the
//!    lock unless `force_visible` is set; the content teardown owns the
//!    release in that case.
//! 2. Over `[open]`, skipping the first run: on close, restore focus to
//!    `close_focus` or the trigger that opened the dialog.

use std::rc::Rc;

use crate::engine::get_element_by_id;
use crate::reactive::{effect, EffectHandle, EffectOptions};
use crate::state::focus::handle_focus;
use crate::state::scroll::acquire_scroll_lock;
use crate::types::{noop, Cleanup};

use super::controller::DialogContext;

pub(super) fn install(ctx: &Rc<DialogContext>) -> Vec<EffectHandle> {
    vec![scroll_and_open_focus(ctx), close_focus(ctx)]
}

fn scroll_and_open_focus(ctx: &Rc<DialogContext>) -> EffectHandle {
    let c = ctx.clone();
    effect(
        &[&ctx.open, &ctx.options.prevent_scroll],
        EffectOptions::default(),
        move || -> Cleanup {
            let open = c.open.get();
            if open {
                if c.options.prevent_scroll.get() && !c.holds_scroll_lock() {
                    c.hold_scroll_lock(acquire_scroll_lock());
                }
                let content = get_element_by_id(&c.ids.content);
                handle_focus(c.options.open_focus.get(), content);
            }

            let c = c.clone();
            Box::new(move || {
                if !c.options.force_visible.get() {
                    c.release_scroll_lock();
                }
            })
        },
    )
}

fn close_focus(ctx: &Rc<DialogContext>) -> EffectHandle {
    let c = ctx.clone();
    effect(
        &[&ctx.open],
        EffectOptions { skip_first_run: true },
        move || {
            if c.open.get() {
                return noop();
            }
            let trigger = c.active_trigger.get();
            handle_focus(c.options.close_focus.get(), trigger);
            noop()
        },
    )
}
