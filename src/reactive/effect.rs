//! Effects over an explicit dependency list.
//!
//! Built on `spark_signals::effect_with_cleanup`. Each run reads the listed
//! dependencies to subscribe, then calls the body untracked, so signals the
//! body happens to read never become dependencies. Guarantees:
//!
//! 1. The body runs only when a listed dependency's value changed. A
//!    derived that recomputes to the same value does not count.
//! 2. Cleanup of run *n* completes before run *n+1* starts.
//! 3. `stop()` unsubscribes first, then runs the last cleanup once.
//! 4. Writes inside one [`batch`](super::batch) cause at most one run.
//! 5. A dependency written from inside the body causes exactly one more
//!    run after the current one finishes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::{effect_with_cleanup, untrack, DisposeFn};

use crate::types::Cleanup;

use super::{queue_microtask, Observable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectOptions {
    /// Do not run at creation; wait for the first dependency change.
    pub skip_first_run: bool,
}

struct EffectState {
    cleanup: RefCell<Option<Cleanup>>,
    dispose: RefCell<Option<DisposeFn>>,
    running: Cell<bool>,
    stopped: Cell<bool>,
    runs: Cell<usize>,
}

impl EffectState {
    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    fn stop(&self) {
        if self.stopped.replace(true) {
            return;
        }
        let dispose = self.dispose.borrow_mut().take();
        if let Some(dispose) = dispose {
            if self.running.get() {
                // The graph still holds the running body.
                queue_microtask(dispose);
            } else {
                dispose();
            }
        }
        if !self.running.get() {
            self.run_cleanup();
        }
    }
}

/// Handle to a live effect.
///
/// Dropping the handle does NOT stop the effect; call [`EffectHandle::stop`].
#[derive(Clone)]
pub struct EffectHandle {
    state: Rc<EffectState>,
}

impl EffectHandle {
    /// Unsubscribe from all dependencies and run the last cleanup.
    /// Idempotent.
    pub fn stop(&self) {
        self.state.stop();
    }

    pub fn is_active(&self) -> bool {
        !self.state.stopped.get()
    }

    /// How many times the body has run.
    pub fn run_count(&self) -> usize {
        self.state.runs.get()
    }

    pub fn into_cleanup(self) -> Cleanup {
        Box::new(move || self.stop())
    }
}

/// Create an effect over `deps`.
///
/// ```ignore
/// let stop = effect(&[&open, &prevent_scroll], EffectOptions::default(), move || {
///     if !open.get() {
///         return noop();
///     }
///     let release = acquire_scroll_lock();
///     release
/// });
/// ```
pub fn effect<F>(deps: &[&dyn Observable], options: EffectOptions, mut callback: F) -> EffectHandle
where
    F: FnMut() -> Cleanup + 'static,
{
    let state = Rc::new(EffectState {
        cleanup: RefCell::new(None),
        dispose: RefCell::new(None),
        running: Cell::new(false),
        stopped: Cell::new(false),
        runs: Cell::new(0),
    });

    let versions: Vec<Rc<dyn Fn() -> u32>> = deps.iter().map(|dep| dep.version_reader()).collect();
    let mut seen: Option<Vec<u32>> = None;

    let this = state.clone();
    let dispose = effect_with_cleanup(move || {
        if this.stopped.get() {
            return None;
        }

        let current: Vec<u32> = versions.iter().map(|read| read()).collect();
        let first = seen.is_none();
        if seen.as_ref() == Some(&current) {
            return None;
        }
        seen = Some(current);
        if first && options.skip_first_run {
            return None;
        }

        this.running.set(true);
        let next = untrack(|| {
            this.run_cleanup();
            callback()
        });
        this.runs.set(this.runs.get() + 1);
        this.running.set(false);

        if this.stopped.get() {
            // Stopped from inside its own body: nothing will ever run
            // this cleanup later.
            next();
        } else {
            *this.cleanup.borrow_mut() = Some(next);
        }
        None
    });
    *state.dispose.borrow_mut() = Some(Box::new(dispose));

    EffectHandle { state }
}
