//! Signals whose writes go through a caller-supplied change hook.

use std::rc::Rc;

use super::{untrack, Observable, Signal};

/// A proposed transition handed to a change hook.
#[derive(Debug, Clone, PartialEq)]
pub struct Change<T> {
    pub curr: T,
    pub next: T,
}

/// Change hook. `Some(v)` commits `v`, `None` vetoes the write.
pub type ChangeFn<T> = Rc<dyn Fn(Change<T>) -> Option<T>>;

/// A signal whose authoritative value is whatever its hook settles on.
#[derive(Clone)]
pub struct Overridable<T> {
    signal: Signal<T>,
    on_change: Option<ChangeFn<T>>,
}

impl<T: Clone + PartialEq + 'static> Overridable<T> {
    pub fn new(signal: Signal<T>, on_change: Option<ChangeFn<T>>) -> Self {
        Self { signal, on_change }
    }

    /// Tracked read.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn set(&self, next: T) {
        let committed = match &self.on_change {
            Some(hook) => {
                let curr = untrack(|| self.signal.get());
                match hook(Change { curr, next }) {
                    Some(value) => value,
                    None => {
                        tracing::trace!("change hook vetoed write");
                        return;
                    }
                }
            }
            None => next,
        };
        self.signal.set(committed);
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = untrack(|| self.signal.with(f));
        self.set(next);
    }

    /// The underlying signal. Writing to it directly bypasses the hook.
    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }
}

impl<T: Clone + PartialEq + 'static> Observable for Overridable<T> {
    fn version_reader(&self) -> Rc<dyn Fn() -> u32> {
        self.signal.version_reader()
    }
}
