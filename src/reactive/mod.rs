//! Reactive Module - Signals, derived values, and effects.
//!
//! Values and the dependency graph come from `spark-signals`. This module
//! adds what a dialog needs on top of it:
//!
//! - [`effect`] - callback over an explicit dependency list, with cleanup
//!   and an optional skipped first run
//! - [`Overridable`] - signal whose writes pass through a change hook
//! - [`queue_microtask`] - deferral point for work that waits on the host
//!
//! Every dialog owns its own signals; nothing here is a global registry
//! of values.
//!
//! # Example
//!
//! ```ignore
//! use spark_dialog::reactive::{derived, effect, signal, EffectOptions};
//!
//! let open = signal(false);
//! let o = open.clone();
//! let visible = derived(move || o.get());
//!
//! let v = visible.clone();
//! let handle = effect(&[&visible], EffectOptions::default(), move || {
//!     println!("visible = {}", v.get());
//!     noop()
//! });
//!
//! open.set(true); // prints "visible = true"
//! handle.stop();
//! ```

use std::rc::Rc;

use spark_signals::AnySource;

mod effect;
mod overridable;
mod scheduler;

pub use effect::{effect, EffectHandle, EffectOptions};
pub use overridable::{Change, ChangeFn, Overridable};
pub use scheduler::{flush_microtasks, pending_microtasks, queue_microtask, reset_scheduler};
pub use spark_signals::{
    batch, derived, is_batching, reactive_prop, signal, untrack, Derived, PropValue, Signal,
};

/// Anything an effect can list as a dependency.
pub trait Observable {
    /// A reader that subscribes the running effect and returns the
    /// current write version. The version moves only when the value
    /// actually changes.
    fn version_reader(&self) -> Rc<dyn Fn() -> u32>;
}

impl<T: Clone + PartialEq + 'static> Observable for Signal<T> {
    fn version_reader(&self) -> Rc<dyn Fn() -> u32> {
        let signal = self.clone();
        Rc::new(move || {
            signal.with(|_| ());
            AnySource::write_version(&**signal.inner())
        })
    }
}

impl<T: Clone + PartialEq + 'static> Observable for Derived<T> {
    fn version_reader(&self) -> Rc<dyn Fn() -> u32> {
        let derived = self.clone();
        Rc::new(move || {
            let _ = derived.get();
            AnySource::write_version(&**derived.inner())
        })
    }
}
