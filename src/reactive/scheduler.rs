//! The microtask queue.
//!
//! Signal writes propagate synchronously (or at the end of a
//! [`batch`](super::batch)). Work that must wait for the host to render,
//! such as moving focus, is queued here instead and runs when the host
//! calls [`flush_microtasks`].

use std::cell::RefCell;
use std::collections::VecDeque;

thread_local! {
    static MICROTASKS: RefCell<VecDeque<Box<dyn FnOnce()>>> = RefCell::new(VecDeque::new());
}

pub fn queue_microtask(task: impl FnOnce() + 'static) {
    MICROTASKS.with(|queue| queue.borrow_mut().push_back(Box::new(task)));
}

/// Run queued microtasks, including ones queued while flushing.
/// Returns how many ran.
pub fn flush_microtasks() -> usize {
    let mut ran = 0;
    while let Some(task) = MICROTASKS.with(|queue| queue.borrow_mut().pop_front()) {
        task();
        ran += 1;
    }
    ran
}

pub fn pending_microtasks() -> usize {
    MICROTASKS.with(|queue| queue.borrow().len())
}

/// Drop all queued work (for testing).
pub fn reset_scheduler() {
    MICROTASKS.with(|queue| queue.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_microtasks_run_in_order_including_nested() {
        reset_scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));

        let sink = log.clone();
        queue_microtask(move || {
            sink.borrow_mut().push("a");
            let inner = sink.clone();
            queue_microtask(move || inner.borrow_mut().push("c"));
        });
        let sink = log.clone();
        queue_microtask(move || sink.borrow_mut().push("b"));

        assert_eq!(pending_microtasks(), 2);
        assert_eq!(flush_microtasks(), 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reset_drops_queued_tasks() {
        reset_scheduler();
        queue_microtask(|| panic!("dropped task ran"));
        reset_scheduler();
        assert_eq!(flush_microtasks(), 0);
    }
}
