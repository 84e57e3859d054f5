//! Scroll Lock - Reference-counted body scroll prevention
//!
//! The first holder saves the body's `style` attribute and hides overflow.
//! The last release restores the saved style. Each acquisition returns a
//! one-shot release closure.

use std::cell::{Cell, RefCell};

use crate::engine::{body, get_attribute, remove_attribute, set_attribute, style_to_string};
use crate::types::Cleanup;

/// Marker attribute on the body while any lock is held.
pub const SCROLL_LOCK_ATTRIBUTE: &str = "data-scroll-locked";

/// Counters for lock traffic since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollLockStats {
    pub acquired: usize,
    pub released: usize,
}

thread_local! {
    static LOCK_COUNT: Cell<usize> = const { Cell::new(0) };
    // Outer None: nothing saved. Inner None: body had no style.
    static SAVED_STYLE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
    static STATS: Cell<ScrollLockStats> = const {
        Cell::new(ScrollLockStats { acquired: 0, released: 0 })
    };
}

fn locked_style(original: Option<&str>) -> String {
    let lock = style_to_string(&[("overflow", "hidden")]);
    match original.map(str::trim).filter(|s| !s.is_empty()) {
        Some(original) => format!("{original} {lock}"),
        None => lock,
    }
}

/// Acquire the scroll lock. Returns the release closure.
pub fn acquire_scroll_lock() -> Cleanup {
    let count = LOCK_COUNT.with(|count| {
        let next = count.get() + 1;
        count.set(next);
        next
    });
    STATS.with(|stats| {
        let mut current = stats.get();
        current.acquired += 1;
        stats.set(current);
    });

    let root = body();
    if count == 1 {
        let original = get_attribute(root, "style");
        set_attribute(root, "style", &locked_style(original.as_deref()));
        SAVED_STYLE.with(|saved| *saved.borrow_mut() = Some(original));
        tracing::debug!("body scroll locked");
    }
    set_attribute(root, SCROLL_LOCK_ATTRIBUTE, &count.to_string());

    Box::new(release_one)
}

fn release_one() {
    let count = LOCK_COUNT.with(|count| {
        let next = count.get().saturating_sub(1);
        count.set(next);
        next
    });
    STATS.with(|stats| {
        let mut current = stats.get();
        current.released += 1;
        stats.set(current);
    });

    let root = body();
    if count > 0 {
        set_attribute(root, SCROLL_LOCK_ATTRIBUTE, &count.to_string());
        return;
    }

    remove_attribute(root, SCROLL_LOCK_ATTRIBUTE);
    match SAVED_STYLE.with(|saved| saved.borrow_mut().take()) {
        Some(Some(original)) => set_attribute(root, "style", &original),
        Some(None) => remove_attribute(root, "style"),
        None => {}
    }
    tracing::debug!("body scroll unlocked");
}

/// Number of outstanding holders.
pub fn scroll_lock_count() -> usize {
    LOCK_COUNT.with(Cell::get)
}

pub fn is_scroll_locked() -> bool {
    scroll_lock_count() > 0
}

pub fn scroll_lock_stats() -> ScrollLockStats {
    STATS.with(Cell::get)
}

/// Reset scroll lock state (for testing)
pub fn reset_scroll_state() {
    LOCK_COUNT.with(|count| count.set(0));
    SAVED_STYLE.with(|saved| *saved.borrow_mut() = None);
    STATS.with(|stats| stats.set(ScrollLockStats::default()));
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reset_document;

    fn setup() {
        reset_document();
        reset_scroll_state();
    }

    #[test]
    fn test_lock_and_restore() {
        setup();
        set_attribute(body(), "style", "color: red;");

        let release = acquire_scroll_lock();
        assert!(is_scroll_locked());
        assert_eq!(
            get_attribute(body(), "style").as_deref(),
            Some("color: red; overflow: hidden;")
        );

        release();
        assert!(!is_scroll_locked());
        assert_eq!(get_attribute(body(), "style").as_deref(), Some("color: red;"));
        assert_eq!(get_attribute(body(), SCROLL_LOCK_ATTRIBUTE), None);
    }

    #[test]
    fn test_nested_holders() {
        setup();
        let first = acquire_scroll_lock();
        let second = acquire_scroll_lock();
        assert_eq!(scroll_lock_count(), 2);

        first();
        assert!(is_scroll_locked());
        assert_eq!(get_attribute(body(), "style").as_deref(), Some("overflow: hidden;"));

        second();
        assert_eq!(get_attribute(body(), "style"), None);
    }

    #[test]
    fn test_stats_count_each_holder_once() {
        setup();
        let first = acquire_scroll_lock();
        let second = acquire_scroll_lock();
        second();
        first();

        let third = acquire_scroll_lock();
        third();

        assert_eq!(
            scroll_lock_stats(),
            ScrollLockStats { acquired: 3, released: 3 }
        );
        assert_eq!(scroll_lock_count(), 0);
    }
}
