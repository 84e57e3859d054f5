// Property tests: dialog invariants under arbitrary operation sequences.
//
// Set PROPTEST_CASES to raise the case count locally.

use proptest::prelude::*;

use spark_dialog::state::scroll::{scroll_lock_count, scroll_lock_stats};
use spark_dialog::*;

fn config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(128);
    ProptestConfig {
        cases,
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    SetOpen(bool),
    ForceVisible(bool),
    PreventScroll(bool),
    Escape,
    ClickOutside,
    ClickTrigger(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::SetOpen),
        any::<bool>().prop_map(Op::ForceVisible),
        any::<bool>().prop_map(Op::PreventScroll),
        Just(Op::Escape),
        Just(Op::ClickOutside),
        (0..3usize).prop_map(Op::ClickTrigger),
    ]
}

struct Harness {
    dialog: Dialog,
    triggers: Vec<NodeId>,
    outside: NodeId,
    cleanups: Vec<Cleanup>,
}

fn attach(tag: &str, parent: NodeId) -> NodeId {
    let node = create_element(tag);
    append_child(parent, node).unwrap();
    node
}

fn harness() -> Harness {
    reset_all();

    let triggers: Vec<NodeId> = (0..3).map(|_| attach("button", body())).collect();
    let outside = attach("button", body());
    let wrapper = attach("div", body());
    let content = attach("div", wrapper);
    attach("button", content);

    let dialog = create_dialog(DialogProps::default());
    let mut cleanups: Vec<Cleanup> = triggers
        .iter()
        .map(|&trigger| dialog.elements.trigger.mount(trigger))
        .collect();
    cleanups.push(dialog.elements.portalled.mount(wrapper));
    cleanups.push(dialog.elements.content.mount(content));

    Harness {
        dialog,
        triggers,
        outside,
        cleanups,
    }
}

impl Harness {
    fn apply(&self, op: Op) {
        match op {
            Op::SetOpen(open) => self.dialog.set_open(open),
            Op::ForceVisible(force) => {
                self.dialog.options.force_visible.set(force);
            }
            Op::PreventScroll(prevent) => {
                self.dialog.options.prevent_scroll.set(prevent);
            }
            Op::Escape => {
                dispatch_keydown(&KeyboardEvent::new(kbd::ESCAPE));
            }
            Op::ClickOutside => click(self.outside),
            Op::ClickTrigger(index) => click(self.triggers[index]),
        }
        flush_microtasks();
    }

    fn unmount(&mut self) {
        for cleanup in self.cleanups.drain(..).rev() {
            cleanup();
        }
    }
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn visibility_and_engagements_follow_state(ops in prop::collection::vec(op(), 1..40)) {
        let mut h = harness();

        for op in ops {
            h.apply(op);

            let open = h.dialog.is_open();
            let force = h.dialog.options.force_visible.get();
            prop_assert_eq!(h.dialog.is_visible(), open || force);

            let expected = usize::from(open || force);
            prop_assert_eq!(live_engagements(CapabilityKind::FocusTrap), expected);
            prop_assert_eq!(live_engagements(CapabilityKind::Modal), expected);
            prop_assert_eq!(live_engagements(CapabilityKind::EscapeKeydown), expected);

            prop_assert!(scroll_lock_count() <= 1);
            if open && h.dialog.options.prevent_scroll.get() {
                prop_assert_eq!(scroll_lock_count(), 1);
            }
        }

        h.unmount();
        drop(h);
        prop_assert_eq!(total_live_engagements(), 0);
        prop_assert_eq!(scroll_lock_count(), 0);
        let stats = scroll_lock_stats();
        prop_assert_eq!(stats.acquired, stats.released);
    }

    #[test]
    fn open_close_cycles_balance_scroll_lock(cycles in 1..12usize) {
        let h = harness();

        for _ in 0..cycles {
            h.apply(Op::SetOpen(true));
            h.apply(Op::SetOpen(false));
            prop_assert_eq!(total_live_engagements(), 1);
        }

        let stats = scroll_lock_stats();
        prop_assert_eq!(stats.acquired, cycles);
        prop_assert_eq!(stats.released, cycles);
    }

    #[test]
    fn active_trigger_is_last_opener(indices in prop::collection::vec(0..3usize, 1..10)) {
        let h = harness();

        for index in indices {
            h.apply(Op::SetOpen(false));
            h.apply(Op::ClickTrigger(index));
            prop_assert!(h.dialog.is_open());
            prop_assert_eq!(h.dialog.active_trigger(), Some(h.triggers[index]));
        }
    }
}
