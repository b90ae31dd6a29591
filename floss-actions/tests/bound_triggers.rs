//! Tests for BoundAction triggers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use floss_actions::testing::{Answer, MemoryStore, TestHarness};
use floss_actions::{
    Action, ActionBody, ActionMeta, AlertButton, BoundAction, SourceHint, SwipeEdge, TriggerRole,
};

#[derive(Clone, ActionMeta)]
#[action(undo = "Add to Shopping List")]
struct AddToShoppingList {
    store: Arc<MemoryStore>,
    code: &'static str,
    listed: Arc<AtomicBool>,
}

impl Action for AddToShoppingList {
    type Output = ();

    fn can_perform(&self) -> bool {
        !self.listed.load(Ordering::SeqCst)
    }

    fn into_body(self) -> ActionBody<()> {
        ActionBody::sync(move |_| {
            self.store.write(format!("list:{}", self.code));
            self.listed.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[derive(Clone, ActionMeta)]
#[action(destructive(title = "Delete Thread", message = "Are you sure?", confirm = "Delete"))]
struct DeleteThread {
    store: Arc<MemoryStore>,
    code: &'static str,
}

impl Action for DeleteThread {
    type Output = ();

    fn into_body(self) -> ActionBody<()> {
        ActionBody::sync(move |_| {
            self.store.remove(self.code);
            Ok(())
        })
    }
}

fn add(harness: &TestHarness) -> AddToShoppingList {
    AddToShoppingList {
        store: harness.store.clone(),
        code: "DMC 310",
        listed: Arc::new(AtomicBool::new(false)),
    }
}

#[test]
fn test_menu_entry_performs_action() {
    let harness = TestHarness::new(Answer::Confirm);
    let bound = BoundAction::new(&harness.runner, add(&harness), "Add to List");

    let entry = bound.menu_entry().with_shortcut('a');
    assert_eq!(entry.title(), "Add to List");
    assert_eq!(entry.role(), TriggerRole::Normal);
    assert_eq!(entry.shortcut(), Some('a'));
    assert!(entry.is_enabled());

    assert!(entry.activate(None));
    assert!(harness.store.contains("list:DMC 310"));
    assert_eq!(harness.store.commit_count(), 1);
    assert_eq!(harness.undo.names(), vec!["Add to Shopping List"]);
}

#[test]
fn test_enabled_state_is_sampled_at_construction() {
    let harness = TestHarness::new(Answer::Confirm);
    let bound = BoundAction::new(&harness.runner, add(&harness), "Add to List");

    let stale = bound.menu_entry();
    bound.perform(None);
    assert_eq!(harness.store.commit_count(), 1);

    // Built before the state changed: still enabled, the runner drops it.
    assert!(stale.is_enabled());
    assert!(stale.activate(None));
    assert_eq!(harness.store.commit_count(), 1);

    // Rebuilt: disabled, activation ignored.
    let fresh = bound.menu_entry();
    assert!(!fresh.is_enabled());
    assert!(!fresh.activate(None));
}

#[test]
fn test_destructive_triggers() {
    let harness = TestHarness::new(Answer::Decline);
    harness.store.write("DMC 310");
    let action = DeleteThread {
        store: harness.store.clone(),
        code: "DMC 310",
    };
    let bound = BoundAction::new(&harness.runner, action, "Delete");

    assert!(bound.is_destructive());
    assert_eq!(bound.role(), TriggerRole::Destructive);

    let swipe = bound.swipe_action();
    assert_eq!(swipe.edge(), SwipeEdge::Trailing);
    assert_eq!(swipe.role(), TriggerRole::Destructive);

    swipe.activate(Some(SourceHint::named("thread-row:0")));
    assert_eq!(harness.presenter.confirmations().len(), 1);
    assert!(harness.store.contains("DMC 310"));

    harness.presenter.set_answer(Answer::Confirm);
    bound.alert_button().activate(None);
    assert!(!harness.store.contains("DMC 310"));
}

#[test]
fn test_destructive_override() {
    let harness = TestHarness::new(Answer::Confirm);
    let bound = BoundAction::new(&harness.runner, add(&harness), "Add").destructive(true);

    assert_eq!(bound.alert_button().role(), TriggerRole::Destructive);
    assert_eq!(bound.swipe_action().edge(), SwipeEdge::Trailing);
    assert_eq!(bound.action().code, "DMC 310");
}

#[test]
fn test_cancel_button_does_nothing() {
    let button = AlertButton::cancel("Cancel");
    assert_eq!(button.role(), TriggerRole::Cancel);
    assert!(button.is_enabled());
    assert!(!button.activate(None));
}
