//! Tests for #[derive(ActionMeta)] macro

use std::borrow::Cow;

use floss_actions::ActionMeta as ActionMetaMacro;
use floss_actions::{ActionMeta, Capabilities};

#[test]
fn test_basic_struct_derive() {
    #[derive(ActionMetaMacro)]
    struct MarkInStock {
        _thread: u32,
    }

    let action = MarkInStock { _thread: 310 };
    assert_eq!(action.name(), "MarkInStock");
    assert_eq!(action.undo_name(), None);
    assert!(action.commit_on_complete());
    assert!(action.confirmation().is_none());
}

#[test]
fn test_undo_label() {
    #[derive(ActionMetaMacro)]
    #[action(undo)]
    struct MarkInStock;

    #[derive(ActionMetaMacro)]
    #[action(undo = "Add to Shopping List")]
    struct AddToShoppingList;

    assert_eq!(MarkInStock.undo_name(), Some(Cow::Borrowed("Mark In Stock")));
    assert_eq!(
        AddToShoppingList.undo_name().as_deref(),
        Some("Add to Shopping List")
    );
}

#[test]
fn test_name_override_and_no_commit() {
    #[derive(ActionMetaMacro)]
    #[action(name = "RefreshCatalog", no_commit)]
    struct Refresh;

    assert_eq!(Refresh.name(), "RefreshCatalog");
    assert!(!Refresh.commit_on_complete());
    assert!(Capabilities::from_meta(&Refresh).is_empty());
}

#[test]
fn test_destructive() {
    #[derive(ActionMetaMacro)]
    #[action(
        undo,
        destructive(title = "Delete Thread", message = "Are you sure?", confirm = "Delete")
    )]
    struct DeleteThread {
        _id: u32,
    }

    let action = DeleteThread { _id: 3 };
    let confirmation = action.confirmation().unwrap();
    assert_eq!(confirmation.title(), "Delete Thread");
    assert_eq!(confirmation.message(), "Are you sure?");
    assert_eq!(confirmation.confirm_label(), "Delete");

    let caps = Capabilities::from_meta(&action);
    assert!(caps.contains(Capabilities::DESTRUCTIVE | Capabilities::UNDOABLE));
}

#[test]
fn test_enum_variants() {
    #[derive(ActionMetaMacro)]
    #[action(undo)]
    enum ShoppingListEdit {
        Increment(u32),
        Decrement { _thread: u32 },
        #[action(
            undo = "Clear Shopping List",
            destructive(title = "Clear List", message = "Remove every item?", confirm = "Clear")
        )]
        Clear,
        #[action(name = "SyncList", no_commit)]
        Sync,
    }

    assert_eq!(ShoppingListEdit::Increment(1).name(), "Increment");
    assert_eq!(ShoppingListEdit::Decrement { _thread: 1 }.name(), "Decrement");
    assert_eq!(ShoppingListEdit::Clear.name(), "Clear");
    assert_eq!(ShoppingListEdit::Sync.name(), "SyncList");

    assert_eq!(
        ShoppingListEdit::Increment(1).undo_name().as_deref(),
        Some("Increment")
    );
    assert_eq!(
        ShoppingListEdit::Clear.undo_name().as_deref(),
        Some("Clear Shopping List")
    );
    assert_eq!(ShoppingListEdit::Sync.undo_name().as_deref(), Some("Sync List"));

    assert!(ShoppingListEdit::Increment(1).confirmation().is_none());
    assert!(ShoppingListEdit::Clear.confirmation().is_some());

    assert!(ShoppingListEdit::Clear.commit_on_complete());
    assert!(!ShoppingListEdit::Sync.commit_on_complete());
}

#[test]
fn test_generic_struct() {
    #[derive(ActionMetaMacro)]
    #[action(undo = "Move")]
    struct MoveItem<T: Send> {
        _item: T,
    }

    let action = MoveItem { _item: "DMC 310" };
    assert_eq!(action.name(), "MoveItem");
    assert_eq!(action.undo_name().as_deref(), Some("Move"));
}
