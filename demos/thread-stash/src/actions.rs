//! Catalogue actions, one per user-visible command

use std::sync::Arc;
use std::time::Duration;

use floss_actions::prelude::*;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::catalog::{Catalog, Thread};

/// Flip a thread's in-stock flag.
#[derive(Clone, ActionMeta)]
#[action(undo)]
pub struct MarkInStock {
    pub catalog: Arc<Catalog>,
    pub id: u32,
    pub in_stock: bool,
}

impl Action for MarkInStock {
    type Output = bool;

    fn can_perform(&self) -> bool {
        self.catalog
            .thread(self.id)
            .is_some_and(|t| t.in_stock != self.in_stock)
    }

    fn into_body(self) -> ActionBody<bool> {
        ActionBody::sync(move |_store| {
            self.catalog
                .set_in_stock(self.id, self.in_stock)
                .map_err(ActionError::failed)
        })
    }
}

/// Add a skein to the shopping list after a simulated round trip.
#[derive(Clone, ActionMeta)]
#[action(undo = "Add to Shopping List")]
pub struct AddToShoppingList {
    pub catalog: Arc<Catalog>,
    pub id: u32,
    pub delay: Duration,
}

impl Action for AddToShoppingList {
    type Output = u32;

    fn into_body(self) -> ActionBody<u32> {
        ActionBody::asynchronous(move |ctx| {
            tokio::spawn(async move {
                tokio::time::sleep(self.delay).await;
                ctx.finish(
                    self.catalog
                        .add_to_shopping(self.id)
                        .map_err(ActionError::failed),
                );
            });
        })
    }
}

/// Remove a thread from the stash, after confirmation.
#[derive(Clone, ActionMeta)]
#[action(
    undo,
    destructive(
        title = "Delete Thread",
        message = "This removes the thread and its shopping list line.",
        confirm = "Delete"
    )
)]
pub struct DeleteThread {
    pub catalog: Arc<Catalog>,
    pub id: u32,
}

impl Action for DeleteThread {
    type Output = Thread;

    fn can_perform(&self) -> bool {
        self.catalog.thread(self.id).is_some()
    }

    fn into_body(self) -> ActionBody<Thread> {
        ActionBody::sync(move |_store| self.catalog.delete(self.id).map_err(ActionError::failed))
    }
}

/// Show a thread's details in a sheet.
#[derive(Clone, ActionMeta)]
#[action(no_commit)]
pub struct ShowDetails {
    pub catalog: Arc<Catalog>,
    pub id: u32,
}

impl Action for ShowDetails {
    type Output = ();

    fn into_body(self) -> ActionBody<()> {
        ActionBody::asynchronous(move |ctx| match self.catalog.thread(self.id) {
            Some(thread) => {
                let lines = vec![
                    format!("Brand:    {}", thread.brand),
                    format!("Code:     {}", thread.code),
                    format!("Name:     {}", thread.name),
                    format!("In stock: {}", if thread.in_stock { "yes" } else { "no" }),
                    format!("To buy:   {}", self.catalog.shopping_quantity(thread.id)),
                ];
                ctx.present(Surface::new(thread.label(), lines));
                ctx.complete(());
            }
            None => ctx.fail(ActionError::msg("That thread is no longer in the stash")),
        })
    }
}

/// Serialize the stash on a worker and deliver the summary as one value.
#[derive(Clone, ActionMeta)]
#[action(no_commit)]
pub struct ExportStash {
    pub catalog: Arc<Catalog>,
}

impl Action for ExportStash {
    type Output = String;

    fn into_body(self) -> ActionBody<String> {
        ActionBody::reactive(move |_store| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::task::spawn_blocking(move || {
                let result = self
                    .catalog
                    .export_json()
                    .map(|json| {
                        format!(
                            "{} threads, {} bytes of JSON",
                            self.catalog.threads().len(),
                            json.len()
                        )
                    })
                    .map_err(ActionError::failed);
                if tx.send(result).is_err() {
                    tracing::debug!("export subscription closed, dropping summary");
                }
            });
            UnboundedReceiverStream::new(rx)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floss_actions::testing::{Answer, TestHarness};
    use floss_actions::{
        advance_time, assert_outcome, assert_pending, pause_time, resume_time, Outcome,
    };

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::sample())
    }

    #[test]
    fn test_mark_in_stock_labels_undo() {
        let harness = TestHarness::new(Answer::Confirm);
        let catalog = catalog();

        let probe = harness.perform(MarkInStock {
            catalog: catalog.clone(),
            id: 3,
            in_stock: true,
        });

        assert_outcome!(probe, Ok(true));
        assert!(catalog.thread(3).is_some_and(|t| t.in_stock));
        assert_eq!(harness.undo.names(), vec!["Mark In Stock"]);
    }

    #[test]
    fn test_mark_in_stock_skipped_when_unchanged() {
        let harness = TestHarness::new(Answer::Confirm);
        let probe = harness.perform(MarkInStock {
            catalog: catalog(),
            id: 1,
            in_stock: true,
        });

        assert!(probe.is_pending());
        assert_eq!(harness.middleware.outcomes_for("MarkInStock"), vec![Outcome::Skipped]);
    }

    #[test]
    fn test_delete_declined_keeps_thread() {
        let harness = TestHarness::new(Answer::Decline);
        let catalog = catalog();

        let probe = harness.perform(DeleteThread {
            catalog: catalog.clone(),
            id: 2,
        });

        assert_outcome!(probe, Err(ActionError::Canceled));
        assert!(catalog.thread(2).is_some());
        assert!(harness.presenter.errors().is_empty());
    }

    #[test]
    fn test_delete_confirmed() {
        let harness = TestHarness::new(Answer::Confirm);
        let catalog = catalog();

        let probe = harness.perform(DeleteThread {
            catalog: catalog.clone(),
            id: 2,
        });

        assert_outcome!(probe, Ok(thread) if thread.code == "321");
        assert!(catalog.thread(2).is_none());
        assert_eq!(harness.presenter.confirmations()[0].title(), "Delete Thread");
        assert_eq!(harness.store.commit_count(), 1);
    }

    #[test]
    fn test_show_details_presents_sheet() {
        let harness = TestHarness::new(Answer::Confirm);
        let probe = harness.perform(ShowDetails {
            catalog: catalog(),
            id: 4,
        });

        assert_outcome!(probe, Ok(()));
        assert_eq!(harness.presenter.surfaces(), vec!["DMC 726 Light Topaz"]);
        assert_eq!(harness.store.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_add_to_shopping_list_completes_later() {
        pause_time();
        let mut harness = TestHarness::new(Answer::Confirm);
        let catalog = catalog();

        let completion = harness.perform(AddToShoppingList {
            catalog: catalog.clone(),
            id: 5,
            delay: Duration::from_millis(300),
        });
        assert_pending!(completion);

        advance_time(Duration::from_millis(200)).await;
        harness.drain();
        assert_pending!(completion);
        assert_eq!(catalog.shopping_quantity(5), 0);

        advance_time(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;
        harness.drain();

        assert_outcome!(completion, Ok(1));
        assert_eq!(catalog.shopping_quantity(5), 1);
        assert_eq!(harness.undo.names(), vec!["Add to Shopping List"]);
        resume_time();
    }

    #[tokio::test]
    async fn test_export_delivers_one_value() {
        let mut harness = TestHarness::new(Answer::Confirm);
        let completion = harness.perform(ExportStash { catalog: catalog() });

        for _ in 0..50 {
            if !completion.is_pending() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            harness.drain();
        }

        assert_outcome!(completion, Ok(summary) if summary.starts_with("8 threads"));
        assert_eq!(harness.store.commit_count(), 0);
    }
}
