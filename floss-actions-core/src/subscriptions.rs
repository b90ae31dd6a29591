//! Live subscriptions for reactive actions
//!
//! A reactive body returns a stream. The runner spawns a task that waits for
//! the first item, completes the context with it and drops the stream, which
//! tears the subscription down. Only one value is ever consumed.
//!
//! [`Subscriptions::cancel_all`] stops every task still waiting; their
//! contexts complete as canceled.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::action::ValueStream;
use crate::context::Context;
use crate::error::ActionError;

/// Tracks reactive subscriptions by invocation id.
#[derive(Debug, Default)]
pub struct Subscriptions {
    active: Arc<Mutex<HashSet<u64>>>,
    shutdown: CancellationToken,
}

impl Subscriptions {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `stream` on `runtime`, completing `ctx` with its first item.
    pub(crate) fn subscribe<T: Send + 'static>(
        &self,
        runtime: &Handle,
        ctx: Context<T>,
        mut stream: ValueStream<T>,
    ) {
        let id = ctx.id();
        let active = self.active.clone();
        let shutdown = self.shutdown.clone();

        // Held across spawn so the task cannot deregister before it is registered.
        let mut guard = lock(&self.active);
        runtime.spawn(async move {
            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Err(ActionError::Canceled),
                item = stream.next() => item.unwrap_or(Err(ActionError::StreamEnded)),
            };
            drop(stream);
            lock(&active).remove(&id);
            ctx.finish(result);
        });
        guard.insert(id);
    }

    /// Whether the invocation still waits for a value.
    pub fn is_running(&self, id: u64) -> bool {
        lock(&self.active).contains(&id)
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        lock(&self.active).len()
    }

    /// Whether no subscription is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancel every live subscription, now and for future subscribes.
    pub fn cancel_all(&self) {
        self.shutdown.cancel();
    }

    /// Whether `cancel_all` was called.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

fn lock(active: &Mutex<HashSet<u64>>) -> MutexGuard<'_, HashSet<u64>> {
    match active.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
