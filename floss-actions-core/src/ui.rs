//! The designated UI thread and its job queue
//!
//! Every dispatch, confirmation and completion runs on one logical UI thread.
//! Work that finishes elsewhere (a network call in a spawned task, a background
//! fetch) is marshalled back by enqueueing a job that the UI loop drains.
//!
//! When a signal already originates on the UI thread it runs inline instead of
//! waiting for the next drain, which avoids a one-frame lag for actions that
//! resolve instantly. The check is an optimization only: the queued path
//! produces the same result, one drain later.
//!
//! # Example
//!
//! ```ignore
//! let mut ui = UiQueue::new(); // the current thread becomes the UI thread
//! let runner = ActionRunner::builder(store, ui.handle()).build();
//!
//! loop {
//!     tokio::select! {
//!         Some(raw_event) = event_rx.recv() => { /* map to triggers */ }
//!         Some(job) = ui.recv() => job.run(),
//!     }
//! }
//! ```

use std::fmt;
use std::thread::{self, ThreadId};

use tokio::sync::mpsc;

/// A unit of work scheduled onto the UI thread.
pub struct UiJob(Box<dyn FnOnce() + Send + 'static>);

impl UiJob {
    /// Wrap a closure as a job.
    pub fn new(job: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(job))
    }

    /// Execute the job. Call this on the UI thread.
    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for UiJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiJob").finish_non_exhaustive()
    }
}

/// Receiving end of the UI job queue, owned by the UI loop.
pub struct UiQueue {
    rx: mpsc::UnboundedReceiver<UiJob>,
    handle: UiHandle,
}

impl UiQueue {
    /// Create a queue whose UI thread is the calling thread.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            handle: UiHandle {
                tx,
                thread: thread::current().id(),
            },
        }
    }

    /// Get a handle for scheduling work onto this queue.
    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// Run every pending job, including jobs enqueued by the jobs themselves.
    ///
    /// Returns the number of jobs executed.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.rx.try_recv() {
            job.run();
            count += 1;
        }
        count
    }

    /// Wait for the next job. Intended for `tokio::select!` loops.
    pub async fn recv(&mut self) -> Option<UiJob> {
        self.rx.recv().await
    }

    /// Wait for the next job and run it.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job.run();
                true
            }
            None => false,
        }
    }

    /// Whether any job is waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UiQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiQueue")
            .field("thread", &self.handle.thread)
            .field("pending", &self.rx.len())
            .finish()
    }
}

/// Cloneable handle for scheduling work onto the UI thread.
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiJob>,
    thread: ThreadId,
}

impl UiHandle {
    /// Whether the calling thread is the UI thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    /// Queue a job for the next drain, regardless of the calling thread.
    pub fn enqueue(&self, job: impl FnOnce() + Send + 'static) {
        if self.tx.send(UiJob::new(job)).is_err() {
            tracing::warn!("UI queue closed, dropping job");
        }
    }

    /// Run a job now when already on the UI thread and `inline` is allowed,
    /// otherwise queue it.
    pub fn run_or_enqueue(&self, inline: bool, job: impl FnOnce() + Send + 'static) {
        if inline && self.is_current() {
            job();
        } else {
            self.enqueue(job);
        }
    }
}

impl fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiHandle")
            .field("thread", &self.thread)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_inline_on_ui_thread() {
        let mut queue = UiQueue::new();
        let handle = queue.handle();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        handle.run_or_enqueue(true, move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn test_queued_when_inline_disabled() {
        let mut queue = UiQueue::new();
        let handle = queue.handle();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        handle.run_or_enqueue(false, move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!queue.is_empty());
        assert_eq!(queue.drain(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_other_thread_is_marshalled() {
        let mut queue = UiQueue::new();
        let handle = queue.handle();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        std::thread::spawn(move || {
            assert!(!handle.is_current());
            handle.run_or_enqueue(true, move || {
                h.fetch_add(1, Ordering::SeqCst);
            });
        })
        .join()
        .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.drain(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drain_runs_nested_jobs() {
        let mut queue = UiQueue::new();
        let handle = queue.handle();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        let inner = handle.clone();
        handle.enqueue(move || {
            let h2 = h.clone();
            h.fetch_add(1, Ordering::SeqCst);
            inner.enqueue(move || {
                h2.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert_eq!(queue.drain(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_next() {
        let mut queue = UiQueue::new();
        let handle = queue.handle();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        tokio::spawn(async move {
            handle.enqueue(move || {
                h.fetch_add(1, Ordering::SeqCst);
            });
        });

        assert!(queue.run_next().await);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
