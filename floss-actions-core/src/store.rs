//! Persistence and undo-history boundaries
//!
//! The runner never owns data. It is handed a [`PersistentStore`] that action
//! bodies mutate in memory, and commits it once after a successful,
//! commit-eligible action. The store is expected to serialize its own writes.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::StoreError;

/// A persistence store that batches in-memory changes until committed.
///
/// # Example
///
/// ```ignore
/// struct Catalog {
///     threads: Mutex<Vec<Thread>>,
///     dirty: AtomicBool,
/// }
///
/// impl PersistentStore for Catalog {
///     fn commit(&self) -> Result<(), StoreError> {
///         write_to_disk(&self.threads.lock().unwrap())?;
///         self.dirty.store(false, Ordering::SeqCst);
///         Ok(())
///     }
///
///     fn has_changes(&self) -> bool {
///         self.dirty.load(Ordering::SeqCst)
///     }
/// }
/// ```
pub trait PersistentStore: Send + Sync + 'static {
    /// Persist all pending in-memory changes.
    ///
    /// Must be safe to call after any number of mutations, including none.
    fn commit(&self) -> Result<(), StoreError>;

    /// Whether there are uncommitted changes.
    fn has_changes(&self) -> bool;
}

/// Shared handle to the runner's store, handed to action bodies.
#[derive(Clone)]
pub struct StoreHandle(Arc<dyn PersistentStore>);

impl StoreHandle {
    /// Wrap a store.
    pub fn new(store: impl PersistentStore) -> Self {
        Self(Arc::new(store))
    }

    /// Wrap an already shared store.
    pub fn from_arc(store: Arc<dyn PersistentStore>) -> Self {
        Self(store)
    }

    /// Access the underlying store.
    pub fn inner(&self) -> &Arc<dyn PersistentStore> {
        &self.0
    }
}

impl Deref for StoreHandle {
    type Target = dyn PersistentStore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl<S: PersistentStore> From<Arc<S>> for StoreHandle {
    fn from(store: Arc<S>) -> Self {
        Self(store)
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("has_changes", &self.0.has_changes())
            .finish()
    }
}

/// Undo stack labeling.
///
/// The runner names the pending undo group before an action body runs, so
/// that "Undo Mark In Stock" matches what the user did.
pub trait UndoHistory: Send + Sync + 'static {
    /// Label the undo group the next mutations will belong to.
    fn set_action_name(&self, name: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct Skeins {
        dirty: AtomicBool,
        commits: AtomicUsize,
    }

    impl PersistentStore for Skeins {
        fn commit(&self) -> Result<(), StoreError> {
            self.dirty.store(false, Ordering::SeqCst);
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn has_changes(&self) -> bool {
            self.dirty.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_handle_derefs_to_store() {
        let skeins = Arc::new(Skeins::default());
        let handle = StoreHandle::from(skeins.clone());

        skeins.dirty.store(true, Ordering::SeqCst);
        assert!(handle.has_changes());

        handle.commit().unwrap();
        assert!(!handle.has_changes());
        assert_eq!(skeins.commits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_clone_shares_store() {
        let handle = StoreHandle::new(Skeins::default());
        let other = handle.clone();
        assert!(Arc::ptr_eq(handle.inner(), other.inner()));
    }
}
