//! In-memory thread catalogue, optionally backed by a JSON file

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use floss_actions::{PersistentStore, StoreError, UndoHistory};
use serde::{Deserialize, Serialize};

/// One skein in the stash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: u32,
    pub brand: String,
    pub code: String,
    pub name: String,
    pub in_stock: bool,
}

impl Thread {
    fn new(id: u32, code: &str, name: &str, in_stock: bool) -> Self {
        Self {
            id,
            brand: "DMC".to_string(),
            code: code.to_string(),
            name: name.to_string(),
            in_stock,
        }
    }

    pub fn label(&self) -> String {
        format!("{} {} {}", self.brand, self.code, self.name)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Stash {
    threads: Vec<Thread>,
    #[serde(default)]
    shopping: BTreeMap<u32, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    UnknownThread(u32),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::UnknownThread(id) => write!(f, "Thread #{} is no longer in the stash", id),
        }
    }
}

impl std::error::Error for CatalogError {}

/// The catalogue store. Mutations mark it dirty until the next commit.
pub struct Catalog {
    stash: Mutex<Stash>,
    dirty: AtomicBool,
    path: Option<PathBuf>,
}

impl Catalog {
    /// A catalogue with a few sample threads and no backing file.
    pub fn sample() -> Self {
        Self::with_stash(sample_stash(), None)
    }

    /// Load from `path`, or start from the sample stash if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let stash = if path.exists() {
            let json = fs::read_to_string(path)
                .map_err(|e| StoreError::with_source(format!("reading {}", path.display()), e))?;
            serde_json::from_str(&json)
                .map_err(|e| StoreError::with_source(format!("parsing {}", path.display()), e))?
        } else {
            sample_stash()
        };
        Ok(Self::with_stash(stash, Some(path.to_path_buf())))
    }

    fn with_stash(stash: Stash, path: Option<PathBuf>) -> Self {
        Self {
            stash: Mutex::new(stash),
            dirty: AtomicBool::new(false),
            path,
        }
    }

    fn stash(&self) -> MutexGuard<'_, Stash> {
        self.stash.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn touch(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    pub fn threads(&self) -> Vec<Thread> {
        self.stash().threads.clone()
    }

    pub fn thread(&self, id: u32) -> Option<Thread> {
        self.stash().threads.iter().find(|t| t.id == id).cloned()
    }

    pub fn shopping_quantity(&self, id: u32) -> u32 {
        self.stash().shopping.get(&id).copied().unwrap_or(0)
    }

    /// Set the in-stock flag. Returns whether anything changed.
    pub fn set_in_stock(&self, id: u32, in_stock: bool) -> Result<bool, CatalogError> {
        let mut stash = self.stash();
        let thread = stash
            .threads
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(CatalogError::UnknownThread(id))?;
        if thread.in_stock == in_stock {
            return Ok(false);
        }
        thread.in_stock = in_stock;
        drop(stash);
        self.touch();
        Ok(true)
    }

    /// Add one skein to the shopping list, returning the new quantity.
    pub fn add_to_shopping(&self, id: u32) -> Result<u32, CatalogError> {
        let mut stash = self.stash();
        if !stash.threads.iter().any(|t| t.id == id) {
            return Err(CatalogError::UnknownThread(id));
        }
        let quantity = stash.shopping.entry(id).or_insert(0);
        *quantity += 1;
        let quantity = *quantity;
        drop(stash);
        self.touch();
        Ok(quantity)
    }

    /// Remove a thread and its shopping-list line.
    pub fn delete(&self, id: u32) -> Result<Thread, CatalogError> {
        let mut stash = self.stash();
        let index = stash
            .threads
            .iter()
            .position(|t| t.id == id)
            .ok_or(CatalogError::UnknownThread(id))?;
        let thread = stash.threads.remove(index);
        stash.shopping.remove(&id);
        drop(stash);
        self.touch();
        Ok(thread)
    }

    /// Shopping list lines as `(thread label, quantity)`.
    pub fn shopping_list(&self) -> Vec<(String, u32)> {
        let stash = self.stash();
        stash
            .shopping
            .iter()
            .filter_map(|(id, qty)| {
                stash
                    .threads
                    .iter()
                    .find(|t| t.id == *id)
                    .map(|t| (t.label(), *qty))
            })
            .collect()
    }

    /// Serialize the whole stash.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.stash())
    }
}

impl PersistentStore for Catalog {
    fn commit(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            let json = self
                .export_json()
                .map_err(|e| StoreError::with_source("serializing stash", e))?;
            fs::write(path, json)
                .map_err(|e| StoreError::with_source(format!("writing {}", path.display()), e))?;
            tracing::debug!(path = %path.display(), "stash saved");
        }
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn has_changes(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }
}

fn sample_stash() -> Stash {
    Stash {
        threads: vec![
            Thread::new(1, "310", "Black", true),
            Thread::new(2, "321", "Red", true),
            Thread::new(3, "498", "Dark Red", false),
            Thread::new(4, "726", "Light Topaz", true),
            Thread::new(5, "797", "Royal Blue", false),
            Thread::new(6, "909", "Very Dark Emerald Green", true),
            Thread::new(7, "B5200", "Snow White", true),
            Thread::new(8, "3865", "Winter White", false),
        ],
        shopping: BTreeMap::new(),
    }
}

/// Undo labels, newest last. Drives the "Undo ..." hint in the status bar.
#[derive(Debug, Default)]
pub struct UndoLabels {
    labels: Mutex<Vec<String>>,
}

impl UndoLabels {
    pub fn last(&self) -> Option<String> {
        self.labels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last()
            .cloned()
    }
}

impl UndoHistory for UndoLabels {
    fn set_action_name(&self, name: &str) {
        self.labels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutations_mark_dirty() {
        let catalog = Catalog::sample();
        assert!(!catalog.has_changes());

        assert_eq!(catalog.set_in_stock(1, true), Ok(false));
        assert!(!catalog.has_changes());

        assert_eq!(catalog.set_in_stock(3, true), Ok(true));
        assert!(catalog.has_changes());

        catalog.commit().unwrap();
        assert!(!catalog.has_changes());
    }

    #[test]
    fn test_shopping_list() {
        let catalog = Catalog::sample();
        assert_eq!(catalog.add_to_shopping(2), Ok(1));
        assert_eq!(catalog.add_to_shopping(2), Ok(2));
        assert_eq!(catalog.shopping_list(), vec![("DMC 321 Red".to_string(), 2)]);

        catalog.delete(2).unwrap();
        assert!(catalog.shopping_list().is_empty());
        assert_eq!(catalog.add_to_shopping(2), Err(CatalogError::UnknownThread(2)));
    }

    #[test]
    fn test_commit_writes_file() {
        let path = std::env::temp_dir().join(format!("thread-stash-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        let catalog = Catalog::open(&path).unwrap();
        catalog.delete(1).unwrap();
        catalog.commit().unwrap();

        let reopened = Catalog::open(&path).unwrap();
        assert!(reopened.thread(1).is_none());
        assert_eq!(reopened.threads().len(), 7);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_undo_labels() {
        let undo = UndoLabels::default();
        assert_eq!(undo.last(), None);
        undo.set_action_name("Mark In Stock");
        undo.set_action_name("Delete Thread");
        assert_eq!(undo.last().as_deref(), Some("Delete Thread"));
    }
}
