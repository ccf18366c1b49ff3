//! Local persistence: a string-keyed key-value store.
//!
//! Everything the app remembers between runs lives under a handful of fixed
//! keys, each holding a JSON string:
//!
//! ```text
//! session          {"user": ..., "space": ...}
//! pet              {"name": ..., "breed": ...}
//! client_id        plain string
//! goodies_owned    [{"id": ..., "type": ...}]
//! put_on_goodies   [bool]
//! recent_spaces    [string], most recent last
//! cached_actions   ["feed", "toy", ...]
//! ```
//!
//! [`KeyValueStore`] is the seam: [`SqliteStore`] on disk, `MemoryStore`
//! in tests. [`LocalStore`] gives the keys types.

mod local;
mod sqlite;

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::HashMap;
use std::io;

pub use local::LocalStore;
pub use sqlite::SqliteStore;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, StoreError>;

/// String-keyed get/set/delete.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key. Idempotent.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-process store. Nothing survives the process.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}
