//! Typed operations over the record store.
//!
//! Each method maps to exactly one locked load/modify/save cycle, so a
//! method either fully applies its change or leaves the file as it was.

mod posts;
mod revocation;
mod users;

use std::sync::Arc;

use serde::Deserialize;

use crate::store::RecordStore;

pub use posts::PostQuery;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct Repository {
    store: Arc<RecordStore>,
}

impl Repository {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Bcrypt cost used by tests; the minimum the crate accepts.
    pub const TEST_COST: u32 = 4;

    pub async fn repository() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::initialize(dir.path().join("database.json"))
            .await
            .unwrap();
        (dir, Repository::new(Arc::new(store)))
    }

    pub fn hash(password: &str) -> String {
        bcrypt::hash(password, TEST_COST).unwrap()
    }
}
