use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{StoreError, StoreResult};
use crate::models::{Post, UserRecord};

/// Per-entity ID counters kept in `metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Post,
    User,
}

impl Counter {
    pub fn key(self) -> &'static str {
        match self {
            Counter::Post => "nextChirpId",
            Counter::User => "nextUserId",
        }
    }
}

/// The whole database as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "chirps")]
    pub posts: BTreeMap<u64, Post>,
    pub users: BTreeMap<u64, UserRecord>,
    #[serde(rename = "revoked-tokens")]
    pub revoked_tokens: BTreeMap<String, DateTime<Utc>>,
    pub metadata: BTreeMap<String, String>,
}

impl Snapshot {
    /// Empty database with both counters starting at 1.
    pub fn new() -> Self {
        let metadata = [Counter::Post, Counter::User]
            .into_iter()
            .map(|counter| (counter.key().to_string(), "1".to_string()))
            .collect();

        Self {
            posts: BTreeMap::new(),
            users: BTreeMap::new(),
            revoked_tokens: BTreeMap::new(),
            metadata,
        }
    }

    /// Reads the next ID for `counter` without consuming it.
    pub fn peek_id(&self, counter: Counter) -> StoreResult<u64> {
        let raw = self.metadata.get(counter.key()).ok_or_else(|| {
            StoreError::CorruptState(format!("missing counter `{}`", counter.key()))
        })?;

        match raw.parse::<u64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(StoreError::CorruptState(format!(
                "counter `{}` holds `{raw}`, expected a positive integer",
                counter.key()
            ))),
        }
    }

    /// Hands out the next ID for `counter` and advances it. IDs are never
    /// reused, even after the record they named is deleted.
    pub fn allocate_id(&mut self, counter: Counter) -> StoreResult<u64> {
        let id = self.peek_id(counter)?;
        let next = id.checked_add(1).ok_or_else(|| {
            StoreError::CorruptState(format!("counter `{}` overflowed", counter.key()))
        })?;
        self.metadata
            .insert(counter.key().to_string(), next.to_string());
        Ok(id)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}
