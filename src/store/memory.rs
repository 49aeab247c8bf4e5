//! In-memory waiting-record store.
//!
//! Suitable for single-process syncs and tests; records do not survive the
//! process.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;

use super::{UnresolvedStore, WaitingRecord};

/// Waiting-record store backed by a process-local map.
#[derive(Debug, Default)]
pub struct MemoryUnresolvedStore {
    records: RwLock<HashMap<String, WaitingRecord>>,
}

impl MemoryUnresolvedStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnresolvedStore for MemoryUnresolvedStore {
    async fn save(&self, record: &WaitingRecord) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.insert(record.draft_key().to_string(), record.clone());
        Ok(())
    }

    async fn fetch(&self, draft_keys: &BTreeSet<String>) -> Result<Vec<WaitingRecord>, StoreError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(draft_keys
            .iter()
            .filter_map(|key| records.get(key).cloned())
            .collect())
    }

    async fn fetch_all(&self) -> Result<Vec<WaitingRecord>, StoreError> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(records.values().cloned().collect())
    }

    async fn delete(&self, draft_key: &str) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        records.remove(draft_key);
        Ok(())
    }
}
