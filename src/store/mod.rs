//! Persistent storage of drafts waiting on unresolved references.
//!
//! A draft whose dependencies are not resolvable yet is parked here as a
//! [`WaitingRecord`], keyed by its draft key and scoped to a container per
//! resource type. Records outlive a single batch and, through the
//! file-backed store, a single sync call.

mod file;
mod memory;

pub use file::FileUnresolvedStore;
pub use memory::MemoryUnresolvedStore;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::Draft;

/// A deferred draft together with the dependency keys it is waiting on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingRecord {
    /// The full deferred draft, replayed once its dependencies exist.
    pub draft: Draft,
    /// Dependency keys not yet resolvable.
    pub missing: BTreeSet<String>,
    /// When the record was first created, used by the stale-record cleanup.
    pub created_at: DateTime<Utc>,
}

impl WaitingRecord {
    /// Creates a record timestamped now.
    #[must_use]
    pub fn new(draft: Draft, missing: BTreeSet<String>) -> Self {
        Self {
            draft,
            missing,
            created_at: Utc::now(),
        }
    }

    /// The key of the deferred draft; records are stored under it.
    #[must_use]
    pub fn draft_key(&self) -> &str {
        &self.draft.key
    }
}

/// Store for waiting records.
///
/// `save` is last-write-wins per draft key: re-saving a record replaces the
/// previous one, which is how a shrinking missing-dependency set is
/// persisted across batches.
#[async_trait]
pub trait UnresolvedStore: Send + Sync {
    /// Saves or replaces the record stored under its draft key.
    async fn save(&self, record: &WaitingRecord) -> Result<(), StoreError>;

    /// Fetches the records stored under the given draft keys. Unknown keys
    /// are silently absent from the result.
    async fn fetch(&self, draft_keys: &BTreeSet<String>) -> Result<Vec<WaitingRecord>, StoreError>;

    /// Fetches every stored record.
    async fn fetch_all(&self) -> Result<Vec<WaitingRecord>, StoreError>;

    /// Deletes the record stored under a draft key, if any.
    async fn delete(&self, draft_key: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl UnresolvedStore for Box<dyn UnresolvedStore> {
    async fn save(&self, record: &WaitingRecord) -> Result<(), StoreError> {
        (**self).save(record).await
    }

    async fn fetch(&self, draft_keys: &BTreeSet<String>) -> Result<Vec<WaitingRecord>, StoreError> {
        (**self).fetch(draft_keys).await
    }

    async fn fetch_all(&self) -> Result<Vec<WaitingRecord>, StoreError> {
        (**self).fetch_all().await
    }

    async fn delete(&self, draft_key: &str) -> Result<(), StoreError> {
        (**self).delete(draft_key).await
    }
}
