//! JSON-file waiting-record store.
//!
//! Persists one JSON file per deferred draft under a container directory
//! scoped to the resource type, so records survive across sync invocations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::StoreError;
use crate::model::ResourceType;

use super::{UnresolvedStore, WaitingRecord};

/// Waiting-record store backed by JSON files on the local filesystem.
#[derive(Debug)]
pub struct FileUnresolvedStore {
    container_dir: PathBuf,
}

impl FileUnresolvedStore {
    /// Creates a store rooted at `base_dir`, using the resource type's
    /// container name as the subdirectory.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, resource_type: ResourceType) -> Self {
        Self {
            container_dir: base_dir.into().join(resource_type.container_name()),
        }
    }

    fn record_path(&self, draft_key: &str) -> PathBuf {
        // Draft keys may carry path-hostile characters.
        let sanitized: String = draft_key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.container_dir.join(format!("{sanitized}.json"))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        if !self.container_dir.exists() {
            debug!(
                "Creating waiting-record container: {}",
                self.container_dir.display()
            );
            fs::create_dir_all(&self.container_dir)
                .await
                .map_err(|e| StoreError::io(format!("Failed to create container directory: {e}")))?;
        }
        Ok(())
    }

    async fn read_record(path: &Path) -> Result<WaitingRecord, StoreError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::io(format!("Failed to read waiting record: {e}")))?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::corrupted(format!("Failed to parse waiting record: {e}")))
    }
}

#[async_trait]
impl UnresolvedStore for FileUnresolvedStore {
    async fn save(&self, record: &WaitingRecord) -> Result<(), StoreError> {
        self.ensure_dir().await?;

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::io(format!("Failed to serialize waiting record: {e}")))?;

        let path = self.record_path(record.draft_key());
        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| StoreError::io(format!("Failed to create waiting record file: {e}")))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| StoreError::io(format!("Failed to write waiting record: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| StoreError::io(format!("Failed to sync waiting record: {e}")))?;

        Ok(())
    }

    async fn fetch(&self, draft_keys: &BTreeSet<String>) -> Result<Vec<WaitingRecord>, StoreError> {
        let mut records = Vec::new();
        for key in draft_keys {
            let path = self.record_path(key);
            if path.exists() {
                records.push(Self::read_record(&path).await?);
            }
        }
        Ok(records)
    }

    async fn fetch_all(&self) -> Result<Vec<WaitingRecord>, StoreError> {
        if !self.container_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.container_dir)
            .await
            .map_err(|e| StoreError::io(format!("Failed to list container directory: {e}")))?;

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(format!("Failed to list container directory: {e}")))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                records.push(Self::read_record(&path).await?);
            }
        }
        Ok(records)
    }

    async fn delete(&self, draft_key: &str) -> Result<(), StoreError> {
        let path = self.record_path(draft_key);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| StoreError::io(format!("Failed to delete waiting record: {e}")))?;
        }
        Ok(())
    }
}
