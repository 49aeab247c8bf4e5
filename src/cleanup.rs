//! Cleanup of stale waiting records.
//!
//! Deferred drafts whose dependencies never appear would otherwise
//! accumulate in the store forever. This pass deletes records older than a
//! caller-supplied number of days; per-record failures are counted, never
//! raised.

use chrono::{Duration, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::UnresolvedStore;

/// Counters for one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CleanupStatistics {
    /// Number of stale records deleted.
    pub deleted: u64,
    /// Number of records whose deletion failed.
    pub failed: u64,
}

/// Deletes every waiting record older than `older_than_days` days.
///
/// # Errors
///
/// Returns an error only if listing the store fails; individual delete
/// failures are tallied in the returned statistics.
pub async fn cleanup_stale<S: UnresolvedStore>(
    store: &S,
    older_than_days: i64,
) -> Result<CleanupStatistics, StoreError> {
    let cutoff = Utc::now() - Duration::days(older_than_days);

    let stale_keys: Vec<String> = store
        .fetch_all()
        .await?
        .into_iter()
        .filter(|record| record.created_at < cutoff)
        .map(|record| record.draft_key().to_string())
        .collect();

    debug!("Deleting {} stale waiting records", stale_keys.len());

    let deletions = join_all(stale_keys.iter().map(|key| store.delete(key))).await;

    let mut statistics = CleanupStatistics::default();
    for (key, outcome) in stale_keys.iter().zip(deletions) {
        match outcome {
            Ok(()) => statistics.deleted += 1,
            Err(error) => {
                warn!("Failed to delete stale waiting record '{key}': {error}");
                statistics.failed += 1;
            }
        }
    }

    Ok(statistics)
}
