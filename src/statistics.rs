//! Sync statistics tracking.
//!
//! Per-draft completion callbacks run concurrently within one batch, so the
//! counters are accumulated through a thread-safe tracker and reported as an
//! owned snapshot when the sync call settles.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of the counters for one sync call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatistics {
    /// Number of drafts taken through the pipeline, including rejected and
    /// deferred ones. A deferred draft counts again when reconciliation
    /// replays it.
    pub processed: u64,
    /// Number of resources created on the remote service.
    pub created: u64,
    /// Number of resources updated on the remote service.
    pub updated: u64,
    /// Number of drafts that terminally failed.
    pub failed: u64,
    /// Missing dependency key → keys of the drafts waiting on it.
    pub unresolved: BTreeMap<String, BTreeSet<String>>,
}

impl SyncStatistics {
    /// Number of drafts still waiting on a missing dependency.
    #[must_use]
    pub fn pending(&self) -> usize {
        let mut drafts = BTreeSet::new();
        for dependents in self.unresolved.values() {
            drafts.extend(dependents.iter().cloned());
        }
        drafts.len()
    }
}

impl std::fmt::Display for SyncStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Summary: {} drafts were processed in total ({} created, {} updated, \
             {} failed to sync and {} drafts with missing references were not synced).",
            self.processed,
            self.created,
            self.updated,
            self.failed,
            self.pending()
        )
    }
}

/// Thread-safe accumulator backing one sync call.
#[derive(Debug, Default)]
pub struct StatisticsTracker {
    processed: AtomicU64,
    created: AtomicU64,
    updated: AtomicU64,
    failed: AtomicU64,
    unresolved: RwLock<BTreeMap<String, BTreeSet<String>>>,
}

impl StatisticsTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the processed counter by `count`.
    pub fn increment_processed(&self, count: u64) {
        self.processed.fetch_add(count, Ordering::Relaxed);
    }

    /// Increments the created counter by one.
    pub fn increment_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the updated counter by one.
    pub fn increment_updated(&self) {
        self.updated.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the failed counter by `count`.
    pub fn increment_failed(&self, count: u64) {
        self.failed.fetch_add(count, Ordering::Relaxed);
    }

    /// Records that `draft_key` is waiting on `missing_key`.
    ///
    /// # Panics
    ///
    /// Panics if the map lock was poisoned by a panicking writer.
    pub fn add_missing_dependency(&self, missing_key: &str, draft_key: &str) {
        let mut unresolved = self
            .unresolved
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unresolved
            .entry(missing_key.to_string())
            .or_default()
            .insert(draft_key.to_string());
    }

    /// Removes `missing_key` from the waiting map, returning the keys of the
    /// drafts that were waiting on it.
    pub fn remove_missing_dependency(&self, missing_key: &str) -> BTreeSet<String> {
        let mut unresolved = self
            .unresolved
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unresolved.remove(missing_key).unwrap_or_default()
    }

    /// Removes one waiting draft entry, used when the draft terminally
    /// failed or finally synced.
    pub fn remove_waiting_draft(&self, draft_key: &str) {
        let mut unresolved = self
            .unresolved
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        unresolved.retain(|_, dependents| {
            dependents.remove(draft_key);
            !dependents.is_empty()
        });
    }

    /// Produces an owned snapshot of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> SyncStatistics {
        let unresolved = self
            .unresolved
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        SyncStatistics {
            processed: self.processed.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let tracker = StatisticsTracker::new();
        tracker.increment_processed(3);
        tracker.increment_created();
        tracker.increment_updated();
        tracker.increment_failed(1);

        let stats = tracker.snapshot();
        assert_eq!(stats.processed, 3);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.failed, 1);
    }

    #[test]
    fn missing_dependencies_group_dependents() {
        let tracker = StatisticsTracker::new();
        tracker.add_missing_dependency("parent", "child-a");
        tracker.add_missing_dependency("parent", "child-b");

        let stats = tracker.snapshot();
        assert_eq!(stats.pending(), 2);

        let dependents = tracker.remove_missing_dependency("parent");
        assert_eq!(dependents.len(), 2);
        assert_eq!(tracker.snapshot().pending(), 0);
    }

    #[test]
    fn removing_a_waiting_draft_drops_empty_groups() {
        let tracker = StatisticsTracker::new();
        tracker.add_missing_dependency("parent", "child");
        tracker.remove_waiting_draft("child");

        assert!(tracker.snapshot().unresolved.is_empty());
    }
}
