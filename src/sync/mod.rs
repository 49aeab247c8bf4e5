//! Sync engine orchestrating the reconciliation of draft batches.
//!
//! This module drives the full pipeline: batching, validation, reference
//! resolution, create-or-update dispatch with a single optimistic-concurrency
//! retry, deferral of drafts with unresolved references, and the per-batch
//! reconciliation pass that replays deferred drafts once their dependencies
//! were created.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::ReferenceCache;
use crate::client::ResourceClient;
use crate::diff::DiffEngine;
use crate::error::{ClientError, SyncError};
use crate::model::{Draft, ExistingResource, UpdateAction};
use crate::options::SyncOptions;
use crate::resolver::ReferenceResolver;
use crate::statistics::{StatisticsTracker, SyncStatistics};
use crate::store::{UnresolvedStore, WaitingRecord};
use crate::validator::BatchValidator;

/// Terminal disposition of one draft's pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DraftOutcome {
    /// The resource was created; carries the draft key so reconciliation
    /// can unblock dependents.
    Created(String),
    /// The resource was updated.
    Updated,
    /// Nothing to do, or a before-hook vetoed the remote call.
    Unchanged,
    /// The draft waits on missing dependencies.
    Deferred,
    /// The draft terminally failed.
    Failed,
}

/// Engine syncing drafts of one resource type into the remote catalog.
///
/// Batches are processed strictly sequentially; within one batch all
/// per-draft pipelines run concurrently once the bulk reference-cache
/// population has completed. `sync` never returns an error: every failure
/// is converted into a failed counter increment plus an error callback.
pub struct SyncEngine<C, S> {
    options: SyncOptions,
    client: Arc<C>,
    store: Arc<S>,
    validator: BatchValidator,
    resolver: ReferenceResolver<C>,
    diff_engine: DiffEngine,
}

impl<C, S> SyncEngine<C, S>
where
    C: ResourceClient,
    S: UnresolvedStore,
{
    /// Creates an engine over the given collaborators, with a fresh
    /// reference cache sized per the options.
    #[must_use]
    pub fn new(options: SyncOptions, client: Arc<C>, store: Arc<S>) -> Self {
        let cache = Arc::new(ReferenceCache::new(options.cache_size()));
        Self {
            validator: BatchValidator::new(options.clone()),
            resolver: ReferenceResolver::new(Arc::clone(&client), cache),
            diff_engine: DiffEngine::new(options.clone()),
            options,
            client,
            store,
        }
    }

    /// Syncs the given drafts, batch by batch, and reports the aggregated
    /// statistics. Always completes; failures surface through the error
    /// callback and the failed counter.
    pub async fn sync(&self, drafts: &[Option<Draft>]) -> SyncStatistics {
        info!(
            "Starting {} sync of {} drafts",
            self.options.resource_type,
            drafts.len()
        );

        let statistics = StatisticsTracker::new();

        for batch in drafts.chunks(self.options.batch_size()) {
            self.process_batch(batch, &statistics).await;
            statistics.increment_processed(batch.len() as u64);
        }

        let snapshot = statistics.snapshot();
        info!("{snapshot}");
        snapshot
    }

    /// Processes one batch end to end, including the reconciliation pass
    /// for drafts unblocked by this batch's creations.
    async fn process_batch(&self, batch: &[Option<Draft>], statistics: &StatisticsTracker) {
        let (valid, referenced) = self.validator.validate(batch, statistics);
        if valid.is_empty() {
            return;
        }

        if let Err(error) = self.resolver.populate_cache(&referenced).await {
            self.handle_error(statistics, &error, None, None, None, valid.len() as u64);
            return;
        }

        let keys: HashSet<String> = valid.iter().map(|draft| draft.key.clone()).collect();
        let old_by_key = match self.fetch_existing(&keys).await {
            Ok(old_by_key) => old_by_key,
            Err(error) => {
                self.handle_error(statistics, &error, None, None, None, valid.len() as u64);
                return;
            }
        };

        debug!(
            "Processing batch of {} drafts against {} existing resources",
            valid.len(),
            old_by_key.len()
        );

        let outcomes = join_all(
            valid
                .iter()
                .map(|draft| self.sync_one(draft, &old_by_key, statistics)),
        )
        .await;

        let created: BTreeSet<String> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                DraftOutcome::Created(key) => Some(key),
                _ => None,
            })
            .collect();

        self.reconcile_waiting(created, statistics).await;
    }

    /// Fetches the existing resources matching the batch's draft keys.
    async fn fetch_existing(
        &self,
        keys: &HashSet<String>,
    ) -> Result<HashMap<String, ExistingResource>, SyncError> {
        let fetched = self
            .client
            .fetch_matching(self.options.resource_type, keys)
            .await
            .map_err(|source| {
                SyncError::Client(ClientError::transport(format!(
                    "Failed to fetch existing {}s with keys: {keys:?}. Reason: {source}",
                    self.options.resource_type
                )))
            })?;

        Ok(fetched
            .into_iter()
            .map(|existing| (existing.key.clone(), existing))
            .collect())
    }

    /// Runs one draft through resolve → create-or-update.
    async fn sync_one(
        &self,
        draft: &Draft,
        old_by_key: &HashMap<String, ExistingResource>,
        statistics: &StatisticsTracker,
    ) -> DraftOutcome {
        let resolved = match self.resolver.resolve(draft) {
            Ok(resolved) => resolved,
            Err(SyncError::Resolution { missing, .. }) => {
                return self.defer_draft(draft, missing, statistics).await;
            }
            Err(error) => {
                self.handle_error(statistics, &error, None, Some(draft), None, 1);
                return DraftOutcome::Failed;
            }
        };

        match old_by_key.get(&resolved.key) {
            Some(old) => self.build_actions_and_update(old, &resolved, statistics).await,
            None => self.apply_callback_and_create(&resolved, statistics).await,
        }
    }

    /// Parks a draft whose dependencies are not resolvable yet.
    async fn defer_draft(
        &self,
        draft: &Draft,
        missing: Vec<String>,
        statistics: &StatisticsTracker,
    ) -> DraftOutcome {
        debug!(
            "Deferring draft with key '{}' on missing dependencies {missing:?}",
            draft.key
        );

        let missing: BTreeSet<String> = missing.into_iter().collect();
        let record = WaitingRecord::new(draft.clone(), missing.clone());

        if let Err(error) = self.store.save(&record).await {
            self.handle_error(
                statistics,
                &SyncError::Store(error),
                None,
                Some(draft),
                None,
                1,
            );
            return DraftOutcome::Failed;
        }

        for missing_key in &missing {
            statistics.add_missing_dependency(missing_key, &draft.key);
        }

        DraftOutcome::Deferred
    }

    /// Applies the before-create hook and issues the create call.
    async fn apply_callback_and_create(
        &self,
        draft: &Draft,
        statistics: &StatisticsTracker,
    ) -> DraftOutcome {
        let Some(draft) = self.options.apply_before_create(draft.clone()) else {
            return DraftOutcome::Unchanged;
        };

        match self.client.create(&draft).await {
            Ok(created) => {
                statistics.increment_created();
                self.resolver
                    .cache()
                    .insert(self.options.resource_type, created.key.clone(), created.id);
                DraftOutcome::Created(draft.key)
            }
            Err(source) => {
                let error = SyncError::Client(ClientError::transport(format!(
                    "Failed to create {} with key '{}'. Reason: {source}",
                    self.options.resource_type, draft.key
                )));
                self.handle_error(statistics, &error, None, Some(&draft), None, 1);
                DraftOutcome::Failed
            }
        }
    }

    /// Computes the diff and issues the update call, retrying exactly once
    /// on an optimistic-concurrency conflict.
    async fn build_actions_and_update(
        &self,
        old: &ExistingResource,
        draft: &Draft,
        statistics: &StatisticsTracker,
    ) -> DraftOutcome {
        let actions = match self.diff_engine.build_actions(old, draft) {
            Ok(actions) => actions,
            Err(build_error) => {
                let error = SyncError::BuildAction(build_error);
                self.handle_error(statistics, &error, Some(old), Some(draft), None, 1);
                return DraftOutcome::Failed;
            }
        };

        // The before-update hook only sees non-empty diffs; a converged
        // resource never reaches it.
        if actions.is_empty() {
            return DraftOutcome::Unchanged;
        }

        let actions = self.options.apply_before_update(actions, draft, old);
        if actions.is_empty() {
            return DraftOutcome::Unchanged;
        }

        match self.client.update(old, &actions).await {
            Ok(_) => {
                statistics.increment_updated();
                DraftOutcome::Updated
            }
            Err(ClientError::Conflict { .. }) => {
                self.fetch_and_retry_update(old, draft, statistics).await
            }
            Err(source) => {
                self.fail_update(old, draft, &actions, &source, statistics);
                DraftOutcome::Failed
            }
        }
    }

    /// Refetches the contested resource and reapplies the recomputed diff.
    /// A second conflict, a refetch failure, or a vanished resource are all
    /// terminal.
    async fn fetch_and_retry_update(
        &self,
        old: &ExistingResource,
        draft: &Draft,
        statistics: &StatisticsTracker,
    ) -> DraftOutcome {
        warn!(
            "Concurrent modification of {} with key '{}', refetching and retrying once",
            self.options.resource_type, old.key
        );

        let fresh = match self
            .client
            .fetch_by_key(self.options.resource_type, &old.key)
            .await
        {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                let error = SyncError::NotFoundOnRetry {
                    key: old.key.clone(),
                };
                self.handle_error(statistics, &error, Some(old), Some(draft), None, 1);
                return DraftOutcome::Failed;
            }
            Err(source) => {
                let error = SyncError::FetchOnRetry {
                    key: old.key.clone(),
                    source,
                };
                self.handle_error(statistics, &error, Some(old), Some(draft), None, 1);
                return DraftOutcome::Failed;
            }
        };

        let actions = match self.diff_engine.build_actions(&fresh, draft) {
            Ok(actions) => actions,
            Err(build_error) => {
                let error = SyncError::BuildAction(build_error);
                self.handle_error(statistics, &error, Some(&fresh), Some(draft), None, 1);
                return DraftOutcome::Failed;
            }
        };

        if actions.is_empty() {
            return DraftOutcome::Unchanged;
        }

        let actions = self.options.apply_before_update(actions, draft, &fresh);
        if actions.is_empty() {
            return DraftOutcome::Unchanged;
        }

        match self.client.update(&fresh, &actions).await {
            Ok(_) => {
                statistics.increment_updated();
                DraftOutcome::Updated
            }
            Err(source) => {
                self.fail_update(&fresh, draft, &actions, &source, statistics);
                DraftOutcome::Failed
            }
        }
    }

    fn fail_update(
        &self,
        old: &ExistingResource,
        draft: &Draft,
        actions: &[UpdateAction],
        source: &ClientError,
        statistics: &StatisticsTracker,
    ) {
        let error = SyncError::Client(ClientError::transport(format!(
            "Failed to update {} with key '{}'. Reason: {source}",
            self.options.resource_type, draft.key
        )));
        self.handle_error(statistics, &error, Some(old), Some(draft), Some(actions), 1);
    }

    /// Replays deferred drafts unblocked by the keys created in this batch,
    /// looping until a wave creates no further keys. The chain depth is
    /// deliberately unbounded.
    async fn reconcile_waiting(
        &self,
        mut created: BTreeSet<String>,
        statistics: &StatisticsTracker,
    ) {
        while !created.is_empty() {
            for key in &created {
                statistics.remove_missing_dependency(key);
            }

            let waiting = match self.store.fetch_all().await {
                Ok(waiting) => waiting,
                Err(error) => {
                    self.handle_error(statistics, &SyncError::Store(error), None, None, None, 1);
                    return;
                }
            };

            let mut ready = Vec::new();
            for mut record in waiting {
                if record.missing.is_disjoint(&created) {
                    continue;
                }
                record.missing.retain(|key| !created.contains(key));

                if record.missing.is_empty() {
                    ready.push(record);
                } else if let Err(error) = self.store.save(&record).await {
                    self.handle_error(
                        statistics,
                        &SyncError::Store(error),
                        None,
                        Some(&record.draft),
                        None,
                        1,
                    );
                }
            }

            if ready.is_empty() {
                return;
            }

            debug!("Reconciling {} drafts unblocked by this batch", ready.len());

            let keys: HashSet<String> = ready
                .iter()
                .map(|record| record.draft.key.clone())
                .collect();
            let old_by_key = match self.fetch_existing(&keys).await {
                Ok(old_by_key) => old_by_key,
                Err(error) => {
                    self.handle_error(statistics, &error, None, None, None, keys.len() as u64);
                    return;
                }
            };

            // Replayed drafts run the full pipeline again, so they count as
            // processed a second time.
            statistics.increment_processed(ready.len() as u64);

            let mut next_wave = BTreeSet::new();
            for record in ready {
                statistics.remove_waiting_draft(&record.draft.key);
                if let Err(error) = self.store.delete(&record.draft.key).await {
                    warn!(
                        "Failed to delete waiting record '{}': {error}",
                        record.draft.key
                    );
                }

                if let DraftOutcome::Created(key) =
                    self.sync_one(&record.draft, &old_by_key, statistics).await
                {
                    next_wave.insert(key);
                }
            }

            created = next_wave;
        }
    }

    fn handle_error(
        &self,
        statistics: &StatisticsTracker,
        error: &SyncError,
        old: Option<&ExistingResource>,
        new: Option<&Draft>,
        actions: Option<&[UpdateAction]>,
        failed_times: u64,
    ) {
        warn!("{error}");
        self.options.apply_error_callback(error, old, new, actions);
        statistics.increment_failed(failed_times);
    }
}

impl<C, S> SyncEngine<C, S> {
    /// The options this engine was built with.
    #[must_use]
    pub const fn options(&self) -> &SyncOptions {
        &self.options
    }
}
