//! Batch validation of raw drafts.
//!
//! Filters a raw batch into valid drafts plus the set of referenced keys
//! that must be resolved before diffing. Validation never touches the
//! remote service.

use std::collections::HashSet;

use tracing::debug;

use crate::error::SyncError;
use crate::model::{Draft, ReferencedKeys};
use crate::options::SyncOptions;
use crate::statistics::StatisticsTracker;

/// Validator for one batch of drafts.
#[derive(Debug)]
pub struct BatchValidator {
    options: SyncOptions,
}

impl BatchValidator {
    /// Creates a validator bound to the given options.
    #[must_use]
    pub const fn new(options: SyncOptions) -> Self {
        Self { options }
    }

    /// Validates a raw batch.
    ///
    /// Rejected drafts (missing, keyless, nameless, or duplicating an
    /// earlier key in the same batch) trigger the error callback and bump
    /// the failed counter; they are excluded from the returned set. Every
    /// key-form reference carried by an accepted draft lands in the
    /// returned [`ReferencedKeys`], deduplicated per target type.
    pub fn validate(
        &self,
        batch: &[Option<Draft>],
        statistics: &StatisticsTracker,
    ) -> (Vec<Draft>, ReferencedKeys) {
        let mut valid = Vec::new();
        let mut referenced = ReferencedKeys::new();
        let mut seen_keys: HashSet<&str> = HashSet::new();

        for draft in batch {
            let Some(draft) = draft.as_ref() else {
                self.reject(statistics, format!("{} draft is null.", self.options.resource_type));
                continue;
            };

            if draft.key.is_empty() {
                self.reject(
                    statistics,
                    format!("{} draft has no key set.", self.options.resource_type),
                );
                continue;
            }

            if draft.name.is_empty() {
                self.reject(
                    statistics,
                    format!(
                        "{} draft with key '{}' has no name set.",
                        self.options.resource_type, draft.key
                    ),
                );
                continue;
            }

            if !seen_keys.insert(draft.key.as_str()) {
                self.reject(
                    statistics,
                    format!(
                        "{} draft with key '{}' appears more than once in the same batch.",
                        self.options.resource_type, draft.key
                    ),
                );
                continue;
            }

            if let Some(parent) = &draft.parent {
                if let Some(key) = parent.key() {
                    referenced.add(parent.resource_type, key);
                }
            }

            valid.push(draft.clone());
        }

        debug!(
            "Validated batch: {} of {} drafts accepted",
            valid.len(),
            batch.len()
        );

        (valid, referenced)
    }

    fn reject(&self, statistics: &StatisticsTracker, message: String) {
        let error = SyncError::validation(message);
        self.options.apply_error_callback(&error, None, None, None);
        statistics.increment_failed(1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::model::{LocalizedString, Reference, ResourceType};

    fn draft(key: &str) -> Draft {
        Draft::new(
            ResourceType::Category,
            key,
            LocalizedString::of("en", "Shoes"),
        )
    }

    fn validator_with_error_counter() -> (BatchValidator, Arc<AtomicUsize>) {
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&errors);
        let options = SyncOptions::new(ResourceType::Category).with_error_callback(Arc::new(
            move |_, _, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));
        (BatchValidator::new(options), errors)
    }

    #[test]
    fn rejects_null_keyless_and_nameless_drafts() {
        let (validator, errors) = validator_with_error_counter();
        let statistics = StatisticsTracker::new();

        let nameless = Draft::new(ResourceType::Category, "c2", LocalizedString::new());
        let batch = vec![None, Some(draft("")), Some(nameless), Some(draft("c1"))];

        let (valid, _) = validator.validate(&batch, &statistics);

        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].key, "c1");
        assert_eq!(errors.load(Ordering::SeqCst), 3);
        assert_eq!(statistics.snapshot().failed, 3);
    }

    #[test]
    fn rejects_duplicate_keys_in_one_batch() {
        let (validator, errors) = validator_with_error_counter();
        let statistics = StatisticsTracker::new();

        let batch = vec![Some(draft("c1")), Some(draft("c1"))];
        let (valid, _) = validator.validate(&batch, &statistics);

        assert_eq!(valid.len(), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn collects_parent_reference_keys() {
        let (validator, _) = validator_with_error_counter();
        let statistics = StatisticsTracker::new();

        let child =
            draft("child").with_parent(Reference::by_key(ResourceType::Category, "parent"));
        let other =
            draft("other").with_parent(Reference::by_key(ResourceType::Category, "parent"));
        let resolved =
            draft("done").with_parent(Reference::by_id(ResourceType::Category, "id-9"));

        let batch = vec![Some(child), Some(other), Some(resolved)];
        let (valid, referenced) = validator.validate(&batch, &statistics);

        assert_eq!(valid.len(), 3);
        let keys = referenced.keys_for(ResourceType::Category).cloned().unwrap_or_default();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("parent"));
    }
}
