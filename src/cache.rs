//! Bounded, shared key↔id cache for resource references.
//!
//! The cache is populated once per batch by the reference resolver's bulk
//! lookup and read concurrently by per-draft resolve calls. Writes are
//! additive merges; stale entries are never actively invalidated, only
//! overwritten by the next successful fetch.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use tracing::debug;

use crate::model::ResourceType;

/// Default number of (id, key) entries the cache holds.
pub const DEFAULT_CACHE_SIZE: usize = 10_000;

/// Bounded cache of (id, key) pairs, per resource type.
///
/// Invariant: an id maps to at most one key at any time. Once the capacity
/// is exceeded, the oldest inserted entries are evicted first.
#[derive(Debug)]
pub struct ReferenceCache {
    inner: RwLock<CacheInner>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    id_by_key: HashMap<(ResourceType, String), String>,
    key_by_id: HashMap<(ResourceType, String), String>,
    insertion_order: VecDeque<(ResourceType, String)>,
}

impl ReferenceCache {
    /// Creates a cache with the given capacity. A zero capacity is bumped
    /// to one entry.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns the cached id for a key, exact-match and case-sensitive.
    ///
    /// # Panics
    ///
    /// Panics if the cache lock was poisoned by a panicking writer.
    #[must_use]
    pub fn id_for(&self, resource_type: ResourceType, key: &str) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .id_by_key
            .get(&(resource_type, key.to_string()))
            .cloned()
    }

    /// Returns the cached key for an id.
    #[must_use]
    pub fn key_for(&self, resource_type: ResourceType, id: &str) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .key_by_id
            .get(&(resource_type, id.to_string()))
            .cloned()
    }

    /// Returns true if a key is already cached for the given type.
    #[must_use]
    pub fn contains_key(&self, resource_type: ResourceType, key: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.id_by_key.contains_key(&(resource_type, key.to_string()))
    }

    /// Inserts one (key, id) pair, overwriting previous mappings so the
    /// id-maps-to-at-most-one-key invariant holds.
    pub fn insert(&self, resource_type: ResourceType, key: impl Into<String>, id: impl Into<String>) {
        let key = key.into();
        let id = id.into();
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.insert(resource_type, key, id);
        inner.evict_to(self.capacity);
    }

    /// Merges a bulk key→id lookup result into the cache.
    pub fn merge(&self, resource_type: ResourceType, mapping: &HashMap<String, String>) {
        if mapping.is_empty() {
            return;
        }
        let mut inner = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        for (key, id) in mapping {
            inner.insert(resource_type, key.clone(), id.clone());
        }
        inner.evict_to(self.capacity);
        debug!(
            "Merged {} {} key mappings into the reference cache",
            mapping.len(),
            resource_type
        );
    }

    /// Number of entries currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.id_by_key.len()
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReferenceCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl CacheInner {
    fn insert(&mut self, resource_type: ResourceType, key: String, id: String) {
        // An id maps to at most one key: drop the previous key mapping when
        // the same id arrives under a new key. The reverse map stays the
        // same size as the forward map, so evicting the forward map bounds
        // both.
        if let Some(previous_key) = self
            .key_by_id
            .insert((resource_type, id.clone()), key.clone())
        {
            if previous_key != key {
                self.id_by_key.remove(&(resource_type, previous_key));
            }
        }

        match self.id_by_key.insert((resource_type, key.clone()), id.clone()) {
            None => self.insertion_order.push_back((resource_type, key)),
            // A re-pointed key must not leave its previous id entry behind.
            Some(previous_id) if previous_id != id => {
                self.key_by_id.remove(&(resource_type, previous_id));
            }
            Some(_) => {}
        }
    }

    fn evict_to(&mut self, capacity: usize) {
        while self.id_by_key.len() > capacity {
            let Some(oldest) = self.insertion_order.pop_front() else {
                break;
            };
            if let Some(id) = self.id_by_key.remove(&oldest) {
                self.key_by_id.remove(&(oldest.0, id));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_sensitive() {
        let cache = ReferenceCache::new(16);
        cache.insert(ResourceType::Category, "Shoes", "id-1");

        assert_eq!(cache.id_for(ResourceType::Category, "Shoes"), Some("id-1".into()));
        assert_eq!(cache.id_for(ResourceType::Category, "shoes"), None);
    }

    #[test]
    fn id_maps_to_at_most_one_key() {
        let cache = ReferenceCache::new(16);
        cache.insert(ResourceType::Category, "old-key", "id-1");
        cache.insert(ResourceType::Category, "new-key", "id-1");

        assert_eq!(cache.id_for(ResourceType::Category, "old-key"), None);
        assert_eq!(cache.id_for(ResourceType::Category, "new-key"), Some("id-1".into()));
        assert_eq!(cache.key_for(ResourceType::Category, "id-1"), Some("new-key".into()));
    }

    #[test]
    fn repointed_key_purges_the_stale_id_entry() {
        let cache = ReferenceCache::new(16);
        cache.insert(ResourceType::Category, "k", "id-1");
        cache.insert(ResourceType::Category, "k", "id-2");

        assert_eq!(cache.key_for(ResourceType::Category, "id-1"), None);
        assert_eq!(cache.key_for(ResourceType::Category, "id-2"), Some("k".into()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entries_are_scoped_per_type() {
        let cache = ReferenceCache::new(16);
        cache.insert(ResourceType::Category, "k", "cat-id");
        cache.insert(ResourceType::TaxCategory, "k", "tax-id");

        assert_eq!(cache.id_for(ResourceType::Category, "k"), Some("cat-id".into()));
        assert_eq!(cache.id_for(ResourceType::TaxCategory, "k"), Some("tax-id".into()));
    }

    #[test]
    fn oldest_entries_are_evicted_past_capacity() {
        let cache = ReferenceCache::new(2);
        cache.insert(ResourceType::Category, "a", "id-a");
        cache.insert(ResourceType::Category, "b", "id-b");
        cache.insert(ResourceType::Category, "c", "id-c");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.id_for(ResourceType::Category, "a"), None);
        assert_eq!(cache.id_for(ResourceType::Category, "c"), Some("id-c".into()));
    }

    #[test]
    fn merge_overwrites_stale_mappings() {
        let cache = ReferenceCache::new(16);
        cache.insert(ResourceType::Category, "k", "stale-id");

        let mut mapping = HashMap::new();
        mapping.insert("k".to_string(), "fresh-id".to_string());
        cache.merge(ResourceType::Category, &mapping);

        assert_eq!(cache.id_for(ResourceType::Category, "k"), Some("fresh-id".into()));
    }
}
