//! Reference resolution against the shared key↔id cache.
//!
//! The resolver bulk-fetches key→id mappings once per batch and rewrites
//! draft references from key form to id form. A key absent from the cache
//! leaves the reference unresolved; the orchestrator decides whether to
//! defer or fail the draft.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::cache::ReferenceCache;
use crate::client::ResourceClient;
use crate::error::{Result, SyncError};
use crate::model::{Draft, Reference, ReferencedKeys};

/// Resolver for one sync engine instance.
#[derive(Debug)]
pub struct ReferenceResolver<C> {
    client: Arc<C>,
    cache: Arc<ReferenceCache>,
}

impl<C: ResourceClient> ReferenceResolver<C> {
    /// Creates a resolver over the given client and shared cache.
    #[must_use]
    pub const fn new(client: Arc<C>, cache: Arc<ReferenceCache>) -> Self {
        Self { client, cache }
    }

    /// The shared cache backing this resolver.
    #[must_use]
    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Populates the cache with id mappings for every referenced key not
    /// already cached, issuing one bulk lookup per reference type.
    ///
    /// # Errors
    ///
    /// Returns a single aggregated error if any bulk lookup fails; no
    /// partial resolution is attempted for that batch.
    pub async fn populate_cache(&self, referenced: &ReferencedKeys) -> Result<()> {
        for (resource_type, keys) in referenced.iter() {
            let uncached: HashSet<String> = keys
                .iter()
                .filter(|key| !self.cache.contains_key(resource_type, key))
                .cloned()
                .collect();

            if uncached.is_empty() {
                continue;
            }

            debug!(
                "Resolving {} uncached {} reference keys",
                uncached.len(),
                resource_type
            );

            let mapping = self
                .client
                .resolve_keys(resource_type, &uncached)
                .await
                .map_err(SyncError::Client)?;

            self.cache.merge(resource_type, &mapping);
        }

        Ok(())
    }

    /// Rewrites every key-form reference on the draft to id form using the
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Resolution`] listing the keys that are not
    /// resolvable yet. A missing key is not distinguishable from one that
    /// does not exist remotely; both defer the draft.
    pub fn resolve(&self, draft: &Draft) -> Result<Draft> {
        let mut resolved = draft.clone();
        let mut missing = BTreeSet::new();

        if let Some(parent) = &resolved.parent {
            if let Some(key) = parent.key() {
                match self.cache.id_for(parent.resource_type, key) {
                    Some(id) => {
                        resolved.parent = Some(Reference::by_id(parent.resource_type, id));
                    }
                    None => {
                        missing.insert(key.to_string());
                    }
                }
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(SyncError::Resolution {
                draft_key: draft.key.clone(),
                missing: missing.into_iter().collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::ClientError;
    use crate::model::{ExistingResource, LocalizedString, ResourceType, UpdateAction};

    /// Client fake that serves a fixed key→id table and counts lookups.
    struct TableClient {
        table: HashMap<String, String>,
        lookups: Mutex<usize>,
        fail: bool,
    }

    impl TableClient {
        fn new(table: HashMap<String, String>) -> Self {
            Self {
                table,
                lookups: Mutex::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                table: HashMap::new(),
                lookups: Mutex::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl ResourceClient for TableClient {
        async fn fetch_matching(
            &self,
            _resource_type: ResourceType,
            _keys: &HashSet<String>,
        ) -> std::result::Result<Vec<ExistingResource>, ClientError> {
            Ok(vec![])
        }

        async fn fetch_by_key(
            &self,
            _resource_type: ResourceType,
            _key: &str,
        ) -> std::result::Result<Option<ExistingResource>, ClientError> {
            Ok(None)
        }

        async fn create(
            &self,
            _draft: &Draft,
        ) -> std::result::Result<ExistingResource, ClientError> {
            Err(ClientError::transport("not implemented"))
        }

        async fn update(
            &self,
            _existing: &ExistingResource,
            _actions: &[UpdateAction],
        ) -> std::result::Result<ExistingResource, ClientError> {
            Err(ClientError::transport("not implemented"))
        }

        async fn resolve_keys(
            &self,
            _resource_type: ResourceType,
            keys: &HashSet<String>,
        ) -> std::result::Result<HashMap<String, String>, ClientError> {
            if self.fail {
                return Err(ClientError::transport("bulk lookup failed"));
            }
            let mut guard = self.lookups.lock().unwrap();
            *guard += 1;
            Ok(keys
                .iter()
                .filter_map(|key| {
                    self.table
                        .get(key)
                        .map(|id| (key.clone(), id.clone()))
                })
                .collect())
        }
    }

    fn draft_with_parent(key: &str, parent_key: &str) -> Draft {
        Draft::new(
            ResourceType::Category,
            key,
            LocalizedString::of("en", "Shoes"),
        )
        .with_parent(Reference::by_key(ResourceType::Category, parent_key))
    }

    #[tokio::test]
    async fn populate_cache_then_resolve_rewrites_to_id() {
        let mut table = HashMap::new();
        table.insert("parent".to_string(), "id-7".to_string());
        let client = Arc::new(TableClient::new(table));
        let cache = Arc::new(ReferenceCache::new(16));
        let resolver = ReferenceResolver::new(Arc::clone(&client), Arc::clone(&cache));

        let mut referenced = ReferencedKeys::new();
        referenced.add(ResourceType::Category, "parent");
        resolver.populate_cache(&referenced).await.unwrap();

        let resolved = resolver.resolve(&draft_with_parent("child", "parent")).unwrap();
        let parent = resolved.parent.unwrap();
        assert!(parent.is_resolved());
        assert_eq!(parent, Reference::by_id(ResourceType::Category, "id-7"));
    }

    #[tokio::test]
    async fn cached_keys_are_not_fetched_again() {
        let mut table = HashMap::new();
        table.insert("parent".to_string(), "id-7".to_string());
        let client = Arc::new(TableClient::new(table));
        let cache = Arc::new(ReferenceCache::new(16));
        let resolver = ReferenceResolver::new(Arc::clone(&client), cache);

        let mut referenced = ReferencedKeys::new();
        referenced.add(ResourceType::Category, "parent");
        resolver.populate_cache(&referenced).await.unwrap();
        resolver.populate_cache(&referenced).await.unwrap();

        assert_eq!(*client.lookups.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_key_defers_instead_of_failing() {
        let client = Arc::new(TableClient::new(HashMap::new()));
        let cache = Arc::new(ReferenceCache::new(16));
        let resolver = ReferenceResolver::new(client, cache);

        let mut referenced = ReferencedKeys::new();
        referenced.add(ResourceType::Category, "ghost");
        resolver.populate_cache(&referenced).await.unwrap();

        let err = resolver
            .resolve(&draft_with_parent("child", "ghost"))
            .unwrap_err();
        match err {
            SyncError::Resolution { draft_key, missing } => {
                assert_eq!(draft_key, "child");
                assert_eq!(missing, vec!["ghost".to_string()]);
            }
            other => panic!("expected resolution error, got {other}"),
        }
    }

    #[tokio::test]
    async fn bulk_lookup_failure_is_aggregated() {
        let client = Arc::new(TableClient::failing());
        let cache = Arc::new(ReferenceCache::new(16));
        let resolver = ReferenceResolver::new(client, cache);

        let mut referenced = ReferencedKeys::new();
        referenced.add(ResourceType::Category, "parent");

        let err = resolver.populate_cache(&referenced).await.unwrap_err();
        assert!(matches!(err, SyncError::Client(ClientError::Transport { .. })));
    }
}
