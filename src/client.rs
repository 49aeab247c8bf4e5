//! Remote catalog service collaborator.
//!
//! The wire transport and authentication layer live behind this trait;
//! the engine only depends on the narrow contract below.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::ClientError;
use crate::model::{Draft, ExistingResource, ResourceType, UpdateAction};

/// Client for the remote catalog service.
///
/// Failures surface as typed [`ClientError`]s so the orchestrator can
/// distinguish retriable conflicts from terminal failures.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetches the existing resources matching the given keys. Keys with no
    /// matching resource are simply absent from the result.
    async fn fetch_matching(
        &self,
        resource_type: ResourceType,
        keys: &HashSet<String>,
    ) -> Result<Vec<ExistingResource>, ClientError>;

    /// Fetches one resource by key, `None` if it does not exist.
    async fn fetch_by_key(
        &self,
        resource_type: ResourceType,
        key: &str,
    ) -> Result<Option<ExistingResource>, ClientError>;

    /// Creates a resource from a resolved draft.
    async fn create(&self, draft: &Draft) -> Result<ExistingResource, ClientError>;

    /// Applies an ordered list of update actions to an existing resource.
    async fn update(
        &self,
        existing: &ExistingResource,
        actions: &[UpdateAction],
    ) -> Result<ExistingResource, ClientError>;

    /// Bulk key→id resolution for one resource type. Keys that do not exist
    /// are absent from the returned map, never an error.
    async fn resolve_keys(
        &self,
        resource_type: ResourceType,
        keys: &HashSet<String>,
    ) -> Result<HashMap<String, String>, ClientError>;
}

#[async_trait]
impl ResourceClient for Box<dyn ResourceClient> {
    async fn fetch_matching(
        &self,
        resource_type: ResourceType,
        keys: &HashSet<String>,
    ) -> Result<Vec<ExistingResource>, ClientError> {
        (**self).fetch_matching(resource_type, keys).await
    }

    async fn fetch_by_key(
        &self,
        resource_type: ResourceType,
        key: &str,
    ) -> Result<Option<ExistingResource>, ClientError> {
        (**self).fetch_by_key(resource_type, key).await
    }

    async fn create(&self, draft: &Draft) -> Result<ExistingResource, ClientError> {
        (**self).create(draft).await
    }

    async fn update(
        &self,
        existing: &ExistingResource,
        actions: &[UpdateAction],
    ) -> Result<ExistingResource, ClientError> {
        (**self).update(existing, actions).await
    }

    async fn resolve_keys(
        &self,
        resource_type: ResourceType,
        keys: &HashSet<String>,
    ) -> Result<HashMap<String, String>, ClientError> {
        (**self).resolve_keys(resource_type, keys).await
    }
}
