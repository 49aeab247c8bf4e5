//! Sync options and caller-supplied callbacks.

use std::sync::Arc;

use crate::cache::DEFAULT_CACHE_SIZE;
use crate::error::SyncError;
use crate::model::{Draft, ExistingResource, ResourceType, UpdateAction};

/// Error callback: error, old resource, new draft and attempted actions
/// where available.
pub type ErrorCallback = Arc<
    dyn Fn(&SyncError, Option<&ExistingResource>, Option<&Draft>, Option<&[UpdateAction]>)
        + Send
        + Sync,
>;

/// Warning callback carrying a human-readable message.
pub type WarningCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Hook applied to a draft immediately before a create call. Returning
/// `None` vetoes the create.
pub type BeforeCreateHook = Arc<dyn Fn(Draft) -> Option<Draft> + Send + Sync>;

/// Hook applied to the action list immediately before an update call.
/// Returning an empty list suppresses the call.
pub type BeforeUpdateHook =
    Arc<dyn Fn(Vec<UpdateAction>, &Draft, &ExistingResource) -> Vec<UpdateAction> + Send + Sync>;

/// Options for one sync engine instance.
#[derive(Clone)]
pub struct SyncOptions {
    /// The resource type this engine syncs.
    pub resource_type: ResourceType,
    batch_size: usize,
    cache_size: usize,
    on_error: Option<ErrorCallback>,
    on_warning: Option<WarningCallback>,
    before_create: Option<BeforeCreateHook>,
    before_update: Option<BeforeUpdateHook>,
}

impl SyncOptions {
    /// Creates options with the per-type default batch size and no
    /// callbacks.
    #[must_use]
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            batch_size: resource_type.default_batch_size(),
            cache_size: DEFAULT_CACHE_SIZE,
            on_error: None,
            on_warning: None,
            before_create: None,
            before_update: None,
        }
    }

    /// Sets the batch size. Zero is bumped to one.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = if batch_size == 0 { 1 } else { batch_size };
        self
    }

    /// Sets the reference-cache capacity.
    #[must_use]
    pub const fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    /// Sets the warning callback.
    #[must_use]
    pub fn with_warning_callback(mut self, callback: WarningCallback) -> Self {
        self.on_warning = Some(callback);
        self
    }

    /// Sets the before-create hook.
    #[must_use]
    pub fn with_before_create(mut self, hook: BeforeCreateHook) -> Self {
        self.before_create = Some(hook);
        self
    }

    /// Sets the before-update hook.
    #[must_use]
    pub fn with_before_update(mut self, hook: BeforeUpdateHook) -> Self {
        self.before_update = Some(hook);
        self
    }

    /// The configured batch size.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// The configured reference-cache capacity.
    #[must_use]
    pub const fn cache_size(&self) -> usize {
        self.cache_size
    }

    /// Invokes the error callback if one is set.
    pub fn apply_error_callback(
        &self,
        error: &SyncError,
        old: Option<&ExistingResource>,
        new: Option<&Draft>,
        actions: Option<&[UpdateAction]>,
    ) {
        if let Some(callback) = &self.on_error {
            callback(error, old, new, actions);
        }
    }

    /// Invokes the warning callback if one is set.
    pub fn apply_warning_callback(&self, message: &str) {
        if let Some(callback) = &self.on_warning {
            callback(message);
        }
    }

    /// Applies the before-create hook, defaulting to pass-through.
    #[must_use]
    pub fn apply_before_create(&self, draft: Draft) -> Option<Draft> {
        match &self.before_create {
            Some(hook) => hook(draft),
            None => Some(draft),
        }
    }

    /// Applies the before-update hook, defaulting to pass-through.
    #[must_use]
    pub fn apply_before_update(
        &self,
        actions: Vec<UpdateAction>,
        draft: &Draft,
        old: &ExistingResource,
    ) -> Vec<UpdateAction> {
        match &self.before_update {
            Some(hook) => hook(actions, draft, old),
            None => actions,
        }
    }
}

impl std::fmt::Debug for SyncOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOptions")
            .field("resource_type", &self.resource_type)
            .field("batch_size", &self.batch_size)
            .field("cache_size", &self.cache_size)
            .field("on_error", &self.on_error.is_some())
            .field("on_warning", &self.on_warning.is_some())
            .field("before_create", &self.before_create.is_some())
            .field("before_update", &self.before_update.is_some())
            .finish()
    }
}
