//! Error types for the catsync reconciliation engine.
//!
//! This module provides the error hierarchy for all phases of a sync run:
//! draft validation, reference resolution, diff computation, remote calls,
//! and waiting-record storage.

use thiserror::Error;

/// The main error type for the catsync engine.
///
/// Every failure path inside [`crate::sync::SyncEngine`] is converted into
/// one of these kinds before it reaches the error callback; the engine never
/// lets an error escape its public `sync()` boundary.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A draft failed validation before any remote call was made.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// A draft carries references that could not be resolved to ids.
    #[error("Resolution error for draft '{draft_key}': missing keys {missing:?}")]
    Resolution {
        /// Key of the draft that could not be resolved.
        draft_key: String,
        /// Reference keys that are not resolvable yet.
        missing: Vec<String>,
    },

    /// A structural invariant was violated while building update actions.
    #[error("Failed to build update actions: {0}")]
    BuildAction(#[from] BuildActionError),

    /// Remote catalog service errors.
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// The resource disappeared between a concurrency conflict and the
    /// retry refetch.
    #[error(
        "Not found when attempting to fetch resource with key '{key}' \
         while retrying after concurrency modification."
    )]
    NotFoundOnRetry {
        /// Key of the resource that vanished.
        key: String,
    },

    /// The refetch issued after a concurrency conflict itself failed.
    #[error(
        "Failed to fetch resource with key '{key}' while retrying after \
         concurrency modification."
    )]
    FetchOnRetry {
        /// Key of the resource that was being refetched.
        key: String,
        /// The underlying client failure.
        #[source]
        source: ClientError,
    },

    /// Waiting-record store errors.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors reported by the remote catalog service collaborator.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The resource changed since it was fetched (optimistic concurrency).
    #[error("Concurrent modification of resource with key '{key}' (expected version {expected_version})")]
    Conflict {
        /// Key of the contested resource.
        key: String,
        /// Version the update was issued against.
        expected_version: u64,
    },

    /// The resource does not exist on the remote service.
    #[error("Resource not found: {key}")]
    NotFound {
        /// Key of the missing resource.
        key: String,
    },

    /// Any other remote failure (network, authentication, server error).
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the remote failure.
        message: String,
    },
}

/// Errors raised while building update actions from a draft.
#[derive(Debug, Error)]
pub enum BuildActionError {
    /// Two field definitions inside one draft share a name.
    #[error(
        "Field definitions have duplicated names. Duplicated field definition \
         name: '{name}'. Field definition names are expected to be unique \
         inside their resource."
    )]
    DuplicateFieldName {
        /// The duplicated field definition name.
        name: String,
    },

    /// Two enum values inside one field definition share a key.
    #[error(
        "Enum values have duplicated keys. Duplicated enum value key: '{key}' \
         in field definition '{field}'. Enum value keys are expected to be \
         unique inside their field definition."
    )]
    DuplicateEnumKey {
        /// Name of the field definition holding the duplicate.
        field: String,
        /// The duplicated enum value key.
        key: String,
    },
}

/// Waiting-record store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An IO failure while reading or writing records.
    #[error("Store IO error: {message}")]
    Io {
        /// Description of the IO failure.
        message: String,
    },

    /// A record on disk could not be decoded.
    #[error("Corrupted waiting record: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },
}

/// Result type alias for catsync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Creates a validation error with the given message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns true if this error is an optimistic-concurrency conflict,
    /// which is the only retriable failure kind.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Client(ClientError::Conflict { .. }))
    }
}

impl ClientError {
    /// Creates a transport error with the given message.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

impl StoreError {
    /// Creates an IO error with the given message.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a corruption error with the given message.
    #[must_use]
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }
}
