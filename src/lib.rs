// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::redundant_clone)]     // Useless clones warning

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Catsync
//!
//! A batch reconciliation engine for syncing typed resource drafts into a
//! remote catalog service.
//!
//! ## Overview
//!
//! Catsync takes a caller-supplied list of desired-state drafts and converges
//! the remote catalog towards them:
//!
//! - Compute minimal update-action diffs between drafts and existing resources
//! - Resolve key-form references to ids through a shared bidirectional cache
//! - Defer drafts whose referenced resources do not exist yet, and replay
//!   them once their dependencies are created
//! - Retry updates exactly once on optimistic-concurrency conflicts
//!
//! ## Architecture
//!
//! The engine is built around **desired state reconciliation**:
//!
//! 1. **Desired State**: The drafts handed to [`SyncEngine::sync`]
//! 2. **Observed State**: Existing resources fetched per batch from the
//!    remote service through a [`ResourceClient`]
//! 3. **Diff**: Update actions computed per draft and applied remotely
//!
//! Batches run strictly in input order; within a batch the per-draft
//! pipelines run concurrently. The call never fails as a whole: every error
//! is surfaced through the configured callback and counted in the returned
//! [`SyncStatistics`].
//!
//! ## Modules
//!
//! - [`model`]: Drafts, existing resources, references and update actions
//! - [`diff`]: Update-action computation, including field definition and
//!   enum value diffs
//! - [`cache`]: Bounded key↔id reference cache
//! - [`resolver`]: Reference resolution against the cache
//! - [`store`]: Persistence of drafts waiting on unresolved references
//! - [`sync`]: The batch orchestration engine
//! - [`cleanup`]: Deletion of stale waiting records

// ============================================================================
// Modules
// ============================================================================

pub mod cache;
pub mod cleanup;
pub mod client;
pub mod diff;
pub mod error;
pub mod model;
pub mod options;
pub mod resolver;
pub mod statistics;
pub mod store;
pub mod sync;
pub mod validator;

// ============================================================================
// Re-exports
// ============================================================================

pub use cache::ReferenceCache;
pub use cleanup::{CleanupStatistics, cleanup_stale};
pub use client::ResourceClient;
pub use diff::DiffEngine;
pub use error::{BuildActionError, ClientError, Result, StoreError, SyncError};
pub use model::{
    Draft, EnumValue, ExistingResource, FieldDefinition, FieldType, LocalizedString, Reference,
    ReferenceTarget, ReferencedKeys, ResourceType, UpdateAction,
};
pub use options::SyncOptions;
pub use resolver::ReferenceResolver;
pub use statistics::{StatisticsTracker, SyncStatistics};
pub use store::{FileUnresolvedStore, MemoryUnresolvedStore, UnresolvedStore, WaitingRecord};
pub use sync::SyncEngine;
pub use validator::BatchValidator;
