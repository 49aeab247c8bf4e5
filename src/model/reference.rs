//! References between catalog resources.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::ResourceType;

/// A pointer from one resource to another.
///
/// Drafts carry references in key form; the reference resolver rewrites them
/// to id form before any create or update call. Exactly one of the two forms
/// is present at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// The resource type the reference points at.
    pub resource_type: ResourceType,
    /// The key or id the reference carries.
    pub target: ReferenceTarget,
}

/// The desired (key) or resolved (id) form of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceTarget {
    /// Caller-assigned key, not yet resolved.
    ByKey(String),
    /// Remote-assigned id.
    ById(String),
}

impl Reference {
    /// Creates a key-form reference.
    #[must_use]
    pub fn by_key(resource_type: ResourceType, key: impl Into<String>) -> Self {
        Self {
            resource_type,
            target: ReferenceTarget::ByKey(key.into()),
        }
    }

    /// Creates an id-form reference.
    #[must_use]
    pub fn by_id(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource_type,
            target: ReferenceTarget::ById(id.into()),
        }
    }

    /// Returns the key if the reference is still in key form.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match &self.target {
            ReferenceTarget::ByKey(key) => Some(key),
            ReferenceTarget::ById(_) => None,
        }
    }

    /// Returns true if the reference has been resolved to an id.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self.target, ReferenceTarget::ById(_))
    }
}

/// Per-batch set of referenced keys, grouped by target resource type.
///
/// Collected by the batch validator and consumed by the reference resolver
/// for the bulk key→id lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencedKeys(HashMap<ResourceType, HashSet<String>>);

impl ReferencedKeys {
    /// Creates an empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one referenced key. Duplicates per type are absorbed.
    pub fn add(&mut self, resource_type: ResourceType, key: impl Into<String>) {
        self.0.entry(resource_type).or_default().insert(key.into());
    }

    /// Returns the keys referenced for one resource type.
    #[must_use]
    pub fn keys_for(&self, resource_type: ResourceType) -> Option<&HashSet<String>> {
        self.0.get(&resource_type)
    }

    /// Iterates over all (type, keys) groups.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, &HashSet<String>)> {
        self.0.iter().map(|(t, keys)| (*t, keys))
    }

    /// Returns true if no keys were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referenced_keys_deduplicate_per_type() {
        let mut keys = ReferencedKeys::new();
        keys.add(ResourceType::Category, "parent");
        keys.add(ResourceType::Category, "parent");
        keys.add(ResourceType::TaxCategory, "parent");

        assert_eq!(keys.keys_for(ResourceType::Category).map(HashSet::len), Some(1));
        assert_eq!(keys.keys_for(ResourceType::TaxCategory).map(HashSet::len), Some(1));
    }

    #[test]
    fn reference_forms_are_exclusive() {
        let by_key = Reference::by_key(ResourceType::Category, "c1");
        assert_eq!(by_key.key(), Some("c1"));
        assert!(!by_key.is_resolved());

        let by_id = Reference::by_id(ResourceType::Category, "id-1");
        assert_eq!(by_id.key(), None);
        assert!(by_id.is_resolved());
    }
}
