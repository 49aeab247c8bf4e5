//! Data model for catalog resources.
//!
//! This module defines the desired-state [`Draft`], the remote
//! [`ExistingResource`], and the typed values they carry. Drafts are
//! immutable for the duration of one sync call; existing resources are
//! fetched fresh at the start of each batch.

mod actions;
mod fields;
mod reference;

pub use actions::UpdateAction;
pub use fields::{EnumValue, FieldDefinition, FieldType};
pub use reference::{Reference, ReferenceTarget, ReferencedKeys};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The kinds of catalog resources the engine can synchronize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// A catalog category.
    Category,
    /// A product type definition.
    ProductType,
    /// A custom field type definition.
    CustomFieldType,
    /// A tax category.
    TaxCategory,
    /// A product.
    Product,
}

impl ResourceType {
    /// Default batch size used when syncing this resource type.
    #[must_use]
    pub const fn default_batch_size(self) -> usize {
        match self {
            Self::Product => 30,
            Self::Category => 50,
            _ => 50,
        }
    }

    /// Name of the waiting-record store container for this resource type.
    #[must_use]
    pub const fn container_name(self) -> &'static str {
        match self {
            Self::Category => "unresolved.categories",
            Self::ProductType => "unresolved.product-types",
            Self::CustomFieldType => "unresolved.custom-field-types",
            Self::TaxCategory => "unresolved.tax-categories",
            Self::Product => "unresolved.products",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Category => "category",
            Self::ProductType => "product type",
            Self::CustomFieldType => "custom field type",
            Self::TaxCategory => "tax category",
            Self::Product => "product",
        };
        write!(f, "{s}")
    }
}

/// A locale → text map.
///
/// Two localized strings are equal when their (locale, text) pair sets are
/// equal; enumeration order never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedString(HashMap<String, String>);

impl LocalizedString {
    /// Creates an empty localized string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a localized string with a single locale entry.
    #[must_use]
    pub fn of(locale: impl Into<String>, text: impl Into<String>) -> Self {
        let mut map = HashMap::new();
        map.insert(locale.into(), text.into());
        Self(map)
    }

    /// Adds or replaces a locale entry, builder style.
    #[must_use]
    pub fn with(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(locale.into(), text.into());
        self
    }

    /// Returns the text for a locale, if present.
    #[must_use]
    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    /// Returns true if no locale entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Desired-state description of one catalog resource.
///
/// A draft is created by the caller and never mutated by the engine; the
/// reference resolver produces a rewritten copy instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// The resource type this draft describes.
    pub resource_type: ResourceType,
    /// Caller-assigned stable identifier, required and unique.
    pub key: String,
    /// Localized display name, required.
    pub name: LocalizedString,
    /// Optional localized description. Once set on the remote resource it
    /// cannot be unset again.
    pub description: Option<LocalizedString>,
    /// Whether the resource is active. Absent means the platform default
    /// (`true`).
    pub active: Option<bool>,
    /// Optional reference to a parent resource.
    pub parent: Option<Reference>,
    /// Ordered list of field definitions.
    pub field_definitions: Vec<FieldDefinition>,
}

impl Draft {
    /// Creates a minimal draft with the given type, key and name.
    #[must_use]
    pub fn new(
        resource_type: ResourceType,
        key: impl Into<String>,
        name: LocalizedString,
    ) -> Self {
        Self {
            resource_type,
            key: key.into(),
            name,
            description: None,
            active: None,
            parent: None,
            field_definitions: Vec::new(),
        }
    }

    /// Sets the description, builder style.
    #[must_use]
    pub fn with_description(mut self, description: LocalizedString) -> Self {
        self.description = Some(description);
        self
    }

    /// Sets the active flag, builder style.
    #[must_use]
    pub const fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Sets the parent reference, builder style.
    #[must_use]
    pub fn with_parent(mut self, parent: Reference) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the field definitions, builder style.
    #[must_use]
    pub fn with_field_definitions(mut self, field_definitions: Vec<FieldDefinition>) -> Self {
        self.field_definitions = field_definitions;
        self
    }

    /// Effective active flag, applying the platform default for an absent
    /// value.
    #[must_use]
    pub fn effective_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

/// The remote service's current representation of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingResource {
    /// Remote-assigned immutable identifier.
    pub id: String,
    /// Optimistic-concurrency token, bumped by the remote on every update.
    pub version: u64,
    /// The resource type.
    pub resource_type: ResourceType,
    /// Caller-assigned stable identifier.
    pub key: String,
    /// Localized display name.
    pub name: LocalizedString,
    /// Optional localized description.
    pub description: Option<LocalizedString>,
    /// Whether the resource is active.
    pub active: bool,
    /// Optional reference to a parent resource, always in resolved (id)
    /// form.
    pub parent: Option<Reference>,
    /// Ordered list of field definitions.
    pub field_definitions: Vec<FieldDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_string_equality_ignores_insertion_order() {
        let a = LocalizedString::of("en", "shoes").with("de", "Schuhe");
        let b = LocalizedString::of("de", "Schuhe").with("en", "shoes");
        assert_eq!(a, b);
    }

    #[test]
    fn localized_string_differs_on_changed_text() {
        let a = LocalizedString::of("en", "shoes");
        let b = LocalizedString::of("en", "boots");
        assert_ne!(a, b);
    }

    #[test]
    fn effective_active_defaults_to_true() {
        let draft = Draft::new(
            ResourceType::Category,
            "c1",
            LocalizedString::of("en", "Shoes"),
        );
        assert!(draft.effective_active());
        assert!(!draft.with_active(false).effective_active());
    }
}
