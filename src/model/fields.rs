//! Field definitions carried by catalog resources.

use serde::{Deserialize, Serialize};

use super::{LocalizedString, ResourceType};

/// One typed field carried by a resource, uniquely named within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name, unique inside one resource.
    pub name: String,
    /// Localized display label.
    pub label: LocalizedString,
    /// Whether a value for this field is mandatory.
    pub required: bool,
    /// The field's value type.
    pub field_type: FieldType,
}

impl FieldDefinition {
    /// Creates a field definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: LocalizedString,
        required: bool,
        field_type: FieldType,
    ) -> Self {
        Self {
            name: name.into(),
            label,
            required,
            field_type,
        }
    }
}

/// The value type of a field definition.
///
/// There is no type-mutation primitive on the remote service: changing the
/// type of an existing field is always expressed as remove-then-add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    /// Plain text.
    Text,
    /// Numeric value.
    Number,
    /// Boolean value.
    Boolean,
    /// Enumerated value with a fixed, ordered value set.
    Enum {
        /// The allowed values, in display order.
        values: Vec<EnumValue>,
    },
    /// Reference to another resource.
    Reference {
        /// The resource type the reference points at.
        target: ResourceType,
    },
}

impl FieldType {
    /// Returns true if `self` and `other` are the same kind of type,
    /// ignoring enum value sets and reference targets.
    #[must_use]
    pub const fn same_kind(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Text, Self::Text)
                | (Self::Number, Self::Number)
                | (Self::Boolean, Self::Boolean)
                | (Self::Enum { .. }, Self::Enum { .. })
                | (Self::Reference { .. }, Self::Reference { .. })
        )
    }
}

/// One allowed value of an enum-typed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Stable value key.
    pub key: String,
    /// Localized display label.
    pub label: LocalizedString,
}

impl EnumValue {
    /// Creates an enum value.
    #[must_use]
    pub fn new(key: impl Into<String>, label: LocalizedString) -> Self {
        Self {
            key: key.into(),
            label,
        }
    }
}
