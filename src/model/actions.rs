//! Update actions accepted by the remote catalog service.

use serde::{Deserialize, Serialize};

use super::{FieldDefinition, LocalizedString, Reference};

/// One atomic named change operation.
///
/// The order of actions within one draft's list is significant: removals of
/// field definitions precede per-field updates, which precede additions,
/// which precede the reorder action. Replaying the same list against the
/// same resource is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpdateAction {
    /// Replaces the resource name with the complete new value.
    ChangeName {
        /// The new name.
        name: LocalizedString,
    },
    /// Replaces the resource description with the complete new value.
    SetDescription {
        /// The new description.
        description: LocalizedString,
    },
    /// Changes the active flag.
    ChangeActive {
        /// The new active flag.
        active: bool,
    },
    /// Replaces the parent reference.
    SetParent {
        /// The new parent, in resolved (id) form.
        parent: Reference,
    },
    /// Adds a field definition.
    AddFieldDefinition {
        /// The definition to add.
        field_definition: FieldDefinition,
    },
    /// Removes a field definition by name.
    RemoveFieldDefinition {
        /// Name of the definition to remove.
        name: String,
    },
    /// Reorders the field definitions, listing the full new order.
    ChangeFieldDefinitionOrder {
        /// Field definition names in their new order.
        names: Vec<String>,
    },
    /// Replaces the label of one field definition.
    ChangeFieldDefinitionLabel {
        /// Name of the field definition.
        name: String,
        /// The new label.
        label: LocalizedString,
    },
    /// Adds an enum value to an enum-typed field definition.
    AddEnumValue {
        /// Name of the field definition.
        field_name: String,
        /// The value to add.
        value: super::EnumValue,
    },
    /// Replaces the label of one enum value.
    ChangeEnumValueLabel {
        /// Name of the field definition.
        field_name: String,
        /// The relabelled value.
        value: super::EnumValue,
    },
    /// Reorders the enum values of one field definition, listing the full
    /// new key order.
    ChangeEnumValueOrder {
        /// Name of the field definition.
        field_name: String,
        /// Enum value keys in their new order.
        keys: Vec<String>,
    },
}

impl UpdateAction {
    /// The remote API name of this action.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ChangeName { .. } => "changeName",
            Self::SetDescription { .. } => "setDescription",
            Self::ChangeActive { .. } => "changeActive",
            Self::SetParent { .. } => "setParent",
            Self::AddFieldDefinition { .. } => "addFieldDefinition",
            Self::RemoveFieldDefinition { .. } => "removeFieldDefinition",
            Self::ChangeFieldDefinitionOrder { .. } => "changeFieldDefinitionOrder",
            Self::ChangeFieldDefinitionLabel { .. } => "changeFieldDefinitionLabel",
            Self::AddEnumValue { .. } => "addEnumValue",
            Self::ChangeEnumValueLabel { .. } => "changeEnumValueLabel",
            Self::ChangeEnumValueOrder { .. } => "changeEnumValueOrder",
        }
    }
}

impl std::fmt::Display for UpdateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
