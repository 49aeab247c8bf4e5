//! Diff engine for comparing an existing resource against a resolved draft.
//!
//! This module computes the ordered list of update actions required to make
//! the remote resource match the draft. Every field is compared by semantic
//! value, never by serialized representation; an empty action list means the
//! two are already converged.

mod enums;
mod fields;

pub use enums::build_enum_values_update_actions;
pub use fields::build_field_definitions_update_actions;

use tracing::debug;

use crate::error::BuildActionError;
use crate::model::{Draft, ExistingResource, UpdateAction};
use crate::options::SyncOptions;

/// Engine for computing update actions, one instance per resource type.
#[derive(Debug)]
pub struct DiffEngine {
    options: SyncOptions,
}

impl DiffEngine {
    /// Creates a diff engine bound to the given options.
    #[must_use]
    pub const fn new(options: SyncOptions) -> Self {
        Self { options }
    }

    /// Compares `old` against `new` and builds the required update actions.
    ///
    /// Fields omitted from the draft follow the platform's unset policy:
    /// an absent `active` flag means the default (`true`), while an absent
    /// `description` or `parent` on a resource that has one set cannot be
    /// unset — those report a warning and produce no action.
    ///
    /// # Errors
    ///
    /// Returns [`BuildActionError`] if the draft violates a structural
    /// invariant (duplicate field definition names or enum value keys); no
    /// partial action list is returned in that case.
    pub fn build_actions(
        &self,
        old: &ExistingResource,
        new: &Draft,
    ) -> Result<Vec<UpdateAction>, BuildActionError> {
        let mut actions = Vec::new();

        if new.name != old.name {
            actions.push(UpdateAction::ChangeName {
                name: new.name.clone(),
            });
        }

        match (&old.description, &new.description) {
            (_, Some(description)) => {
                if old.description.as_ref() != Some(description) {
                    actions.push(UpdateAction::SetDescription {
                        description: description.clone(),
                    });
                }
            }
            (Some(_), None) => {
                self.options.apply_warning_callback(&format!(
                    "Cannot unset 'description' field of {} resource with id '{}'.",
                    old.resource_type, old.id
                ));
            }
            (None, None) => {}
        }

        if new.effective_active() != old.active {
            actions.push(UpdateAction::ChangeActive {
                active: new.effective_active(),
            });
        }

        match (&old.parent, &new.parent) {
            (_, Some(parent)) => {
                if old.parent.as_ref() != Some(parent) {
                    actions.push(UpdateAction::SetParent {
                        parent: parent.clone(),
                    });
                }
            }
            (Some(_), None) => {
                self.options.apply_warning_callback(&format!(
                    "Cannot unset 'parent' field of {} resource with id '{}'.",
                    old.resource_type, old.id
                ));
            }
            (None, None) => {}
        }

        actions.extend(fields::build_field_definitions_update_actions(
            &old.field_definitions,
            &new.field_definitions,
        )?);

        debug!(
            "Built {} update actions for resource with key '{}'",
            actions.len(),
            old.key
        );

        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::model::{LocalizedString, Reference, ResourceType};

    fn existing(key: &str) -> ExistingResource {
        ExistingResource {
            id: format!("id-{key}"),
            version: 1,
            resource_type: ResourceType::Category,
            key: key.to_string(),
            name: LocalizedString::of("en", "Shoes").with("de", "Schuhe"),
            description: None,
            active: true,
            parent: None,
            field_definitions: vec![],
        }
    }

    fn draft_matching(old: &ExistingResource) -> Draft {
        Draft {
            resource_type: old.resource_type,
            key: old.key.clone(),
            name: old.name.clone(),
            description: old.description.clone(),
            active: Some(old.active),
            parent: old.parent.clone(),
            field_definitions: old.field_definitions.clone(),
        }
    }

    fn engine() -> DiffEngine {
        DiffEngine::new(SyncOptions::new(ResourceType::Category))
    }

    fn engine_with_warnings() -> (DiffEngine, Arc<Mutex<Vec<String>>>) {
        let warnings = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&warnings);
        let options = SyncOptions::new(ResourceType::Category)
            .with_warning_callback(Arc::new(move |message| {
                sink.lock().unwrap().push(message.to_string());
            }));
        (DiffEngine::new(options), warnings)
    }

    #[test]
    fn equal_resource_and_draft_produce_no_actions() {
        let old = existing("c1");
        let new = draft_matching(&old);
        assert!(engine().build_actions(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn locale_enumeration_order_is_not_a_difference() {
        let old = existing("c1");
        let mut new = draft_matching(&old);
        new.name = LocalizedString::of("de", "Schuhe").with("en", "Shoes");

        assert!(engine().build_actions(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn changed_name_produces_one_action_with_the_complete_value() {
        let old = existing("c1");
        let mut new = draft_matching(&old);
        new.name = LocalizedString::of("en", "Boots");

        let actions = engine().build_actions(&old, &new).unwrap();
        assert_eq!(
            actions,
            vec![UpdateAction::ChangeName {
                name: LocalizedString::of("en", "Boots")
            }]
        );
    }

    #[test]
    fn absent_active_means_platform_default() {
        let mut old = existing("c1");
        old.active = false;
        let mut new = draft_matching(&old);
        new.active = None;

        let actions = engine().build_actions(&old, &new).unwrap();
        assert_eq!(actions, vec![UpdateAction::ChangeActive { active: true }]);
    }

    #[test]
    fn unset_forbidden_description_warns_and_produces_no_action() {
        let (engine, warnings) = engine_with_warnings();
        let mut old = existing("c1");
        old.description = Some(LocalizedString::of("en", "All shoes"));
        let mut new = draft_matching(&old);
        new.description = None;

        let actions = engine.build_actions(&old, &new).unwrap();
        assert!(actions.is_empty());

        let warnings = warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("id-c1"));
        assert!(warnings[0].contains("description"));
    }

    #[test]
    fn changed_parent_produces_set_parent() {
        let old = existing("c1");
        let mut new = draft_matching(&old);
        new.parent = Some(Reference::by_id(ResourceType::Category, "id-parent"));

        let actions = engine().build_actions(&old, &new).unwrap();
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], UpdateAction::SetParent { .. }));
    }

    #[test]
    fn duplicate_field_names_fail_with_no_partial_list() {
        use crate::model::{FieldDefinition, FieldType};

        let old = existing("c1");
        let mut new = draft_matching(&old);
        new.name = LocalizedString::of("en", "Boots");
        new.field_definitions = vec![
            FieldDefinition::new("f", LocalizedString::of("en", "F"), false, FieldType::Text),
            FieldDefinition::new("f", LocalizedString::of("en", "F2"), false, FieldType::Text),
        ];

        let err = engine().build_actions(&old, &new).unwrap_err();
        assert!(err.to_string().contains("'f'"));
    }
}
