//! Update actions for a resource's ordered field definition list.

use std::collections::HashMap;

use crate::error::BuildActionError;
use crate::model::{FieldDefinition, UpdateAction};

use super::enums::build_enum_values_update_actions;
use crate::model::FieldType;

/// Compares old and new field definition lists and builds the required
/// actions, ordered as: removals, per-definition updates, additions, and at
/// most one reorder listing the full new name order.
///
/// A definition whose type kind changed is expressed as remove-then-add
/// since the remote offers no type-mutation primitive.
///
/// # Errors
///
/// Returns [`BuildActionError`] if the new list carries duplicate definition
/// names or a definition carries duplicate enum value keys.
pub fn build_field_definitions_update_actions(
    old_definitions: &[FieldDefinition],
    new_definitions: &[FieldDefinition],
) -> Result<Vec<UpdateAction>, BuildActionError> {
    let new_by_name = name_map_with_validation(new_definitions)?;

    let mut actions = build_remove_or_update_actions(old_definitions, &new_by_name)?;
    actions.extend(build_add_actions(old_definitions, new_definitions));

    if let Some(reorder) = build_change_order_action(old_definitions, new_definitions) {
        actions.push(reorder);
    }

    Ok(actions)
}

/// Removal actions for old-only definitions plus 1-1 update actions (label,
/// enum values) for definitions present on both sides. Type kind changes
/// become remove-then-add pairs.
fn build_remove_or_update_actions(
    old_definitions: &[FieldDefinition],
    new_by_name: &HashMap<&str, &FieldDefinition>,
) -> Result<Vec<UpdateAction>, BuildActionError> {
    let mut actions = Vec::new();

    for old_definition in old_definitions {
        match new_by_name.get(old_definition.name.as_str()) {
            None => {
                actions.push(UpdateAction::RemoveFieldDefinition {
                    name: old_definition.name.clone(),
                });
            }
            Some(new_definition) if !old_definition.field_type.same_kind(&new_definition.field_type) => {
                actions.push(UpdateAction::RemoveFieldDefinition {
                    name: old_definition.name.clone(),
                });
                actions.push(UpdateAction::AddFieldDefinition {
                    field_definition: (*new_definition).clone(),
                });
            }
            Some(new_definition) => {
                if new_definition.label != old_definition.label {
                    actions.push(UpdateAction::ChangeFieldDefinitionLabel {
                        name: old_definition.name.clone(),
                        label: new_definition.label.clone(),
                    });
                }
                if let (
                    FieldType::Enum { values: old_values },
                    FieldType::Enum { values: new_values },
                ) = (&old_definition.field_type, &new_definition.field_type)
                {
                    actions.extend(build_enum_values_update_actions(
                        &old_definition.name,
                        old_values,
                        new_values,
                    )?);
                }
            }
        }
    }

    Ok(actions)
}

/// Addition actions for definitions only present in the new list, in new
/// order.
fn build_add_actions(
    old_definitions: &[FieldDefinition],
    new_definitions: &[FieldDefinition],
) -> Vec<UpdateAction> {
    let old_names: Vec<&str> = old_definitions.iter().map(|d| d.name.as_str()).collect();

    new_definitions
        .iter()
        .filter(|definition| !old_names.contains(&definition.name.as_str()))
        .map(|definition| UpdateAction::AddFieldDefinition {
            field_definition: definition.clone(),
        })
        .collect()
}

/// Builds a reorder action only if the relative order of the names common to
/// both sides differs once removals and additions are factored out.
fn build_change_order_action(
    old_definitions: &[FieldDefinition],
    new_definitions: &[FieldDefinition],
) -> Option<UpdateAction> {
    let new_names: Vec<&str> = new_definitions.iter().map(|d| d.name.as_str()).collect();

    let surviving_names: Vec<&str> = old_definitions
        .iter()
        .map(|d| d.name.as_str())
        .filter(|name| new_names.contains(name))
        .collect();

    let added_names = new_names
        .iter()
        .filter(|name| !surviving_names.contains(name))
        .copied();

    let expected: Vec<&str> = surviving_names.iter().copied().chain(added_names).collect();

    if expected == new_names {
        None
    } else {
        Some(UpdateAction::ChangeFieldDefinitionOrder {
            names: new_names.iter().map(|n| (*n).to_string()).collect(),
        })
    }
}

fn name_map_with_validation(
    definitions: &[FieldDefinition],
) -> Result<HashMap<&str, &FieldDefinition>, BuildActionError> {
    let mut map = HashMap::with_capacity(definitions.len());
    for definition in definitions {
        if map.insert(definition.name.as_str(), definition).is_some() {
            return Err(BuildActionError::DuplicateFieldName {
                name: definition.name.clone(),
            });
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EnumValue, LocalizedString};

    fn text_field(name: &str, label: &str) -> FieldDefinition {
        FieldDefinition::new(name, LocalizedString::of("en", label), false, FieldType::Text)
    }

    fn enum_field(name: &str, keys: &[&str]) -> FieldDefinition {
        let values = keys
            .iter()
            .map(|k| EnumValue::new(*k, LocalizedString::of("en", *k)))
            .collect();
        FieldDefinition::new(
            name,
            LocalizedString::of("en", name),
            false,
            FieldType::Enum { values },
        )
    }

    #[test]
    fn identical_lists_produce_no_actions() {
        let defs = vec![text_field("a", "A"), text_field("b", "B")];
        let actions = build_field_definitions_update_actions(&defs, &defs).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn removed_definition_produces_remove_action() {
        let old = vec![text_field("a", "A"), text_field("b", "B")];
        let new = vec![text_field("a", "A")];
        let actions = build_field_definitions_update_actions(&old, &new).unwrap();

        assert_eq!(
            actions,
            vec![UpdateAction::RemoveFieldDefinition { name: "b".into() }]
        );
    }

    #[test]
    fn type_change_is_remove_then_add() {
        let old = vec![text_field("a", "A")];
        let new = vec![FieldDefinition::new(
            "a",
            LocalizedString::of("en", "A"),
            false,
            FieldType::Number,
        )];
        let actions = build_field_definitions_update_actions(&old, &new).unwrap();

        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], UpdateAction::RemoveFieldDefinition { name } if name == "a"));
        assert!(matches!(
            &actions[1],
            UpdateAction::AddFieldDefinition { field_definition }
                if field_definition.field_type == FieldType::Number
        ));
    }

    #[test]
    fn label_change_produces_one_action() {
        let old = vec![text_field("a", "A")];
        let new = vec![text_field("a", "Better A")];
        let actions = build_field_definitions_update_actions(&old, &new).unwrap();

        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            UpdateAction::ChangeFieldDefinitionLabel { name, .. } if name == "a"
        ));
    }

    #[test]
    fn reorder_only_compares_surviving_names() {
        // "b" is removed and "d" added; the surviving "a", "c" keep their
        // relative order, so no reorder action is expected.
        let old = vec![text_field("a", "A"), text_field("b", "B"), text_field("c", "C")];
        let new = vec![text_field("a", "A"), text_field("c", "C"), text_field("d", "D")];
        let actions = build_field_definitions_update_actions(&old, &new).unwrap();

        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], UpdateAction::RemoveFieldDefinition { name } if name == "b"));
        assert!(matches!(&actions[1], UpdateAction::AddFieldDefinition { .. }));
    }

    #[test]
    fn swapped_survivors_produce_one_reorder_with_full_order() {
        let old = vec![text_field("a", "A"), text_field("b", "B")];
        let new = vec![text_field("b", "B"), text_field("a", "A")];
        let actions = build_field_definitions_update_actions(&old, &new).unwrap();

        assert_eq!(
            actions,
            vec![UpdateAction::ChangeFieldDefinitionOrder {
                names: vec!["b".into(), "a".into()]
            }]
        );
    }

    #[test]
    fn duplicate_names_raise_a_build_error() {
        let old = vec![];
        let new = vec![text_field("a", "A"), text_field("a", "Another A")];
        let err = build_field_definitions_update_actions(&old, &new).unwrap_err();

        assert!(matches!(
            err,
            BuildActionError::DuplicateFieldName { ref name } if name == "a"
        ));
    }

    #[test]
    fn enum_values_are_diffed_for_matching_definitions() {
        let old = vec![enum_field("size", &["s", "m"])];
        let new = vec![enum_field("size", &["s", "m", "l"])];
        let actions = build_field_definitions_update_actions(&old, &new).unwrap();

        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            UpdateAction::AddEnumValue { field_name, value } if field_name == "size" && value.key == "l"
        ));
    }
}
