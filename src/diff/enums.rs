//! Update actions for enum values inside an enum-typed field definition.
//!
//! The remote service supports adding, relabelling and reordering enum
//! values, never removing them: old values absent from the new set are
//! ignored at this level, not deleted.

use std::collections::HashMap;

use crate::error::BuildActionError;
use crate::model::{EnumValue, UpdateAction};

/// Compares old and new enum value lists and builds the required actions:
/// label changes first, then additions, then at most one reorder.
///
/// # Errors
///
/// Returns [`BuildActionError::DuplicateEnumKey`] if the new list carries
/// two values with the same key.
pub fn build_enum_values_update_actions(
    field_name: &str,
    old_values: &[EnumValue],
    new_values: &[EnumValue],
) -> Result<Vec<UpdateAction>, BuildActionError> {
    let new_by_key = key_map_with_validation(field_name, new_values)?;
    let old_by_key = key_map_with_validation(field_name, old_values)?;

    let mut actions = Vec::new();

    // Label changes on values present on both sides, in old order.
    for old_value in old_values {
        if let Some(new_value) = new_by_key.get(old_value.key.as_str()) {
            if new_value.label != old_value.label {
                actions.push(UpdateAction::ChangeEnumValueLabel {
                    field_name: field_name.to_string(),
                    value: (*new_value).clone(),
                });
            }
        }
    }

    // Additions, in new order.
    for new_value in new_values {
        if !old_by_key.contains_key(new_value.key.as_str()) {
            actions.push(UpdateAction::AddEnumValue {
                field_name: field_name.to_string(),
                value: new_value.clone(),
            });
        }
    }

    if let Some(reorder) = build_change_order_action(field_name, old_values, new_values) {
        actions.push(reorder);
    }

    Ok(actions)
}

/// Builds a reorder action only if the relative order of the values common
/// to both sides differs, after additions are factored out.
fn build_change_order_action(
    field_name: &str,
    old_values: &[EnumValue],
    new_values: &[EnumValue],
) -> Option<UpdateAction> {
    let new_keys: Vec<&str> = new_values.iter().map(|v| v.key.as_str()).collect();

    let surviving_keys: Vec<&str> = old_values
        .iter()
        .map(|v| v.key.as_str())
        .filter(|key| new_keys.contains(key))
        .collect();

    let added_keys = new_keys
        .iter()
        .filter(|key| !surviving_keys.contains(key))
        .copied();

    let expected: Vec<&str> = surviving_keys.iter().copied().chain(added_keys).collect();

    if expected == new_keys {
        None
    } else {
        Some(UpdateAction::ChangeEnumValueOrder {
            field_name: field_name.to_string(),
            keys: new_keys.iter().map(|k| (*k).to_string()).collect(),
        })
    }
}

fn key_map_with_validation<'a>(
    field_name: &str,
    values: &'a [EnumValue],
) -> Result<HashMap<&'a str, &'a EnumValue>, BuildActionError> {
    let mut map = HashMap::with_capacity(values.len());
    for value in values {
        if map.insert(value.key.as_str(), value).is_some() {
            return Err(BuildActionError::DuplicateEnumKey {
                field: field_name.to_string(),
                key: value.key.clone(),
            });
        }
    }
    Ok(map)
}
