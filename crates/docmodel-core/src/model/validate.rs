use crate::{error::MappingError, model::EntityModel, types::TypeKind};
use std::collections::BTreeMap;

/// Structural checks run before a model becomes canonical.
/// All violations are collected and reported together.
pub(crate) fn validate_model(model: &EntityModel) -> Result<(), MappingError> {
    let mut errors = Vec::new();

    validate_keys(model, &mut errors);
    validate_id(model, &mut errors);
    validate_storage_names(model, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(MappingError::Validation {
            type_name: model.type_name().to_string(),
            errors,
        })
    }
}

fn validate_keys(model: &EntityModel, errors: &mut Vec<String>) {
    if model.discriminator().is_empty() {
        errors.push("discriminator is empty".to_string());
    }
    if model.discriminator_key().is_empty() {
        errors.push("discriminator key is empty".to_string());
    }
    if model.collection_name().is_some_and(str::is_empty) {
        errors.push("collection name is empty".to_string());
    }
}

fn validate_id(model: &EntityModel, errors: &mut Vec<String>) {
    let ids: Vec<&str> = model
        .properties()
        .iter()
        .filter(|p| p.is_id())
        .map(|p| p.name())
        .collect();

    if ids.len() > 1 {
        errors.push(format!("multiple id properties: {}", ids.join(", ")));
    }

    if model.is_embedded() {
        if let Some(id) = ids.first() {
            errors.push(format!("embedded type declares id property '{id}'"));
        }
    } else if ids.is_empty() && model.type_ref().kind() == TypeKind::Class {
        errors.push("entity has no id property".to_string());
    }
}

fn validate_storage_names(model: &EntityModel, errors: &mut Vec<String>) {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();

    for property in model.properties() {
        let storage = property.storage_name();

        if storage.is_empty() {
            errors.push(format!("property '{}' has an empty storage name", property.name()));
            continue;
        }
        if storage == model.discriminator_key() && model.use_discriminator() {
            errors.push(format!(
                "property '{}' is stored under the discriminator key '{storage}'",
                property.name()
            ));
        }
        if let Some(prev) = seen.insert(storage, property.name()) {
            errors.push(format!(
                "properties '{prev}' and '{}' share storage name '{storage}'",
                property.name()
            ));
        }
    }
}
