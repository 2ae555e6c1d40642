//! Document → instance decoding over a mapper's models.

use crate::{
    error::MappingError,
    mapper::Mapper,
    model::EntityModel,
    types::{Instance, TypeRef},
    value::{Document, Value},
};
use std::sync::Arc;
use tracing::trace;

///
/// EntityDecoder
///
/// Resolves the concrete model for a stored document and materializes it
/// through the model's instantiator.
///

#[derive(Clone, Copy, Debug)]
pub struct EntityDecoder<'a> {
    mapper: &'a Mapper,
}

impl<'a> EntityDecoder<'a> {
    #[must_use]
    pub const fn new(mapper: &'a Mapper) -> Self {
        Self { mapper }
    }

    /// The model a document should decode as when read as `declared`.
    ///
    /// A discriminator in the document selects a subtype; the result must be
    /// `declared` itself or one of its transitive subtypes. Subtypes that
    /// store their discriminator under their own key are found only once
    /// they are mapped.
    pub fn resolve_model(
        &self,
        declared: &TypeRef,
        document: &Document,
    ) -> Result<Arc<EntityModel>, MappingError> {
        let model = self.mapper.get_model(declared)?;
        if !model.use_discriminator() {
            return Ok(model);
        }

        let Some((key, value)) = Self::discriminator_keys(&model)
            .into_iter()
            .find_map(|key| document.get(&key).map(|value| (key, value)))
        else {
            return Ok(model);
        };
        let discriminator = value.as_text().ok_or_else(|| {
            MappingError::decode(format!(
                "discriminator '{key}' must be text, found {}",
                value.type_name()
            ))
        })?;

        let concrete = self.mapper.lookup_type(discriminator)?;
        if !model.is_or_has_subtype(concrete.name()) {
            // the concrete type may not be linked yet
            self.mapper.get_model(&concrete)?;
            if !model.is_or_has_subtype(concrete.name()) {
                return Err(MappingError::decode(format!(
                    "'{}' is not a subtype of '{}'",
                    concrete.name(),
                    model.type_name()
                )));
            }
        }

        trace!(
            domain = "decode",
            declared = declared.name(),
            concrete = concrete.name(),
            "discriminator selected model"
        );

        self.mapper.get_model(&concrete)
    }

    /// Keys a document read as `model` may carry its discriminator under:
    /// the model's own first, then those of its polymorphic subtypes.
    fn discriminator_keys(model: &EntityModel) -> Vec<String> {
        let mut keys = vec![model.discriminator_key().to_string()];
        for subtype in model.all_subtypes() {
            let key = subtype.discriminator_key();
            if subtype.use_discriminator() && !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }

        keys
    }

    /// Materialize `document` as `declared` or the subtype it names.
    /// Fields absent from the document are left to the instantiator's
    /// defaults; fields without a mapped property are ignored.
    pub fn decode(&self, declared: &TypeRef, document: &Document) -> Result<Instance, MappingError> {
        let model = self.resolve_model(declared, document)?;
        let mut instantiator = self.mapper.new_instantiator(&model)?;

        for property in model.properties() {
            if let Some(value) = document.get(property.storage_name()) {
                instantiator.set(property.name(), value.clone())?;
            }
        }

        Ok(instantiator.into_instance()?)
    }

    /// Write `model`'s discriminator into `document` when the model uses one.
    pub fn encode_discriminator(model: &EntityModel, document: &mut Document) {
        if model.use_discriminator() {
            document.insert(
                model.discriminator_key().to_string(),
                Value::from(model.discriminator()),
            );
        }
    }
}
