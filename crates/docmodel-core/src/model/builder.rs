use crate::{
    UNSET,
    model::{EntityModel, PropertyModel},
    options::MapperOptions,
    types::TypeRef,
};
use std::sync::Arc;

///
/// Convention
///
/// One stage of the model construction pipeline. Stages run in order over
/// the same builder; later stages see and may override earlier results.
///

pub trait Convention: Send + Sync {
    fn apply(&self, options: &MapperOptions, builder: &mut EntityModelBuilder);
}

///
/// EntityModelBuilder
///
/// Mutable draft of an `EntityModel`. `parent` is the already-canonical
/// model of the nearest mapped parent, used to inherit configuration for
/// unmarked subtypes.
///

pub struct EntityModelBuilder {
    ty: TypeRef,
    parent: Option<Arc<EntityModel>>,
    pub discriminator: String,
    pub discriminator_key: String,
    pub collection_name: Option<String>,
    pub use_discriminator: bool,
    pub embedded: bool,
    pub properties: Vec<PropertyModel>,
}

impl EntityModelBuilder {
    #[must_use]
    pub fn new(ty: TypeRef, parent: Option<Arc<EntityModel>>) -> Self {
        Self {
            ty,
            parent,
            discriminator: UNSET.to_string(),
            discriminator_key: UNSET.to_string(),
            collection_name: None,
            use_discriminator: true,
            embedded: false,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub const fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    #[must_use]
    pub const fn parent(&self) -> Option<&Arc<EntityModel>> {
        self.parent.as_ref()
    }

    /// Run every convention from `options` over a fresh builder.
    #[must_use]
    pub fn run(ty: TypeRef, parent: Option<Arc<EntityModel>>, options: &MapperOptions) -> Self {
        let mut builder = Self::new(ty, parent);
        for convention in options.conventions() {
            convention.apply(options, &mut builder);
        }

        builder
    }

    #[must_use]
    pub fn build(self) -> EntityModel {
        EntityModel::from_builder(self)
    }
}

///
/// MarkerDefaults
///
/// Discriminator, discriminator key, collection, and embedded flag from the
/// type's marker, falling back to the parent model and then the options.
///

pub struct MarkerDefaults;

impl Convention for MarkerDefaults {
    fn apply(&self, options: &MapperOptions, builder: &mut EntityModelBuilder) {
        let ty = Arc::clone(&builder.ty);
        let parent = builder.parent.clone();

        let configured_discriminator;
        let configured_key;

        if let Some(marker) = ty.marker() {
            configured_discriminator = marker.discriminator().to_string();
            configured_key = marker.discriminator_key().to_string();
            builder.use_discriminator = marker.use_discriminator();
            builder.embedded = marker.is_embedded();
            builder.collection_name = if builder.embedded {
                None
            } else {
                Some(marker.collection().map_or_else(
                    || options.collection_naming().apply(ty.simple_name()),
                    str::to_string,
                ))
            };
        } else {
            configured_discriminator = UNSET.to_string();
            configured_key = parent
                .as_ref()
                .map_or(UNSET, |p| p.discriminator_key())
                .to_string();
            builder.use_discriminator = parent.as_ref().is_none_or(|p| p.use_discriminator());
            builder.embedded = parent.as_ref().is_some_and(|p| p.is_embedded());
            builder.collection_name = if builder.embedded {
                None
            } else {
                Some(
                    parent
                        .as_ref()
                        .and_then(|p| p.collection_name())
                        .map_or_else(
                            || options.collection_naming().apply(ty.simple_name()),
                            str::to_string,
                        ),
                )
            };
        }

        builder.discriminator = options.discriminator().apply(&ty, &configured_discriminator);
        builder.discriminator_key = if configured_key == UNSET {
            options.discriminator_key().to_string()
        } else {
            configured_key
        };
    }
}

///
/// PropertyDiscovery
///
/// Mapped properties in declaration order. Transient properties are
/// skipped; storage names come from the explicit override or the property
/// naming strategy.
///

pub struct PropertyDiscovery;

impl Convention for PropertyDiscovery {
    fn apply(&self, options: &MapperOptions, builder: &mut EntityModelBuilder) {
        let naming = options.property_naming();

        builder.properties = builder
            .ty
            .properties()
            .iter()
            .filter(|p| !p.is_transient())
            .map(|p| {
                let storage_name = p
                    .explicit_storage_name()
                    .map_or_else(|| naming.apply(p.name()), str::to_string);

                PropertyModel::new(p.name(), storage_name, p.is_id())
                    .with_setter(p.setter_fn().cloned())
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        naming::NamingStrategy,
        types::{EmbeddedMarker, EntityMarker, PropertyDescriptor, TypeDescriptor},
    };

    fn build(ty: TypeRef, parent: Option<Arc<EntityModel>>, options: &MapperOptions) -> EntityModel {
        EntityModelBuilder::run(ty, parent, options).build()
    }

    #[test]
    fn unset_marker_values_fall_back_to_options() {
        let ty = TypeDescriptor::class("com.example.zoo.ZooKeeper")
            .entity(EntityMarker::new())
            .property(PropertyDescriptor::id("id"))
            .build();
        let model = build(ty, None, &MapperOptions::default());

        assert_eq!(model.discriminator(), "ZooKeeper");
        assert_eq!(model.discriminator_key(), "_t");
        assert_eq!(model.collection_name(), Some("zooKeeper"));
        assert!(model.use_discriminator());
    }

    #[test]
    fn explicit_marker_values_win() {
        let ty = TypeDescriptor::class("com.example.zoo.ZooKeeper")
            .entity(
                EntityMarker::new()
                    .collection("keepers")
                    .discriminator("keeper")
                    .discriminator_key("kind"),
            )
            .build();
        let model = build(ty, None, &MapperOptions::default());

        assert_eq!(model.discriminator(), "keeper");
        assert_eq!(model.discriminator_key(), "kind");
        assert_eq!(model.collection_name(), Some("keepers"));
    }

    #[test]
    fn unmarked_subtype_inherits_parent_configuration() {
        let root = TypeDescriptor::class("com.example.zoo.Animal")
            .entity(
                EntityMarker::new()
                    .collection("animals")
                    .discriminator_key("kind")
                    .use_discriminator(false),
            )
            .build();
        let child = TypeDescriptor::class("com.example.zoo.Dog")
            .extends("com.example.zoo.Animal")
            .build();

        let options = MapperOptions::default();
        let parent = Arc::new(build(root, None, &options));
        let model = build(child, Some(parent), &options);

        assert_eq!(model.discriminator(), "Dog");
        assert_eq!(model.discriminator_key(), "kind");
        assert_eq!(model.collection_name(), Some("animals"));
        assert!(!model.use_discriminator());
    }

    #[test]
    fn embedded_models_have_no_collection() {
        let ty = TypeDescriptor::class("com.example.zoo.Address")
            .embedded(EmbeddedMarker::new())
            .build();
        let model = build(ty, None, &MapperOptions::default());

        assert!(model.is_embedded());
        assert_eq!(model.collection_name(), None);
    }

    #[test]
    fn properties_skip_transient_and_apply_naming() {
        let ty = TypeDescriptor::class("com.example.zoo.Keeper")
            .entity(EntityMarker::new())
            .property(PropertyDescriptor::id("id").storage_name("_id"))
            .property(PropertyDescriptor::new("firstName"))
            .property(PropertyDescriptor::new("cachedScore").transient())
            .build();

        let mut builder = MapperOptions::builder();
        builder
            .property_naming(NamingStrategy::SnakeCase)
            .expect("builder is unlocked");
        let options = builder.build();
        let model = build(ty, None, &options);

        let names: Vec<(&str, &str)> = model
            .properties()
            .iter()
            .map(|p| (p.name(), p.storage_name()))
            .collect();
        assert_eq!(names, vec![("id", "_id"), ("firstName", "first_name")]);
        assert_eq!(model.id_property().map(PropertyModel::name), Some("id"));
    }
}
