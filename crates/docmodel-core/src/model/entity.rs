use crate::{
    instance::{InstantiationError, InstantiationStrategy, Instantiator},
    model::{EntityModelBuilder, PropertyModel},
    types::{LifecycleEvent, TypeKind, TypeRef},
};
use parking_lot::RwLock;
use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, OnceLock, Weak},
};

///
/// ParentEdge
///
/// How a parent model relates to a child. Ordering is precedence when a
/// child has several mapped parents: the superclass first, then interfaces
/// in declaration order.
///

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum ParentEdge {
    Superclass,
    Interface(usize),
}

struct SuperLink {
    model: Weak<EntityModel>,
    edge: ParentEdge,
}

///
/// EntityModel
///
/// Structural metadata for one mapped type. Shape fields never change after
/// construction; `subtypes` and `super_model` are filled in by the mapper's
/// linking pass.
///

pub struct EntityModel {
    ty: TypeRef,
    discriminator: String,
    discriminator_key: String,
    collection_name: Option<String>,
    use_discriminator: bool,
    embedded: bool,
    properties: Vec<PropertyModel>,
    id_property: Option<usize>,
    super_model: RwLock<Option<SuperLink>>,
    subtypes: RwLock<Vec<Arc<Self>>>,
    strategy: OnceLock<Result<InstantiationStrategy, InstantiationError>>,
}

impl EntityModel {
    pub(crate) fn from_builder(builder: EntityModelBuilder) -> Self {
        let id_property = builder.properties.iter().position(PropertyModel::is_id);

        Self {
            ty: builder.type_ref().clone(),
            discriminator: builder.discriminator,
            discriminator_key: builder.discriminator_key,
            collection_name: builder.collection_name,
            use_discriminator: builder.use_discriminator,
            embedded: builder.embedded,
            properties: builder.properties,
            id_property,
            super_model: RwLock::new(None),
            subtypes: RwLock::new(Vec::new()),
            strategy: OnceLock::new(),
        }
    }

    #[must_use]
    pub const fn type_ref(&self) -> &TypeRef {
        &self.ty
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    #[must_use]
    pub fn discriminator_key(&self) -> &str {
        &self.discriminator_key
    }

    /// Storage bucket; `None` for embedded models.
    #[must_use]
    pub fn collection_name(&self) -> Option<&str> {
        self.collection_name.as_deref()
    }

    #[must_use]
    pub const fn use_discriminator(&self) -> bool {
        self.use_discriminator
    }

    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.embedded
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.ty.is_interface()
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        matches!(self.ty.kind(), TypeKind::Abstract)
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyModel] {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyModel> {
        self.properties.iter().find(|p| p.name() == name)
    }

    #[must_use]
    pub fn property_by_storage_name(&self, storage_name: &str) -> Option<&PropertyModel> {
        self.properties
            .iter()
            .find(|p| p.storage_name() == storage_name)
    }

    #[must_use]
    pub fn id_property(&self) -> Option<&PropertyModel> {
        self.id_property.map(|i| &self.properties[i])
    }

    #[must_use]
    pub fn has_lifecycle(&self, event: LifecycleEvent) -> bool {
        self.ty.lifecycle_events().contains(&event)
    }

    // ------------------------------------------------------------------
    // Subtype graph
    // ------------------------------------------------------------------

    #[must_use]
    pub fn super_model(&self) -> Option<Arc<Self>> {
        self.super_model
            .read()
            .as_ref()
            .and_then(|link| link.model.upgrade())
    }

    /// Direct children, as a snapshot.
    #[must_use]
    pub fn subtypes(&self) -> Vec<Arc<Self>> {
        self.subtypes.read().clone()
    }

    /// Every transitive child, depth first, each once.
    #[must_use]
    pub fn all_subtypes(&self) -> Vec<Arc<Self>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        collect_subtypes(self, &mut seen, &mut out, false);

        out
    }

    /// Discriminators a polymorphic query on this model should match: its
    /// own plus those of every subtype, pruning subtrees that opt out of
    /// discriminators.
    #[must_use]
    pub fn polymorphic_discriminators(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut subtypes = Vec::new();
        collect_subtypes(self, &mut seen, &mut subtypes, true);

        std::iter::once(self.discriminator.clone())
            .chain(subtypes.iter().map(|m| m.discriminator.clone()))
            .collect()
    }

    /// True if `type_name` is this model's type or one of its subtypes.
    #[must_use]
    pub fn is_or_has_subtype(&self, type_name: &str) -> bool {
        self.type_name() == type_name
            || self
                .all_subtypes()
                .iter()
                .any(|m| m.type_name() == type_name)
    }

    /// Edge by which `self` is a direct parent of `child`, if any.
    #[must_use]
    pub fn parent_edge_to(&self, child: &Self) -> Option<ParentEdge> {
        if child.ty.superclass() == Some(self.type_name()) {
            return Some(ParentEdge::Superclass);
        }

        child
            .ty
            .interfaces()
            .iter()
            .position(|name| name == self.type_name())
            .map(ParentEdge::Interface)
    }

    pub(crate) fn link(parent: &Arc<Self>, child: &Arc<Self>, edge: ParentEdge) -> bool {
        let added = parent.add_subtype(child);
        child.offer_super_model(parent, edge);

        added
    }

    fn add_subtype(&self, child: &Arc<Self>) -> bool {
        let mut subtypes = self.subtypes.write();
        if subtypes.iter().any(|m| m.type_name() == child.type_name()) {
            return false;
        }
        subtypes.push(Arc::clone(child));

        true
    }

    fn offer_super_model(&self, parent: &Arc<Self>, edge: ParentEdge) {
        let mut link = self.super_model.write();
        let replace = link
            .as_ref()
            .is_none_or(|current| edge < current.edge || current.model.strong_count() == 0);

        if replace {
            *link = Some(SuperLink {
                model: Arc::downgrade(parent),
                edge,
            });
        }
    }

    // ------------------------------------------------------------------
    // Instantiation
    // ------------------------------------------------------------------

    /// The memoized instantiation strategy, selected on first call.
    pub fn instantiation_strategy(&self) -> Result<&InstantiationStrategy, InstantiationError> {
        self.strategy
            .get_or_init(|| InstantiationStrategy::select(self))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// A fresh instantiator using the memoized strategy.
    pub fn instantiator(self: &Arc<Self>) -> Result<Box<dyn Instantiator>, InstantiationError> {
        self.instantiation_strategy()?.instantiator(Arc::clone(self))
    }

    /// Same shape, no graph edges, independently owned collections.
    pub(crate) fn detached_copy(&self) -> Self {
        Self {
            ty: Arc::clone(&self.ty),
            discriminator: self.discriminator.clone(),
            discriminator_key: self.discriminator_key.clone(),
            collection_name: self.collection_name.clone(),
            use_discriminator: self.use_discriminator,
            embedded: self.embedded,
            properties: self.properties.clone(),
            id_property: self.id_property,
            super_model: RwLock::new(None),
            subtypes: RwLock::new(Vec::new()),
            strategy: self.strategy.clone(),
        }
    }
}

fn collect_subtypes(
    model: &EntityModel,
    seen: &mut HashSet<String>,
    out: &mut Vec<Arc<EntityModel>>,
    prune_opted_out: bool,
) {
    for child in model.subtypes() {
        if prune_opted_out && !child.use_discriminator {
            continue;
        }
        if seen.insert(child.type_name().to_string()) {
            out.push(Arc::clone(&child));
            collect_subtypes(&child, seen, out, prune_opted_out);
        }
    }
}

impl fmt::Debug for EntityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subtypes: Vec<String> = self
            .subtypes
            .read()
            .iter()
            .map(|m| m.type_name().to_string())
            .collect();

        f.debug_struct("EntityModel")
            .field("type", &self.type_name())
            .field("discriminator", &self.discriminator)
            .field("discriminator_key", &self.discriminator_key)
            .field("collection_name", &self.collection_name)
            .field("use_discriminator", &self.use_discriminator)
            .field("embedded", &self.embedded)
            .field("properties", &self.properties)
            .field("subtypes", &subtypes)
            .finish_non_exhaustive()
    }
}
