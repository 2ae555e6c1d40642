//! The entity model registry.
//!
//! `Mapper` owns the type → model cache, the collection index, and the
//! discriminator lookup. Reads are lock-free snapshot loads; inserts publish
//! a new snapshot per change. The first registration for a type wins and
//! every later caller observes that same `Arc`.


use crate::{
    discriminator::DiscriminatorLookup,
    error::MappingError,
    instance::Instantiator,
    model::{EntityModel, EntityModelBuilder, ParentEdge, validate::validate_model},
    obs::{MetricsEvent, MetricsSnapshot, RegistryMetrics},
    options::MapperOptions,
    types::{PackageScanner, TypeCatalog, TypeDescriptor, TypeLoader, TypeRef},
};
use arc_swap::ArcSwap;
use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};
use tracing::{debug, warn};

type ModelMap = HashMap<String, Arc<EntityModel>>;
type CollectionMap = HashMap<String, Vec<Arc<EntityModel>>>;

///
/// Mapper
///

pub struct Mapper {
    options: Arc<MapperOptions>,
    loader: Arc<dyn TypeLoader>,
    scanner: Arc<dyn PackageScanner>,
    models: ArcSwap<ModelMap>,
    collections: ArcSwap<CollectionMap>,
    lookup: DiscriminatorLookup,
    metrics: Arc<RegistryMetrics>,
}

impl Mapper {
    /// Mapper over an in-memory catalog used as both loader and scanner.
    #[must_use]
    pub fn new(options: MapperOptions, catalog: Arc<TypeCatalog>) -> Self {
        let loader: Arc<dyn TypeLoader> = catalog.clone();

        Self::with_loader(options, loader, catalog)
    }

    #[must_use]
    pub fn with_loader(
        options: MapperOptions,
        loader: Arc<dyn TypeLoader>,
        scanner: Arc<dyn PackageScanner>,
    ) -> Self {
        let metrics = Arc::new(RegistryMetrics::default());
        let lookup = DiscriminatorLookup::new(Arc::clone(&loader), Arc::clone(&metrics));
        for package in options.packages() {
            lookup.add_package(package);
        }

        Self {
            options: Arc::new(options),
            loader,
            scanner,
            models: ArcSwap::from_pointee(HashMap::new()),
            collections: ArcSwap::from_pointee(HashMap::new()),
            lookup,
            metrics,
        }
    }

    // ------------------------------------------------------------------
    // Model resolution
    // ------------------------------------------------------------------

    /// True if `ty` is already registered, carries a mapping marker, or has
    /// a mappable superclass or interface.
    #[must_use]
    pub fn is_mappable(&self, ty: &TypeDescriptor) -> bool {
        let mut seen = HashSet::new();

        self.is_mappable_inner(ty, &mut seen)
    }

    fn is_mappable_inner(&self, ty: &TypeDescriptor, seen: &mut HashSet<String>) -> bool {
        if !seen.insert(ty.name().to_string()) {
            return false;
        }
        if ty.marker().is_some() || self.cached(ty.name()).is_some() {
            return true;
        }

        ty.parent_names().any(|name| {
            self.loader
                .load(name)
                .is_some_and(|parent| self.is_mappable_inner(&parent, seen))
        })
    }

    /// The canonical model for `ty`, built and registered on first request.
    ///
    /// A type that reaches itself through its superclass or interfaces is
    /// rejected with `Validation`.
    pub fn get_model(&self, ty: &TypeRef) -> Result<Arc<EntityModel>, MappingError> {
        let mut visiting = HashSet::new();

        self.get_model_inner(ty, &mut visiting)
    }

    /// Like `get_model`, but an unmappable type is `Ok(None)`.
    pub fn try_get_model(&self, ty: &TypeRef) -> Result<Option<Arc<EntityModel>>, MappingError> {
        let mut visiting = HashSet::new();

        Self::speculative(self.get_model_inner(ty, &mut visiting))
    }

    fn speculative(
        result: Result<Arc<EntityModel>, MappingError>,
    ) -> Result<Option<Arc<EntityModel>>, MappingError> {
        match result {
            Ok(model) => Ok(Some(model)),
            Err(err) if err.is_not_mappable() => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn get_model_inner(
        &self,
        ty: &TypeRef,
        visiting: &mut HashSet<String>,
    ) -> Result<Arc<EntityModel>, MappingError> {
        if let Some(model) = self.cached(ty.name()) {
            self.metrics.record(MetricsEvent::CacheHit);
            return Ok(model);
        }
        if !self.is_mappable(ty) {
            return Err(MappingError::not_mappable(ty.name()));
        }
        if !visiting.insert(ty.name().to_string()) {
            return Err(MappingError::Validation {
                type_name: ty.name().to_string(),
                errors: vec!["type inherits from itself".to_string()],
            });
        }

        // map direct parents first so the graph and inherited settings exist
        let mut parent = None;
        for name in ty.parent_names() {
            let Some(parent_ty) = self.loader.load(name) else {
                continue;
            };
            if let Some(model) = Self::speculative(self.get_model_inner(&parent_ty, visiting))? {
                parent.get_or_insert(model);
            }
        }
        visiting.remove(ty.name());

        let model = Arc::new(EntityModelBuilder::run(Arc::clone(ty), parent, &self.options).build());
        self.metrics.record(MetricsEvent::ModelBuilt);
        debug!(
            domain = "mapper",
            type_name = ty.name(),
            discriminator = model.discriminator(),
            collection = ?model.collection_name(),
            "model built"
        );

        self.register_model(model)
    }

    pub fn get_model_by_name(&self, name: &str) -> Result<Arc<EntityModel>, MappingError> {
        let ty = self
            .loader
            .load(name)
            .ok_or_else(|| MappingError::not_mappable(name))?;

        self.get_model(&ty)
    }

    /// Make `model` canonical for its type.
    ///
    /// If a model for the type is already registered, that model is
    /// returned and `model` is discarded. The discriminator is indexed
    /// before the model is published, so a colliding model is never
    /// observable through the cache.
    pub fn register_model(
        &self,
        model: Arc<EntityModel>,
    ) -> Result<Arc<EntityModel>, MappingError> {
        let name = model.type_name().to_string();

        if let Some(existing) = self.cached(&name) {
            return Ok(self.resolve_duplicate(existing, &model));
        }
        if !model.is_interface() {
            validate_model(&model)?;
        }

        // re-indexing the same (discriminator, type) pair is a no-op
        self.lookup.add_model(&model)?;

        let mut existing = None;
        self.models.rcu(|current| {
            existing = current.get(&name).cloned();
            if existing.is_some() {
                return Arc::clone(current);
            }

            let mut next = ModelMap::clone(current);
            next.insert(name.clone(), Arc::clone(&model));
            Arc::new(next)
        });
        if let Some(existing) = existing {
            return Ok(self.resolve_duplicate(existing, &model));
        }

        if let Some(collection) = model.collection_name() {
            self.index_collection(collection, &model);
        }
        self.link_subtypes(&model);

        self.metrics.record(MetricsEvent::ModelRegistered);
        debug!(domain = "mapper", type_name = %name, "model registered");

        Ok(model)
    }

    fn resolve_duplicate(
        &self,
        existing: Arc<EntityModel>,
        candidate: &Arc<EntityModel>,
    ) -> Arc<EntityModel> {
        if !Arc::ptr_eq(&existing, candidate) {
            self.metrics.record(MetricsEvent::DuplicateRegistration);
            warn!(
                domain = "mapper",
                type_name = existing.type_name(),
                "discarding duplicate model; another registration won"
            );
        }

        existing
    }

    fn index_collection(&self, collection: &str, model: &Arc<EntityModel>) {
        self.collections.rcu(|current| {
            let mut next = CollectionMap::clone(current);
            next.entry(collection.to_string())
                .or_default()
                .push(Arc::clone(model));
            Arc::new(next)
        });
    }

    /// Connect `model` to every registered direct parent and child.
    fn link_subtypes(&self, model: &Arc<EntityModel>) {
        let snapshot = self.models.load_full();

        for other in snapshot.values() {
            if Arc::ptr_eq(other, model) {
                continue;
            }
            if let Some(edge) = other.parent_edge_to(model) {
                Self::link(other, model, edge);
            }
            if let Some(edge) = model.parent_edge_to(other) {
                Self::link(model, other, edge);
            }
        }
    }

    fn link(parent: &Arc<EntityModel>, child: &Arc<EntityModel>, edge: ParentEdge) {
        if EntityModel::link(parent, child, edge) {
            debug!(
                domain = "mapper",
                parent = parent.type_name(),
                child = child.type_name(),
                ?edge,
                "subtype linked"
            );
        }
    }

    fn cached(&self, name: &str) -> Option<Arc<EntityModel>> {
        self.models.load().get(name).cloned()
    }

    // ------------------------------------------------------------------
    // Bulk mapping
    // ------------------------------------------------------------------

    /// Map every type; the first unmappable type fails the whole call.
    pub fn map<'a>(
        &self,
        types: impl IntoIterator<Item = &'a TypeRef>,
    ) -> Result<Vec<Arc<EntityModel>>, MappingError> {
        types.into_iter().map(|ty| self.get_model(ty)).collect()
    }

    /// Map every mappable type declared directly in `package`, skipping the
    /// rest. The package also becomes a discriminator search package.
    pub fn map_package(&self, package: &str) -> Result<Vec<Arc<EntityModel>>, MappingError> {
        self.add_search_package(package);

        let mut mapped = Vec::new();
        for ty in self.scanner.scan(package) {
            match self.try_get_model(&ty)? {
                Some(model) => mapped.push(model),
                None => debug!(domain = "mapper", type_name = ty.name(), "skipping unmappable type"),
            }
        }

        Ok(mapped)
    }

    /// Deep copy with fresh model identities and the same graph shape.
    #[must_use]
    pub fn copy(&self) -> Self {
        let metrics = Arc::new(RegistryMetrics::default());
        let source = self.models.load_full();

        let copies: ModelMap = source
            .iter()
            .map(|(name, model)| (name.clone(), Arc::new(model.detached_copy())))
            .collect();

        for (name, original) in source.iter() {
            let Some(parent) = copies.get(name) else {
                continue;
            };
            for child in original.subtypes() {
                let (Some(edge), Some(child_copy)) =
                    (original.parent_edge_to(&child), copies.get(child.type_name()))
                else {
                    continue;
                };
                EntityModel::link(parent, child_copy, edge);
            }
        }

        let collections: CollectionMap = self
            .collections
            .load()
            .iter()
            .map(|(collection, models)| {
                let models: Vec<_> = models
                    .iter()
                    .filter_map(|m| copies.get(m.type_name()).cloned())
                    .collect();
                (collection.clone(), models)
            })
            .collect();

        Self {
            options: Arc::clone(&self.options),
            loader: Arc::clone(&self.loader),
            scanner: Arc::clone(&self.scanner),
            models: ArcSwap::from_pointee(copies),
            collections: ArcSwap::from_pointee(collections),
            lookup: self.lookup.copy(Arc::clone(&metrics)),
            metrics,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Every registered model, ordered by type name.
    #[must_use]
    pub fn models(&self) -> Vec<Arc<EntityModel>> {
        let mut models: Vec<_> = self.models.load().values().cloned().collect();
        models.sort_by(|a, b| a.type_name().cmp(b.type_name()));

        models
    }

    /// Models stored in `collection`, in registration order.
    #[must_use]
    pub fn get_models_for_collection(&self, collection: &str) -> Vec<Arc<EntityModel>> {
        self.collections
            .load()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Direct subtypes of `ty`'s model.
    pub fn get_subtypes(&self, ty: &TypeRef) -> Result<Vec<Arc<EntityModel>>, MappingError> {
        Ok(self.get_model(ty)?.subtypes())
    }

    #[must_use]
    pub const fn discriminator_lookup(&self) -> &DiscriminatorLookup {
        &self.lookup
    }

    #[must_use]
    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    pub fn lookup_type(&self, discriminator: &str) -> Result<TypeRef, MappingError> {
        Ok(self.lookup.lookup(discriminator)?)
    }

    pub fn add_search_package(&self, package: &str) {
        self.lookup.add_package(package);
    }

    /// A fresh instantiator for `model` using its memoized strategy.
    pub fn new_instantiator(
        &self,
        model: &Arc<EntityModel>,
    ) -> Result<Box<dyn Instantiator>, MappingError> {
        Ok(model.instantiator()?)
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<String> = self.models.load().keys().cloned().collect();
        types.sort();

        f.debug_struct("Mapper")
            .field("options", &self.options)
            .field("models", &types)
            .field("lookup", &self.lookup)
            .finish_non_exhaustive()
    }
}
