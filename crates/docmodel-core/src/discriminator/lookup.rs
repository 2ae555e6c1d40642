use crate::{
    PACKAGE_SEPARATOR,
    error::ErrorClass,
    model::EntityModel,
    obs::{LookupTier, MetricsEvent, RegistryMetrics},
    types::{TypeLoader, TypeRef},
};
use arc_swap::ArcSwap;
use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    sync::Arc,
};
use thiserror::Error as ThisError;
use tracing::{debug, trace};

///
/// DiscriminatorError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DiscriminatorError {
    #[error(
        "duplicate discriminator '{discriminator}': already mapped to '{existing}', cannot also map '{incoming}'"
    )]
    Duplicate {
        discriminator: String,
        existing: String,
        incoming: String,
    },

    #[error("no class found for discriminator '{discriminator}'")]
    NotFound { discriminator: String },
}

impl DiscriminatorError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Duplicate { .. } => ErrorClass::Conflict,
            Self::NotFound { .. } => ErrorClass::NotFound,
        }
    }
}

///
/// DiscriminatorLookup
///
/// Discriminator → qualified type name index plus the fallback search
/// packages. Both are published as whole snapshots, so readers never see a
/// half-written entry.
///

pub struct DiscriminatorLookup {
    loader: Arc<dyn TypeLoader>,
    index: ArcSwap<HashMap<String, String>>,
    packages: ArcSwap<BTreeSet<String>>,
    metrics: Arc<RegistryMetrics>,
}

impl DiscriminatorLookup {
    #[must_use]
    pub fn new(loader: Arc<dyn TypeLoader>, metrics: Arc<RegistryMetrics>) -> Self {
        Self {
            loader,
            index: ArcSwap::from_pointee(HashMap::new()),
            packages: ArcSwap::from_pointee(BTreeSet::new()),
            metrics,
        }
    }

    /// Index `model`'s discriminator. Re-adding the same pair is a no-op.
    pub fn add_model(&self, model: &EntityModel) -> Result<(), DiscriminatorError> {
        self.add(model.discriminator(), model.type_name())
    }

    pub(crate) fn add(&self, discriminator: &str, type_name: &str) -> Result<(), DiscriminatorError> {
        let mut existing = None;

        self.index.rcu(|current| {
            existing = current.get(discriminator).cloned();

            if existing.is_some() {
                Arc::clone(current)
            } else {
                let mut next = HashMap::clone(current);
                next.insert(discriminator.to_string(), type_name.to_string());
                Arc::new(next)
            }
        });

        match existing {
            Some(existing) if existing != type_name => Err(DiscriminatorError::Duplicate {
                discriminator: discriminator.to_string(),
                existing,
                incoming: type_name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Register a fallback package for unqualified discriminators.
    pub fn add_package(&self, package: &str) {
        let mut added = false;

        self.packages.rcu(|current| {
            added = !current.contains(package);

            if added {
                let mut next = BTreeSet::clone(current);
                next.insert(package.to_string());
                Arc::new(next)
            } else {
                Arc::clone(current)
            }
        });

        if added {
            debug!(domain = "discriminator", package, "search package added");
        }
    }

    /// Resolve a discriminator to a loaded type.
    ///
    /// Tiers, first hit wins:
    /// 1. the discriminator index,
    /// 2. the value as a qualified type name,
    /// 3. `package.value` for each search package in lexicographic order.
    pub fn lookup(&self, discriminator: &str) -> Result<TypeRef, DiscriminatorError> {
        if let Some(ty) = self
            .get(discriminator)
            .and_then(|name| self.loader.load(&name))
        {
            return Ok(self.hit(LookupTier::Indexed, discriminator, ty));
        }

        if let Some(ty) = self.loader.load(discriminator) {
            return Ok(self.hit(LookupTier::QualifiedName, discriminator, ty));
        }

        let packages = self.packages.load();
        for package in packages.iter() {
            let candidate = format!("{package}{PACKAGE_SEPARATOR}{discriminator}");
            if let Some(ty) = self.loader.load(&candidate) {
                return Ok(self.hit(LookupTier::SearchPackage, discriminator, ty));
            }
        }

        self.metrics.record(MetricsEvent::LookupMiss);

        Err(DiscriminatorError::NotFound {
            discriminator: discriminator.to_string(),
        })
    }

    fn hit(&self, tier: LookupTier, discriminator: &str, ty: TypeRef) -> TypeRef {
        self.metrics.record(MetricsEvent::Lookup(tier));
        trace!(
            domain = "discriminator",
            discriminator,
            type_name = ty.name(),
            ?tier,
            "discriminator resolved"
        );

        ty
    }

    /// Indexed type name for `discriminator`, without fallback resolution.
    #[must_use]
    pub fn get(&self, discriminator: &str) -> Option<String> {
        self.index.load().get(discriminator).cloned()
    }

    #[must_use]
    pub fn packages(&self) -> Vec<String> {
        self.packages.load().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.load().is_empty()
    }

    /// Independent copy reporting into `metrics`.
    pub(crate) fn copy(&self, metrics: Arc<RegistryMetrics>) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            index: ArcSwap::from_pointee(HashMap::clone(&self.index.load())),
            packages: ArcSwap::from_pointee(BTreeSet::clone(&self.packages.load())),
            metrics,
        }
    }
}

impl fmt::Debug for DiscriminatorLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscriminatorLookup")
            .field("index", &self.index.load_full())
            .field("packages", &self.packages.load_full())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeCatalog, TypeDescriptor};

    fn lookup() -> DiscriminatorLookup {
        let catalog = TypeCatalog::with_types([
            TypeDescriptor::class("com.example.Foo").build(),
            TypeDescriptor::class("com.example.zoo.Dog").build(),
            TypeDescriptor::class("com.other.Dog").build(),
        ]);

        DiscriminatorLookup::new(catalog, Arc::new(RegistryMetrics::default()))
    }

    #[test]
    fn indexed_discriminator_resolves_first() {
        let lookup = lookup();
        lookup.add("canine", "com.example.zoo.Dog").expect("add");

        let ty = lookup.lookup("canine").expect("indexed lookup");
        assert_eq!(ty.name(), "com.example.zoo.Dog");
        assert_eq!(lookup.metrics.snapshot().lookup_indexed, 1);
    }

    #[test]
    fn qualified_name_resolves_without_index_entry() {
        let lookup = lookup();

        let ty = lookup.lookup("com.example.Foo").expect("qualified lookup");
        assert_eq!(ty.name(), "com.example.Foo");
        assert!(lookup.is_empty(), "fallback hits are not written back");
    }

    #[test]
    fn search_packages_are_tried_in_lexicographic_order() {
        let lookup = lookup();
        lookup.add_package("com.other");
        lookup.add_package("com.example.zoo");

        let ty = lookup.lookup("Dog").expect("package lookup");
        assert_eq!(ty.name(), "com.example.zoo.Dog");
        assert_eq!(lookup.packages(), vec!["com.example.zoo", "com.other"]);
    }

    #[test]
    fn unresolvable_discriminator_names_the_value() {
        let lookup = lookup();
        lookup.add_package("com.example");

        let err = lookup.lookup("doesnotexist").expect_err("should miss");
        assert_eq!(
            err,
            DiscriminatorError::NotFound {
                discriminator: "doesnotexist".to_string()
            }
        );
        assert!(err.to_string().contains("doesnotexist"));
        assert_eq!(lookup.metrics.snapshot().lookup_misses, 1);
    }

    #[test]
    fn colliding_discriminator_reports_both_types() {
        let lookup = lookup();
        lookup.add("Dog", "com.example.zoo.Dog").expect("first add");

        let err = lookup
            .add("Dog", "com.other.Dog")
            .expect_err("second type must collide");
        let message = err.to_string();
        assert!(message.contains("com.example.zoo.Dog"));
        assert!(message.contains("com.other.Dog"));
        assert_eq!(lookup.get("Dog").as_deref(), Some("com.example.zoo.Dog"));
    }

    #[test]
    fn re_adding_same_pair_is_accepted() {
        let lookup = lookup();
        lookup.add("Dog", "com.example.zoo.Dog").expect("first add");
        lookup.add("Dog", "com.example.zoo.Dog").expect("same pair again");

        assert_eq!(lookup.len(), 1);
    }

    #[test]
    fn stale_index_entry_falls_through_to_later_tiers() {
        let lookup = lookup();
        lookup.add("com.example.Foo", "com.example.Gone").expect("add");

        let ty = lookup.lookup("com.example.Foo").expect("tier two fallback");
        assert_eq!(ty.name(), "com.example.Foo");
    }

    #[test]
    fn concurrent_adds_and_lookups_do_not_lose_entries() {
        let lookup = lookup();

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let lookup = &lookup;
                scope.spawn(move || {
                    for i in 0..50 {
                        let discriminator = format!("d{worker}_{i}");
                        lookup
                            .add(&discriminator, "com.example.Foo")
                            .expect("distinct discriminators never collide");
                        assert!(lookup.get(&discriminator).is_some());
                    }
                });
            }
        });

        assert_eq!(lookup.len(), 200);
    }
}
