use crate::{PACKAGE_SEPARATOR, types::TypeRef};
use parking_lot::RwLock;
use std::{collections::BTreeMap, sync::Arc};

///
/// TypeLoader
/// Resolves a fully-qualified type name to a loaded type.
///

pub trait TypeLoader: Send + Sync {
    fn load(&self, name: &str) -> Option<TypeRef>;
}

///
/// PackageScanner
/// Yields the candidate types declared directly in one package.
///

pub trait PackageScanner: Send + Sync {
    fn scan(&self, package: &str) -> Vec<TypeRef>;
}

///
/// TypeCatalog
///
/// In-memory type universe. Acts as both loader and scanner, so generated
/// registration code only has to insert descriptors here.
///

#[derive(Debug, Default)]
pub struct TypeCatalog {
    types: RwLock<BTreeMap<String, TypeRef>>,
}

impl TypeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog pre-loaded with `types`.
    #[must_use]
    pub fn with_types(types: impl IntoIterator<Item = TypeRef>) -> Arc<Self> {
        let catalog = Self::new();
        for ty in types {
            catalog.insert(ty);
        }

        Arc::new(catalog)
    }

    /// Add a type, returning the descriptor it replaced if any.
    pub fn insert(&self, ty: TypeRef) -> Option<TypeRef> {
        self.types.write().insert(ty.name().to_string(), ty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl TypeLoader for TypeCatalog {
    fn load(&self, name: &str) -> Option<TypeRef> {
        self.types.read().get(name).cloned()
    }
}

impl PackageScanner for TypeCatalog {
    fn scan(&self, package: &str) -> Vec<TypeRef> {
        let prefix = format!("{package}{PACKAGE_SEPARATOR}");

        self.types
            .read()
            .range(prefix.clone()..)
            .take_while(|(name, _)| name.starts_with(&prefix))
            .filter(|(_, ty)| ty.package() == package)
            .map(|(_, ty)| Arc::clone(ty))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeDescriptor;

    fn catalog() -> Arc<TypeCatalog> {
        TypeCatalog::with_types([
            TypeDescriptor::class("com.example.zoo.Dog").build(),
            TypeDescriptor::class("com.example.zoo.Cat").build(),
            TypeDescriptor::class("com.example.zoo.keeper.Keeper").build(),
            TypeDescriptor::class("com.example.zookeeper.Other").build(),
        ])
    }

    #[test]
    fn load_resolves_by_qualified_name() {
        let catalog = catalog();

        assert!(catalog.load("com.example.zoo.Dog").is_some());
        assert!(catalog.load("Dog").is_none());
    }

    #[test]
    fn scan_only_returns_direct_package_members() {
        let names: Vec<String> = catalog()
            .scan("com.example.zoo")
            .iter()
            .map(|ty| ty.name().to_string())
            .collect();

        assert_eq!(names, vec!["com.example.zoo.Cat", "com.example.zoo.Dog"]);
    }

    #[test]
    fn insert_replaces_existing_descriptor() {
        let catalog = catalog();
        let previous = catalog.insert(TypeDescriptor::interface("com.example.zoo.Dog").build());

        assert!(previous.is_some_and(|ty| !ty.is_interface()));
        assert_eq!(catalog.len(), 4);
    }
}
