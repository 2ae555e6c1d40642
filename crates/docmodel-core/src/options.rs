use crate::{
    discriminator::DiscriminatorFunction,
    error::MappingError,
    model::{Convention, MarkerDefaults, PropertyDiscovery},
    naming::NamingStrategy,
};
use docmodel_config::{DEFAULT_DISCRIMINATOR_KEY, MapperConfig};
use std::{fmt, sync::Arc};

/// Conventions every mapper runs before any user-supplied ones.
const BUILTIN_CONVENTIONS: [&dyn Convention; 2] = [&MarkerDefaults, &PropertyDiscovery];

///
/// MapperOptions
///
/// Immutable mapper configuration. Produced by `MapperOptionsBuilder` and
/// shared by every model the mapper builds.
///

#[derive(Clone)]
pub struct MapperOptions {
    discriminator_key: String,
    discriminator: DiscriminatorFunction,
    collection_naming: NamingStrategy,
    property_naming: NamingStrategy,
    packages: Vec<String>,
    conventions: Vec<Arc<dyn Convention>>,
}

impl MapperOptions {
    #[must_use]
    pub fn builder() -> MapperOptionsBuilder {
        MapperOptionsBuilder::default()
    }

    /// Options from a parsed config file.
    pub fn from_config(config: &MapperConfig) -> Result<Self, MappingError> {
        let mut builder = Self::builder();
        builder
            .discriminator_key(config.discriminator_key.clone())?
            .discriminator(config.discriminator.into())?
            .collection_naming(config.collection_naming.into())?
            .property_naming(config.property_naming.into())?;
        for package in &config.packages {
            builder.package(package.clone())?;
        }

        Ok(builder.build())
    }

    #[must_use]
    pub fn discriminator_key(&self) -> &str {
        &self.discriminator_key
    }

    #[must_use]
    pub const fn discriminator(&self) -> &DiscriminatorFunction {
        &self.discriminator
    }

    #[must_use]
    pub const fn collection_naming(&self) -> &NamingStrategy {
        &self.collection_naming
    }

    #[must_use]
    pub const fn property_naming(&self) -> &NamingStrategy {
        &self.property_naming
    }

    /// Search packages registered with the discriminator lookup at startup.
    #[must_use]
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// The full convention pipeline: built-ins, then user stages.
    pub fn conventions(&self) -> impl Iterator<Item = &dyn Convention> {
        BUILTIN_CONVENTIONS
            .into_iter()
            .chain(self.conventions.iter().map(|c| &**c))
    }
}

impl Default for MapperOptions {
    fn default() -> Self {
        Self {
            discriminator_key: DEFAULT_DISCRIMINATOR_KEY.to_string(),
            discriminator: DiscriminatorFunction::SimpleName,
            collection_naming: NamingStrategy::CamelCase,
            property_naming: NamingStrategy::Identity,
            packages: Vec::new(),
            conventions: Vec::new(),
        }
    }
}

impl fmt::Debug for MapperOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperOptions")
            .field("discriminator_key", &self.discriminator_key)
            .field("discriminator", &self.discriminator)
            .field("collection_naming", &self.collection_naming)
            .field("property_naming", &self.property_naming)
            .field("packages", &self.packages)
            .field("conventions", &self.conventions.len())
            .finish()
    }
}

///
/// MapperOptionsBuilder
///
/// Setters fail with `ConfigurationLocked` once `build` has been called.
///

#[derive(Debug, Default)]
pub struct MapperOptionsBuilder {
    options: MapperOptions,
    locked: bool,
}

impl MapperOptionsBuilder {
    const fn ensure_unlocked(&self) -> Result<(), MappingError> {
        if self.locked {
            Err(MappingError::ConfigurationLocked)
        } else {
            Ok(())
        }
    }

    pub fn discriminator_key(&mut self, key: impl Into<String>) -> Result<&mut Self, MappingError> {
        self.ensure_unlocked()?;
        self.options.discriminator_key = key.into();

        Ok(self)
    }

    pub fn discriminator(
        &mut self,
        function: DiscriminatorFunction,
    ) -> Result<&mut Self, MappingError> {
        self.ensure_unlocked()?;
        self.options.discriminator = function;

        Ok(self)
    }

    pub fn collection_naming(
        &mut self,
        strategy: NamingStrategy,
    ) -> Result<&mut Self, MappingError> {
        self.ensure_unlocked()?;
        self.options.collection_naming = strategy;

        Ok(self)
    }

    pub fn property_naming(&mut self, strategy: NamingStrategy) -> Result<&mut Self, MappingError> {
        self.ensure_unlocked()?;
        self.options.property_naming = strategy;

        Ok(self)
    }

    pub fn package(&mut self, package: impl Into<String>) -> Result<&mut Self, MappingError> {
        self.ensure_unlocked()?;
        self.options.packages.push(package.into());

        Ok(self)
    }

    pub fn convention(
        &mut self,
        convention: impl Convention + 'static,
    ) -> Result<&mut Self, MappingError> {
        self.ensure_unlocked()?;
        self.options.conventions.push(Arc::new(convention));

        Ok(self)
    }

    /// Finalize. The builder stays locked afterwards.
    pub fn build(&mut self) -> MapperOptions {
        self.locked = true;
        self.options.clone()
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }
}
