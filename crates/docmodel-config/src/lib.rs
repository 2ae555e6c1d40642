//! File-backed configuration for the docmodel mapper.
//!
//! This crate only knows the on-disk shape. Turning a [`MapperConfig`] into
//! live mapper options happens in `docmodel-core`.

use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error as ThisError;

/// Default document field carrying the discriminator.
pub const DEFAULT_DISCRIMINATOR_KEY: &str = "_t";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mapper config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// ConfigFile
/// Top-level TOML document.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub mapper: MapperConfig,
}

///
/// MapperConfig
///
/// The `[mapper]` table. Every field is optional and falls back to the
/// mapper's built-in default.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    pub discriminator_key: String,
    pub discriminator: DiscriminatorKind,
    pub collection_naming: NamingKind,
    pub property_naming: NamingKind,
    pub packages: Vec<String>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            discriminator_key: DEFAULT_DISCRIMINATOR_KEY.to_string(),
            discriminator: DiscriminatorKind::default(),
            collection_naming: NamingKind::CamelCase,
            property_naming: NamingKind::Identity,
            packages: Vec::new(),
        }
    }
}

///
/// DiscriminatorKind
/// Built-in discriminator functions selectable from config.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
#[remain::sorted]
pub enum DiscriminatorKind {
    ClassName,
    LowerClassName,
    LowerSimpleName,
    #[default]
    SimpleName,
}

///
/// NamingKind
/// Built-in naming strategies selectable from config.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
#[remain::sorted]
pub enum NamingKind {
    CamelCase,
    #[default]
    Identity,
    KebabCase,
    LowerCase,
    SnakeCase,
}

/// Parse a config document from TOML text.
pub fn from_toml_str(text: &str) -> Result<MapperConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(text)?;

    Ok(file.mapper)
}

/// Read and parse a config file.
pub fn load(path: impl AsRef<Path>) -> Result<MapperConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    from_toml_str(&text)
}
