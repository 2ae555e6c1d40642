//! Core runtime for docmodel: type descriptors, entity models, discriminator
//! resolution, instance creation, and the `Mapper` registry that ties them
//! together.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod decode;
pub mod discriminator;
pub mod error;
pub mod instance;
pub mod mapper;
pub mod model;
pub mod naming;
pub mod obs;
pub mod options;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Reserved sentinel meaning "not configured, derive the default".
///
/// Marker discriminators and discriminator keys carry this value until a
/// user sets them explicitly.
pub const UNSET: &str = ".";

/// Separator between package segments in fully-qualified type names.
pub const PACKAGE_SEPARATOR: char = '.';

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, metrics, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        decode::EntityDecoder,
        discriminator::{DiscriminatorFunction, DiscriminatorLookup},
        instance::{InstantiationStrategy, Instantiator},
        mapper::Mapper,
        model::{EntityModel, PropertyModel},
        naming::NamingStrategy,
        options::MapperOptions,
        types::{
            ConstructorDescriptor, EmbeddedMarker, EntityMarker, Instance, LifecycleEvent,
            PropertyDescriptor, TypeCatalog, TypeDescriptor, TypeKind, TypeRef,
        },
        value::{Document, Value},
    };
}
