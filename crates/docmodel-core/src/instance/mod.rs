//! Instance creation.
//!
//! Each model selects one `InstantiationStrategy` the first time it is asked
//! and keeps it. Instantiators are cheap per-document objects created from
//! that strategy.

mod creator;

pub use creator::*;

use crate::{
    error::ErrorClass,
    model::EntityModel,
    types::{ConstructorDescriptor, Instance, TypeKind},
    value::Value,
};
use std::{collections::BTreeSet, sync::Arc};
use thiserror::Error as ThisError;

///
/// InstantiationError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum InstantiationError {
    #[error("no suitable constructor found for '{type_name}'")]
    NoSuitableConstructor { type_name: String },

    #[error("'{type_name}' was already constructed; cannot set property '{property}'")]
    AlreadyConstructed { type_name: String, property: String },

    #[error("'{type_name}' has no mapped property '{property}'")]
    UnknownProperty { type_name: String, property: String },

    #[error("property '{property}' on '{type_name}' has no setter")]
    MissingSetter { type_name: String, property: String },

    #[error("failed to materialize '{type_name}': {message}")]
    Invoke { type_name: String, message: String },
}

impl InstantiationError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::NoSuitableConstructor { .. } => ErrorClass::Unsupported,
            _ => ErrorClass::Internal,
        }
    }

    pub(crate) fn invoke(type_name: &str, message: impl Into<String>) -> Self {
        Self::Invoke {
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }
}

///
/// StrategyKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StrategyKind {
    /// Public constructor receiving every mapped property.
    ConstructorInjection,
    /// Zero-argument constructor, then one setter call per property.
    NoArgPopulate,
    /// Constructor over all properties in declaration order, any visibility.
    FullConstructor,
}

///
/// InstantiationStrategy
///

#[derive(Clone, Debug)]
pub struct InstantiationStrategy {
    kind: StrategyKind,
    constructor: ConstructorDescriptor,
}

impl InstantiationStrategy {
    /// Pick the strategy for `model`.
    ///
    /// Order: matching public constructor, zero-argument constructor, full
    /// declaration-order constructor. Interfaces and abstract types have no
    /// strategy at all.
    pub fn select(model: &EntityModel) -> Result<Self, InstantiationError> {
        let ty = model.type_ref();
        let no_strategy = || InstantiationError::NoSuitableConstructor {
            type_name: ty.name().to_string(),
        };

        if ty.kind() != TypeKind::Class {
            return Err(no_strategy());
        }

        let declared: Vec<&str> = model.properties().iter().map(|p| p.name()).collect();
        let property_set: BTreeSet<&str> = declared.iter().copied().collect();
        let constructors = ty.constructors();

        let matching = constructors.iter().find(|c| {
            c.is_public()
                && !c.is_synthesized()
                && !property_set.is_empty()
                && c.params().len() == property_set.len()
                && c.params()
                    .iter()
                    .map(String::as_str)
                    .collect::<BTreeSet<_>>()
                    == property_set
        });
        if let Some(constructor) = matching {
            return Ok(Self::new(StrategyKind::ConstructorInjection, constructor));
        }

        if let Some(constructor) = constructors.iter().find(|c| c.is_no_arg()) {
            return Ok(Self::new(StrategyKind::NoArgPopulate, constructor));
        }

        let full = constructors
            .iter()
            .find(|c| c.params().iter().map(String::as_str).eq(declared.iter().copied()));
        if let Some(constructor) = full {
            return Ok(Self::new(StrategyKind::FullConstructor, constructor));
        }

        Err(no_strategy())
    }

    fn new(kind: StrategyKind, constructor: &ConstructorDescriptor) -> Self {
        Self {
            kind,
            constructor: constructor.clone(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        self.kind
    }

    #[must_use]
    pub const fn constructor(&self) -> &ConstructorDescriptor {
        &self.constructor
    }

    /// A fresh instantiator for one document.
    pub fn instantiator(
        &self,
        model: Arc<EntityModel>,
    ) -> Result<Box<dyn Instantiator>, InstantiationError> {
        match self.kind {
            StrategyKind::ConstructorInjection | StrategyKind::FullConstructor => Ok(Box::new(
                ConstructorInstantiator::new(model, self.kind, self.constructor.clone()),
            )),
            StrategyKind::NoArgPopulate => {
                let instance = self
                    .constructor
                    .invoke(Vec::new())
                    .map_err(|message| InstantiationError::invoke(model.type_name(), message))?;

                Ok(Box::new(PopulatingInstantiator::new(model, instance)))
            }
        }
    }
}

///
/// Instantiator
///
/// Uniform per-document contract over every strategy: apply decoded values
/// one at a time, then take the instance.
///

pub trait Instantiator: Send {
    fn strategy(&self) -> StrategyKind;

    /// Apply one decoded value to the property named `property`.
    fn set(&mut self, property: &str, value: Value) -> Result<(), InstantiationError>;

    /// The working instance. Constructor-based strategies construct on the
    /// first call; later `set` calls then fail.
    fn instance(&mut self) -> Result<&mut Instance, InstantiationError>;

    fn into_instance(self: Box<Self>) -> Result<Instance, InstantiationError>;
}
