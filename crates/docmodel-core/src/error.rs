use crate::{discriminator::DiscriminatorError, instance::InstantiationError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// MappingError
///
/// Every failure the registry core can raise. None of these are transient;
/// callers are expected to surface them, not retry.
///

#[derive(Debug, ThisError)]
pub enum MappingError {
    #[error("type '{type_name}' is not mappable: no entity or embedded marker on it or its ancestors")]
    NotMappable { type_name: String },

    #[error(transparent)]
    Discriminator(#[from] DiscriminatorError),

    #[error(transparent)]
    Instantiation(#[from] InstantiationError),

    #[error("mapper options are locked and can no longer be changed")]
    ConfigurationLocked,

    #[error("invalid model for '{type_name}': {}", .errors.join("; "))]
    Validation {
        type_name: String,
        errors: Vec<String>,
    },

    #[error("decode failed: {message}")]
    Decode { message: String },
}

impl MappingError {
    pub(crate) fn not_mappable(type_name: impl Into<String>) -> Self {
        Self::NotMappable {
            type_name: type_name.into(),
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotMappable { .. } => ErrorClass::NotMappable,
            Self::Discriminator(err) => err.class(),
            Self::Instantiation(err) => err.class(),
            Self::ConfigurationLocked => ErrorClass::Locked,
            Self::Validation { .. } => ErrorClass::InvariantViolation,
            Self::Decode { .. } => ErrorClass::Internal,
        }
    }

    #[must_use]
    pub const fn is_not_mappable(&self) -> bool {
        matches!(self, Self::NotMappable { .. })
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

///
/// ErrorClass
/// Stable error taxonomy for classification and metrics.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotMappable,
    Conflict,
    NotFound,
    Unsupported,
    Locked,
    InvariantViolation,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotMappable => "not_mappable",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
            Self::Locked => "locked",
            Self::InvariantViolation => "invariant_violation",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}
