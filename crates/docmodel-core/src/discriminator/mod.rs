mod lookup;

pub use lookup::*;

use crate::{UNSET, types::TypeDescriptor};
use docmodel_config::DiscriminatorKind;
use std::{fmt, sync::Arc};

///
/// DiscriminatorFunction
///
/// Derives the default discriminator for a type. Only consulted when the
/// configured value is the `UNSET` sentinel; an explicit value always wins.
///

#[derive(Clone, Default)]
pub enum DiscriminatorFunction {
    ClassName,
    LowerClassName,
    #[default]
    SimpleName,
    LowerSimpleName,
    Custom(Arc<dyn Fn(&TypeDescriptor) -> String + Send + Sync>),
}

impl DiscriminatorFunction {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Resolve the discriminator for `ty` given its configured value.
    #[must_use]
    pub fn apply(&self, ty: &TypeDescriptor, configured: &str) -> String {
        if configured == UNSET {
            self.compute(ty)
        } else {
            configured.to_string()
        }
    }

    #[must_use]
    pub fn compute(&self, ty: &TypeDescriptor) -> String {
        match self {
            Self::ClassName => ty.name().to_string(),
            Self::LowerClassName => ty.name().to_lowercase(),
            Self::SimpleName => ty.simple_name().to_string(),
            Self::LowerSimpleName => ty.simple_name().to_lowercase(),
            Self::Custom(f) => f(ty),
        }
    }
}

impl fmt::Debug for DiscriminatorFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ClassName => "class_name",
            Self::LowerClassName => "lower_class_name",
            Self::SimpleName => "simple_name",
            Self::LowerSimpleName => "lower_simple_name",
            Self::Custom(_) => "custom",
        };

        f.write_str(label)
    }
}

impl From<DiscriminatorKind> for DiscriminatorFunction {
    fn from(kind: DiscriminatorKind) -> Self {
        match kind {
            DiscriminatorKind::ClassName => Self::ClassName,
            DiscriminatorKind::LowerClassName => Self::LowerClassName,
            DiscriminatorKind::LowerSimpleName => Self::LowerSimpleName,
            DiscriminatorKind::SimpleName => Self::SimpleName,
        }
    }
}
