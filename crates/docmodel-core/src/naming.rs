use convert_case::{Case, Casing};
use docmodel_config::NamingKind;
use std::{fmt, sync::Arc};

///
/// NamingStrategy
///
/// Pure string transform used to derive default collection and property
/// names. A missing input is the caller's concern: strategies always receive
/// a concrete name.
///

#[derive(Clone, Default)]
pub enum NamingStrategy {
    #[default]
    Identity,
    LowerCase,
    CamelCase,
    KebabCase,
    SnakeCase,
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl NamingStrategy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    #[must_use]
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Identity => name.to_string(),
            Self::LowerCase => name.to_lowercase(),
            Self::CamelCase => name.to_case(Case::Camel),
            Self::KebabCase => name.to_case(Case::Kebab),
            Self::SnakeCase => name.to_case(Case::Snake),
            Self::Custom(f) => f(name),
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::LowerCase => "lower_case",
            Self::CamelCase => "camel_case",
            Self::KebabCase => "kebab_case",
            Self::SnakeCase => "snake_case",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<NamingKind> for NamingStrategy {
    fn from(kind: NamingKind) -> Self {
        match kind {
            NamingKind::CamelCase => Self::CamelCase,
            NamingKind::Identity => Self::Identity,
            NamingKind::KebabCase => Self::KebabCase,
            NamingKind::LowerCase => Self::LowerCase,
            NamingKind::SnakeCase => Self::SnakeCase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn builtins_transform_type_names() {
        let name = "GoldenRetriever";

        assert_eq!(NamingStrategy::Identity.apply(name), "GoldenRetriever");
        assert_eq!(NamingStrategy::LowerCase.apply(name), "goldenretriever");
        assert_eq!(NamingStrategy::CamelCase.apply(name), "goldenRetriever");
        assert_eq!(NamingStrategy::KebabCase.apply(name), "golden-retriever");
        assert_eq!(NamingStrategy::SnakeCase.apply(name), "golden_retriever");
    }

    #[test]
    fn custom_strategy_is_called() {
        let strategy = NamingStrategy::custom(|name| format!("t_{name}"));

        assert_eq!(strategy.apply("Dog"), "t_Dog");
        assert_eq!(format!("{strategy:?}"), "custom");
    }

    proptest! {
        #[test]
        fn lower_case_output_has_no_uppercase(name in "[A-Za-z][A-Za-z0-9]{0,24}") {
            let out = NamingStrategy::LowerCase.apply(&name);
            prop_assert!(!out.chars().any(char::is_uppercase));
            prop_assert_eq!(out.len(), name.len());
        }

        #[test]
        fn identity_is_a_no_op(name in "\\PC{0,32}") {
            prop_assert_eq!(NamingStrategy::Identity.apply(&name), name);
        }

        #[test]
        fn snake_and_kebab_differ_only_by_separator(name in "[A-Z][a-z]{1,8}([A-Z][a-z]{1,8}){0,3}") {
            let snake = NamingStrategy::SnakeCase.apply(&name);
            let kebab = NamingStrategy::KebabCase.apply(&name);
            prop_assert_eq!(snake.replace('_', "-"), kebab);
        }
    }
}
