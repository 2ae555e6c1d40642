//! Runtime type descriptors.
//!
//! A `TypeDescriptor` is the registry's view of an application type: its
//! name, its direct parents, its mapping marker, and the property and
//! constructor hooks used to materialize instances. Descriptors are built
//! once (by hand, or by generated registration code) and never mutated.

mod loader;

pub use loader::*;

use crate::{PACKAGE_SEPARATOR, UNSET, value::Value};
use std::{any::Any, collections::BTreeSet, fmt, sync::Arc};

/// A materialized application object.
pub type Instance = Box<dyn Any + Send>;

/// Shared handle to a type descriptor.
pub type TypeRef = Arc<TypeDescriptor>;

/// Applies one decoded value to an instance.
pub type SetterFn = Arc<dyn Fn(&mut Instance, Value) -> Result<(), String> + Send + Sync>;

/// Builds an instance from positional arguments.
pub type ConstructorFn = Arc<dyn Fn(Vec<Value>) -> Result<Instance, String> + Send + Sync>;

///
/// TypeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeKind {
    Class,
    Abstract,
    Interface,
}

///
/// EntityMarker
/// Marks a top-level stored type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityMarker {
    pub collection: Option<String>,
    pub discriminator: String,
    pub discriminator_key: String,
    pub use_discriminator: bool,
}

impl EntityMarker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    #[must_use]
    pub fn discriminator(mut self, value: impl Into<String>) -> Self {
        self.discriminator = value.into();
        self
    }

    #[must_use]
    pub fn discriminator_key(mut self, key: impl Into<String>) -> Self {
        self.discriminator_key = key.into();
        self
    }

    #[must_use]
    pub const fn use_discriminator(mut self, enabled: bool) -> Self {
        self.use_discriminator = enabled;
        self
    }
}

impl Default for EntityMarker {
    fn default() -> Self {
        Self {
            collection: None,
            discriminator: UNSET.to_string(),
            discriminator_key: UNSET.to_string(),
            use_discriminator: true,
        }
    }
}

///
/// EmbeddedMarker
/// Marks a type stored inside another document.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmbeddedMarker {
    pub discriminator: String,
    pub discriminator_key: String,
    pub use_discriminator: bool,
}

impl EmbeddedMarker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn discriminator(mut self, value: impl Into<String>) -> Self {
        self.discriminator = value.into();
        self
    }

    #[must_use]
    pub fn discriminator_key(mut self, key: impl Into<String>) -> Self {
        self.discriminator_key = key.into();
        self
    }

    #[must_use]
    pub const fn use_discriminator(mut self, enabled: bool) -> Self {
        self.use_discriminator = enabled;
        self
    }
}

impl Default for EmbeddedMarker {
    fn default() -> Self {
        Self {
            discriminator: UNSET.to_string(),
            discriminator_key: UNSET.to_string(),
            use_discriminator: true,
        }
    }
}

///
/// TypeMarker
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TypeMarker {
    Entity(EntityMarker),
    Embedded(EmbeddedMarker),
}

impl TypeMarker {
    #[must_use]
    pub fn discriminator(&self) -> &str {
        match self {
            Self::Entity(m) => &m.discriminator,
            Self::Embedded(m) => &m.discriminator,
        }
    }

    #[must_use]
    pub fn discriminator_key(&self) -> &str {
        match self {
            Self::Entity(m) => &m.discriminator_key,
            Self::Embedded(m) => &m.discriminator_key,
        }
    }

    #[must_use]
    pub const fn use_discriminator(&self) -> bool {
        match self {
            Self::Entity(m) => m.use_discriminator,
            Self::Embedded(m) => m.use_discriminator,
        }
    }

    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        match self {
            Self::Entity(m) => m.collection.as_deref(),
            Self::Embedded(_) => None,
        }
    }

    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }
}

///
/// LifecycleEvent
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[remain::sorted]
pub enum LifecycleEvent {
    PostLoad,
    PostPersist,
    PreLoad,
    PrePersist,
}

///
/// PropertyDescriptor
///

#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    storage_name: Option<String>,
    is_id: bool,
    is_transient: bool,
    setter: Option<SetterFn>,
}

impl PropertyDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_name: None,
            is_id: false,
            is_transient: false,
            setter: None,
        }
    }

    /// Shorthand for an id property.
    #[must_use]
    pub fn id(name: impl Into<String>) -> Self {
        Self::new(name).as_id()
    }

    /// Store the property under an explicit document field name.
    #[must_use]
    pub fn storage_name(mut self, name: impl Into<String>) -> Self {
        self.storage_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn as_id(mut self) -> Self {
        self.is_id = true;
        self
    }

    #[must_use]
    pub const fn transient(mut self) -> Self {
        self.is_transient = true;
        self
    }

    #[must_use]
    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Instance, Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn explicit_storage_name(&self) -> Option<&str> {
        self.storage_name.as_deref()
    }

    #[must_use]
    pub const fn is_id(&self) -> bool {
        self.is_id
    }

    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.is_transient
    }

    #[must_use]
    pub const fn setter_fn(&self) -> Option<&SetterFn> {
        self.setter.as_ref()
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("storage_name", &self.storage_name)
            .field("is_id", &self.is_id)
            .field("is_transient", &self.is_transient)
            .field("has_setter", &self.setter.is_some())
            .finish()
    }
}

///
/// Visibility
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Visibility {
    Public,
    Private,
}

///
/// ConstructorDescriptor
///
/// Parameters are named after the mapped properties they receive.
///

#[derive(Clone)]
pub struct ConstructorDescriptor {
    params: Vec<String>,
    visibility: Visibility,
    synthesized: bool,
    invoke: ConstructorFn,
}

impl ConstructorDescriptor {
    /// Public constructor taking the named parameters in order.
    #[must_use]
    pub fn new<I, S, F>(params: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Vec<Value>) -> Result<Instance, String> + Send + Sync + 'static,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            visibility: Visibility::Public,
            synthesized: false,
            invoke: Arc::new(f),
        }
    }

    /// Public zero-argument constructor.
    #[must_use]
    pub fn no_arg<F>(f: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        Self::new(Vec::<String>::new(), move |_| Ok(f()))
    }

    #[must_use]
    pub const fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Mark as compiler/codegen generated rather than user declared.
    #[must_use]
    pub const fn synthesized(mut self) -> Self {
        self.synthesized = true;
        self
    }

    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    #[must_use]
    pub const fn is_public(&self) -> bool {
        matches!(self.visibility, Visibility::Public)
    }

    #[must_use]
    pub const fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    #[must_use]
    pub fn is_no_arg(&self) -> bool {
        self.params.is_empty()
    }

    pub fn invoke(&self, args: Vec<Value>) -> Result<Instance, String> {
        (self.invoke)(args)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .field("synthesized", &self.synthesized)
            .finish_non_exhaustive()
    }
}

///
/// TypeDescriptor
///

#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    superclass: Option<String>,
    interfaces: Vec<String>,
    marker: Option<TypeMarker>,
    properties: Vec<PropertyDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
    lifecycle: BTreeSet<LifecycleEvent>,
}

impl TypeDescriptor {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            marker: None,
            properties: Vec::new(),
            constructors: Vec::new(),
            lifecycle: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    #[must_use]
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Abstract)
    }

    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    #[must_use]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn entity(mut self, marker: EntityMarker) -> Self {
        self.marker = Some(TypeMarker::Entity(marker));
        self
    }

    #[must_use]
    pub fn embedded(mut self, marker: EmbeddedMarker) -> Self {
        self.marker = Some(TypeMarker::Embedded(marker));
        self
    }

    #[must_use]
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    #[must_use]
    pub fn lifecycle(mut self, event: LifecycleEvent) -> Self {
        self.lifecycle.insert(event);
        self
    }

    /// Freeze into a shared handle.
    #[must_use]
    pub fn build(self) -> TypeRef {
        Arc::new(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of the qualified name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit_once(PACKAGE_SEPARATOR)
            .map_or(self.name.as_str(), |(_, simple)| simple)
    }

    /// Everything before the last segment; empty for the root package.
    #[must_use]
    pub fn package(&self) -> &str {
        self.name
            .rsplit_once(PACKAGE_SEPARATOR)
            .map_or("", |(package, _)| package)
    }

    #[must_use]
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    #[must_use]
    pub const fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface)
    }

    #[must_use]
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    #[must_use]
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    #[must_use]
    pub const fn marker(&self) -> Option<&TypeMarker> {
        self.marker.as_ref()
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    #[must_use]
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    #[must_use]
    pub const fn lifecycle_events(&self) -> &BTreeSet<LifecycleEvent> {
        &self.lifecycle
    }

    /// Direct parent names: superclass first, then interfaces in
    /// declaration order.
    pub fn parent_names(&self) -> impl Iterator<Item = &str> {
        self.superclass
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name_and_package_split_on_last_separator() {
        let ty = TypeDescriptor::class("com.example.zoo.Dog");

        assert_eq!(ty.simple_name(), "Dog");
        assert_eq!(ty.package(), "com.example.zoo");
    }

    #[test]
    fn root_package_type_has_empty_package() {
        let ty = TypeDescriptor::class("Dog");

        assert_eq!(ty.simple_name(), "Dog");
        assert_eq!(ty.package(), "");
    }

    #[test]
    fn markers_default_to_unset_sentinel() {
        let marker = EntityMarker::new();

        assert_eq!(marker.discriminator, UNSET);
        assert_eq!(marker.discriminator_key, UNSET);
        assert!(marker.use_discriminator);
        assert!(marker.collection.is_none());
    }

    #[test]
    fn parent_names_lists_superclass_first() {
        let ty = TypeDescriptor::class("a.C")
            .implements("a.I")
            .extends("a.B")
            .implements("a.J");

        assert_eq!(ty.parent_names().collect::<Vec<_>>(), vec!["a.B", "a.I", "a.J"]);
    }

    #[test]
    fn no_arg_constructor_ignores_arguments() {
        let ctor = ConstructorDescriptor::no_arg(|| Box::new(7_u8));
        let instance = ctor.invoke(Vec::new()).expect("no-arg invoke");

        assert!(ctor.is_no_arg());
        assert_eq!(instance.downcast_ref::<u8>(), Some(&7));
    }
}
