use crate::{
    instance::{InstantiationError, Instantiator, StrategyKind},
    model::EntityModel,
    types::{ConstructorDescriptor, Instance},
    value::Value,
};
use std::sync::Arc;

///
/// ConstructorInstantiator
///
/// Buffers values into constructor argument slots and invokes the
/// constructor on the first `instance` call. Unset slots are passed as
/// `Value::Null`.
///

pub struct ConstructorInstantiator {
    model: Arc<EntityModel>,
    kind: StrategyKind,
    constructor: ConstructorDescriptor,
    args: Vec<Option<Value>>,
    built: Option<Instance>,
}

impl ConstructorInstantiator {
    pub(crate) fn new(
        model: Arc<EntityModel>,
        kind: StrategyKind,
        constructor: ConstructorDescriptor,
    ) -> Self {
        let args = vec![None; constructor.params().len()];

        Self {
            model,
            kind,
            constructor,
            args,
            built: None,
        }
    }

    fn construct(&self) -> Result<Instance, InstantiationError> {
        // slots stay filled so a failed invocation can be retried
        let args = self
            .args
            .iter()
            .map(|slot| slot.clone().unwrap_or_default())
            .collect();

        self.constructor
            .invoke(args)
            .map_err(|message| InstantiationError::invoke(self.model.type_name(), message))
    }
}

impl Instantiator for ConstructorInstantiator {
    fn strategy(&self) -> StrategyKind {
        self.kind
    }

    fn set(&mut self, property: &str, value: Value) -> Result<(), InstantiationError> {
        if self.built.is_some() {
            return Err(InstantiationError::AlreadyConstructed {
                type_name: self.model.type_name().to_string(),
                property: property.to_string(),
            });
        }

        let slot = self
            .model
            .property(property)
            .and_then(|p| self.constructor.params().iter().position(|n| n == p.name()))
            .ok_or_else(|| InstantiationError::UnknownProperty {
                type_name: self.model.type_name().to_string(),
                property: property.to_string(),
            })?;
        self.args[slot] = Some(value);

        Ok(())
    }

    fn instance(&mut self) -> Result<&mut Instance, InstantiationError> {
        let instance = match self.built.take() {
            Some(instance) => instance,
            None => self.construct()?,
        };

        Ok(self.built.insert(instance))
    }

    fn into_instance(mut self: Box<Self>) -> Result<Instance, InstantiationError> {
        match self.built.take() {
            Some(instance) => Ok(instance),
            None => self.construct(),
        }
    }
}

///
/// PopulatingInstantiator
///
/// Holds an instance built by a zero-argument constructor and applies each
/// value through the property's setter.
///

pub struct PopulatingInstantiator {
    model: Arc<EntityModel>,
    instance: Instance,
}

impl PopulatingInstantiator {
    pub(crate) fn new(model: Arc<EntityModel>, instance: Instance) -> Self {
        Self { model, instance }
    }
}

impl Instantiator for PopulatingInstantiator {
    fn strategy(&self) -> StrategyKind {
        StrategyKind::NoArgPopulate
    }

    fn set(&mut self, property: &str, value: Value) -> Result<(), InstantiationError> {
        let type_name = self.model.type_name();
        let mapped = self
            .model
            .property(property)
            .ok_or_else(|| InstantiationError::UnknownProperty {
                type_name: type_name.to_string(),
                property: property.to_string(),
            })?;
        let setter = mapped
            .setter()
            .ok_or_else(|| InstantiationError::MissingSetter {
                type_name: type_name.to_string(),
                property: property.to_string(),
            })?;

        setter(&mut self.instance, value).map_err(|message| InstantiationError::invoke(type_name, message))
    }

    fn instance(&mut self) -> Result<&mut Instance, InstantiationError> {
        Ok(&mut self.instance)
    }

    fn into_instance(self: Box<Self>) -> Result<Instance, InstantiationError> {
        Ok(self.instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        instance::InstantiationStrategy,
        model::EntityModelBuilder,
        options::MapperOptions,
        test_support::{Cat, Kennel, animal_type, cat_type, kennel_type, pet_type, sealed_type},
        types::{EntityMarker, PropertyDescriptor, TypeDescriptor, TypeRef},
    };
    use std::sync::atomic::{AtomicBool, Ordering};

    fn model(ty: TypeRef) -> Arc<EntityModel> {
        Arc::new(EntityModelBuilder::run(ty, None, &MapperOptions::default()).build())
    }

    #[test]
    fn matching_public_constructor_wins() {
        let strategy = InstantiationStrategy::select(&model(animal_type())).expect("strategy");

        assert_eq!(strategy.kind(), StrategyKind::ConstructorInjection);
        assert_eq!(strategy.constructor().params(), ["id", "name"]);
    }

    #[test]
    fn no_arg_constructor_is_second_choice() {
        let strategy = InstantiationStrategy::select(&model(cat_type())).expect("strategy");

        assert_eq!(strategy.kind(), StrategyKind::NoArgPopulate);
    }

    #[test]
    fn private_full_constructor_is_last_resort() {
        let strategy = InstantiationStrategy::select(&model(kennel_type())).expect("strategy");

        assert_eq!(strategy.kind(), StrategyKind::FullConstructor);
        assert!(!strategy.constructor().is_public());
    }

    #[test]
    fn interface_and_unusable_types_have_no_strategy() {
        for ty in [pet_type(), sealed_type()] {
            let err = InstantiationStrategy::select(&model(ty)).expect_err("no strategy");
            assert!(matches!(err, InstantiationError::NoSuitableConstructor { .. }));
        }
    }

    #[test]
    fn constructor_instantiator_rejects_set_after_construction() {
        let model = model(kennel_type());
        let mut inst = model.instantiator().expect("instantiator");

        inst.set("capacity", Value::Int(4)).expect("buffered");
        inst.instance().expect("constructed");
        let err = inst.set("id", Value::from("k1")).expect_err("already built");
        assert!(matches!(err, InstantiationError::AlreadyConstructed { .. }));

        let kennel = inst
            .into_instance()
            .expect("instance")
            .downcast::<Kennel>()
            .expect("kennel");
        assert_eq!(kennel.id, None);
        assert_eq!(kennel.capacity, 4);
    }

    #[test]
    fn failed_constructor_keeps_buffered_arguments() {
        let failed_once = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&failed_once);
        let ty = TypeDescriptor::class("com.example.zoo.Flaky")
            .entity(EntityMarker::new())
            .property(PropertyDescriptor::id("id"))
            .constructor(ConstructorDescriptor::new(["id"], move |args| {
                if flag.swap(true, Ordering::SeqCst) {
                    Ok(Box::new(args) as Instance)
                } else {
                    Err("transient failure".to_string())
                }
            }))
            .build();
        let model = model(ty);
        let mut inst = model.instantiator().expect("instantiator");

        inst.set("id", Value::from("k1")).expect("buffered");
        let err = inst.instance().err().expect("first call fails");
        assert!(matches!(err, InstantiationError::Invoke { .. }));

        let args = inst
            .into_instance()
            .expect("retry succeeds")
            .downcast::<Vec<Value>>()
            .expect("raw args");
        assert_eq!(*args, vec![Value::from("k1")]);
    }

    #[test]
    fn populating_instantiator_uses_setters() {
        let model = model(cat_type());
        let mut inst = model.instantiator().expect("instantiator");

        inst.set("name", Value::from("Tom")).expect("setter");
        inst.set("lives", Value::Int(9)).expect("setter");
        let err = inst.set("whiskers", Value::Int(12)).expect_err("unmapped");
        assert!(matches!(err, InstantiationError::UnknownProperty { .. }));

        let cat = inst
            .into_instance()
            .expect("instance")
            .downcast::<Cat>()
            .expect("cat");
        assert_eq!(cat.name, "Tom");
        assert_eq!(cat.lives, 9);
    }

    #[test]
    fn populating_instantiator_requires_setter() {
        let model = model(cat_type());
        let mut inst = model.instantiator().expect("instantiator");

        let err = inst.set("id", Value::from("c1")).expect_err("no setter");
        assert!(matches!(err, InstantiationError::MissingSetter { .. }));
    }

    #[test]
    fn strategy_is_memoized() {
        let model = model(animal_type());
        let first = model.instantiation_strategy().expect("strategy");
        let second = model.instantiation_strategy().expect("strategy");

        assert!(std::ptr::eq(first, second));
    }
}
