//! Shared zoo fixtures for unit tests.
//!
//! Every type lives in `ZOO`. `Dog` is deliberately unmarked so that it is
//! only mappable through its `Animal` superclass and `Pet` interface.

use crate::types::{
    ConstructorDescriptor, EmbeddedMarker, EntityMarker, Instance, PropertyDescriptor,
    TypeCatalog, TypeDescriptor, TypeRef,
};
use crate::value::Value;
use std::sync::Arc;

pub(crate) const ZOO: &str = "com.example.zoo";

pub(crate) const ANIMAL: &str = "com.example.zoo.Animal";
pub(crate) const DOG: &str = "com.example.zoo.Dog";
pub(crate) const PET: &str = "com.example.zoo.Pet";
pub(crate) const CAT: &str = "com.example.zoo.Cat";
pub(crate) const ADDRESS: &str = "com.example.zoo.Address";
pub(crate) const KENNEL: &str = "com.example.zoo.Kennel";
pub(crate) const SEALED: &str = "com.example.zoo.Sealed";
pub(crate) const ROCK: &str = "com.example.zoo.Rock";

fn text(value: Value) -> String {
    value.into_text().unwrap_or_default()
}

fn downcast<T: 'static>(instance: &mut Instance) -> Result<&mut T, String> {
    instance
        .downcast_mut::<T>()
        .ok_or_else(|| "instance has the wrong type".to_string())
}

///
/// Animal
///

#[derive(Debug, Default)]
pub(crate) struct Animal {
    pub(crate) id: String,
    pub(crate) name: String,
}

pub(crate) fn animal_type() -> TypeRef {
    TypeDescriptor::class(ANIMAL)
        .entity(EntityMarker::new().collection("animals"))
        .property(PropertyDescriptor::id("id"))
        .property(PropertyDescriptor::new("name"))
        .constructor(ConstructorDescriptor::new(["id", "name"], |mut args| {
            let name = text(args.pop().unwrap_or_default());
            let id = text(args.pop().unwrap_or_default());
            Ok(Box::new(Animal { id, name }) as Instance)
        }))
        .constructor(ConstructorDescriptor::no_arg(|| Box::new(Animal::default()) as Instance))
        .build()
}

///
/// Dog
///

#[derive(Debug)]
pub(crate) struct Dog {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) breed: String,
}

/// Constructor parameters are intentionally not in declaration order.
pub(crate) fn dog_type() -> TypeRef {
    TypeDescriptor::class(DOG)
        .extends(ANIMAL)
        .implements(PET)
        .property(PropertyDescriptor::id("id"))
        .property(PropertyDescriptor::new("name"))
        .property(PropertyDescriptor::new("breed"))
        .constructor(ConstructorDescriptor::new(["breed", "name", "id"], |args| {
            let mut args = args.into_iter().map(text);
            let breed = args.next().unwrap_or_default();
            let name = args.next().unwrap_or_default();
            let id = args.next().unwrap_or_default();
            Ok(Box::new(Dog { id, name, breed }) as Instance)
        }))
        .build()
}

pub(crate) fn pet_type() -> TypeRef {
    TypeDescriptor::interface(PET)
        .entity(EntityMarker::new().collection("pets"))
        .build()
}

///
/// Cat
///

#[derive(Debug, Default)]
pub(crate) struct Cat {
    pub(crate) name: String,
    pub(crate) lives: i64,
}

/// No-arg constructor plus setters; `id` has no setter.
pub(crate) fn cat_type() -> TypeRef {
    TypeDescriptor::class(CAT)
        .entity(EntityMarker::new().discriminator("cat"))
        .property(PropertyDescriptor::id("id"))
        .property(PropertyDescriptor::new("name").setter(|instance, value| {
            downcast::<Cat>(instance)?.name = text(value);
            Ok(())
        }))
        .property(PropertyDescriptor::new("lives").setter(|instance, value| {
            downcast::<Cat>(instance)?.lives = value.as_int().unwrap_or_default();
            Ok(())
        }))
        .constructor(ConstructorDescriptor::no_arg(|| Box::new(Cat::default()) as Instance))
        .build()
}

pub(crate) fn address_type() -> TypeRef {
    TypeDescriptor::class(ADDRESS)
        .embedded(EmbeddedMarker::new())
        .property(PropertyDescriptor::new("street"))
        .property(PropertyDescriptor::new("city"))
        .constructor(ConstructorDescriptor::new(["street", "city"], |args| {
            Ok(Box::new(args.into_iter().map(text).collect::<Vec<_>>()) as Instance)
        }))
        .build()
}

///
/// Kennel
///

#[derive(Debug)]
pub(crate) struct Kennel {
    pub(crate) id: Option<String>,
    pub(crate) capacity: i64,
}

/// Only a private declaration-order constructor.
pub(crate) fn kennel_type() -> TypeRef {
    TypeDescriptor::class(KENNEL)
        .entity(EntityMarker::new())
        .property(PropertyDescriptor::id("id"))
        .property(PropertyDescriptor::new("capacity"))
        .constructor(
            ConstructorDescriptor::new(["id", "capacity"], |mut args| {
                let capacity = args.pop().and_then(|v| v.as_int()).unwrap_or_default();
                let id = args.pop().and_then(|v| v.into_text().ok());
                Ok(Box::new(Kennel { id, capacity }) as Instance)
            })
            .private(),
        )
        .build()
}

/// Mapped, but no constructor fits its properties.
pub(crate) fn sealed_type() -> TypeRef {
    TypeDescriptor::class(SEALED)
        .entity(EntityMarker::new())
        .property(PropertyDescriptor::id("id"))
        .property(PropertyDescriptor::new("label"))
        .constructor(ConstructorDescriptor::new(["code"], |_| {
            Err("sealed".to_string())
        }))
        .build()
}

pub(crate) fn rock_type() -> TypeRef {
    TypeDescriptor::class(ROCK)
        .property(PropertyDescriptor::new("weight"))
        .build()
}

/// Catalog holding every zoo fixture.
pub(crate) fn zoo_catalog() -> Arc<TypeCatalog> {
    TypeCatalog::with_types([
        animal_type(),
        dog_type(),
        pet_type(),
        cat_type(),
        address_type(),
        kennel_type(),
        sealed_type(),
        rock_type(),
    ])
}
