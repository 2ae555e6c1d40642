//! Runtime entity models.
//!
//! An `EntityModel` is the structural snapshot of one mapped type, built
//! through the convention pipeline in `builder` and made canonical by the
//! `Mapper`. After registration only its subtype edges change.

mod builder;
mod entity;
mod property;
pub(crate) mod validate;

pub use builder::*;
pub use entity::*;
pub use property::*;
