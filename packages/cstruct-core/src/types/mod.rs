//! Field type model: primitive catalogue, shapes, declared types, resolution,
//! support validation and shaped-type synthesis.

pub mod declared;
pub mod primitive;
pub mod resolver;
pub mod shape;
pub mod shaped;
pub mod support;
pub mod value;

pub use declared::{DeclaredType, MAX_NESTING};
pub use primitive::PrimitiveKind;
pub use resolver::{resolve, BaseKind, Resolver, StructLookup, TypeSpecification};
pub use shape::Shape;
pub use shaped::{materialize, FieldType, ShapedType, ShapedTypeCache};
pub use support::is_supported;
pub use value::{ArrayValue, Value};
