//! Schema resolution engine for fixed-layout binary structs.
//!
//! Declares structs as ordered field lists, resolves each field type into a
//! `(base, shape, const)` specification, validates support transitively,
//! synthesizes cached shaped types and installs the resulting schema for a
//! byte-level codec to consume.

pub mod compiler;
pub mod config;
pub mod declaration;
pub mod error;
pub mod registry;
pub mod types;

pub use compiler::{cstruct, StructCompiler, StructDecl, StructRef, StructSchema, StructValue};
pub use config::{Endianness, LayoutPolicy, StructOptions};
pub use error::{CStructError, Result};
pub use registry::SchemaRegistry;
pub use types::{DeclaredType, PrimitiveKind, Value};
