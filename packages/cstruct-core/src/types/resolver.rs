//! Type specification resolver.
//!
//! Walks a [`DeclaredType`]'s wrappings and flattens them into a
//! `(base, shape, is_const)` triple. Resolution is pure: resolving the same
//! declared type twice yields equal specifications, which makes the triple
//! usable as a cache key.

use std::fmt;

use super::declared::{DeclaredType, MAX_NESTING};
use super::primitive::PrimitiveKind;
use super::shape::Shape;
use crate::compiler::StructRef;
use crate::error::{CStructError, Result};

/// Element kind of a resolved field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Primitive(PrimitiveKind),
    Struct(StructRef),
    /// Neither a primitive nor a struct; never supported
    Opaque(String),
}

impl BaseKind {
    pub fn is_primitive(&self) -> bool {
        matches!(self, BaseKind::Primitive(_))
    }

    /// Byte width of one element, if known.
    pub fn packed_size(&self) -> Option<usize> {
        match self {
            BaseKind::Primitive(kind) => Some(kind.size()),
            BaseKind::Struct(structure) => structure.schema()?.packed_size(),
            BaseKind::Opaque(_) => None,
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseKind::Primitive(kind) => write!(f, "{}", kind),
            BaseKind::Struct(structure) => f.write_str(structure.name()),
            BaseKind::Opaque(name) => f.write_str(name),
        }
    }
}

/// Resolved identity of a declared field type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSpecification {
    pub base: BaseKind,
    pub shape: Shape,
    pub is_const: bool,
}

impl TypeSpecification {
    /// Scalar, mutable specification of `base`.
    pub fn scalar(base: BaseKind) -> Self {
        Self {
            base,
            shape: Shape::scalar(),
            is_const: false,
        }
    }

    pub fn element_count(&self) -> usize {
        self.shape.element_count()
    }

    /// Bytes occupied without padding, if the base has a known width.
    pub fn packed_size(&self) -> Option<usize> {
        self.base
            .packed_size()?
            .checked_mul(self.shape.element_count())
    }
}

impl fmt::Display for TypeSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        write!(f, "{}", self.base)?;
        if !self.shape.is_scalar() {
            write!(f, "{}", self.shape)?;
        }
        Ok(())
    }
}

/// Looks up structs referenced by name.
pub trait StructLookup {
    fn lookup(&self, name: &str) -> Option<StructRef>;
}

/// Resolves declared types, optionally through a name lookup.
#[derive(Default, Clone, Copy)]
pub struct Resolver<'a> {
    lookup: Option<&'a dyn StructLookup>,
}

impl<'a> Resolver<'a> {
    /// Resolver without name lookup: every [`DeclaredType::Named`] resolves
    /// to an opaque base.
    pub fn new() -> Self {
        Self { lookup: None }
    }

    pub fn with_lookup(lookup: &'a dyn StructLookup) -> Self {
        Self {
            lookup: Some(lookup),
        }
    }

    /// Flattens `declared` into a specification.
    ///
    /// Fails with [`CStructError::UnresolvableType`] past [`MAX_NESTING`]
    /// wrappings, or for an invalid shape, and with
    /// [`CStructError::ShapeConflict`] when a second shape is applied.
    pub fn resolve(&self, declared: &DeclaredType) -> Result<TypeSpecification> {
        self.resolve_nested(declared, 0)
    }

    fn resolve_nested(&self, declared: &DeclaredType, depth: usize) -> Result<TypeSpecification> {
        if depth > MAX_NESTING {
            return Err(CStructError::UnresolvableType {
                declared: innermost(declared).to_string(),
                reason: format!("nesting too deep (more than {} wrappings)", MAX_NESTING),
            });
        }

        match declared {
            DeclaredType::Primitive(kind) => {
                Ok(TypeSpecification::scalar(BaseKind::Primitive(*kind)))
            }
            DeclaredType::Struct(structure) => {
                Ok(TypeSpecification::scalar(BaseKind::Struct(structure.clone())))
            }
            DeclaredType::Named(name) => {
                let base = match self.lookup.and_then(|lookup| lookup.lookup(name)) {
                    Some(structure) => BaseKind::Struct(structure),
                    None => BaseKind::Opaque(name.clone()),
                };
                Ok(TypeSpecification::scalar(base))
            }
            DeclaredType::Opaque(name) => {
                Ok(TypeSpecification::scalar(BaseKind::Opaque(name.clone())))
            }
            DeclaredType::Shaped { inner, dims } => {
                let mut spec = self.resolve_nested(inner, depth + 1)?;
                let shape = Shape::new(dims.clone()).map_err(|e| match e {
                    CStructError::UnresolvableType { reason, .. } => {
                        CStructError::UnresolvableType {
                            declared: declared.to_string(),
                            reason,
                        }
                    }
                    other => other,
                })?;
                if !spec.shape.is_scalar() {
                    return Err(CStructError::ShapeConflict {
                        existing: spec.shape.to_string(),
                        attempted: shape.to_string(),
                    });
                }
                spec.shape = shape;
                Ok(spec)
            }
            DeclaredType::Const(inner) => {
                let mut spec = self.resolve_nested(inner, depth + 1)?;
                spec.is_const = true;
                Ok(spec)
            }
        }
    }
}

/// Unwrapped core of a declared type.
fn innermost(declared: &DeclaredType) -> &DeclaredType {
    let mut ty = declared;
    while let DeclaredType::Shaped { inner, .. } | DeclaredType::Const(inner) = ty {
        ty = &**inner;
    }
    ty
}

/// Resolves a declared type without name lookup.
pub fn resolve(declared: &DeclaredType) -> Result<TypeSpecification> {
    Resolver::new().resolve(declared)
}
