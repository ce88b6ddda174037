//! Declared field types and the type-expression parser.

use std::fmt;

use super::primitive::PrimitiveKind;
use crate::compiler::StructRef;
use crate::error::{CStructError, Result};

/// Most shape and const wrappings one declared type may carry.
pub const MAX_NESTING: usize = 64;

/// A field type as written by the declaring code, before resolution.
///
/// Shape and const wrappings nest in any order; the resolver flattens them
/// into a single [`TypeSpecification`](super::TypeSpecification).
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    /// Catalogue primitive
    Primitive(PrimitiveKind),
    /// Direct reference to a declared struct
    Struct(StructRef),
    /// Struct referenced by name, looked up through a registry
    Named(String),
    /// Type that is neither a primitive nor a struct
    Opaque(String),
    /// Dimensions wrapping
    Shaped {
        inner: Box<DeclaredType>,
        dims: Vec<usize>,
    },
    /// Read-only wrapping
    Const(Box<DeclaredType>),
}

impl DeclaredType {
    pub fn named(name: impl Into<String>) -> Self {
        DeclaredType::Named(name.into())
    }

    /// Declares a field of an arbitrary Rust type. It resolves, but never
    /// passes the support check.
    pub fn foreign<T: ?Sized>() -> Self {
        DeclaredType::Opaque(std::any::type_name::<T>().to_string())
    }

    /// Wraps this type in a dimensions wrapping.
    pub fn shaped(self, dims: &[usize]) -> Self {
        DeclaredType::Shaped {
            inner: Box::new(self),
            dims: dims.to_vec(),
        }
    }

    /// Wraps this type in a read-only wrapping.
    pub fn constant(self) -> Self {
        DeclaredType::Const(Box::new(self))
    }

    /// Parses a type expression such as `u8`, `f32[4,4]`, `const<u8[8]>` or
    /// `Point[3]`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            wrappings: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

impl From<PrimitiveKind> for DeclaredType {
    fn from(kind: PrimitiveKind) -> Self {
        DeclaredType::Primitive(kind)
    }
}

impl From<&StructRef> for DeclaredType {
    fn from(structure: &StructRef) -> Self {
        DeclaredType::Struct(structure.clone())
    }
}

impl From<StructRef> for DeclaredType {
    fn from(structure: StructRef) -> Self {
        DeclaredType::Struct(structure)
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Primitive(kind) => write!(f, "{}", kind),
            DeclaredType::Struct(structure) => f.write_str(structure.name()),
            DeclaredType::Named(name) | DeclaredType::Opaque(name) => f.write_str(name),
            DeclaredType::Shaped { inner, dims } => {
                let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "{}[{}]", inner, dims.join(","))
            }
            DeclaredType::Const(inner) => write!(f, "const<{}>", inner),
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    wrappings: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &str) -> CStructError {
        CStructError::UnresolvableType {
            declared: self.text.to_string(),
            reason: format!("{} at position {}", reason, self.pos),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn wrap(&mut self) -> Result<()> {
        self.wrappings += 1;
        if self.wrappings > MAX_NESTING {
            return Err(self.error("nesting too deep"));
        }
        Ok(())
    }

    fn parse_type(&mut self) -> Result<DeclaredType> {
        let ident = self.parse_ident()?;

        let mut ty = if ident == "const" && self.peek() == Some(b'<') {
            self.pos += 1;
            self.wrap()?;
            let inner = self.parse_type()?;
            self.expect(b'>')?;
            DeclaredType::Const(Box::new(inner))
        } else {
            match PrimitiveKind::from_name(ident) {
                Some(kind) => DeclaredType::Primitive(kind),
                None => DeclaredType::Named(ident.to_string()),
            }
        };

        while self.peek() == Some(b'[') {
            self.pos += 1;
            self.wrap()?;
            let dims = self.parse_dims()?;
            ty = ty.shaped(&dims);
        }

        Ok(ty)
    }

    fn parse_ident(&mut self) -> Result<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            let ok = b.is_ascii_alphabetic()
                || b == b'_'
                || (self.pos > start && (b.is_ascii_digit() || b == b':'));
            if !ok {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }
        let text: &'a str = self.text;
        Ok(&text[start..self.pos])
    }

    fn parse_dims(&mut self) -> Result<Vec<usize>> {
        let mut dims = Vec::new();
        loop {
            self.skip_ws();
            let start = self.pos;
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
            if start == self.pos {
                return Err(self.error("expected an integer dimension"));
            }
            let dim = self.text[start..self.pos]
                .parse::<usize>()
                .map_err(|_| self.error("dimension out of range"))?;
            dims.push(dim);

            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(dims);
                }
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }
}
