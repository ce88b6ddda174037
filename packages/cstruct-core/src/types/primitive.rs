//! Primitive catalogue: the closed set of fixed-width scalar kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Fixed-width scalar kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Every kind in the catalogue.
    pub const ALL: [PrimitiveKind; 12] = [
        PrimitiveKind::Bool,
        PrimitiveKind::I8,
        PrimitiveKind::I16,
        PrimitiveKind::I32,
        PrimitiveKind::I64,
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::U64,
        PrimitiveKind::F16,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
    ];

    /// Symbolic name as used in type expressions.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F16 => "f16",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::I8 | PrimitiveKind::U8 => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16 | PrimitiveKind::F16 => 2,
            PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::F16 | PrimitiveKind::F32 | PrimitiveKind::F64
        )
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::I8 | PrimitiveKind::I16 | PrimitiveKind::I32 | PrimitiveKind::I64
        ) || self.is_float()
    }

    /// Looks up a kind by its symbolic name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Zero value of this kind.
    pub fn default_value(&self) -> Value {
        match self {
            PrimitiveKind::Bool => Value::Bool(false),
            PrimitiveKind::I8 => Value::I8(0),
            PrimitiveKind::I16 => Value::I16(0),
            PrimitiveKind::I32 => Value::I32(0),
            PrimitiveKind::I64 => Value::I64(0),
            PrimitiveKind::U8 => Value::U8(0),
            PrimitiveKind::U16 => Value::U16(0),
            PrimitiveKind::U32 => Value::U32(0),
            PrimitiveKind::U64 => Value::U64(0),
            PrimitiveKind::F16 => Value::F16(half::f16::ZERO),
            PrimitiveKind::F32 => Value::F32(0.0),
            PrimitiveKind::F64 => Value::F64(0.0),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown primitive kind '{}'", s))
    }
}
