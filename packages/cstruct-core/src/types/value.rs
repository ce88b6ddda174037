//! Runtime values produced by the generated constructors.

use std::fmt;
use std::sync::Arc;

use half::f16;
use serde_json::Value as JsonValue;

use super::primitive::PrimitiveKind;
use super::resolver::BaseKind;
use super::shaped::{FieldType, ShapedType};
use crate::compiler::StructValue;
use crate::error::{CStructError, Result};

/// A value of a primitive, shaped or struct type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F16(f16),
    F32(f32),
    F64(f64),
    Array(ArrayValue),
    Struct(StructValue),
}

impl Value {
    /// Primitive kind of a scalar value.
    pub fn kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Bool(_) => Some(PrimitiveKind::Bool),
            Value::I8(_) => Some(PrimitiveKind::I8),
            Value::I16(_) => Some(PrimitiveKind::I16),
            Value::I32(_) => Some(PrimitiveKind::I32),
            Value::I64(_) => Some(PrimitiveKind::I64),
            Value::U8(_) => Some(PrimitiveKind::U8),
            Value::U16(_) => Some(PrimitiveKind::U16),
            Value::U32(_) => Some(PrimitiveKind::U32),
            Value::U64(_) => Some(PrimitiveKind::U64),
            Value::F16(_) => Some(PrimitiveKind::F16),
            Value::F32(_) => Some(PrimitiveKind::F32),
            Value::F64(_) => Some(PrimitiveKind::F64),
            Value::Array(_) | Value::Struct(_) => None,
        }
    }

    /// Short description used in error messages, e.g. `u8 7`.
    pub fn describe(&self) -> String {
        match self {
            Value::Array(array) => array.shaped_type().name().to_string(),
            Value::Struct(instance) => instance.schema().name().to_string(),
            scalar => match scalar.kind() {
                Some(kind) => format!("{} {}", kind, scalar),
                None => scalar.to_string(),
            },
        }
    }

    /// Converts JSON into a value of `field_type`.
    ///
    /// Numbers and booleans map to primitives with range checking, arrays to
    /// shaped types (one element broadcasts) and arrays or objects to structs.
    pub fn from_json(field_type: &FieldType, json: &JsonValue) -> Result<Value> {
        match field_type {
            FieldType::Base(BaseKind::Primitive(kind)) => primitive_from_json(*kind, json),
            FieldType::Base(BaseKind::Struct(structure)) => {
                let schema = structure
                    .schema()
                    .ok_or_else(|| CStructError::NotCompiled(structure.name().to_string()))?;
                let args = match json {
                    JsonValue::Array(items) if items.len() > schema.fields().len() => {
                        return Err(CStructError::TooManyArguments {
                            structure: schema.name().to_string(),
                            expected: schema.fields().len(),
                            got: items.len(),
                        })
                    }
                    JsonValue::Array(items) => items
                        .iter()
                        .zip(schema.fields())
                        .map(|(item, field)| Value::from_json(&field.field_type, item))
                        .collect::<Result<Vec<_>>>()?,
                    JsonValue::Object(map) => {
                        if let Some(unknown) = map.keys().find(|k| schema.field(k).is_none()) {
                            return Err(CStructError::FieldNotFound {
                                structure: schema.name().to_string(),
                                field: unknown.clone(),
                            });
                        }
                        schema
                            .fields()
                            .iter()
                            .map(|field| match map.get(&field.name) {
                                Some(item) => Value::from_json(&field.field_type, item),
                                None => field.field_type.default_value(),
                            })
                            .collect::<Result<Vec<_>>>()?
                    }
                    other => return Err(invalid(schema.name(), other)),
                };
                Ok(Value::Struct(schema.instantiate(args)?))
            }
            FieldType::Base(BaseKind::Opaque(name)) => Err(invalid(name, json)),
            FieldType::Shaped(shaped) => {
                let element_type = FieldType::Base(shaped.element().clone());
                let values = match json {
                    JsonValue::Array(items) => items
                        .iter()
                        .map(|item| Value::from_json(&element_type, item))
                        .collect::<Result<Vec<_>>>()?,
                    scalar => vec![Value::from_json(&element_type, scalar)?],
                };
                Ok(Value::Array(shaped.construct(values)?))
            }
        }
    }
}

fn invalid(expected: &str, got: &JsonValue) -> CStructError {
    CStructError::InvalidValue {
        expected: expected.to_string(),
        got: got.to_string(),
    }
}

fn primitive_from_json(kind: PrimitiveKind, json: &JsonValue) -> Result<Value> {
    macro_rules! int {
        ($variant:ident, $ty:ty) => {{
            let value = if let Some(v) = json.as_i64() {
                <$ty>::try_from(v).ok()
            } else if let Some(v) = json.as_u64() {
                <$ty>::try_from(v).ok()
            } else {
                None
            };
            value
                .map(Value::$variant)
                .ok_or_else(|| invalid(kind.name(), json))
        }};
    }

    match kind {
        PrimitiveKind::Bool => json
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| invalid(kind.name(), json)),
        PrimitiveKind::I8 => int!(I8, i8),
        PrimitiveKind::I16 => int!(I16, i16),
        PrimitiveKind::I32 => int!(I32, i32),
        PrimitiveKind::I64 => int!(I64, i64),
        PrimitiveKind::U8 => int!(U8, u8),
        PrimitiveKind::U16 => int!(U16, u16),
        PrimitiveKind::U32 => int!(U32, u32),
        PrimitiveKind::U64 => int!(U64, u64),
        PrimitiveKind::F16 => json
            .as_f64()
            .map(f16::from_f64)
            .filter(|v| v.is_finite())
            .map(Value::F16)
            .ok_or_else(|| invalid(kind.name(), json)),
        PrimitiveKind::F32 => json
            .as_f64()
            .map(|v| v as f32)
            .filter(|v| v.is_finite())
            .map(Value::F32)
            .ok_or_else(|| invalid(kind.name(), json)),
        PrimitiveKind::F64 => json
            .as_f64()
            .map(Value::F64)
            .ok_or_else(|| invalid(kind.name(), json)),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F16(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Array(array) => write!(f, "{}", array),
            Value::Struct(instance) => write!(f, "{}", instance),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f16 => F16,
    f32 => F32,
    f64 => F64,
    ArrayValue => Array,
    StructValue => Struct,
}

/// Instance of a shaped type: `element_count` elements in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    shaped_type: Arc<ShapedType>,
    elements: Vec<Value>,
}

impl ArrayValue {
    pub(crate) fn new(shaped_type: Arc<ShapedType>, elements: Vec<Value>) -> Self {
        Self {
            shaped_type,
            elements,
        }
    }

    pub fn shaped_type(&self) -> &Arc<ShapedType> {
        &self.shaped_type
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }

    pub fn into_elements(self) -> Vec<Value> {
        self.elements
    }
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", element)?;
        }
        f.write_str("]")
    }
}
