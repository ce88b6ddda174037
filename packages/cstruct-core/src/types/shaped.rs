//! Shaped-type synthesizer and its process-wide cache.
//!
//! A shaped type is "`prod(shape)` elements of one base kind". Each distinct
//! `(base, shape)` pair is synthesized once and shared, so two fields declared
//! as `u8[4,4]` anywhere in the process carry the same [`ShapedType`] instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::resolver::BaseKind;
use super::shape::Shape;
use super::value::{ArrayValue, Value};
use crate::error::{CStructError, Result};

/// Synthesized fixed-count array type.
#[derive(Debug)]
pub struct ShapedType {
    name: String,
    element: BaseKind,
    shape: Shape,
}

impl ShapedType {
    fn new(element: BaseKind, shape: Shape) -> Self {
        Self {
            name: format!("{}{}", element, shape),
            element,
            shape,
        }
    }

    /// Stable name, e.g. `u8[4,4]`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element(&self) -> &BaseKind {
        &self.element
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn element_count(&self) -> usize {
        self.shape.element_count()
    }

    /// CRC-32 of the type name.
    pub fn fingerprint(&self) -> u32 {
        crc32fast::hash(self.name.as_bytes())
    }

    /// Builds an instance from positional values.
    ///
    /// One value is broadcast to every element; exactly
    /// [`element_count`](Self::element_count) values are assigned in order.
    /// Any other count fails with [`CStructError::InvalidElementCount`], and a
    /// broadcast that cannot be allocated fails with
    /// [`CStructError::CapacityOverflow`].
    pub fn construct(self: &Arc<Self>, mut values: Vec<Value>) -> Result<ArrayValue> {
        let count = self.element_count();
        let element_type = FieldType::Base(self.element.clone());

        for value in &values {
            if !element_type.accepts(value) {
                return Err(CStructError::InvalidValue {
                    expected: self.element.to_string(),
                    got: value.describe(),
                });
            }
        }

        let elements = match values.len() {
            1 if count > 1 => {
                let value = values.swap_remove(0);
                let mut elements = Vec::new();
                elements
                    .try_reserve_exact(count)
                    .map_err(|_| CStructError::CapacityOverflow {
                        type_name: self.name.clone(),
                        elements: count,
                    })?;
                elements.resize(count, value);
                elements
            }
            n if n == count => values,
            n => {
                return Err(CStructError::InvalidElementCount {
                    type_name: self.name.clone(),
                    expected: count,
                    got: n,
                })
            }
        };

        Ok(ArrayValue::new(self.clone(), elements))
    }

    /// Instance with every element set to the element default.
    pub fn default_value(self: &Arc<Self>) -> Result<ArrayValue> {
        let element = FieldType::Base(self.element.clone()).default_value()?;
        self.construct(vec![element])
    }
}

impl PartialEq for ShapedType {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element && self.shape == other.shape
    }
}

impl Eq for ShapedType {}

impl fmt::Display for ShapedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Effective runtime type of a field: its base for scalars, or the
/// synthesized shaped type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Base(BaseKind),
    Shaped(Arc<ShapedType>),
}

impl FieldType {
    pub fn name(&self) -> String {
        match self {
            FieldType::Base(base) => base.to_string(),
            FieldType::Shaped(shaped) => shaped.name().to_string(),
        }
    }

    /// Default value: zero for primitives, broadcast default for shaped
    /// types, default instance for structs.
    pub fn default_value(&self) -> Result<Value> {
        match self {
            FieldType::Base(BaseKind::Primitive(kind)) => Ok(kind.default_value()),
            FieldType::Base(BaseKind::Struct(structure)) => {
                let schema = structure
                    .schema()
                    .ok_or_else(|| CStructError::NotCompiled(structure.name().to_string()))?;
                Ok(Value::Struct(schema.default_instance()?))
            }
            FieldType::Base(BaseKind::Opaque(name)) => Err(CStructError::InvalidValue {
                expected: "a supported type".to_string(),
                got: name.clone(),
            }),
            FieldType::Shaped(shaped) => Ok(Value::Array(shaped.default_value()?)),
        }
    }

    /// Reports whether `value` is an instance of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::Base(BaseKind::Primitive(kind)), value) => value.kind() == Some(*kind),
            (FieldType::Base(BaseKind::Struct(structure)), Value::Struct(instance)) => structure
                .schema()
                .is_some_and(|schema| Arc::ptr_eq(&schema, instance.schema())),
            (FieldType::Shaped(shaped), Value::Array(array)) => {
                Arc::ptr_eq(shaped, array.shaped_type()) || **shaped == **array.shaped_type()
            }
            _ => false,
        }
    }

    /// Checks `value` against this type, broadcasting a single element value
    /// into a shaped type.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        if self.accepts(&value) {
            return Ok(value);
        }
        if let FieldType::Shaped(shaped) = self {
            if FieldType::Base(shaped.element().clone()).accepts(&value) {
                return Ok(Value::Array(shaped.construct(vec![value])?));
            }
        }
        Err(CStructError::InvalidValue {
            expected: self.name(),
            got: value.describe(),
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Memoizing store of synthesized shaped types, keyed by `(base, shape)`.
///
/// Entries are never evicted. The global instance lives for the whole
/// process; separate instances can be created for isolation.
#[derive(Debug, Default)]
pub struct ShapedTypeCache {
    types: Mutex<HashMap<(BaseKind, Shape), Arc<ShapedType>>>,
}

static GLOBAL_CACHE: OnceLock<Arc<ShapedTypeCache>> = OnceLock::new();

impl ShapedTypeCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self {
            types: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide cache.
    pub fn global() -> Arc<ShapedTypeCache> {
        GLOBAL_CACHE
            .get_or_init(|| Arc::new(ShapedTypeCache::new()))
            .clone()
    }

    /// Returns the effective type for `base` with `shape`.
    ///
    /// The scalar shape returns `base` unchanged. Otherwise the shaped type is
    /// synthesized on first use under the cache lock, so concurrent first
    /// callers all receive the same instance.
    pub fn materialize(&self, base: &BaseKind, shape: &Shape) -> FieldType {
        if shape.is_scalar() {
            return FieldType::Base(base.clone());
        }

        let mut types = self.types.lock();
        let shaped = types
            .entry((base.clone(), shape.clone()))
            .or_insert_with(|| {
                let shaped = Arc::new(ShapedType::new(base.clone(), shape.clone()));
                tracing::debug!("Synthesized shaped type {}", shaped.name());
                shaped
            })
            .clone();
        FieldType::Shaped(shaped)
    }

    /// Looks up an already synthesized type.
    pub fn get(&self, base: &BaseKind, shape: &Shape) -> Option<Arc<ShapedType>> {
        self.types.lock().get(&(base.clone(), shape.clone())).cloned()
    }

    /// Number of synthesized types.
    pub fn len(&self) -> usize {
        self.types.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Materializes through the process-wide cache.
pub fn materialize(base: &BaseKind, shape: &Shape) -> FieldType {
    ShapedTypeCache::global().materialize(base, shape)
}
