//! Struct instances built by the generated constructor.

use std::fmt;
use std::sync::Arc;

use super::schema::StructSchema;
use crate::error::{CStructError, Result};
use crate::types::Value;

/// Field values of one struct instance, in declaration order.
#[derive(Clone)]
pub struct StructValue {
    schema: Arc<StructSchema>,
    values: Vec<Value>,
}

impl StructValue {
    pub(crate) fn new(schema: Arc<StructSchema>, values: Vec<Value>) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &Arc<StructSchema> {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema
            .field_index(name)
            .and_then(|index| self.values.get(index))
    }

    /// Assigns a field. Const fields are read-only.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let index = self
            .schema
            .field_index(name)
            .ok_or_else(|| CStructError::FieldNotFound {
                structure: self.schema.name().to_string(),
                field: name.to_string(),
            })?;
        let field = &self.schema.fields()[index];
        if field.spec.is_const {
            return Err(CStructError::ConstField {
                structure: self.schema.name().to_string(),
                field: name.to_string(),
            });
        }
        self.values[index] = field.field_type.coerce(value.into())?;
        Ok(())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.values == other.values
    }
}

impl fmt::Debug for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name());
        for (field, value) in self.schema.fields().iter().zip(&self.values) {
            s.field(&field.name, value);
        }
        s.finish()
    }
}

impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.schema.options().display {
            return write!(f, "<{} object>", self.schema.name());
        }
        write!(f, "{}(", self.schema.name())?;
        for (i, (field, value)) in self.schema.fields().iter().zip(&self.values).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", field.name, value)?;
        }
        f.write_str(")")
    }
}
