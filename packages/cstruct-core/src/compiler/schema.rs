//! Installed struct schemas and the introspection surface for codecs.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;

use super::instance::StructValue;
use crate::config::{LayoutPolicy, StructOptions};
use crate::error::{CStructError, Result};
use crate::types::{FieldType, TypeSpecification, Value};

/// A resolved field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub spec: TypeSpecification,
    /// Effective runtime type: the base for scalars, the shaped type otherwise
    pub field_type: FieldType,
}

/// Ordered field list plus layout policy of a compiled struct.
#[derive(Debug)]
pub struct StructSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
    options: StructOptions,
}

impl StructSchema {
    pub(crate) fn new(name: String, fields: Vec<FieldDescriptor>, options: StructOptions) -> Self {
        Self {
            name,
            fields,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn layout(&self) -> &LayoutPolicy {
        &self.options.layout
    }

    pub fn options(&self) -> &StructOptions {
        &self.options
    }

    /// Sum of field packed sizes, ignoring padding.
    pub fn packed_size(&self) -> Option<usize> {
        self.fields
            .iter()
            .try_fold(0usize, |acc, f| acc.checked_add(f.spec.packed_size()?))
    }

    /// Offset of `name` when fields are laid out back to back.
    pub fn packed_offset_of(&self, name: &str) -> Option<usize> {
        let mut offset = 0usize;
        for field in &self.fields {
            if field.name == name {
                return Some(offset);
            }
            offset = offset.checked_add(field.spec.packed_size()?)?;
        }
        None
    }

    pub fn field_type_of(&self, name: &str) -> Option<&FieldType> {
        self.field(name).map(|f| &f.field_type)
    }

    /// CRC-32 over the ordered field list and layout policy.
    pub fn fingerprint(&self) -> u32 {
        crc32fast::hash(self.canonical().as_bytes())
    }

    fn canonical(&self) -> String {
        let layout = self.layout();
        let mut text = format!(
            "{}|{},{},{},{},{}|",
            self.name,
            layout.endianness,
            layout.alignment,
            layout.packed,
            layout.serialize,
            layout.deserialize
        );
        for field in &self.fields {
            // Writing to a String cannot fail
            let _ = write!(text, "{}:{};", field.name, field.spec);
        }
        text
    }

    /// Instance with every field set to its default.
    pub fn default_instance(self: &Arc<Self>) -> Result<StructValue> {
        let values = self
            .fields
            .iter()
            .map(|f| f.field_type.default_value())
            .collect::<Result<Vec<_>>>()?;
        Ok(StructValue::new(self.clone(), values))
    }

    /// Generated constructor: positional values in declaration order.
    ///
    /// Omitted trailing fields take their defaults. A single element value
    /// for a shaped field is broadcast.
    pub fn instantiate(self: &Arc<Self>, args: Vec<Value>) -> Result<StructValue> {
        if !self.options.constructor {
            return Err(CStructError::ConstructorNotGenerated(self.name.clone()));
        }
        if args.len() > self.fields.len() {
            return Err(CStructError::TooManyArguments {
                structure: self.name.clone(),
                expected: self.fields.len(),
                got: args.len(),
            });
        }

        let mut args = args.into_iter();
        let values = self
            .fields
            .iter()
            .map(|field| match args.next() {
                Some(value) => field.field_type.coerce(value),
                None => field.field_type.default_value(),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(StructValue::new(self.clone(), values))
    }

    pub fn summary(&self) -> SchemaSummary {
        let mut offset = Some(0usize);
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let packed_size = field.spec.packed_size();
                let summary = FieldSummary {
                    name: field.name.clone(),
                    type_name: field.field_type.name(),
                    base: field.spec.base.to_string(),
                    shape: field.spec.shape.dims().to_vec(),
                    is_const: field.spec.is_const,
                    packed_size,
                    packed_offset: offset,
                };
                offset = offset.zip(packed_size).and_then(|(o, s)| o.checked_add(s));
                summary
            })
            .collect();

        SchemaSummary {
            name: self.name.clone(),
            fields,
            layout: self.options.layout,
            constructor: self.options.constructor,
            display: self.options.display,
            packed_size: self.packed_size(),
            fingerprint: format!("{:08x}", self.fingerprint()),
        }
    }
}

/// Serializable view of a schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaSummary {
    pub name: String,
    pub fields: Vec<FieldSummary>,
    pub layout: LayoutPolicy,
    pub constructor: bool,
    pub display: bool,
    pub packed_size: Option<usize>,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub base: String,
    pub shape: Vec<usize>,
    pub is_const: bool,
    pub packed_size: Option<usize>,
    pub packed_offset: Option<usize>,
}
