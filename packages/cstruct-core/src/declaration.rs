//! JSON declaration files.
//!
//! ```json
//! {
//!   "structs": [
//!     { "name": "Point",
//!       "options": { "layout": { "endianness": "little" } },
//!       "fields": [ { "name": "x", "type": "i32" },
//!                   { "name": "tag", "value": 3 } ] }
//!   ]
//! }
//! ```
//!
//! A field with a `type` is a typed field; any `value` next to it is
//! ignored. A field with only a `value` is an unannotated attribute and makes
//! compilation fail.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::compiler::{MemberKind, StructDecl};
use crate::config::StructOptions;
use crate::error::{CStructError, Result};
use crate::registry::SchemaRegistry;
use crate::types::{DeclaredType, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarationFile {
    #[serde(default)]
    pub structs: Vec<StructDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDeclaration {
    pub name: String,
    #[serde(default)]
    pub options: StructOptions,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    /// Type expression, e.g. `const<u8[8]>`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
}

impl DeclarationFile {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CStructError::Declaration(e.to_string()))
    }

    /// Declares every struct in `registry`, in file order.
    pub fn register_into(&self, registry: &SchemaRegistry) -> Result<()> {
        for declaration in &self.structs {
            registry.declare(declaration.to_decl()?, declaration.options)?;
        }
        Ok(())
    }
}

impl StructDeclaration {
    pub fn to_decl(&self) -> Result<StructDecl> {
        let mut decl = StructDecl::new(self.name.clone());
        for field in &self.fields {
            let kind = match (&field.type_expr, &field.value) {
                (Some(expr), _) => MemberKind::Field(DeclaredType::parse(expr)?),
                (None, Some(value)) => MemberKind::Attribute(attribute_value(&field.name, value)?),
                (None, None) => {
                    return Err(CStructError::Declaration(format!(
                        "field '{}' in '{}' has neither a type nor a value",
                        field.name, self.name
                    )))
                }
            };
            decl.push(field.name.clone(), kind);
        }
        Ok(decl)
    }
}

/// Untyped attribute values keep whatever kind JSON suggests.
fn attribute_value(name: &str, value: &JsonValue) -> Result<Value> {
    match value {
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::I64)
            .or_else(|| n.as_u64().map(Value::U64))
            .or_else(|| n.as_f64().map(Value::F64))
            .ok_or_else(|| CStructError::Declaration(format!("invalid number for '{}'", name))),
        other => Err(CStructError::Declaration(format!(
            "attribute '{}' has unsupported value {}",
            name, other
        ))),
    }
}

/// Parses a declaration document into a new registry.
pub fn load_declarations(text: &str) -> Result<SchemaRegistry> {
    let file = DeclarationFile::parse(text)?;
    let registry = SchemaRegistry::new();
    file.register_into(&registry)?;
    Ok(registry)
}

/// Reads and parses a declaration file into a new registry.
pub fn load_declarations_file(path: impl AsRef<Path>) -> Result<SchemaRegistry> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| CStructError::Declaration(format!("{}: {}", path.display(), e)))?;
    load_declarations(&text)
}
