//! Support validator.

use super::resolver::BaseKind;
use crate::compiler::StructRef;
use crate::error::{CStructError, Result};

/// Reports whether `base` can be used as a field type.
///
/// Primitives are always supported. A struct is supported when it has an
/// installed schema and every field base is supported, transitively. Support
/// is recomputed from the live schemas on each call, so redeclaring a nested
/// struct is visible to every struct that contains it.
///
/// Fails with [`CStructError::CyclicSchema`] if a struct reaches itself.
pub fn is_supported(base: &BaseKind) -> Result<bool> {
    check_supported(base, &mut Vec::new())
}

/// Same as [`is_supported`], with `path` holding the structs already being
/// walked or compiled.
pub(crate) fn check_supported(base: &BaseKind, path: &mut Vec<StructRef>) -> Result<bool> {
    let structure = match base {
        BaseKind::Primitive(_) => return Ok(true),
        BaseKind::Opaque(_) => return Ok(false),
        BaseKind::Struct(structure) => structure,
    };

    if path.contains(structure) {
        let mut cycle: Vec<String> = path.iter().map(|s| s.name().to_string()).collect();
        cycle.push(structure.name().to_string());
        return Err(CStructError::CyclicSchema { path: cycle });
    }

    let schema = match structure.schema() {
        Some(schema) => schema,
        None => return Ok(false),
    };

    path.push(structure.clone());
    let mut supported = true;
    for field in schema.fields() {
        match check_supported(&field.spec.base, path) {
            Ok(true) => {}
            Ok(false) => {
                supported = false;
                break;
            }
            Err(e) => {
                path.pop();
                return Err(e);
            }
        }
    }
    path.pop();

    Ok(supported)
}
