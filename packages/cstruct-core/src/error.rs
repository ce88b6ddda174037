//! Schema resolution error types.

use thiserror::Error;

/// Errors raised while declaring, resolving, compiling or instantiating structs.
///
/// All of these are declaration errors: they are reported synchronously and
/// never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CStructError {
    /// Declared type matches none of the base/shape/const forms
    #[error("Unable to resolve type '{declared}': {reason}")]
    UnresolvableType { declared: String, reason: String },

    /// A second shape applied to an already-shaped type
    #[error("Cannot apply shape {attempted} to a type already shaped as {existing}")]
    ShapeConflict { existing: String, attempted: String },

    /// Struct attribute has no type annotation
    #[error("Field '{field}' in '{structure}' is missing a type annotation")]
    MissingAnnotation { structure: String, field: String },

    /// Field base kind failed the support check
    #[error("Field '{field}' in '{structure}' is annotated with an unsupported type '{base}'")]
    UnsupportedField {
        structure: String,
        field: String,
        base: String,
    },

    /// Shaped type constructed with neither one nor `expected` values
    #[error("'{type_name}' expects 1 or {expected} elements, got {got}")]
    InvalidElementCount {
        type_name: String,
        expected: usize,
        got: usize,
    },

    /// Shaped instance too large to allocate
    #[error("Capacity overflow constructing '{type_name}' with {elements} elements")]
    CapacityOverflow { type_name: String, elements: usize },

    /// Struct transitively contains itself
    #[error("Cyclic struct schema: {}", path.join(" -> "))]
    CyclicSchema { path: Vec<String> },

    /// Layout policy rejected
    #[error("Invalid layout policy: {0}")]
    InvalidLayoutPolicy(String),

    /// Field name declared twice in one struct
    #[error("Field '{field}' declared more than once in '{structure}'")]
    DuplicateField { structure: String, field: String },

    /// Struct name already present in a registry
    #[error("Struct '{0}' already declared")]
    AlreadyDeclared(String),

    /// Struct name not present in a registry
    #[error("Struct '{0}' not found")]
    StructNotFound(String),

    /// Struct has no installed schema
    #[error("Struct '{0}' has not been compiled")]
    NotCompiled(String),

    /// Constructor generation was disabled for this struct
    #[error("Struct '{0}' was compiled without a constructor")]
    ConstructorNotGenerated(String),

    /// Constructor received more positional values than fields
    #[error("'{structure}' takes at most {expected} arguments, got {got}")]
    TooManyArguments {
        structure: String,
        expected: usize,
        got: usize,
    },

    /// Value does not fit the expected type
    #[error("Invalid value: expected {expected}, got {got}")]
    InvalidValue { expected: String, got: String },

    /// Field name not present in a struct
    #[error("Field '{field}' not found in '{structure}'")]
    FieldNotFound { structure: String, field: String },

    /// Assignment to a const field
    #[error("Field '{field}' in '{structure}' is const")]
    ConstField { structure: String, field: String },

    /// Declaration file could not be read or parsed
    #[error("Declaration error: {0}")]
    Declaration(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CStructError>;
