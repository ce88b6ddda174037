//! Layout policy and struct compilation options.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CStructError, Result};

/// Byte order a codec should use for a struct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Native,
    Little,
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Native => f.write_str("native"),
            Endianness::Little => f.write_str("little"),
            Endianness::Big => f.write_str("big"),
        }
    }
}

/// Layout configuration carried by a compiled schema.
///
/// Accepted and stored only; interpreting these settings is left to the codec
/// that consumes the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPolicy {
    /// Byte order (default: native)
    pub endianness: Endianness,
    /// Alignment in bytes (default: 1)
    pub alignment: usize,
    /// Packed layout without padding (default: false)
    pub packed: bool,
    /// Codec should generate a serializer (default: false)
    pub serialize: bool,
    /// Codec should generate a deserializer (default: false)
    pub deserialize: bool,
}

impl Default for LayoutPolicy {
    fn default() -> Self {
        Self {
            endianness: Endianness::Native,
            alignment: 1,
            packed: false,
            serialize: false,
            deserialize: false,
        }
    }
}

impl LayoutPolicy {
    /// Creates a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_packed(mut self, packed: bool) -> Self {
        self.packed = packed;
        self
    }

    /// Checks that the policy can be installed on a schema.
    pub fn validate(&self) -> Result<()> {
        if self.alignment == 0 {
            return Err(CStructError::InvalidLayoutPolicy(
                "alignment must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options for compiling a single struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructOptions {
    /// Layout policy installed with the schema
    pub layout: LayoutPolicy,
    /// Generate a positional constructor (default: true)
    pub constructor: bool,
    /// Generate a `Name(field=value, ...)` display routine (default: true)
    pub display: bool,
}

impl Default for StructOptions {
    fn default() -> Self {
        Self {
            layout: LayoutPolicy::default(),
            constructor: true,
            display: true,
        }
    }
}

impl StructOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, layout: LayoutPolicy) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_constructor(mut self, constructor: bool) -> Self {
        self.constructor = constructor;
        self
    }

    pub fn with_display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StructOptions::default();
        assert_eq!(options.layout.endianness, Endianness::Native);
        assert_eq!(options.layout.alignment, 1);
        assert!(!options.layout.packed);
        assert!(options.constructor);
        assert!(options.display);
    }

    #[test]
    fn test_zero_alignment_rejected() {
        let policy = LayoutPolicy::new().with_alignment(0);
        assert!(matches!(
            policy.validate(),
            Err(CStructError::InvalidLayoutPolicy(_))
        ));
        assert!(LayoutPolicy::new().with_alignment(8).validate().is_ok());
    }

    #[test]
    fn test_partial_options_deserialize() {
        let options: StructOptions =
            serde_json::from_str(r#"{"layout": {"endianness": "big", "packed": true}, "display": false}"#)
                .unwrap();
        assert_eq!(options.layout.endianness, Endianness::Big);
        assert!(options.layout.packed);
        assert_eq!(options.layout.alignment, 1);
        assert!(options.constructor);
        assert!(!options.display);
    }
}
