//! Array dimensions of a field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CStructError, Result};

/// Ordered, non-empty list of dimensions, each at least 1.
///
/// The scalar shape is `[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Shape(Vec<usize>);

impl Shape {
    /// The canonical scalar shape `[1]`.
    pub fn scalar() -> Self {
        Shape(vec![1])
    }

    /// Creates a shape, rejecting empty lists, zero dimensions and element
    /// counts that overflow `usize`.
    pub fn new(dims: impl Into<Vec<usize>>) -> Result<Self> {
        let dims = dims.into();
        if dims.is_empty() {
            return Err(CStructError::UnresolvableType {
                declared: "[]".to_string(),
                reason: "shape must have at least one dimension".to_string(),
            });
        }
        if dims.contains(&0) {
            return Err(CStructError::UnresolvableType {
                declared: format_dims(&dims),
                reason: "dimensions must be positive".to_string(),
            });
        }
        if dims.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d)).is_none() {
            return Err(CStructError::UnresolvableType {
                declared: format_dims(&dims),
                reason: "element count overflows".to_string(),
            });
        }
        Ok(Shape(dims))
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn is_scalar(&self) -> bool {
        self.0 == [1]
    }

    /// Total number of elements (product of dimensions).
    pub fn element_count(&self) -> usize {
        self.0.iter().product()
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::scalar()
    }
}

impl TryFrom<Vec<usize>> for Shape {
    type Error = CStructError;

    fn try_from(dims: Vec<usize>) -> Result<Self> {
        Shape::new(dims)
    }
}

impl From<Shape> for Vec<usize> {
    fn from(shape: Shape) -> Self {
        shape.0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_dims(&self.0))
    }
}

fn format_dims(dims: &[usize]) -> String {
    let inner: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
    format!("[{}]", inner.join(","))
}
