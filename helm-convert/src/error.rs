use core::fmt;

use serde_json::Value;

use crate::{path::FieldPath, resource::ResId};

/// The shape of a node in a resource document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Map,
    Sequence,
    String,
    Number,
    Bool,
    Null,
}

impl Shape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Shape::Map,
            Value::Array(_) => Shape::Sequence,
            Value::String(_) => Shape::String,
            Value::Number(_) => Shape::Number,
            Value::Bool(_) => Shape::Bool,
            Value::Null => Shape::Null,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Shape::Map => "a map",
            Shape::Sequence => "a sequence",
            Shape::String => "a string",
            Shape::Number => "a number",
            Shape::Bool => "a boolean",
            Shape::Null => "null",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A segment addressed a node of the wrong shape.
    #[error("expected {expected} at `{path}` but found {found}")]
    Mismatch {
        path: FieldPath,
        expected: Shape,
        found: Shape,
    },
    #[error("index out of bounds at `{path}`, the sequence has {len} elements")]
    OutOfBounds { path: FieldPath, len: usize },
    #[error("path `{0}` contains a wildcard and does not address a single node")]
    Wildcard(FieldPath),
}

impl PathError {
    pub(crate) fn mismatch(path: FieldPath, expected: Shape, found: &Value) -> Self {
        PathError::Mismatch {
            path,
            expected,
            found: Shape::of(found),
        }
    }
}

/// A structural error confined to a single resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("resource `{resource}`: {source}")]
pub struct DocumentError {
    pub resource: ResId,
    #[source]
    pub source: PathError,
}

/// Every document a transformer could not process in one pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct TransformError {
    pub transformer: &'static str,
    pub errors: Vec<DocumentError>,
}

impl TransformError {
    pub fn new(transformer: &'static str, errors: Vec<DocumentError>) -> Self {
        Self {
            transformer,
            errors,
        }
    }

    /// `Ok` if nothing was collected, otherwise all collected errors.
    pub fn check(transformer: &'static str, errors: Vec<DocumentError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self::new(transformer, errors))
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} transformer failed", self.transformer)?;
        for error in &self.errors {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}
