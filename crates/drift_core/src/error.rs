//! Key-path error types

use thiserror::Error;

use crate::value::ValueKind;

/// Errors raised while introspecting or rebuilding animatable values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeyPathError {
    /// The value cannot be introspected or decomposed
    #[error("Unsupported value type: {kind} cannot be {operation}")]
    UnsupportedType {
        kind: ValueKind,
        operation: &'static str,
    },

    /// A key path segment does not resolve
    #[error("Key path not found: segment `{segment}` of `{path}`")]
    PathNotFound { path: String, segment: String },

    /// A replacement value is of a different kind than the one it replaces
    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: ValueKind, found: ValueKind },

    /// A component vector does not have the template kind's arity
    #[error("Component count mismatch: {kind} has {expected} components, found {found}")]
    ComponentCount {
        kind: ValueKind,
        expected: usize,
        found: usize,
    },
}

impl KeyPathError {
    pub(crate) fn not_found(path: &str, segment: &str) -> Self {
        KeyPathError::PathNotFound {
            path: path.to_string(),
            segment: segment.to_string(),
        }
    }
}

/// Result type for key-path operations
pub type Result<T> = std::result::Result<T, KeyPathError>;
