//! Path resolution errors.
//!
//! [`PathError`] is fatal: it is raised synchronously to the caller
//! constructing or applying a lens, and is never routed through the
//! reactive error channel (that channel is reserved for recoverable
//! conversion failures).

use core::fmt;

/// Errors from resolving a field path against an immutable node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path had no segments (or an empty segment).
    Empty,
    /// A segment did not name a field on the node it was applied to.
    UnknownField {
        /// The requested field name.
        field: String,
        /// The node type the lookup ran against.
        node: &'static str,
    },
    /// A segment named a leaf field where an intermediate node was needed.
    NotANode {
        field: String,
        node: &'static str,
    },
    /// A value did not have the type the field requires.
    TypeMismatch {
        field: String,
        expected: &'static str,
    },
}

impl PathError {
    pub(crate) fn type_mismatch(field: &str, expected: &'static str) -> Self {
        Self::TypeMismatch {
            field: field.to_owned(),
            expected,
        }
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "field path must not be empty"),
            Self::UnknownField { field, node } => {
                write!(f, "no field '{field}' on {node}")
            }
            Self::NotANode { field, node } => {
                write!(f, "field '{field}' on {node} is not a structural node")
            }
            Self::TypeMismatch { field, expected } => {
                write!(f, "value for field '{field}' is not a {expected}")
            }
        }
    }
}

impl std::error::Error for PathError {}
