//! The structural updater bridge: dynamic field access over immutable
//! nodes.
//!
//! [`Structural`] is the capability an immutable node type supplies so the
//! string-keyed addressing mode can read and non-destructively replace
//! named fields. [`with_props`] composes per-node updates along a
//! [`FieldPath`], rebuilding every ancestor from the leaf up while sharing
//! all off-path structure.
//!
//! # Invariants
//!
//! 1. `with_field` never mutates the receiver; it returns a rebuilt copy.
//! 2. Field names resolve case-insensitively against the declared names
//!    (`"cto"`, `"Cto"` and `"CTO"` all address the same field).
//! 3. `with_props(root, path, get(root, path))` is structurally equal to
//!    `root`.
//! 4. Intermediate ancestors are re-read from the root on each hop, so a
//!    node reachable twice through different paths is updated through the
//!    path given, not through stale copies.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `PathError::Empty` | Path with no segments | Rejected up front |
//! | `PathError::UnknownField` | Segment not declared on the node | Fatal, synchronous |
//! | `PathError::NotANode` | Intermediate segment names a leaf | Fatal, synchronous |
//! | `PathError::TypeMismatch` | Value downcast fails at the leaf | Fatal, synchronous |

use std::any::Any;

use crate::error::PathError;
use crate::path::FieldPath;

/// A type-erased field value.
pub type FieldValue = Box<dyn Any>;

/// Dynamic read/update capability over one immutable node.
///
/// Usually implemented via [`impl_structural!`] rather than by hand.
pub trait Structural: Any {
    /// A short label for this node type, used in error messages.
    fn type_label(&self) -> &'static str;

    /// The declared field names, in declaration order.
    fn field_names(&self) -> &'static [&'static str];

    /// Clone this node behind the trait object.
    fn boxed_clone(&self) -> Box<dyn Structural>;

    /// Read a field as a type-erased clone.
    fn get_field(&self, field: &str) -> Result<FieldValue, PathError>;

    /// Read a field that is itself a structural node.
    ///
    /// Fails with [`PathError::NotANode`] for leaf fields.
    fn get_node(&self, field: &str) -> Result<Box<dyn Structural>, PathError>;

    /// Rebuild this node with one field replaced, all others copied.
    ///
    /// The returned box holds a new instance of `Self`.
    fn with_field(&self, field: &str, value: FieldValue) -> Result<FieldValue, PathError>;
}

/// Read the value at `path`, walking intermediate nodes from the root.
pub fn path_get<R, T>(root: &R, path: &FieldPath) -> Result<T, PathError>
where
    R: Structural,
    T: Any,
{
    let segments = path.segments();
    let (leaf, ancestors) = segments.split_last().ok_or(PathError::Empty)?;

    let mut node: Box<dyn Structural> = root.boxed_clone();
    for segment in ancestors {
        node = node.get_node(segment)?;
    }
    let value = node.get_field(leaf)?;
    let expected = std::any::type_name::<T>();
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| PathError::type_mismatch(leaf, expected))
}

/// Rebuild `root` with the field at `path` replaced by `value`.
///
/// For each segment from deepest to shallowest, the owning ancestor is
/// re-read from the root and asked to rebuild itself with the accumulated
/// subtree substituted in, until a new root is produced. Nodes off the
/// path are shared with the original.
pub fn with_props<R, T>(root: &R, path: &FieldPath, value: T) -> Result<R, PathError>
where
    R: Structural,
    T: Any,
{
    let segments = path.segments();
    if segments.is_empty() {
        return Err(PathError::Empty);
    }

    let mut acc: FieldValue = Box::new(value);
    for depth in (0..segments.len()).rev() {
        let mut node: Box<dyn Structural> = root.boxed_clone();
        for segment in &segments[..depth] {
            node = node.get_node(segment)?;
        }
        acc = node.with_field(&segments[depth], acc)?;
    }

    let expected = std::any::type_name::<R>();
    acc.downcast::<R>()
        .map(|boxed| *boxed)
        .map_err(|_| PathError::type_mismatch(&segments[0], expected))
}

/// Implement [`Structural`] for a `Clone` struct.
///
/// Fields are split into `leaves` (opaque values) and `nodes` (fields
/// whose type itself implements [`Structural`], so paths may descend into
/// them):
///
/// ```ignore
/// impl_structural! {
///     Company {
///         leaves { name: String }
///         nodes { cto: Person }
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_structural {
    ($ty:ident {
        leaves { $($leaf:ident : $lty:ty),* $(,)? }
        nodes { $($node:ident : $nty:ty),* $(,)? }
    }) => {
        impl $crate::Structural for $ty {
            fn type_label(&self) -> &'static str {
                stringify!($ty)
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[$(stringify!($leaf),)* $(stringify!($node),)*]
            }

            fn boxed_clone(&self) -> Box<dyn $crate::Structural> {
                Box::new(self.clone())
            }

            fn get_field(
                &self,
                field: &str,
            ) -> Result<$crate::FieldValue, $crate::PathError> {
                $(if field.eq_ignore_ascii_case(stringify!($leaf)) {
                    return Ok(Box::new(self.$leaf.clone()));
                })*
                $(if field.eq_ignore_ascii_case(stringify!($node)) {
                    return Ok(Box::new(self.$node.clone()));
                })*
                Err($crate::PathError::UnknownField {
                    field: field.to_owned(),
                    node: stringify!($ty),
                })
            }

            fn get_node(
                &self,
                field: &str,
            ) -> Result<Box<dyn $crate::Structural>, $crate::PathError> {
                $(if field.eq_ignore_ascii_case(stringify!($node)) {
                    return Ok(Box::new(self.$node.clone()));
                })*
                $(if field.eq_ignore_ascii_case(stringify!($leaf)) {
                    return Err($crate::PathError::NotANode {
                        field: field.to_owned(),
                        node: stringify!($ty),
                    });
                })*
                Err($crate::PathError::UnknownField {
                    field: field.to_owned(),
                    node: stringify!($ty),
                })
            }

            fn with_field(
                &self,
                field: &str,
                value: $crate::FieldValue,
            ) -> Result<$crate::FieldValue, $crate::PathError> {
                $(if field.eq_ignore_ascii_case(stringify!($leaf)) {
                    let value = value.downcast::<$lty>().map_err(|_| {
                        $crate::PathError::TypeMismatch {
                            field: field.to_owned(),
                            expected: std::any::type_name::<$lty>(),
                        }
                    })?;
                    let mut next = self.clone();
                    next.$leaf = *value;
                    return Ok(Box::new(next));
                })*
                $(if field.eq_ignore_ascii_case(stringify!($node)) {
                    let value = value.downcast::<$nty>().map_err(|_| {
                        $crate::PathError::TypeMismatch {
                            field: field.to_owned(),
                            expected: std::any::type_name::<$nty>(),
                        }
                    })?;
                    let mut next = self.clone();
                    next.$node = *value;
                    return Ok(Box::new(next));
                })*
                Err($crate::PathError::UnknownField {
                    field: field.to_owned(),
                    node: stringify!($ty),
                })
            }
        }
    };
}
