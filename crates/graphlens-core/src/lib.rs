#![forbid(unsafe_code)]

//! Pure functional lenses over immutable object graphs.
//!
//! A [`Lens<R, T>`] is a composable get/set pair addressing one location in
//! an immutable structure: `get` reads the target out of a root, `set`
//! rebuilds a new root with the target replaced and everything off the
//! update path shared with the original.
//!
//! Two addressing styles are provided:
//!
//! - **Typed** (preferred): per-field lenses built with [`field_lens!`] and
//!   chained with [`Lens::then`]. Field resolution is checked at compile
//!   time; there is no runtime name lookup.
//! - **Dynamic** (fallback): string [`FieldPath`]s resolved against the
//!   [`Structural`] updater bridge, validated explicitly at construction
//!   via [`Lens::from_path`] or applied directly with [`with_props`].
//!
//! # Invariants
//!
//! 1. Lens laws: `get(set(r, v)) == v` and `set(r, get(r)) == r` under
//!    structural equality, for every lens and every composition of lenses.
//! 2. `set` never mutates its input; it returns a brand-new root.
//! 3. Structural sharing: nodes not on the updated path are shared with
//!    the original tree (reference-identical when held through `Rc`).
//! 4. Dynamic field names match declared names case-insensitively; an
//!    unknown or empty path fails with [`PathError`] synchronously, never
//!    silently.

pub mod error;
pub mod lens;
pub mod path;
pub mod structural;

pub use error::PathError;
pub use lens::Lens;
pub use path::FieldPath;
pub use structural::{FieldValue, Structural, path_get, with_props};
