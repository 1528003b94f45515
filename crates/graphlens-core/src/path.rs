//! Dynamic field paths.
//!
//! A [`FieldPath`] is an ordered, non-empty list of field names from a
//! root type down to a target field, used by the string-keyed fallback
//! addressing mode. Validation of the *shape* (non-empty, no blank
//! segments) happens at construction; validation against an actual node
//! type happens when the path is resolved.

use core::fmt;
use std::str::FromStr;

use crate::error::PathError;

/// An ordered, non-empty sequence of field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build a path from individual segments.
    ///
    /// Fails with [`PathError::Empty`] if there are no segments or any
    /// segment is blank.
    pub fn new<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(|s| s.trim().is_empty()) {
            return Err(PathError::Empty);
        }
        Ok(Self { segments })
    }

    /// Parse a dotted path like `"cto.name"`.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        Self::new(path.split('.'))
    }

    /// The path's segments, shallowest first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of hops from the root to the target field.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Concatenate two paths: `self` addresses the node that `tail` then
    /// descends into.
    #[must_use]
    pub fn join(&self, tail: &FieldPath) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.extend(tail.segments.iter().cloned());
        FieldPath { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
