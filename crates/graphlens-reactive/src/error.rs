//! Reactive-layer errors.
//!
//! Two distinct severities, following the taxonomy of the binding engine:
//!
//! - [`LensError`] is fatal. It reaches the caller as a `Result` and is
//!   never rerouted through a channel: a stale root or a bad path cannot
//!   be recovered from inside a binding link.
//! - [`ConvertError`] is recoverable. It is caught at the `select`
//!   boundary, reported on the out-of-band error channel, and the failing
//!   push is dropped.

use core::fmt;

use graphlens_core::PathError;

/// Fatal errors from operating a reactive lens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LensError {
    /// The externally-owned root holder has been dropped; the lens chain
    /// is permanently detached.
    Detached,
    /// A property lens was constructed with a multi-segment selector;
    /// root terminals address exactly one field.
    MultiSegment {
        /// The offending selector.
        field: String,
    },
    /// A dynamic field path failed to resolve.
    Path(PathError),
}

impl fmt::Display for LensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached => write!(f, "lens root has been dropped (stale reference)"),
            Self::MultiSegment { field } => {
                write!(f, "property selector '{field}' must be depth 1")
            }
            Self::Path(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Path(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PathError> for LensError {
    fn from(e: PathError) -> Self {
        Self::Path(e)
    }
}

/// Recoverable conversion failures, reported out of band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Input text (or index) did not parse as the target type.
    Parse {
        /// The rejected input, rendered as text.
        input: String,
        /// The type the input was meant to become.
        target: &'static str,
    },
    /// No converter is registered for this type pair.
    Unsupported {
        from: &'static str,
        to: &'static str,
    },
    /// A custom converter failed.
    Failed {
        message: String,
    },
}

impl ConvertError {
    /// A parse failure for `input` into `target`.
    pub fn parse(input: impl fmt::Display, target: &'static str) -> Self {
        Self::Parse {
            input: input.to_string(),
            target,
        }
    }

    /// A free-form converter failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { input, target } => {
                write!(f, "cannot parse '{input}' as {target}")
            }
            Self::Unsupported { from, to } => {
                write!(f, "no converter registered for {from} <-> {to}")
            }
            Self::Failed { message } => write!(f, "conversion failed: {message}"),
        }
    }
}

impl std::error::Error for ConvertError {}
