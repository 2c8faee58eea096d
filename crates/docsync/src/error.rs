use std::fmt;
use std::sync::Arc;

use docsync_path::{DocumentPath, FieldPath, PathError};
use thiserror::Error;

use crate::decode::{Capability, ContainerKind};
use crate::diff::DiffError;
use crate::value::ValueKind;

/// Errors raised while building values from interchange JSON.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    #[error("invalid base64 payload: {0}")]
    InvalidBytes(String),
    #[error("invalid timestamp {seconds}s {nanos}ns")]
    InvalidTimestamp { seconds: i64, nanos: u32 },
    #[error("invalid geo point ({latitude}, {longitude})")]
    InvalidGeoPoint { latitude: f64, longitude: f64 },
    #[error("integer {0} does not fit in 64 bits")]
    IntegerOutOfRange(String),
    #[error("malformed `{0}` value")]
    MalformedTag(&'static str),
    #[error("expected a map, found {0}")]
    NotAMap(ValueKind),
}

/// Errors raised while materializing a typed value from a record.
///
/// Every variant that concerns a position in the record carries the full
/// requested path, not the path of the last segment that resolved.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("no value at `{path}`")]
    KeyMissing { path: FieldPath },
    #[error("type mismatch at `{path}`: expected {expected}, found {found}")]
    TypeMismatch {
        path: FieldPath,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("cannot open a {requested} container at `{path}`: found {found}")]
    UnsupportedContainer {
        path: FieldPath,
        requested: ContainerKind,
        found: ValueKind,
    },
    #[error("decode context has no {capability}")]
    ContextMissing { capability: Capability },
    #[error("array at `{path}` is exhausted after {count} elements")]
    ListExhausted { path: FieldPath, count: usize },
    #[error("invalid value at `{path}`: {message}")]
    InvalidValue { path: FieldPath, message: String },
    #[error("path `{path}` is deeper than the limit of {max}")]
    DepthExceeded { path: FieldPath, max: usize },
    #[error(transparent)]
    Path(#[from] PathError),
}

impl DecodeError {
    pub fn invalid_value(path: &FieldPath, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// The record position this error refers to, if any.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::KeyMissing { path }
            | Self::TypeMismatch { path, .. }
            | Self::UnsupportedContainer { path, .. }
            | Self::ListExhausted { path, .. }
            | Self::InvalidValue { path, .. }
            | Self::DepthExceeded { path, .. } => Some(path),
            Self::ContextMissing { .. } | Self::Path(_) => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodeError {
    #[error("a document must encode to a map, found {found}")]
    NotAMap { found: ValueKind },
}

/// Opaque failure reported by the transport collaborator.
///
/// The wrapped error is forwarded to subscribers untouched.
#[derive(Clone)]
pub struct TransportError(Arc<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self(Arc::new(MessageError(message.into())))
    }

    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// True if both values wrap the same underlying error.
    pub fn same_as(&self, other: &TransportError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TransportError").field(&self.0).finish()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}

/// Error delivered to subscription and watch callbacks.
#[derive(Debug, Error, Clone)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Diff(#[from] DiffError),
    #[error("document `{0}` does not exist")]
    NotFound(DocumentPath),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
