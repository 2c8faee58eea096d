//! Path-addressed decoding of [`DocumentRecord`]s into typed values.
//!
//! A type opts in by implementing [`Decode`]. Its implementation asks the
//! [`Decoder`] for one of three container views, keyed, single-value or
//! unkeyed, and pulls its fields out of it. Nested values get a decoder
//! whose context path is extended by the field key, so every error names
//! the full path that was requested.
//!
//! # Example
//!
//! ```
//! use docsync::decode::{decode, Decode, DecodeContext, Decoder};
//! use docsync::{DecodeError, DocumentPath, DocumentRecord};
//!
//! struct User {
//!     name: String,
//!     avatar_url: Option<String>,
//! }
//!
//! impl Decode for User {
//!     fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
//!         let fields = decoder.keyed()?;
//!         Ok(User {
//!             name: fields.decode("name")?,
//!             avatar_url: fields.decode_optional("avatar.url")?,
//!         })
//!     }
//! }
//!
//! let record = DocumentRecord::from_json(
//!     DocumentPath::parse("users/u1").unwrap(),
//!     serde_json::json!({"name": "ada", "avatar": {"url": "a.png"}}),
//! )
//! .unwrap();
//! let user: User = decode(&record, &DecodeContext::default()).unwrap();
//! assert_eq!(user.name, "ada");
//! assert_eq!(user.avatar_url.as_deref(), Some("a.png"));
//! ```

use std::fmt;

use docsync_path::FieldPath;

use crate::error::DecodeError;
use crate::record::DocumentRecord;
use crate::value::{DocumentValue, ValueKind};

pub mod container;
pub mod context;
mod impls;

pub use container::{KeyedContainer, Primitive, SingleValueContainer, UnkeyedContainer};
pub use context::{
    Capabilities, Capability, DecodeContext, PathResolver, ReferenceHandle, ReferenceResolver,
};

/// A type that can be materialized from a document record.
pub trait Decode: Sized {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError>;
}

/// Decodes `T` from `record`, starting at the context's path.
pub fn decode<T: Decode>(record: &DocumentRecord, context: &DecodeContext) -> Result<T, DecodeError> {
    T::decode(Decoder::new(record, context.clone()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Keyed,
    SingleValue,
    Unkeyed,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keyed => "keyed",
            Self::SingleValue => "single-value",
            Self::Unkeyed => "unkeyed",
        })
    }
}

/// A container view chosen by the caller.
#[derive(Debug)]
pub enum Container<'a> {
    Keyed(KeyedContainer<'a>),
    SingleValue(SingleValueContainer<'a>),
    Unkeyed(UnkeyedContainer<'a>),
}

impl Container<'_> {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Keyed(_) => ContainerKind::Keyed,
            Self::SingleValue(_) => ContainerKind::SingleValue,
            Self::Unkeyed(_) => ContainerKind::Unkeyed,
        }
    }
}

/// One position in a record being decoded.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    record: &'a DocumentRecord,
    context: DecodeContext,
}

impl<'a> Decoder<'a> {
    pub fn new(record: &'a DocumentRecord, context: DecodeContext) -> Self {
        Self { record, context }
    }

    pub fn path(&self) -> &FieldPath {
        self.context.path()
    }

    pub fn context(&self) -> &DecodeContext {
        &self.context
    }

    pub fn record(&self) -> &'a DocumentRecord {
        self.record
    }

    /// The value at this position; `None` at the root or when absent.
    pub fn value(&self) -> Option<&'a DocumentValue> {
        self.record.get(self.context.path())
    }

    pub fn is_absent(&self) -> bool {
        !self.path().is_root() && self.value().is_none()
    }

    /// Absent or explicitly null.
    pub fn is_null(&self) -> bool {
        self.is_absent() || self.value().is_some_and(DocumentValue::is_null)
    }

    /// Decoder for a (possibly dotted) key below this position.
    pub fn child(&self, key: &str) -> Result<Decoder<'a>, DecodeError> {
        let relative = FieldPath::parse(key)?;
        Ok(Self::new(self.record, self.context.descend(&relative)))
    }

    pub fn keyed(&self) -> Result<KeyedContainer<'a>, DecodeError> {
        self.check_depth()?;
        if self.path().is_root() {
            return Ok(KeyedContainer::new(
                self.record,
                self.context.clone(),
                self.record.fields(),
            ));
        }
        match self.present()? {
            DocumentValue::Map(fields) => Ok(KeyedContainer::new(
                self.record,
                self.context.clone(),
                fields,
            )),
            other => Err(self.unsupported(ContainerKind::Keyed, other.kind())),
        }
    }

    pub fn single_value(&self) -> Result<SingleValueContainer<'a>, DecodeError> {
        self.check_depth()?;
        if self.path().is_root() {
            return Err(self.unsupported(ContainerKind::SingleValue, ValueKind::Map));
        }
        Ok(SingleValueContainer::new(
            self.context.clone(),
            self.present()?,
        ))
    }

    pub fn unkeyed(&self) -> Result<UnkeyedContainer<'a>, DecodeError> {
        self.check_depth()?;
        if self.path().is_root() {
            return Err(self.unsupported(ContainerKind::Unkeyed, ValueKind::Map));
        }
        match self.present()? {
            DocumentValue::Array(items) => Ok(UnkeyedContainer::new(
                self.record,
                self.context.clone(),
                items,
            )),
            other => Err(self.unsupported(ContainerKind::Unkeyed, other.kind())),
        }
    }

    pub fn container(&self, kind: ContainerKind) -> Result<Container<'a>, DecodeError> {
        Ok(match kind {
            ContainerKind::Keyed => Container::Keyed(self.keyed()?),
            ContainerKind::SingleValue => Container::SingleValue(self.single_value()?),
            ContainerKind::Unkeyed => Container::Unkeyed(self.unkeyed()?),
        })
    }

    pub fn reference(&self) -> Result<ReferenceHandle, DecodeError> {
        self.context.resolver()?;
        self.single_value()?.decode_reference()
    }

    fn present(&self) -> Result<&'a DocumentValue, DecodeError> {
        self.value().ok_or_else(|| DecodeError::KeyMissing {
            path: self.path().clone(),
        })
    }

    fn unsupported(&self, requested: ContainerKind, found: ValueKind) -> DecodeError {
        DecodeError::UnsupportedContainer {
            path: self.path().clone(),
            requested,
            found,
        }
    }

    fn check_depth(&self) -> Result<(), DecodeError> {
        let max = self.context.capabilities().max_depth();
        if self.path().len() > max {
            return Err(DecodeError::DepthExceeded {
                path: self.path().clone(),
                max,
            });
        }
        Ok(())
    }
}
