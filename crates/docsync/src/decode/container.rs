//! The three container views handed to [`Decode`] implementations.

use std::any::type_name;

use docsync_path::{is_simple_segment, FieldPath};

use super::{Decode, DecodeContext, Decoder, ReferenceHandle};
use crate::error::DecodeError;
use crate::record::DocumentRecord;
use crate::value::{DocumentValue, Fields, ValueKind};

/// A leaf type that maps onto exactly one [`ValueKind`].
pub trait Primitive: Sized {
    const KIND: ValueKind;

    /// `None` if the value has another kind or does not fit `Self`.
    fn from_value(value: &DocumentValue) -> Option<Self>;
}

/// Field access on a map value, or on the document root.
///
/// Keys are dotted field paths: `"avatar.url"` walks two segments and a
/// missing intermediate reports the full path.
#[derive(Debug, Clone)]
pub struct KeyedContainer<'a> {
    record: &'a DocumentRecord,
    context: DecodeContext,
    fields: &'a Fields,
}

impl<'a> KeyedContainer<'a> {
    pub(super) fn new(record: &'a DocumentRecord, context: DecodeContext, fields: &'a Fields) -> Self {
        Self {
            record,
            context,
            fields,
        }
    }

    pub fn path(&self) -> &FieldPath {
        self.context.path()
    }

    pub fn context(&self) -> &DecodeContext {
        &self.context
    }

    /// Keys of this map that are valid field identifiers, in stored order.
    pub fn all_keys(&self) -> Vec<&'a str> {
        self.fields
            .keys()
            .map(String::as_str)
            .filter(|key| is_simple_segment(key))
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        match FieldPath::parse(key) {
            Ok(relative) if !relative.is_root() => {
                self.record.get(&self.path().join(&relative)).is_some()
            }
            _ => false,
        }
    }

    /// Decoder positioned at `key`.
    pub fn decoder(&self, key: &str) -> Result<Decoder<'a>, DecodeError> {
        let relative = FieldPath::parse(key)?;
        Ok(Decoder::new(self.record, self.context.descend(&relative)))
    }

    pub fn decode_primitive<P: Primitive>(&self, key: &str) -> Result<P, DecodeError> {
        self.decoder(key)?.single_value()?.decode()
    }

    pub fn decode<T: Decode>(&self, key: &str) -> Result<T, DecodeError> {
        T::decode(self.decoder(key)?)
    }

    /// `Ok(None)` when the key is absent or null.
    pub fn decode_optional<T: Decode>(&self, key: &str) -> Result<Option<T>, DecodeError> {
        Option::<T>::decode(self.decoder(key)?)
    }

    pub fn nested_keyed(&self, key: &str) -> Result<KeyedContainer<'a>, DecodeError> {
        self.decoder(key)?.keyed()
    }

    pub fn nested_unkeyed(&self, key: &str) -> Result<UnkeyedContainer<'a>, DecodeError> {
        self.decoder(key)?.unkeyed()
    }

    pub fn reference(&self, key: &str) -> Result<ReferenceHandle, DecodeError> {
        self.decoder(key)?.reference()
    }
}

#[derive(Debug, Clone)]
pub struct SingleValueContainer<'a> {
    context: DecodeContext,
    value: &'a DocumentValue,
}

impl<'a> SingleValueContainer<'a> {
    pub(super) fn new(context: DecodeContext, value: &'a DocumentValue) -> Self {
        Self { context, value }
    }

    pub fn path(&self) -> &FieldPath {
        self.context.path()
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn value(&self) -> &'a DocumentValue {
        self.value
    }

    /// Reads the value as `P`. Kinds are never coerced into each other.
    pub fn decode<P: Primitive>(&self) -> Result<P, DecodeError> {
        if let Some(decoded) = P::from_value(self.value) {
            return Ok(decoded);
        }
        let found = self.value.kind();
        if found == P::KIND {
            return Err(DecodeError::invalid_value(
                self.path(),
                format!("{found} does not fit in {}", type_name::<P>()),
            ));
        }
        Err(DecodeError::TypeMismatch {
            path: self.path().clone(),
            expected: P::KIND,
            found,
        })
    }

    /// Hands a stored reference (or a string holding a document path) to
    /// the ambient resolver.
    pub fn decode_reference(&self) -> Result<ReferenceHandle, DecodeError> {
        let resolver = self.context.resolver()?;
        match self.value {
            DocumentValue::Reference(path) | DocumentValue::String(path) => {
                Ok(resolver.resolve(path))
            }
            other => Err(DecodeError::TypeMismatch {
                path: self.path().clone(),
                expected: ValueKind::Reference,
                found: other.kind(),
            }),
        }
    }
}

/// Sequential access to an array value.
#[derive(Debug, Clone)]
pub struct UnkeyedContainer<'a> {
    record: &'a DocumentRecord,
    context: DecodeContext,
    items: &'a [DocumentValue],
    index: usize,
}

impl<'a> UnkeyedContainer<'a> {
    pub(super) fn new(
        record: &'a DocumentRecord,
        context: DecodeContext,
        items: &'a [DocumentValue],
    ) -> Self {
        Self {
            record,
            context,
            items,
            index: 0,
        }
    }

    pub fn path(&self) -> &FieldPath {
        self.context.path()
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.items.len()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn decode_next<T: Decode>(&mut self) -> Result<T, DecodeError> {
        T::decode(self.next_decoder()?)
    }

    pub fn decode_next_primitive<P: Primitive>(&mut self) -> Result<P, DecodeError> {
        self.next_decoder()?.single_value()?.decode()
    }

    pub fn decode_remaining<T: Decode>(&mut self) -> Result<Vec<T>, DecodeError> {
        let mut out = Vec::with_capacity(self.items.len().saturating_sub(self.index));
        while !self.is_at_end() {
            out.push(self.decode_next()?);
        }
        Ok(out)
    }

    fn next_decoder(&mut self) -> Result<Decoder<'a>, DecodeError> {
        if self.is_at_end() {
            return Err(DecodeError::ListExhausted {
                path: self.path().clone(),
                count: self.items.len(),
            });
        }
        let decoder = Decoder::new(self.record, self.context.append(self.index.to_string()));
        self.index += 1;
        Ok(decoder)
    }
}
