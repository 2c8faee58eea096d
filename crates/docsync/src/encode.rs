//! The reverse of decoding: typed values back into document values.

use std::collections::BTreeMap;

use docsync_path::DocumentPath;
use indexmap::IndexMap;

use crate::decode::ReferenceHandle;
use crate::error::EncodeError;
use crate::record::DocumentRecord;
use crate::value::{Bytes, DocumentValue, Fields, GeoPoint, Timestamp};

pub trait Encode {
    fn encode(&self) -> DocumentValue;
}

/// Builds a map value field by field.
///
/// ```
/// use docsync::encode::MapEncoder;
/// use docsync::DocumentValue;
///
/// let nickname: Option<String> = None;
/// let value = MapEncoder::new()
///     .field("name", "ada")
///     .field("age", &36i64)
///     .field_if_present("nickname", &nickname)
///     .finish();
/// assert_eq!(value.as_map().map(|m| m.len()), Some(2));
/// ```
#[derive(Debug, Default)]
pub struct MapEncoder {
    fields: Fields,
}

impl MapEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field<T: Encode + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.fields.insert(key.to_string(), value.encode());
        self
    }

    /// Skips the field entirely when `value` is `None`.
    pub fn field_if_present<T: Encode>(self, key: &str, value: &Option<T>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    pub fn finish(self) -> DocumentValue {
        DocumentValue::Map(self.fields)
    }
}

/// Encodes `value` as the fields of the document at `path`.
pub fn encode_record<T: Encode + ?Sized>(
    path: DocumentPath,
    value: &T,
) -> Result<DocumentRecord, EncodeError> {
    match value.encode() {
        DocumentValue::Map(fields) => Ok(DocumentRecord::new(path, fields)),
        other => Err(EncodeError::NotAMap {
            found: other.kind(),
        }),
    }
}

macro_rules! encode_into {
    ($($t:ty),* $(,)?) => {
        $(impl Encode for $t {
            fn encode(&self) -> DocumentValue {
                DocumentValue::from(self.clone())
            }
        })*
    };
}

encode_into!(bool, i64, i32, u32, f64, String, Bytes, Timestamp, GeoPoint);

macro_rules! encode_integer {
    ($($t:ty),* $(,)?) => {
        $(impl Encode for $t {
            fn encode(&self) -> DocumentValue {
                DocumentValue::Integer(i64::from(*self))
            }
        })*
    };
}

encode_integer!(i8, i16, u8, u16);

macro_rules! encode_saturating {
    ($($t:ty),* $(,)?) => {
        $(
            /// Values above `i64::MAX` saturate to `i64::MAX`; the store has
            /// no unsigned 64-bit integer.
            impl Encode for $t {
                fn encode(&self) -> DocumentValue {
                    DocumentValue::Integer(i64::try_from(*self).unwrap_or(i64::MAX))
                }
            }
        )*
    };
}

encode_saturating!(u64, usize);

impl Encode for f32 {
    fn encode(&self) -> DocumentValue {
        DocumentValue::Double(f64::from(*self))
    }
}

impl Encode for str {
    fn encode(&self) -> DocumentValue {
        DocumentValue::String(self.to_string())
    }
}

impl Encode for DocumentValue {
    fn encode(&self) -> DocumentValue {
        self.clone()
    }
}

impl Encode for ReferenceHandle {
    fn encode(&self) -> DocumentValue {
        DocumentValue::Reference(self.path().to_string())
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self) -> DocumentValue {
        (**self).encode()
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self) -> DocumentValue {
        (**self).encode()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self) -> DocumentValue {
        self.as_ref().map_or(DocumentValue::Null, Encode::encode)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self) -> DocumentValue {
        DocumentValue::Array(self.iter().map(Encode::encode).collect())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self) -> DocumentValue {
        self.as_slice().encode()
    }
}

impl<T: Encode> Encode for IndexMap<String, T> {
    fn encode(&self) -> DocumentValue {
        DocumentValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.encode()))
                .collect(),
        )
    }
}

impl<T: Encode> Encode for BTreeMap<String, T> {
    fn encode(&self) -> DocumentValue {
        DocumentValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.encode()))
                .collect(),
        )
    }
}
