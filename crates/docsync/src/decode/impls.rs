use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::{Decode, Decoder, Primitive, ReferenceHandle};
use crate::error::DecodeError;
use crate::value::{Bytes, DocumentValue, GeoPoint, Timestamp, ValueKind};

/// Finite doubles beyond the `f32` range are rejected rather than
/// saturated to infinity. Precision loss within range is accepted.
fn narrow_f32(v: f64) -> Option<f32> {
    let narrowed = v as f32;
    (narrowed.is_finite() || !v.is_finite()).then_some(narrowed)
}

macro_rules! primitive {
    ($($t:ty => $kind:ident |$v:ident| $conv:expr;)*) => {
        $(
            impl Primitive for $t {
                const KIND: ValueKind = ValueKind::$kind;

                fn from_value(value: &DocumentValue) -> Option<Self> {
                    match value {
                        DocumentValue::$kind($v) => $conv,
                        _ => None,
                    }
                }
            }

            impl Decode for $t {
                fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
                    decoder.single_value()?.decode()
                }
            }
        )*
    };
}

primitive! {
    bool => Boolean |v| Some(*v);
    String => String |v| Some(v.clone());
    i64 => Integer |v| Some(*v);
    i32 => Integer |v| i32::try_from(*v).ok();
    i16 => Integer |v| i16::try_from(*v).ok();
    i8 => Integer |v| i8::try_from(*v).ok();
    u64 => Integer |v| u64::try_from(*v).ok();
    u32 => Integer |v| u32::try_from(*v).ok();
    u16 => Integer |v| u16::try_from(*v).ok();
    u8 => Integer |v| u8::try_from(*v).ok();
    usize => Integer |v| usize::try_from(*v).ok();
    f64 => Double |v| Some(*v);
    f32 => Double |v| narrow_f32(*v);
    Timestamp => Timestamp |v| Some(*v);
    GeoPoint => GeoPoint |v| Some(*v);
    Bytes => Bytes |v| Some(v.clone());
}

impl Decode for DocumentValue {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        if decoder.path().is_root() {
            return Ok(DocumentValue::Map(decoder.record().fields().clone()));
        }
        decoder
            .value()
            .cloned()
            .ok_or_else(|| DecodeError::KeyMissing {
                path: decoder.path().clone(),
            })
    }
}

impl Decode for ReferenceHandle {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        decoder.reference()
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        if decoder.is_null() {
            return Ok(None);
        }
        T::decode(decoder).map(Some)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        T::decode(decoder).map(Box::new)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        decoder.unkeyed()?.decode_remaining()
    }
}

impl<T: Decode> Decode for IndexMap<String, T> {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        let map = decoder.keyed()?;
        map.all_keys()
            .into_iter()
            .map(|key| Ok((key.to_string(), map.decode(key)?)))
            .collect()
    }
}

impl<T: Decode> Decode for BTreeMap<String, T> {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        let map = decoder.keyed()?;
        map.all_keys()
            .into_iter()
            .map(|key| Ok((key.to_string(), map.decode(key)?)))
            .collect()
    }
}
