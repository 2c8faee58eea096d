//! Document value model.
//!
//! [`DocumentValue`] is the closed set of kinds a stored document can hold.
//! Besides the JSON kinds it carries bytes, timestamps, geo points and
//! references to other documents. JSON interchange encodes those extra
//! kinds as single-key tagged objects:
//!
//! | kind      | JSON                                              |
//! |-----------|---------------------------------------------------|
//! | bytes     | `{"$bytes": "<base64>"}`                          |
//! | timestamp | `{"$timestamp": {"seconds": 1, "nanos": 0}}`      |
//! | geo point | `{"$geo": {"latitude": 1.0, "longitude": 2.0}}`   |
//! | reference | `{"$ref": "users/u1"}`                            |

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use docsync_path::{is_valid_index, DocumentPath};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::error::ValueError;

/// Insertion-ordered field map.
pub type Fields = IndexMap<String, DocumentValue>;

const TAG_BYTES: &str = "$bytes";
const TAG_TIMESTAMP: &str = "$timestamp";
const TAG_GEO: &str = "$geo";
const TAG_REF: &str = "$ref";

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// A point in time with nanosecond precision, relative to the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Result<Self, ValueError> {
        if nanos >= NANOS_PER_SECOND {
            return Err(ValueError::InvalidTimestamp { seconds, nanos });
        }
        Ok(Self { seconds, nanos })
    }

    pub fn from_unix_millis(millis: i64) -> Self {
        let seconds = millis.div_euclid(1000);
        let nanos = (millis.rem_euclid(1000) as u32) * 1_000_000;
        Self { seconds, nanos }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValueError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValueError::InvalidGeoPoint {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Opaque binary payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Double,
    String,
    Bytes,
    Timestamp,
    GeoPoint,
    Reference,
    Map,
    Array,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Timestamp => "timestamp",
            Self::GeoPoint => "geo point",
            Self::Reference => "reference",
            Self::Map => "map",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Bytes(Bytes),
    Timestamp(Timestamp),
    GeoPoint(GeoPoint),
    /// Path of another document, e.g. `users/u1`.
    Reference(String),
    Map(Fields),
    Array(Vec<DocumentValue>),
}

impl DocumentValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Double(_) => ValueKind::Double,
            Self::String(_) => ValueKind::String,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Timestamp(_) => ValueKind::Timestamp,
            Self::GeoPoint(_) => ValueKind::GeoPoint,
            Self::Reference(_) => ValueKind::Reference,
            Self::Map(_) => ValueKind::Map,
            Self::Array(_) => ValueKind::Array,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DocumentValue]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// One step down: a map key, or a canonical index into an array.
    pub fn child(&self, segment: &str) -> Option<&DocumentValue> {
        match self {
            Self::Map(m) => m.get(segment),
            Self::Array(items) if is_valid_index(segment) => {
                segment.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => None,
        }
    }

    /// Converts interchange JSON, expanding tagged objects.
    pub fn from_json(json: Value) -> Result<Self, ValueError> {
        Ok(match json {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => number_to_value(&n)?,
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => match tag_of(&map) {
                Some(tag) => from_tagged(tag, &map[tag])?,
                None => Self::Map(fields_from_json(map)?),
            },
        })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::Number((*i).into()),
            Self::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Bytes(b) => tagged(TAG_BYTES, Value::String(STANDARD.encode(b.as_slice()))),
            Self::Timestamp(t) => tagged(
                TAG_TIMESTAMP,
                serde_json::json!({ "seconds": t.seconds, "nanos": t.nanos }),
            ),
            Self::GeoPoint(g) => tagged(
                TAG_GEO,
                serde_json::json!({ "latitude": g.latitude, "longitude": g.longitude }),
            ),
            Self::Reference(path) => tagged(TAG_REF, Value::String(path.clone())),
            Self::Map(m) => Value::Object(
                m.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

pub(crate) fn fields_from_json(map: Map<String, Value>) -> Result<Fields, ValueError> {
    map.into_iter()
        .map(|(k, v)| Ok((k, DocumentValue::from_json(v)?)))
        .collect()
}

fn number_to_value(n: &Number) -> Result<DocumentValue, ValueError> {
    if let Some(i) = n.as_i64() {
        return Ok(DocumentValue::Integer(i));
    }
    if n.is_u64() {
        return Err(ValueError::IntegerOutOfRange(n.to_string()));
    }
    n.as_f64()
        .map(DocumentValue::Double)
        .ok_or_else(|| ValueError::IntegerOutOfRange(n.to_string()))
}

fn tag_of(map: &Map<String, Value>) -> Option<&'static str> {
    if map.len() != 1 {
        return None;
    }
    let key = map.keys().next()?;
    [TAG_BYTES, TAG_TIMESTAMP, TAG_GEO, TAG_REF]
        .into_iter()
        .find(|tag| *tag == key.as_str())
}

fn tagged(tag: &str, payload: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(tag.to_string(), payload);
    Value::Object(map)
}

fn from_tagged(tag: &'static str, payload: &Value) -> Result<DocumentValue, ValueError> {
    let malformed = || ValueError::MalformedTag(tag);
    match tag {
        TAG_BYTES => {
            let text = payload.as_str().ok_or_else(malformed)?;
            let bytes = STANDARD
                .decode(text)
                .map_err(|e| ValueError::InvalidBytes(e.to_string()))?;
            Ok(DocumentValue::Bytes(Bytes(bytes)))
        }
        TAG_TIMESTAMP => {
            let seconds = payload
                .get("seconds")
                .and_then(Value::as_i64)
                .ok_or_else(malformed)?;
            let nanos = match payload.get("nanos") {
                None => 0,
                Some(v) => v
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(malformed)?,
            };
            Timestamp::new(seconds, nanos).map(DocumentValue::Timestamp)
        }
        TAG_GEO => {
            let coord = |name: &str| payload.get(name).and_then(Value::as_f64);
            let (Some(latitude), Some(longitude)) = (coord("latitude"), coord("longitude")) else {
                return Err(malformed());
            };
            GeoPoint::new(latitude, longitude).map(DocumentValue::GeoPoint)
        }
        _ => {
            let path = payload.as_str().ok_or_else(malformed)?;
            DocumentPath::parse(path).map_err(|_| malformed())?;
            Ok(DocumentValue::Reference(path.to_string()))
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for DocumentValue {
            fn from(v: $t) -> Self {
                Self::$variant(v.into())
            }
        })*
    };
}

impl_from! {
    bool => Boolean,
    i64 => Integer,
    i32 => Integer,
    u32 => Integer,
    f64 => Double,
    String => String,
    &str => String,
    Bytes => Bytes,
    Timestamp => Timestamp,
    GeoPoint => GeoPoint,
    Fields => Map,
    Vec<DocumentValue> => Array,
}
