//! Point-in-time document records.

use docsync_path::{DocumentPath, FieldPath};
use serde_json::Value;

use crate::error::ValueError;
use crate::value::{fields_from_json, DocumentValue, Fields};

/// An immutable snapshot of one stored document.
///
/// Records are produced by the transport and only ever read by the
/// decoder and the diff engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    path: DocumentPath,
    fields: Fields,
}

impl DocumentRecord {
    pub fn new(path: DocumentPath, fields: Fields) -> Self {
        Self { path, fields }
    }

    /// Builds a record from an interchange JSON object.
    pub fn from_json(path: DocumentPath, json: Value) -> Result<Self, ValueError> {
        match json {
            Value::Object(map) => Ok(Self::new(path, fields_from_json(map)?)),
            other => Err(ValueError::NotAMap(
                DocumentValue::from_json(other)?.kind(),
            )),
        }
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    /// The document id, i.e. the last path segment.
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn get_key(&self, key: &str) -> Option<&DocumentValue> {
        self.fields.get(key)
    }

    /// Resolves a field path. The root path addresses the document itself
    /// and has no single value, so it resolves to `None`.
    pub fn get(&self, path: &FieldPath) -> Option<&DocumentValue> {
        let (first, rest) = path.segments().split_first()?;
        rest.iter()
            .try_fold(self.fields.get(first)?, |value, segment| value.child(segment))
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use serde_json::json;

    fn record() -> DocumentRecord {
        DocumentRecord::from_json(
            DocumentPath::parse("users/u1").unwrap(),
            json!({
                "username": "ada",
                "avatar": {"url": "https://img/ada.png", "sizes": [64, 128]}
            }),
        )
        .unwrap()
    }

    #[test]
    fn get_walks_nested_paths() {
        let r = record();
        assert_eq!(r.id(), "u1");
        let url = FieldPath::parse("avatar.url").unwrap();
        assert_eq!(
            r.get(&url),
            Some(&DocumentValue::String("https://img/ada.png".into()))
        );
        let size = FieldPath::parse("avatar.sizes.1").unwrap();
        assert_eq!(r.get(&size), Some(&DocumentValue::Integer(128)));
        assert_eq!(r.get(&FieldPath::parse("avatar.nope.deeper").unwrap()), None);
        assert_eq!(r.get(&FieldPath::parse("username.length").unwrap()), None);
        assert_eq!(r.get(&FieldPath::root()), None);
    }

    #[test]
    fn non_objects_are_rejected() {
        let path = DocumentPath::parse("users/u1").unwrap();
        assert_eq!(
            DocumentRecord::from_json(path, json!([1])),
            Err(ValueError::NotAMap(ValueKind::Array))
        );
    }

    #[test]
    fn to_json_keeps_field_order() {
        let r = record();
        let keys: Vec<String> = r.to_json().as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["username", "avatar"]);
    }
}
