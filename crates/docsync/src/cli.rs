//! Logic behind the `docsync` binary.
//!
//! - `decode`: decode a JSON record, whole or a single field
//! - `diff`: run a JSON change batch through the diff engine

use docsync_path::{DocumentPath, FieldPath, PathError};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, LogFormat, LoggingConfig};
use crate::decode::{decode, Decode, DecodeContext, Decoder};
use crate::diff::{diff_batch, ChangeBatch, ChangeEvent, DiffError, DiffResult, SnapshotMetadata};
use crate::error::{DecodeError, ValueError};
use crate::record::DocumentRecord;
use crate::value::DocumentValue;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Diff(#[from] DiffError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}

// ── Logging ───────────────────────────────────────────────────────────────

/// Installs a stderr fmt subscriber. `RUST_LOG` wins over the configured
/// level.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), CliError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|e| CliError::Logging(e.to_string()))
}

// ── Wire format ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireDocument {
    path: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireChange {
    Added {
        #[serde(rename = "newIndex")]
        new_index: usize,
        document: WireDocument,
    },
    Modified {
        #[serde(rename = "oldIndex")]
        old_index: usize,
        #[serde(rename = "newIndex")]
        new_index: usize,
        document: WireDocument,
    },
    Removed {
        #[serde(rename = "oldIndex")]
        old_index: usize,
        document: WireDocument,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireMetadata {
    is_from_cache: bool,
    has_pending_writes: bool,
}

#[derive(Debug, Deserialize)]
struct WireBatch {
    #[serde(default)]
    events: Vec<WireChange>,
    #[serde(default)]
    membership: Vec<WireDocument>,
    #[serde(default)]
    metadata: WireMetadata,
}

impl WireDocument {
    fn into_record(self) -> Result<DocumentRecord, CliError> {
        let path = DocumentPath::parse(&self.path)?;
        Ok(DocumentRecord::from_json(path, Value::Object(self.fields))?)
    }
}

impl WireChange {
    fn into_event(self) -> Result<ChangeEvent, CliError> {
        Ok(match self {
            Self::Added {
                new_index,
                document,
            } => ChangeEvent::Added {
                record: document.into_record()?,
                new_index,
            },
            Self::Modified {
                old_index,
                new_index,
                document,
            } => ChangeEvent::Modified {
                record: document.into_record()?,
                old_index,
                new_index,
            },
            Self::Removed {
                old_index,
                document,
            } => ChangeEvent::Removed {
                record: document.into_record()?,
                old_index,
            },
        })
    }
}

/// Parses a change batch:
/// `{"events": [{"type": "added", "newIndex": 0, "document": {...}}],
///   "membership": [...], "metadata": {"isFromCache": false}}`.
pub fn parse_batch(json: &str) -> Result<ChangeBatch, CliError> {
    let wire: WireBatch = serde_json::from_str(json)?;
    Ok(ChangeBatch {
        events: wire
            .events
            .into_iter()
            .map(WireChange::into_event)
            .collect::<Result<_, _>>()?,
        membership: wire
            .membership
            .into_iter()
            .map(WireDocument::into_record)
            .collect::<Result<_, _>>()?,
        metadata: SnapshotMetadata {
            is_from_cache: wire.metadata.is_from_cache,
            has_pending_writes: wire.metadata.has_pending_writes,
        },
    })
}

pub fn parse_record(document: &str, json: &str) -> Result<DocumentRecord, CliError> {
    let value: Value = serde_json::from_str(json)?;
    Ok(DocumentRecord::from_json(DocumentPath::parse(document)?, value)?)
}

// ── decode ────────────────────────────────────────────────────────────────

/// Decodes the record in `json`, or only the value at `field`.
pub fn decode_json(
    json: &str,
    document: &str,
    field: Option<&str>,
    context: &DecodeContext,
) -> Result<Value, CliError> {
    let record = parse_record(document, json)?;
    let context = match field {
        Some(field) => context.descend(&FieldPath::parse(field)?),
        None => context.clone(),
    };
    let value: DocumentValue = decode(&record, &context)?;
    Ok(value.to_json())
}

// ── diff ──────────────────────────────────────────────────────────────────

/// A document decoded as an open map, remembering where it came from.
struct OpenDocument {
    path: DocumentPath,
    fields: DocumentValue,
}

impl Decode for OpenDocument {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            path: decoder.record().path().clone(),
            fields: DocumentValue::decode(decoder)?,
        })
    }
}

impl OpenDocument {
    fn to_json(&self) -> Value {
        json!({ "path": self.path.to_string(), "fields": self.fields.to_json() })
    }
}

pub fn diff_json(json: &str, context: &DecodeContext) -> Result<Value, CliError> {
    let batch = parse_batch(json)?;
    let diff: DiffResult<OpenDocument> = diff_batch(&batch, context)?;
    Ok(json!({
        "current": diff.current.iter().map(OpenDocument::to_json).collect::<Vec<_>>(),
        "additions": diff.additions.iter().map(|a| json!({
            "index": a.index,
            "document": a.value.to_json(),
        })).collect::<Vec<_>>(),
        "modifications": diff.modifications.iter().map(|m| json!({
            "oldIndex": m.old_index,
            "newIndex": m.new_index,
            "document": m.value.to_json(),
        })).collect::<Vec<_>>(),
        "removals": diff.removals.iter().map(|r| json!({
            "oldIndex": r.old_index,
            "document": r.value.to_json(),
        })).collect::<Vec<_>>(),
        "metadata": {
            "isFromCache": diff.metadata.is_from_cache,
            "hasPendingWrites": diff.metadata.has_pending_writes,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_whole_record_and_field() {
        let ctx = DecodeContext::default();
        let input = r#"{"name": "ada", "avatar": {"url": "a.png"}}"#;
        let whole = decode_json(input, "users/u1", None, &ctx).unwrap();
        assert_eq!(whole, json!({"name": "ada", "avatar": {"url": "a.png"}}));
        let url = decode_json(input, "users/u1", Some("avatar.url"), &ctx).unwrap();
        assert_eq!(url, json!("a.png"));
    }

    #[test]
    fn decode_missing_field_is_key_missing() {
        let ctx = DecodeContext::default();
        let err = decode_json("{}", "users/u1", Some("avatar.url"), &ctx).unwrap_err();
        assert!(matches!(
            err,
            CliError::Decode(DecodeError::KeyMissing { .. })
        ));
        assert_eq!(err.to_string(), "no value at `avatar.url`");
    }

    #[test]
    fn diff_batch_from_json() {
        let input = r#"{
            "events": [
                {"type": "added", "newIndex": 0, "document": {"path": "users/u1", "fields": {"n": 1}}},
                {"type": "removed", "oldIndex": 1, "document": {"path": "users/u9", "fields": {}}}
            ],
            "membership": [{"path": "users/u1", "fields": {"n": 1}}],
            "metadata": {"hasPendingWrites": true}
        }"#;
        let out = diff_json(input, &DecodeContext::default()).unwrap();
        assert_eq!(out["current"][0]["path"], "users/u1");
        assert_eq!(out["additions"][0]["index"], 0);
        assert_eq!(out["removals"][0]["oldIndex"], 1);
        assert_eq!(out["removals"][0]["document"]["path"], "users/u9");
        assert_eq!(out["modifications"], json!([]));
        assert_eq!(out["metadata"]["hasPendingWrites"], true);
        assert_eq!(out["metadata"]["isFromCache"], false);
    }

    #[test]
    fn bad_document_path_is_rejected() {
        let input = r#"{"membership": [{"path": "users", "fields": {}}]}"#;
        assert!(matches!(
            diff_json(input, &DecodeContext::default()),
            Err(CliError::Path(PathError::NotADocument(_)))
        ));
    }
}
