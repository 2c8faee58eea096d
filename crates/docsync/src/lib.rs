//! Typed decoding and live collection diffs for document stores.
//!
//! Two engines sit at the core:
//!
//! - [`decode`]: turns an immutable [`DocumentRecord`] into any type that
//!   implements [`Decode`], addressing values by [`FieldPath`] and reporting
//!   failures with the full requested path.
//! - [`diff`]: turns a [`ChangeBatch`] from a live listener into a typed
//!   [`DiffResult`] of additions, modifications and removals.
//!
//! [`Client`] binds both to a [`Transport`] and hands out cancellable
//! [`Subscription`]s.
//!
//! # Example
//!
//! ```
//! use docsync::diff::{diff_batch, ChangeBatch, ChangeEvent};
//! use docsync::{DecodeContext, DocumentPath, DocumentRecord};
//!
//! let record = |id: &str| {
//!     DocumentRecord::from_json(
//!         DocumentPath::parse(&format!("users/{id}")).unwrap(),
//!         serde_json::json!({ "username": id }),
//!     )
//!     .unwrap()
//! };
//! let batch = ChangeBatch {
//!     events: vec![ChangeEvent::Added { record: record("u1"), new_index: 0 }],
//!     membership: vec![record("u1")],
//!     ..Default::default()
//! };
//!
//! let diff = diff_batch::<std::collections::BTreeMap<String, String>>(
//!     &batch,
//!     &DecodeContext::default(),
//! )
//! .unwrap();
//! assert_eq!(diff.additions[0].index, 0);
//! assert_eq!(diff.current[0]["username"], "u1");
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod decode;
pub mod diff;
pub mod encode;
pub mod error;
pub mod media;
pub mod query;
pub mod record;
pub mod subscription;
pub mod value;

pub use docsync_path::{
    CollectionPath, DocumentPath, FieldPath, PathError, PathTemplate, TemplatePart,
};

pub use client::{Client, CollectionHandle, DocumentHandle};
pub use config::SyncConfig;
pub use decode::{
    decode, Capabilities, Decode, DecodeContext, Decoder, ReferenceHandle, ReferenceResolver,
};
pub use diff::{diff_batch, ChangeBatch, ChangeEvent, DiffResult, SnapshotMetadata};
pub use encode::{encode_record, Encode};
pub use error::{DecodeError, EncodeError, Error, TransportError, ValueError};
pub use media::{File, Url};
pub use query::{Query, QueryModifier};
pub use record::DocumentRecord;
pub use subscription::{DocumentSnapshot, ListenerRegistration, Subscription, Transport};
pub use value::{Bytes, DocumentValue, Fields, GeoPoint, Timestamp, ValueKind};
