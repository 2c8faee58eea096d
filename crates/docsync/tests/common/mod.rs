#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use docsync::decode::{DecodeContext, Decoder, PathResolver};
use docsync::encode::MapEncoder;
use docsync::subscription::{BatchListener, DocumentListener};
use docsync::{
    Capabilities, ChangeBatch, CollectionPath, Decode, DecodeError, DocumentPath, DocumentRecord,
    DocumentSnapshot, DocumentValue, Encode, File, GeoPoint, ListenerRegistration, Query,
    ReferenceHandle, Timestamp, Transport, TransportError, Url,
};
use parking_lot::Mutex;
use serde_json::Value;

// ── Fixtures ──────────────────────────────────────────────────────────────

pub fn record(path: &str, json: Value) -> DocumentRecord {
    DocumentRecord::from_json(DocumentPath::parse(path).expect("valid path"), json)
        .expect("valid record json")
}

pub fn user_record(id: &str, username: &str) -> DocumentRecord {
    record(
        &format!("users/{id}"),
        serde_json::json!({
            "username": username,
            "age": 30,
            "verified": true,
            "score": 1.5,
        }),
    )
}

pub fn resolver_context() -> DecodeContext {
    DecodeContext::new(Capabilities::new().with_resolver(Arc::new(PathResolver::for_database("test"))))
}

// ── Domain types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Avatar {
    pub url: Url,
    pub file: Option<File>,
}

impl Decode for Avatar {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        let fields = decoder.keyed()?;
        Ok(Self {
            url: fields.decode("url")?,
            file: fields.decode_optional("file")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub username: String,
    pub display_name: Option<String>,
    pub age: i64,
    pub verified: bool,
    pub score: f64,
    pub avatar: Option<Avatar>,
}

impl Decode for User {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        let fields = decoder.keyed()?;
        Ok(Self {
            username: fields.decode_primitive("username")?,
            display_name: fields.decode_optional("displayName")?,
            age: fields.decode_primitive("age")?,
            verified: fields.decode_primitive("verified")?,
            score: fields.decode_primitive("score")?,
            avatar: fields.decode_optional("avatar")?,
        })
    }
}

impl Encode for User {
    fn encode(&self) -> DocumentValue {
        MapEncoder::new()
            .field("username", &self.username)
            .field_if_present("displayName", &self.display_name)
            .field("age", &self.age)
            .field("verified", &self.verified)
            .field("score", &self.score)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Global,
    Friends,
    Invalid(String),
}

impl Decode for Audience {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        let raw: String = decoder.single_value()?.decode()?;
        Ok(match raw.as_str() {
            "GLOBAL" => Self::Global,
            "FRIENDS" => Self::Friends,
            _ => Self::Invalid(raw),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gram {
    pub caption: String,
    pub audience: Audience,
    pub created_at: Timestamp,
    pub author: ReferenceHandle,
    pub location: Option<GeoPoint>,
    pub tags: Vec<String>,
    pub likes: BTreeMap<String, bool>,
}

impl Decode for Gram {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        let fields = decoder.keyed()?;
        Ok(Self {
            caption: fields.decode("caption")?,
            audience: fields.decode("audience")?,
            created_at: fields.decode("createdAt")?,
            author: fields.reference("author")?,
            location: fields.decode_optional("location")?,
            tags: fields.decode("tags")?,
            likes: fields.decode_optional("likes")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text { text: String },
    Photo { file: File },
}

impl Decode for MessageContent {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        let fields = decoder.keyed()?;
        let kind: String = fields.decode("type")?;
        match kind.as_str() {
            "TEXT" => Ok(Self::Text {
                text: fields.decode("text")?,
            }),
            "PHOTO" => Ok(Self::Photo {
                file: fields.decode("file")?,
            }),
            other => Err(DecodeError::invalid_value(
                &fields.path().child("type"),
                format!("unknown message type `{other}`"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub sender: ReferenceHandle,
    pub sent_at: Timestamp,
    pub content: MessageContent,
}

impl Decode for Message {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        let fields = decoder.keyed()?;
        Ok(Self {
            sender: fields.decode("sender")?,
            sent_at: fields.decode("sentAt")?,
            content: fields.decode("content")?,
        })
    }
}

// ── Scripted transport ────────────────────────────────────────────────────

type Slot<T> = Arc<Mutex<T>>;

#[derive(Default)]
struct State {
    next_id: u64,
    collections: BTreeMap<u64, (CollectionPath, Slot<BatchListener>)>,
    documents: BTreeMap<u64, (DocumentPath, Slot<DocumentListener>)>,
    queries: Vec<Query>,
    removals: usize,
}

/// In-process transport: tests push batches and snapshots by hand.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<State>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `delivery` to every listener on `collection`; returns how
    /// many listeners received it.
    pub fn push_batch(&self, collection: &str, delivery: Result<ChangeBatch, TransportError>) -> usize {
        let listeners: Vec<_> = {
            let state = self.state.lock();
            state
                .collections
                .values()
                .filter(|(path, _)| path.to_string() == collection)
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };
        for listener in &listeners {
            let mut listener = listener.lock();
            (&mut **listener)(delivery.clone());
        }
        listeners.len()
    }

    pub fn push_snapshot(
        &self,
        document: &str,
        delivery: Result<DocumentSnapshot, TransportError>,
    ) -> usize {
        let listeners: Vec<_> = {
            let state = self.state.lock();
            state
                .documents
                .values()
                .filter(|(path, _)| path.to_string() == document)
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };
        for listener in &listeners {
            let mut listener = listener.lock();
            (&mut **listener)(delivery.clone());
        }
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        let state = self.state.lock();
        state.collections.len() + state.documents.len()
    }

    pub fn removals(&self) -> usize {
        self.state.lock().removals
    }

    pub fn last_query(&self) -> Option<Query> {
        self.state.lock().queries.last().cloned()
    }

    fn next_id(state: &mut State) -> u64 {
        state.next_id += 1;
        state.next_id
    }

    fn registration(&self, id: u64) -> Box<dyn ListenerRegistration> {
        let state = Arc::clone(&self.state);
        Box::new(move || {
            let mut state = state.lock();
            state.collections.remove(&id);
            state.documents.remove(&id);
            state.removals += 1;
        })
    }
}

impl Transport for ScriptedTransport {
    fn listen_collection(
        &self,
        collection: &CollectionPath,
        query: &Query,
        listener: BatchListener,
    ) -> Box<dyn ListenerRegistration> {
        let id = {
            let mut state = self.state.lock();
            let id = Self::next_id(&mut state);
            state
                .collections
                .insert(id, (collection.clone(), Arc::new(Mutex::new(listener))));
            state.queries.push(query.clone());
            id
        };
        self.registration(id)
    }

    fn listen_document(
        &self,
        document: &DocumentPath,
        listener: DocumentListener,
    ) -> Box<dyn ListenerRegistration> {
        let id = {
            let mut state = self.state.lock();
            let id = Self::next_id(&mut state);
            state
                .documents
                .insert(id, (document.clone(), Arc::new(Mutex::new(listener))));
            id
        };
        self.registration(id)
    }
}

/// Collects callback outcomes for later assertions.
pub fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(T) + Send + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |item| sink.lock().push(item))
}
