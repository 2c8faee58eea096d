//! Client entry point: binds a transport to the decode and diff engines.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use docsync_path::{CollectionPath, DocumentPath, PathError, PathTemplate};
use tracing::{debug, trace, warn};

use crate::config::SyncConfig;
use crate::decode::{decode, Capabilities, Decode, DecodeContext, PathResolver, ReferenceHandle};
use crate::diff::{diff_batch, DiffResult};
use crate::error::{DecodeError, Error};
use crate::query::{Query, QueryModifier};
use crate::record::DocumentRecord;
use crate::subscription::{BatchListener, DocumentListener, Subscription, Transport};

struct Shared {
    transport: Arc<dyn Transport>,
    context: DecodeContext,
    keep_alive: bool,
    database: Arc<str>,
}

/// Entry point for decoding records and subscribing to live data.
///
/// The client owns the ambient decode capabilities: a reference resolver
/// tagged with the configured database, and the decode depth limit.
#[derive(Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, &SyncConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: &SyncConfig) -> Self {
        let database: Arc<str> = Arc::from(config.database.as_str());
        let capabilities = Capabilities::new()
            .with_resolver(Arc::new(PathResolver::for_database(Arc::clone(&database))))
            .with_max_depth(config.decode.max_depth);
        Self {
            shared: Arc::new(Shared {
                transport,
                context: DecodeContext::new(capabilities),
                keep_alive: config.subscription.keep_alive,
                database,
            }),
        }
    }

    pub fn database(&self) -> &str {
        &self.shared.database
    }

    /// Root decode context carrying this client's capabilities.
    pub fn context(&self) -> &DecodeContext {
        &self.shared.context
    }

    pub fn collection(&self, path: &str) -> Result<CollectionHandle, PathError> {
        CollectionPath::parse(path).map(|p| self.collection_at(p))
    }

    pub fn document(&self, path: &str) -> Result<DocumentHandle, PathError> {
        DocumentPath::parse(path).map(|p| self.document_at(p))
    }

    pub fn collection_at(&self, path: CollectionPath) -> CollectionHandle {
        CollectionHandle {
            path,
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn document_at(&self, path: DocumentPath) -> DocumentHandle {
        DocumentHandle {
            path,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Fills `template`'s parent placeholders in order, e.g. `["u1"]` for
    /// `/users/{user_id}/grams/{gram_id}` gives `users/u1/grams`.
    pub fn collection_for(
        &self,
        template: &PathTemplate,
        parent_ids: &[&str],
    ) -> Result<CollectionHandle, PathError> {
        template
            .collection_path(parent_ids)
            .map(|p| self.collection_at(p))
    }

    pub fn document_for(
        &self,
        template: &PathTemplate,
        ids: &[&str],
    ) -> Result<DocumentHandle, PathError> {
        template.document_path(ids).map(|p| self.document_at(p))
    }

    pub fn decode<T: Decode>(&self, record: &DocumentRecord) -> Result<T, DecodeError> {
        decode(record, &self.shared.context)
    }

    /// Turns a decoded reference into a handle for an explicit follow-up
    /// fetch.
    pub fn follow(&self, reference: &ReferenceHandle) -> Result<DocumentHandle, PathError> {
        reference.document_path().map(|p| self.document_at(p))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("database", &self.shared.database)
            .field("keep_alive", &self.shared.keep_alive)
            .finish()
    }
}

#[derive(Clone)]
pub struct CollectionHandle {
    path: CollectionPath,
    shared: Arc<Shared>,
}

impl CollectionHandle {
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    pub fn doc(&self, id: &str) -> Result<DocumentHandle, PathError> {
        Ok(DocumentHandle {
            path: self.path.doc(id)?,
            shared: Arc::clone(&self.shared),
        })
    }

    pub fn parent(&self) -> Option<DocumentHandle> {
        self.path.parent().map(|path| DocumentHandle {
            path,
            shared: Arc::clone(&self.shared),
        })
    }

    /// Subscribes to the whole collection.
    pub fn listen<T, F>(&self, on_event: F) -> Subscription
    where
        T: Decode + 'static,
        F: FnMut(Result<DiffResult<T>, Error>) + Send + 'static,
    {
        self.subscribe(None, on_event)
    }

    /// Subscribes to the collection, optionally narrowed by `modifier`.
    ///
    /// Every batch the transport delivers produces exactly one call to
    /// `on_event`: either the typed diff, or the error that rejected the
    /// batch.
    pub fn subscribe<T, F>(&self, modifier: Option<QueryModifier>, mut on_event: F) -> Subscription
    where
        T: Decode + 'static,
        F: FnMut(Result<DiffResult<T>, Error>) + Send + 'static,
    {
        let query = match modifier {
            Some(modify) => modify(Query::new()),
            None => Query::new(),
        };
        let active = Arc::new(AtomicBool::new(true));
        let live = Arc::clone(&active);
        let context = self.shared.context.clone();
        let target = self.path.to_string();
        let label = target.clone();

        let listener: BatchListener = Box::new(move |delivery| {
            if !live.load(Ordering::Acquire) {
                trace!(path = %label, "batch after cancel dropped");
                return;
            }
            let outcome = match delivery {
                Ok(batch) => diff_batch::<T>(&batch, &context).map_err(Error::from),
                Err(err) => {
                    warn!(path = %label, error = %err, "collection listener failed");
                    Err(Error::Transport(err))
                }
            };
            on_event(outcome);
        });

        debug!(path = %target, filters = query.filters().len(), "subscribing to collection");
        let registration = self
            .shared
            .transport
            .listen_collection(&self.path, &query, listener);
        Subscription::new(target, registration, active, self.shared.keep_alive)
    }
}

impl fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CollectionHandle").field(&self.path).finish()
    }
}

#[derive(Clone)]
pub struct DocumentHandle {
    path: DocumentPath,
    shared: Arc<Shared>,
}

impl DocumentHandle {
    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn parent(&self) -> CollectionHandle {
        CollectionHandle {
            path: self.path.parent(),
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn collection(&self, id: &str) -> Result<CollectionHandle, PathError> {
        Ok(CollectionHandle {
            path: self.path.collection(id)?,
            shared: Arc::clone(&self.shared),
        })
    }

    /// Observes this document, decoding every snapshot as `T`.
    ///
    /// A snapshot of a document that does not exist yields
    /// [`Error::NotFound`].
    pub fn watch<T, F>(&self, mut on_event: F) -> Subscription
    where
        T: Decode + 'static,
        F: FnMut(Result<T, Error>) + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let live = Arc::clone(&active);
        let context = self.shared.context.clone();
        let target = self.path.to_string();
        let label = target.clone();

        let listener: DocumentListener = Box::new(move |delivery| {
            if !live.load(Ordering::Acquire) {
                trace!(path = %label, "snapshot after cancel dropped");
                return;
            }
            let outcome = match delivery {
                Ok(snapshot) => match snapshot.record() {
                    Some(record) => decode::<T>(record, &context).map_err(Error::from),
                    None => Err(Error::NotFound(snapshot.path().clone())),
                },
                Err(err) => {
                    warn!(path = %label, error = %err, "document listener failed");
                    Err(Error::Transport(err))
                }
            };
            on_event(outcome);
        });

        debug!(path = %target, "watching document");
        let registration = self.shared.transport.listen_document(&self.path, listener);
        Subscription::new(target, registration, active, self.shared.keep_alive)
    }
}

impl fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DocumentHandle").field(&self.path).finish()
    }
}
