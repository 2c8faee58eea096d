//! Transport seam and subscription lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use docsync_path::{CollectionPath, DocumentPath};
use parking_lot::Mutex;
use tracing::debug;

use crate::diff::{ChangeBatch, SnapshotMetadata};
use crate::error::TransportError;
use crate::query::Query;
use crate::record::DocumentRecord;

/// Receives collection batches. `FnMut` forces the transport to deliver
/// one batch at a time.
pub type BatchListener = Box<dyn FnMut(Result<ChangeBatch, TransportError>) + Send>;

/// Receives single-document snapshots.
pub type DocumentListener = Box<dyn FnMut(Result<DocumentSnapshot, TransportError>) + Send>;

/// Detaches a listener from the transport.
pub trait ListenerRegistration: Send {
    fn remove(&mut self);
}

impl<F: FnMut() + Send> ListenerRegistration for F {
    fn remove(&mut self) {
        self()
    }
}

/// The live source of change batches, e.g. a database client.
pub trait Transport: Send + Sync {
    fn listen_collection(
        &self,
        collection: &CollectionPath,
        query: &Query,
        listener: BatchListener,
    ) -> Box<dyn ListenerRegistration>;

    fn listen_document(
        &self,
        document: &DocumentPath,
        listener: DocumentListener,
    ) -> Box<dyn ListenerRegistration>;
}

/// One observation of a single document, which may not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    path: DocumentPath,
    record: Option<DocumentRecord>,
    metadata: SnapshotMetadata,
}

impl DocumentSnapshot {
    pub fn existing(record: DocumentRecord, metadata: SnapshotMetadata) -> Self {
        Self {
            path: record.path().clone(),
            record: Some(record),
            metadata,
        }
    }

    pub fn missing(path: DocumentPath, metadata: SnapshotMetadata) -> Self {
        Self {
            path,
            record: None,
            metadata,
        }
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    pub fn record(&self) -> Option<&DocumentRecord> {
        self.record.as_ref()
    }

    pub fn metadata(&self) -> SnapshotMetadata {
        self.metadata
    }
}

/// Cancellation token for a live listener.
///
/// [`Subscription::cancel`] detaches the listener exactly once, no matter
/// how often it is called; batches arriving after it returns are dropped.
/// Dropping the token cancels it unless [`Subscription::keep_alive`] was
/// called.
pub struct Subscription {
    target: String,
    registration: Mutex<Option<Box<dyn ListenerRegistration>>>,
    active: Arc<AtomicBool>,
    cancel_on_drop: bool,
}

impl Subscription {
    pub(crate) fn new(
        target: String,
        registration: Box<dyn ListenerRegistration>,
        active: Arc<AtomicBool>,
        keep_alive: bool,
    ) -> Self {
        Self {
            target,
            registration: Mutex::new(Some(registration)),
            active,
            cancel_on_drop: !keep_alive,
        }
    }

    /// Path of the collection or document being observed.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
        let registration = self.registration.lock().take();
        if let Some(mut registration) = registration {
            registration.remove();
            debug!(path = %self.target, "subscription cancelled");
        }
    }

    /// Detaches the listener's lifetime from this token.
    pub fn keep_alive(mut self) -> Self {
        self.cancel_on_drop = false;
        self
    }

    pub fn cancels_on_drop(&self) -> bool {
        self.cancel_on_drop
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.cancel_on_drop {
            self.cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("target", &self.target)
            .field("active", &self.is_active())
            .field("cancel_on_drop", &self.cancel_on_drop)
            .finish()
    }
}
