//! Live collection diffs.
//!
//! A [`ChangeBatch`] is what a transport delivers for one collection
//! snapshot: the change events in arrival order plus the full, ordered
//! post-change membership. [`diff_batch`] decodes both into a
//! [`DiffResult`]. It keeps no state between calls.

use std::fmt;

use docsync_path::DocumentPath;
use thiserror::Error;
use tracing::{debug, warn};

use crate::decode::{decode, Decode, DecodeContext};
use crate::error::DecodeError;
use crate::record::DocumentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
        })
    }
}

/// One change to a collection. Indices are positions in the ordered
/// collection before (`old_index`) and after (`new_index`) the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Added {
        record: DocumentRecord,
        new_index: usize,
    },
    Modified {
        record: DocumentRecord,
        old_index: usize,
        new_index: usize,
    },
    Removed {
        record: DocumentRecord,
        old_index: usize,
    },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Added { .. } => ChangeKind::Added,
            Self::Modified { .. } => ChangeKind::Modified,
            Self::Removed { .. } => ChangeKind::Removed,
        }
    }

    pub fn record(&self) -> &DocumentRecord {
        match self {
            Self::Added { record, .. }
            | Self::Modified { record, .. }
            | Self::Removed { record, .. } => record,
        }
    }

    pub fn old_index(&self) -> Option<usize> {
        match self {
            Self::Added { .. } => None,
            Self::Modified { old_index, .. } | Self::Removed { old_index, .. } => Some(*old_index),
        }
    }

    pub fn new_index(&self) -> Option<usize> {
        match self {
            Self::Added { new_index, .. } | Self::Modified { new_index, .. } => Some(*new_index),
            Self::Removed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotMetadata {
    pub is_from_cache: bool,
    pub has_pending_writes: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeBatch {
    pub events: Vec<ChangeEvent>,
    /// Every record in the collection after the batch, in order.
    pub membership: Vec<DocumentRecord>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Addition<T> {
    pub value: T,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modification<T> {
    pub value: T,
    pub old_index: usize,
    pub new_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Removal<T> {
    pub value: T,
    pub old_index: usize,
}

/// Typed view of one batch. Buckets keep event arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult<T> {
    pub current: Vec<T>,
    pub additions: Vec<Addition<T>>,
    pub modifications: Vec<Modification<T>>,
    pub removals: Vec<Removal<T>>,
    pub metadata: SnapshotMetadata,
}

impl<T> DiffResult<T> {
    pub fn change_count(&self) -> usize {
        self.additions.len() + self.modifications.len() + self.removals.len()
    }

    pub fn has_changes(&self) -> bool {
        self.change_count() > 0
    }
}

/// A batch was rejected because one of its records failed to decode.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiffError {
    #[error("change #{position} ({kind} `{document}`) failed to decode: {source}")]
    Event {
        position: usize,
        kind: ChangeKind,
        document: DocumentPath,
        #[source]
        source: DecodeError,
    },
    #[error("member #{position} (`{document}`) failed to decode: {source}")]
    Membership {
        position: usize,
        document: DocumentPath,
        #[source]
        source: DecodeError,
    },
}

impl DiffError {
    pub fn decode_error(&self) -> &DecodeError {
        match self {
            Self::Event { source, .. } | Self::Membership { source, .. } => source,
        }
    }

    pub fn document(&self) -> &DocumentPath {
        match self {
            Self::Event { document, .. } | Self::Membership { document, .. } => document,
        }
    }
}

/// Decodes and buckets every event, then decodes the final membership.
///
/// The first decode failure rejects the whole batch.
pub fn diff_batch<T: Decode>(
    batch: &ChangeBatch,
    context: &DecodeContext,
) -> Result<DiffResult<T>, DiffError> {
    debug!(
        events = batch.events.len(),
        members = batch.membership.len(),
        from_cache = batch.metadata.is_from_cache,
        "diffing change batch"
    );
    let result = bucket(batch, context);
    if let Err(err) = &result {
        warn!(document = %err.document(), error = %err, "change batch rejected");
    }
    result
}

fn bucket<T: Decode>(
    batch: &ChangeBatch,
    context: &DecodeContext,
) -> Result<DiffResult<T>, DiffError> {
    let mut additions = Vec::new();
    let mut modifications = Vec::new();
    let mut removals = Vec::new();

    for (position, event) in batch.events.iter().enumerate() {
        let record = event.record();
        let value = decode::<T>(record, context).map_err(|source| DiffError::Event {
            position,
            kind: event.kind(),
            document: record.path().clone(),
            source,
        })?;
        match *event {
            ChangeEvent::Added { new_index, .. } => additions.push(Addition {
                value,
                index: new_index,
            }),
            ChangeEvent::Modified {
                old_index,
                new_index,
                ..
            } => modifications.push(Modification {
                value,
                old_index,
                new_index,
            }),
            ChangeEvent::Removed { old_index, .. } => removals.push(Removal { value, old_index }),
        }
    }

    let current = batch
        .membership
        .iter()
        .enumerate()
        .map(|(position, record)| {
            decode::<T>(record, context).map_err(|source| DiffError::Membership {
                position,
                document: record.path().clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DiffResult {
        current,
        additions,
        modifications,
        removals,
        metadata: batch.metadata,
    })
}
