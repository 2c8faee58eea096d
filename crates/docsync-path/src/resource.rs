//! Collection and document resource paths.
//!
//! A resource path alternates collection ids and document ids:
//! `users` is a collection, `users/u1` a document, `users/u1/grams` a
//! subcollection of that document.

use std::fmt;
use std::str::FromStr;

use crate::PathError;

/// Checks one resource segment.
///
/// Segments must be non-empty, may not contain `/`, may not be `.` or
/// `..`, and may not use the reserved `__name__` form.
pub fn validate_resource_segment(segment: &str) -> Result<(), PathError> {
    let reserved = segment.len() >= 4 && segment.starts_with("__") && segment.ends_with("__");
    if segment.is_empty() || segment.contains('/') || segment == "." || segment == ".." || reserved
    {
        return Err(PathError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

fn split_resource(path: &str) -> Result<Vec<String>, PathError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(PathError::EmptySegment);
    }
    trimmed
        .split('/')
        .map(|segment| validate_resource_segment(segment).map(|()| segment.to_string()))
        .collect()
}

/// Path of a collection: an odd number of segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Path of a document: a non-zero even number of segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// A top-level collection.
    pub fn root(id: impl Into<String>) -> Result<Self, PathError> {
        let id = id.into();
        validate_resource_segment(&id)?;
        Ok(Self { segments: vec![id] })
    }

    /// Parses `a/b/c`; leading and trailing slashes are ignored.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments = split_resource(path)?;
        if segments.len() % 2 == 0 {
            return Err(PathError::NotACollection(path.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn doc(&self, id: impl Into<String>) -> Result<DocumentPath, PathError> {
        let id = id.into();
        validate_resource_segment(&id)?;
        let mut segments = self.segments.clone();
        segments.push(id);
        Ok(DocumentPath { segments })
    }

    /// The owning document, or `None` for a top-level collection.
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn depth(&self) -> usize {
        self.segments.len() / 2
    }
}

impl DocumentPath {
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let segments = split_resource(path)?;
        if segments.len() % 2 != 0 {
            return Err(PathError::NotADocument(path.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn collection(&self, id: impl Into<String>) -> Result<CollectionPath, PathError> {
        let id = id.into();
        validate_resource_segment(&id)?;
        let mut segments = self.segments.clone();
        segments.push(id);
        Ok(CollectionPath { segments })
    }

    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for CollectionPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for DocumentPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
