//! Decode context: the current path plus ambient capabilities.

use std::fmt;
use std::sync::Arc;

use docsync_path::{DocumentPath, FieldPath, PathError, MAX_PATH_LENGTH};

use crate::error::DecodeError;

/// Turns a stored document path into a handle the caller can follow later.
///
/// Implementations must not perform I/O.
pub trait ReferenceResolver: Send + Sync {
    fn resolve(&self, path: &str) -> ReferenceHandle;
}

/// Opaque pointer to another document, produced by a [`ReferenceResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceHandle {
    path: String,
    database: Option<Arc<str>>,
}

impl ReferenceHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            database: None,
        }
    }

    pub fn with_database(mut self, database: Arc<str>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn document_path(&self) -> Result<DocumentPath, PathError> {
        DocumentPath::parse(&self.path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ReferenceResolver,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReferenceResolver => f.write_str("reference resolver"),
        }
    }
}

/// Ambient services available to every decode step.
#[derive(Clone)]
pub struct Capabilities {
    resolver: Option<Arc<dyn ReferenceResolver>>,
    max_depth: usize,
}

impl Capabilities {
    pub fn new() -> Self {
        Self {
            resolver: None,
            max_depth: MAX_PATH_LENGTH,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::ReferenceResolver => self.resolver.is_some(),
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("resolver", &self.resolver.is_some())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Where a decode step is, and what it may use.
///
/// Contexts are values: [`DecodeContext::append`] returns a new context and
/// shares the capabilities with the original.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    path: FieldPath,
    capabilities: Arc<Capabilities>,
}

impl DecodeContext {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            path: FieldPath::root(),
            capabilities: Arc::new(capabilities),
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn append(&self, key: impl Into<String>) -> Self {
        Self {
            path: self.path.child(key),
            capabilities: Arc::clone(&self.capabilities),
        }
    }

    pub fn descend(&self, relative: &FieldPath) -> Self {
        Self {
            path: self.path.join(relative),
            capabilities: Arc::clone(&self.capabilities),
        }
    }

    /// # Errors
    ///
    /// [`DecodeError::ContextMissing`] when no resolver was configured.
    pub fn resolver(&self) -> Result<&dyn ReferenceResolver, DecodeError> {
        self.capabilities
            .resolver
            .as_deref()
            .ok_or(DecodeError::ContextMissing {
                capability: Capability::ReferenceResolver,
            })
    }

    pub fn shares_capabilities_with(&self, other: &DecodeContext) -> bool {
        Arc::ptr_eq(&self.capabilities, &other.capabilities)
    }
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new(Capabilities::new())
    }
}

/// Resolver that wraps paths without further context.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    database: Option<Arc<str>>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_database(database: impl Into<Arc<str>>) -> Self {
        Self {
            database: Some(database.into()),
        }
    }
}

impl ReferenceResolver for PathResolver {
    fn resolve(&self, path: &str) -> ReferenceHandle {
        let handle = ReferenceHandle::new(path);
        match &self.database {
            Some(db) => handle.with_database(Arc::clone(db)),
            None => handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_extends_path_and_shares_capabilities() {
        let root = DecodeContext::default();
        let child = root.append("avatar").append("url");
        assert_eq!(child.path().segments(), ["avatar", "url"]);
        assert!(root.path().is_root());
        assert!(child.shares_capabilities_with(&root));
    }

    #[test]
    fn resolver_is_a_capability() {
        let bare = DecodeContext::default();
        assert_eq!(
            bare.resolver().err(),
            Some(DecodeError::ContextMissing {
                capability: Capability::ReferenceResolver
            })
        );
        assert!(!bare.capabilities().has(Capability::ReferenceResolver));

        let ctx = DecodeContext::new(
            Capabilities::new().with_resolver(Arc::new(PathResolver::for_database("prod"))),
        );
        let handle = ctx.append("friend").resolver().unwrap().resolve("users/u2");
        assert_eq!(handle.path(), "users/u2");
        assert_eq!(handle.database(), Some("prod"));
        assert_eq!(handle.document_path().unwrap().id(), "u2");
    }
}
