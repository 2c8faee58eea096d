//! Schema path templates such as `/users/{user_id}/grams/{gram_id}`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::{CollectionPath, DocumentPath, PathError};

fn collection_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap())
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\{([a-zA-Z0-9_-]+)\}$").unwrap())
}

/// One `collection/{placeholder}` pair of a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplatePart {
    collection: String,
    placeholder: String,
}

impl TemplatePart {
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Placeholder name without braces.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
}

/// A parsed document path template.
///
/// # Example
///
/// ```
/// use docsync_path::PathTemplate;
///
/// let grams = PathTemplate::parse("/users/{user_id}/grams/{gram_id}").unwrap();
/// assert_eq!(grams.collection_name(), "grams");
/// assert_eq!(grams.parent_collection_name(), Some("users"));
///
/// let doc = grams.document_path(&["u1", "g7"]).unwrap();
/// assert_eq!(doc.to_string(), "users/u1/grams/g7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate {
    pattern: String,
    parts: Vec<TemplatePart>,
}

impl PathTemplate {
    pub fn parse(pattern: &str) -> Result<Self, PathError> {
        let invalid = |reason: String| PathError::InvalidTemplate {
            pattern: pattern.to_string(),
            reason,
        };
        let Some(body) = pattern.strip_prefix('/') else {
            return Err(invalid("must start with `/`".into()));
        };
        let segments: Vec<&str> = body.split('/').collect();
        if segments.len() % 2 != 0 {
            return Err(invalid(
                "must alternate collection names and document placeholders".into(),
            ));
        }
        let mut parts = Vec::with_capacity(segments.len() / 2);
        for pair in segments.chunks(2) {
            let (collection, placeholder) = (pair[0], pair[1]);
            if !collection_regex().is_match(collection) {
                return Err(invalid(format!("invalid collection name `{collection}`")));
            }
            let Some(caps) = placeholder_regex().captures(placeholder) else {
                return Err(invalid(format!("invalid placeholder `{placeholder}`")));
            };
            parts.push(TemplatePart {
                collection: collection.to_string(),
                placeholder: caps[1].to_string(),
            });
        }
        Ok(Self {
            pattern: pattern.to_string(),
            parts,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Name of the innermost collection.
    pub fn collection_name(&self) -> &str {
        self.parts
            .last()
            .map(TemplatePart::collection)
            .unwrap_or_default()
    }

    pub fn is_root(&self) -> bool {
        self.parts.len() == 1
    }

    pub fn parent_collection_name(&self) -> Option<&str> {
        let n = self.parts.len();
        (n >= 2).then(|| self.parts[n - 2].collection())
    }

    pub fn parent(&self) -> Option<PathTemplate> {
        if self.is_root() {
            return None;
        }
        let parts = self.parts[..self.parts.len() - 1].to_vec();
        let pattern = parts
            .iter()
            .map(|p| format!("/{}/{{{}}}", p.collection, p.placeholder))
            .collect();
        Some(Self { pattern, parts })
    }

    pub fn is_direct_child_of(&self, other: &PathTemplate) -> bool {
        self.parts.len() == other.parts.len() + 1 && self.parts.starts_with(&other.parts)
    }

    /// Placeholder bindings if `path` fits this template.
    pub fn matches(&self, path: &DocumentPath) -> Option<Vec<(String, String)>> {
        let segments = path.segments();
        if segments.len() != self.parts.len() * 2 {
            return None;
        }
        self.parts
            .iter()
            .zip(segments.chunks(2))
            .map(|(part, pair)| {
                (part.collection == pair[0]).then(|| (part.placeholder.clone(), pair[1].clone()))
            })
            .collect()
    }

    /// Fills every placeholder, outermost first.
    pub fn document_path(&self, ids: &[&str]) -> Result<DocumentPath, PathError> {
        self.check_arity(ids.len(), self.parts.len())?;
        let (last, parents) = ids.split_last().ok_or(PathError::EmptySegment)?;
        self.collection_path(parents)?.doc(*last)
    }

    /// Fills every placeholder except the innermost one.
    pub fn collection_path(&self, parent_ids: &[&str]) -> Result<CollectionPath, PathError> {
        self.check_arity(parent_ids.len(), self.parts.len() - 1)?;
        let mut collection = CollectionPath::root(self.parts[0].collection.as_str())?;
        for (id, part) in parent_ids.iter().zip(&self.parts[1..]) {
            collection = collection.doc(*id)?.collection(part.collection.as_str())?;
        }
        Ok(collection)
    }

    fn check_arity(&self, got: usize, expected: usize) -> Result<(), PathError> {
        if got == expected {
            return Ok(());
        }
        Err(PathError::InvalidTemplate {
            pattern: self.pattern.clone(),
            reason: format!("expected {expected} ids, got {got}"),
        })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_template() {
        let t = PathTemplate::parse("/users/{user_id}/grams/{gram_id}").unwrap();
        assert_eq!(t.parts().len(), 2);
        assert_eq!(t.parts()[0].collection(), "users");
        assert_eq!(t.parts()[0].placeholder(), "user_id");
        assert_eq!(t.parts()[1].placeholder(), "gram_id");
        assert!(!t.is_root());
    }

    #[test]
    fn rejects_malformed_templates() {
        for bad in [
            "users/{id}",
            "/users",
            "/users/{id}/grams",
            "/us ers/{id}",
            "/users/id",
            "/users/{i d}",
            "/",
        ] {
            assert!(
                matches!(PathTemplate::parse(bad), Err(PathError::InvalidTemplate { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn parent_and_children() {
        let users = PathTemplate::parse("/users/{user_id}").unwrap();
        let grams = PathTemplate::parse("/users/{user_id}/grams/{gram_id}").unwrap();
        let other = PathTemplate::parse("/teams/{team_id}/grams/{gram_id}").unwrap();
        assert_eq!(grams.parent(), Some(users.clone()));
        assert_eq!(users.parent(), None);
        assert!(grams.is_direct_child_of(&users));
        assert!(!other.is_direct_child_of(&users));
        assert!(!users.is_direct_child_of(&users));
    }

    #[test]
    fn matches_binds_placeholders() {
        let t = PathTemplate::parse("/users/{user_id}/grams/{gram_id}").unwrap();
        let doc = DocumentPath::parse("users/u1/grams/g2").unwrap();
        assert_eq!(
            t.matches(&doc),
            Some(vec![
                ("user_id".to_string(), "u1".to_string()),
                ("gram_id".to_string(), "g2".to_string()),
            ])
        );
        assert_eq!(t.matches(&DocumentPath::parse("users/u1").unwrap()), None);
        assert_eq!(
            t.matches(&DocumentPath::parse("users/u1/posts/p1").unwrap()),
            None
        );
    }

    #[test]
    fn fills_placeholders() {
        let t = PathTemplate::parse("/users/{user_id}/grams/{gram_id}").unwrap();
        assert_eq!(t.collection_path(&["u1"]).unwrap().to_string(), "users/u1/grams");
        assert!(matches!(
            t.document_path(&["u1"]),
            Err(PathError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            t.document_path(&["u1", "a/b"]),
            Err(PathError::InvalidSegment(_))
        ));
    }
}
