//! Path utilities for hierarchical document stores.
//!
//! Three kinds of paths live here:
//!
//! - [`FieldPath`]: addresses a value *inside* a document (`avatar.url`).
//! - [`CollectionPath`] / [`DocumentPath`]: address resources in the store
//!   (`users/u1/grams`).
//! - [`PathTemplate`]: schema-level patterns such as
//!   `/users/{user_id}/grams/{gram_id}`.
//!
//! # Example
//!
//! ```
//! use docsync_path::{CollectionPath, FieldPath};
//!
//! let field = FieldPath::parse("avatar.url").unwrap();
//! assert_eq!(field.segments(), ["avatar", "url"]);
//! assert_eq!(field.child("small").to_string(), "avatar.url.small");
//!
//! let grams = CollectionPath::root("users").unwrap()
//!     .doc("u1").unwrap()
//!     .collection("grams").unwrap();
//! assert_eq!(grams.to_string(), "users/u1/grams");
//! ```

use thiserror::Error;

pub mod field;
pub use field::{is_simple_segment, FieldPath};

pub mod resource;
pub use resource::{validate_resource_segment, CollectionPath, DocumentPath};

pub mod template;
pub use template::{PathTemplate, TemplatePart};

pub mod validate;
pub use validate::{is_valid_index, validate_field_path, MAX_PATH_LENGTH};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path segment")]
    EmptySegment,
    #[error("unterminated quoted segment in `{0}`")]
    UnterminatedQuote(String),
    #[error("invalid escape in `{0}`")]
    InvalidEscape(String),
    #[error("unexpected character `{found}` at offset {offset}")]
    UnexpectedCharacter { found: char, offset: usize },
    #[error("path has no parent")]
    NoParent,
    #[error("invalid resource segment `{0}`")]
    InvalidSegment(String),
    #[error("`{0}` does not name a document")]
    NotADocument(String),
    #[error("`{0}` does not name a collection")]
    NotACollection(String),
    #[error("invalid path template `{pattern}`: {reason}")]
    InvalidTemplate { pattern: String, reason: String },
    #[error("path depth {len} exceeds limit of {max}")]
    PathTooLong { len: usize, max: usize },
}
