//! Field paths: the address of a value inside one document.

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use crate::{validate_field_path, PathError};

/// An ordered sequence of segments addressing a value inside a document.
///
/// Paths are immutable; [`FieldPath::child`] and [`FieldPath::join`] return
/// new paths. Numeric segments address array elements when the path is
/// resolved against a document.
///
/// # Example
///
/// ```
/// use docsync_path::FieldPath;
///
/// let a = FieldPath::from_segments(["a", "b"]);
/// assert_eq!(a.child("c"), FieldPath::from_segments(["a", "b", "c"]));
/// assert_eq!(FieldPath::parse("a.`b.c`").unwrap().segments(), ["a", "b.c"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// The empty path, addressing the document itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses dotted notation.
    ///
    /// Segments that are not made of ASCII letters, digits and `_` must be
    /// wrapped in backticks; inside backticks, `\` escapes a backtick or a
    /// backslash. The empty string parses to the root path.
    ///
    /// # Errors
    ///
    /// Fails on empty segments (`a..b`, trailing dots), unterminated
    /// backticks, unknown escapes, or characters following a quoted segment.
    /// Paths deeper than [`MAX_PATH_LENGTH`](crate::MAX_PATH_LENGTH) are
    /// rejected with [`PathError::PathTooLong`].
    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        let mut chars = input.char_indices().peekable();
        loop {
            let segment = match chars.peek() {
                Some(&(_, '`')) => {
                    chars.next();
                    parse_quoted(input, &mut chars)?
                }
                _ => parse_plain(&mut chars)?,
            };
            if segment.is_empty() {
                return Err(PathError::EmptySegment);
            }
            segments.push(segment);
            match chars.next() {
                None => break,
                Some((_, '.')) => continue,
                Some((offset, found)) => {
                    return Err(PathError::UnexpectedCharacter { found, offset })
                }
            }
        }
        let path = Self { segments };
        validate_field_path(&path)?;
        Ok(path)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns a new path with every segment of `other` appended.
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + other.segments.len());
        segments.extend(self.segments.iter().cloned());
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// # Errors
    ///
    /// Returns [`PathError::NoParent`] for the root path.
    pub fn parent(&self) -> Result<Self, PathError> {
        match self.segments.split_last() {
            Some((_, rest)) => Ok(Self {
                segments: rest.to_vec(),
            }),
            None => Err(PathError::NoParent),
        }
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// True if `other` lies strictly below this path.
    pub fn is_ancestor_of(&self, other: &FieldPath) -> bool {
        other.segments.len() > self.segments.len() && other.starts_with(self)
    }
}

fn parse_plain(chars: &mut Peekable<CharIndices<'_>>) -> Result<String, PathError> {
    let mut segment = String::new();
    while let Some(&(offset, c)) = chars.peek() {
        match c {
            '.' => break,
            '`' => return Err(PathError::UnexpectedCharacter { found: c, offset }),
            _ => {
                segment.push(c);
                chars.next();
            }
        }
    }
    Ok(segment)
}

fn parse_quoted(input: &str, chars: &mut Peekable<CharIndices<'_>>) -> Result<String, PathError> {
    let mut segment = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '`' => return Ok(segment),
            '\\' => match chars.next() {
                Some((_, escaped @ ('`' | '\\'))) => segment.push(escaped),
                _ => return Err(PathError::InvalidEscape(input.to_string())),
            },
            _ => segment.push(c),
        }
    }
    Err(PathError::UnterminatedQuote(input.to_string()))
}

/// True if `segment` can be written in dotted notation without backticks.
pub fn is_simple_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if is_simple_segment(segment) {
                f.write_str(segment)?;
            } else {
                f.write_str("`")?;
                for c in segment.chars() {
                    if c == '`' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("`")?;
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A single-segment path; no dotted parsing takes place.
impl From<&str> for FieldPath {
    fn from(segment: &str) -> Self {
        Self::from_segments([segment])
    }
}

impl From<String> for FieldPath {
    fn from(segment: String) -> Self {
        Self::from_segments([segment])
    }
}
