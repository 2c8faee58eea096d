//! Validation helpers shared by field paths and decoders.

use crate::{FieldPath, PathError};

/// Maximum allowed field path depth.
pub const MAX_PATH_LENGTH: usize = 256;

/// Validate a field path against [`MAX_PATH_LENGTH`].
///
/// # Example
///
/// ```
/// use docsync_path::{validate_field_path, FieldPath};
///
/// validate_field_path(&FieldPath::from_segments(["a", "b"])).unwrap();
/// let deep = FieldPath::from_segments((0..300).map(|i| i.to_string()));
/// validate_field_path(&deep).unwrap_err();
/// ```
pub fn validate_field_path(path: &FieldPath) -> Result<(), PathError> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(PathError::PathTooLong {
            len: path.len(),
            max: MAX_PATH_LENGTH,
        });
    }
    Ok(())
}

/// Check if a segment is a canonical non-negative array index.
///
/// # Example
///
/// ```
/// use docsync_path::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("42"));
/// assert!(!is_valid_index("042"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("x"));
/// ```
pub fn is_valid_index(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    if bytes.is_empty() || (bytes.len() > 1 && bytes[0] == b'0') {
        return false;
    }
    bytes.iter().all(u8::is_ascii_digit)
}
