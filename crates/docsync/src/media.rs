//! Schema built-ins shared by generated domain types: URLs and file
//! attachments.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::decode::{Decode, Decoder};
use crate::encode::{Encode, MapEncoder};
use crate::error::DecodeError;
use crate::value::DocumentValue;

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$").unwrap()
    })
}

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*$").unwrap())
}

fn port_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([^:\]]*)$").unwrap())
}

/// A URL stored as the raw string the document holds.
///
/// Storage is lenient: any string decodes. [`Url::get`] is where the
/// string is checked, and it yields `None` for empty or malformed values
/// instead of failing the surrounding decode.
///
/// ```
/// use docsync::media::Url;
///
/// let url = Url::from("https://cdn.example.com/a.png?size=2");
/// let parsed = url.get().unwrap();
/// assert_eq!(parsed.scheme, Some("https"));
/// assert_eq!(parsed.host, Some("cdn.example.com"));
/// assert_eq!(parsed.query, Some("size=2"));
///
/// assert!(Url::default().get().is_none());
/// assert!(Url::from("://nope").get().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Url(String);

/// The components of a well-formed [`Url`], borrowed from its raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedUrl<'a> {
    pub scheme: Option<&'a str>,
    pub host: Option<&'a str>,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl Url {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self) -> Option<ParsedUrl<'_>> {
        parse(&self.0)
    }

    /// Replaces the stored string with `url`; `None` leaves it untouched.
    pub fn set(&mut self, url: Option<&ParsedUrl<'_>>) {
        if let Some(url) = url {
            self.0 = url.to_string();
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn parse(raw: &str) -> Option<ParsedUrl<'_>> {
    if raw.is_empty() || raw.chars().any(|c| c.is_ascii_control()) || !escapes_are_valid(raw) {
        return None;
    }
    let caps = reference_regex().captures(raw)?;
    let scheme = caps.get(1).map(|m| m.as_str());
    if raw.starts_with(':') || scheme.is_some_and(|s| !scheme_regex().is_match(s)) {
        return None;
    }
    let host = caps.get(2).map(|m| m.as_str());
    if let Some(port) = host.and_then(|h| port_regex().captures(h)).and_then(|c| c.get(1)) {
        if !port.as_str().bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    Some(ParsedUrl {
        scheme,
        host,
        path: caps.get(3).map_or("", |m| m.as_str()),
        query: caps.get(4).map(|m| m.as_str()),
        fragment: caps.get(5).map(|m| m.as_str()),
    })
}

fn escapes_are_valid(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}

impl fmt::Display for ParsedUrl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = self.scheme {
            write!(f, "{scheme}:")?;
        }
        if let Some(host) = self.host {
            write!(f, "//{host}")?;
        }
        f.write_str(self.path)?;
        if let Some(query) = self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Url {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Url {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl Decode for Url {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        decoder.single_value()?.decode::<String>().map(Self)
    }
}

impl Encode for Url {
    fn encode(&self) -> DocumentValue {
        DocumentValue::String(self.0.clone())
    }
}

/// An uploaded file, stored as `{name, url, mimeType}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub url: Url,
    pub mime_type: String,
}

impl Decode for File {
    fn decode(decoder: Decoder<'_>) -> Result<Self, DecodeError> {
        let fields = decoder.keyed()?;
        Ok(Self {
            name: fields.decode("name")?,
            url: fields.decode("url")?,
            mime_type: fields.decode("mimeType")?,
        })
    }
}

impl Encode for File {
    fn encode(&self) -> DocumentValue {
        MapEncoder::new()
            .field("name", &self.name)
            .field("url", &self.url)
            .field("mimeType", &self.mime_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode, DecodeContext};
    use crate::encode::encode_record;
    use crate::record::DocumentRecord;
    use crate::value::ValueKind;
    use docsync_path::{DocumentPath, FieldPath};
    use serde_json::json;

    fn record(json: serde_json::Value) -> DocumentRecord {
        DocumentRecord::from_json(DocumentPath::parse("files/f1").unwrap(), json).unwrap()
    }

    #[test]
    fn lenient_get() {
        let cases: &[(&str, bool)] = &[
            ("https://cdn.example.com/a.png", true),
            ("http://localhost:8080/x", true),
            ("mailto:ada@example.com", true),
            ("/relative/path?q=1#top", true),
            ("a%20b", true),
            ("", false),
            (":missing-scheme", false),
            ("1http://x", false),
            ("http://host:port/", false),
            ("bad%zzescape", false),
            ("tab\there", false),
        ];
        for &(raw, ok) in cases {
            assert_eq!(Url::from(raw).get().is_some(), ok, "{raw:?}");
        }
    }

    #[test]
    fn components() {
        let url = Url::from("https://cdn.example.com:443/img/a.png?w=2#frag");
        let parsed = url.get().unwrap();
        assert_eq!(parsed.scheme, Some("https"));
        assert_eq!(parsed.host, Some("cdn.example.com:443"));
        assert_eq!(parsed.path, "/img/a.png");
        assert_eq!(parsed.query, Some("w=2"));
        assert_eq!(parsed.fragment, Some("frag"));
        assert_eq!(parsed.to_string(), url.as_str());
    }

    #[test]
    fn set_ignores_none() {
        let mut url = Url::from("keep");
        url.set(None);
        assert_eq!(url.as_str(), "keep");
        let source = Url::from("https://example.com/x");
        url.set(source.get().as_ref());
        assert_eq!(url, source);
    }

    #[test]
    fn malformed_urls_still_decode() {
        let r = record(json!({
            "name": "a.png",
            "url": "::not a url::",
            "mimeType": "image/png"
        }));
        let file: File = decode(&r, &DecodeContext::default()).unwrap();
        assert_eq!(file.url.as_str(), "::not a url::");
        assert!(file.url.get().is_none());
    }

    #[test]
    fn file_round_trips_through_a_record() {
        let file = File {
            name: "a.png".into(),
            url: Url::from("https://cdn/a.png"),
            mime_type: "image/png".into(),
        };
        let r = encode_record(DocumentPath::parse("files/f1").unwrap(), &file).unwrap();
        assert_eq!(
            r.get_key("mimeType"),
            Some(&DocumentValue::String("image/png".into()))
        );
        let back: File = decode(&r, &DecodeContext::default()).unwrap();
        assert_eq!(back, file);
    }

    #[test]
    fn url_must_be_a_string() {
        let r = record(json!({"name": "a", "url": 5, "mimeType": "x"}));
        assert_eq!(
            decode::<File>(&r, &DecodeContext::default()),
            Err(DecodeError::TypeMismatch {
                path: FieldPath::from("url"),
                expected: ValueKind::String,
                found: ValueKind::Integer,
            })
        );
    }
}
