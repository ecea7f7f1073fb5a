//! Text normalization: charset detection, re-encoding and HTML escaping.
//!
//! Free-text post fields are sent through [`normalize_text`] exactly once
//! before they go on the wire. The pipeline is:
//!
//! 1. guess the source charset of the raw bytes (valid UTF-8 wins, otherwise
//!    `chardetng` makes a best-effort guess),
//! 2. decode strictly, then encode into the client's target charset,
//! 3. escape `& < > " '` as HTML entities.
//!
//! Detection is a heuristic. Short or binary-looking input may be guessed
//! wrong; that is accepted. Malformed input and characters the target
//! charset cannot represent are reported as [`MetaWeblogError::Encoding`].
//!
//! Escaping is not idempotent: normalizing `&amp;` yields `&amp;amp;`.

use crate::error::{MetaWeblogError, Result};
use crate::value::Value;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use std::borrow::Cow;

/// Caller-supplied text in an unknown charset.
///
/// Rust strings are always UTF-8, so text coming from legacy sources
/// (Latin-1 files, Shift_JIS databases) is accepted as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawText(Vec<u8>);

impl RawText {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for RawText {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for RawText {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&String> for RawText {
    fn from(s: &String) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for RawText {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for RawText {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Resolves an encoding label such as `"UTF-8"` or `"ISO-8859-1"`.
///
/// Labels that only exist for decoding (UTF-16, `replacement`) are rejected
/// because nothing can be written in them.
pub fn lookup_encoding(label: &str) -> Result<&'static Encoding> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| MetaWeblogError::encoding_error(format!("unknown encoding `{label}`")))?;

    if encoding.output_encoding() != encoding {
        return Err(MetaWeblogError::encoding_error(format!(
            "`{label}` cannot be used as an output encoding"
        )));
    }

    Ok(encoding)
}

/// Guesses the charset of `bytes`.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(bytes).is_ok() {
        return encoding_rs::UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

/// Re-encodes `raw` into `target` and HTML-escapes the result.
///
/// The returned string only contains characters representable in `target`;
/// the transport serializes it in that charset.
pub fn normalize_text(raw: &[u8], target: &str) -> Result<String> {
    let target = lookup_encoding(target)?;
    let source = detect_encoding(raw);

    let decoded = source
        .decode_without_bom_handling_and_without_replacement(raw)
        .ok_or_else(|| {
            MetaWeblogError::encoding_error(format!("malformed {} input", source.name()))
        })?;

    let converted = convert(&decoded, target)?;
    Ok(escape_html(&converted).into_owned())
}

/// Normalizes every string inside `value`, keeping structure and struct keys.
///
/// Numbers, booleans, dates, nil and base64 payloads pass through unchanged.
pub fn normalize_value(value: &Value, target: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(normalize_text(s.as_bytes(), target)?)),
        Value::Array(items) => items
            .iter()
            .map(|item| normalize_value(item, target))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Struct(members) => members
            .iter()
            .map(|(k, v)| Ok((k.clone(), normalize_value(v, target)?)))
            .collect::<Result<Vec<_>>>()
            .map(Value::Struct),
        other => Ok(other.clone()),
    }
}

/// Escapes the HTML special characters in `text`.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

fn convert(text: &str, target: &'static Encoding) -> Result<String> {
    if target == encoding_rs::UTF_8 {
        return Ok(text.to_string());
    }

    let (bytes, _, had_unmappable) = target.encode(text);
    if had_unmappable {
        return Err(MetaWeblogError::encoding_error(format!(
            "text contains characters not representable in {}",
            target.name()
        )));
    }

    target
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| {
            MetaWeblogError::encoding_error(format!("{} round trip failed", target.name()))
        })
}
