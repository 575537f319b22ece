//! Field codec for `#define` values
//!
//! Locates a field by a line-anchored pattern:
//! ```text
//! [blanks] # [blanks] define <blanks> SYMBOL <blanks> VALUE [anything]
//! ```
//! and rewrites only the bytes of `VALUE`. Comments, other macros, blank
//! lines and line endings are never touched.
//!
//! Reads are tolerant (a missing or malformed field reads as its default
//! display value) so a header lacking optional fields still opens. Writes
//! are strict: a missing field or an unknown TX label is an error rather
//! than a silent no-op.

use core::fmt;
use core::ops::Range;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::types::{Field, FieldKind, LinkId, TxRate};

/// Codec errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// No `#define` for the field
    Missing(Field),
    /// More than one `#define` for the field
    Duplicate(Field),
    /// The stored value cannot be decoded
    Malformed(Field),
    /// The new value cannot be encoded
    InvalidValue(Field),
    /// No TX rate has the given label
    UnknownLabel(Field),
}

impl CodecError {
    pub fn field(&self) -> Field {
        match *self {
            CodecError::Missing(f)
            | CodecError::Duplicate(f)
            | CodecError::Malformed(f)
            | CodecError::InvalidValue(f)
            | CodecError::UnknownLabel(f) => f,
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.field().symbol();
        match self {
            CodecError::Missing(_) => write!(f, "{} is not defined in the header", symbol),
            CodecError::Duplicate(_) => write!(f, "{} is defined more than once", symbol),
            CodecError::Malformed(_) => write!(f, "{} has an unreadable value", symbol),
            CodecError::InvalidValue(_) => write!(f, "invalid value for {}", symbol),
            CodecError::UnknownLabel(_) => write!(f, "unknown option for {}", symbol),
        }
    }
}

impl std::error::Error for CodecError {}

/// A located field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition<'a> {
    pub field: Field,
    /// Raw value token(s) as written in the header
    pub value: &'a str,
    /// Byte range of `value` within the document
    pub span: Range<usize>,
}

impl Definition<'_> {
    /// Decode the raw value into its display form
    pub fn decode(&self) -> Result<String, CodecError> {
        match self.field.kind() {
            FieldKind::Scalar => Ok(self.value.to_string()),
            FieldKind::ByteList => self
                .value
                .strip_prefix('{')
                .and_then(|v| v.strip_suffix('}'))
                .and_then(LinkId::from_literals)
                .map(|id| id.to_string())
                .ok_or(CodecError::Malformed(self.field)),
            FieldKind::Symbol => TxRate::from_symbol(self.value)
                .map(|rate| rate.label().to_string())
                .ok_or(CodecError::Malformed(self.field)),
        }
    }
}

fn build_pattern(field: Field) -> Regex {
    let value = match field.kind() {
        // Whole brace group, which may span continued lines, or a bare
        // token so a malformed value is still found
        FieldKind::ByteList => r"\{[^}#]*\}|[^\s]+",
        FieldKind::Scalar | FieldKind::Symbol => r"[^\s]+",
    };
    let pattern = format!(
        r"(?m)^[ \t]*#[ \t]*define[ \t]+{}[ \t]+(?P<value>{})",
        regex::escape(field.symbol()),
        value
    );
    Regex::new(&pattern).expect("valid field pattern")
}

fn pattern(field: Field) -> &'static Regex {
    static PATTERNS: OnceLock<[Regex; 5]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| Field::ALL.map(build_pattern));
    &patterns[field as usize]
}

/// Find the single definition of `field` in `document`
pub fn locate(document: &str, field: Field) -> Result<Definition<'_>, CodecError> {
    let mut found = None;
    for caps in pattern(field).captures_iter(document) {
        if found.is_some() {
            return Err(CodecError::Duplicate(field));
        }
        if let Some(m) = caps.name("value") {
            found = Some(Definition {
                field,
                value: m.as_str(),
                span: m.range(),
            });
        }
    }
    let def = found.ok_or(CodecError::Missing(field))?;
    // An unclosed brace group cannot be replaced without leaving stray literals
    if def.value.starts_with('{') && !def.value.ends_with('}') {
        return Err(CodecError::Malformed(field));
    }
    Ok(def)
}

/// Read a field's display value
///
/// Returns the field's default display value when the definition is
/// missing, duplicated or unreadable.
pub fn get_field(document: &str, field: Field) -> String {
    match locate(document, field).and_then(|def| def.decode()) {
        Ok(value) => value,
        Err(e) => {
            debug!("{}, using default", e);
            field.default_display().to_string()
        }
    }
}

/// Header spelling of a display value
pub fn encode(field: Field, display: &str) -> Result<String, CodecError> {
    match field.kind() {
        FieldKind::Scalar => {
            let value = display.trim();
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(CodecError::InvalidValue(field));
            }
            Ok(value.to_string())
        }
        FieldKind::ByteList => display
            .trim()
            .parse::<LinkId>()
            .map(|id| id.to_literals())
            .map_err(|_| CodecError::InvalidValue(field)),
        FieldKind::Symbol => TxRate::from_label(display.trim())
            .or_else(|| TxRate::from_label(display))
            .map(|rate| rate.symbol().to_string())
            .ok_or(CodecError::UnknownLabel(field)),
    }
}

/// Rewrite a field's value, returning the new document
///
/// Only the value bytes are replaced; on error the caller's document is
/// left as it was.
pub fn set_field(document: &str, field: Field, display: &str) -> Result<String, CodecError> {
    let encoded = encode(field, display)?;
    let span = locate(document, field)?.span;

    let mut out = String::with_capacity(document.len() - span.len() + encoded.len());
    out.push_str(&document[..span.start]);
    out.push_str(&encoded);
    out.push_str(&document[span.end..]);
    Ok(out)
}
