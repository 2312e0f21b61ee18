//! Resolved PDF values.
//!
//! A [`PdfValue`] is what the structure resolver produces from a raw
//! [`PDFObject`](super::objects::PDFObject): references are gone and byte
//! strings have been decoded to text.

use indexmap::IndexMap;

/// A dereferenced, text-decoded PDF value.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    /// Null, also used as the "unresolved" sentinel
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    /// PDF name, without the leading slash
    Name(String),
    Text(String),
    Array(Vec<Self>),
    Dict(IndexMap<String, Self>),
}

impl PdfValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for PdfValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PdfValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Best-effort decode of a PDF byte string to text. Never fails.
///
/// A leading UTF-16BE byte order mark selects UTF-16BE; everything else is
/// read as UTF-8. Invalid sequences are dropped, not replaced.
pub fn decode_text(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let units = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        return char::decode_utf16(units).filter_map(|c| c.ok()).collect();
    }

    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
