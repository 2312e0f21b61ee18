//! Cross-reference tables.
//!
//! Three sources feed an [`XRef`]: a classic `xref` table, a PDF 1.5
//! cross-reference stream, or (when both are unusable) a scan of the whole
//! file for `N G obj` headers.

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObject, PDFStream};
use crate::parser::PDFParser;
use regex::bytes::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static OBJ_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(\d+)\s+obj\b").expect("static regex is valid")
});

/// Where an object lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Uncompressed object at a byte offset in the file
    Offset { offset: usize, genno: u32 },
    /// Object number `index` inside object stream `stream_objid`
    InStream { stream_objid: u32, index: usize },
}

/// Cross-reference section plus its trailer.
#[derive(Debug, Default)]
pub struct XRef {
    pub offsets: HashMap<u32, XRefEntry>,
    pub trailer: PDFDict,
    /// Built by scanning the file rather than read from an xref section
    pub is_fallback: bool,
}

impl XRef {
    pub fn get(&self, objid: u32) -> Option<XRefEntry> {
        self.offsets.get(&objid).copied()
    }

    /// Trailer integer entry such as `/Prev` or `/XRefStm`.
    pub fn trailer_offset(&self, key: &str) -> Option<usize> {
        self.trailer
            .get(key)
            .and_then(|v| v.as_int().ok())
            .and_then(|n| usize::try_from(n).ok())
    }
}

fn is_eol_or_space(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t' | b'\x0c' | b'\x00')
}

fn skip_space(data: &[u8], mut cursor: usize) -> usize {
    while cursor < data.len() && is_eol_or_space(data[cursor]) {
        cursor += 1;
    }
    cursor
}

/// Read an unsigned decimal number, returning (value, bytes consumed).
pub fn read_number(data: &[u8]) -> Result<(u64, usize)> {
    let len = data.iter().take_while(|b| b.is_ascii_digit()).count();
    if len == 0 {
        return Err(PdfError::SyntaxError("expected number".into()));
    }
    let value = data[..len].iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(10)?.checked_add(u64::from(d - b'0'))
    });
    value
        .map(|v| (v, len))
        .ok_or_else(|| PdfError::SyntaxError("number out of range".into()))
}

/// Find the `startxref` offset near the end of the file.
pub fn find_startxref(data: &[u8]) -> Result<usize> {
    let needle = b"startxref";
    if data.len() < needle.len() {
        return Err(PdfError::SyntaxError("PDF too small".into()));
    }

    let search_start = data.len().saturating_sub(1024);
    let hay = &data[search_start..];
    let i = hay
        .windows(needle.len())
        .rposition(|w| w == needle)
        .map(|p| search_start + p)
        .ok_or(PdfError::NoValidXRef)?;

    let cursor = skip_space(data, i + needle.len());
    let (offset, _) = read_number(&data[cursor..]).map_err(|_| PdfError::NoValidXRef)?;
    let offset = usize::try_from(offset).map_err(|_| PdfError::NoValidXRef)?;
    if offset >= data.len() {
        return Err(PdfError::NoValidXRef);
    }
    Ok(offset)
}

/// Bytes from `cursor` on; a cursor past the end means the table was cut short.
fn tail(data: &[u8], cursor: usize) -> Result<&[u8]> {
    data.get(cursor..).ok_or(PdfError::UnexpectedEof)
}

/// Parse a classic `xref` table and the trailer that follows it.
pub fn parse_table(data: &[u8], pos: usize) -> Result<XRef> {
    let mut xref = XRef::default();
    let mut cursor = pos;
    if !tail(data, cursor)?.starts_with(b"xref") {
        return Err(PdfError::SyntaxError(format!("no xref table at {}", pos)));
    }
    cursor += 4;

    loop {
        cursor = skip_space(data, cursor);
        if cursor >= data.len() {
            return Err(PdfError::UnexpectedEof);
        }
        if data[cursor..].starts_with(b"trailer") {
            cursor += 7;
            break;
        }

        // Subsection header: first objid, count
        let (start, n) = read_number(tail(data, cursor)?)?;
        cursor = skip_space(data, cursor + n);
        let (count, n) = read_number(tail(data, cursor)?)?;
        cursor += n;

        let mut base = start;
        for i in 0..count {
            cursor = skip_space(data, cursor);
            let (offset, n) = read_number(tail(data, cursor)?)?;
            cursor = skip_space(data, cursor + n);
            let (genno, n) = read_number(tail(data, cursor)?)?;
            cursor = skip_space(data, cursor + n);
            let Some(&marker) = data.get(cursor) else {
                return Err(PdfError::UnexpectedEof);
            };
            cursor += 1;

            // Some writers start the first subsection at 1 but still emit the
            // object 0 free entry; realign so later entries land correctly.
            if i == 0 && base > 0 && marker == b'f' && offset == 0 && genno == 65535 {
                base -= 1;
            }

            if marker == b'n' {
                let objid = base
                    .checked_add(i)
                    .and_then(|id| u32::try_from(id).ok())
                    .ok_or_else(|| PdfError::SyntaxError("object id out of range".into()))?;
                xref.offsets.entry(objid).or_insert(XRefEntry::Offset {
                    offset: usize::try_from(offset).unwrap_or(usize::MAX),
                    genno: u32::try_from(genno).unwrap_or(0),
                });
            }
        }
    }

    cursor = skip_space(data, cursor);
    let mut parser = PDFParser::new(tail(data, cursor)?);
    if let Ok(PDFObject::Dict(trailer)) = parser.parse_object() {
        xref.trailer = trailer;
    }

    Ok(xref)
}

fn int_entry(stream: &PDFStream, key: &str) -> Result<i64> {
    stream
        .get(key)
        .ok_or_else(|| PdfError::SyntaxError(format!("missing {} in xref stream", key)))?
        .as_int()
}

fn unsigned(n: i64) -> Result<u64> {
    u64::try_from(n).map_err(|_| PdfError::SyntaxError(format!("negative xref stream count {}", n)))
}

fn be_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Build an xref from a decoded cross-reference stream.
pub fn from_stream(stream: &PDFStream, data: &[u8]) -> Result<XRef> {
    let widths = stream
        .get("W")
        .ok_or_else(|| PdfError::SyntaxError("missing W in xref stream".into()))?
        .as_array()?
        .iter()
        .map(|w| w.as_int().map(|n| usize::try_from(n).unwrap_or(0)))
        .collect::<Result<Vec<_>>>()?;
    let [w0, w1, w2] = widths[..] else {
        return Err(PdfError::SyntaxError("W must have 3 elements".into()));
    };
    let entry_size = w0 + w1 + w2;
    if entry_size == 0 {
        return Err(PdfError::SyntaxError("xref stream entries are empty".into()));
    }

    let size = unsigned(int_entry(stream, "Size")?)?;
    let index: Vec<(u64, u64)> = match stream.get("Index") {
        Some(idx) => idx
            .as_array()?
            .chunks_exact(2)
            .map(|pair| Ok((unsigned(pair[0].as_int()?)?, unsigned(pair[1].as_int()?)?)))
            .collect::<Result<_>>()?,
        None => vec![(0, size)],
    };

    let mut xref = XRef::default();
    let mut entries = data.chunks_exact(entry_size);

    'sections: for (start, count) in index {
        for i in 0..count {
            let Some(entry) = entries.next() else {
                break 'sections;
            };
            let Some(objid) = start.checked_add(i).and_then(|id| u32::try_from(id).ok()) else {
                continue;
            };
            // Type defaults to 1 when its width is zero.
            let kind = if w0 > 0 { be_int(&entry[..w0]) } else { 1 };
            let field1 = be_int(&entry[w0..w0 + w1]);
            let field2 = be_int(&entry[w0 + w1..]);

            let parsed = match kind {
                1 => XRefEntry::Offset {
                    offset: usize::try_from(field1).unwrap_or(usize::MAX),
                    genno: u32::try_from(field2).unwrap_or(0),
                },
                2 => XRefEntry::InStream {
                    stream_objid: u32::try_from(field1).unwrap_or(0),
                    index: usize::try_from(field2).unwrap_or(usize::MAX),
                },
                _ => continue,
            };
            xref.offsets.entry(objid).or_insert(parsed);
        }
    }

    for (key, value) in &stream.attrs {
        if !matches!(
            key.as_str(),
            "Length" | "Filter" | "DecodeParms" | "W" | "Index"
        ) {
            xref.trailer.insert(key.clone(), value.clone());
        }
    }

    Ok(xref)
}

/// Fallback: scan the file for `N G obj` headers and the last trailer.
pub fn scan(data: &[u8]) -> Result<XRef> {
    let mut xref = XRef {
        is_fallback: true,
        ..XRef::default()
    };

    for cap in OBJ_HEADER.captures_iter(data) {
        let (Some(whole), Some(objid), Some(genno)) = (cap.get(0), cap.get(1), cap.get(2)) else {
            continue;
        };
        let (Ok((objid, _)), Ok((genno, _))) =
            (read_number(objid.as_bytes()), read_number(genno.as_bytes()))
        else {
            continue;
        };
        let (Ok(objid), Ok(genno)) = (u32::try_from(objid), u32::try_from(genno)) else {
            continue;
        };
        // Later definitions of the same object supersede earlier ones.
        xref.offsets.insert(
            objid,
            XRefEntry::Offset {
                offset: whole.start(),
                genno,
            },
        );
    }

    if let Some(trailer_pos) = data.windows(7).rposition(|w| w == b"trailer") {
        let cursor = skip_space(data, trailer_pos + 7);
        let mut parser = PDFParser::new(&data[cursor..]);
        if let Ok(PDFObject::Dict(trailer)) = parser.parse_object() {
            xref.trailer = trailer;
        }
    }

    if xref.offsets.is_empty() {
        return Err(PdfError::NoValidXRef);
    }
    Ok(xref)
}
