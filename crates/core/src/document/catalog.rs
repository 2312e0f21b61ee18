//! PDF Document - the per-file handle used by form extraction.
//!
//! Handles:
//! - XRef loading (classic tables, xref streams, hybrid files, fallback scan)
//! - Object lookup, including objects packed in object streams
//! - One-level reference resolution
//! - Locating the document catalog

use super::filters;
use super::xref::{self, XRef, XRefEntry};
use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObject, PDFStream};
use crate::parser::PDFParser;
use bytes::Bytes;
use memmap2::Mmap;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// How far into the file the `%PDF-` header may appear.
const HEADER_SEARCH_LIMIT: usize = 1024;

/// PDF Document - provides access to PDF objects and the catalog.
///
/// Owns its data; dropping the document releases the file contents
/// (and the memory map when opened from a path).
pub struct PDFDocument {
    data: Bytes,
    xrefs: Vec<XRef>,
    catalog: PDFDict,
    cache: Mutex<HashMap<u32, Arc<PDFObject>>>,
}

impl std::fmt::Debug for PDFDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PDFDocument")
            .field("len", &self.data.len())
            .field("xrefs", &self.xrefs.len())
            .finish_non_exhaustive()
    }
}

impl PDFDocument {
    /// Create a new PDFDocument from raw PDF data.
    pub fn new<D: AsRef<[u8]>>(data: D) -> Result<Self> {
        Self::new_from_bytes(Bytes::copy_from_slice(data.as_ref()))
    }

    /// Create a new PDFDocument from shared bytes (zero-copy).
    pub fn new_from_bytes(data: Bytes) -> Result<Self> {
        let mut doc = Self {
            data,
            xrefs: Vec::new(),
            catalog: PDFDict::new(),
            cache: Mutex::new(HashMap::new()),
        };
        doc.parse()?;
        Ok(doc)
    }

    /// Open and parse the PDF file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        if file.metadata()?.len() == 0 {
            return Err(PdfError::NotPdf);
        }
        // Safety: the map is read-only and owned by the returned document;
        // inputs are not expected to be modified while a batch runs.
        let mmap = unsafe { Mmap::map(&file) }?;
        Self::new_from_bytes(Bytes::from_owner(mmap))
    }

    fn parse(&mut self) -> Result<()> {
        let head = &self.data[..self.data.len().min(HEADER_SEARCH_LIMIT)];
        if !head.windows(5).any(|w| w == b"%PDF-") {
            return Err(PdfError::NotPdf);
        }

        let loaded = xref::find_startxref(&self.data)
            .and_then(|pos| self.load_xrefs(pos))
            .is_ok()
            && !self.xrefs.is_empty()
            && self.xrefs.iter().any(|x| !x.offsets.is_empty());

        if !loaded {
            tracing::debug!("xref unusable, scanning file for objects");
            self.xrefs.clear();
            let xref = xref::scan(&self.data)?;
            self.xrefs.push(xref);
        }

        if self.xrefs.iter().any(|x| x.trailer.contains_key("Encrypt")) {
            return Err(PdfError::Encrypted);
        }

        self.catalog = self.find_catalog()?;
        Ok(())
    }

    /// Load xref sections starting at `pos`, following `/Prev` and `/XRefStm`.
    fn load_xrefs(&mut self, mut pos: usize) -> Result<()> {
        let mut visited = HashSet::new();

        while visited.insert(pos) {
            let xref = self.load_xref_at(pos)?;
            let xref_stm = xref.trailer_offset("XRefStm");
            let prev = xref.trailer_offset("Prev");
            self.xrefs.push(xref);

            if let Some(stm_pos) = xref_stm
                && visited.insert(stm_pos)
                && let Ok(stm) = self.load_xref_stream(stm_pos)
            {
                self.xrefs.push(stm);
            }

            match prev {
                Some(prev_pos) if prev_pos < self.data.len() => pos = prev_pos,
                _ => break,
            }
        }

        Ok(())
    }

    fn load_xref_at(&self, pos: usize) -> Result<XRef> {
        if self.data[pos..].starts_with(b"xref") {
            xref::parse_table(&self.data, pos)
        } else {
            self.load_xref_stream(pos)
        }
    }

    fn load_xref_stream(&self, pos: usize) -> Result<XRef> {
        let obj = self.parse_object_at(pos, false)?;
        let stream = obj.as_stream()?;
        let data = self.decode_stream(stream)?;
        xref::from_stream(stream, &data)
    }

    /// Catalog from the first trailer with a usable `/Root`.
    ///
    /// When no trailer names one (typical after a fallback scan of a damaged
    /// file), the first `/Type /Catalog` dictionary found wins.
    fn find_catalog(&self) -> Result<PDFDict> {
        for xref in &self.xrefs {
            if let Some(root) = xref.trailer.get("Root")
                && let Ok(PDFObject::Dict(dict)) = self.resolve(root)
            {
                return Ok(dict);
            }
        }

        let mut objids: Vec<u32> = self
            .xrefs
            .iter()
            .flat_map(|x| x.offsets.keys().copied())
            .collect();
        objids.sort_unstable();
        objids.dedup();
        for objid in objids {
            if let Ok(obj) = self.getobj(objid)
                && let PDFObject::Dict(dict) = obj.as_ref()
                && matches!(dict.get("Type"), Some(PDFObject::Name(t)) if t == "Catalog")
            {
                return Ok(dict.clone());
            }
        }

        Err(PdfError::SyntaxError(
            "no /Root object - is this really a PDF?".into(),
        ))
    }

    /// Get an object by ID.
    pub fn getobj(&self, objid: u32) -> Result<Arc<PDFObject>> {
        if objid == 0 {
            return Err(PdfError::ObjectNotFound(0));
        }

        // Object streams are themselves objects; guard against an object
        // stream that (directly or not) claims to contain itself.
        thread_local! {
            static RESOLVING: RefCell<HashSet<u32>> = RefCell::new(HashSet::new());
        }

        struct ResolvingGuard {
            objid: u32,
        }

        impl Drop for ResolvingGuard {
            fn drop(&mut self) {
                RESOLVING.with(|set| {
                    set.borrow_mut().remove(&self.objid);
                });
            }
        }

        if let Ok(cache) = self.cache.lock()
            && let Some(obj) = cache.get(&objid)
        {
            return Ok(Arc::clone(obj));
        }

        let is_circular = RESOLVING.with(|set| !set.borrow_mut().insert(objid));
        if is_circular {
            return Err(PdfError::SyntaxError(format!(
                "circular reference detected for obj {}",
                objid
            )));
        }
        let _guard = ResolvingGuard { objid };

        for xref in &self.xrefs {
            let Some(entry) = xref.get(objid) else {
                continue;
            };
            let parsed = match entry {
                XRefEntry::Offset { offset, .. } => self.parse_object_at(offset, xref.is_fallback),
                XRefEntry::InStream {
                    stream_objid,
                    index,
                } => self.parse_object_from_stream(stream_objid, index),
            };
            // A broken entry may be superseded by an older section.
            let Ok(obj) = parsed else {
                continue;
            };

            let obj = Arc::new(obj);
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(objid, Arc::clone(&obj));
            }
            return Ok(obj);
        }

        Err(PdfError::ObjectNotFound(objid))
    }

    /// Parse object number `index` out of object stream `stream_objid`.
    fn parse_object_from_stream(&self, stream_objid: u32, index: usize) -> Result<PDFObject> {
        let stream_obj = self.getobj(stream_objid)?;
        let stream = stream_obj.as_stream()?;
        let data = self.decode_stream(stream)?;

        let int = |key: &str| -> Result<usize> {
            let n = stream
                .get(key)
                .ok_or_else(|| PdfError::SyntaxError(format!("missing {} in ObjStm", key)))?
                .as_int()?;
            usize::try_from(n).map_err(|_| PdfError::SyntaxError(format!("negative {}", key)))
        };
        let n = int("N")?;
        let first = int("First")?;

        if index >= n {
            return Err(PdfError::SyntaxError(format!("index {} >= N {}", index, n)));
        }
        if first > data.len() {
            return Err(PdfError::SyntaxError("ObjStm /First past end of data".into()));
        }

        // Header: objid1 offset1 objid2 offset2 ...
        let mut header = PDFParser::new(&data[..first]);
        let mut offset = 0;
        for _ in 0..=index {
            header.parse_object()?.as_int()?;
            offset = header.parse_object()?.as_int()?;
        }

        let start = usize::try_from(offset)
            .ok()
            .and_then(|o| o.checked_add(first))
            .filter(|&s| s <= data.len())
            .ok_or_else(|| PdfError::SyntaxError("ObjStm offset out of range".into()))?;
        PDFParser::new(&data[start..]).parse_object()
    }

    /// Parse the indirect object `objid genno obj ...` at `offset`.
    fn parse_object_at(&self, offset: usize, fallback: bool) -> Result<PDFObject> {
        if offset >= self.data.len() {
            return Err(PdfError::SyntaxError(format!(
                "object offset {} exceeds file size {}",
                offset,
                self.data.len()
            )));
        }

        let body = &self.data[offset..];
        let mut parser = PDFParser::new(body);
        parser.parse_object()?.as_int()?;
        parser.parse_object()?.as_int()?;
        parser.expect_keyword(b"obj")?;
        let obj = parser.parse_object()?;

        let PDFObject::Dict(dict) = obj else {
            return Ok(obj);
        };

        // A dictionary followed by `stream` is a stream object.
        let remaining = parser.remaining();
        let mut pos = 0;
        while pos < remaining.len() && crate::parser::Lexer::is_whitespace(remaining[pos]) {
            pos += 1;
        }
        if !remaining[pos..].starts_with(b"stream") {
            return Ok(PDFObject::Dict(dict));
        }
        pos += 6;
        if remaining.get(pos) == Some(&b'\r') {
            pos += 1;
        }
        if remaining.get(pos) == Some(&b'\n') {
            pos += 1;
        }

        let start_abs = offset + (body.len() - remaining.len()) + pos;
        let content = &remaining[pos..];

        // Object and xref streams are located by scanning for `endstream`;
        // their /Length is sometimes wrong and everything else hangs off them.
        let force_scan = matches!(
            dict.get("Type"),
            Some(PDFObject::Name(name)) if name == "XRef" || name == "ObjStm"
        );
        let declared = if fallback || force_scan {
            None
        } else {
            dict.get("Length")
                .and_then(|len| self.resolve(len).ok())
                .and_then(|len| len.as_int().ok())
                .and_then(|len| usize::try_from(len).ok())
                .filter(|&len| len > 0 && len <= content.len())
        };

        let len = declared
            .or_else(|| find_endstream(content))
            .unwrap_or(content.len());
        let stream_data = self.data.slice(start_abs..start_abs + len);

        Ok(PDFObject::Stream(Box::new(PDFStream::new(dict, stream_data))))
    }

    /// Decode a stream's data, resolving indirect `/Filter` and `/DecodeParms`.
    pub fn decode_stream(&self, stream: &PDFStream) -> Result<Vec<u8>> {
        let filter = match stream.get("Filter") {
            Some(f) => Some(self.resolve_shallow_array(f)?),
            None => None,
        };
        let parms = match stream.get("DecodeParms") {
            Some(p) => Some(self.resolve_shallow_array(p)?),
            None => None,
        };
        filters::decode(stream.get_rawdata(), filter.as_ref(), parms.as_ref())
    }

    /// Resolve an object and, if it is an array, each of its elements.
    fn resolve_shallow_array(&self, obj: &PDFObject) -> Result<PDFObject> {
        match self.resolve(obj)? {
            PDFObject::Array(items) => items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>>>()
                .map(PDFObject::Array),
            other => Ok(other),
        }
    }

    /// Get document catalog.
    pub const fn catalog(&self) -> &PDFDict {
        &self.catalog
    }

    /// Resolve a reference to its actual object (one level of indirection;
    /// chains of references are followed). Non-references come back as-is.
    pub fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        let PDFObject::Ref(first) = obj else {
            return Ok(obj.clone());
        };
        let mut seen = HashSet::from([first.objid]);
        let mut current = self.getobj(first.objid)?;
        while let PDFObject::Ref(r) = current.as_ref() {
            if !seen.insert(r.objid) {
                return Err(PdfError::SyntaxError(format!(
                    "circular reference detected for obj {}",
                    r.objid
                )));
            }
            current = self.getobj(r.objid)?;
        }
        Ok(current.as_ref().clone())
    }

    /// All object ids known to the cross-reference sections.
    pub fn objids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .xrefs
            .iter()
            .flat_map(|x| x.offsets.keys().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Whether every xref section came from the fallback scan.
    pub fn is_repaired(&self) -> bool {
        self.xrefs.iter().all(|x| x.is_fallback)
    }
}

/// Length of stream content before `endstream`, trailing EOL trimmed.
fn find_endstream(data: &[u8]) -> Option<usize> {
    let needle = b"endstream";
    let pos = data.windows(needle.len()).position(|w| w == needle)?;
    let mut end = pos;
    while end > 0 && matches!(data[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_pdf;

    #[test]
    fn test_pdfdocument_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PDFDocument>();
    }

    #[test]
    fn test_catalog_and_getobj() {
        let pdf = build_pdf(&["<< /Type /Catalog /Pages 2 0 R >>", "<< /Type /Pages /Count 0 >>"], 1);
        let doc = PDFDocument::new(&pdf).unwrap();
        assert_eq!(doc.catalog().get("Type"), Some(&PDFObject::Name("Catalog".into())));

        let pages = doc.resolve(doc.catalog().get("Pages").unwrap()).unwrap();
        assert_eq!(pages.as_dict().unwrap().get("Count"), Some(&PDFObject::Int(0)));
        assert!(!doc.is_repaired());
        assert_eq!(doc.objids(), vec![1, 2]);
    }

    #[test]
    fn test_getobj_zero_is_not_found() {
        let pdf = build_pdf(&["<< /Type /Catalog >>"], 1);
        let doc = PDFDocument::new(&pdf).unwrap();
        assert!(matches!(doc.getobj(0), Err(PdfError::ObjectNotFound(0))));
        assert!(matches!(doc.getobj(9), Err(PdfError::ObjectNotFound(9))));
    }

    #[test]
    fn test_getobj_cache_returns_same_arc() {
        let pdf = build_pdf(&["<< /Type /Catalog >>"], 1);
        let doc = PDFDocument::new(&pdf).unwrap();
        let a = doc.getobj(1).unwrap();
        let b = doc.getobj(1).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_resolve_follows_reference_chains() {
        let pdf = build_pdf(&["<< /Type /Catalog /X 2 0 R >>", "3 0 R", "(end)"], 1);
        let doc = PDFDocument::new(&pdf).unwrap();
        let x = doc.resolve(doc.catalog().get("X").unwrap()).unwrap();
        assert_eq!(x, PDFObject::String(b"end".to_vec()));
    }

    #[test]
    fn test_circular_reference_chain_is_an_error() {
        let pdf = build_pdf(&["<< /Type /Catalog /X 2 0 R >>", "3 0 R", "2 0 R"], 1);
        let doc = PDFDocument::new(&pdf).unwrap();
        assert!(matches!(
            doc.resolve(doc.catalog().get("X").unwrap()),
            Err(PdfError::SyntaxError(_))
        ));
    }

    #[test]
    fn test_stream_length_is_honoured() {
        let pdf = build_pdf(
            &["<< /Type /Catalog >>", "<< /Length 5 >>\nstream\nhello world\nendstream"],
            1,
        );
        let doc = PDFDocument::new(&pdf).unwrap();
        let obj = doc.getobj(2).unwrap();
        assert_eq!(obj.as_stream().unwrap().get_rawdata(), b"hello");
    }

    #[test]
    fn test_broken_startxref_falls_back_to_scan() {
        let mut pdf = build_pdf(&["<< /Type /Catalog /Answer 42 >>"], 1);
        let pos = pdf.windows(9).rposition(|w| w == b"startxref").unwrap();
        pdf.truncate(pos);
        pdf.extend_from_slice(b"startxref\n3\n%%EOF\n");

        let doc = PDFDocument::new(&pdf).unwrap();
        assert!(doc.is_repaired());
        assert_eq!(doc.catalog().get("Answer"), Some(&PDFObject::Int(42)));
    }

    #[test]
    fn test_catalog_found_by_type_without_trailer() {
        let pdf = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Marker (yes) >>\nendobj\n%%EOF\n";
        let doc = PDFDocument::new(pdf).unwrap();
        assert_eq!(
            doc.catalog().get("Marker"),
            Some(&PDFObject::String(b"yes".to_vec()))
        );
    }

    #[test]
    fn test_rejects_non_pdf_data() {
        assert!(matches!(
            PDFDocument::new(b"just some text"),
            Err(PdfError::NotPdf)
        ));
    }

    #[test]
    fn test_rejects_encrypted_documents() {
        let mut pdf = build_pdf(&["<< /Type /Catalog >>", "<< /Filter /Standard >>"], 1);
        let pos = pdf.windows(7).rposition(|w| w == b"/Root 1").unwrap();
        pdf.splice(pos..pos, b"/Encrypt 2 0 R ".iter().copied());
        assert!(matches!(PDFDocument::new(&pdf), Err(PdfError::Encrypted)));
    }

    #[test]
    fn test_endstream_trims_eol() {
        assert_eq!(find_endstream(b"abc\r\nendstream"), Some(3));
        assert_eq!(find_endstream(b"abc"), None);
    }
}
