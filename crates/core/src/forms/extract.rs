//! AcroForm field extraction.
//!
//! Walks `/Root /AcroForm /Fields` and collects one value per named field
//! into a [`FieldRecord`]. Extraction is best effort: a field whose entries
//! cannot be resolved is skipped with a debug log instead of failing the
//! whole document.

use super::resolver::{DEFAULT_MAX_DEPTH, StructureResolver};
use crate::document::PDFDocument;
use crate::error::Result;
use crate::model::objects::PDFObject;
use crate::model::value::{PdfValue, decode_text};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::Path;

/// Field values of one document, keyed by field name in encounter order.
///
/// Fields without a `/T` entry are keyed by `None`.
pub type FieldRecord = IndexMap<Option<String>, PdfValue>;

/// Knobs for [`FormExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Depth budget for resolving composite field values.
    pub max_depth: usize,
    /// Collect named descendants of valueless fields as `parent.child`.
    pub descend_kids: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            descend_kids: true,
        }
    }
}

pub struct FormExtractor<'a> {
    doc: &'a PDFDocument,
    resolver: StructureResolver<'a>,
    options: ExtractOptions,
}

impl<'a> FormExtractor<'a> {
    pub const fn new(doc: &'a PDFDocument) -> Self {
        Self::with_options(doc, ExtractOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            descend_kids: true,
        })
    }

    pub const fn with_options(doc: &'a PDFDocument, options: ExtractOptions) -> Self {
        Self {
            doc,
            resolver: StructureResolver::new(doc),
            options,
        }
    }

    /// Collect every field that carries a value.
    ///
    /// A document without an interactive form yields an empty record. When
    /// two fields share a name the later one wins but keeps the position of
    /// the first.
    pub fn extract_fields(&self) -> FieldRecord {
        let mut record = FieldRecord::new();

        let Some(acroform) = self.doc.catalog().get("AcroForm") else {
            return record;
        };
        let acroform = self.resolve_entry(acroform);
        let Some(fields) = acroform.get("Fields") else {
            return record;
        };
        let PDFObject::Array(fields) = self.resolve_entry(fields) else {
            tracing::debug!("/Fields is not an array, ignoring");
            return record;
        };

        let mut visited = HashSet::new();
        for field in &fields {
            self.collect_field(field, None, self.options.max_depth, &mut visited, &mut record);
        }
        record
    }

    fn collect_field(
        &self,
        field_obj: &PDFObject,
        parent: Option<&str>,
        depth: usize,
        visited: &mut HashSet<u32>,
        record: &mut FieldRecord,
    ) {
        if depth == 0 {
            return;
        }
        if let PDFObject::Ref(r) = field_obj
            && !visited.insert(r.objid)
        {
            tracing::debug!(objid = r.objid, "field visited twice, skipping");
            return;
        }

        let field = self.resolve_entry(field_obj);
        if !matches!(field, PDFObject::Dict(_) | PDFObject::Stream(_)) {
            tracing::debug!(kind = field.type_name(), "field is not a dictionary, skipping");
            return;
        }

        let name = field
            .get("T")
            .map(|t| self.resolve_entry(t))
            .and_then(|t| match t {
                PDFObject::String(bytes) => Some(decode_text(&bytes)),
                PDFObject::Name(name) => Some(name),
                _ => None,
            });
        // Kids only count as fields when they carry their own partial name.
        if parent.is_some() && name.is_none() {
            return;
        }
        let qualified = match (parent, name) {
            (Some(parent), Some(name)) => Some(format!("{}.{}", parent, name)),
            (_, name) => name,
        };

        let value = field
            .get("V")
            .map(|v| self.resolve_entry(v))
            .unwrap_or(PDFObject::Null);

        if !value.is_null() {
            let value = self.field_value(value);
            tracing::debug!(field = ?qualified, value = ?value, "field");
            record.insert(qualified, value);
            return;
        }

        if !self.options.descend_kids {
            return;
        }
        let Some(kids) = field.get("Kids") else {
            return;
        };
        if let PDFObject::Array(kids) = self.resolve_entry(kids)
            && let Some(prefix) = qualified.as_deref()
        {
            for kid in &kids {
                self.collect_field(kid, Some(prefix), depth - 1, visited, record);
            }
        }
    }

    fn field_value(&self, value: PDFObject) -> PdfValue {
        match value {
            PDFObject::String(bytes) => PdfValue::Text(strip_bytes_literal(decode_text(&bytes))),
            other => self.resolver.resolve(&other, self.options.max_depth),
        }
    }

    /// One level of indirection; anything unresolvable counts as null.
    fn resolve_entry(&self, obj: &PDFObject) -> PDFObject {
        self.doc.resolve(obj).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "unresolvable entry treated as null");
            PDFObject::Null
        })
    }
}

/// Extract with default options.
pub fn extract_fields(doc: &PDFDocument) -> FieldRecord {
    FormExtractor::new(doc).extract_fields()
}

/// Open `path`, extract its fields and release the file.
pub fn extract_file(path: impl AsRef<Path>, options: ExtractOptions) -> Result<FieldRecord> {
    let doc = PDFDocument::open(path)?;
    Ok(FormExtractor::with_options(&doc, options).extract_fields())
}

/// Drop a `b'...'` wrapper left behind by some form writers.
fn strip_bytes_literal(text: String) -> String {
    if text.starts_with("b'") && text.ends_with('\'') {
        return text.get(2..text.len() - 1).unwrap_or_default().to_string();
    }
    text
}
