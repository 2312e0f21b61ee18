//! Structure resolver: turns a raw object graph into a self-contained
//! [`PdfValue`] tree.
//!
//! Resolution is bounded by a depth budget: every array, dictionary or
//! reference level costs one unit, and when the budget runs out the value is
//! replaced by `Null`. A reference back to an object already on the current
//! path also resolves to `Null`.

use crate::document::PDFDocument;
use crate::model::objects::{PDFDict, PDFObject};
use crate::model::value::{PdfValue, decode_text};
use indexmap::IndexMap;

/// Default depth budget for resolution.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Resolves objects against one document. Never mutates the document.
pub struct StructureResolver<'a> {
    doc: &'a PDFDocument,
}

impl<'a> StructureResolver<'a> {
    pub const fn new(doc: &'a PDFDocument) -> Self {
        Self { doc }
    }

    /// Fully resolve `obj`, dereferencing and decoding down to `max_depth`.
    pub fn resolve(&self, obj: &PDFObject, max_depth: usize) -> PdfValue {
        let mut path = Vec::new();
        self.resolve_inner(obj, max_depth, &mut path)
    }

    fn resolve_inner(&self, obj: &PDFObject, depth: usize, path: &mut Vec<u32>) -> PdfValue {
        if depth == 0 {
            tracing::trace!("resolution depth exhausted");
            return PdfValue::Null;
        }

        match obj {
            PDFObject::Null => PdfValue::Null,
            PDFObject::Bool(b) => PdfValue::Bool(*b),
            PDFObject::Int(n) => PdfValue::Int(*n),
            PDFObject::Real(n) => PdfValue::Real(*n),
            PDFObject::Name(name) => PdfValue::Name(name.clone()),
            PDFObject::String(bytes) => PdfValue::Text(decode_text(bytes)),
            PDFObject::Array(items) => PdfValue::Array(
                items
                    .iter()
                    .map(|item| self.resolve_inner(item, depth - 1, path))
                    .collect(),
            ),
            PDFObject::Dict(dict) => self.resolve_dict(dict, depth, path),
            PDFObject::Stream(stream) => self.resolve_dict(&stream.attrs, depth, path),
            PDFObject::Ref(r) => {
                if path.contains(&r.objid) {
                    tracing::debug!(objid = r.objid, "reference cycle, truncating");
                    return PdfValue::Null;
                }
                let target = match self.doc.getobj(r.objid) {
                    Ok(target) => target,
                    Err(e) => {
                        tracing::debug!(objid = r.objid, error = %e, "unresolvable reference");
                        return PdfValue::Null;
                    }
                };
                path.push(r.objid);
                let value = self.resolve_inner(&target, depth - 1, path);
                path.pop();
                value
            }
        }
    }

    fn resolve_dict(&self, dict: &PDFDict, depth: usize, path: &mut Vec<u32>) -> PdfValue {
        // Keys are names, and a name resolves to itself at any depth above
        // zero. They are carried as-is: at depth 1 the keys survive and
        // every value becomes Null.
        PdfValue::Dict(
            dict.iter()
                .map(|(key, value)| (key.clone(), self.resolve_inner(value, depth - 1, path)))
                .collect(),
        )
    }
}

/// Apply the same resolution rules to an already-resolved value.
///
/// Only the depth budget applies; on a value produced by
/// [`StructureResolver::resolve`] with the same budget this is the identity.
pub fn resolve_value(value: &PdfValue, max_depth: usize) -> PdfValue {
    if max_depth == 0 {
        return PdfValue::Null;
    }
    match value {
        PdfValue::Array(items) => PdfValue::Array(
            items
                .iter()
                .map(|item| resolve_value(item, max_depth - 1))
                .collect(),
        ),
        PdfValue::Dict(dict) => PdfValue::Dict(
            dict.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, max_depth - 1)))
                .collect::<IndexMap<_, _>>(),
        ),
        other => other.clone(),
    }
}
