//! Helpers shared by unit tests.

use crate::document::PDFDocument;

/// Assemble a PDF with a correct classic xref from object bodies. Object
/// ids start at 1 and follow slice order.
pub(crate) fn build_pdf(objects: &[&str], root: u32) -> Vec<u8> {
    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref_pos = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            root,
            xref_pos
        )
        .as_bytes(),
    );
    out
}

/// Parsed document whose first object is the catalog.
pub(crate) fn doc_with(objects: &[&str]) -> PDFDocument {
    PDFDocument::new(build_pdf(objects, 1)).expect("test PDF parses")
}
