//! Shared helpers for building small PDF files in tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Assembles numbered objects into a PDF file. Object ids start at 1 and
/// follow insertion order.
#[derive(Default)]
pub struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object body (the part between `obj` and `endobj`).
    pub fn add(&mut self, body: &str) -> u32 {
        self.add_bytes(body.as_bytes())
    }

    pub fn add_bytes(&mut self, body: &[u8]) -> u32 {
        self.objects.push(body.to_vec());
        self.objects.len() as u32
    }

    /// Id the next added object will get.
    pub fn next_id(&self) -> u32 {
        self.objects.len() as u32 + 1
    }

    /// Classic layout: objects, an `xref` table and a trailer.
    pub fn build(&self, root: u32) -> Vec<u8> {
        let mut out = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(self.objects.len());
        for (i, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            write_object(&mut out, i as u32 + 1, body);
        }

        let xref_pos = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", self.objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for off in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                self.objects.len() + 1,
                root,
                xref_pos
            )
            .as_bytes(),
        );
        out
    }

    /// Compressed layout: every object lives in one flate-compressed object
    /// stream, indexed by a cross-reference stream.
    pub fn build_compressed(&self, root: u32) -> Vec<u8> {
        let count = self.objects.len() as u32;
        let objstm_id = count + 1;
        let xref_id = count + 2;

        let mut header = String::new();
        let mut body = Vec::new();
        for (i, obj) in self.objects.iter().enumerate() {
            header.push_str(&format!("{} {} ", i + 1, body.len()));
            body.extend_from_slice(obj);
            body.push(b'\n');
        }
        let mut objstm = header.into_bytes();
        let first = objstm.len();
        objstm.extend_from_slice(&body);
        let objstm = zlib(&objstm);

        let mut out = b"%PDF-1.7\n".to_vec();
        let objstm_pos = out.len();
        write_stream(
            &mut out,
            objstm_id,
            &format!(
                "/Type /ObjStm /N {} /First {} /Filter /FlateDecode /Length {}",
                count,
                first,
                objstm.len()
            ),
            &objstm,
        );

        let xref_pos = out.len();
        let mut entries = Vec::new();
        entries.extend_from_slice(&[0, 0, 0, 0, 0, 0xFF, 0xFF]);
        for i in 0..count {
            entries.push(2);
            entries.extend_from_slice(&objstm_id.to_be_bytes());
            entries.extend_from_slice(&(i as u16).to_be_bytes());
        }
        for pos in [objstm_pos, xref_pos] {
            entries.push(1);
            entries.extend_from_slice(&(pos as u32).to_be_bytes());
            entries.extend_from_slice(&0u16.to_be_bytes());
        }
        let entries = zlib(&entries);
        write_stream(
            &mut out,
            xref_id,
            &format!(
                "/Type /XRef /Size {} /W [1 4 2] /Root {} 0 R /Filter /FlateDecode /Length {}",
                xref_id + 1,
                root,
                entries.len()
            ),
            &entries,
        );

        out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_pos).as_bytes());
        out
    }
}

fn write_object(out: &mut Vec<u8>, id: u32, body: &[u8]) {
    out.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\nendobj\n");
}

fn write_stream(out: &mut Vec<u8>, id: u32, dict: &str, data: &[u8]) {
    out.extend_from_slice(format!("{} 0 obj\n<< {} >>\nstream\n", id, dict).as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(b"\nendstream\nendobj\n");
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("zlib write");
    encoder.finish().expect("zlib finish")
}

/// A one-page document whose form holds one top-level field per entry.
///
/// Each entry is `(name, value)` where `value` is PDF source for `/V`, or
/// empty to leave the field without a value.
pub fn form_builder(fields: &[(&str, &str)]) -> (PdfBuilder, u32) {
    let mut pdf = PdfBuilder::new();
    let catalog = pdf.add("<< /Type /Catalog /Pages 2 0 R /AcroForm 4 0 R >>");
    pdf.add("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    pdf.add("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>");

    let first_field = pdf.next_id() + 1;
    let refs: Vec<String> = (0..fields.len())
        .map(|i| format!("{} 0 R", first_field + i as u32))
        .collect();
    pdf.add(&format!("<< /Fields [{}] >>", refs.join(" ")));

    for (name, value) in fields {
        if value.is_empty() {
            pdf.add(&format!("<< /FT /Tx /T ({}) /P 3 0 R >>", name));
        } else {
            pdf.add(&format!("<< /FT /Tx /T ({}) /V {} /P 3 0 R >>", name, value));
        }
    }
    (pdf, catalog)
}

pub fn form_pdf(fields: &[(&str, &str)]) -> Vec<u8> {
    let (pdf, root) = form_builder(fields);
    pdf.build(root)
}

/// A one-page document without an interactive form.
pub fn plain_pdf() -> Vec<u8> {
    let mut pdf = PdfBuilder::new();
    let root = pdf.add("<< /Type /Catalog /Pages 2 0 R >>");
    pdf.add("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    pdf.add("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>");
    pdf.build(root)
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write test file");
    path
}
