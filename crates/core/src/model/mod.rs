//! PDF model types.
//!
//! - `objects` - raw PDF object types (PDFObject, PDFStream, PDFObjRef)
//! - `value` - resolved, text-decoded values (PdfValue)

pub mod objects;
pub mod value;

pub use objects::{PDFDict, PDFObjRef, PDFObject, PDFStream};
pub use value::{PdfValue, decode_text};
