//! PDF parsing modules.
//!
//! - `lexer`: byte-level tokenizer
//! - `pdf_parser`: PDF object parser (indirect references, arrays, dictionaries)

pub mod lexer;
pub mod pdf_parser;

pub use lexer::{Lexer, Token};
pub use pdf_parser::PDFParser;
