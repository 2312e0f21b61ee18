//! Raw PDF object types, as they come out of the parser.

use crate::error::{PdfError, Result};
use bytes::Bytes;
use indexmap::IndexMap;

/// Dictionary type used throughout the object model.
///
/// Keys keep file order so that resolved output and records are stable.
pub type PDFDict = IndexMap<String, PDFObject>;

/// PDF Object types - the fundamental value type in PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /Type, /Yes)
    Name(String),
    /// String (byte array)
    String(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(PDFDict),
    /// Stream (dictionary + binary data)
    Stream(Box<PDFStream>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as integer
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary
    pub const fn as_dict(&self) -> Result<&PDFDict> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Get as object reference
    pub const fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Look up a key on a dictionary or on a stream's attributes.
    ///
    /// Returns `None` for every other object type.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict(d) => d.get(key),
            Self::Stream(s) => s.get(key),
            _ => None,
        }
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u32,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// PDF Stream - dictionary attributes + raw (still encoded) data.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    /// Stream dictionary attributes
    pub attrs: PDFDict,
    rawdata: Bytes,
}

impl PDFStream {
    /// Create a new stream.
    pub fn new(attrs: PDFDict, rawdata: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            rawdata: rawdata.into(),
        }
    }

    /// Get raw (undecoded) data.
    pub fn get_rawdata(&self) -> &[u8] {
        self.rawdata.as_ref()
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }

    /// Check whether the stream is of the given `/Type`.
    pub fn is_type(&self, type_name: &str) -> bool {
        matches!(self.attrs.get("Type"), Some(PDFObject::Name(name)) if name == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_reads_dict_and_stream_attributes() {
        let mut attrs = PDFDict::new();
        attrs.insert("Type".into(), PDFObject::Name("ObjStm".into()));
        let dict = PDFObject::Dict(attrs.clone());
        let stream = PDFObject::Stream(Box::new(PDFStream::new(attrs, Vec::new())));

        assert_eq!(dict.get("Type"), Some(&PDFObject::Name("ObjStm".into())));
        assert!(stream.as_stream().unwrap().is_type("ObjStm"));
        assert_eq!(stream.get("Missing"), None);
        assert_eq!(PDFObject::Int(3).get("Type"), None);
    }

    #[test]
    fn test_type_errors_name_both_sides() {
        let err = PDFObject::Null.as_dict().unwrap_err();
        assert_eq!(err.to_string(), "type error: expected dict, got null");
    }
}
