//! Character cleanup applied to extracted text before it reaches a
//! spreadsheet cell.

use super::extract::FieldRecord;
use crate::model::value::PdfValue;

/// Characters a spreadsheet cell must not receive.
///
/// Covers the C0 controls except tab, line feed and carriage return, plus
/// every code point from U+007F through U+00FF.
const fn is_illegal(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}'..='\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'..='\u{FF}')
}

/// Remove illegal characters from `s`. Everything else is kept as is.
pub fn clean_string(s: &str) -> String {
    s.chars().filter(|&c| !is_illegal(c)).collect()
}

/// Clean a single value. Text is cleaned, containers are cleaned
/// recursively and all other values pass through.
pub fn sanitize_value(value: PdfValue) -> PdfValue {
    match value {
        PdfValue::Text(s) => PdfValue::Text(clean_string(&s)),
        PdfValue::Array(items) => PdfValue::Array(items.into_iter().map(sanitize_value).collect()),
        PdfValue::Dict(dict) => {
            PdfValue::Dict(dict.into_iter().map(|(k, v)| (k, sanitize_value(v))).collect())
        }
        other => other,
    }
}

/// Clean every value of a record. Field names are left alone.
pub fn sanitize_record(record: FieldRecord) -> FieldRecord {
    record
        .into_iter()
        .map(|(name, value)| (name, sanitize_value(value)))
        .collect()
}
