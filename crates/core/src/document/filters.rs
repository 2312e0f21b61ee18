//! Stream decoding for the streams that hold objects: object streams and
//! cross-reference streams.
//!
//! Only FlateDecode (with optional PNG predictors) is supported; that is
//! what writers use for these two stream types in practice.

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObject};
use std::io::Read;

/// Decode stream data given its (already resolved) `/Filter` and
/// `/DecodeParms` entries.
pub fn decode(data: &[u8], filter: Option<&PDFObject>, parms: Option<&PDFObject>) -> Result<Vec<u8>> {
    let filters: Vec<&str> = match filter {
        None | Some(PDFObject::Null) => Vec::new(),
        Some(PDFObject::Name(name)) => vec![name.as_str()],
        Some(PDFObject::Array(arr)) => arr
            .iter()
            .map(|f| f.as_name())
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(PdfError::DecodeError(format!(
                "unexpected /Filter of type {}",
                other.type_name()
            )));
        }
    };

    let params: Vec<Option<&PDFDict>> = match parms {
        Some(PDFObject::Dict(d)) => vec![Some(d)],
        Some(PDFObject::Array(arr)) => arr.iter().map(|p| p.as_dict().ok()).collect(),
        _ => Vec::new(),
    };

    let mut output = data.to_vec();
    for (i, name) in filters.iter().enumerate() {
        output = match *name {
            "FlateDecode" | "Fl" => inflate(&output),
            other => {
                return Err(PdfError::DecodeError(format!("unsupported filter: {}", other)));
            }
        };
        if let Some(Some(parms)) = params.get(i) {
            output = apply_predictor(output, parms)?;
        }
    }
    Ok(output)
}

fn inflate(data: &[u8]) -> Vec<u8> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    if decoder.read_to_end(&mut decompressed).is_err() {
        return decompress_corrupted(data);
    }
    decompressed
}

/// Best-effort zlib decompression for corrupted streams.
///
/// Returns the output produced up to the point the decoder fails, which is
/// usually everything but a bad checksum at the end.
fn decompress_corrupted(data: &[u8]) -> Vec<u8> {
    use flate2::{Decompress, FlushDecompress, Status};
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        out.extend_from_slice(&buf[..produced]);
        let consumed = (decoder.total_in() - before_in) as usize;
        i += consumed.max(1);
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

fn apply_predictor(data: Vec<u8>, parms: &PDFDict) -> Result<Vec<u8>> {
    let int_param = |key: &str, default: i64| {
        parms
            .get(key)
            .and_then(|v| v.as_int().ok())
            .unwrap_or(default)
    };

    let predictor = int_param("Predictor", 1);
    if predictor < 10 {
        // 1 = none; TIFF predictor 2 never appears on object-bearing streams.
        return Ok(data);
    }

    let size_param = |key: &str, default: i64| {
        let n = int_param(key, default);
        usize::try_from(n)
            .map_err(|_| PdfError::DecodeError(format!("invalid predictor /{} {}", key, n)))
    };
    let columns = size_param("Columns", 1)?;
    let colors = size_param("Colors", 1)?;
    let bits = size_param("BitsPerComponent", 8)?;
    png_unpredict(&data, columns, colors, bits)
}

/// Reverse PNG row filters.
///
/// Every row starts with a filter-type byte followed by `row_bytes` bytes.
fn png_unpredict(data: &[u8], columns: usize, colors: usize, bits: usize) -> Result<Vec<u8>> {
    let row_bits = colors
        .checked_mul(columns)
        .and_then(|n| n.checked_mul(bits))
        .ok_or_else(|| PdfError::DecodeError("PNG predictor row size overflows".into()))?;
    let row_bytes = row_bits.div_ceil(8);
    if row_bytes == 0 {
        return Err(PdfError::DecodeError("PNG predictor with empty rows".into()));
    }
    if row_bytes > data.len() {
        return Err(PdfError::DecodeError(format!(
            "PNG predictor row of {} bytes exceeds {} bytes of data",
            row_bytes,
            data.len()
        )));
    }
    let bpp = std::cmp::max(1, colors.saturating_mul(bits) / 8);
    let row_size = row_bytes + 1;

    let mut result = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];

    for row in data.chunks_exact(row_size) {
        let filter_type = row[0];
        let row_data = &row[1..];
        let mut current = vec![0u8; row_bytes];

        for i in 0..row_bytes {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let above = prev_row[i];
            let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
            let base = match filter_type {
                1 => left,
                2 => above,
                3 => ((u16::from(left) + u16::from(above)) / 2) as u8,
                4 => paeth_predictor(left, above, upper_left),
                _ => 0,
            };
            current[i] = row_data[i].wrapping_add(base);
        }

        result.extend_from_slice(&current);
        prev_row = current;
    }

    Ok(result)
}

const fn paeth_predictor(left: u8, above: u8, upper_left: u8) -> u8 {
    let a = left as i32;
    let b = above as i32;
    let c = upper_left as i32;
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_flate_round_trip() {
        let compressed = zlib(b"1 0 2 15 << /T (Name) >>");
        let filter = PDFObject::Name("FlateDecode".into());
        let out = decode(&compressed, Some(&filter), None).unwrap();
        assert_eq!(out, b"1 0 2 15 << /T (Name) >>");
    }

    #[test]
    fn test_no_filter_is_identity() {
        assert_eq!(decode(b"abc", None, None).unwrap(), b"abc");
    }

    #[test]
    fn test_unsupported_filter_is_reported() {
        let filter = PDFObject::Name("DCTDecode".into());
        assert!(matches!(
            decode(b"", Some(&filter), None),
            Err(PdfError::DecodeError(_))
        ));
    }

    #[test]
    fn test_png_up_predictor() {
        // Two rows of 3 columns, filter type 2 (Up) on the second row.
        let predicted = [0u8, 1, 2, 3, 2, 1, 1, 1];
        let out = png_unpredict(&predicted, 3, 1, 8).unwrap();
        assert_eq!(out, [1, 2, 3, 2, 3, 4]);
    }

    #[test]
    fn test_oversized_predictor_columns_are_rejected() {
        assert!(matches!(
            png_unpredict(&[2, 0, 0], 4_000_000_000_000, 1, 8),
            Err(PdfError::DecodeError(_))
        ));
        assert!(matches!(
            png_unpredict(&[2, 0, 0], usize::MAX, 3, 8),
            Err(PdfError::DecodeError(_))
        ));
    }

    #[test]
    fn test_predictor_params_from_decode_parms() {
        let mut parms = PDFDict::new();
        parms.insert("Predictor".into(), PDFObject::Int(12));
        parms.insert("Columns".into(), PDFObject::Int(4_000_000_000_000));
        let parms = PDFObject::Dict(parms);
        let filter = PDFObject::Name("FlateDecode".into());
        assert!(matches!(
            decode(&zlib(&[2, 0, 0, 0]), Some(&filter), Some(&parms)),
            Err(PdfError::DecodeError(_))
        ));
    }

    #[test]
    fn test_corrupted_stream_does_not_fail() {
        let mut compressed = zlib(&[b'x'; 64]);
        let len = compressed.len();
        compressed[len - 1] ^= 0xFF; // break the adler32 checksum
        let filter = PDFObject::Name("FlateDecode".into());
        let out = decode(&compressed, Some(&filter), None).unwrap();
        assert!(out.len() <= 64);
        assert!(out.iter().all(|&b| b == b'x'));
    }
}
