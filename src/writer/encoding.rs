//! Text-encoding normalization (§4.6): turns a headword or explanation
//! string into encoded bytes under the writer's declared [`Encoding`],
//! with and without a trailing NUL code unit.
//!
//! Grounded on this codebase's `storage/reader_helper.rs`
//! (`encode_string_to_bytes`, `str_to_utf16le_bytes`), which already
//! special-cases UTF-8 and UTF-16LE and otherwise defers to
//! `encoding_rs` for the legacy multi-byte encodings.

use encoding_rs::Encoding as EncodingRs;

use super::config::Encoding;
use crate::Result;

fn str_to_utf16le_bytes(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

fn encoding_rs_object(encoding: Encoding) -> &'static EncodingRs {
    match encoding {
        Encoding::Utf8 => encoding_rs::UTF_8,
        Encoding::Utf16Le => encoding_rs::UTF_16LE,
        Encoding::Gbk => encoding_rs::GBK,
        Encoding::Big5 => encoding_rs::BIG5,
    }
}

/// Encodes `s` under `encoding`, with no terminator.
pub fn encode_str(s: &str, encoding: Encoding) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Utf8 => Ok(s.as_bytes().to_vec()),
        Encoding::Utf16Le => Ok(str_to_utf16le_bytes(s)),
        Encoding::Gbk | Encoding::Big5 => {
            let (encoded, _, _had_errors) = encoding_rs_object(encoding).encode(s);
            Ok(encoded.into_owned())
        }
    }
}

/// Encodes `s` under `encoding`, with one encoded NUL code unit appended
/// (one byte for single-byte encodings, two bytes for UTF-16LE).
pub fn encode_str_null_terminated(s: &str, encoding: Encoding) -> Result<Vec<u8>> {
    let mut bytes = encode_str(s, encoding)?;
    match encoding.encoding_length() {
        1 => bytes.push(0),
        2 => bytes.extend_from_slice(&[0, 0]),
        other => unreachable!("encoding_length() only ever returns 1 or 2, got {other}"),
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_round_trips_through_encoding_rs() {
        let bytes = encode_str("alpha", Encoding::Utf8).unwrap();
        assert_eq!(bytes, b"alpha");
    }

    #[test]
    fn utf8_null_terminator_is_one_byte() {
        let bytes = encode_str_null_terminated("alpha", Encoding::Utf8).unwrap();
        assert_eq!(bytes, b"alpha\0");
    }

    #[test]
    fn utf16le_null_terminator_is_two_bytes() {
        let bytes = encode_str_null_terminated("a", Encoding::Utf16Le).unwrap();
        assert_eq!(bytes, vec![b'a', 0, 0, 0]);
    }

    #[test]
    fn utf16le_encodes_non_bmp_as_surrogate_pair() {
        // U+29DF6 ("\u{29DF6}"), outside the BMP: must become a UTF-16
        // surrogate pair (2 code units -> 4 bytes), per §8 scenario 3.
        let fish = "\u{29DF6}";
        assert_eq!(fish.chars().count(), 1);
        let bytes = encode_str(fish, Encoding::Utf16Le).unwrap();
        assert_eq!(bytes.len(), 4);
        let code_units = fish.encode_utf16().count();
        assert_eq!(code_units, 2);
    }

    #[test]
    fn gbk_and_big5_use_encoding_rs() {
        let gbk = encode_str("中文", Encoding::Gbk).unwrap();
        assert!(!gbk.is_empty());
        let big5 = encode_str("中文", Encoding::Big5).unwrap();
        assert!(!big5.is_empty());
        // Different legacy encodings produce different byte sequences for
        // the same source text.
        assert_ne!(gbk, big5);
    }
}
