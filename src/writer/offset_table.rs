//! The offset-table builder (§4.6): sorts entries by headword, encodes
//! keys and records under the declared encoding, and computes each
//! entry's cumulative record offset.

use super::config::Encoding;
use super::encoding::{encode_str, encode_str_null_terminated};
use crate::Result;

/// One entry in the sorted offset table. See §3.
#[derive(Debug, Clone)]
pub struct OffsetTableEntry {
    /// Encoded headword, no terminator.
    pub key: Vec<u8>,
    /// Encoded headword, with a trailing encoded NUL appended.
    pub key_null: Vec<u8>,
    /// Length of `key` in code units (bytes / encoding_length), excluding any terminator.
    pub key_len: u64,
    /// Encoded explanation, with a trailing encoded NUL appended.
    pub record_null: Vec<u8>,
    /// Cumulative sum of `len(record_null)` over all prior entries.
    pub offset: u64,
}

/// Builds the sorted offset table from an (headword, explanation) mapping.
///
/// Sorting is by the code-point sequence of the original (un-encoded)
/// headword, matching §3's invariant — not by the encoded byte sequence,
/// which could disagree with code-point order under GBK/Big5.
///
/// Returns the offset table and the total encoded length of all records
/// (the value the final entry's `offset + len(record_null)` converges to).
pub fn build_offset_table(
    entries: &std::collections::BTreeMap<String, String>,
    encoding: Encoding,
) -> Result<(Vec<OffsetTableEntry>, u64)> {
    // BTreeMap already iterates in ascending key order, satisfying the
    // code-point sort invariant without a separate sort pass.
    let encoding_length = encoding.encoding_length() as u64;

    let mut table = Vec::with_capacity(entries.len());
    let mut offset: u64 = 0;
    for (headword, explanation) in entries {
        let key = encode_str(headword, encoding)?;
        let key_null = encode_str_null_terminated(headword, encoding)?;
        let key_len = key.len() as u64 / encoding_length;
        let record_null = encode_str_null_terminated(explanation, encoding)?;
        let record_len = record_null.len() as u64;

        table.push(OffsetTableEntry {
            key,
            key_null,
            key_len,
            record_null,
            offset,
        });
        offset += record_len;
    }
    Ok((table, offset))
}
