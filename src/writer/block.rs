//! The block partitioner (§4.7) and the key/record block & block-index
//! builders (§4.8, §4.9).
//!
//! Block kinds are modeled as a sealed trait with two implementations,
//! per the re-architecture guidance in §9, replacing the
//! abstract-base-class + `_block_entry`/`_len_block_entry` override
//! pattern of the reference implementation.

use super::compression::compress;
use super::config::{CompressionType, FormatVersion};
use super::offset_table::OffsetTableEntry;
use crate::Result;

fn pack_uint(value: u64, width: usize) -> Vec<u8> {
    match width {
        4 => (value as u32).to_be_bytes().to_vec(),
        8 => value.to_be_bytes().to_vec(),
        other => unreachable!("int_width() only ever returns 4 or 8, got {other}"),
    }
}

fn pack_len(value: u64, width: usize) -> Vec<u8> {
    match width {
        1 => vec![value as u8],
        2 => (value as u16).to_be_bytes().to_vec(),
        other => unreachable!("key_len_width() only ever returns 1 or 2, got {other}"),
    }
}

/// A block kind: either the key index or the record payload. Exposes the
/// size estimate the partitioner uses and the bytes one entry contributes
/// to a block's decompressed payload.
pub trait BlockKind {
    /// Approximately `len(block_entry_bytes(entry, version))`; used only
    /// to decide where to split blocks, so it need not be exact (§4.7
    /// notes the key-block estimate is only exact for v2.0).
    fn entry_size_hint(entry: &OffsetTableEntry) -> usize;

    /// Bytes contributed by one entry to this block kind's decompressed
    /// payload.
    fn entry_bytes(entry: &OffsetTableEntry, version: FormatVersion) -> Vec<u8>;
}

/// The key-block kind: payload entries are `pack(offset, width) ∥ key_null`.
pub struct Key;

impl BlockKind for Key {
    fn entry_size_hint(entry: &OffsetTableEntry) -> usize {
        8 + entry.key_null.len()
    }

    fn entry_bytes(entry: &OffsetTableEntry, version: FormatVersion) -> Vec<u8> {
        let mut out = pack_uint(entry.offset, version.int_width());
        out.extend_from_slice(&entry.key_null);
        out
    }
}

/// The record-block kind: payload entries are the NUL-terminated records themselves.
pub struct Record;

impl BlockKind for Record {
    fn entry_size_hint(entry: &OffsetTableEntry) -> usize {
        entry.record_null.len()
    }

    fn entry_bytes(entry: &OffsetTableEntry, _version: FormatVersion) -> Vec<u8> {
        entry.record_null.clone()
    }
}

/// Greedily partitions `table` into index ranges whose summed
/// `K::entry_size_hint` stays within `block_size`, per §4.7:
/// - a new block starts when adding the current entry would exceed
///   `block_size`;
/// - the final block is always closed;
/// - a single entry larger than `block_size` still forms its own block
///   (never split within an entry);
/// - an empty table yields zero blocks.
pub fn partition<K: BlockKind>(
    table: &[OffsetTableEntry],
    block_size: usize,
) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let mut block_start = 0usize;
    let mut current_size = 0usize;

    for (index, entry) in table.iter().enumerate() {
        let entry_size = K::entry_size_hint(entry);
        if index > block_start && current_size + entry_size > block_size {
            blocks.push((block_start, index));
            block_start = index;
            current_size = 0;
        }
        current_size += entry_size;
    }
    if block_start < table.len() {
        blocks.push((block_start, table.len()));
    }
    blocks
}

/// A compressed key block together with its decompressed size and the
/// summary fields needed to build its key-block-index entry.
pub struct KeyBlock {
    pub num_entries: u64,
    pub first_key: Vec<u8>,
    pub first_key_len: u64,
    pub last_key: Vec<u8>,
    pub last_key_len: u64,
    pub decomp_size: u64,
    pub comp_data: Vec<u8>,
}

impl KeyBlock {
    pub fn comp_size(&self) -> u64 {
        self.comp_data.len() as u64
    }

    pub fn build(
        entries: &[OffsetTableEntry],
        version: FormatVersion,
        compression_type: CompressionType,
    ) -> Result<Self> {
        let mut decomp_data = Vec::new();
        for entry in entries {
            decomp_data.extend_from_slice(&Key::entry_bytes(entry, version));
        }
        let decomp_size = decomp_data.len() as u64;
        let comp_data = compress(&decomp_data, compression_type)?;

        let first = &entries[0];
        let last = &entries[entries.len() - 1];
        let (first_key, last_key) = if version.is_v2() {
            (first.key_null.clone(), last.key_null.clone())
        } else {
            (first.key.clone(), last.key.clone())
        };

        Ok(KeyBlock {
            num_entries: entries.len() as u64,
            first_key,
            first_key_len: first.key_len,
            last_key,
            last_key_len: last.key_len,
            decomp_size,
            comp_data,
        })
    }

    /// The key-block-index entry for this block (§4.8).
    pub fn index_entry(&self, version: FormatVersion) -> Vec<u8> {
        let w = version.int_width();
        let lw = version.key_len_width();
        let mut out = Vec::new();
        out.extend_from_slice(&pack_uint(self.num_entries, w));
        out.extend_from_slice(&pack_len(self.first_key_len, lw));
        out.extend_from_slice(&self.first_key);
        out.extend_from_slice(&pack_len(self.last_key_len, lw));
        out.extend_from_slice(&self.last_key);
        out.extend_from_slice(&pack_uint(self.comp_size(), w));
        out.extend_from_slice(&pack_uint(self.decomp_size, w));
        out
    }
}

/// A compressed record block together with its decompressed size.
pub struct RecordBlock {
    pub decomp_size: u64,
    pub comp_data: Vec<u8>,
}

impl RecordBlock {
    pub fn comp_size(&self) -> u64 {
        self.comp_data.len() as u64
    }

    pub fn build(entries: &[OffsetTableEntry], compression_type: CompressionType) -> Result<Self> {
        let mut decomp_data = Vec::new();
        for entry in entries {
            decomp_data.extend_from_slice(&Record::entry_bytes(entry, FormatVersion::V2_0));
        }
        let decomp_size = decomp_data.len() as u64;
        let comp_data = compress(&decomp_data, compression_type)?;
        Ok(RecordBlock { decomp_size, comp_data })
    }

    /// The record-block-index entry for this block (§4.9):
    /// `pack(comp_size) ∥ pack(decomp_size)`.
    pub fn index_entry(&self, version: FormatVersion) -> Vec<u8> {
        let w = version.int_width();
        let mut out = Vec::with_capacity(2 * w);
        out.extend_from_slice(&pack_uint(self.comp_size(), w));
        out.extend_from_slice(&pack_uint(self.decomp_size, w));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries_of_sizes(record_sizes: &[usize]) -> Vec<OffsetTableEntry> {
        let mut offset = 0u64;
        record_sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| {
                let key = format!("k{i:03}").into_bytes();
                let mut key_null = key.clone();
                key_null.push(0);
                let record_null = vec![b'x'; size];
                let entry = OffsetTableEntry {
                    key_len: key.len() as u64,
                    key,
                    key_null,
                    record_null,
                    offset,
                };
                offset += size as u64;
                entry
            })
            .collect()
    }

    #[test]
    fn partition_empty_table_yields_no_blocks() {
        let table: Vec<OffsetTableEntry> = Vec::new();
        assert!(partition::<Record>(&table, 100).is_empty());
    }

    #[test]
    fn partition_single_oversized_entry_is_its_own_block() {
        let table = entries_of_sizes(&[1000]);
        let blocks = partition::<Record>(&table, 64);
        assert_eq!(blocks, vec![(0, 1)]);
    }

    #[test]
    fn partition_splits_when_block_size_exceeded() {
        // Three 40-byte records with a 64-byte budget: the first two push
        // past the budget (40 + 40 > 64), so entry 2 starts a new block.
        let table = entries_of_sizes(&[40, 40, 40]);
        let blocks = partition::<Record>(&table, 64);
        assert_eq!(blocks, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn partition_packs_multiple_small_entries_per_block() {
        let table = entries_of_sizes(&[10, 10, 10, 10, 10]);
        let blocks = partition::<Record>(&table, 25);
        // 10+10=20 (ok), +10=30 (too big) -> split after index 2
        assert_eq!(blocks, vec![(0, 2), (2, 4), (4, 5)]);
    }

    #[test]
    fn key_block_index_entry_widths_follow_format_version() {
        let table = entries_of_sizes(&[5, 5]);
        let block_v2 = KeyBlock::build(&table, FormatVersion::V2_0, CompressionType::None).unwrap();
        let entry_v2 = block_v2.index_entry(FormatVersion::V2_0);
        assert_eq!(&entry_v2[0..8], &2u64.to_be_bytes()[..]); // num_entries, 8-byte wide under v2.0

        let block_v1 = KeyBlock::build(&table, FormatVersion::V1_2, CompressionType::None).unwrap();
        let entry_v1 = block_v1.index_entry(FormatVersion::V1_2);
        assert_eq!(&entry_v1[0..4], &2u32.to_be_bytes()[..]); // num_entries, 4-byte wide under v1.2
        assert!(entry_v1.len() < entry_v2.len());
    }

    #[test]
    fn key_block_first_last_key_null_terminated_only_in_v2() {
        let table = entries_of_sizes(&[3, 3, 3]);
        let v2 = KeyBlock::build(&table, FormatVersion::V2_0, CompressionType::None).unwrap();
        assert_eq!(v2.first_key, table[0].key_null);
        assert_eq!(v2.last_key, table[2].key_null);

        let v1 = KeyBlock::build(&table, FormatVersion::V1_2, CompressionType::None).unwrap();
        assert_eq!(v1.first_key, table[0].key);
        assert_eq!(v1.last_key, table[2].key);
    }

    #[test]
    fn record_block_decomp_size_matches_payload_sum() {
        let table = entries_of_sizes(&[5, 7, 9]);
        let block = RecordBlock::build(&table, CompressionType::None).unwrap();
        let expected: usize = table.iter().map(|e| e.record_null.len()).sum();
        assert_eq!(block.decomp_size as usize, expected);
    }
}
