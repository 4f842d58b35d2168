//! Closed configuration types for the MDX writer.
//!
//! Dynamic string-based configuration (encoding names, version strings) is
//! parsed exactly once, at construction, into the closed enums below. Every
//! downstream serializer switches on these enums rather than re-parsing or
//! re-comparing strings, per the re-architecture guidance in §9 of the
//! specification this crate implements.

use crate::{MdxWriteError, Result};

/// The declared text encoding for headwords and explanations.
///
/// `encoding_length` is the number of bytes one code unit occupies under
/// that encoding: 1 for the single-byte-oriented encodings, 2 for
/// UTF-16LE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Gbk,
    Big5,
}

impl Encoding {
    /// Parses one of the case-insensitive aliases accepted by §6:
    /// `utf8`/`utf-8`, `utf16`/`utf-16`, `gbk`, `big5`.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "utf16" | "utf-16" => Ok(Encoding::Utf16Le),
            "gbk" => Ok(Encoding::Gbk),
            "big5" => Ok(Encoding::Big5),
            other => Err(MdxWriteError::invalid_parameter(format!(
                "unknown encoding: {other}"
            ))),
        }
    }

    /// The canonical name written into the header's `Encoding` attribute.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16",
            Encoding::Gbk => "GBK",
            Encoding::Big5 => "BIG5",
        }
    }

    /// Number of bytes per code unit: 1 for single-byte encodings, 2 for UTF-16LE.
    pub fn encoding_length(self) -> usize {
        match self {
            Encoding::Utf16Le => 2,
            _ => 1,
        }
    }
}

/// The compression method applied to each block and to the v2.0 key-block
/// index. See §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum CompressionType {
    None = 0,
    Lzo = 1,
    #[default]
    Zlib = 2,
}

impl CompressionType {
    /// Parses the raw numeric `compression_type` option from §6. Unlike
    /// the other `parse`/`from_*` constructors in this module, an unknown
    /// value here is not a bad *parameter* but the dedicated
    /// *UnknownCompression* kind §4.1/§7 call for.
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Lzo),
            2 => Ok(CompressionType::Zlib),
            other => Err(MdxWriteError::unknown_compression(other)),
        }
    }
}

/// The MDX format version, which changes integer widths and preamble
/// layout throughout (§4.8, §4.9, §4.11). This is the `FormatVariant`
/// described in §9: every serializer that needs a width threads it through
/// this value instead of comparing version strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatVersion {
    V1_2,
    #[default]
    V2_0,
}

impl FormatVersion {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "1.2" => Ok(FormatVersion::V1_2),
            "2.0" => Ok(FormatVersion::V2_0),
            other => Err(MdxWriteError::invalid_parameter(format!(
                "unknown version: {other}"
            ))),
        }
    }

    /// The string written into the header's engine-version attributes.
    pub fn engine_version_str(self) -> &'static str {
        match self {
            FormatVersion::V1_2 => "1.2",
            FormatVersion::V2_0 => "2.0",
        }
    }

    /// Width in bytes of the big-endian integer fields that scale with
    /// format version (offsets, sizes, entry counts): 4 for v1.2, 8 for
    /// v2.0.
    pub fn int_width(self) -> usize {
        match self {
            FormatVersion::V1_2 => 4,
            FormatVersion::V2_0 => 8,
        }
    }

    /// Width in bytes of the `first_key_len`/`last_key_len` fields in a
    /// key-block-index entry: 1 for v1.2, 2 for v2.0.
    pub fn key_len_width(self) -> usize {
        match self {
            FormatVersion::V1_2 => 1,
            FormatVersion::V2_0 => 2,
        }
    }

    pub fn is_v2(self) -> bool {
        matches!(self, FormatVersion::V2_0)
    }

    /// Largest `key_len` value that fits in `key_len_width()` bytes: 255
    /// for v1.2's 1-byte field, 65535 for v2.0's 2-byte field. A headword
    /// longer than this cannot be represented in a key-block-index entry.
    pub fn max_key_len(self) -> u64 {
        match self.key_len_width() {
            1 => u8::MAX as u64,
            2 => u16::MAX as u64,
            other => unreachable!("key_len_width() only ever returns 1 or 2, got {other}"),
        }
    }
}

/// All construction-time options for [`super::Writer`], with the defaults
/// specified in §6.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub block_size: usize,
    pub encrypt_index: bool,
    pub encoding: Encoding,
    pub compression_type: CompressionType,
    pub version: FormatVersion,
    pub encrypt_key: Option<Vec<u8>>,
    pub user_email: Option<Vec<u8>>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            block_size: 65536,
            encrypt_index: false,
            encoding: Encoding::default(),
            compression_type: CompressionType::default(),
            version: FormatVersion::default(),
            encrypt_key: None,
            user_email: None,
        }
    }
}

impl WriterConfig {
    /// Validates the illegal combination called out by §6:
    /// `encrypt_index = true` is not allowed under `version = "1.2"`.
    pub fn validate(&self) -> Result<()> {
        if self.encrypt_index && self.version == FormatVersion::V1_2 {
            return Err(MdxWriteError::invalid_parameter(
                "encrypt_index is not supported under version 1.2",
            ));
        }
        Ok(())
    }
}
