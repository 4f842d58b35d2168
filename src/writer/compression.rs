//! The compression façade (§4.1): wraps zlib (mandatory), optional LZO,
//! and a pass-through mode behind a uniform `compress` entry point,
//! prepending a 4-byte little-endian type tag and a 4-byte big-endian
//! Adler-32 checksum of the *uncompressed* data.
//!
//! Grounded on this codebase's `utils/compression.rs` `Compressor`
//! trait/`get_compressor` factory pattern, adapted to the simpler 8-byte
//! framing this format uses (the ZDB format this codebase also supports
//! wraps compression and encryption together in a wider per-block header;
//! MDX keeps them separate, see [`crate::crypto::cipher`]).

use std::io::Write;

use adler::adler32_slice;
use flate2::Compression;
use flate2::write::ZlibEncoder;

use super::config::CompressionType;
use crate::{MdxWriteError, Result};

/// A single compression backend. Implementations return the *compressed
/// payload only*; [`compress`] prepends the shared 8-byte header.
trait Compressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

struct NoneCompressor;

impl Compressor for NoneCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

struct ZlibCompressor;

impl Compressor for ZlibCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }
}

#[cfg(feature = "lzo")]
struct LzoCompressor;

#[cfg(feature = "lzo")]
impl Compressor for LzoCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut compressed = Vec::with_capacity(data.len());
        let mut ctx = rust_lzo::LZOContext::new();
        match ctx.compress(data, &mut compressed) {
            rust_lzo::LZOError::OK => Ok(compressed),
            error => Err(MdxWriteError::internal(format!(
                "LZO compression error: {}",
                error as u32
            ))),
        }
    }
}

fn compressor_for(compression_type: CompressionType) -> Result<Box<dyn Compressor>> {
    match compression_type {
        CompressionType::None => Ok(Box::new(NoneCompressor)),
        CompressionType::Zlib => Ok(Box::new(ZlibCompressor)),
        #[cfg(feature = "lzo")]
        CompressionType::Lzo => Ok(Box::new(LzoCompressor)),
        #[cfg(not(feature = "lzo"))]
        CompressionType::Lzo => Err(MdxWriteError::unsupported_compression(
            "LZO compression requires the `lzo` feature",
        )),
    }
}

/// Checks that `compression_type`'s backend is actually available without
/// compressing anything. Used at construction so an unsupported choice
/// (LZO without the `lzo` feature) fails fast even when the input mapping
/// is empty and `compress` would otherwise never run (no blocks to build).
pub fn validate_available(compression_type: CompressionType) -> Result<()> {
    compressor_for(compression_type).map(|_| ())
}

/// `compress(data, type) -> bytes`: the compression façade described in
/// §4.1. `type` is already one of the closed [`CompressionType`] values by
/// the time it reaches this function; a raw numeric tag from external
/// configuration is expected to go through [`CompressionType::from_u32`]
/// first, which rejects unknown tags with `UnknownCompression`.
pub fn compress(data: &[u8], compression_type: CompressionType) -> Result<Vec<u8>> {
    let checksum = adler32_slice(data);
    let payload = compressor_for(compression_type)?.compress(data)?;

    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&(compression_type as u32).to_le_bytes());
    out.extend_from_slice(&checksum.to_be_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}
