//! Hash digest functions used by the MDX writer.
//!
//! RIPEMD-128 is the only digest the writer needs: it keys the custom
//! index cipher (§4.3), the Salsa20 preamble wrapper (§4.4), and the
//! registration-code generator (§4.5).

use ripemd128::{Digest, Ripemd128};

use crate::Result;

/// Computes a RIPEMD-128 hash digest of the input data.
///
/// # Arguments
///
/// * `data` - The data to hash
///
/// # Returns
///
/// Returns a 16-byte Vec<u8> containing the RIPEMD-128 hash.
pub fn ripemd_digest(data: &[u8]) -> Result<Vec<u8>> {
    let mut ripemd = Ripemd128::new();
    ripemd.input(data);
    let digest = ripemd.result();
    Ok(digest.to_vec())
}
