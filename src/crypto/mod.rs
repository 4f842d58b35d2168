// Cryptographic building blocks for MDX dictionary files.
//
// This module provides the leaf primitives used by the writer: a RIPEMD-128
// digest, a generic Salsa20 stream cipher, and the two MDX-specific
// encryption paths (the nibble-swap index cipher and the Salsa20 preamble
// wrapper / registration-code generator) built on top of them.

pub mod cipher;
pub mod digest;
pub mod salsa20;

pub use cipher::{encrypt_key, fast_encrypt, mdx_encrypt, salsa_encrypt};
pub use digest::ripemd_digest;
pub use salsa20::Salsa20Context;
