//! # mdx - MDX Dictionary File Writer
//!
//! This crate writes MDX dictionary files (the binary, block-structured
//! container format used by MDict-compatible dictionary readers) from an
//! in-memory mapping of headwords to HTML explanations.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::fs::File;
//! use mdx::writer::Writer;
//! use mdx::writer::config::WriterConfig;
//!
//! # fn main() -> mdx::Result<()> {
//! let mut entries = BTreeMap::new();
//! entries.insert("alpha".to_string(), "<i>alpha</i>".to_string());
//! entries.insert("beta".to_string(), "Letter <b>beta</b>".to_string());
//!
//! let writer = Writer::new(&entries, "My Dictionary", "An example dictionary", WriterConfig::default())?;
//! let mut file = File::create("example.mdx")?;
//! writer.write(&mut file)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`writer`]: the serializer — offset-table builder, block partitioner,
//!   key/record block and index builders, header writer, and the
//!   top-level assembler ([`writer::Writer`]).
//! - [`crypto`]: the leaf cryptographic primitives the writer builds on —
//!   RIPEMD-128, Salsa20, the custom nibble-swap index cipher, and the
//!   registration-code generator.
//!
//! Reading/parsing MDX files, CLI or example wiring, HTML authoring, and
//! any reader-side behavior are out of scope for this crate.
//!
//! ## Error Handling
//!
//! All fallible operations return a [`Result<T>`], where errors are
//! represented by [`MdxWriteError`]. The crate uses the `snafu` crate for
//! ergonomic error handling with context and backtraces.

pub mod crypto;
pub mod error;
pub mod writer;

// Re-export error types for convenience
pub use error::{snafu, MdxWriteError, Result};
pub use writer::Writer;
