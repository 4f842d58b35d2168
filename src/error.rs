//! Error types and result type for the MDX writer crate.
//!
//! This module defines all error variants the writer can produce. It uses
//! the `snafu` crate for ergonomic error handling with automatic backtrace
//! capture, mirroring the error-handling convention used throughout this
//! codebase's reader and builder crates.
//!
//! # Examples
//!
//! ```
//! use mdx::{Result, MdxWriteError};
//!
//! fn validate(encoding: &str) -> Result<()> {
//!     if encoding.is_empty() {
//!         return Err(MdxWriteError::invalid_parameter("encoding must not be empty"));
//!     }
//!     Ok(())
//! }
//! ```

use std::io;
use snafu::{Snafu, Backtrace};

// Re-export snafu for context providers
pub use snafu;

/// The error type for the MDX writer crate.
///
/// All errors include automatic backtrace capture for debugging purposes.
/// Use the helper methods on `MdxWriteError` for convenient error
/// construction at the few spots the writer raises errors directly (most
/// are raised through `Writer::new`'s validation, before any block is
/// built).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MdxWriteError {
    /// A construction parameter was invalid: an unknown encoding or
    /// version string, or an illegal combination of options (e.g.
    /// `encrypt_index` under `version = "1.2"`).
    #[snafu(display("invalid parameter: {message}"))]
    InvalidParameter {
        message: String,
        backtrace: Backtrace,
    },

    /// `compression_type` did not name any known compression method.
    #[snafu(display("unknown compression type: {type_tag}"))]
    UnknownCompression {
        type_tag: u32,
        backtrace: Backtrace,
    },

    /// A compression method was requested whose backend isn't available
    /// (LZO requested without the `lzo` feature).
    #[snafu(display("unsupported compression: {message}"))]
    UnsupportedCompression {
        message: String,
        backtrace: Backtrace,
    },

    /// I/O error while writing to the output sink.
    #[snafu(display("IO error: {source}"))]
    Io {
        source: io::Error,
        backtrace: Backtrace,
    },

    /// An invariant the writer assumes was fully validated at construction
    /// time turned out to not hold. Should be unreachable.
    #[snafu(display("internal error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },
}

impl From<io::Error> for MdxWriteError {
    fn from(source: io::Error) -> Self {
        Self::Io { source, backtrace: Backtrace::capture() }
    }
}

/// Helper methods for creating errors without context providers.
impl MdxWriteError {
    /// Creates an `InvalidParameter` error with the given message.
    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter {
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates an `UnknownCompression` error for the given type tag.
    pub fn unknown_compression(type_tag: u32) -> Self {
        Self::UnknownCompression {
            type_tag,
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates an `UnsupportedCompression` error with the given message.
    pub fn unsupported_compression<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedCompression {
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Creates an `Internal` error with the given message.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }
}

/// A specialized `Result` type for MDX writer operations.
pub type Result<T> = std::result::Result<T, MdxWriteError>;
