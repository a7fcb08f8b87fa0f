//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// compressed stream could not be inflated
    #[error("unable to decompress archive")]
    #[diagnostic(help("check that the archive was written with the expected compression method"))]
    Decompress(#[source] std::io::Error),

    /// record framing is broken at {offset}: {reason}
    #[error("invalid archive framing at byte {offset}: {reason}")]
    InvalidFraming {
        /// Offset into the decompressed payload where the broken record starts
        offset: usize,
        /// What was wrong with the record
        reason: String,
    },

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by name {0}
    #[error("by name {0}")]
    Name(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
