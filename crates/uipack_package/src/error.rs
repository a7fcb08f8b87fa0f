//! Error types that can be emitted from this library
//!

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent warpper for [`uipack_archive::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    Archive(#[from] uipack_archive::error::Error),

    /// Document is not a well formed attributed tree
    #[error("invalid tree document: {0}")]
    InvalidTree(String),

    /// Resource manifest is structurally broken
    #[error("invalid package manifest: {0}")]
    InvalidManifest(String),

    /// A virtual file the package cannot load without is absent
    #[error("package is missing {0}")]
    MissingFile(String),

    /// No package is registered or loadable under this key
    #[error("package not found: {0}")]
    PackageNotFound(String),

    /// A package with the same id is already registered
    #[error("package {0} is already registered")]
    DuplicatePackage(String),

    /// No item of the package carries this name
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
