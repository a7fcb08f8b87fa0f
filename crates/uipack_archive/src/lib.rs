//! This library handles reading the compressed archives that **UI asset packages** are shipped in.
//!
//! # Package Archive Format Documentation
//!
//! A package archive bundles every descriptor of a UI package (the resource manifest, the sprite
//! index, component layouts, movie clip frame tables and font descriptors) into a single blob.
//! Package archives are typically identified with the `.fui` extension.
//!
//! ## File Structure
//!
//! The archive is one compressed stream. Once inflated, the payload is a flat sequence of records:
//!
//! | Field    | Encoding                    | Description                                          |
//! |----------|-----------------------------|------------------------------------------------------|
//! | Name     | UTF-8 text                  | Virtual file name, terminated by `|`                 |
//! | Length   | Decimal ASCII               | Byte count of the payload, terminated by `|`         |
//! | Payload  | `Length` raw bytes          | Content of the virtual file                          |
//!
//! Records repeat until no further `|` delimiter can be found, so the payload of the final record
//! is not followed by anything.
//!
//! ### Compression
//!
//! The whole record stream is compressed as one block. Possible methods are:
//!   - [`CompressionMethod::Deflate`]: a raw deflate stream without header (the default)
//!   - [`CompressionMethod::Zlib`]: a zlib wrapped deflate stream
//!   - [`CompressionMethod::None`]: the record stream is stored as is
//!
//! ### Records
//!
//! - **Name**: the virtual file name, for example `package.xml`, `sprites.bytes` or `n1.fnt`.
//!   Records with an empty name are skipped, their payload is still consumed.
//! - **Length**: a decimal integer giving the exact byte count of the payload. A length that is
//!   not a number, or that runs past the end of the buffer, invalidates the whole archive.
//! - **Payload**: the bytes of the virtual file, which may themselves contain `|`.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.fui`
//! - **Duplicate names**: the later record replaces the earlier one
//!

pub mod compression;
pub mod error;
pub mod read;

pub use compression::CompressionMethod;
pub use read::{ArchiveFile, PackageArchive};
