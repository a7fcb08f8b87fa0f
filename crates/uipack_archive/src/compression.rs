//! Block decompression handling.

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use tracing::instrument;

use crate::error::{Error, Result};

/// Identifies the storage format used to compress the record stream of an archive
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Stores the data as it is
    None,

    /// Raw deflate stream without any header
    #[default]
    Deflate,

    /// Deflate stream wrapped in a zlib header and checksum
    Zlib,
}

impl CompressionMethod {
    /// Inflate `data` into a freshly allocated buffer
    #[instrument(skip(data), fields(compressed = data.len()), err)]
    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len().saturating_mul(4));
        match self {
            CompressionMethod::None => out.extend_from_slice(data),
            CompressionMethod::Deflate => {
                DeflateDecoder::new(data)
                    .read_to_end(&mut out)
                    .map_err(Error::Decompress)?;
            }
            CompressionMethod::Zlib => {
                ZlibDecoder::new(data)
                    .read_to_end(&mut out)
                    .map_err(Error::Decompress)?;
            }
        }
        Ok(out)
    }
}
