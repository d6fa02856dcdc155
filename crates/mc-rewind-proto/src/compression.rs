//! Compression helpers for chunk payloads and legacy compound tags.

use std::io::{Read, Write};

use flate2::Compression;

use crate::error::ProtoError;

/// Level used for chunk payloads.
pub const DEFAULT_LEVEL: u32 = 6;

/// Stream formats used by the Java protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Chunk data and map chunk bulk payloads.
    Zlib,
    /// Length-prefixed compound tags in 1.7 item stacks.
    Gzip,
}

/// Compress data using the specified format.
pub fn compress(
    data: &[u8],
    format: CompressionFormat,
    level: u32,
) -> Result<Vec<u8>, ProtoError> {
    let level = Compression::new(level);
    match format {
        CompressionFormat::Zlib => {
            let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), level);
            encoder
                .write_all(data)
                .map_err(|e| ProtoError::CompressError(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| ProtoError::CompressError(e.to_string()))
        }
        CompressionFormat::Gzip => {
            let mut encoder = flate2::write::GzEncoder::new(Vec::new(), level);
            encoder
                .write_all(data)
                .map_err(|e| ProtoError::CompressError(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| ProtoError::CompressError(e.to_string()))
        }
    }
}

/// Decompress data using a known format.
pub fn decompress(data: &[u8], format: CompressionFormat) -> Result<Vec<u8>, ProtoError> {
    let mut output = Vec::new();
    let result = match format {
        CompressionFormat::Zlib => flate2::read::ZlibDecoder::new(data).read_to_end(&mut output),
        CompressionFormat::Gzip => flate2::read::GzDecoder::new(data).read_to_end(&mut output),
    };
    result.map_err(|e| ProtoError::DecompressError(e.to_string()))?;
    Ok(output)
}
