//! Payload compression for both protocols.
//!
//! Bedrock batches use raw deflate or snappy behind a one byte algorithm
//! header. Java frames use zlib with a length prefix (see `java::framing`).

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::ProtoError;

/// Hard cap on inflated output; anything larger is treated as hostile.
pub const MAX_DECOMPRESSED: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionAlgorithm {
    #[default]
    Deflate,
    Snappy,
    None,
}

impl CompressionAlgorithm {
    /// Value carried by the NetworkSettings packet.
    pub fn from_u16(v: u16) -> Result<Self, ProtoError> {
        match v {
            0 => Ok(Self::Deflate),
            1 => Ok(Self::Snappy),
            0xFFFF => Ok(Self::None),
            other => Err(ProtoError::UnknownCompression(other)),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::Deflate => 0,
            Self::Snappy => 1,
            Self::None => 0xFFFF,
        }
    }

    /// Header byte in front of a compressed batch.
    pub fn from_byte(v: u8) -> Result<Self, ProtoError> {
        match v {
            0x00 => Ok(Self::Deflate),
            0x01 => Ok(Self::Snappy),
            0xFF => Ok(Self::None),
            other => Err(ProtoError::UnknownCompression(other as u16)),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Deflate => 0x00,
            Self::Snappy => 0x01,
            Self::None => 0xFF,
        }
    }

    /// Accepts the spellings used in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "zlib" | "deflate" => Some(Self::Deflate),
            "snappy" => Some(Self::Snappy),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}

pub fn compress(
    data: &[u8],
    algorithm: CompressionAlgorithm,
    level: u32,
) -> Result<Vec<u8>, ProtoError> {
    match algorithm {
        CompressionAlgorithm::Deflate => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
            encoder
                .write_all(data)
                .map_err(|e| ProtoError::Compress(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| ProtoError::Compress(e.to_string()))
        }
        CompressionAlgorithm::Snappy => snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|e| ProtoError::Compress(e.to_string())),
        CompressionAlgorithm::None => Ok(data.to_vec()),
    }
}

pub fn decompress(data: &[u8], algorithm: CompressionAlgorithm) -> Result<Vec<u8>, ProtoError> {
    match algorithm {
        CompressionAlgorithm::Deflate => read_limited(DeflateDecoder::new(data)),
        CompressionAlgorithm::Snappy => {
            let len = snap::raw::decompress_len(data)
                .map_err(|e| ProtoError::Decompress(e.to_string()))?;
            if len > MAX_DECOMPRESSED {
                return Err(ProtoError::Decompress(format!(
                    "snappy payload of {len} bytes over limit"
                )));
            }
            snap::raw::Decoder::new()
                .decompress_vec(data)
                .map_err(|e| ProtoError::Decompress(e.to_string()))
        }
        CompressionAlgorithm::None => Ok(data.to_vec()),
    }
}

pub fn zlib_compress(data: &[u8], level: u32) -> Result<Vec<u8>, ProtoError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder
        .write_all(data)
        .map_err(|e| ProtoError::Compress(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ProtoError::Compress(e.to_string()))
}

pub fn zlib_decompress(data: &[u8]) -> Result<Vec<u8>, ProtoError> {
    read_limited(ZlibDecoder::new(data))
}

fn read_limited(reader: impl Read) -> Result<Vec<u8>, ProtoError> {
    let mut out = Vec::new();
    reader
        .take(MAX_DECOMPRESSED as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| ProtoError::Decompress(e.to_string()))?;
    if out.len() > MAX_DECOMPRESSED {
        return Err(ProtoError::Decompress("inflated payload over limit".into()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &[u8] = b"the quick brown fox jumps over the lazy dog, the quick brown fox";

    #[test]
    fn deflate_and_snappy() {
        for algo in [CompressionAlgorithm::Deflate, CompressionAlgorithm::Snappy] {
            let packed = compress(TEXT, algo, 6).unwrap();
            assert_eq!(decompress(&packed, algo).unwrap(), TEXT);
        }
    }

    #[test]
    fn zlib_has_header() {
        let packed = zlib_compress(TEXT, 6).unwrap();
        assert_eq!(packed[0], 0x78);
        assert_eq!(zlib_decompress(&packed).unwrap(), TEXT);
    }

    #[test]
    fn inflate_bomb_is_refused() {
        let zeros = vec![0u8; MAX_DECOMPRESSED + 16];
        let packed = compress(&zeros, CompressionAlgorithm::Deflate, 9).unwrap();
        assert!(matches!(
            decompress(&packed, CompressionAlgorithm::Deflate),
            Err(ProtoError::Decompress(_))
        ));
    }

    #[test]
    fn header_bytes_and_names() {
        assert_eq!(CompressionAlgorithm::from_byte(0xFF).unwrap(), CompressionAlgorithm::None);
        assert!(CompressionAlgorithm::from_byte(0x42).is_err());
        assert_eq!(CompressionAlgorithm::from_u16(1).unwrap().to_byte(), 0x01);
        assert_eq!(CompressionAlgorithm::from_name("ZLIB"), Some(CompressionAlgorithm::Deflate));
        assert_eq!(CompressionAlgorithm::from_name("lz4"), None);
    }
}
