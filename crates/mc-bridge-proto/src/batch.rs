//! The 0xFE game packet layer.
//!
//! A batch is `0xFE [algorithm] body` where body is a run of
//! `VarUInt length + packet` records. The algorithm byte only appears once
//! compression has been negotiated through NetworkSettings.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::compression::{compress, decompress, CompressionAlgorithm};
use crate::error::ProtoError;
use crate::varint::{get_var_u32, put_var_u32};

pub const GAME_PACKET_ID: u8 = 0xFE;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub compression: CompressionAlgorithm,
    /// 0-9 for deflate, ignored otherwise.
    pub compression_level: u32,
    /// Batches shorter than this go out with the `None` header.
    pub compression_threshold: usize,
    /// False until NetworkSettings has been sent.
    pub compression_enabled: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            compression: CompressionAlgorithm::Deflate,
            compression_level: 7,
            compression_threshold: 256,
            compression_enabled: false,
        }
    }
}

/// Split a received game packet into its sub-packets.
pub fn decode_batch(data: Bytes, config: &BatchConfig) -> Result<Vec<Bytes>, ProtoError> {
    let mut data = data;
    match data.first() {
        Some(&GAME_PACKET_ID) => data.advance(1),
        Some(&other) => return Err(ProtoError::UnknownPacket(other as u32)),
        None => return Err(ProtoError::EmptyBatch),
    }

    let body = if config.compression_enabled {
        let Some(&header) = data.first() else {
            return Err(ProtoError::EmptyBatch);
        };
        let algorithm = CompressionAlgorithm::from_byte(header)?;
        Bytes::from(decompress(&data[1..], algorithm)?)
    } else {
        data
    };

    let mut cursor = body.clone();
    let mut packets = Vec::new();
    while cursor.has_remaining() {
        let len = get_var_u32(&mut cursor)? as usize;
        if cursor.remaining() < len {
            return Err(ProtoError::BufferTooShort {
                needed: len,
                remaining: cursor.remaining(),
            });
        }
        packets.push(cursor.split_to(len));
    }
    if packets.is_empty() {
        return Err(ProtoError::EmptyBatch);
    }
    Ok(packets)
}

/// Wrap sub-packets into one 0xFE game packet ready for the transport.
pub fn encode_batch(packets: &[Bytes], config: &BatchConfig) -> Result<Bytes, ProtoError> {
    let mut body = BytesMut::new();
    for packet in packets {
        put_var_u32(&mut body, packet.len() as u32);
        body.put_slice(packet);
    }

    let mut out = BytesMut::with_capacity(body.len() + 2);
    out.put_u8(GAME_PACKET_ID);
    if !config.compression_enabled {
        out.put_slice(&body);
        return Ok(out.freeze());
    }

    let algorithm = if body.len() < config.compression_threshold {
        CompressionAlgorithm::None
    } else {
        config.compression
    };
    out.put_u8(algorithm.to_byte());
    out.put_slice(&compress(&body, algorithm, config.compression_level)?);
    Ok(out.freeze())
}
