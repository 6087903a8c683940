//! Length-prefixed frames with optional zlib compression.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::compression::{zlib_compress, zlib_decompress};
use crate::error::ProtoError;
use crate::varint::{get_java_varint, put_java_varint};

/// Largest frame a vanilla server will send (three byte VarInt).
pub const MAX_FRAME_LEN: usize = (1 << 21) - 1;

#[derive(Debug, Clone)]
pub struct FrameCodec {
    threshold: Option<usize>,
    level: u32,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            threshold: None,
            level: 6,
        }
    }

    /// Applied after SetCompression. A negative threshold disables compression.
    pub fn set_threshold(&mut self, threshold: i32) {
        self.threshold = usize::try_from(threshold).ok();
    }

    pub fn threshold(&self) -> Option<usize> {
        self.threshold
    }

    pub fn encode(&self, packet: &[u8]) -> Result<Bytes, ProtoError> {
        let mut body = BytesMut::with_capacity(packet.len() + 5);
        match self.threshold {
            None => body.put_slice(packet),
            Some(threshold) if packet.len() >= threshold => {
                put_java_varint(&mut body, packet.len() as i32);
                body.put_slice(&zlib_compress(packet, self.level)?);
            }
            Some(_) => {
                put_java_varint(&mut body, 0);
                body.put_slice(packet);
            }
        }
        if body.len() > MAX_FRAME_LEN {
            return Err(ProtoError::InvalidData(format!("frame of {} bytes", body.len())));
        }
        let mut out = BytesMut::with_capacity(body.len() + 3);
        put_java_varint(&mut out, body.len() as i32);
        out.put_slice(&body);
        Ok(out.freeze())
    }

    /// Takes one complete frame off `src`, or `None` until enough bytes arrived.
    pub fn decode(&self, src: &mut BytesMut) -> Result<Option<Bytes>, ProtoError> {
        let Some((len, header)) = peek_length(src)? else {
            return Ok(None);
        };
        if len > MAX_FRAME_LEN {
            return Err(ProtoError::InvalidData(format!("frame of {len} bytes")));
        }
        if src.len() < header + len {
            return Ok(None);
        }
        src.advance(header);
        let mut frame = src.split_to(len).freeze();

        let Some(threshold) = self.threshold else {
            return Ok(Some(frame));
        };
        let data_len = get_java_varint(&mut frame)?;
        if data_len == 0 {
            return Ok(Some(frame));
        }
        let data_len = usize::try_from(data_len)
            .map_err(|_| ProtoError::Decompress(format!("negative data length {data_len}")))?;
        if data_len < threshold {
            return Err(ProtoError::Decompress(format!(
                "compressed packet of {data_len} bytes below threshold {threshold}"
            )));
        }
        let inflated = zlib_decompress(&frame)?;
        if inflated.len() != data_len {
            return Err(ProtoError::Decompress(format!(
                "expected {data_len} bytes, got {}",
                inflated.len()
            )));
        }
        Ok(Some(Bytes::from(inflated)))
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn peek_length(src: &[u8]) -> Result<Option<(usize, usize)>, ProtoError> {
    let mut value = 0usize;
    for (i, byte) in src.iter().take(3).enumerate() {
        value |= ((byte & 0x7F) as usize) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    if src.len() >= 3 {
        return Err(ProtoError::VarIntTooLong(3));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncompressed_frame() {
        let codec = FrameCodec::new();
        let frame = codec.encode(&[0x00, 0xAB]).unwrap();
        assert_eq!(&frame[..], &[2, 0x00, 0xAB]);

        let mut src = BytesMut::from(&frame[..]);
        assert_eq!(&codec.decode(&mut src).unwrap().unwrap()[..], &[0x00, 0xAB]);
        assert!(src.is_empty());
    }

    #[test]
    fn partial_frames_wait_for_more() {
        let codec = FrameCodec::new();
        let mut src = BytesMut::from(&[5u8, 1, 2][..]);
        assert!(codec.decode(&mut src).unwrap().is_none());
        assert_eq!(src.len(), 3);
        src.extend_from_slice(&[3, 4, 5, 9]);
        assert_eq!(&codec.decode(&mut src).unwrap().unwrap()[..], &[1, 2, 3, 4, 5]);
        assert_eq!(&src[..], &[9]);
    }

    #[test]
    fn threshold_switches_to_zlib() {
        let mut codec = FrameCodec::new();
        codec.set_threshold(64);

        let small = codec.encode(&[1, 2, 3]).unwrap();
        assert_eq!(&small[..], &[4, 0, 1, 2, 3]);

        let big = vec![7u8; 500];
        let frame = codec.encode(&big).unwrap();
        assert!(frame.len() < 100);
        let mut src = BytesMut::from(&frame[..]);
        assert_eq!(&codec.decode(&mut src).unwrap().unwrap()[..], &big[..]);
    }

    #[test]
    fn negative_threshold_disables_compression() {
        let mut codec = FrameCodec::new();
        codec.set_threshold(256);
        codec.set_threshold(-1);
        assert_eq!(codec.threshold(), None);
    }

    #[test]
    fn overlong_length_is_an_error() {
        let codec = FrameCodec::new();
        let mut src = BytesMut::from(&[0xFF, 0xFF, 0xFF, 0x01][..]);
        assert!(codec.decode(&mut src).is_err());
    }
}
