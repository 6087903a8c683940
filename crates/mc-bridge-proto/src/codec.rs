use bytes::{Buf, BufMut};

use crate::error::ProtoError;
use crate::varint::{get_var_u32, put_var_u32};

pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError>;
}

/// Upper bound for any length-prefixed string either protocol sends us.
pub const MAX_STRING_LEN: usize = 1 << 20;

pub fn need(buf: &impl Buf, needed: usize) -> Result<(), ProtoError> {
    if buf.remaining() < needed {
        return Err(ProtoError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Unsigned VarInt length followed by UTF-8 bytes. Both protocols use this layout.
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    put_var_u32(buf, s.len() as u32);
    buf.put_slice(s.as_bytes());
}

pub fn read_string(buf: &mut impl Buf) -> Result<String, ProtoError> {
    let len = get_var_u32(buf)? as usize;
    if len > MAX_STRING_LEN {
        return Err(ProtoError::StringTooLong {
            len,
            max: MAX_STRING_LEN,
        });
    }
    need(buf, len)?;
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec()).map_err(|_| ProtoError::InvalidUtf8)
}

pub fn read_bool(buf: &mut impl Buf) -> Result<bool, ProtoError> {
    need(buf, 1)?;
    Ok(buf.get_u8() != 0)
}

pub fn read_u8(buf: &mut impl Buf) -> Result<u8, ProtoError> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}
