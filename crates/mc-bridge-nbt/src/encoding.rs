//! Scalars and lengths in each of the three encodings the bridge meets.
//!
//! Little-endian NBT carries Bedrock item user data. Network NBT is the
//! Bedrock packet form, with ints, longs and string lengths as zigzag
//! VarInts. Java NBT is big-endian throughout.

use bytes::{Buf, BufMut};

use crate::error::NbtError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoding {
    LittleEndian,
    Network,
    Java,
}

pub(crate) fn need(buf: &impl Buf, bytes: usize) -> Result<(), NbtError> {
    if buf.remaining() < bytes {
        return Err(NbtError::UnexpectedEof);
    }
    Ok(())
}

impl Encoding {
    fn big_endian(self) -> bool {
        self == Encoding::Java
    }

    pub(crate) fn get_i16(self, buf: &mut impl Buf) -> Result<i16, NbtError> {
        need(buf, 2)?;
        Ok(if self.big_endian() { buf.get_i16() } else { buf.get_i16_le() })
    }

    pub(crate) fn put_i16(self, buf: &mut impl BufMut, v: i16) {
        if self.big_endian() {
            buf.put_i16(v)
        } else {
            buf.put_i16_le(v)
        }
    }

    pub(crate) fn get_i32(self, buf: &mut impl Buf) -> Result<i32, NbtError> {
        match self {
            Encoding::Network => {
                let raw = get_var(buf, 5)? as u32;
                Ok((raw >> 1) as i32 ^ -((raw & 1) as i32))
            }
            Encoding::Java => {
                need(buf, 4)?;
                Ok(buf.get_i32())
            }
            Encoding::LittleEndian => {
                need(buf, 4)?;
                Ok(buf.get_i32_le())
            }
        }
    }

    pub(crate) fn put_i32(self, buf: &mut impl BufMut, v: i32) {
        match self {
            Encoding::Network => put_var(buf, ((v << 1) ^ (v >> 31)) as u32 as u64),
            Encoding::Java => buf.put_i32(v),
            Encoding::LittleEndian => buf.put_i32_le(v),
        }
    }

    pub(crate) fn get_i64(self, buf: &mut impl Buf) -> Result<i64, NbtError> {
        match self {
            Encoding::Network => {
                let raw = get_var(buf, 10)?;
                Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
            }
            Encoding::Java => {
                need(buf, 8)?;
                Ok(buf.get_i64())
            }
            Encoding::LittleEndian => {
                need(buf, 8)?;
                Ok(buf.get_i64_le())
            }
        }
    }

    pub(crate) fn put_i64(self, buf: &mut impl BufMut, v: i64) {
        match self {
            Encoding::Network => put_var(buf, ((v << 1) ^ (v >> 63)) as u64),
            Encoding::Java => buf.put_i64(v),
            Encoding::LittleEndian => buf.put_i64_le(v),
        }
    }

    pub(crate) fn get_f32(self, buf: &mut impl Buf) -> Result<f32, NbtError> {
        need(buf, 4)?;
        Ok(if self.big_endian() { buf.get_f32() } else { buf.get_f32_le() })
    }

    pub(crate) fn put_f32(self, buf: &mut impl BufMut, v: f32) {
        if self.big_endian() {
            buf.put_f32(v)
        } else {
            buf.put_f32_le(v)
        }
    }

    pub(crate) fn get_f64(self, buf: &mut impl Buf) -> Result<f64, NbtError> {
        need(buf, 8)?;
        Ok(if self.big_endian() { buf.get_f64() } else { buf.get_f64_le() })
    }

    pub(crate) fn put_f64(self, buf: &mut impl BufMut, v: f64) {
        if self.big_endian() {
            buf.put_f64(v)
        } else {
            buf.put_f64_le(v)
        }
    }

    /// Element count of a list or array, encoded like an int.
    pub(crate) fn get_count(self, buf: &mut impl Buf) -> Result<usize, NbtError> {
        let len = self.get_i32(buf)?;
        usize::try_from(len).map_err(|_| NbtError::NegativeLength(len))
    }

    pub(crate) fn put_count(self, buf: &mut impl BufMut, len: usize) {
        self.put_i32(buf, len as i32)
    }

    pub(crate) fn get_str_len(self, buf: &mut impl Buf) -> Result<usize, NbtError> {
        match self {
            Encoding::Network => Ok(get_var(buf, 5)? as usize),
            _ => Ok(self.get_i16(buf)? as u16 as usize),
        }
    }

    pub(crate) fn put_str_len(self, buf: &mut impl BufMut, len: usize) {
        match self {
            Encoding::Network => put_var(buf, len as u64),
            _ => self.put_i16(buf, len as u16 as i16),
        }
    }
}

fn put_var(buf: &mut impl BufMut, mut v: u64) {
    loop {
        let byte = (v & 0x7F) as u8;
        v >>= 7;
        if v == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

fn get_var(buf: &mut impl Buf, max_bytes: usize) -> Result<u64, NbtError> {
    let mut v = 0u64;
    for shift in (0..max_bytes).map(|i| 7 * i) {
        need(buf, 1)?;
        let byte = buf.get_u8();
        v |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(v);
        }
    }
    Err(NbtError::VarIntTooLong(max_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_ints_are_zigzag() {
        let mut buf = Vec::new();
        Encoding::Network.put_i32(&mut buf, -1);
        Encoding::Network.put_i32(&mut buf, 64);
        assert_eq!(buf, [0x01, 0x80, 0x01]);

        let mut raw = &buf[..];
        assert_eq!(Encoding::Network.get_i32(&mut raw).unwrap(), -1);
        assert_eq!(Encoding::Network.get_i32(&mut raw).unwrap(), 64);
    }

    #[test]
    fn overlong_varint_is_rejected() {
        let mut raw: &[u8] = &[0xFF; 6];
        assert!(matches!(
            Encoding::Network.get_i32(&mut raw),
            Err(NbtError::VarIntTooLong(5))
        ));
    }

    #[test]
    fn java_is_big_endian_and_bedrock_little() {
        let mut java = Vec::new();
        Encoding::Java.put_i16(&mut java, 0x0102);
        let mut le = Vec::new();
        Encoding::LittleEndian.put_i16(&mut le, 0x0102);
        assert_eq!(java, [1, 2]);
        assert_eq!(le, [2, 1]);
    }
}
