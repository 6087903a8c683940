//! LEB128 integers.
//!
//! Bedrock zigzag-encodes its signed variants; Java writes signed values as
//! their two's complement bit pattern. The free functions cover both, the
//! newtypes give the Bedrock flavour a typed [`ProtoEncode`] form.

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtoError;

pub fn put_var_u32(buf: &mut impl BufMut, mut value: u32) {
    while value >= 0x80 {
        buf.put_u8(value as u8 | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

pub fn put_var_u64(buf: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8(value as u8 | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

pub fn get_var_u32(buf: &mut impl Buf) -> Result<u32, ProtoError> {
    get_var_u64_bounded(buf, 5).map(|v| v as u32)
}

pub fn get_var_u64(buf: &mut impl Buf) -> Result<u64, ProtoError> {
    get_var_u64_bounded(buf, 10)
}

fn get_var_u64_bounded(buf: &mut impl Buf, max_bytes: usize) -> Result<u64, ProtoError> {
    let mut value = 0u64;
    for i in 0..max_bytes {
        if !buf.has_remaining() {
            return Err(ProtoError::BufferTooShort {
                needed: 1,
                remaining: 0,
            });
        }
        let byte = buf.get_u8();
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(ProtoError::VarIntTooLong(max_bytes))
}

/// Number of bytes `value` occupies as an unsigned VarInt.
pub fn var_u32_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

pub fn zigzag32(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

pub fn unzigzag32(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

pub fn zigzag64(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

pub fn unzigzag64(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Java VarInt: signed value, no zigzag.
pub fn put_java_varint(buf: &mut impl BufMut, value: i32) {
    put_var_u32(buf, value as u32);
}

pub fn get_java_varint(buf: &mut impl Buf) -> Result<i32, ProtoError> {
    get_var_u32(buf).map(|v| v as i32)
}

pub fn put_java_varlong(buf: &mut impl BufMut, value: i64) {
    put_var_u64(buf, value as u64);
}

pub fn get_java_varlong(buf: &mut impl Buf) -> Result<i64, ProtoError> {
    get_var_u64(buf).map(|v| v as i64)
}

macro_rules! bedrock_varint {
    ($(#[$doc:meta])* $name:ident($inner:ty), |$b:ident, $v:ident| $enc:expr, |$d:ident| $dec:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub $inner);

        impl ProtoEncode for $name {
            fn proto_encode(&self, $b: &mut impl BufMut) {
                let $v = self.0;
                $enc
            }
        }

        impl ProtoDecode for $name {
            fn proto_decode($d: &mut impl Buf) -> Result<Self, ProtoError> {
                ($dec).map($name)
            }
        }

        impl From<$inner> for $name {
            fn from(v: $inner) -> Self {
                $name(v)
            }
        }
    };
}

bedrock_varint!(
    /// Zigzag signed 32-bit.
    VarInt(i32),
    |buf, v| put_var_u32(buf, zigzag32(v)),
    |buf| get_var_u32(buf).map(unzigzag32)
);
bedrock_varint!(
    /// Zigzag signed 64-bit.
    VarLong(i64),
    |buf, v| put_var_u64(buf, zigzag64(v)),
    |buf| get_var_u64(buf).map(unzigzag64)
);
bedrock_varint!(VarUInt32(u32), |buf, v| put_var_u32(buf, v), |buf| get_var_u32(buf));
bedrock_varint!(VarUInt64(u64), |buf, v| put_var_u64(buf, v), |buf| get_var_u64(buf));

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn zigzag_pairs() {
        assert_eq!(zigzag32(0), 0);
        assert_eq!(zigzag32(-1), 1);
        assert_eq!(zigzag32(1), 2);
        assert_eq!(zigzag32(i32::MIN), u32::MAX);
        assert_eq!(unzigzag32(3), -2);
        assert_eq!(unzigzag64(zigzag64(i64::MIN)), i64::MIN);
    }

    #[test]
    fn known_encodings() {
        let mut buf = BytesMut::new();
        put_var_u32(&mut buf, 300);
        assert_eq!(&buf[..], &[0xAC, 0x02]);

        let mut buf = BytesMut::new();
        put_java_varint(&mut buf, -1);
        assert_eq!(&buf[..], &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(get_java_varint(&mut buf.freeze()).unwrap(), -1);

        let mut buf = BytesMut::new();
        VarInt(-1).proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x01]);
    }

    #[test]
    fn length_helper_matches_encoder() {
        for v in [0, 0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, u32::MAX] {
            let mut buf = BytesMut::new();
            put_var_u32(&mut buf, v);
            assert_eq!(buf.len(), var_u32_len(v), "value {v}");
        }
    }

    #[test]
    fn overlong_is_rejected() {
        let mut raw: &[u8] = &[0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(matches!(
            get_var_u32(&mut raw),
            Err(ProtoError::VarIntTooLong(5))
        ));
    }

    #[test]
    fn truncated_is_rejected() {
        let mut raw: &[u8] = &[0x80];
        assert!(matches!(
            VarUInt32::proto_decode(&mut raw),
            Err(ProtoError::BufferTooShort { .. })
        ));
    }
}
