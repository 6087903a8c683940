//! Java edition 1.21.1 packets spoken to the upstream server.
//!
//! Every frame is a VarInt length followed by a VarInt packet id and body.
//! Ids depend on the connection state, so clientbound packets are decoded
//! through one enum per state.

pub mod chunk;
pub mod configuration;
pub mod framing;
pub mod login;
pub mod metadata;
pub mod play;
pub mod slot;
pub mod text;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use mc_bridge_nbt::{read_nbt_java, NbtTag};

use crate::codec::need;
use crate::error::ProtoError;
use crate::varint::{get_java_varint, put_java_varint};

pub const PROTOCOL_VERSION: i32 = 767;
pub const GAME_VERSION: &str = "1.21.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Handshaking,
    Login,
    Configuration,
    Play,
}

/// A packet the bridge sends to the Java server.
pub trait JavaServerbound {
    const ID: i32;

    fn write(&self, buf: &mut impl BufMut);
}

/// Packet id followed by its body, ready for [`framing::FrameCodec::encode`].
pub fn encode_serverbound<P: JavaServerbound>(packet: &P) -> Bytes {
    let mut buf = BytesMut::new();
    put_java_varint(&mut buf, P::ID);
    packet.write(&mut buf);
    buf.freeze()
}

/// Splits a decoded frame into its packet id and body.
pub fn split_id(mut raw: Bytes) -> Result<(i32, Bytes), ProtoError> {
    let id = get_java_varint(&mut raw)?;
    Ok((id, raw))
}

pub(crate) fn read_i8(buf: &mut impl Buf) -> Result<i8, ProtoError> {
    need(buf, 1)?;
    Ok(buf.get_i8())
}

pub(crate) fn read_i16(buf: &mut impl Buf) -> Result<i16, ProtoError> {
    need(buf, 2)?;
    Ok(buf.get_i16())
}

pub(crate) fn read_i32(buf: &mut impl Buf) -> Result<i32, ProtoError> {
    need(buf, 4)?;
    Ok(buf.get_i32())
}

pub(crate) fn read_i64(buf: &mut impl Buf) -> Result<i64, ProtoError> {
    need(buf, 8)?;
    Ok(buf.get_i64())
}

pub(crate) fn read_f32(buf: &mut impl Buf) -> Result<f32, ProtoError> {
    need(buf, 4)?;
    Ok(buf.get_f32())
}

pub(crate) fn read_f64(buf: &mut impl Buf) -> Result<f64, ProtoError> {
    need(buf, 8)?;
    Ok(buf.get_f64())
}

/// Non-negative VarInt count, capped so hostile lengths fail early.
pub(crate) fn read_count(buf: &mut impl Buf, max: usize) -> Result<usize, ProtoError> {
    let count = get_java_varint(buf)?;
    let count = usize::try_from(count)
        .map_err(|_| ProtoError::InvalidData(format!("negative count {count}")))?;
    if count > max {
        return Err(ProtoError::InvalidData(format!("count {count} exceeds {max}")));
    }
    Ok(count)
}

/// Text components travel as nameless NBT since 1.20.3.
pub(crate) fn read_component(buf: &mut impl Buf) -> Result<NbtTag, ProtoError> {
    Ok(read_nbt_java(buf)?.unwrap_or_else(|| NbtTag::String(String::new())))
}
