//! Primitive encodings shared by the offline and connected packet sets.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV6};

use bytes::{Buf, BufMut};

use crate::constants::OFFLINE_MAGIC;
use crate::error::RakNetError;

/// Fail with [`RakNetError::Truncated`] unless `needed` bytes remain.
pub fn ensure(buf: &impl Buf, needed: usize) -> Result<(), RakNetError> {
    if buf.remaining() < needed {
        return Err(RakNetError::Truncated {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

pub fn get_u24(buf: &mut impl Buf) -> Result<u32, RakNetError> {
    ensure(buf, 3)?;
    let mut raw = [0u8; 4];
    buf.copy_to_slice(&mut raw[..3]);
    Ok(u32::from_le_bytes(raw))
}

pub fn put_u24(buf: &mut impl BufMut, value: u32) {
    buf.put_slice(&value.to_le_bytes()[..3]);
}

pub fn expect_magic(buf: &mut impl Buf) -> Result<(), RakNetError> {
    ensure(buf, OFFLINE_MAGIC.len())?;
    let mut magic = [0u8; 16];
    buf.copy_to_slice(&mut magic);
    if magic == OFFLINE_MAGIC {
        Ok(())
    } else {
        Err(RakNetError::BadMagic)
    }
}

pub fn put_magic(buf: &mut impl BufMut) {
    buf.put_slice(&OFFLINE_MAGIC);
}

/// u16 big-endian length followed by UTF-8 bytes.
pub fn get_string(buf: &mut impl Buf) -> Result<String, RakNetError> {
    ensure(buf, 2)?;
    let len = buf.get_u16() as usize;
    ensure(buf, len)?;
    let raw = buf.copy_to_bytes(len);
    String::from_utf8(raw.to_vec()).map_err(|_| RakNetError::Utf8)
}

pub fn put_string(buf: &mut impl BufMut, value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(u16::MAX as usize);
    buf.put_u16(len as u16);
    buf.put_slice(&bytes[..len]);
}

/// Filler for the unused system address slots.
pub const UNSPECIFIED_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

/// Write a socket address. IPv4 octets travel bit-inverted.
pub fn put_address(buf: &mut impl BufMut, addr: &SocketAddr) {
    match addr {
        SocketAddr::V4(v4) => {
            buf.put_u8(4);
            buf.put_slice(&v4.ip().octets().map(|b| !b));
            buf.put_u16(v4.port());
        }
        SocketAddr::V6(v6) => {
            buf.put_u8(6);
            buf.put_u16_le(23);
            buf.put_u16(v6.port());
            buf.put_u32(v6.flowinfo());
            buf.put_slice(&v6.ip().octets());
            buf.put_u32(v6.scope_id());
        }
    }
}

pub fn get_address(buf: &mut impl Buf) -> Result<SocketAddr, RakNetError> {
    ensure(buf, 1)?;
    match buf.get_u8() {
        4 => {
            ensure(buf, 6)?;
            let mut octets = [0u8; 4];
            buf.copy_to_slice(&mut octets);
            let ip = Ipv4Addr::from(octets.map(|b| !b));
            Ok(SocketAddr::new(IpAddr::V4(ip), buf.get_u16()))
        }
        6 => {
            ensure(buf, 28)?;
            buf.advance(2);
            let port = buf.get_u16();
            let flow = buf.get_u32();
            let mut octets = [0u8; 16];
            buf.copy_to_slice(&mut octets);
            let scope = buf.get_u32();
            Ok(SocketAddr::V6(SocketAddrV6::new(
                Ipv6Addr::from(octets),
                port,
                flow,
                scope,
            )))
        }
        family => Err(RakNetError::AddressFamily(family)),
    }
}
