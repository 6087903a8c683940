//! Unconnected packets: discovery and the two-step open connection handshake.

use std::net::SocketAddr;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::RakNetError;
use crate::wire::{ensure, expect_magic, get_address, put_address, put_magic, put_string};

pub mod id {
    pub const UNCONNECTED_PING: u8 = 0x01;
    pub const UNCONNECTED_PING_OPEN: u8 = 0x02;
    pub const OPEN_CONNECTION_REQUEST_1: u8 = 0x05;
    pub const OPEN_CONNECTION_REPLY_1: u8 = 0x06;
    pub const OPEN_CONNECTION_REQUEST_2: u8 = 0x07;
    pub const OPEN_CONNECTION_REPLY_2: u8 = 0x08;
    pub const CONNECTION_BANNED: u8 = 0x17;
    pub const INCOMPATIBLE_PROTOCOL_VERSION: u8 = 0x19;
    pub const UNCONNECTED_PONG: u8 = 0x1C;
}

/// Packets a client sends before it has a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfflineRequest {
    Ping {
        timestamp: i64,
        client_guid: i64,
    },
    /// The MTU is the size of the padded datagram that carried the request.
    OpenConnection1 {
        protocol: u8,
        mtu: u16,
    },
    OpenConnection2 {
        server_address: SocketAddr,
        mtu: u16,
        client_guid: i64,
    },
}

impl OfflineRequest {
    pub fn decode(datagram: &[u8]) -> Result<Self, RakNetError> {
        let mut buf = datagram;
        ensure(&buf, 1)?;
        match buf.get_u8() {
            id::UNCONNECTED_PING | id::UNCONNECTED_PING_OPEN => {
                ensure(&buf, 8)?;
                let timestamp = buf.get_i64();
                expect_magic(&mut buf)?;
                ensure(&buf, 8)?;
                Ok(Self::Ping {
                    timestamp,
                    client_guid: buf.get_i64(),
                })
            }
            id::OPEN_CONNECTION_REQUEST_1 => {
                expect_magic(&mut buf)?;
                ensure(&buf, 1)?;
                let protocol = buf.get_u8();
                // The IP and UDP headers count towards the MTU the client probed with.
                let mtu = (datagram.len() + crate::constants::DATAGRAM_OVERHEAD)
                    .min(u16::MAX as usize) as u16;
                Ok(Self::OpenConnection1 { protocol, mtu })
            }
            id::OPEN_CONNECTION_REQUEST_2 => {
                expect_magic(&mut buf)?;
                let server_address = get_address(&mut buf)?;
                ensure(&buf, 10)?;
                Ok(Self::OpenConnection2 {
                    server_address,
                    mtu: buf.get_u16(),
                    client_guid: buf.get_i64(),
                })
            }
            other => Err(RakNetError::UnexpectedId(other)),
        }
    }
}

/// Packets the listener answers with before a connection exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfflineReply {
    Pong {
        timestamp: i64,
        server_guid: i64,
        motd: String,
    },
    OpenConnection1 {
        server_guid: i64,
        mtu: u16,
    },
    OpenConnection2 {
        server_guid: i64,
        client_address: SocketAddr,
        mtu: u16,
    },
    /// Sent to addresses the admission policy refuses.
    ConnectionBanned {
        server_guid: i64,
    },
    IncompatibleProtocol {
        protocol: u8,
        server_guid: i64,
    },
}

impl OfflineReply {
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(64);
        match self {
            Self::Pong {
                timestamp,
                server_guid,
                motd,
            } => {
                buf.put_u8(id::UNCONNECTED_PONG);
                buf.put_i64(*timestamp);
                buf.put_i64(*server_guid);
                put_magic(&mut buf);
                put_string(&mut buf, motd);
            }
            Self::OpenConnection1 { server_guid, mtu } => {
                buf.put_u8(id::OPEN_CONNECTION_REPLY_1);
                put_magic(&mut buf);
                buf.put_i64(*server_guid);
                buf.put_u8(0); // no security
                buf.put_u16(*mtu);
            }
            Self::OpenConnection2 {
                server_guid,
                client_address,
                mtu,
            } => {
                buf.put_u8(id::OPEN_CONNECTION_REPLY_2);
                put_magic(&mut buf);
                buf.put_i64(*server_guid);
                put_address(&mut buf, client_address);
                buf.put_u16(*mtu);
                buf.put_u8(0); // no encryption
            }
            Self::ConnectionBanned { server_guid } => {
                buf.put_u8(id::CONNECTION_BANNED);
                put_magic(&mut buf);
                buf.put_i64(*server_guid);
            }
            Self::IncompatibleProtocol {
                protocol,
                server_guid,
            } => {
                buf.put_u8(id::INCOMPATIBLE_PROTOCOL_VERSION);
                buf.put_u8(*protocol);
                put_magic(&mut buf);
                buf.put_i64(*server_guid);
            }
        }
        buf
    }
}
