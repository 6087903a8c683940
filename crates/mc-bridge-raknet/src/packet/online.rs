//! Control messages exchanged inside frames once a peer is connected.

use std::net::SocketAddr;

use bytes::{Buf, BufMut, BytesMut};

use crate::constants::SYSTEM_ADDRESS_COUNT;
use crate::error::RakNetError;
use crate::wire::{ensure, get_address, put_address, UNSPECIFIED_ADDRESS};

pub mod id {
    pub const CONNECTED_PING: u8 = 0x00;
    pub const CONNECTED_PONG: u8 = 0x03;
    pub const CONNECTION_REQUEST: u8 = 0x09;
    pub const CONNECTION_REQUEST_ACCEPTED: u8 = 0x10;
    pub const NEW_INCOMING_CONNECTION: u8 = 0x13;
    pub const DISCONNECTION_NOTIFICATION: u8 = 0x15;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Ping {
        timestamp: i64,
    },
    Pong {
        ping_timestamp: i64,
        pong_timestamp: i64,
    },
    ConnectionRequest {
        client_guid: i64,
        timestamp: i64,
    },
    ConnectionAccepted {
        client_address: SocketAddr,
        request_timestamp: i64,
        accept_timestamp: i64,
    },
    NewIncomingConnection {
        server_address: SocketAddr,
    },
    Disconnect,
}

impl Control {
    pub fn decode(body: &[u8]) -> Result<Self, RakNetError> {
        let mut buf = body;
        ensure(&buf, 1)?;
        match buf.get_u8() {
            id::CONNECTED_PING => {
                ensure(&buf, 8)?;
                Ok(Self::Ping {
                    timestamp: buf.get_i64(),
                })
            }
            id::CONNECTED_PONG => {
                ensure(&buf, 16)?;
                Ok(Self::Pong {
                    ping_timestamp: buf.get_i64(),
                    pong_timestamp: buf.get_i64(),
                })
            }
            id::CONNECTION_REQUEST => {
                ensure(&buf, 16)?;
                Ok(Self::ConnectionRequest {
                    client_guid: buf.get_i64(),
                    timestamp: buf.get_i64(),
                })
            }
            id::NEW_INCOMING_CONNECTION => {
                // Only the first address matters; clients disagree on how many follow.
                Ok(Self::NewIncomingConnection {
                    server_address: get_address(&mut buf)?,
                })
            }
            id::DISCONNECTION_NOTIFICATION => Ok(Self::Disconnect),
            other => Err(RakNetError::UnexpectedId(other)),
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(32);
        match self {
            Self::Ping { timestamp } => {
                buf.put_u8(id::CONNECTED_PING);
                buf.put_i64(*timestamp);
            }
            Self::Pong {
                ping_timestamp,
                pong_timestamp,
            } => {
                buf.put_u8(id::CONNECTED_PONG);
                buf.put_i64(*ping_timestamp);
                buf.put_i64(*pong_timestamp);
            }
            Self::ConnectionRequest {
                client_guid,
                timestamp,
            } => {
                buf.put_u8(id::CONNECTION_REQUEST);
                buf.put_i64(*client_guid);
                buf.put_i64(*timestamp);
                buf.put_u8(0);
            }
            Self::ConnectionAccepted {
                client_address,
                request_timestamp,
                accept_timestamp,
            } => {
                buf.put_u8(id::CONNECTION_REQUEST_ACCEPTED);
                put_address(&mut buf, client_address);
                buf.put_u16(0);
                put_address(&mut buf, client_address);
                for _ in 1..SYSTEM_ADDRESS_COUNT {
                    put_address(&mut buf, &UNSPECIFIED_ADDRESS);
                }
                buf.put_i64(*request_timestamp);
                buf.put_i64(*accept_timestamp);
            }
            Self::NewIncomingConnection { server_address } => {
                buf.put_u8(id::NEW_INCOMING_CONNECTION);
                put_address(&mut buf, server_address);
                for _ in 0..SYSTEM_ADDRESS_COUNT {
                    put_address(&mut buf, &UNSPECIFIED_ADDRESS);
                }
                buf.put_i64(0);
                buf.put_i64(0);
            }
            Self::Disconnect => buf.put_u8(id::DISCONNECTION_NOTIFICATION),
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_lists_twenty_addresses() {
        let addr: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let buf = Control::ConnectionAccepted {
            client_address: addr,
            request_timestamp: 10,
            accept_timestamp: 20,
        }
        .encode();
        // id + client addr + index + 20 addresses + two timestamps
        assert_eq!(buf.len(), 1 + 7 + 2 + 20 * 7 + 16);
        assert_eq!(&buf[buf.len() - 8..], &20i64.to_be_bytes());
    }

    #[test]
    fn ping_pong_bodies() {
        let ping = Control::Ping { timestamp: 42 }.encode();
        assert_eq!(Control::decode(&ping).unwrap(), Control::Ping { timestamp: 42 });

        let pong = Control::Pong {
            ping_timestamp: 1,
            pong_timestamp: 2,
        }
        .encode();
        assert_eq!(pong.len(), 17);
    }

    #[test]
    fn new_incoming_ignores_trailing_addresses() {
        let server: SocketAddr = "10.1.2.3:19132".parse().unwrap();
        let buf = Control::NewIncomingConnection {
            server_address: server,
        }
        .encode();
        assert_eq!(
            Control::decode(&buf).unwrap(),
            Control::NewIncomingConnection {
                server_address: server
            }
        );
    }

    #[test]
    fn unknown_control_id() {
        assert!(matches!(
            Control::decode(&[0x42]),
            Err(RakNetError::UnexpectedId(0x42))
        ));
    }
}
