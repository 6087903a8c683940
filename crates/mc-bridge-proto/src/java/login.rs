//! Handshake and login state.

use bytes::{Buf, BufMut, Bytes};

use crate::codec::{read_bool, read_string, write_string};
use crate::error::ProtoError;
use crate::java::{read_count, split_id, text, JavaServerbound};
use crate::types::Uuid;
use crate::varint::{get_java_varint, put_java_varint};

/// Next state requested by the handshake.
pub const INTENT_LOGIN: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol: i32,
    pub address: String,
    pub port: u16,
    pub intent: i32,
}

impl JavaServerbound for Handshake {
    const ID: i32 = 0x00;

    fn write(&self, buf: &mut impl BufMut) {
        put_java_varint(buf, self.protocol);
        write_string(buf, &self.address);
        buf.put_u16(self.port);
        put_java_varint(buf, self.intent);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub username: String,
    pub uuid: Uuid,
}

impl JavaServerbound for LoginStart {
    const ID: i32 = 0x00;

    fn write(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.username);
        self.uuid.java_encode(buf);
    }
}

/// Reply to a plugin request we do not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginPluginResponse {
    pub message_id: i32,
}

impl JavaServerbound for LoginPluginResponse {
    const ID: i32 = 0x02;

    fn write(&self, buf: &mut impl BufMut) {
        put_java_varint(buf, self.message_id);
        buf.put_u8(0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAcknowledged;

impl JavaServerbound for LoginAcknowledged {
    const ID: i32 = 0x03;

    fn write(&self, _buf: &mut impl BufMut) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginClientbound {
    /// JSON text component, already flattened.
    Disconnect(String),
    EncryptionRequest { server_id: String },
    LoginSuccess {
        uuid: Uuid,
        username: String,
        properties: Vec<GameProfileProperty>,
    },
    SetCompression { threshold: i32 },
    PluginRequest { message_id: i32, channel: String },
}

impl LoginClientbound {
    pub fn decode(raw: Bytes) -> Result<Self, ProtoError> {
        let (id, mut body) = split_id(raw)?;
        let buf = &mut body;
        Ok(match id {
            0x00 => Self::Disconnect(text::flatten_json(&read_string(buf)?)),
            0x01 => Self::EncryptionRequest {
                server_id: read_string(buf)?,
            },
            0x02 => {
                let uuid = Uuid::java_decode(buf)?;
                let username = read_string(buf)?;
                let count = read_count(buf, 64)?;
                let mut properties = Vec::with_capacity(count);
                for _ in 0..count {
                    let name = read_string(buf)?;
                    let value = read_string(buf)?;
                    let signature = if read_bool(buf)? {
                        Some(read_string(buf)?)
                    } else {
                        None
                    };
                    properties.push(GameProfileProperty {
                        name,
                        value,
                        signature,
                    });
                }
                Self::LoginSuccess {
                    uuid,
                    username,
                    properties,
                }
            }
            0x03 => Self::SetCompression {
                threshold: get_java_varint(buf)?,
            },
            0x04 => {
                let message_id = get_java_varint(buf)?;
                let channel = read_string(buf)?;
                buf.advance(buf.remaining());
                Self::PluginRequest {
                    message_id,
                    channel,
                }
            }
            other => return Err(ProtoError::UnknownPacket(other as u32)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::encode_serverbound;
    use bytes::BytesMut;

    #[test]
    fn handshake_layout() {
        let raw = encode_serverbound(&Handshake {
            protocol: 767,
            address: "mc".into(),
            port: 25565,
            intent: INTENT_LOGIN,
        });
        assert_eq!(&raw[..], &[0x00, 0xFF, 0x05, 2, b'm', b'c', 0x63, 0xDD, 2]);
    }

    #[test]
    fn login_success_with_properties() {
        let mut buf = BytesMut::new();
        put_java_varint(&mut buf, 0x02);
        Uuid(42).java_encode(&mut buf);
        write_string(&mut buf, "Steve");
        put_java_varint(&mut buf, 1);
        write_string(&mut buf, "textures");
        write_string(&mut buf, "e30=");
        buf.put_u8(0);
        buf.put_u8(1);

        match LoginClientbound::decode(buf.freeze()).unwrap() {
            LoginClientbound::LoginSuccess {
                uuid,
                username,
                properties,
            } => {
                assert_eq!(uuid, Uuid(42));
                assert_eq!(username, "Steve");
                assert_eq!(properties[0].signature, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn set_compression_and_disconnect() {
        let raw = Bytes::from_static(&[0x03, 0x80, 0x02]);
        assert_eq!(
            LoginClientbound::decode(raw).unwrap(),
            LoginClientbound::SetCompression { threshold: 256 }
        );

        let mut buf = BytesMut::new();
        put_java_varint(&mut buf, 0x00);
        write_string(&mut buf, r#"{"text":"Banned"}"#);
        assert_eq!(
            LoginClientbound::decode(buf.freeze()).unwrap(),
            LoginClientbound::Disconnect("Banned".into())
        );
    }
}
