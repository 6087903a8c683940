//! Connection setup: network settings, login and status packets.

use bytes::{Buf, BufMut, BytesMut};

use crate::bedrock::{id, BedrockPacket, DYNAMIC_CONTAINER_SINCE};
use crate::codec::{need, read_bool, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::compression::CompressionAlgorithm;
use crate::error::ProtoError;
use crate::varint::{get_var_u32, VarInt};

/// First packet of every session, sent uncompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestNetworkSettings {
    pub protocol: u32,
}

impl ProtoDecode for RequestNetworkSettings {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        need(buf, 4)?;
        Ok(Self {
            protocol: buf.get_i32() as u32,
        })
    }
}

impl ProtoEncode for RequestNetworkSettings {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.protocol as i32);
    }
}

impl BedrockPacket for RequestNetworkSettings {
    const ID: u32 = id::REQUEST_NETWORK_SETTINGS;
    const NAME: &'static str = "RequestNetworkSettings";
}

/// Compression becomes active right after this packet.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    pub compression_threshold: u16,
    pub compression: CompressionAlgorithm,
    pub client_throttle: bool,
    pub client_throttle_threshold: u8,
    pub client_throttle_scalar: f32,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            compression_threshold: 256,
            compression: CompressionAlgorithm::Deflate,
            client_throttle: false,
            client_throttle_threshold: 0,
            client_throttle_scalar: 0.0,
        }
    }
}

impl ProtoEncode for NetworkSettings {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u16_le(self.compression_threshold);
        buf.put_u16_le(self.compression.to_u16());
        buf.put_u8(self.client_throttle as u8);
        buf.put_u8(self.client_throttle_threshold);
        buf.put_f32_le(self.client_throttle_scalar);
    }
}

impl BedrockPacket for NetworkSettings {
    const ID: u32 = id::NETWORK_SETTINGS;
    const NAME: &'static str = "NetworkSettings";
}

/// Login request: protocol plus the identity chain and client data token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub protocol: u32,
    pub chain: Vec<String>,
    pub client_data: String,
}

impl ProtoDecode for Login {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        need(buf, 4)?;
        let protocol = buf.get_i32() as u32;
        let len = get_var_u32(buf)? as usize;
        need(buf, len)?;
        let mut payload = buf.copy_to_bytes(len);

        let chain_json = read_le_blob(&mut payload)?;
        let client_data = read_le_blob(&mut payload)?;
        Ok(Self {
            protocol,
            chain: parse_chain(&chain_json)?,
            client_data: String::from_utf8(client_data).map_err(|_| ProtoError::InvalidUtf8)?,
        })
    }
}

impl ProtoEncode for Login {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        let chain = serde_json::json!({ "chain": self.chain }).to_string();
        buf.put_i32(self.protocol as i32);
        crate::varint::put_var_u32(buf, (8 + chain.len() + self.client_data.len()) as u32);
        buf.put_i32_le(chain.len() as i32);
        buf.put_slice(chain.as_bytes());
        buf.put_i32_le(self.client_data.len() as i32);
        buf.put_slice(self.client_data.as_bytes());
    }
}

impl BedrockPacket for Login {
    const ID: u32 = id::LOGIN;
    const NAME: &'static str = "Login";
}

fn read_le_blob(buf: &mut impl Buf) -> Result<Vec<u8>, ProtoError> {
    need(buf, 4)?;
    let len = buf.get_i32_le();
    let len = usize::try_from(len)
        .map_err(|_| ProtoError::InvalidLogin(format!("negative length {len}")))?;
    need(buf, len)?;
    Ok(buf.copy_to_bytes(len).to_vec())
}

/// `{"chain": [...]}` or the newer certificate wrapper around it.
fn parse_chain(raw: &[u8]) -> Result<Vec<String>, ProtoError> {
    let value: serde_json::Value = serde_json::from_slice(raw)?;
    let value = match value.get("Certificate").and_then(|c| c.as_str()) {
        Some(inner) => serde_json::from_str(inner)?,
        None => value,
    };
    let array = value
        .get("chain")
        .and_then(|c| c.as_array())
        .ok_or_else(|| ProtoError::InvalidLogin("missing chain array".into()))?;
    array
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| ProtoError::InvalidLogin("chain entry is not a string".into()))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStatus {
    LoginSuccess,
    FailedClient,
    FailedServer,
    PlayerSpawn,
    FailedServerFull,
}

impl ProtoEncode for PlayStatus {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        let status = match self {
            Self::LoginSuccess => 0,
            Self::FailedClient => 1,
            Self::FailedServer => 2,
            Self::PlayerSpawn => 3,
            Self::FailedServerFull => 7,
        };
        buf.put_i32(status);
    }
}

impl BedrockPacket for PlayStatus {
    const ID: u32 = id::PLAY_STATUS;
    const NAME: &'static str = "PlayStatus";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    pub reason: i32,
    pub hide_screen: bool,
    pub message: String,
}

impl Disconnect {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            reason: 0,
            hide_screen: false,
            message: message.into(),
        }
    }
}

impl Disconnect {
    fn write(&self, buf: &mut impl BufMut, filtered: bool) {
        VarInt(self.reason).proto_encode(buf);
        buf.put_u8(self.hide_screen as u8);
        if !self.hide_screen {
            write_string(buf, &self.message);
            if filtered {
                write_string(buf, &self.message);
            }
        }
    }
}

impl ProtoEncode for Disconnect {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.write(buf, true);
    }
}

impl ProtoDecode for Disconnect {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let reason = VarInt::proto_decode(buf)?.0;
        let hide_screen = read_bool(buf)?;
        let message = if hide_screen {
            String::new()
        } else {
            let message = read_string(buf)?;
            if buf.has_remaining() {
                read_string(buf)?;
            }
            message
        };
        Ok(Self {
            reason,
            hide_screen,
            message,
        })
    }
}

impl BedrockPacket for Disconnect {
    const ID: u32 = id::DISCONNECT;
    const NAME: &'static str = "Disconnect";

    fn encode_for(&self, buf: &mut BytesMut, protocol: u32) {
        self.write(buf, protocol >= DYNAMIC_CONTAINER_SINCE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_settings_layout() {
        let mut buf = BytesMut::new();
        NetworkSettings {
            compression: CompressionAlgorithm::Snappy,
            ..Default::default()
        }
        .proto_encode(&mut buf);
        assert_eq!(&buf[..6], &[0x00, 0x01, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn login_decodes_chain() {
        let login = Login {
            protocol: 729,
            chain: vec!["a.b.c".into(), "d.e.f".into()],
            client_data: "x.y.z".into(),
        };
        let mut buf = BytesMut::new();
        login.proto_encode(&mut buf);
        assert_eq!(Login::proto_decode(&mut buf.freeze()).unwrap(), login);
    }

    #[test]
    fn certificate_wrapper_is_unwrapped() {
        let inner = serde_json::json!({ "chain": ["t.o.k"] }).to_string();
        let outer = serde_json::json!({ "AuthenticationType": 0, "Certificate": inner }).to_string();
        assert_eq!(parse_chain(outer.as_bytes()).unwrap(), vec!["t.o.k".to_string()]);
        assert!(parse_chain(b"{}").is_err());
    }

    #[test]
    fn negative_blob_length_is_rejected() {
        let mut raw: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];
        assert!(read_le_blob(&mut raw).is_err());
    }

    #[test]
    fn disconnect_hidden_screen_has_no_text() {
        let mut buf = BytesMut::new();
        Disconnect {
            reason: 0,
            hide_screen: true,
            message: "ignored".into(),
        }
        .proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x00, 0x01]);

        let mut buf = BytesMut::new();
        Disconnect::message("Server closed").proto_encode(&mut buf);
        let back = Disconnect::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(back.message, "Server closed");

        let mut old = BytesMut::new();
        Disconnect::message("Bye").encode_for(&mut old, 685);
        assert_eq!(&old[..], &[0x00, 0x00, 3, b'B', b'y', b'e']);
    }
}
