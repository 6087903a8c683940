//! Chat text and command requests.

use bytes::{Buf, BufMut, BytesMut};

use crate::bedrock::{id, BedrockPacket, FILTERED_TEXT_SINCE};
use crate::codec::{need, read_bool, read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::types::Uuid;
use crate::varint::{get_var_u32, put_var_u32, VarInt, VarLong};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Raw,
    Chat,
    Translation,
    Popup,
    JukeboxPopup,
    Tip,
    System,
    Whisper,
    Announcement,
    ObjectWhisper,
    Object,
}

impl TextKind {
    fn from_u8(v: u8) -> Result<Self, ProtoError> {
        Ok(match v {
            0 => Self::Raw,
            1 => Self::Chat,
            2 => Self::Translation,
            3 => Self::Popup,
            4 => Self::JukeboxPopup,
            5 => Self::Tip,
            6 => Self::System,
            7 => Self::Whisper,
            8 => Self::Announcement,
            9 => Self::ObjectWhisper,
            10 => Self::Object,
            other => return Err(ProtoError::InvalidData(format!("text type {other}"))),
        })
    }

    fn to_u8(self) -> u8 {
        self as u8
    }

    fn has_source(self) -> bool {
        matches!(self, Self::Chat | Self::Whisper | Self::Announcement)
    }

    fn has_parameters(self) -> bool {
        matches!(self, Self::Translation | Self::Popup | Self::JukeboxPopup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub kind: TextKind,
    pub needs_translation: bool,
    pub source: String,
    pub message: String,
    pub parameters: Vec<String>,
    pub xuid: String,
    pub platform_chat_id: String,
    pub filtered_message: String,
}

impl Text {
    pub fn new(kind: TextKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            needs_translation: false,
            source: String::new(),
            message: message.into(),
            parameters: Vec::new(),
            xuid: String::new(),
            platform_chat_id: String::new(),
            filtered_message: String::new(),
        }
    }

    pub fn raw(message: impl Into<String>) -> Self {
        Self::new(TextKind::Raw, message)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(TextKind::System, message)
    }
}

impl Text {
    fn write(&self, buf: &mut impl BufMut, filtered: bool) {
        buf.put_u8(self.kind.to_u8());
        buf.put_u8(self.needs_translation as u8);
        if self.kind.has_source() {
            write_string(buf, &self.source);
        }
        write_string(buf, &self.message);
        if self.kind.has_parameters() {
            put_var_u32(buf, self.parameters.len() as u32);
            for p in &self.parameters {
                write_string(buf, p);
            }
        }
        write_string(buf, &self.xuid);
        write_string(buf, &self.platform_chat_id);
        if filtered {
            write_string(buf, &self.filtered_message);
        }
    }
}

impl ProtoEncode for Text {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.write(buf, true);
    }
}

impl ProtoDecode for Text {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        need(buf, 2)?;
        let kind = TextKind::from_u8(buf.get_u8())?;
        let needs_translation = buf.get_u8() != 0;
        let source = if kind.has_source() {
            read_string(buf)?
        } else {
            String::new()
        };
        let message = read_string(buf)?;
        let mut parameters = Vec::new();
        if kind.has_parameters() {
            let count = get_var_u32(buf)?;
            for _ in 0..count {
                parameters.push(read_string(buf)?);
            }
        }
        let xuid = read_string(buf)?;
        let platform_chat_id = read_string(buf)?;
        let filtered_message = if buf.has_remaining() {
            read_string(buf)?
        } else {
            String::new()
        };
        Ok(Self {
            kind,
            needs_translation,
            source,
            message,
            parameters,
            xuid,
            platform_chat_id,
            filtered_message,
        })
    }
}

impl BedrockPacket for Text {
    const ID: u32 = id::TEXT;
    const NAME: &'static str = "Text";

    fn encode_for(&self, buf: &mut BytesMut, protocol: u32) {
        self.write(buf, protocol >= FILTERED_TEXT_SINCE);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOrigin {
    pub origin_type: u32,
    pub uuid: Uuid,
    pub request_id: String,
    pub player_unique_id: Option<i64>,
}

impl CommandOrigin {
    fn carries_player_id(origin_type: u32) -> bool {
        // dev console and test origins
        origin_type == 3 || origin_type == 5
    }
}

impl ProtoDecode for CommandOrigin {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let origin_type = get_var_u32(buf)?;
        let uuid = Uuid::proto_decode(buf)?;
        let request_id = read_string(buf)?;
        let player_unique_id = if Self::carries_player_id(origin_type) {
            Some(VarLong::proto_decode(buf)?.0)
        } else {
            None
        };
        Ok(Self {
            origin_type,
            uuid,
            request_id,
            player_unique_id,
        })
    }
}

impl ProtoEncode for CommandOrigin {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        put_var_u32(buf, self.origin_type);
        self.uuid.proto_encode(buf);
        write_string(buf, &self.request_id);
        if Self::carries_player_id(self.origin_type) {
            VarLong(self.player_unique_id.unwrap_or_default()).proto_encode(buf);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: String,
    pub origin: CommandOrigin,
    pub internal: bool,
    pub version: i32,
}

impl CommandRequest {
    /// Command line without the leading slash.
    pub fn line(&self) -> &str {
        self.command.strip_prefix('/').unwrap_or(&self.command)
    }
}

impl ProtoDecode for CommandRequest {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        let command = read_string(buf)?;
        let origin = CommandOrigin::proto_decode(buf)?;
        let internal = if buf.has_remaining() { read_bool(buf)? } else { false };
        let version = if buf.has_remaining() {
            VarInt::proto_decode(buf)?.0
        } else {
            0
        };
        Ok(Self {
            command,
            origin,
            internal,
            version,
        })
    }
}

impl ProtoEncode for CommandRequest {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.command);
        self.origin.proto_encode(buf);
        buf.put_u8(self.internal as u8);
        VarInt(self.version).proto_encode(buf);
    }
}

impl BedrockPacket for CommandRequest {
    const ID: u32 = id::COMMAND_REQUEST;
    const NAME: &'static str = "CommandRequest";
}
