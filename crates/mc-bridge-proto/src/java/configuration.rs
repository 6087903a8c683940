//! Configuration state between login and play.

use bytes::{Buf, BufMut, Bytes};
use mc_bridge_nbt::read_nbt_java;

use crate::codec::{read_bool, read_string, write_string};
use crate::error::ProtoError;
use crate::java::{read_component, read_count, read_i32, read_i64, split_id, text, JavaServerbound};
use crate::types::Uuid;
use crate::varint::put_java_varint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownPack {
    pub namespace: String,
    pub id: String,
    pub version: String,
}

fn read_known_packs(buf: &mut impl Buf) -> Result<Vec<KnownPack>, ProtoError> {
    let count = read_count(buf, 64)?;
    let mut packs = Vec::with_capacity(count);
    for _ in 0..count {
        packs.push(KnownPack {
            namespace: read_string(buf)?,
            id: read_string(buf)?,
            version: read_string(buf)?,
        });
    }
    Ok(packs)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationClientbound {
    PluginMessage { channel: String, data: Bytes },
    Disconnect(String),
    FinishConfiguration,
    KeepAlive(i64),
    Ping(i32),
    /// Entry names in registry order; their index is the network id.
    RegistryData { registry: String, entries: Vec<String> },
    AddResourcePack { id: Uuid, forced: bool },
    KnownPacks(Vec<KnownPack>),
    Other { id: i32 },
}

impl ConfigurationClientbound {
    pub fn decode(raw: Bytes) -> Result<Self, ProtoError> {
        let (id, mut body) = split_id(raw)?;
        let buf = &mut body;
        Ok(match id {
            0x01 => {
                let channel = read_string(buf)?;
                Self::PluginMessage {
                    channel,
                    data: buf.copy_to_bytes(buf.remaining()),
                }
            }
            0x02 => Self::Disconnect(text::flatten(&read_component(buf)?)),
            0x03 => Self::FinishConfiguration,
            0x04 => Self::KeepAlive(read_i64(buf)?),
            0x05 => Self::Ping(read_i32(buf)?),
            0x07 => {
                let registry = read_string(buf)?;
                let count = read_count(buf, 4096)?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    entries.push(read_string(buf)?);
                    if read_bool(buf)? {
                        read_nbt_java(buf)?;
                    }
                }
                Self::RegistryData { registry, entries }
            }
            0x09 => {
                let id = Uuid::java_decode(buf)?;
                let _url = read_string(buf)?;
                let _hash = read_string(buf)?;
                let forced = read_bool(buf)?;
                Self::AddResourcePack { id, forced }
            }
            0x0E => Self::KnownPacks(read_known_packs(buf)?),
            other => Self::Other { id: other },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInformation {
    pub locale: String,
    pub view_distance: i8,
    pub chat_mode: i32,
    pub chat_colors: bool,
    pub skin_parts: u8,
    pub main_hand: i32,
    pub text_filtering: bool,
    pub allow_listing: bool,
}

impl ClientInformation {
    pub fn new(locale: impl Into<String>, view_distance: i8) -> Self {
        Self {
            locale: locale.into(),
            view_distance,
            chat_mode: 0,
            chat_colors: true,
            skin_parts: 0x7F,
            main_hand: 1,
            text_filtering: false,
            allow_listing: true,
        }
    }
}

impl JavaServerbound for ClientInformation {
    const ID: i32 = 0x00;

    fn write(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.locale);
        buf.put_i8(self.view_distance);
        put_java_varint(buf, self.chat_mode);
        buf.put_u8(self.chat_colors as u8);
        buf.put_u8(self.skin_parts);
        put_java_varint(buf, self.main_hand);
        buf.put_u8(self.text_filtering as u8);
        buf.put_u8(self.allow_listing as u8);
    }
}

/// `minecraft:brand` and similar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerboundPluginMessage {
    pub channel: String,
    pub data: Vec<u8>,
}

impl ServerboundPluginMessage {
    pub fn brand(name: &str) -> Self {
        let mut data = Vec::with_capacity(name.len() + 1);
        write_string(&mut data, name);
        Self {
            channel: "minecraft:brand".into(),
            data,
        }
    }
}

impl JavaServerbound for ServerboundPluginMessage {
    const ID: i32 = 0x02;

    fn write(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.channel);
        buf.put_slice(&self.data);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcknowledgeFinishConfiguration;

impl JavaServerbound for AcknowledgeFinishConfiguration {
    const ID: i32 = 0x03;

    fn write(&self, _buf: &mut impl BufMut) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationKeepAlive(pub i64);

impl JavaServerbound for ConfigurationKeepAlive {
    const ID: i32 = 0x04;

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_i64(self.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationPong(pub i32);

impl JavaServerbound for ConfigurationPong {
    const ID: i32 = 0x05;

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_i32(self.0);
    }
}

pub mod resource_pack_result {
    pub const LOADED: i32 = 0;
    pub const DECLINED: i32 = 1;
    pub const ACCEPTED: i32 = 3;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePackResponse {
    pub id: Uuid,
    pub result: i32,
}

impl JavaServerbound for ResourcePackResponse {
    const ID: i32 = 0x06;

    fn write(&self, buf: &mut impl BufMut) {
        self.id.java_encode(buf);
        put_java_varint(buf, self.result);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerboundKnownPacks(pub Vec<KnownPack>);

impl JavaServerbound for ServerboundKnownPacks {
    const ID: i32 = 0x07;

    fn write(&self, buf: &mut impl BufMut) {
        put_java_varint(buf, self.0.len() as i32);
        for pack in &self.0 {
            write_string(buf, &pack.namespace);
            write_string(buf, &pack.id);
            write_string(buf, &pack.version);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::encode_serverbound;
    use bytes::BytesMut;
    use mc_bridge_nbt::{write_nbt_java, NbtCompound, NbtTag};

    #[test]
    fn registry_entries_keep_order() {
        let mut buf = BytesMut::new();
        put_java_varint(&mut buf, 0x07);
        write_string(&mut buf, "minecraft:worldgen/biome");
        put_java_varint(&mut buf, 2);
        write_string(&mut buf, "minecraft:plains");
        buf.put_u8(1);
        write_nbt_java(&mut buf, Some(&NbtTag::Compound(NbtCompound::new())));
        write_string(&mut buf, "minecraft:desert");
        buf.put_u8(0);

        match ConfigurationClientbound::decode(buf.freeze()).unwrap() {
            ConfigurationClientbound::RegistryData { registry, entries } => {
                assert_eq!(registry, "minecraft:worldgen/biome");
                assert_eq!(entries, vec!["minecraft:plains", "minecraft:desert"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn known_packs_echo() {
        let packs = vec![KnownPack {
            namespace: "minecraft".into(),
            id: "core".into(),
            version: "1.21.1".into(),
        }];
        let raw = encode_serverbound(&ServerboundKnownPacks(packs.clone()));
        let mut clientbound = BytesMut::new();
        put_java_varint(&mut clientbound, 0x0E);
        clientbound.extend_from_slice(&raw[1..]);
        assert_eq!(
            ConfigurationClientbound::decode(clientbound.freeze()).unwrap(),
            ConfigurationClientbound::KnownPacks(packs)
        );
    }

    #[test]
    fn brand_payload_is_a_string() {
        let raw = encode_serverbound(&ServerboundPluginMessage::brand("bridge"));
        assert_eq!(raw[0], 0x02);
        assert_eq!(&raw[raw.len() - 7..], &[6, b'b', b'r', b'i', b'd', b'g', b'e']);
    }

    #[test]
    fn unknown_ids_are_kept() {
        let raw = Bytes::from_static(&[0x0C, 0x00]);
        assert_eq!(
            ConfigurationClientbound::decode(raw).unwrap(),
            ConfigurationClientbound::Other { id: 0x0C }
        );
    }
}
