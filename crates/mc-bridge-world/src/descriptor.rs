//! Bedrock block states as name + sorted states, and their runtime id hash.
//!
//! With `block_network_ids_are_hashes` the client derives runtime ids by
//! hashing the network NBT of each state, so the bridge must produce the
//! same bytes: root keys `name`, `states`, `version` in that order.

use std::collections::BTreeMap;

use bytes::BytesMut;
use mc_bridge_nbt::{write_nbt_network, NbtCompound, NbtRoot, NbtTag};
use serde::{Deserialize, Serialize};

const FNV1_32_INIT: u32 = 0x811c_9dc5;
const FNV1_32_PRIME: u32 = 0x0100_0193;

/// Block state version written into every hashed state.
pub const BLOCK_STATE_VERSION: i32 = 18_100_737;

pub fn fnv1a_32(data: &[u8]) -> u32 {
    let mut hash = FNV1_32_INIT;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV1_32_PRIME);
    }
    hash
}

/// Booleans are TAG_Byte on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Int(i32),
    String(String),
}

impl StateValue {
    fn to_tag(&self) -> NbtTag {
        match self {
            Self::Bool(v) => NbtTag::Byte(*v as i8),
            Self::Int(v) => NbtTag::Int(*v),
            Self::String(v) => NbtTag::String(v.clone()),
        }
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for StateValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for StateValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockDescriptor {
    pub name: String,
    #[serde(default)]
    pub states: BTreeMap<String, StateValue>,
}

impl BlockDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: BTreeMap::new(),
        }
    }

    pub fn air() -> Self {
        Self::new("minecraft:air")
    }

    pub fn with_state(mut self, key: &str, value: impl Into<StateValue>) -> Self {
        self.states.insert(key.to_owned(), value.into());
        self
    }

    pub fn renamed(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    pub fn without_state(mut self, key: &str) -> Self {
        self.states.remove(key);
        self
    }

    pub fn state(&self, key: &str) -> Option<&StateValue> {
        self.states.get(key)
    }

    pub fn to_nbt(&self) -> NbtRoot {
        let states: NbtCompound = self
            .states
            .iter()
            .map(|(k, v)| (k.clone(), v.to_tag()))
            .collect();
        let mut root = NbtCompound::new();
        root.insert("name".into(), NbtTag::String(self.name.clone()));
        root.insert("states".into(), NbtTag::Compound(states));
        root.insert("version".into(), NbtTag::Int(BLOCK_STATE_VERSION));
        NbtRoot::new("", root)
    }

    pub fn network_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::new();
        write_nbt_network(&mut buf, &self.to_nbt());
        buf
    }

    /// Runtime id the client computes for this state.
    pub fn network_hash(&self) -> u32 {
        fnv1a_32(&self.network_bytes())
    }
}
