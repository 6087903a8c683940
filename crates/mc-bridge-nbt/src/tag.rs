//! NBT tag tree.

use std::collections::BTreeMap;

use crate::error::NbtError;

/// Keys iterate in sorted order, so encoding a compound is deterministic.
pub type NbtCompound = BTreeMap<String, NbtTag>;

/// Bedrock roots are always a named compound.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtRoot {
    pub name: String,
    pub compound: NbtCompound,
}

impl NbtRoot {
    pub fn new(name: impl Into<String>, compound: NbtCompound) -> Self {
        Self {
            name: name.into(),
            compound,
        }
    }
}

/// Wire type ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TagType {
    End = 0,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    String,
    List,
    Compound,
    IntArray,
    LongArray,
}

impl TryFrom<u8> for TagType {
    type Error = NbtError;

    fn try_from(id: u8) -> Result<Self, NbtError> {
        const ALL: [TagType; 13] = [
            TagType::End,
            TagType::Byte,
            TagType::Short,
            TagType::Int,
            TagType::Long,
            TagType::Float,
            TagType::Double,
            TagType::ByteArray,
            TagType::String,
            TagType::List,
            TagType::Compound,
            TagType::IntArray,
            TagType::LongArray,
        ];
        ALL.get(id as usize)
            .copied()
            .ok_or(NbtError::UnknownTagType(id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtTag>),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtTag {
    pub fn tag_type(&self) -> TagType {
        match self {
            NbtTag::Byte(_) => TagType::Byte,
            NbtTag::Short(_) => TagType::Short,
            NbtTag::Int(_) => TagType::Int,
            NbtTag::Long(_) => TagType::Long,
            NbtTag::Float(_) => TagType::Float,
            NbtTag::Double(_) => TagType::Double,
            NbtTag::ByteArray(_) => TagType::ByteArray,
            NbtTag::String(_) => TagType::String,
            NbtTag::List(_) => TagType::List,
            NbtTag::Compound(_) => TagType::Compound,
            NbtTag::IntArray(_) => TagType::IntArray,
            NbtTag::LongArray(_) => TagType::LongArray,
        }
    }

    /// Byte, short or int widened to i32. Java text components store
    /// booleans as bytes and Bedrock block entities store them as ints.
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            NbtTag::Byte(v) => Some(v.into()),
            NbtTag::Short(v) => Some(v.into()),
            NbtTag::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        Some(self.as_int()? != 0)
    }

    pub fn as_string(&self) -> Option<&str> {
        if let NbtTag::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_compound(&self) -> Option<&NbtCompound> {
        if let NbtTag::Compound(c) = self {
            Some(c)
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&[NbtTag]> {
        if let NbtTag::List(items) = self {
            Some(items)
        } else {
            None
        }
    }

    /// Member of a compound; `None` for other tag types.
    pub fn get(&self, key: &str) -> Option<&NbtTag> {
        self.as_compound()?.get(key)
    }
}
