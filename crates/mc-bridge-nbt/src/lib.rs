//! NBT (Named Binary Tag) for both editions.
//!
//! Bedrock uses a named compound root in little-endian or network (VarInt)
//! form. Java sends network NBT big-endian with a nameless root that may be
//! any tag type, and a lone TAG_End for "no value".

mod encoding;
pub mod error;
mod io;
pub mod tag;

pub use error::NbtError;
pub use tag::{NbtCompound, NbtRoot, NbtTag, TagType};

use bytes::{Buf, BufMut};

use encoding::Encoding;
use io::{Reader, Writer};

fn read_named(buf: &mut impl Buf, enc: Encoding) -> Result<NbtRoot, NbtError> {
    let mut reader = Reader::new(buf, enc);
    match reader.tag_type() {
        Ok(TagType::Compound) => {}
        Ok(other) => return Err(NbtError::ExpectedCompound { got: other as u8 }),
        Err(NbtError::UnknownTagType(got)) => return Err(NbtError::ExpectedCompound { got }),
        Err(e) => return Err(e),
    }
    let name = reader.string()?;
    let compound = reader.compound()?;
    Ok(NbtRoot { name, compound })
}

fn write_named(buf: &mut impl BufMut, enc: Encoding, root: &NbtRoot) {
    let mut writer = Writer::new(buf, enc);
    writer.tag_type(TagType::Compound);
    writer.string(&root.name);
    writer.compound(&root.compound);
}

pub fn read_nbt_le(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    read_named(buf, Encoding::LittleEndian)
}

pub fn write_nbt_le(buf: &mut impl BufMut, root: &NbtRoot) {
    write_named(buf, Encoding::LittleEndian, root)
}

pub fn read_nbt_network(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    read_named(buf, Encoding::Network)
}

pub fn write_nbt_network(buf: &mut impl BufMut, root: &NbtRoot) {
    write_named(buf, Encoding::Network, root)
}

/// Java network NBT. `Ok(None)` when the server sent TAG_End.
pub fn read_nbt_java(buf: &mut impl Buf) -> Result<Option<NbtTag>, NbtError> {
    let mut reader = Reader::new(buf, Encoding::Java);
    match reader.tag_type()? {
        TagType::End => Ok(None),
        ty => reader.payload(ty).map(Some),
    }
}

pub fn write_nbt_java(buf: &mut impl BufMut, tag: Option<&NbtTag>) {
    let mut writer = Writer::new(buf, Encoding::Java);
    match tag {
        None => writer.tag_type(TagType::End),
        Some(tag) => {
            writer.tag_type(tag.tag_type());
            writer.payload(tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn sample() -> NbtCompound {
        let mut pos = NbtCompound::new();
        pos.insert("x".into(), NbtTag::Int(-10));
        pos.insert("y".into(), NbtTag::Int(64));

        let mut c = NbtCompound::new();
        c.insert("pos".into(), NbtTag::Compound(pos));
        c.insert("name".into(), NbtTag::String("日本語".into()));
        c.insert("ticks".into(), NbtTag::Long(i64::MIN));
        c.insert("scale".into(), NbtTag::Float(0.5));
        c.insert("ids".into(), NbtTag::IntArray(vec![1, -2, 300]));
        c.insert("items".into(), NbtTag::List(vec![NbtTag::Short(1), NbtTag::Short(4)]));
        c.insert("empty".into(), NbtTag::List(vec![]));
        c
    }

    #[test]
    fn le_and_network_roots() {
        let root = NbtRoot::new("level", sample());

        let mut le = BytesMut::new();
        write_nbt_le(&mut le, &root);
        assert_eq!(read_nbt_le(&mut le.clone().freeze()).unwrap(), root);

        let mut net = BytesMut::new();
        write_nbt_network(&mut net, &root);
        assert_eq!(read_nbt_network(&mut net.clone().freeze()).unwrap(), root);
        assert!(net.len() < le.len());
    }

    #[test]
    fn java_root_is_nameless_and_big_endian() {
        let mut c = NbtCompound::new();
        c.insert("v".into(), NbtTag::Int(1));
        let tag = NbtTag::Compound(c);
        let mut buf = BytesMut::new();
        write_nbt_java(&mut buf, Some(&tag));
        assert_eq!(&buf[..], &[10, 3, 0, 1, b'v', 0, 0, 0, 1, 0]);
        assert_eq!(read_nbt_java(&mut buf.freeze()).unwrap(), Some(tag));
    }

    #[test]
    fn java_string_root_and_end() {
        let mut buf = BytesMut::new();
        write_nbt_java(&mut buf, Some(&NbtTag::String("hi".into())));
        write_nbt_java(&mut buf, None);
        let mut buf = buf.freeze();
        assert_eq!(read_nbt_java(&mut buf).unwrap(), Some(NbtTag::String("hi".into())));
        assert_eq!(read_nbt_java(&mut buf).unwrap(), None);
    }

    #[test]
    fn compound_keys_encode_sorted() {
        let mut c = NbtCompound::new();
        c.insert("version".into(), NbtTag::Int(1));
        c.insert("name".into(), NbtTag::String("a".into()));
        let mut buf = BytesMut::new();
        write_nbt_le(&mut buf, &NbtRoot::new("", c));
        assert_eq!(&buf[3..10], &[8, 4, 0, b'n', b'a', b'm', b'e']);
    }

    #[test]
    fn error_cases() {
        assert!(read_nbt_le(&mut bytes::Bytes::new()).is_err());
        assert!(matches!(
            read_nbt_le(&mut bytes::Bytes::from_static(&[1])),
            Err(NbtError::ExpectedCompound { got: 1 })
        ));
        // negative array length
        let mut raw: &[u8] = &[11, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(read_nbt_java(&mut raw), Err(NbtError::NegativeLength(-1))));
        let mut raw: &[u8] = &[99];
        assert!(matches!(read_nbt_java(&mut raw), Err(NbtError::UnknownTagType(99))));
    }

    #[test]
    fn end_typed_list_must_be_empty() {
        let mut empty: &[u8] = &[9, 0, 0, 0, 0, 0];
        assert_eq!(read_nbt_java(&mut empty).unwrap(), Some(NbtTag::List(vec![])));
        let mut claims: &[u8] = &[9, 0, 0, 0, 0, 3];
        assert!(matches!(read_nbt_java(&mut claims), Err(NbtError::EndList(3))));
    }

    #[test]
    fn deep_nesting_is_refused() {
        // lists of lists, one level per 5-byte header
        let mut raw = vec![9u8];
        for _ in 0..=io::MAX_DEPTH {
            raw.extend_from_slice(&[9, 0, 0, 0, 1]);
        }
        assert!(matches!(
            read_nbt_java(&mut &raw[..]),
            Err(NbtError::NestingTooDeep { limit: io::MAX_DEPTH })
        ));
    }

    #[test]
    fn huge_claimed_lengths_fail_without_allocating() {
        let mut raw: &[u8] = &[12, 0x7F, 0xFF, 0xFF, 0xFF, 0, 0];
        assert!(matches!(read_nbt_java(&mut raw), Err(NbtError::UnexpectedEof)));
    }
}
