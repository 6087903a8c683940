//! Tag trees to and from bytes.

use bytes::{Buf, BufMut};

use crate::encoding::{need, Encoding};
use crate::error::NbtError;
use crate::tag::{NbtCompound, NbtTag, TagType};

/// Nesting beyond this is refused before it can exhaust the stack.
pub(crate) const MAX_DEPTH: usize = 512;

pub(crate) struct Reader<'a, B> {
    buf: &'a mut B,
    enc: Encoding,
    depth: usize,
}

impl<'a, B: Buf> Reader<'a, B> {
    pub(crate) fn new(buf: &'a mut B, enc: Encoding) -> Self {
        Self { buf, enc, depth: 0 }
    }

    pub(crate) fn tag_type(&mut self) -> Result<TagType, NbtError> {
        need(self.buf, 1)?;
        TagType::try_from(self.buf.get_u8())
    }

    pub(crate) fn string(&mut self) -> Result<String, NbtError> {
        let len = self.enc.get_str_len(self.buf)?;
        need(self.buf, len)?;
        let bytes = self.buf.copy_to_bytes(len);
        String::from_utf8(bytes.to_vec()).map_err(|_| NbtError::InvalidUtf8)
    }

    /// Payload of a tag whose type byte was already consumed.
    pub(crate) fn payload(&mut self, ty: TagType) -> Result<NbtTag, NbtError> {
        let enc = self.enc;
        Ok(match ty {
            TagType::End => return Err(NbtError::UnknownTagType(0)),
            TagType::Byte => {
                need(self.buf, 1)?;
                NbtTag::Byte(self.buf.get_i8())
            }
            TagType::Short => NbtTag::Short(enc.get_i16(self.buf)?),
            TagType::Int => NbtTag::Int(enc.get_i32(self.buf)?),
            TagType::Long => NbtTag::Long(enc.get_i64(self.buf)?),
            TagType::Float => NbtTag::Float(enc.get_f32(self.buf)?),
            TagType::Double => NbtTag::Double(enc.get_f64(self.buf)?),
            TagType::ByteArray => {
                let len = enc.get_count(self.buf)?;
                need(self.buf, len)?;
                let bytes = self.buf.copy_to_bytes(len);
                NbtTag::ByteArray(bytes.iter().map(|&b| b as i8).collect())
            }
            TagType::String => NbtTag::String(self.string()?),
            TagType::List => self.nested(Self::list)?,
            TagType::Compound => NbtTag::Compound(self.nested(Self::compound)?),
            TagType::IntArray => NbtTag::IntArray(self.array(|r| r.enc.get_i32(r.buf))?),
            TagType::LongArray => NbtTag::LongArray(self.array(|r| r.enc.get_i64(r.buf))?),
        })
    }

    /// Named members up to TAG_End.
    pub(crate) fn compound(&mut self) -> Result<NbtCompound, NbtError> {
        let mut members = NbtCompound::new();
        loop {
            let ty = self.tag_type()?;
            if ty == TagType::End {
                return Ok(members);
            }
            let name = self.string()?;
            let value = self.payload(ty)?;
            members.insert(name, value);
        }
    }

    fn list(&mut self) -> Result<NbtTag, NbtError> {
        let ty = self.tag_type()?;
        let len = self.enc.get_count(self.buf)?;
        if ty == TagType::End {
            // Empty lists are the only legal lists of TAG_End.
            return match len {
                0 => Ok(NbtTag::List(Vec::new())),
                n => Err(NbtError::EndList(n)),
            };
        }
        let mut items = Vec::with_capacity(len.min(self.buf.remaining()));
        for _ in 0..len {
            items.push(self.payload(ty)?);
        }
        Ok(NbtTag::List(items))
    }

    fn array<T>(
        &mut self,
        mut element: impl FnMut(&mut Self) -> Result<T, NbtError>,
    ) -> Result<Vec<T>, NbtError> {
        let len = self.enc.get_count(self.buf)?;
        // Each element takes at least one byte, so the claim is capped by what is left.
        let mut out = Vec::with_capacity(len.min(self.buf.remaining()));
        for _ in 0..len {
            out.push(element(self)?);
        }
        Ok(out)
    }

    fn nested<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, NbtError>,
    ) -> Result<T, NbtError> {
        if self.depth == MAX_DEPTH {
            return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let out = read(self);
        self.depth -= 1;
        out
    }
}

pub(crate) struct Writer<'a, B> {
    buf: &'a mut B,
    enc: Encoding,
}

impl<'a, B: BufMut> Writer<'a, B> {
    pub(crate) fn new(buf: &'a mut B, enc: Encoding) -> Self {
        Self { buf, enc }
    }

    pub(crate) fn tag_type(&mut self, ty: TagType) {
        self.buf.put_u8(ty as u8);
    }

    pub(crate) fn string(&mut self, s: &str) {
        self.enc.put_str_len(self.buf, s.len());
        self.buf.put_slice(s.as_bytes());
    }

    pub(crate) fn payload(&mut self, tag: &NbtTag) {
        let enc = self.enc;
        match tag {
            NbtTag::Byte(v) => self.buf.put_i8(*v),
            NbtTag::Short(v) => enc.put_i16(self.buf, *v),
            NbtTag::Int(v) => enc.put_i32(self.buf, *v),
            NbtTag::Long(v) => enc.put_i64(self.buf, *v),
            NbtTag::Float(v) => enc.put_f32(self.buf, *v),
            NbtTag::Double(v) => enc.put_f64(self.buf, *v),
            NbtTag::ByteArray(bytes) => {
                enc.put_count(self.buf, bytes.len());
                bytes.iter().for_each(|&b| self.buf.put_i8(b));
            }
            NbtTag::String(s) => self.string(s),
            NbtTag::List(items) => {
                self.tag_type(items.first().map_or(TagType::End, NbtTag::tag_type));
                enc.put_count(self.buf, items.len());
                items.iter().for_each(|item| self.payload(item));
            }
            NbtTag::Compound(members) => self.compound(members),
            NbtTag::IntArray(ints) => {
                enc.put_count(self.buf, ints.len());
                ints.iter().for_each(|&v| enc.put_i32(self.buf, v));
            }
            NbtTag::LongArray(longs) => {
                enc.put_count(self.buf, longs.len());
                longs.iter().for_each(|&v| enc.put_i64(self.buf, v));
            }
        }
    }

    pub(crate) fn compound(&mut self, members: &NbtCompound) {
        for (name, value) in members {
            self.tag_type(value.tag_type());
            self.string(name);
            self.payload(value);
        }
        self.tag_type(TagType::End);
    }
}
