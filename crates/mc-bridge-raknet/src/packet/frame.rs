//! Connected datagrams: framesets carrying frames, and acknowledgements.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::RakNetError;
use crate::wire::{ensure, get_u24, put_u24};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Reliability {
    Unreliable = 0,
    UnreliableSequenced = 1,
    Reliable = 2,
    ReliableOrdered = 3,
    ReliableSequenced = 4,
    UnreliableAck = 5,
    ReliableAck = 6,
    ReliableOrderedAck = 7,
}

impl TryFrom<u8> for Reliability {
    type Error = RakNetError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Ok(match raw {
            0 => Self::Unreliable,
            1 => Self::UnreliableSequenced,
            2 => Self::Reliable,
            3 => Self::ReliableOrdered,
            4 => Self::ReliableSequenced,
            5 => Self::UnreliableAck,
            6 => Self::ReliableAck,
            7 => Self::ReliableOrderedAck,
            other => return Err(RakNetError::Reliability(other)),
        })
    }
}

impl Reliability {
    pub fn reliable(self) -> bool {
        matches!(
            self,
            Self::Reliable
                | Self::ReliableOrdered
                | Self::ReliableSequenced
                | Self::ReliableAck
                | Self::ReliableOrderedAck
        )
    }

    pub fn ordered(self) -> bool {
        matches!(self, Self::ReliableOrdered | Self::ReliableOrderedAck)
    }

    pub fn sequenced(self) -> bool {
        matches!(self, Self::UnreliableSequenced | Self::ReliableSequenced)
    }

    /// Sequenced frames also carry an ordering index and channel.
    fn has_order_fields(self) -> bool {
        self.ordered() || self.sequenced()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub count: u32,
    pub id: u16,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub reliability: Reliability,
    pub message_index: u32,
    pub sequence_index: u32,
    pub order_index: u32,
    pub channel: u8,
    pub split: Option<Split>,
    pub body: Bytes,
}

impl Frame {
    pub fn new(reliability: Reliability, body: Bytes) -> Self {
        Self {
            reliability,
            message_index: 0,
            sequence_index: 0,
            order_index: 0,
            channel: 0,
            split: None,
            body,
        }
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self, RakNetError> {
        ensure(buf, 3)?;
        let flags = buf.get_u8();
        let reliability = Reliability::try_from(flags >> 5)?;
        let bits = buf.get_u16() as usize;
        let mut frame = Frame::new(reliability, Bytes::new());

        if reliability.reliable() {
            frame.message_index = get_u24(buf)?;
        }
        if reliability.sequenced() {
            frame.sequence_index = get_u24(buf)?;
        }
        if reliability.has_order_fields() {
            frame.order_index = get_u24(buf)?;
            ensure(buf, 1)?;
            frame.channel = buf.get_u8();
        }
        if flags & 0x10 != 0 {
            ensure(buf, 10)?;
            frame.split = Some(Split {
                count: buf.get_u32(),
                id: buf.get_u16(),
                index: buf.get_u32(),
            });
        }

        let len = bits.div_ceil(8);
        ensure(buf, len)?;
        frame.body = buf.copy_to_bytes(len);
        Ok(frame)
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        let split_flag = if self.split.is_some() { 0x10 } else { 0 };
        buf.put_u8(((self.reliability as u8) << 5) | split_flag);
        buf.put_u16((self.body.len() * 8) as u16);
        if self.reliability.reliable() {
            put_u24(buf, self.message_index);
        }
        if self.reliability.sequenced() {
            put_u24(buf, self.sequence_index);
        }
        if self.reliability.has_order_fields() {
            put_u24(buf, self.order_index);
            buf.put_u8(self.channel);
        }
        if let Some(split) = self.split {
            buf.put_u32(split.count);
            buf.put_u16(split.id);
            buf.put_u32(split.index);
        }
        buf.put_slice(&self.body);
    }

    pub fn encoded_len(&self) -> usize {
        let mut len = 3 + self.body.len();
        if self.reliability.reliable() {
            len += 3;
        }
        if self.reliability.sequenced() {
            len += 3;
        }
        if self.reliability.has_order_fields() {
            len += 4;
        }
        if self.split.is_some() {
            len += 10;
        }
        len
    }
}

/// One datagram worth of frames under a single sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSet {
    pub sequence: u32,
    pub frames: Vec<Frame>,
}

impl FrameSet {
    pub const SEND_ID: u8 = 0x84;

    pub fn decode(datagram: &[u8]) -> Result<Self, RakNetError> {
        let mut buf = datagram;
        ensure(&buf, 4)?;
        buf.advance(1);
        let sequence = get_u24(&mut buf)?;
        let mut frames = Vec::new();
        while buf.has_remaining() {
            frames.push(Frame::decode(&mut buf)?);
        }
        Ok(Self { sequence, frames })
    }

    pub fn encode(&self) -> Bytes {
        let size = 4 + self.frames.iter().map(Frame::encoded_len).sum::<usize>();
        let mut buf = BytesMut::with_capacity(size);
        buf.put_u8(Self::SEND_ID);
        put_u24(&mut buf, self.sequence);
        for frame in &self.frames {
            frame.encode(&mut buf);
        }
        buf.freeze()
    }
}

/// ACK or NACK, expressed as inclusive sequence ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub negative: bool,
    pub ranges: Vec<(u32, u32)>,
}

impl Acknowledgement {
    pub const ACK_ID: u8 = 0xC0;
    pub const NACK_ID: u8 = 0xA0;

    pub fn decode(datagram: &[u8]) -> Result<Self, RakNetError> {
        let mut buf = datagram;
        ensure(&buf, 3)?;
        let negative = buf.get_u8() == Self::NACK_ID;
        let count = buf.get_u16() as usize;
        let mut ranges = Vec::with_capacity(count.min(512));
        for _ in 0..count {
            ensure(&buf, 1)?;
            // A zero marker means a min/max pair follows.
            let single = buf.get_u8() != 0;
            let start = get_u24(&mut buf)?;
            let end = if single { start } else { get_u24(&mut buf)? };
            ranges.push((start, end.max(start)));
        }
        Ok(Self { negative, ranges })
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(3 + self.ranges.len() * 7);
        buf.put_u8(if self.negative {
            Self::NACK_ID
        } else {
            Self::ACK_ID
        });
        buf.put_u16(self.ranges.len() as u16);
        for &(start, end) in &self.ranges {
            if start == end {
                buf.put_u8(1);
                put_u24(&mut buf, start);
            } else {
                buf.put_u8(0);
                put_u24(&mut buf, start);
                put_u24(&mut buf, end);
            }
        }
        buf.freeze()
    }

    pub fn sequences(&self) -> impl Iterator<Item = u32> + '_ {
        self.ranges.iter().flat_map(|&(start, end)| start..=end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered(body: &'static [u8], index: u32) -> Frame {
        Frame {
            message_index: index,
            order_index: index,
            channel: 0,
            ..Frame::new(Reliability::ReliableOrdered, Bytes::from_static(body))
        }
    }

    #[test]
    fn reliability_bits() {
        assert!(Reliability::ReliableOrdered.ordered());
        assert!(Reliability::ReliableOrdered.reliable());
        assert!(!Reliability::Unreliable.reliable());
        assert!(Reliability::UnreliableSequenced.sequenced());
        assert!(Reliability::try_from(8).is_err());
    }

    #[test]
    fn frameset_survives_the_wire() {
        let set = FrameSet {
            sequence: 77,
            frames: vec![ordered(b"abc", 0), ordered(b"de", 1)],
        };
        let wire = set.encode();
        assert_eq!(wire[0], FrameSet::SEND_ID);
        assert_eq!(wire.len(), 4 + set.frames[0].encoded_len() + set.frames[1].encoded_len());
        assert_eq!(FrameSet::decode(&wire).unwrap(), set);
    }

    #[test]
    fn split_flag_and_fields() {
        let mut frame = Frame::new(Reliability::Reliable, Bytes::from_static(b"x"));
        frame.split = Some(Split {
            count: 3,
            id: 9,
            index: 2,
        });
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        assert_eq!(buf[0], (2 << 5) | 0x10);
        assert_eq!(buf.len(), frame.encoded_len());
        let decoded = Frame::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.split, frame.split);
    }

    #[test]
    fn body_length_rounds_up_bits() {
        // 9 bits of payload still occupy two bytes.
        let raw: &[u8] = &[0x00, 0x00, 0x09, 0xAA, 0xBB];
        let frame = Frame::decode(&mut &raw[..]).unwrap();
        assert_eq!(&frame.body[..], &[0xAA, 0xBB]);
    }

    #[test]
    fn ack_ranges_and_singles() {
        let ack = Acknowledgement {
            negative: false,
            ranges: vec![(1, 4), (9, 9)],
        };
        let wire = ack.encode();
        assert_eq!(wire.len(), 3 + 7 + 4);
        let decoded = Acknowledgement::decode(&wire).unwrap();
        assert_eq!(decoded, ack);
        assert_eq!(decoded.sequences().collect::<Vec<_>>(), vec![1, 2, 3, 4, 9]);
    }

    #[test]
    fn nack_flag() {
        let nack = Acknowledgement {
            negative: true,
            ranges: vec![(5, 5)],
        };
        assert!(Acknowledgement::decode(&nack.encode()).unwrap().negative);
    }
}
