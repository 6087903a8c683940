use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;
use tracing::debug;

use crate::constants::*;
use crate::fragmentation::SplitAssembler;
use crate::ordering::OrderingChannels;
use crate::packet::frame::{Acknowledgement, Frame, FrameSet, Reliability, Split};
use crate::reliability::{to_ranges, DatagramTracker, ReliableWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// Open connection handshake answered, waiting for the connection request.
    Handshaking,
    /// Connection request accepted, waiting for new incoming connection.
    Accepting,
    Connected,
    Closing,
}

struct InFlight {
    frames: Vec<Frame>,
    sent_at: Instant,
}

/// Transport state for one remote address.
pub struct Peer {
    pub addr: SocketAddr,
    pub guid: i64,
    pub mtu: u16,
    pub state: PeerState,
    pub last_seen: Instant,
    pub last_ping: Instant,

    next_sequence: u32,
    next_message: u32,
    next_order: [u32; ORDER_CHANNELS],
    next_split: u16,
    outgoing: VecDeque<Frame>,
    in_flight: BTreeMap<u32, InFlight>,

    received: DatagramTracker,
    reliable: ReliableWindow,
    ordering: OrderingChannels,
    splits: SplitAssembler,
}

impl Peer {
    pub fn new(addr: SocketAddr, guid: i64, mtu: u16) -> Self {
        let now = Instant::now();
        Self {
            addr,
            guid,
            mtu: mtu.clamp(MIN_MTU, MAX_MTU),
            state: PeerState::Handshaking,
            last_seen: now,
            last_ping: now,
            next_sequence: 0,
            next_message: 0,
            next_order: [0; ORDER_CHANNELS],
            next_split: 0,
            outgoing: VecDeque::new(),
            in_flight: BTreeMap::new(),
            received: DatagramTracker::default(),
            reliable: ReliableWindow::default(),
            ordering: OrderingChannels::default(),
            splits: SplitAssembler::default(),
        }
    }

    fn payload_budget(&self) -> usize {
        self.mtu as usize - DATAGRAM_OVERHEAD - 4 - FRAME_HEADER_MAX
    }

    /// Queue a payload, splitting it when it does not fit one datagram.
    pub fn enqueue(&mut self, body: Bytes, reliability: Reliability, channel: u8) {
        let channel = channel.min(ORDER_CHANNELS as u8 - 1);
        let order_index = if reliability.ordered() || reliability.sequenced() {
            let slot = &mut self.next_order[channel as usize];
            let index = *slot;
            *slot += 1;
            index
        } else {
            0
        };

        let budget = self.payload_budget();
        if body.len() <= budget {
            let frame = self.stamp(body, reliability, channel, order_index, None);
            self.outgoing.push_back(frame);
            return;
        }

        // Split parts must be reliable so the receiver can rebuild them.
        let reliability = match reliability {
            Reliability::Unreliable | Reliability::UnreliableAck => Reliability::Reliable,
            Reliability::UnreliableSequenced => Reliability::ReliableSequenced,
            other => other,
        };
        let part_size = budget - 10;
        let count = body.len().div_ceil(part_size) as u32;
        let id = self.next_split;
        self.next_split = self.next_split.wrapping_add(1);
        for index in 0..count {
            let start = index as usize * part_size;
            let end = (start + part_size).min(body.len());
            let split = Split { count, id, index };
            let frame = self.stamp(
                body.slice(start..end),
                reliability,
                channel,
                order_index,
                Some(split),
            );
            self.outgoing.push_back(frame);
        }
    }

    fn stamp(
        &mut self,
        body: Bytes,
        reliability: Reliability,
        channel: u8,
        order_index: u32,
        split: Option<Split>,
    ) -> Frame {
        let mut frame = Frame::new(reliability, body);
        frame.split = split;
        frame.channel = channel;
        frame.order_index = order_index;
        frame.sequence_index = order_index;
        if reliability.reliable() {
            frame.message_index = self.next_message;
            self.next_message += 1;
        }
        frame
    }

    /// Pack queued frames into datagrams no larger than the MTU.
    pub fn drain_datagrams(&mut self, now: Instant) -> Vec<Bytes> {
        let limit = self.mtu as usize - DATAGRAM_OVERHEAD;
        let mut datagrams = Vec::new();
        while !self.outgoing.is_empty() {
            let mut frames = Vec::new();
            let mut size = 4;
            while let Some(next) = self.outgoing.front() {
                let len = next.encoded_len();
                if !frames.is_empty() && size + len > limit {
                    break;
                }
                size += len;
                if let Some(frame) = self.outgoing.pop_front() {
                    frames.push(frame);
                }
            }

            let set = FrameSet {
                sequence: self.next_sequence,
                frames,
            };
            self.next_sequence = (self.next_sequence + 1) & 0x00FF_FFFF;
            datagrams.push(set.encode());

            let reliable: Vec<Frame> = set
                .frames
                .into_iter()
                .filter(|f| f.reliability.reliable())
                .collect();
            if !reliable.is_empty() {
                self.in_flight.insert(
                    set.sequence,
                    InFlight {
                        frames: reliable,
                        sent_at: now,
                    },
                );
            }
        }
        datagrams
    }

    pub fn on_ack(&mut self, ack: &Acknowledgement) {
        for seq in ack.sequences() {
            self.in_flight.remove(&seq);
        }
    }

    pub fn on_nack(&mut self, nack: &Acknowledgement) {
        for seq in nack.sequences() {
            if let Some(lost) = self.in_flight.remove(&seq) {
                self.outgoing.extend(lost.frames);
            }
        }
    }

    /// Requeue reliable frames whose datagram was never acknowledged.
    pub fn resend_expired(&mut self, now: Instant) {
        let expired: Vec<u32> = self
            .in_flight
            .iter()
            .filter(|(_, f)| now.duration_since(f.sent_at) >= RESEND_AFTER)
            .map(|(&seq, _)| seq)
            .collect();
        for seq in expired {
            if let Some(lost) = self.in_flight.remove(&seq) {
                self.outgoing.extend(lost.frames);
            }
        }
    }

    /// ACK and NACK datagrams for everything received since the last call.
    pub fn take_acknowledgements(&mut self) -> Vec<Bytes> {
        let mut out = Vec::new();
        if !self.received.ack.is_empty() {
            let ranges = to_ranges(&mut self.received.ack);
            self.received.ack.clear();
            out.push(
                Acknowledgement {
                    negative: false,
                    ranges,
                }
                .encode(),
            );
        }
        if !self.received.nack.is_empty() {
            let mut missing = std::mem::take(&mut self.received.nack);
            out.push(
                Acknowledgement {
                    negative: true,
                    ranges: to_ranges(&mut missing),
                }
                .encode(),
            );
        }
        out
    }

    /// Run a received frameset through dedup, reassembly and ordering.
    pub fn accept(&mut self, set: FrameSet) -> Vec<Bytes> {
        self.last_seen = Instant::now();
        self.received.record(set.sequence);

        let mut delivered = Vec::new();
        for frame in set.frames {
            if frame.reliability.reliable() && !self.reliable.accept(frame.message_index) {
                continue;
            }
            let body = match frame.split {
                Some(split) => match self.splits.add(split, frame.body) {
                    Ok(Some(whole)) => whole,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!(addr = %self.addr, "dropping split frame: {e}");
                        continue;
                    }
                },
                None => frame.body,
            };

            if frame.reliability.ordered() {
                delivered.extend(self.ordering.ordered(frame.channel, frame.order_index, body));
            } else if frame.reliability.sequenced() {
                delivered.extend(
                    self.ordering
                        .sequenced(frame.channel, frame.sequence_index, body),
                );
            } else {
                delivered.push(body);
            }
        }
        delivered
    }

    pub fn timed_out(&self, now: Instant) -> bool {
        now.duration_since(self.last_seen) > PEER_TIMEOUT
    }

    pub fn needs_ping(&self, now: Instant) -> bool {
        self.state == PeerState::Connected && now.duration_since(self.last_ping) >= PING_INTERVAL
    }

    pub fn expire_splits(&mut self) {
        self.splits.expire(SPLIT_TIMEOUT);
    }

    pub fn unacked(&self) -> usize {
        self.in_flight.len()
    }
}
