use std::collections::BTreeMap;

use bytes::Bytes;

use crate::constants::{MAX_ORDERED_BACKLOG, ORDER_CHANNELS};

#[derive(Default)]
struct Channel {
    next: u32,
    held: BTreeMap<u32, Bytes>,
    last_sequenced: Option<u32>,
}

/// Per-channel delivery order for ordered and sequenced frames.
pub struct OrderingChannels {
    channels: Vec<Channel>,
}

impl Default for OrderingChannels {
    fn default() -> Self {
        Self {
            channels: (0..ORDER_CHANNELS).map(|_| Channel::default()).collect(),
        }
    }
}

impl OrderingChannels {
    /// Accepts an ordered frame and returns whatever became deliverable.
    pub fn ordered(&mut self, channel: u8, index: u32, body: Bytes) -> Vec<Bytes> {
        let Some(ch) = self.channels.get_mut(channel as usize) else {
            return Vec::new();
        };
        if index < ch.next {
            return Vec::new();
        }
        if index > ch.next {
            if ch.held.len() < MAX_ORDERED_BACKLOG {
                ch.held.insert(index, body);
            }
            return Vec::new();
        }

        let mut ready = vec![body];
        ch.next += 1;
        while let Some(next) = ch.held.remove(&ch.next) {
            ready.push(next);
            ch.next += 1;
        }
        ready
    }

    /// Sequenced frames are delivered only if newer than the last one.
    pub fn sequenced(&mut self, channel: u8, index: u32, body: Bytes) -> Option<Bytes> {
        let ch = self.channels.get_mut(channel as usize)?;
        match ch.last_sequenced {
            Some(last) if index <= last => None,
            _ => {
                ch.last_sequenced = Some(index);
                Some(body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[test]
    fn holds_until_gap_closes() {
        let mut oc = OrderingChannels::default();
        assert!(oc.ordered(0, 1, b("second")).is_empty());
        assert!(oc.ordered(0, 2, b("third")).is_empty());
        let ready = oc.ordered(0, 0, b("first"));
        assert_eq!(ready, vec![b("first"), b("second"), b("third")]);
        assert!(oc.ordered(0, 1, b("again")).is_empty());
    }

    #[test]
    fn channels_are_independent() {
        let mut oc = OrderingChannels::default();
        assert!(oc.ordered(1, 1, b("x")).is_empty());
        assert_eq!(oc.ordered(2, 0, b("y")).len(), 1);
    }

    #[test]
    fn sequenced_drops_stale() {
        let mut oc = OrderingChannels::default();
        assert!(oc.sequenced(0, 0, b("a")).is_some());
        assert!(oc.sequenced(0, 5, b("b")).is_some());
        assert!(oc.sequenced(0, 3, b("c")).is_none());
    }

    #[test]
    fn out_of_range_channel_is_dropped() {
        let mut oc = OrderingChannels::default();
        assert!(oc.ordered(200, 0, b("x")).is_empty());
    }
}
