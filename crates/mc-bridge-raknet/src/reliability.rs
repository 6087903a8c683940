//! Acknowledgement bookkeeping for received datagrams and reliable frames.

use std::collections::BTreeSet;

/// Collapse sequence numbers into inclusive ranges. The input is sorted and deduplicated.
pub fn to_ranges(sequences: &mut Vec<u32>) -> Vec<(u32, u32)> {
    sequences.sort_unstable();
    sequences.dedup();
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for &seq in sequences.iter() {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == seq => *end = seq,
            _ => ranges.push((seq, seq)),
        }
    }
    ranges
}

/// Tracks which reliable message indices were already delivered.
///
/// Everything below `floor` has been seen; the set only holds indices that
/// arrived ahead of a gap, so it stays small on a healthy link.
#[derive(Debug, Default)]
pub struct ReliableWindow {
    floor: u32,
    ahead: BTreeSet<u32>,
}

impl ReliableWindow {
    /// Returns `true` the first time an index is seen.
    pub fn accept(&mut self, index: u32) -> bool {
        if index < self.floor || !self.ahead.insert(index) {
            return false;
        }
        while self.ahead.remove(&self.floor) {
            self.floor += 1;
        }
        true
    }
}

/// Receive side datagram tracking: which sequences to ACK and which gaps to NACK.
#[derive(Debug, Default)]
pub struct DatagramTracker {
    next_expected: u32,
    pub ack: Vec<u32>,
    pub nack: Vec<u32>,
}

impl DatagramTracker {
    pub fn record(&mut self, sequence: u32) {
        self.ack.push(sequence);
        self.nack.retain(|&missing| missing != sequence);
        if sequence >= self.next_expected {
            // Gaps are bounded so a forged sequence cannot balloon the queue.
            let gap_start = self.next_expected.max(sequence.saturating_sub(256));
            self.nack.extend(gap_start..sequence);
            self.next_expected = sequence + 1;
        }
    }
}
