use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};

use crate::constants::{MAX_OPEN_SPLITS, MAX_SPLIT_PARTS};
use crate::error::RakNetError;
use crate::packet::frame::Split;

struct Pending {
    parts: Vec<Option<Bytes>>,
    received: u32,
    started: Instant,
}

/// Reassembles split frames by split id.
#[derive(Default)]
pub struct SplitAssembler {
    pending: HashMap<u16, Pending>,
}

impl SplitAssembler {
    /// Store one part; yields the whole payload once the last part lands.
    pub fn add(&mut self, split: Split, body: Bytes) -> Result<Option<Bytes>, RakNetError> {
        if split.count == 0 || split.count > MAX_SPLIT_PARTS {
            return Err(RakNetError::Split("part count out of range"));
        }
        if split.index >= split.count {
            return Err(RakNetError::Split("part index beyond count"));
        }
        if !self.pending.contains_key(&split.id) && self.pending.len() >= MAX_OPEN_SPLITS {
            return Err(RakNetError::Split("too many concurrent split packets"));
        }

        let entry = self.pending.entry(split.id).or_insert_with(|| Pending {
            parts: vec![None; split.count as usize],
            received: 0,
            started: Instant::now(),
        });
        if entry.parts.len() != split.count as usize {
            return Err(RakNetError::Split("part count changed mid-packet"));
        }

        let slot = &mut entry.parts[split.index as usize];
        if slot.is_none() {
            *slot = Some(body);
            entry.received += 1;
        }
        if entry.received < split.count {
            return Ok(None);
        }

        let Some(done) = self.pending.remove(&split.id) else {
            return Ok(None);
        };
        let mut joined = BytesMut::new();
        for part in done.parts.into_iter().flatten() {
            joined.extend_from_slice(&part);
        }
        Ok(Some(joined.freeze()))
    }

    pub fn expire(&mut self, max_age: Duration) {
        self.pending.retain(|_, p| p.started.elapsed() < max_age);
    }

    pub fn open(&self) -> usize {
        self.pending.len()
    }
}
