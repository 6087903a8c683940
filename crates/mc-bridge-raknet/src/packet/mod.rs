pub mod frame;
pub mod offline;
pub mod online;

/// Datagram id range used by connected framesets.
pub const FRAMESET_IDS: std::ops::RangeInclusive<u8> = 0x80..=0x8D;
