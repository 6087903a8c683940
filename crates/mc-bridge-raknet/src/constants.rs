use std::time::Duration;

/// Offline message marker carried by every unconnected RakNet packet.
pub const OFFLINE_MAGIC: [u8; 16] = [
    0x00, 0xFF, 0xFF, 0x00, 0xFE, 0xFE, 0xFE, 0xFE, 0xFD, 0xFD, 0xFD, 0xFD, 0x12, 0x34, 0x56, 0x78,
];

/// RakNet protocol revision used by Bedrock clients.
pub const RAKNET_PROTOCOL_VERSION: u8 = 11;

pub const MIN_MTU: u16 = 400;
pub const MAX_MTU: u16 = 1492;

/// Worst case per-frame header: flags, length, three u24 indices, channel and split info.
pub const FRAME_HEADER_MAX: usize = 20;

/// UDP + IP header overhead subtracted from the negotiated MTU.
pub const DATAGRAM_OVERHEAD: usize = 28;

pub const ORDER_CHANNELS: usize = 32;

/// Idle time after which a peer is dropped.
pub const PEER_TIMEOUT: Duration = Duration::from_secs(10);

pub const PING_INTERVAL: Duration = Duration::from_secs(5);

/// Period of the listener maintenance tick (ACK flush, resend, timeouts).
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

pub const RESEND_AFTER: Duration = Duration::from_secs(1);

pub const MAX_SPLIT_PARTS: u32 = 512;

/// Concurrent split packets one peer may have in flight.
pub const MAX_OPEN_SPLITS: usize = 8;

pub const SPLIT_TIMEOUT: Duration = Duration::from_secs(30);

pub const MAX_ORDERED_BACKLOG: usize = 256;

pub const RECV_BUFFER: usize = 2048;

/// Game payloads are wrapped in this frame id once connected.
pub const GAME_PACKET_ID: u8 = 0xFE;

/// Number of system addresses exchanged in the connection handshake.
pub const SYSTEM_ADDRESS_COUNT: usize = 20;
