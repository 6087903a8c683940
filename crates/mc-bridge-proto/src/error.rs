use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("VarInt longer than {0} bytes")]
    VarIntTooLong(usize),

    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    #[error("string of {len} bytes exceeds limit {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("compression failed: {0}")]
    Compress(String),

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("unknown compression algorithm 0x{0:04X}")]
    UnknownCompression(u16),

    #[error("empty batch")]
    EmptyBatch,

    #[error("unknown packet id 0x{0:02X}")]
    UnknownPacket(u32),

    #[error("login rejected: {0}")]
    InvalidLogin(String),

    #[error("NBT error: {0}")]
    Nbt(#[from] mc_bridge_nbt::NbtError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported {0}")]
    Unsupported(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
