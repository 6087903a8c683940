use thiserror::Error;

#[derive(Debug, Error)]
pub enum RakNetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated packet: needed {needed} bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },

    #[error("offline magic mismatch")]
    BadMagic,

    #[error("unexpected packet id 0x{0:02X}")]
    UnexpectedId(u8),

    #[error("unsupported address family {0}")]
    AddressFamily(u8),

    #[error("reliability {0} out of range")]
    Reliability(u8),

    #[error("split packet rejected: {0}")]
    Split(&'static str),

    #[error("string is not valid UTF-8")]
    Utf8,
}
