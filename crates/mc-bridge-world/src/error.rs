use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("no mappings for protocol {0}")]
    UnsupportedProtocol(u32),

    #[error("conversion step out of order: expected a step from {expected}, got one from {found}")]
    ChainOrder { expected: u32, found: u32 },

    #[error("mapping table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("invalid custom definition: {0}")]
    InvalidCustom(String),

    #[error("custom identifier {0} already registered with a different definition")]
    CustomConflict(String),

    #[error("palette of {palette} entries does not fit {bits}-bit storage")]
    PaletteOverflow { palette: usize, bits: u8 },
}
