use mc_bridge_proto::ProtoError;
use mc_bridge_world::WorldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("protocol: {0}")]
    Proto(#[from] ProtoError),

    #[error("world: {0}")]
    World(#[from] WorldError),

    #[error("{packet} is not valid while {phase}")]
    PhaseViolation { phase: &'static str, packet: &'static str },

    #[error("slot {slot} of container {container} has no counterpart")]
    InvalidSlot { container: u8, slot: u8 },

    #[error("unknown entity {0}")]
    UnknownEntity(i32),

    #[error("session is closed")]
    SessionClosed,

    #[error("session state corrupted: {0}")]
    CorruptState(String),

    #[error("upstream: {0}")]
    Upstream(String),

    #[error("translator ordering cycle among {0}")]
    DispatchCycle(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Errors after which the session can no longer be trusted and must be
    /// disconnected. Everything else only fails the current handler.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CorruptState(_) | Self::PhaseViolation { .. } | Self::SessionClosed
        )
    }
}
