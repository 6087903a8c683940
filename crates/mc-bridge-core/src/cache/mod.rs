//! Per-session state mirrored from the Java server. Owned by the session
//! task, never shared.

pub mod chunk;
pub mod entity;
pub mod inventory;
pub mod piston;

pub use chunk::{ChunkCache, ChunkColumn};
pub use entity::EntityCache;
pub use inventory::{InventoryCache, OpenContainer};
pub use piston::{Facing, PistonAction, PistonCache, PistonState};
