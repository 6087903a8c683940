//! Block and biome storage, Bedrock chunk serialization and the
//! Java → Bedrock block/item registries.

pub mod bit_array;
pub mod conversion;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod section;
pub mod storage;

pub use bit_array::{BitArray, BitArrayVersion};
pub use descriptor::{BlockDescriptor, StateValue};
pub use error::WorldError;
pub use registry::{
    BlockMappings, CustomBlockDefinition, CustomItemDefinition, ItemMapping, ItemMappings,
    ProtocolMappings, Registries,
};
pub use section::ChunkSection;
pub use storage::BlockStorage;
