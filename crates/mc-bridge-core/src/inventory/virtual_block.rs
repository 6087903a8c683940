//! Blocks placed client-side so Bedrock can open containers the Java server
//! opened without one, such as a stonecutter reached through a command.

use mc_bridge_proto::bedrock::UpdateBlock;
use mc_bridge_proto::types::{BlockPos, Vec3};
use mc_bridge_world::{ProtocolMappings, Registries};

/// Layer 0 is the block, layer 1 the water a waterlogged block sits in.
pub fn block_updates(registries: &Registries, mappings: &ProtocolMappings, pos: BlockPos, java_state: u32) -> [UpdateBlock; 2] {
    let blocks = &mappings.blocks;
    let liquid = if blocks.is_waterlogged(java_state) {
        blocks.water_id()
    } else {
        blocks.air_id()
    };
    [
        UpdateBlock::new(pos, registries.resolve_block(mappings, java_state), 0),
        UpdateBlock::new(pos, liquid, 1),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeBlock {
    pub pos: BlockPos,
    /// Java state the client saw before the container opened.
    pub original: u32,
}

/// Two blocks below the player, or two above when that would leave the world.
pub fn position(player: Vec3, min_y: i32) -> BlockPos {
    let feet = BlockPos::new(
        player.x.floor() as i32,
        player.y.floor() as i32,
        player.z.floor() as i32,
    );
    if feet.y - 2 < min_y {
        feet.offset(0, 2, 0)
    } else {
        feet.offset(0, -2, 0)
    }
}

/// Second half of a double chest, one block east.
pub fn pair_position(pos: BlockPos) -> BlockPos {
    pos.offset(1, 0, 0)
}

impl FakeBlock {
    pub fn restore(&self, registries: &Registries, mappings: &ProtocolMappings) -> [UpdateBlock; 2] {
        block_updates(registries, mappings, self.pos, self.original)
    }
}
