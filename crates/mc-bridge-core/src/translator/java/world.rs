//! Chunks, block changes and pistons.

use std::collections::HashMap;
use std::sync::Arc;

use mc_bridge_proto::bedrock::{LevelChunk, PlayStatus};
use mc_bridge_proto::java::chunk::{read_sections, ChunkData, Palette, PalettedContainer};
use mc_bridge_proto::java::play::{ChunkBatchReceived, PlayClientbound};
use mc_bridge_proto::types::{BlockPos, ChunkPos};
use mc_bridge_world::registry::DEFAULT_BIOME;
use mc_bridge_world::section::{empty_column_payload, expand_biomes, index_yzx_to_xzy, serialize_column};
use mc_bridge_world::storage::SECTION_SIZE;
use mc_bridge_world::{BlockStorage, ChunkSection, ProtocolMappings, Registries};
use tracing::{debug, trace};

use crate::cache::{ChunkColumn, Facing, PistonAction, PistonState};
use crate::context::JavaRegistry;
use crate::dispatch::{HandlerOptions, HandlerState};
use crate::error::BridgeError;
use crate::inventory::virtual_block::block_updates;
use crate::session::Session;

/// Chunks per tick the client asks the server for after each batch.
const CHUNKS_PER_TICK: f32 = 20.0;

pub(super) fn register(registry: &mut JavaRegistry) {
    registry.register("ChunkData", HandlerOptions::tagged("world:chunk"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::ChunkData(chunk) = packet else {
            return Ok(HandlerState::Continue);
        };
        translate_chunk(s, chunk)?;
        Ok(HandlerState::Handled)
    });

    registry.register("UnloadChunk", HandlerOptions::tagged("world:unload"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::UnloadChunk { x, z } = *packet else {
            return Ok(HandlerState::Continue);
        };
        let pos = ChunkPos::new(x, z);
        s.chunk_cache_mut().remove(pos);
        let dimension = s.dimension();
        s.send_downstream(&LevelChunk {
            pos,
            dimension: dimension.bedrock_id(),
            sub_chunk_count: 0,
            payload: empty_column_payload(dimension.bedrock_sections()),
        });
        Ok(HandlerState::Handled)
    });

    registry.register("ChunkBatchFinished", HandlerOptions::tagged("world:batch"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::ChunkBatchFinished { size } = packet else {
            return Ok(HandlerState::Continue);
        };
        trace!(session = s.id(), size, "chunk batch finished");
        s.send_upstream(&ChunkBatchReceived {
            chunks_per_tick: CHUNKS_PER_TICK,
        });
        // the first batch around the player is what the client waits on
        if s.mark_spawned() {
            s.send_downstream(&PlayStatus::PlayerSpawn);
        }
        Ok(HandlerState::Handled)
    });

    registry.register("BlockUpdate", HandlerOptions::tagged("world:block"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::BlockUpdate { pos, state } = *packet else {
            return Ok(HandlerState::Continue);
        };
        change_block(s, pos, state);
        Ok(HandlerState::Handled)
    });

    registry.register("SectionBlocksUpdate", HandlerOptions::tagged("world:section"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SectionBlocksUpdate(changes) = packet else {
            return Ok(HandlerState::Continue);
        };
        for change in changes {
            change_block(s, BlockPos::new(change.x, change.y, change.z), change.state);
        }
        Ok(HandlerState::Handled)
    });

    registry.register("BlockAction", HandlerOptions::tagged("world:piston"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::BlockAction { pos, action, param, .. } = *packet else {
            return Ok(HandlerState::Continue);
        };
        let state = s.chunk_cache().get(pos);
        let Some(sticky) = s.registries().java_block_name(state).and_then(piston_kind) else {
            return Ok(HandlerState::Continue);
        };
        let Some(facing) = Facing::from_java(param) else {
            debug!(session = s.id(), param, "piston with no facing");
            return Ok(HandlerState::Handled);
        };
        let action = match action {
            0 => PistonAction::Extending,
            _ => PistonAction::Retracting,
        };
        s.piston_cache_mut().update(pos, PistonState::new(facing, action, sticky));
        Ok(HandlerState::Handled)
    });

    registry.register("SetCenterChunk", HandlerOptions::tagged("world:center"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SetCenterChunk { x, z } = *packet else {
            return Ok(HandlerState::Continue);
        };
        s.update_chunk_publisher(ChunkPos::new(x, z));
        Ok(HandlerState::Handled)
    });
}

/// `Some(sticky)` for piston bases.
fn piston_kind(name: &str) -> Option<bool> {
    match name.split('[').next() {
        Some("minecraft:piston") => Some(false),
        Some("minecraft:sticky_piston") => Some(true),
        _ => None,
    }
}

fn java_storage(blocks: &PalettedContainer) -> Result<BlockStorage, BridgeError> {
    if let Palette::Single(value) = &blocks.palette {
        return Ok(BlockStorage::singleton((*value).max(0) as u32));
    }
    let values: Vec<u32> = (0..SECTION_SIZE).map(|i| blocks.get(i).max(0) as u32).collect();
    Ok(BlockStorage::from_values(&values)?)
}

/// Java states resolved once per chunk.
struct Resolver<'a> {
    registries: &'a Registries,
    mappings: &'a ProtocolMappings,
    seen: HashMap<u32, (u32, bool)>,
}

impl Resolver<'_> {
    fn resolve(&mut self, java: u32) -> (u32, bool) {
        let (registries, mappings) = (self.registries, self.mappings);
        *self.seen.entry(java).or_insert_with(|| {
            (
                registries.resolve_block(mappings, java),
                mappings.blocks.is_waterlogged(java),
            )
        })
    }
}

fn bedrock_section(blocks: &PalettedContainer, resolver: &mut Resolver<'_>) -> Result<ChunkSection, BridgeError> {
    let air = resolver.mappings.blocks.air_id();
    let water = resolver.mappings.blocks.water_id();

    if let Palette::Single(value) = &blocks.palette {
        let java = (*value).max(0) as u32;
        if java == 0 {
            return Ok(ChunkSection::default());
        }
        let (block, waterlogged) = resolver.resolve(java);
        let mut layers = vec![BlockStorage::singleton(block)];
        if waterlogged {
            layers.push(BlockStorage::singleton(water));
        }
        return Ok(ChunkSection::with_layers(layers));
    }

    let mut layer0 = vec![air; SECTION_SIZE];
    let mut layer1: Option<Vec<u32>> = None;
    for yzx in 0..SECTION_SIZE {
        let (block, waterlogged) = resolver.resolve(blocks.get(yzx).max(0) as u32);
        let xzy = index_yzx_to_xzy(yzx);
        layer0[xzy] = block;
        if waterlogged {
            layer1.get_or_insert_with(|| vec![air; SECTION_SIZE])[xzy] = water;
        }
    }
    let mut layers = vec![BlockStorage::from_values(&layer0)?];
    if let Some(liquid) = layer1 {
        layers.push(BlockStorage::from_values(&liquid)?);
    }
    Ok(ChunkSection::with_layers(layers))
}

fn translate_chunk(s: &mut Session, chunk: &ChunkData) -> Result<(), BridgeError> {
    let dimension = s.dimension();
    let sections = read_sections(&chunk.data, dimension.java_sections())?;
    let pos = ChunkPos::new(chunk.x, chunk.z);

    let cached = sections
        .iter()
        .map(|section| java_storage(&section.blocks))
        .collect::<Result<Vec<_>, _>>()?;
    s.chunk_cache_mut().insert(pos, ChunkColumn::new(cached));

    let context = Arc::clone(s.context());
    let mappings = Arc::clone(s.mappings());
    let mut resolver = Resolver {
        registries: &context.registries,
        mappings: &mappings,
        seen: HashMap::new(),
    };

    let count = dimension.bedrock_sections().min(sections.len());
    let mut bedrock = Vec::with_capacity(count);
    let mut biomes = Vec::with_capacity(count);
    for section in &sections[..count] {
        bedrock.push(bedrock_section(&section.blocks, &mut resolver)?);
        let mut cells = [DEFAULT_BIOME; 64];
        for (i, cell) in cells.iter_mut().enumerate() {
            let java = section.biomes.get(i);
            *cell = usize::try_from(java)
                .ok()
                .and_then(|id| s.biomes().get(id).copied())
                .unwrap_or(DEFAULT_BIOME);
        }
        biomes.push(expand_biomes(&cells));
    }

    let column = serialize_column(&bedrock, &biomes, dimension.bottom_index());
    trace!(session = s.id(), x = chunk.x, z = chunk.z, sub_chunks = column.sub_chunk_count, "chunk");
    s.send_downstream(&LevelChunk {
        pos,
        dimension: dimension.bedrock_id(),
        sub_chunk_count: column.sub_chunk_count,
        payload: column.payload,
    });
    Ok(())
}

fn change_block(s: &mut Session, pos: BlockPos, state: i32) {
    let state = state.max(0) as u32;
    s.chunk_cache_mut().set(pos, state);

    // the client keeps seeing the container block until it closes
    let fake = s
        .inventory_mut()
        .open_mut()
        .and_then(|open| open.fake_blocks.iter_mut().find(|fake| fake.pos == pos));
    if let Some(fake) = fake {
        fake.original = state;
        return;
    }

    let context = Arc::clone(s.context());
    if context
        .registries
        .java_block_name(state)
        .is_some_and(|name| name.starts_with("minecraft:moving_piston"))
    {
        return;
    }
    let mappings = Arc::clone(s.mappings());
    for update in block_updates(&context.registries, &mappings, pos, state) {
        s.send_downstream(&update);
    }
}
