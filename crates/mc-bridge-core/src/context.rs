//! State shared by every session: registries, translator tables, the
//! session registry and host collaborators.

use std::sync::Arc;
use std::time::Duration;

use mc_bridge_proto::bedrock::Serverbound;
use mc_bridge_proto::compression::CompressionAlgorithm;
use mc_bridge_proto::java::play::PlayClientbound;
use mc_bridge_world::Registries;

use crate::command::CommandBridge;
use crate::dispatch::{Dispatcher, TranslatorRegistry};
use crate::error::BridgeError;
use crate::session::Session;
use crate::session_registry::SessionRegistry;
use crate::translator;
use crate::world_manager::{CachedWorldManager, WorldManager};

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// Bedrock batches smaller than this are sent uncompressed.
    pub compression_threshold: u16,
    pub compression: CompressionAlgorithm,
    pub max_players: usize,
    /// Upper bound on the view distance the Java server may impose, in chunks.
    pub render_distance_cap: i32,
    /// Time allowed from connection to the first play packet.
    pub handshake_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            compression_threshold: 256,
            compression: CompressionAlgorithm::Deflate,
            max_players: 100,
            render_distance_cap: 16,
            handshake_timeout: Duration::from_secs(30),
        }
    }
}

pub type JavaRegistry = TranslatorRegistry<Session, PlayClientbound>;
pub type BedrockRegistry = TranslatorRegistry<Session, Serverbound>;

/// Frozen translator tables for both directions.
pub struct Translators {
    pub java: Dispatcher<Session, PlayClientbound>,
    pub bedrock: Dispatcher<Session, Serverbound>,
}

impl Translators {
    pub fn with_defaults() -> Result<Self, BridgeError> {
        Self::build(|_, _| {})
    }

    /// Default translators plus whatever `extra` registers on top.
    pub fn build(extra: impl FnOnce(&mut JavaRegistry, &mut BedrockRegistry)) -> Result<Self, BridgeError> {
        let mut java = JavaRegistry::new();
        let mut bedrock = BedrockRegistry::new();
        translator::register_defaults(&mut java, &mut bedrock);
        extra(&mut java, &mut bedrock);
        Ok(Self {
            java: java.build()?,
            bedrock: bedrock.build()?,
        })
    }
}

pub struct BridgeContext {
    pub registries: Arc<Registries>,
    pub translators: Translators,
    pub sessions: SessionRegistry,
    pub commands: CommandBridge,
    pub world: Arc<dyn WorldManager>,
    pub settings: BridgeSettings,
}

impl BridgeContext {
    pub fn new(registries: Arc<Registries>, settings: BridgeSettings) -> Result<Self, BridgeError> {
        Ok(Self::with_parts(
            registries,
            Translators::with_defaults()?,
            CommandBridge::default(),
            Arc::new(CachedWorldManager),
            settings,
        ))
    }

    pub fn with_parts(
        registries: Arc<Registries>,
        translators: Translators,
        commands: CommandBridge,
        world: Arc<dyn WorldManager>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            registries,
            translators,
            sessions: SessionRegistry::new(),
            commands,
            world,
            settings,
        }
    }
}
