//! One Bedrock client bridged to one Java connection.
//!
//! A [`Session`] is owned by a single actor task. Everything else talks to it
//! through a [`SessionHandle`], which queues jobs on that task; jobs run in
//! submission order and never concurrently.

use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use mc_bridge_proto::bedrock::{
    encode_packet, is_supported_protocol, BedrockPacket, Disconnect, Login, NetworkChunkPublisherUpdate,
    NetworkSettings, PlayStatus, RequestNetworkSettings, Serverbound, Text, CANONICAL_PROTOCOL,
};
use mc_bridge_proto::java::play::PlayClientbound;
use mc_bridge_proto::java::{encode_serverbound, JavaServerbound};
use mc_bridge_proto::jwt::{extract_client_data, extract_identity, ClientData, Identity};
use mc_bridge_proto::types::{BlockPos, ChunkPos, Vec3};
use mc_bridge_world::{BlockMappings, ItemMappings, ProtocolMappings, Registries};

use crate::cache::{ChunkCache, EntityCache, InventoryCache, PistonCache};
use crate::context::BridgeContext;
use crate::dispatch::{DispatchOutcome, DispatchTarget};
use crate::error::BridgeError;
use crate::world_manager::GameMode;

/// Work run on the session's own task.
pub type Job = Box<dyn FnOnce(&mut Session) + Send>;

const TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SessionPhase {
    Connecting,
    Authenticating,
    Configuring,
    Playing,
    Disconnecting,
    Closed,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Configuring => "configuring",
            Self::Playing => "playing",
            Self::Disconnecting => "disconnecting",
            Self::Closed => "closed",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Connecting,
            1 => Self::Authenticating,
            2 => Self::Configuring,
            3 => Self::Playing,
            4 => Self::Disconnecting,
            _ => Self::Closed,
        }
    }
}

/// Frames leaving the bridge towards one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Packet(Bytes),
    /// Everything after this is compressed.
    EnableCompression,
    Close(String),
}

/// The Bedrock client. Packets are unbatched game packets.
pub trait DownstreamSink: Send {
    fn send(&mut self, packet: Bytes);

    fn enable_compression(&mut self) {}

    fn close(&mut self, reason: &str);
}

/// The Java server. Packets are an id followed by the body, unframed.
pub trait UpstreamSink: Send {
    fn send(&mut self, packet: Bytes);

    fn close(&mut self);
}

impl DownstreamSink for mpsc::UnboundedSender<Outbound> {
    fn send(&mut self, packet: Bytes) {
        let _ = mpsc::UnboundedSender::send(self, Outbound::Packet(packet));
    }

    fn enable_compression(&mut self) {
        let _ = mpsc::UnboundedSender::send(self, Outbound::EnableCompression);
    }

    fn close(&mut self, reason: &str) {
        let _ = mpsc::UnboundedSender::send(self, Outbound::Close(reason.to_owned()));
    }
}

impl UpstreamSink for mpsc::UnboundedSender<Outbound> {
    fn send(&mut self, packet: Bytes) {
        let _ = mpsc::UnboundedSender::send(self, Outbound::Packet(packet));
    }

    fn close(&mut self) {
        let _ = mpsc::UnboundedSender::send(self, Outbound::Close(String::new()));
    }
}

/// Lifecycle notifications for the transport layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Login accepted; the upstream connection should be opened.
    Authenticated {
        session: SessionHandle,
        identity: Identity,
        protocol: u32,
    },
    Closed {
        session: u64,
        addr: SocketAddr,
        reason: String,
    },
}

/// Cheap, cloneable reference to a session's task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: u64,
    addr: SocketAddr,
    jobs: mpsc::UnboundedSender<Job>,
    valid: Arc<AtomicBool>,
    phase: Arc<AtomicU8>,
}

impl SessionHandle {
    /// A handle with no task behind it. Every job submitted to it is dropped.
    pub fn detached(id: u64) -> Self {
        let (jobs, _) = mpsc::unbounded_channel();
        Self {
            id,
            addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            jobs,
            valid: Arc::new(AtomicBool::new(true)),
            phase: Arc::new(AtomicU8::new(SessionPhase::Connecting as u8)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queues `job` on the session's task. Never blocks; returns false when
    /// the session is gone.
    pub fn execute_in_event_loop<F>(&self, job: F) -> bool
    where
        F: FnOnce(&mut Session) + Send + 'static,
    {
        self.is_valid() && self.jobs.send(Box::new(job)).is_ok()
    }

    /// Cleared when the session starts disconnecting. Work resuming after an
    /// await checks this before touching the session.
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn disconnect(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        self.execute_in_event_loop(move |s| s.disconnect(reason))
    }

    pub fn send_message(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        self.execute_in_event_loop(move |s| s.send_downstream(&Text::system(message)))
    }
}

/// Java dimension and its Bedrock counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
    End,
}

impl Dimension {
    pub fn from_java(name: &str) -> Self {
        match name {
            "minecraft:the_nether" => Self::Nether,
            "minecraft:the_end" => Self::End,
            _ => Self::Overworld,
        }
    }

    pub fn java_min_y(self) -> i32 {
        match self {
            Self::Overworld => -64,
            Self::Nether | Self::End => 0,
        }
    }

    pub fn java_sections(self) -> usize {
        match self {
            Self::Overworld => 24,
            Self::Nether | Self::End => 16,
        }
    }

    pub fn bedrock_id(self) -> i32 {
        match self {
            Self::Overworld => 0,
            Self::Nether => 1,
            Self::End => 2,
        }
    }

    /// Bedrock renders the nether only up to y 128.
    pub fn bedrock_sections(self) -> usize {
        match self {
            Self::Nether => 8,
            _ => self.java_sections(),
        }
    }

    /// Section y index of the bottom section.
    pub fn bottom_index(self) -> i8 {
        (self.java_min_y() >> 4) as i8
    }
}

pub struct Session {
    id: u64,
    addr: SocketAddr,
    phase: SessionPhase,
    handle: SessionHandle,
    identity: Option<Identity>,
    client_data: ClientData,
    protocol: u32,
    network_settings_sent: bool,
    context: Arc<BridgeContext>,
    mappings: Arc<ProtocolMappings>,
    downstream: Box<dyn DownstreamSink>,
    upstream: Option<Box<dyn UpstreamSink>>,
    events: mpsc::UnboundedSender<SessionEvent>,

    chunks: ChunkCache,
    entities: EntityCache,
    inventory: InventoryCache,
    pistons: PistonCache,

    java_entity_id: i32,
    position: Vec3,
    game_mode: GameMode,
    dimension: Dimension,
    last_chunk: Option<ChunkPos>,
    render_distance: i32,
    biomes: Vec<u32>,
    spawned: bool,
}

impl DispatchTarget for Session {
    fn session_id(&self) -> u64 {
        self.id
    }
}

impl Session {
    fn new(
        context: Arc<BridgeContext>,
        handle: SessionHandle,
        downstream: Box<dyn DownstreamSink>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Self, BridgeError> {
        let mappings = context.registries.mappings(CANONICAL_PROTOCOL)?;
        let dimension = Dimension::default();
        let render_distance = context.settings.render_distance_cap;
        Ok(Self {
            id: handle.id,
            addr: handle.addr,
            phase: SessionPhase::Connecting,
            handle,
            identity: None,
            client_data: ClientData::default(),
            protocol: CANONICAL_PROTOCOL,
            network_settings_sent: false,
            context,
            mappings,
            downstream,
            upstream: None,
            events,
            chunks: ChunkCache::new(dimension.java_min_y(), dimension.java_sections()),
            entities: EntityCache::default(),
            inventory: InventoryCache::default(),
            pistons: PistonCache::default(),
            java_entity_id: 0,
            position: Vec3::default(),
            game_mode: GameMode::default(),
            dimension,
            last_chunk: None,
            render_distance,
            biomes: Vec::new(),
            spawned: false,
        })
    }

    /// A session driven directly by the caller, without a task.
    #[cfg(test)]
    pub(crate) fn detached(
        context: Arc<BridgeContext>,
        id: u64,
        downstream: Box<dyn DownstreamSink>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Self, BridgeError> {
        Self::new(context, SessionHandle::detached(id), downstream, events)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            debug!(session = self.id, from = self.phase.as_str(), to = phase.as_str(), "phase change");
        }
        self.phase = phase;
        self.handle.phase.store(phase as u8, Ordering::Release);
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn client_data(&self) -> &ClientData {
        &self.client_data
    }

    pub fn protocol(&self) -> u32 {
        self.protocol
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.context
    }

    pub fn registries(&self) -> &Registries {
        &self.context.registries
    }

    pub fn mappings(&self) -> &Arc<ProtocolMappings> {
        &self.mappings
    }

    pub fn block_mappings(&self) -> &BlockMappings {
        &self.mappings.blocks
    }

    pub fn item_mappings(&self) -> &ItemMappings {
        &self.mappings.items
    }

    pub fn chunk_cache(&self) -> &ChunkCache {
        &self.chunks
    }

    pub fn chunk_cache_mut(&mut self) -> &mut ChunkCache {
        &mut self.chunks
    }

    pub fn entity_cache(&self) -> &EntityCache {
        &self.entities
    }

    pub fn entity_cache_mut(&mut self) -> &mut EntityCache {
        &mut self.entities
    }

    pub fn inventory(&self) -> &InventoryCache {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut InventoryCache {
        &mut self.inventory
    }

    pub fn piston_cache(&self) -> &PistonCache {
        &self.pistons
    }

    pub fn piston_cache_mut(&mut self) -> &mut PistonCache {
        &mut self.pistons
    }

    pub fn java_entity_id(&self) -> i32 {
        self.java_entity_id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn game_mode(&self) -> GameMode {
        self.game_mode
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn render_distance(&self) -> i32 {
        self.render_distance
    }

    /// Bedrock biome ids indexed by Java biome registry id.
    pub fn biomes(&self) -> &[u32] {
        &self.biomes
    }

    /// Java block state at `pos`, through the world manager.
    pub fn block_at(&self, pos: BlockPos) -> u32 {
        let world = Arc::clone(&self.context.world);
        world.block_at(self, pos)
    }

    pub fn send_downstream<P: BedrockPacket>(&mut self, packet: &P) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        trace!(session = self.id, packet = P::NAME, "downstream");
        self.downstream.send(encode_packet(packet, self.protocol));
    }

    pub fn send_upstream<P: JavaServerbound>(&mut self, packet: &P) {
        match self.upstream.as_mut() {
            Some(upstream) => upstream.send(encode_serverbound(packet)),
            None => debug!(session = self.id, id = P::ID, "no upstream connection, packet dropped"),
        }
    }

    /// Tears down both sides and deregisters. Safe to call more than once.
    pub fn disconnect(&mut self, reason: impl Into<String>) {
        if self.phase >= SessionPhase::Disconnecting {
            return;
        }
        let reason = reason.into();
        info!(session = self.id, %reason, "disconnecting");
        self.set_phase(SessionPhase::Disconnecting);
        self.handle.valid.store(false, Ordering::Release);

        self.send_downstream(&Disconnect::message(reason.clone()));
        self.downstream.close(&reason);
        if let Some(mut upstream) = self.upstream.take() {
            upstream.close();
        }
        if self.identity.is_some() {
            self.context.sessions.remove(self.id);
        }
        self.chunks.clear();
        self.entities.clear();
        self.pistons.clear();

        self.set_phase(SessionPhase::Closed);
        let _ = self.events.send(SessionEvent::Closed {
            session: self.id,
            addr: self.addr,
            reason,
        });
    }

    /// Disconnects for a fatal translator error.
    fn fail(&mut self, packet: &'static str, e: BridgeError) {
        error!(session = self.id, packet, error = %e, "session aborted by translator");
        let reason = match &e {
            BridgeError::CorruptState(_) => "Internal error".to_owned(),
            BridgeError::PhaseViolation { .. } => format!("Protocol error: {e}"),
            _ => e.to_string(),
        };
        self.disconnect(reason);
    }

    fn violation(&mut self, packet: &'static str) {
        let e = BridgeError::PhaseViolation {
            phase: self.phase.as_str(),
            packet,
        };
        self.fail(packet, e);
    }

    /// One game packet from the Bedrock client.
    pub fn handle_bedrock(&mut self, raw: Bytes) {
        if self.phase >= SessionPhase::Disconnecting {
            return;
        }
        let packet = match Serverbound::decode(raw, self.protocol) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(session = self.id, error = %e, "undecodable bedrock packet dropped");
                return;
            }
        };
        match (self.phase, packet) {
            (SessionPhase::Connecting, Serverbound::RequestNetworkSettings(request)) if !self.network_settings_sent => {
                self.on_request_network_settings(request)
            }
            (SessionPhase::Connecting, Serverbound::Login(login)) if self.network_settings_sent => self.on_login(login),
            (_, packet @ (Serverbound::RequestNetworkSettings(_) | Serverbound::Login(_))) => {
                self.violation(packet.name())
            }
            (SessionPhase::Playing, packet) => {
                let context = Arc::clone(&self.context);
                let name = packet.name();
                match context.translators.bedrock.dispatch(self, name, &packet) {
                    Ok(DispatchOutcome::PassThrough) => trace!(session = self.id, id = packet.id(), "no bedrock translator"),
                    Ok(_) => {}
                    Err(e) => self.fail(name, e),
                }
            }
            (phase, packet) => {
                debug!(session = self.id, phase = phase.as_str(), packet = packet.name(), "packet dropped outside play");
            }
        }
    }

    fn on_request_network_settings(&mut self, request: RequestNetworkSettings) {
        if !is_supported_protocol(request.protocol) {
            let status = if request.protocol < CANONICAL_PROTOCOL {
                PlayStatus::FailedClient
            } else {
                PlayStatus::FailedServer
            };
            warn!(session = self.id, protocol = request.protocol, "unsupported protocol");
            self.send_downstream(&status);
            self.disconnect(format!("Unsupported protocol {}", request.protocol));
            return;
        }
        match self.context.registries.mappings(request.protocol) {
            Ok(mappings) => self.mappings = mappings,
            Err(e) => {
                self.fail("RequestNetworkSettings", e.into());
                return;
            }
        }
        self.protocol = request.protocol;
        let settings = NetworkSettings {
            compression_threshold: self.context.settings.compression_threshold,
            compression: self.context.settings.compression,
            ..NetworkSettings::default()
        };
        self.send_downstream(&settings);
        self.downstream.enable_compression();
        self.network_settings_sent = true;
    }

    fn on_login(&mut self, login: Login) {
        if login.protocol != self.protocol {
            debug!(session = self.id, requested = self.protocol, login = login.protocol, "login protocol differs");
        }
        let identity = match extract_identity(&login.chain) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(session = self.id, error = %e, "rejected login");
                self.disconnect("Invalid login data");
                return;
            }
        };
        self.client_data = extract_client_data(&login.client_data).unwrap_or_else(|e| {
            debug!(session = self.id, error = %e, "client data unreadable");
            ClientData::default()
        });
        let sessions = &self.context.sessions;
        if sessions.count() >= self.context.settings.max_players && sessions.by_uuid(identity.uuid).is_none() {
            self.send_downstream(&PlayStatus::FailedServerFull);
            self.disconnect("Server is full");
            return;
        }

        info!(session = self.id, name = %identity.display_name, xuid = %identity.xuid, "logged in");
        self.set_phase(SessionPhase::Authenticating);
        self.identity = Some(identity.clone());
        if let Some(previous) = self.context.sessions.insert(self.handle.clone(), identity.clone()) {
            previous.handle.disconnect("Logged in from another location");
        }
        self.send_downstream(&PlayStatus::LoginSuccess);
        let _ = self.events.send(SessionEvent::Authenticated {
            session: self.handle.clone(),
            identity,
            protocol: self.protocol,
        });
    }

    /// The Java connection finished logging in and entered configuration.
    pub fn attach_upstream(&mut self, mut upstream: Box<dyn UpstreamSink>) {
        if self.phase != SessionPhase::Authenticating {
            upstream.close();
            return;
        }
        self.upstream = Some(upstream);
        self.set_phase(SessionPhase::Configuring);
    }

    /// Java biome registry entries in registry order.
    pub fn set_biome_registry(&mut self, names: &[String]) {
        self.biomes = self.context.registries.biome_table(names);
    }

    pub fn finish_configuration(&mut self) {
        if self.phase == SessionPhase::Configuring {
            self.set_phase(SessionPhase::Playing);
        }
    }

    /// One play packet from the Java server, id included.
    pub fn handle_java(&mut self, raw: Bytes) {
        if self.phase >= SessionPhase::Disconnecting {
            return;
        }
        let packet = match PlayClientbound::decode(raw) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(session = self.id, error = %e, "undecodable java packet dropped");
                return;
            }
        };
        let name = packet.name();
        if self.phase != SessionPhase::Playing {
            debug!(session = self.id, phase = self.phase.as_str(), packet = name, "java packet dropped outside play");
            return;
        }
        let context = Arc::clone(&self.context);
        match context.translators.java.dispatch(self, name, &packet) {
            Ok(DispatchOutcome::PassThrough) => trace!(session = self.id, packet = name, "no java translator"),
            Ok(_) => {}
            Err(e) => self.fail(name, e),
        }
    }

    pub(crate) fn set_player(&mut self, java_entity_id: i32, game_mode: GameMode, dimension: Dimension, view_distance: i32) {
        self.java_entity_id = java_entity_id;
        self.game_mode = game_mode;
        self.render_distance = view_distance.clamp(2, self.context.settings.render_distance_cap.max(2));
        let uuid = self.identity.as_ref().map(|i| i.uuid).unwrap_or_default();
        if dimension != self.dimension || self.last_chunk.is_none() {
            self.dimension = dimension;
            self.chunks.set_dimension(dimension.java_min_y(), dimension.java_sections());
            self.entities.clear();
            self.pistons.clear();
            self.last_chunk = None;
        }
        self.entities.set_player(java_entity_id, uuid);
    }

    pub(crate) fn set_position(&mut self, position: Vec3) {
        self.position = position;
        if let Some(player) = self.entities.get_mut(self.java_entity_id) {
            player.position = position;
        }
    }

    pub(crate) fn mark_spawned(&mut self) -> bool {
        !std::mem::replace(&mut self.spawned, true)
    }

    /// Moves the client's loaded area when the center chunk changes.
    pub(crate) fn update_chunk_publisher(&mut self, center: ChunkPos) {
        if self.last_chunk == Some(center) {
            return;
        }
        self.last_chunk = Some(center);
        let update = NetworkChunkPublisherUpdate {
            pos: BlockPos::new(center.x * 16 + 8, self.position.y.floor() as i32, center.z * 16 + 8),
            radius: (self.render_distance.max(0) as u32) * 16,
            saved_chunks: Vec::new(),
        };
        self.send_downstream(&update);
    }

    /// Per tick work: moving pistons.
    pub fn tick(&mut self) {
        if self.phase != SessionPhase::Playing || self.pistons.is_empty() {
            return;
        }
        let finished = self.pistons.tick(self.position);
        let push = self.pistons.take_displacement();
        if push != Vec3::default() {
            self.set_position(Vec3::new(
                self.position.x + push.x,
                self.position.y + push.y,
                self.position.z + push.z,
            ));
        }
        if finished.is_empty() {
            return;
        }
        let registries = Arc::clone(&self.context.registries);
        let mappings = Arc::clone(&self.mappings);
        for pos in finished {
            let state = self.chunks.get(pos);
            for update in crate::inventory::virtual_block::block_updates(&registries, &mappings, pos, state) {
                self.send_downstream(&update);
            }
        }
    }
}

/// Starts the actor task for a new connection.
pub fn spawn_session(
    context: Arc<BridgeContext>,
    id: u64,
    addr: SocketAddr,
    downstream: Box<dyn DownstreamSink>,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> Result<SessionHandle, BridgeError> {
    let (jobs, queue) = mpsc::unbounded_channel();
    let handle = SessionHandle {
        id,
        addr,
        jobs,
        valid: Arc::new(AtomicBool::new(true)),
        phase: Arc::new(AtomicU8::new(SessionPhase::Connecting as u8)),
    };
    let timeout = context.settings.handshake_timeout;
    let session = Session::new(context, handle.clone(), downstream, events)?;
    tokio::spawn(run(session, queue, timeout));
    Ok(handle)
}

async fn run(mut session: Session, mut queue: mpsc::UnboundedReceiver<Job>, handshake_timeout: Duration) {
    let mut ticker = time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = time::sleep(handshake_timeout);
    tokio::pin!(deadline);
    let mut deadline_armed = true;

    loop {
        tokio::select! {
            job = queue.recv() => {
                let Some(job) = job else { break };
                if catch_unwind(AssertUnwindSafe(|| job(&mut session))).is_err() {
                    error!(session = session.id, "session job panicked");
                    session.disconnect("Internal error");
                }
            }
            _ = ticker.tick() => session.tick(),
            _ = &mut deadline, if deadline_armed => {
                deadline_armed = false;
                if session.phase < SessionPhase::Playing {
                    warn!(session = session.id, phase = session.phase.as_str(), "handshake timed out");
                    session.disconnect("Login timed out");
                }
            }
        }
        if session.phase == SessionPhase::Closed {
            break;
        }
    }
    if session.phase != SessionPhase::Closed {
        session.disconnect("Connection closed");
    }
    debug!(session = session.id, "session task finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bedrock_ids, context, drain, login_packet, playing_session, text_packet};
    use mc_bridge_proto::bedrock::{id, RequestNetworkSettings};

    const LEGACY_PROTOCOL: u32 = 600;

    fn request_settings(protocol: u32) -> Bytes {
        encode_packet(&RequestNetworkSettings { protocol }, CANONICAL_PROTOCOL)
    }

    #[tokio::test]
    async fn login_flow_reaches_authenticating() {
        let (mut session, mut down, _up, mut events) = crate::test_support::session(context());
        session.handle_bedrock(request_settings(CANONICAL_PROTOCOL));
        let out = drain(&mut down);
        assert_eq!(bedrock_ids(&out), vec![id::NETWORK_SETTINGS]);
        assert!(out.contains(&Outbound::EnableCompression));

        session.handle_bedrock(login_packet("Steve", 7));
        assert_eq!(session.phase(), SessionPhase::Authenticating);
        assert_eq!(bedrock_ids(&drain(&mut down)), vec![id::PLAY_STATUS]);
        assert!(matches!(events.try_recv(), Ok(SessionEvent::Authenticated { .. })));
        assert_eq!(session.context().sessions.by_name("steve").map(|s| s.handle.id()), Some(session.id()));
    }

    #[tokio::test]
    async fn unsupported_protocol_is_refused() {
        let (mut session, mut down, _up, _events) = crate::test_support::session(context());
        session.handle_bedrock(request_settings(LEGACY_PROTOCOL));
        assert_eq!(session.phase(), SessionPhase::Closed);
        assert_eq!(bedrock_ids(&drain(&mut down)), vec![id::PLAY_STATUS, id::DISCONNECT]);
    }

    #[tokio::test]
    async fn login_before_network_settings_violates_the_phase() {
        let (mut session, mut down, _up, _events) = crate::test_support::session(context());
        session.handle_bedrock(login_packet("Steve", 7));
        assert_eq!(session.phase(), SessionPhase::Closed);
        let out = drain(&mut down);
        assert!(out.iter().any(|o| matches!(o, Outbound::Close(reason) if reason.starts_with("Protocol error"))));
    }

    #[tokio::test]
    async fn play_packets_before_play_are_dropped() {
        let (mut session, mut down, mut up, _events) = crate::test_support::session(context());
        session.handle_bedrock(request_settings(CANONICAL_PROTOCOL));
        drain(&mut down);
        session.handle_bedrock(text_packet("hello"));
        assert_eq!(session.phase(), SessionPhase::Connecting);
        assert!(drain(&mut down).is_empty());
        assert!(drain(&mut up).is_empty());
    }

    #[tokio::test]
    async fn duplicate_login_kicks_the_first_session() {
        let ctx = context();
        let (mut first, _d1, _u1, _e1) = crate::test_support::session(Arc::clone(&ctx));
        first.handle_bedrock(request_settings(CANONICAL_PROTOCOL));
        first.handle_bedrock(login_packet("Steve", 7));
        let (mut second, _d2, _u2, _e2) = crate::test_support::session(Arc::clone(&ctx));
        second.handle_bedrock(request_settings(CANONICAL_PROTOCOL));
        second.handle_bedrock(login_packet("Steve", 7));
        assert_eq!(ctx.sessions.count(), 1);
        assert_eq!(ctx.sessions.by_name("Steve").map(|s| s.handle.id()), Some(second.id()));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_and_deregisters() {
        let (mut session, mut down, mut up, mut events) = playing_session(context());
        session.disconnect("bye");
        session.disconnect("again");
        assert!(!session.handle().is_valid());
        assert_eq!(session.handle().phase(), SessionPhase::Closed);
        assert!(session.context().sessions.get(session.id()).is_none());
        let out = drain(&mut down);
        assert_eq!(bedrock_ids(&out), vec![id::DISCONNECT]);
        assert_eq!(out.last(), Some(&Outbound::Close("bye".into())));
        assert_eq!(drain(&mut up), vec![Outbound::Close(String::new())]);
        let closed: Vec<SessionEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(closed.iter().filter(|e| matches!(e, SessionEvent::Closed { .. })).count(), 1);
    }

    #[test]
    fn dimension_geometry() {
        assert_eq!(Dimension::from_java("minecraft:the_nether"), Dimension::Nether);
        assert_eq!(Dimension::Overworld.bottom_index(), -4);
        assert_eq!(Dimension::Nether.bedrock_sections(), 8);
        assert_eq!(Dimension::End.bedrock_sections(), 16);
    }

    #[tokio::test]
    async fn handle_jobs_run_in_order_on_the_task() {
        let ctx = context();
        let (down, _down_rx) = mpsc::unbounded_channel::<Outbound>();
        let (events, mut event_rx) = mpsc::unbounded_channel();
        let handle = spawn_session(ctx, 40, SocketAddr::from(([127, 0, 0, 1], 19132)), Box::new(down), events).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        for i in 0..5 {
            let tx = tx.clone();
            assert!(handle.execute_in_event_loop(move |s| {
                let _ = tx.send((i, s.id()));
            }));
        }
        for i in 0..5 {
            assert_eq!(rx.recv().await, Some((i, 40)));
        }
        assert!(handle.disconnect("done"));
        match event_rx.recv().await {
            Some(SessionEvent::Closed { session, reason, .. }) => {
                assert_eq!(session, 40);
                assert_eq!(reason, "done");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!handle.is_valid());
        assert!(!handle.execute_in_event_loop(|_| {}));
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_timeout_closes_idle_sessions() {
        let mut settings = crate::context::BridgeSettings::default();
        settings.handshake_timeout = Duration::from_secs(5);
        let ctx = crate::test_support::context_with(settings);
        let (down, _down_rx) = mpsc::unbounded_channel::<Outbound>();
        let (events, mut event_rx) = mpsc::unbounded_channel();
        let _handle = spawn_session(ctx, 41, SocketAddr::from(([127, 0, 0, 1], 19132)), Box::new(down), events).unwrap();
        match event_rx.recv().await {
            Some(SessionEvent::Closed { reason, .. }) => assert_eq!(reason, "Login timed out"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
