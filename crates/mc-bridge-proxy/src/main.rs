mod admission;
mod config;
mod downstream;
mod status;
mod upstream;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use config::BridgeConfig;
use mc_bridge_core::{spawn_session, BridgeContext, BridgeSettings, SessionEvent, SessionHandle};
use mc_bridge_proto::batch::BatchConfig;
use mc_bridge_raknet::{Listener, ListenerConfig, ListenerEvent, ListenerHandle};
use mc_bridge_world::Registries;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::admission::ProxyAdmission;
use crate::downstream::PeerSink;
use crate::status::Status;

/// Time given to sessions to flush their disconnect before the socket closes.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

struct Link {
    session: SessionHandle,
    inbound: mpsc::UnboundedSender<Bytes>,
}

struct Proxy {
    config: Arc<BridgeConfig>,
    context: Arc<BridgeContext>,
    listener: ListenerHandle,
    links: HashMap<SocketAddr, Link>,
    events: mpsc::UnboundedSender<SessionEvent>,
    batch: BatchConfig,
    next_session: u64,
}

impl Proxy {
    fn shown(&self, addr: SocketAddr) -> String {
        if self.config.logging.log_player_ip_addresses {
            addr.to_string()
        } else {
            "<hidden>".into()
        }
    }

    fn on_listener_event(&mut self, event: ListenerEvent) {
        match event {
            ListenerEvent::Connected { addr, .. } => self.on_connected(addr),
            ListenerEvent::Payload { addr, payload } => {
                if let Some(link) = self.links.get(&addr) {
                    let _ = link.inbound.send(payload);
                }
            }
            ListenerEvent::Disconnected { addr } => {
                if let Some(link) = self.links.remove(&addr) {
                    link.session.disconnect("Client disconnected");
                }
            }
        }
    }

    fn on_connected(&mut self, addr: SocketAddr) {
        self.next_session += 1;
        let id = self.next_session;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let session = match spawn_session(
            Arc::clone(&self.context),
            id,
            addr,
            Box::new(outbound_tx),
            self.events.clone(),
        ) {
            Ok(session) => session,
            Err(e) => {
                error!(session = id, error = %e, "could not start session");
                self.listener.close(addr);
                return;
            }
        };
        info!(session = id, addr = %self.shown(addr), "bedrock client connected");
        let sink = PeerSink {
            listener: self.listener.clone(),
            addr,
        };
        tokio::spawn(downstream::pump(
            sink,
            session.clone(),
            outbound_rx,
            inbound_rx,
            self.batch.clone(),
        ));
        self.links.insert(
            addr,
            Link {
                session,
                inbound: inbound_tx,
            },
        );
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Authenticated { session, identity, protocol } => {
                info!(
                    session = session.id(),
                    name = %identity.display_name,
                    protocol,
                    "connecting player to the java server"
                );
                let remote = Arc::new(self.config.remote.clone());
                let view_distance = self.context.settings.render_distance_cap.clamp(2, 32) as i8;
                tokio::spawn(upstream::run(remote, session, identity, view_distance));
            }
            SessionEvent::Closed { session, addr, reason } => {
                info!(session, addr = %self.shown(addr), %reason, "session closed");
                if self.links.get(&addr).is_some_and(|l| l.session.id() == session) {
                    self.links.remove(&addr);
                }
            }
        }
    }

    fn disconnect_all(&mut self) {
        for (_, link) in self.links.drain() {
            link.session.disconnect("Proxy shutting down");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Arc::new(match BridgeConfig::load("bridge.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load bridge.toml: {e}");
            std::process::exit(1);
        }
    });

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    if let Err(e) = run(config).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(config: Arc<BridgeConfig>) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Bedrock bridge v{} forwarding {}:{} to {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.bedrock.address,
        config.bedrock.port,
        config.remote.address,
        config.remote.port
    );

    let registries = Arc::new(Registries::load()?);
    let compression = config.compression()?;
    let settings = BridgeSettings {
        compression_threshold: config.bedrock.compression_threshold,
        compression,
        max_players: config.bedrock.max_players as usize,
        render_distance_cap: config.session.render_distance_cap,
        handshake_timeout: config.handshake_timeout(),
    };
    let context = Arc::new(BridgeContext::new(registries, settings)?);

    let server_guid: i64 = rand::random();
    let status = Status {
        context: Arc::clone(&context),
        motd: config.bedrock.motd.clone(),
        sub_motd: config.bedrock.sub_motd.clone(),
        max_players: config.bedrock.max_players,
        server_guid,
        port: config.bedrock.port,
    };
    let whitelist = config.whitelist()?;
    if !whitelist.is_empty() {
        info!(ranges = whitelist.len(), "proxy whitelist active");
    }
    let admission = ProxyAdmission::new(whitelist, config.trusted_ranges()?);
    let listener_config = ListenerConfig {
        bind: config.bind_addr()?,
        server_guid,
        max_peers: (config.bedrock.max_players as usize).saturating_mul(2).max(16),
        packets_per_second: config.rate_limit.packets_per_second,
        admission: Arc::new(admission),
        pong: Arc::new(status),
    };
    let (listener, mut listener_events, listener_handle) = Listener::bind(listener_config).await?;

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let (stop_listener_tx, stop_listener_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let (events_tx, mut session_events) = mpsc::unbounded_channel();
    let batch = BatchConfig {
        compression,
        compression_threshold: config.bedrock.compression_threshold as usize,
        ..BatchConfig::default()
    };
    let mut proxy = Proxy {
        config,
        context,
        listener: listener_handle,
        links: HashMap::new(),
        events: events_tx,
        batch,
        next_session: 0,
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = listener_events.recv() => match event {
                    Some(event) => proxy.on_listener_event(event),
                    None => break,
                },
                Some(event) = session_events.recv() => proxy.on_session_event(event),
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        proxy.disconnect_all();
                        tokio::time::sleep(SHUTDOWN_GRACE).await;
                        break;
                    }
                }
            }
        }
        if stop_listener_tx.send(true).is_err() {
            warn!("listener already stopped");
        }
    });

    listener.run(stop_listener_rx).await;
    info!("Bridge shut down.");
    Ok(())
}
