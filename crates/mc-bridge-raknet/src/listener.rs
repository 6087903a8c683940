use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::admission::AdmissionPolicy;
use crate::constants::*;
use crate::error::RakNetError;
use crate::packet::frame::{Acknowledgement, FrameSet, Reliability};
use crate::packet::offline::{OfflineReply, OfflineRequest};
use crate::packet::online::{self, Control};
use crate::packet::FRAMESET_IDS;
use crate::peer::{Peer, PeerState};
use crate::pong::PongProvider;
use crate::rate_limit::{RateDecision, RateLimiter};

/// What the listener reports to the layer above.
#[derive(Debug)]
pub enum ListenerEvent {
    Connected { addr: SocketAddr, guid: i64 },
    Disconnected { addr: SocketAddr },
    /// A complete game payload, 0xFE wrapper included.
    Payload { addr: SocketAddr, payload: Bytes },
}

#[derive(Debug)]
enum Command {
    Send {
        addr: SocketAddr,
        payload: Bytes,
        reliability: Reliability,
        channel: u8,
    },
    Close {
        addr: SocketAddr,
    },
}

/// Cloneable handle used by sessions to reach their peer.
#[derive(Clone)]
pub struct ListenerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ListenerHandle {
    /// Queue a game payload. The 0xFE wrapper must already be present.
    pub fn send(&self, addr: SocketAddr, payload: Bytes, reliability: Reliability, channel: u8) {
        let _ = self.commands.send(Command::Send {
            addr,
            payload,
            reliability,
            channel,
        });
    }

    /// Flush outstanding data, notify the client and forget the peer.
    pub fn close(&self, addr: SocketAddr) {
        let _ = self.commands.send(Command::Close { addr });
    }
}

pub struct ListenerConfig {
    pub bind: SocketAddr,
    pub server_guid: i64,
    pub max_peers: usize,
    /// Datagrams one address may send per second before the multiplier applies.
    pub packets_per_second: u32,
    pub admission: Arc<dyn AdmissionPolicy>,
    pub pong: Arc<dyn PongProvider>,
}

pub struct Listener {
    socket: UdpSocket,
    config: ListenerConfig,
    peers: HashMap<SocketAddr, Peer>,
    limiter: RateLimiter,
    events: mpsc::UnboundedSender<ListenerEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Listener {
    pub async fn bind(
        config: ListenerConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ListenerEvent>, ListenerHandle), RakNetError> {
        let socket = UdpSocket::bind(config.bind).await?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        info!("Bedrock listener bound on {}", socket.local_addr()?);
        let limiter = RateLimiter::new(config.packets_per_second, Duration::from_secs(1));
        Ok((
            Self {
                socket,
                config,
                peers: HashMap::new(),
                limiter,
                events: event_tx,
                commands: command_rx,
            },
            event_rx,
            ListenerHandle {
                commands: command_tx,
            },
        ))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RakNetError> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0u8; RECV_BUFFER];
        let mut tick = tokio::time::interval(TICK_INTERVAL);
        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, addr)) => {
                        if let Err(e) = self.on_datagram(&buf[..len], addr).await {
                            trace!(%addr, "bad datagram: {e}");
                        }
                    }
                    Err(e) => warn!("UDP receive failed: {e}"),
                },
                Some(command) = self.commands.recv() => self.on_command(command).await,
                _ = tick.tick() => self.tick().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.close_all().await;
                        info!("Bedrock listener stopped");
                        return;
                    }
                }
            }
        }
    }

    async fn on_command(&mut self, command: Command) {
        match command {
            Command::Send {
                addr,
                payload,
                reliability,
                channel,
            } => {
                if let Some(peer) = self.peers.get_mut(&addr) {
                    peer.enqueue(payload, reliability, channel);
                }
            }
            Command::Close { addr } => {
                if let Some(mut peer) = self.peers.remove(&addr) {
                    peer.enqueue(Control::Disconnect.encode().freeze(), Reliability::ReliableOrdered, 0);
                    self.flush(&mut peer).await;
                    debug!(%addr, "peer closed by session");
                }
            }
        }
    }

    async fn on_datagram(&mut self, data: &[u8], addr: SocketAddr) -> Result<(), RakNetError> {
        let Some(&id) = data.first() else {
            return Ok(());
        };

        // unknown addresses are screened before the limiter tracks them
        if !self.peers.contains_key(&addr) && !self.config.admission.on_connection_request(&addr) {
            return self.refuse(id, addr).await;
        }

        let multiplier = self.config.admission.address_multiplier(&addr.ip());
        match self.limiter.check(addr.ip(), multiplier, Instant::now()) {
            RateDecision::Allow => {}
            RateDecision::Exceeded => {
                warn!(
                    ip = %addr.ip(),
                    limit = self.limiter.effective_limit(multiplier),
                    "address exceeded the packet limit, ignoring it for this window"
                );
                return Ok(());
            }
            RateDecision::Drop => return Ok(()),
        }

        if FRAMESET_IDS.contains(&id) {
            return self.on_frameset(data, addr).await;
        }
        match id {
            Acknowledgement::ACK_ID | Acknowledgement::NACK_ID => {
                let ack = Acknowledgement::decode(data)?;
                if let Some(peer) = self.peers.get_mut(&addr) {
                    peer.last_seen = Instant::now();
                    if ack.negative {
                        peer.on_nack(&ack);
                    } else {
                        peer.on_ack(&ack);
                    }
                }
                Ok(())
            }
            _ => self.on_offline(OfflineRequest::decode(data)?, addr).await,
        }
    }

    /// Connection attempts from refused addresses learn they are banned;
    /// anything else they send is ignored.
    async fn refuse(&self, id: u8, addr: SocketAddr) -> Result<(), RakNetError> {
        use crate::packet::offline::id::{OPEN_CONNECTION_REQUEST_1, OPEN_CONNECTION_REQUEST_2};
        if id == OPEN_CONNECTION_REQUEST_1 || id == OPEN_CONNECTION_REQUEST_2 {
            debug!(%addr, "connection request refused");
            let reply = OfflineReply::ConnectionBanned {
                server_guid: self.config.server_guid,
            };
            self.socket.send_to(&reply.encode(), addr).await?;
        }
        Ok(())
    }

    async fn on_offline(&mut self, req: OfflineRequest, addr: SocketAddr) -> Result<(), RakNetError> {
        let guid = self.config.server_guid;
        let reply = match req {
            OfflineRequest::Ping { timestamp, .. } => {
                let motd = self.config.pong.pong(&addr).to_motd_string();
                OfflineReply::Pong {
                    timestamp,
                    server_guid: guid,
                    motd,
                }
            }
            OfflineRequest::OpenConnection1 { protocol, mtu } => {
                if protocol != RAKNET_PROTOCOL_VERSION {
                    debug!(%addr, protocol, "incompatible RakNet protocol");
                    OfflineReply::IncompatibleProtocol {
                        protocol: RAKNET_PROTOCOL_VERSION,
                        server_guid: guid,
                    }
                } else {
                    OfflineReply::OpenConnection1 {
                        server_guid: guid,
                        mtu: mtu.clamp(MIN_MTU, MAX_MTU),
                    }
                }
            }
            OfflineRequest::OpenConnection2 {
                mtu, client_guid, ..
            } => {
                if self.peers.contains_key(&addr) {
                    // Retransmitted request; answer again without reallocating.
                    OfflineReply::OpenConnection2 {
                        server_guid: guid,
                        client_address: addr,
                        mtu: mtu.clamp(MIN_MTU, MAX_MTU),
                    }
                } else if self.peers.len() >= self.config.max_peers {
                    debug!(%addr, "peer table full");
                    return Ok(());
                } else {
                    let peer = Peer::new(addr, client_guid, mtu);
                    let mtu = peer.mtu;
                    self.peers.insert(addr, peer);
                    OfflineReply::OpenConnection2 {
                        server_guid: guid,
                        client_address: addr,
                        mtu,
                    }
                }
            }
        };
        self.socket.send_to(&reply.encode(), addr).await?;
        Ok(())
    }

    async fn on_frameset(&mut self, data: &[u8], addr: SocketAddr) -> Result<(), RakNetError> {
        let Some(peer) = self.peers.get_mut(&addr) else {
            return Ok(());
        };
        let set = FrameSet::decode(data)?;
        let bodies = peer.accept(set);

        for body in bodies {
            let Some(&kind) = body.first() else {
                continue;
            };
            if kind == GAME_PACKET_ID {
                let connected = self
                    .peers
                    .get(&addr)
                    .is_some_and(|p| p.state == PeerState::Connected);
                if connected {
                    let _ = self.events.send(ListenerEvent::Payload {
                        addr,
                        payload: body,
                    });
                }
                continue;
            }
            match Control::decode(&body) {
                Ok(control) => {
                    if !self.on_control(control, addr).await {
                        return Ok(());
                    }
                }
                Err(e) => trace!(%addr, id = kind, "ignoring control message: {e}"),
            }
        }
        Ok(())
    }

    /// Handle one control message. Returns `false` once the peer is gone.
    async fn on_control(&mut self, control: Control, addr: SocketAddr) -> bool {
        let Some(peer) = self.peers.get_mut(&addr) else {
            return false;
        };
        match control {
            Control::ConnectionRequest {
                client_guid,
                timestamp,
            } => {
                peer.guid = client_guid;
                peer.state = PeerState::Accepting;
                let accepted = Control::ConnectionAccepted {
                    client_address: addr,
                    request_timestamp: timestamp,
                    accept_timestamp: unix_millis(),
                };
                peer.enqueue(accepted.encode().freeze(), Reliability::ReliableOrdered, 0);
            }
            Control::NewIncomingConnection { .. } => {
                if peer.state != PeerState::Connected {
                    peer.state = PeerState::Connected;
                    let guid = peer.guid;
                    debug!(%addr, guid, "RakNet connection established");
                    let _ = self.events.send(ListenerEvent::Connected { addr, guid });
                }
            }
            Control::Ping { timestamp } => {
                let pong = Control::Pong {
                    ping_timestamp: timestamp,
                    pong_timestamp: unix_millis(),
                };
                peer.enqueue(pong.encode().freeze(), Reliability::Unreliable, 0);
            }
            Control::Pong { .. } => {}
            Control::Disconnect => {
                let was_connected = peer.state == PeerState::Connected;
                self.peers.remove(&addr);
                debug!(%addr, "client closed the connection");
                if was_connected {
                    let _ = self.events.send(ListenerEvent::Disconnected { addr });
                }
                return false;
            }
            Control::ConnectionAccepted { .. } => {
                trace!(%addr, "unexpected {} from client", online::id::CONNECTION_REQUEST_ACCEPTED);
            }
        }
        true
    }

    async fn tick(&mut self) {
        let now = Instant::now();
        let mut outbound = Vec::new();
        let mut dead = Vec::new();

        for (addr, peer) in &mut self.peers {
            if peer.timed_out(now) {
                dead.push((*addr, peer.state == PeerState::Connected));
                continue;
            }
            if peer.needs_ping(now) {
                let ping = Control::Ping {
                    timestamp: unix_millis(),
                };
                peer.enqueue(ping.encode().freeze(), Reliability::Unreliable, 0);
                peer.last_ping = now;
            }
            peer.resend_expired(now);
            peer.expire_splits();
            outbound.extend(peer.take_acknowledgements().into_iter().map(|d| (*addr, d)));
            outbound.extend(peer.drain_datagrams(now).into_iter().map(|d| (*addr, d)));
        }

        for (addr, datagram) in outbound {
            if let Err(e) = self.socket.send_to(&datagram, addr).await {
                trace!(%addr, "send failed: {e}");
            }
        }

        for (addr, was_connected) in dead {
            self.peers.remove(&addr);
            if was_connected {
                info!(%addr, "connection timed out");
                let _ = self.events.send(ListenerEvent::Disconnected { addr });
            }
        }
        self.limiter.sweep(now);
    }

    async fn flush(&self, peer: &mut Peer) {
        for datagram in peer.drain_datagrams(Instant::now()) {
            let _ = self.socket.send_to(&datagram, peer.addr).await;
        }
    }

    async fn close_all(&mut self) {
        let mut peers: Vec<Peer> = self.peers.drain().map(|(_, p)| p).collect();
        for peer in &mut peers {
            if peer.state == PeerState::Connected {
                peer.enqueue(Control::Disconnect.encode().freeze(), Reliability::ReliableOrdered, 0);
                self.flush(peer).await;
            }
        }
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AllowAll;
    use crate::pong::PongInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed;

    impl PongProvider for Fixed {
        fn pong(&self, _from: &SocketAddr) -> PongInfo {
            PongInfo {
                motd: "Proxy".into(),
                sub_motd: "Sub".into(),
                protocol: 729,
                version: "1.21.30".into(),
                online: 0,
                max_players: 10,
                server_guid: 5,
                game_type: "Survival".into(),
                ipv4_port: 19132,
                ipv6_port: 19133,
            }
        }
    }

    struct DenyAll(AtomicUsize);

    impl AdmissionPolicy for DenyAll {
        fn on_connection_request(&self, _addr: &SocketAddr) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    fn config(admission: Arc<dyn AdmissionPolicy>) -> ListenerConfig {
        ListenerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            server_guid: 5,
            max_peers: 4,
            packets_per_second: 1000,
            admission,
            pong: Arc::new(Fixed),
        }
    }

    fn second_request(client: SocketAddr) -> Vec<u8> {
        let mut raw = vec![crate::packet::offline::id::OPEN_CONNECTION_REQUEST_2];
        raw.extend_from_slice(&OFFLINE_MAGIC);
        let mut addr = bytes::BytesMut::new();
        crate::wire::put_address(&mut addr, &client);
        raw.extend_from_slice(&addr);
        raw.extend_from_slice(&1400u16.to_be_bytes());
        raw.extend_from_slice(&77i64.to_be_bytes());
        raw
    }

    fn ping() -> Vec<u8> {
        let mut raw = vec![crate::packet::offline::id::UNCONNECTED_PING];
        raw.extend_from_slice(&3i64.to_be_bytes());
        raw.extend_from_slice(&OFFLINE_MAGIC);
        raw.extend_from_slice(&9i64.to_be_bytes());
        raw
    }

    #[tokio::test]
    async fn rejected_address_gets_banned_frame_and_no_peer() {
        let policy = Arc::new(DenyAll(AtomicUsize::new(0)));
        let (mut listener, _events, _handle) = Listener::bind(config(policy.clone())).await.unwrap();
        let server = listener.local_addr().unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client_addr = client.local_addr().unwrap();

        let raw = second_request(server);
        listener.on_datagram(&raw, client_addr).await.unwrap();
        assert!(listener.peers.is_empty());
        assert_eq!(listener.limiter.tracked(), 0);
        assert_eq!(policy.0.load(Ordering::SeqCst), 1);

        let mut buf = [0u8; 64];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();
        assert_eq!(buf[0], crate::packet::offline::id::CONNECTION_BANNED);
        assert_eq!(len, 25);
    }

    #[tokio::test]
    async fn refused_address_is_not_answered_or_tracked() {
        let policy = Arc::new(DenyAll(AtomicUsize::new(0)));
        let (mut listener, _events, _handle) = Listener::bind(config(policy.clone())).await.unwrap();
        let client_addr: SocketAddr = "127.0.0.1:45000".parse().unwrap();

        for _ in 0..50 {
            listener.on_datagram(&ping(), client_addr).await.unwrap();
        }
        assert_eq!(listener.limiter.tracked(), 0);
        assert!(listener.peers.is_empty());
        assert_eq!(policy.0.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn admitted_address_allocates_peer() {
        let (mut listener, _events, _handle) = Listener::bind(config(Arc::new(AllowAll))).await.unwrap();
        let server = listener.local_addr().unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client_addr = client.local_addr().unwrap();

        listener.on_datagram(&second_request(server), client_addr).await.unwrap();
        assert_eq!(listener.peers.len(), 1);
        assert_eq!(listener.peers[&client_addr].guid, 77);

        let mut buf = [0u8; 64];
        client.recv_from(&mut buf).await.unwrap();
        assert_eq!(buf[0], crate::packet::offline::id::OPEN_CONNECTION_REPLY_2);
    }

    #[tokio::test]
    async fn ping_is_answered_with_pong() {
        let (mut listener, _events, _handle) = Listener::bind(config(Arc::new(AllowAll))).await.unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client_addr = client.local_addr().unwrap();

        listener.on_datagram(&ping(), client_addr).await.unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();
        let text = String::from_utf8_lossy(&buf[35..len]);
        assert!(text.starts_with("MCPE;Proxy;729;"));
        assert!(listener.peers.is_empty());
        assert_eq!(listener.limiter.tracked(), 1);
    }
}
