//! The Java side of a session: one TCP connection per player.
//!
//! Login and configuration are handled here. Play packets are handed to the
//! session task unparsed, and whatever the session sends comes back through
//! the channel attached as its upstream sink.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use mc_bridge_core::{Outbound, SessionHandle};
use mc_bridge_proto::java::configuration::{
    resource_pack_result, AcknowledgeFinishConfiguration, ClientInformation, ConfigurationClientbound,
    ConfigurationKeepAlive, ConfigurationPong, ResourcePackResponse, ServerboundKnownPacks, ServerboundPluginMessage,
};
use mc_bridge_proto::java::framing::FrameCodec;
use mc_bridge_proto::java::login::{
    Handshake, LoginAcknowledged, LoginClientbound, LoginPluginResponse, LoginStart, INTENT_LOGIN,
};
use mc_bridge_proto::java::play::clientbound_id;
use mc_bridge_proto::java::{encode_serverbound, split_id, ConnectionState, JavaServerbound, PROTOCOL_VERSION};
use mc_bridge_proto::jwt::Identity;
use mc_bridge_proto::types::Uuid;
use mc_bridge_proto::ProtoError;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::config::RemoteSection;
use crate::status::BRAND;

const RETRY_DELAY: Duration = Duration::from_secs(1);
const BIOME_REGISTRY: &str = "minecraft:worldgen/biome";
const MAX_USERNAME: usize = 16;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Proto(#[from] ProtoError),

    #[error("timed out connecting to {0}")]
    Timeout(String),

    #[error("{0}")]
    Disconnected(String),

    #[error("the Java server requires online-mode authentication")]
    OnlineMode,

    #[error("connection closed by the Java server")]
    Closed,
}

impl UpstreamError {
    /// What the Bedrock player is shown.
    pub fn player_message(&self) -> String {
        match self {
            Self::Disconnected(reason) => reason.clone(),
            Self::Closed => "Disconnected from the Java server".into(),
            _ => "Could not connect to the Java server".into(),
        }
    }
}

pub struct JavaConnection<S> {
    stream: S,
    codec: FrameCodec,
    buf: BytesMut,
    state: ConnectionState,
}

impl<S: AsyncRead + AsyncWrite + Unpin> JavaConnection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            codec: FrameCodec::new(),
            buf: BytesMut::with_capacity(8192),
            state: ConnectionState::Handshaking,
        }
    }

    pub async fn send<P: JavaServerbound>(&mut self, packet: &P) -> Result<(), UpstreamError> {
        self.send_raw(&encode_serverbound(packet)).await
    }

    /// `packet` is an id followed by its body.
    pub async fn send_raw(&mut self, packet: &[u8]) -> Result<(), UpstreamError> {
        let frame = self.codec.encode(packet)?;
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Next packet, id included. Cancel safe.
    pub async fn read_packet(&mut self) -> Result<Bytes, UpstreamError> {
        loop {
            if let Some(packet) = self.codec.decode(&mut self.buf)? {
                return Ok(packet);
            }
            if self.stream.read_buf(&mut self.buf).await? == 0 {
                return Err(UpstreamError::Closed);
            }
        }
    }
}

/// Runs the Java connection for an authenticated session until either side
/// goes away.
pub async fn run(remote: Arc<RemoteSection>, session: SessionHandle, identity: Identity, view_distance: i8) {
    let id = session.id();
    let result = async {
        let stream = connect(&remote).await?;
        let mut connection = JavaConnection::new(stream);
        bridge(&mut connection, &remote, &session, &identity, view_distance).await
    }
    .await;
    match result {
        Ok(()) => debug!(session = id, "java connection finished"),
        Err(e) => {
            warn!(session = id, error = %e, "java connection ended");
            session.disconnect(e.player_message());
        }
    }
}

async fn connect(remote: &RemoteSection) -> Result<TcpStream, UpstreamError> {
    let target = format!("{}:{}", remote.address, remote.port);
    let attempts = remote.connect_attempts.max(1);
    let mut last = UpstreamError::Timeout(target.clone());
    for attempt in 1..=attempts {
        match time::timeout(remote.connect_timeout(), TcpStream::connect(&target)).await {
            Ok(Ok(stream)) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Ok(Err(e)) => {
                debug!(attempt, %target, error = %e, "java connect failed");
                last = e.into();
            }
            Err(_) => {
                debug!(attempt, %target, "java connect timed out");
                last = UpstreamError::Timeout(target.clone());
            }
        }
        if attempt < attempts {
            time::sleep(RETRY_DELAY).await;
        }
    }
    Err(last)
}

/// Bedrock gamertags may contain spaces and run past the Java limit.
pub fn java_username(display_name: &str) -> String {
    let name: String = display_name
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(MAX_USERNAME)
        .collect();
    if name.is_empty() {
        "BedrockPlayer".into()
    } else {
        name
    }
}

async fn bridge<S: AsyncRead + AsyncWrite + Unpin>(
    conn: &mut JavaConnection<S>,
    remote: &RemoteSection,
    session: &SessionHandle,
    identity: &Identity,
    view_distance: i8,
) -> Result<(), UpstreamError> {
    let username = java_username(&identity.display_name);
    conn.send(&Handshake {
        protocol: PROTOCOL_VERSION,
        address: remote.address.clone(),
        port: remote.port,
        intent: INTENT_LOGIN,
    })
    .await?;
    conn.state = ConnectionState::Login;
    conn.send(&LoginStart {
        uuid: Uuid::offline(&username),
        username,
    })
    .await?;
    login(conn).await?;

    let (upstream, mut outbound) = mpsc::unbounded_channel();
    if !session.execute_in_event_loop(move |s| s.attach_upstream(Box::new(upstream))) {
        return Ok(());
    }
    conn.state = ConnectionState::Configuration;
    conn.send(&ClientInformation::new("en_us", view_distance)).await?;
    conn.send(&ServerboundPluginMessage::brand(BRAND)).await?;

    loop {
        tokio::select! {
            packet = conn.read_packet() => {
                let packet = packet?;
                if conn.state == ConnectionState::Configuration {
                    configure(conn, session, packet).await?;
                    continue;
                }
                if matches!(split_id(packet.clone()), Ok((clientbound_id::START_CONFIGURATION, _))) {
                    debug!(session = session.id(), "java server reconfiguring");
                    conn.state = ConnectionState::Configuration;
                }
                if !session.execute_in_event_loop(move |s| s.handle_java(packet)) {
                    return Ok(());
                }
            }
            message = outbound.recv() => match message {
                Some(Outbound::Packet(packet)) => conn.send_raw(&packet).await?,
                Some(Outbound::EnableCompression) => {}
                Some(Outbound::Close(_)) | None => {
                    let _ = conn.stream.shutdown().await;
                    return Ok(());
                }
            },
        }
    }
}

async fn login<S: AsyncRead + AsyncWrite + Unpin>(conn: &mut JavaConnection<S>) -> Result<(), UpstreamError> {
    loop {
        match LoginClientbound::decode(conn.read_packet().await?)? {
            LoginClientbound::SetCompression { threshold } => conn.codec.set_threshold(threshold),
            LoginClientbound::PluginRequest { message_id, channel } => {
                trace!(%channel, "declining login plugin request");
                conn.send(&LoginPluginResponse { message_id }).await?;
            }
            LoginClientbound::EncryptionRequest { .. } => return Err(UpstreamError::OnlineMode),
            LoginClientbound::Disconnect(reason) => return Err(UpstreamError::Disconnected(reason)),
            LoginClientbound::LoginSuccess { uuid, username, .. } => {
                info!(%uuid, %username, "java login accepted");
                conn.send(&LoginAcknowledged).await?;
                return Ok(());
            }
        }
    }
}

async fn configure<S: AsyncRead + AsyncWrite + Unpin>(
    conn: &mut JavaConnection<S>,
    session: &SessionHandle,
    packet: Bytes,
) -> Result<(), UpstreamError> {
    match ConfigurationClientbound::decode(packet)? {
        ConfigurationClientbound::KeepAlive(id) => conn.send(&ConfigurationKeepAlive(id)).await?,
        ConfigurationClientbound::Ping(id) => conn.send(&ConfigurationPong(id)).await?,
        ConfigurationClientbound::RegistryData { registry, entries } => {
            if registry == BIOME_REGISTRY {
                session.execute_in_event_loop(move |s| s.set_biome_registry(&entries));
            }
        }
        ConfigurationClientbound::KnownPacks(packs) => conn.send(&ServerboundKnownPacks(packs)).await?,
        ConfigurationClientbound::AddResourcePack { id, forced } => {
            trace!(%id, forced, "accepting resource pack");
            for result in [resource_pack_result::ACCEPTED, resource_pack_result::LOADED] {
                conn.send(&ResourcePackResponse { id, result }).await?;
            }
        }
        ConfigurationClientbound::Disconnect(reason) => return Err(UpstreamError::Disconnected(reason)),
        ConfigurationClientbound::FinishConfiguration => {
            conn.send(&AcknowledgeFinishConfiguration).await?;
            conn.state = ConnectionState::Play;
            session.execute_in_event_loop(|s| s.finish_configuration());
        }
        ConfigurationClientbound::PluginMessage { channel, .. } => trace!(%channel, "configuration plugin message"),
        ConfigurationClientbound::Other { id } => trace!(id, "configuration packet ignored"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::{Buf, BufMut};
    use mc_bridge_proto::codec::{read_string, write_string};
    use mc_bridge_proto::varint::{get_java_varint, put_java_varint};
    use tokio::io::DuplexStream;

    use super::*;

    /// The server end of an in-memory connection.
    struct FakeServer {
        conn: JavaConnection<DuplexStream>,
    }

    impl FakeServer {
        fn pair() -> (JavaConnection<DuplexStream>, Self) {
            let (client, server) = tokio::io::duplex(64 * 1024);
            (JavaConnection::new(client), Self { conn: JavaConnection::new(server) })
        }

        async fn write(&mut self, id: i32, body: impl FnOnce(&mut BytesMut)) {
            let mut packet = BytesMut::new();
            put_java_varint(&mut packet, id);
            body(&mut packet);
            self.conn.send_raw(&packet).await.unwrap();
        }

        async fn read(&mut self) -> (i32, Bytes) {
            split_id(self.conn.read_packet().await.unwrap()).unwrap()
        }
    }

    fn remote() -> RemoteSection {
        RemoteSection {
            address: "java.example".into(),
            port: 25565,
            ..RemoteSection::default()
        }
    }

    fn identity(name: &str) -> Identity {
        Identity {
            uuid: Uuid(1),
            xuid: "2535400000000000".into(),
            display_name: name.into(),
        }
    }

    #[test]
    fn usernames_fit_java_rules() {
        assert_eq!(java_username("Steve"), "Steve");
        assert_eq!(java_username("Cool Player 2024"), "Cool_Player_2024");
        assert_eq!(java_username("AVeryLongGamertagName"), "AVeryLongGamerta");
        assert_eq!(java_username("~~~"), "BedrockPlayer");
    }

    #[test]
    fn player_sees_server_reason() {
        assert_eq!(UpstreamError::Disconnected("Banned".into()).player_message(), "Banned");
        assert_eq!(
            UpstreamError::Timeout("x:1".into()).player_message(),
            "Could not connect to the Java server"
        );
    }

    #[tokio::test]
    async fn login_follows_compression_and_stops_without_a_session() {
        let (mut client, mut server) = FakeServer::pair();
        let task = tokio::spawn(async move {
            let session = SessionHandle::detached(3);
            bridge(&mut client, &remote(), &session, &identity("Alex Smith"), 8).await
        });

        let (id, mut body) = server.read().await;
        assert_eq!(id, 0x00);
        assert_eq!(get_java_varint(&mut body).unwrap(), PROTOCOL_VERSION);
        assert_eq!(read_string(&mut body).unwrap(), "java.example");
        assert_eq!(body.get_u16(), 25565);
        assert_eq!(get_java_varint(&mut body).unwrap(), INTENT_LOGIN);

        let (id, mut body) = server.read().await;
        assert_eq!(id, 0x00);
        assert_eq!(read_string(&mut body).unwrap(), "Alex_Smith");
        assert_eq!(body.get_u128(), Uuid::offline("Alex_Smith").0);

        server.write(0x04, |buf| {
            put_java_varint(buf, 11);
            write_string(buf, "velocity:player_info");
        })
        .await;
        let (id, mut body) = server.read().await;
        assert_eq!(id, 0x02);
        assert_eq!(get_java_varint(&mut body).unwrap(), 11);

        server.write(0x03, |buf| put_java_varint(buf, 256)).await;
        server.conn.codec.set_threshold(256);
        server.write(0x02, |buf| {
            buf.put_u128(Uuid::offline("Alex_Smith").0);
            write_string(buf, "Alex_Smith");
            put_java_varint(buf, 0);
            buf.put_u8(1);
        })
        .await;
        let (id, _) = server.read().await;
        assert_eq!(id, 0x03);

        // a detached handle cannot take the upstream
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn login_disconnect_carries_the_reason() {
        let (mut client, mut server) = FakeServer::pair();
        server.write(0x00, |buf| write_string(buf, "{\"text\":\"You are banned\"}")).await;
        match login(&mut client).await {
            Err(UpstreamError::Disconnected(reason)) => assert_eq!(reason, "You are banned"),
            other => panic!("expected a disconnect, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn online_mode_servers_are_refused() {
        let (mut client, mut server) = FakeServer::pair();
        server.write(0x01, |buf| write_string(buf, "")).await;
        assert!(matches!(login(&mut client).await, Err(UpstreamError::OnlineMode)));
    }

    #[tokio::test]
    async fn configuration_is_answered_until_finished() {
        let (mut client, mut server) = FakeServer::pair();
        client.state = ConnectionState::Configuration;
        let session = SessionHandle::detached(4);

        server.write(0x04, |buf| buf.put_i64(77)).await;
        server.write(0x0E, |buf| {
            put_java_varint(buf, 1);
            write_string(buf, "minecraft");
            write_string(buf, "core");
            write_string(buf, "1.21.1");
        })
        .await;
        server.write(0x03, |_| {}).await;
        for _ in 0..3 {
            let packet = client.read_packet().await.unwrap();
            configure(&mut client, &session, packet).await.unwrap();
        }
        assert_eq!(client.state, ConnectionState::Play);

        let (id, mut body) = server.read().await;
        assert_eq!(id, 0x04);
        assert_eq!(body.get_i64(), 77);
        let (id, mut body) = server.read().await;
        assert_eq!(id, 0x07);
        assert_eq!(get_java_varint(&mut body).unwrap(), 1);
        assert_eq!(read_string(&mut body).unwrap(), "minecraft");
        let (id, _) = server.read().await;
        assert_eq!(id, 0x03);
    }

    #[tokio::test]
    async fn closed_stream_is_reported() {
        let (mut client, server) = FakeServer::pair();
        drop(server);
        assert!(matches!(client.read_packet().await, Err(UpstreamError::Closed)));
    }
}
