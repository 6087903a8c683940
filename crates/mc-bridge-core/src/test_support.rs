//! Channel-backed sessions and packet builders shared by the unit tests.

use std::sync::{Arc, OnceLock};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use mc_bridge_proto::bedrock::{encode_packet, Login, RequestNetworkSettings, Text, TextKind, CANONICAL_PROTOCOL};
use mc_bridge_proto::java::split_id;
use mc_bridge_proto::varint::{get_var_u32, put_java_varint};
use mc_bridge_world::Registries;

use crate::context::{BridgeContext, BridgeSettings};
use crate::session::{Dimension, Outbound, Session, SessionEvent};
use crate::world_manager::GameMode;

pub const PLAYER_JAVA_ID: i32 = 1000;

pub fn registries() -> Arc<Registries> {
    static REGISTRIES: OnceLock<Arc<Registries>> = OnceLock::new();
    Arc::clone(REGISTRIES.get_or_init(|| Arc::new(Registries::load().expect("embedded registries load"))))
}

pub fn context() -> Arc<BridgeContext> {
    context_with(BridgeSettings::default())
}

pub fn context_with(settings: BridgeSettings) -> Arc<BridgeContext> {
    Arc::new(BridgeContext::new(registries(), settings).expect("default translators build"))
}

pub type Channels = (
    Session,
    UnboundedReceiver<Outbound>,
    UnboundedReceiver<Outbound>,
    UnboundedReceiver<SessionEvent>,
);

/// A fresh session plus the receivers for its downstream, its future
/// upstream and its events. The upstream is attached by [`playing_session`].
pub fn session(context: Arc<BridgeContext>) -> Channels {
    session_with_id(context, next_id())
}

fn next_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

fn session_with_id(context: Arc<BridgeContext>, id: u64) -> Channels {
    let (down_tx, down_rx) = mpsc::unbounded_channel();
    let (_, up_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let session = Session::detached(context, id, Box::new(down_tx), events_tx).expect("session builds");
    (session, down_rx, up_rx, events_rx)
}

/// Logged in, upstream attached, configuration finished and the player
/// placed in the overworld. Every receiver is drained.
pub fn playing_session(context: Arc<BridgeContext>) -> Channels {
    let id = next_id();
    let (mut session, mut down, _, mut events) = session_with_id(context, id);
    session.handle_bedrock(encode_packet(&RequestNetworkSettings { protocol: CANONICAL_PROTOCOL }, CANONICAL_PROTOCOL));
    session.handle_bedrock(login_packet(&format!("Player{id}"), id as u128));
    let (up_tx, up_rx) = mpsc::unbounded_channel();
    session.attach_upstream(Box::new(up_tx));
    session.finish_configuration();
    session.set_player(PLAYER_JAVA_ID, GameMode::Survival, Dimension::Overworld, 8);
    drain(&mut down);
    while events.try_recv().is_ok() {}
    (session, down, up_rx, events)
}

pub fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// Bedrock packet id and body of every packet sent.
pub fn bedrock_packets(out: &[Outbound]) -> Vec<(u32, Bytes)> {
    out.iter()
        .filter_map(|o| match o {
            Outbound::Packet(raw) => {
                let mut body = raw.clone();
                let id = get_var_u32(&mut body).ok()? & 0x3FF;
                Some((id, body))
            }
            _ => None,
        })
        .collect()
}

pub fn bedrock_ids(out: &[Outbound]) -> Vec<u32> {
    bedrock_packets(out).into_iter().map(|(id, _)| id).collect()
}

pub fn java_packets(out: &[Outbound]) -> Vec<(i32, Bytes)> {
    out.iter()
        .filter_map(|o| match o {
            Outbound::Packet(raw) => split_id(raw.clone()).ok(),
            _ => None,
        })
        .collect()
}

pub fn java_ids(out: &[Outbound]) -> Vec<i32> {
    java_packets(out).into_iter().map(|(id, _)| id).collect()
}

/// Unsigned token; only the payload is read by the bridge.
pub fn token(payload: &serde_json::Value) -> String {
    let header = serde_json::json!({ "alg": "ES384", "x5u": "key" });
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

pub fn login_packet(name: &str, uuid: u128) -> Bytes {
    let identity = token(&serde_json::json!({
        "extraData": {
            "XUID": format!("25354{uuid:011}"),
            "identity": format!("00000000-0000-0000-0000-{uuid:012x}"),
            "displayName": name,
        },
        "identityPublicKey": "MHYw"
    }));
    let client_data = token(&serde_json::json!({ "LanguageCode": "en_US", "DeviceOS": 7 }));
    let login = Login {
        protocol: CANONICAL_PROTOCOL,
        chain: vec![identity],
        client_data,
    };
    encode_packet(&login, CANONICAL_PROTOCOL)
}

pub fn text_packet(message: &str) -> Bytes {
    let mut text = Text::new(TextKind::Chat, message);
    text.source = "Steve".into();
    encode_packet(&text, CANONICAL_PROTOCOL)
}

/// A Java play packet: id then whatever `body` writes.
pub fn java_packet(id: i32, body: impl FnOnce(&mut BytesMut)) -> Bytes {
    let mut buf = BytesMut::new();
    put_java_varint(&mut buf, id);
    body(&mut buf);
    buf.freeze()
}

pub fn put_position(buf: &mut BytesMut, x: i32, y: i32, z: i32) {
    buf.put_i64(mc_bridge_proto::types::BlockPos::new(x, y, z).to_java_packed());
}
