//! Per-client pump between the RakNet peer and its session task.
//!
//! Game packets leaving a session are collected and sent as one batch per
//! wakeup. Batches arriving from the client are split here and handed to the
//! session as a single job, so the session never sees batch framing.

use std::net::SocketAddr;

use bytes::Bytes;
use mc_bridge_core::{Outbound, SessionHandle};
use mc_bridge_proto::batch::{decode_batch, encode_batch, BatchConfig};
use mc_bridge_raknet::{ListenerHandle, Reliability};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Where finished batches go.
pub trait BatchSink: Send + 'static {
    fn send_batch(&self, batch: Bytes);

    fn close(&self);
}

pub struct PeerSink {
    pub listener: ListenerHandle,
    pub addr: SocketAddr,
}

impl BatchSink for PeerSink {
    fn send_batch(&self, batch: Bytes) {
        self.listener.send(self.addr, batch, Reliability::ReliableOrdered, 0);
    }

    fn close(&self) {
        self.listener.close(self.addr);
    }
}

pub async fn pump<S: BatchSink>(
    sink: S,
    session: SessionHandle,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    mut inbound: mpsc::UnboundedReceiver<Bytes>,
    mut config: BatchConfig,
) {
    let mut pending = Vec::new();
    loop {
        tokio::select! {
            message = outbound.recv() => {
                let Some(message) = message else { break };
                let mut next = Some(message);
                while let Some(message) = next.take() {
                    match message {
                        Outbound::Packet(packet) => pending.push(packet),
                        Outbound::EnableCompression => {
                            flush(&sink, &mut pending, &config);
                            config.compression_enabled = true;
                        }
                        Outbound::Close(reason) => {
                            flush(&sink, &mut pending, &config);
                            debug!(session = session.id(), %reason, "closing bedrock connection");
                            sink.close();
                            return;
                        }
                    }
                    next = outbound.try_recv().ok();
                }
                flush(&sink, &mut pending, &config);
            }
            payload = inbound.recv() => {
                let Some(payload) = payload else { break };
                let packets = match decode_batch(payload, &config) {
                    Ok(packets) => packets,
                    Err(e) => {
                        trace!(session = session.id(), error = %e, "bad batch dropped");
                        continue;
                    }
                };
                let queued = session.execute_in_event_loop(move |s| {
                    for packet in packets {
                        s.handle_bedrock(packet);
                    }
                });
                if !queued {
                    break;
                }
            }
        }
    }
    flush(&sink, &mut pending, &config);
    sink.close();
}

fn flush<S: BatchSink>(sink: &S, pending: &mut Vec<Bytes>, config: &BatchConfig) {
    if pending.is_empty() {
        return;
    }
    match encode_batch(pending, config) {
        Ok(batch) => sink.send_batch(batch),
        Err(e) => warn!(error = %e, packets = pending.len(), "batch encoding failed"),
    }
    pending.clear();
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mc_bridge_core::{spawn_session, BridgeContext, BridgeSettings, SessionEvent};
    use mc_bridge_proto::bedrock::{encode_packet, id, RequestNetworkSettings, CANONICAL_PROTOCOL};
    use mc_bridge_proto::varint::get_var_u32;
    use mc_bridge_world::Registries;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Sent {
        Batch(Bytes),
        Close,
    }

    struct ChannelSink(mpsc::UnboundedSender<Sent>);

    impl BatchSink for ChannelSink {
        fn send_batch(&self, batch: Bytes) {
            let _ = self.0.send(Sent::Batch(batch));
        }

        fn close(&self) {
            let _ = self.0.send(Sent::Close);
        }
    }

    fn context() -> Arc<BridgeContext> {
        let registries = Arc::new(Registries::load().unwrap());
        Arc::new(BridgeContext::new(registries, BridgeSettings::default()).unwrap())
    }

    fn batch(packets: &[Bytes], compressed: bool) -> Bytes {
        let config = BatchConfig {
            compression_enabled: compressed,
            ..BatchConfig::default()
        };
        encode_batch(packets, &config).unwrap()
    }

    fn packet_ids(batch: Bytes, compressed: bool) -> Vec<u32> {
        let config = BatchConfig {
            compression_enabled: compressed,
            ..BatchConfig::default()
        };
        decode_batch(batch, &config)
            .unwrap()
            .into_iter()
            .map(|mut p| get_var_u32(&mut p).unwrap() & 0x3FF)
            .collect()
    }

    #[tokio::test]
    async fn queued_packets_leave_as_one_batch() {
        let (sent_tx, mut sent) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (_in_tx, in_rx) = mpsc::unbounded_channel();
        for _ in 0..3 {
            out_tx.send(Outbound::Packet(Bytes::from_static(&[0x09, 0x00]))).unwrap();
        }
        out_tx.send(Outbound::Close("bye".into())).unwrap();

        pump(ChannelSink(sent_tx), SessionHandle::detached(1), out_rx, in_rx, BatchConfig::default()).await;

        let Some(Sent::Batch(first)) = sent.recv().await else {
            panic!("expected a batch");
        };
        assert_eq!(packet_ids(first, false), vec![0x09; 3]);
        assert_eq!(sent.recv().await, Some(Sent::Close));
    }

    #[tokio::test]
    async fn compression_starts_after_network_settings() {
        let (sent_tx, mut sent) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (events_tx, _events) = mpsc::unbounded_channel::<SessionEvent>();
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let session = spawn_session(context(), 7, addr, Box::new(out_tx), events_tx).unwrap();
        tokio::spawn(pump(ChannelSink(sent_tx), session, out_rx, in_rx, BatchConfig::default()));

        let request = encode_packet(&RequestNetworkSettings { protocol: CANONICAL_PROTOCOL }, CANONICAL_PROTOCOL);
        in_tx.send(batch(&[request], false)).unwrap();

        let Some(Sent::Batch(settings)) = sent.recv().await else {
            panic!("expected network settings");
        };
        // sent before compression is switched on
        assert_eq!(packet_ids(settings, false), vec![id::NETWORK_SETTINGS]);

        // the client now compresses; a second request is a protocol violation
        let again = encode_packet(&RequestNetworkSettings { protocol: CANONICAL_PROTOCOL }, CANONICAL_PROTOCOL);
        in_tx.send(batch(&[again], true)).unwrap();
        let Some(Sent::Batch(disconnect)) = sent.recv().await else {
            panic!("expected a disconnect");
        };
        assert_eq!(packet_ids(disconnect, true), vec![id::DISCONNECT]);
        assert_eq!(sent.recv().await, Some(Sent::Close));
    }
}
