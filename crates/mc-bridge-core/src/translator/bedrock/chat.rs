//! Chat and commands typed on the Bedrock client.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use mc_bridge_proto::bedrock::{Serverbound, Text, TextKind};
use mc_bridge_proto::java::play::{ChatCommand, ChatMessage};
use tracing::debug;

use crate::command::CommandSource;
use crate::context::BedrockRegistry;
use crate::dispatch::{HandlerOptions, HandlerState};
use crate::session::Session;

/// Longest chat message a Java server accepts.
const MAX_CHAT_LENGTH: usize = 256;

/// First word of a command line the bridge runs itself.
const BRIDGE_COMMAND: &str = "bridge";

pub(super) fn register(registry: &mut BedrockRegistry) {
    registry.register("Text", HandlerOptions::tagged("chat:text"), |s: &mut Session, packet: &Serverbound| {
        let Serverbound::Text(text) = packet else {
            return Ok(HandlerState::Continue);
        };
        if text.kind != TextKind::Chat {
            return Ok(HandlerState::Continue);
        }
        let message: String = text.message.chars().take(MAX_CHAT_LENGTH).collect();
        if message.trim().is_empty() {
            return Ok(HandlerState::Handled);
        }
        match message.strip_prefix('/') {
            Some(command) => s.send_upstream(&ChatCommand(command.to_owned())),
            None => s.send_upstream(&ChatMessage {
                message,
                timestamp: now_millis(),
                salt: rand::random(),
            }),
        }
        Ok(HandlerState::Handled)
    });

    registry.register("CommandRequest", HandlerOptions::tagged("chat:command"), |s: &mut Session, packet: &Serverbound| {
        let Serverbound::CommandRequest(request) = packet else {
            return Ok(HandlerState::Continue);
        };
        let line = request.line().trim();
        let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        if !first.eq_ignore_ascii_case(BRIDGE_COMMAND) {
            s.send_upstream(&ChatCommand(line.to_owned()));
            return Ok(HandlerState::Handled);
        }

        let source = CommandSource::Session {
            handle: s.handle().clone(),
            name: s.identity().map(|i| i.display_name.clone()).unwrap_or_default(),
        };
        let context = Arc::clone(s.context());
        let result = context.commands.execute(&source, rest, &context.sessions);
        debug!(session = s.id(), command = rest, success = result.success, "bridge command");
        for message in result.messages {
            s.send_downstream(&Text::system(message));
        }
        Ok(HandlerState::Handled)
    });
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use bytes::{Buf, Bytes};
    use mc_bridge_proto::bedrock::{encode_packet, id, CommandOrigin, CommandRequest, CANONICAL_PROTOCOL};
    use mc_bridge_proto::types::Uuid;

    use super::*;
    use crate::command::CommandBridge;
    use crate::context::{BridgeContext, BridgeSettings, Translators};
    use crate::dispatch::Priority;
    use crate::session::{SessionEvent, SessionPhase};
    use crate::test_support::{bedrock_ids, context, drain, java_packets, playing_session, registries, text_packet};
    use crate::world_manager::CachedWorldManager;

    fn command_packet(command: &str) -> Bytes {
        let request = CommandRequest {
            command: command.to_owned(),
            origin: CommandOrigin {
                origin_type: 0,
                uuid: Uuid(0),
                request_id: String::new(),
                player_unique_id: None,
            },
            internal: false,
            version: 52,
        };
        encode_packet(&request, CANONICAL_PROTOCOL)
    }

    fn read_string(body: &mut Bytes) -> String {
        let len = mc_bridge_proto::varint::get_java_varint(body).expect("length") as usize;
        let text = String::from_utf8(body[..len].to_vec()).expect("utf-8");
        body.advance(len);
        text
    }

    #[test]
    fn chat_becomes_a_java_chat_message() {
        let (mut s, _, mut up, _) = playing_session(context());
        s.handle_bedrock(text_packet("hello there"));
        let sent = java_packets(&drain(&mut up));
        assert_eq!(sent.len(), 1);
        let (packet_id, mut body) = sent[0].clone();
        assert_eq!(packet_id, 0x06);
        assert_eq!(read_string(&mut body), "hello there");
    }

    #[test]
    fn long_chat_is_truncated() {
        let (mut s, _, mut up, _) = playing_session(context());
        s.handle_bedrock(text_packet(&"a".repeat(400)));
        let (_, mut body) = java_packets(&drain(&mut up))[0].clone();
        assert_eq!(read_string(&mut body).len(), MAX_CHAT_LENGTH);
    }

    #[test]
    fn slash_chat_and_commands_go_upstream_as_commands() {
        let (mut s, _, mut up, _) = playing_session(context());
        s.handle_bedrock(text_packet("/spawn"));
        s.handle_bedrock(command_packet("/gamemode creative"));
        let sent = java_packets(&drain(&mut up));
        let commands: Vec<String> = sent
            .into_iter()
            .map(|(packet_id, mut body)| {
                assert_eq!(packet_id, 0x04);
                read_string(&mut body)
            })
            .collect();
        assert_eq!(commands, vec!["spawn", "gamemode creative"]);
    }

    #[test]
    fn bridge_commands_answer_locally() {
        let (mut s, mut down, mut up, _) = playing_session(context());
        s.handle_bedrock(command_packet("/bridge help"));
        assert!(drain(&mut up).is_empty());
        // header plus list and kick
        assert_eq!(bedrock_ids(&drain(&mut down)), vec![id::TEXT; 3]);

        // players are not operators by default
        s.handle_bedrock(command_packet("/bridge kick Someone"));
        assert_eq!(bedrock_ids(&drain(&mut down)), vec![id::TEXT]);
    }

    #[test]
    fn a_panicking_translator_only_takes_down_its_session() {
        let translators = Translators::build(|_, bedrock| {
            bedrock.register(
                "Text",
                HandlerOptions::tagged("test:boom").with_priority(Priority::First),
                |_: &mut Session, packet: &Serverbound| {
                    if matches!(packet, Serverbound::Text(t) if t.message == "boom") {
                        panic!("translator blew up");
                    }
                    Ok(HandlerState::Continue)
                },
            );
        })
        .expect("translators build");
        let context = Arc::new(BridgeContext::with_parts(
            registries(),
            translators,
            CommandBridge::default(),
            Arc::new(CachedWorldManager),
            BridgeSettings::default(),
        ));

        let (mut a, _, _, mut a_events) = playing_session(Arc::clone(&context));
        let (mut b, _, mut b_up, _) = playing_session(Arc::clone(&context));

        a.handle_bedrock(text_packet("boom"));
        assert_eq!(a.phase(), SessionPhase::Closed);
        match a_events.try_recv() {
            Ok(SessionEvent::Closed { reason, .. }) => assert_eq!(reason, "Internal error"),
            other => panic!("expected a close event, got {other:?}"),
        }

        b.handle_bedrock(text_packet("still here"));
        assert_eq!(b.phase(), SessionPhase::Playing);
        let ids: Vec<i32> = java_packets(&drain(&mut b_up)).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0x06]);
        assert_eq!(context.sessions.count(), 1);
    }
}
