//! Join, movement, keep-alive, chat and the play/configuration switch.

use mc_bridge_proto::bedrock::{Text, TextKind};
use mc_bridge_proto::java::play::{AcknowledgeConfiguration, ConfirmTeleport, PlayClientbound, PlayKeepAlive};
use mc_bridge_proto::java::text::flatten;
use mc_bridge_proto::types::{BlockPos, Vec3};
use tracing::{debug, info};

use crate::context::JavaRegistry;
use crate::dispatch::{HandlerOptions, HandlerState};
use crate::session::{Dimension, Session, SessionPhase};
use crate::world_manager::GameMode;

const RELATIVE_X: i8 = 0x01;
const RELATIVE_Y: i8 = 0x02;
const RELATIVE_Z: i8 = 0x04;

pub(super) fn register(registry: &mut JavaRegistry) {
    registry.register("Login", HandlerOptions::tagged("play:join"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::Login(join) = packet else {
            return Ok(HandlerState::Continue);
        };
        let dimension = Dimension::from_java(&join.dimension_name);
        let game_mode = GameMode::from_java(join.game_mode);
        info!(
            session = s.id(),
            entity = join.entity_id,
            dimension = %join.dimension_name,
            ?game_mode,
            "joined java world"
        );
        s.set_player(join.entity_id, game_mode, dimension, join.view_distance);
        Ok(HandlerState::Handled)
    });

    registry.register("SyncPlayerPosition", HandlerOptions::tagged("play:teleport"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SyncPlayerPosition { x, y, z, flags, teleport_id, .. } = *packet else {
            return Ok(HandlerState::Continue);
        };
        let current = s.position();
        let axis = |relative: i8, value: f64, base: f32| {
            if flags & relative != 0 {
                base + value as f32
            } else {
                value as f32
            }
        };
        let position = Vec3::new(
            axis(RELATIVE_X, x, current.x),
            axis(RELATIVE_Y, y, current.y),
            axis(RELATIVE_Z, z, current.z),
        );
        s.set_position(position);
        s.send_upstream(&ConfirmTeleport(teleport_id));
        let block = BlockPos::new(position.x.floor() as i32, position.y.floor() as i32, position.z.floor() as i32);
        s.update_chunk_publisher(block.chunk());
        Ok(HandlerState::Handled)
    });

    registry.register("KeepAlive", HandlerOptions::tagged("play:keep_alive"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::KeepAlive(id) = *packet else {
            return Ok(HandlerState::Continue);
        };
        s.send_upstream(&PlayKeepAlive(id));
        Ok(HandlerState::Handled)
    });

    registry.register("Disconnect", HandlerOptions::tagged("play:disconnect"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::Disconnect(reason) = packet else {
            return Ok(HandlerState::Continue);
        };
        s.disconnect(flatten(reason));
        Ok(HandlerState::Handled)
    });

    registry.register("SystemChat", HandlerOptions::tagged("play:system_chat"), |s: &mut Session, packet: &PlayClientbound| {
        let PlayClientbound::SystemChat { content, overlay } = packet else {
            return Ok(HandlerState::Continue);
        };
        let kind = if *overlay { TextKind::Tip } else { TextKind::Raw };
        s.send_downstream(&Text::new(kind, flatten(content)));
        Ok(HandlerState::Handled)
    });

    registry.register("StartConfiguration", HandlerOptions::tagged("play:reconfigure"), |s: &mut Session, packet: &PlayClientbound| {
        if !matches!(packet, PlayClientbound::StartConfiguration) {
            return Ok(HandlerState::Continue);
        }
        debug!(session = s.id(), "server requested reconfiguration");
        s.set_phase(SessionPhase::Configuring);
        s.send_upstream(&AcknowledgeConfiguration);
        Ok(HandlerState::Handled)
    });
}
