use std::net::SocketAddr;
use std::sync::Arc;

use mc_bridge_core::BridgeContext;
use mc_bridge_proto::bedrock::{game_version, CANONICAL_PROTOCOL};
use mc_bridge_raknet::{PongInfo, PongProvider};

pub const BRAND: &str = "Bedrock Bridge";

/// Server list entry built from the config and the live player count.
pub struct Status {
    pub context: Arc<BridgeContext>,
    pub motd: String,
    pub sub_motd: String,
    pub max_players: u32,
    pub server_guid: i64,
    pub port: u16,
}

impl PongProvider for Status {
    fn pong(&self, _from: &SocketAddr) -> PongInfo {
        PongInfo {
            motd: self.motd.clone(),
            sub_motd: self.sub_motd.clone(),
            protocol: CANONICAL_PROTOCOL,
            version: game_version(CANONICAL_PROTOCOL).unwrap_or_default().to_string(),
            online: self.context.sessions.count() as u32,
            max_players: self.max_players,
            server_guid: self.server_guid,
            game_type: "Survival".into(),
            ipv4_port: self.port,
            ipv6_port: self.port,
        }
        .sanitize(BRAND)
    }
}

#[cfg(test)]
mod tests {
    use mc_bridge_core::BridgeSettings;
    use mc_bridge_world::Registries;

    use super::*;

    fn status(motd: &str, max_players: u32) -> Status {
        let registries = Arc::new(Registries::load().unwrap());
        Status {
            context: Arc::new(BridgeContext::new(registries, BridgeSettings::default()).unwrap()),
            motd: motd.into(),
            sub_motd: String::new(),
            max_players,
            server_guid: 42,
            port: 19132,
        }
    }

    #[test]
    fn pong_carries_canonical_version_and_count() {
        let from: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let pong = status("Lobby; main", 20).pong(&from);
        assert_eq!(pong.motd, "Lobby: main");
        assert_eq!(pong.sub_motd, BRAND);
        assert_eq!(pong.protocol, CANONICAL_PROTOCOL);
        assert_eq!(pong.version, "1.21.30");
        assert_eq!(pong.online, 0);
        assert_eq!(pong.max_players, 20);
    }

    #[test]
    fn zero_slots_still_advertise_one() {
        let from: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let pong = status("Lobby", 0).pong(&from);
        assert_eq!(pong.max_players, 1);
    }
}
