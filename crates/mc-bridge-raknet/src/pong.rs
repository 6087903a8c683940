//! Discovery pong contents.

use std::net::SocketAddr;

/// Above this many bytes for MOTD + sub-MOTD + version the client hides the server.
pub const PONG_TEXT_BUDGET: usize = 338;

/// Supplies the pong for a discovery ping. Called on every ping, so keep it cheap.
pub trait PongProvider: Send + Sync {
    fn pong(&self, from: &SocketAddr) -> PongInfo;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PongInfo {
    pub motd: String,
    pub sub_motd: String,
    pub protocol: u32,
    pub version: String,
    pub online: u32,
    pub max_players: u32,
    pub server_guid: i64,
    pub game_type: String,
    pub ipv4_port: u16,
    pub ipv6_port: u16,
}

impl PongInfo {
    /// Fix up the pong so clients will list it.
    ///
    /// Blank lines fall back to `brand`; `;` would break the field layout.
    /// When the text is too long the sub-MOTD is replaced first, then the
    /// MOTD is cut on a character boundary. A full server is advertised with
    /// one free slot since clients refuse to join a full one.
    pub fn sanitize(mut self, brand: &str) -> Self {
        self.motd = self.motd.replace(';', ":");
        self.sub_motd = self.sub_motd.replace(';', ":");
        if self.motd.trim().is_empty() {
            self.motd = brand.to_string();
        }
        if self.sub_motd.trim().is_empty() {
            self.sub_motd = brand.to_string();
        }

        let budget = PONG_TEXT_BUDGET.saturating_sub(self.version.len());
        if self.motd.len() + self.sub_motd.len() > budget {
            if self.sub_motd.len() > brand.len() {
                self.sub_motd = brand.to_string();
            }
            let motd_budget = budget.saturating_sub(self.sub_motd.len());
            if self.motd.len() > motd_budget {
                let mut cut = motd_budget;
                while !self.motd.is_char_boundary(cut) {
                    cut -= 1;
                }
                self.motd.truncate(cut);
            }
        }

        if self.online >= self.max_players {
            self.max_players = self.online + 1;
        }
        self
    }

    pub fn to_motd_string(&self) -> String {
        let game_mode_id = if self.game_type.eq_ignore_ascii_case("creative") {
            0
        } else {
            1
        };
        format!(
            "MCPE;{};{};{};{};{};{};{};{};{};{};{};0;",
            self.motd,
            self.protocol,
            self.version,
            self.online,
            self.max_players,
            self.server_guid,
            self.sub_motd,
            self.game_type,
            game_mode_id,
            self.ipv4_port,
            self.ipv6_port,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(motd: &str, sub: &str) -> PongInfo {
        PongInfo {
            motd: motd.into(),
            sub_motd: sub.into(),
            protocol: 729,
            version: "1.21.30".into(),
            online: 0,
            max_players: 20,
            server_guid: 99,
            game_type: "Survival".into(),
            ipv4_port: 19132,
            ipv6_port: 19133,
        }
    }

    #[test]
    fn layout_has_thirteen_fields() {
        let s = info("Hello", "Sub").sanitize("Bridge").to_motd_string();
        assert!(s.starts_with("MCPE;Hello;729;1.21.30;0;20;99;Sub;Survival;1;19132;19133;"));
        assert_eq!(s.matches(';').count(), 13);
    }

    #[test]
    fn semicolons_and_blank_lines() {
        let p = info("a;b", "  ").sanitize("Bridge");
        assert_eq!(p.motd, "a:b");
        assert_eq!(p.sub_motd, "Bridge");
    }

    #[test]
    fn full_server_keeps_one_slot() {
        let mut p = info("m", "s");
        p.online = 20;
        assert_eq!(p.sanitize("Bridge").max_players, 21);
    }

    #[test]
    fn long_text_shortens_sub_first() {
        let long_sub = "s".repeat(300);
        let p = info(&"m".repeat(100), &long_sub).sanitize("Bridge");
        assert_eq!(p.sub_motd, "Bridge");
        assert_eq!(p.motd.len(), 100);
    }

    #[test]
    fn long_motd_is_cut_to_budget() {
        let p = info(&"é".repeat(300), "Sub").sanitize("Bridge");
        let budget = PONG_TEXT_BUDGET - "1.21.30".len() - "Sub".len();
        assert!(p.motd.len() <= budget);
        assert!(p.motd.len() >= budget - 1);
        assert_eq!(p.sub_motd, "Sub");
    }
}
