//! Block and game rule queries answered for translators.

use mc_bridge_proto::types::BlockPos;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    pub fn from_java(id: u8) -> Self {
        match id {
            1 => Self::Creative,
            2 => Self::Adventure,
            3 => Self::Spectator,
            _ => Self::Survival,
        }
    }

    /// Bedrock has a dedicated spectator id since 1.19.30.
    pub fn bedrock_id(self) -> i32 {
        match self {
            Self::Survival => 0,
            Self::Creative => 1,
            Self::Adventure => 2,
            Self::Spectator => 6,
        }
    }
}

/// Answers must not block; when the host cannot answer right away it returns
/// air or the rule's default.
pub trait WorldManager: Send + Sync {
    /// Java block state at `pos`.
    fn block_at(&self, session: &Session, pos: BlockPos) -> u32;

    /// True when block lookups come from the session's own chunk cache.
    fn has_own_chunk_cache(&self) -> bool;

    fn default_game_mode(&self, session: &Session) -> GameMode;

    fn game_rule_bool(&self, session: &Session, rule: &str) -> bool;

    fn game_rule_int(&self, session: &Session, rule: &str) -> i32;
}

const BOOL_RULES: &[(&str, bool)] = &[
    ("doDaylightCycle", true),
    ("doImmediateRespawn", false),
    ("keepInventory", false),
    ("naturalRegeneration", true),
    ("showCoordinates", true),
];

const INT_RULES: &[(&str, i32)] = &[("randomTickSpeed", 3), ("spawnRadius", 10)];

/// Standalone bridge: blocks come from the session chunk cache, rules from
/// vanilla defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct CachedWorldManager;

impl WorldManager for CachedWorldManager {
    fn block_at(&self, session: &Session, pos: BlockPos) -> u32 {
        session.chunk_cache().get(pos)
    }

    fn has_own_chunk_cache(&self) -> bool {
        true
    }

    fn default_game_mode(&self, session: &Session) -> GameMode {
        session.game_mode()
    }

    fn game_rule_bool(&self, _session: &Session, rule: &str) -> bool {
        BOOL_RULES.iter().find(|(name, _)| *name == rule).is_some_and(|(_, v)| *v)
    }

    fn game_rule_int(&self, _session: &Session, rule: &str) -> i32 {
        INT_RULES
            .iter()
            .find(|(name, _)| *name == rule)
            .map_or(0, |(_, v)| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_mode_ids() {
        assert_eq!(GameMode::from_java(3), GameMode::Spectator);
        assert_eq!(GameMode::from_java(9), GameMode::Survival);
        assert_eq!(GameMode::Spectator.bedrock_id(), 6);
    }
}
