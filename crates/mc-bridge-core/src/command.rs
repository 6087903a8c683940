//! Commands the bridge answers itself, and the seam host platforms use to
//! plug in their own.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::session::SessionHandle;
use crate::session_registry::SessionRegistry;

/// Who ran the command.
#[derive(Debug, Clone)]
pub enum CommandSource {
    Console,
    Session { handle: SessionHandle, name: String },
}

impl CommandSource {
    pub fn name(&self) -> &str {
        match self {
            Self::Console => "CONSOLE",
            Self::Session { name, .. } => name,
        }
    }

    pub fn is_console(&self) -> bool {
        matches!(self, Self::Console)
    }
}

pub struct CommandContext<'a> {
    pub source: &'a CommandSource,
    /// Arguments after the command name.
    pub args: Vec<String>,
    pub sessions: &'a SessionRegistry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    /// Sent back to the source.
    pub messages: Vec<String>,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
        }
    }
}

pub trait CommandExecutor: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Permission node checked before [`execute`](Self::execute) runs.
    fn permission(&self) -> &str;

    fn execute(&self, ctx: &CommandContext<'_>) -> CommandResult;
}

pub trait PermissionChecker: Send + Sync {
    fn has_permission(&self, source: &CommandSource, permission: &str) -> bool;
}

/// The console may do anything; players only when listed as operators.
#[derive(Debug, Default)]
pub struct DefaultPermissions {
    operators: HashSet<String>,
}

impl DefaultPermissions {
    pub fn new<I, S>(operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            operators: operators.into_iter().map(|s| s.as_ref().to_lowercase()).collect(),
        }
    }
}

impl PermissionChecker for DefaultPermissions {
    fn has_permission(&self, source: &CommandSource, _permission: &str) -> bool {
        match source {
            CommandSource::Console => true,
            CommandSource::Session { name, .. } => self.operators.contains(&name.to_lowercase()),
        }
    }
}

pub struct CommandBridge {
    commands: BTreeMap<String, Box<dyn CommandExecutor>>,
    permissions: Box<dyn PermissionChecker>,
}

impl fmt::Debug for CommandBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBridge")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for CommandBridge {
    fn default() -> Self {
        Self::new(Box::new(DefaultPermissions::default()))
    }
}

impl CommandBridge {
    /// A bridge with the built-in `help`, `list` and `kick` commands.
    pub fn new(permissions: Box<dyn PermissionChecker>) -> Self {
        let mut bridge = Self {
            commands: BTreeMap::new(),
            permissions,
        };
        bridge.register(Box::new(ListCommand));
        bridge.register(Box::new(KickCommand));
        bridge
    }

    /// Replaces any command with the same name.
    pub fn register(&mut self, command: Box<dyn CommandExecutor>) {
        self.commands.insert(command.name().to_lowercase(), command);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Runs a command line such as `kick Steve spamming`.
    pub fn execute(&self, source: &CommandSource, line: &str, sessions: &SessionRegistry) -> CommandResult {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return CommandResult::err("Usage: bridge <command>");
        };
        let name = name.to_lowercase();
        if name == "help" {
            return self.help();
        }
        let Some(command) = self.commands.get(&name) else {
            return CommandResult::err(format!("Unknown command: {name}. Try \"help\"."));
        };
        if !self.permissions.has_permission(source, command.permission()) {
            return CommandResult::err("You do not have permission to use this command.");
        }
        let ctx = CommandContext {
            source,
            args: words.map(str::to_owned).collect(),
            sessions,
        };
        command.execute(&ctx)
    }

    fn help(&self) -> CommandResult {
        let mut messages = vec!["Bridge commands:".to_owned()];
        messages.extend(
            self.commands
                .values()
                .map(|c| format!("  {} - {}", c.name(), c.description())),
        );
        CommandResult {
            success: true,
            messages,
        }
    }
}

struct ListCommand;

impl CommandExecutor for ListCommand {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "Show connected players"
    }

    fn permission(&self) -> &str {
        "bridge.command.list"
    }

    fn execute(&self, ctx: &CommandContext<'_>) -> CommandResult {
        let names: Vec<String> = ctx
            .sessions
            .online()
            .into_iter()
            .map(|s| s.identity.display_name)
            .collect();
        let count = names.len();
        let suffix = if names.is_empty() {
            String::new()
        } else {
            format!(": {}", names.join(", "))
        };
        CommandResult::ok(format!(
            "There {verb} {count} player{s} online{suffix}",
            verb = if count == 1 { "is" } else { "are" },
            s = if count == 1 { "" } else { "s" },
        ))
    }
}

struct KickCommand;

impl CommandExecutor for KickCommand {
    fn name(&self) -> &str {
        "kick"
    }

    fn description(&self) -> &str {
        "Disconnect a player from the bridge"
    }

    fn permission(&self) -> &str {
        "bridge.command.kick"
    }

    fn execute(&self, ctx: &CommandContext<'_>) -> CommandResult {
        let Some(target) = ctx.args.first() else {
            return CommandResult::err("Usage: kick <player> [reason]");
        };
        let Some(session) = ctx.sessions.by_name(target) else {
            return CommandResult::err(format!("No player named {target} is online."));
        };
        let reason = if ctx.args.len() > 1 {
            ctx.args[1..].join(" ")
        } else {
            "Kicked by an operator".to_owned()
        };
        if !session.handle.disconnect(reason) {
            return CommandResult::err(format!("{} is already disconnecting.", session.identity.display_name));
        }
        CommandResult::ok(format!("Kicked {}", session.identity.display_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_bridge_proto::jwt::Identity;
    use mc_bridge_proto::types::Uuid;

    fn registry(names: &[&str]) -> SessionRegistry {
        let registry = SessionRegistry::new();
        for (i, name) in names.iter().enumerate() {
            let identity = Identity {
                uuid: Uuid(i as u128 + 1),
                xuid: String::new(),
                display_name: (*name).into(),
            };
            registry.insert(SessionHandle::detached(i as u64 + 1), identity);
        }
        registry
    }

    fn player(name: &str) -> CommandSource {
        CommandSource::Session {
            handle: SessionHandle::detached(99),
            name: name.into(),
        }
    }

    #[test]
    fn list_counts_players() {
        let bridge = CommandBridge::default();
        let result = bridge.execute(&CommandSource::Console, "list", &registry(&["Steve", "Alex"]));
        assert!(result.success);
        assert_eq!(result.messages[0], "There are 2 players online: Alex, Steve");

        let result = bridge.execute(&CommandSource::Console, "LIST", &registry(&["Steve"]));
        assert_eq!(result.messages[0], "There is 1 player online: Steve");
    }

    #[test]
    fn players_need_operator_rights() {
        let sessions = registry(&["Steve"]);
        let bridge = CommandBridge::default();
        let result = bridge.execute(&player("Steve"), "list", &sessions);
        assert!(!result.success);
        assert!(result.messages[0].contains("permission"));

        let bridge = CommandBridge::new(Box::new(DefaultPermissions::new(["steve"])));
        assert!(bridge.execute(&player("Steve"), "list", &sessions).success);
    }

    #[test]
    fn kick_reports_missing_players() {
        let bridge = CommandBridge::default();
        let sessions = registry(&["Steve"]);
        let result = bridge.execute(&CommandSource::Console, "kick", &sessions);
        assert!(result.messages[0].starts_with("Usage"));
        let result = bridge.execute(&CommandSource::Console, "kick Herobrine", &sessions);
        assert!(!result.success);
        // a detached handle has no event loop to receive the kick
        let result = bridge.execute(&CommandSource::Console, "kick steve bye", &sessions);
        assert!(!result.success);
    }

    #[test]
    fn unknown_and_help() {
        let bridge = CommandBridge::default();
        let sessions = SessionRegistry::new();
        let result = bridge.execute(&CommandSource::Console, "teleport", &sessions);
        assert!(result.messages[0].contains("Unknown command"));
        let result = bridge.execute(&CommandSource::Console, "help", &sessions);
        assert_eq!(result.messages.len(), 3);
        assert!(!bridge.execute(&CommandSource::Console, "  ", &sessions).success);
    }

    struct Echo;

    impl CommandExecutor for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Repeat the arguments"
        }

        fn permission(&self) -> &str {
            "bridge.command.echo"
        }

        fn execute(&self, ctx: &CommandContext<'_>) -> CommandResult {
            CommandResult::ok(format!("{}: {}", ctx.source.name(), ctx.args.join(" ")))
        }
    }

    #[test]
    fn host_commands_plug_in() {
        let mut bridge = CommandBridge::default();
        bridge.register(Box::new(Echo));
        assert_eq!(bridge.names().collect::<Vec<_>>(), vec!["echo", "kick", "list"]);
        let result = bridge.execute(&CommandSource::Console, "echo a b", &SessionRegistry::new());
        assert_eq!(result.messages[0], "CONSOLE: a b");
    }
}
