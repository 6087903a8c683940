//! Session translation between a Bedrock client and a Java server.
//!
//! A [`Session`] owns everything mirrored from the Java server for one
//! player. It runs inside its own task (see [`spawn_session`]) and every
//! packet in either direction goes through the [`dispatch`] registries built
//! once per process in [`Translators`].

pub mod cache;
pub mod command;
pub mod context;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod inventory;
pub mod item;
pub mod session;
pub mod session_registry;
pub mod translator;
pub mod world_manager;

#[cfg(test)]
mod test_support;

pub use command::{CommandBridge, CommandExecutor, CommandResult, CommandSource, PermissionChecker};
pub use context::{BedrockRegistry, BridgeContext, BridgeSettings, JavaRegistry, Translators};
pub use dispatch::{DispatchOutcome, HandlerOptions, HandlerState, Priority};
pub use error::BridgeError;
pub use session::{
    spawn_session, Dimension, DownstreamSink, Job, Outbound, Session, SessionEvent, SessionHandle, SessionPhase,
    UpstreamSink,
};
pub use session_registry::{OnlineSession, SessionRegistry};
pub use world_manager::{CachedWorldManager, GameMode, WorldManager};
