//! Bedrock client → Java server.

mod chat;
mod inventory;

use crate::context::BedrockRegistry;

pub fn register(registry: &mut BedrockRegistry) {
    chat::register(registry);
    inventory::register(registry);
}
