//! Java server → Bedrock client.

mod entity;
mod inventory;
mod play;
mod world;

use crate::context::JavaRegistry;

pub fn register(registry: &mut JavaRegistry) {
    play::register(registry);
    world::register(registry);
    entity::register(registry);
    inventory::register(registry);
}
