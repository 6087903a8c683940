//! Default packet translators for both directions.

pub mod bedrock;
pub mod java;

use std::sync::Arc;

use mc_bridge_proto::bedrock::ContainerClose;

use crate::context::{BedrockRegistry, JavaRegistry};
use crate::session::Session;

pub fn register_defaults(java: &mut JavaRegistry, bedrock: &mut BedrockRegistry) {
    java::register(java);
    bedrock::register(bedrock);
}

/// Forgets the open container, puts back the block it was shown through and
/// closes the window on the client. Returns the Java window that was open.
pub(crate) fn close_container(s: &mut Session, server_initiated: bool) -> Option<u8> {
    let open = s.inventory_mut().close_container()?;
    if !open.fake_blocks.is_empty() {
        let context = Arc::clone(s.context());
        let mappings = Arc::clone(s.mappings());
        for fake in &open.fake_blocks {
            for update in fake.restore(&context.registries, &mappings) {
                s.send_downstream(&update);
            }
        }
    }
    if open.shown {
        s.send_downstream(&ContainerClose {
            window_id: open.bedrock_window,
            container_type: open.translator.bedrock_type(),
            server_initiated,
        });
    }
    Some(open.java_window)
}
