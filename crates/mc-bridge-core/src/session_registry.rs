//! Authenticated sessions, looked up by uuid, xuid or name.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use mc_bridge_proto::jwt::Identity;
use mc_bridge_proto::types::Uuid;

use crate::session::SessionHandle;

#[derive(Debug, Clone)]
pub struct OnlineSession {
    pub handle: SessionHandle,
    pub identity: Identity,
}

#[derive(Debug, Default)]
struct Maps {
    by_id: HashMap<u64, OnlineSession>,
    by_uuid: HashMap<Uuid, u64>,
    by_xuid: HashMap<String, u64>,
    by_name: HashMap<String, u64>,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    maps: RwLock<Maps>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Maps> {
        self.maps.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Maps> {
        self.maps.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a session. Returns the session previously holding the same uuid,
    /// which the caller should disconnect.
    pub fn insert(&self, handle: SessionHandle, identity: Identity) -> Option<OnlineSession> {
        let mut maps = self.write();
        let previous = maps
            .by_uuid
            .get(&identity.uuid)
            .copied()
            .filter(|id| *id != handle.id())
            .and_then(|id| remove_locked(&mut maps, id));
        let id = handle.id();
        maps.by_uuid.insert(identity.uuid, id);
        if !identity.xuid.is_empty() {
            maps.by_xuid.insert(identity.xuid.clone(), id);
        }
        maps.by_name.insert(identity.display_name.to_lowercase(), id);
        maps.by_id.insert(id, OnlineSession { handle, identity });
        previous
    }

    pub fn remove(&self, id: u64) -> Option<OnlineSession> {
        remove_locked(&mut self.write(), id)
    }

    pub fn get(&self, id: u64) -> Option<OnlineSession> {
        self.read().by_id.get(&id).cloned()
    }

    pub fn by_uuid(&self, uuid: Uuid) -> Option<OnlineSession> {
        let maps = self.read();
        maps.by_uuid.get(&uuid).and_then(|id| maps.by_id.get(id)).cloned()
    }

    pub fn by_xuid(&self, xuid: &str) -> Option<OnlineSession> {
        let maps = self.read();
        maps.by_xuid.get(xuid).and_then(|id| maps.by_id.get(id)).cloned()
    }

    /// Case-insensitive.
    pub fn by_name(&self, name: &str) -> Option<OnlineSession> {
        let maps = self.read();
        maps.by_name
            .get(&name.to_lowercase())
            .and_then(|id| maps.by_id.get(id))
            .cloned()
    }

    /// Sorted by display name.
    pub fn online(&self) -> Vec<OnlineSession> {
        let mut sessions: Vec<OnlineSession> = self.read().by_id.values().cloned().collect();
        sessions.sort_by(|a, b| a.identity.display_name.cmp(&b.identity.display_name));
        sessions
    }

    pub fn count(&self) -> usize {
        self.read().by_id.len()
    }
}

fn remove_locked(maps: &mut Maps, id: u64) -> Option<OnlineSession> {
    let session = maps.by_id.remove(&id)?;
    let identity = &session.identity;
    if maps.by_uuid.get(&identity.uuid) == Some(&id) {
        maps.by_uuid.remove(&identity.uuid);
    }
    if maps.by_xuid.get(&identity.xuid) == Some(&id) {
        maps.by_xuid.remove(&identity.xuid);
    }
    let name = identity.display_name.to_lowercase();
    if maps.by_name.get(&name) == Some(&id) {
        maps.by_name.remove(&name);
    }
    Some(session)
}
