//! Player inventory, the open container and pending stack requests.

use std::collections::VecDeque;

use mc_bridge_proto::java::slot::JavaItem;

use crate::inventory::click::WindowState;
use crate::inventory::virtual_block::FakeBlock;
use crate::inventory::{ContainerKind, InventoryTranslator, PLAYER_WINDOW_SLOTS};

/// First player window slot that is shared with every container window.
const STORAGE_START: usize = 9;
const STORAGE_END: usize = 45;

/// Bedrock container window ids handed out to open containers.
const FIRST_WINDOW: u8 = 1;
const LAST_WINDOW: u8 = 99;

/// Requests remembered for correlating late responses.
const PENDING_LIMIT: usize = 64;

#[derive(Debug)]
pub struct OpenContainer {
    pub java_window: u8,
    pub kind: ContainerKind,
    pub translator: Box<dyn InventoryTranslator>,
    pub bedrock_window: u8,
    /// The container's own slots only.
    pub items: Vec<Option<JavaItem>>,
    /// Blocks shown in place of the world while the window is open.
    pub fake_blocks: Vec<FakeBlock>,
    /// Java id of the entity owning the container, for horses.
    pub entity_id: Option<i32>,
    /// Set once the client has been told to open the window.
    pub shown: bool,
}

#[derive(Debug)]
pub struct InventoryCache {
    player: Vec<Option<JavaItem>>,
    player_translator: Box<dyn InventoryTranslator>,
    open: Option<OpenContainer>,
    pub carried: Option<JavaItem>,
    pub state_id: i32,
    pending: VecDeque<i32>,
    next_window: u8,
    pub held_slot: u8,
    next_stack_id: i32,
}

impl Default for InventoryCache {
    fn default() -> Self {
        Self {
            player: vec![None; PLAYER_WINDOW_SLOTS],
            player_translator: ContainerKind::Player.translator(),
            open: None,
            carried: None,
            state_id: 0,
            pending: VecDeque::new(),
            next_window: FIRST_WINDOW,
            held_slot: 0,
            next_stack_id: 1,
        }
    }
}

impl InventoryCache {
    pub fn player_items(&self) -> &[Option<JavaItem>] {
        &self.player
    }

    pub fn open(&self) -> Option<&OpenContainer> {
        self.open.as_ref()
    }

    pub fn open_mut(&mut self) -> Option<&mut OpenContainer> {
        self.open.as_mut()
    }

    /// Registers a newly opened Java window and returns its Bedrock window id.
    pub fn open_container(&mut self, java_window: u8, kind: ContainerKind, entity_id: Option<i32>) -> u8 {
        let translator = kind.translator();
        let bedrock_window = self.allocate_window();
        self.open = Some(OpenContainer {
            java_window,
            kind,
            items: vec![None; translator.size()],
            translator,
            bedrock_window,
            fake_blocks: Vec::new(),
            entity_id,
            shown: false,
        });
        bedrock_window
    }

    fn allocate_window(&mut self) -> u8 {
        let id = self.next_window;
        self.next_window = if id >= LAST_WINDOW { FIRST_WINDOW } else { id + 1 };
        id
    }

    pub fn close_container(&mut self) -> Option<OpenContainer> {
        self.open.take()
    }

    /// Translator and Bedrock window for a Java window id, if it is the player
    /// window or the open container.
    pub fn window(&self, java_window: u8) -> Option<(&dyn InventoryTranslator, u8)> {
        if java_window == 0 {
            return Some((self.player_translator.as_ref(), 0));
        }
        self.open
            .as_ref()
            .filter(|o| o.java_window == java_window)
            .map(|o| (o.translator.as_ref(), o.bedrock_window))
    }

    /// Java window whose slots the client is currently acting on.
    pub fn active_window(&self) -> u8 {
        self.open.as_ref().map_or(0, |o| o.java_window)
    }

    /// Player slot backing a container window slot.
    fn player_slot(&self, java_window: u8, slot: usize) -> Option<usize> {
        if java_window == 0 {
            return (slot < PLAYER_WINDOW_SLOTS).then_some(slot);
        }
        let size = self.open.as_ref()?.translator.size();
        let storage = slot.checked_sub(size)?;
        (STORAGE_START + storage < STORAGE_END).then_some(STORAGE_START + storage)
    }

    pub fn set_slot(&mut self, java_window: u8, slot: usize, item: Option<JavaItem>) -> bool {
        if java_window != 0 {
            let Some(open) = self.open.as_mut().filter(|o| o.java_window == java_window) else {
                return false;
            };
            if let Some(own) = open.items.get_mut(slot) {
                *own = item;
                return true;
            }
        }
        match self.player_slot(java_window, slot) {
            Some(index) => {
                self.player[index] = item;
                true
            }
            None => false,
        }
    }

    pub fn slot(&self, java_window: u8, slot: usize) -> Option<&JavaItem> {
        if java_window != 0 {
            let open = self.open.as_ref().filter(|o| o.java_window == java_window)?;
            if slot < open.items.len() {
                return open.items[slot].as_ref();
            }
        }
        let index = self.player_slot(java_window, slot)?;
        self.player[index].as_ref()
    }

    /// Replaces a whole window's contents.
    pub fn set_contents(&mut self, java_window: u8, items: Vec<Option<JavaItem>>) -> bool {
        if self.window(java_window).is_none() {
            return false;
        }
        for (slot, item) in items.into_iter().enumerate() {
            self.set_slot(java_window, slot, item);
        }
        true
    }

    /// Full window as the Java server sees it.
    pub fn window_state(&self, java_window: u8) -> Option<WindowState> {
        let (translator, _) = self.window(java_window)?;
        let slots = (0..translator.total_slots())
            .map(|slot| self.slot(java_window, slot).cloned())
            .collect();
        Some(WindowState {
            slots,
            cursor: self.carried.clone(),
        })
    }

    pub fn apply_window_state(&mut self, java_window: u8, state: WindowState) {
        for (slot, item) in state.slots.into_iter().enumerate() {
            self.set_slot(java_window, slot, item);
        }
        self.carried = state.cursor;
    }

    pub fn push_pending(&mut self, request_id: i32) {
        if self.pending.len() == PENDING_LIMIT {
            self.pending.pop_front();
        }
        self.pending.push_back(request_id);
    }

    pub fn take_pending(&mut self, request_id: i32) -> bool {
        match self.pending.iter().position(|id| *id == request_id) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn next_stack_id(&mut self) -> i32 {
        let id = self.next_stack_id;
        self.next_stack_id = self.next_stack_id.wrapping_add(1).max(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_windows_share_player_storage() {
        let mut cache = InventoryCache::default();
        let window = cache.open_container(3, ContainerKind::Generic { rows: 1 }, None);
        assert_eq!(window, FIRST_WINDOW);
        // container slot 9 is the first main storage slot, player slot 9
        assert!(cache.set_slot(3, 9, Some(JavaItem::new(807, 2))));
        assert_eq!(cache.slot(0, 9).map(|i| i.count), Some(2));
        assert!(cache.set_slot(3, 0, Some(JavaItem::new(808, 1))));
        assert!(cache.slot(0, 0).is_none());
        // hotbar 8 is the last slot of the window
        assert!(cache.set_slot(3, 44, Some(JavaItem::new(1, 1))));
        assert!(cache.slot(0, 44).is_some());
        assert!(!cache.set_slot(3, 45, None));
        assert!(!cache.set_slot(4, 0, None));
    }

    #[test]
    fn window_ids_wrap() {
        let mut cache = InventoryCache::default();
        let ids: Vec<u8> = (0..100).map(|_| cache.open_container(1, ContainerKind::Beacon, None)).collect();
        assert_eq!(ids[0], 1);
        assert_eq!(ids[98], 99);
        assert_eq!(ids[99], 1);
    }

    #[test]
    fn window_state_round_trip() {
        let mut cache = InventoryCache::default();
        cache.open_container(2, ContainerKind::Furnace, None);
        cache.set_slot(2, 0, Some(JavaItem::new(5, 3)));
        let mut state = cache.window_state(2).unwrap();
        assert_eq!(state.slots.len(), 39);
        state.cursor = state.slots[0].take();
        cache.apply_window_state(2, state);
        assert!(cache.slot(2, 0).is_none());
        assert_eq!(cache.carried.as_ref().map(|i| i.count), Some(3));
    }

    #[test]
    fn pending_requests_are_bounded() {
        let mut cache = InventoryCache::default();
        for id in 0..(PENDING_LIMIT as i32 + 5) {
            cache.push_pending(id);
        }
        assert_eq!(cache.pending_len(), PENDING_LIMIT);
        assert!(!cache.take_pending(0));
        assert!(cache.take_pending(10));
        assert!(!cache.take_pending(10));
    }
}
