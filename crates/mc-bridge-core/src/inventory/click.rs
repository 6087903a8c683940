//! Bedrock item stack requests replayed as Java window clicks.
//!
//! Each action is planned as a sequence of clicks, the clicks are run
//! through a local model of the Java click rules, and the outcome is
//! compared against what the Bedrock client expects. Any mismatch rejects
//! the whole request before a single click is sent.

use std::collections::{BTreeMap, BTreeSet};

use mc_bridge_proto::bedrock::{
    container_slot, FullContainerName, StackAction, StackRequest, StackRequestSlot, StackResponse,
    StackResponseContainer, StackResponseSlot,
};
use mc_bridge_proto::java::play::{click_mode, ClickContainer};
use mc_bridge_proto::java::slot::JavaItem;

use crate::inventory::{BedrockSlot, InventoryTranslator};
use crate::item::same_item;

/// Slot index Java uses for clicks outside the window.
pub const OUTSIDE: i16 = -999;

const LEFT: i8 = 0;
const RIGHT: i8 = 1;

/// No single request should need more clicks than a full stack of right
/// clicks on every touched slot.
const MAX_CLICKS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Loc {
    Cursor,
    Slot(usize),
}

/// Java window contents the simulation runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    pub slots: Vec<Option<JavaItem>>,
    pub cursor: Option<JavaItem>,
}

impl WindowState {
    fn get(&self, loc: Loc) -> Option<&JavaItem> {
        match loc {
            Loc::Cursor => self.cursor.as_ref(),
            Loc::Slot(i) => self.slots.get(i).and_then(Option::as_ref),
        }
    }

    fn put(&mut self, loc: Loc, item: Option<JavaItem>) {
        let item = item.filter(|i| i.count > 0);
        match loc {
            Loc::Cursor => self.cursor = item,
            Loc::Slot(i) => {
                if let Some(slot) = self.slots.get_mut(i) {
                    *slot = item;
                }
            }
        }
    }

    fn count(&self, loc: Loc) -> i32 {
        self.get(loc).map_or(0, |i| i.count)
    }
}

fn with_count(item: &JavaItem, count: i32) -> Option<JavaItem> {
    (count > 0).then(|| JavaItem {
        count,
        ..item.clone()
    })
}

/// Clicks produced for one request plus the state they lead to.
#[derive(Debug)]
pub struct Plan {
    pub clicks: Vec<ClickContainer>,
    pub state: WindowState,
    touched: BTreeSet<Loc>,
}

struct Simulator<'a> {
    state: WindowState,
    limit: &'a dyn Fn(&JavaItem) -> i32,
    window_id: u8,
    state_id: i32,
    clicks: Vec<ClickContainer>,
}

impl Simulator<'_> {
    /// Applies one click with Java's pickup and throw rules.
    fn click(&mut self, slot: i16, button: i8, mode: i32) -> Option<()> {
        if self.clicks.len() >= MAX_CLICKS {
            return None;
        }
        let mut changed = Vec::new();
        if slot == OUTSIDE {
            let cursor = self.state.cursor.clone()?;
            let left = if button == LEFT { 0 } else { cursor.count - 1 };
            self.state.put(Loc::Cursor, with_count(&cursor, left));
        } else {
            let index = usize::try_from(slot).ok().filter(|i| *i < self.state.slots.len())?;
            let loc = Loc::Slot(index);
            match mode {
                click_mode::PICKUP => self.pickup(loc, button)?,
                click_mode::THROW => {
                    let item = self.state.get(loc)?.clone();
                    let left = if button == LEFT { item.count - 1 } else { 0 };
                    self.state.put(loc, with_count(&item, left));
                }
                _ => return None,
            }
            changed.push((slot, self.state.get(loc).cloned()));
        }
        self.clicks.push(ClickContainer {
            window_id: self.window_id,
            state_id: self.state_id,
            slot,
            button,
            mode,
            changed,
            carried: self.state.cursor.clone(),
        });
        Some(())
    }

    fn pickup(&mut self, loc: Loc, button: i8) -> Option<()> {
        let slot = self.state.get(loc).cloned();
        let cursor = self.state.cursor.clone();
        match (slot, cursor) {
            (None, None) => {}
            (Some(slot), None) => {
                let taken = if button == LEFT { slot.count } else { (slot.count + 1) / 2 };
                self.state.put(Loc::Cursor, with_count(&slot, taken));
                self.state.put(loc, with_count(&slot, slot.count - taken));
            }
            (None, Some(cursor)) => {
                let limit = (self.limit)(&cursor);
                let placed = if button == LEFT { cursor.count.min(limit) } else { 1 };
                self.state.put(loc, with_count(&cursor, placed));
                self.state.put(Loc::Cursor, with_count(&cursor, cursor.count - placed));
            }
            (Some(slot), Some(cursor)) if same_item(&slot, &cursor) => {
                let room = ((self.limit)(&slot) - slot.count).max(0);
                let moved = if button == LEFT { cursor.count.min(room) } else { room.min(1) };
                self.state.put(loc, with_count(&slot, slot.count + moved));
                self.state.put(Loc::Cursor, with_count(&cursor, cursor.count - moved));
            }
            (Some(slot), Some(cursor)) => {
                if cursor.count > (self.limit)(&cursor) {
                    return None;
                }
                self.state.put(loc, Some(cursor));
                self.state.put(Loc::Cursor, Some(slot));
            }
        }
        Some(())
    }

    fn left(&mut self, loc: Loc) -> Option<()> {
        self.click(slot_id(loc)?, LEFT, click_mode::PICKUP)
    }

    fn right(&mut self, loc: Loc) -> Option<()> {
        self.click(slot_id(loc)?, RIGHT, click_mode::PICKUP)
    }

    /// Moves `count` items from a slot into the cursor.
    fn take(&mut self, from: Loc, count: i32) -> Option<()> {
        let target = self.state.count(Loc::Cursor) + count;
        if self.state.cursor.is_some() {
            // merge the cursor into the slot first; it must fit entirely
            self.left(from)?;
            if self.state.cursor.is_some() {
                return None;
            }
        }
        let total = self.state.count(from);
        if target > total || target <= 0 {
            return None;
        }
        if target == (total + 1) / 2 && target != total {
            return self.right(from);
        }
        self.left(from)?;
        for _ in 0..(total - target) {
            self.right(from)?;
        }
        Some(())
    }

    /// Moves `count` items from the cursor into a slot.
    fn place(&mut self, to: Loc, count: i32) -> Option<()> {
        if count == self.state.count(Loc::Cursor) {
            return self.left(to);
        }
        for _ in 0..count {
            self.right(to)?;
        }
        Some(())
    }
}

fn slot_id(loc: Loc) -> Option<i16> {
    match loc {
        Loc::Cursor => None,
        Loc::Slot(i) => i16::try_from(i).ok(),
    }
}

/// What the Bedrock client believes the action does.
fn expect_move(state: &mut WindowState, from: Loc, to: Loc, count: i32) -> Option<()> {
    let source = state.get(from)?.clone();
    if count <= 0 || count > source.count {
        return None;
    }
    let destination = match state.get(to) {
        None => with_count(&source, count),
        Some(existing) if same_item(existing, &source) => with_count(existing, existing.count + count),
        Some(_) => return None,
    };
    state.put(from, with_count(&source, source.count - count));
    state.put(to, destination);
    Some(())
}

fn expect_swap(state: &mut WindowState, a: Loc, b: Loc) {
    let first = state.get(a).cloned();
    let second = state.get(b).cloned();
    state.put(a, second);
    state.put(b, first);
}

fn expect_drop(state: &mut WindowState, from: Loc, count: i32) -> Option<()> {
    let source = state.get(from)?.clone();
    if count <= 0 || count > source.count {
        return None;
    }
    state.put(from, with_count(&source, source.count - count));
    Some(())
}

fn resolve(translator: &dyn InventoryTranslator, slot: &StackRequestSlot) -> Option<Loc> {
    if slot.container.id == container_slot::CURSOR {
        return Some(Loc::Cursor);
    }
    translator
        .bedrock_to_java(BedrockSlot::new(slot.container.id, slot.slot))
        .map(Loc::Slot)
}

/// Plans every action of `request`. `None` means the request must be
/// rejected and nothing sent.
pub fn plan(
    translator: &dyn InventoryTranslator,
    state: &WindowState,
    request: &StackRequest,
    window_id: u8,
    state_id: i32,
    limit: &dyn Fn(&JavaItem) -> i32,
) -> Option<Plan> {
    let mut sim = Simulator {
        state: state.clone(),
        limit,
        window_id,
        state_id,
        clicks: Vec::new(),
    };
    let mut expected = state.clone();
    let mut touched = BTreeSet::new();

    for action in &request.actions {
        match action {
            StackAction::Take { count, source, destination }
            | StackAction::Place { count, source, destination } => {
                let from = resolve(translator, source)?;
                let to = resolve(translator, destination)?;
                let count = *count as i32;
                expect_move(&mut expected, from, to, count)?;
                match (from, to) {
                    (Loc::Slot(_), Loc::Cursor) => sim.take(from, count)?,
                    (Loc::Cursor, Loc::Slot(_)) => sim.place(to, count)?,
                    (Loc::Slot(_), Loc::Slot(_)) if sim.state.cursor.is_none() => {
                        sim.take(from, count)?;
                        sim.place(to, count)?;
                    }
                    _ => return None,
                }
                touched.extend([from, to]);
            }
            StackAction::Swap { source, destination } => {
                let a = resolve(translator, source)?;
                let b = resolve(translator, destination)?;
                expect_swap(&mut expected, a, b);
                match (a, b) {
                    (Loc::Slot(_), Loc::Slot(_)) if sim.state.cursor.is_none() => {
                        sim.left(a)?;
                        sim.left(b)?;
                        sim.left(a)?;
                    }
                    (Loc::Cursor, slot @ Loc::Slot(_)) | (slot @ Loc::Slot(_), Loc::Cursor) => {
                        sim.left(slot)?
                    }
                    _ => return None,
                }
                touched.extend([a, b]);
            }
            StackAction::Drop { count, source, .. } => {
                let from = resolve(translator, source)?;
                let count = *count as i32;
                let total = sim.state.count(from);
                expect_drop(&mut expected, from, count)?;
                match from {
                    Loc::Cursor if count == total => sim.click(OUTSIDE, LEFT, click_mode::PICKUP)?,
                    Loc::Cursor => {
                        for _ in 0..count {
                            sim.click(OUTSIDE, RIGHT, click_mode::PICKUP)?;
                        }
                    }
                    Loc::Slot(_) if sim.state.cursor.is_some() => return None,
                    Loc::Slot(_) => {
                        let slot = slot_id(from)?;
                        if count == total {
                            sim.click(slot, RIGHT, click_mode::THROW)?;
                        } else {
                            for _ in 0..count {
                                sim.click(slot, LEFT, click_mode::THROW)?;
                            }
                        }
                    }
                }
                touched.insert(from);
            }
            // creative destruction and crafting consumption are server side
            StackAction::Destroy { .. } | StackAction::Consume { .. } => return None,
        }
    }

    (sim.state == expected).then_some(Plan {
        clicks: sim.clicks,
        state: sim.state,
        touched,
    })
}

impl Plan {
    /// Success response listing every touched slot with its new contents.
    pub fn response(
        &self,
        request_id: i32,
        translator: &dyn InventoryTranslator,
        mut next_stack_id: impl FnMut() -> i32,
    ) -> StackResponse {
        let mut containers: BTreeMap<u8, Vec<StackResponseSlot>> = BTreeMap::new();
        for loc in &self.touched {
            let target = match loc {
                Loc::Cursor => BedrockSlot::new(container_slot::CURSOR, 0),
                Loc::Slot(java) => match translator.java_to_bedrock(*java) {
                    Some(target) => target,
                    None => continue,
                },
            };
            let count = self.state.count(*loc).clamp(0, u8::MAX as i32) as u8;
            let stack_network_id = if count > 0 { next_stack_id() } else { 0 };
            containers.entry(target.container).or_default().push(StackResponseSlot {
                slot: target.slot,
                hotbar_slot: target.slot,
                count,
                stack_network_id,
                ..StackResponseSlot::default()
            });
        }
        StackResponse {
            status: 0,
            request_id,
            containers: containers
                .into_iter()
                .map(|(container, slots)| StackResponseContainer {
                    container: FullContainerName::new(container),
                    slots,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::{GenericTranslator, PlayerTranslator};
    use mc_bridge_proto::bedrock::container_slot as cs;

    const EMERALD: i32 = 807;
    const DIAMOND: i32 = 808;

    fn limit(_: &JavaItem) -> i32 {
        64
    }

    fn at(container: u8, slot: u8) -> StackRequestSlot {
        StackRequestSlot {
            container: FullContainerName::new(container),
            slot,
            stack_network_id: 0,
        }
    }

    fn cursor() -> StackRequestSlot {
        at(cs::CURSOR, 0)
    }

    fn request(actions: Vec<StackAction>) -> StackRequest {
        StackRequest {
            request_id: 7,
            actions,
            filter_strings: Vec::new(),
            filter_cause: 0,
        }
    }

    fn chest_with(items: &[(usize, i32, i32)]) -> WindowState {
        let mut slots = vec![None; GenericTranslator { rows: 3 }.total_slots()];
        for (slot, id, count) in items {
            slots[*slot] = Some(JavaItem::new(*id, *count));
        }
        WindowState { slots, cursor: None }
    }

    fn run(state: &WindowState, actions: Vec<StackAction>) -> Option<Plan> {
        plan(&GenericTranslator { rows: 3 }, state, &request(actions), 3, 11, &limit)
    }

    #[test]
    fn taking_a_full_stack_is_one_left_click() {
        let state = chest_with(&[(0, EMERALD, 10)]);
        let plan = run(
            &state,
            vec![StackAction::Take { count: 10, source: at(cs::LEVEL_ENTITY, 0), destination: cursor() }],
        )
        .unwrap();
        assert_eq!(plan.clicks.len(), 1);
        let click = &plan.clicks[0];
        assert_eq!((click.window_id, click.state_id, click.slot, click.button), (3, 11, 0, LEFT));
        assert_eq!(click.changed, vec![(0, None)]);
        assert_eq!(click.carried.as_ref().map(|i| i.count), Some(10));
    }

    #[test]
    fn taking_half_is_one_right_click() {
        let state = chest_with(&[(0, EMERALD, 9)]);
        let plan = run(
            &state,
            vec![StackAction::Take { count: 5, source: at(cs::LEVEL_ENTITY, 0), destination: cursor() }],
        )
        .unwrap();
        assert_eq!(plan.clicks.len(), 1);
        assert_eq!(plan.clicks[0].button, RIGHT);
        assert_eq!(plan.state.slots[0].as_ref().map(|i| i.count), Some(4));
    }

    #[test]
    fn odd_takes_pick_up_then_return() {
        let state = chest_with(&[(0, EMERALD, 10)]);
        let plan = run(
            &state,
            vec![StackAction::Take { count: 3, source: at(cs::LEVEL_ENTITY, 0), destination: cursor() }],
        )
        .unwrap();
        assert_eq!(plan.clicks.len(), 8);
        assert_eq!(plan.state.cursor.as_ref().map(|i| i.count), Some(3));
        assert_eq!(plan.state.slots[0].as_ref().map(|i| i.count), Some(7));
    }

    #[test]
    fn take_then_place_into_player_storage() {
        let state = chest_with(&[(0, EMERALD, 10)]);
        let plan = run(
            &state,
            vec![
                StackAction::Take { count: 10, source: at(cs::LEVEL_ENTITY, 0), destination: cursor() },
                StackAction::Place { count: 4, source: cursor(), destination: at(cs::HOTBAR, 0) },
            ],
        )
        .unwrap();
        // hotbar 0 is window slot 27 + 27
        assert_eq!(plan.state.slots[54].as_ref().map(|i| i.count), Some(4));
        assert_eq!(plan.state.cursor.as_ref().map(|i| i.count), Some(6));

        let response = plan.response(7, &GenericTranslator { rows: 3 }, || 1);
        assert_eq!(response.status, 0);
        let ids: Vec<u8> = response.containers.iter().map(|c| c.container.id).collect();
        assert_eq!(ids, vec![cs::LEVEL_ENTITY, cs::HOTBAR, cs::CURSOR]);
    }

    #[test]
    fn swap_between_slots_uses_three_clicks() {
        let state = chest_with(&[(0, EMERALD, 10), (1, DIAMOND, 2)]);
        let plan = run(
            &state,
            vec![StackAction::Swap { source: at(cs::LEVEL_ENTITY, 0), destination: at(cs::LEVEL_ENTITY, 1) }],
        )
        .unwrap();
        assert_eq!(plan.clicks.len(), 3);
        assert_eq!(plan.state.slots[0].as_ref().map(|i| i.item_id), Some(DIAMOND));
        assert_eq!(plan.state.slots[1].as_ref().map(|i| i.item_id), Some(EMERALD));
        assert!(plan.state.cursor.is_none());
    }

    #[test]
    fn drops_from_cursor_and_slot() {
        let mut state = chest_with(&[(2, EMERALD, 5)]);
        state.cursor = Some(JavaItem::new(DIAMOND, 3));
        let plan = run(
            &state,
            vec![StackAction::Drop { count: 3, source: cursor(), randomly: false }],
        )
        .unwrap();
        assert_eq!(plan.clicks[0].slot, OUTSIDE);
        assert!(plan.state.cursor.is_none());

        let state = chest_with(&[(2, EMERALD, 5)]);
        let plan = run(
            &state,
            vec![StackAction::Drop { count: 2, source: at(cs::LEVEL_ENTITY, 2), randomly: false }],
        )
        .unwrap();
        assert_eq!(plan.clicks.len(), 2);
        assert!(plan.clicks.iter().all(|c| c.mode == click_mode::THROW));
        assert_eq!(plan.state.slots[2].as_ref().map(|i| i.count), Some(3));
    }

    #[test]
    fn unmapped_slots_reject_the_whole_request() {
        let state = chest_with(&[(0, EMERALD, 10)]);
        assert!(run(
            &state,
            vec![
                StackAction::Take { count: 10, source: at(cs::LEVEL_ENTITY, 0), destination: cursor() },
                StackAction::Place { count: 10, source: cursor(), destination: at(cs::LEVEL_ENTITY, 30) },
            ],
        )
        .is_none());
    }

    #[test]
    fn impossible_moves_are_rejected() {
        let state = chest_with(&[(0, EMERALD, 10), (1, DIAMOND, 1)]);
        // more than the slot holds
        assert!(run(
            &state,
            vec![StackAction::Take { count: 11, source: at(cs::LEVEL_ENTITY, 0), destination: cursor() }],
        )
        .is_none());
        // onto a different item
        assert!(run(
            &state,
            vec![StackAction::Place { count: 1, source: at(cs::LEVEL_ENTITY, 0), destination: at(cs::LEVEL_ENTITY, 1) }],
        )
        .is_none());
        assert!(run(&state, vec![StackAction::Destroy { count: 1, source: at(cs::LEVEL_ENTITY, 0) }]).is_none());
    }

    #[test]
    fn stack_limits_stop_merges() {
        let translator = PlayerTranslator;
        let mut slots = vec![None; translator.total_slots()];
        slots[36] = Some(JavaItem::new(EMERALD, 14));
        let state = WindowState { slots, cursor: Some(JavaItem::new(EMERALD, 4)) };
        let sixteen = |_: &JavaItem| 16;
        let req = request(vec![StackAction::Place { count: 4, source: cursor(), destination: at(cs::HOTBAR, 0) }]);
        assert!(plan(&translator, &state, &req, 0, 1, &sixteen).is_none());
        let req = request(vec![StackAction::Place { count: 2, source: cursor(), destination: at(cs::HOTBAR, 0) }]);
        let plan = plan(&translator, &state, &req, 0, 1, &sixteen).unwrap();
        assert_eq!(plan.state.slots[36].as_ref().map(|i| i.count), Some(16));
    }
}
