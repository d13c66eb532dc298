//! Loose items lying in the world and the arena that owns them.
//!
//! Items created or destroyed while a phase is iterating are buffered in the
//! pool and only applied by [`ItemPool::apply_pending`] between phases, so a
//! sweep never sees an item appear or vanish under it.

use crate::fixed::Fixed64;
use crate::grid::PixelPosition;
use crate::id::{ItemId, ItemTypeId};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

/// A mobile unit of material with a continuous position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub position: PixelPosition,
    pub kind: ItemTypeId,
    /// Set while an inserter has claimed the item for removal.
    pub reserved: bool,
}

impl Item {
    pub fn new(kind: ItemTypeId, position: PixelPosition) -> Self {
        Self {
            position,
            kind,
            reserved: false,
        }
    }
}

/// Arena of loose items with deferred spawn and removal buffers.
///
/// Scan order is insertion order, tracked separately from the arena: slot
/// reuse inside a `SlotMap` does not survive a serialize round trip, and
/// scan order decides which item an inserter grabs first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPool {
    items: SlotMap<ItemId, Item>,
    order: Vec<ItemId>,
    pending_spawns: Vec<Item>,
    pending_removals: Vec<ItemId>,
}

impl ItemPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item immediately. For world setup outside a tick.
    pub fn insert(&mut self, item: Item) -> ItemId {
        let id = self.items.insert(item);
        self.order.push(id);
        id
    }

    /// Queue an item to appear once the current phase ends.
    pub fn spawn(&mut self, item: Item) {
        self.pending_spawns.push(item);
    }

    /// Queue an item for removal once the current phase ends.
    pub fn queue_removal(&mut self, id: ItemId) {
        self.pending_removals.push(id);
    }

    /// Claim an unreserved item: mark it reserved, queue its removal and
    /// return its kind. `None` if the item is gone or already claimed.
    pub fn take(&mut self, id: ItemId) -> Option<ItemTypeId> {
        let item = self.items.get_mut(id)?;
        if item.reserved {
            return None;
        }
        item.reserved = true;
        self.pending_removals.push(id);
        Some(item.kind)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(id)
    }

    /// Snapshot of the live item ids in scan order.
    pub fn ids(&self) -> Vec<ItemId> {
        self.order.clone()
    }

    /// Live items in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.order
            .iter()
            .filter_map(|&id| self.items.get(id).map(|item| (id, item)))
    }

    /// Number of live items (pending spawns excluded).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any item, live or spawned earlier in this phase, lies strictly
    /// within `radius` of `center`.
    pub fn any_within(&self, center: PixelPosition, radius: Fixed64) -> bool {
        self.items.values().any(|i| i.position.within(center, radius))
            || self.pending_spawns.iter().any(|i| i.position.within(center, radius))
    }

    /// First unreserved live item within `radius` of `center`, in scan order.
    pub fn find_unreserved_within(&self, center: PixelPosition, radius: Fixed64) -> Option<ItemId> {
        self.iter()
            .find(|(_, i)| !i.reserved && i.position.within(center, radius))
            .map(|(id, _)| id)
    }

    /// Apply queued removals, then queued spawns. Returns the ids of the
    /// spawned items.
    pub fn apply_pending(&mut self) -> Vec<ItemId> {
        if !self.pending_removals.is_empty() {
            for id in self.pending_removals.drain(..) {
                self.items.remove(id);
            }
            let items = &self.items;
            self.order.retain(|&id| items.contains_key(id));
        }
        let spawns = std::mem::take(&mut self.pending_spawns);
        spawns.into_iter().map(|item| self.insert(item)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(x: i32, y: i32) -> PixelPosition {
        PixelPosition::new(Fixed64::from_num(x), Fixed64::from_num(y))
    }

    #[test]
    fn spawn_is_deferred() {
        let mut pool = ItemPool::new();
        pool.spawn(Item::new(ItemTypeId(0), px(16, 16)));
        assert!(pool.is_empty());
        assert!(pool.any_within(px(16, 16), Fixed64::from_num(1)));

        let spawned = pool.apply_pending();
        assert_eq!(spawned.len(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn take_reserves_and_removes_once() {
        let mut pool = ItemPool::new();
        let id = pool.insert(Item::new(ItemTypeId(2), px(0, 0)));

        assert_eq!(pool.take(id), Some(ItemTypeId(2)));
        assert!(pool.get(id).unwrap().reserved);
        assert_eq!(pool.take(id), None);
        assert_eq!(pool.find_unreserved_within(px(0, 0), Fixed64::from_num(10)), None);

        pool.apply_pending();
        assert!(pool.get(id).is_none());
    }

    #[test]
    fn scan_order_is_insertion_order() {
        let mut pool = ItemPool::new();
        let a = pool.insert(Item::new(ItemTypeId(0), px(0, 0)));
        let b = pool.insert(Item::new(ItemTypeId(1), px(0, 0)));
        pool.queue_removal(a);
        pool.apply_pending();
        // The new item may reuse a's slot but still scans after b.
        let c = pool.insert(Item::new(ItemTypeId(2), px(0, 0)));
        assert_eq!(pool.ids(), vec![b, c]);
        assert_eq!(pool.find_unreserved_within(px(0, 0), Fixed64::from_num(1)), Some(b));
    }

    #[test]
    fn find_respects_radius() {
        let mut pool = ItemPool::new();
        pool.insert(Item::new(ItemTypeId(0), px(20, 0)));
        let near = pool.insert(Item::new(ItemTypeId(1), px(5, 0)));
        assert_eq!(pool.find_unreserved_within(px(0, 0), Fixed64::from_num(10)), Some(near));
    }
}
