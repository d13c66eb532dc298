use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};

/// A stack of fungible items of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, quantity: u32) -> Self {
        Self {
            item_type,
            quantity,
        }
    }
}

/// Per-kind item counter used as an entity's input or output buffer.
///
/// Stacks keep the order in which each kind was first added, and a stack is
/// dropped the moment it reaches zero, so a kind that empties and refills
/// moves to the back.
///
/// `capacity` is nominal: [`Inventory::add`] never rejects items. It is
/// reported for renderers and diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    stacks: Vec<ItemStack>,
    capacity: u32,
}

impl Inventory {
    pub fn new(capacity: u32) -> Self {
        Self {
            stacks: Vec::new(),
            capacity,
        }
    }

    /// Add fungible items. Always accepts the full quantity.
    pub fn add(&mut self, item_type: ItemTypeId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(stack) = self.stacks.iter_mut().find(|s| s.item_type == item_type) {
            stack.quantity += quantity;
        } else {
            self.stacks.push(ItemStack::new(item_type, quantity));
        }
    }

    /// Remove exactly `quantity` items. All-or-nothing: returns `quantity`
    /// on success and 0 (with nothing removed) when fewer are held.
    #[must_use = "returns the quantity actually removed, which is 0 on shortage"]
    pub fn remove(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        let Some(index) = self.stacks.iter().position(|s| s.item_type == item_type) else {
            return 0;
        };
        let stack = &mut self.stacks[index];
        if stack.quantity < quantity {
            return 0;
        }
        stack.quantity -= quantity;
        if stack.quantity == 0 {
            self.stacks.remove(index);
        }
        quantity
    }

    /// Whether at least `quantity` items of `item_type` are held.
    pub fn has(&self, item_type: ItemTypeId, quantity: u32) -> bool {
        self.count(item_type) >= quantity
    }

    /// Whether at least one item of `item_type` is held.
    pub fn contains(&self, item_type: ItemTypeId) -> bool {
        self.has(item_type, 1)
    }

    /// Quantity of a specific item type. 0 for kinds never added.
    pub fn count(&self, item_type: ItemTypeId) -> u32 {
        self.stacks
            .iter()
            .find(|s| s.item_type == item_type)
            .map(|s| s.quantity)
            .unwrap_or(0)
    }

    /// The earliest-added kind still held.
    pub fn first_kind(&self) -> Option<ItemTypeId> {
        self.stacks.first().map(|s| s.item_type)
    }

    /// Total items across all types.
    pub fn total(&self) -> u32 {
        self.stacks.iter().map(|s| s.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// True when more items are held than the nominal capacity.
    pub fn is_over_capacity(&self) -> bool {
        self.total() > self.capacity
    }

    /// Stacks in first-added order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemStack> {
        self.stacks.iter()
    }
}
