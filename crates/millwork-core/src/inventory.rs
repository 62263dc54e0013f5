//! Reference collaborators: a multi-item input stockpile and a single-item
//! output bin with capacity notifications.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::id::{ItemTypeId, SubscriptionId};
use crate::port::{ContractViolation, InputSource, OutputSink, SinkObserver};
use crate::recipe::RecipeInput;

// ---------------------------------------------------------------------------
// Stockpile (input side)
// ---------------------------------------------------------------------------

/// A stack of fungible items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

/// Input inventory of a building. Holds several item kinds up to a shared
/// total capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stockpile {
    pub stacks: Vec<ItemStack>,
    pub capacity: u32,
}

impl Stockpile {
    pub fn new(capacity: u32) -> Self {
        Self {
            stacks: Vec::new(),
            capacity,
        }
    }

    /// Add fungible items. Returns the amount that didn't fit.
    #[must_use = "overflow count indicates items that did not fit"]
    pub fn deposit(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        let space = self.capacity.saturating_sub(self.total());
        let to_add = quantity.min(space);
        let overflow = quantity - to_add;

        if to_add > 0 {
            if let Some(stack) = self.stacks.iter_mut().find(|s| s.item_type == item_type) {
                stack.quantity += to_add;
            } else {
                self.stacks.push(ItemStack {
                    item_type,
                    quantity: to_add,
                });
            }
        }

        overflow
    }

    /// Remove fungible items. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn withdraw(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        if let Some(stack) = self.stacks.iter_mut().find(|s| s.item_type == item_type) {
            let to_remove = quantity.min(stack.quantity);
            stack.quantity -= to_remove;
            if stack.quantity == 0 {
                self.stacks.retain(|s| s.quantity > 0);
            }
            to_remove
        } else {
            0
        }
    }

    /// Quantity of a specific item type.
    pub fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.stacks
            .iter()
            .find(|s| s.item_type == item_type)
            .map(|s| s.quantity)
            .unwrap_or(0)
    }

    /// Total items across all types.
    pub fn total(&self) -> u32 {
        self.stacks.iter().map(|s| s.quantity).sum()
    }

    fn first_shortfall(&self, costs: &[RecipeInput]) -> Option<ContractViolation> {
        costs.iter().find_map(|cost| {
            let available = self.quantity(cost.item_type);
            (available < cost.quantity).then_some(ContractViolation::InsufficientResources {
                item: cost.item_type,
                requested: cost.quantity,
                available,
            })
        })
    }
}

impl InputSource for Stockpile {
    fn has_resources(&self, costs: &[RecipeInput]) -> bool {
        self.first_shortfall(costs).is_none()
    }

    fn consume_resources(&mut self, costs: &[RecipeInput]) -> Result<(), ContractViolation> {
        if let Some(violation) = self.first_shortfall(costs) {
            return Err(violation);
        }
        for cost in costs {
            let _ = self.withdraw(cost.item_type, cost.quantity);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StorageBin (output side)
// ---------------------------------------------------------------------------

/// Output inventory of a building: one item kind, fixed capacity, and
/// observers notified on the full and space-available edges.
pub struct StorageBin {
    item_type: ItemTypeId,
    capacity: u32,
    stored: u32,
    observers: SlotMap<SubscriptionId, Arc<dyn SinkObserver>>,
}

impl std::fmt::Debug for StorageBin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBin")
            .field("item_type", &self.item_type)
            .field("capacity", &self.capacity)
            .field("stored", &self.stored)
            .field("observer_count", &self.observers.len())
            .finish()
    }
}

impl StorageBin {
    pub fn new(item_type: ItemTypeId, capacity: u32) -> Self {
        Self {
            item_type,
            capacity,
            stored: 0,
            observers: SlotMap::with_key(),
        }
    }

    pub fn item_type(&self) -> ItemTypeId {
        self.item_type
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn stored(&self) -> u32 {
        self.stored
    }

    pub fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.stored)
    }

    pub fn is_full(&self) -> bool {
        self.stored >= self.capacity
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Remove up to `quantity` units (a hauler picking up goods). Notifies
    /// observers whenever this frees space, since a yield larger than one
    /// unit may have been refused while the bin was not yet full.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn take(&mut self, quantity: u32) -> u32 {
        let removed = quantity.min(self.stored);
        self.stored -= removed;
        if removed > 0 && !self.is_full() {
            self.notify_space_available();
        }
        removed
    }

    /// Resize the bin (e.g. the global storage limit changed). Notifies
    /// "full" when the resize reaches capacity and "space available"
    /// whenever it frees room.
    pub fn set_capacity(&mut self, capacity: u32) {
        let was_full = self.is_full();
        let grew = capacity > self.capacity;
        self.capacity = capacity;
        if self.is_full() {
            if !was_full {
                self.notify_full();
            }
        } else if grew {
            self.notify_space_available();
        }
    }

    fn notify_full(&self) {
        tracing::trace!(item = %self.item_type, stored = self.stored, "storage bin full");
        for observer in self.observers.values() {
            observer.on_full();
        }
    }

    fn notify_space_available(&self) {
        tracing::trace!(item = %self.item_type, stored = self.stored, "storage bin has space");
        for observer in self.observers.values() {
            observer.on_space_available();
        }
    }
}

impl OutputSink for StorageBin {
    fn has_space(&self, quantity: u32) -> bool {
        quantity <= self.free()
    }

    fn add_resource(&mut self, quantity: u32) -> Result<(), ContractViolation> {
        let free = self.free();
        if quantity > free {
            return Err(ContractViolation::OverCapacity {
                requested: quantity,
                free,
            });
        }
        if quantity == 0 {
            return Ok(());
        }
        self.stored += quantity;
        if self.is_full() {
            self.notify_full();
        }
        Ok(())
    }

    fn subscribe(&mut self, observer: Arc<dyn SinkObserver>) -> SubscriptionId {
        self.observers.insert(observer)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id).is_some()
    }
}
