//! Capability traits a production cycle is wired to.
//!
//! A cycle never owns storage logic itself. It asks an [`InputSource`]
//! whether a recipe's costs can be paid, and an [`OutputSink`] whether the
//! yield fits, before mutating either. Sinks push "full" and "space
//! available" notifications to subscribed [`SinkObserver`]s; delivery is
//! synchronous and may happen from inside [`OutputSink::add_resource`], so
//! observers must only touch state that is safe to mutate through `&self`.

use std::sync::Arc;

use crate::id::{ItemTypeId, SubscriptionId};
use crate::recipe::RecipeInput;

// ---------------------------------------------------------------------------
// ContractViolation
// ---------------------------------------------------------------------------

/// A collaborator was asked to do something its feasibility check would
/// have refused. The cycle never triggers these; seeing one means a
/// collaborator bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("insufficient {item}: requested {requested}, available {available}")]
    InsufficientResources {
        item: ItemTypeId,
        requested: u32,
        available: u32,
    },
    #[error("output over capacity: requested {requested}, free {free}")]
    OverCapacity { requested: u32, free: u32 },
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Where a cycle draws its input costs from.
pub trait InputSource {
    /// Whether every cost can be paid right now.
    fn has_resources(&self, costs: &[RecipeInput]) -> bool;

    /// Pay every cost. Must be all-or-nothing: on error nothing is removed.
    fn consume_resources(&mut self, costs: &[RecipeInput]) -> Result<(), ContractViolation>;
}

/// Where a cycle puts its yield.
pub trait OutputSink {
    /// Whether `quantity` more units fit.
    fn has_space(&self, quantity: u32) -> bool;

    /// Accept `quantity` units. Errors if they do not fit.
    fn add_resource(&mut self, quantity: u32) -> Result<(), ContractViolation>;

    /// Register an observer for full / space-available edges.
    fn subscribe(&mut self, observer: Arc<dyn SinkObserver>) -> SubscriptionId;

    /// Remove an observer. Returns false if the id was unknown.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Receiver of output sink capacity edges.
pub trait SinkObserver: Send + Sync {
    fn on_full(&self);
    fn on_space_available(&self);
}

// ---------------------------------------------------------------------------
// Blanket impls for boxed collaborators
// ---------------------------------------------------------------------------

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn has_resources(&self, costs: &[RecipeInput]) -> bool {
        (**self).has_resources(costs)
    }

    fn consume_resources(&mut self, costs: &[RecipeInput]) -> Result<(), ContractViolation> {
        (**self).consume_resources(costs)
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn has_space(&self, quantity: u32) -> bool {
        (**self).has_space(quantity)
    }

    fn add_resource(&mut self, quantity: u32) -> Result<(), ContractViolation> {
        (**self).add_resource(quantity)
    }

    fn subscribe(&mut self, observer: Arc<dyn SinkObserver>) -> SubscriptionId {
        (**self).subscribe(observer)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        (**self).unsubscribe(id)
    }
}
