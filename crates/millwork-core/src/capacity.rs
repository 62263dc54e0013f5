//! Storage capacity contributed by structures (warehouses, silos).
//!
//! [`CapacityRegistry`] is a lock-free additive total. A process-wide
//! instance lives behind [`global`], with explicit init/teardown; every
//! accessor tolerates being called before init or after teardown.
//! [`CapacityContribution`] is the per-structure registration: it adds its
//! amount on attach and reverses it exactly once on detach or drop.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

use crate::fixed::{Fixed64, fixed64_to_f64};

// ---------------------------------------------------------------------------
// CapacityRegistry
// ---------------------------------------------------------------------------

/// Additive storage limit. Stores the raw bits of a [`Fixed64`] so that
/// `increase` is a lock-free compare-and-swap loop.
#[derive(Debug, Default)]
pub struct CapacityRegistry {
    bits: AtomicI64,
}

impl CapacityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` (negative to remove), saturating at the `Fixed64` range.
    /// No floor is enforced; callers pair increases and decreases.
    pub fn increase(&self, delta: Fixed64) {
        let step = delta.to_bits();
        // The closure never returns None, so the update cannot fail.
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some(bits.saturating_add(step))
            });
    }

    pub fn current(&self) -> Fixed64 {
        Fixed64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

// ---------------------------------------------------------------------------
// Process-wide registry
// ---------------------------------------------------------------------------

pub mod global {
    //! The session-wide registry. `init` before spawning structures,
    //! `teardown` after the session ends.

    use std::sync::{Arc, PoisonError, RwLock};

    use super::CapacityRegistry;
    use crate::fixed::Fixed64;

    static GLOBAL: RwLock<Option<Arc<CapacityRegistry>>> = RwLock::new(None);

    /// Create the registry if absent and return it. Calling twice returns
    /// the same instance.
    pub fn init() -> Arc<CapacityRegistry> {
        let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert_with(|| {
            tracing::debug!("capacity registry initialized");
            Arc::new(CapacityRegistry::new())
        })
        .clone()
    }

    /// Drop the process-wide handle. Outstanding contributions become
    /// no-ops on detach once no other handle keeps the registry alive.
    pub fn teardown() {
        let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
        if slot.take().is_some() {
            tracing::debug!("capacity registry torn down");
        }
    }

    /// The registry, if initialized.
    pub fn handle() -> Option<Arc<CapacityRegistry>> {
        GLOBAL
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Adjust the global total. A no-op outside the init/teardown window.
    pub fn increase(delta: Fixed64) {
        if let Some(registry) = handle() {
            registry.increase(delta);
        }
    }

    /// The global total, or zero outside the init/teardown window.
    pub fn current() -> Fixed64 {
        handle().map(|r| r.current()).unwrap_or(Fixed64::ZERO)
    }
}

// ---------------------------------------------------------------------------
// CapacityContribution
// ---------------------------------------------------------------------------

/// One structure's share of the storage limit, bound to the structure's
/// lifetime.
#[derive(Debug)]
pub struct CapacityContribution {
    registry: Weak<CapacityRegistry>,
    amount: Fixed64,
    active: bool,
}

impl CapacityContribution {
    /// Register `amount` with `registry`.
    pub fn attach(registry: &Arc<CapacityRegistry>, amount: Fixed64) -> Self {
        registry.increase(amount);
        tracing::debug!(amount = fixed64_to_f64(amount), "capacity contribution attached");
        Self {
            registry: Arc::downgrade(registry),
            amount,
            active: true,
        }
    }

    /// Register `amount` with the process-wide registry. Before init this
    /// returns an inert contribution whose detach does nothing.
    pub fn attach_global(amount: Fixed64) -> Self {
        match global::handle() {
            Some(registry) => Self::attach(&registry, amount),
            None => {
                tracing::debug!(
                    amount = fixed64_to_f64(amount),
                    "capacity registry not initialized; contribution is inert"
                );
                Self {
                    registry: Weak::new(),
                    amount,
                    active: false,
                }
            }
        }
    }

    pub fn amount(&self) -> Fixed64 {
        self.amount
    }

    /// Whether the reversal is still pending.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Reverse the contribution. Dropping does the same.
    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        // The registry may already be gone during session teardown.
        if let Some(registry) = self.registry.upgrade() {
            registry.increase(-self.amount);
            tracing::debug!(
                amount = fixed64_to_f64(self.amount),
                "capacity contribution detached"
            );
        }
    }
}

impl Drop for CapacityContribution {
    fn drop(&mut self) {
        self.release();
    }
}
