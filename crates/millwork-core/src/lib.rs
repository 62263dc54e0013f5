//! Millwork Core -- tick-driven production cycles for building-economy games.
//!
//! Each producing building owns a [`cycle::ProductionCycle`]: it accumulates
//! elapsed time, and every time the accumulator crosses the recipe's
//! effective cycle time it pays the input costs and emits the output yield.
//! When the output fills up the cycle pauses, and it resumes only when the
//! output reports free space again.
//!
//! # Tick contract
//!
//! An external scheduler calls `advance(delta)` once per frame on every
//! cycle (or [`driver::advance_all`] on a batch). Within one completed cycle
//! the input check runs first, then the output check, and only then are
//! collaborators mutated, so an infeasible cycle never half-applies.
//!
//! ```rust,ignore
//! let mut mill = ProductionCycle::attach(Some(recipe), Some(stockpile), Some(bin), CycleConfig::default());
//! mill.set_module_bonus(2);
//! mill.advance(Fixed64::from_num(0.016))?;
//! ```
//!
//! # Key Types
//!
//! - [`recipe::ProductionRecipe`] -- Immutable duration, costs and yield.
//! - [`cycle::ProductionCycle`] -- The Idle / Running / Paused state machine.
//! - [`port::InputSource`], [`port::OutputSink`] -- Collaborator traits.
//! - [`inventory::Stockpile`], [`inventory::StorageBin`] -- Reference
//!   collaborators.
//! - [`capacity::CapacityRegistry`] -- Process-wide storage limit, fed by
//!   [`capacity::CapacityContribution`]s.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic time.

pub mod capacity;
pub mod cycle;
pub mod driver;
pub mod fixed;
pub mod id;
pub mod inventory;
pub mod port;
pub mod recipe;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
