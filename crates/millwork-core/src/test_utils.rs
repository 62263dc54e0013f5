//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::sync::Arc;

use crate::cycle::{CycleConfig, ProductionCycle};
use crate::fixed::Fixed64;
use crate::id::ItemTypeId;
use crate::inventory::{Stockpile, StorageBin};
use crate::recipe::{ProductionRecipe, RecipeInput, RecipeOutput};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Item constructors
// ===========================================================================

pub fn log() -> ItemTypeId {
    ItemTypeId(0)
}
pub fn plank() -> ItemTypeId {
    ItemTypeId(1)
}
pub fn stone() -> ItemTypeId {
    ItemTypeId(2)
}

// ===========================================================================
// Recipe constructors
// ===========================================================================

/// A recipe from `(item, qty)` pairs and an optional output.
pub fn make_recipe(
    name: &str,
    duration: f64,
    inputs: &[(ItemTypeId, u32)],
    output: Option<(ItemTypeId, u32)>,
) -> Arc<ProductionRecipe> {
    let recipe = ProductionRecipe::new(
        name,
        fixed(duration),
        inputs
            .iter()
            .map(|&(item_type, quantity)| RecipeInput { item_type, quantity })
            .collect(),
        output.map(|(item_type, quantity)| RecipeOutput { item_type, quantity }),
    )
    .expect("test recipe must be valid");
    Arc::new(recipe)
}

/// `logs` logs -> 1 plank. Zero logs makes it a pure generator.
pub fn make_sawmill(duration: f64, logs: u32) -> Arc<ProductionRecipe> {
    if logs == 0 {
        make_recipe("planks", duration, &[], Some((plank(), 1)))
    } else {
        make_recipe("planks", duration, &[(log(), logs)], Some((plank(), 1)))
    }
}

/// Nothing -> 1 `item`.
pub fn make_generator(item: ItemTypeId, duration: f64) -> Arc<ProductionRecipe> {
    make_recipe("generator", duration, &[], Some((item, 1)))
}

// ===========================================================================
// Collaborators
// ===========================================================================

/// A roomy stockpile pre-filled with `contents`.
pub fn make_stockpile(contents: &[(ItemTypeId, u32)]) -> Stockpile {
    let mut pile = Stockpile::new(10_000);
    for &(item, qty) in contents {
        let overflow = pile.deposit(item, qty);
        assert_eq!(overflow, 0, "test stockpile overflowed");
    }
    pile
}

pub fn make_bin(item: ItemTypeId, capacity: u32) -> StorageBin {
    StorageBin::new(item, capacity)
}

// ===========================================================================
// Cycles
// ===========================================================================

/// A cycle with the default config.
pub fn make_cycle(
    recipe: Arc<ProductionRecipe>,
    input: Option<Stockpile>,
    output: Option<StorageBin>,
) -> ProductionCycle {
    ProductionCycle::attach(Some(recipe), input, output, CycleConfig::default())
}

/// A cycle with no recipe.
pub fn make_idle_cycle() -> ProductionCycle {
    ProductionCycle::attach(None, None, None, CycleConfig::default())
}

/// Units currently in a cycle's output bin.
pub fn stored(cycle: &ProductionCycle) -> u32 {
    cycle.output().map(|b| b.stored()).unwrap_or(0)
}

/// Units of `item` in a cycle's input stockpile.
pub fn stocked(cycle: &ProductionCycle, item: ItemTypeId) -> u32 {
    cycle.input().map(|p| p.quantity(item)).unwrap_or(0)
}
