//! Serde data file structs for economy definitions.
//!
//! These structs define the on-disk format for recipes, cycle tuning and
//! storage structures. They are deserialized from RON, JSON, or TOML data
//! files and then resolved into core types by the loader.

use serde::Deserialize;

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe definition in a data file. Items are referenced by name.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    /// Seconds per cycle at base speed.
    pub cycle_duration: f64,
    /// `("item_name", quantity)` costs, consumed in order.
    #[serde(default)]
    pub inputs: Vec<(String, u32)>,
    /// `("item_name", quantity)` yield, if the recipe produces anything.
    #[serde(default)]
    pub output: Option<(String, u32)>,
}

// ===========================================================================
// Cycle tuning
// ===========================================================================

/// Cycle configuration in a data file. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleConfigData {
    pub per_module_rate: f64,
    pub max_completions_per_advance: u32,
}

impl Default for CycleConfigData {
    fn default() -> Self {
        Self {
            per_module_rate: 0.25,
            max_completions_per_advance: 1,
        }
    }
}

// ===========================================================================
// Storage structures
// ===========================================================================

/// A structure that raises the global storage limit while it stands.
#[derive(Debug, Clone, Deserialize)]
pub struct StructureData {
    pub name: String,
    pub capacity_bonus: f64,
}
