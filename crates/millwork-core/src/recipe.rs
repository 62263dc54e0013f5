use crate::fixed::{Fixed64, Seconds};
use crate::id::ItemTypeId;

// ---------------------------------------------------------------------------
// Recipe entries
// ---------------------------------------------------------------------------

/// One input cost of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecipeInput {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

/// The single output yield of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RecipeOutput {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a recipe definition is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipeError {
    #[error("recipe '{name}': cycle duration must be positive, got {duration}")]
    NonPositiveDuration { name: String, duration: Fixed64 },
    #[error("recipe '{name}': input {item} listed more than once")]
    DuplicateInput { name: String, item: ItemTypeId },
    #[error("recipe '{name}': input {item} must cost at least one unit")]
    ZeroQuantityInput { name: String, item: ItemTypeId },
}

// ---------------------------------------------------------------------------
// ProductionRecipe
// ---------------------------------------------------------------------------

/// Immutable description of one production cycle: how long it takes at
/// base speed, what it costs and what it yields.
///
/// Empty inputs describe a pure generator (a sawmill felling its own logs);
/// a missing or zero-quantity output describes a pure consumer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProductionRecipe {
    pub name: String,
    /// Seconds per cycle at 1.0 module bonus and 1.0 efficiency.
    pub cycle_duration: Seconds,
    /// Costs, consumed together in this order.
    pub inputs: Vec<RecipeInput>,
    pub output: Option<RecipeOutput>,
}

impl ProductionRecipe {
    /// Build and validate a recipe.
    pub fn new(
        name: impl Into<String>,
        cycle_duration: Seconds,
        inputs: Vec<RecipeInput>,
        output: Option<RecipeOutput>,
    ) -> Result<Self, RecipeError> {
        let recipe = Self {
            name: name.into(),
            cycle_duration,
            inputs,
            output,
        };
        recipe.validate()?;
        Ok(recipe)
    }

    /// Check the recipe invariants. Deserialized recipes bypass `new`, so
    /// loaders call this explicitly.
    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.cycle_duration <= Fixed64::ZERO {
            return Err(RecipeError::NonPositiveDuration {
                name: self.name.clone(),
                duration: self.cycle_duration,
            });
        }
        for (i, input) in self.inputs.iter().enumerate() {
            if input.quantity == 0 {
                return Err(RecipeError::ZeroQuantityInput {
                    name: self.name.clone(),
                    item: input.item_type,
                });
            }
            if self.inputs[..i].iter().any(|prev| prev.item_type == input.item_type) {
                return Err(RecipeError::DuplicateInput {
                    name: self.name.clone(),
                    item: input.item_type,
                });
            }
        }
        Ok(())
    }

    /// Quantity emitted per completed cycle (0 for pure consumers).
    pub fn yield_quantity(&self) -> u32 {
        self.output.map(|o| o.quantity).unwrap_or(0)
    }

    /// Whether completing a cycle needs an input source.
    pub fn needs_inputs(&self) -> bool {
        !self.inputs.is_empty()
    }

    /// Whether completing a cycle needs an output sink.
    pub fn produces_output(&self) -> bool {
        self.yield_quantity() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> ItemTypeId {
        ItemTypeId(0)
    }
    fn plank() -> ItemTypeId {
        ItemTypeId(1)
    }

    #[test]
    fn valid_recipe_builds() {
        let recipe = ProductionRecipe::new(
            "planks",
            Fixed64::from_num(30),
            vec![RecipeInput { item_type: log(), quantity: 2 }],
            Some(RecipeOutput { item_type: plank(), quantity: 1 }),
        )
        .unwrap();
        assert_eq!(recipe.yield_quantity(), 1);
        assert!(recipe.needs_inputs());
        assert!(recipe.produces_output());
    }

    #[test]
    fn zero_duration_rejected() {
        let err = ProductionRecipe::new("broken", Fixed64::ZERO, vec![], None).unwrap_err();
        assert!(matches!(err, RecipeError::NonPositiveDuration { .. }));
    }

    #[test]
    fn negative_duration_rejected() {
        let err =
            ProductionRecipe::new("broken", Fixed64::from_num(-1), vec![], None).unwrap_err();
        assert!(matches!(err, RecipeError::NonPositiveDuration { .. }));
    }

    #[test]
    fn duplicate_input_rejected() {
        let err = ProductionRecipe::new(
            "double_log",
            Fixed64::from_num(5),
            vec![
                RecipeInput { item_type: log(), quantity: 1 },
                RecipeInput { item_type: log(), quantity: 2 },
            ],
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RecipeError::DuplicateInput {
                name: "double_log".to_string(),
                item: log(),
            }
        );
    }

    #[test]
    fn zero_quantity_input_rejected() {
        let err = ProductionRecipe::new(
            "free_planks",
            Fixed64::from_num(5),
            vec![RecipeInput { item_type: log(), quantity: 0 }],
            Some(RecipeOutput { item_type: plank(), quantity: 1 }),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RecipeError::ZeroQuantityInput {
                name: "free_planks".to_string(),
                item: log(),
            }
        );
    }

    #[test]
    fn pure_generator_and_pure_consumer_are_valid() {
        let generator = ProductionRecipe::new(
            "fell",
            Fixed64::from_num(10),
            vec![],
            Some(RecipeOutput { item_type: log(), quantity: 1 }),
        )
        .unwrap();
        assert!(!generator.needs_inputs());

        let consumer = ProductionRecipe::new(
            "burn",
            Fixed64::from_num(10),
            vec![RecipeInput { item_type: log(), quantity: 1 }],
            Some(RecipeOutput { item_type: plank(), quantity: 0 }),
        )
        .unwrap();
        assert!(!consumer.produces_output());
        assert_eq!(consumer.yield_quantity(), 0);
    }
}
