//! Resolution pipeline: reads economy data files, interns item names and
//! builds core recipes and configuration.
//!
//! A data directory holds:
//!
//! - `recipes.{ron,toml,json}` (required) -- a list of [`RecipeData`]; TOML
//!   keeps it under the `recipes` key.
//! - `cycle.{ron,toml,json}` (optional) -- a [`CycleConfigData`].
//! - `structures.{ron,toml,json}` (optional) -- a list of
//!   [`StructureData`]; TOML keeps it under the `structures` key.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use millwork_core::cycle::CycleConfig;
use millwork_core::fixed::Fixed64;
use millwork_core::id::ItemTypeId;
use millwork_core::recipe::{ProductionRecipe, RecipeInput, RecipeOutput};

use crate::loader::{
    DataLoadError, deserialize_file, deserialize_list, find_data_file, require_data_file,
};
use crate::schema::{CycleConfigData, RecipeData, StructureData};

// ===========================================================================
// Resolved types
// ===========================================================================

/// Recipes keyed by name, plus the item names they reference.
#[derive(Debug, Clone, Default)]
pub struct RecipeBook {
    item_names: Vec<String>,
    item_ids: HashMap<String, ItemTypeId>,
    recipes: HashMap<String, Arc<ProductionRecipe>>,
}

impl RecipeBook {
    pub fn recipe(&self, name: &str) -> Option<Arc<ProductionRecipe>> {
        self.recipes.get(name).cloned()
    }

    pub fn item(&self, name: &str) -> Option<ItemTypeId> {
        self.item_ids.get(name).copied()
    }

    pub fn item_name(&self, id: ItemTypeId) -> Option<&str> {
        self.item_names.get(id.0 as usize).map(String::as_str)
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn item_count(&self) -> usize {
        self.item_names.len()
    }

    /// Items get ids in first-seen order.
    fn intern(&mut self, name: &str) -> ItemTypeId {
        if let Some(&id) = self.item_ids.get(name) {
            return id;
        }
        let id = ItemTypeId(self.item_names.len() as u32);
        self.item_names.push(name.to_string());
        self.item_ids.insert(name.to_string(), id);
        id
    }
}

/// A storage structure with its contribution to the global limit.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureDef {
    pub name: String,
    pub capacity_bonus: Fixed64,
}

/// Everything loaded from one data directory.
#[derive(Debug, Clone)]
pub struct EconomyData {
    pub recipes: RecipeBook,
    pub cycle: CycleConfig,
    pub structures: Vec<StructureDef>,
}

// ===========================================================================
// Loading
// ===========================================================================

/// Convert a data-file number, rejecting NaN, infinities and values outside
/// the fixed-point range.
fn to_fixed(path: &Path, field: &'static str, value: f64) -> Result<Fixed64, DataLoadError> {
    Fixed64::checked_from_num(value).ok_or_else(|| DataLoadError::InvalidValue {
        file: path.to_path_buf(),
        field,
        detail: value.to_string(),
    })
}

/// Load a whole data directory.
pub fn load_economy(dir: &Path) -> Result<EconomyData, DataLoadError> {
    let recipes = load_recipes(&require_data_file(dir, "recipes")?)?;
    let cycle = match find_data_file(dir, "cycle")? {
        Some(path) => load_cycle_config(&path)?,
        None => CycleConfig::default(),
    };
    let structures = match find_data_file(dir, "structures")? {
        Some(path) => load_structures(&path)?,
        None => Vec::new(),
    };

    tracing::debug!(
        dir = %dir.display(),
        recipes = recipes.recipe_count(),
        items = recipes.item_count(),
        structures = structures.len(),
        "economy data loaded"
    );

    Ok(EconomyData {
        recipes,
        cycle,
        structures,
    })
}

/// Load and validate a recipe list.
pub fn load_recipes(path: &Path) -> Result<RecipeBook, DataLoadError> {
    let data: Vec<RecipeData> = deserialize_list(path, "recipes")?;
    let mut book = RecipeBook::default();

    for entry in data {
        if book.recipes.contains_key(&entry.name) {
            return Err(DataLoadError::DuplicateName {
                file: path.to_path_buf(),
                name: entry.name,
            });
        }
        let cycle_duration = to_fixed(path, "cycle_duration", entry.cycle_duration)?;

        let inputs = entry
            .inputs
            .iter()
            .map(|(item, quantity)| RecipeInput {
                item_type: book.intern(item),
                quantity: *quantity,
            })
            .collect();
        let output = entry.output.as_ref().map(|(item, quantity)| RecipeOutput {
            item_type: book.intern(item),
            quantity: *quantity,
        });

        let recipe = ProductionRecipe::new(
            entry.name.clone(),
            cycle_duration,
            inputs,
            output,
        )
        .map_err(|source| DataLoadError::InvalidRecipe {
            file: path.to_path_buf(),
            source,
        })?;
        book.recipes.insert(entry.name, Arc::new(recipe));
    }

    Ok(book)
}

/// Load cycle tuning. Missing fields take their defaults.
pub fn load_cycle_config(path: &Path) -> Result<CycleConfig, DataLoadError> {
    let data: CycleConfigData = deserialize_file(path)?;
    let per_module_rate = to_fixed(path, "per_module_rate", data.per_module_rate)?;
    if data.per_module_rate < 0.0 {
        tracing::warn!(
            file = %path.display(),
            rate = data.per_module_rate,
            "negative per-module rate: modules will slow production down"
        );
    }
    Ok(CycleConfig {
        per_module_rate,
        max_completions_per_advance: data.max_completions_per_advance,
    })
}

/// Load storage structure definitions.
pub fn load_structures(path: &Path) -> Result<Vec<StructureDef>, DataLoadError> {
    let data: Vec<StructureData> = deserialize_list(path, "structures")?;
    let mut seen = HashSet::new();
    let mut structures = Vec::with_capacity(data.len());

    for entry in data {
        if !seen.insert(entry.name.clone()) {
            return Err(DataLoadError::DuplicateName {
                file: path.to_path_buf(),
                name: entry.name,
            });
        }
        let capacity_bonus = to_fixed(path, "capacity_bonus", entry.capacity_bonus)?;
        structures.push(StructureDef {
            name: entry.name,
            capacity_bonus,
        });
    }

    Ok(structures)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "millwork_economy_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const RECIPES_RON: &str = r#"[
        (name: "fell_trees", cycle_duration: 10.0, output: Some(("log", 2))),
        (name: "saw_planks", cycle_duration: 30.0, inputs: [("log", 2)], output: Some(("plank", 1))),
        (name: "burn_logs", cycle_duration: 5.0, inputs: [("log", 1)]),
    ]"#;

    const RECIPES_TOML: &str = r#"
[[recipes]]
name = "fell_trees"
cycle_duration = 10.0
output = ["log", 2]

[[recipes]]
name = "saw_planks"
cycle_duration = 30.0
inputs = [["log", 2]]
output = ["plank", 1]

[[recipes]]
name = "burn_logs"
cycle_duration = 5.0
inputs = [["log", 1]]
"#;

    const RECIPES_JSON: &str = r#"[
        {"name": "fell_trees", "cycle_duration": 10.0, "output": ["log", 2]},
        {"name": "saw_planks", "cycle_duration": 30.0, "inputs": [["log", 2]], "output": ["plank", 1]},
        {"name": "burn_logs", "cycle_duration": 5.0, "inputs": [["log", 1]]}
    ]"#;

    fn assert_sawmill_book(book: &RecipeBook) {
        assert_eq!(book.recipe_count(), 3);
        let log = book.item("log").unwrap();
        let plank = book.item("plank").unwrap();
        assert_eq!(log, ItemTypeId(0));
        assert_eq!(plank, ItemTypeId(1));
        assert_eq!(book.item_name(plank), Some("plank"));

        let saw = book.recipe("saw_planks").unwrap();
        assert_eq!(saw.cycle_duration, Fixed64::from_num(30));
        assert_eq!(saw.inputs, vec![RecipeInput { item_type: log, quantity: 2 }]);
        assert_eq!(saw.output, Some(RecipeOutput { item_type: plank, quantity: 1 }));

        let burn = book.recipe("burn_logs").unwrap();
        assert!(burn.output.is_none());
        assert!(!book.recipe("fell_trees").unwrap().needs_inputs());
    }

    #[test]
    fn load_recipes_in_every_format() {
        let dir = make_test_dir("formats");
        for (file, content) in [
            ("recipes.ron", RECIPES_RON),
            ("recipes.toml", RECIPES_TOML),
            ("recipes.json", RECIPES_JSON),
        ] {
            let path = dir.join(file);
            fs::write(&path, content).unwrap();
            let book = load_recipes(&path).unwrap();
            assert_sawmill_book(&book);
        }
        cleanup(&dir);
    }

    #[test]
    fn duplicate_recipe_rejected() {
        let dir = make_test_dir("dup");
        let path = dir.join("recipes.json");
        fs::write(
            &path,
            r#"[{"name": "a", "cycle_duration": 1.0}, {"name": "a", "cycle_duration": 2.0}]"#,
        )
        .unwrap();
        assert!(matches!(
            load_recipes(&path),
            Err(DataLoadError::DuplicateName { name, .. }) if name == "a"
        ));
        cleanup(&dir);
    }

    #[test]
    fn zero_duration_recipe_rejected() {
        let dir = make_test_dir("zero");
        let path = dir.join("recipes.json");
        fs::write(&path, r#"[{"name": "instant", "cycle_duration": 0.0}]"#).unwrap();
        assert!(matches!(
            load_recipes(&path),
            Err(DataLoadError::InvalidRecipe { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn non_finite_duration_rejected() {
        let dir = make_test_dir("huge");
        let path = dir.join("recipes.toml");
        fs::write(&path, "[[recipes]]\nname = \"forever\"\ncycle_duration = inf\n").unwrap();
        assert!(matches!(
            load_recipes(&path),
            Err(DataLoadError::InvalidValue { field: "cycle_duration", .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn cycle_config_defaults_fill_missing_fields() {
        let dir = make_test_dir("cycle");
        let path = dir.join("cycle.toml");
        fs::write(&path, "max_completions_per_advance = 4\n").unwrap();
        let config = load_cycle_config(&path).unwrap();
        assert_eq!(config.per_module_rate, Fixed64::from_num(0.25));
        assert_eq!(config.max_completions_per_advance, 4);
        cleanup(&dir);
    }

    #[test]
    fn load_economy_directory() {
        let dir = make_test_dir("economy");
        fs::write(dir.join("recipes.ron"), RECIPES_RON).unwrap();
        fs::write(dir.join("cycle.ron"), "(per_module_rate: 0.5)").unwrap();
        fs::write(
            dir.join("structures.toml"),
            "[[structures]]\nname = \"warehouse\"\ncapacity_bonus = 100.0\n",
        )
        .unwrap();

        let economy = load_economy(&dir).unwrap();
        assert_sawmill_book(&economy.recipes);
        assert_eq!(economy.cycle.per_module_rate, Fixed64::from_num(0.5));
        assert_eq!(economy.cycle.max_completions_per_advance, 1);
        assert_eq!(
            economy.structures,
            vec![StructureDef {
                name: "warehouse".to_string(),
                capacity_bonus: Fixed64::from_num(100),
            }]
        );
        cleanup(&dir);
    }

    #[test]
    fn load_economy_requires_recipes() {
        let dir = make_test_dir("no_recipes");
        assert!(matches!(
            load_economy(&dir),
            Err(DataLoadError::MissingRequired { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn load_economy_optional_files_default() {
        let dir = make_test_dir("defaults");
        fs::write(dir.join("recipes.json"), RECIPES_JSON).unwrap();
        let economy = load_economy(&dir).unwrap();
        assert_eq!(economy.cycle, CycleConfig::default());
        assert!(economy.structures.is_empty());
        cleanup(&dir);
    }
}
