//! Data-driven loading of recipes, cycle tuning and storage structures
//! from RON, TOML or JSON files.

pub mod economy;
pub mod loader;
pub mod schema;

pub use economy::{EconomyData, RecipeBook, StructureDef, load_economy};
pub use loader::DataLoadError;
