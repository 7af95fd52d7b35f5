//! Autocraft core data models.
//!
//! Recipes, holdings, crafting plans and the craft-count ledger shared by
//! the resolver, the scheduler and the collaborator interfaces.

#![warn(missing_docs)]

// Identities
mod id;

// Recipes and inventory
mod recipe;
mod holdings;

// Planning and execution artifacts
mod plan;
mod ledger;
mod config;

// Re-exports
pub use id::*;

pub use recipe::{
    ItemStack, IngredientSlot, RecipeDefinition, RecipeKind, RecipeStation, RecipeError,
};
pub use holdings::Holdings;

pub use plan::{CraftingPlan, CraftingStep};
pub use ledger::{CraftLedger, CraftCounts, LedgerEntry};
pub use config::{AutocraftConfig, ResolverConfig, SchedulerConfig};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
