//! In-memory recipe catalog.
//!
//! Keeps recipes in insertion order with an index from result item to the
//! recipes producing it. The index is rebuilt lazily after any change.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;
use autocraft_core::{CraftCounts, ItemKind, RecipeDefinition, RecipeId, RecipeStation};
use tracing::{debug, info};
use super::RecipeCatalog;

/// Recipe catalog held in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    recipes: HashMap<RecipeId, RecipeDefinition>,
    order: Vec<RecipeId>,
    by_result: RwLock<Option<HashMap<ItemKind, Vec<RecipeId>>>>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog from recipes, keeping their order.
    pub fn from_recipes(recipes: impl IntoIterator<Item = RecipeDefinition>) -> Self {
        let mut catalog = Self::new();
        catalog.insert_all(recipes);
        catalog
    }

    /// Add a recipe. Replacing an existing id keeps its position.
    pub fn insert(&mut self, recipe: RecipeDefinition) {
        if !self.recipes.contains_key(&recipe.id) {
            self.order.push(recipe.id.clone());
        }
        self.recipes.insert(recipe.id.clone(), recipe);
        self.invalidate();
    }

    /// Add many recipes at once.
    pub fn insert_all(&mut self, recipes: impl IntoIterator<Item = RecipeDefinition>) {
        let mut added = 0usize;
        for recipe in recipes {
            if !self.recipes.contains_key(&recipe.id) {
                self.order.push(recipe.id.clone());
            }
            self.recipes.insert(recipe.id.clone(), recipe);
            added += 1;
        }
        self.invalidate();
        info!("Catalog: added {} recipes, total now {}", added, self.recipes.len());
    }

    /// Remove a recipe.
    pub fn remove(&mut self, id: &RecipeId) -> Option<RecipeDefinition> {
        let removed = self.recipes.remove(id)?;
        self.order.retain(|existing| existing != id);
        self.invalidate();
        Some(removed)
    }

    /// Drop every recipe.
    pub fn clear(&mut self) {
        self.recipes.clear();
        self.order.clear();
        self.invalidate();
    }

    /// Recipe by id.
    pub fn get(&self, id: &RecipeId) -> Option<&RecipeDefinition> {
        self.recipes.get(id)
    }

    /// Number of recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// True if the catalog holds no recipes.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Recipes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RecipeDefinition> {
        self.order.iter().filter_map(|id| self.recipes.get(id))
    }

    /// Shaped and shapeless recipes only.
    pub fn crafting_recipes(&self) -> Vec<&RecipeDefinition> {
        self.iter().filter(|r| r.kind.is_crafting()).collect()
    }

    /// Recipes grouped by category tag. Untagged recipes group under "".
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&RecipeDefinition>> {
        let mut grouped: BTreeMap<&str, Vec<&RecipeDefinition>> = BTreeMap::new();
        for recipe in self.iter() {
            grouped.entry(recipe.category.as_str()).or_default().push(recipe);
        }
        grouped
    }

    /// Recipes to list for a station.
    ///
    /// Keeps recipes usable at `station` (grid recipes must fit a
    /// `grid_size` grid), whose result name contains `query`
    /// (case-insensitive), one recipe per result item, ordered by the
    /// ledger with ties left in catalog order.
    pub fn browse(
        &self,
        station: RecipeStation,
        grid_size: u8,
        query: &str,
        ledger: &CraftCounts,
    ) -> Vec<&RecipeDefinition> {
        let query = query.to_lowercase();
        let mut seen = HashSet::new();

        let mut listed: Vec<&RecipeDefinition> = self
            .iter()
            .filter(|r| r.kind.station() == station)
            .filter(|r| station != RecipeStation::CraftingGrid || r.fits_grid(grid_size))
            .filter(|r| !r.result.is_empty())
            .filter(|r| {
                query.is_empty() || r.result.item.display_name().to_lowercase().contains(&query)
            })
            .filter(|r| seen.insert(r.result.item.clone()))
            .collect();

        listed.sort_by(|a, b| ledger.compare_usage(&a.result.item, &b.result.item));
        debug!("Catalog: browsing {} recipes for {}", listed.len(), station.display_name());
        listed
    }

    fn invalidate(&self) {
        if let Ok(mut index) = self.by_result.write() {
            *index = None;
        }
    }

    fn build_index(&self) -> HashMap<ItemKind, Vec<RecipeId>> {
        let mut index: HashMap<ItemKind, Vec<RecipeId>> = HashMap::new();
        for recipe in self.iter() {
            if recipe.result.is_empty() {
                continue;
            }
            index.entry(recipe.result.item.clone()).or_default().push(recipe.id.clone());
        }
        debug!("Catalog: built result index for {} unique items", index.len());
        index
    }
}

impl RecipeCatalog for MemoryCatalog {
    fn lookup(&self, id: &RecipeId) -> Option<RecipeDefinition> {
        self.recipes.get(id).cloned()
    }

    fn producers_for(&self, item: &ItemKind) -> Vec<RecipeDefinition> {
        let ids = {
            let Ok(mut index) = self.by_result.write() else {
                return Vec::new();
            };
            let index = index.get_or_insert_with(|| self.build_index());
            index.get(item).cloned().unwrap_or_default()
        };

        ids.iter().filter_map(|id| self.recipes.get(id).cloned()).collect()
    }
}
