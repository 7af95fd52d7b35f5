//! Recipe model - what a craft consumes and what it produces.

use serde::{Deserialize, Serialize};
use crate::holdings::Holdings;
use crate::id::{ItemKind, RecipeId};

/// A quantity of one item kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item kind
    pub item: ItemKind,

    /// Number of units
    pub count: u32,
}

impl ItemStack {
    /// Create a stack.
    pub fn new(item: impl Into<ItemKind>, count: u32) -> Self {
        Self {
            item: item.into(),
            count,
        }
    }

    /// True when the stack holds nothing usable.
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.item.is_empty()
    }
}

impl std::fmt::Display for ItemStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x{}", self.item, self.count)
    }
}

/// One consumption point of a recipe.
///
/// Lists the item kinds that can fill the slot, in preference order.
/// An empty slot is a gap in a shaped pattern and is always satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientSlot(Vec<ItemKind>);

impl IngredientSlot {
    /// A slot accepting any of `alternatives`.
    pub fn any_of<I, T>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemKind>,
    {
        Self(alternatives.into_iter().map(Into::into).collect())
    }

    /// A slot accepting exactly one item kind.
    pub fn single(item: impl Into<ItemKind>) -> Self {
        Self(vec![item.into()])
    }

    /// A gap: consumes nothing.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// True if the slot consumes nothing.
    pub fn is_empty(&self) -> bool {
        self.alternatives().next().is_none()
    }

    /// Usable alternatives, in listed order. Blank identifiers are skipped.
    pub fn alternatives(&self) -> impl Iterator<Item = &ItemKind> {
        self.0.iter().filter(|item| !item.is_empty())
    }

    /// Whether `item` can fill this slot.
    pub fn accepts(&self, item: &ItemKind) -> bool {
        self.alternatives().any(|candidate| candidate == item)
    }
}

/// Where a recipe is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeStation {
    /// Inventory or crafting table grid
    CraftingGrid,
    /// Regular furnace
    Furnace,
    /// Blast furnace (ores and metal)
    BlastFurnace,
    /// Smoker (food)
    Smoker,
}

impl RecipeStation {
    /// Name shown to users.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::CraftingGrid => "Crafting",
            Self::Furnace => "Smelting",
            Self::BlastFurnace => "Blast Furnace",
            Self::Smoker => "Smoking",
        }
    }

    /// Any of the furnace-like stations.
    pub fn is_furnace_type(self) -> bool {
        matches!(self, Self::Furnace | Self::BlastFurnace | Self::Smoker)
    }

    /// Parse a station from a user-supplied name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "crafting" | "crafting_grid" | "grid" => Some(Self::CraftingGrid),
            "furnace" | "smelting" => Some(Self::Furnace),
            "blast_furnace" | "blasting" => Some(Self::BlastFurnace),
            "smoker" | "smoking" => Some(Self::Smoker),
            _ => None,
        }
    }
}

/// Shape of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipeKind {
    /// Fixed pattern occupying `width` x `height` cells
    Shaped {
        /// Pattern width
        width: u8,
        /// Pattern height
        height: u8,
    },
    /// Any arrangement
    Shapeless,
    /// Furnace
    Smelting,
    /// Blast furnace
    Blasting,
    /// Smoker
    Smoking,
}

impl Default for RecipeKind {
    fn default() -> Self {
        Self::Shapeless
    }
}

impl RecipeKind {
    /// Station that performs this kind of recipe.
    pub fn station(self) -> RecipeStation {
        match self {
            Self::Shaped { .. } | Self::Shapeless => RecipeStation::CraftingGrid,
            Self::Smelting => RecipeStation::Furnace,
            Self::Blasting => RecipeStation::BlastFurnace,
            Self::Smoking => RecipeStation::Smoker,
        }
    }

    /// Shaped or shapeless grid recipe. Only these are planned.
    pub fn is_crafting(self) -> bool {
        self.station() == RecipeStation::CraftingGrid
    }

    /// Whether a recipe of this kind with `slot_count` slots fits a
    /// `size` x `size` crafting grid.
    pub fn fits_grid(self, size: u8, slot_count: usize) -> bool {
        match self {
            Self::Shaped { width, height } => width <= size && height <= size,
            Self::Shapeless => slot_count <= usize::from(size) * usize::from(size),
            _ => false,
        }
    }
}

/// Errors for recipe definitions that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipeError {
    /// Result has no item or a zero count
    #[error("recipe {0} has an empty result")]
    EmptyResult(RecipeId),

    /// Nothing is consumed
    #[error("recipe {0} consumes no ingredients")]
    NoIngredients(RecipeId),
}

/// A recipe: ingredient slots consumed once per craft and one result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDefinition {
    /// Unique identifier
    pub id: RecipeId,

    /// Shape / station
    #[serde(default)]
    pub kind: RecipeKind,

    /// Slots, each consumed once per craft
    pub ingredients: Vec<IngredientSlot>,

    /// What one craft produces
    pub result: ItemStack,

    /// Grouping tag, presentation only
    #[serde(default)]
    pub category: String,
}

impl RecipeDefinition {
    /// Create a shapeless recipe.
    pub fn new(
        id: impl Into<RecipeId>,
        ingredients: Vec<IngredientSlot>,
        result: ItemStack,
    ) -> Self {
        Self {
            id: id.into(),
            kind: RecipeKind::Shapeless,
            ingredients,
            result,
            category: String::new(),
        }
    }

    /// Set the kind.
    pub fn with_kind(mut self, kind: RecipeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Check the definition is usable for planning.
    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.result.is_empty() {
            return Err(RecipeError::EmptyResult(self.id.clone()));
        }
        if self.ingredients.iter().all(IngredientSlot::is_empty) {
            return Err(RecipeError::NoIngredients(self.id.clone()));
        }
        Ok(())
    }

    /// Slots that actually consume something.
    pub fn consuming_slots(&self) -> impl Iterator<Item = &IngredientSlot> {
        self.ingredients.iter().filter(|slot| !slot.is_empty())
    }

    /// Whether a crafting grid of `size` can hold this recipe.
    pub fn fits_grid(&self, size: u8) -> bool {
        self.kind.fits_grid(size, self.consuming_slots().count())
    }

    /// Whether every slot can be filled straight from `holdings`, without any
    /// sub-crafting. The first available alternative is taken for each slot.
    pub fn can_craft_directly(&self, holdings: &Holdings) -> bool {
        let mut sim = holdings.clone();
        self.consuming_slots().all(|slot| {
            slot.alternatives()
                .find(|item| sim.count(item) > 0)
                .cloned()
                .map(|item| sim.take(&item, 1))
                .unwrap_or(false)
        })
    }
}
