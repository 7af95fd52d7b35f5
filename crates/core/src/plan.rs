//! Crafting plan - the resolver's output and the scheduler's input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::id::{ItemKind, RecipeId};
use crate::recipe::ItemStack;

/// One craft action within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingStep {
    /// Recipe to craft
    pub recipe_id: RecipeId,

    /// What the craft yields
    pub result: ItemStack,

    /// Craft actions for this step (always 1 from the resolver)
    pub quantity: u32,
}

impl CraftingStep {
    /// A single-craft step.
    pub fn once(recipe_id: RecipeId, result: ItemStack) -> Self {
        Self {
            recipe_id,
            result,
            quantity: 1,
        }
    }
}

/// Dependency-ordered steps for reaching a target result.
///
/// Every step's prerequisites appear before it and the target recipe's
/// step is always last. Built once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingPlan {
    target_recipe: RecipeId,
    target_result: ItemStack,
    steps: Vec<CraftingStep>,
    can_craft: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    recipe_choices: BTreeMap<ItemKind, Vec<RecipeId>>,
}

impl CraftingPlan {
    /// Assemble a plan from resolved prerequisite steps.
    ///
    /// The target step is appended after `prerequisites`, so it is last
    /// whether or not resolution succeeded.
    pub fn assemble(
        target_recipe: RecipeId,
        target_result: ItemStack,
        prerequisites: Vec<CraftingStep>,
        can_craft: bool,
        recipe_choices: BTreeMap<ItemKind, Vec<RecipeId>>,
    ) -> Self {
        let mut steps = prerequisites;
        steps.push(CraftingStep::once(target_recipe.clone(), target_result.clone()));
        Self {
            target_recipe,
            target_result,
            steps,
            can_craft,
            recipe_choices,
        }
    }

    /// Recipe the plan ends with.
    pub fn target_recipe(&self) -> &RecipeId {
        &self.target_recipe
    }

    /// What the final step yields.
    pub fn target_result(&self) -> &ItemStack {
        &self.target_result
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[CraftingStep] {
        &self.steps
    }

    /// Whether every slot along the chosen branches was satisfied.
    pub fn can_craft(&self) -> bool {
        self.can_craft
    }

    /// More than one step: intermediates have to be crafted first.
    pub fn requires_sub_crafting(&self) -> bool {
        self.steps.len() > 1
    }

    /// Non-empty and craftable.
    pub fn is_valid(&self) -> bool {
        !self.steps.is_empty() && self.can_craft
    }

    /// Items with several equally good producers, awaiting a pick.
    pub fn recipe_choices(&self) -> &BTreeMap<ItemKind, Vec<RecipeId>> {
        &self.recipe_choices
    }

    /// True if an external selection is needed before execution.
    pub fn has_recipe_choices(&self) -> bool {
        !self.recipe_choices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_step_is_last() {
        let plan = CraftingPlan::assemble(
            RecipeId::new("torch"),
            ItemStack::new("torch", 4),
            vec![CraftingStep::once(RecipeId::new("stick"), ItemStack::new("stick", 4))],
            true,
            BTreeMap::new(),
        );
        assert_eq!(plan.steps().len(), 2);
        assert_eq!(plan.steps().last().unwrap().recipe_id, RecipeId::new("torch"));
        assert!(plan.requires_sub_crafting());
        assert!(plan.is_valid());
    }

    #[test]
    fn test_uncraftable_plan_is_invalid() {
        let plan = CraftingPlan::assemble(
            RecipeId::new("torch"),
            ItemStack::new("torch", 4),
            Vec::new(),
            false,
            BTreeMap::new(),
        );
        assert_eq!(plan.steps().len(), 1);
        assert!(!plan.requires_sub_crafting());
        assert!(!plan.is_valid());
    }

    #[test]
    fn test_choices_omitted_from_json_when_empty() {
        let plan = CraftingPlan::assemble(
            RecipeId::new("stick"),
            ItemStack::new("stick", 4),
            Vec::new(),
            true,
            BTreeMap::new(),
        );
        let json = serde_json::to_value(&plan).unwrap();
        assert!(json.get("recipe_choices").is_none());
        assert_eq!(json["steps"][0]["quantity"], 1);
    }
}
