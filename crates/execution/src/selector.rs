//! Producer selection strategies.

use autocraft_core::{Holdings, ItemKind, RecipeDefinition, RecipeId};

/// Outcome of choosing among producers of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    /// Recipe to use
    pub recipe: &'a RecipeDefinition,

    /// Every recipe ranked as good as `recipe`, itself included, when there
    /// is more than one. Empty when the choice is clear.
    pub tied: Vec<RecipeId>,
}

/// Strategy for picking which recipe should produce a needed item.
pub trait ProducerSelector: Send + Sync {
    /// Choose among `candidates` (all produce `item`, in catalog order) given
    /// the current simulated holdings.
    fn select<'a>(
        &self,
        item: &ItemKind,
        candidates: &'a [RecipeDefinition],
        holdings: &Holdings,
    ) -> Option<Selection<'a>>;
}

/// Prefers recipes whose ingredients are all held right now over ones that
/// need further sub-crafting. Within a rank the first listed wins; the
/// others are reported as tied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectFirstSelector;

impl DirectFirstSelector {
    /// Create the selector.
    pub fn new() -> Self {
        Self
    }
}

impl ProducerSelector for DirectFirstSelector {
    fn select<'a>(
        &self,
        _item: &ItemKind,
        candidates: &'a [RecipeDefinition],
        holdings: &Holdings,
    ) -> Option<Selection<'a>> {
        let direct: Vec<&RecipeDefinition> = candidates
            .iter()
            .filter(|r| r.can_craft_directly(holdings))
            .collect();

        let best_rank: Vec<&RecipeDefinition> = if direct.is_empty() {
            candidates.iter().collect()
        } else {
            direct
        };

        let recipe = *best_rank.first()?;
        let tied = if best_rank.len() > 1 {
            best_rank.iter().map(|r| r.id.clone()).collect()
        } else {
            Vec::new()
        };

        Some(Selection { recipe, tied })
    }
}

/// Always takes the first listed producer and never reports ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstListedSelector;

impl ProducerSelector for FirstListedSelector {
    fn select<'a>(
        &self,
        _item: &ItemKind,
        candidates: &'a [RecipeDefinition],
        _holdings: &Holdings,
    ) -> Option<Selection<'a>> {
        candidates.first().map(|recipe| Selection {
            recipe,
            tied: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocraft_core::{IngredientSlot, ItemStack};

    fn planks_from(log: &str) -> RecipeDefinition {
        RecipeDefinition::new(
            format!("planks_from_{}", log),
            vec![IngredientSlot::single(log)],
            ItemStack::new("planks", 4),
        )
    }

    #[test]
    fn test_direct_beats_earlier_indirect() {
        let candidates = vec![planks_from("oak_log"), planks_from("birch_log")];
        let holdings: Holdings = [("birch_log", 1)].into_iter().collect();

        let selection = DirectFirstSelector
            .select(&"planks".into(), &candidates, &holdings)
            .unwrap();
        assert_eq!(selection.recipe.id, RecipeId::new("planks_from_birch_log"));
        assert!(selection.tied.is_empty());
    }

    #[test]
    fn test_ties_are_reported_in_catalog_order() {
        let candidates = vec![planks_from("oak_log"), planks_from("birch_log")];
        let holdings: Holdings = [("oak_log", 1), ("birch_log", 1)].into_iter().collect();

        let selection = DirectFirstSelector
            .select(&"planks".into(), &candidates, &holdings)
            .unwrap();
        assert_eq!(selection.recipe.id, RecipeId::new("planks_from_oak_log"));
        assert_eq!(
            selection.tied,
            vec![RecipeId::new("planks_from_oak_log"), RecipeId::new("planks_from_birch_log")]
        );
    }

    #[test]
    fn test_no_candidates() {
        assert!(DirectFirstSelector
            .select(&"planks".into(), &[], &Holdings::new())
            .is_none());
    }

    #[test]
    fn test_first_listed_ignores_holdings() {
        let candidates = vec![planks_from("oak_log"), planks_from("birch_log")];
        let holdings: Holdings = [("birch_log", 1)].into_iter().collect();
        let selection = FirstListedSelector
            .select(&"planks".into(), &candidates, &holdings)
            .unwrap();
        assert_eq!(selection.recipe.id, RecipeId::new("planks_from_oak_log"));
        assert!(selection.tied.is_empty());
    }
}
