//! Dependency resolution for recipes.
//!
//! Given a target recipe and a snapshot of holdings, works out which
//! ingredients must be sub-crafted and in what order, by simulating
//! consumption depth-first against a private copy of the holdings.

use crate::producer::{Clock, ProducerCache, SystemClock};
use crate::selector::{DirectFirstSelector, ProducerSelector};
use autocraft_core::{
    CraftingPlan, CraftingStep, Holdings, ItemKind, RecipeDefinition, RecipeError, RecipeId,
    ResolverConfig,
};
use autocraft_storage::RecipeCatalog;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Caller-pinned producers: item -> recipe that must make it.
pub type ProducerChoices = HashMap<ItemKind, RecipeId>;

/// Errors from planning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Target not in the catalog
    #[error("Unknown recipe: {0}")]
    UnknownRecipe(RecipeId),

    /// Target is made at a furnace-type station
    #[error("Recipe {0} is not a crafting recipe")]
    NotCraftingRecipe(RecipeId),

    /// Target definition is unusable
    #[error(transparent)]
    Malformed(#[from] RecipeError),

    /// Cancelled through a [`CancelToken`]
    #[error("Planning was cancelled")]
    Cancelled,
}

/// Shared flag for abandoning a planning run from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an untriggered token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// State of one top-level search.
struct Search<'a> {
    choices: &'a ProducerChoices,
    cancel: Option<&'a CancelToken>,
    in_progress: HashSet<ItemKind>,
    cancelled: bool,
}

impl<'a> Search<'a> {
    fn new(
        root: &RecipeDefinition,
        choices: &'a ProducerChoices,
        cancel: Option<&'a CancelToken>,
    ) -> Self {
        let mut in_progress = HashSet::new();
        in_progress.insert(root.result.item.clone());
        Self {
            choices,
            cancel,
            in_progress,
            cancelled: false,
        }
    }

    fn check_cancel(&mut self) -> bool {
        if !self.cancelled && self.cancel.is_some_and(CancelToken::is_cancelled) {
            self.cancelled = true;
        }
        self.cancelled
    }
}

/// Steps and open choices gathered by a branch; discarded if the branch fails.
#[derive(Default)]
struct Branch {
    steps: Vec<CraftingStep>,
    choices: BTreeMap<ItemKind, Vec<RecipeId>>,
}

impl Branch {
    fn absorb(&mut self, other: Branch) {
        self.steps.extend(other.steps);
        for (item, tied) in other.choices {
            self.choices.entry(item).or_insert(tied);
        }
    }
}

/// Plans crafting trees against a recipe catalog.
pub struct DependencyResolver<C: RecipeCatalog> {
    catalog: C,
    config: ResolverConfig,
    cache: ProducerCache,
    clock: Arc<dyn Clock>,
    selector: Box<dyn ProducerSelector>,
}

impl<C: RecipeCatalog> DependencyResolver<C> {
    /// Create a resolver with default limits.
    pub fn new(catalog: C) -> Self {
        Self::with_config(catalog, ResolverConfig::default())
    }

    /// Create a resolver with the given limits.
    pub fn with_config(catalog: C, config: ResolverConfig) -> Self {
        Self {
            catalog,
            cache: ProducerCache::new(config.cache_ttl()),
            config,
            clock: Arc::new(SystemClock),
            selector: Box::new(DirectFirstSelector::new()),
        }
    }

    /// Replace the time source used for memo expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the producer selection strategy.
    pub fn with_selector(mut self, selector: Box<dyn ProducerSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// The catalog being planned against.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Active limits.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Forget memoized producer lookups, e.g. after the catalog changed.
    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
    }

    /// Plan one craft of `target` from `holdings`.
    ///
    /// An infeasible target still yields a plan, with `can_craft() == false`.
    pub fn resolve(
        &mut self,
        target: &RecipeId,
        holdings: &Holdings,
    ) -> Result<CraftingPlan, ResolveError> {
        self.run(target, holdings, &ProducerChoices::new(), None)
    }

    /// Plan with some producers pinned by the caller.
    ///
    /// A pinned item never shows up in the plan's recipe choices.
    pub fn resolve_with_choices(
        &mut self,
        target: &RecipeId,
        holdings: &Holdings,
        choices: &ProducerChoices,
    ) -> Result<CraftingPlan, ResolveError> {
        self.run(target, holdings, choices, None)
    }

    /// Plan, checking `cancel` at every recursion step.
    pub fn resolve_cancellable(
        &mut self,
        target: &RecipeId,
        holdings: &Holdings,
        choices: &ProducerChoices,
        cancel: &CancelToken,
    ) -> Result<CraftingPlan, ResolveError> {
        self.run(target, holdings, choices, Some(cancel))
    }

    /// Whether `quantity` crafts of `target` are jointly feasible.
    ///
    /// Units are resolved one after another against a single simulation, so
    /// later units only see what earlier ones left behind.
    pub fn can_craft(&mut self, target: &RecipeId, quantity: u32, holdings: &Holdings) -> bool {
        self.can_craft_with_choices(target, quantity, holdings, &ProducerChoices::new())
    }

    /// [`DependencyResolver::can_craft`] with some producers pinned.
    pub fn can_craft_with_choices(
        &mut self,
        target: &RecipeId,
        quantity: u32,
        holdings: &Holdings,
        choices: &ProducerChoices,
    ) -> bool {
        let Ok(recipe) = self.target_recipe(target) else {
            return false;
        };

        let mut sim = holdings.clone();
        for _ in 0..quantity {
            let mut search = Search::new(&recipe, choices, None);
            let mut scratch = Branch::default();
            if !self.satisfy(&recipe, &mut sim, &mut search, 0, &mut scratch) {
                return false;
            }
        }
        true
    }

    /// Largest feasible quantity of `target`, capped at `max_quantity`.
    /// Zero when not even one is feasible.
    pub fn max_craftable(&mut self, target: &RecipeId, holdings: &Holdings) -> u32 {
        self.max_craftable_with_choices(target, holdings, &ProducerChoices::new())
    }

    /// [`DependencyResolver::max_craftable`] with some producers pinned.
    pub fn max_craftable_with_choices(
        &mut self,
        target: &RecipeId,
        holdings: &Holdings,
        choices: &ProducerChoices,
    ) -> u32 {
        let cap = self.config.max_quantity;
        if cap == 0 || !self.can_craft_with_choices(target, 1, holdings, choices) {
            return 0;
        }

        let (mut lo, mut hi) = (1, cap);
        while lo < hi {
            let mid = lo + (hi - lo + 1) / 2;
            if self.can_craft_with_choices(target, mid, holdings, choices) {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        debug!("Max craftable for {}: {}", target, lo);
        lo
    }

    fn target_recipe(&self, target: &RecipeId) -> Result<RecipeDefinition, ResolveError> {
        let recipe = self
            .catalog
            .lookup(target)
            .ok_or_else(|| ResolveError::UnknownRecipe(target.clone()))?;
        if !recipe.kind.is_crafting() {
            return Err(ResolveError::NotCraftingRecipe(target.clone()));
        }
        recipe.validate()?;
        Ok(recipe)
    }

    fn run(
        &mut self,
        target: &RecipeId,
        holdings: &Holdings,
        choices: &ProducerChoices,
        cancel: Option<&CancelToken>,
    ) -> Result<CraftingPlan, ResolveError> {
        let recipe = self.target_recipe(target)?;

        let mut sim = holdings.clone();
        let mut search = Search::new(&recipe, choices, cancel);
        let mut branch = Branch::default();
        let feasible = self.satisfy(&recipe, &mut sim, &mut search, 0, &mut branch);

        if search.cancelled {
            warn!("Planning for {} cancelled", target);
            return Err(ResolveError::Cancelled);
        }

        let plan = if feasible {
            CraftingPlan::assemble(
                target.clone(),
                recipe.result,
                branch.steps,
                true,
                branch.choices,
            )
        } else {
            CraftingPlan::assemble(
                target.clone(),
                recipe.result,
                Vec::new(),
                false,
                BTreeMap::new(),
            )
        };

        info!(
            "Created plan for {} with {} steps (can craft: {})",
            target,
            plan.steps().len(),
            plan.can_craft()
        );
        Ok(plan)
    }

    /// Try to fill every slot of `recipe` from `holdings`, sub-crafting as
    /// needed. On success the consumption is committed to `holdings` and the
    /// prerequisite steps appended to `out`; on failure neither is touched.
    fn satisfy(
        &mut self,
        recipe: &RecipeDefinition,
        holdings: &mut Holdings,
        search: &mut Search<'_>,
        depth: usize,
        out: &mut Branch,
    ) -> bool {
        if search.check_cancel() {
            return false;
        }
        if depth > self.config.max_depth {
            debug!("Depth limit reached at {}", recipe.id);
            return false;
        }

        let mut sim = holdings.clone();
        let mut local = Branch::default();

        for slot in recipe.consuming_slots() {
            let mut filled = false;

            for item in slot.alternatives() {
                if sim.take(item, 1) {
                    filled = true;
                    break;
                }
                if search.in_progress.contains(item) {
                    continue;
                }
                let Some((producer, tied)) = self.find_producer(item, &sim, search.choices) else {
                    continue;
                };

                search.in_progress.insert(item.clone());
                let mut sub = Branch::default();
                let crafted = self.satisfy(&producer, &mut sim, search, depth + 1, &mut sub);
                search.in_progress.remove(item);

                if crafted {
                    local.absorb(sub);
                    local
                        .steps
                        .push(CraftingStep::once(producer.id.clone(), producer.result.clone()));
                    if !tied.is_empty() {
                        local.choices.entry(item.clone()).or_insert(tied);
                    }
                    sim.add(item, producer.result.count);
                    sim.take(item, 1);
                    filled = true;
                    break;
                }
                if search.cancelled {
                    return false;
                }
            }

            if !filled {
                return false;
            }
        }

        *holdings = sim;
        out.absorb(local);
        true
    }

    /// Producer of `item` plus any tied alternatives to report.
    fn find_producer(
        &mut self,
        item: &ItemKind,
        sim: &Holdings,
        choices: &ProducerChoices,
    ) -> Option<(RecipeDefinition, Vec<RecipeId>)> {
        let now = self.clock.now();
        let catalog = &self.catalog;
        let candidates = self.cache.producers(item, now, || {
            catalog
                .producers_for(item)
                .into_iter()
                .filter(|r| r.kind.is_crafting() && &r.result.item == item && r.validate().is_ok())
                .collect()
        });

        if let Some(pinned) = choices.get(item) {
            match candidates.iter().find(|r| &r.id == pinned) {
                Some(recipe) => return Some((recipe.clone(), Vec::new())),
                None => debug!("Pinned recipe {} does not produce {}, ignoring", pinned, item),
            }
        }

        self.selector
            .select(item, candidates, sim)
            .map(|selection| (selection.recipe.clone(), selection.tied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::FirstListedSelector;
    use autocraft_core::{IngredientSlot, ItemStack, RecipeKind};
    use autocraft_storage::MemoryCatalog;
    use proptest::prelude::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn recipe(id: &str, slots: &[&[&str]], result: &str, count: u32) -> RecipeDefinition {
        RecipeDefinition::new(
            id,
            slots.iter().map(|alts| IngredientSlot::any_of(alts.iter().copied())).collect(),
            ItemStack::new(result, count),
        )
    }

    fn holdings(items: &[(&str, u32)]) -> Holdings {
        items.iter().copied().collect()
    }

    fn ids(plan: &CraftingPlan) -> Vec<&str> {
        plan.steps().iter().map(|s| s.recipe_id.as_str()).collect()
    }

    /// Planks from logs, sticks from planks, torches from coal + stick.
    fn torch_catalog() -> MemoryCatalog {
        let stick: &[&str] = &["stick"];
        MemoryCatalog::from_recipes([
            recipe("oak_planks", &[&["oak_log"]], "oak_planks", 4),
            recipe("stick", &[&["oak_planks"], &["oak_planks"]], "stick", 4),
            recipe("torch", &[&["coal"], &["stick"]], "torch", 4),
            recipe("ladder", &[stick; 7], "ladder", 3),
        ])
    }

    /// Straight line item_0 <- item_1 <- ... <- item_{n}, raw material `base`.
    fn chain_catalog(links: usize) -> MemoryCatalog {
        MemoryCatalog::from_recipes((0..links).map(|i| {
            let input = if i + 1 == links { "base".to_string() } else { format!("item_{}", i + 1) };
            recipe(&format!("make_{}", i), &[&[input.as_str()]], &format!("item_{}", i), 1)
        }))
    }

    #[derive(Debug)]
    struct ManualClock(Mutex<Instant>);

    impl ManualClock {
        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.0.lock().unwrap()
        }
    }

    #[test]
    fn test_direct_craft_has_single_step() {
        let mut resolver = DependencyResolver::new(torch_catalog());
        let plan = resolver
            .resolve(&"torch".into(), &holdings(&[("coal", 1), ("stick", 1)]))
            .unwrap();

        assert!(plan.can_craft());
        assert!(!plan.requires_sub_crafting());
        assert_eq!(ids(&plan), vec!["torch"]);
    }

    #[test]
    fn test_nested_sub_crafting() {
        let mut resolver = DependencyResolver::new(torch_catalog());
        let plan = resolver
            .resolve(&"torch".into(), &holdings(&[("coal", 1), ("oak_log", 1)]))
            .unwrap();

        assert!(plan.can_craft());
        assert_eq!(ids(&plan), vec!["oak_planks", "stick", "torch"]);
        assert!(plan.is_valid());
        assert!(!plan.has_recipe_choices());
    }

    #[test]
    fn test_surplus_feeds_later_slots() {
        let mut resolver = DependencyResolver::new(torch_catalog());
        let plan = resolver
            .resolve(&"ladder".into(), &holdings(&[("oak_log", 1)]))
            .unwrap();

        assert!(plan.can_craft());
        // The first stick craft turns the log into 4 planks and uses 2; the
        // second stick craft uses the leftover pair.
        assert_eq!(ids(&plan), vec!["oak_planks", "stick", "stick", "ladder"]);
    }

    #[test]
    fn test_missing_raw_material_fails_with_target_only() {
        let mut resolver = DependencyResolver::new(torch_catalog());
        let plan = resolver
            .resolve(&"torch".into(), &holdings(&[("oak_log", 1)]))
            .unwrap();

        assert!(!plan.can_craft());
        assert_eq!(ids(&plan), vec!["torch"]);
        assert!(!plan.has_recipe_choices());
    }

    #[test]
    fn test_unknown_and_furnace_targets() {
        let mut catalog = torch_catalog();
        catalog.insert(
            RecipeDefinition::new(
                "charcoal",
                vec![IngredientSlot::single("oak_log")],
                ItemStack::new("charcoal", 1),
            )
            .with_kind(RecipeKind::Smelting),
        );
        let mut resolver = DependencyResolver::new(catalog);

        assert_eq!(
            resolver.resolve(&"nope".into(), &Holdings::new()),
            Err(ResolveError::UnknownRecipe("nope".into()))
        );
        assert_eq!(
            resolver.resolve(&"charcoal".into(), &holdings(&[("oak_log", 1)])),
            Err(ResolveError::NotCraftingRecipe("charcoal".into()))
        );
    }

    #[test]
    fn test_malformed_target_is_rejected() {
        let catalog = MemoryCatalog::from_recipes([recipe("void", &[&["dirt"]], "air", 0)]);
        let mut resolver = DependencyResolver::new(catalog);
        assert!(matches!(
            resolver.resolve(&"void".into(), &holdings(&[("dirt", 1)])),
            Err(ResolveError::Malformed(_))
        ));
    }

    #[test]
    fn test_malformed_producers_are_skipped() {
        let catalog = MemoryCatalog::from_recipes([
            recipe("broken_stick", &[&["dirt"]], "stick", 0),
            RecipeDefinition::new(
                "empty_stick",
                vec![IngredientSlot::empty()],
                ItemStack::new("stick", 4),
            ),
            recipe("stick", &[&["oak_planks"], &["oak_planks"]], "stick", 4),
            recipe("torch", &[&["coal"], &["stick"]], "torch", 4),
        ]);
        let mut resolver = DependencyResolver::new(catalog);
        let plan = resolver
            .resolve(&"torch".into(), &holdings(&[("coal", 1), ("dirt", 1), ("oak_planks", 2)]))
            .unwrap();

        assert!(plan.can_craft());
        assert_eq!(ids(&plan), vec!["stick", "torch"]);
    }

    #[test]
    fn test_alternatives_in_slot_order() {
        let catalog = MemoryCatalog::from_recipes([
            recipe("planks_from_oak", &[&["oak_log"]], "planks", 4),
            recipe("chest_part", &[&["birch_planks", "planks"]], "chest_part", 1),
        ]);
        let mut resolver = DependencyResolver::new(catalog);

        // birch_planks has no producer; falls through to crafting planks
        let plan = resolver
            .resolve(&"chest_part".into(), &holdings(&[("oak_log", 1)]))
            .unwrap();
        assert_eq!(ids(&plan), vec!["planks_from_oak", "chest_part"]);

        // Held alternative wins without any sub-crafting
        let plan = resolver
            .resolve(&"chest_part".into(), &holdings(&[("oak_log", 1), ("birch_planks", 1)]))
            .unwrap();
        assert_eq!(ids(&plan), vec!["chest_part"]);
    }

    #[test]
    fn test_failed_branch_is_rolled_back() {
        // First alternative "gadget" can be partly built (gear is craftable)
        // but needs a spring nobody can make. The second alternative must see
        // the iron that the abandoned gear craft would have used.
        let catalog = MemoryCatalog::from_recipes([
            recipe("gear", &[&["iron"]], "gear", 1),
            recipe("gadget", &[&["gear"], &["spring"]], "gadget", 1),
            recipe("plate", &[&["iron"]], "plate", 1),
            recipe("machine", &[&["gadget", "plate"]], "machine", 1),
        ]);
        let mut resolver = DependencyResolver::new(catalog);
        let plan = resolver
            .resolve(&"machine".into(), &holdings(&[("iron", 1)]))
            .unwrap();

        assert!(plan.can_craft());
        assert_eq!(ids(&plan), vec!["plate", "machine"]);
    }

    #[test]
    fn test_depth_bound() {
        let limit = ResolverConfig::default().max_depth;

        // Target at depth 0, base reached after limit sub-crafts: feasible
        let mut resolver = DependencyResolver::new(chain_catalog(limit + 1));
        let plan = resolver.resolve(&"make_0".into(), &holdings(&[("base", 1)])).unwrap();
        assert!(plan.can_craft());
        assert_eq!(plan.steps().len(), limit + 1);

        // One more link: not feasible
        let mut resolver = DependencyResolver::new(chain_catalog(limit + 2));
        let plan = resolver.resolve(&"make_0".into(), &holdings(&[("base", 1)])).unwrap();
        assert!(!plan.can_craft());
        assert_eq!(plan.steps().len(), 1);
    }

    #[test]
    fn test_depth_bound_is_configurable() {
        let config = ResolverConfig::default().with_max_depth(6);
        let mut resolver = DependencyResolver::with_config(chain_catalog(7), config);
        let plan = resolver.resolve(&"make_0".into(), &holdings(&[("base", 1)])).unwrap();
        assert!(plan.can_craft());
    }

    #[test]
    fn test_cycles_terminate() {
        // a <-> b with no raw material anywhere
        let catalog = MemoryCatalog::from_recipes([
            recipe("a_from_b", &[&["b"]], "a", 1),
            recipe("b_from_a", &[&["a"]], "b", 1),
            recipe("block", &[&["a"]], "block", 1),
        ]);
        let mut resolver = DependencyResolver::new(catalog);
        let plan = resolver.resolve(&"block".into(), &Holdings::new()).unwrap();
        assert!(!plan.can_craft());
        assert_eq!(resolver.max_craftable(&"block".into(), &Holdings::new()), 0);
    }

    #[test]
    fn test_target_result_counts_as_in_progress() {
        // Producing the target's own result as an ingredient is never attempted
        let catalog = MemoryCatalog::from_recipes([
            recipe("compress", &[&["dust"], &["dust"]], "dust", 1),
        ]);
        let mut resolver = DependencyResolver::new(catalog);
        let plan = resolver.resolve(&"compress".into(), &holdings(&[("dust", 1)])).unwrap();
        assert!(!plan.can_craft());
    }

    #[test]
    fn test_recipe_choices_reported() {
        let catalog = MemoryCatalog::from_recipes([
            recipe("oak_planks", &[&["oak_log"]], "planks", 4),
            recipe("birch_planks", &[&["birch_log"]], "planks", 4),
            recipe("stick", &[&["planks"], &["planks"]], "stick", 4),
        ]);
        let mut resolver = DependencyResolver::new(catalog);
        let plan = resolver
            .resolve(&"stick".into(), &holdings(&[("oak_log", 1), ("birch_log", 1)]))
            .unwrap();

        assert!(plan.can_craft());
        assert_eq!(ids(&plan), vec!["oak_planks", "stick"]);
        assert_eq!(
            plan.recipe_choices().get(&ItemKind::new("planks")),
            Some(&vec![RecipeId::new("oak_planks"), RecipeId::new("birch_planks")])
        );

        // Pinning the item settles it
        let choices: ProducerChoices =
            [("planks".into(), "birch_planks".into())].into_iter().collect();
        let start = holdings(&[("oak_log", 1), ("birch_log", 1)]);
        let plan = resolver
            .resolve_with_choices(&"stick".into(), &start, &choices)
            .unwrap();
        assert_eq!(ids(&plan), vec!["birch_planks", "stick"]);
        assert!(!plan.has_recipe_choices());
    }

    #[test]
    fn test_directly_craftable_producer_preferred() {
        let catalog = MemoryCatalog::from_recipes([
            recipe("oak_planks", &[&["oak_log"]], "planks", 4),
            recipe("birch_planks", &[&["birch_log"]], "planks", 4),
            recipe("stick", &[&["planks"], &["planks"]], "stick", 4),
        ]);
        let mut resolver = DependencyResolver::new(catalog);
        let plan = resolver
            .resolve(&"stick".into(), &holdings(&[("birch_log", 1)]))
            .unwrap();

        assert_eq!(ids(&plan), vec!["birch_planks", "stick"]);
        assert!(!plan.has_recipe_choices());
    }

    #[test]
    fn test_first_listed_selector_never_reports_choices() {
        let catalog = MemoryCatalog::from_recipes([
            recipe("oak_planks", &[&["oak_log"]], "planks", 4),
            recipe("birch_planks", &[&["birch_log"]], "planks", 4),
            recipe("stick", &[&["planks"], &["planks"]], "stick", 4),
        ]);
        let mut resolver =
            DependencyResolver::new(catalog).with_selector(Box::new(FirstListedSelector));
        let plan = resolver
            .resolve(&"stick".into(), &holdings(&[("oak_log", 1), ("birch_log", 1)]))
            .unwrap();
        assert!(!plan.has_recipe_choices());
    }

    #[test]
    fn test_quantity_feasibility() {
        let mut resolver = DependencyResolver::new(torch_catalog());
        let start = holdings(&[("coal", 3), ("oak_log", 1)]);

        // One log -> 4 planks -> up to 8 sticks, coal caps torches at 3
        assert!(resolver.can_craft(&"torch".into(), 3, &start));
        assert!(!resolver.can_craft(&"torch".into(), 4, &start));
        assert_eq!(resolver.max_craftable(&"torch".into(), &start), 3);
        assert!(resolver.can_craft(&"torch".into(), 0, &start));
    }

    /// Two planks make four sticks; the frame needs four sticks and two strings.
    fn frame_catalog() -> MemoryCatalog {
        MemoryCatalog::from_recipes([
            recipe("sticks", &[&["planks"], &["planks"]], "stick", 4),
            recipe(
                "frame",
                &[&["stick"], &["stick"], &["stick"], &["stick"], &["string"], &["string"]],
                "frame",
                1,
            ),
        ])
    }

    #[test]
    fn test_sub_craft_surplus_covers_repeated_slots() {
        let mut resolver = DependencyResolver::new(frame_catalog());
        let plan = resolver
            .resolve(&"frame".into(), &holdings(&[("planks", 2), ("string", 2)]))
            .unwrap();

        assert!(plan.can_craft());
        assert_eq!(ids(&plan), vec!["sticks", "frame"]);
    }

    #[test]
    fn test_insufficient_raw_material_for_sub_craft() {
        let mut resolver = DependencyResolver::new(frame_catalog());
        let plan = resolver
            .resolve(&"frame".into(), &holdings(&[("planks", 1), ("string", 2)]))
            .unwrap();

        assert!(!plan.can_craft());
        assert_eq!(ids(&plan), vec!["frame"]);
    }

    #[test]
    fn test_quantity_follows_pinned_producer() {
        let catalog = MemoryCatalog::from_recipes([
            recipe("oak_planks", &[&["oak_log"]], "planks", 4),
            recipe("birch_planks", &[&["birch_log"]], "planks", 4),
            recipe("stick", &[&["planks"], &["planks"]], "stick", 4),
        ]);
        let mut resolver = DependencyResolver::new(catalog);
        let start = holdings(&[("oak_log", 1)]);
        let pinned: ProducerChoices =
            [("planks".into(), "birch_planks".into())].into_iter().collect();

        assert!(resolver.can_craft(&"stick".into(), 1, &start));
        assert!(!resolver.can_craft_with_choices(&"stick".into(), 1, &start, &pinned));
        assert_eq!(resolver.max_craftable(&"stick".into(), &start), 2);
        assert_eq!(resolver.max_craftable_with_choices(&"stick".into(), &start, &pinned), 0);
    }

    #[test]
    fn test_max_craftable_is_capped() {
        let config = ResolverConfig::default().with_max_quantity(5);
        let mut resolver = DependencyResolver::with_config(torch_catalog(), config);
        let start = holdings(&[("coal", 100), ("stick", 100)]);
        assert_eq!(resolver.max_craftable(&"torch".into(), &start), 5);
        assert_eq!(resolver.max_craftable(&"nope".into(), &start), 0);
    }

    #[test]
    fn test_cancelled_planning() {
        let mut resolver = DependencyResolver::new(torch_catalog());
        let token = CancelToken::new();
        token.cancel();
        let result = resolver.resolve_cancellable(
            &"torch".into(),
            &holdings(&[("coal", 1), ("stick", 1)]),
            &ProducerChoices::new(),
            &token,
        );
        assert_eq!(result, Err(ResolveError::Cancelled));
    }

    #[test]
    fn test_catalog_changes_seen_after_expiry() {
        let clock = Arc::new(ManualClock(Mutex::new(Instant::now())));
        let catalog = Arc::new(Mutex::new(torch_catalog()));

        struct Shared(Arc<Mutex<MemoryCatalog>>);
        impl RecipeCatalog for Shared {
            fn lookup(&self, id: &RecipeId) -> Option<RecipeDefinition> {
                self.0.lock().unwrap().lookup(id)
            }
            fn producers_for(&self, item: &ItemKind) -> Vec<RecipeDefinition> {
                self.0.lock().unwrap().producers_for(item)
            }
        }

        let mut resolver =
            DependencyResolver::new(Shared(catalog.clone())).with_clock(clock.clone());
        let start = holdings(&[("stick", 1), ("charcoal", 1)]);
        let torch_any = recipe("torch_any", &[&["coal"], &["stick"]], "torch_any", 4);
        catalog.lock().unwrap().insert(torch_any);

        assert!(!resolver.resolve(&"torch_any".into(), &start).unwrap().can_craft());

        catalog.lock().unwrap().insert(recipe("coal_from_charcoal", &[&["charcoal"]], "coal", 1));

        // "coal has no producer" is still memoized
        assert!(!resolver.resolve(&"torch_any".into(), &start).unwrap().can_craft());

        clock.advance(Duration::from_secs(6));
        assert!(resolver.resolve(&"torch_any".into(), &start).unwrap().can_craft());
    }

    /// Replays a plan's steps against real consumption; false on any shortfall.
    fn replay(catalog: &MemoryCatalog, plan: &CraftingPlan, start: &Holdings) -> bool {
        let mut held = start.clone();
        for step in plan.steps() {
            let Some(recipe) = catalog.get(&step.recipe_id) else {
                return false;
            };
            for slot in recipe.consuming_slots() {
                let Some(item) = slot.alternatives().find(|i| held.count(i) > 0).cloned() else {
                    return false;
                };
                held.take(&item, 1);
            }
            held.add(&recipe.result.item, recipe.result.count);
        }
        true
    }

    fn arb_holdings() -> impl Strategy<Value = Holdings> {
        proptest::collection::vec(
            (prop::sample::select(vec!["oak_log", "oak_planks", "stick", "coal"]), 0u32..6),
            0..6,
        )
        .prop_map(|pairs| pairs.into_iter().collect::<Holdings>())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_resolution_is_deterministic(start in arb_holdings()) {
            let mut first = DependencyResolver::new(torch_catalog());
            let mut second = DependencyResolver::new(torch_catalog());
            for target in ["torch", "ladder", "stick"] {
                let a = first.resolve(&target.into(), &start).unwrap();
                let b = second.resolve(&target.into(), &start).unwrap();
                prop_assert_eq!(&a, &b);
                prop_assert_eq!(a, first.resolve(&target.into(), &start).unwrap());
            }
        }

        #[test]
        fn prop_feasible_plans_replay_without_shortfall(
            start in arb_holdings(),
            coal in 1u32..4,
            logs in 1u32..4,
        ) {
            let catalog = Arc::new(torch_catalog());
            let mut resolver = DependencyResolver::new(catalog.clone());

            // A log and a coal always make a torch, so replay runs every case
            let mut stocked = start.clone();
            stocked.add(&"coal".into(), coal);
            stocked.add(&"oak_log".into(), logs);
            let plan = resolver.resolve(&"torch".into(), &stocked).unwrap();
            prop_assert!(plan.can_craft());
            prop_assert!(replay(&catalog, &plan, &stocked));

            for target in ["torch", "ladder", "stick"] {
                let plan = resolver.resolve(&target.into(), &start).unwrap();
                prop_assert!(!plan.steps().is_empty());
                prop_assert_eq!(plan.is_valid(), plan.can_craft());
                if plan.can_craft() {
                    prop_assert!(replay(&catalog, &plan, &start));
                } else {
                    prop_assert_eq!(plan.steps().len(), 1);
                }
            }
        }

        #[test]
        fn prop_quantity_is_monotone(start in arb_holdings(), n in 1u32..6) {
            let mut resolver = DependencyResolver::new(torch_catalog());
            if resolver.can_craft(&"torch".into(), n, &start) {
                prop_assert!(resolver.can_craft(&"torch".into(), n - 1, &start));
            }
            let max = resolver.max_craftable(&"torch".into(), &start);
            prop_assert_eq!(max >= n, resolver.can_craft(&"torch".into(), n, &start));
        }
    }
}
