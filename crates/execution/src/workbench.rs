//! In-process crafting surface.
//!
//! Applies craft and collect actions to its own holdings using recipe
//! definitions from a catalog. Used by the CLI in place of a live session, and
//! by tests to check that executed plans never run short.

use crate::scheduler::ActionSink;
use autocraft_core::{Holdings, RecipeDefinition, RecipeId};
use autocraft_storage::{HoldingsSource, RecipeCatalog};
use tracing::{debug, warn};

/// One action the workbench carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkbenchAction {
    /// Recipe crafted `times` times into the output slot
    Craft {
        /// Recipe used
        recipe: RecipeId,
        /// Number of crafts performed
        times: u32,
    },
    /// Output slot emptied into storage
    Collect {
        /// Items moved
        items: u64,
    },
    /// Craft requested but the inputs were not there
    Shortfall {
        /// Recipe requested
        recipe: RecipeId,
    },
}

impl std::fmt::Display for WorkbenchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Craft { recipe, times } => write!(f, "craft {} x{}", recipe, times),
            Self::Collect { items } => write!(f, "collect {} items", items),
            Self::Shortfall { recipe } => write!(f, "missing inputs for {}", recipe),
        }
    }
}

/// Simulated crafting table with its own inventory.
pub struct SimulatedWorkbench<C: RecipeCatalog> {
    catalog: C,
    holdings: Holdings,
    output: Holdings,
    connected: bool,
    actions: Vec<WorkbenchAction>,
    shortfalls: usize,
}

impl<C: RecipeCatalog> SimulatedWorkbench<C> {
    /// Workbench holding `holdings`, with a live session.
    pub fn new(catalog: C, holdings: Holdings) -> Self {
        Self {
            catalog,
            holdings,
            output: Holdings::new(),
            connected: true,
            actions: Vec::new(),
            shortfalls: 0,
        }
    }

    /// Current storage contents (the output slot excluded).
    pub fn holdings(&self) -> &Holdings {
        &self.holdings
    }

    /// Take the storage contents, collecting anything left in the output.
    pub fn into_holdings(mut self) -> Holdings {
        self.collect_result();
        self.holdings
    }

    /// Actions performed so far.
    pub fn actions(&self) -> &[WorkbenchAction] {
        &self.actions
    }

    /// Craft requests that could not be carried out.
    pub fn shortfalls(&self) -> usize {
        self.shortfalls
    }

    /// Drop the session.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Restore the session.
    pub fn reconnect(&mut self) {
        self.connected = true;
    }

    fn craft_once(&mut self, recipe: &RecipeDefinition) -> bool {
        if !recipe.can_craft_directly(&self.holdings) {
            return false;
        }
        for slot in recipe.consuming_slots() {
            if let Some(item) = slot.alternatives().find(|i| self.holdings.count(i) > 0).cloned() {
                self.holdings.take(&item, 1);
            }
        }
        self.output.add(&recipe.result.item, recipe.result.count);
        true
    }
}

impl<C: RecipeCatalog> ActionSink for SimulatedWorkbench<C> {
    fn session_available(&self) -> bool {
        self.connected
    }

    fn craft(&mut self, recipe_id: &RecipeId, batch_all: bool) {
        let Some(recipe) = self.catalog.lookup(recipe_id) else {
            warn!("Workbench has no recipe {}", recipe_id);
            self.shortfalls += 1;
            self.actions.push(WorkbenchAction::Shortfall {
                recipe: recipe_id.clone(),
            });
            return;
        };

        let mut times = 0;
        while self.craft_once(&recipe) {
            times += 1;
            if !batch_all {
                break;
            }
        }

        if times == 0 {
            warn!("Not enough inputs to craft {}", recipe_id);
            self.shortfalls += 1;
            self.actions.push(WorkbenchAction::Shortfall {
                recipe: recipe_id.clone(),
            });
        } else {
            debug!("Crafted {} x{}", recipe_id, times);
            self.actions.push(WorkbenchAction::Craft {
                recipe: recipe_id.clone(),
                times,
            });
        }
    }

    fn collect_result(&mut self) {
        if self.output.is_empty() {
            return;
        }
        let items = self.output.total();
        for (item, count) in std::mem::take(&mut self.output).iter() {
            self.holdings.add(item, count);
        }
        self.actions.push(WorkbenchAction::Collect { items });
    }
}

impl<C: RecipeCatalog> HoldingsSource for SimulatedWorkbench<C> {
    fn snapshot(&self) -> Holdings {
        self.holdings.clone()
    }
}
