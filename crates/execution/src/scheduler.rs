//! Tick-paced plan execution.

use autocraft_core::{CraftLedger, CraftingPlan, CraftingStep, RecipeId, RunId, SchedulerConfig};
use tracing::{debug, error, info, warn};

/// External surface that performs crafting actions.
pub trait ActionSink {
    /// Whether a live session exists to act through.
    fn session_available(&self) -> bool;

    /// Craft `recipe` once, or as many times as the inputs allow when
    /// `batch_all` is set.
    fn craft(&mut self, recipe: &RecipeId, batch_all: bool);

    /// Move whatever sits in the crafting output into general storage.
    fn collect_result(&mut self);
}

/// Errors from starting a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    /// Another run is in progress
    #[error("A run is already in progress ({remaining} steps left)")]
    Busy {
        /// Steps left in the current run
        remaining: usize,
    },

    /// Nothing to execute
    #[error("Repeat count must be at least 1")]
    EmptyRun,

    /// The plan still has items with several equally good producers
    #[error("Plan has unresolved recipe choices for: {0}")]
    UnresolvedChoices(String),
}

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No run
    Idle,
    /// Waiting before the next step
    Scheduled {
        /// Ticks until the step fires, the firing tick included
        ticks_remaining: u32,
    },
    /// Executing a step
    Running,
    /// Last step done
    Completed,
    /// Run aborted
    Cancelled,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No run
    Idle,
    /// Counting down
    Waiting {
        /// Ticks left before the next step
        ticks_remaining: u32,
    },
    /// A step was issued and more remain
    StepExecuted {
        /// Zero-based index into the run
        index: usize,
        /// Run length
        total: usize,
        /// Recipe crafted
        recipe: RecipeId,
    },
    /// The final step was issued; the scheduler is idle again
    Completed {
        /// Steps executed
        steps: usize,
    },
    /// The session went away; the run was dropped
    Aborted {
        /// Steps executed before the abort
        executed: usize,
    },
}

/// Turns plans into paced craft/collect actions.
///
/// ```text
/// Idle -> Scheduled(delay) -> Running -> Scheduled(delay) ... -> Completed -> Idle
/// ```
#[derive(Debug)]
pub struct ExecutionScheduler {
    config: SchedulerConfig,
    state: SchedulerState,
    run: Vec<CraftingStep>,
    cursor: usize,
    run_id: Option<RunId>,
}

impl Default for ExecutionScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl ExecutionScheduler {
    /// Create an idle scheduler.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Idle,
            run: Vec::new(),
            cursor: 0,
            run_id: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether a run is in progress.
    pub fn is_executing(&self) -> bool {
        self.state != SchedulerState::Idle
    }

    /// Steps not yet issued.
    pub fn remaining_steps(&self) -> usize {
        self.run.len().saturating_sub(self.cursor)
    }

    /// Identifier of the current run.
    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    /// Start executing `repeat` back-to-back copies of `plan`.
    ///
    /// Rejected without touching any state when a run is already in progress.
    pub fn execute(&mut self, plan: &CraftingPlan, repeat: u32) -> Result<RunId, ExecuteError> {
        if self.is_executing() {
            warn!(
                "Ignoring request to run {}: {} steps of run still pending",
                plan.target_recipe(),
                self.remaining_steps()
            );
            return Err(ExecuteError::Busy {
                remaining: self.remaining_steps(),
            });
        }
        if repeat == 0 {
            warn!("Ignoring request to run {} zero times", plan.target_recipe());
            return Err(ExecuteError::EmptyRun);
        }
        if plan.has_recipe_choices() {
            let items: Vec<String> = plan.recipe_choices().keys().map(|i| i.to_string()).collect();
            let items = items.join(", ");
            warn!("Refusing to run {}: no recipe picked for {}", plan.target_recipe(), items);
            return Err(ExecuteError::UnresolvedChoices(items));
        }

        self.run = (0..repeat).flat_map(|_| plan.steps().iter().cloned()).collect();
        self.cursor = 0;
        let run_id = RunId::new();
        self.run_id = Some(run_id);
        self.transition(SchedulerState::Scheduled {
            ticks_remaining: self.config.initial_delay_ticks.max(1),
        });

        info!(
            "Run {} started: {} x {} ({} steps)",
            run_id,
            repeat,
            plan.target_recipe(),
            self.run.len()
        );
        Ok(run_id)
    }

    /// Advance one tick, issuing at most one step to `sink`.
    pub fn tick<A, L>(&mut self, sink: &mut A, ledger: &mut L) -> TickOutcome
    where
        A: ActionSink + ?Sized,
        L: CraftLedger + ?Sized,
    {
        let SchedulerState::Scheduled { ticks_remaining } = self.state else {
            return TickOutcome::Idle;
        };

        let ticks_remaining = ticks_remaining.saturating_sub(1);
        if ticks_remaining > 0 {
            self.state = SchedulerState::Scheduled { ticks_remaining };
            return TickOutcome::Waiting { ticks_remaining };
        }

        self.transition(SchedulerState::Running);

        if !sink.session_available() {
            let executed = self.cursor;
            error!(
                "Session lost during run {}, aborting after {} of {} steps",
                self.run_label(),
                executed,
                self.run.len()
            );
            self.transition(SchedulerState::Cancelled);
            self.reset();
            return TickOutcome::Aborted { executed };
        }

        let Some(step) = self.run.get(self.cursor).cloned() else {
            self.reset();
            return TickOutcome::Idle;
        };

        // One batch only: the plan accounted for exactly one craft per step
        sink.craft(&step.recipe_id, false);
        sink.collect_result();
        ledger.record(&step.result.item, step.result.count);

        let index = self.cursor;
        let total = self.run.len();
        self.cursor += 1;
        debug!("Step {}/{}: crafted {}", index + 1, total, step.result);

        if self.cursor < total {
            self.transition(SchedulerState::Scheduled {
                ticks_remaining: self.config.ticks_between_steps.max(1),
            });
            TickOutcome::StepExecuted {
                index,
                total,
                recipe: step.recipe_id,
            }
        } else {
            info!("Run {} completed ({} steps)", self.run_label(), total);
            self.transition(SchedulerState::Completed);
            self.reset();
            TickOutcome::Completed { steps: total }
        }
    }

    /// Drop the current run, if any. Always leaves the scheduler idle.
    pub fn cancel(&mut self) {
        if self.is_executing() {
            info!(
                "Run {} cancelled with {} steps left",
                self.run_label(),
                self.remaining_steps()
            );
            self.transition(SchedulerState::Cancelled);
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.run.clear();
        self.cursor = 0;
        self.run_id = None;
        self.transition(SchedulerState::Idle);
    }

    fn transition(&mut self, to: SchedulerState) {
        if self.state != to {
            debug!("Scheduler {:?} -> {:?}", self.state, to);
        }
        self.state = to;
    }

    fn run_label(&self) -> String {
        self.run_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
    }
}
