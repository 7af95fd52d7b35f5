//! The execution engine - plans off the pacing loop, then drives the scheduler.

use crate::resolver::{CancelToken, DependencyResolver, ProducerChoices, ResolveError};
use crate::scheduler::{ActionSink, ExecuteError, ExecutionScheduler, TickOutcome};
use autocraft_core::{CraftLedger, CraftingPlan, Holdings, RecipeId, RunId};
use autocraft_storage::RecipeCatalog;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Configuration for the execution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wall-clock length of one scheduler tick
    pub tick_interval: Duration,
    /// Max ticks before a run is abandoned (None = unbounded)
    pub max_ticks: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            max_ticks: None,
        }
    }
}

impl EngineConfig {
    /// Set the tick length.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Bound the number of ticks per run.
    pub fn with_max_ticks(mut self, max: usize) -> Self {
        self.max_ticks = Some(max);
        self
    }
}

/// Errors from the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Planning failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The scheduler refused the run
    #[error(transparent)]
    Execute(#[from] ExecuteError),

    /// The plan cannot be carried out with current holdings
    #[error("Cannot craft {0} with current holdings")]
    Infeasible(RecipeId),

    /// The run hit the tick limit and was cancelled
    #[error("Run cancelled after reaching the limit of {0} ticks")]
    TickLimit(usize),

    /// The planning task panicked or was aborted
    #[error("Planning task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Plan computation running on a blocking worker.
pub struct PlanningJob {
    cancel: CancelToken,
    handle: JoinHandle<Result<CraftingPlan, ResolveError>>,
}

impl PlanningJob {
    /// Ask the planner to stop at its next recursion step.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token controlling this job.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Wait for the plan.
    pub async fn wait(self) -> Result<CraftingPlan, EngineError> {
        Ok(self.handle.await??)
    }
}

/// Summary of one engine run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Scheduler run identifier
    pub run_id: RunId,
    /// Number of plan repetitions requested
    pub repeat: u32,
    /// Ticks elapsed
    pub ticks: usize,
    /// Steps issued to the sink
    pub steps_executed: usize,
    /// Whether every step was issued
    pub completed: bool,
}

/// Ties a resolver and a scheduler to a wall-clock tick source.
///
/// ```text
/// Plan (blocking worker, cancellable) → Execute → Tick … → Idle
/// ```
pub struct ExecutionEngine<C: RecipeCatalog> {
    resolver: Arc<Mutex<DependencyResolver<C>>>,
    scheduler: ExecutionScheduler,
    config: EngineConfig,
}

impl<C: RecipeCatalog + 'static> ExecutionEngine<C> {
    /// Create an engine from its parts.
    pub fn new(resolver: DependencyResolver<C>, scheduler: ExecutionScheduler) -> Self {
        Self {
            resolver: Arc::new(Mutex::new(resolver)),
            scheduler,
            config: EngineConfig::default(),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Shared handle to the resolver.
    pub fn resolver(&self) -> Arc<Mutex<DependencyResolver<C>>> {
        Arc::clone(&self.resolver)
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &ExecutionScheduler {
        &self.scheduler
    }

    /// Start planning `target` on a blocking worker.
    pub fn spawn_plan(
        &self,
        target: RecipeId,
        holdings: Holdings,
        choices: ProducerChoices,
    ) -> PlanningJob {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let resolver = Arc::clone(&self.resolver);

        debug!("Spawning planner for {}", target);
        let handle = tokio::task::spawn_blocking(move || {
            let mut resolver = resolver.blocking_lock();
            resolver.resolve_cancellable(&target, &holdings, &choices, &token)
        });

        PlanningJob { cancel, handle }
    }

    /// Plan `target` and wait for the result.
    pub async fn plan(
        &self,
        target: RecipeId,
        holdings: Holdings,
        choices: ProducerChoices,
    ) -> Result<CraftingPlan, EngineError> {
        self.spawn_plan(target, holdings, choices).wait().await
    }

    /// Largest feasible quantity of `target`, computed off the async runtime.
    pub async fn max_craftable(
        &self,
        target: RecipeId,
        holdings: Holdings,
        choices: ProducerChoices,
    ) -> Result<u32, EngineError> {
        let resolver = Arc::clone(&self.resolver);
        let max = tokio::task::spawn_blocking(move || {
            resolver
                .blocking_lock()
                .max_craftable_with_choices(&target, &holdings, &choices)
        })
        .await?;
        Ok(max)
    }

    /// Execute `repeat` copies of `plan` against `sink`, one tick per interval.
    pub async fn run<A, L>(
        &mut self,
        plan: &CraftingPlan,
        repeat: u32,
        sink: &mut A,
        ledger: &mut L,
    ) -> Result<RunReport, EngineError>
    where
        A: ActionSink + ?Sized,
        L: CraftLedger + ?Sized,
    {
        if !plan.can_craft() {
            return Err(EngineError::Infeasible(plan.target_recipe().clone()));
        }

        let run_id = self.scheduler.execute(plan, repeat)?;
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks = 0;
        let mut steps_executed = 0;
        let completed = loop {
            interval.tick().await;
            ticks += 1;

            match self.scheduler.tick(sink, ledger) {
                TickOutcome::Waiting { .. } => {}
                TickOutcome::StepExecuted { .. } => steps_executed += 1,
                TickOutcome::Completed { .. } => {
                    steps_executed += 1;
                    break true;
                }
                TickOutcome::Aborted { .. } | TickOutcome::Idle => break false,
            }

            if let Some(max) = self.config.max_ticks {
                if ticks >= max {
                    warn!("Run {} exceeded {} ticks, cancelling", run_id, max);
                    self.scheduler.cancel();
                    return Err(EngineError::TickLimit(max));
                }
            }
        };

        info!(
            "Run {} finished after {} ticks: {} steps executed (completed: {})",
            run_id, ticks, steps_executed, completed
        );

        Ok(RunReport {
            run_id,
            repeat,
            ticks,
            steps_executed,
            completed,
        })
    }

    /// Abandon the current run, if any.
    pub fn cancel(&mut self) {
        self.scheduler.cancel();
    }
}
