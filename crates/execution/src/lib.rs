//! Execution layer - dependency resolution, producer selection, and paced execution.

#![warn(missing_docs)]

pub mod producer;
pub mod selector;
pub mod resolver;
pub mod scheduler;
pub mod workbench;
pub mod engine;

pub use producer::{Clock, ProducerCache, SystemClock};
pub use selector::{ProducerSelector, Selection, DirectFirstSelector, FirstListedSelector};
pub use resolver::{DependencyResolver, ResolveError, CancelToken, ProducerChoices};
pub use scheduler::{ExecutionScheduler, ActionSink, ExecuteError, SchedulerState, TickOutcome};
pub use workbench::{SimulatedWorkbench, WorkbenchAction};
pub use engine::{ExecutionEngine, EngineConfig, EngineError, PlanningJob, RunReport};
