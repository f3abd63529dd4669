//! Plan execution engine.
//!
//! The [`Engine`] drives AI-generated action plans (think, read file, edit
//! file, run command, ...) one step at a time, with pause/resume, retry and
//! live observer notification.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │    Scheduler    │───▶│ HandlerRegistry │───▶│  StepHandler    │
//! │ (scheduler,     │    │ (validation +   │    │  (host-provided │
//! │  control)       │    │  dispatch)      │    │   capability)   │
//! └────────┬────────┘    └─────────────────┘    └─────────────────┘
//!          │ mutates                 notifies
//!          ▼                            ▼
//! ┌─────────────────┐          ┌─────────────────┐
//! │ ExecutionStore  │          │   ObserverBus   │
//! └─────────────────┘          └─────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: Factory for configured [`Engine`] instances
//! - [`store`]: Plan ID → [`ExecutionState`] map, one entry per plan
//! - [`scheduler`]: Start and the step loop
//! - [`control`]: Pause, resume, stop, retry and queries
//! - [`observer`]: Per-plan listener fan-out
//! - [`registry`]: Step handler trait and dispatch table
//! - [`pacing`]: Yield point between auto-proceeding steps
//! - [`reporter`]: Step failure reporting
//!
//! ## Guarantees
//!
//! 1. **Single flight**: at most one registered execution per plan ID, and at
//!    most one step of a plan awaiting its handler at any time
//! 2. **Ordering**: steps of one plan run in ascending index order
//! 3. **Isolation**: step failures are recorded on the step and never
//!    returned from the step loop; only structural misuse returns an error
//! 4. **No preemption**: pause and stop gate future dispatch only; a step
//!    already awaiting its handler runs to completion
//!
//! # Usage
//!
//! ```rust
//! use conductor_core::{
//!     engine::{EngineBuilder, NoopHandler, YieldPacer},
//!     models::{ExecutionOptions, Plan, PlanStep, StepType},
//! };
//!
//! # async fn example() -> conductor_core::Result<()> {
//! let mut builder = EngineBuilder::new().with_pacer(YieldPacer);
//! for step_type in StepType::ALL {
//!     builder = builder.with_handler(step_type, NoopHandler);
//! }
//! let engine = builder.build();
//!
//! let plan = Plan::new(
//!     "p1",
//!     "Fix the build",
//!     vec![
//!         PlanStep::think("s1", "The import path is wrong"),
//!         PlanStep::edit_file("s2", "/a.ts", "x"),
//!         PlanStep::run_command("s3", "echo ok"),
//!     ],
//! );
//!
//! let subscription = engine.subscribe("p1", |state| {
//!     println!("{state}");
//!     Ok(())
//! });
//!
//! engine.start_execution(plan, ExecutionOptions::default()).await?;
//! assert!(engine.get_execution_state("p1").is_none());
//! subscription.unsubscribe();
//! # Ok(())
//! # }
//! ```

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::warn;

use crate::{error::StepError, models::ExecutionState};

pub mod builder;
pub mod control;
pub mod observer;
pub mod pacing;
pub mod registry;
pub mod reporter;
pub mod scheduler;
pub mod store;


pub use builder::EngineBuilder;
pub use observer::{Listener, ObserverBus, Subscription};
pub use pacing::{DelayPacer, Pacer, YieldPacer, DEFAULT_STEP_DELAY};
pub use registry::{FnHandler, HandlerRegistry, NoopHandler, StepHandler};
pub use reporter::{ErrorContext, ErrorReporter, LogReporter, Severity};
pub use store::ExecutionStore;

use reporter::severity_for;

/// Executes plans step by step.
///
/// Cheap to clone; clones share the same store, observers and handlers, so
/// one engine can be constructed per process and handed to every caller.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Mutex<ExecutionStore>,
    observers: ObserverBus,
    handlers: HandlerRegistry,
    pacer: Arc<dyn Pacer>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Engine {
    /// Creates an engine with default pacing and reporting and no handlers.
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    pub(crate) fn from_parts(
        handlers: HandlerRegistry,
        pacer: Arc<dyn Pacer>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store: Mutex::new(ExecutionStore::new()),
                observers: ObserverBus::new(),
                handlers,
                pacer,
                reporter,
            }),
        }
    }

    /// The handler table this engine dispatches to.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.inner.handlers
    }

    fn store(&self) -> MutexGuard<'_, ExecutionStore> {
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers a snapshot to the plan's listeners. Must be called without
    /// holding the store lock.
    fn publish(&self, snapshot: &ExecutionState) {
        self.inner.observers.notify(snapshot.plan_id(), snapshot);
    }

    fn report(&self, error: &StepError, context: &ErrorContext) {
        let reporter = &self.inner.reporter;
        let reported = catch_unwind(AssertUnwindSafe(|| {
            reporter.log_error(error.kind(), error, severity_for(error), context);
        }));
        if reported.is_err() {
            warn!("Error reporter panicked while reporting plan '{}'", context.plan_id);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
