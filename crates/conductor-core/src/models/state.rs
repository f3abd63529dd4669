//! Live execution state wrapped around a plan.

use serde::{Deserialize, Serialize};

use super::{Plan, PlanStep};

/// Policy knobs for one execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Advance to the next step automatically after each success
    #[serde(alias = "autoProceed")]
    pub auto_proceed: bool,

    /// Suspend the run when a step fails instead of moving past it
    #[serde(alias = "pauseOnError")]
    pub pause_on_error: bool,

    /// Validate and sequence steps without invoking their handlers
    #[serde(alias = "dryRun")]
    pub dry_run: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            auto_proceed: true,
            pause_on_error: true,
            dry_run: false,
        }
    }
}

impl ExecutionOptions {
    pub fn manual() -> Self {
        Self {
            auto_proceed: false,
            ..Self::default()
        }
    }

    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    pub fn continue_on_error() -> Self {
        Self {
            pause_on_error: false,
            ..Self::default()
        }
    }
}

/// Run-time wrapper tracking one plan's progress.
///
/// Observers receive snapshots of this type; the engine's copy is only ever
/// mutated by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionState {
    /// Snapshot of the plan being executed
    pub plan: Plan,

    /// Index of the next step to attempt
    pub current_step_index: usize,

    /// A worker loop is driving this plan
    pub is_executing: bool,

    /// Step dispatch is suspended until resumed
    pub is_paused: bool,

    /// Policy for this run
    pub options: ExecutionOptions,

    /// A step has been dispatched and its handler has not returned yet
    #[serde(default)]
    pub step_in_flight: bool,

    /// Registration generation, distinct for every start of the same plan
    #[serde(default)]
    pub run_id: u64,
}

impl ExecutionState {
    pub(crate) fn new(plan: Plan, options: ExecutionOptions, run_id: u64) -> Self {
        let current_step_index = plan.current_step;
        Self {
            plan,
            current_step_index,
            is_executing: false,
            is_paused: false,
            options,
            step_in_flight: false,
            run_id,
        }
    }

    /// Identifier of the wrapped plan.
    pub fn plan_id(&self) -> &str {
        &self.plan.id
    }

    /// The step the cursor points at, if any remain.
    pub fn current_step(&self) -> Option<&PlanStep> {
        self.plan.steps.get(self.current_step_index)
    }

    /// Whether the cursor has moved past the last step.
    pub fn is_finished(&self) -> bool {
        self.current_step_index >= self.plan.steps.len()
    }

    /// Completed and total step counts.
    pub fn progress(&self) -> (usize, usize) {
        (self.plan.completed_steps(), self.plan.steps.len())
    }
}
