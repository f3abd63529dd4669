//! Pause, resume, stop and retry, plus read-only queries.

use log::{debug, info};

use super::{Engine, Subscription};
use crate::{
    error::{EngineError, Result},
    models::{ExecutionState, PlanStatus, StepStatus},
};

impl Engine {
    /// Withholds dispatch of the plan's next step.
    ///
    /// A step already awaiting its handler completes normally. No-op if the
    /// plan is not registered or already paused.
    pub fn pause_execution(&self, plan_id: &str) {
        let snapshot = {
            let mut store = self.store();
            let Some(state) = store.get_mut(plan_id) else {
                debug!("Pause ignored: plan '{plan_id}' is not registered");
                return;
            };
            if state.is_paused {
                return;
            }
            state.is_paused = true;
            if !state.step_in_flight {
                state.is_executing = false;
            }
            if matches!(state.plan.status, PlanStatus::Pending | PlanStatus::Running) {
                state.plan.status = PlanStatus::Paused;
            }
            state.clone()
        };

        info!("Paused plan '{plan_id}' at step {}", snapshot.current_step_index);
        self.publish(&snapshot);
    }

    /// Lifts a pause and, with `auto_proceed`, continues driving the plan.
    ///
    /// If the step under the cursor failed, it is reset to `pending` first;
    /// with `auto_proceed` it is then retried straight away, otherwise it
    /// waits for the next explicit step. No-op if the plan is not registered
    /// or not paused.
    pub async fn resume_execution(&self, plan_id: &str) {
        let resumed = {
            let mut store = self.store();
            let Some(state) = store.get_mut(plan_id) else {
                debug!("Resume ignored: plan '{plan_id}' is not registered");
                return;
            };
            if !state.is_paused {
                debug!("Resume ignored: plan '{plan_id}' is not paused");
                return;
            }
            state.is_paused = false;

            let auto_proceed = state.options.auto_proceed;
            let cursor = state.current_step_index;
            let cursor_failed = state
                .current_step()
                .is_some_and(|step| step.status == StepStatus::Error);
            if cursor_failed && auto_proceed {
                Err(cursor)
            } else {
                if cursor_failed {
                    state.plan.steps[cursor].reset();
                    state.plan.status = PlanStatus::Running;
                    state.plan.error = None;
                    state.plan.end_time = None;
                }
                state.is_executing = auto_proceed || state.step_in_flight;
                if state.plan.status == PlanStatus::Paused {
                    state.plan.status = PlanStatus::Running;
                }
                Ok((state.clone(), auto_proceed))
            }
        };

        match resumed {
            Ok((snapshot, auto_proceed)) => {
                info!("Resumed plan '{plan_id}' at step {}", snapshot.current_step_index);
                self.publish(&snapshot);
                if auto_proceed {
                    self.execute_next_step(plan_id).await;
                }
            }
            Err(failed_index) => {
                info!("Resuming plan '{plan_id}' by retrying failed step {failed_index}");
                if let Err(e) = self.retry_step(plan_id, failed_index).await {
                    debug!("Retry on resume failed for plan '{plan_id}': {e}");
                }
            }
        }
    }

    /// Removes the plan from the engine, leaving finished steps as they are.
    ///
    /// A step already awaiting its handler is not aborted; its outcome is
    /// discarded when it arrives. No-op if the plan is not registered.
    pub fn stop_execution(&self, plan_id: &str) {
        let Some(mut snapshot) = self.store().remove(plan_id) else {
            debug!("Stop ignored: plan '{plan_id}' is not registered");
            return;
        };
        snapshot.plan.status = PlanStatus::Paused;
        snapshot.is_executing = false;
        snapshot.is_paused = false;

        info!(
            "Stopped plan '{plan_id}' at step {} of {}",
            snapshot.current_step_index,
            snapshot.plan.steps.len()
        );
        self.publish(&snapshot);
    }

    /// Resets step `step_index` to `pending`, moves the cursor there and
    /// re-enters the step loop.
    ///
    /// Steps after `step_index` keep their status; they run again as the
    /// cursor reaches them.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PlanNotFound`] if the plan is not registered and
    /// [`EngineError::StepIndexOutOfRange`] if `step_index` is outside the
    /// plan. State is left unmodified in both cases.
    pub async fn retry_step(&self, plan_id: &str, step_index: usize) -> Result<()> {
        let snapshot = {
            let mut store = self.store();
            let state = store
                .get_mut(plan_id)
                .ok_or_else(|| EngineError::plan_not_found(plan_id))?;

            let len = state.plan.steps.len();
            if step_index >= len {
                return Err(EngineError::StepIndexOutOfRange {
                    plan_id: plan_id.to_string(),
                    index: step_index,
                    len,
                });
            }

            state.plan.steps[step_index].reset();
            state.current_step_index = step_index;
            state.plan.current_step = step_index;
            state.plan.status = PlanStatus::Running;
            state.plan.error = None;
            state.plan.end_time = None;
            state.is_paused = false;
            state.is_executing = true;
            state.clone()
        };

        info!("Retrying plan '{plan_id}' from step {step_index}");
        self.publish(&snapshot);
        self.execute_next_step(plan_id).await;
        Ok(())
    }

    /// Snapshot of the plan's current execution state.
    pub fn get_execution_state(&self, plan_id: &str) -> Option<ExecutionState> {
        self.store().get(plan_id).cloned()
    }

    /// Registers a listener for the plan's state changes.
    ///
    /// Listeners may be registered before the plan is started.
    pub fn subscribe<F>(&self, plan_id: &str, listener: F) -> Subscription
    where
        F: Fn(&ExecutionState) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.inner.observers.subscribe(plan_id, listener)
    }

    /// Whether the plan currently has a registered execution.
    pub fn is_registered(&self, plan_id: &str) -> bool {
        self.store().contains(plan_id)
    }

    /// IDs of every registered plan, sorted.
    pub fn active_plan_ids(&self) -> Vec<String> {
        self.store().plan_ids()
    }
}
