//! Starting executions and advancing them one step at a time.

use std::time::{Duration, Instant};

use jiff::Timestamp;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use super::{Engine, ErrorContext};
use crate::{
    error::{EngineError, Result, StepError},
    models::{ExecutionOptions, Plan, PlanStatus, PlanStep, StepStatus},
};

/// What the loop should do after one pass.
enum Advance {
    Continue,
    Halt,
}

/// A step taken off the cursor and marked running.
struct Claim {
    run_id: u64,
    index: usize,
    step: PlanStep,
    dry_run: bool,
}

impl Engine {
    /// Registers `plan` and, if `options.auto_proceed` is set, drives it until
    /// it completes, pauses or fails.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyRunning`] if the plan ID is already
    /// registered, or [`EngineError::InvalidPlan`] if the plan has no steps
    /// or its `current_step` lies past the last step.
    /// Step failures are recorded in the execution state, not returned.
    pub async fn start_execution(&self, plan: Plan, options: ExecutionOptions) -> Result<()> {
        let plan_id = self.register(plan, options)?;
        if options.auto_proceed {
            self.execute_next_step(&plan_id).await;
        }
        Ok(())
    }

    /// Registers `plan` synchronously and drives it on a background task.
    ///
    /// Duplicate starts still fail here, before anything is spawned.
    pub fn spawn_execution(&self, plan: Plan, options: ExecutionOptions) -> Result<JoinHandle<()>> {
        let plan_id = self.register(plan, options)?;
        let engine = self.clone();
        Ok(tokio::spawn(async move {
            if options.auto_proceed {
                engine.execute_next_step(&plan_id).await;
            }
        }))
    }

    /// Attempts the step under the cursor and, with `auto_proceed`, keeps
    /// going until the plan halts.
    ///
    /// A no-op when the plan is not registered, is paused, or already has a
    /// step awaiting its handler. Safe to call externally to single-step a
    /// plan started without `auto_proceed`.
    pub async fn execute_next_step(&self, plan_id: &str) {
        while let Advance::Continue = self.advance(plan_id).await {
            self.inner.pacer.between_steps().await;
        }
    }

    fn register(&self, plan: Plan, options: ExecutionOptions) -> Result<String> {
        if plan.steps.is_empty() {
            return Err(EngineError::invalid_plan(format!(
                "plan '{}' has no steps",
                plan.id
            )));
        }
        if plan.current_step > plan.steps.len() {
            return Err(EngineError::invalid_plan(format!(
                "plan '{}' resumes at step {} but has only {} steps",
                plan.id,
                plan.current_step,
                plan.steps.len()
            )));
        }

        let plan_id = plan.id.clone();
        let snapshot = {
            let mut store = self.store();
            let state = store.register(plan, options)?;
            state.is_executing = options.auto_proceed;
            state.plan.status = PlanStatus::Running;
            state.plan.current_step = state.current_step_index;
            state.plan.start_time = Some(Timestamp::now());
            state.plan.end_time = None;
            state.plan.error = None;
            state.clone()
        };

        info!(
            "Started plan '{}' with {} steps (auto_proceed: {}, pause_on_error: {}, dry_run: {})",
            plan_id,
            snapshot.plan.steps.len(),
            options.auto_proceed,
            options.pause_on_error,
            options.dry_run
        );
        self.publish(&snapshot);
        Ok(plan_id)
    }

    async fn advance(&self, plan_id: &str) -> Advance {
        let Some(claim) = self.claim_next(plan_id) else {
            return Advance::Halt;
        };

        let started = Instant::now();
        let outcome = self.inner.handlers.dispatch(&claim.step, claim.dry_run).await;
        self.settle(plan_id, claim, outcome, started.elapsed())
    }

    /// Marks the step under the cursor as running, or finalizes the plan if
    /// the cursor has passed the last step.
    fn claim_next(&self, plan_id: &str) -> Option<Claim> {
        let (claim, snapshot) = {
            let mut store = self.store();
            let Some(state) = store.get_mut(plan_id) else {
                debug!("No execution registered for plan '{plan_id}', nothing to do");
                return None;
            };

            if state.is_paused {
                debug!("Plan '{plan_id}' is paused, not dispatching");
                if !state.step_in_flight {
                    state.is_executing = false;
                }
                return None;
            }

            if state.step_in_flight {
                debug!("Plan '{plan_id}' already has a step in flight");
                return None;
            }

            if state.is_finished() {
                drop(store);
                self.finish(plan_id);
                return None;
            }

            let index = state.current_step_index;
            let step = &mut state.plan.steps[index];
            step.reset();
            step.status = StepStatus::Running;
            step.start_time = Some(Timestamp::now());
            let claimed_step = step.clone();

            state.step_in_flight = true;
            state.is_executing = true;
            state.plan.status = PlanStatus::Running;
            state.plan.current_step = index;

            let claim = Claim {
                run_id: state.run_id,
                index,
                step: claimed_step,
                dry_run: state.options.dry_run,
            };
            (claim, state.clone())
        };

        debug!(
            "Plan '{plan_id}' step {} ('{}', {}) running",
            claim.index, claim.step.id, claim.step.step_type
        );
        self.publish(&snapshot);
        Some(claim)
    }

    /// Records the outcome of a claimed step and decides whether to go on.
    fn settle(
        &self,
        plan_id: &str,
        claim: Claim,
        outcome: std::result::Result<Option<String>, StepError>,
        elapsed: Duration,
    ) -> Advance {
        let now = Timestamp::now();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        let mut store = self.store();
        let Some(state) = store.get_run_mut(plan_id, claim.run_id) else {
            debug!(
                "Discarding outcome of step {} for plan '{plan_id}': execution no longer registered",
                claim.index
            );
            return Advance::Halt;
        };
        state.step_in_flight = false;
        let auto_proceed = state.options.auto_proceed;

        let Some(step) = state
            .plan
            .steps
            .get_mut(claim.index)
            .filter(|step| step.status == StepStatus::Running)
        else {
            // Reset by a retry while the handler was running.
            debug!(
                "Discarding outcome of step {} for plan '{plan_id}': step was reset",
                claim.index
            );
            return if auto_proceed {
                Advance::Continue
            } else {
                state.is_executing = false;
                Advance::Halt
            };
        };
        step.end_time = Some(now);
        step.duration_ms = Some(duration_ms);

        match outcome {
            Ok(output) => {
                step.status = StepStatus::Completed;
                step.output = output;

                if state.current_step_index == claim.index {
                    state.current_step_index += 1;
                }
                state.plan.current_step = state.current_step_index;

                let finished = state.is_finished();
                if !auto_proceed {
                    state.is_executing = false;
                }
                let snapshot = state.clone();
                drop(store);

                debug!(
                    "Plan '{plan_id}' step {} ('{}') completed in {duration_ms}ms",
                    claim.index, claim.step.id
                );
                self.publish(&snapshot);

                if finished {
                    self.finish(plan_id);
                    Advance::Halt
                } else if auto_proceed {
                    Advance::Continue
                } else {
                    Advance::Halt
                }
            }
            Err(error) => {
                let message = error.to_string();
                step.status = StepStatus::Error;
                step.error = Some(message.clone());

                state.plan.status = PlanStatus::Error;
                state.plan.error = Some(format!("Step '{}' failed: {message}", claim.step.id));
                state.is_executing = false;

                let pause_on_error = state.options.pause_on_error;
                if pause_on_error {
                    state.is_paused = true;
                } else if state.current_step_index == claim.index {
                    state.current_step_index += 1;
                    state.plan.current_step = state.current_step_index;
                }

                let finished = state.is_finished();
                let snapshot = state.clone();
                drop(store);

                warn!(
                    "Plan '{plan_id}' step {} ('{}', {}) failed: {message}",
                    claim.index, claim.step.id, claim.step.step_type
                );
                self.publish(&snapshot);
                self.report(
                    &error,
                    &ErrorContext {
                        plan_id: plan_id.to_string(),
                        step_id: claim.step.id.clone(),
                        step_index: claim.index,
                        step_type: claim.step.step_type,
                    },
                );

                if pause_on_error {
                    Advance::Halt
                } else if finished {
                    self.finish(plan_id);
                    Advance::Halt
                } else if auto_proceed {
                    Advance::Continue
                } else {
                    Advance::Halt
                }
            }
        }
    }

    /// Finalizes a plan whose cursor has passed the last step.
    ///
    /// A clean run completes and leaves the store before observers hear about
    /// it. A run that moved past failed or never-attempted steps ends in
    /// `error` and stays registered so those steps can be retried.
    fn finish(&self, plan_id: &str) {
        let snapshot = {
            let mut store = self.store();
            let Some(state) = store.get_mut(plan_id) else {
                return;
            };
            if !state.is_finished() || state.step_in_flight {
                return;
            }

            state.is_executing = false;
            state.plan.current_step = state.current_step_index;
            state.plan.end_time = Some(Timestamp::now());

            let steps = &state.plan.steps;
            let unfinished = steps
                .iter()
                .find(|s| s.status == StepStatus::Error)
                .or_else(|| steps.iter().find(|s| s.status != StepStatus::Completed))
                .map(|step| {
                    let failed = step.status == StepStatus::Error;
                    let reason = if failed {
                        format!(
                            "Step '{}' failed: {}",
                            step.id,
                            step.error.as_deref().unwrap_or("unknown error")
                        )
                    } else {
                        format!("Step '{}' was never executed", step.id)
                    };
                    (reason, failed)
                });
            if let Some((reason, failed)) = unfinished {
                state.plan.status = PlanStatus::Error;
                if !failed || state.plan.error.is_none() {
                    state.plan.error = Some(reason);
                }
                state.clone()
            } else {
                state.plan.status = PlanStatus::Completed;
                state.plan.error = None;
                match store.remove(plan_id) {
                    Some(state) => state,
                    None => return,
                }
            }
        };

        match snapshot.plan.status {
            PlanStatus::Completed => info!(
                "Plan '{plan_id}' completed ({} steps)",
                snapshot.plan.steps.len()
            ),
            _ => warn!(
                "Plan '{plan_id}' finished with failed steps: {}",
                snapshot.plan.error.as_deref().unwrap_or("unknown error")
            ),
        }
        self.publish(&snapshot);
    }
}
