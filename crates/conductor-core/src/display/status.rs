//! One-line operation outcome messages.

use std::fmt;

use crate::models::{Plan, PlanStatus};

/// Success or failure line printed after an operation.
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    /// Create a new success status.
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
        }
    }

    /// Create a new failure status.
    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
        }
    }

    /// Summarize where a plan's execution ended up.
    pub fn for_plan(plan: &Plan) -> Self {
        let total = plan.steps.len();
        let done = plan.completed_steps();
        match plan.status {
            PlanStatus::Completed => {
                Self::success(format!("Plan '{}' completed ({done}/{total} steps)", plan.id))
            }
            PlanStatus::Error => Self::failure(format!(
                "Plan '{}' failed: {}",
                plan.id,
                plan.error.as_deref().unwrap_or("unknown error")
            )),
            status => Self::failure(format!(
                "Plan '{}' is {} ({done}/{total} steps)",
                plan.id,
                status.as_str()
            )),
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", if self.success { "Success:" } else { "Error:" }, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanStep, StepStatus};

    #[test]
    fn test_operation_status_display() {
        let success = OperationStatus::success("Operation completed".to_string());
        assert!(format!("{success}").contains("Success:"));

        let failure = OperationStatus::failure("Operation failed".to_string());
        assert!(format!("{failure}").contains("Error:"));
    }

    #[test]
    fn test_for_plan_summarizes_outcome() {
        let mut plan = Plan::new("p1", "Demo", vec![PlanStep::think("s1", "hi")]);
        plan.status = PlanStatus::Completed;
        plan.steps[0].status = StepStatus::Completed;
        let status = OperationStatus::for_plan(&plan);
        assert!(status.success);
        assert!(status.message.contains("1/1"));

        plan.status = PlanStatus::Error;
        plan.error = Some("boom".to_string());
        let status = OperationStatus::for_plan(&plan);
        assert!(!status.success);
        assert!(status.message.contains("boom"));
    }
}
