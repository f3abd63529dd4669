//! Plan model definition and related functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{PlanStatus, PlanStep, StepStatus};
use crate::error::StepError;

/// An ordered list of steps representing one AI-directed task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Unique identifier for the plan
    pub id: String,

    /// Title of the plan
    pub title: String,

    /// Optional longer description of the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Lifecycle status of the plan
    #[serde(default)]
    pub status: PlanStatus,

    /// Steps in execution order
    pub steps: Vec<PlanStep>,

    /// Index of the next step to attempt
    #[serde(default, alias = "currentStep")]
    pub current_step: usize,

    /// When execution started
    #[serde(default, alias = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,

    /// When execution reached a terminal state
    #[serde(default, alias = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,

    /// Message of the failure that stopped the plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Plan {
    /// Creates a pending plan with the given steps.
    pub fn new(id: impl Into<String>, title: impl Into<String>, steps: Vec<PlanStep>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: PlanStatus::Pending,
            steps,
            current_step: 0,
            start_time: None,
            end_time: None,
            error: None,
        }
    }

    /// Number of steps whose current attempt completed successfully.
    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count()
    }

    /// Whether any step's current attempt failed.
    pub fn has_failed_steps(&self) -> bool {
        self.steps.iter().any(|s| s.status == StepStatus::Error)
    }

    /// Validates every step up front, returning each failure with its index.
    pub fn validate(&self) -> Vec<(usize, StepError)> {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(index, step)| step.validate().err().map(|e| (index, e)))
            .collect()
    }
}
