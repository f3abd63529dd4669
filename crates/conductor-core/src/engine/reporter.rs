//! Fire-and-forget reporting of step failures.

use std::fmt;

use log::error;

use crate::{error::StepError, models::StepType};

/// How serious a reported failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a step failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub plan_id: String,
    pub step_id: String,
    pub step_index: usize,
    pub step_type: StepType,
}

/// Sink for step failures.
///
/// Called synchronously from the scheduler and never awaited. Implementations
/// must not block; a panic inside `log_error` is caught and discarded.
pub trait ErrorReporter: Send + Sync {
    fn log_error(&self, kind: &str, error: &StepError, severity: Severity, context: &ErrorContext);
}

/// Reports failures through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn log_error(&self, kind: &str, error: &StepError, severity: Severity, context: &ErrorContext) {
        error!(
            "[{kind}/{severity}] plan '{}' step {} ('{}', {}): {error}",
            context.plan_id, context.step_index, context.step_id, context.step_type
        );
    }
}

/// Severity assigned to each failure class.
pub(crate) fn severity_for(error: &StepError) -> Severity {
    match error {
        StepError::Validation { .. } => Severity::Medium,
        StepError::Unsupported { .. } | StepError::Execution { .. } => Severity::High,
    }
}
