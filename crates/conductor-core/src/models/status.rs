//! Status and kind enumerations for plans and steps.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a plan.
///
/// `pending → running → {completed | error | paused}`, with `paused → running`
/// on resume and `error → running` on retry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Plan has not been started
    #[default]
    Pending,

    /// A step is executing or about to be
    Running,

    /// Execution was paused or stopped
    Paused,

    /// Every step ran to completion
    Completed,

    /// The last attempted step failed and has not been recovered
    Error,
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PlanStatus::Pending),
            "running" => Ok(PlanStatus::Running),
            "paused" => Ok(PlanStatus::Paused),
            "completed" => Ok(PlanStatus::Completed),
            "error" => Ok(PlanStatus::Error),
            _ => Err(format!("Invalid plan status: {s}")),
        }
    }
}

impl PlanStatus {
    /// Lowercase string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "pending",
            PlanStatus::Running => "running",
            PlanStatus::Paused => "paused",
            PlanStatus::Completed => "completed",
            PlanStatus::Error => "error",
        }
    }

    /// Whether no further steps will run without outside intervention.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Completed | PlanStatus::Error)
    }
}

/// Status of a single step.
///
/// Monotonic within one attempt: `pending → running → {completed | error}`.
/// Only a retry resets a step back to `pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step has not been attempted
    #[default]
    Pending,

    /// Step has been dispatched to its handler
    Running,

    /// Step finished successfully
    Completed,

    /// Step failed
    Error,
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StepStatus::Pending),
            "running" => Ok(StepStatus::Running),
            "completed" => Ok(StepStatus::Completed),
            "error" => Ok(StepStatus::Error),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

impl StepStatus {
    /// Lowercase string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Error => "error",
        }
    }

    /// Whether the step reached an outcome in its current attempt.
    pub fn is_finished(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Error)
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use conductor_core::models::StepStatus;
    ///
    /// assert_eq!(StepStatus::Completed.with_icon(), "✓ Completed");
    /// assert_eq!(StepStatus::Running.with_icon(), "➤ Running");
    /// assert_eq!(StepStatus::Pending.with_icon(), "○ Pending");
    /// assert_eq!(StepStatus::Error.with_icon(), "✗ Error");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::Completed => "✓ Completed",
            StepStatus::Running => "➤ Running",
            StepStatus::Pending => "○ Pending",
            StepStatus::Error => "✗ Error",
        }
    }
}

/// The kind of action a step performs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    /// Record a reasoning note; no side effects
    Think,
    /// Read a file
    ReadFile,
    /// Create a new file with content
    CreateFile,
    /// Replace the content of an existing file
    EditFile,
    /// Delete a file
    DeleteFile,
    /// Run a shell command
    RunCommand,
}

/// A payload field a step type can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    FilePath,
    Content,
    Command,
}

impl RequiredField {
    /// Field name as it appears in plan definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::FilePath => "filePath",
            RequiredField::Content => "content",
            RequiredField::Command => "command",
        }
    }
}

impl StepType {
    /// Every step type, in declaration order.
    pub const ALL: [StepType; 6] = [
        StepType::Think,
        StepType::ReadFile,
        StepType::CreateFile,
        StepType::EditFile,
        StepType::DeleteFile,
        StepType::RunCommand,
    ];

    /// Tag used in plan definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Think => "THINK",
            StepType::ReadFile => "READ_FILE",
            StepType::CreateFile => "CREATE_FILE",
            StepType::EditFile => "EDIT_FILE",
            StepType::DeleteFile => "DELETE_FILE",
            StepType::RunCommand => "RUN_COMMAND",
        }
    }

    /// Payload fields that must be present before the step can run.
    pub fn required_fields(&self) -> &'static [RequiredField] {
        match self {
            StepType::Think => &[],
            StepType::ReadFile | StepType::DeleteFile => &[RequiredField::FilePath],
            StepType::CreateFile | StepType::EditFile => {
                &[RequiredField::FilePath, RequiredField::Content]
            }
            StepType::RunCommand => &[RequiredField::Command],
        }
    }
}

impl FromStr for StepType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        StepType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Invalid step type: {s}"))
    }
}
