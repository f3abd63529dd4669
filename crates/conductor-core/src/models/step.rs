//! Step model definition and related functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{RequiredField, StepStatus, StepType};
use crate::error::StepError;

/// One typed action within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanStep {
    /// Identifier of the step, unique within its plan
    pub id: String,

    /// Kind of action this step performs
    #[serde(rename = "type")]
    pub step_type: StepType,

    /// Current status of the step
    #[serde(default)]
    pub status: StepStatus,

    /// Human-readable summary of what the step does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Target file for file steps
    #[serde(default, alias = "filePath", skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// File content for create/edit steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Shell command for run-command steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Reasoning note for think steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,

    /// Output produced by the handler, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// When the current attempt started
    #[serde(default, alias = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,

    /// When the current attempt finished
    #[serde(default, alias = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,

    /// Wall-clock duration of the current attempt in milliseconds
    #[serde(default, alias = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Failure message of the current attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlanStep {
    /// Creates a pending step of the given type with an empty payload.
    pub fn new(id: impl Into<String>, step_type: StepType) -> Self {
        Self {
            id: id.into(),
            step_type,
            status: StepStatus::Pending,
            description: None,
            file_path: None,
            content: None,
            command: None,
            thought: None,
            output: None,
            start_time: None,
            end_time: None,
            duration_ms: None,
            error: None,
        }
    }

    pub fn think(id: impl Into<String>, thought: impl Into<String>) -> Self {
        Self {
            thought: Some(thought.into()),
            ..Self::new(id, StepType::Think)
        }
    }

    pub fn read_file(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, StepType::ReadFile).with_file_path(path)
    }

    pub fn create_file(
        id: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(id, StepType::CreateFile)
            .with_file_path(path)
            .with_content(content)
    }

    pub fn edit_file(
        id: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(id, StepType::EditFile)
            .with_file_path(path)
            .with_content(content)
    }

    pub fn delete_file(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, StepType::DeleteFile).with_file_path(path)
    }

    pub fn run_command(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::new(id, StepType::RunCommand)
        }
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks that every field the step type requires is present.
    ///
    /// Paths and commands must be non-blank; content only has to be present,
    /// since writing an empty file is legitimate.
    pub fn validate(&self) -> Result<(), StepError> {
        for field in self.step_type.required_fields() {
            let present = match field {
                RequiredField::FilePath => has_text(self.file_path.as_deref()),
                RequiredField::Content => self.content.is_some(),
                RequiredField::Command => has_text(self.command.as_deref()),
            };
            if !present {
                return Err(StepError::validation(self.step_type, field.as_str()));
            }
        }
        Ok(())
    }

    /// Clears the outcome of the previous attempt and returns to `pending`.
    pub(crate) fn reset(&mut self) {
        self.status = StepStatus::Pending;
        self.output = None;
        self.start_time = None;
        self.end_time = None;
        self.duration_ms = None;
        self.error = None;
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
