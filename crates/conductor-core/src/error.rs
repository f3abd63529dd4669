//! Error types for the execution engine.
//!
//! Two families of errors live here. [`EngineError`] covers structural misuse
//! of the engine (duplicate start, unknown plan, out-of-range retry) and the
//! ambient failures of loading plans and configuration; these are returned to
//! the caller. [`StepError`] covers everything that can go wrong while a
//! single step runs; these are recorded on the step and never returned from
//! the scheduler.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::StepType;

/// Error type for all engine operations that can fail synchronously.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A plan with this ID already has a live execution
    #[error("Plan '{plan_id}' is already being executed")]
    AlreadyRunning { plan_id: String },
    /// No execution is registered for the given plan ID
    #[error("No execution found for plan '{plan_id}'")]
    PlanNotFound { plan_id: String },
    /// A step index outside the plan's step list
    #[error("Step index {index} is out of range for plan '{plan_id}' with {len} steps")]
    StepIndexOutOfRange {
        plan_id: String,
        index: usize,
        len: usize,
    },
    /// The plan cannot be executed as given
    #[error("Invalid plan: {reason}")]
    InvalidPlan { reason: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// XDG base directory errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl EngineError {
    /// Creates an invalid plan error with the given reason.
    pub fn invalid_plan(reason: impl Into<String>) -> Self {
        Self::InvalidPlan {
            reason: reason.into(),
        }
    }

    /// Creates a plan-not-found error.
    pub fn plan_not_found(plan_id: impl Into<String>) -> Self {
        Self::PlanNotFound {
            plan_id: plan_id.into(),
        }
    }

    /// Creates a file system error for the given path.
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a single step.
///
/// Validation and unsupported-type failures are treated exactly like
/// execution failures by the state machine; the distinction only matters to
/// the error reporter and to callers inspecting the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// The step lacks a field its type requires
    #[error("{step_type} step requires '{field}'")]
    Validation { step_type: StepType, field: String },
    /// No handler is registered for the step type
    #[error("Unsupported step type: {step_type}")]
    Unsupported { step_type: StepType },
    /// The handler reported a failure
    #[error("{message}")]
    Execution { message: String },
}

impl StepError {
    /// Creates a validation error for a missing field.
    pub fn validation(step_type: StepType, field: impl Into<String>) -> Self {
        Self::Validation {
            step_type,
            field: field.into(),
        }
    }

    /// Creates an execution error carrying a handler's message verbatim.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Short classification used when reporting the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Validation { .. } => "validation",
            StepError::Unsupported { .. } => "unsupported_step",
            StepError::Execution { .. } => "execution",
        }
    }
}

impl From<std::io::Error> for StepError {
    fn from(err: std::io::Error) -> Self {
        StepError::execution(err.to_string())
    }
}

impl From<anyhow::Error> for StepError {
    fn from(err: anyhow::Error) -> Self {
        StepError::execution(format!("{err:#}"))
    }
}

/// Extension trait for Results to attach a path to I/O failures.
pub trait IoResultExt<T> {
    /// Map an I/O error to [`EngineError::FileSystem`] for `path`.
    fn fs_context(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| EngineError::file_system(path, e))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
