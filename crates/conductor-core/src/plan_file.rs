//! Reading and writing plans as JSON files.
//!
//! Plan files use the same shape the engine hands to observers: step types
//! are tagged `THINK`, `READ_FILE`, `CREATE_FILE`, `EDIT_FILE`, `DELETE_FILE`
//! or `RUN_COMMAND`, and camelCase field names (`filePath`, `currentStep`)
//! are accepted alongside snake_case. Missing required step fields are not
//! rejected here; they fail the step when it runs.

use std::{collections::HashSet, fs, path::Path};

use log::debug;

use crate::{
    error::{EngineError, IoResultExt, Result},
    models::Plan,
};

/// Reads and parses the plan stored at `path`.
pub fn load_plan(path: impl AsRef<Path>) -> Result<Plan> {
    let path = path.as_ref();
    debug!("Loading plan from {}", path.display());
    let raw = fs::read_to_string(path).fs_context(path)?;
    parse_plan(&raw)
}

/// Parses a plan from JSON text.
///
/// # Errors
///
/// Returns [`EngineError::Serialization`] for malformed JSON and
/// [`EngineError::InvalidPlan`] when the plan has no ID or repeats a step ID.
pub fn parse_plan(json: &str) -> Result<Plan> {
    let plan: Plan = serde_json::from_str(json)?;

    if plan.id.trim().is_empty() {
        return Err(EngineError::invalid_plan("plan ID must not be empty"));
    }

    let mut seen = HashSet::new();
    for step in &plan.steps {
        if !seen.insert(step.id.as_str()) {
            return Err(EngineError::invalid_plan(format!(
                "duplicate step ID '{}' in plan '{}'",
                step.id, plan.id
            )));
        }
    }

    Ok(plan)
}

/// Writes `plan` as pretty JSON, creating parent directories as needed.
pub fn save_plan(path: impl AsRef<Path>, plan: &Plan) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).fs_context(parent)?;
    }
    let json = serde_json::to_string_pretty(plan)?;
    fs::write(path, json).fs_context(path)
}
