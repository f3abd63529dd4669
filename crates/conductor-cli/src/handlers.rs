//! Step handlers that perform real work on the local machine.
//!
//! Step paths and shell commands are resolved against a workspace root,
//! normally the directory containing the plan file.

use std::{
    path::{Component, Path, PathBuf},
    process::Stdio,
    sync::Arc,
};

use async_trait::async_trait;
use conductor_core::{engine::StepHandler, EngineBuilder, PlanStep, StepError, StepType};
use log::{debug, info};
use tokio::{fs, process::Command};

/// Directory that step paths and commands are resolved against.
///
/// Plans address files from the project root, so an absolute `filePath`
/// such as `/src/a.ts` lands at `<root>/src/a.ts`. Paths that climb out of
/// the root with `..` are rejected.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace for the directory containing `plan_file`.
    pub fn for_plan_file(plan_file: &Path) -> Self {
        let root = plan_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, step: &PlanStep) -> Result<PathBuf, StepError> {
        let raw = step
            .file_path
            .as_deref()
            .ok_or_else(|| StepError::validation(step.step_type, "filePath"))?;

        let mut path = self.root.clone();
        for component in Path::new(raw).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::ParentDir => {
                    return Err(StepError::execution(format!(
                        "Path '{raw}' escapes the workspace root"
                    )));
                }
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            }
        }
        Ok(path)
    }

    /// Registers a handler for every step type on `builder`.
    pub fn register(self, builder: EngineBuilder) -> EngineBuilder {
        let workspace = Arc::new(self);
        builder
            .with_handler(StepType::Think, ThinkHandler)
            .with_handler(StepType::ReadFile, ReadFileHandler(Arc::clone(&workspace)))
            .with_handler(StepType::CreateFile, WriteFileHandler(Arc::clone(&workspace)))
            .with_handler(StepType::EditFile, WriteFileHandler(Arc::clone(&workspace)))
            .with_handler(StepType::DeleteFile, DeleteFileHandler(Arc::clone(&workspace)))
            .with_handler(StepType::RunCommand, RunCommandHandler(workspace))
    }
}

pub struct ThinkHandler;

#[async_trait]
impl StepHandler for ThinkHandler {
    async fn handle(&self, step: &PlanStep) -> Result<Option<String>, StepError> {
        if let Some(thought) = &step.thought {
            info!("[{}] {thought}", step.id);
        }
        Ok(step.thought.clone())
    }
}

pub struct ReadFileHandler(Arc<Workspace>);

#[async_trait]
impl StepHandler for ReadFileHandler {
    async fn handle(&self, step: &PlanStep) -> Result<Option<String>, StepError> {
        let path = self.0.resolve(step)?;
        debug!("Reading {}", path.display());
        let contents = fs::read_to_string(&path)
            .await
            .map_err(|e| StepError::execution(format!("Failed to read {}: {e}", path.display())))?;
        Ok(Some(contents))
    }
}

/// Shared by create and edit: both replace the whole file.
pub struct WriteFileHandler(Arc<Workspace>);

#[async_trait]
impl StepHandler for WriteFileHandler {
    async fn handle(&self, step: &PlanStep) -> Result<Option<String>, StepError> {
        let path = self.0.resolve(step)?;
        let content = step.content.as_deref().unwrap_or_default();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StepError::execution(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        debug!("Writing {} bytes to {}", content.len(), path.display());
        fs::write(&path, content)
            .await
            .map_err(|e| StepError::execution(format!("Failed to write {}: {e}", path.display())))?;
        Ok(None)
    }
}

pub struct DeleteFileHandler(Arc<Workspace>);

#[async_trait]
impl StepHandler for DeleteFileHandler {
    async fn handle(&self, step: &PlanStep) -> Result<Option<String>, StepError> {
        let path = self.0.resolve(step)?;
        debug!("Deleting {}", path.display());
        fs::remove_file(&path).await.map_err(|e| {
            StepError::execution(format!("Failed to delete {}: {e}", path.display()))
        })?;
        Ok(None)
    }
}

/// Runs the command through `sh -c` inside the workspace root.
pub struct RunCommandHandler(Arc<Workspace>);

#[async_trait]
impl StepHandler for RunCommandHandler {
    async fn handle(&self, step: &PlanStep) -> Result<Option<String>, StepError> {
        let command = step
            .command
            .as_deref()
            .ok_or_else(|| StepError::validation(step.step_type, "command"))?;
        debug!("Running `{command}` in {}", self.0.root().display());

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(self.0.root())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| StepError::execution(format!("Failed to spawn `{command}`: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(Some(stdout));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        let detail = stderr.trim();
        Err(StepError::execution(if detail.is_empty() {
            format!("`{command}` exited with status {code}")
        } else {
            format!("`{command}` exited with status {code}: {detail}")
        }))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn workspace() -> (TempDir, Workspace) {
        let temp_dir = TempDir::new().unwrap();
        let workspace = Workspace::new(temp_dir.path());
        (temp_dir, workspace)
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let (temp_dir, workspace) = workspace();
        let handler = WriteFileHandler(Arc::new(workspace));

        handler
            .handle(&PlanStep::create_file("s1", "nested/dir/out.txt", "hello"))
            .await
            .unwrap();

        let written = std::fs::read_to_string(temp_dir.path().join("nested/dir/out.txt")).unwrap();
        assert_eq!(written, "hello");
    }

    #[tokio::test]
    async fn test_absolute_path_stays_inside_root() {
        let (temp_dir, workspace) = workspace();
        let handler = WriteFileHandler(Arc::new(workspace));

        handler
            .handle(&PlanStep::create_file("s1", "/src/a.ts", "x"))
            .await
            .unwrap();

        assert!(temp_dir.path().join("src/a.ts").exists());
    }

    #[tokio::test]
    async fn test_parent_dir_path_rejected() {
        let (temp_dir, workspace) = workspace();
        let err = WriteFileHandler(Arc::new(workspace))
            .handle(&PlanStep::create_file("s1", "../outside.txt", "x"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("escapes the workspace root"));
        assert!(!temp_dir.path().join("../outside.txt").exists());
    }

    #[tokio::test]
    async fn test_read_missing_file_fails_with_path() {
        let (_temp_dir, workspace) = workspace();
        let err = ReadFileHandler(Arc::new(workspace))
            .handle(&PlanStep::read_file("s1", "missing.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }

    #[tokio::test]
    async fn test_run_command_captures_stdout_in_root() {
        let (temp_dir, workspace) = workspace();
        std::fs::write(temp_dir.path().join("marker.txt"), "").unwrap();

        let output = RunCommandHandler(Arc::new(workspace))
            .handle(&PlanStep::run_command("s1", "ls"))
            .await
            .unwrap();

        assert!(output.unwrap().contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_run_command_failure_includes_stderr() {
        let (_temp_dir, workspace) = workspace();
        let err = RunCommandHandler(Arc::new(workspace))
            .handle(&PlanStep::run_command("s1", "echo boom >&2; exit 3"))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("status 3"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_workspace_for_bare_file_name() {
        let workspace = Workspace::for_plan_file(Path::new("plan.json"));
        assert_eq!(workspace.root(), Path::new("."));
    }
}
