use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use conductor_core::{
    engine::{FnHandler, YieldPacer},
    Engine, EngineBuilder, ExecutionState, PlanStep, StepError, StepType,
};
use tempfile::TempDir;

/// Helper function to create a workspace directory for file steps
pub fn create_test_workspace() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().to_path_buf();
    (temp_dir, root)
}

fn resolve(root: &Path, step: &PlanStep) -> PathBuf {
    root.join(step.file_path.as_deref().unwrap_or_default())
}

/// Helper function to create an engine whose file handlers work inside `root`
pub fn create_file_engine(root: &Path) -> Engine {
    let read_root = root.to_path_buf();
    let write_root = root.to_path_buf();
    let edit_root = root.to_path_buf();
    let delete_root = root.to_path_buf();

    EngineBuilder::new()
        .with_pacer(YieldPacer)
        .with_handler(
            StepType::Think,
            FnHandler(|step: PlanStep| async move { Ok::<_, StepError>(step.thought) }),
        )
        .with_handler(
            StepType::ReadFile,
            FnHandler(move |step: PlanStep| {
                let path = resolve(&read_root, &step);
                async move { Ok::<_, StepError>(Some(tokio::fs::read_to_string(path).await?)) }
            }),
        )
        .with_handler(
            StepType::CreateFile,
            FnHandler(move |step: PlanStep| {
                let path = resolve(&write_root, &step);
                async move {
                    tokio::fs::write(path, step.content.unwrap_or_default()).await?;
                    Ok::<_, StepError>(None)
                }
            }),
        )
        .with_handler(
            StepType::EditFile,
            FnHandler(move |step: PlanStep| {
                let path = resolve(&edit_root, &step);
                async move {
                    tokio::fs::write(path, step.content.unwrap_or_default()).await?;
                    Ok::<_, StepError>(None)
                }
            }),
        )
        .with_handler(
            StepType::DeleteFile,
            FnHandler(move |step: PlanStep| {
                let path = resolve(&delete_root, &step);
                async move {
                    tokio::fs::remove_file(path).await?;
                    Ok::<_, StepError>(None)
                }
            }),
        )
        .build()
}

/// Helper function to record every snapshot delivered for `plan_id`
pub fn record_states(engine: &Engine, plan_id: &str) -> Arc<Mutex<Vec<ExecutionState>>> {
    let states = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&states);
    engine.subscribe(plan_id, move |state| {
        sink.lock().unwrap().push(state.clone());
        Ok(())
    });
    states
}
