//! Step handler capability interface and the dispatch table built from it.
//!
//! The engine never performs file I/O or runs processes itself. The host
//! registers one [`StepHandler`] per [`StepType`] and the registry routes each
//! step to its handler after checking the step's required fields.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::StepError,
    models::{PlanStep, StepType},
};

/// Performs the real work for one kind of step.
///
/// Returns optional output (file contents, command stdout) on success. A
/// failure message is recorded on the step verbatim.
#[async_trait]
pub trait StepHandler: Send + Sync {
    async fn handle(&self, step: &PlanStep) -> Result<Option<String>, StepError>;
}

/// Adapts an async closure into a [`StepHandler`].
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> StepHandler for FnHandler<F>
where
    F: Fn(PlanStep) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Option<String>, StepError>> + Send + 'static,
{
    async fn handle(&self, step: &PlanStep) -> Result<Option<String>, StepError> {
        (self.0)(step.clone()).await
    }
}

/// Handler that succeeds without doing anything.
pub struct NoopHandler;

#[async_trait]
impl StepHandler for NoopHandler {
    async fn handle(&self, _step: &PlanStep) -> Result<Option<String>, StepError> {
        Ok(None)
    }
}

/// Lookup table from step type to handler, fixed at engine construction.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<StepType, Arc<dyn StepHandler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.handlers.keys().map(StepType::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &kinds)
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `step_type`, replacing any previous one.
    pub fn insert(&mut self, step_type: StepType, handler: Arc<dyn StepHandler>) {
        self.handlers.insert(step_type, handler);
    }

    pub fn supports(&self, step_type: StepType) -> bool {
        self.handlers.contains_key(&step_type)
    }

    /// Validates `step`, resolves its handler and runs it.
    ///
    /// In dry-run mode the step is still validated and must have a handler,
    /// but the handler is not invoked.
    pub async fn dispatch(&self, step: &PlanStep, dry_run: bool) -> Result<Option<String>, StepError> {
        step.validate()?;

        let handler = self
            .handlers
            .get(&step.step_type)
            .ok_or(StepError::Unsupported {
                step_type: step.step_type,
            })?;

        if dry_run {
            return Ok(None);
        }

        handler.handle(step).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl StepHandler for CountingHandler {
        async fn handle(&self, _step: &PlanStep) -> Result<Option<String>, StepError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Some("done".to_string()))
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_type() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.insert(
            StepType::RunCommand,
            Arc::new(CountingHandler(Arc::clone(&calls))),
        );

        let output = registry
            .dispatch(&PlanStep::run_command("s1", "echo ok"), false)
            .await
            .expect("dispatch should succeed");

        assert_eq!(output.as_deref(), Some("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_handler_is_unsupported() {
        let registry = HandlerRegistry::new();
        let err = registry
            .dispatch(&PlanStep::think("s1", "x"), false)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StepError::Unsupported {
                step_type: StepType::Think
            }
        );
    }

    #[tokio::test]
    async fn test_validation_runs_before_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.insert(
            StepType::EditFile,
            Arc::new(CountingHandler(Arc::clone(&calls))),
        );

        let step = PlanStep::new("s2", StepType::EditFile).with_file_path("/a.ts");
        let err = registry.dispatch(&step, false).await.unwrap_err();

        assert!(err.to_string().contains("content"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dry_run_skips_handler_but_validates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.insert(
            StepType::RunCommand,
            Arc::new(CountingHandler(Arc::clone(&calls))),
        );

        let output = registry
            .dispatch(&PlanStep::run_command("s1", "rm -rf build"), true)
            .await
            .expect("dry run should succeed");
        assert!(output.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let blank = PlanStep::run_command("s2", "   ");
        assert!(registry.dispatch(&blank, true).await.is_err());
    }

    #[tokio::test]
    async fn test_fn_handler_adapter() {
        let mut registry = HandlerRegistry::new();
        registry.insert(
            StepType::ReadFile,
            Arc::new(FnHandler(|step: PlanStep| async move {
                Ok(step.file_path.map(|p| format!("read {p}")))
            })),
        );

        let output = registry
            .dispatch(&PlanStep::read_file("s1", "/etc/hosts"), false)
            .await
            .unwrap();
        assert_eq!(output.as_deref(), Some("read /etc/hosts"));
    }
}
