//! Builder for creating and configuring Engine instances.

use std::{sync::Arc, time::Duration};

use super::{
    DelayPacer, Engine, ErrorReporter, HandlerRegistry, LogReporter, Pacer, StepHandler,
    DEFAULT_STEP_DELAY,
};
use crate::{config::EngineConfig, models::StepType};

/// Builder for creating and configuring Engine instances.
///
/// The handler table is fixed once [`build`](Self::build) is called; adding a
/// step kind means registering one more handler here.
pub struct EngineBuilder {
    handlers: HandlerRegistry,
    pacer: Option<Arc<dyn Pacer>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    step_delay: Duration,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            handlers: HandlerRegistry::new(),
            pacer: None,
            reporter: None,
            step_delay: DEFAULT_STEP_DELAY,
        }
    }

    /// Registers the handler for `step_type`.
    pub fn with_handler<H>(mut self, step_type: StepType, handler: H) -> Self
    where
        H: StepHandler + 'static,
    {
        self.handlers.insert(step_type, Arc::new(handler));
        self
    }

    /// Registers one shared handler for `step_type`.
    pub fn with_shared_handler(mut self, step_type: StepType, handler: Arc<dyn StepHandler>) -> Self {
        self.handlers.insert(step_type, handler);
        self
    }

    /// Replaces the yield primitive used between auto-proceeding steps.
    ///
    /// Takes precedence over [`with_step_delay`](Self::with_step_delay).
    pub fn with_pacer<P>(mut self, pacer: P) -> Self
    where
        P: Pacer + 'static,
    {
        self.pacer = Some(Arc::new(pacer));
        self
    }

    /// Sets the delay between auto-proceeding steps.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Replaces the step failure reporter.
    pub fn with_reporter<R>(mut self, reporter: R) -> Self
    where
        R: ErrorReporter + 'static,
    {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Applies engine-level settings from a loaded configuration.
    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_step_delay(config.step_delay())
    }

    /// Builds the configured engine.
    pub fn build(self) -> Engine {
        let pacer: Arc<dyn Pacer> = match self.pacer {
            Some(pacer) => pacer,
            None => Arc::new(DelayPacer::new(self.step_delay)),
        };
        let reporter: Arc<dyn ErrorReporter> = match self.reporter {
            Some(reporter) => reporter,
            None => Arc::new(LogReporter),
        };
        Engine::from_parts(self.handlers, pacer, reporter)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NoopHandler;

    #[test]
    fn test_builder_registers_handlers() {
        let engine = EngineBuilder::new()
            .with_handler(StepType::Think, NoopHandler)
            .with_handler(StepType::RunCommand, NoopHandler)
            .build();

        assert!(engine.handlers().supports(StepType::Think));
        assert!(engine.handlers().supports(StepType::RunCommand));
        assert!(!engine.handlers().supports(StepType::DeleteFile));
    }

    #[test]
    fn test_builder_accepts_config() {
        let config = EngineConfig {
            step_delay_ms: 5,
            ..EngineConfig::default()
        };
        let engine = EngineBuilder::new().with_config(&config).build();
        assert!(engine.active_plan_ids().is_empty());
    }
}
