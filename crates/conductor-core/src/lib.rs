//! Core library for the Conductor plan execution engine.
//!
//! This crate runs AI-generated action plans (ordered lists of typed steps
//! such as "edit file" or "run command") one step at a time, tracking live
//! execution state and notifying observers after every transition.
//!
//! # Crate Layout
//!
//! - **Models** ([`models`]): plans, steps, statuses and execution state
//! - **Engine** ([`engine`]): scheduler, pause/resume/stop/retry, step
//!   handler dispatch and observer fan-out
//! - **Display** ([`display`]): markdown rendering of models for terminals
//! - **Plan files** ([`plan_file`]) and **configuration** ([`config`]):
//!   JSON loading and saving
//!
//! Side effects are never performed by the engine itself. Hosts register a
//! [`engine::StepHandler`] per [`StepType`]; a step whose type has no handler
//! fails like any other step.
//!
//! # Quick Start
//!
//! ```rust
//! use conductor_core::{
//!     engine::FnHandler, EngineBuilder, ExecutionOptions, Plan, PlanStatus, PlanStep, StepError,
//!     StepType,
//! };
//!
//! # async fn example() -> conductor_core::Result<()> {
//! let engine = EngineBuilder::new()
//!     .with_handler(
//!         StepType::Think,
//!         FnHandler(|step: PlanStep| async move { Ok::<_, StepError>(step.thought) }),
//!     )
//!     .build();
//!
//! engine.subscribe("p1", |state| {
//!     if state.plan.status == PlanStatus::Completed {
//!         println!("{}", state.plan);
//!     }
//!     Ok(())
//! });
//!
//! let plan = Plan::new("p1", "Think it over", vec![PlanStep::think("s1", "Start small")]);
//! engine.start_execution(plan, ExecutionOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod models;
pub mod plan_file;

// Re-export commonly used types
pub use config::EngineConfig;
pub use display::{LocalDateTime, Millis, OperationStatus};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result, StepError};
pub use models::{
    ExecutionOptions, ExecutionState, Plan, PlanStatus, PlanStep, RequiredField, StepStatus,
    StepType,
};
pub use plan_file::{load_plan, parse_plan, save_plan};
