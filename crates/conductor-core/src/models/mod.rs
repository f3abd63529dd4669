//! Data models for plans, steps and execution state.
//!
//! Display implementations for these models live in
//! [`crate::display::models`] so that presentation stays separate from the
//! data structures.
//!
//! # Examples
//!
//! ```rust
//! use conductor_core::models::{Plan, PlanStep, StepType};
//!
//! let plan = Plan::new(
//!     "refactor-1",
//!     "Rename helper",
//!     vec![
//!         PlanStep::think("s1", "The helper is only used in one place"),
//!         PlanStep::edit_file("s2", "/src/a.ts", "export const x = 1;"),
//!         PlanStep::run_command("s3", "npm test"),
//!     ],
//! );
//!
//! assert_eq!(plan.steps[1].step_type, StepType::EditFile);
//! assert!(plan.validate().is_empty());
//! ```

pub mod plan;
pub mod state;
pub mod status;
pub mod step;


pub use plan::Plan;
pub use state::{ExecutionOptions, ExecutionState};
pub use status::{PlanStatus, RequiredField, StepStatus, StepType};
pub use step::PlanStep;
