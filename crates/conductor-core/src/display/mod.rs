//! Markdown display for plans, steps and execution state.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! the small wrappers here cover timestamps, durations and one-line
//! operation outcomes.
//!
//! ```rust
//! use conductor_core::{display::OperationStatus, models::{Plan, PlanStep}};
//!
//! let plan = Plan::new("p1", "Demo", vec![PlanStep::think("s1", "hello")]);
//! let output = plan.to_string();
//! assert!(output.contains("# Demo (p1)"));
//! assert!(output.contains("THINK"));
//!
//! let status = OperationStatus::failure("step 's2' failed".to_string());
//! assert!(status.to_string().starts_with("Error:"));
//! ```

pub mod datetime;
pub mod models;
pub mod status;

pub use datetime::{LocalDateTime, Millis};
pub use status::OperationStatus;
