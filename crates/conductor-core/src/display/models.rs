//! Display implementations for domain models.
//!
//! Every implementation produces markdown suitable for terminal rendering.

use std::fmt;

use super::datetime::{LocalDateTime, Millis};
use crate::models::{ExecutionState, Plan, PlanStatus, PlanStep, StepStatus, StepType};

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} ({})", self.title, self.id)?;
        writeln!(f)?;

        writeln!(f, "- Status: {}", self.status)?;
        writeln!(
            f,
            "- Progress: {}/{}",
            self.completed_steps(),
            self.steps.len()
        )?;
        if let Some(start) = &self.start_time {
            writeln!(f, "- Started: {}", LocalDateTime(start))?;
        }
        if let Some(end) = &self.end_time {
            writeln!(f, "- Finished: {}", LocalDateTime(end))?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "- Error: {error}")?;
        }

        if let Some(desc) = &self.description {
            writeln!(f)?;
            writeln!(f, "{desc}")?;
        }

        if self.steps.is_empty() {
            writeln!(f, "\nNo steps in this plan.")?;
            return Ok(());
        }

        writeln!(f, "\n## Steps")?;
        writeln!(f)?;
        for (index, step) in self.steps.iter().enumerate() {
            let marker = if index == self.current_step && !self.status.is_terminal() {
                " ◀"
            } else {
                ""
            };
            writeln!(f, "### {}. {}{marker}", index + 1, step.headline())?;
            writeln!(f)?;
            step.fmt_details(f)?;
        }

        Ok(())
    }
}

impl PlanStep {
    /// `TYPE id (status)` plus the most telling payload field.
    fn headline(&self) -> String {
        let target = match self.step_type {
            StepType::Think => None,
            StepType::RunCommand => self.command.as_deref(),
            _ => self.file_path.as_deref(),
        };
        match target {
            Some(target) => format!(
                "{} `{}` {} ({})",
                self.step_type,
                target,
                self.id,
                self.status.with_icon()
            ),
            None => format!("{} {} ({})", self.step_type, self.id, self.status.with_icon()),
        }
    }

    fn fmt_details(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(desc) = &self.description {
            writeln!(f, "{desc}")?;
            writeln!(f)?;
        }

        if let Some(thought) = &self.thought {
            writeln!(f, "> {thought}")?;
            writeln!(f)?;
        }

        if let Some(ms) = self.duration_ms {
            writeln!(f, "- Duration: {}", Millis(ms))?;
            writeln!(f)?;
        }

        if self.status == StepStatus::Error {
            if let Some(error) = &self.error {
                writeln!(f, "#### Error")?;
                writeln!(f)?;
                writeln!(f, "{error}")?;
                writeln!(f)?;
            }
        }

        if self.status == StepStatus::Completed {
            if let Some(output) = self.output.as_deref().filter(|o| !o.trim().is_empty()) {
                writeln!(f, "#### Output")?;
                writeln!(f)?;
                writeln!(f, "```")?;
                writeln!(f, "{}", output.trim_end())?;
                writeln!(f, "```")?;
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### {}", self.headline())?;
        writeln!(f)?;
        self.fmt_details(f)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (done, total) = self.progress();
        let mode = if self.is_paused {
            "paused"
        } else if self.step_in_flight {
            "step in flight"
        } else if self.is_executing {
            "executing"
        } else {
            "idle"
        };
        write!(
            f,
            "[{}] {} {done}/{total} · cursor {} · {mode}",
            self.plan.id, self.plan.status, self.current_step_index
        )?;
        if self.options.dry_run {
            write!(f, " · dry run")?;
        }
        Ok(())
    }
}
