//! Command handlers for the Conductor CLI
//!
//! Each subcommand loads what it needs (plan file, configuration), calls into
//! `conductor_core` and renders the result as markdown through the
//! [`TerminalRenderer`].

use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{anyhow, bail, Context, Result};
use conductor_core::{
    display::Millis, load_plan, save_plan, Engine, EngineBuilder, EngineConfig, ExecutionState,
    OperationStatus, Plan, PlanStatus, StepStatus,
};
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    args::{ConfigArgs, PlanFileArgs, RunArgs},
    handlers::Workspace,
    renderer::TerminalRenderer,
};

const MANUAL_HELP: &str = "Commands: `next`, `pause`, `resume`, `retry <n>`, `stop`, `status`, `help`";

/// One line typed at the prompt while stepping through a plan manually.
#[derive(Debug, PartialEq, Eq)]
enum ManualCommand {
    Next,
    Pause,
    Resume,
    /// Zero-based index of the step to retry
    Retry(usize),
    Stop,
    Status,
    Help,
    Empty,
}

impl FromStr for ManualCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = match words.next() {
            None => return Ok(ManualCommand::Empty),
            Some(word) => word.to_lowercase(),
        };
        let parsed = match command.as_str() {
            "next" | "n" => ManualCommand::Next,
            "pause" => ManualCommand::Pause,
            "resume" => ManualCommand::Resume,
            "stop" | "quit" => ManualCommand::Stop,
            "status" | "s" => ManualCommand::Status,
            "help" | "?" => ManualCommand::Help,
            "retry" => {
                let number: usize = words
                    .next()
                    .ok_or_else(|| "Usage: retry <step number>".to_string())?
                    .parse()
                    .map_err(|_| "Step number must be a positive integer".to_string())?;
                let index = number
                    .checked_sub(1)
                    .ok_or_else(|| "Step numbers start at 1".to_string())?;
                ManualCommand::Retry(index)
            }
            other => return Err(format!("Unknown command: {other}. {MANUAL_HELP}")),
        };
        if words.next().is_some() {
            return Err(format!("Unexpected arguments after '{command}'"));
        }
        Ok(parsed)
    }
}

/// Command handler holding the renderer and loaded configuration
pub struct Cli {
    renderer: Arc<TerminalRenderer>,
    config: EngineConfig,
}

impl Cli {
    pub fn new(renderer: TerminalRenderer, config: EngineConfig) -> Self {
        Self {
            renderer: Arc::new(renderer),
            config,
        }
    }

    /// Execute a plan file, printing progress for every transition.
    ///
    /// Fails when the plan does not end up completed.
    pub async fn run(&self, args: RunArgs) -> Result<()> {
        let plan = read_plan(&args.file)?;
        let options = args.options(&self.config);
        let config = args.engine_config(&self.config);
        let engine = Workspace::for_plan_file(&args.file)
            .register(EngineBuilder::new().with_config(&config))
            .build();

        let plan_id = plan.id.clone();
        let last_seen = Arc::new(Mutex::new(None));
        let subscription = engine.subscribe(
            &plan_id,
            progress_listener(Arc::clone(&self.renderer), Arc::clone(&last_seen)),
        );

        tokio::select! {
            started = engine.start_execution(plan, options) => {
                started.with_context(|| format!("Failed to start plan '{plan_id}'"))?;
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping plan '{plan_id}'");
                engine.stop_execution(&plan_id);
            }
        }

        if !options.auto_proceed {
            self.drive_manually(&engine, &plan_id).await?;
        }
        subscription.unsubscribe();

        let final_state = engine.get_execution_state(&plan_id).or_else(|| {
            last_seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        });
        let Some(state) = final_state else {
            bail!("Plan '{plan_id}' produced no execution state");
        };

        self.renderer.render(&format!("\n{}", state.plan))?;
        if let Some(path) = &args.save {
            save_plan(path, &state.plan)
                .with_context(|| format!("Failed to save plan to {}", path.display()))?;
        }

        let status = OperationStatus::for_plan(&state.plan);
        if status.success {
            self.renderer.render(&status.to_string())
        } else {
            Err(anyhow!(status.message))
        }
    }

    /// Read commands from stdin until the plan leaves the engine, the user
    /// stops it, input ends, or Ctrl-C arrives.
    async fn drive_manually(&self, engine: &Engine, plan_id: &str) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);
        self.renderer.line(MANUAL_HELP);

        while engine.is_registered(plan_id) {
            let next = tokio::select! {
                next = lines.next_line() => next.context("Failed to read command")?,
                _ = &mut interrupt => {
                    warn!("Interrupted, stopping plan '{plan_id}'");
                    engine.stop_execution(plan_id);
                    break;
                }
            };
            let Some(line) = next else {
                break;
            };
            let command = match line.parse::<ManualCommand>() {
                Ok(command) => command,
                Err(message) => {
                    self.renderer.line(&message);
                    continue;
                }
            };

            match command {
                ManualCommand::Next => engine.execute_next_step(plan_id).await,
                ManualCommand::Pause => engine.pause_execution(plan_id),
                ManualCommand::Resume => engine.resume_execution(plan_id).await,
                ManualCommand::Retry(index) => {
                    if let Err(e) = engine.retry_step(plan_id, index).await {
                        self.renderer.line(&e.to_string());
                    }
                }
                ManualCommand::Stop => {
                    engine.stop_execution(plan_id);
                    break;
                }
                ManualCommand::Status => {
                    if let Some(state) = engine.get_execution_state(plan_id) {
                        self.renderer.line(&state.to_string());
                        self.renderer.render(&state.plan.to_string())?;
                    }
                }
                ManualCommand::Help => self.renderer.line(MANUAL_HELP),
                ManualCommand::Empty => {}
            }
        }
        Ok(())
    }

    /// Check every step of a plan file for missing required fields.
    pub fn validate(&self, args: PlanFileArgs) -> Result<()> {
        let plan = read_plan(&args.file)?;
        let failures = plan.validate();

        if failures.is_empty() {
            let status = OperationStatus::success(format!(
                "Plan '{}' is valid ({} steps)",
                plan.id,
                plan.steps.len()
            ));
            return self.renderer.render(&status.to_string());
        }

        let mut report = String::from("## Invalid steps\n\n");
        for (index, error) in &failures {
            report.push_str(&format!(
                "- {}. `{}`: {error}\n",
                index + 1,
                plan.steps[*index].id
            ));
        }
        self.renderer.render(&report)?;
        bail!(
            "Plan '{}' has {} invalid step(s)",
            plan.id,
            failures.len()
        )
    }

    /// Print a plan file as markdown.
    pub fn show(&self, args: PlanFileArgs) -> Result<()> {
        let plan = read_plan(&args.file)?;
        self.renderer.render(&plan.to_string())
    }

    /// Print the effective configuration, or write the defaults with `--init`.
    pub fn config(&self, args: ConfigArgs) -> Result<()> {
        if args.init {
            let path = EngineConfig::default_path().context("Failed to locate config directory")?;
            if path.exists() {
                self.renderer
                    .line(&format!("Configuration already exists at {}", path.display()));
                return Ok(());
            }
            EngineConfig::default()
                .save(&path)
                .context("Failed to write configuration")?;
            let status =
                OperationStatus::success(format!("Wrote default configuration to {}", path.display()));
            return self.renderer.render(&status.to_string());
        }

        let json = serde_json::to_string_pretty(&self.config)?;
        self.renderer.render(&format!("```json\n{json}\n```\n"))
    }
}

fn read_plan(path: &Path) -> Result<Plan> {
    load_plan(path).with_context(|| format!("Failed to load plan from {}", path.display()))
}

/// Listener printing one line per step status change and remembering the
/// latest snapshot.
fn progress_listener(
    renderer: Arc<TerminalRenderer>,
    last_seen: Arc<Mutex<Option<ExecutionState>>>,
) -> impl Fn(&ExecutionState) -> Result<()> + Send + Sync + 'static {
    move |state: &ExecutionState| {
        let mut last_seen = last_seen
            .lock()
            .map_err(|_| anyhow!("progress state lock poisoned"))?;

        for line in progress_lines(last_seen.as_ref(), state) {
            renderer.line(&line);
        }
        *last_seen = Some(state.clone());
        Ok(())
    }
}

fn progress_lines(previous: Option<&ExecutionState>, state: &ExecutionState) -> Vec<String> {
    let total = state.plan.steps.len();
    let mut lines = Vec::new();

    for (index, step) in state.plan.steps.iter().enumerate() {
        let before = previous
            .and_then(|p| p.plan.steps.get(index))
            .map(|s| s.status);
        if before == Some(step.status) {
            continue;
        }
        let label = format!("{}/{total} {} `{}`", index + 1, step.step_type, step.id);
        match step.status {
            StepStatus::Running => lines.push(format!("➤ {label}")),
            StepStatus::Completed => lines.push(match step.duration_ms {
                Some(ms) => format!("✓ {label} ({})", Millis(ms)),
                None => format!("✓ {label}"),
            }),
            StepStatus::Error => lines.push(format!(
                "✗ {label}: {}",
                step.error.as_deref().unwrap_or("unknown error")
            )),
            StepStatus::Pending if before.is_some() => lines.push(format!("○ {label} reset")),
            StepStatus::Pending => {}
        }
    }

    let status_changed = previous.map(|p| p.plan.status) != Some(state.plan.status);
    if status_changed && state.plan.status == PlanStatus::Paused {
        lines.push(format!(
            "Paused before step {}/{total}",
            (state.current_step_index + 1).min(total)
        ));
    }
    lines
}
