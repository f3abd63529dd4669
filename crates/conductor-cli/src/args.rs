use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use conductor_core::{EngineConfig, ExecutionOptions};

/// Run AI-generated action plans step by step
///
/// Conductor executes a plan file (an ordered list of think, file and shell
/// steps) one step at a time, printing progress after every transition.
/// Plans can run unattended, be stepped through manually from stdin, or be
/// dry-run to check them without touching the file system.
#[derive(Parser)]
#[command(version, about, name = "conductor")]
pub struct Args {
    /// Path to the JSON configuration file. Defaults to
    /// $XDG_CONFIG_HOME/conductor/config.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for the Conductor CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Execute a plan file
    #[command(alias = "r")]
    Run(RunArgs),
    /// Check that every step has the fields its type requires
    Validate(PlanFileArgs),
    /// Print a plan file as markdown
    Show(PlanFileArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Execute a plan file
#[derive(ClapArgs)]
pub struct RunArgs {
    /// Plan definition in JSON
    pub file: PathBuf,

    /// Validate and sequence steps without performing them
    #[arg(long)]
    pub dry_run: bool,

    /// Wait for `next` on stdin before each step
    #[arg(long)]
    pub manual: bool,

    /// Record failed steps and keep going instead of pausing
    #[arg(long)]
    pub continue_on_error: bool,

    /// Delay between automatically executed steps, in milliseconds
    #[arg(long, value_name = "MS")]
    pub step_delay_ms: Option<u64>,

    /// Write the final plan state to this file as JSON
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,
}

impl RunArgs {
    /// Execution options from the configuration, overridden by flags.
    pub fn options(&self, config: &EngineConfig) -> ExecutionOptions {
        let defaults = config.default_options();
        ExecutionOptions {
            auto_proceed: defaults.auto_proceed && !self.manual,
            pause_on_error: defaults.pause_on_error && !self.continue_on_error,
            dry_run: defaults.dry_run || self.dry_run,
        }
    }

    /// The configuration with flag overrides applied.
    pub fn engine_config(&self, config: &EngineConfig) -> EngineConfig {
        EngineConfig {
            step_delay_ms: self.step_delay_ms.unwrap_or(config.step_delay_ms),
            ..config.clone()
        }
    }
}

/// A plan file argument
#[derive(ClapArgs)]
pub struct PlanFileArgs {
    /// Plan definition in JSON
    pub file: PathBuf,
}

/// Print or initialize the configuration
#[derive(ClapArgs)]
pub struct ConfigArgs {
    /// Write the default configuration to the XDG config directory if no
    /// file exists there yet
    #[arg(long)]
    pub init: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Commands::Run(run) => run,
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let run = run_args(&[
            "conductor",
            "run",
            "plan.json",
            "--manual",
            "--continue-on-error",
            "--step-delay-ms",
            "0",
        ]);
        let config = EngineConfig::default();

        let options = run.options(&config);
        assert!(!options.auto_proceed);
        assert!(!options.pause_on_error);
        assert!(!options.dry_run);
        assert_eq!(run.engine_config(&config).step_delay_ms, 0);
    }

    #[test]
    fn test_config_dry_run_survives_without_flag() {
        let run = run_args(&["conductor", "run", "plan.json"]);
        let config = EngineConfig {
            dry_run: true,
            ..Default::default()
        };

        assert!(run.options(&config).dry_run);
        assert_eq!(run.engine_config(&config).step_delay_ms, 100);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["conductor", "show", "plan.json", "--no-color"]).unwrap();
        assert!(args.no_color);
        assert!(matches!(args.command, Commands::Show(_)));
    }
}
