//! Conductor CLI Application
//!
//! Command-line interface for running action plans with the conductor
//! execution engine.

mod args;
mod cli;
mod handlers;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use conductor_core::EngineConfig;
use log::info;
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        config,
        no_color,
        command,
    } = Args::parse();

    let engine_config =
        EngineConfig::load(config.as_deref()).context("Failed to load configuration")?;
    let renderer = TerminalRenderer::new(!no_color);

    info!("Conductor started");

    let cli = Cli::new(renderer, engine_config);
    match command {
        Run(args) => cli.run(args).await,
        Validate(args) => cli.validate(args),
        Show(args) => cli.show(args),
        Config(args) => cli.config(args),
    }
}
