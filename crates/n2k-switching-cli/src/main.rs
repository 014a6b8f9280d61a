//! Command-line simulator for the NMEA 2000 switching emulator.
//!
//! Runs the plugin against an in-memory host: emitted N2K messages go to
//! stdout as JSON lines, stdin feeds inbound N2K messages and local state
//! changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use n2k_switching_core::{MemoryHost, PluginConfig, SharedHost, SwitchingPlugin};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

/// NMEA 2000 switch bank emulator simulator.
#[derive(Parser, Debug)]
#[command(name = "n2k-switching")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the emulator, reading JSON lines from stdin.
    Run {
        /// Plugin configuration file (JSON).
        #[arg(short, long)]
        config: PathBuf,
        /// Initial path values, a JSON object of path to value.
        #[arg(long)]
        initial: Option<PathBuf>,
    },
    /// Print the configuration schema.
    Schema {
        /// Configuration whose switch paths are offered as candidates.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Additional known host paths.
        #[arg(long = "paths", num_args = 1..)]
        paths: Vec<String>,
    },
}

/// One line read from stdin.
#[derive(Debug, PartialEq)]
enum Input {
    /// Message for the N2K input bus.
    Nmea2000(Value),
    /// Local state change made by another producer.
    StateChange { path: String, value: Value },
}

impl Input {
    fn parse(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line).context("input is not JSON")?;
        if value.get("pgn").is_some() {
            return Ok(Input::Nmea2000(value));
        }
        match (value.get("path").and_then(Value::as_str), value.get("value")) {
            (Some(path), Some(v)) => Ok(Input::StateChange {
                path: path.to_string(),
                value: v.clone(),
            }),
            _ => anyhow::bail!("expected an N2K message or a {{\"path\", \"value\"}} object"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Run { config, initial } => run(&config, initial.as_deref()).await,
        Command::Schema { config, paths } => print_schema(config.as_deref(), paths),
    }
}

fn init_logging(verbose: bool) {
    let json_logging = std::env::var("N2K_SWITCHING_LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_str()));

    // stdout carries N2K output, logs go to stderr
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn run(config_path: &Path, initial: Option<&Path>) -> Result<()> {
    let config = read_json(config_path)?;
    let memory = MemoryHost::new();

    if let Some(path) = initial {
        let Value::Object(values) = read_json(path)? else {
            anyhow::bail!("{} must contain a JSON object", path.display());
        };
        for (path, value) in values {
            memory.set_value(&path, value);
        }
    }

    let mut outbound = memory.outbound();
    let host: SharedHost = Arc::new(memory.clone());
    let mut plugin = SwitchingPlugin::new(host);

    let descriptor = SwitchingPlugin::descriptor();
    tracing::info!("{} ({})", descriptor.name, descriptor.id);
    plugin
        .start_from_value(config)
        .await
        .context("Failed to start emulator")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => handle_line(&memory, line.trim()),
                None => break,
            },
            message = outbound.recv() => match message {
                Ok(message) => println!("{}", message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Output lagged, {} messages skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    plugin.stop().await;
    while let Ok(message) = outbound.try_recv() {
        println!("{}", message);
    }
    Ok(())
}

fn handle_line(memory: &MemoryHost, line: &str) {
    if line.is_empty() {
        return;
    }
    match Input::parse(line) {
        Ok(Input::Nmea2000(message)) => {
            memory.publish_nmea2000(message);
        }
        Ok(Input::StateChange { path, value }) => {
            tracing::debug!(%path, "Local change {}", value);
            memory.set_value(&path, value);
        }
        Err(e) => tracing::warn!("Skipping input line: {:#}", e),
    }
}

fn print_schema(config: Option<&Path>, paths: Vec<String>) -> Result<()> {
    let config = match config {
        Some(path) => Some(PluginConfig::from_value(read_json(path)?)?),
        None => None,
    };
    let schema = n2k_switching_core::schema::config_schema(&paths, config.as_ref());
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
