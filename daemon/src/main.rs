//! Agora runner: executes voting session command scripts.

mod command;
mod config;
mod error;
mod interpreter;

use std::path::{Path, PathBuf};

use agora_utils::LogFormat;
use agora_voting::SessionRegistry;
use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::{ClockMode, DaemonConfig};
use crate::interpreter::{Interpreter, ScriptClock};

#[derive(Parser)]
#[command(name = "agora", about = "Agora voting session runner")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "AGORA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "AGORA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "AGORA_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Minimum seconds between creating and opening a session.
    #[arg(long, env = "AGORA_REGISTRATION_WINDOW_SECS")]
    registration_window: Option<u64>,

    /// Minimum seconds between opening and closing a session.
    #[arg(long, env = "AGORA_VOTING_DURATION_SECS")]
    voting_duration: Option<u64>,

    /// Registry snapshot file, loaded at start and written at exit.
    #[arg(long, env = "AGORA_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Clock used to stamp commands.
    #[arg(long, value_enum, env = "AGORA_CLOCK")]
    clock: Option<ClockMode>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Execute a command script (stdin when no file is given).
    Run {
        /// Script file.
        script: Option<PathBuf>,

        /// Stop at the first failing line.
        #[arg(long)]
        fail_fast: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

impl Cli {
    fn effective_config(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(secs) = self.registration_window {
            config.params.registration_window_secs = secs;
        }
        if let Some(secs) = self.voting_duration {
            config.params.voting_duration_secs = secs;
        }
        if let Some(path) = &self.state_file {
            config.state_file = Some(path.clone());
        }
        if let Some(clock) = self.clock {
            config.clock = clock;
        }
        Ok(config)
    }
}

async fn load_registry(config: &DaemonConfig) -> anyhow::Result<SessionRegistry> {
    let Some(path) = &config.state_file else {
        return Ok(SessionRegistry::new(config.params));
    };
    match tokio::fs::read(path).await {
        Ok(bytes) => SessionRegistry::load_state(&bytes, config.params)
            .with_context(|| format!("failed to restore {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No state file at {}, starting empty", path.display());
            Ok(SessionRegistry::new(config.params))
        }
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

/// Sibling file the snapshot is staged in before it replaces `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write the snapshot next to `path`, then rename it into place so an
/// interrupted save leaves the previous state file intact.
async fn save_registry(registry: &SessionRegistry, path: &Path) -> anyhow::Result<()> {
    let bytes = registry.save_state()?;
    let staging = staging_path(path);
    tokio::fs::write(&staging, bytes)
        .await
        .with_context(|| format!("failed to write {}", staging.display()))?;
    tokio::fs::rename(&staging, path)
        .await
        .with_context(|| format!("failed to replace {}", path.display()))?;
    tracing::info!(sessions = registry.len(), "Saved registry to {}", path.display());
    Ok(())
}

async fn open_script(script: Option<&Path>) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin>> {
    Ok(match script {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open script {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    })
}

/// Run every line of the script. Returns the number of failed lines.
async fn run_script(
    interpreter: &Interpreter,
    reader: Box<dyn AsyncBufRead + Unpin>,
    fail_fast: bool,
) -> anyhow::Result<usize> {
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut failures = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match interpreter.execute_line(&line) {
            Ok(Some(output)) => println!("{output}"),
            Ok(None) => {}
            Err(e) => {
                failures += 1;
                println!("line {line_no}: {e}");
                if fail_fast {
                    break;
                }
            }
        }
    }
    Ok(failures)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.effective_config()?;
    agora_utils::init_logging(config.log_format, &config.log_level)?;

    match &cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Run { script, fail_fast } => {
            tracing::info!(
                "Starting Agora runner (clock: {:?}, registration window: {}s, voting duration: {}s)",
                config.clock,
                config.params.registration_window_secs,
                config.params.voting_duration_secs,
            );
            let registry = load_registry(&config).await?;
            let interpreter = Interpreter::new(registry, ScriptClock::from_mode(config.clock));

            let reader = open_script(script.as_deref()).await?;
            let failures = run_script(&interpreter, reader, *fail_fast).await?;

            if let Some(path) = &config.state_file {
                save_registry(interpreter.registry(), path).await?;
            }
            if failures > 0 {
                tracing::warn!(failures, "Script finished with rejected lines");
            }
            tracing::info!("Agora runner exited cleanly");
        }
    }

    Ok(())
}
