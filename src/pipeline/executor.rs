//! Pipeline execution
//!
//! Commands run one at a time in order. The first failure stops the run.
//! Cleanups always run afterwards, in the order they were registered.

use super::{Cleanup, Command, Pipeline};
use crate::PtmError;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Captured result of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit status as reported by the OS, e.g. `exit status: 2`
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            success: true,
            status: "exit status: 0".to_string(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn failure(status: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            status: status.into(),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs external commands
///
/// Errors are reserved for commands that could not be started; a command
/// that ran and failed is reported through [`CommandOutput::success`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &Command) -> Result<CommandOutput, PtmError>;
}

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &Command) -> Result<CommandOutput, PtmError> {
        let output = tokio::process::Command::new(command.tool.program())
            .args(&command.args)
            .output()
            .await
            .map_err(|e| PtmError::Command(format!("{}: {}", command.tool.program(), e)))?;

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run every command in order, then every cleanup
///
/// A command failure is returned even if cleanups fail afterwards; those
/// secondary failures are only logged. Without a command failure the first
/// cleanup failure is returned.
pub async fn execute(pipeline: Pipeline, runner: &dyn CommandRunner) -> Result<(), PtmError> {
    let (commands, cleanups) = pipeline.into_parts();

    let result = run_commands(&commands, runner).await;
    let cleanup_result = run_cleanups(cleanups).await;

    match result {
        Err(e) => {
            if let Err(cleanup_error) = cleanup_result {
                warn!("Ignoring cleanup failure after command failure: {}", cleanup_error);
            }
            Err(e)
        }
        Ok(()) => cleanup_result,
    }
}

async fn run_commands(commands: &[Command], runner: &dyn CommandRunner) -> Result<(), PtmError> {
    let total = commands.len();

    for command in commands {
        info!("[{}/{}] {}", command.order, total, command);
        let output = runner.run(command).await?;

        if !output.success {
            return Err(PtmError::execution(
                command.command_line(),
                output.status,
                output.stderr,
            ));
        }
        if !output.stdout.trim().is_empty() {
            debug!("{}", output.stdout.trim());
        }
    }

    Ok(())
}

async fn run_cleanups(cleanups: Vec<Cleanup>) -> Result<(), PtmError> {
    let mut first_error = None;

    for cleanup in cleanups {
        if let Err(e) = cleanup.run().await {
            warn!("{}", e);
            first_error.get_or_insert(e);
        }
    }

    first_error.map_or(Ok(()), Err)
}
