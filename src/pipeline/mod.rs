//! Ordered external command pipelines
//!
//! A [`Pipeline`] is an append-only list of [`Command`]s plus the cleanup
//! actions that remove the temporary files those commands read. Builders in
//! [`qemu`] and [`customize`] fill a pipeline; [`executor`] runs it once.

pub mod customize;
pub mod executor;
pub mod mock;
pub mod qemu;

pub use executor::{CommandOutput, CommandRunner, ProcessRunner};

use crate::PtmError;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// External program a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Proxmox VM manager
    Qm,
    /// libguestfs image customizer
    VirtCustomize,
}

impl Tool {
    pub fn program(&self) -> &'static str {
        match self {
            Self::Qm => "qm",
            Self::VirtCustomize => "virt-customize",
        }
    }
}

/// One external invocation, immutable once queued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// 1-based position in its pipeline
    pub order: usize,
    pub tool: Tool,
    pub args: Vec<String>,
}

impl Command {
    /// Program followed by its arguments
    pub fn command_line(&self) -> String {
        let mut line = self.tool.program().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// Removes one temporary artifact after the pipeline ran
pub enum Cleanup {
    RemoveFile(PathBuf),
    Custom(Box<dyn FnOnce() -> Result<(), PtmError> + Send>),
}

impl Cleanup {
    pub fn custom(action: impl FnOnce() -> Result<(), PtmError> + Send + 'static) -> Self {
        Self::Custom(Box::new(action))
    }

    pub async fn run(self) -> Result<(), PtmError> {
        match self {
            Self::RemoveFile(path) => match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Removed {}", path.display());
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(PtmError::Cleanup(format!(
                    "failed to remove {}: {}",
                    path.display(),
                    e
                ))),
            },
            Self::Custom(action) => action(),
        }
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveFile(path) => f.debug_tuple("RemoveFile").field(path).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Commands in execution order and their cleanups in registration order
#[derive(Debug, Default)]
pub struct Pipeline {
    commands: Vec<Command>,
    cleanups: Vec<Cleanup>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command; its order index is its 1-based position
    pub fn push<I, S>(&mut self, tool: Tool, args: I) -> &Command
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order = self.commands.len() + 1;
        self.commands.push(Command {
            order,
            tool,
            args: args.into_iter().map(Into::into).collect(),
        });
        &self.commands[order - 1]
    }

    pub fn on_cleanup(&mut self, cleanup: Cleanup) {
        self.cleanups.push(cleanup);
    }

    /// Write a temporary file and register its removal
    ///
    /// A file left over from an earlier run is replaced.
    pub async fn stage_file(&mut self, path: impl AsRef<Path>, content: &str) -> Result<(), PtmError> {
        let path = path.as_ref();

        match fs::remove_file(path).await {
            Ok(()) => debug!("Removed stale {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        self.on_cleanup(Cleanup::RemoveFile(path.to_path_buf()));
        fs::write(path, content).await?;
        debug!("Staged {}", path.display());
        Ok(())
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.len()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run the pipeline once, see [`executor::execute`]
    pub async fn execute(self, runner: &dyn CommandRunner) -> Result<(), PtmError> {
        executor::execute(self, runner).await
    }

    /// Drop the commands and run the cleanups; used when building fails
    pub async fn abandon(self) {
        for cleanup in self.cleanups {
            if let Err(e) = cleanup.run().await {
                warn!("{}", e);
            }
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<Command>, Vec<Cleanup>) {
        (self.commands, self.cleanups)
    }
}
