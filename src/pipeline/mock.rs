//! Recording command runner for testing

use super::{Command, CommandOutput, CommandRunner};
use crate::PtmError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Runner that records commands instead of executing them
///
/// # Example
/// ```
/// use ptm_rs::pipeline::mock::MockRunner;
///
/// // the second command exits with status 1
/// let runner = MockRunner::new().fail_at(2, "disk busy");
/// ```
#[derive(Debug, Default)]
pub struct MockRunner {
    failures: HashMap<usize, String>,
    spawn_errors: HashMap<usize, String>,
    executed: Mutex<Vec<Command>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the command with this order index exit unsuccessfully
    pub fn fail_at(mut self, order: usize, stderr: &str) -> Self {
        self.failures.insert(order, stderr.to_string());
        self
    }

    /// Make the command with this order index fail to start
    pub fn spawn_error_at(mut self, order: usize, message: &str) -> Self {
        self.spawn_errors.insert(order, message.to_string());
        self
    }

    /// Commands run so far
    pub async fn executed(&self) -> Vec<Command> {
        self.executed.lock().await.clone()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &Command) -> Result<CommandOutput, PtmError> {
        self.executed.lock().await.push(command.clone());

        if let Some(message) = self.spawn_errors.get(&command.order) {
            return Err(PtmError::Command(message.clone()));
        }
        if let Some(stderr) = self.failures.get(&command.order) {
            return Ok(CommandOutput::failure("exit status: 1", stderr.clone()));
        }
        Ok(CommandOutput::success())
    }
}
