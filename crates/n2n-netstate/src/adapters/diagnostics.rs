//! Diagnostic runner backed by host processes.

use crate::domain::config::DiagnosticsConfig;
use crate::domain::diagnostics::{DiagnosticOutput, DiagnosticTool};
use crate::domain::errors::DiagnosticError;
use crate::ports::DiagnosticRunner;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Runs the tool binary directly, without a shell, and returns stdout
/// followed by stderr. The child is killed when the deadline passes.
#[derive(Debug, Clone)]
pub struct CommandDiagnosticRunner {
    timeout: Duration,
}

impl CommandDiagnosticRunner {
    pub fn new(config: &DiagnosticsConfig) -> Self {
        Self {
            timeout: config.timeout,
        }
    }

    async fn execute(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<DiagnosticOutput, DiagnosticError> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DiagnosticError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DiagnosticError::Timeout {
                program: program.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|source| DiagnosticError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(program, status = %output.status, bytes = text.len(), "Diagnostic command finished");
        if output.status.success() {
            Ok(DiagnosticOutput::success(text))
        } else {
            Ok(DiagnosticOutput::failure(text, output.status.to_string()))
        }
    }
}

#[async_trait]
impl DiagnosticRunner for CommandDiagnosticRunner {
    async fn run(
        &self,
        tool: DiagnosticTool,
        target: &str,
    ) -> Result<DiagnosticOutput, DiagnosticError> {
        self.execute(tool.program(), &tool.args(target)).await
    }
}
