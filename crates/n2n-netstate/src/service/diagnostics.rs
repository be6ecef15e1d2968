//! Gate in front of the diagnostic runner.

use crate::domain::diagnostics::{is_valid_target, DiagnosticOutput, DiagnosticTool};
use crate::domain::errors::DiagnosticError;
use crate::metrics;
use crate::ports::DiagnosticRunner;
use std::sync::Arc;
use tracing::{info, warn};

/// Checks the enable switch, the tool allowlist and the target before
/// anything is spawned.
pub struct Diagnostics {
    runner: Arc<dyn DiagnosticRunner>,
    enabled: bool,
}

impl Diagnostics {
    pub fn new(runner: Arc<dyn DiagnosticRunner>, enabled: bool) -> Self {
        Self { runner, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `command` against `target`.
    ///
    /// Refused requests are errors. A run that could not start or finish is
    /// reported as output with `error` set, like a non-zero exit.
    pub async fn run(
        &self,
        command: &str,
        target: &str,
    ) -> Result<DiagnosticOutput, DiagnosticError> {
        if !self.enabled {
            return Err(DiagnosticError::Disabled);
        }
        let tool = DiagnosticTool::parse(command)
            .ok_or_else(|| DiagnosticError::UnknownCommand(command.to_string()))?;
        if !is_valid_target(target) {
            warn!(tool = %tool, target = ?target, "Diagnostic target refused");
            return Err(DiagnosticError::InvalidTarget(target.to_string()));
        }

        info!(tool = %tool, target, "Running diagnostic command");
        match self.runner.run(tool, target).await {
            Ok(output) => {
                metrics::record_diagnostic_run(tool.program(), output.error.is_none());
                Ok(output)
            }
            Err(e) => {
                metrics::record_diagnostic_run(tool.program(), false);
                warn!(tool = %tool, error = %e, "Diagnostic command failed");
                Ok(DiagnosticOutput::failure(String::new(), e.to_string()))
            }
        }
    }
}
