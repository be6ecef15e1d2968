//! Log source backed by a follower process (`journalctl -f` by default).

use crate::domain::errors::LogSourceError;
use crate::ports::{LogSource, LogStream};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::debug;

/// Spawns the configured command and streams its stdout line by line.
///
/// The child is killed when the stream is dropped.
#[derive(Debug, Clone)]
pub struct CommandLogSource {
    program: String,
    args: Vec<String>,
}

impl CommandLogSource {
    /// `command[0]` is the program, the rest its arguments.
    pub fn new(command: Vec<String>) -> Self {
        let mut parts = command.into_iter();
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            args: parts.collect(),
        }
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl LogSource for CommandLogSource {
    async fn open(&self) -> Result<LogStream, LogSourceError> {
        let mut child: Child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LogSourceError::Spawn {
                command: self.display(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(LogSourceError::NoOutput)?;
        debug!(command = %self.display(), pid = ?child.id(), "Log follower started");

        // the closure owns the child so it lives as long as the stream
        let lines = LinesStream::new(BufReader::new(stdout).lines()).map(move |line| {
            let _ = &child;
            line.map_err(LogSourceError::from)
        });
        Ok(Box::pin(lines))
    }
}
