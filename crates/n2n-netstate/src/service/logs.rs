//! Daemon log view: a recent-lines snapshot and a live follow stream.
//!
//! Both open a fresh [`LogSource`] per call. The relay tailer keeps its own
//! follower and is not affected.

use crate::domain::config::LogsConfig;
use crate::domain::errors::LogSourceError;
use crate::ports::{LogSource, LogStream};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

pub struct LogViewer {
    recent: Arc<dyn LogSource>,
    follow: Arc<dyn LogSource>,
    max_lines: usize,
    snapshot_timeout: Duration,
}

impl LogViewer {
    pub fn new(
        recent: Arc<dyn LogSource>,
        follow: Arc<dyn LogSource>,
        config: &LogsConfig,
    ) -> Self {
        Self {
            recent,
            follow,
            max_lines: config.recent_lines,
            snapshot_timeout: config.snapshot_timeout,
        }
    }

    /// The last `recent_lines` lines, oldest first.
    ///
    /// Reading stops when the source ends or the snapshot deadline passes,
    /// whichever is first. A read error after some lines were collected
    /// returns those lines.
    pub async fn recent_lines(&self) -> Result<Vec<String>, LogSourceError> {
        let mut stream = self.recent.open().await?;
        let deadline = Instant::now() + self.snapshot_timeout;
        let mut lines = VecDeque::with_capacity(self.max_lines);

        loop {
            match tokio::time::timeout_at(deadline, stream.next()).await {
                Err(_) => {
                    debug!(lines = lines.len(), "Log snapshot deadline reached");
                    break;
                }
                Ok(None) => break,
                Ok(Some(Ok(line))) => {
                    if lines.len() == self.max_lines {
                        lines.pop_front();
                    }
                    lines.push_back(line);
                }
                Ok(Some(Err(e))) => {
                    if lines.is_empty() {
                        return Err(e);
                    }
                    warn!(error = %e, "Log snapshot cut short");
                    break;
                }
            }
        }

        Ok(lines.into())
    }

    /// Backlog then live lines until the caller drops the stream.
    pub async fn follow(&self) -> Result<LogStream, LogSourceError> {
        self.follow.open().await
    }
}
