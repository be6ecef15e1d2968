//! Relay detection from the supernode journal.
//!
//! [`LogTailer`] is the only writer of the [`RelayTable`]. Stale pairs are
//! never swept proactively: they are reaped by the read that would
//! otherwise have returned them.

use crate::domain::config::RelayConfig;
use crate::domain::relay_line::parse_forwarding_line;
use crate::domain::types::{HardwareAddr, RelayKey, RelayPair};
use crate::metrics;
use crate::ports::{LogSource, TimeSource};
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Live relay pairs keyed by (source, destination).
pub struct RelayTable {
    pairs: Mutex<HashMap<RelayKey, RelayPair>>,
    clock: Arc<dyn TimeSource>,
    window: Duration,
}

impl RelayTable {
    pub fn new(clock: Arc<dyn TimeSource>, window: Duration) -> Self {
        Self {
            pairs: Mutex::new(HashMap::new()),
            clock,
            window,
        }
    }

    /// Record one forwarded packet from `source` to `destination`.
    pub fn observe(&self, source: HardwareAddr, destination: HardwareAddr) {
        let now = self.clock.now();
        let key = RelayKey {
            source: source.clone(),
            destination: destination.clone(),
        };

        let mut pairs = self.pairs.lock();
        pairs
            .entry(key)
            .and_modify(|pair| {
                pair.last_active = now;
                pair.packet_count = pair.packet_count.saturating_add(1);
            })
            .or_insert_with(|| {
                debug!(source = %source, destination = %destination, "New relay pair");
                RelayPair {
                    source,
                    destination,
                    last_active: now,
                    packet_count: 1,
                }
            });
    }

    /// Pairs active within the staleness window, sorted by key.
    ///
    /// Pairs outside the window are removed as part of this call.
    pub fn active_relays(&self) -> Vec<RelayPair> {
        let now = self.clock.now();
        let mut pairs = self.pairs.lock();

        pairs.retain(|key, pair| {
            let fresh = now.duration_since(pair.last_active) < self.window;
            if !fresh {
                debug!(pair = %key, "Relay pair went stale");
            }
            fresh
        });

        let mut active: Vec<RelayPair> = pairs.values().cloned().collect();
        drop(pairs);

        active.sort_by(|a, b| a.key().cmp(&b.key()));
        metrics::set_active_relay_pairs(active.len());
        active
    }

    /// Every address on either side of an active pair.
    pub fn relayed_addresses(&self) -> HashSet<HardwareAddr> {
        self.active_relays()
            .into_iter()
            .flat_map(|pair| [pair.source, pair.destination])
            .collect()
    }

    /// Stored pairs, stale ones included.
    pub fn len(&self) -> usize {
        self.pairs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.lock().is_empty()
    }
}

/// Supervised follower of the daemon's log.
pub struct LogTailer {
    source: Arc<dyn LogSource>,
    table: Arc<RelayTable>,
    restart_backoff: Duration,
    open_backoff: Duration,
}

impl LogTailer {
    pub fn new(source: Arc<dyn LogSource>, table: Arc<RelayTable>, config: &RelayConfig) -> Self {
        Self {
            source,
            table,
            restart_backoff: config.restart_backoff,
            open_backoff: config.open_backoff,
        }
    }

    /// Follow the log until `shutdown` fires, restarting after every failure.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Relay log tailer started");

        while !*shutdown.borrow() {
            let backoff = tokio::select! {
                _ = shutdown.changed() => break,
                backoff = self.follow_once() => backoff,
            };

            metrics::record_tailer_restart();
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        info!("Relay log tailer stopped");
    }

    /// Follow one stream until it breaks. Returns the wait before retrying.
    async fn follow_once(&self) -> Duration {
        let mut stream = match self.source.open().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(
                    error = %e,
                    retry_ms = self.open_backoff.as_millis() as u64,
                    "Failed to open log stream"
                );
                return self.open_backoff;
            }
        };

        debug!("Log stream attached");
        while let Some(item) = stream.next().await {
            match item {
                Ok(line) => {
                    self.process_line(&line);
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_ms = self.restart_backoff.as_millis() as u64,
                        "Log stream read failed, restarting"
                    );
                    return self.restart_backoff;
                }
            }
        }

        warn!(
            retry_ms = self.restart_backoff.as_millis() as u64,
            "Log stream ended, restarting"
        );
        self.restart_backoff
    }

    /// Feed one line to the table. True if it was a forwarding line.
    pub fn process_line(&self, line: &str) -> bool {
        match parse_forwarding_line(line) {
            Some((source, destination)) => {
                metrics::record_relay_line_matched();
                self.table.observe(source, destination);
                true
            }
            None => false,
        }
    }
}
