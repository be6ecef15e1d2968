//! Wiring and background task supervision.
//!
//! ## Background Tasks
//!
//! | Task | Period | Job |
//! |------|--------|-----|
//! | relay tailer | continuous | follow the journal, restart with backoff |
//! | GeoIP sweep | `geoip.sweep_interval` | drop entries past TTL |
//! | login sweep | `login.sweep_interval` | drop idle unlocked throttle entries |
//!
//! All tasks watch one shutdown channel.

use crate::adapters::credentials::StaticCredentials;
use crate::adapters::diagnostics::CommandDiagnosticRunner;
use crate::adapters::geoip::{DisabledGeoLookup, IpApiLookup};
use crate::adapters::journal::CommandLogSource;
use crate::adapters::time::SystemTimeSource;
use crate::adapters::udp::UdpControlTransport;
use crate::domain::config::NetStateConfig;
use crate::domain::errors::NetStateError;
use crate::ports::{
    ControlTransport, CredentialVerifier, DiagnosticRunner, GeoLookup, LogSource, NodeInventory,
    TimeSource,
};
use crate::service::aggregator::NetworkStateAggregator;
use crate::service::auth::AuthGate;
use crate::service::diagnostics::Diagnostics;
use crate::service::geo_cache::GeoCache;
use crate::service::logs::LogViewer;
use crate::service::mgmt::MgmtClient;
use crate::service::relay::{LogTailer, RelayTable};
use crate::service::throttle::LoginThrottle;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Collaborators the runtime is built from.
pub struct RuntimeParts {
    pub inventory: Arc<dyn NodeInventory>,
    pub transport: Arc<dyn ControlTransport>,
    pub geo_lookup: Arc<dyn GeoLookup>,
    /// Journal follower feeding the relay tailer
    pub log_source: Arc<dyn LogSource>,
    /// Prints recent daemon log lines and exits
    pub recent_logs: Arc<dyn LogSource>,
    /// Prints recent daemon log lines, then follows
    pub follow_logs: Arc<dyn LogSource>,
    pub diagnostic_runner: Arc<dyn DiagnosticRunner>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub clock: Arc<dyn TimeSource>,
}

/// Owns every service and the background tasks that feed them.
pub struct NetworkStateRuntime {
    config: NetStateConfig,
    geo: Arc<GeoCache>,
    relays: Arc<RelayTable>,
    throttle: Arc<LoginThrottle>,
    aggregator: Arc<NetworkStateAggregator>,
    auth: Arc<AuthGate>,
    logs: Arc<LogViewer>,
    diagnostics: Arc<Diagnostics>,
    log_source: Arc<dyn LogSource>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NetworkStateRuntime {
    /// Build with production adapters: UDP management port, HTTP GeoIP,
    /// `journalctl`, system clock.
    pub fn from_config(
        config: NetStateConfig,
        inventory: Arc<dyn NodeInventory>,
    ) -> Result<Self, NetStateError> {
        config.validate()?;

        let geo_lookup: Arc<dyn GeoLookup> = if config.geoip.enabled {
            Arc::new(IpApiLookup::new(&config.geoip)?)
        } else {
            info!("GeoIP lookups disabled");
            Arc::new(DisabledGeoLookup)
        };

        let parts = RuntimeParts {
            inventory,
            transport: Arc::new(UdpControlTransport::new(&config.mgmt)),
            geo_lookup,
            log_source: Arc::new(CommandLogSource::new(config.relay.log_command.clone())),
            recent_logs: Arc::new(CommandLogSource::new(config.logs.recent_command.clone())),
            follow_logs: Arc::new(CommandLogSource::new(config.logs.follow_command.clone())),
            diagnostic_runner: Arc::new(CommandDiagnosticRunner::new(&config.diagnostics)),
            verifier: Arc::new(StaticCredentials::from_config(&config.auth)),
            clock: Arc::new(SystemTimeSource),
        };
        Ok(Self::new(config, parts))
    }

    /// Build from explicit collaborators. Nothing runs until [`start`](Self::start).
    pub fn new(config: NetStateConfig, parts: RuntimeParts) -> Self {
        let mgmt = Arc::new(MgmtClient::new(parts.transport, config.mgmt.command.clone()));
        let geo = Arc::new(GeoCache::from_config(
            &config.geoip,
            parts.geo_lookup,
            parts.clock.clone(),
        ));
        let relays = Arc::new(RelayTable::new(
            parts.clock.clone(),
            config.relay.staleness_window,
        ));
        let throttle = Arc::new(LoginThrottle::new(config.login.clone(), parts.clock));
        let aggregator = Arc::new(NetworkStateAggregator::new(
            parts.inventory,
            mgmt,
            relays.clone(),
            geo.clone(),
        ));
        let auth = Arc::new(AuthGate::new(throttle.clone(), parts.verifier));
        let logs = Arc::new(LogViewer::new(parts.recent_logs, parts.follow_logs, &config.logs));
        let diagnostics = Arc::new(Diagnostics::new(
            parts.diagnostic_runner,
            config.diagnostics.enabled,
        ));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            geo,
            relays,
            throttle,
            aggregator,
            auth,
            logs,
            diagnostics,
            log_source: parts.log_source,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the background tasks. Calling again while running, or after
    /// [`shutdown`](Self::shutdown), does nothing.
    pub fn start(&self) {
        if *self.shutdown_tx.borrow() {
            warn!("Network state runtime already shut down, not restarting");
            return;
        }
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            return;
        }

        let tailer = LogTailer::new(
            self.log_source.clone(),
            self.relays.clone(),
            &self.config.relay,
        );
        tasks.push(tokio::spawn(tailer.run(self.shutdown_tx.subscribe())));

        let geo = self.geo.clone();
        tasks.push(self.spawn_periodic("geoip-sweep", self.config.geoip.sweep_interval, move || {
            geo.purge_expired();
        }));

        let throttle = self.throttle.clone();
        tasks.push(self.spawn_periodic("login-sweep", self.config.login.sweep_interval, move || {
            throttle.sweep();
        }));

        info!(
            mgmt = %self.config.mgmt.addr,
            relay_window_secs = self.config.relay.staleness_window.as_secs(),
            "Network state runtime started"
        );
    }

    /// Signal every task to stop and wait for them.
    pub async fn shutdown(&self) {
        info!("Stopping network state runtime");
        self.shutdown_tx.send_replace(true);

        let handles = std::mem::take(&mut *self.tasks.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Background task ended abnormally");
            }
        }
        info!("Network state runtime stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    fn spawn_periodic(
        &self,
        name: &'static str,
        period: Duration,
        job: impl Fn() + Send + 'static,
    ) -> JoinHandle<()> {
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => job(),
                }
            }
            debug!(task = name, "Background task stopped");
        })
    }

    pub fn config(&self) -> &NetStateConfig {
        &self.config
    }

    pub fn aggregator(&self) -> Arc<NetworkStateAggregator> {
        Arc::clone(&self.aggregator)
    }

    pub fn auth(&self) -> Arc<AuthGate> {
        Arc::clone(&self.auth)
    }

    pub fn logs(&self) -> Arc<LogViewer> {
        Arc::clone(&self.logs)
    }

    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.diagnostics)
    }

    pub fn geo_cache(&self) -> Arc<GeoCache> {
        Arc::clone(&self.geo)
    }

    pub fn relays(&self) -> Arc<RelayTable> {
        Arc::clone(&self.relays)
    }

    pub fn throttle(&self) -> Arc<LoginThrottle> {
        Arc::clone(&self.throttle)
    }
}
