//! Test utilities for network state.
//!
//! Deterministic doubles for every driven port. Enable with the `test-utils`
//! feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use n2n_netstate::test_utils::ManualTimeSource;
//! use n2n_netstate::TimeSource;
//! use std::time::Duration;
//!
//! let clock = ManualTimeSource::new(1_000);
//! clock.advance(Duration::from_secs(2));
//! assert_eq!(clock.now().as_millis(), 3_000);
//! ```

use crate::domain::diagnostics::{DiagnosticOutput, DiagnosticTool};
use crate::domain::errors::{DiagnosticError, GeoLookupError, LogSourceError, MgmtError};
use crate::domain::types::{HardwareAddr, Location, PeerRecord, Timestamp};
use crate::ports::{
    ControlTransport, CredentialVerifier, DiagnosticRunner, GeoLookup, LogSource, LogStream,
    PeerSource, TimeSource,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    millis: AtomicU64,
}

impl ManualTimeSource {
    /// Start at `millis` since the epoch.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// GeoIP lookup that answers from memory and counts calls per address.
#[derive(Debug, Default)]
pub struct MockGeoLookup {
    calls: Mutex<HashMap<String, usize>>,
    failing: AtomicBool,
    no_data: Mutex<HashSet<String>>,
}

impl MockGeoLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every lookup fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make lookups of `address` answer "no data".
    pub fn set_no_data(&self, address: &str) {
        self.no_data.lock().insert(address.to_string());
    }

    /// Total lookups performed
    pub fn calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub fn calls_for(&self, address: &str) -> usize {
        self.calls.lock().get(address).copied().unwrap_or(0)
    }

    /// Location returned for `address` on success.
    pub fn location_for(address: &str) -> Location {
        Location::new("Testland", format!("City of {address}"), "Test ISP")
    }
}

#[async_trait]
impl GeoLookup for MockGeoLookup {
    async fn lookup(&self, address: &str) -> Result<Location, GeoLookupError> {
        *self.calls.lock().entry(address.to_string()).or_insert(0) += 1;

        if self.failing.load(Ordering::SeqCst) {
            return Err(GeoLookupError::Transport("connection refused".into()));
        }
        if self.no_data.lock().contains(address) {
            return Err(GeoLookupError::NoData(address.to_string()));
        }
        Ok(Self::location_for(address))
    }
}

/// Peer source serving a fixed map, or failing on demand.
#[derive(Debug, Default)]
pub struct StaticPeerSource {
    peers: Mutex<HashMap<HardwareAddr, PeerRecord>>,
    unreachable: AtomicBool,
}

impl StaticPeerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_peers(peers: impl IntoIterator<Item = PeerRecord>) -> Self {
        let source = Self::new();
        source.set_peers(peers);
        source
    }

    pub fn set_peers(&self, peers: impl IntoIterator<Item = PeerRecord>) {
        *self.peers.lock() = peers
            .into_iter()
            .map(|p| (p.hardware_addr.clone(), p))
            .collect();
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Shorthand for a peer record.
    pub fn peer(mac: &str, internal: &str, external: &str) -> PeerRecord {
        PeerRecord {
            hardware_addr: HardwareAddr::canonical(mac),
            internal: internal.to_string(),
            external: external.to_string(),
            last_seen: 0,
        }
    }
}

#[async_trait]
impl PeerSource for StaticPeerSource {
    async fn query_peers(&self) -> Result<HashMap<HardwareAddr, PeerRecord>, MgmtError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(MgmtError::Timeout(Duration::from_secs(1)));
        }
        Ok(self.peers.lock().clone())
    }
}

/// Control transport with a canned response; records the commands sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    response: Mutex<Option<String>>,
    commands: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Mutex::new(Some(response.into())),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// A transport whose every exchange fails.
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl ControlTransport for ScriptedTransport {
    async fn exchange(&self, command: &str) -> Result<String, MgmtError> {
        self.commands.lock().push(command.to_string());
        self.response.lock().clone().ok_or_else(|| {
            MgmtError::Receive(std::io::Error::from(std::io::ErrorKind::ConnectionRefused))
        })
    }
}

type LogSender = mpsc::UnboundedSender<Result<String, LogSourceError>>;
type LogReceiver = mpsc::UnboundedReceiver<Result<String, LogSourceError>>;

/// Log source fed through channels.
///
/// Each [`push_session`](Self::push_session) queues one stream for the next
/// `open()`. Dropping the returned sender ends that stream. With nothing
/// queued, `open()` fails.
#[derive(Debug, Default)]
pub struct ChannelLogSource {
    sessions: Mutex<VecDeque<LogReceiver>>,
    opens: AtomicUsize,
}

impl ChannelLogSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_session(&self) -> LogSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.lock().push_back(rx);
        tx
    }

    /// Number of `open()` calls so far, failed ones included.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSource for ChannelLogSource {
    async fn open(&self) -> Result<LogStream, LogSourceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let rx = self
            .sessions
            .lock()
            .pop_front()
            .ok_or(LogSourceError::NoOutput)?;
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

/// Accepts exactly one account/password pair.
#[derive(Debug, Clone)]
pub struct StaticVerifier {
    account: String,
    password: String,
}

impl StaticVerifier {
    pub fn new(account: &str, password: &str) -> Self {
        Self {
            account: account.to_string(),
            password: password.to_string(),
        }
    }
}

impl CredentialVerifier for StaticVerifier {
    fn verify(&self, account: &str, password: &str) -> bool {
        account == self.account && password == self.password
    }
}

/// Diagnostic runner that records each run and answers with canned output.
#[derive(Debug, Default)]
pub struct RecordingDiagnosticRunner {
    runs: Mutex<Vec<(DiagnosticTool, String)>>,
    missing: AtomicBool,
}

impl RecordingDiagnosticRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every run fail as if the tool were not installed.
    pub fn set_missing(&self, missing: bool) {
        self.missing.store(missing, Ordering::SeqCst);
    }

    pub fn runs(&self) -> Vec<(DiagnosticTool, String)> {
        self.runs.lock().clone()
    }
}

#[async_trait]
impl DiagnosticRunner for RecordingDiagnosticRunner {
    async fn run(
        &self,
        tool: DiagnosticTool,
        target: &str,
    ) -> Result<DiagnosticOutput, DiagnosticError> {
        self.runs.lock().push((tool, target.to_string()));
        if self.missing.load(Ordering::SeqCst) {
            return Err(DiagnosticError::Spawn {
                program: tool.program().to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        Ok(DiagnosticOutput::success(format!("{tool} {target}: ok\n")))
    }
}
