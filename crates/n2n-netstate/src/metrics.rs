//! # Network State Metrics
//!
//! Prometheus metrics for the management client, GeoIP cache, relay tracker
//! login throttle and diagnostic runner.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! n2n-netstate = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `n2n_mgmt_queries_total` - Management port queries (by outcome)
//! - `n2n_geoip_lookups_total` - GeoIP resolutions (by result: hit, miss, failed, local)
//! - `n2n_geoip_cache_entries` - Gauge of cached GeoIP entries
//! - `n2n_relay_lines_matched_total` - Forwarding lines matched in the journal
//! - `n2n_relay_tailer_restarts_total` - Journal follower restarts
//! - `n2n_relay_active_pairs` - Gauge of relay pairs returned by the last read
//! - `n2n_login_failures_total` - Failed login attempts
//! - `n2n_login_lockouts_total` - Keys that reached the lock threshold
//! - `n2n_login_evictions_total` - Throttle entries evicted (by reason)
//! - `n2n_login_tracked_keys` - Gauge of tracked throttle keys
//! - `n2n_diagnostic_runs_total` - Diagnostic commands run (by tool and outcome)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Management port queries, labeled by outcome
    pub static ref MGMT_QUERIES: IntCounterVec = register_int_counter_vec!(
        "n2n_mgmt_queries_total",
        "Total number of management port queries",
        &["outcome"]
    )
    .expect("Failed to create MGMT_QUERIES metric");

    /// GeoIP resolutions, labeled by result
    pub static ref GEOIP_LOOKUPS: IntCounterVec = register_int_counter_vec!(
        "n2n_geoip_lookups_total",
        "Total number of GeoIP resolutions",
        &["result"]
    )
    .expect("Failed to create GEOIP_LOOKUPS metric");

    pub static ref GEOIP_CACHE_ENTRIES: IntGauge = register_int_gauge!(
        "n2n_geoip_cache_entries",
        "Number of cached GeoIP entries"
    )
    .expect("Failed to create GEOIP_CACHE_ENTRIES metric");

    pub static ref RELAY_LINES_MATCHED: IntCounter = register_int_counter!(
        "n2n_relay_lines_matched_total",
        "Total number of forwarding lines matched"
    )
    .expect("Failed to create RELAY_LINES_MATCHED metric");

    pub static ref RELAY_TAILER_RESTARTS: IntCounter = register_int_counter!(
        "n2n_relay_tailer_restarts_total",
        "Total number of journal follower restarts"
    )
    .expect("Failed to create RELAY_TAILER_RESTARTS metric");

    pub static ref RELAY_ACTIVE_PAIRS: IntGauge = register_int_gauge!(
        "n2n_relay_active_pairs",
        "Relay pairs returned by the last read"
    )
    .expect("Failed to create RELAY_ACTIVE_PAIRS metric");

    pub static ref LOGIN_FAILURES: IntCounter = register_int_counter!(
        "n2n_login_failures_total",
        "Total number of failed login attempts"
    )
    .expect("Failed to create LOGIN_FAILURES metric");

    pub static ref LOGIN_LOCKOUTS: IntCounter = register_int_counter!(
        "n2n_login_lockouts_total",
        "Total number of keys locked out"
    )
    .expect("Failed to create LOGIN_LOCKOUTS metric");

    /// Throttle evictions, labeled by reason (idle, oldest, sweep)
    pub static ref LOGIN_EVICTIONS: IntCounterVec = register_int_counter_vec!(
        "n2n_login_evictions_total",
        "Total number of throttle entries evicted",
        &["reason"]
    )
    .expect("Failed to create LOGIN_EVICTIONS metric");

    pub static ref LOGIN_TRACKED_KEYS: IntGauge = register_int_gauge!(
        "n2n_login_tracked_keys",
        "Number of keys tracked by the login throttle"
    )
    .expect("Failed to create LOGIN_TRACKED_KEYS metric");

    /// Diagnostic commands, labeled by tool and outcome
    pub static ref DIAGNOSTIC_RUNS: IntCounterVec = register_int_counter_vec!(
        "n2n_diagnostic_runs_total",
        "Total number of diagnostic commands run",
        &["tool", "outcome"]
    )
    .expect("Failed to create DIAGNOSTIC_RUNS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_mgmt_query(ok: bool) {
    MGMT_QUERIES
        .with_label_values(&[if ok { "ok" } else { "failed" }])
        .inc();
}

/// Record a GeoIP resolution: `hit`, `miss`, `failed` or `local`
#[cfg(feature = "metrics")]
pub fn record_geoip_lookup(result: &str) {
    GEOIP_LOOKUPS.with_label_values(&[result]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_geoip_cache_entries(entries: usize) {
    GEOIP_CACHE_ENTRIES.set(entries as i64);
}

#[cfg(feature = "metrics")]
pub fn record_relay_line_matched() {
    RELAY_LINES_MATCHED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_tailer_restart() {
    RELAY_TAILER_RESTARTS.inc();
}

#[cfg(feature = "metrics")]
pub fn set_active_relay_pairs(pairs: usize) {
    RELAY_ACTIVE_PAIRS.set(pairs as i64);
}

#[cfg(feature = "metrics")]
pub fn record_login_failure() {
    LOGIN_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_login_lockout() {
    LOGIN_LOCKOUTS.inc();
}

/// Record throttle evictions: `idle`, `oldest` or `sweep`
#[cfg(feature = "metrics")]
pub fn record_login_evictions(reason: &str, count: usize) {
    LOGIN_EVICTIONS
        .with_label_values(&[reason])
        .inc_by(count as u64);
}

#[cfg(feature = "metrics")]
pub fn set_login_tracked_keys(keys: usize) {
    LOGIN_TRACKED_KEYS.set(keys as i64);
}

#[cfg(feature = "metrics")]
pub fn record_diagnostic_run(tool: &str, ok: bool) {
    DIAGNOSTIC_RUNS
        .with_label_values(&[tool, if ok { "ok" } else { "failed" }])
        .inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_mgmt_query(_ok: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn record_geoip_lookup(_result: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_geoip_cache_entries(_entries: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_relay_line_matched() {}

#[cfg(not(feature = "metrics"))]
pub fn record_tailer_restart() {}

#[cfg(not(feature = "metrics"))]
pub fn set_active_relay_pairs(_pairs: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_login_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_login_lockout() {}

#[cfg(not(feature = "metrics"))]
pub fn record_login_evictions(_reason: &str, _count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_login_tracked_keys(_keys: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_diagnostic_run(_tool: &str, _ok: bool) {}
