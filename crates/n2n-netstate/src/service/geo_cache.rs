//! Bounded, TTL-expiring cache in front of a [`GeoLookup`].
//!
//! The lock covers only map reads and writes. The outbound lookup runs with
//! the lock released, so two concurrent misses for one address may both
//! reach the service; the later insert wins.

use crate::domain::config::GeoIpConfig;
use crate::domain::errors::GeoLookupError;
use crate::domain::types::{Location, Timestamp};
use crate::metrics;
use crate::ports::{GeoLookup, TimeSource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    location: Location,
    created_at: Timestamp,
}

pub struct GeoCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    lookup: Arc<dyn GeoLookup>,
    clock: Arc<dyn TimeSource>,
    ttl: Duration,
    max_entries: usize,
}

impl GeoCache {
    pub fn new(
        lookup: Arc<dyn GeoLookup>,
        clock: Arc<dyn TimeSource>,
        ttl: Duration,
        max_entries: usize,
    ) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            lookup,
            clock,
            ttl,
            max_entries,
        }
    }

    pub fn from_config(
        config: &GeoIpConfig,
        lookup: Arc<dyn GeoLookup>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self::new(lookup, clock, config.ttl, config.max_entries)
    }

    /// Location of `address`. Never fails.
    ///
    /// Local addresses short-circuit without touching the cache. Failed
    /// lookups return a sentinel that is not cached.
    pub async fn resolve(&self, address: &str) -> Location {
        let address = address.trim();
        if is_local_address(address) {
            metrics::record_geoip_lookup("local");
            return Location::local();
        }

        {
            let now = self.clock.now();
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.get(address) {
                if now.duration_since(entry.created_at) < self.ttl {
                    metrics::record_geoip_lookup("hit");
                    return entry.location.clone();
                }
                debug!(address, "GeoIP entry expired");
                entries.remove(address);
            }
        }

        match self.lookup.lookup(address).await {
            Ok(location) => {
                metrics::record_geoip_lookup("miss");
                self.insert(address, location.clone());
                location
            }
            Err(GeoLookupError::Transport(e)) => {
                metrics::record_geoip_lookup("failed");
                warn!(address, error = %e, "GeoIP lookup failed");
                Location::lookup_failed()
            }
            Err(e) => {
                metrics::record_geoip_lookup("failed");
                debug!(address, error = %e, "GeoIP lookup returned no location");
                Location::unknown()
            }
        }
    }

    /// Remove every entry older than the TTL. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.created_at) < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "Purged expired GeoIP entries");
        }
        metrics::set_geoip_cache_entries(entries.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// True if `address` is cached, expired or not.
    pub fn contains(&self, address: &str) -> bool {
        self.entries.lock().contains_key(address)
    }

    fn insert(&self, address: &str, location: Location) {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        if !entries.contains_key(address) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(addr, _)| addr.clone());
            if let Some(oldest) = oldest {
                debug!(evicted = %oldest, "GeoIP cache full, evicting oldest entry");
                entries.remove(&oldest);
            }
        }

        entries.insert(
            address.to_string(),
            CacheEntry {
                location,
                created_at: now,
            },
        );
        metrics::set_geoip_cache_entries(entries.len());
    }
}

/// Empty, loopback, private, link-local or unspecified.
///
/// Unparsable text is not local; it goes to the lookup like any address.
pub fn is_local_address(address: &str) -> bool {
    if address.is_empty() {
        return true;
    }
    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        Ok(IpAddr::V6(v6)) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_local_address(&v4.to_string());
            }
            // unique local fc00::/7, link-local fe80::/10
            let segments = v6.segments();
            v6.is_loopback()
                || v6.is_unspecified()
                || (segments[0] & 0xfe00) == 0xfc00
                || (segments[0] & 0xffc0) == 0xfe80
        }
        Err(_) => false,
    }
}
