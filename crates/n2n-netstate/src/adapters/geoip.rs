//! GeoIP lookups over HTTP.
//!
//! Speaks the ip-api.com JSON format: `status` is `"success"` or `"fail"`,
//! location fields are `country`, `city`, `isp`.

use crate::domain::config::GeoIpConfig;
use crate::domain::errors::{GeoLookupError, NetStateError};
use crate::domain::types::Location;
use crate::ports::GeoLookup;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    isp: String,
}

impl IpApiResponse {
    fn into_location(self, address: &str) -> Result<Location, GeoLookupError> {
        if self.status != "success" {
            let reason = self.message.unwrap_or_else(|| address.to_string());
            return Err(GeoLookupError::NoData(reason));
        }
        Ok(Location::new(self.country, self.city, self.isp))
    }
}

/// HTTP GeoIP client.
pub struct IpApiLookup {
    client: Client,
    endpoint: String,
    language: String,
}

impl IpApiLookup {
    pub fn new(config: &GeoIpConfig) -> Result<Self, NetStateError> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.request_timeout.min(MAX_CONNECT_TIMEOUT));
        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| NetStateError::GeoClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
        })
    }

    /// Request URL for `address`.
    pub fn url_for(&self, address: &str) -> String {
        let url = self.endpoint.replace("{ip}", address);
        if self.language.is_empty() {
            return url;
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}lang={}", self.language)
    }
}

#[async_trait]
impl GeoLookup for IpApiLookup {
    async fn lookup(&self, address: &str) -> Result<Location, GeoLookupError> {
        let response = self
            .client
            .get(self.url_for(address))
            .send()
            .await
            .map_err(|e| GeoLookupError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoLookupError::Status(status.as_u16()));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| GeoLookupError::Decode(e.to_string()))?;
        body.into_location(address)
    }
}

/// Lookup used when GeoIP is switched off. Every address is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeoLookup;

#[async_trait]
impl GeoLookup for DisabledGeoLookup {
    async fn lookup(&self, _address: &str) -> Result<Location, GeoLookupError> {
        Err(GeoLookupError::NoData("GeoIP disabled".into()))
    }
}
