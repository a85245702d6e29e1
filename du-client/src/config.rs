//! Endpoint and credential configuration for the test helper

use std::time::Duration;

pub const DEFAULT_HUB_API_VERSION: &str = "2021-04-12";
pub const DEFAULT_ADU_API_VERSION: &str = "2022-10-01";

/// Where the hub registry and the update management API live, and how to
/// authenticate against them
///
/// Tokens are opaque pre-issued bearer tokens; issuing them is out of scope.
#[derive(Clone)]
pub struct HelperConfig {
    pub hub_url: String,
    pub hub_token: String,
    pub hub_api_version: String,
    pub adu_endpoint: String,
    pub adu_instance_id: String,
    pub adu_token: String,
    pub adu_api_version: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl HelperConfig {
    pub fn new(
        hub_url: impl Into<String>,
        hub_token: impl Into<String>,
        adu_endpoint: impl Into<String>,
        adu_instance_id: impl Into<String>,
        adu_token: impl Into<String>,
    ) -> Self {
        Self {
            hub_url: hub_url.into(),
            hub_token: hub_token.into(),
            hub_api_version: DEFAULT_HUB_API_VERSION.to_string(),
            adu_endpoint: adu_endpoint.into(),
            adu_instance_id: adu_instance_id.into(),
            adu_token: adu_token.into(),
            adu_api_version: DEFAULT_ADU_API_VERSION.to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_versions(mut self, hub: impl Into<String>, adu: impl Into<String>) -> Self {
        self.hub_api_version = hub.into();
        self.adu_api_version = adu.into();
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }
}

// Tokens stay out of logs
impl std::fmt::Debug for HelperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelperConfig")
            .field("hub_url", &self.hub_url)
            .field("hub_token", &"<redacted>")
            .field("hub_api_version", &self.hub_api_version)
            .field("adu_endpoint", &self.adu_endpoint)
            .field("adu_instance_id", &self.adu_instance_id)
            .field("adu_token", &"<redacted>")
            .field("adu_api_version", &self.adu_api_version)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}
