//! Test-helper operations against the hub registry and update service

use tracing::{info, warn};

use crate::config::HelperConfig;
use crate::error::Result;
use crate::http::{Endpoint, JsonClient};
use crate::models::{AduGroupInfo, GroupTagPatch, RegistryIdentity};
use crate::DeviceUpdateService;

/// Client for the handful of remote calls the end-to-end scenarios need
///
/// Connectivity and group tagging go through the hub registry; group
/// lookups go through the update management API.
#[derive(Debug, Clone)]
pub struct DeviceUpdateTestHelper {
    http: JsonClient,
    hub: Endpoint,
    adu: Endpoint,
    instance_id: String,
}

impl DeviceUpdateTestHelper {
    /// Create a helper from endpoint configuration
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if either endpoint is not a usable base URL.
    pub fn new(config: &HelperConfig) -> Result<Self> {
        Ok(Self {
            http: JsonClient::new(config.connect_timeout, config.read_timeout),
            hub: Endpoint::new(&config.hub_url, &config.hub_api_version, &config.hub_token)?,
            adu: Endpoint::new(&config.adu_endpoint, &config.adu_api_version, &config.adu_token)?,
            instance_id: config.adu_instance_id.clone(),
        })
    }

    fn tag_twin(&self, segments: &[&str], group_id: &str) -> Result<bool> {
        let status = self.http.patch(&self.hub, segments, &GroupTagPatch::new(group_id))?;
        let accepted = (200..300).contains(&status);
        if accepted {
            info!(twin = ?segments, group_id, "group tag applied");
        } else {
            warn!(twin = ?segments, group_id, status, "hub rejected group tag");
        }
        Ok(accepted)
    }
}

impl DeviceUpdateService for DeviceUpdateTestHelper {
    fn get_connection_status(&self, device_id: &str) -> Result<String> {
        let identity: RegistryIdentity = self.http.get(&self.hub, &["devices", device_id])?;
        Ok(identity.connection_state)
    }

    fn get_module_connection_status(&self, device_id: &str, module_id: &str) -> Result<String> {
        let identity: RegistryIdentity = self
            .http
            .get(&self.hub, &["devices", device_id, "modules", module_id])?;
        Ok(identity.connection_state)
    }

    fn add_device_to_group(&self, device_id: &str, group_id: &str) -> Result<bool> {
        self.tag_twin(&["twins", device_id], group_id)
    }

    fn add_module_to_group(
        &self,
        device_id: &str,
        module_id: &str,
        group_id: &str,
    ) -> Result<bool> {
        self.tag_twin(&["twins", device_id, "modules", module_id], group_id)
    }

    fn get_group_info(&self, group_id: &str) -> Result<Option<AduGroupInfo>> {
        self.http.get_optional(
            &self.adu,
            &["deviceupdate", self.instance_id.as_str(), "management", "groups", group_id],
        )
    }
}
