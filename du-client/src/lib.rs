//! Blocking client for the device update test-helper surface
//!
//! This crate provides the few remote calls an end-to-end scenario needs:
//! reading the connection state of a device or of its update-agent module,
//! tagging a device into a device group, and looking up the group as the
//! update service sees it.
//!
//! Scenario code depends on the [`DeviceUpdateService`] trait so it can be
//! exercised against scripted fakes; [`DeviceUpdateTestHelper`] is the HTTP
//! implementation.

mod config;
mod error;
mod helper;
mod http;
pub mod models;

pub use config::{HelperConfig, DEFAULT_ADU_API_VERSION, DEFAULT_HUB_API_VERSION};
pub use error::{ClientError, Result};
pub use helper::DeviceUpdateTestHelper;
pub use models::{AduGroupInfo, ConnectionState, CONNECTED, DEVICE_UPDATE_MODULE_ID};

/// Remote operations used by device update end-to-end scenarios
///
/// Every call is a single blocking request with no retries; errors are
/// returned to the caller as-is.
pub trait DeviceUpdateService {
    /// Hub connection state of a device, e.g. `"Connected"`
    fn get_connection_status(&self, device_id: &str) -> Result<String>;

    /// Hub connection state of one module of a device
    fn get_module_connection_status(&self, device_id: &str, module_id: &str) -> Result<String>;

    /// Tag a device into a device group. `Ok(false)` means the hub refused.
    fn add_device_to_group(&self, device_id: &str, group_id: &str) -> Result<bool>;

    /// Tag a device's module into a device group
    fn add_module_to_group(&self, device_id: &str, module_id: &str, group_id: &str) -> Result<bool>;

    /// Group record, or `None` while the group has not materialized yet
    fn get_group_info(&self, group_id: &str) -> Result<Option<AduGroupInfo>>;
}

impl<S: DeviceUpdateService + ?Sized> DeviceUpdateService for &S {
    fn get_connection_status(&self, device_id: &str) -> Result<String> {
        (**self).get_connection_status(device_id)
    }

    fn get_module_connection_status(&self, device_id: &str, module_id: &str) -> Result<String> {
        (**self).get_module_connection_status(device_id, module_id)
    }

    fn add_device_to_group(&self, device_id: &str, group_id: &str) -> Result<bool> {
        (**self).add_device_to_group(device_id, group_id)
    }

    fn add_module_to_group(
        &self,
        device_id: &str,
        module_id: &str,
        group_id: &str,
    ) -> Result<bool> {
        (**self).add_module_to_group(device_id, module_id, group_id)
    }

    fn get_group_info(&self, group_id: &str) -> Result<Option<AduGroupInfo>> {
        (**self).get_group_info(group_id)
    }
}
