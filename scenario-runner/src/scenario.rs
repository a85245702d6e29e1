//! The "add device to group" end-to-end scenario
//!
//! Phases:
//! 1. wait for the device (or its update-agent module) to connect
//! 2. tag it into the target device group
//! 3. wait out the service's group-operation throttle
//! 4. poll until the group materializes, then check its contents

use du_client::{
    AduGroupInfo, ClientError, ConnectionState, DeviceUpdateService, DEVICE_UPDATE_MODULE_ID,
};
use du_poller::{BoundedPoller, PollResult, Sleeper};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::assertions::{self, AssertionFailure};
use crate::config::{ConfigMethod, ScenarioSettings};

/// Why a scenario run did not pass
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The service behaved, but not as expected
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// A remote call failed; the run was aborted without retrying
    #[error("Service call failed: {0}")]
    Service(#[from] ClientError),

    /// The run could not start because its settings were unusable
    #[error("Invalid scenario configuration: {0}")]
    Config(String),
}

/// What a passing run observed
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSummary {
    pub connection_status: String,
    pub propagation_delay: Duration,
    pub group: AduGroupInfo,
}

/// One run of the scenario against a service, with an injectable sleeper
pub struct AddDeviceToGroup<'a, S, Z> {
    service: S,
    sleeper: Z,
    settings: &'a ScenarioSettings,
}

impl<'a, S: DeviceUpdateService, Z: Sleeper> AddDeviceToGroup<'a, S, Z> {
    pub fn new(service: S, sleeper: Z, settings: &'a ScenarioSettings) -> Self {
        Self {
            service,
            sleeper,
            settings,
        }
    }

    /// Run every phase in order, stopping at the first failure
    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<ScenarioSummary, ScenarioError> {
        info!(
            device_id = %self.settings.device_id,
            group_id = %self.settings.group_id,
            "Starting add-device-to-group scenario"
        );

        info!("Phase 1: Waiting for device connection...");
        let connection_status = self.wait_for_connection()?;

        info!(
            "ADU Group for device:: {} Group:: {}",
            self.settings.device_id, self.settings.group_id
        );

        info!("Phase 2: Adding device to group...");
        self.add_to_group()?;

        info!("Phase 3: Waiting for group propagation...");
        let propagation_delay = self.wait_for_propagation(rng);

        info!("Phase 4: Verifying group membership...");
        let group = self.verify_group_membership()?;

        info!("Scenario passed");
        Ok(ScenarioSummary {
            connection_status,
            propagation_delay,
            group,
        })
    }

    fn poller(&self, label: &str) -> BoundedPoller<&Z> {
        BoundedPoller::with_sleeper(self.settings.poll, &self.sleeper).label(label)
    }

    fn connection_status(&self) -> Result<String, ClientError> {
        match self.settings.config_method {
            ConfigMethod::Ais => self
                .service
                .get_module_connection_status(&self.settings.device_id, DEVICE_UPDATE_MODULE_ID),
            ConfigMethod::Device => self.service.get_connection_status(&self.settings.device_id),
        }
    }

    /// Poll connectivity, then assert the last status seen is "Connected"
    pub fn wait_for_connection(&self) -> Result<String, ScenarioError> {
        let result = self.poller("connectivity").poll_until(
            |_| self.connection_status().map(Some),
            |status| ConnectionState::from(status.as_str()).is_connected(),
        )?;

        let status = result.into_value().unwrap_or_default();
        assertions::assert_eq(
            "connection status",
            ConnectionState::Connected.as_str(),
            status.as_str(),
        )?;
        Ok(status)
    }

    /// Tag the device (or its module under AIS) into the group
    pub fn add_to_group(&self) -> Result<(), ScenarioError> {
        let settings = self.settings;
        let added = match settings.config_method {
            ConfigMethod::Ais => self.service.add_module_to_group(
                &settings.device_id,
                DEVICE_UPDATE_MODULE_ID,
                &settings.group_id,
            )?,
            ConfigMethod::Device => self
                .service
                .add_device_to_group(&settings.device_id, &settings.group_id)?,
        };

        assertions::assert_true("add to group", added)?;
        Ok(())
    }

    /// Sleep a random whole number of minutes from the configured window
    ///
    /// Group creation is throttled to 6 operations per minute.
    pub fn wait_for_propagation<R: Rng>(&self, rng: &mut R) -> Duration {
        let window = &self.settings.propagation_delay_minutes;
        let minutes = if window.is_empty() {
            *window.start()
        } else {
            rng.gen_range(window.clone())
        };
        let delay = Duration::from_secs(minutes.saturating_mul(60));

        info!("Waiting {} minute(s) before checking group membership", minutes);
        if !delay.is_zero() {
            self.sleeper.sleep(delay);
        }
        delay
    }

    /// Poll until the group exists, then check the first record seen
    pub fn verify_group_membership(&self) -> Result<AduGroupInfo, ScenarioError> {
        let group_id = &self.settings.group_id;
        let result = self
            .poller("group-membership")
            .poll(|_| self.service.get_group_info(group_id))?;

        let group = match result {
            PollResult::Success(group) => group,
            PollResult::TimedOut(_) => {
                warn!(%group_id, "Group never appeared");
                return Err(AssertionFailure::new(format!(
                    "group {:?} did not appear after {} attempt(s)",
                    group_id,
                    self.settings.poll.max_attempts()
                ))
                .into());
            }
        };

        assertions::assert_eq(
            "group device count",
            &self.settings.expected_device_count,
            &group.device_count,
        )?;
        assertions::assert_eq("group id", group_id.as_str(), group.group_id.as_str())?;
        Ok(group)
    }
}
