//! Scenario configuration from the process environment
//!
//! Every setting is read from an environment variable and can also be
//! given as a command line flag, which wins over the environment.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use du_client::{HelperConfig, DEFAULT_ADU_API_VERSION, DEFAULT_HUB_API_VERSION};
use du_poller::PollConfig;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::report::{ReportSink, DEFAULT_RESULTS_DIR};

/// Add a device to a device update group and verify the group sees it
#[derive(Parser, Debug, Clone)]
#[command(name = "add-device-to-group")]
#[command(about = "Tag a device into a device update group and verify membership")]
#[command(version, args_override_self = true)]
pub struct Args {
    /// Device under test
    #[arg(long, env = "DU_TEST_DEVICE_ID")]
    pub device_id: String,

    /// Device group to add the device to
    #[arg(long, env = "DU_TEST_ADU_GROUP")]
    pub adu_group: String,

    /// How the agent was provisioned; "AIS" means it connects as a module
    #[arg(long, env = "DU_TEST_CONFIG_METHOD", default_value = "")]
    pub config_method: String,

    /// Attempts for each poll (connectivity, group membership)
    #[arg(long, env = "DU_TEST_CONNECTION_TIMEOUT_TRIES", default_value_t = 10)]
    pub connection_timeout_tries: u32,

    /// Seconds between poll attempts
    #[arg(
        long,
        env = "DU_RETRY_WAIT_TIME_IN_SECONDS",
        default_value_t = 60.0,
        allow_negative_numbers = true
    )]
    pub retry_wait_time_in_seconds: f64,

    /// Prefix for the JUnit report file name
    #[arg(long, env = "DU_TEST_RESULT_FILE_PREFIX", default_value = "")]
    pub result_file_prefix: String,

    /// Directory the JUnit report is written to
    #[arg(long, env = "DU_TEST_RESULTS_DIR", default_value = DEFAULT_RESULTS_DIR)]
    pub results_dir: PathBuf,

    /// Lower bound of the random wait before polling the group, in minutes
    #[arg(long, env = "DU_GROUP_PROPAGATION_DELAY_MIN_MINUTES", default_value_t = 2)]
    pub propagation_delay_min_minutes: u64,

    /// Upper bound of the random wait before polling the group, in minutes
    #[arg(long, env = "DU_GROUP_PROPAGATION_DELAY_MAX_MINUTES", default_value_t = 5)]
    pub propagation_delay_max_minutes: u64,

    /// Number of devices the group must contain
    #[arg(long, env = "DU_EXPECTED_DEVICE_COUNT", default_value_t = 1)]
    pub expected_device_count: u64,

    /// Hub registry base URL
    #[arg(long, env = "IOTHUB_URL")]
    pub hub_url: String,

    /// Bearer token for the hub registry
    #[arg(long, env = "IOTHUB_TOKEN", hide_env_values = true)]
    pub hub_token: String,

    #[arg(long, env = "IOTHUB_API_VERSION", default_value = DEFAULT_HUB_API_VERSION)]
    pub hub_api_version: String,

    /// Device update account endpoint
    #[arg(long, env = "ADU_ENDPOINT")]
    pub adu_endpoint: String,

    /// Device update instance name
    #[arg(long, env = "ADU_INSTANCE_ID")]
    pub adu_instance_id: String,

    /// Bearer token for the device update management API
    #[arg(long, env = "ADU_TOKEN", hide_env_values = true)]
    pub adu_token: String,

    #[arg(long, env = "ADU_API_VERSION", default_value = DEFAULT_ADU_API_VERSION)]
    pub adu_api_version: String,
}

/// How the update agent is provisioned on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMethod {
    /// Agent connects as the `IoTHubDeviceUpdate` module
    Ais,
    /// Agent connects as the device itself
    Device,
}

impl ConfigMethod {
    pub fn parse(raw: &str) -> Self {
        if raw == "AIS" {
            ConfigMethod::Ais
        } else {
            ConfigMethod::Device
        }
    }
}

/// What the scenario does, independent of where the service lives
#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub device_id: String,
    pub group_id: String,
    pub config_method: ConfigMethod,
    pub poll: PollConfig,
    pub propagation_delay_minutes: RangeInclusive<u64>,
    pub expected_device_count: u64,
}

/// Validated configuration for one run
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub settings: ScenarioSettings,
    pub helper: HelperConfig,
    pub report: ReportSink,
}

impl TryFrom<Args> for ScenarioConfig {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        if args.device_id.trim().is_empty() {
            return Err(anyhow!("Device id must not be empty"));
        }

        if args.adu_group.trim().is_empty() {
            return Err(anyhow!("Device group must not be empty"));
        }

        if args.propagation_delay_min_minutes > args.propagation_delay_max_minutes {
            return Err(anyhow!(
                "Invalid propagation delay window: min ({}) > max ({})",
                args.propagation_delay_min_minutes,
                args.propagation_delay_max_minutes
            ));
        }

        let poll = PollConfig::from_secs_f64(
            args.connection_timeout_tries,
            args.retry_wait_time_in_seconds,
        )
        .context("Invalid DU_TEST_CONNECTION_TIMEOUT_TRIES / DU_RETRY_WAIT_TIME_IN_SECONDS")?;

        let helper = HelperConfig::new(
            args.hub_url,
            args.hub_token,
            args.adu_endpoint,
            args.adu_instance_id,
            args.adu_token,
        )
        .with_api_versions(args.hub_api_version, args.adu_api_version);

        Ok(Self {
            settings: ScenarioSettings {
                device_id: args.device_id,
                group_id: args.adu_group,
                config_method: ConfigMethod::parse(&args.config_method),
                poll,
                propagation_delay_minutes: args.propagation_delay_min_minutes
                    ..=args.propagation_delay_max_minutes,
                expected_device_count: args.expected_device_count,
            },
            helper,
            report: ReportSink::new(args.results_dir, args.result_file_prefix),
        })
    }
}

impl ScenarioConfig {
    /// Log the effective configuration, without secrets
    pub fn log_summary(&self) {
        let settings = &self.settings;
        info!("Configuration:");
        info!("  Device: {}", settings.device_id);
        info!("  Group: {}", settings.group_id);
        info!("  Config method: {:?}", settings.config_method);
        info!("  Poll attempts: {}", settings.poll.max_attempts());
        info!("  Poll interval: {:?}", settings.poll.interval());
        info!(
            "  Propagation delay: {}-{} min",
            settings.propagation_delay_minutes.start(),
            settings.propagation_delay_minutes.end()
        );
        info!("  Longest poll wait: {:?}", self.max_poll_wait());
        info!("  Hub: {}", self.helper.hub_url);
        info!(
            "  Update endpoint: {} ({})",
            self.helper.adu_endpoint, self.helper.adu_instance_id
        );
        info!("  Report: {}", self.report.file_path().display());
    }

    /// Longest the two polls can spend sleeping, excluding the propagation wait
    pub fn max_poll_wait(&self) -> Duration {
        self.settings.poll.max_wait().saturating_mul(2)
    }
}
