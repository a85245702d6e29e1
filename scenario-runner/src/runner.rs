//! One complete run: configure, execute, report
//!
//! A report is written for every run that gets this far, including runs
//! whose configuration could not be parsed or validated. Those are
//! reported as errored test cases in the fallback sink, so CI always finds
//! a result file to collect.

use du_client::{ClientError, DeviceUpdateService, HelperConfig};
use du_poller::Sleeper;
use rand::Rng;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

use crate::config::{Args, ScenarioConfig};
use crate::report::{
    ReportError, ReportSink, TestCaseReport, TestOutcome, TestReport, TEST_CASE_NAME,
    TEST_CLASS_NAME,
};
use crate::scenario::{AddDeviceToGroup, ScenarioError, ScenarioSummary};

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub outcome: TestOutcome,
    pub report_path: PathBuf,
}

/// Validate `args`, run the scenario and write the JUnit report
///
/// `connect` builds the service from the validated helper settings.
/// `fallback` receives the report when `args` never became a usable
/// configuration.
///
/// # Errors
///
/// Only a report that cannot be rendered or written is an error; every
/// scenario outcome, configuration problems included, ends up in the report.
pub fn run_and_report<S, F, Z, R>(
    args: Result<Args, clap::Error>,
    fallback: &ReportSink,
    connect: F,
    sleeper: Z,
    rng: &mut R,
) -> Result<RunOutcome, ReportError>
where
    S: DeviceUpdateService,
    F: FnOnce(&HelperConfig) -> Result<S, ClientError>,
    Z: Sleeper,
    R: Rng,
{
    let started = Instant::now();

    let (sink, result) = match configure(args) {
        Ok(config) => {
            config.log_summary();
            let result = run_scenario(&config, connect, sleeper, rng);
            (config.report, result)
        }
        Err(e) => (fallback.clone(), Err(e)),
    };
    let elapsed = started.elapsed();

    let outcome = TestOutcome::from_result(&result);
    match &outcome {
        TestOutcome::Passed => {
            info!("{} passed in {:.1}s", TEST_CASE_NAME, elapsed.as_secs_f64())
        }
        TestOutcome::Failed(message) => error!("{} failed: {}", TEST_CASE_NAME, message),
        TestOutcome::Errored(message) => error!("{} errored: {}", TEST_CASE_NAME, message),
    }

    let mut report = TestReport::new(TEST_CLASS_NAME);
    report.push(TestCaseReport::new(
        TEST_CLASS_NAME,
        TEST_CASE_NAME,
        outcome.clone(),
        elapsed,
    ));

    let report_path = sink.write(&report)?;
    info!("Wrote test report to {}", report_path.display());

    Ok(RunOutcome {
        outcome,
        report_path,
    })
}

fn configure(args: Result<Args, clap::Error>) -> Result<ScenarioConfig, ScenarioError> {
    let args = args.map_err(|e| ScenarioError::Config(e.to_string().trim_end().to_string()))?;
    ScenarioConfig::try_from(args).map_err(|e| ScenarioError::Config(format!("{:#}", e)))
}

fn run_scenario<S, F, Z, R>(
    config: &ScenarioConfig,
    connect: F,
    sleeper: Z,
    rng: &mut R,
) -> Result<ScenarioSummary, ScenarioError>
where
    S: DeviceUpdateService,
    F: FnOnce(&HelperConfig) -> Result<S, ClientError>,
    Z: Sleeper,
    R: Rng,
{
    let service = connect(&config.helper)?;
    AddDeviceToGroup::new(service, sleeper, &config.settings).run(rng)
}
