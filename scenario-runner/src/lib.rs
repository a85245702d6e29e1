//! End-to-end scenario: add a device to a device update group
//!
//! The scenario waits for the device to connect, tags it into a device
//! group, waits for the group to materialize on the update service and
//! checks that it contains the device. Results are written as a JUnit
//! report for the CI pipeline.
//!
//! All waiting goes through [`du_poller`], so scenario logic can be driven
//! by scripted services and a recording sleeper in tests.

pub mod assertions;
pub mod config;
pub mod logging;
pub mod report;
pub mod runner;
pub mod scenario;

pub use assertions::AssertionFailure;
pub use config::{Args, ConfigMethod, ScenarioConfig, ScenarioSettings};
pub use report::{ReportSink, TestCaseReport, TestOutcome, TestReport};
pub use runner::{run_and_report, RunOutcome};
pub use scenario::{AddDeviceToGroup, ScenarioError, ScenarioSummary};
