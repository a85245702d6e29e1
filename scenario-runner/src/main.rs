use clap::error::ErrorKind;
use clap::Parser;
use du_client::DeviceUpdateTestHelper;
use du_poller::ThreadSleeper;
use std::process::ExitCode;
use tracing::error;

use scenario_runner::logging;
use scenario_runner::{run_and_report, Args, ReportSink};

fn main() -> ExitCode {
    if let Err(e) = logging::init_logging_from_env() {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let args = match Args::try_parse() {
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        other => other,
    };

    // Report location for runs whose configuration is unusable
    let fallback = ReportSink::from_env();

    match run_and_report(
        args,
        &fallback,
        DeviceUpdateTestHelper::new,
        ThreadSleeper,
        &mut rand::thread_rng(),
    ) {
        Ok(run) if run.outcome.is_passed() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
