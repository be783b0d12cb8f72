// The binary uses the library, not duplicate modules
use clap::Parser;
use std::process::ExitCode;
use transport_roads::Settings;

fn main() -> ExitCode {
    transport_roads::setup_logging_and_profiling();
    transport_roads::log_version_info();

    let settings = Settings::parse();

    match transport_roads::run(&settings, &mut std::io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
