use std::process::ExitCode;

use overworld_engine::run_overworld;
use tracing::error;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_overworld(app.config, app.overworld, &app.start_map) {
        error!(error = %err, "overworld_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
