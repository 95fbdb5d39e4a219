use std::process::ExitCode;

use cornlet::logging::init_tracing;
use cornlet::{AppRegistry, CORNLET_VERSION, WorkerConfig, run_worker};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    info!("cornlet {}", CORNLET_VERSION);

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let registry = AppRegistry::builtin();
    match run_worker(config, &registry).await {
        Ok(disconnect) if disconnect.is_error() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Worker failed to start");
            ExitCode::FAILURE
        }
    }
}
