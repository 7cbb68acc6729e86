use std::io::Write;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use flvsync_core::config::AppConfig;
use flvsync_core::Snapshot;
use flvsync_runtime::Runtime;

const DEFAULT_FILTER: &str = "flvsync=info,flvsync_api=info,flvsync_runtime=info";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %AppConfig::config_path().display(), "Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match Runtime::new(&config) {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.validate().await {
        Ok(profile) => tracing::info!(profile = %profile, "Credentials accepted"),
        Err(e) => {
            tracing::error!("Credential check failed: {e}");
            return ExitCode::FAILURE;
        }
    }

    tracing::info!(interval = ?runtime.interval(), "Refreshing watch progress");
    runtime
        .run_until(
            async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C, running until killed: {e}");
                    std::future::pending::<()>().await;
                }
            },
            print_sensor_states,
        )
        .await;

    ExitCode::SUCCESS
}

fn print_sensor_states(snapshot: &Snapshot) {
    let mut out = std::io::stdout().lock();
    for state in snapshot.sensor_states() {
        match serde_json::to_string(&state) {
            Ok(line) => {
                let _ = writeln!(out, "{line}");
            }
            Err(e) => tracing::warn!(sensor = %state.unique_id, "Failed to encode sensor state: {e}"),
        }
    }
    let _ = out.flush();
}
