use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use admitboard::app::App;
use admitboard::cli::Args;
use admitboard::logging::setup_logging;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config and set up logging before App::new() so startup logs are
    // never silently dropped.
    let early_config = App::load_config().expect("Failed to load config for logging setup");
    setup_logging(&early_config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        "starting admitboard"
    );

    let app = match App::new().await {
        Ok(app) => app,
        Err(err) => {
            error!(error = ?err, "failed to initialize application");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = app.run(&args.command).await {
        error!(error = ?err, "command failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
