use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use decision_impact_simulator::{
    analysis::{AnalysisRequester, DecisionSimulator},
    backend::{backends_from_config, ChatClient},
    cli::{self, Cli, Commands},
    config::{Config, LogFormat},
    server::{self, AppState},
    storage::SqliteStorage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        primary = %config.models.primary,
        fallback = %config.models.fallback,
        "Decision Impact Simulator starting..."
    );

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    // Initialize inference client
    let client = match ChatClient::new(&config.provider, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.provider.base_url, "Inference client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize inference client");
            return Err(e.into());
        }
    };

    let requester = AnalysisRequester::new(
        backends_from_config(&config.models, &client),
        config.policy.clone(),
    );
    let simulator = DecisionSimulator::new(requester, Arc::new(storage.clone()));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = Arc::new(AppState::new(simulator));
            if let Err(e) = server::serve(state, &config.server).await {
                error!(error = %e, "Server error");
                return Err(e.into());
            }
            info!("Server shutdown complete");
        }
        Commands::Analyze {
            decision,
            constraints,
            no_save,
        } => {
            let result = cli::execute_analyze(&simulator, decision, constraints, no_save).await;
            exit_with(result);
        }
        Commands::History { limit } => {
            let result = cli::execute_history(&storage, limit).await;
            exit_with(result);
        }
    }

    Ok(())
}

fn exit_with(result: cli::CliResult) {
    if result.exit_code == 0 {
        println!("{}", result.message);
    } else {
        eprintln!("{}", result.message);
        std::process::exit(result.exit_code);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
