use std::sync::Arc;

use tracing::info;

use mqteam::console::{self, ConsoleRenderer};
use mqteam::{ApiClient, Config, MemoryBroker, SessionManager};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = mqteam::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        mqteam::logging::init_console_only(&config.logging.level);
    }

    info!("MQTeam chat client");
    let api = match ApiClient::new(&config.api) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            eprintln!("Failed to create API client: {e}");
            std::process::exit(1);
        }
    };

    info!(api = %api.base_url(), broker = %config.broker.url, "configured");
    let broker = MemoryBroker::new();

    let mut session = SessionManager::new(
        &config,
        Arc::new(broker),
        api.clone(),
        api,
        Box::new(ConsoleRenderer::stdout()),
    );
    session.bootstrap().await;

    if let Err(e) = console::run(&mut session).await {
        eprintln!("Console error: {e}");
        std::process::exit(1);
    }
}
