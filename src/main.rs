//! StudyHub portal - Entry Point
//!
//! Serves a university → semester → course catalog of study resources.

use log::{info, warn};
use std::process::ExitCode;
use std::sync::Arc;

use studyhub::auth::ConfiguredAdmin;
use studyhub::error::PortalError;
use studyhub::error::handlers::handle_error;
use studyhub::{CatalogService, PortalConfig, Server};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching StudyHub portal...");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            handle_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), PortalError> {
    let config = PortalConfig::load()?;

    let service = CatalogService::from_config(&config);
    if let Some(warning) = service.startup_warning() {
        warn!("{}", warning);
    }
    if config.admin_password.is_none() {
        warn!("STUDYHUB_ADMIN_PASSWORD is not set; admin login is disabled");
    }

    let auth = Arc::new(ConfiguredAdmin::from_config(&config));
    let server = Server::bind(config, service, auth).await?;
    server.start().await;
    Ok(())
}
