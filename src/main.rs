//! # GraphQL Service
//!
//! Application entry point that initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - Database connection
//! - HTTP server with GraphQL endpoint and subscriptions

use anyhow::Result;
use tracing::info;

use graphql_service::config::Settings;
use graphql_service::startup::Bootstrapper;
use graphql_service::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Settings come first; the log sinks are part of the configuration.
    let settings = Settings::load()?;
    telemetry::init_tracing(&settings.logging, &settings.environment)?;

    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // A terminal startup failure has already been logged once at the
    // configured severity; returning the error exits non-zero.
    let application = Bootstrapper::new(settings).start().await?;

    application.run_until_stopped().await?;

    Ok(())
}
