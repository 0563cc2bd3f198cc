//! Database Module
//!
//! MongoDB client construction and connectivity checks.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::time::Duration;

use crate::config::DatabaseSettings;
use crate::shared::error::AppError;

/// Seam for establishing the document database connection.
///
/// The production implementation is [`MongoConnector`]; tests substitute
/// their own to observe ordering or inject failures.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    /// Connect and return a handle to the configured database.
    ///
    /// Implementations must not return until connectivity has actually been
    /// observed, so that a success here means the server is reachable.
    async fn connect(&self, settings: &DatabaseSettings) -> Result<Database, AppError>;
}

/// Connects to MongoDB using the official driver.
#[derive(Debug, Default)]
pub struct MongoConnector;

#[async_trait]
impl DatabaseConnector for MongoConnector {
    async fn connect(&self, settings: &DatabaseSettings) -> Result<Database, AppError> {
        let mut options = ClientOptions::parse(&settings.url).await?;
        options.connect_timeout = Some(Duration::from_secs(settings.connect_timeout));
        options.server_selection_timeout = Some(Duration::from_secs(settings.connect_timeout));

        // The driver connects lazily; ping so that reachability is proven
        // before this returns.
        let client = Client::with_options(options)?;
        let database = client.database(&settings.name);
        database.run_command(doc! { "ping": 1 }).await?;

        Ok(database)
    }
}
