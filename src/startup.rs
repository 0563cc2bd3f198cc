//! Application Startup
//!
//! Startup sequencing with observable lifecycle states. The database
//! connection is established first; the listener is bound only after the
//! connection succeeds; the final ready log carries the bound URL.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use mongodb::Database;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::Level;

use crate::config::Settings;
use crate::graphql::{self, AppSchema};
use crate::infrastructure::cache::RedisCache;
use crate::infrastructure::database::{DatabaseConnector, MongoConnector};
use crate::infrastructure::pubsub::PubSub;
use crate::presentation::http;
use crate::shared::error::AppError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub schema: AppSchema,
    pub pubsub: Arc<PubSub>,
    pub cache: RedisCache,
    pub environment: String,
}

/// Observable startup states, in the order the success path enters them.
/// The two `*Failed` states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Initializing,
    DbConnecting,
    DbConnected,
    Listening,
    Ready,
    DbConnectFailed,
    ListenFailed,
}

impl Lifecycle {
    /// Whether this state ends startup without a running server.
    pub fn is_terminal_failure(self) -> bool {
        matches!(self, Lifecycle::DbConnectFailed | Lifecycle::ListenFailed)
    }
}

/// Startup failure, one variant per terminal cause.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("application build failed: {0}")]
    Build(#[source] AppError),

    #[error("database connection failed: {0}")]
    DbConnect(#[source] AppError),

    #[error("listener bind failed: {0}")]
    Listen(#[source] std::io::Error),
}

/// Sequences startup and publishes lifecycle transitions.
///
/// The default connector is [`MongoConnector`]; tests substitute their own
/// via [`Bootstrapper::with_connector`] to observe ordering or inject
/// failures.
pub struct Bootstrapper {
    settings: Settings,
    connector: Arc<dyn DatabaseConnector>,
    lifecycle_tx: watch::Sender<Lifecycle>,
}

impl Bootstrapper {
    pub fn new(settings: Settings) -> Self {
        Self::with_connector(settings, Arc::new(MongoConnector))
    }

    pub fn with_connector(settings: Settings, connector: Arc<dyn DatabaseConnector>) -> Self {
        let (lifecycle_tx, _) = watch::channel(Lifecycle::Initializing);
        Self {
            settings,
            connector,
            lifecycle_tx,
        }
    }

    /// Watch lifecycle transitions as they happen.
    pub fn lifecycle(&self) -> watch::Receiver<Lifecycle> {
        self.lifecycle_tx.subscribe()
    }

    /// Run the startup sequence to completion.
    ///
    /// The database connect attempt finishes, either way, strictly before
    /// any bind is attempted. On failure the matching terminal state is
    /// published and the error is returned; nothing is listening afterwards.
    pub async fn start(self) -> Result<Application, StartupError> {
        let Self {
            settings,
            connector,
            lifecycle_tx,
        } = self;

        // Pure construction: the only awaits in this function are the
        // database connect and the listener bind. The cache connects
        // lazily on first use.
        let pubsub = Arc::new(PubSub::new());
        let cache = RedisCache::connect(&settings.cache.url).map_err(StartupError::Build)?;
        let schema = graphql::build_schema(Arc::clone(&pubsub), cache.clone());
        let state = AppState {
            schema,
            pubsub: Arc::clone(&pubsub),
            cache,
            environment: settings.environment.clone(),
        };
        let router = http::create_router(state);

        lifecycle_tx.send_replace(Lifecycle::DbConnecting);
        let db = match connector.connect(&settings.database).await {
            Ok(db) => {
                tracing::info!("MongoDB connected.");
                lifecycle_tx.send_replace(Lifecycle::DbConnected);
                db
            }
            Err(error) => {
                log_connect_failure(&settings, &error);
                lifecycle_tx.send_replace(Lifecycle::DbConnectFailed);
                return Err(StartupError::DbConnect(error));
            }
        };

        let address = format!("{}:{}", settings.server.host, settings.server.port);
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(error) => {
                tracing::error!(%address, error = %error, "Failed to bind listener");
                lifecycle_tx.send_replace(Lifecycle::ListenFailed);
                return Err(StartupError::Listen(error));
            }
        };
        let url = match listener.local_addr() {
            Ok(addr) => format!("http://{}/", addr),
            Err(error) => {
                tracing::error!(error = %error, "Failed to read bound address");
                lifecycle_tx.send_replace(Lifecycle::ListenFailed);
                return Err(StartupError::Listen(error));
            }
        };
        lifecycle_tx.send_replace(Lifecycle::Listening);

        tracing::info!("Server is running at {}", url);
        lifecycle_tx.send_replace(Lifecycle::Ready);

        Ok(Application {
            listener,
            router,
            db,
            pubsub,
            url,
            lifecycle_tx,
        })
    }
}

/// Log the database connect failure at the configured severity.
///
/// The severity string was validated during settings load.
fn log_connect_failure(settings: &Settings, error: &AppError) {
    let level = settings
        .logging
        .connect_failure_level()
        .unwrap_or(Level::ERROR);
    match level {
        Level::ERROR => tracing::error!(error = %error, "MongoDB connection failed"),
        Level::WARN => tracing::warn!(error = %error, "MongoDB connection failed"),
        Level::INFO => tracing::info!(error = %error, "MongoDB connection failed"),
        Level::DEBUG => tracing::debug!(error = %error, "MongoDB connection failed"),
        Level::TRACE => tracing::trace!(error = %error, "MongoDB connection failed"),
    }
}

/// A fully started application, ready to serve.
#[derive(Debug)]
pub struct Application {
    listener: TcpListener,
    router: Router,
    db: Database,
    pubsub: Arc<PubSub>,
    url: String,
    lifecycle_tx: watch::Sender<Lifecycle>,
}

impl Application {
    /// Run the server until stopped.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        axum::serve(self.listener, self.router).await
    }

    /// The URL the server is reachable at.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the connected database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The process-wide publish/subscribe bus.
    pub fn pubsub(&self) -> &Arc<PubSub> {
        &self.pubsub
    }

    /// Watch lifecycle transitions; the receiver reports `Ready`.
    pub fn lifecycle(&self) -> watch::Receiver<Lifecycle> {
        self.lifecycle_tx.subscribe()
    }
}
