//! Common Test Utilities
//!
//! Shared helpers, fixtures, and connector stubs for the integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use mongodb::{options::ClientOptions, Client, Database};
use tokio::sync::Notify;
use tower::ServiceExt;

use graphql_service::config::{
    CacheSettings, DatabaseSettings, LoggingSettings, ServerSettings, Settings,
};
use graphql_service::graphql::build_schema;
use graphql_service::infrastructure::cache::RedisCache;
use graphql_service::infrastructure::database::DatabaseConnector;
use graphql_service::infrastructure::pubsub::PubSub;
use graphql_service::presentation::http::create_router;
use graphql_service::shared::error::AppError;
use graphql_service::startup::AppState;

/// Settings pointing at loopback addresses, listening on the given port.
pub fn test_settings(port: u16) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port,
        },
        database: DatabaseSettings {
            url: "mongodb://127.0.0.1:27017".into(),
            name: "graphql-service-test".into(),
            connect_timeout: 5,
        },
        cache: CacheSettings {
            url: "redis://127.0.0.1:6379".into(),
        },
        logging: LoggingSettings {
            error_file: "error.log".into(),
            combined_file: "combined.log".into(),
            connect_failure_severity: "error".into(),
        },
        environment: "test".into(),
    }
}

/// A database handle built without any network traffic.
///
/// The driver connects lazily, so this is safe in stubs that must succeed
/// without a running server.
pub async fn lazy_database() -> Database {
    let options = ClientOptions::parse("mongodb://127.0.0.1:27017")
        .await
        .expect("static URI parses");
    let client = Client::with_options(options).expect("client builds");
    client.database("graphql-service-test")
}

/// Connector that succeeds immediately.
pub struct InstantConnector;

#[async_trait]
impl DatabaseConnector for InstantConnector {
    async fn connect(&self, _settings: &DatabaseSettings) -> Result<Database, AppError> {
        Ok(lazy_database().await)
    }
}

/// Connector that blocks until the gate is notified, then succeeds.
pub struct GatedConnector {
    pub gate: Arc<Notify>,
}

#[async_trait]
impl DatabaseConnector for GatedConnector {
    async fn connect(&self, _settings: &DatabaseSettings) -> Result<Database, AppError> {
        self.gate.notified().await;
        Ok(lazy_database().await)
    }
}

/// Connector that always fails.
pub struct FailingConnector;

#[async_trait]
impl DatabaseConnector for FailingConnector {
    async fn connect(&self, _settings: &DatabaseSettings) -> Result<Database, AppError> {
        Err(AppError::Internal("connection refused".into()))
    }
}

/// Log writer that captures formatted output for assertions.
#[derive(Clone, Default)]
pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl CaptureWriter {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Test application exposing the router without binding a socket.
pub struct TestApp {
    pub router: Router,
    pub pubsub: Arc<PubSub>,
}

impl TestApp {
    /// Build the full router for the given environment.
    pub fn new(environment: &str) -> Self {
        let pubsub = Arc::new(PubSub::new());
        let cache = RedisCache::connect("redis://127.0.0.1:6379").expect("static URL parses");
        let schema = build_schema(Arc::clone(&pubsub), cache.clone());
        let state = AppState {
            schema,
            pubsub: Arc::clone(&pubsub),
            cache,
            environment: environment.to_string(),
        };
        Self {
            router: create_router(state),
            pubsub,
        }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    use http_body_util::BodyExt;

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
