//! Telemetry and Observability
//!
//! Structured logging setup: a JSON file sink for errors, a JSON file sink
//! for everything at info and above, and a human-readable console sink that
//! is active only outside production.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    filter::LevelFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{LoggingSettings, PRODUCTION_ENV};

/// A log destination selected for the current environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// JSON lines, level >= ERROR
    ErrorFile,
    /// JSON lines, level >= INFO
    CombinedFile,
    /// Simple human-readable formatting
    Console,
}

/// Decide which sinks are active for the given environment.
///
/// The two file sinks are always present; the console sink is added only
/// outside production.
pub fn active_sinks(environment: &str) -> Vec<Sink> {
    let mut sinks = vec![Sink::ErrorFile, Sink::CombinedFile];
    if environment != PRODUCTION_ENV {
        sinks.push(Sink::Console);
    }
    sinks
}

/// Initialize the process-wide tracing subscriber.
///
/// # Errors
///
/// Returns an `io::Error` if a log file cannot be opened for appending.
pub fn init_tracing(settings: &LoggingSettings, environment: &str) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,graphql_service=debug"));

    tracing_subscriber::registry()
        .with(build_layers(settings, environment)?)
        .with(env_filter)
        .init();

    tracing::info!("Tracing initialized");
    Ok(())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn build_layers(settings: &LoggingSettings, environment: &str) -> io::Result<Vec<BoxedLayer>> {
    let mut layers = Vec::new();

    for sink in active_sinks(environment) {
        let layer: BoxedLayer = match sink {
            Sink::ErrorFile => fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Arc::new(open_append(&settings.error_file)?))
                .with_filter(LevelFilter::ERROR)
                .boxed(),
            Sink::CombinedFile => fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Arc::new(open_append(&settings.combined_file)?))
                .with_filter(LevelFilter::INFO)
                .boxed(),
            Sink::Console => fmt::layer().compact().with_target(true).boxed(),
        };
        layers.push(layer);
    }

    Ok(layers)
}

fn open_append(path: impl AsRef<Path>) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
