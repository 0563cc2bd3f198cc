//! # GraphQL Service
//!
//! A GraphQL API service with document storage, distributed caching, and
//! subscriptions.
//!
//! Startup is strictly sequenced: configuration and logging come up first,
//! the database connection is established next, and the HTTP listener binds
//! only once the database is reachable. Every transition is observable
//! through [`startup::Bootstrapper::lifecycle`].

pub mod config;
pub mod graphql;
pub mod infrastructure;
pub mod presentation;
pub mod shared;
pub mod startup;
pub mod telemetry;
