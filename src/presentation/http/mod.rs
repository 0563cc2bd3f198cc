//! # HTTP Module
//!
//! axum routing and the handlers behind each route.

pub mod handlers;
mod routes;

pub use routes::create_router;
