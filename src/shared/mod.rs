//! # Shared Module
//!
//! Cross-cutting concerns used by every layer.

pub mod error;

pub use error::AppError;
