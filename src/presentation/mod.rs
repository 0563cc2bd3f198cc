//! # Presentation Module
//!
//! Transport layer: HTTP routing and request handlers.

pub mod http;
