//! # Cache Module
//!
//! Redis-backed distributed caching.

mod cache_service;

pub use cache_service::{Cache, RedisCache};
