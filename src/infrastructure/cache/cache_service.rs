//! Cache Service
//!
//! Generic cache trait and Redis implementation for application-wide caching.
//!
//! This module provides:
//! - A `Cache` trait defining common caching operations
//! - A `RedisCache` implementation using Redis as the backing store
//! - JSON serialization/deserialization for complex types
//!
//! # Example
//!
//! ```rust,ignore
//! use graphql_service::infrastructure::cache::{Cache, RedisCache};
//!
//! let cache = RedisCache::connect("redis://127.0.0.1:6379")?;
//!
//! // Store a value for an hour
//! cache.set_ex("session:123", &session_data, 3600).await?;
//!
//! // Retrieve it
//! let session: Option<SessionData> = cache.get("session:123").await?;
//! ```

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use crate::shared::error::AppError;

/// Generic cache trait for abstracting cache operations.
///
/// All operations are async and return `Result<T, AppError>`.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Retrieves a value from the cache by key.
    ///
    /// # Returns
    /// * `Ok(Some(T))` - If the key exists and deserialization succeeds
    /// * `Ok(None)` - If the key does not exist
    /// * `Err(AppError)` - If a cache or deserialization error occurs
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError>;

    /// Stores a value in the cache without expiration.
    async fn set<T: Serialize + Sync + Send>(&self, key: &str, value: &T) -> Result<(), AppError>;

    /// Stores a value in the cache with a time-to-live in seconds.
    async fn set_ex<T: Serialize + Sync + Send>(
        &self,
        key: &str,
        value: &T,
        seconds: u64,
    ) -> Result<(), AppError>;

    /// Deletes a key from the cache.
    ///
    /// # Returns
    /// * `Ok(true)` - If the key existed and was deleted
    /// * `Ok(false)` - If the key did not exist
    async fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// Checks if a key exists in the cache.
    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    /// Retrieves the remaining TTL of a key in seconds.
    ///
    /// # Returns
    /// * `Ok(Some(ttl))` - TTL in seconds if the key exists with expiration
    /// * `Ok(None)` - If the key does not exist or has no expiration
    async fn ttl(&self, key: &str) -> Result<Option<i64>, AppError>;
}

/// Redis-backed cache implementation.
///
/// Holds a parsed client; the managed connection is established on first
/// use and reused afterwards, with automatic reconnection handled by the
/// driver's `ConnectionManager`.
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
    /// Lazily initialized connection manager, shared between clones
    manager: Arc<OnceCell<ConnectionManager>>,
    /// Optional key prefix for namespacing
    prefix: Option<Arc<str>>,
}

impl RedisCache {
    /// Creates a cache handle from a Redis URL.
    ///
    /// Only parses the URL; no connection is attempted until the first
    /// cache operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn connect(url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            manager: Arc::new(OnceCell::new()),
            prefix: None,
        })
    }

    /// Creates a cache handle with a key prefix.
    ///
    /// All keys are automatically prefixed, useful for logical separation
    /// of data within a shared Redis instance.
    ///
    /// # Example
    /// ```rust,ignore
    /// let cache = RedisCache::connect_with_prefix(url, "gql:v1:")?;
    /// // key "user:123" becomes "gql:v1:user:123"
    /// ```
    pub fn connect_with_prefix(url: &str, prefix: impl Into<Arc<str>>) -> Result<Self, AppError> {
        let mut cache = Self::connect(url)?;
        cache.prefix = Some(prefix.into());
        Ok(cache)
    }

    async fn manager(&self) -> Result<ConnectionManager, AppError> {
        let manager = self
            .manager
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await?;
        Ok(manager.clone())
    }

    /// Formats a key with the optional prefix.
    fn format_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, key),
            None => key.to_string(),
        }
    }

    /// Serializes a value to JSON string.
    fn serialize<T: Serialize>(value: &T) -> Result<String, AppError> {
        serde_json::to_string(value).map_err(|e| {
            warn!("Cache serialization error: {}", e);
            AppError::Internal(format!("Cache serialization failed: {}", e))
        })
    }

    /// Deserializes a JSON string to the target type.
    fn deserialize<T: DeserializeOwned>(data: &str) -> Result<T, AppError> {
        serde_json::from_str(data).map_err(|e| {
            warn!("Cache deserialization error: {}", e);
            AppError::Internal(format!("Cache deserialization failed: {}", e))
        })
    }
}

#[async_trait]
impl Cache for RedisCache {
    #[instrument(skip(self), level = "debug")]
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.manager().await?;

        let result: Option<String> = conn.get(&full_key).await?;

        match result {
            Some(data) => {
                debug!(key = %full_key, "Cache hit");
                let value = Self::deserialize(&data)?;
                Ok(Some(value))
            }
            None => {
                debug!(key = %full_key, "Cache miss");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn set<T: Serialize + Sync + Send>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let full_key = self.format_key(key);
        let data = Self::serialize(value)?;
        let mut conn = self.manager().await?;

        let _: () = conn.set(&full_key, data).await?;
        debug!(key = %full_key, "Cache set");

        Ok(())
    }

    #[instrument(skip(self, value), level = "debug")]
    async fn set_ex<T: Serialize + Sync + Send>(
        &self,
        key: &str,
        value: &T,
        seconds: u64,
    ) -> Result<(), AppError> {
        let full_key = self.format_key(key);
        let data = Self::serialize(value)?;
        let mut conn = self.manager().await?;

        let _: () = conn.set_ex(&full_key, data, seconds).await?;
        debug!(key = %full_key, ttl = seconds, "Cache set with expiry");

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.manager().await?;

        let deleted: u64 = conn.del(&full_key).await?;
        let existed = deleted > 0;

        debug!(key = %full_key, deleted = existed, "Cache delete");

        Ok(existed)
    }

    #[instrument(skip(self), level = "debug")]
    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.manager().await?;

        let exists: bool = conn.exists(&full_key).await?;
        debug!(key = %full_key, exists = exists, "Cache exists check");

        Ok(exists)
    }

    #[instrument(skip(self), level = "debug")]
    async fn ttl(&self, key: &str) -> Result<Option<i64>, AppError> {
        let full_key = self.format_key(key);
        let mut conn = self.manager().await?;

        let ttl: i64 = conn.ttl(&full_key).await?;

        // Redis TTL returns:
        // -2 if key does not exist
        // -1 if key exists but has no expiration
        // positive value for remaining seconds
        let result = match ttl {
            -2 => None,
            -1 => None,
            _ => Some(ttl),
        };

        debug!(key = %full_key, ttl = ?result, "Cache TTL check");

        Ok(result)
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
