use crate::{Cache, CoreError};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::info;

/// Redis implementation of the Cache port. Lets several API processes share tenant
/// lookups and sessions.
#[derive(Clone, Debug)]
pub struct RedisCache {
    connection: MultiplexedConnection,
    default_ttl_seconds: u64,
    prefix: String,
}

impl RedisCache {
    pub async fn new(redis_url: &str, default_ttl_seconds: u64) -> Result<Self, CoreError> {
        let client = Client::open(redis_url)
            .map_err(|e| CoreError::Configuration(format!("Invalid Redis URL: {}", e)))?;
        let connection = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| CoreError::Infrastructure(Box::new(e)))?;
        info!("Redis cache connected.");
        Ok(Self {
            connection,
            default_ttl_seconds,
            prefix: String::from("storefront:"),
        })
    }

    /// Namespace prepended to every key, so deployments can share one Redis.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        let mut conn = self.connection.clone();
        conn.get(self.key(key))
            .await
            .map_err(|e| CoreError::Infrastructure(Box::new(e)))
    }

    async fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: Option<u64>,
    ) -> Result<(), CoreError> {
        let mut conn = self.connection.clone();
        // SETEX rejects a zero expiry.
        let ttl = ttl_seconds.unwrap_or(self.default_ttl_seconds).max(1);

        conn.set_ex(self.key(key), value, ttl)
            .await
            .map_err(|e| CoreError::Infrastructure(Box::new(e)))
    }

    async fn delete(&self, key: &str) -> Result<(), CoreError> {
        let mut conn = self.connection.clone();
        conn.del(self.key(key))
            .await
            .map(|_: usize| ())
            .map_err(|e| CoreError::Infrastructure(Box::new(e)))
    }
}
