// Declare modules within the adapters directory
pub mod in_memory_cache;
pub mod in_memory_store;
pub mod postgres_store;
pub mod redis_cache;

pub use in_memory_cache::InMemoryCache;
pub use in_memory_store::InMemoryStore;
pub use postgres_store::PostgresStore;
pub use redis_cache::RedisCache;
